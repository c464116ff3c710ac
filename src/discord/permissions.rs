use super::models::UserGuild;

pub const ADMINISTRATOR: u64 = 1 << 3;
pub const MANAGE_GUILD: u64 = 1 << 5;

/// Parse Discord's decimal permission string; malformed input grants nothing.
pub fn parse(bits: &str) -> u64 {
    bits.parse::<u64>().unwrap_or(0)
}

/// True when the user owns the guild or may manage it.
pub fn can_manage(guild: &UserGuild) -> bool {
    let bits = parse(&guild.permissions);
    guild.owner || bits & MANAGE_GUILD != 0 || bits & ADMINISTRATOR != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guild(owner: bool, permissions: &str) -> UserGuild {
        UserGuild {
            id: "1".into(),
            name: "test".into(),
            icon: None,
            owner,
            permissions: permissions.into(),
        }
    }

    #[test]
    fn owner_always_manages() {
        assert!(can_manage(&guild(true, "0")));
    }

    #[test]
    fn manage_guild_or_administrator_bits_grant_access() {
        assert!(can_manage(&guild(false, &MANAGE_GUILD.to_string())));
        assert!(can_manage(&guild(false, &ADMINISTRATOR.to_string())));
        // SEND_MESSAGES | VIEW_CHANNEL
        assert!(!can_manage(&guild(false, "3072")));
    }

    #[test]
    fn malformed_permissions_grant_nothing() {
        assert!(!can_manage(&guild(false, "lots")));
        assert!(!can_manage(&guild(false, "")));
    }
}
