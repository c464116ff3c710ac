use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use guildlens::analytics::{compute_stats, parse_date, TimeWindow};
use guildlens::config::Config;
use guildlens::discord::{DiscordClient, GuildSource};

#[derive(Parser)]
#[command(name = "guildlens-cli")]
#[command(about = "Guild analytics from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a stats snapshot and print it as JSON
    Snapshot {
        /// Guild (server) id
        #[arg(long)]
        guild: String,
        /// Range start, RFC 3339 or YYYY-MM-DD (default: 7 days before end)
        #[arg(long)]
        start: Option<String>,
        /// Range end, RFC 3339 or YYYY-MM-DD (default: now)
        #[arg(long)]
        end: Option<String>,
    },
    /// List guilds the bot is a member of
    Guilds,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let discord = DiscordClient::from_config(&config.discord)?;

    match cli.command {
        Commands::Snapshot { guild, start, end } => {
            let end = match end {
                Some(raw) => parse_arg(&raw)?,
                None => Utc::now(),
            };
            let start = match start {
                Some(raw) => parse_arg(&raw)?,
                None => end - Duration::days(7),
            };
            let window =
                TimeWindow::new(start, end).ok_or_else(|| anyhow!("--start is after --end"))?;

            let guild = discord
                .get_guild(&guild)
                .await?
                .ok_or_else(|| anyhow!("Guild {guild} not found or the bot is not a member"))?;

            let snapshot = compute_stats(&discord, &guild, &window).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::Guilds => {
            let guilds = discord.bot_guilds().await?;
            if guilds.is_empty() {
                println!("The bot is not in any guild");
            } else {
                println!("{:<22} {:<10} Name", "Id", "Members");
                println!("{}", "-".repeat(60));
                for guild in guilds {
                    let members = guild
                        .approximate_member_count
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "N/A".to_string());
                    println!("{:<22} {:<10} {}", guild.id, members, guild.name);
                }
            }
        }
    }

    Ok(())
}

fn parse_arg(raw: &str) -> Result<DateTime<Utc>> {
    parse_date(raw).ok_or_else(|| anyhow!("invalid date '{raw}', expected RFC 3339 or YYYY-MM-DD"))
}
