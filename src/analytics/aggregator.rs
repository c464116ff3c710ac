//! Fan-out history scan and merge into a [`StatsSnapshot`]
//!
//! Every text channel is fetched concurrently and reduced to its own
//! [`ChannelTally`]. Once all fetches have settled a single reducer folds the
//! tallies into the snapshot, so no state is shared between in-flight tasks.
//! A failing channel is logged and contributes nothing.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Timelike, Utc};
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analytics::models::{ChannelTally, MessageKind, StatsSnapshot, TimeWindow};
use crate::discord::{
    Channel, Guild, Member, MembershipSource, Message, MessageSource, Role, SourceError,
};

/// Messages requested per channel. Busier channels are undercounted.
pub const MESSAGE_PAGE_LIMIT: u8 = 100;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Absorbed inside the aggregator, only ever logged
    #[error("failed to fetch messages for channel {channel}: {source}")]
    ChannelFetch {
        channel: String,
        #[source]
        source: SourceError,
    },
    #[error("failed to fetch guild membership: {0}")]
    MembershipFetch(#[source] SourceError),
}

/// Compute stats with day and hour keys in the process's local time zone
pub async fn compute_stats<S>(
    source: &S,
    guild: &Guild,
    window: &TimeWindow,
) -> Result<StatsSnapshot, AnalyticsError>
where
    S: MessageSource + MembershipSource + ?Sized,
{
    compute_stats_in(source, guild, window, &Local).await
}

/// Compute stats with day and hour keys in `tz`
pub async fn compute_stats_in<S, Tz>(
    source: &S,
    guild: &Guild,
    window: &TimeWindow,
    tz: &Tz,
) -> Result<StatsSnapshot, AnalyticsError>
where
    S: MessageSource + MembershipSource + ?Sized,
    Tz: TimeZone + Sync,
{
    let mut snapshot = StatsSnapshot::new(guild.name.clone());

    let (tallies, members, roles) = tokio::join!(
        scan_channels(source, guild, window, tz),
        source.fetch_all_members(&guild.id),
        source.list_roles(&guild.id),
    );

    for tally in tallies {
        snapshot.absorb(tally);
    }

    let members = members.map_err(AnalyticsError::MembershipFetch)?;
    let roles = roles.map_err(AnalyticsError::MembershipFetch)?;

    record_member_growth(&mut snapshot, &members, window, tz);
    record_roles(&mut snapshot, &roles, &members, &guild.id);

    info!(
        guild_id = %guild.id,
        messages = snapshot.total_messages(),
        members = members.len(),
        "computed guild stats"
    );

    Ok(snapshot)
}

/// One tally per channel that was read successfully
async fn scan_channels<S, Tz>(
    source: &S,
    guild: &Guild,
    window: &TimeWindow,
    tz: &Tz,
) -> Vec<ChannelTally>
where
    S: MessageSource + ?Sized,
    Tz: TimeZone + Sync,
{
    let channels = match source.list_text_channels(&guild.id).await {
        Ok(channels) => channels,
        Err(e) => {
            warn!(guild_id = %guild.id, error = %e, "failed to list text channels");
            return Vec::new();
        }
    };

    debug!(guild_id = %guild.id, channels = channels.len(), "scanning channel history");

    let results = join_all(
        channels
            .iter()
            .map(|channel| fetch_channel_tally(source, channel, window, tz)),
    )
    .await;

    results
        .into_iter()
        .filter_map(|result| match result {
            Ok(tally) => Some(tally),
            Err(e) => {
                warn!(error = %e, "skipping channel");
                None
            }
        })
        .collect()
}

async fn fetch_channel_tally<S, Tz>(
    source: &S,
    channel: &Channel,
    window: &TimeWindow,
    tz: &Tz,
) -> Result<ChannelTally, AnalyticsError>
where
    S: MessageSource + ?Sized,
    Tz: TimeZone + Sync,
{
    let messages = source
        .fetch_messages(&channel.id, MESSAGE_PAGE_LIMIT, window.start)
        .await
        .map_err(|source| AnalyticsError::ChannelFetch {
            channel: channel.name.clone(),
            source,
        })?;

    Ok(tally_messages(&channel.name, &messages, window, tz))
}

/// Reduce one channel's page of history
pub fn tally_messages<Tz: TimeZone>(
    channel_name: &str,
    messages: &[Message],
    window: &TimeWindow,
    tz: &Tz,
) -> ChannelTally {
    let mut tally = ChannelTally::new(channel_name);

    for message in messages {
        if !window.admits(message.created_at) || message.author.bot {
            continue;
        }

        let local = message.created_at.with_timezone(tz);
        tally.record(
            local.date_naive(),
            local.hour(),
            &message.author.username,
            classify(message),
        );
    }

    tally
}

/// Only the first attachment is inspected; attachments take precedence over text.
pub fn classify(message: &Message) -> Option<MessageKind> {
    match message.attachments.first() {
        Some(attachment) => Some(MessageKind::from_content_type(
            attachment.content_type.as_deref(),
        )),
        None if !message.content.is_empty() => Some(MessageKind::Text),
        None => None,
    }
}

fn record_member_growth<Tz: TimeZone>(
    snapshot: &mut StatsSnapshot,
    members: &[Member],
    window: &TimeWindow,
    tz: &Tz,
) {
    let first_day = local_day(window.start, tz);
    let last_day = local_day(window.end, tz);

    for member in members.iter().filter(|m| !m.user.bot) {
        let joined = local_day(member.joined_at, tz);
        if (first_day..=last_day).contains(&joined) {
            snapshot.record_join(joined);
        }
    }
}

fn record_roles(snapshot: &mut StatsSnapshot, roles: &[Role], members: &[Member], guild_id: &str) {
    let humans: Vec<&Member> = members.iter().filter(|m| !m.user.bot).collect();

    // Roles sharing a name report the last one listed
    for role in roles {
        let holders = humans.iter().filter(|m| m.holds(role, guild_id)).count() as u64;
        snapshot.roles_distribution.insert(role.name.clone(), holders);
    }
}

fn local_day<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}
