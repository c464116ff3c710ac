//! Guild chat analytics
//!
//! Scans recent channel history and current membership to build a
//! [`StatsSnapshot`] for a date range. Results are cached for a short TTL.

pub mod aggregator;
pub mod cache;
pub mod models;

pub use aggregator::{compute_stats, compute_stats_in, AnalyticsError, MESSAGE_PAGE_LIMIT};
pub use cache::{StatsCache, StatsKey};
pub use models::{
    local_midnight, parse_date, ChannelTally, MessageKind, MessageTypeCounts, StatsSnapshot,
    TimeWindow,
};
