//! Chat-events: classification, aggregation and reporting for live stream
//! community engagement events.
//!
//! This crate is the I/O-free core of stream-recap. A chat transport
//! delivers decoded [`Notification`]s; the [`EventNormalizer`] maps them to
//! canonical [`SupportEvent`]s, the [`AggregationStore`] merges them under
//! per-category rules, the [`AnnouncementPolicy`] decides at-most-once
//! welcome messages for team members, and the [`ReportComposer`] renders a
//! deterministic markdown session summary from a store snapshot.
//!
//! ## Core Types
//!
//! - [`Notification`] - One decoded notification from the transport
//! - [`SupportEvent`] - A canonical, timestamped engagement event
//! - [`TeamRoster`] - Read-only member-id to member mapping
//! - [`StreamSession`] - Orchestrator wiring the pieces per session

pub mod announce;
pub mod error;
pub mod event;
pub mod normalizer;
pub mod notification;
pub mod report;
pub mod roster;
pub mod session;
pub mod store;

pub use announce::{AnnouncementPolicy, WelcomeRequest};
pub use error::{EventError, Result};
pub use event::{
    CheerInfo, FollowerInfo, HostInfo, RaidInfo, SubscriptionInfo, SubscriptionKind, SupportEvent,
};
pub use normalizer::{EventNormalizer, NormalizerConfig};
pub use notification::{ChatMessage, Notification};
pub use report::ReportComposer;
pub use roster::{TeamMember, TeamRoster};
pub use session::StreamSession;
pub use store::{AggregationStore, StoreSnapshot};
