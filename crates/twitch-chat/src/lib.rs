//! Twitch chat transport and roster collaborators for stream-recap.
//!
//! ## Core Types
//!
//! - [`ChatClient`] / [`ChatConnection`] - IRC-over-WebSocket chat client
//! - [`ChatItem`] - A decoded notification or presence update
//! - [`HelixClient`] - Startup roster fetch against the Helix API
//! - [`IrcMessage`] - Parsed IRCv3 line

pub mod api;
pub mod client;
pub mod decode;
pub mod error;
pub mod irc;

pub use api::HelixClient;
pub use client::{ChatClient, ChatConnection, ChatCredentials, ClientConfig};
pub use decode::{ChatItem, decode_message};
pub use error::{Result, TwitchChatError};
pub use irc::IrcMessage;
