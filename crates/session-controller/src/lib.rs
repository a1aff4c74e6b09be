//! Peer session controller.
//!
//! One [`SessionController`] per signed-in identity mediates between a host
//! application and an external real-time communication engine:
//!
//! - local capture and its render target
//! - one direct call or one multi-party room at a time
//! - remote participants and their render bindings
//! - a single event consumer fed normalized [`SessionEvent`]s
//!
//! Hosts normally drive everything through [`SessionHostHandle`], which
//! serializes commands for all sessions through one actor task.
//!
//! # Modules
//!
//! - [`engine`] - Traits for the engine, media capture and render targets
//! - [`controller`] - Per-identity call/room state machine
//! - [`participant`] / [`registry`] - Remote stream ownership
//! - [`bridge`] / [`events`] - Event delivery and wire schema
//! - [`directory`] - Live sessions keyed by local identifier
//! - [`host`] - Actor-based command surface
//! - [`config`] - Environment configuration
//! - [`errors`] - Error types
//! - [`observability`] - Tracing setup and metrics

pub mod bridge;
pub mod config;
pub mod controller;
pub mod directory;
pub mod engine;
pub mod errors;
pub mod events;
pub mod host;
pub mod observability;
pub mod participant;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use config::{Config, ConfigError};
pub use controller::{CallMode, SessionController};
pub use directory::SessionDirectory;
pub use errors::SessionError;
pub use events::{ChannelSink, EventKind, EventSink, SessionEvent, SinkError};
pub use host::{HostCommand, SessionHostHandle};
