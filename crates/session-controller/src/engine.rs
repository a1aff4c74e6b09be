//! Seams to the external communication engine and host collaborators.
//!
//! The signaling/transport engine, media acquisition and the host's render
//! target registry are all external. The controller talks to them only
//! through the traits in this module, always as `Arc<dyn _>` so that engine
//! callback threads can hold references.
//!
//! Engine objects emit events through observer-style subscriptions: each
//! `subscribe(kind, handler)` returns a [`SubscriptionId`] that must be
//! handed back to `unsubscribe` to stop delivery. Handlers may be invoked on
//! any thread, including synchronously from inside the call that triggered
//! them.

use crate::errors::SessionError;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Opaque host identifier for a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderTargetId(pub i64);

impl fmt::Display for RenderTargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned by an engine `subscribe` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Error text reported by the engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct EngineError(pub String);

impl From<EngineError> for SessionError {
    fn from(err: EngineError) -> Self {
        SessionError::Engine(err.0)
    }
}

/// Multi-party room topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomMode {
    /// Full-mesh peer connections.
    Mesh,
    /// Server-forwarded media.
    Sfu,
}

impl RoomMode {
    /// Returns the mode as a string for logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RoomMode::Mesh => "mesh",
            RoomMode::Sfu => "sfu",
        }
    }
}

impl TryFrom<i32> for RoomMode {
    type Error = SessionError;

    /// Host ordinal: 0 = mesh, 1 = sfu.
    fn try_from(ordinal: i32) -> Result<Self, Self::Error> {
        match ordinal {
            0 => Ok(RoomMode::Mesh),
            1 => Ok(RoomMode::Sfu),
            other => Err(SessionError::InvalidRoomMode(other)),
        }
    }
}

/// Camera used for local capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    Front,
    Back,
}

/// Local capture profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub max_width: u32,
    pub max_height: u32,
    pub camera_position: CameraPosition,
}

impl Default for MediaConstraints {
    /// Bounded resolution, front-facing camera.
    fn default() -> Self {
        Self {
            max_width: 960,
            max_height: 540,
            camera_position: CameraPosition::Front,
        }
    }
}

/// Engine-side log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineLogLevel {
    None,
    Error,
    Warn,
    All,
}

/// Options for creating a peer connection.
///
/// `Debug` is derived; `SecretString` prints as redacted.
#[derive(Debug, Clone)]
pub struct PeerOptions {
    pub api_key: SecretString,
    pub domain: String,
    pub log_level: EngineLogLevel,
}

/// Options for joining a room.
#[derive(Clone)]
pub struct RoomOptions {
    pub mode: RoomMode,
    pub stream: Option<Arc<dyn MediaStream>>,
}

// ----------------------------------------------------------------------------
// Events
// ----------------------------------------------------------------------------

/// Peer-level event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerEventKind {
    Open,
    Call,
    Close,
    Disconnected,
    Error,
}

/// Peer-level events.
#[derive(Clone)]
pub enum PeerEvent {
    /// The peer is registered with the signaling server under this identifier.
    Open(String),
    /// A remote identity is calling us.
    Call(Arc<dyn MediaConnection>),
    /// The peer was closed.
    Close,
    /// The signaling connection dropped.
    Disconnected,
    Error(EngineError),
}

impl PeerEvent {
    #[must_use]
    pub fn kind(&self) -> PeerEventKind {
        match self {
            PeerEvent::Open(_) => PeerEventKind::Open,
            PeerEvent::Call(_) => PeerEventKind::Call,
            PeerEvent::Close => PeerEventKind::Close,
            PeerEvent::Disconnected => PeerEventKind::Disconnected,
            PeerEvent::Error(_) => PeerEventKind::Error,
        }
    }
}

/// Direct-call event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEventKind {
    Stream,
    Close,
    Error,
}

/// Direct-call events.
#[derive(Clone)]
pub enum MediaEvent {
    /// The remote side's stream arrived.
    Stream(Arc<dyn MediaStream>),
    /// The connection closed; carries the remote identifier.
    Close(String),
    Error(EngineError),
}

impl MediaEvent {
    #[must_use]
    pub fn kind(&self) -> MediaEventKind {
        match self {
            MediaEvent::Stream(_) => MediaEventKind::Stream,
            MediaEvent::Close(_) => MediaEventKind::Close,
            MediaEvent::Error(_) => MediaEventKind::Error,
        }
    }
}

/// Room event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomEventKind {
    Open,
    Close,
    Error,
    PeerJoin,
    PeerLeave,
    Stream,
    RemoveStream,
}

/// Room events.
#[derive(Clone)]
pub enum RoomEvent {
    Open(String),
    Close(String),
    Error(EngineError),
    PeerJoin(String),
    PeerLeave(String),
    Stream(Arc<dyn MediaStream>),
    RemoveStream(Arc<dyn MediaStream>),
}

impl RoomEvent {
    #[must_use]
    pub fn kind(&self) -> RoomEventKind {
        match self {
            RoomEvent::Open(_) => RoomEventKind::Open,
            RoomEvent::Close(_) => RoomEventKind::Close,
            RoomEvent::Error(_) => RoomEventKind::Error,
            RoomEvent::PeerJoin(_) => RoomEventKind::PeerJoin,
            RoomEvent::PeerLeave(_) => RoomEventKind::PeerLeave,
            RoomEvent::Stream(_) => RoomEventKind::Stream,
            RoomEvent::RemoveStream(_) => RoomEventKind::RemoveStream,
        }
    }
}

pub type PeerEventHandler = Arc<dyn Fn(PeerEvent) + Send + Sync>;
pub type MediaEventHandler = Arc<dyn Fn(MediaEvent) + Send + Sync>;
pub type RoomEventHandler = Arc<dyn Fn(RoomEvent) + Send + Sync>;

/// Receives the result of an asynchronous peer listing.
pub type ListPeersCallback = Box<dyn FnOnce(Vec<String>) + Send>;

// ----------------------------------------------------------------------------
// Collaborators
// ----------------------------------------------------------------------------

/// A destination that can display a decoded stream.
pub trait RenderTarget: Send + Sync {
    fn id(&self) -> RenderTargetId;
}

/// Host-controlled lookup of render targets.
pub trait RenderTargetRegistry: Send + Sync {
    fn resolve(&self, id: RenderTargetId) -> Option<Arc<dyn RenderTarget>>;
}

/// A local or remote media stream.
pub trait MediaStream: Send + Sync {
    /// Identity of the peer that owns the stream.
    fn peer_identifier(&self) -> String;
    fn add_renderer(&self, target: &Arc<dyn RenderTarget>);
    fn remove_renderer(&self, target: &Arc<dyn RenderTarget>);
    fn close(&self);
}

/// A one-to-one media connection.
pub trait MediaConnection: Send + Sync {
    fn remote_identifier(&self) -> String;
    fn is_open(&self) -> bool;
    /// Answer an incoming call, optionally sending a local stream.
    fn answer(&self, stream: Option<Arc<dyn MediaStream>>);
    fn close(&self);
    fn subscribe(&self, kind: MediaEventKind, handler: MediaEventHandler) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId);
}

/// A named multi-party room.
pub trait Room: Send + Sync {
    fn name(&self) -> String;
    fn close(&self);
    fn subscribe(&self, kind: RoomEventKind, handler: RoomEventHandler) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId);
}

/// The underlying signaling peer.
pub trait Peer: Send + Sync {
    fn identity(&self) -> String;
    fn is_disconnected(&self) -> bool;
    fn is_destroyed(&self) -> bool;

    /// Live means neither destroyed nor disconnected.
    fn is_connected(&self) -> bool {
        !self.is_destroyed() && !self.is_disconnected()
    }

    fn disconnect(&self);
    fn destroy(&self);

    /// Place a direct call. Returns immediately; progress arrives via callbacks.
    fn call(&self, remote: &str, stream: Arc<dyn MediaStream>) -> Option<Arc<dyn MediaConnection>>;

    /// Join a room. Returns immediately; progress arrives via callbacks.
    fn join_room(&self, name: &str, options: RoomOptions) -> Option<Arc<dyn Room>>;

    /// Query every identity known to the signaling server.
    fn list_all_peers(&self, callback: ListPeersCallback);

    fn subscribe(&self, kind: PeerEventKind, handler: PeerEventHandler) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Camera/microphone acquisition, bound to one peer.
pub trait MediaCapture: Send + Sync {
    fn acquire(&self, constraints: &MediaConstraints) -> Result<Arc<dyn MediaStream>, EngineError>;
    fn terminate(&self);
}

/// Creates peers and their capture collaborators.
pub trait PeerFactory: Send + Sync {
    fn create_peer(&self, options: &PeerOptions) -> Result<Arc<dyn Peer>, EngineError>;
    fn media_capture(&self, peer: &Arc<dyn Peer>) -> Arc<dyn MediaCapture>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_room_mode_from_ordinal() {
        assert_eq!(RoomMode::try_from(0).unwrap(), RoomMode::Mesh);
        assert_eq!(RoomMode::try_from(1).unwrap(), RoomMode::Sfu);

        let err = RoomMode::try_from(2).unwrap_err();
        assert!(matches!(err, SessionError::InvalidRoomMode(2)));
        assert!(RoomMode::try_from(-1).is_err());
    }

    #[test]
    fn test_default_constraints_are_bounded_front_camera() {
        let constraints = MediaConstraints::default();
        assert_eq!(constraints.max_width, 960);
        assert_eq!(constraints.max_height, 540);
        assert_eq!(constraints.camera_position, CameraPosition::Front);
    }

    #[test]
    fn test_engine_error_converts_to_session_error() {
        let err: SessionError = EngineError("room full".to_string()).into();
        assert!(matches!(err, SessionError::Engine(ref text) if text == "room full"));
    }

    #[test]
    fn test_peer_options_debug_redacts_api_key() {
        let options = PeerOptions {
            api_key: SecretString::from("super-secret-key".to_string()),
            domain: "localhost".to_string(),
            log_level: EngineLogLevel::All,
        };
        let debug_output = format!("{options:?}");
        assert!(!debug_output.contains("super-secret-key"));
        assert!(debug_output.contains("localhost"));
    }
}
