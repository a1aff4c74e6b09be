//! Commands accepted by the session host actor.
//!
//! Every command carries a `oneshot` reply channel. Commands are processed
//! one at a time in mailbox order.

use crate::engine::{PeerOptions, RenderTargetId};
use crate::errors::SessionError;
use crate::events::SessionEvent;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub enum HostCommand {
    /// Create a peer and wait for it to open.
    Connect {
        options: PeerOptions,
        /// Receives the engine-assigned local identifier.
        respond_to: oneshot::Sender<Result<String, SessionError>>,
    },

    /// Release a session. Unknown identifiers succeed.
    Disconnect {
        peer_id: String,
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },

    StartLocalStream {
        peer_id: String,
        target: RenderTargetId,
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },

    StartRemoteStream {
        peer_id: String,
        target: RenderTargetId,
        remote_peer_id: String,
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },

    /// List every known identity except the caller's own.
    /// Unknown or disconnected sessions get an empty list.
    ListAllPeers {
        peer_id: String,
        respond_to: oneshot::Sender<Vec<String>>,
    },

    HangUp {
        peer_id: String,
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },

    Call {
        peer_id: String,
        remote_peer_id: String,
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },

    Join {
        peer_id: String,
        room: String,
        /// Host ordinal: 0 = mesh, 1 = sfu.
        mode: i32,
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },

    Leave {
        peer_id: String,
        room: String,
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },

    /// Attach a new event consumer, replacing the previous one.
    SubscribeEvents {
        peer_id: String,
        respond_to: oneshot::Sender<Result<mpsc::Receiver<SessionEvent>, SessionError>>,
    },
}

impl HostCommand {
    /// Command name for logs and the `command` metric label.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            HostCommand::Connect { .. } => "connect",
            HostCommand::Disconnect { .. } => "disconnect",
            HostCommand::StartLocalStream { .. } => "start_local_stream",
            HostCommand::StartRemoteStream { .. } => "start_remote_stream",
            HostCommand::ListAllPeers { .. } => "list_all_peers",
            HostCommand::HangUp { .. } => "hang_up",
            HostCommand::Call { .. } => "call",
            HostCommand::Join { .. } => "join",
            HostCommand::Leave { .. } => "leave",
            HostCommand::SubscribeEvents { .. } => "subscribe_events",
        }
    }
}
