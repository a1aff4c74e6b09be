//! `SessionHostActor` - single task that owns the session directory.
//!
//! All state-mutating commands for every session pass through one bounded
//! mailbox and are handled strictly in order, so a host never races two
//! commands against the same controller. Engine callbacks still arrive on
//! engine threads; the controller handles those itself.

use crate::directory::SessionDirectory;
use crate::engine::{PeerOptions, RenderTargetId, RoomMode};
use crate::errors::SessionError;
use crate::events::SessionEvent;
use crate::observability::metrics;

use super::messages::HostCommand;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Handle to the `SessionHostActor`.
///
/// Cheap to clone; every method is a request/reply round trip through the
/// actor's mailbox.
#[derive(Clone)]
pub struct SessionHostHandle {
    sender: mpsc::Sender<HostCommand>,
    cancel_token: CancellationToken,
}

impl SessionHostHandle {
    /// Spawn the actor over `directory` and return its handle and task.
    ///
    /// Mailbox capacity comes from the directory's config.
    #[must_use]
    pub fn spawn(directory: SessionDirectory) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(directory.config().command_buffer.max(1));
        let cancel_token = CancellationToken::new();

        let actor = SessionHostActor {
            directory,
            receiver,
            cancel_token: cancel_token.clone(),
            commands_processed: 0,
        };
        let task = tokio::spawn(actor.run());

        (
            Self {
                sender,
                cancel_token,
            },
            task,
        )
    }

    pub async fn connect(&self, options: PeerOptions) -> Result<String, SessionError> {
        self.request(|respond_to| HostCommand::Connect {
            options,
            respond_to,
        })
        .await?
    }

    pub async fn disconnect(&self, peer_id: &str) -> Result<(), SessionError> {
        self.request(|respond_to| HostCommand::Disconnect {
            peer_id: peer_id.to_string(),
            respond_to,
        })
        .await?
    }

    pub async fn start_local_stream(
        &self,
        peer_id: &str,
        target: RenderTargetId,
    ) -> Result<(), SessionError> {
        self.request(|respond_to| HostCommand::StartLocalStream {
            peer_id: peer_id.to_string(),
            target,
            respond_to,
        })
        .await?
    }

    pub async fn start_remote_stream(
        &self,
        peer_id: &str,
        target: RenderTargetId,
        remote_peer_id: &str,
    ) -> Result<(), SessionError> {
        self.request(|respond_to| HostCommand::StartRemoteStream {
            peer_id: peer_id.to_string(),
            target,
            remote_peer_id: remote_peer_id.to_string(),
            respond_to,
        })
        .await?
    }

    /// List every known identity except `peer_id`.
    ///
    /// If the engine never answers the list is empty.
    pub async fn list_all_peers(&self, peer_id: &str) -> Result<Vec<String>, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HostCommand::ListAllPeers {
                peer_id: peer_id.to_string(),
                respond_to: tx,
            })
            .await
            .map_err(|e| SessionError::Internal(format!("channel send failed: {e}")))?;

        Ok(rx.await.unwrap_or_default())
    }

    pub async fn hang_up(&self, peer_id: &str) -> Result<(), SessionError> {
        self.request(|respond_to| HostCommand::HangUp {
            peer_id: peer_id.to_string(),
            respond_to,
        })
        .await?
    }

    pub async fn call(&self, peer_id: &str, remote_peer_id: &str) -> Result<(), SessionError> {
        self.request(|respond_to| HostCommand::Call {
            peer_id: peer_id.to_string(),
            remote_peer_id: remote_peer_id.to_string(),
            respond_to,
        })
        .await?
    }

    /// Join `room`; `mode` is the host ordinal (0 = mesh, 1 = sfu).
    pub async fn join(&self, peer_id: &str, room: &str, mode: i32) -> Result<(), SessionError> {
        self.request(|respond_to| HostCommand::Join {
            peer_id: peer_id.to_string(),
            room: room.to_string(),
            mode,
            respond_to,
        })
        .await?
    }

    pub async fn leave(&self, peer_id: &str, room: &str) -> Result<(), SessionError> {
        self.request(|respond_to| HostCommand::Leave {
            peer_id: peer_id.to_string(),
            room: room.to_string(),
            respond_to,
        })
        .await?
    }

    pub async fn subscribe_events(
        &self,
        peer_id: &str,
    ) -> Result<mpsc::Receiver<SessionEvent>, SessionError> {
        self.request(|respond_to| HostCommand::SubscribeEvents {
            peer_id: peer_id.to_string(),
            respond_to,
        })
        .await?
    }

    /// Stop the actor; every session is released before the task exits.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> HostCommand,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(command(tx))
            .await
            .map_err(|e| SessionError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| SessionError::Internal(format!("response receive failed: {e}")))
    }
}

/// The actor itself. Owns the directory and runs the mailbox loop.
pub struct SessionHostActor {
    directory: SessionDirectory,
    receiver: mpsc::Receiver<HostCommand>,
    cancel_token: CancellationToken,
    commands_processed: u64,
}

impl SessionHostActor {
    #[instrument(skip_all, name = "session.host")]
    async fn run(mut self) {
        info!(target: "session.host", "Session host started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "session.host",
                        "Session host received cancellation signal"
                    );
                    break;
                }

                command = self.receiver.recv() => {
                    match command {
                        Some(command) => {
                            self.handle_command(command).await;
                            self.commands_processed += 1;
                        }
                        None => {
                            info!(
                                target: "session.host",
                                "Session host channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        let released = self.directory.release_all();
        info!(
            target: "session.host",
            sessions_released = released,
            commands_processed = self.commands_processed,
            "Session host stopped"
        );
    }

    async fn handle_command(&mut self, command: HostCommand) {
        let name = command.name();
        debug!(target: "session.host", command = name, "Handling command");

        match command {
            HostCommand::Connect {
                options,
                respond_to,
            } => {
                let result = self.directory.connect(options).await;
                Self::reply(name, respond_to, result);
            }

            HostCommand::Disconnect {
                peer_id,
                respond_to,
            } => {
                self.directory.disconnect(&peer_id);
                Self::reply(name, respond_to, Ok(()));
            }

            HostCommand::StartLocalStream {
                peer_id,
                target,
                respond_to,
            } => {
                let result = self
                    .directory
                    .require(&peer_id)
                    .and_then(|session| session.start_local_stream(target));
                Self::reply(name, respond_to, result);
            }

            HostCommand::StartRemoteStream {
                peer_id,
                target,
                remote_peer_id,
                respond_to,
            } => {
                let result = self
                    .directory
                    .require(&peer_id)
                    .and_then(|session| session.start_remote_stream(target, &remote_peer_id));
                Self::reply(name, respond_to, result);
            }

            HostCommand::ListAllPeers {
                peer_id,
                respond_to,
            } => {
                metrics::record_command(name, true);
                match self.directory.get(&peer_id) {
                    // Answered from the engine's callback; the mailbox moves on.
                    Some(session) => session.list_all_peers(move |peers| {
                        let _ = respond_to.send(peers);
                    }),
                    None => {
                        let _ = respond_to.send(Vec::new());
                    }
                }
            }

            HostCommand::HangUp {
                peer_id,
                respond_to,
            } => {
                let result = self
                    .directory
                    .require(&peer_id)
                    .map(|session| session.hang_up());
                Self::reply(name, respond_to, result);
            }

            HostCommand::Call {
                peer_id,
                remote_peer_id,
                respond_to,
            } => {
                let result = self
                    .directory
                    .require(&peer_id)
                    .and_then(|session| session.start_call(&remote_peer_id));
                Self::reply(name, respond_to, result);
            }

            HostCommand::Join {
                peer_id,
                room,
                mode,
                respond_to,
            } => {
                let result = self.directory.require(&peer_id).and_then(|session| {
                    let mode = RoomMode::try_from(mode)?;
                    session.join(&room, mode)
                });
                Self::reply(name, respond_to, result);
            }

            HostCommand::Leave {
                peer_id,
                room,
                respond_to,
            } => {
                let result = self
                    .directory
                    .require(&peer_id)
                    .map(|session| session.leave(&room));
                Self::reply(name, respond_to, result);
            }

            HostCommand::SubscribeEvents {
                peer_id,
                respond_to,
            } => {
                let result = self.directory.subscribe_events(&peer_id);
                Self::reply(name, respond_to, result);
            }
        }
    }

    fn reply<T>(
        command: &'static str,
        respond_to: oneshot::Sender<Result<T, SessionError>>,
        result: Result<T, SessionError>,
    ) {
        metrics::record_command(command, result.is_ok());
        if let Err(e) = &result {
            debug!(
                target: "session.host",
                command = command,
                error_code = e.error_code(),
                error = %e,
                "Command failed"
            );
        }
        let _ = respond_to.send(result);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_support::{NoTargets, RefusingFactory};
    use secrecy::SecretString;
    use std::sync::Arc;

    fn spawn_host() -> (SessionHostHandle, JoinHandle<()>) {
        let directory = SessionDirectory::new(
            Arc::new(RefusingFactory),
            Arc::new(NoTargets),
            Config::default(),
        );
        SessionHostHandle::spawn(directory)
    }

    fn options(api_key: &str) -> PeerOptions {
        let mut options = Config::default().peer_options();
        options.api_key = SecretString::from(api_key.to_string());
        options
    }

    #[tokio::test]
    async fn test_commands_against_unknown_peer_fail_session_not_found() {
        let (host, _task) = spawn_host();

        let target = RenderTargetId(1);
        assert!(matches!(
            host.start_local_stream("ghost", target).await,
            Err(SessionError::SessionNotFound(_))
        ));
        assert!(matches!(
            host.start_remote_stream("ghost", target, "bob").await,
            Err(SessionError::SessionNotFound(_))
        ));
        assert!(matches!(
            host.call("ghost", "bob").await,
            Err(SessionError::SessionNotFound(_))
        ));
        assert!(matches!(
            host.join("ghost", "room1", 0).await,
            Err(SessionError::SessionNotFound(_))
        ));
        assert!(matches!(
            host.leave("ghost", "room1").await,
            Err(SessionError::SessionNotFound(_))
        ));
        assert!(matches!(
            host.hang_up("ghost").await,
            Err(SessionError::SessionNotFound(_))
        ));
        assert!(matches!(
            host.subscribe_events("ghost").await,
            Err(SessionError::SessionNotFound(_))
        ));

        host.cancel();
    }

    #[tokio::test]
    async fn test_disconnect_and_list_tolerate_unknown_peer() {
        let (host, _task) = spawn_host();

        assert!(host.disconnect("ghost").await.is_ok());
        assert!(host.list_all_peers("ghost").await.unwrap().is_empty());

        host.cancel();
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_api_key() {
        let (host, _task) = spawn_host();

        let result = host.connect(options("")).await;
        assert!(matches!(result, Err(SessionError::InvalidApiKey)));

        host.cancel();
    }

    #[tokio::test]
    async fn test_connect_surfaces_engine_refusal() {
        let (host, _task) = spawn_host();

        let result = host.connect(options("key")).await;
        assert!(matches!(result, Err(SessionError::Engine(_))));

        host.cancel();
    }

    #[tokio::test]
    async fn test_cancel_stops_actor() {
        let (host, task) = spawn_host();

        host.cancel();
        assert!(host.is_cancelled());
        task.await.unwrap();

        let result = host.disconnect("ghost").await;
        assert!(matches!(result, Err(SessionError::Internal(_))));
    }

    #[test]
    fn test_command_names_are_stable() {
        let (tx, _rx) = oneshot::channel();
        let command = HostCommand::Join {
            peer_id: "alice".to_string(),
            room: "room1".to_string(),
            mode: 1,
            respond_to: tx,
        };
        assert_eq!(command.name(), "join");
    }
}
