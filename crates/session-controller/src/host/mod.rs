//! Host command surface.
//!
//! ```text
//! host (FFI / UI / test)
//!   └── SessionHostHandle ──mpsc──> SessionHostActor
//!                                     └── SessionDirectory
//!                                           └── SessionController (one per local identity)
//! ```
//!
//! - [`actor`] - `SessionHostActor` and its `SessionHostHandle`
//! - [`messages`] - `HostCommand` mailbox messages

pub mod actor;
pub mod messages;

pub use actor::{SessionHostActor, SessionHostHandle};
pub use messages::HostCommand;
