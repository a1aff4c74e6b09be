//! # Session Test Utilities
//!
//! Mocks and fixtures for exercising the session controller without a real
//! communication engine.
//!
//! ## Modules
//!
//! - `mock_engine` - Mock peer, connection, room, stream, capture, factory
//!   and render target registry
//! - `recording_sink` - Event sink that records deliveries
//! - `fixtures` - Config, options and a pre-wired controller harness
//!
//! ## Usage
//!
//! ```rust,ignore
//! use session_test_utils::*;
//!
//! #[test]
//! fn test_example() {
//!     let harness = SessionHarness::new("alice").with_local_stream();
//!     harness.controller.start_call("bob").unwrap();
//!
//!     let connection = harness.peer.last_call().unwrap();
//!     connection.deliver_stream();
//!     assert_eq!(harness.sink.count(EventKind::RemoteStreamAdded), 1);
//! }
//! ```

pub mod fixtures;
pub mod mock_engine;
pub mod recording_sink;

pub use fixtures::*;
pub use mock_engine::*;
pub use recording_sink::RecordingSink;
