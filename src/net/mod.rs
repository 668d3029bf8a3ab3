//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (bounded read of the request head, response write)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - A semaphore permit is held per connection; one permit means serial handling
//! - Each connection tracked for graceful shutdown

pub mod connection;
pub mod listener;

pub use connection::{read_request, write_response, ConnectionId, ConnectionTracker, ReadError};
pub use listener::{ConnectionPermit, Listener, ListenerError};
