//! Command transport over a Unix socket.
//!
//! External tools (key-bind helpers, scripts, the bundled `dapperc`) connect
//! to the socket and send one command per connection.

pub mod client;
pub mod listener;
