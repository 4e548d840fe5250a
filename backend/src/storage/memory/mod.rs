//! In-memory document store used for local runs and tests.

pub mod connection;
pub mod listener;

pub use connection::MemoryConnection;
pub use listener::MemorySnapshotListener;
