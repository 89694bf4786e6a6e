//! Connectify: a relationship directory with jittered check-in scheduling.
//!
//! Each user keeps a set of contacts. Every contact carries a check-in
//! frequency and the date of the next check-in, which is recomputed with
//! random jitter whenever the frequency is set.
//!
//! # Architecture
//!
//! - **`checkin_core`**: pure scheduling, validation and partial-update engine
//! - **Store**: keyed point operations over SQLite or an in-process map
//! - **Directory**: create / get / update / delete orchestration
//! - **Server**: JSON-over-HTTP surface via `axum`

pub mod config;
pub mod directory;
pub mod error;
pub mod server;
pub mod startup;
pub mod store;

pub use config::ConnectifyConfig;
pub use directory::{DeleteConfirmation, Directory, DirectoryError, ErrorKind};
pub use error::{ConnectifyError, Result};
pub use server::ConnectifyServer;
pub use store::{MemoryStore, RelationshipStore, SqliteStore, StoreError};
