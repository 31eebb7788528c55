//! # Squad Persistence
//!
//! Conversation memory for the squad advisor: an append-only log of
//! [`squad_core::ConversationTurn`]s per session.
//!
//! Supports:
//! - In-memory (for testing)
//! - SQLite (for single-node use)
//!
//! ## Quick Start
//!
//! ```rust
//! use squad_persist::{Memory, SqliteConfig, SqliteMemory};
//! use squad_core::SessionId;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let memory = SqliteMemory::open(SqliteConfig::memory()).await.unwrap();
//! let session = SessionId::generate();
//! assert_eq!(memory.next_sequence(&session).await.unwrap(), 1);
//! # }
//! ```

pub mod backend;
pub mod sqlite;

pub use backend::{Memory, MemoryBackend, SessionSummary, StorageError};
pub use sqlite::{SqliteConfig, SqliteMemory};
