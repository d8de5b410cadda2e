//! Messaging Module
//!
//! Rate-limited direct messaging between the privileged account and
//! everybody else.
//!
//! # Module Structure
//!
//! ```text
//! messaging/
//! ├── mod.rs        - Module exports
//! ├── gateway.rs    - send, threads, mark read, quota, delete
//! ├── db.rs         - ConversationStore (PostgreSQL and in-memory)
//! ├── quota.rs      - calendar-day quota policy
//! ├── privileged.rs - the designated recipient of standard users' messages
//! ├── clock.rs      - time source
//! └── handlers.rs   - HTTP handlers
//! ```

pub mod clock;
pub mod db;
pub mod gateway;
pub mod handlers;
pub mod privileged;
pub mod quota;

pub use clock::{Clock, ManualClock, SystemClock};
pub use db::{AppendOutcome, ConversationStore, MemoryConversationStore, PgConversationStore};
pub use gateway::MessageGateway;
pub use handlers::*;
pub use privileged::PrivilegedAccount;
pub use quota::{QuotaPolicy, DEFAULT_DAILY_LIMIT};
