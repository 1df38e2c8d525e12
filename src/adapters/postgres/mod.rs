//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSeatLedger` - Transactional seat reservation and release
//! - `PostgresEventRepository` - Event persistence
//! - `PostgresUserDirectory` - Contact lookup for notifications

mod event_repository;
mod seat_ledger;
mod user_directory;

pub use event_repository::PostgresEventRepository;
pub use seat_ledger::PostgresSeatLedger;
pub use user_directory::PostgresUserDirectory;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
