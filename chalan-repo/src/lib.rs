//! # Chalan Repository
//!
//! Concrete repository implementations (adapters) for the chalan
//! service. [`SqliteRepo`] is the production adapter; [`MemoryRepo`]
//! backs the service-level test suite and doubles as a reference
//! implementation of the port's transactional semantics.

pub mod memory;
pub mod sqlite;

mod types;


pub use memory::MemoryRepo;
pub use sqlite::SqliteRepo;

/// Build and initialize a SQLite repository from a database URL.
///
/// Connects, runs the embedded migrations, and returns a ready-to-use
/// repo.
///
/// # Examples
///
/// ```ignore
/// let repo = build_repo("sqlite://chalan.db?mode=rwc").await?;
/// ```
pub async fn build_repo(database_url: &str) -> anyhow::Result<SqliteRepo> {
    SqliteRepo::new(database_url).await
}
