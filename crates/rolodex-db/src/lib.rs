//! Storage layer for the Rolodex service.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! embedded SQL migrations, and the [`Record`] trait that entity crates
//! implement to get the create/update/delete/find/all lifecycle.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: the service is a single process with one
//!   database file; WAL gives concurrent readers alongside the single
//!   writer without an external database server.
//! - **`r2d2` connection pool**: bounded connection reuse. Nothing in this
//!   crate holds a global session; callers check a connection out of the
//!   pool and pass it to every operation explicitly.
//! - **Embedded migrations**: SQL ships inside the binary via
//!   `include_str!`, so the schema can never drift from the code built
//!   against it.

mod migrations;
mod pool;
mod record;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
pub use record::Record;
