/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a health check
/// - `migrations`: embedded schema migrations
///
/// The queries themselves live in [`crate::store::postgres`].

pub mod migrations;
pub mod pool;
