use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use diesel::{
    Connection, PgConnection,
    connection::CacheSize,
    r2d2::{ConnectionManager, CustomizeConnection, Error as R2d2Error, Pool},
};

// Prepared statements break behind transaction-mode poolers (pgbouncer / Supavisor).
#[derive(Debug, Default)]
struct DisablePreparedStatements;

impl CustomizeConnection<PgConnection, R2d2Error> for DisablePreparedStatements {
    fn on_acquire(&self, conn: &mut PgConnection) -> std::result::Result<(), R2d2Error> {
        conn.set_prepared_statement_cache_size(CacheSize::Disabled);
        Ok(())
    }
}

pub type PgPoolSquad = Pool<ConnectionManager<PgConnection>>;

pub fn establish_connection(
    database_url: &str,
    max_size: u32,
    connection_timeout: Duration,
) -> Result<PgPoolSquad> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size.max(1))
        .connection_timeout(connection_timeout)
        .connection_customizer(Box::new(DisablePreparedStatements))
        .build(manager)
        .context("failed to build postgres connection pool")?;
    Ok(pool)
}

/// Runs blocking diesel work on the blocking pool so callers can put a
/// deadline on it without stalling the async runtime.
pub async fn with_connection<T, F>(db_pool: &Arc<PgPoolSquad>, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
{
    let db_pool = Arc::clone(db_pool);
    tokio::task::spawn_blocking(move || {
        let mut conn = db_pool.get().context("failed to check out a connection")?;
        work(&mut conn)
    })
    .await
    .context("blocking database task panicked")?
}
