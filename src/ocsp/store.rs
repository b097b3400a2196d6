use diesel::prelude::*;
use futures::future::BoxFuture;
use std::time::Duration;

use super::models::CertificateStatus;
use super::schema::certificate_status;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no certificate status row")]
    NoRows,
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("no database connection available")]
    PoolUnavailable,
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

/// Single-row lookup of certificate status by canonical serial.
///
/// `timeout` is advisory for the store: the caller enforces it as well, but a
/// store that can abort the work server-side should do so.
pub trait StatusStore: Send + Sync {
    fn select_certificate_status<'a>(
        &'a self, serial: &'a str, timeout: Option<Duration>,
    ) -> BoxFuture<'a, Result<CertificateStatus, StoreError>>;
}

pub type DBPool = rocket_sync_db_pools::ConnectionPool<crate::DBConn, diesel::PgConnection>;

pub struct PgStatusStore {
    pool: DBPool,
}

impl PgStatusStore {
    pub fn new(pool: DBPool) -> PgStatusStore {
        PgStatusStore {
            pool
        }
    }
}

impl std::fmt::Debug for PgStatusStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("PgStatusStore").finish_non_exhaustive()
    }
}

impl StatusStore for PgStatusStore {
    fn select_certificate_status<'a>(
        &'a self, serial: &'a str, timeout: Option<Duration>,
    ) -> BoxFuture<'a, Result<CertificateStatus, StoreError>> {
        let serial = serial.to_string();
        Box::pin(async move {
            let conn = match self.pool.get().await {
                Some(c) => c,
                None => return Err(StoreError::PoolUnavailable),
            };
            conn.run(move |c| select_certificate_status(c, &serial, timeout)).await
        })
    }
}

/// Runs the lookup in a read-only transaction. With a timeout, Postgres
/// cancels the statement itself so the connection goes back to the pool even
/// after the caller has stopped waiting.
fn select_certificate_status(
    conn: &mut diesel::PgConnection, serial: &str, timeout: Option<Duration>,
) -> Result<CertificateStatus, StoreError> {
    conn.build_transaction().read_only().run(|c| {
        if let Some(timeout) = timeout {
            diesel::sql_query(format!("SET LOCAL statement_timeout = {}", timeout.as_millis().max(1)))
                .execute(c)?;
        }
        certificate_status::table
            .filter(certificate_status::serial.eq(serial))
            .first::<CertificateStatus>(c)
    }).map_err(query_error)
}

/// A missing row is the only failure that means "no such certificate".
fn query_error(err: diesel::result::Error) -> StoreError {
    match err {
        diesel::result::Error::NotFound => StoreError::NoRows,
        e => StoreError::Database(e),
    }
}
