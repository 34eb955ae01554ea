use crate::batch::BatchKind;
use anyhow::Context;
use sqlx::pool::PoolConnection;
use sqlx::Postgres;

// Advisory locks are scoped to the Postgres session, so the connection that took
// the lock is held until release. Used as a best-effort guard against two workers
// running the same batch at once.
const LOCK_NAMESPACE: i64 = 0x5343_4F52_4543; // "SCOREC"

fn lock_key(kind: BatchKind) -> i64 {
    let discriminant = match kind {
        BatchKind::Companies => 1,
        BatchKind::Assets => 2,
    };
    LOCK_NAMESPACE ^ discriminant
}

/// A held batch lock. Dropping it without [`BatchLock::release`] returns the
/// connection to the pool with the lock still taken, until the session ends.
#[derive(Debug)]
pub struct BatchLock {
    conn: PoolConnection<Postgres>,
    kind: BatchKind,
}

impl BatchLock {
    pub fn kind(&self) -> BatchKind {
        self.kind
    }

    /// Unlocks on the same session that acquired the lock. Returns whether
    /// Postgres reported the lock as held.
    pub async fn release(mut self) -> anyhow::Result<bool> {
        let key = lock_key(self.kind);
        let released: (bool,) = sqlx::query_as("SELECT pg_advisory_unlock($1)")
            .persistent(false)
            .bind(key)
            .fetch_one(&mut *self.conn)
            .await
            .with_context(|| format!("failed to release advisory lock (key={key})"))?;
        Ok(released.0)
    }
}

/// `None` when another session holds the lock for `kind`.
pub async fn try_acquire_batch_lock(
    pool: &sqlx::PgPool,
    kind: BatchKind,
) -> anyhow::Result<Option<BatchLock>> {
    let key = lock_key(kind);
    let mut conn = pool
        .acquire()
        .await
        .context("failed to acquire connection for advisory lock")?;
    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(key)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to acquire advisory lock (key={key})"))?;

    Ok(acquired.0.then_some(BatchLock { conn, kind }))
}
