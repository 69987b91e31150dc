//! Column Synchronizer: keeps the per-user column board consistent with
//! each todo's authoritative `status` field.
//!
//! Runs after the todo write has committed, within the same request. The
//! todo row is authoritative; failures here are recoverable and must never
//! undo the triggering mutation, so callers log and swallow the error.
//!
//! Every mutation is a read-modify-write of the user's settings row:
//! lenient parse of the stored blobs, a pure `ColumnBoard` transformation,
//! then a version-guarded write-back. When a concurrent request bumps the
//! version first, the transformation is reapplied against the fresh row.

use diesel_async::AsyncPgConnection;
use shared_types::ColumnBoard;
use uuid::Uuid;

use crate::db::column_settings;
use crate::metrics::Metrics;

/// Bound on reload-and-reapply attempts when the guarded write loses a race.
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Sync after a todo was created or its status changed.
///
/// If the user has no settings row yet, nothing happens: the next settings
/// read materializes defaults and a later sync picks the todo up.
pub async fn todo_saved(
    conn: &mut AsyncPgConnection,
    metrics: &Metrics,
    user_id: Uuid,
    todo_id: Uuid,
    status: &str,
) -> anyhow::Result<()> {
    let status = if status.is_empty() { "todo" } else { status };
    apply(conn, metrics, user_id, |board| {
        board.place_task(status, todo_id);
    })
    .await
}

/// Scrub a deleted todo's id from every column.
pub async fn todo_removed(
    conn: &mut AsyncPgConnection,
    metrics: &Metrics,
    user_id: Uuid,
    todo_id: Uuid,
) -> anyhow::Result<()> {
    apply(conn, metrics, user_id, |board| {
        board.remove_task(todo_id);
    })
    .await
}

/// Bulk variant of [`todo_removed`] used by delete-by-column: one
/// read-modify-write for all deleted ids.
pub async fn todos_removed(
    conn: &mut AsyncPgConnection,
    metrics: &Metrics,
    user_id: Uuid,
    todo_ids: &[Uuid],
) -> anyhow::Result<()> {
    apply(conn, metrics, user_id, |board| {
        for todo_id in todo_ids {
            board.remove_task(*todo_id);
        }
    })
    .await
}

async fn apply<F>(
    conn: &mut AsyncPgConnection,
    metrics: &Metrics,
    user_id: Uuid,
    transform: F,
) -> anyhow::Result<()>
where
    F: Fn(&mut ColumnBoard),
{
    metrics.sync_runs.incr();

    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let Some(row) = column_settings::get_by_user(conn, user_id).await? else {
            // No settings yet; defaults are materialized on first read.
            return Ok(());
        };

        if ColumnBoard::stored_is_malformed(&row.column_order, &row.columns_config) {
            metrics.sync_recoveries.incr();
        }
        let mut board = ColumnBoard::from_stored(&row.column_order, &row.columns_config);
        transform(&mut board);

        let (order_text, config_text) = board.to_stored();
        if column_settings::update_guarded(conn, row.id, row.version, &order_text, &config_text)
            .await?
        {
            return Ok(());
        }

        tracing::debug!(
            user_id = %user_id,
            attempt,
            "Column settings write lost a version race, retrying"
        );
    }

    anyhow::bail!(
        "Column settings for user {} kept changing under us after {} attempts",
        user_id,
        MAX_WRITE_ATTEMPTS
    )
}

/// Log-and-swallow wrapper for call sites inside todo mutations: the todo
/// write is authoritative and a settings-sync failure must not abort it.
pub fn log_sync_error(context: &str, result: anyhow::Result<()>) {
    if let Err(e) = result {
        tracing::warn!("Column sync failed after {}: {:#}", context, e);
    }
}
