use tracing::warn;

use crate::db::models::audit::NewAuditEntry;
use crate::db::store::RecordStore;

/// Appends an audit entry. A failed write is logged and never fails the caller.
pub async fn record(store: &dyn RecordStore, entry: NewAuditEntry) {
    let request_id = entry.request_id;
    let action = entry.action.clone();
    if let Err(e) = store.append_audit(entry).await {
        warn!("⚠️ Failed to write audit entry {} for pengajuan {}: {}", action, request_id, e);
    }
}
