use sea_orm::{ActiveValue::NotSet, EntityTrait, Set};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    db::OrmConn,
    entity::{AuditLogs, audit_logs::ActiveModel as AuditActive},
    error::AppResult,
};

pub async fn log_audit(
    orm: &OrmConn,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    let entry = AuditActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        action: Set(action.to_string()),
        resource: Set(resource.map(str::to_string)),
        metadata: Set(metadata),
        created_at: NotSet,
    };
    AuditLogs::insert(entry).exec_without_returning(orm).await?;
    Ok(())
}

/// Records an audit entry; failures are logged and never surface to the caller.
pub async fn record(
    orm: &OrmConn,
    user_id: Uuid,
    action: &str,
    resource: &str,
    metadata: Value,
) {
    if let Err(err) = log_audit(orm, Some(user_id), action, Some(resource), Some(metadata)).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
