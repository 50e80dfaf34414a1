// ==========================================
// PLC 硬件配置系统 - 操作日志记录
// ==========================================
// 失败只记录警告，不影响主要操作
// ==========================================

use crate::domain::action_log::{ActionLog, ActionType};
use crate::repository::action_log_repo::ActionLogRepository;
use serde_json::Value as JsonValue;
use tracing::warn;

pub(crate) fn record_action(
    repo: &ActionLogRepository,
    project_id: Option<i64>,
    action_type: ActionType,
    actor: &str,
    payload: JsonValue,
    detail: String,
) {
    let log = ActionLog::new(project_id, action_type, actor, Some(payload), Some(detail));
    if let Err(e) = repo.insert(&log) {
        warn!(error = %e, action_type = %action_type, "记录操作日志失败");
    }
}
