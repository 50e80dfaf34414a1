// ==========================================
// PLC 硬件配置系统 - 操作日志数据仓储
// ==========================================
// 红线: 所有写入必须记录
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

fn map_action_log_row(row: &Row) -> rusqlite::Result<ActionLog> {
    let action_ts: String = row.get(3)?;
    let payload: Option<String> = row.get(5)?;
    Ok(ActionLog {
        action_id: row.get(0)?,
        project_id: row.get(1)?,
        action_type: row.get(2)?,
        action_ts: NaiveDateTime::parse_from_str(&action_ts, "%Y-%m-%d %H:%M:%S")
            .unwrap_or_default(),
        actor: row.get(4)?,
        payload_json: payload.and_then(|s| serde_json::from_str(&s).ok()),
        detail: row.get(6)?,
    })
}

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的操作日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入操作日志
    ///
    /// # 返回
    /// - `Ok(action_id)`: 成功插入,返回action_id
    /// - `Err(...)`: 数据库错误
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO action_log (
                action_id, project_id, action_type, action_ts, actor, payload_json, detail
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                log.action_id,
                log.project_id,
                log.action_type,
                log.action_ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                log.actor,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.detail,
            ],
        )?;

        Ok(log.action_id.clone())
    }

    /// 查询项目的操作日志（时间倒序）
    pub fn find_by_project(&self, project_id: i64, limit: usize) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, project_id, action_type, action_ts, actor, payload_json, detail
            FROM action_log
            WHERE project_id = ?1
            ORDER BY action_ts DESC, rowid DESC
            LIMIT ?2
            "#,
        )?;
        let logs = stmt
            .query_map(params![project_id, limit as i64], map_action_log_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action_log::ActionType;

    fn setup() -> ActionLogRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ActionLogRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_insert_and_find_by_project() {
        let repo = setup();

        let log = ActionLog::new(
            Some(7),
            ActionType::ProvisionNode,
            "tester",
            Some(serde_json::json!({"modules": 3})),
            Some("自动配置".to_string()),
        );
        repo.insert(&log).unwrap();
        repo.insert(&ActionLog::new(Some(8), ActionType::AssignIo, "tester", None, None))
            .unwrap();

        let logs = repo.find_by_project(7, 10).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action_type, "PROVISION_NODE");
        assert_eq!(logs[0].payload_json, Some(serde_json::json!({"modules": 3})));
    }
}
