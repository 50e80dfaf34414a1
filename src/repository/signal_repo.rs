// ==========================================
// PLC 硬件配置系统 - I/O 信号数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 类型标签写入前规范化为标准代码，未识别标签原样保存
// ==========================================

use crate::domain::hardware::ModuleInstance;
use crate::domain::signal::{IoSignal, NewIoSignal};
use crate::domain::types::{PositionTag, SignalType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::traits::{IoAddress, SignalStore};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// 外部写入的行可能保留历史标签，按类型过滤时两种标签都要匹配
const TYPE_MATCH: &str = "UPPER(TRIM(signal_type)) IN (?2, ?3)";

const SIGNAL_COLUMNS: &str =
    "signal_id, project_id, code, description, signal_type, position, module_id, slot, cpu, rack";

/// 行映射
fn map_signal_row(row: &Row) -> rusqlite::Result<IoSignal> {
    let type_tag: String = row.get(4)?;
    let position: Option<String> = row.get(5)?;
    Ok(IoSignal {
        signal_id: row.get(0)?,
        project_id: row.get(1)?,
        code: row.get(2)?,
        description: row.get(3)?,
        signal_type: SignalType::from_tag(&type_tag),
        type_tag,
        position: PositionTag::from_db(position.as_deref()),
        module_id: row.get(6)?,
        slot: row.get(7)?,
        cpu: row.get(8)?,
        rack: row.get(9)?,
    })
}

// ==========================================
// SignalRepository - 信号仓储
// ==========================================

/// 信号仓储
/// 职责: 管理 io_signal 表的读写
pub struct SignalRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SignalRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入信号（信号清单导入）
    ///
    /// # 返回
    /// - Ok(signal_id): 新信号ID
    pub fn insert(&self, signal: &NewIoSignal) -> RepositoryResult<i64> {
        if signal.code.trim().is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "code".to_string(),
                message: "信号编号不能为空".to_string(),
            });
        }

        let conn = self.get_conn()?;
        let type_tag = SignalType::from_tag(&signal.type_tag)
            .map(|t| t.code().to_string())
            .unwrap_or_else(|| signal.type_tag.clone());

        conn.execute(
            r#"
            INSERT INTO io_signal (project_id, code, description, signal_type, position)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                signal.project_id,
                signal.code,
                signal.description,
                type_tag,
                signal.position,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 批量插入信号（事务化）
    pub fn batch_insert(&self, signals: &[NewIoSignal]) -> RepositoryResult<Vec<i64>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut ids = Vec::with_capacity(signals.len());
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO io_signal (project_id, code, description, signal_type, position)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for signal in signals {
                let type_tag = SignalType::from_tag(&signal.type_tag)
                    .map(|t| t.code().to_string())
                    .unwrap_or_else(|| signal.type_tag.clone());
                stmt.execute(params![
                    signal.project_id,
                    signal.code,
                    signal.description,
                    type_tag,
                    signal.position,
                ])?;
                ids.push(tx.last_insert_rowid());
            }
        }

        tx.commit()?;
        Ok(ids)
    }

    /// 将一组信号写入模块（单事务）
    pub fn assign_batch(
        &self,
        module: &ModuleInstance,
        signal_ids: &[i64],
        address: Option<&IoAddress>,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let cpu = address.map(|a| a.cpu.as_str());
        let rack = address.map(|a| a.rack.as_str());

        let mut updated = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                UPDATE io_signal
                SET module_id = ?1, slot = ?2,
                    cpu = COALESCE(?3, cpu), rack = COALESCE(?4, rack)
                WHERE signal_id = ?5 AND project_id = ?6
                "#,
            )?;
            for signal_id in signal_ids {
                updated += stmt.execute(params![
                    module.module_id,
                    module.slot,
                    cpu,
                    rack,
                    signal_id,
                    module.project_id,
                ])?;
            }
        }

        tx.commit()?;
        Ok(updated)
    }

    /// 清空信号分配
    ///
    /// # 返回
    /// - Ok(true): 清空前处于已分配状态
    /// - Ok(false): 原本未分配（无变化）
    /// - Err(NotFound): 信号不存在
    pub fn clear(&self, signal_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let current: Option<Option<i64>> = conn
            .query_row(
                "SELECT module_id FROM io_signal WHERE signal_id = ?1",
                params![signal_id],
                |row| row.get(0),
            )
            .optional()?;

        let was_assigned = match current {
            None => {
                return Err(RepositoryError::NotFound {
                    entity: "IoSignal".to_string(),
                    id: signal_id.to_string(),
                })
            }
            Some(module_id) => module_id.is_some(),
        };

        conn.execute(
            "UPDATE io_signal SET module_id = NULL, slot = NULL, cpu = NULL, rack = NULL WHERE signal_id = ?1",
            params![signal_id],
        )?;

        Ok(was_assigned)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询信号
    pub fn find_by_id(&self, signal_id: i64) -> RepositoryResult<Option<IoSignal>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM io_signal WHERE signal_id = ?1", SIGNAL_COLUMNS);
        let signal = conn
            .query_row(&sql, params![signal_id], map_signal_row)
            .optional()?;
        Ok(signal)
    }

    /// 查询项目全部信号（按 signal_id 升序）
    pub fn list_by_project(&self, project_id: i64) -> RepositoryResult<Vec<IoSignal>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM io_signal WHERE project_id = ?1 ORDER BY signal_id",
            SIGNAL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let signals = stmt
            .query_map(params![project_id], map_signal_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(signals)
    }

    /// 查询项目未分配信号（可按类型过滤，按 signal_id 升序）
    pub fn find_unassigned(
        &self,
        project_id: i64,
        signal_type: Option<SignalType>,
    ) -> RepositoryResult<Vec<IoSignal>> {
        let conn = self.get_conn()?;

        let signals = match signal_type {
            Some(t) => {
                let sql = format!(
                    r#"
                    SELECT {} FROM io_signal
                    WHERE project_id = ?1 AND module_id IS NULL AND {}
                    ORDER BY signal_id
                    "#,
                    SIGNAL_COLUMNS, TYPE_MATCH
                );
                let [code, legacy] = t.accepted_tags();
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![project_id, code, legacy], map_signal_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let sql = format!(
                    r#"
                    SELECT {} FROM io_signal
                    WHERE project_id = ?1 AND module_id IS NULL
                    ORDER BY signal_type, signal_id
                    "#,
                    SIGNAL_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![project_id], map_signal_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };

        Ok(signals)
    }

    /// 查询模块上的信号
    pub fn find_by_module(&self, module_id: i64) -> RepositoryResult<Vec<IoSignal>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM io_signal WHERE module_id = ?1 ORDER BY signal_id",
            SIGNAL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let signals = stmt
            .query_map(params![module_id], map_signal_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(signals)
    }

    /// 统计项目内某类型信号数
    pub fn count_by_type(&self, project_id: i64, signal_type: SignalType) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let [code, legacy] = signal_type.accepted_tags();
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM io_signal WHERE project_id = ?1 AND {}",
                TYPE_MATCH
            ),
            params![project_id, code, legacy],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 统计模块上某类型信号数
    pub fn count_by_module_and_type(
        &self,
        module_id: i64,
        signal_type: SignalType,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let [code, legacy] = signal_type.accepted_tags();
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM io_signal WHERE module_id = ?1 AND {}",
                TYPE_MATCH
            ),
            params![module_id, code, legacy],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

// ==========================================
// SignalStore trait 实现
// ==========================================
#[async_trait]
impl SignalStore for SignalRepository {
    async fn find_signal(&self, signal_id: i64) -> RepositoryResult<Option<IoSignal>> {
        self.find_by_id(signal_id)
    }

    async fn count_by_project_and_type(
        &self,
        project_id: i64,
        signal_type: SignalType,
    ) -> RepositoryResult<usize> {
        self.count_by_type(project_id, signal_type)
    }

    async fn list_unassigned(
        &self,
        project_id: i64,
        signal_type: Option<SignalType>,
    ) -> RepositoryResult<Vec<IoSignal>> {
        self.find_unassigned(project_id, signal_type)
    }

    async fn count_on_module(&self, module_id: i64, signal_type: SignalType) -> RepositoryResult<usize> {
        self.count_by_module_and_type(module_id, signal_type)
    }

    async fn list_by_module(&self, module_id: i64) -> RepositoryResult<Vec<IoSignal>> {
        self.find_by_module(module_id)
    }

    async fn assign_to_module(
        &self,
        module: &ModuleInstance,
        signal_ids: &[i64],
        address: Option<&IoAddress>,
    ) -> RepositoryResult<usize> {
        self.assign_batch(module, signal_ids, address)
    }

    async fn clear_assignment(&self, signal_id: i64) -> RepositoryResult<bool> {
        self.clear(signal_id)
    }
}
