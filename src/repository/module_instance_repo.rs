// ==========================================
// PLC 硬件配置系统 - 已配置模块数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 删除模块的写入（解除信号分配 / 删除 / 槽位前移）在同一事务内完成
// ==========================================

use crate::domain::hardware::{ModuleInstance, NewModuleInstance, PlcNode};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::traits::{ModuleInstanceStore, ModuleRemoval, ModuleReplacement};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};

fn map_module_row(row: &Row) -> rusqlite::Result<ModuleInstance> {
    Ok(ModuleInstance {
        module_id: row.get(0)?,
        node_id: row.get(1)?,
        project_id: row.get(2)?,
        module_type_id: row.get(3)?,
        slot: row.get(4)?,
        quantity: row.get(5)?,
    })
}

// ==========================================
// ModuleInstanceRepository - 已配置模块仓储
// ==========================================
pub struct ModuleInstanceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ModuleInstanceRepository {
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

    /// 在事务中插入一个模块
    fn insert_tx(
        tx: &Transaction,
        node: &PlcNode,
        module: &NewModuleInstance,
    ) -> RepositoryResult<ModuleInstance> {
        tx.execute(
            r#"
            INSERT INTO module_instance (node_id, project_id, module_type_id, slot, quantity)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                node.node_id,
                node.project_id,
                module.module_type_id,
                module.slot,
                module.quantity,
            ],
        )?;

        Ok(ModuleInstance {
            module_id: tx.last_insert_rowid(),
            node_id: node.node_id,
            project_id: node.project_id,
            module_type_id: module.module_type_id,
            slot: module.slot,
            quantity: module.quantity,
        })
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询模块
    pub fn find_by_id(&self, module_id: i64) -> RepositoryResult<Option<ModuleInstance>> {
        let conn = self.get_conn()?;
        let module = conn
            .query_row(
                r#"
                SELECT module_id, node_id, project_id, module_type_id, slot, quantity
                FROM module_instance WHERE module_id = ?1
                "#,
                params![module_id],
                map_module_row,
            )
            .optional()?;
        Ok(module)
    }

    /// 查询节点下模块（按槽位升序）
    pub fn find_by_node(&self, node_id: i64) -> RepositoryResult<Vec<ModuleInstance>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT module_id, node_id, project_id, module_type_id, slot, quantity
            FROM module_instance WHERE node_id = ?1
            ORDER BY slot, module_id
            "#,
        )?;
        let modules = stmt
            .query_map(params![node_id], map_module_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(modules)
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 整体替换节点模块（单事务，失败整体回滚）
    pub fn replace_for_node(
        &self,
        node: &PlcNode,
        modules: &[NewModuleInstance],
    ) -> RepositoryResult<ModuleReplacement> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let removed_modules: i64 = tx.query_row(
            "SELECT COUNT(*) FROM module_instance WHERE node_id = ?1",
            params![node.node_id],
            |row| row.get(0),
        )?;

        // 旧模块上的信号随模块一起解除分配
        let released_signals = tx.execute(
            r#"
            UPDATE io_signal
            SET module_id = NULL, slot = NULL, cpu = NULL, rack = NULL
            WHERE module_id IN (SELECT module_id FROM module_instance WHERE node_id = ?1)
            "#,
            params![node.node_id],
        )?;

        tx.execute(
            "DELETE FROM module_instance WHERE node_id = ?1",
            params![node.node_id],
        )?;

        let mut created = Vec::with_capacity(modules.len());
        for module in modules {
            created.push(Self::insert_tx(&tx, node, module)?);
        }

        tx.commit()?;

        created.sort_by_key(|m| m.slot);
        Ok(ModuleReplacement {
            removed_modules: removed_modules as usize,
            released_signals,
            created,
        })
    }

    /// 追加模块到节点末尾
    pub fn append(
        &self,
        node: &PlcNode,
        module_type_id: i64,
        quantity: i32,
    ) -> RepositoryResult<ModuleInstance> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let next_slot: i32 = tx.query_row(
            "SELECT COALESCE(MAX(slot), 0) + 1 FROM module_instance WHERE node_id = ?1",
            params![node.node_id],
            |row| row.get(0),
        )?;

        let module = Self::insert_tx(
            &tx,
            node,
            &NewModuleInstance {
                module_type_id,
                slot: next_slot,
                quantity,
            },
        )?;

        tx.commit()?;
        Ok(module)
    }

    /// 删除模块并前移后续槽位
    ///
    /// 步骤（单事务）:
    /// 1. 解除该模块上全部信号的分配
    /// 2. 删除模块
    /// 3. 同节点内槽位大于被删槽位的模块槽位减 1
    /// 4. 同步这些模块上信号的槽位镜像
    pub fn delete_and_renumber(&self, module_id: i64) -> RepositoryResult<ModuleRemoval> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let removed = tx
            .query_row(
                r#"
                SELECT module_id, node_id, project_id, module_type_id, slot, quantity
                FROM module_instance WHERE module_id = ?1
                "#,
                params![module_id],
                map_module_row,
            )
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "ModuleInstance".to_string(),
                id: module_id.to_string(),
            })?;

        let released_signals = tx.execute(
            r#"
            UPDATE io_signal
            SET module_id = NULL, slot = NULL, cpu = NULL, rack = NULL
            WHERE module_id = ?1
            "#,
            params![module_id],
        )?;

        tx.execute(
            "DELETE FROM module_instance WHERE module_id = ?1",
            params![module_id],
        )?;

        let renumbered_modules = tx.execute(
            "UPDATE module_instance SET slot = slot - 1 WHERE node_id = ?1 AND slot > ?2",
            params![removed.node_id, removed.slot],
        )?;

        tx.execute(
            r#"
            UPDATE io_signal
            SET slot = (SELECT m.slot FROM module_instance m WHERE m.module_id = io_signal.module_id)
            WHERE module_id IN (SELECT module_id FROM module_instance WHERE node_id = ?1)
            "#,
            params![removed.node_id],
        )?;

        tx.commit()?;

        Ok(ModuleRemoval {
            removed,
            renumbered_modules,
            released_signals,
        })
    }
}

// ==========================================
// ModuleInstanceStore trait 实现
// ==========================================
#[async_trait]
impl ModuleInstanceStore for ModuleInstanceRepository {
    async fn find_module(&self, module_id: i64) -> RepositoryResult<Option<ModuleInstance>> {
        self.find_by_id(module_id)
    }

    async fn list_by_node(&self, node_id: i64) -> RepositoryResult<Vec<ModuleInstance>> {
        self.find_by_node(node_id)
    }

    async fn replace_node_modules(
        &self,
        node: &PlcNode,
        modules: &[NewModuleInstance],
    ) -> RepositoryResult<ModuleReplacement> {
        self.replace_for_node(node, modules)
    }

    async fn append_module(
        &self,
        node: &PlcNode,
        module_type_id: i64,
        quantity: i32,
    ) -> RepositoryResult<ModuleInstance> {
        self.append(node, module_type_id, quantity)
    }

    async fn remove_and_renumber(&self, module_id: i64) -> RepositoryResult<ModuleRemoval> {
        self.delete_and_renumber(module_id)
    }
}
