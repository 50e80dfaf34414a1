// ==========================================
// PLC 硬件配置系统 - 控制器节点数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::hardware::{NodeTemplate, PlcNode};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::traits::NodeStore;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

fn map_node_row(row: &Row) -> rusqlite::Result<PlcNode> {
    Ok(PlcNode {
        node_id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        node_type: row.get(3)?,
        description: row.get(4)?,
    })
}

// ==========================================
// NodeRepository - 节点仓储
// ==========================================
pub struct NodeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl NodeRepository {
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

    /// 按ID查询节点
    pub fn find_by_id(&self, node_id: i64) -> RepositoryResult<Option<PlcNode>> {
        let conn = self.get_conn()?;
        let node = conn
            .query_row(
                r#"
                SELECT node_id, project_id, name, node_type, description
                FROM plc_node WHERE node_id = ?1
                "#,
                params![node_id],
                map_node_row,
            )
            .optional()?;
        Ok(node)
    }

    /// 按项目与名称查询节点（同名取最小ID）
    pub fn find_by_name(&self, project_id: i64, name: &str) -> RepositoryResult<Option<PlcNode>> {
        let conn = self.get_conn()?;
        let node = conn
            .query_row(
                r#"
                SELECT node_id, project_id, name, node_type, description
                FROM plc_node WHERE project_id = ?1 AND name = ?2
                ORDER BY node_id LIMIT 1
                "#,
                params![project_id, name],
                map_node_row,
            )
            .optional()?;
        Ok(node)
    }

    /// 查询项目全部节点（按名称排序）
    pub fn list_by_project(&self, project_id: i64) -> RepositoryResult<Vec<PlcNode>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT node_id, project_id, name, node_type, description
            FROM plc_node WHERE project_id = ?1
            ORDER BY name, node_id
            "#,
        )?;
        let nodes = stmt
            .query_map(params![project_id], map_node_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(nodes)
    }

    /// 创建节点
    pub fn insert(&self, project_id: i64, template: &NodeTemplate) -> RepositoryResult<PlcNode> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO plc_node (project_id, name, node_type, description)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                project_id,
                template.name,
                template.node_type,
                template.description,
            ],
        )?;

        Ok(PlcNode {
            node_id: conn.last_insert_rowid(),
            project_id,
            name: template.name.clone(),
            node_type: template.node_type.clone(),
            description: template.description.clone(),
        })
    }

    /// 查找或创建节点
    pub fn get_or_create(
        &self,
        project_id: i64,
        template: &NodeTemplate,
    ) -> RepositoryResult<(PlcNode, bool)> {
        if let Some(node) = self.find_by_name(project_id, &template.name)? {
            return Ok((node, false));
        }
        let node = self.insert(project_id, template)?;
        Ok((node, true))
    }
}

// ==========================================
// NodeStore trait 实现
// ==========================================
#[async_trait]
impl NodeStore for NodeRepository {
    async fn find_node(&self, node_id: i64) -> RepositoryResult<Option<PlcNode>> {
        self.find_by_id(node_id)
    }

    async fn find_or_create(
        &self,
        project_id: i64,
        template: &NodeTemplate,
    ) -> RepositoryResult<(PlcNode, bool)> {
        self.get_or_create(project_id, template)
    }
}
