// ==========================================
// PLC 硬件配置系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合引擎所需的全部仓储接口
// 说明: 字段为 trait 对象，测试可替换为故障注入替身
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    ModuleCatalog, ModuleInstanceRepository, ModuleInstanceStore, ModuleTypeRepository,
    NodeRepository, NodeStore, SignalRepository, SignalStore,
};

/// 引擎仓储集合
///
/// # 包含的仓储
/// - `signals`: I/O 信号
/// - `catalog`: 模块目录（只读）
/// - `modules`: 已配置模块
/// - `nodes`: 控制器节点
#[derive(Clone)]
pub struct IoRepositories {
    pub signals: Arc<dyn SignalStore>,
    pub catalog: Arc<dyn ModuleCatalog>,
    pub modules: Arc<dyn ModuleInstanceStore>,
    pub nodes: Arc<dyn NodeStore>,
}

impl IoRepositories {
    /// 创建新的仓储集合
    pub fn new(
        signals: Arc<dyn SignalStore>,
        catalog: Arc<dyn ModuleCatalog>,
        modules: Arc<dyn ModuleInstanceStore>,
        nodes: Arc<dyn NodeStore>,
    ) -> Self {
        Self {
            signals,
            catalog,
            modules,
            nodes,
        }
    }

    /// 基于同一个 SQLite 连接构造全部 rusqlite 仓储
    pub fn sqlite(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            signals: Arc::new(SignalRepository::new(conn.clone())),
            catalog: Arc::new(ModuleTypeRepository::new(conn.clone())),
            modules: Arc::new(ModuleInstanceRepository::new(conn.clone())),
            nodes: Arc::new(NodeRepository::new(conn)),
        }
    }
}
