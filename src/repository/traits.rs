// ==========================================
// PLC 硬件配置系统 - 仓储接口 (Trait)
// ==========================================
// 职责: 定义引擎所需的数据访问接口（不包含实现）
// 实现者: *Repository（使用 rusqlite），测试中可替换为替身
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::hardware::{ModuleInstance, ModuleType, NewModuleInstance, NodeTemplate, PlcNode};
use crate::domain::signal::IoSignal;
use crate::domain::types::SignalType;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ==========================================
// 写入结果载体
// ==========================================

/// 批量分配时写入信号的地址信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoAddress {
    pub cpu: String,
    pub rack: String,
}

/// 节点模块整体替换结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleReplacement {
    pub removed_modules: usize,      // 删除的旧模块数
    pub released_signals: usize,     // 因删除而解除分配的信号数
    pub created: Vec<ModuleInstance>, // 新建模块（按槽位升序）
}

/// 单个模块删除结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRemoval {
    pub removed: ModuleInstance,  // 被删除的模块
    pub renumbered_modules: usize, // 槽位前移的兄弟模块数
    pub released_signals: usize,   // 解除分配的信号数
}

// ==========================================
// SignalStore - 信号仓储接口
// ==========================================
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// 按ID查询信号
    async fn find_signal(&self, signal_id: i64) -> RepositoryResult<Option<IoSignal>>;

    /// 统计项目内某类型信号总数（含已分配）
    async fn count_by_project_and_type(
        &self,
        project_id: i64,
        signal_type: SignalType,
    ) -> RepositoryResult<usize>;

    /// 查询项目内未分配信号（按 signal_id 升序，即导入顺序）
    async fn list_unassigned(
        &self,
        project_id: i64,
        signal_type: Option<SignalType>,
    ) -> RepositoryResult<Vec<IoSignal>>;

    /// 统计模块上某类型的已分配信号数
    async fn count_on_module(&self, module_id: i64, signal_type: SignalType) -> RepositoryResult<usize>;

    /// 查询模块上的全部信号
    async fn list_by_module(&self, module_id: i64) -> RepositoryResult<Vec<IoSignal>>;

    /// 将一组信号分配到模块（单事务提交）
    ///
    /// # 返回
    /// 实际更新的信号数
    async fn assign_to_module(
        &self,
        module: &ModuleInstance,
        signal_ids: &[i64],
        address: Option<&IoAddress>,
    ) -> RepositoryResult<usize>;

    /// 清空信号的模块 / 槽位 / 地址引用
    ///
    /// # 返回
    /// 清空前是否处于已分配状态
    async fn clear_assignment(&self, signal_id: i64) -> RepositoryResult<bool>;
}

// ==========================================
// ModuleCatalog - 模块目录接口（只读）
// ==========================================
#[async_trait]
pub trait ModuleCatalog: Send + Sync {
    /// 按型号名称查询
    async fn find_type_by_name(&self, name: &str) -> RepositoryResult<Option<ModuleType>>;

    /// 按ID查询
    async fn find_type(&self, module_type_id: i64) -> RepositoryResult<Option<ModuleType>>;
}

// ==========================================
// ModuleInstanceStore - 已配置模块接口
// ==========================================
#[async_trait]
pub trait ModuleInstanceStore: Send + Sync {
    /// 按ID查询模块
    async fn find_module(&self, module_id: i64) -> RepositoryResult<Option<ModuleInstance>>;

    /// 查询节点下全部模块（按槽位升序）
    async fn list_by_node(&self, node_id: i64) -> RepositoryResult<Vec<ModuleInstance>>;

    /// 整体替换节点模块（删除旧模块 + 解除其信号分配 + 创建新模块，单事务）
    async fn replace_node_modules(
        &self,
        node: &PlcNode,
        modules: &[NewModuleInstance],
    ) -> RepositoryResult<ModuleReplacement>;

    /// 在节点末尾追加一个模块（槽位 = 当前最大槽位 + 1）
    async fn append_module(
        &self,
        node: &PlcNode,
        module_type_id: i64,
        quantity: i32,
    ) -> RepositoryResult<ModuleInstance>;

    /// 删除模块并前移后续槽位（同时解除其信号分配，单事务）
    async fn remove_and_renumber(&self, module_id: i64) -> RepositoryResult<ModuleRemoval>;
}

// ==========================================
// NodeStore - 节点仓储接口
// ==========================================
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// 按ID查询节点
    async fn find_node(&self, node_id: i64) -> RepositoryResult<Option<PlcNode>>;

    /// 按项目与名称查找，不存在则按模板创建
    ///
    /// # 返回
    /// (节点, 是否新建)
    async fn find_or_create(
        &self,
        project_id: i64,
        template: &NodeTemplate,
    ) -> RepositoryResult<(PlcNode, bool)>;
}
