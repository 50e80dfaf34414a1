// ==========================================
// PLC 硬件配置系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod module_instance_repo;
pub mod module_type_repo;
pub mod node_repo;
pub mod signal_repo;
pub mod traits;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use module_instance_repo::ModuleInstanceRepository;
pub use module_type_repo::{default_catalog, ModuleTypeRepository, NewModuleType};
pub use node_repo::NodeRepository;
pub use signal_repo::SignalRepository;
pub use traits::{
    IoAddress, ModuleCatalog, ModuleInstanceStore, ModuleRemoval, ModuleReplacement, NodeStore,
    SignalStore,
};
