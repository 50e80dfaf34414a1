// ==========================================
// PLC 硬件配置系统 - 核心库
// ==========================================
// 职责: 控制器节点模块自动配置 + I/O 信号分配
// 技术栈: Rust + SQLite (rusqlite) + tokio
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 配置计算 / 分配规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CapacityField, PositionTag, SignalType};

// 领域实体
pub use domain::{
    ActionLog, ActionType, ChannelCapacity, IoSignal, ModuleInstance, ModuleType, NewIoSignal,
    NodeTemplate, PlcNode,
};

// 引擎
pub use engine::{
    AssignOutcome, EngineError, IoAllocator, ManualAssignmentGateway, NodeProvisioner,
    ProvisioningOrchestrator, SignalClassifier,
};

// API
pub use api::{ApiResponse, IoApi, ProvisioningApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "PLC 硬件配置系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
