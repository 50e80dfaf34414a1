// ==========================================
// PLC 硬件配置系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod hardware;
pub mod signal;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use hardware::{
    ChannelCapacity, ModuleInstance, ModuleType, NewModuleInstance, NodeTemplate, PlcNode,
};
pub use signal::{IoSignal, NewIoSignal};
pub use types::{CapacityField, PositionTag, SignalType};
