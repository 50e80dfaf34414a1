// ==========================================
// PLC 硬件配置系统 - 引擎层
// ==========================================
// 职责: 模块配置计算、I/O 分配、人工分配校验
// 红线: Engine 不拼 SQL，只通过仓储接口访问存储
// ==========================================

pub mod allocator;
pub mod classifier;
pub mod error;
pub mod locks;
pub mod manual_assignment;
pub mod orchestrator;
pub mod provisioner;
pub mod repositories;

// 重导出核心引擎
pub use allocator::{AllocationReport, IoAllocator, ModuleFill, SkippedModule};
pub use classifier::{capacity_field, standard_module_name, Admission, SignalClassifier};
pub use error::{EngineError, EngineResult};
pub use locks::{KeyGuard, KeyedLocks};
pub use manual_assignment::{AssignOutcome, ManualAssignmentGateway, RemoveOutcome};
pub use orchestrator::{AutoConfigureReport, ModuleView, ProvisioningOrchestrator};
pub use provisioner::{NodeProvisioner, ProvisionReport, SkippedType, TypeSizing};
pub use repositories::IoRepositories;
