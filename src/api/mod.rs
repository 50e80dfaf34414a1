// ==========================================
// PLC 硬件配置系统 - API 层
// ==========================================
// 职责: 对外业务接口，统一返回 ApiResponse
// ==========================================

mod audit;
pub mod error;
pub mod io_api;
pub mod provisioning_api;
pub mod response;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use io_api::IoApi;
pub use provisioning_api::ProvisioningApi;
pub use response::ApiResponse;
