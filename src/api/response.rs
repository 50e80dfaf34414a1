// ==========================================
// PLC 硬件配置系统 - API 统一响应
// ==========================================
// 格式: { success, message, data }
// 约束: 调用方只会收到响应对象，不会收到原始错误
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// 业务上的否定结果（携带数据说明原因）
    pub fn rejected(message: impl Into<String>, data: T) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Some(data),
        }
    }

    /// 将 ApiResult 折叠为响应
    pub fn from_result(result: ApiResult<T>, message: impl FnOnce(&T) -> String) -> Self {
        match result {
            Ok(data) => {
                let msg = message(&data);
                Self::ok(msg, data)
            }
            Err(e) => Self::from(e),
        }
    }
}

impl<T> From<ApiError> for ApiResponse<T> {
    fn from(err: ApiError) -> Self {
        warn!(error = %err, "API 调用失败");
        Self::failure(err.to_string())
    }
}
