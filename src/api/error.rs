// ==========================================
// PLC 硬件配置系统 - API层错误类型
// ==========================================
// 职责: 将 Repository / Engine 错误转换为用户可读的错误消息
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    /// 自动分配中途失败（之前的模块已提交）
    #[error("自动分配部分完成: 已分配 {committed} 个信号后失败，{reason}")]
    PartialAllocation { committed: usize, reason: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            e @ EngineError::NoModules { .. } => ApiError::BusinessRuleViolation(e.to_string()),
            EngineError::AllocationAborted {
                module_id,
                slot,
                committed,
                source,
            } => ApiError::PartialAllocation {
                committed,
                reason: format!("模块 {}（槽位 {}）: {}", module_id, slot, source),
            },
            EngineError::AutoConfigureIncomplete { source, .. } => ApiError::from(*source),
            EngineError::Storage(e) => ApiError::from(e),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_not_found_message() {
        let err: ApiError = EngineError::not_found("IoSignal", 42).into();
        assert_eq!(err.to_string(), "资源未找到: IoSignal(id=42)不存在");
    }

    #[test]
    fn test_allocation_aborted_becomes_partial() {
        let err: ApiError = EngineError::AllocationAborted {
            module_id: 5,
            slot: 2,
            committed: 16,
            source: RepositoryError::DatabaseQueryError("disk full".into()),
        }
        .into();
        match err {
            ApiError::PartialAllocation { committed, reason } => {
                assert_eq!(committed, 16);
                assert!(reason.contains("disk full"));
            }
            other => panic!("意外的错误类型: {:?}", other),
        }
    }

    #[test]
    fn test_storage_error_maps_through_repository() {
        let err: ApiError =
            EngineError::Storage(RepositoryError::LockError("poisoned".into())).into();
        assert!(matches!(err, ApiError::DatabaseConnectionError(_)));
    }
}
