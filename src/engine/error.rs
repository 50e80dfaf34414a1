// ==========================================
// PLC 硬件配置系统 - 引擎层错误类型
// ==========================================
// 说明: 类型不匹配 / 容量已满 属于正常业务结果（见 AssignOutcome），不在此处
// ==========================================

use crate::engine::provisioner::ProvisionReport;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{entity} 不存在: id={id}")]
    NotFound { entity: String, id: String },

    #[error("节点 {node_id} 下没有已配置的模块，请先执行自动配置")]
    NoModules { node_id: i64 },

    #[error("模块 {module_id}（槽位 {slot}）分配失败，之前已提交 {committed} 个信号: {source}")]
    AllocationAborted {
        module_id: i64,
        slot: i32,
        committed: usize,
        #[source]
        source: RepositoryError,
    },

    /// 一键配置: 模块已配置提交，随后的自动分配失败
    #[error("节点 {node} 已配置 {modules} 个模块，自动分配失败: {source}",
        node = .provision.node_name, modules = .provision.modules_provisioned)]
    AutoConfigureIncomplete {
        provision: Box<ProvisionReport>,
        #[source]
        source: Box<EngineError>,
    },

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl EngineError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// 仓储层 NotFound 提升为引擎层 NotFound，其余保持为存储错误
    pub fn from_repository(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::Storage(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
