// ==========================================
// PLC 硬件配置系统 - 人工分配网关
// ==========================================
// 职责: 单个信号的分配 / 移除，单个模块的添加 / 删除
// 红线: 与自动分配遵守相同的类型与容量约束
//       类型不匹配 / 容量已满 是正常业务结果，不作为错误返回
// ==========================================

use crate::domain::hardware::ModuleInstance;
use crate::engine::classifier::SignalClassifier;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::IoRepositories;
use crate::repository::traits::ModuleRemoval;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

// ==========================================
// AssignOutcome - 单个分配的结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignOutcome {
    /// 已写入（previous_module 非空表示从其他模块移入）
    Assigned {
        signal_id: i64,
        module_id: i64,
        slot: i32,
        previous_module: Option<i64>,
    },
    /// 信号已在该模块上，无变化
    Unchanged { signal_id: i64, module_id: i64 },
    /// 信号类型与模块承载类型不一致
    TypeMismatch {
        signal_type: String,
        module_type: String,
    },
    /// 模块该类通道已满
    CapacityExceeded {
        module_id: i64,
        capacity: u32,
        assigned: usize,
    },
    /// 信号或模块类型无法识别
    UnresolvedType { tag: String },
}

impl AssignOutcome {
    /// 信号当前是否位于目标模块
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            AssignOutcome::Assigned { .. } | AssignOutcome::Unchanged { .. }
        )
    }

    /// 面向用户的说明
    pub fn message(&self) -> String {
        match self {
            AssignOutcome::Assigned {
                signal_id,
                slot,
                previous_module: Some(prev),
                ..
            } => format!("信号 {} 已从模块 {} 移至槽位 {}", signal_id, prev, slot),
            AssignOutcome::Assigned {
                signal_id, slot, ..
            } => format!("信号 {} 已分配到槽位 {}", signal_id, slot),
            AssignOutcome::Unchanged {
                signal_id,
                module_id,
            } => format!("信号 {} 已在模块 {} 上", signal_id, module_id),
            AssignOutcome::TypeMismatch {
                signal_type,
                module_type,
            } => format!(
                "类型不匹配: 信号类型 {} 与模块类型 {} 不一致",
                signal_type, module_type
            ),
            AssignOutcome::CapacityExceeded {
                capacity, assigned, ..
            } => format!("模块已满 ({}/{})", assigned, capacity),
            AssignOutcome::UnresolvedType { tag } => format!("无法识别的类型: {}", tag),
        }
    }
}

/// 单个移除的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveOutcome {
    pub signal_id: i64,
    /// 移除前所在模块（None = 原本未分配）
    pub previous_module: Option<i64>,
}

// ==========================================
// ManualAssignmentGateway - 人工分配网关
// ==========================================
// 并发: 调用方需持有项目锁（见 ProvisioningOrchestrator）
pub struct ManualAssignmentGateway {
    repos: IoRepositories,
    classifier: SignalClassifier,
}

impl ManualAssignmentGateway {
    pub fn new(repos: IoRepositories, classifier: SignalClassifier) -> Self {
        Self { repos, classifier }
    }

    /// 将单个信号分配到模块
    ///
    /// 检查顺序: 存在性 → 类型一致 → 容量
    #[instrument(skip(self))]
    pub async fn assign_one(&self, signal_id: i64, module_id: i64) -> EngineResult<AssignOutcome> {
        let signal = self
            .repos
            .signals
            .find_signal(signal_id)
            .await?
            .ok_or_else(|| EngineError::not_found("IoSignal", signal_id))?;

        // 跨项目的模块对该信号不可见
        let module = self
            .repos
            .modules
            .find_module(module_id)
            .await?
            .filter(|m| m.project_id == signal.project_id)
            .ok_or_else(|| EngineError::not_found("ModuleInstance", module_id))?;

        let module_type = self
            .repos
            .catalog
            .find_type(module.module_type_id)
            .await?
            .ok_or_else(|| EngineError::not_found("ModuleType", module.module_type_id))?;

        let signal_type = match signal.signal_type {
            Some(t) => t,
            None => {
                warn!(signal_id, tag = %signal.type_tag, "信号类型无法识别");
                return Ok(AssignOutcome::UnresolvedType {
                    tag: signal.type_tag,
                });
            }
        };
        let admission = match self.classifier.admission(&module_type) {
            Some(a) => a,
            None => {
                warn!(module_id, kind = %module_type.kind_tag, "模块类型无法识别");
                return Ok(AssignOutcome::UnresolvedType {
                    tag: module_type.kind_tag,
                });
            }
        };

        if signal_type != admission.signal_type {
            return Ok(AssignOutcome::TypeMismatch {
                signal_type: signal_type.code().to_string(),
                module_type: admission.signal_type.code().to_string(),
            });
        }

        if signal.module_id == Some(module_id) {
            return Ok(AssignOutcome::Unchanged {
                signal_id,
                module_id,
            });
        }

        let assigned = self
            .repos
            .signals
            .count_on_module(module_id, admission.signal_type)
            .await?;
        if assigned >= admission.capacity as usize {
            return Ok(AssignOutcome::CapacityExceeded {
                module_id,
                capacity: admission.capacity,
                assigned,
            });
        }

        self.repos
            .signals
            .assign_to_module(&module, &[signal_id], None)
            .await?;

        info!(
            signal_id,
            module_id,
            slot = module.slot,
            previous_module = ?signal.module_id,
            "人工分配完成"
        );

        Ok(AssignOutcome::Assigned {
            signal_id,
            module_id,
            slot: module.slot,
            previous_module: signal.module_id,
        })
    }

    /// 移除单个信号的分配（未分配时视为成功，无变化）
    #[instrument(skip(self))]
    pub async fn remove_one(&self, signal_id: i64) -> EngineResult<RemoveOutcome> {
        let signal = self
            .repos
            .signals
            .find_signal(signal_id)
            .await?
            .ok_or_else(|| EngineError::not_found("IoSignal", signal_id))?;

        if signal.is_assigned() {
            self.repos
                .signals
                .clear_assignment(signal_id)
                .await
                .map_err(EngineError::from_repository)?;
            info!(signal_id, previous_module = ?signal.module_id, "已移除信号分配");
        }

        Ok(RemoveOutcome {
            signal_id,
            previous_module: signal.module_id,
        })
    }

    /// 删除模块（其上信号解除分配，后续槽位前移）
    #[instrument(skip(self))]
    pub async fn remove_module(&self, module_id: i64) -> EngineResult<ModuleRemoval> {
        let removal = self
            .repos
            .modules
            .remove_and_renumber(module_id)
            .await
            .map_err(EngineError::from_repository)?;

        info!(
            module_id,
            node_id = removal.removed.node_id,
            slot = removal.removed.slot,
            renumbered = removal.renumbered_modules,
            released_signals = removal.released_signals,
            "模块已删除"
        );
        Ok(removal)
    }

    /// 在节点末尾添加模块
    #[instrument(skip(self))]
    pub async fn add_module(&self, node_id: i64, module_type_id: i64) -> EngineResult<ModuleInstance> {
        let node = self
            .repos
            .nodes
            .find_node(node_id)
            .await?
            .ok_or_else(|| EngineError::not_found("PlcNode", node_id))?;

        let module_type = self
            .repos
            .catalog
            .find_type(module_type_id)
            .await?
            .ok_or_else(|| EngineError::not_found("ModuleType", module_type_id))?;

        let module = self
            .repos
            .modules
            .append_module(&node, module_type.module_type_id, 1)
            .await?;

        info!(
            node_id,
            module_id = module.module_id,
            slot = module.slot,
            module_type = %module_type.name,
            "模块已添加"
        );
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success_flags() {
        let assigned = AssignOutcome::Assigned {
            signal_id: 1,
            module_id: 2,
            slot: 1,
            previous_module: None,
        };
        assert!(assigned.is_success());
        assert!(AssignOutcome::Unchanged {
            signal_id: 1,
            module_id: 2
        }
        .is_success());
        assert!(!AssignOutcome::CapacityExceeded {
            module_id: 2,
            capacity: 16,
            assigned: 16
        }
        .is_success());
    }

    #[test]
    fn test_outcome_messages() {
        let mismatch = AssignOutcome::TypeMismatch {
            signal_type: "DIGITAL_INPUT".to_string(),
            module_type: "DIGITAL_OUTPUT".to_string(),
        };
        assert!(mismatch.message().contains("类型不匹配"));

        let moved = AssignOutcome::Assigned {
            signal_id: 5,
            module_id: 8,
            slot: 3,
            previous_module: Some(7),
        };
        assert!(moved.message().contains("模块 7"));
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let json = serde_json::to_value(AssignOutcome::UnresolvedType {
            tag: "Relay".to_string(),
        })
        .unwrap();
        assert_eq!(json["outcome"], "UNRESOLVED_TYPE");
        assert_eq!(json["tag"], "Relay");
    }
}
