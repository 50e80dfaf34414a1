// ==========================================
// PLC 硬件配置系统 - 节点自动配置引擎
// ==========================================
// 职责: 按信号总量计算每类模块数量，并整体重建节点模块
// 输入: 项目信号统计 + 模块目录
// 输出: module_instance（槽位从 1 连续）
// 红线: 任一类型缺失目录 / 容量为 0 只跳过该类型；
//       存储错误整体回滚，不留下半套模块
// ==========================================

use crate::domain::hardware::{ModuleInstance, NewModuleInstance, NodeTemplate};
use crate::domain::types::{CapacityField, SignalType};
use crate::engine::classifier::SignalClassifier;
use crate::engine::error::EngineResult;
use crate::engine::repositories::IoRepositories;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

// ==========================================
// 纯计算
// ==========================================

/// 所需模块数 = ceil(信号数 / 容量)
///
/// 容量为 0 时返回 0（调用方应先跳过该类型）。
pub fn modules_needed(signal_count: usize, capacity: u32) -> usize {
    if capacity == 0 {
        return 0;
    }
    signal_count.div_ceil(capacity as usize)
}

/// 追加 `count` 个同型号模块，槽位从 `next_slot` 起连续编号
///
/// # 返回
/// 更新后的下一个空闲槽位
pub fn push_modules(
    plan: &mut Vec<NewModuleInstance>,
    module_type_id: i64,
    count: usize,
    next_slot: i32,
) -> i32 {
    let mut slot = next_slot;
    for _ in 0..count {
        plan.push(NewModuleInstance {
            module_type_id,
            slot,
            quantity: 1,
        });
        slot += 1;
    }
    slot
}

// ==========================================
// 结果载体
// ==========================================

/// 单个信号类型的配置计算结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSizing {
    pub signal_type: SignalType,
    pub module_type_id: i64,
    pub module_type_name: String,
    pub capacity_field: CapacityField,
    pub signal_count: usize,
    pub capacity: u32,
    pub modules_needed: usize,
    pub first_slot: i32,
}

/// 被跳过的信号类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedType {
    pub signal_type: SignalType,
    pub signal_count: usize,
    pub reason: String,
}

/// 自动配置结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub project_id: i64,
    pub node_id: i64,
    pub node_name: String,
    pub node_created: bool,
    pub modules_provisioned: usize,
    pub removed_modules: usize,
    pub released_signals: usize,
    pub sizing: Vec<TypeSizing>,
    pub skipped: Vec<SkippedType>,
    pub modules: Vec<ModuleInstance>,
}

// ==========================================
// NodeProvisioner - 节点自动配置引擎
// ==========================================
// 并发: 调用方需持有项目锁（见 ProvisioningOrchestrator）
pub struct NodeProvisioner {
    repos: IoRepositories,
    classifier: SignalClassifier,
    node_template: NodeTemplate,
}

impl NodeProvisioner {
    pub fn new(
        repos: IoRepositories,
        classifier: SignalClassifier,
        node_template: NodeTemplate,
    ) -> Self {
        Self {
            repos,
            classifier,
            node_template,
        }
    }

    /// 为项目默认节点重建模块
    ///
    /// 步骤:
    /// 1. 查找或创建默认节点
    /// 2. 按固定类型顺序统计信号总数（含已分配），计算模块数
    /// 3. 单事务替换节点模块（旧模块上的信号随之解除分配）
    ///
    /// # 返回
    /// - Ok(ProvisionReport): 模块数、逐类型计算明细、跳过的类型
    /// - Err: 存储错误（本次未写入任何模块）
    #[instrument(skip(self), fields(node_name = %self.node_template.name))]
    pub async fn provision(&self, project_id: i64) -> EngineResult<ProvisionReport> {
        let (node, node_created) = self
            .repos
            .nodes
            .find_or_create(project_id, &self.node_template)
            .await?;

        let mut plan = Vec::new();
        let mut sizing = Vec::new();
        let mut skipped = Vec::new();
        let mut next_slot = 1;

        for signal_type in SignalType::PROVISIONING_ORDER {
            let signal_count = self
                .repos
                .signals
                .count_by_project_and_type(project_id, signal_type)
                .await?;
            if signal_count == 0 {
                continue;
            }

            let module_name = self.classifier.default_module_type(signal_type);
            let module_type = match self.repos.catalog.find_type_by_name(module_name).await? {
                Some(m) => m,
                None => {
                    warn!(
                        signal_type = %signal_type,
                        module_name,
                        signal_count,
                        "模块目录中缺少默认模块，跳过该类型"
                    );
                    skipped.push(SkippedType {
                        signal_type,
                        signal_count,
                        reason: format!("模块目录中缺少 {}", module_name),
                    });
                    continue;
                }
            };

            let field = self.classifier.capacity_field(signal_type);
            let capacity = module_type.capacity.get(field);
            if capacity == 0 {
                warn!(
                    signal_type = %signal_type,
                    module_name,
                    field = %field,
                    "默认模块的容量为 0，跳过该类型"
                );
                skipped.push(SkippedType {
                    signal_type,
                    signal_count,
                    reason: format!("{} 的 {} 容量为 0", module_name, field),
                });
                continue;
            }

            let needed = modules_needed(signal_count, capacity);
            let first_slot = next_slot;
            next_slot = push_modules(&mut plan, module_type.module_type_id, needed, next_slot);

            info!(
                signal_type = %signal_type,
                module_name,
                signal_count,
                capacity,
                modules_needed = needed,
                first_slot,
                "类型配置计算完成"
            );

            sizing.push(TypeSizing {
                signal_type,
                module_type_id: module_type.module_type_id,
                module_type_name: module_type.name.clone(),
                capacity_field: field,
                signal_count,
                capacity,
                modules_needed: needed,
                first_slot,
            });
        }

        let replacement = self.repos.modules.replace_node_modules(&node, &plan).await?;

        info!(
            node_id = node.node_id,
            node_created,
            modules_provisioned = replacement.created.len(),
            removed_modules = replacement.removed_modules,
            released_signals = replacement.released_signals,
            skipped_types = skipped.len(),
            "节点自动配置完成"
        );

        Ok(ProvisionReport {
            project_id,
            node_id: node.node_id,
            node_name: node.name,
            node_created,
            modules_provisioned: replacement.created.len(),
            removed_modules: replacement.removed_modules,
            released_signals: replacement.released_signals,
            sizing,
            skipped,
            modules: replacement.created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modules_needed_is_ceiling_division() {
        assert_eq!(modules_needed(0, 16), 0);
        assert_eq!(modules_needed(1, 16), 1);
        assert_eq!(modules_needed(16, 16), 1);
        assert_eq!(modules_needed(17, 16), 2);
        assert_eq!(modules_needed(20, 16), 2);
        assert_eq!(modules_needed(9, 4), 3);
        assert_eq!(modules_needed(5, 0), 0);
    }

    #[test]
    fn test_push_modules_threads_slot_counter() {
        let mut plan = Vec::new();
        let next = push_modules(&mut plan, 10, 2, 1);
        assert_eq!(next, 3);
        let next = push_modules(&mut plan, 20, 0, next);
        assert_eq!(next, 3);
        let next = push_modules(&mut plan, 30, 1, next);
        assert_eq!(next, 4);

        let slots: Vec<(i64, i32)> = plan.iter().map(|m| (m.module_type_id, m.slot)).collect();
        assert_eq!(slots, vec![(10, 1), (10, 2), (30, 3)]);
        assert!(plan.iter().all(|m| m.quantity == 1));
    }
}
