// ==========================================
// PLC 硬件配置系统 - I/O 自动分配引擎
// ==========================================
// 职责: 按槽位顺序逐个模块填充未分配信号
// 规则:
// 1) 模块按槽位升序处理
// 2) 每个模块只接收其承载类型的信号，且不超过剩余容量
// 3) 候选信号按位置分组: 柜内 → 按钮站 → 机边 → 其他，组内保持导入顺序
// 4) 每个模块单独提交；后续模块失败不回滚已提交的模块
// ==========================================

use crate::domain::hardware::ModuleInstance;
use crate::domain::signal::IoSignal;
use crate::domain::types::SignalType;
use crate::engine::classifier::SignalClassifier;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::IoRepositories;
use crate::repository::error::RepositoryResult;
use crate::repository::traits::IoAddress;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

// ==========================================
// 纯计算
// ==========================================

/// 按位置优先级稳定排序（同组内保持原有相对顺序）
pub fn order_by_position(mut candidates: Vec<IoSignal>) -> Vec<IoSignal> {
    candidates.sort_by_key(|s| s.position.fill_priority());
    candidates
}

/// 选出前 `remaining` 个信号
pub fn select_for_module(candidates: Vec<IoSignal>, remaining: usize) -> Vec<IoSignal> {
    order_by_position(candidates)
        .into_iter()
        .take(remaining)
        .collect()
}

// ==========================================
// 结果载体
// ==========================================

/// 单个模块的填充结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFill {
    pub module_id: i64,
    pub slot: i32,
    pub module_type_name: String,
    pub signal_type: SignalType,
    pub capacity: u32,
    pub already_assigned: usize,
    pub assigned: usize,
    pub signal_ids: Vec<i64>,
}

/// 被跳过的模块
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedModule {
    pub module_id: i64,
    pub slot: i32,
    pub reason: String,
}

/// 单个模块的处理结果
enum ModuleStep {
    Filled(ModuleFill),
    Skipped(SkippedModule),
    /// 已满或无候选信号
    Idle,
}

/// 自动分配结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationReport {
    pub project_id: i64,
    pub node_id: i64,
    pub assigned_count: usize,
    pub fills: Vec<ModuleFill>,
    pub skipped: Vec<SkippedModule>,
}

// ==========================================
// IoAllocator - 自动分配引擎
// ==========================================
// 并发: 调用方需持有项目锁（见 ProvisioningOrchestrator）
pub struct IoAllocator {
    repos: IoRepositories,
    classifier: SignalClassifier,
    address: IoAddress,
}

impl IoAllocator {
    pub fn new(repos: IoRepositories, classifier: SignalClassifier, address: IoAddress) -> Self {
        Self {
            repos,
            classifier,
            address,
        }
    }

    /// 将项目未分配信号填入节点模块
    ///
    /// # 返回
    /// - Ok(AllocationReport): 总分配数与逐模块明细
    /// - Err(NotFound): 节点不存在或不属于该项目
    /// - Err(NoModules): 节点下没有模块
    /// - Err(AllocationAborted): 某模块查询或写入失败，之前的模块已提交
    #[instrument(skip(self))]
    pub async fn allocate(&self, project_id: i64, node_id: i64) -> EngineResult<AllocationReport> {
        let node = self
            .repos
            .nodes
            .find_node(node_id)
            .await?
            .filter(|n| n.project_id == project_id)
            .ok_or_else(|| EngineError::not_found("PlcNode", node_id))?;

        let modules = self.repos.modules.list_by_node(node.node_id).await?;
        if modules.is_empty() {
            return Err(EngineError::NoModules { node_id });
        }

        let mut report = AllocationReport {
            project_id,
            node_id,
            ..Default::default()
        };

        for module in &modules {
            // 查询与写入失败都视为本模块失败，之前的模块保持已提交
            let step = self
                .fill_module(project_id, module)
                .await
                .map_err(|source| EngineError::AllocationAborted {
                    module_id: module.module_id,
                    slot: module.slot,
                    committed: report.assigned_count,
                    source,
                })?;

            match step {
                ModuleStep::Filled(fill) => {
                    report.assigned_count += fill.assigned;
                    report.fills.push(fill);
                }
                ModuleStep::Skipped(skipped) => report.skipped.push(skipped),
                ModuleStep::Idle => {}
            }
        }

        info!(
            node_id,
            assigned_count = report.assigned_count,
            modules = modules.len(),
            skipped_modules = report.skipped.len(),
            "自动分配完成"
        );

        Ok(report)
    }

    /// 填充单个模块（一次写入，单独提交）
    async fn fill_module(
        &self,
        project_id: i64,
        module: &ModuleInstance,
    ) -> RepositoryResult<ModuleStep> {
        let module_type = match self.repos.catalog.find_type(module.module_type_id).await? {
            Some(t) => t,
            None => {
                warn!(module_id = module.module_id, slot = module.slot, "模块型号不在目录中，跳过");
                return Ok(ModuleStep::Skipped(SkippedModule {
                    module_id: module.module_id,
                    slot: module.slot,
                    reason: format!("模块型号 {} 不在目录中", module.module_type_id),
                }));
            }
        };

        let admission = match self.classifier.admission(&module_type) {
            Some(a) => a,
            None => {
                warn!(
                    module_id = module.module_id,
                    slot = module.slot,
                    kind = %module_type.kind_tag,
                    "模块类型无法识别，跳过"
                );
                return Ok(ModuleStep::Skipped(SkippedModule {
                    module_id: module.module_id,
                    slot: module.slot,
                    reason: format!("模块类型 {} 无法识别", module_type.kind_tag),
                }));
            }
        };

        let already_assigned = self
            .repos
            .signals
            .count_on_module(module.module_id, admission.signal_type)
            .await?;
        let remaining = (admission.capacity as usize).saturating_sub(already_assigned);
        if remaining == 0 {
            debug!(module_id = module.module_id, slot = module.slot, "模块已满，跳过");
            return Ok(ModuleStep::Idle);
        }

        let candidates = self
            .repos
            .signals
            .list_unassigned(project_id, Some(admission.signal_type))
            .await?;
        let selected = select_for_module(candidates, remaining);
        if selected.is_empty() {
            return Ok(ModuleStep::Idle);
        }

        let signal_ids: Vec<i64> = selected.iter().map(|s| s.signal_id).collect();
        let assigned = self
            .repos
            .signals
            .assign_to_module(module, &signal_ids, Some(&self.address))
            .await?;

        info!(
            module_id = module.module_id,
            slot = module.slot,
            module_type = %module_type.name,
            assigned,
            remaining_before = remaining,
            "模块填充完成"
        );

        Ok(ModuleStep::Filled(ModuleFill {
            module_id: module.module_id,
            slot: module.slot,
            module_type_name: module_type.name,
            signal_type: admission.signal_type,
            capacity: admission.capacity,
            already_assigned,
            assigned,
            signal_ids,
        }))
    }
}
