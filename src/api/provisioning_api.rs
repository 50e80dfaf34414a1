// ==========================================
// PLC 硬件配置系统 - 节点配置 API
// ==========================================
// 职责: 自动配置、自动分配、一键配置、模块增删与查询
// 约束: 所有写操作记录 ActionLog
// ==========================================

use std::sync::Arc;

use serde_json::json;

use crate::api::audit::record_action;
use crate::api::error::{ApiError, ApiResult};
use crate::api::response::ApiResponse;
use crate::config::{ConfigManager, ProvisioningConfigReader};
use crate::domain::action_log::ActionType;
use crate::domain::hardware::ModuleInstance;
use crate::engine::{
    AllocationReport, AutoConfigureReport, EngineError, ModuleView, ProvisionReport,
    ProvisioningOrchestrator,
};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::traits::ModuleRemoval;

/// 分配中止前已提交的信号数
fn committed_signals(err: &EngineError) -> usize {
    match err {
        EngineError::AllocationAborted { committed, .. } => *committed,
        _ => 0,
    }
}

fn require_positive(value: i64, name: &str) -> ApiResult<()> {
    if value <= 0 {
        return Err(ApiError::InvalidInput(format!("{}必须为正数", name)));
    }
    Ok(())
}

// ==========================================
// ProvisioningApi - 节点配置 API
// ==========================================
pub struct ProvisioningApi<C = ConfigManager>
where
    C: ProvisioningConfigReader,
{
    orchestrator: Arc<ProvisioningOrchestrator<C>>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl<C> ProvisioningApi<C>
where
    C: ProvisioningConfigReader,
{
    pub fn new(
        orchestrator: Arc<ProvisioningOrchestrator<C>>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            orchestrator,
            action_log_repo,
        }
    }

    /// 自动配置项目默认节点
    ///
    /// # 返回
    /// data: 节点ID、模块数、逐类型计算明细、跳过的类型
    pub async fn provision_node(&self, project_id: i64, operator: &str) -> ApiResponse<ProvisionReport> {
        let result = self.do_provision(project_id, operator).await;
        ApiResponse::from_result(result, |r| {
            let mut msg = format!(
                "节点 {} 自动配置完成，共配置 {} 个模块",
                r.node_name, r.modules_provisioned
            );
            if !r.skipped.is_empty() {
                msg.push_str(&format!("（跳过 {} 个信号类型）", r.skipped.len()));
            }
            msg
        })
    }

    async fn do_provision(&self, project_id: i64, operator: &str) -> ApiResult<ProvisionReport> {
        require_positive(project_id, "项目ID")?;
        let report = self.orchestrator.provision(project_id).await?;

        record_action(
            &self.action_log_repo,
            Some(project_id),
            ActionType::ProvisionNode,
            operator,
            json!({
                "node_id": report.node_id,
                "node_created": report.node_created,
                "modules_provisioned": report.modules_provisioned,
                "removed_modules": report.removed_modules,
                "released_signals": report.released_signals,
                "skipped": report.skipped,
            }),
            format!("自动配置节点 {}", report.node_name),
        );
        Ok(report)
    }

    /// 自动分配节点 I/O
    pub async fn allocate_io(
        &self,
        project_id: i64,
        node_id: i64,
        operator: &str,
    ) -> ApiResponse<AllocationReport> {
        let result = self.do_allocate(project_id, node_id, operator).await;
        ApiResponse::from_result(result, |r| {
            format!("I/O 自动分配完成，共分配 {} 个信号", r.assigned_count)
        })
    }

    async fn do_allocate(
        &self,
        project_id: i64,
        node_id: i64,
        operator: &str,
    ) -> ApiResult<AllocationReport> {
        require_positive(project_id, "项目ID")?;
        require_positive(node_id, "节点ID")?;

        let result = self.orchestrator.allocate(project_id, node_id).await;
        let (payload, detail) = match &result {
            Ok(r) => (
                json!({
                    "node_id": node_id,
                    "assigned_count": r.assigned_count,
                    "modules_filled": r.fills.len(),
                    "skipped": r.skipped,
                }),
                "自动分配 I/O".to_string(),
            ),
            Err(e) => (
                json!({ "node_id": node_id, "error": e.to_string() }),
                "自动分配 I/O 失败".to_string(),
            ),
        };
        // 部分成功同样需要留痕
        record_action(
            &self.action_log_repo,
            Some(project_id),
            ActionType::AllocateIo,
            operator,
            payload,
            detail,
        );

        Ok(result?)
    }

    /// 一键配置（自动配置 + 自动分配）
    pub async fn auto_configure(
        &self,
        project_id: i64,
        operator: &str,
    ) -> ApiResponse<AutoConfigureReport> {
        let result = self.do_auto_configure(project_id, operator).await;
        ApiResponse::from_result(result, |r| {
            let assigned = r.allocation.as_ref().map(|a| a.assigned_count).unwrap_or(0);
            format!(
                "一键配置完成: {} 个模块，{} 个信号已分配",
                r.provision.modules_provisioned, assigned
            )
        })
    }

    async fn do_auto_configure(
        &self,
        project_id: i64,
        operator: &str,
    ) -> ApiResult<AutoConfigureReport> {
        require_positive(project_id, "项目ID")?;

        let result = self.orchestrator.auto_configure(project_id).await;
        let (payload, detail) = match &result {
            Ok(r) => (
                json!({
                    "node_id": r.provision.node_id,
                    "modules_provisioned": r.provision.modules_provisioned,
                    "assigned_count": r.allocation.as_ref().map(|a| a.assigned_count),
                }),
                "一键配置".to_string(),
            ),
            Err(EngineError::AutoConfigureIncomplete { provision, source }) => (
                json!({
                    "node_id": provision.node_id,
                    "modules_provisioned": provision.modules_provisioned,
                    "committed": committed_signals(source),
                    "error": source.to_string(),
                }),
                "一键配置: 自动分配失败".to_string(),
            ),
            Err(e) => (
                json!({ "error": e.to_string() }),
                "一键配置失败".to_string(),
            ),
        };
        record_action(
            &self.action_log_repo,
            Some(project_id),
            ActionType::ProvisionNode,
            operator,
            payload,
            detail,
        );

        Ok(result?)
    }

    /// 节点模块列表（按槽位升序）
    pub async fn list_node_modules(&self, node_id: i64) -> ApiResponse<Vec<ModuleView>> {
        let result = match require_positive(node_id, "节点ID") {
            Ok(()) => self
                .orchestrator
                .list_node_modules(node_id)
                .await
                .map_err(ApiError::from),
            Err(e) => Err(e),
        };
        ApiResponse::from_result(result, |v| format!("共 {} 个模块", v.len()))
    }

    /// 在节点末尾添加模块
    pub async fn add_module(
        &self,
        node_id: i64,
        module_type_id: i64,
        operator: &str,
    ) -> ApiResponse<ModuleInstance> {
        let result = self.do_add_module(node_id, module_type_id, operator).await;
        ApiResponse::from_result(result, |m| format!("模块已添加到槽位 {}", m.slot))
    }

    async fn do_add_module(
        &self,
        node_id: i64,
        module_type_id: i64,
        operator: &str,
    ) -> ApiResult<ModuleInstance> {
        require_positive(node_id, "节点ID")?;
        require_positive(module_type_id, "模块型号ID")?;
        let module = self.orchestrator.add_module(node_id, module_type_id).await?;

        record_action(
            &self.action_log_repo,
            Some(module.project_id),
            ActionType::AddModule,
            operator,
            json!({
                "node_id": node_id,
                "module_id": module.module_id,
                "module_type_id": module_type_id,
                "slot": module.slot,
            }),
            format!("添加模块到槽位 {}", module.slot),
        );
        Ok(module)
    }

    /// 删除模块（其上信号解除分配，后续槽位前移）
    pub async fn remove_module(&self, module_id: i64, operator: &str) -> ApiResponse<ModuleRemoval> {
        let result = self.do_remove_module(module_id, operator).await;
        ApiResponse::from_result(result, |r| {
            format!(
                "模块已删除，{} 个信号解除分配，{} 个模块槽位前移",
                r.released_signals, r.renumbered_modules
            )
        })
    }

    async fn do_remove_module(&self, module_id: i64, operator: &str) -> ApiResult<ModuleRemoval> {
        require_positive(module_id, "模块ID")?;
        let removal = self.orchestrator.remove_module(module_id).await?;

        record_action(
            &self.action_log_repo,
            Some(removal.removed.project_id),
            ActionType::RemoveModule,
            operator,
            json!({
                "module_id": module_id,
                "node_id": removal.removed.node_id,
                "slot": removal.removed.slot,
                "renumbered_modules": removal.renumbered_modules,
                "released_signals": removal.released_signals,
            }),
            format!("删除槽位 {} 的模块", removal.removed.slot),
        );
        Ok(removal)
    }
}
