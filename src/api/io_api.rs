// ==========================================
// PLC 硬件配置系统 - I/O 人工分配 API
// ==========================================
// 职责: 单个信号的分配 / 移除，信号查询
// 说明: 类型不匹配、容量已满返回 success=false 并附带结果详情
// ==========================================

use std::sync::Arc;

use serde_json::json;

use crate::api::audit::record_action;
use crate::api::error::{ApiError, ApiResult};
use crate::api::response::ApiResponse;
use crate::config::{ConfigManager, ProvisioningConfigReader};
use crate::domain::action_log::ActionType;
use crate::domain::signal::IoSignal;
use crate::domain::types::SignalType;
use crate::engine::{AssignOutcome, ProvisioningOrchestrator, RemoveOutcome};
use crate::repository::action_log_repo::ActionLogRepository;

// ==========================================
// IoApi - I/O 人工分配 API
// ==========================================
pub struct IoApi<C = ConfigManager>
where
    C: ProvisioningConfigReader,
{
    orchestrator: Arc<ProvisioningOrchestrator<C>>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl<C> IoApi<C>
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

    /// 将单个信号分配到模块
    pub async fn assign_io(
        &self,
        signal_id: i64,
        module_id: i64,
        operator: &str,
    ) -> ApiResponse<AssignOutcome> {
        match self.do_assign(signal_id, module_id, operator).await {
            Ok(outcome) if outcome.is_success() => ApiResponse::ok(outcome.message(), outcome),
            Ok(outcome) => ApiResponse::rejected(outcome.message(), outcome),
            Err(e) => ApiResponse::from(e),
        }
    }

    async fn do_assign(
        &self,
        signal_id: i64,
        module_id: i64,
        operator: &str,
    ) -> ApiResult<AssignOutcome> {
        if signal_id <= 0 || module_id <= 0 {
            return Err(ApiError::InvalidInput("信号ID与模块ID必须为正数".to_string()));
        }

        let outcome = self.orchestrator.assign_one(signal_id, module_id).await?;

        if let AssignOutcome::Assigned {
            slot,
            previous_module,
            ..
        } = &outcome
        {
            let project_id = self
                .orchestrator
                .repos()
                .signals
                .find_signal(signal_id)
                .await
                .ok()
                .flatten()
                .map(|s| s.project_id);
            record_action(
                &self.action_log_repo,
                project_id,
                ActionType::AssignIo,
                operator,
                json!({
                    "signal_id": signal_id,
                    "module_id": module_id,
                    "slot": slot,
                    "previous_module": previous_module,
                }),
                outcome.message(),
            );
        }

        Ok(outcome)
    }

    /// 移除单个信号的分配（未分配时视为成功）
    pub async fn remove_io(&self, signal_id: i64, operator: &str) -> ApiResponse<RemoveOutcome> {
        let result = self.do_remove(signal_id, operator).await;
        ApiResponse::from_result(result, |r| match r.previous_module {
            Some(m) => format!("信号 {} 已从模块 {} 移除", r.signal_id, m),
            None => format!("信号 {} 原本未分配", r.signal_id),
        })
    }

    async fn do_remove(&self, signal_id: i64, operator: &str) -> ApiResult<RemoveOutcome> {
        if signal_id <= 0 {
            return Err(ApiError::InvalidInput("信号ID必须为正数".to_string()));
        }

        let outcome = self.orchestrator.remove_one(signal_id).await?;

        if let Some(previous_module) = outcome.previous_module {
            let project_id = self
                .orchestrator
                .repos()
                .signals
                .find_signal(signal_id)
                .await
                .ok()
                .flatten()
                .map(|s| s.project_id);
            record_action(
                &self.action_log_repo,
                project_id,
                ActionType::RemoveIo,
                operator,
                json!({ "signal_id": signal_id, "previous_module": previous_module }),
                format!("移除信号 {} 的分配", signal_id),
            );
        }

        Ok(outcome)
    }

    /// 项目未分配信号（类型标签可选，未识别标签视为输入错误）
    pub async fn list_unassigned(
        &self,
        project_id: i64,
        signal_type: Option<&str>,
    ) -> ApiResponse<Vec<IoSignal>> {
        let result = self.do_list_unassigned(project_id, signal_type).await;
        ApiResponse::from_result(result, |v| format!("共 {} 个未分配信号", v.len()))
    }

    async fn do_list_unassigned(
        &self,
        project_id: i64,
        signal_type: Option<&str>,
    ) -> ApiResult<Vec<IoSignal>> {
        if project_id <= 0 {
            return Err(ApiError::InvalidInput("项目ID必须为正数".to_string()));
        }
        let filter = match signal_type {
            Some(tag) => Some(SignalType::from_tag(tag).ok_or_else(|| {
                ApiError::InvalidInput(format!("无法识别的信号类型: {}", tag))
            })?),
            None => None,
        };
        Ok(self.orchestrator.list_unassigned(project_id, filter).await?)
    }

    /// 模块上的信号
    pub async fn list_module_signals(&self, module_id: i64) -> ApiResponse<Vec<IoSignal>> {
        let result = self
            .orchestrator
            .list_module_signals(module_id)
            .await
            .map_err(ApiError::from);
        ApiResponse::from_result(result, |v| format!("模块上共 {} 个信号", v.len()))
    }
}
