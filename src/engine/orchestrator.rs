// ==========================================
// PLC 硬件配置系统 - 引擎编排器
// ==========================================
// 用途: 协调自动配置 / 自动分配 / 人工分配，统一加项目锁
// 流程: 自动配置 → 自动分配；人工分配可随时执行
// ==========================================

use crate::config::ProvisioningConfigReader;
use crate::domain::hardware::{ModuleInstance, ModuleType};
use crate::domain::signal::IoSignal;
use crate::domain::types::SignalType;
use crate::engine::allocator::{AllocationReport, IoAllocator};
use crate::engine::classifier::SignalClassifier;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::locks::KeyedLocks;
use crate::engine::manual_assignment::{AssignOutcome, ManualAssignmentGateway, RemoveOutcome};
use crate::engine::provisioner::{NodeProvisioner, ProvisionReport};
use crate::engine::repositories::IoRepositories;
use crate::repository::traits::ModuleRemoval;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

// ==========================================
// 结果载体
// ==========================================

/// 一键配置结果（自动配置 + 自动分配）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoConfigureReport {
    pub provision: ProvisionReport,
    /// 未配置任何模块时为 None
    pub allocation: Option<AllocationReport>,
}

/// 节点模块视图（含目录信息与已分配数）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleView {
    pub module: ModuleInstance,
    pub module_type: Option<ModuleType>,
    pub assigned_signals: usize,
}

// ==========================================
// ProvisioningOrchestrator - 引擎编排器
// ==========================================
pub struct ProvisioningOrchestrator<C>
where
    C: ProvisioningConfigReader,
{
    config: Arc<C>,
    repos: IoRepositories,
    gateway: ManualAssignmentGateway,
    locks: Arc<KeyedLocks>,
}

impl<C> ProvisioningOrchestrator<C>
where
    C: ProvisioningConfigReader,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - repos: 仓储集合
    /// - config: 配置读取器（每次执行时读取，配置变更即时生效）
    pub fn new(repos: IoRepositories, config: Arc<C>) -> Self {
        Self {
            gateway: ManualAssignmentGateway::new(repos.clone(), SignalClassifier::default()),
            repos,
            config,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// 与其他编排器共享项目锁
    pub fn with_locks(mut self, locks: Arc<KeyedLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn repos(&self) -> &IoRepositories {
        &self.repos
    }

    async fn build_engines(&self) -> EngineResult<(NodeProvisioner, IoAllocator)> {
        let cfg = self.config.get_provisioning_config().await?;
        let classifier = SignalClassifier::from_config(&cfg);
        let provisioner =
            NodeProvisioner::new(self.repos.clone(), classifier.clone(), cfg.node_template);
        let allocator = IoAllocator::new(self.repos.clone(), classifier, cfg.address);
        Ok((provisioner, allocator))
    }

    // ==========================================
    // 批量操作
    // ==========================================

    /// 自动配置项目默认节点
    pub async fn provision(&self, project_id: i64) -> EngineResult<ProvisionReport> {
        let _guard = self.locks.acquire(project_id).await;
        let (provisioner, _) = self.build_engines().await?;
        provisioner.provision(project_id).await
    }

    /// 自动分配节点 I/O
    pub async fn allocate(&self, project_id: i64, node_id: i64) -> EngineResult<AllocationReport> {
        let _guard = self.locks.acquire(project_id).await;
        let (_, allocator) = self.build_engines().await?;
        allocator.allocate(project_id, node_id).await
    }

    /// 一键配置: 自动配置后立即对默认节点执行分配（同一把锁内完成）
    ///
    /// 分配失败时返回 AutoConfigureIncomplete，携带已提交的配置结果
    pub async fn auto_configure(&self, project_id: i64) -> EngineResult<AutoConfigureReport> {
        let _guard = self.locks.acquire(project_id).await;
        let (provisioner, allocator) = self.build_engines().await?;

        debug!(project_id, "步骤1: 自动配置模块");
        let provision = provisioner.provision(project_id).await?;

        if provision.modules_provisioned == 0 {
            info!(project_id, "未配置任何模块，跳过自动分配");
            return Ok(AutoConfigureReport {
                provision,
                allocation: None,
            });
        }

        debug!(project_id, node_id = provision.node_id, "步骤2: 自动分配 I/O");
        let allocation = match allocator.allocate(project_id, provision.node_id).await {
            Ok(a) => a,
            Err(source) => {
                warn!(project_id, node_id = provision.node_id, error = %source, "自动分配失败，模块配置已保留");
                return Err(EngineError::AutoConfigureIncomplete {
                    provision: Box::new(provision),
                    source: Box::new(source),
                });
            }
        };

        Ok(AutoConfigureReport {
            provision,
            allocation: Some(allocation),
        })
    }

    // ==========================================
    // 人工操作（先定位所属项目再加锁）
    // ==========================================

    pub async fn assign_one(&self, signal_id: i64, module_id: i64) -> EngineResult<AssignOutcome> {
        let project_id = self.signal_project(signal_id).await?;
        let _guard = self.locks.acquire(project_id).await;
        self.gateway.assign_one(signal_id, module_id).await
    }

    pub async fn remove_one(&self, signal_id: i64) -> EngineResult<RemoveOutcome> {
        let project_id = self.signal_project(signal_id).await?;
        let _guard = self.locks.acquire(project_id).await;
        self.gateway.remove_one(signal_id).await
    }

    pub async fn add_module(&self, node_id: i64, module_type_id: i64) -> EngineResult<ModuleInstance> {
        let project_id = self
            .repos
            .nodes
            .find_node(node_id)
            .await?
            .map(|n| n.project_id)
            .ok_or_else(|| EngineError::not_found("PlcNode", node_id))?;
        let _guard = self.locks.acquire(project_id).await;
        self.gateway.add_module(node_id, module_type_id).await
    }

    pub async fn remove_module(&self, module_id: i64) -> EngineResult<ModuleRemoval> {
        let project_id = self
            .repos
            .modules
            .find_module(module_id)
            .await?
            .map(|m| m.project_id)
            .ok_or_else(|| EngineError::not_found("ModuleInstance", module_id))?;
        let _guard = self.locks.acquire(project_id).await;
        self.gateway.remove_module(module_id).await
    }

    async fn signal_project(&self, signal_id: i64) -> EngineResult<i64> {
        self.repos
            .signals
            .find_signal(signal_id)
            .await?
            .map(|s| s.project_id)
            .ok_or_else(|| EngineError::not_found("IoSignal", signal_id))
    }

    // ==========================================
    // 查询（只读，不加锁）
    // ==========================================

    /// 节点模块列表（按槽位升序）
    pub async fn list_node_modules(&self, node_id: i64) -> EngineResult<Vec<ModuleView>> {
        if self.repos.nodes.find_node(node_id).await?.is_none() {
            return Err(EngineError::not_found("PlcNode", node_id));
        }

        let modules = self.repos.modules.list_by_node(node_id).await?;
        let mut views = Vec::with_capacity(modules.len());
        for module in modules {
            let module_type = self.repos.catalog.find_type(module.module_type_id).await?;
            let assigned_signals = self.repos.signals.list_by_module(module.module_id).await?.len();
            views.push(ModuleView {
                module,
                module_type,
                assigned_signals,
            });
        }
        Ok(views)
    }

    /// 项目未分配信号（可按类型过滤）
    pub async fn list_unassigned(
        &self,
        project_id: i64,
        signal_type: Option<SignalType>,
    ) -> EngineResult<Vec<IoSignal>> {
        Ok(self
            .repos
            .signals
            .list_unassigned(project_id, signal_type)
            .await?)
    }

    /// 模块上的信号
    pub async fn list_module_signals(&self, module_id: i64) -> EngineResult<Vec<IoSignal>> {
        if self.repos.modules.find_module(module_id).await?.is_none() {
            return Err(EngineError::not_found("ModuleInstance", module_id));
        }
        Ok(self.repos.signals.list_by_module(module_id).await?)
    }
}
