// ==========================================
// PLC 硬件配置系统 - 自动配置参数 与 读取 Trait
// ==========================================
// 职责: 定义引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::hardware::NodeTemplate;
use crate::domain::types::SignalType;
use crate::engine::classifier::standard_module_name;
use crate::repository::error::RepositoryResult;
use crate::repository::traits::IoAddress;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 批量分配写入的默认 CPU 标识
pub const DEFAULT_CPU_LABEL: &str = "CPU1";
/// 批量分配写入的默认机架标识
pub const DEFAULT_RACK_LABEL: &str = "0";

// ==========================================
// ProvisioningConfig - 自动配置参数快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// 自动创建节点所用模板
    pub node_template: NodeTemplate,
    /// 信号类型 → 默认模块型号名称
    pub default_modules: BTreeMap<SignalType, String>,
    /// 批量分配写入的地址
    pub address: IoAddress,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        let default_modules = SignalType::PROVISIONING_ORDER
            .iter()
            .map(|t| (*t, standard_module_name(*t).to_string()))
            .collect();

        Self {
            node_template: NodeTemplate::default(),
            default_modules,
            address: IoAddress {
                cpu: DEFAULT_CPU_LABEL.to_string(),
                rack: DEFAULT_RACK_LABEL.to_string(),
            },
        }
    }
}

// ==========================================
// ProvisioningConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ProvisioningConfigReader: Send + Sync {
    /// 读取完整的自动配置参数
    ///
    /// # 默认值
    /// - 节点: CPU01 / PLC
    /// - 默认模块: FDI16, FDO16, DI16, DO16, AI4 / AO4 系列
    /// - 地址: CPU1 / 0
    async fn get_provisioning_config(&self) -> RepositoryResult<ProvisioningConfig>;
}

/// 固定配置（不读库）
#[async_trait]
impl ProvisioningConfigReader for ProvisioningConfig {
    async fn get_provisioning_config(&self) -> RepositoryResult<ProvisioningConfig> {
        Ok(self.clone())
    }
}
