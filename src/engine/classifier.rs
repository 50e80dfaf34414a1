// ==========================================
// PLC 硬件配置系统 - 容量目录 & 信号分类器
// ==========================================
// 职责: 信号类型 → 默认模块型号 / 准入容量字段
// 红线: 纯函数，无副作用，不访问存储
// ==========================================

use crate::config::ProvisioningConfig;
use crate::domain::hardware::ModuleType;
use crate::domain::types::{CapacityField, SignalType};
use std::collections::BTreeMap;

/// 标准默认模块型号
pub fn standard_module_name(signal_type: SignalType) -> &'static str {
    match signal_type {
        SignalType::DigitalInputFailSafe => "FDI16",
        SignalType::DigitalOutputFailSafe => "FDO16",
        SignalType::DigitalInput => "DI16",
        SignalType::DigitalOutput => "DO16",
        SignalType::AnalogInputCurrent => "AI4 (4-20mA)",
        SignalType::AnalogInputVoltage => "AI4 (0-10V)",
        SignalType::AnalogOutputCurrent => "AO4 (4-20mA)",
        SignalType::AnalogOutputVoltage => "AO4 (0-10V)",
    }
}

/// 信号类型对应的准入容量字段
///
/// 电流 / 电压两类模拟量共用 AI、AO 字段。
pub fn capacity_field(signal_type: SignalType) -> CapacityField {
    match signal_type {
        SignalType::DigitalInput => CapacityField::Di,
        SignalType::DigitalOutput => CapacityField::Do,
        SignalType::DigitalInputFailSafe => CapacityField::FDi,
        SignalType::DigitalOutputFailSafe => CapacityField::FDo,
        SignalType::AnalogInputCurrent | SignalType::AnalogInputVoltage => CapacityField::Ai,
        SignalType::AnalogOutputCurrent | SignalType::AnalogOutputVoltage => CapacityField::Ao,
    }
}

/// 模块的准入规则（承载类型 + 容量字段 + 容量）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub signal_type: SignalType,
    pub field: CapacityField,
    pub capacity: u32,
}

// ==========================================
// SignalClassifier - 信号分类器
// ==========================================
#[derive(Debug, Clone)]
pub struct SignalClassifier {
    default_modules: BTreeMap<SignalType, String>,
}

impl Default for SignalClassifier {
    fn default() -> Self {
        Self::from_config(&ProvisioningConfig::default())
    }
}

impl SignalClassifier {
    /// 按配置构造（默认模块型号可覆写）
    pub fn from_config(config: &ProvisioningConfig) -> Self {
        let default_modules = SignalType::PROVISIONING_ORDER
            .iter()
            .map(|t| {
                let name = config
                    .default_modules
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| standard_module_name(*t).to_string());
                (*t, name)
            })
            .collect();
        Self { default_modules }
    }

    /// 解析类型标签（None = 未识别，调用方跳过并告警）
    pub fn classify(&self, tag: &str) -> Option<SignalType> {
        SignalType::from_tag(tag)
    }

    /// 默认承载模块型号
    pub fn default_module_type(&self, signal_type: SignalType) -> &str {
        self.default_modules
            .get(&signal_type)
            .map(String::as_str)
            .unwrap_or_else(|| standard_module_name(signal_type))
    }

    /// 准入容量字段
    pub fn capacity_field(&self, signal_type: SignalType) -> CapacityField {
        capacity_field(signal_type)
    }

    /// 解析模块的准入规则
    ///
    /// # 返回
    /// - None: 模块类型标签未识别
    pub fn admission(&self, module_type: &ModuleType) -> Option<Admission> {
        let signal_type = module_type.governing_type?;
        let field = capacity_field(signal_type);
        Some(Admission {
            signal_type,
            field,
            capacity: module_type.capacity.get(field),
        })
    }
}
