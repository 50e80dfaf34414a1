// ==========================================
// PLC 硬件配置系统 - 领域类型定义
// ==========================================
// 信号类型 / 容量字段 / 位置标签 均为封闭枚举
// 存储层使用字符串标签，解析失败即视为“未识别类型”
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 信号类型 (Signal Type)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    DigitalInput,          // 数字量输入
    DigitalOutput,         // 数字量输出
    #[serde(rename = "DIGITAL_INPUT_FS")]
    DigitalInputFailSafe,  // 安全型数字量输入
    #[serde(rename = "DIGITAL_OUTPUT_FS")]
    DigitalOutputFailSafe, // 安全型数字量输出
    AnalogInputCurrent,    // 模拟量输入 (4-20mA)
    AnalogInputVoltage,    // 模拟量输入 (0-10V)
    AnalogOutputCurrent,   // 模拟量输出 (4-20mA)
    AnalogOutputVoltage,   // 模拟量输出 (0-10V)
}

impl SignalType {
    /// 自动配置时的处理顺序
    ///
    /// 安全型数字量 → 普通数字量 → 模拟量输入 → 模拟量输出；
    /// 槽位号按此顺序连续分配。
    pub const PROVISIONING_ORDER: [SignalType; 8] = [
        SignalType::DigitalInputFailSafe,
        SignalType::DigitalOutputFailSafe,
        SignalType::DigitalInput,
        SignalType::DigitalOutput,
        SignalType::AnalogInputCurrent,
        SignalType::AnalogInputVoltage,
        SignalType::AnalogOutputCurrent,
        SignalType::AnalogOutputVoltage,
    ];

    /// 数据库存储标签
    pub fn code(&self) -> &'static str {
        match self {
            SignalType::DigitalInput => "DIGITAL_INPUT",
            SignalType::DigitalOutput => "DIGITAL_OUTPUT",
            SignalType::DigitalInputFailSafe => "DIGITAL_INPUT_FS",
            SignalType::DigitalOutputFailSafe => "DIGITAL_OUTPUT_FS",
            SignalType::AnalogInputCurrent => "ANALOG_INPUT_CURRENT",
            SignalType::AnalogInputVoltage => "ANALOG_INPUT_VOLTAGE",
            SignalType::AnalogOutputCurrent => "ANALOG_OUTPUT_CURRENT",
            SignalType::AnalogOutputVoltage => "ANALOG_OUTPUT_VOLTAGE",
        }
    }

    /// 从字符串标签解析
    ///
    /// 同时接受标准代码和历史信号清单中的意大利语标签
    /// （如 "Input Digitale Fail-Safe"），大小写与首尾空白不敏感。
    /// 无法识别时返回 None，由调用方跳过并告警。
    pub fn from_tag(tag: &str) -> Option<Self> {
        let normalized = tag.trim();
        if normalized.is_empty() {
            return None;
        }

        let upper = normalized.to_uppercase();
        Self::PROVISIONING_ORDER
            .into_iter()
            .find(|t| t.accepted_tags().contains(&upper.as_str()))
    }

    /// 可识别的标签（大写）: 标准代码 + 历史意大利语标签
    pub fn accepted_tags(&self) -> [&'static str; 2] {
        match self {
            SignalType::DigitalInput => ["DIGITAL_INPUT", "INPUT DIGITALE"],
            SignalType::DigitalOutput => ["DIGITAL_OUTPUT", "OUTPUT DIGITALE"],
            SignalType::DigitalInputFailSafe => ["DIGITAL_INPUT_FS", "INPUT DIGITALE FAIL-SAFE"],
            SignalType::DigitalOutputFailSafe => ["DIGITAL_OUTPUT_FS", "OUTPUT DIGITALE FAIL-SAFE"],
            SignalType::AnalogInputCurrent => ["ANALOG_INPUT_CURRENT", "INPUT ANALOGICO CORRENTE"],
            SignalType::AnalogInputVoltage => ["ANALOG_INPUT_VOLTAGE", "INPUT ANALOGICO TENSIONE"],
            SignalType::AnalogOutputCurrent => ["ANALOG_OUTPUT_CURRENT", "OUTPUT ANALOGICO CORRENTE"],
            SignalType::AnalogOutputVoltage => ["ANALOG_OUTPUT_VOLTAGE", "OUTPUT ANALOGICO TENSIONE"],
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 容量字段 (Capacity Field)
// ==========================================
// 对应模块目录中的 DI / DO / AI / AO / F-DI / F-DO 六列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapacityField {
    #[serde(rename = "DI")]
    Di,
    #[serde(rename = "DO")]
    Do,
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "AO")]
    Ao,
    #[serde(rename = "F-DI")]
    FDi,
    #[serde(rename = "F-DO")]
    FDo,
}

impl fmt::Display for CapacityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityField::Di => write!(f, "DI"),
            CapacityField::Do => write!(f, "DO"),
            CapacityField::Ai => write!(f, "AI"),
            CapacityField::Ao => write!(f, "AO"),
            CapacityField::FDi => write!(f, "F-DI"),
            CapacityField::FDo => write!(f, "F-DO"),
        }
    }
}

// ==========================================
// 位置标签 (Position Tag)
// ==========================================
// 仅用于决定填充优先级: 柜内 > 按钮站 > 机边 > 其他
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionTag {
    InteriorPanel,     // 柜内 (interno_quadro)
    PushbuttonStation, // 按钮站 (pulsantiera)
    MachineEdge,       // 机边 (bordo_macchina)
    Other,             // 其他 / 未设置
}

impl PositionTag {
    /// 从存储值解析（NULL 或未知值归入 Other）
    pub fn from_db(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()) {
            Some(s) if s == "interno_quadro" || s == "interior_panel" => PositionTag::InteriorPanel,
            Some(s) if s == "pulsantiera" || s == "pushbutton_station" => {
                PositionTag::PushbuttonStation
            }
            Some(s) if s == "bordo_macchina" || s == "machine_edge" => PositionTag::MachineEdge,
            _ => PositionTag::Other,
        }
    }

    /// 填充优先级（数值越小越优先）
    pub fn fill_priority(&self) -> u8 {
        match self {
            PositionTag::InteriorPanel => 0,
            PositionTag::PushbuttonStation => 1,
            PositionTag::MachineEdge => 2,
            PositionTag::Other => 3,
        }
    }
}

impl fmt::Display for PositionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionTag::InteriorPanel => write!(f, "interno_quadro"),
            PositionTag::PushbuttonStation => write!(f, "pulsantiera"),
            PositionTag::MachineEdge => write!(f, "bordo_macchina"),
            PositionTag::Other => write!(f, "OTHER"),
        }
    }
}
