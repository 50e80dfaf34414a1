// ==========================================
// PLC 硬件配置系统 - 硬件领域模型
// ==========================================
// ModuleType: 模块目录（只读）
// ModuleInstance: 节点内已配置的模块（槽位从 1 连续编号）
// PlcNode: 控制器节点
// ==========================================

use crate::domain::types::{CapacityField, SignalType};
use serde::{Deserialize, Serialize};

// ==========================================
// ChannelCapacity - 各类通道容量
// ==========================================
// 0 表示不支持该类通道
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCapacity {
    pub di: u32,
    #[serde(rename = "do")]
    pub dout: u32,
    pub ai: u32,
    pub ao: u32,
    pub f_di: u32,
    pub f_do: u32,
}

impl ChannelCapacity {
    /// 读取指定字段的容量
    pub fn get(&self, field: CapacityField) -> u32 {
        match field {
            CapacityField::Di => self.di,
            CapacityField::Do => self.dout,
            CapacityField::Ai => self.ai,
            CapacityField::Ao => self.ao,
            CapacityField::FDi => self.f_di,
            CapacityField::FDo => self.f_do,
        }
    }
}

// ==========================================
// ModuleType - 模块目录条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleType {
    pub module_type_id: i64,
    pub name: String,                       // 型号名称 (如 DI16)
    pub description: Option<String>,
    pub kind_tag: String,                   // 原始模块类型标签
    pub governing_type: Option<SignalType>, // 承载的信号类型 (None = 未识别)
    pub capacity: ChannelCapacity,
}

// ==========================================
// ModuleInstance - 已配置模块
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInstance {
    pub module_id: i64,
    pub node_id: i64,
    pub project_id: i64,
    pub module_type_id: i64,
    pub slot: i32,     // 槽位号 (节点内从 1 连续)
    pub quantity: i32, // 数量 (当前恒为 1)
}

/// 新建模块载体（槽位由调用方决定）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewModuleInstance {
    pub module_type_id: i64,
    pub slot: i32,
    pub quantity: i32,
}

// ==========================================
// PlcNode - 控制器节点
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlcNode {
    pub node_id: i64,
    pub project_id: i64,
    pub name: String,
    pub node_type: String,
    pub description: Option<String>,
}

/// 自动创建节点时使用的模板
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTemplate {
    pub name: String,
    pub node_type: String,
    pub description: Option<String>,
}

impl Default for NodeTemplate {
    fn default() -> Self {
        Self {
            name: "CPU01".to_string(),
            node_type: "PLC".to_string(),
            description: Some("自动创建的 PLC 节点".to_string()),
        }
    }
}
