// ==========================================
// PLC 硬件配置系统 - I/O 信号领域模型
// ==========================================
// 生命周期: 由信号清单导入创建（外部），
//           仅由分配引擎 / 人工分配修改 module_id 与 slot，
//           本系统从不删除信号
// ==========================================

use crate::domain::types::{PositionTag, SignalType};
use serde::{Deserialize, Serialize};

// ==========================================
// IoSignal - 逻辑 I/O 点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoSignal {
    // ===== 主键 =====
    pub signal_id: i64,  // 信号ID
    pub project_id: i64, // 所属项目

    // ===== 基本信息 =====
    pub code: String,                // 信号编号
    pub description: Option<String>, // 描述

    // ===== 类型 =====
    pub type_tag: String,                // 原始类型标签
    pub signal_type: Option<SignalType>, // 解析后的类型 (None = 未识别)
    pub position: PositionTag,           // 位置标签

    // ===== 分配结果 =====
    pub module_id: Option<i64>, // 所在模块 (None = 未分配)
    pub slot: Option<i32>,      // 模块槽位镜像 (地址用途)
    pub cpu: Option<String>,    // CPU 标识
    pub rack: Option<String>,   // 机架标识
}

impl IoSignal {
    /// 是否已分配到模块
    pub fn is_assigned(&self) -> bool {
        self.module_id.is_some()
    }
}

// ==========================================
// NewIoSignal - 信号写入载体
// ==========================================
// 用途: 信号清单导入 / 测试数据准备
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIoSignal {
    pub project_id: i64,
    pub code: String,
    pub description: Option<String>,
    pub type_tag: String,
    pub position: Option<String>,
}

impl NewIoSignal {
    /// 以标准类型创建
    pub fn new(project_id: i64, code: &str, signal_type: SignalType, position: Option<&str>) -> Self {
        Self {
            project_id,
            code: code.to_string(),
            description: None,
            type_tag: signal_type.code().to_string(),
            position: position.map(|p| p.to_string()),
        }
    }
}
