// ==========================================
// PLC 硬件配置系统 - 操作日志领域模型
// ==========================================
// 红线: 所有写入必须记录
// 用途: 审计追踪（配置 / 分配 / 人工调整）
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,               // 日志ID (uuid)
    pub project_id: Option<i64>,         // 关联项目
    pub action_type: String,             // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,        // 操作时间戳
    pub actor: String,                   // 操作人
    pub payload_json: Option<JsonValue>, // 操作参数 / 结果摘要
    pub detail: Option<String>,          // 详细描述
}

impl ActionLog {
    /// 以当前时间创建日志
    pub fn new(
        project_id: Option<i64>,
        action_type: ActionType,
        actor: &str,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            project_id,
            action_type: action_type.to_string(),
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            payload_json,
            detail,
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    ProvisionNode, // 自动配置节点模块
    AllocateIo,    // 自动分配 I/O
    AssignIo,      // 人工分配单个 I/O
    RemoveIo,      // 人工移除 I/O 分配
    AddModule,     // 人工添加模块
    RemoveModule,  // 人工移除模块
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::ProvisionNode => write!(f, "PROVISION_NODE"),
            ActionType::AllocateIo => write!(f, "ALLOCATE_IO"),
            ActionType::AssignIo => write!(f, "ASSIGN_IO"),
            ActionType::RemoveIo => write!(f, "REMOVE_IO"),
            ActionType::AddModule => write!(f, "ADD_MODULE"),
            ActionType::RemoveModule => write!(f, "REMOVE_MODULE"),
        }
    }
}
