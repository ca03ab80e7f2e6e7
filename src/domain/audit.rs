// ==========================================
// 考务管理系统 - 审计日志领域模型
// ==========================================
// 红线: 所有写入必须记录
// 用途: 审计追踪,事后问责
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::AuditAction;

// ==========================================
// AuditEntry - 审计条目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub audit_id: String,             // 条目ID
    pub action: AuditAction,          // 操作类型
    pub actor: String,                // 操作人
    pub detail: String,               // 详细描述
    pub occurred_at: DateTime<Utc>,   // 操作时间
}

impl AuditEntry {
    /// 记录一次操作
    pub fn record(action: AuditAction, actor: &str, detail: impl Into<String>) -> Self {
        Self {
            audit_id: Uuid::new_v4().to_string(),
            action,
            actor: actor.to_string(),
            detail: detail.into(),
            occurred_at: Utc::now(),
        }
    }
}
