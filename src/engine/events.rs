// ==========================================
// 考务管理系统 - 引擎层事件发布
// ==========================================
// 职责: 定义考务事件发布 trait,实现依赖倒置
// 说明: Engine 层定义 trait,通知/报表层实现适配器
// 红线: 发布事件是尽力而为 —— 引擎不因下游失败而失败
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

use crate::domain::types::ExamStage;

// ==========================================
// 考务事件类型
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamEventType {
    /// 阶段变更 (前进或回退)
    StageChanged,
    /// 科目成绩定稿
    MarksFinalized,
    /// 科目调整审批通过
    SubjectApproved,
    /// 成绩发布 (触发外部通知/报表)
    ExamPublished,
}

impl ExamEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            ExamEventType::StageChanged => "StageChanged",
            ExamEventType::MarksFinalized => "MarksFinalized",
            ExamEventType::SubjectApproved => "SubjectApproved",
            ExamEventType::ExamPublished => "ExamPublished",
        }
    }
}

// ==========================================
// 考务事件
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamEvent {
    /// 考试ID
    pub exam_id: String,
    /// 事件类型
    pub event_type: ExamEventType,
    /// 事件发生时的阶段
    pub stage: ExamStage,
    /// 事件来源描述
    pub source: Option<String>,
    /// 补充说明 (科目名等)
    pub detail: Option<String>,
}

impl ExamEvent {
    pub fn new(
        exam_id: &str,
        event_type: ExamEventType,
        stage: ExamStage,
        source: Option<String>,
        detail: Option<String>,
    ) -> Self {
        Self {
            exam_id: exam_id.to_string(),
            event_type,
            stage,
            source,
            detail,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 考务事件发布者 Trait
///
/// Engine 层定义,通知层实现; 解除引擎对通知渠道的直接依赖
pub trait ExamEventPublisher: Send + Sync {
    /// 发布考务事件
    fn publish(&self, event: ExamEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景 (如单元测试)
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl ExamEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: ExamEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - exam_id={}, event_type={}",
            event.exam_id,
            event.event_type.as_str()
        );
        Ok(())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn ExamEventPublisher>> 的使用;
/// 发布失败只记日志,不向上传播
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn ExamEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn ExamEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例 (不发布事件)
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 尽力发布 (失败只记警告)
    pub fn publish_best_effort(&self, event: ExamEvent) {
        if let Some(publisher) = &self.inner {
            if let Err(e) = publisher.publish(event.clone()) {
                tracing::warn!(
                    exam_id = %event.exam_id,
                    event_type = %event.event_type.as_str(),
                    error = %e,
                    "事件发布失败,已忽略"
                );
            }
        } else {
            tracing::debug!(
                exam_id = %event.exam_id,
                event_type = %event.event_type.as_str(),
                "未配置发布者,跳过事件"
            );
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_publisher() {
        let publisher = NoOpEventPublisher;
        let event = ExamEvent::new(
            "E001",
            ExamEventType::ExamPublished,
            ExamStage::Published,
            Some("PublishingGate".to_string()),
            None,
        );
        assert!(publisher.publish(event).is_ok());
    }

    #[test]
    fn test_optional_publisher_none_is_silent() {
        let publisher = OptionalEventPublisher::none();
        assert!(!publisher.is_configured());
        publisher.publish_best_effort(ExamEvent::new(
            "E001",
            ExamEventType::StageChanged,
            ExamStage::Timetable,
            None,
            None,
        ));
    }

    #[test]
    fn test_optional_publisher_with_noop() {
        let noop = Arc::new(NoOpEventPublisher) as Arc<dyn ExamEventPublisher>;
        let publisher = OptionalEventPublisher::with_publisher(noop);
        assert!(publisher.is_configured());
    }
}
