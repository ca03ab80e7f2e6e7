// ==========================================
// 考务管理系统 - 通知服务接口
// ==========================================
// 职责: 成绩发布后的对外通知 (短信/邮件/报表)
// 红线: 仅在发布转移后触发,引擎不阻塞、不因其失败而失败
// ==========================================

use async_trait::async_trait;

use crate::domain::exam::Exam;
use crate::services::ServiceError;

// ==========================================
// NotificationService Trait
// ==========================================
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// 成绩已发布通知
    async fn results_published(&self, exam: &Exam) -> Result<(), ServiceError>;
}

// ==========================================
// NoOpNotificationService - 空操作通知 (测试/单机运行)
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct NoOpNotificationService;

#[async_trait]
impl NotificationService for NoOpNotificationService {
    async fn results_published(&self, exam: &Exam) -> Result<(), ServiceError> {
        tracing::debug!(
            exam_id = %exam.exam_id,
            "NoOpNotificationService: 跳过发布通知"
        );
        Ok(())
    }
}
