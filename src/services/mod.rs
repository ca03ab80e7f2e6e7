// ==========================================
// 考务管理系统 - 外部服务层
// ==========================================
// 职责: 引擎消费的外部协作方接口 (名册/持久化/通知)
// 说明: 引擎定义 trait,宿主系统实现适配器; 内存实现用于测试与单机运行
// 红线: 阻塞 I/O 只存在于本层,纯校验/转移逻辑不做 I/O
// ==========================================

pub mod notification;
pub mod persistence;
pub mod roster;
pub mod workflow;

use std::error::Error;

/// 服务层错误类型别名
pub type ServiceError = Box<dyn Error + Send + Sync>;

// 重导出核心接口
pub use notification::{NoOpNotificationService, NotificationService};
pub use persistence::{ExamPersistence, InMemoryExamStore};
pub use roster::{InMemoryDirectory, RosterService, StaffDirectory};
pub use workflow::ExamWorkflow;
