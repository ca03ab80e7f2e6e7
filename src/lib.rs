// ==========================================
// 考务管理系统 - 考试流程引擎核心库
// ==========================================
// 系统定位: 考试评估流程引擎 (创建 → 排考 → 监考 →
//           录入 → 复核 → 发布),人工最终控制权
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 成绩批量上传
pub mod importer;

// 外部服务层 - 名册/持久化/通知接口
pub mod services;

// 配置层 - 引擎策略参数
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AuditAction, ConflictKind, ExamStage, ModerationState, ModerationType,
};

// 领域实体
pub use domain::{
    AuditEntry, BulkMarkRow, CoverageReport, EntryCandidate, Exam, InvigilationDuty, MarkEntry,
    Student, StudentMark, Subject, SubjectMarkSet, Teacher, TeacherRoster, TimetableEntry,
};

// 引擎
pub use engine::{
    EngineError, EngineResult, InvigilationAssigner, MarksLedger, ModerationGate, PublishingGate,
    ResultsAggregator, StageBlockReason, StageGuardError, TimetableScheduler,
};

// 配置
pub use config::EngineConfig;

// 服务门面
pub use services::ExamWorkflow;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "考务管理系统";
