// ==========================================
// 考务管理系统 - 引擎层
// ==========================================
// 职责: 实现考务流程业务规则
// 红线: 所有规则必须输出 reason; 预期业务条件返回类型化结果,不抛 panic
// ==========================================

pub mod error;
pub mod events;
pub mod invigilation_assigner;
pub mod marks_ledger;
pub mod moderation_gate;
pub mod publishing_gate;
pub mod results_aggregator;
pub mod timetable_scheduler;

// 重导出核心引擎
pub use error::{EngineError, EngineResult, StageBlockReason, StageGuardError};
pub use events::{
    ExamEvent, ExamEventPublisher, ExamEventType, NoOpEventPublisher, OptionalEventPublisher,
};
pub use invigilation_assigner::InvigilationAssigner;
pub use marks_ledger::{BulkMergeReport, MarksLedger};
pub use moderation_gate::{CorrectionOutcome, MagnitudeWarning, ModerationGate, ModerationStatus};
pub use publishing_gate::PublishingGate;
pub use results_aggregator::{
    ExamStatistics, ResultsAggregator, SectionStatistics, SubjectStatistics,
};
pub use timetable_scheduler::{AddEntryOutcome, ScheduleConflict, TimetableScheduler};
