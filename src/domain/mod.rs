// ==========================================
// 考务管理系统 - 领域层
// ==========================================
// 职责: 考试聚合与核心类型,不含业务规则
// ==========================================

pub mod audit;
pub mod exam;
pub mod invigilation;
pub mod marks;
pub mod timetable;
pub mod types;

// 重导出核心实体
pub use audit::AuditEntry;
pub use exam::{Exam, Student, Subject, Teacher, TeacherRoster};
pub use invigilation::{CoverageReport, InvigilationDuty};
pub use marks::{BulkMarkRow, MarkEntry, StudentMark, SubjectMarkSet};
pub use timetable::{EntryCandidate, TimetableEntry};
pub use types::{AuditAction, ConflictKind, ExamStage, ModerationState, ModerationType};
