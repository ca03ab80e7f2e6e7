// ==========================================
// 考务管理系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 预期业务条件一律返回类型化错误,不抛 panic;
//       软冲突 (考场/班级重叠、幅度提醒) 不是错误,
//       作为警告随 Ok 结果返回
// ==========================================

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::domain::types::ExamStage;

// ==========================================
// StageBlockReason - 阶段阻断原因
// ==========================================
// 红线: 被阻断的前进必须带出具体缺失项,供界面逐条展示
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StageBlockReason {
    /// 尚无任何考试场次
    NoTimetableEntries,
    /// 存在未安排监考的场次
    UncoveredSessions(Vec<String>),
    /// 存在未定稿成绩的科目
    UnfinalizedSubjects(Vec<String>),
    /// 存在调整未审批的科目
    PendingModeration(Vec<String>),
    /// 考试已发布,不可再前进/回退
    AlreadyPublished,
    /// 发布缺少操作员确认
    OperatorConfirmationMissing,
    /// 发布只能从待发布阶段发起
    NotInPublishingStage,
}

impl fmt::Display for StageBlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageBlockReason::NoTimetableEntries => write!(f, "尚无任何考试场次"),
            StageBlockReason::UncoveredSessions(entries) => {
                write!(f, "未安排监考的场次: {}", entries.join(", "))
            }
            StageBlockReason::UnfinalizedSubjects(subjects) => {
                write!(f, "成绩未定稿的科目: {}", subjects.join(", "))
            }
            StageBlockReason::PendingModeration(subjects) => {
                write!(f, "调整未审批的科目: {}", subjects.join(", "))
            }
            StageBlockReason::AlreadyPublished => write!(f, "考试已发布"),
            StageBlockReason::OperatorConfirmationMissing => {
                write!(f, "缺少操作员确认")
            }
            StageBlockReason::NotInPublishingStage => {
                write!(f, "发布只能从待发布阶段发起")
            }
        }
    }
}

// ==========================================
// StageGuardError - 阶段门禁错误
// ==========================================
#[derive(Error, Debug)]
#[error("阶段前进被阻断: {from} → {to}: {reason}")]
pub struct StageGuardError {
    pub from: ExamStage,
    pub to: ExamStage,
    pub reason: StageBlockReason,
}

// ==========================================
// EngineError - 引擎层错误类型
// ==========================================
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 输入校验错误 (始终阻断) =====
    #[error("成绩超出范围: value={value}, 允许区间 [0, {total}]")]
    MarksOutOfRange { value: u32, total: u32 },

    #[error("时间段无效: 开始 {start} 必须早于结束 {end}")]
    InvalidTimeRange { start: NaiveTime, end: NaiveTime },

    #[error("日期超出考试范围: {date} 不在 [{start}, {end}] 内")]
    DateOutsideExam {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("科目已排考: {subject}")]
    SubjectAlreadyScheduled { subject: String },

    #[error("科目配置已冻结,不可修改: {subject}")]
    SubjectFrozen { subject: String },

    #[error("及格线超过总分: passing={passing}, total={total}")]
    PassingExceedsTotal { passing: u32, total: u32 },

    #[error("成绩调整缺少类型或理由: student_id={student_id}")]
    ModerationFieldsMissing { student_id: String },

    #[error("缺考学生不可调整成绩: student_id={student_id}")]
    AbsentNotCorrectable { student_id: String },

    #[error("科目无调整记录,自动就绪,无需审批: subject={subject}")]
    NothingToApprove { subject: String },

    #[error("成绩册已存在: subject={subject}")]
    MarkSetAlreadyOpen { subject: String },

    // ===== 硬冲突 (操作拒绝) =====
    #[error("教师监考冲突: teacher_id={teacher_id} 在 {date} 已有时间重叠的监考任务 ({existing})")]
    TeacherDoubleBooked {
        teacher_id: String,
        date: NaiveDate,
        existing: String,
    },

    #[error("重复监考任务: teacher_id={teacher_id} 已分配至场次 {entry_id}")]
    DutyAlreadyAssigned {
        teacher_id: String,
        entry_id: String,
    },

    // ===== 阶段门禁错误 =====
    #[error(transparent)]
    StageGuard(#[from] StageGuardError),

    // ===== 实体状态矛盾 =====
    #[error("状态冲突: 缺考与得分互斥, student_id={student_id}")]
    AbsentMarksConflict { student_id: String },

    #[error("考试已发布,操作被拒绝 (只读模式): {operation}")]
    PublishedReadOnly { operation: String },

    #[error("成绩册已定稿: subject={subject}")]
    AlreadyFinalized { subject: String },

    #[error("成绩册尚未定稿: subject={subject}")]
    NotFinalized { subject: String },

    #[error("回退目标无效: current={current}, target={target}")]
    InvalidStageTarget {
        current: ExamStage,
        target: ExamStage,
    },

    #[error("考试尚未发布,统计不可用: exam_id={exam_id}")]
    NotPublished { exam_id: String },

    // ===== 未知实体 (缺陷类) =====
    #[error("记录未找到: {entity} with id={id}")]
    UnknownEntity { entity: String, id: String },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    /// 未知实体错误的快捷构造
    pub fn unknown(entity: &str, id: &str) -> Self {
        EngineError::UnknownEntity {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
