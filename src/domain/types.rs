// ==========================================
// 考务管理系统 - 领域类型定义
// ==========================================
// 职责: 考试流程引擎的核心枚举类型
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 考试阶段 (Exam Stage)
// ==========================================
// 红线: 阶段严格有序,不可跳跃,发布后不可回退
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamStage {
    Creation,     // 创建中
    Timetable,    // 排考
    Invigilation, // 监考安排
    Marks,        // 成绩录入
    Moderation,   // 成绩复核
    Publishing,   // 待发布
    Published,    // 已发布
}

impl fmt::Display for ExamStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ExamStage {
    /// 阶段序号 (用于前进/回退比较)
    pub fn order(&self) -> u8 {
        match self {
            ExamStage::Creation => 0,
            ExamStage::Timetable => 1,
            ExamStage::Invigilation => 2,
            ExamStage::Marks => 3,
            ExamStage::Moderation => 4,
            ExamStage::Publishing => 5,
            ExamStage::Published => 6,
        }
    }

    /// 下一个阶段 (已发布为终态)
    pub fn next(&self) -> Option<ExamStage> {
        match self {
            ExamStage::Creation => Some(ExamStage::Timetable),
            ExamStage::Timetable => Some(ExamStage::Invigilation),
            ExamStage::Invigilation => Some(ExamStage::Marks),
            ExamStage::Marks => Some(ExamStage::Moderation),
            ExamStage::Moderation => Some(ExamStage::Publishing),
            ExamStage::Publishing => Some(ExamStage::Published),
            ExamStage::Published => None,
        }
    }

    /// 是否已发布 (终态,进入只读模式)
    pub fn is_published(&self) -> bool {
        *self == ExamStage::Published
    }

    /// 从字符串解析阶段
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CREATION" => Some(ExamStage::Creation),
            "TIMETABLE" => Some(ExamStage::Timetable),
            "INVIGILATION" => Some(ExamStage::Invigilation),
            "MARKS" => Some(ExamStage::Marks),
            "MODERATION" => Some(ExamStage::Moderation),
            "PUBLISHING" => Some(ExamStage::Publishing),
            "PUBLISHED" => Some(ExamStage::Published),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ExamStage::Creation => "CREATION",
            ExamStage::Timetable => "TIMETABLE",
            ExamStage::Invigilation => "INVIGILATION",
            ExamStage::Marks => "MARKS",
            ExamStage::Moderation => "MODERATION",
            ExamStage::Publishing => "PUBLISHING",
            ExamStage::Published => "PUBLISHED",
        }
    }
}

// ==========================================
// 排考冲突类型 (Schedule Conflict Kind)
// ==========================================
// 红线: 软冲突,条目仍然创建,警告由调用方呈现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    RoomConflict,  // 考场冲突 (同日同考场时间重叠)
    ClassConflict, // 班级冲突 (同一批考生不能同时参加两场考试)
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::RoomConflict => write!(f, "ROOM_CONFLICT"),
            ConflictKind::ClassConflict => write!(f, "CLASS_CONFLICT"),
        }
    }
}

// ==========================================
// 复核状态 (Moderation State)
// ==========================================
// 状态机: NOT_STARTED → READY / PENDING_APPROVAL → READY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationState {
    NotStarted,      // 成绩尚未定稿
    Ready,           // 无调整,或调整已审批
    PendingApproval, // 存在未审批的调整
}

impl fmt::Display for ModerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModerationState::NotStarted => write!(f, "NOT_STARTED"),
            ModerationState::Ready => write!(f, "READY"),
            ModerationState::PendingApproval => write!(f, "PENDING_APPROVAL"),
        }
    }
}

// ==========================================
// 成绩调整类型 (Moderation Type)
// ==========================================
// 调整值与原始值不同时必填
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationType {
    EntryError,   // 录入错误更正
    Reevaluation, // 复评改分
    GraceMarks,   // 政策性加分
    Other,        // 其他 (理由中说明)
}

impl fmt::Display for ModerationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ModerationType {
    /// 从字符串解析调整类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ENTRY_ERROR" => Some(ModerationType::EntryError),
            "REEVALUATION" => Some(ModerationType::Reevaluation),
            "GRACE_MARKS" => Some(ModerationType::GraceMarks),
            "OTHER" => Some(ModerationType::Other),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ModerationType::EntryError => "ENTRY_ERROR",
            ModerationType::Reevaluation => "REEVALUATION",
            ModerationType::GraceMarks => "GRACE_MARKS",
            ModerationType::Other => "OTHER",
        }
    }
}

// ==========================================
// 审计操作类型 (Audit Action)
// ==========================================
// 红线: 所有写入必须记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    StageAdvanced,      // 阶段前进
    StageReverted,      // 阶段回退
    EntryAdded,         // 新增考试场次
    EntryRemoved,       // 删除考试场次
    DutyAssigned,       // 分配监考任务
    DutyReleased,       // 解除监考任务
    MarksFinalized,     // 成绩定稿
    CorrectionProposed, // 提出成绩调整
    SubjectApproved,    // 科目调整审批通过
    ExamPublished,      // 成绩发布
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::StageAdvanced => write!(f, "STAGE_ADVANCED"),
            AuditAction::StageReverted => write!(f, "STAGE_REVERTED"),
            AuditAction::EntryAdded => write!(f, "ENTRY_ADDED"),
            AuditAction::EntryRemoved => write!(f, "ENTRY_REMOVED"),
            AuditAction::DutyAssigned => write!(f, "DUTY_ASSIGNED"),
            AuditAction::DutyReleased => write!(f, "DUTY_RELEASED"),
            AuditAction::MarksFinalized => write!(f, "MARKS_FINALIZED"),
            AuditAction::CorrectionProposed => write!(f, "CORRECTION_PROPOSED"),
            AuditAction::SubjectApproved => write!(f, "SUBJECT_APPROVED"),
            AuditAction::ExamPublished => write!(f, "EXAM_PUBLISHED"),
        }
    }
}
