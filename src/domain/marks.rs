// ==========================================
// 考务管理系统 - 成绩领域模型
// ==========================================
// 职责: 学生成绩条目与科目成绩册
// 红线: 缺考与得分互斥; 原始分一经定稿后首次调整即固化,之后不可变
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::ModerationType;

// ==========================================
// MarkEntry - 成绩条目状态
// ==========================================
// 显式区分"从未录入"与"录入后改回原值":
// Corrected 回改到原始分时折叠回 Entered,不残留调整字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarkEntry {
    /// 尚未录入
    Unset,
    /// 已录入得分
    Entered { value: u32 },
    /// 缺考
    Absent,
    /// 定稿后调整过的得分 (original 为定稿时的原始分,固化不变)
    Corrected {
        original: u32,
        current: u32,
        kind: ModerationType,
        reason: String,
    },
}

impl MarkEntry {
    /// 当前有效得分 (缺考/未录入为 None)
    pub fn current_value(&self) -> Option<u32> {
        match self {
            MarkEntry::Entered { value } => Some(*value),
            MarkEntry::Corrected { current, .. } => Some(*current),
            MarkEntry::Unset | MarkEntry::Absent => None,
        }
    }

    /// 是否缺考
    pub fn is_absent(&self) -> bool {
        matches!(self, MarkEntry::Absent)
    }

    /// 是否为定稿后的调整条目
    pub fn is_correction(&self) -> bool {
        matches!(self, MarkEntry::Corrected { .. })
    }

    /// 是否已录入 (含调整后的值)
    pub fn is_entered(&self) -> bool {
        self.current_value().is_some()
    }
}

// ==========================================
// StudentMark - 学生成绩
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentMark {
    pub student_id: String,   // 学生ID
    pub roll_number: String,  // 学号 (批量导入按学号合并)
    pub student_name: String, // 姓名
    pub section: String,      // 班级/分部
    pub entry: MarkEntry,     // 成绩条目状态
}

impl StudentMark {
    /// 创建未录入的成绩条目
    pub fn unset(student_id: &str, roll_number: &str, student_name: &str, section: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            roll_number: roll_number.to_string(),
            student_name: student_name.to_string(),
            section: section.to_string(),
            entry: MarkEntry::Unset,
        }
    }
}

// ==========================================
// SubjectMarkSet - 科目成绩册
// ==========================================
// 定稿 (finalized) 后修改只能走复核通道
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectMarkSet {
    pub subject_id: String,                    // 科目ID
    pub marks: Vec<StudentMark>,               // 学生成绩 (按册内顺序)
    pub finalized: bool,                       // 是否已定稿
    pub finalized_at: Option<DateTime<Utc>>,   // 定稿时间
    pub is_moderated: bool,                    // 调整已获人工审批
    pub approved_by: Option<String>,           // 审批人
}

impl SubjectMarkSet {
    /// 以学生名册初始化空成绩册
    pub fn open(subject_id: &str, marks: Vec<StudentMark>) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            marks,
            finalized: false,
            finalized_at: None,
            is_moderated: false,
            approved_by: None,
        }
    }

    /// 按学生ID查找
    pub fn find_mark(&self, student_id: &str) -> Option<&StudentMark> {
        self.marks.iter().find(|m| m.student_id == student_id)
    }

    /// 按学生ID查找 (可变)
    pub fn find_mark_mut(&mut self, student_id: &str) -> Option<&mut StudentMark> {
        self.marks.iter_mut().find(|m| m.student_id == student_id)
    }

    /// 按学号查找 (可变,批量导入入口)
    pub fn find_by_roll_mut(&mut self, roll_number: &str) -> Option<&mut StudentMark> {
        self.marks.iter_mut().find(|m| m.roll_number == roll_number)
    }

    /// 定稿后被调整过的条目
    pub fn corrections(&self) -> impl Iterator<Item = &StudentMark> {
        self.marks.iter().filter(|m| m.entry.is_correction())
    }

    /// 调整条目数量
    pub fn correction_count(&self) -> usize {
        self.corrections().count()
    }
}

// ==========================================
// BulkMarkRow - 批量导入行
// ==========================================
// 按学号与成绩册合并; 未匹配的学号跳过并报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkMarkRow {
    pub roll_number: String,       // 学号
    pub student_name: String,      // 姓名 (仅供人工核对,合并时忽略)
    pub marks: Option<u32>,        // 得分 (空 = 未录入)
    pub absent: bool,              // 缺考标志
}
