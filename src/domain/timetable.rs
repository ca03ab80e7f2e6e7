// ==========================================
// 考务管理系统 - 排考领域模型
// ==========================================
// 职责: 考试场次条目 (科目 × 日期 × 时间段 × 考场)
// 红线: 每个科目在同一考试中至多排一场
// ==========================================

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// TimetableEntry - 考试场次
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub entry_id: String,         // 场次ID
    pub subject_id: String,       // 科目ID (同一考试内唯一)
    pub date: NaiveDate,          // 考试日期 (必须落在考试日期范围内)
    pub start_time: NaiveTime,    // 开始时间
    pub end_time: NaiveTime,      // 结束时间 (必须晚于开始时间)
    pub room: Option<String>,     // 考场 (可选)
    pub sections: Vec<String>,    // 目标班级 (空 = 考试全部班级)
}

impl TimetableEntry {
    /// 创建新场次 (ID 自动生成)
    pub fn new(
        subject_id: &str,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        room: Option<String>,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4().to_string(),
            subject_id: subject_id.to_string(),
            date,
            start_time,
            end_time,
            room,
            sections: Vec::new(),
        }
    }

    /// 与另一场次的目标班级是否有交集 (空列表代表全部班级)
    pub fn shares_sections_with(&self, other: &TimetableEntry) -> bool {
        if self.sections.is_empty() || other.sections.is_empty() {
            return true;
        }
        self.sections.iter().any(|s| other.sections.contains(s))
    }

    /// 与另一场次的时间段是否重叠 (仅同日有意义)
    pub fn overlaps(&self, other: &TimetableEntry) -> bool {
        self.date == other.date
            && self.start_time < other.end_time
            && self.end_time > other.start_time
    }

    /// 场次描述 (用于冲突/阻塞提示)
    pub fn descriptor(&self) -> String {
        format!(
            "{} {} {}-{}",
            self.subject_id, self.date, self.start_time, self.end_time
        )
    }
}

// ==========================================
// EntryCandidate - 待创建的场次参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryCandidate {
    pub subject_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room: Option<String>,
    /// 目标班级 (空 = 考试全部班级)
    #[serde(default)]
    pub sections: Vec<String>,
}
