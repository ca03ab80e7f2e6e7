// ==========================================
// 考务管理系统 - 监考领域模型
// ==========================================
// 职责: 教师对考试场次的监考任务
// 红线: 同一教师不得持有时间段重叠的两个监考任务
// ==========================================

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::timetable::TimetableEntry;

// ==========================================
// InvigilationDuty - 监考任务
// ==========================================
// 日期/时间在创建时从所引用的场次复制,便于独立做冲突扫描
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvigilationDuty {
    pub duty_id: String,       // 任务ID
    pub entry_id: String,      // 所属场次ID
    pub teacher_id: String,    // 教师ID
    pub room: Option<String>,  // 监考考场
    pub date: NaiveDate,       // 场次日期 (快照)
    pub start_time: NaiveTime, // 场次开始时间 (快照)
    pub end_time: NaiveTime,   // 场次结束时间 (快照)
}

impl InvigilationDuty {
    /// 从场次创建监考任务
    pub fn for_entry(entry: &TimetableEntry, teacher_id: &str, room: Option<String>) -> Self {
        Self {
            duty_id: Uuid::new_v4().to_string(),
            entry_id: entry.entry_id.clone(),
            teacher_id: teacher_id.to_string(),
            room,
            date: entry.date,
            start_time: entry.start_time,
            end_time: entry.end_time,
        }
    }

    /// 与另一任务的时间段是否重叠 (仅同日有意义)
    pub fn overlaps(&self, other: &InvigilationDuty) -> bool {
        self.date == other.date
            && self.start_time < other.end_time
            && self.end_time > other.start_time
    }
}

// ==========================================
// CoverageReport - 监考覆盖情况
// ==========================================
// 覆盖定义: 场次至少有一个监考任务引用它
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageReport {
    pub covered_count: usize,            // 已覆盖场次数
    pub total: usize,                    // 场次总数
    pub uncovered_entries: Vec<String>,  // 未覆盖场次描述列表
}

impl CoverageReport {
    /// 是否全覆盖 (进入成绩录入阶段的硬门禁)
    pub fn is_complete(&self) -> bool {
        self.uncovered_entries.is_empty()
    }
}
