// ==========================================
// 考务管理系统 - 考试聚合根
// ==========================================
// 职责: 考试及其独占的子集合 (场次/监考/成绩册/审计)
// 红线: 所有变更必须经由引擎操作,禁止外部直接改写
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::audit::AuditEntry;
use crate::domain::invigilation::InvigilationDuty;
use crate::domain::marks::SubjectMarkSet;
use crate::domain::timetable::TimetableEntry;
use crate::domain::types::{AuditAction, ExamStage};

// ==========================================
// Subject - 考试科目
// ==========================================
// 红线: 进入排考阶段后不可再改 (总分/及格线变更会使
// 已有成绩的及格判定失效,视为致命配置错误)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: String,     // 科目ID
    pub name: String,           // 科目名称
    pub total_marks: u32,       // 总分
    pub passing_marks: u32,     // 及格线 (0 ≤ 及格线 ≤ 总分)
    pub duration_minutes: u32,  // 考试时长 (分钟)
}

impl Subject {
    pub fn new(name: &str, total_marks: u32, passing_marks: u32, duration_minutes: u32) -> Self {
        Self {
            subject_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            total_marks,
            passing_marks,
            duration_minutes,
        }
    }
}

// ==========================================
// Student - 学生名册条目 (名册服务视图)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,  // 学生ID
    pub name: String,        // 姓名
    pub roll_number: String, // 学号
    pub section: String,     // 班级/分部
}

// ==========================================
// Teacher / TeacherRoster - 教师名册 (教师目录服务视图)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub teacher_id: String, // 教师ID
    pub name: String,       // 姓名
}

/// 可分配监考的教师名册,由教师目录服务预加载
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeacherRoster {
    pub teachers: Vec<Teacher>,
}

impl TeacherRoster {
    pub fn new(teachers: Vec<Teacher>) -> Self {
        Self { teachers }
    }

    /// 教师是否在册
    pub fn contains(&self, teacher_id: &str) -> bool {
        self.teachers.iter().any(|t| t.teacher_id == teacher_id)
    }
}

// ==========================================
// Exam - 考试聚合根
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub exam_id: String,                      // 考试ID
    pub name: String,                         // 考试名称
    pub grade: String,                        // 年级
    pub sections: Vec<String>,                // 目标班级/分部
    pub subjects: Vec<Subject>,               // 科目列表
    pub start_date: NaiveDate,                // 考试开始日期
    pub end_date: NaiveDate,                  // 考试结束日期
    pub stage: ExamStage,                     // 当前阶段
    pub published_at: Option<DateTime<Utc>>,  // 发布时间 (只设置一次)
    pub timetable: Vec<TimetableEntry>,       // 场次
    pub duties: Vec<InvigilationDuty>,        // 监考任务
    pub mark_sets: Vec<SubjectMarkSet>,       // 科目成绩册
    pub audit_trail: Vec<AuditEntry>,         // 审计日志
    pub created_by: String,                   // 创建人
    pub created_at: DateTime<Utc>,            // 创建时间
    pub updated_at: DateTime<Utc>,            // 更新时间
}

impl Exam {
    /// 创建新考试 (初始阶段 CREATION)
    pub fn new(
        name: &str,
        grade: &str,
        sections: Vec<String>,
        subjects: Vec<Subject>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        created_by: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            exam_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            grade: grade.to_string(),
            sections,
            subjects,
            start_date,
            end_date,
            stage: ExamStage::Creation,
            published_at: None,
            timetable: Vec::new(),
            duties: Vec::new(),
            mark_sets: Vec::new(),
            audit_trail: Vec::new(),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 是否已发布 (场次/监考/成绩录入进入只读模式)
    pub fn is_published(&self) -> bool {
        self.stage.is_published()
    }

    /// 日期是否落在考试日期范围内
    pub fn date_in_range(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// 按ID查找科目
    pub fn subject(&self, subject_id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.subject_id == subject_id)
    }

    /// 按ID查找场次
    pub fn entry(&self, entry_id: &str) -> Option<&TimetableEntry> {
        self.timetable.iter().find(|e| e.entry_id == entry_id)
    }

    /// 按科目查找成绩册
    pub fn mark_set(&self, subject_id: &str) -> Option<&SubjectMarkSet> {
        self.mark_sets.iter().find(|m| m.subject_id == subject_id)
    }

    /// 按科目查找成绩册 (可变)
    pub fn mark_set_mut(&mut self, subject_id: &str) -> Option<&mut SubjectMarkSet> {
        self.mark_sets.iter_mut().find(|m| m.subject_id == subject_id)
    }

    /// 追加审计条目并刷新更新时间
    pub fn record_audit(&mut self, action: AuditAction, actor: &str, detail: impl Into<String>) {
        self.audit_trail.push(AuditEntry::record(action, actor, detail));
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_exam_starts_in_creation() {
        let exam = Exam::new(
            "期中考试",
            "G10",
            vec!["A".to_string()],
            vec![Subject::new("数学", 100, 35, 120)],
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            "admin",
        );
        assert_eq!(exam.stage, ExamStage::Creation);
        assert!(exam.published_at.is_none());
        assert!(exam.timetable.is_empty());
    }

    #[test]
    fn test_date_in_range_inclusive() {
        let exam = Exam::new(
            "期中考试",
            "G10",
            vec![],
            vec![],
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            "admin",
        );
        assert!(exam.date_in_range(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()));
        assert!(exam.date_in_range(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()));
        assert!(!exam.date_in_range(NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()));
    }
}
