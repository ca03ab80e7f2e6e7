// ==========================================
// 考务管理系统 - 排考引擎
// ==========================================
// 职责: 创建/删除考试场次,检测排考冲突
// 红线: 冲突是警告不是失败 —— 条目仍然创建,
//       由调用方向管理员呈现警告 (故意重叠选考场次是合法操作)
// ==========================================

use serde::Serialize;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::domain::exam::{Exam, Subject};
use crate::domain::timetable::{EntryCandidate, TimetableEntry};
use crate::domain::types::{AuditAction, ConflictKind, ExamStage};
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// ScheduleConflict - 排考冲突警告 (软)
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleConflict {
    pub kind: ConflictKind,       // 冲突类型
    pub with_entry: String,       // 冲突场次描述
    pub room: Option<String>,     // 涉及考场 (考场冲突时)
    pub message: String,          // 呈现给管理员的提示
}

// ==========================================
// AddEntryOutcome - 创建场次结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct AddEntryOutcome {
    pub entry_id: String,                  // 已创建的场次ID
    pub warnings: Vec<ScheduleConflict>,   // 冲突警告 (可能为空)
}

// ==========================================
// TimetableScheduler - 排考引擎
// ==========================================
pub struct TimetableScheduler {
    config: EngineConfig,
}

impl TimetableScheduler {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// 创建考试场次
    ///
    /// # 校验 (硬失败)
    /// - 科目必须属于本考试且尚未排考
    /// - 日期必须落在考试日期范围内
    /// - 开始时间必须早于结束时间
    /// - 已发布的考试拒绝修改
    ///
    /// # 冲突检测 (软警告,条目仍创建)
    /// - 同日时间重叠且考场相同非空 → 考场冲突
    /// - 同日时间重叠 → 班级冲突 (同一批考生不能同时参加两场考试)
    pub fn add_entry(
        &self,
        exam: &mut Exam,
        candidate: EntryCandidate,
        actor: &str,
    ) -> EngineResult<AddEntryOutcome> {
        if exam.is_published() {
            return Err(EngineError::PublishedReadOnly {
                operation: "add_entry".to_string(),
            });
        }

        let subject = exam
            .subject(&candidate.subject_id)
            .ok_or_else(|| EngineError::unknown("Subject", &candidate.subject_id))?;
        let subject_name = subject.name.clone();

        // 每个科目至多排一场
        if exam
            .timetable
            .iter()
            .any(|e| e.subject_id == candidate.subject_id)
        {
            return Err(EngineError::SubjectAlreadyScheduled {
                subject: subject_name,
            });
        }

        if !exam.date_in_range(candidate.date) {
            return Err(EngineError::DateOutsideExam {
                date: candidate.date,
                start: exam.start_date,
                end: exam.end_date,
            });
        }

        if candidate.start_time >= candidate.end_time {
            return Err(EngineError::InvalidTimeRange {
                start: candidate.start_time,
                end: candidate.end_time,
            });
        }

        let mut new_entry = TimetableEntry::new(
            &candidate.subject_id,
            candidate.date,
            candidate.start_time,
            candidate.end_time,
            candidate.room.clone(),
        );
        new_entry.sections = candidate.sections.clone();

        let warnings = self.detect_conflicts(exam, &new_entry);
        for w in &warnings {
            warn!(
                exam_id = %exam.exam_id,
                kind = %w.kind,
                with_entry = %w.with_entry,
                "排考冲突警告"
            );
        }

        let entry_id = new_entry.entry_id.clone();
        exam.timetable.push(new_entry);
        exam.record_audit(
            AuditAction::EntryAdded,
            actor,
            format!("{} {} ({} 条警告)", subject_name, candidate.date, warnings.len()),
        );

        info!(
            exam_id = %exam.exam_id,
            entry_id = %entry_id,
            warnings = warnings.len(),
            "场次创建完成"
        );

        Ok(AddEntryOutcome { entry_id, warnings })
    }

    /// 删除考试场次
    ///
    /// 引用该场次的监考任务一并删除
    pub fn remove_entry(&self, exam: &mut Exam, entry_id: &str, actor: &str) -> EngineResult<()> {
        if exam.is_published() {
            return Err(EngineError::PublishedReadOnly {
                operation: "remove_entry".to_string(),
            });
        }

        let position = exam
            .timetable
            .iter()
            .position(|e| e.entry_id == entry_id)
            .ok_or_else(|| EngineError::unknown("TimetableEntry", entry_id))?;

        let removed = exam.timetable.remove(position);
        let duties_before = exam.duties.len();
        exam.duties.retain(|d| d.entry_id != entry_id);
        let cascaded = duties_before - exam.duties.len();

        exam.record_audit(
            AuditAction::EntryRemoved,
            actor,
            format!("{} (级联删除 {} 个监考任务)", removed.descriptor(), cascaded),
        );

        info!(
            exam_id = %exam.exam_id,
            entry_id = %entry_id,
            cascaded_duties = cascaded,
            "场次已删除"
        );

        Ok(())
    }

    /// 修改科目配置 (总分/及格线/时长)
    ///
    /// 仅限创建阶段; 进入排考阶段后总分与及格线被冻结,
    /// 成绩存在后再改会使及格判定失效,属致命配置错误
    pub fn reconfigure_subject(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        total_marks: u32,
        passing_marks: u32,
        duration_minutes: u32,
    ) -> EngineResult<()> {
        let subject_name = exam
            .subject(subject_id)
            .ok_or_else(|| EngineError::unknown("Subject", subject_id))?
            .name
            .clone();

        // 回退到创建阶段也不解冻: 成绩存在即冻结
        if exam.stage >= ExamStage::Timetable || !exam.mark_sets.is_empty() {
            return Err(EngineError::SubjectFrozen {
                subject: subject_name,
            });
        }

        if passing_marks > total_marks {
            return Err(EngineError::PassingExceedsTotal {
                passing: passing_marks,
                total: total_marks,
            });
        }

        let subject = exam
            .subjects
            .iter_mut()
            .find(|s| s.subject_id == subject_id)
            .ok_or_else(|| EngineError::unknown("Subject", subject_id))?;
        subject.total_marks = total_marks;
        subject.passing_marks = passing_marks;
        subject.duration_minutes = duration_minutes;

        Ok(())
    }

    /// 尚未排考的科目 (用于防止重复排考)
    pub fn available_subjects<'a>(&self, exam: &'a Exam) -> Vec<&'a Subject> {
        exam.subjects
            .iter()
            .filter(|s| {
                !exam
                    .timetable
                    .iter()
                    .any(|e| e.subject_id == s.subject_id)
            })
            .collect()
    }

    /// 冲突扫描: 仅比较同一考试内同日的既有场次
    ///
    /// 重叠判定: new_start < existing_end && new_end > existing_start
    fn detect_conflicts(&self, exam: &Exam, new_entry: &TimetableEntry) -> Vec<ScheduleConflict> {
        let mut conflicts = Vec::new();

        for existing in exam.timetable.iter().filter(|e| e.date == new_entry.date) {
            if !new_entry.overlaps(existing) {
                continue;
            }

            // 考场冲突: 考场相同且非空
            if let (Some(new_room), Some(old_room)) = (&new_entry.room, &existing.room) {
                if !new_room.is_empty() && new_room == old_room {
                    conflicts.push(ScheduleConflict {
                        kind: ConflictKind::RoomConflict,
                        with_entry: existing.descriptor(),
                        room: Some(new_room.clone()),
                        message: format!(
                            "考场 {} 在 {} 已被场次 [{}] 占用",
                            new_room,
                            new_entry.date,
                            existing.descriptor()
                        ),
                    });
                }
            }

            // 班级冲突: 同日时间重叠即判 (保守口径);
            // 配置收窄后仅在目标班级有交集时判定
            if !self.config.scope_class_conflict_to_shared_sections
                || new_entry.shares_sections_with(existing)
            {
                conflicts.push(ScheduleConflict {
                    kind: ConflictKind::ClassConflict,
                    with_entry: existing.descriptor(),
                    room: None,
                    message: format!(
                        "同一批考生在 {} 与场次 [{}] 时间重叠",
                        new_entry.date,
                        existing.descriptor()
                    ),
                });
            }
        }

        conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exam::Subject;
    use chrono::NaiveDate;

    fn test_exam() -> Exam {
        Exam::new(
            "期末考试",
            "G10",
            vec!["A".to_string(), "B".to_string()],
            vec![
                Subject::new("数学", 100, 35, 120),
                Subject::new("英语", 100, 35, 120),
                Subject::new("科学", 100, 35, 120),
            ],
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            "admin",
        )
    }

    fn candidate(
        exam: &Exam,
        subject_name: &str,
        date: &str,
        start: &str,
        end: &str,
        room: Option<&str>,
    ) -> EntryCandidate {
        let subject = exam.subjects.iter().find(|s| s.name == subject_name).unwrap();
        EntryCandidate {
            subject_id: subject.subject_id.clone(),
            date: date.parse().unwrap(),
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            room: room.map(|r| r.to_string()),
            sections: Vec::new(),
        }
    }

    #[test]
    fn test_no_conflict_for_adjacent_slots() {
        let scheduler = TimetableScheduler::new(EngineConfig::default());
        let mut exam = test_exam();

        let math = candidate(&exam, "数学", "2025-03-01", "09:00:00", "11:00:00", Some("Room A"));
        let outcome = scheduler.add_entry(&mut exam, math, "admin").unwrap();
        assert!(outcome.warnings.is_empty());

        let english = candidate(&exam, "英语", "2025-03-01", "11:00:00", "13:00:00", Some("Room A"));
        let outcome = scheduler.add_entry(&mut exam, english, "admin").unwrap();
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_room_and_class_conflict_on_overlap() {
        let scheduler = TimetableScheduler::new(EngineConfig::default());
        let mut exam = test_exam();

        let math = candidate(&exam, "数学", "2025-03-01", "09:00:00", "11:00:00", Some("Room A"));
        scheduler.add_entry(&mut exam, math, "admin").unwrap();
        let english = candidate(&exam, "英语", "2025-03-01", "11:00:00", "13:00:00", Some("Room A"));
        scheduler.add_entry(&mut exam, english, "admin").unwrap();

        // 科学 10:00-12:00 与数学 09:00-11:00 尾部重叠
        let science = candidate(&exam, "科学", "2025-03-01", "10:00:00", "12:00:00", Some("Room A"));
        let outcome = scheduler.add_entry(&mut exam, science, "admin").unwrap();

        let kinds: Vec<ConflictKind> = outcome.warnings.iter().map(|w| w.kind).collect();
        assert!(kinds.contains(&ConflictKind::RoomConflict));
        assert!(kinds.contains(&ConflictKind::ClassConflict));
        // 软失败策略: 条目仍然创建
        assert_eq!(exam.timetable.len(), 3);
    }

    #[test]
    fn test_duplicate_subject_rejected() {
        let scheduler = TimetableScheduler::new(EngineConfig::default());
        let mut exam = test_exam();

        let first = candidate(&exam, "数学", "2025-03-01", "09:00:00", "11:00:00", None);
        scheduler.add_entry(&mut exam, first, "admin").unwrap();

        let again = candidate(&exam, "数学", "2025-03-02", "09:00:00", "11:00:00", None);
        let err = scheduler.add_entry(&mut exam, again, "admin").unwrap_err();
        assert!(matches!(err, EngineError::SubjectAlreadyScheduled { .. }));
    }

    #[test]
    fn test_date_outside_exam_rejected() {
        let scheduler = TimetableScheduler::new(EngineConfig::default());
        let mut exam = test_exam();

        let out = candidate(&exam, "数学", "2025-04-01", "09:00:00", "11:00:00", None);
        let err = scheduler.add_entry(&mut exam, out, "admin").unwrap_err();
        assert!(matches!(err, EngineError::DateOutsideExam { .. }));
    }

    #[test]
    fn test_bad_time_range_rejected() {
        let scheduler = TimetableScheduler::new(EngineConfig::default());
        let mut exam = test_exam();

        let bad = candidate(&exam, "数学", "2025-03-01", "11:00:00", "09:00:00", None);
        let err = scheduler.add_entry(&mut exam, bad, "admin").unwrap_err();
        assert!(matches!(err, EngineError::InvalidTimeRange { .. }));
    }

    #[test]
    fn test_class_conflict_scoped_to_shared_sections() {
        let config = EngineConfig {
            scope_class_conflict_to_shared_sections: true,
            ..EngineConfig::default()
        };
        let scheduler = TimetableScheduler::new(config);
        let mut exam = test_exam();

        let mut math = candidate(&exam, "数学", "2025-03-01", "09:00:00", "11:00:00", None);
        math.sections = vec!["A".to_string()];
        scheduler.add_entry(&mut exam, math, "admin").unwrap();

        // B 班场次与 A 班场次时间重叠,但考生群体不相交
        let mut english = candidate(&exam, "英语", "2025-03-01", "10:00:00", "12:00:00", None);
        english.sections = vec!["B".to_string()];
        let outcome = scheduler.add_entry(&mut exam, english, "admin").unwrap();
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_remove_entry_cascades_duties() {
        use crate::domain::invigilation::InvigilationDuty;

        let scheduler = TimetableScheduler::new(EngineConfig::default());
        let mut exam = test_exam();

        let math = candidate(&exam, "数学", "2025-03-01", "09:00:00", "11:00:00", None);
        let outcome = scheduler.add_entry(&mut exam, math, "admin").unwrap();

        let entry = exam.entry(&outcome.entry_id).unwrap().clone();
        exam.duties
            .push(InvigilationDuty::for_entry(&entry, "T001", None));

        scheduler
            .remove_entry(&mut exam, &outcome.entry_id, "admin")
            .unwrap();
        assert!(exam.timetable.is_empty());
        assert!(exam.duties.is_empty());
    }

    #[test]
    fn test_subject_frozen_after_timetable_stage() {
        let scheduler = TimetableScheduler::new(EngineConfig::default());
        let mut exam = test_exam();
        let subject_id = exam.subjects[0].subject_id.clone();

        // 创建阶段可修改
        scheduler
            .reconfigure_subject(&mut exam, &subject_id, 150, 50, 180)
            .unwrap();
        assert_eq!(exam.subjects[0].total_marks, 150);

        // 及格线超总分被拒绝
        let err = scheduler
            .reconfigure_subject(&mut exam, &subject_id, 100, 120, 120)
            .unwrap_err();
        assert!(matches!(err, EngineError::PassingExceedsTotal { .. }));

        // 进入排考阶段后冻结
        exam.stage = ExamStage::Timetable;
        let err = scheduler
            .reconfigure_subject(&mut exam, &subject_id, 100, 35, 120)
            .unwrap_err();
        assert!(matches!(err, EngineError::SubjectFrozen { .. }));
    }

    #[test]
    fn test_available_subjects_shrinks() {
        let scheduler = TimetableScheduler::new(EngineConfig::default());
        let mut exam = test_exam();
        assert_eq!(scheduler.available_subjects(&exam).len(), 3);

        let math = candidate(&exam, "数学", "2025-03-01", "09:00:00", "11:00:00", None);
        scheduler.add_entry(&mut exam, math, "admin").unwrap();
        let remaining = scheduler.available_subjects(&exam);
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|s| s.name != "数学"));
    }
}
