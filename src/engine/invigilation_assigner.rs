// ==========================================
// 考务管理系统 - 监考分配引擎
// ==========================================
// 职责: 为考试场次分配监考教师,检测教师冲突,计算覆盖情况
// 红线: 教师冲突是硬失败 (一名教师无法同时监考两个考场),
//       与排考引擎的软警告策略不同
// ==========================================

use tracing::info;

use crate::domain::exam::{Exam, TeacherRoster};
use crate::domain::invigilation::{CoverageReport, InvigilationDuty};
use crate::domain::types::AuditAction;
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// InvigilationAssigner - 监考分配引擎
// ==========================================
pub struct InvigilationAssigner;

impl InvigilationAssigner {
    pub fn new() -> Self {
        Self
    }

    /// 分配监考任务
    ///
    /// # 硬失败
    /// - 场次或教师不在册 → 未知实体
    /// - 同一教师重复分配到同一场次 → 重复任务
    /// - 同一教师同日已有时间重叠的其他场次任务 → 教师冲突
    ///
    /// 同一场次允许多名教师 (联合监考)
    pub fn assign(
        &self,
        exam: &mut Exam,
        roster: &TeacherRoster,
        entry_id: &str,
        teacher_id: &str,
        room: Option<String>,
    ) -> EngineResult<String> {
        if exam.is_published() {
            return Err(EngineError::PublishedReadOnly {
                operation: "assign".to_string(),
            });
        }

        let entry = exam
            .entry(entry_id)
            .ok_or_else(|| EngineError::unknown("TimetableEntry", entry_id))?
            .clone();

        if !roster.contains(teacher_id) {
            return Err(EngineError::unknown("Teacher", teacher_id));
        }

        // 重复任务: 同一教师已在该场次
        if exam
            .duties
            .iter()
            .any(|d| d.entry_id == entry_id && d.teacher_id == teacher_id)
        {
            return Err(EngineError::DutyAlreadyAssigned {
                teacher_id: teacher_id.to_string(),
                entry_id: entry_id.to_string(),
            });
        }

        // 教师冲突: 同日时间重叠的其他场次任务
        let candidate = InvigilationDuty::for_entry(&entry, teacher_id, room);
        if let Some(existing) = exam.duties.iter().find(|d| {
            d.teacher_id == teacher_id && d.entry_id != entry_id && d.overlaps(&candidate)
        }) {
            return Err(EngineError::TeacherDoubleBooked {
                teacher_id: teacher_id.to_string(),
                date: entry.date,
                existing: format!(
                    "{} {}-{}",
                    existing.entry_id, existing.start_time, existing.end_time
                ),
            });
        }

        let duty_id = candidate.duty_id.clone();
        exam.duties.push(candidate);
        exam.record_audit(
            AuditAction::DutyAssigned,
            teacher_id,
            format!("场次 {} ({})", entry.descriptor(), teacher_id),
        );

        info!(
            exam_id = %exam.exam_id,
            entry_id = %entry_id,
            teacher_id = %teacher_id,
            "监考任务分配完成"
        );

        Ok(duty_id)
    }

    /// 解除监考任务
    pub fn unassign(&self, exam: &mut Exam, duty_id: &str, actor: &str) -> EngineResult<()> {
        if exam.is_published() {
            return Err(EngineError::PublishedReadOnly {
                operation: "unassign".to_string(),
            });
        }

        let position = exam
            .duties
            .iter()
            .position(|d| d.duty_id == duty_id)
            .ok_or_else(|| EngineError::unknown("InvigilationDuty", duty_id))?;

        let removed = exam.duties.remove(position);
        exam.record_audit(
            AuditAction::DutyReleased,
            actor,
            format!("教师 {} 场次 {}", removed.teacher_id, removed.entry_id),
        );

        Ok(())
    }

    /// 监考覆盖情况
    ///
    /// 覆盖定义: 场次至少有一个监考任务引用它。
    /// 全覆盖是进入成绩录入阶段的硬门禁。
    pub fn coverage(&self, exam: &Exam) -> CoverageReport {
        let mut uncovered = Vec::new();
        for entry in &exam.timetable {
            let covered = exam.duties.iter().any(|d| d.entry_id == entry.entry_id);
            if !covered {
                uncovered.push(entry.descriptor());
            }
        }

        CoverageReport {
            covered_count: exam.timetable.len() - uncovered.len(),
            total: exam.timetable.len(),
            uncovered_entries: uncovered,
        }
    }
}

impl Default for InvigilationAssigner {
    fn default() -> Self {
        Self::new()
    }
}
