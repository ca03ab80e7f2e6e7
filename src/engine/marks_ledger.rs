// ==========================================
// 考务管理系统 - 成绩录入引擎
// ==========================================
// 职责: 按科目维护学生成绩,校验录入值,定稿成绩册
// 红线: 缺考与得分互斥; 定稿后修改只能走复核通道;
//       批量合并逐行容错,跳过并报告,绝不整批中止
// ==========================================

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::exam::{Exam, Student};
use crate::domain::marks::{BulkMarkRow, MarkEntry, StudentMark, SubjectMarkSet};
use crate::domain::types::AuditAction;
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// BulkMergeReport - 批量合并报告
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct BulkMergeReport {
    pub applied: usize,        // 合并成功行数
    pub skipped: Vec<String>,  // 跳过原因列表 (软警告)
}

// ==========================================
// MarksLedger - 成绩录入引擎
// ==========================================
pub struct MarksLedger;

impl MarksLedger {
    pub fn new() -> Self {
        Self
    }

    /// 以名册初始化科目成绩册
    ///
    /// 名册人口由外部名册服务提供; 成绩册已存在时拒绝
    pub fn open_subject(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        students: &[Student],
    ) -> EngineResult<()> {
        if exam.is_published() {
            return Err(EngineError::PublishedReadOnly {
                operation: "open_subject".to_string(),
            });
        }

        let subject = exam
            .subject(subject_id)
            .ok_or_else(|| EngineError::unknown("Subject", subject_id))?;
        let subject_name = subject.name.clone();

        if exam.mark_set(subject_id).is_some() {
            return Err(EngineError::MarkSetAlreadyOpen {
                subject: subject_name,
            });
        }

        let marks: Vec<StudentMark> = students
            .iter()
            .map(|s| StudentMark::unset(&s.student_id, &s.roll_number, &s.name, &s.section))
            .collect();

        info!(
            exam_id = %exam.exam_id,
            subject_id = %subject_id,
            students = marks.len(),
            "成绩册已创建"
        );

        exam.mark_sets.push(SubjectMarkSet::open(subject_id, marks));
        Ok(())
    }

    /// 录入单个学生成绩
    ///
    /// value 为 None 表示清空为未录入;
    /// 数值必须在 [0, 科目总分] 内; 缺考学生拒绝录入 (先取消缺考)
    pub fn record_marks(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        student_id: &str,
        value: Option<u32>,
    ) -> EngineResult<()> {
        if exam.is_published() {
            return Err(EngineError::PublishedReadOnly {
                operation: "record_marks".to_string(),
            });
        }

        let subject = exam
            .subject(subject_id)
            .ok_or_else(|| EngineError::unknown("Subject", subject_id))?;
        let total = subject.total_marks;
        let subject_name = subject.name.clone();

        let set = exam
            .mark_set_mut(subject_id)
            .ok_or_else(|| EngineError::unknown("SubjectMarkSet", subject_id))?;

        if set.finalized {
            return Err(EngineError::AlreadyFinalized {
                subject: subject_name,
            });
        }

        if let Some(v) = value {
            if v > total {
                return Err(EngineError::MarksOutOfRange { value: v, total });
            }
        }

        let mark = set
            .find_mark_mut(student_id)
            .ok_or_else(|| EngineError::unknown("StudentMark", student_id))?;

        match (value, mark.entry.is_absent()) {
            (Some(_), true) => {
                return Err(EngineError::AbsentMarksConflict {
                    student_id: student_id.to_string(),
                })
            }
            (Some(v), false) => mark.entry = MarkEntry::Entered { value: v },
            (None, _) => mark.entry = MarkEntry::Unset,
        }

        Ok(())
    }

    /// 标记缺考 (同时清空已录得分)
    pub fn mark_absent(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        student_id: &str,
    ) -> EngineResult<()> {
        self.set_absence(exam, subject_id, student_id, true)
    }

    /// 取消缺考 (恢复为未录入)
    pub fn clear_absent(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        student_id: &str,
    ) -> EngineResult<()> {
        self.set_absence(exam, subject_id, student_id, false)
    }

    fn set_absence(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        student_id: &str,
        absent: bool,
    ) -> EngineResult<()> {
        if exam.is_published() {
            return Err(EngineError::PublishedReadOnly {
                operation: "set_absence".to_string(),
            });
        }

        let subject_name = exam
            .subject(subject_id)
            .ok_or_else(|| EngineError::unknown("Subject", subject_id))?
            .name
            .clone();

        let set = exam
            .mark_set_mut(subject_id)
            .ok_or_else(|| EngineError::unknown("SubjectMarkSet", subject_id))?;

        if set.finalized {
            return Err(EngineError::AlreadyFinalized {
                subject: subject_name,
            });
        }

        let mark = set
            .find_mark_mut(student_id)
            .ok_or_else(|| EngineError::unknown("StudentMark", student_id))?;

        mark.entry = if absent {
            MarkEntry::Absent
        } else {
            MarkEntry::Unset
        };
        Ok(())
    }

    /// 批量合并 (模板上传路径)
    ///
    /// 按学号合并; 未匹配学号、超范围数值逐行跳过并报告,
    /// 绝不中止整批。缺考标志优先于得分。
    pub fn bulk_merge(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        rows: &[BulkMarkRow],
    ) -> EngineResult<BulkMergeReport> {
        if exam.is_published() {
            return Err(EngineError::PublishedReadOnly {
                operation: "bulk_merge".to_string(),
            });
        }

        let subject = exam
            .subject(subject_id)
            .ok_or_else(|| EngineError::unknown("Subject", subject_id))?;
        let total = subject.total_marks;
        let subject_name = subject.name.clone();

        let set = exam
            .mark_set_mut(subject_id)
            .ok_or_else(|| EngineError::unknown("SubjectMarkSet", subject_id))?;

        if set.finalized {
            return Err(EngineError::AlreadyFinalized {
                subject: subject_name,
            });
        }

        let mut applied = 0;
        let mut skipped = Vec::new();

        for row in rows {
            let Some(mark) = set.find_by_roll_mut(&row.roll_number) else {
                skipped.push(format!("学号 {} 不在名册中", row.roll_number));
                continue;
            };

            if row.absent {
                mark.entry = MarkEntry::Absent;
                applied += 1;
                continue;
            }

            match row.marks {
                Some(v) if v > total => {
                    skipped.push(format!(
                        "学号 {} 得分 {} 超出范围 [0, {}]",
                        row.roll_number, v, total
                    ));
                }
                Some(v) => {
                    mark.entry = MarkEntry::Entered { value: v };
                    applied += 1;
                }
                None => {
                    mark.entry = MarkEntry::Unset;
                    applied += 1;
                }
            }
        }

        if !skipped.is_empty() {
            warn!(
                exam_id = %exam.exam_id,
                subject_id = %subject_id,
                skipped = skipped.len(),
                "批量合并存在跳过行"
            );
        }

        Ok(BulkMergeReport { applied, skipped })
    }

    /// 成绩册定稿
    ///
    /// 定稿固化原始分 (首次保存即锚定,重复保存不再重推),
    /// 此后修改只能经复核通道; 重复定稿被拒绝
    pub fn finalize_subject(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        actor: &str,
    ) -> EngineResult<()> {
        if exam.is_published() {
            return Err(EngineError::PublishedReadOnly {
                operation: "finalize_subject".to_string(),
            });
        }

        let subject_name = exam
            .subject(subject_id)
            .ok_or_else(|| EngineError::unknown("Subject", subject_id))?
            .name
            .clone();

        let set = exam
            .mark_set_mut(subject_id)
            .ok_or_else(|| EngineError::unknown("SubjectMarkSet", subject_id))?;

        if set.finalized {
            return Err(EngineError::AlreadyFinalized {
                subject: subject_name,
            });
        }

        set.finalized = true;
        set.finalized_at = Some(Utc::now());

        exam.record_audit(
            AuditAction::MarksFinalized,
            actor,
            format!("科目 {} 成绩定稿", subject_name),
        );

        info!(
            exam_id = %exam.exam_id,
            subject_id = %subject_id,
            "成绩册已定稿"
        );

        Ok(())
    }
}

impl Default for MarksLedger {
    fn default() -> Self {
        Self::new()
    }
}
