// ==========================================
// 考务管理系统 - 成绩复核引擎
// ==========================================
// 职责: 定稿后成绩调整、幅度提醒、科目审批状态
// 红线: 调整必须带类型与理由; 幅度提醒是软信号不是硬校验;
//       零调整科目自动就绪 —— 复核工作量随实际改动伸缩,
//       不随科目数伸缩
// ==========================================

use serde::Serialize;
use tracing::info;

use crate::config::EngineConfig;
use crate::domain::exam::Exam;
use crate::domain::marks::MarkEntry;
use crate::domain::types::{AuditAction, ModerationState, ModerationType};
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// MagnitudeWarning - 调整幅度提醒 (软)
// ==========================================
// |新值 - 原始值| > 阈值 × 原始值 时产生;
// 调用方须取得人工确认后再提交
#[derive(Debug, Clone, Serialize)]
pub struct MagnitudeWarning {
    pub original: u32,         // 原始分
    pub proposed: u32,         // 拟调整分
    pub deviation_ratio: f64,  // 实际偏差比例
    pub threshold: f64,        // 配置阈值
}

// ==========================================
// CorrectionOutcome - 调整结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct CorrectionOutcome {
    pub state: ModerationState,             // 调整后科目复核状态
    pub warning: Option<MagnitudeWarning>,  // 幅度提醒 (可能为空)
}

// ==========================================
// ModerationStatus - 科目复核状态查询结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ModerationStatus {
    pub state: ModerationState,   // 当前状态
    pub correction_count: usize,  // 调整条目数
    pub reason: String,           // 状态解释
}

// ==========================================
// ModerationGate - 成绩复核引擎
// ==========================================
// 发布后仍可调整/审批 (账外审计修改,不重开发布流程)
pub struct ModerationGate {
    config: EngineConfig,
}

impl ModerationGate {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// 幅度预检 (不落盘)
    ///
    /// 供调用方在提交前向操作员展示提醒并取得确认
    pub fn preview_correction(
        &self,
        exam: &Exam,
        subject_id: &str,
        student_id: &str,
        new_value: u32,
    ) -> EngineResult<Option<MagnitudeWarning>> {
        let set = exam
            .mark_set(subject_id)
            .ok_or_else(|| EngineError::unknown("SubjectMarkSet", subject_id))?;
        let mark = set
            .find_mark(student_id)
            .ok_or_else(|| EngineError::unknown("StudentMark", student_id))?;

        let original = match &mark.entry {
            MarkEntry::Entered { value } => *value,
            MarkEntry::Corrected { original, .. } => *original,
            MarkEntry::Absent | MarkEntry::Unset => return Ok(None),
        };

        Ok(self.magnitude_warning(original, new_value))
    }

    /// 提出成绩调整
    ///
    /// # 规则
    /// - 成绩册必须已定稿
    /// - 缺考学生不可调整
    /// - 新值与原始分不同时必须给出类型与非空理由
    /// - 调整回原始分时折叠回普通条目 (不残留调整字段)
    /// - 未录入条目的补录不计为调整 (原始分从未存在)
    /// - 幅度超阈值产生软提醒,调整仍然生效
    pub fn propose_correction(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        student_id: &str,
        new_value: u32,
        kind: ModerationType,
        reason: &str,
        actor: &str,
    ) -> EngineResult<CorrectionOutcome> {
        let subject = exam
            .subject(subject_id)
            .ok_or_else(|| EngineError::unknown("Subject", subject_id))?;
        let total = subject.total_marks;
        let subject_name = subject.name.clone();

        if new_value > total {
            return Err(EngineError::MarksOutOfRange {
                value: new_value,
                total,
            });
        }

        let set = exam
            .mark_set_mut(subject_id)
            .ok_or_else(|| EngineError::unknown("SubjectMarkSet", subject_id))?;

        if !set.finalized {
            return Err(EngineError::NotFinalized {
                subject: subject_name,
            });
        }

        let mark = set
            .find_mark_mut(student_id)
            .ok_or_else(|| EngineError::unknown("StudentMark", student_id))?;

        let mut warning = None;
        match mark.entry.clone() {
            MarkEntry::Absent => {
                return Err(EngineError::AbsentNotCorrectable {
                    student_id: student_id.to_string(),
                })
            }
            // 补录: 原始分从未存在,不计为调整
            MarkEntry::Unset => {
                mark.entry = MarkEntry::Entered { value: new_value };
            }
            MarkEntry::Entered { value: original } => {
                if new_value != original {
                    if reason.trim().is_empty() {
                        return Err(EngineError::ModerationFieldsMissing {
                            student_id: student_id.to_string(),
                        });
                    }
                    warning = self.magnitude_warning(original, new_value);
                    mark.entry = MarkEntry::Corrected {
                        original,
                        current: new_value,
                        kind,
                        reason: reason.trim().to_string(),
                    };
                }
                // new_value == original: 无变化,无需记录
            }
            MarkEntry::Corrected { original, .. } => {
                if new_value == original {
                    // 回改到原始分: 折叠回普通条目
                    mark.entry = MarkEntry::Entered { value: original };
                } else {
                    if reason.trim().is_empty() {
                        return Err(EngineError::ModerationFieldsMissing {
                            student_id: student_id.to_string(),
                        });
                    }
                    warning = self.magnitude_warning(original, new_value);
                    // original 一经固化不再改变
                    mark.entry = MarkEntry::Corrected {
                        original,
                        current: new_value,
                        kind,
                        reason: reason.trim().to_string(),
                    };
                }
            }
        }

        exam.record_audit(
            AuditAction::CorrectionProposed,
            actor,
            format!("学生 {} 科目 {} 调整为 {}", student_id, subject_name, new_value),
        );

        let status = self.status(exam, subject_id)?;
        Ok(CorrectionOutcome {
            state: status.state,
            warning,
        })
    }

    /// 科目调整审批
    ///
    /// 幂等: 已审批科目重复审批为无操作,返回当前状态;
    /// 零调整科目自动就绪,审批调用被拒绝
    pub fn approve_subject(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        approver: &str,
    ) -> EngineResult<ModerationState> {
        let subject_name = exam
            .subject(subject_id)
            .ok_or_else(|| EngineError::unknown("Subject", subject_id))?
            .name
            .clone();

        let set = exam
            .mark_set_mut(subject_id)
            .ok_or_else(|| EngineError::unknown("SubjectMarkSet", subject_id))?;

        if !set.finalized {
            return Err(EngineError::NotFinalized {
                subject: subject_name,
            });
        }

        if set.is_moderated {
            // 幂等无操作: 界面/网络重试总是安全的
            return Ok(ModerationState::Ready);
        }

        if set.correction_count() == 0 {
            return Err(EngineError::NothingToApprove {
                subject: subject_name,
            });
        }

        set.is_moderated = true;
        set.approved_by = Some(approver.to_string());

        exam.record_audit(
            AuditAction::SubjectApproved,
            approver,
            format!("科目 {} 调整审批通过", subject_name),
        );

        info!(
            exam_id = %exam.exam_id,
            subject_id = %subject_id,
            approver = %approver,
            "科目调整审批通过"
        );

        Ok(ModerationState::Ready)
    }

    /// 科目复核状态 (纯派生查询)
    pub fn status(&self, exam: &Exam, subject_id: &str) -> EngineResult<ModerationStatus> {
        let set = exam
            .mark_set(subject_id)
            .ok_or_else(|| EngineError::unknown("SubjectMarkSet", subject_id))?;

        if !set.finalized {
            return Ok(ModerationStatus {
                state: ModerationState::NotStarted,
                correction_count: 0,
                reason: "成绩尚未定稿".to_string(),
            });
        }

        let count = set.correction_count();
        if count == 0 {
            return Ok(ModerationStatus {
                state: ModerationState::Ready,
                correction_count: 0,
                reason: "无调整,自动就绪".to_string(),
            });
        }

        if set.is_moderated {
            Ok(ModerationStatus {
                state: ModerationState::Ready,
                correction_count: count,
                reason: format!("{} 条调整已审批", count),
            })
        } else {
            Ok(ModerationStatus {
                state: ModerationState::PendingApproval,
                correction_count: count,
                reason: format!("{} 条调整待审批", count),
            })
        }
    }

    /// 幅度判定: |新值 - 原始值| > 阈值 × 原始值
    ///
    /// 原始分为 0 时任何非零变化都触发提醒
    fn magnitude_warning(&self, original: u32, proposed: u32) -> Option<MagnitudeWarning> {
        let delta = (proposed as f64 - original as f64).abs();
        let threshold = self.config.moderation_warning_ratio;
        if delta > threshold * original as f64 {
            let deviation_ratio = if original == 0 {
                f64::INFINITY
            } else {
                delta / original as f64
            };
            Some(MagnitudeWarning {
                original,
                proposed,
                deviation_ratio,
                threshold,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exam::{Student, Subject};
    use crate::engine::marks_ledger::MarksLedger;
    use chrono::NaiveDate;

    fn finalized_exam() -> (Exam, String) {
        let mut exam = Exam::new(
            "期末考试",
            "G10",
            vec!["A".to_string()],
            vec![Subject::new("数学", 100, 35, 120)],
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
            "admin",
        );
        let subject_id = exam.subjects[0].subject_id.clone();
        let ledger = MarksLedger::new();

        let students = vec![
            Student {
                student_id: "S1".to_string(),
                name: "学生一".to_string(),
                roll_number: "R1".to_string(),
                section: "A".to_string(),
            },
            Student {
                student_id: "S2".to_string(),
                name: "学生二".to_string(),
                roll_number: "R2".to_string(),
                section: "A".to_string(),
            },
        ];
        ledger.open_subject(&mut exam, &subject_id, &students).unwrap();
        ledger.record_marks(&mut exam, &subject_id, "S1", Some(40)).unwrap();
        ledger.mark_absent(&mut exam, &subject_id, "S2").unwrap();
        ledger.finalize_subject(&mut exam, &subject_id, "teacher-1").unwrap();
        (exam, subject_id)
    }

    fn gate() -> ModerationGate {
        ModerationGate::new(EngineConfig::default())
    }

    #[test]
    fn test_magnitude_warning_over_ten_percent() {
        let gate = gate();
        let (mut exam, subject_id) = finalized_exam();

        // 40 → 46: 15% 增幅,触发提醒
        let outcome = gate
            .propose_correction(
                &mut exam,
                &subject_id,
                "S1",
                46,
                ModerationType::Reevaluation,
                "复评提分",
                "moderator-1",
            )
            .unwrap();
        assert!(outcome.warning.is_some());
        assert_eq!(outcome.state, ModerationState::PendingApproval);
    }

    #[test]
    fn test_small_change_no_warning_but_needs_approval() {
        let gate = gate();
        let (mut exam, subject_id) = finalized_exam();

        // 40 → 42: 5%,不提醒,但仍需审批
        let outcome = gate
            .propose_correction(
                &mut exam,
                &subject_id,
                "S1",
                42,
                ModerationType::Reevaluation,
                "复评提分",
                "moderator-1",
            )
            .unwrap();
        assert!(outcome.warning.is_none());
        assert_eq!(outcome.state, ModerationState::PendingApproval);

        let state = gate
            .approve_subject(&mut exam, &subject_id, "hod-1")
            .unwrap();
        assert_eq!(state, ModerationState::Ready);
    }

    #[test]
    fn test_zero_corrections_auto_ready() {
        let gate = gate();
        let (exam, subject_id) = finalized_exam();

        let status = gate.status(&exam, &subject_id).unwrap();
        assert_eq!(status.state, ModerationState::Ready);
        assert_eq!(status.correction_count, 0);
    }

    #[test]
    fn test_approve_without_corrections_rejected() {
        let gate = gate();
        let (mut exam, subject_id) = finalized_exam();

        let err = gate
            .approve_subject(&mut exam, &subject_id, "hod-1")
            .unwrap_err();
        assert!(matches!(err, EngineError::NothingToApprove { .. }));
    }

    #[test]
    fn test_approve_idempotent() {
        let gate = gate();
        let (mut exam, subject_id) = finalized_exam();

        gate.propose_correction(
            &mut exam,
            &subject_id,
            "S1",
            42,
            ModerationType::EntryError,
            "录入笔误",
            "moderator-1",
        )
        .unwrap();
        gate.approve_subject(&mut exam, &subject_id, "hod-1").unwrap();

        // 重复审批为无操作
        let state = gate
            .approve_subject(&mut exam, &subject_id, "hod-2")
            .unwrap();
        assert_eq!(state, ModerationState::Ready);
        assert_eq!(
            exam.mark_set(&subject_id).unwrap().approved_by.as_deref(),
            Some("hod-1")
        );
    }

    #[test]
    fn test_missing_reason_rejected() {
        let gate = gate();
        let (mut exam, subject_id) = finalized_exam();

        let err = gate
            .propose_correction(
                &mut exam,
                &subject_id,
                "S1",
                42,
                ModerationType::EntryError,
                "  ",
                "moderator-1",
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::ModerationFieldsMissing { .. }));
    }

    #[test]
    fn test_absent_student_not_correctable() {
        let gate = gate();
        let (mut exam, subject_id) = finalized_exam();

        let err = gate
            .propose_correction(
                &mut exam,
                &subject_id,
                "S2",
                50,
                ModerationType::EntryError,
                "理由",
                "moderator-1",
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::AbsentNotCorrectable { .. }));
    }

    #[test]
    fn test_revert_to_original_collapses_correction() {
        let gate = gate();
        let (mut exam, subject_id) = finalized_exam();

        gate.propose_correction(
            &mut exam,
            &subject_id,
            "S1",
            42,
            ModerationType::EntryError,
            "录入笔误",
            "moderator-1",
        )
        .unwrap();
        assert_eq!(gate.status(&exam, &subject_id).unwrap().correction_count, 1);

        // 改回原始分: 调整记录消失,科目回到自动就绪
        gate.propose_correction(
            &mut exam,
            &subject_id,
            "S1",
            40,
            ModerationType::EntryError,
            "撤销",
            "moderator-1",
        )
        .unwrap();
        let status = gate.status(&exam, &subject_id).unwrap();
        assert_eq!(status.correction_count, 0);
        assert_eq!(status.state, ModerationState::Ready);
    }

    #[test]
    fn test_original_fixed_across_repeated_corrections() {
        let gate = gate();
        let (mut exam, subject_id) = finalized_exam();

        gate.propose_correction(
            &mut exam, &subject_id, "S1", 42,
            ModerationType::EntryError, "第一次", "moderator-1",
        )
        .unwrap();
        gate.propose_correction(
            &mut exam, &subject_id, "S1", 45,
            ModerationType::Reevaluation, "第二次", "moderator-1",
        )
        .unwrap();

        let entry = exam
            .mark_set(&subject_id)
            .unwrap()
            .find_mark("S1")
            .unwrap()
            .entry
            .clone();
        match entry {
            MarkEntry::Corrected { original, current, .. } => {
                assert_eq!(original, 40);
                assert_eq!(current, 45);
            }
            other => panic!("期望调整条目,实际 {:?}", other),
        }
    }

    #[test]
    fn test_preview_matches_propose() {
        let gate = gate();
        let (exam, subject_id) = finalized_exam();

        assert!(gate
            .preview_correction(&exam, &subject_id, "S1", 46)
            .unwrap()
            .is_some());
        assert!(gate
            .preview_correction(&exam, &subject_id, "S1", 42)
            .unwrap()
            .is_none());
    }
}
