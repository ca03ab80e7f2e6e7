// ==========================================
// 考务管理系统 - 发布门禁 (顶层状态机)
// ==========================================
// 职责: 驱动考试沿阶段序列前进,强制每个阶段的完整性前提
// 阶段: 创建 → 排考 → 监考安排 → 成绩录入 → 成绩复核 → 待发布 → 已发布
// 红线: 不可跳跃; 未发布前随时可回退; 发布不可逆;
//       被阻断的前进必须带出具体缺失项
// ==========================================

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::config::EngineConfig;
use crate::domain::exam::Exam;
use crate::domain::types::{AuditAction, ExamStage, ModerationState};
use crate::engine::error::{EngineError, EngineResult, StageBlockReason, StageGuardError};
use crate::engine::events::{
    ExamEvent, ExamEventPublisher, ExamEventType, OptionalEventPublisher,
};
use crate::engine::invigilation_assigner::InvigilationAssigner;
use crate::engine::moderation_gate::ModerationGate;

// ==========================================
// PublishingGate - 发布门禁
// ==========================================
pub struct PublishingGate {
    assigner: InvigilationAssigner,
    moderation: ModerationGate,
    events: OptionalEventPublisher,
}

impl PublishingGate {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            assigner: InvigilationAssigner::new(),
            moderation: ModerationGate::new(config),
            events: OptionalEventPublisher::none(),
        }
    }

    /// 配置事件发布者 (通知/报表层适配器)
    pub fn with_publisher(mut self, publisher: Arc<dyn ExamEventPublisher>) -> Self {
        self.events = OptionalEventPublisher::with_publisher(publisher);
        self
    }

    /// 前进一个阶段
    ///
    /// # 门禁
    /// - 排考 → 监考安排: 至少存在一个场次
    /// - 监考安排 → 成绩录入: 所有场次均已安排监考 (硬门禁,无豁免)
    /// - 成绩录入 → 成绩复核: 每个科目都有已定稿成绩册
    /// - 成绩复核 → 待发布: 每个科目复核状态均为就绪
    /// - 待发布 → 已发布: 仅通过 publish (需操作员确认)
    pub fn advance(&self, exam: &mut Exam, actor: &str) -> EngineResult<ExamStage> {
        let from = exam.stage;
        let Some(to) = from.next() else {
            return Err(StageGuardError {
                from,
                to: ExamStage::Published,
                reason: StageBlockReason::AlreadyPublished,
            }
            .into());
        };

        if let Some(reason) = self.guard(exam, to) {
            return Err(StageGuardError { from, to, reason }.into());
        }

        exam.stage = to;
        exam.record_audit(
            AuditAction::StageAdvanced,
            actor,
            format!("{} → {}", from, to),
        );
        self.events.publish_best_effort(ExamEvent::new(
            &exam.exam_id,
            ExamEventType::StageChanged,
            to,
            Some("PublishingGate".to_string()),
            None,
        ));

        info!(exam_id = %exam.exam_id, from = %from, to = %to, "阶段前进");
        Ok(to)
    }

    /// 回退到更早的阶段
    ///
    /// 未发布前随时允许; 已发布后拒绝
    pub fn revert(&self, exam: &mut Exam, target: ExamStage, actor: &str) -> EngineResult<ExamStage> {
        let from = exam.stage;
        if from.is_published() {
            return Err(StageGuardError {
                from,
                to: target,
                reason: StageBlockReason::AlreadyPublished,
            }
            .into());
        }

        if target.order() >= from.order() {
            return Err(EngineError::InvalidStageTarget {
                current: from,
                target,
            });
        }

        exam.stage = target;
        exam.record_audit(
            AuditAction::StageReverted,
            actor,
            format!("{} → {}", from, target),
        );
        self.events.publish_best_effort(ExamEvent::new(
            &exam.exam_id,
            ExamEventType::StageChanged,
            target,
            Some("PublishingGate".to_string()),
            None,
        ));

        info!(exam_id = %exam.exam_id, from = %from, to = %target, "阶段回退");
        Ok(target)
    }

    /// 发布成绩 (不可逆)
    ///
    /// 复核前提重新校验 (并发编辑可能已使其失效);
    /// 需要显式操作员确认; published_at 只设置一次。
    /// 发布后场次/监考/成绩录入进入只读,复核通道仍开放
    pub fn publish(
        &self,
        exam: &mut Exam,
        operator: &str,
        confirmed: bool,
    ) -> EngineResult<DateTime<Utc>> {
        let from = exam.stage;
        if from.is_published() {
            return Err(StageGuardError {
                from,
                to: ExamStage::Published,
                reason: StageBlockReason::AlreadyPublished,
            }
            .into());
        }
        if from != ExamStage::Publishing {
            return Err(StageGuardError {
                from,
                to: ExamStage::Published,
                reason: StageBlockReason::NotInPublishingStage,
            }
            .into());
        }
        if !confirmed {
            return Err(StageGuardError {
                from,
                to: ExamStage::Published,
                reason: StageBlockReason::OperatorConfirmationMissing,
            }
            .into());
        }

        // 重新校验: 待发布期间的并发编辑可能引入了新的未审批调整
        let pending = self.pending_moderation(exam);
        if !pending.is_empty() {
            return Err(StageGuardError {
                from,
                to: ExamStage::Published,
                reason: StageBlockReason::PendingModeration(pending),
            }
            .into());
        }

        let published_at = Utc::now();
        exam.stage = ExamStage::Published;
        exam.published_at = Some(published_at);
        exam.record_audit(AuditAction::ExamPublished, operator, "成绩发布");

        // 通知/报表层尽力触发,不阻塞发布
        self.events.publish_best_effort(ExamEvent::new(
            &exam.exam_id,
            ExamEventType::ExamPublished,
            ExamStage::Published,
            Some("PublishingGate".to_string()),
            None,
        ));

        info!(exam_id = %exam.exam_id, operator = %operator, "成绩已发布");
        Ok(published_at)
    }

    /// 阶段门禁判定 (None = 放行)
    fn guard(&self, exam: &Exam, to: ExamStage) -> Option<StageBlockReason> {
        match to {
            ExamStage::Invigilation => {
                if exam.timetable.is_empty() {
                    Some(StageBlockReason::NoTimetableEntries)
                } else {
                    None
                }
            }
            ExamStage::Marks => {
                let coverage = self.assigner.coverage(exam);
                if coverage.is_complete() {
                    None
                } else {
                    Some(StageBlockReason::UncoveredSessions(
                        coverage.uncovered_entries,
                    ))
                }
            }
            ExamStage::Moderation => {
                let missing: Vec<String> = exam
                    .subjects
                    .iter()
                    .filter(|s| {
                        exam.mark_set(&s.subject_id)
                            .map(|set| !set.finalized)
                            .unwrap_or(true)
                    })
                    .map(|s| s.name.clone())
                    .collect();
                if missing.is_empty() {
                    None
                } else {
                    Some(StageBlockReason::UnfinalizedSubjects(missing))
                }
            }
            ExamStage::Publishing => {
                let pending = self.pending_moderation(exam);
                if pending.is_empty() {
                    None
                } else {
                    Some(StageBlockReason::PendingModeration(pending))
                }
            }
            ExamStage::Published => Some(StageBlockReason::OperatorConfirmationMissing),
            // 创建 → 排考 无前提
            _ => None,
        }
    }

    /// 复核状态未就绪的科目名列表 (成绩册缺失视为未就绪)
    fn pending_moderation(&self, exam: &Exam) -> Vec<String> {
        let mut pending = Vec::new();
        for subject in &exam.subjects {
            let ready = exam.mark_set(&subject.subject_id).is_some()
                && self
                    .moderation
                    .status(exam, &subject.subject_id)
                    .map(|s| s.state == ModerationState::Ready)
                    .unwrap_or(false);
            if !ready {
                pending.push(subject.name.clone());
            }
        }
        pending
    }
}
