// ==========================================
// 考务管理系统 - 考务流程门面
// ==========================================
// 职责: 组合引擎操作与外部落库/通知
// 顺序: 先校验并在草稿上执行引擎操作 → 外部落库成功 →
//       内存结果乐观提交到本地状态; 落库失败则本地状态不变
// 红线: 发布通知尽力而为,不阻塞、不因失败回滚发布
// ==========================================

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::domain::exam::Exam;
use crate::domain::timetable::EntryCandidate;
use crate::domain::types::{ExamStage, ModerationState, ModerationType};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::invigilation_assigner::InvigilationAssigner;
use crate::engine::marks_ledger::MarksLedger;
use crate::engine::moderation_gate::{CorrectionOutcome, ModerationGate};
use crate::engine::publishing_gate::PublishingGate;
use crate::engine::timetable_scheduler::{AddEntryOutcome, TimetableScheduler};
use crate::services::notification::NotificationService;
use crate::services::persistence::ExamPersistence;
use crate::services::roster::{RosterService, StaffDirectory};

fn persist_err(e: crate::services::ServiceError) -> EngineError {
    EngineError::Other(anyhow::anyhow!("落库失败: {e}"))
}

fn service_err(e: crate::services::ServiceError) -> EngineError {
    EngineError::Other(anyhow::anyhow!("外部服务调用失败: {e}"))
}

// ==========================================
// ExamWorkflow - 考务流程门面
// ==========================================
pub struct ExamWorkflow {
    persistence: Arc<dyn ExamPersistence>,
    notification: Arc<dyn NotificationService>,
    roster: Arc<dyn RosterService>,
    directory: Arc<dyn StaffDirectory>,
    scheduler: TimetableScheduler,
    assigner: InvigilationAssigner,
    ledger: MarksLedger,
    moderation: ModerationGate,
    gate: PublishingGate,
}

impl ExamWorkflow {
    pub fn new(
        config: EngineConfig,
        persistence: Arc<dyn ExamPersistence>,
        notification: Arc<dyn NotificationService>,
        roster: Arc<dyn RosterService>,
        directory: Arc<dyn StaffDirectory>,
    ) -> Self {
        Self {
            persistence,
            notification,
            roster,
            directory,
            scheduler: TimetableScheduler::new(config.clone()),
            assigner: InvigilationAssigner::new(),
            ledger: MarksLedger::new(),
            moderation: ModerationGate::new(config.clone()),
            gate: PublishingGate::new(config),
        }
    }

    /// 创建考试场次 (校验 → 落库 → 提交)
    pub async fn add_entry(
        &self,
        exam: &mut Exam,
        candidate: EntryCandidate,
        actor: &str,
    ) -> EngineResult<AddEntryOutcome> {
        let mut scratch = exam.clone();
        let outcome = self.scheduler.add_entry(&mut scratch, candidate, actor)?;

        let entry = scratch
            .entry(&outcome.entry_id)
            .ok_or_else(|| EngineError::unknown("TimetableEntry", &outcome.entry_id))?
            .clone();
        self.persistence
            .create_timetable_entry(&exam.exam_id, &entry)
            .await
            .map_err(persist_err)?;

        *exam = scratch;
        Ok(outcome)
    }

    /// 删除考试场次
    pub async fn remove_entry(
        &self,
        exam: &mut Exam,
        entry_id: &str,
        actor: &str,
    ) -> EngineResult<()> {
        let mut scratch = exam.clone();
        self.scheduler.remove_entry(&mut scratch, entry_id, actor)?;

        self.persistence
            .delete_timetable_entry(&exam.exam_id, entry_id)
            .await
            .map_err(persist_err)?;

        *exam = scratch;
        Ok(())
    }

    /// 分配监考任务 (教师名册从目录服务加载)
    pub async fn assign_invigilator(
        &self,
        exam: &mut Exam,
        entry_id: &str,
        teacher_id: &str,
        room: Option<String>,
    ) -> EngineResult<String> {
        let roster = self
            .directory
            .load_teachers()
            .await
            .map_err(service_err)?;

        let mut scratch = exam.clone();
        let duty_id = self
            .assigner
            .assign(&mut scratch, &roster, entry_id, teacher_id, room)?;

        let duty = scratch
            .duties
            .iter()
            .find(|d| d.duty_id == duty_id)
            .ok_or_else(|| EngineError::unknown("InvigilationDuty", &duty_id))?
            .clone();
        self.persistence
            .create_invigilation_assignment(&exam.exam_id, &duty)
            .await
            .map_err(persist_err)?;

        *exam = scratch;
        Ok(duty_id)
    }

    /// 解除监考任务
    pub async fn unassign_invigilator(
        &self,
        exam: &mut Exam,
        duty_id: &str,
        actor: &str,
    ) -> EngineResult<()> {
        let mut scratch = exam.clone();
        self.assigner.unassign(&mut scratch, duty_id, actor)?;

        self.persistence
            .delete_invigilation_assignment(&exam.exam_id, duty_id)
            .await
            .map_err(persist_err)?;

        *exam = scratch;
        Ok(())
    }

    /// 以名册服务人口创建科目成绩册 (纯本地,定稿时才落库)
    pub async fn open_subject(&self, exam: &mut Exam, subject_id: &str) -> EngineResult<()> {
        let students = self
            .roster
            .load_students(&exam.grade, &exam.sections)
            .await
            .map_err(service_err)?;
        self.ledger.open_subject(exam, subject_id, &students)
    }

    /// 录入单个学生成绩 (纯本地,定稿时才落库)
    pub fn record_marks(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        student_id: &str,
        value: Option<u32>,
    ) -> EngineResult<()> {
        self.ledger.record_marks(exam, subject_id, student_id, value)
    }

    /// 标记缺考
    pub fn mark_absent(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        student_id: &str,
    ) -> EngineResult<()> {
        self.ledger.mark_absent(exam, subject_id, student_id)
    }

    /// 成绩册定稿并落库
    pub async fn finalize_subject(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        actor: &str,
    ) -> EngineResult<()> {
        let mut scratch = exam.clone();
        self.ledger.finalize_subject(&mut scratch, subject_id, actor)?;

        let set = scratch
            .mark_set(subject_id)
            .ok_or_else(|| EngineError::unknown("SubjectMarkSet", subject_id))?
            .clone();
        self.persistence
            .save_marks(&exam.exam_id, &set)
            .await
            .map_err(persist_err)?;

        *exam = scratch;
        Ok(())
    }

    /// 提出成绩调整并落库
    pub async fn propose_correction(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        student_id: &str,
        new_value: u32,
        kind: ModerationType,
        reason: &str,
        actor: &str,
    ) -> EngineResult<CorrectionOutcome> {
        let mut scratch = exam.clone();
        let outcome = self.moderation.propose_correction(
            &mut scratch,
            subject_id,
            student_id,
            new_value,
            kind,
            reason,
            actor,
        )?;

        let mark = scratch
            .mark_set(subject_id)
            .and_then(|set| set.find_mark(student_id))
            .ok_or_else(|| EngineError::unknown("StudentMark", student_id))?
            .clone();
        self.persistence
            .moderate_marks(&exam.exam_id, subject_id, &mark)
            .await
            .map_err(persist_err)?;

        *exam = scratch;
        Ok(outcome)
    }

    /// 科目调整审批并落库
    pub async fn approve_subject(
        &self,
        exam: &mut Exam,
        subject_id: &str,
        approver: &str,
    ) -> EngineResult<ModerationState> {
        let mut scratch = exam.clone();
        let state = self
            .moderation
            .approve_subject(&mut scratch, subject_id, approver)?;

        self.persistence
            .approve_subject_moderation(&exam.exam_id, subject_id, approver)
            .await
            .map_err(persist_err)?;

        *exam = scratch;
        Ok(state)
    }

    /// 阶段前进 (纯本地状态机)
    pub fn advance(&self, exam: &mut Exam, actor: &str) -> EngineResult<ExamStage> {
        self.gate.advance(exam, actor)
    }

    /// 阶段回退
    pub fn revert(&self, exam: &mut Exam, target: ExamStage, actor: &str) -> EngineResult<ExamStage> {
        self.gate.revert(exam, target, actor)
    }

    /// 发布成绩并触发对外通知
    ///
    /// 通知后台投递,发布不等待、不因通知失败回滚
    pub async fn publish(
        &self,
        exam: &mut Exam,
        operator: &str,
        confirmed: bool,
    ) -> EngineResult<()> {
        self.gate.publish(exam, operator, confirmed)?;

        let notification = self.notification.clone();
        let snapshot = exam.clone();
        tokio::spawn(async move {
            if let Err(e) = notification.results_published(&snapshot).await {
                warn!(
                    exam_id = %snapshot.exam_id,
                    error = %e,
                    "发布通知失败,已忽略"
                );
            }
        });
        info!(exam_id = %exam.exam_id, "发布通知已投递");

        Ok(())
    }
}
