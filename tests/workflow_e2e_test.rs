// ==========================================
// 考务全流程端到端测试
// ==========================================
// 场景: 创建 → 排考 → 监考 → 录入 → 复核 → 发布 → 统计
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use std::sync::Arc;

use exam_workflow_engine::config::EngineConfig;
use exam_workflow_engine::domain::exam::Exam;
use exam_workflow_engine::domain::types::{ExamStage, ModerationType};
use exam_workflow_engine::engine::results_aggregator::ResultsAggregator;
use exam_workflow_engine::services::notification::NoOpNotificationService;
use exam_workflow_engine::services::persistence::InMemoryExamStore;
use exam_workflow_engine::services::roster::InMemoryDirectory;
use exam_workflow_engine::services::workflow::ExamWorkflow;
use test_helpers::{candidate_for, create_test_exam, create_test_roster, create_test_students};

fn build_workflow() -> (ExamWorkflow, Arc<InMemoryExamStore>) {
    let store = Arc::new(InMemoryExamStore::new());
    let directory = Arc::new(InMemoryDirectory::new(
        create_test_students(),
        create_test_roster().teachers,
    ));
    let workflow = ExamWorkflow::new(
        EngineConfig::default(),
        store.clone(),
        Arc::new(NoOpNotificationService),
        directory.clone(),
        directory,
    );
    (workflow, store)
}

/// 走完排考与监考,停在成绩录入阶段
async fn drive_to_marks(workflow: &ExamWorkflow, exam: &mut Exam) {
    workflow.advance(exam, "admin").unwrap(); // → 排考

    let math = candidate_for(exam, "数学", "2025-03-01", "09:00:00", "11:00:00", Some("Room A"));
    let math_entry = workflow.add_entry(exam, math, "admin").await.unwrap().entry_id;
    let english = candidate_for(exam, "英语", "2025-03-01", "11:00:00", "13:00:00", Some("Room A"));
    let english_entry = workflow
        .add_entry(exam, english, "admin")
        .await
        .unwrap()
        .entry_id;

    workflow.advance(exam, "admin").unwrap(); // → 监考安排
    workflow
        .assign_invigilator(exam, &math_entry, "T001", Some("Room A".to_string()))
        .await
        .unwrap();
    workflow
        .assign_invigilator(exam, &english_entry, "T002", Some("Room A".to_string()))
        .await
        .unwrap();
    workflow.advance(exam, "admin").unwrap(); // → 成绩录入
}

/// 录入并定稿全部科目 (S1=80/60, S2=30/55, S3 数学缺考/英语90)
async fn enter_and_finalize_all(workflow: &ExamWorkflow, exam: &mut Exam) {
    let subject_ids: Vec<String> = exam.subjects.iter().map(|s| s.subject_id.clone()).collect();

    workflow.open_subject(exam, &subject_ids[0]).await.unwrap();
    workflow.record_marks(exam, &subject_ids[0], "S1", Some(80)).unwrap();
    workflow.record_marks(exam, &subject_ids[0], "S2", Some(30)).unwrap();
    workflow.mark_absent(exam, &subject_ids[0], "S3").unwrap();
    workflow
        .finalize_subject(exam, &subject_ids[0], "teacher-1")
        .await
        .unwrap();

    workflow.open_subject(exam, &subject_ids[1]).await.unwrap();
    workflow.record_marks(exam, &subject_ids[1], "S1", Some(60)).unwrap();
    workflow.record_marks(exam, &subject_ids[1], "S2", Some(55)).unwrap();
    workflow.record_marks(exam, &subject_ids[1], "S3", Some(90)).unwrap();
    workflow
        .finalize_subject(exam, &subject_ids[1], "teacher-2")
        .await
        .unwrap();
}

// ==========================================
// 测试1: 完整生命周期直至统计
// ==========================================
#[tokio::test]
async fn test_full_lifecycle_to_statistics() {
    let (workflow, store) = build_workflow();
    let mut exam = create_test_exam();

    drive_to_marks(&workflow, &mut exam).await;
    enter_and_finalize_all(&workflow, &mut exam).await;

    workflow.advance(&mut exam, "admin").unwrap(); // → 成绩复核
    workflow.advance(&mut exam, "admin").unwrap(); // → 待发布
    workflow.publish(&mut exam, "principal", true).await.unwrap();

    assert_eq!(exam.stage, ExamStage::Published);
    assert!(exam.published_at.is_some());

    // 发布后统计可用
    let stats = ResultsAggregator::new(EngineConfig::default())
        .compute(&exam)
        .unwrap();
    assert_eq!(stats.subjects.len(), 2);
    let math = &stats.subjects[0];
    assert_eq!(math.appeared, 2);
    assert_eq!(math.absent, 1);
    assert_eq!(math.passed, 1);

    // 落库流水: 2 场次 + 2 监考 + 2 成绩册
    let journal = store.journal();
    assert_eq!(
        journal
            .iter()
            .filter(|l| l.starts_with("create_timetable_entry"))
            .count(),
        2
    );
    assert_eq!(
        journal
            .iter()
            .filter(|l| l.starts_with("create_invigilation_assignment"))
            .count(),
        2
    );
    assert_eq!(journal.iter().filter(|l| l.starts_with("save_marks")).count(), 2);

    // 审计日志覆盖各阶段操作
    assert!(exam
        .audit_trail
        .iter()
        .any(|a| a.action == exam_workflow_engine::domain::types::AuditAction::ExamPublished));
}

// ==========================================
// 测试2: 监考覆盖门禁 - 当且仅当全覆盖才放行
// ==========================================
#[tokio::test]
async fn test_coverage_gate_iff_all_entries_covered() {
    use exam_workflow_engine::engine::error::{EngineError, StageBlockReason};

    let (workflow, _store) = build_workflow();
    let mut exam = create_test_exam();

    workflow.advance(&mut exam, "admin").unwrap();
    let math = candidate_for(&exam, "数学", "2025-03-01", "09:00:00", "11:00:00", None);
    let math_entry = workflow.add_entry(&mut exam, math, "admin").await.unwrap().entry_id;
    let english = candidate_for(&exam, "英语", "2025-03-02", "09:00:00", "11:00:00", None);
    let english_entry = workflow
        .add_entry(&mut exam, english, "admin")
        .await
        .unwrap()
        .entry_id;
    workflow.advance(&mut exam, "admin").unwrap(); // → 监考安排

    // 仅覆盖一场: 阻断
    workflow
        .assign_invigilator(&mut exam, &math_entry, "T001", None)
        .await
        .unwrap();
    let err = workflow.advance(&mut exam, "admin").unwrap_err();
    match err {
        EngineError::StageGuard(g) => match g.reason {
            StageBlockReason::UncoveredSessions(list) => assert_eq!(list.len(), 1),
            other => panic!("期望未覆盖场次,实际 {:?}", other),
        },
        other => panic!("期望阶段门禁错误,实际 {:?}", other),
    }

    // 覆盖第二场: 放行
    workflow
        .assign_invigilator(&mut exam, &english_entry, "T002", None)
        .await
        .unwrap();
    assert_eq!(
        workflow.advance(&mut exam, "admin").unwrap(),
        ExamStage::Marks
    );
}

// ==========================================
// 测试3: 发布后复核通道保持开放且落库
// ==========================================
#[tokio::test]
async fn test_post_publish_correction_is_out_of_band() {
    let (workflow, store) = build_workflow();
    let mut exam = create_test_exam();

    drive_to_marks(&workflow, &mut exam).await;
    enter_and_finalize_all(&workflow, &mut exam).await;
    workflow.advance(&mut exam, "admin").unwrap();
    workflow.advance(&mut exam, "admin").unwrap();
    workflow.publish(&mut exam, "principal", true).await.unwrap();

    let math = exam.subjects[0].subject_id.clone();

    // 发布后更正 + 审批,考试保持已发布
    workflow
        .propose_correction(
            &mut exam,
            &math,
            "S1",
            82,
            ModerationType::EntryError,
            "发布后发现录入笔误",
            "moderator-1",
        )
        .await
        .unwrap();
    workflow
        .approve_subject(&mut exam, &math, "hod-1")
        .await
        .unwrap();

    assert_eq!(exam.stage, ExamStage::Published);
    let journal = store.journal();
    assert!(journal.iter().any(|l| l.starts_with("moderate_marks")));
    assert!(journal
        .iter()
        .any(|l| l.starts_with("approve_subject_moderation")));

    // 发布后场次删除仍被拒绝
    let entry_id = exam.timetable[0].entry_id.clone();
    assert!(workflow
        .remove_entry(&mut exam, &entry_id, "admin")
        .await
        .is_err());
}

// ==========================================
// 测试4: 回退重编辑后再次走完流程
// ==========================================
#[tokio::test]
async fn test_revert_reedit_and_republish_flow() {
    let (workflow, _store) = build_workflow();
    let mut exam = create_test_exam();

    drive_to_marks(&workflow, &mut exam).await;

    // 回退到排考补一场并删除
    workflow
        .revert(&mut exam, ExamStage::Timetable, "admin")
        .unwrap();
    assert_eq!(exam.stage, ExamStage::Timetable);
    let entry_id = exam.timetable[0].entry_id.clone();
    workflow
        .remove_entry(&mut exam, &entry_id, "admin")
        .await
        .unwrap();

    // 场次缺了监考覆盖自动恢复不变式: 重新前进需重新满足门禁
    workflow.advance(&mut exam, "admin").unwrap(); // → 监考安排 (还剩一场已覆盖)
    assert_eq!(
        workflow.advance(&mut exam, "admin").unwrap(),
        ExamStage::Marks
    );
}
