// ==========================================
// 考务管理系统 - 持久化服务接口
// ==========================================
// 职责: 引擎操作的落库对应方 (不包含实现)
// 说明: 每个接口镜像一个引擎操作; 外部调用成功后,
//       引擎的内存结果才乐观地应用到本地状态
// ==========================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::invigilation::InvigilationDuty;
use crate::domain::marks::{StudentMark, SubjectMarkSet};
use crate::domain::timetable::TimetableEntry;
use crate::services::ServiceError;

// ==========================================
// ExamPersistence Trait
// ==========================================
#[async_trait]
pub trait ExamPersistence: Send + Sync {
    /// 落库: 创建考试场次
    async fn create_timetable_entry(
        &self,
        exam_id: &str,
        entry: &TimetableEntry,
    ) -> Result<(), ServiceError>;

    /// 落库: 删除考试场次
    async fn delete_timetable_entry(
        &self,
        exam_id: &str,
        entry_id: &str,
    ) -> Result<(), ServiceError>;

    /// 落库: 创建监考任务
    async fn create_invigilation_assignment(
        &self,
        exam_id: &str,
        duty: &InvigilationDuty,
    ) -> Result<(), ServiceError>;

    /// 落库: 删除监考任务
    async fn delete_invigilation_assignment(
        &self,
        exam_id: &str,
        duty_id: &str,
    ) -> Result<(), ServiceError>;

    /// 落库: 保存定稿成绩册
    async fn save_marks(
        &self,
        exam_id: &str,
        set: &SubjectMarkSet,
    ) -> Result<(), ServiceError>;

    /// 落库: 保存单条成绩调整
    async fn moderate_marks(
        &self,
        exam_id: &str,
        subject_id: &str,
        mark: &StudentMark,
    ) -> Result<(), ServiceError>;

    /// 落库: 科目调整审批
    async fn approve_subject_moderation(
        &self,
        exam_id: &str,
        subject_id: &str,
        approver: &str,
    ) -> Result<(), ServiceError>;
}

// ==========================================
// InMemoryExamStore - 内存持久化 (测试/单机运行)
// ==========================================
// 以操作流水记录每次落库调用,测试据此断言写入顺序
#[derive(Debug, Default)]
pub struct InMemoryExamStore {
    journal: Mutex<Vec<String>>,
    entries: Mutex<HashMap<String, Vec<TimetableEntry>>>,
}

impl InMemoryExamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 落库操作流水
    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().expect("journal 锁中毒").clone()
    }

    fn log(&self, line: String) {
        self.journal.lock().expect("journal 锁中毒").push(line);
    }
}

#[async_trait]
impl ExamPersistence for InMemoryExamStore {
    async fn create_timetable_entry(
        &self,
        exam_id: &str,
        entry: &TimetableEntry,
    ) -> Result<(), ServiceError> {
        self.entries
            .lock()
            .expect("entries 锁中毒")
            .entry(exam_id.to_string())
            .or_default()
            .push(entry.clone());
        self.log(format!("create_timetable_entry {} {}", exam_id, entry.entry_id));
        Ok(())
    }

    async fn delete_timetable_entry(
        &self,
        exam_id: &str,
        entry_id: &str,
    ) -> Result<(), ServiceError> {
        if let Some(list) = self
            .entries
            .lock()
            .expect("entries 锁中毒")
            .get_mut(exam_id)
        {
            list.retain(|e| e.entry_id != entry_id);
        }
        self.log(format!("delete_timetable_entry {} {}", exam_id, entry_id));
        Ok(())
    }

    async fn create_invigilation_assignment(
        &self,
        exam_id: &str,
        duty: &InvigilationDuty,
    ) -> Result<(), ServiceError> {
        self.log(format!(
            "create_invigilation_assignment {} {}",
            exam_id, duty.duty_id
        ));
        Ok(())
    }

    async fn delete_invigilation_assignment(
        &self,
        exam_id: &str,
        duty_id: &str,
    ) -> Result<(), ServiceError> {
        self.log(format!("delete_invigilation_assignment {} {}", exam_id, duty_id));
        Ok(())
    }

    async fn save_marks(
        &self,
        exam_id: &str,
        set: &SubjectMarkSet,
    ) -> Result<(), ServiceError> {
        self.log(format!("save_marks {} {}", exam_id, set.subject_id));
        Ok(())
    }

    async fn moderate_marks(
        &self,
        exam_id: &str,
        subject_id: &str,
        mark: &StudentMark,
    ) -> Result<(), ServiceError> {
        self.log(format!(
            "moderate_marks {} {} {}",
            exam_id, subject_id, mark.student_id
        ));
        Ok(())
    }

    async fn approve_subject_moderation(
        &self,
        exam_id: &str,
        subject_id: &str,
        approver: &str,
    ) -> Result<(), ServiceError> {
        self.log(format!(
            "approve_subject_moderation {} {} {}",
            exam_id, subject_id, approver
        ));
        Ok(())
    }
}
