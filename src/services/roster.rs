// ==========================================
// 考务管理系统 - 名册服务接口
// ==========================================
// 职责: 学生/教师目录查询接口 (不包含实现)
// 红线: 不包含目录维护、不包含业务逻辑
// ==========================================

use async_trait::async_trait;

use crate::domain::exam::{Student, Teacher, TeacherRoster};
use crate::services::ServiceError;

// ==========================================
// RosterService Trait - 学生名册
// ==========================================
// 用途: 为新建科目成绩册提供学生人口
#[async_trait]
pub trait RosterService: Send + Sync {
    /// 按年级与班级加载学生名册
    ///
    /// # 参数
    /// - grade: 年级
    /// - sections: 班级列表 (空 = 该年级全部班级)
    async fn load_students(
        &self,
        grade: &str,
        sections: &[String],
    ) -> Result<Vec<Student>, ServiceError>;
}

// ==========================================
// StaffDirectory Trait - 教师目录
// ==========================================
// 用途: 监考分配前预加载可用教师名册
#[async_trait]
pub trait StaffDirectory: Send + Sync {
    /// 加载可分配监考的教师名册
    async fn load_teachers(&self) -> Result<TeacherRoster, ServiceError>;
}

// ==========================================
// InMemoryDirectory - 内存目录 (测试/单机运行)
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    students: Vec<Student>,
    teachers: Vec<Teacher>,
}

impl InMemoryDirectory {
    pub fn new(students: Vec<Student>, teachers: Vec<Teacher>) -> Self {
        Self { students, teachers }
    }
}

#[async_trait]
impl RosterService for InMemoryDirectory {
    async fn load_students(
        &self,
        _grade: &str,
        sections: &[String],
    ) -> Result<Vec<Student>, ServiceError> {
        let students = self
            .students
            .iter()
            .filter(|s| sections.is_empty() || sections.contains(&s.section))
            .cloned()
            .collect();
        Ok(students)
    }
}

#[async_trait]
impl StaffDirectory for InMemoryDirectory {
    async fn load_teachers(&self) -> Result<TeacherRoster, ServiceError> {
        Ok(TeacherRoster::new(self.teachers.clone()))
    }
}
