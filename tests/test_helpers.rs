// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 构造测试用考试/名册数据
// ==========================================

use chrono::NaiveDate;
use exam_workflow_engine::domain::exam::{Exam, Student, Subject, Teacher, TeacherRoster};
use exam_workflow_engine::domain::timetable::EntryCandidate;

/// 创建测试用考试 (数学/英语,及格线 35)
pub fn create_test_exam() -> Exam {
    Exam::new(
        "期末考试",
        "G10",
        vec!["A".to_string(), "B".to_string()],
        vec![
            Subject::new("数学", 100, 35, 120),
            Subject::new("英语", 100, 35, 120),
        ],
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        "admin",
    )
}

/// 创建测试用教师名册
pub fn create_test_roster() -> TeacherRoster {
    TeacherRoster::new(vec![
        Teacher {
            teacher_id: "T001".to_string(),
            name: "张老师".to_string(),
        },
        Teacher {
            teacher_id: "T002".to_string(),
            name: "李老师".to_string(),
        },
        Teacher {
            teacher_id: "T003".to_string(),
            name: "王老师".to_string(),
        },
    ])
}

/// 创建测试用学生名册
pub fn create_test_students() -> Vec<Student> {
    vec![
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
        Student {
            student_id: "S3".to_string(),
            name: "学生三".to_string(),
            roll_number: "R3".to_string(),
            section: "B".to_string(),
        },
    ]
}

/// 按科目名构造场次参数
pub fn candidate_for(
    exam: &Exam,
    subject_name: &str,
    date: &str,
    start: &str,
    end: &str,
    room: Option<&str>,
) -> EntryCandidate {
    let subject = exam
        .subjects
        .iter()
        .find(|s| s.name == subject_name)
        .unwrap_or_else(|| panic!("科目 {} 不存在", subject_name));
    EntryCandidate {
        subject_id: subject.subject_id.clone(),
        date: date.parse().unwrap(),
        start_time: start.parse().unwrap(),
        end_time: end.parse().unwrap(),
        room: room.map(|r| r.to_string()),
        sections: Vec::new(),
    }
}
