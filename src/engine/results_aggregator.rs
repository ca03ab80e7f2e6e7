// ==========================================
// 考务管理系统 - 成绩统计引擎
// ==========================================
// 职责: 基于成绩册与复核状态的只读派生统计
// 红线: 纯视图,不落盘,不修改任何状态; 仅对已发布考试开放
// ==========================================

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::domain::exam::{Exam, Subject};
use crate::domain::marks::SubjectMarkSet;
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// SubjectStatistics - 科目统计
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct SubjectStatistics {
    pub subject_id: String,
    pub subject_name: String,
    pub total_marks: u32,
    pub passing_marks: u32,
    pub appeared: usize,            // 实考人数
    pub absent: usize,              // 缺考人数
    pub unset: usize,               // 未录入人数
    pub passed: usize,              // 及格人数
    pub failed: usize,              // 不及格人数
    pub pass_rate: f64,             // 及格率
    pub average: Option<f64>,       // 实考平均分
    pub highest: Option<u32>,       // 最高分
    pub lowest: Option<u32>,        // 最低分
    pub correction_count: usize,    // 调整条目数
}

// ==========================================
// SectionStatistics - 班级统计
// ==========================================
// 按班级汇总全部科目的实考/及格条目
#[derive(Debug, Clone, Serialize)]
pub struct SectionStatistics {
    pub section: String,
    pub appeared: usize,
    pub passed: usize,
    pub pass_rate: f64,
    pub average: Option<f64>,
}

// ==========================================
// ExamStatistics - 考试统计总览
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ExamStatistics {
    pub exam_id: String,
    pub exam_name: String,
    pub subjects: Vec<SubjectStatistics>,
    pub sections: Vec<SectionStatistics>,
    /// 全科及格学生占实考学生的比例
    pub overall_pass_rate: f64,
}

// ==========================================
// ResultsAggregator - 成绩统计引擎
// ==========================================
pub struct ResultsAggregator {
    config: EngineConfig,
}

impl ResultsAggregator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// 计算考试统计 (仅限已发布考试)
    pub fn compute(&self, exam: &Exam) -> EngineResult<ExamStatistics> {
        if !exam.is_published() {
            return Err(EngineError::NotPublished {
                exam_id: exam.exam_id.clone(),
            });
        }

        let subjects = exam
            .subjects
            .iter()
            .filter_map(|s| {
                exam.mark_set(&s.subject_id)
                    .map(|set| self.subject_statistics(s, set))
            })
            .collect();

        Ok(ExamStatistics {
            exam_id: exam.exam_id.clone(),
            exam_name: exam.name.clone(),
            subjects,
            sections: self.section_statistics(exam),
            overall_pass_rate: self.overall_pass_rate(exam),
        })
    }

    fn subject_statistics(&self, subject: &Subject, set: &SubjectMarkSet) -> SubjectStatistics {
        let mut appeared = 0;
        let mut absent = 0;
        let mut unset = 0;
        let mut passed = 0;
        let mut sum: u64 = 0;
        let mut highest: Option<u32> = None;
        let mut lowest: Option<u32> = None;

        for mark in &set.marks {
            match mark.entry.current_value() {
                Some(v) => {
                    appeared += 1;
                    sum += v as u64;
                    if v >= subject.passing_marks {
                        passed += 1;
                    }
                    highest = Some(highest.map_or(v, |h| h.max(v)));
                    lowest = Some(lowest.map_or(v, |l| l.min(v)));
                }
                None if mark.entry.is_absent() => absent += 1,
                None => unset += 1,
            }
        }

        // 统计口径: 缺考是否计入不及格
        let mut failed = appeared - passed;
        let mut denominator = appeared;
        if self.config.absent_counts_as_failed {
            failed += absent;
            denominator += absent;
        }

        SubjectStatistics {
            subject_id: subject.subject_id.clone(),
            subject_name: subject.name.clone(),
            total_marks: subject.total_marks,
            passing_marks: subject.passing_marks,
            appeared,
            absent,
            unset,
            passed,
            failed,
            pass_rate: ratio(passed, denominator),
            average: if appeared > 0 {
                Some(sum as f64 / appeared as f64)
            } else {
                None
            },
            highest,
            lowest,
            correction_count: set.correction_count(),
        }
    }

    fn section_statistics(&self, exam: &Exam) -> Vec<SectionStatistics> {
        // (实考条目数, 及格条目数, 总分) 按班级聚合
        let mut by_section: BTreeMap<String, (usize, usize, u64)> = BTreeMap::new();

        for subject in &exam.subjects {
            let Some(set) = exam.mark_set(&subject.subject_id) else {
                continue;
            };
            for mark in &set.marks {
                if let Some(v) = mark.entry.current_value() {
                    let slot = by_section
                        .entry(mark.section.clone())
                        .or_insert((0, 0, 0));
                    slot.0 += 1;
                    if v >= subject.passing_marks {
                        slot.1 += 1;
                    }
                    slot.2 += v as u64;
                }
            }
        }

        by_section
            .into_iter()
            .map(|(section, (appeared, passed, sum))| SectionStatistics {
                section,
                appeared,
                passed,
                pass_rate: ratio(passed, appeared),
                average: if appeared > 0 {
                    Some(sum as f64 / appeared as f64)
                } else {
                    None
                },
            })
            .collect()
    }

    /// 全科及格率: 至少实考一科且所有实考科目均及格的学生比例
    fn overall_pass_rate(&self, exam: &Exam) -> f64 {
        // student_id → (实考科目数, 全部及格)
        let mut by_student: BTreeMap<String, (usize, bool)> = BTreeMap::new();

        for subject in &exam.subjects {
            let Some(set) = exam.mark_set(&subject.subject_id) else {
                continue;
            };
            for mark in &set.marks {
                if let Some(v) = mark.entry.current_value() {
                    let slot = by_student
                        .entry(mark.student_id.clone())
                        .or_insert((0, true));
                    slot.0 += 1;
                    if v < subject.passing_marks {
                        slot.1 = false;
                    }
                }
            }
        }

        let appeared = by_student.len();
        let passed_all = by_student.values().filter(|(_, ok)| *ok).count();
        ratio(passed_all, appeared)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
