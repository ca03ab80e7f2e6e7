// ==========================================
// 考务管理系统 - 成绩批量上传模板
// ==========================================
// 职责: 模板导出 / 上传文件解析为批量合并行
// 格式: 表头 Roll Number,Student Name,Marks,Absent (Yes/No)
//       每个学生一行; "Yes"/"true" (不区分大小写) 表示缺考
// 红线: 逐行容错 —— 畸形行跳过并报告,绝不中止整批
// ==========================================

use std::path::Path;

use crate::domain::marks::{BulkMarkRow, SubjectMarkSet};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, RawRecord, UniversalFileParser};

/// 模板列名
pub const COL_ROLL_NUMBER: &str = "Roll Number";
pub const COL_STUDENT_NAME: &str = "Student Name";
pub const COL_MARKS: &str = "Marks";
pub const COL_ABSENT: &str = "Absent (Yes/No)";

// ==========================================
// ParsedMarksFile - 上传解析结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ParsedMarksFile {
    pub rows: Vec<BulkMarkRow>,    // 可合并的行
    pub warnings: Vec<String>,     // 跳过行的原因 (软警告)
}

// ==========================================
// MarksTemplate - 模板导出与解析
// ==========================================
pub struct MarksTemplate;

impl MarksTemplate {
    /// 为成绩册导出上传模板 (CSV 文本)
    ///
    /// 已录得分/缺考标志随模板带出,教师在表格中补填后回传
    pub fn export(set: &SubjectMarkSet) -> ImportResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([COL_ROLL_NUMBER, COL_STUDENT_NAME, COL_MARKS, COL_ABSENT])?;

        for mark in &set.marks {
            let marks_cell = mark
                .entry
                .current_value()
                .map(|v| v.to_string())
                .unwrap_or_default();
            let absent_cell = if mark.entry.is_absent() { "Yes" } else { "No" };
            writer.write_record([
                mark.roll_number.as_str(),
                mark.student_name.as_str(),
                marks_cell.as_str(),
                absent_cell,
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ImportError::TemplateError(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ImportError::TemplateError(e.to_string()))
    }

    /// 解析上传文件 (CSV/Excel,按扩展名分派)
    pub fn parse_file<P: AsRef<Path>>(path: P) -> ImportResult<ParsedMarksFile> {
        let records = UniversalFileParser.parse(path)?;
        Self::from_raw_records(records)
    }

    /// 解析 CSV 文本 (模板回传)
    pub fn parse_csv_str(content: &str) -> ImportResult<ParsedMarksFile> {
        let records = CsvParser::parse_reader(content.as_bytes())?;
        Self::from_raw_records(records)
    }

    /// 原始记录 → 批量合并行
    ///
    /// 表头缺失是硬错误; 行级问题 (学号为空、得分不可解析) 跳过并报告
    pub fn from_raw_records(records: Vec<RawRecord>) -> ImportResult<ParsedMarksFile> {
        if let Some(first) = records.first() {
            for column in [COL_ROLL_NUMBER, COL_MARKS, COL_ABSENT] {
                if !first.contains_key(column) {
                    return Err(ImportError::MissingColumn(column.to_string()));
                }
            }
        }

        let mut rows = Vec::new();
        let mut warnings = Vec::new();

        for (idx, record) in records.iter().enumerate() {
            let line_no = idx + 2; // 第一行是表头
            let roll_number = record
                .get(COL_ROLL_NUMBER)
                .map(|s| s.trim())
                .unwrap_or_default();
            if roll_number.is_empty() {
                warnings.push(format!("第 {} 行: 学号为空,已跳过", line_no));
                continue;
            }

            let absent = record
                .get(COL_ABSENT)
                .map(|s| is_absent_flag(s))
                .unwrap_or(false);

            let marks_cell = record.get(COL_MARKS).map(|s| s.trim()).unwrap_or_default();
            let marks = if marks_cell.is_empty() {
                None
            } else {
                match parse_marks_cell(marks_cell) {
                    Some(v) => Some(v),
                    None => {
                        warnings.push(format!(
                            "第 {} 行: 得分 \"{}\" 不可解析,已跳过",
                            line_no, marks_cell
                        ));
                        continue;
                    }
                }
            };

            rows.push(BulkMarkRow {
                roll_number: roll_number.to_string(),
                student_name: record
                    .get(COL_STUDENT_NAME)
                    .cloned()
                    .unwrap_or_default(),
                marks,
                absent,
            });
        }

        Ok(ParsedMarksFile { rows, warnings })
    }
}

/// "Yes"/"true" (不区分大小写) 表示缺考
fn is_absent_flag(cell: &str) -> bool {
    matches!(cell.trim().to_lowercase().as_str(), "yes" | "true")
}

/// Excel 单元格常以 "72.0" 形式带出整数
fn parse_marks_cell(cell: &str) -> Option<u32> {
    if let Ok(v) = cell.parse::<u32>() {
        return Some(v);
    }
    match cell.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 => Some(v as u32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::marks::{MarkEntry, StudentMark};

    fn mark_set() -> SubjectMarkSet {
        let mut set = SubjectMarkSet::open(
            "SUB001",
            vec![
                StudentMark::unset("S1", "R1", "学生一", "A"),
                StudentMark::unset("S2", "R2", "学生二", "A"),
                StudentMark::unset("S3", "R3", "学生三", "B"),
            ],
        );
        set.find_mark_mut("S1").unwrap().entry = MarkEntry::Entered { value: 72 };
        set.find_mark_mut("S2").unwrap().entry = MarkEntry::Absent;
        set
    }

    #[test]
    fn test_export_template_shape() {
        let template = MarksTemplate::export(&mark_set()).unwrap();
        let mut lines = template.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Roll Number,Student Name,Marks,Absent (Yes/No)"
        );
        assert_eq!(lines.next().unwrap(), "R1,学生一,72,No");
        assert_eq!(lines.next().unwrap(), "R2,学生二,,Yes");
        assert_eq!(lines.next().unwrap(), "R3,学生三,,No");
    }

    #[test]
    fn test_roundtrip_preserves_values() {
        let set = mark_set();
        let template = MarksTemplate::export(&set).unwrap();
        let parsed = MarksTemplate::parse_csv_str(&template).unwrap();

        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[0].marks, Some(72));
        assert!(!parsed.rows[0].absent);
        assert_eq!(parsed.rows[1].marks, None);
        assert!(parsed.rows[1].absent);
        assert_eq!(parsed.rows[2].marks, None);
        assert!(!parsed.rows[2].absent);
    }

    #[test]
    fn test_malformed_rows_skipped_and_reported() {
        let content = "Roll Number,Student Name,Marks,Absent (Yes/No)\n\
                       R1,学生一,abc,No\n\
                       ,无学号,50,No\n\
                       R3,学生三,88,no\n";
        let parsed = MarksTemplate::parse_csv_str(content).unwrap();

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].roll_number, "R3");
        assert_eq!(parsed.warnings.len(), 2);
    }

    #[test]
    fn test_absent_flag_case_insensitive() {
        for flag in ["Yes", "YES", "true", "TRUE", "tRuE"] {
            assert!(is_absent_flag(flag), "{} 应判为缺考", flag);
        }
        for flag in ["No", "", "0", "false"] {
            assert!(!is_absent_flag(flag), "{} 不应判为缺考", flag);
        }
    }

    #[test]
    fn test_excel_style_decimal_marks() {
        assert_eq!(parse_marks_cell("72.0"), Some(72));
        assert_eq!(parse_marks_cell("72"), Some(72));
        assert_eq!(parse_marks_cell("72.5"), None);
        assert_eq!(parse_marks_cell("-3"), None);
    }

    #[test]
    fn test_missing_column_is_hard_error() {
        let content = "Roll Number,Student Name\nR1,学生一\n";
        let err = MarksTemplate::parse_csv_str(content).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn(_)));
    }
}
