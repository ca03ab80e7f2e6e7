// ==========================================
// 考务管理系统 - 导入层
// ==========================================
// 职责: 成绩批量上传文件的解析与模板导出
// ==========================================

pub mod error;
pub mod file_parser;
pub mod marks_template;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, RawRecord, UniversalFileParser};
pub use marks_template::{MarksTemplate, ParsedMarksFile};
