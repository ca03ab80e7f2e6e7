// Small dev utility: validate a bulk marks upload file and print a row report.
//
// Usage:
//   cargo run --bin check_marks_file -- <marks_file.csv|.xlsx>
//
// This is intentionally lightweight and does not touch any exam state.

use exam_workflow_engine::importer::MarksTemplate;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    exam_workflow_engine::logging::init();

    let path = std::env::args()
        .nth(1)
        .ok_or("用法: check_marks_file <marks_file.csv|.xlsx>")?;

    let parsed = MarksTemplate::parse_file(&path)?;

    println!("可合并行: {}", parsed.rows.len());
    for row in &parsed.rows {
        let marks = row
            .marks
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let absent = if row.absent { "缺考" } else { "" };
        println!("  {} {} {} {}", row.roll_number, row.student_name, marks, absent);
    }

    if !parsed.warnings.is_empty() {
        println!("跳过行: {}", parsed.warnings.len());
        for warning in &parsed.warnings {
            println!("  {}", warning);
        }
    }

    Ok(())
}
