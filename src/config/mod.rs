// ==========================================
// 考务管理系统 - 配置层
// ==========================================
// 职责: 引擎策略参数,支持默认值与 JSON 文件加载
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::Path;

// ==========================================
// EngineConfig - 引擎策略配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 成绩调整幅度提醒阈值 (|新值-原始值| > 阈值×原始值 时提醒)
    pub moderation_warning_ratio: f64,

    /// 班级冲突是否仅在目标班级有交集时判定
    /// false = 同一考试内任何同日时间重叠都判班级冲突 (保守默认)
    pub scope_class_conflict_to_shared_sections: bool,

    /// 统计口径: 缺考是否计入不及格
    pub absent_counts_as_failed: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            moderation_warning_ratio: 0.10,
            scope_class_conflict_to_shared_sections: false,
            absent_counts_as_failed: false,
        }
    }
}

impl EngineConfig {
    /// 从 JSON 文件加载配置
    ///
    /// 文件中缺失的键取默认值
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_values() {
        let config = EngineConfig::default();
        assert!((config.moderation_warning_ratio - 0.10).abs() < f64::EPSILON);
        assert!(!config.scope_class_conflict_to_shared_sections);
        assert!(!config.absent_counts_as_failed);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"moderation_warning_ratio\": 0.2}}").unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert!((config.moderation_warning_ratio - 0.2).abs() < f64::EPSILON);
        assert!(!config.scope_class_conflict_to_shared_sections);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(EngineConfig::from_json_file("no_such_config.json").is_err());
    }
}
