// 設定ファイル読み込みサービス
//
// core::config の純粋性を保つため、ファイルI/Oはこのサービスに集約する。

use crate::core::config::RunConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// 設定ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// YAMLファイルから設定を読み込む
    ///
    /// 相対パスは設定ファイルのあるディレクトリを基準に解決します。
    pub fn from_file(path: &Path) -> Result<RunConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let mut config: RunConfig = serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(".dmdgen.yaml");
        fs::write(
            &config_path,
            "model: design\njson_output: /tmp/out.json\nextensions: [xml, dmd]\n",
        )
        .unwrap();

        let config = ConfigLoader::from_file(&config_path).unwrap();

        assert_eq!(config.model, Some(temp_dir.path().join("design")));
        assert_eq!(config.json_output, Some(PathBuf::from("/tmp/out.json")));
        assert_eq!(config.extensions, vec!["xml", "dmd"]);
    }

    #[test]
    fn test_from_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigLoader::from_file(&temp_dir.path().join("missing.yaml"));

        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("Failed to read config file"));
    }
}
