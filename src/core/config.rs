// 実行設定
//
// 1回の変換実行に必要な設定値を表現します。
// 詳細出力などのフラグはプロセス全体の状態ではなく、この値として各コンポーネントに渡されます。

use crate::core::naming::{DEFAULT_EXTENSIONS, DEFAULT_PLATFORM};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 設定の検証エラー
///
/// 必須パラメータの不足を表します。CLIでは専用の終了コードに対応します。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Model root path is missing
    #[error("Model path is required (use --model or set `model` in the config file)")]
    MissingModelPath,

    /// Neither output is requested
    #[error("Nothing to do: specify --sql and/or --json, or use --dry-run")]
    NoOutput,

    /// SQL is the only requested output and no types file is given
    #[error("SQL output requires a types file (use --types)")]
    MissingTypesFile,

    /// Empty platform name
    #[error("Platform name must not be empty")]
    EmptyPlatform,

    /// No usable fragment extension
    #[error("At least one fragment extension is required")]
    NoExtensions,
}

/// 変換実行の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// フラグメントのルートパス（ファイルまたはディレクトリ）
    #[serde(default)]
    pub model: Option<PathBuf>,

    /// 型ルックアップ文書のパス
    #[serde(default)]
    pub types: Option<PathBuf>,

    /// ターゲットプラットフォーム名
    #[serde(default = "default_platform")]
    pub platform: String,

    /// フラグメントとして認識する拡張子
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// SQL出力先
    #[serde(default)]
    pub sql_output: Option<PathBuf>,

    /// JSON出力先
    #[serde(default)]
    pub json_output: Option<PathBuf>,

    /// ドライラン（ファイルを書かずに標準出力へ表示）
    #[serde(default)]
    pub dry_run: bool,

    /// 詳細出力
    #[serde(default)]
    pub verbose: bool,
}

fn default_platform() -> String {
    DEFAULT_PLATFORM.to_string()
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: None,
            types: None,
            platform: default_platform(),
            extensions: default_extensions(),
            sql_output: None,
            json_output: None,
            dry_run: false,
            verbose: false,
        }
    }
}

impl RunConfig {
    /// 指定されたモデルパスで設定を作成
    pub fn new(model: impl Into<PathBuf>) -> Self {
        Self {
            model: Some(model.into()),
            ..Self::default()
        }
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.is_none() {
            return Err(ConfigError::MissingModelPath);
        }

        if self.platform.trim().is_empty() {
            return Err(ConfigError::EmptyPlatform);
        }

        if self.normalized_extensions().is_empty() {
            return Err(ConfigError::NoExtensions);
        }

        // SQLだけを求められて型ルックアップがない場合は何も生成できない
        if self.sql_skipped() && self.json_output.is_none() && !self.dry_run {
            return Err(ConfigError::MissingTypesFile);
        }

        if !self.dry_run && self.sql_output.is_none() && self.json_output.is_none() {
            return Err(ConfigError::NoOutput);
        }

        Ok(())
    }

    /// SQLを生成するかどうか
    ///
    /// 型ルックアップ文書がない場合、DDL生成は行いません。
    pub fn wants_sql(&self) -> bool {
        self.types.is_some() && (self.sql_output.is_some() || self.dry_run)
    }

    /// SQL出力先があるのに型ルックアップ文書がなく、DDL生成を省略するかどうか
    pub fn sql_skipped(&self) -> bool {
        self.sql_output.is_some() && self.types.is_none()
    }

    /// JSONを生成するかどうか
    pub fn wants_json(&self) -> bool {
        self.json_output.is_some() || self.dry_run
    }

    /// 先頭のドットを除去し小文字化した拡張子一覧
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }

    /// 相対パスを基準ディレクトリからの絶対パスに変換
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.model,
            &mut self.types,
            &mut self.sql_output,
            &mut self.json_output,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.platform, "Oracle Database 21c");
        assert_eq!(config.extensions, vec!["xml".to_string()]);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_validate_requires_model() {
        let config = RunConfig::default();
        assert_eq!(config.validate(), Err(ConfigError::MissingModelPath));
    }

    #[test]
    fn test_validate_requires_output() {
        let config = RunConfig::new("design");
        assert_eq!(config.validate(), Err(ConfigError::NoOutput));

        let config = RunConfig {
            dry_run: true,
            ..RunConfig::new("design")
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_sql_only_requires_types() {
        let config = RunConfig {
            sql_output: Some(PathBuf::from("out.sql")),
            ..RunConfig::new("design")
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingTypesFile));
    }

    #[test]
    fn test_validate_sql_without_types_allowed_with_json() {
        let config = RunConfig {
            sql_output: Some(PathBuf::from("out.sql")),
            json_output: Some(PathBuf::from("out.json")),
            ..RunConfig::new("design")
        };
        assert!(config.validate().is_ok());
        assert!(config.sql_skipped());
        assert!(!config.wants_sql());
        assert!(config.wants_json());
    }

    #[test]
    fn test_wants_sql_only_with_types() {
        let config = RunConfig {
            dry_run: true,
            ..RunConfig::new("design")
        };
        assert!(!config.wants_sql());
        assert!(config.wants_json());

        let config = RunConfig {
            types: Some(PathBuf::from("types.xml")),
            ..config
        };
        assert!(config.wants_sql());
    }

    #[test]
    fn test_normalized_extensions() {
        let config = RunConfig {
            extensions: vec![".XML".to_string(), "dmd".to_string(), " ".to_string()],
            ..RunConfig::default()
        };
        assert_eq!(config.normalized_extensions(), vec!["xml", "dmd"]);
    }

    #[test]
    fn test_resolve_paths() {
        let mut config = RunConfig {
            json_output: Some(PathBuf::from("/abs/out.json")),
            ..RunConfig::new("design")
        };
        config.resolve_paths(Path::new("/work"));

        assert_eq!(config.model, Some(PathBuf::from("/work/design")));
        assert_eq!(config.json_output, Some(PathBuf::from("/abs/out.json")));
    }

    #[test]
    fn test_deserialize_yaml() {
        let yaml = r#"
model: design
types: types.xml
platform: PostgreSQL
sql_output: out/schema.sql
"#;
        let config: RunConfig = serde_saphyr::from_str(yaml).unwrap();

        assert_eq!(config.model, Some(PathBuf::from("design")));
        assert_eq!(config.platform, "PostgreSQL");
        assert_eq!(config.extensions, vec!["xml".to_string()]);
        assert!(config.validate().is_ok());
    }
}
