// エラー型定義
//
// 変換パイプライン全体で使用されるエラー型を提供します。
// thiserrorを使用し、すべてのエラーは実行全体にとって致命的です。

use std::path::{Path, PathBuf};
use thiserror::Error;

/// 変換エラー
///
/// フラグメントの探索・読み込み・参照解決・DDL生成・出力のいずれかで
/// 発生したエラーを表現します。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Path not found
    #[error("Path not found: {}", .path.display())]
    NotFound {
        /// 見つからなかったパス
        path: PathBuf,
    },

    /// Malformed fragment content
    #[error("Failed to parse {}:{line}:{column}: {message}", .fragment.display())]
    FragmentParseError {
        /// 対象のフラグメントファイル
        fragment: PathBuf,
        /// 行番号（1始まり）
        line: u32,
        /// 桁番号（1始まり）
        column: u32,
        /// エラーメッセージ
        message: String,
    },

    /// Same design ID declared with incompatible attribute values
    #[error(
        "Conflicting definition of '{id}' ({attribute}): {} and {} disagree",
        .first.display(),
        .second.display()
    )]
    ConflictingDefinition {
        /// 設計ID
        id: String,
        /// 衝突した属性名
        attribute: String,
        /// 最初に値を与えたフラグメント
        first: PathBuf,
        /// 衝突する値を与えたフラグメント
        second: PathBuf,
    },

    /// Reference to an ID that was never indexed
    #[error("Dangling reference to '{id}' declared in {}", .fragment.display())]
    DanglingReference {
        /// 見つからなかった設計ID
        id: String,
        /// 参照元オブジェクトを宣言したフラグメント
        fragment: PathBuf,
    },

    /// Required attribute missing after all fragments were merged
    #[error("'{id}' has no {attribute} (declared in {})", .fragment.display())]
    IncompleteDefinition {
        /// 設計ID
        id: String,
        /// 欠落している属性名
        attribute: String,
        /// オブジェクトを宣言したフラグメント
        fragment: PathBuf,
    },

    /// Reference resolves to an object owned by the wrong table
    #[error(
        "'{id}' references column '{reference}' which does not belong to table '{expected_table}' (declared in {})",
        .fragment.display()
    )]
    MismatchedReference {
        /// 参照元の設計ID
        id: String,
        /// 参照先の設計ID
        reference: String,
        /// 期待されるテーブル名
        expected_table: String,
        /// 参照元オブジェクトを宣言したフラグメント
        fragment: PathBuf,
    },

    /// Two tables share the same qualified name
    #[error("Duplicate table name '{name}' ({first} and {second})")]
    DuplicateTableName {
        /// 重複したテーブル名
        name: String,
        /// 最初のテーブルの設計ID（シリアライズ済みモデルでは位置）
        first: String,
        /// 2番目のテーブルの設計ID（シリアライズ済みモデルでは位置）
        second: String,
    },

    /// Two columns of one table share the same name
    #[error("Duplicate column name '{column}' in table '{table}'")]
    DuplicateColumnName {
        /// テーブル名
        table: String,
        /// 重複したカラム名
        column: String,
    },

    /// Requested platform is absent from the type lookup document
    #[error("Unknown platform '{platform}'. Available platforms: {}", .available.join(", "))]
    UnknownPlatform {
        /// 要求されたプラットフォーム名
        platform: String,
        /// 利用可能なプラットフォーム名
        available: Vec<String>,
    },

    /// Column logical type has no native mapping for the platform
    #[error(
        "No type mapping for '{logical_type}' on platform '{platform}' (table: {table}, column: {column})"
    )]
    UnresolvedTypeMapping {
        /// テーブル名
        table: String,
        /// カラム名
        column: String,
        /// 論理型名
        logical_type: String,
        /// プラットフォーム名
        platform: String,
    },

    /// Model parts violate a structural invariant
    #[error("Invalid model: {message}")]
    InvalidModel {
        /// エラーメッセージ
        message: String,
    },

    /// Output collaborator failed
    #[error("Failed to write {} (cause: {cause})", .path.display())]
    WriteFailure {
        /// 出力先パス
        path: PathBuf,
        /// エラー原因
        cause: String,
    },

    /// Filesystem read error
    #[error("Failed to read {} (cause: {cause})", .path.display())]
    Io {
        /// 対象パス
        path: PathBuf,
        /// エラー原因
        cause: String,
    },
}

impl ConvertError {
    /// パス未検出エラーを作成
    pub fn not_found(path: &Path) -> Self {
        ConvertError::NotFound {
            path: path.to_path_buf(),
        }
    }

    /// 読み込みエラーを作成
    pub fn io(path: &Path, error: &std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            return Self::not_found(path);
        }
        ConvertError::Io {
            path: path.to_path_buf(),
            cause: error.to_string(),
        }
    }

    /// パス未検出エラーかどうか
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConvertError::NotFound { .. })
    }

    /// フラグメント解析エラーかどうか
    pub fn is_fragment_parse_error(&self) -> bool {
        matches!(self, ConvertError::FragmentParseError { .. })
    }

    /// 定義衝突エラーかどうか
    pub fn is_conflicting_definition(&self) -> bool {
        matches!(self, ConvertError::ConflictingDefinition { .. })
    }

    /// 未解決参照エラーかどうか
    pub fn is_dangling_reference(&self) -> bool {
        matches!(self, ConvertError::DanglingReference { .. })
    }

    /// 定義不足エラーかどうか
    pub fn is_incomplete_definition(&self) -> bool {
        matches!(self, ConvertError::IncompleteDefinition { .. })
    }

    /// 参照先不一致エラーかどうか
    pub fn is_mismatched_reference(&self) -> bool {
        matches!(self, ConvertError::MismatchedReference { .. })
    }

    /// テーブル名重複エラーかどうか
    pub fn is_duplicate_table_name(&self) -> bool {
        matches!(self, ConvertError::DuplicateTableName { .. })
    }

    /// カラム名重複エラーかどうか
    pub fn is_duplicate_column_name(&self) -> bool {
        matches!(self, ConvertError::DuplicateColumnName { .. })
    }

    /// 未知プラットフォームエラーかどうか
    pub fn is_unknown_platform(&self) -> bool {
        matches!(self, ConvertError::UnknownPlatform { .. })
    }

    /// 型マッピング未解決エラーかどうか
    pub fn is_unresolved_type_mapping(&self) -> bool {
        matches!(self, ConvertError::UnresolvedTypeMapping { .. })
    }

    /// モデル不正エラーかどうか
    pub fn is_invalid_model(&self) -> bool {
        matches!(self, ConvertError::InvalidModel { .. })
    }

    /// 書き込みエラーかどうか
    pub fn is_write_failure(&self) -> bool {
        matches!(self, ConvertError::WriteFailure { .. })
    }

    /// 読み込みエラーかどうか
    pub fn is_io(&self) -> bool {
        matches!(self, ConvertError::Io { .. })
    }
}

/// 変換処理の結果型
pub type ConvertResult<T> = Result<T, ConvertError>;
