// 命名ポリシー
//
// アプリケーション名と既定値の単一ソースを提供します。

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".dmdgen.yaml";

/// 既定のターゲットプラットフォーム
pub const DEFAULT_PLATFORM: &str = "Oracle Database 21c";

/// 既定のフラグメント拡張子
pub const DEFAULT_EXTENSIONS: &[&str] = &["xml"];

/// 既定のログフィルター
pub const DEFAULT_LOG_FILTER: &str = "dmdgen=warn";

/// 詳細モードのログフィルター
pub const VERBOSE_LOG_FILTER: &str = "dmdgen=debug";
