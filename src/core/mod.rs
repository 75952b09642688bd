// Core Domain
// 正規化済みスキーマモデル、エラー型、実行設定

pub mod config;
pub mod error;
pub mod model;
pub mod naming;
