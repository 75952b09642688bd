// モデルDTO
//
// JSON構造と内部モデルを分離するためのDTO層。
// テーブルレコードの配列として表現し、リレーションシップは子テーブルの下に置きます。

use crate::core::model::Cardinality;
use serde::{Deserialize, Serialize};

/// テーブルレコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDto {
    /// テーブル名
    pub name: String,

    /// スキーマ修飾子（オプショナル）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// コメント（オプショナル）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// 主キーカラム名のリスト（オプショナル、デフォルト: 空）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,

    /// カラム定義（宣言位置順）
    pub columns: Vec<ColumnDto>,

    /// このテーブルを子とするリレーションシップ（オプショナル、デフォルト: 空）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<RelationshipDto>,
}

/// カラムレコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDto {
    /// カラム名
    pub name: String,

    /// 論理型名
    #[serde(rename = "type")]
    pub logical_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,

    /// NULL許可フラグ
    pub nullable: bool,

    /// デフォルト式
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// 宣言位置
    pub position: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// リレーションシップレコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDto {
    /// モデル全体での宣言順
    pub ordinal: usize,

    /// 制約名（オプショナル）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// 参照先テーブルの修飾名
    pub parent: String,

    /// カーディナリティ
    #[serde(default)]
    pub cardinality: Cardinality,

    /// カラムの対応
    pub columns: Vec<ColumnPairDto>,
}

/// 子カラム名 → 親カラム名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPairDto {
    pub child: String,
    pub parent: String,
}
