// スキーマドメインモデル
//
// フラグメントから解決された正規化済みスキーマを表現する型システム。
// Model は構築時に構造的な不変条件を検証し、以後は読み取り専用です。

use crate::core::error::{ConvertError, ConvertResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// テーブル参照
///
/// Model 内のテーブル列に対するインデックスです。
/// 埋め込みコピーではなく同一性でテーブルを指します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef(usize);

impl TableRef {
    /// 新しいテーブル参照を作成
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// テーブル列内のインデックスを取得
    pub fn index(self) -> usize {
        self.0
    }
}

/// 正規化済みスキーマモデル
///
/// テーブルとリレーションシップを宣言順に保持します。
/// 可変メソッドは存在せず、構築後に変更されることはありません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    tables: Vec<Table>,
    relationships: Vec<Relationship>,
}

impl Model {
    /// テーブルとリレーションシップからモデルを構築
    ///
    /// # Errors
    ///
    /// - 修飾テーブル名が重複している場合
    /// - テーブル内でカラム名が重複している場合
    /// - 主キーが存在しないカラムを指している場合
    /// - リレーションシップが範囲外のテーブル・カラムを指している場合
    pub fn new(tables: Vec<Table>, relationships: Vec<Relationship>) -> ConvertResult<Self> {
        // 設計IDを持たないため、重複はテーブルの位置で報告する
        let mut seen_tables: HashMap<String, usize> = HashMap::new();
        for (index, table) in tables.iter().enumerate() {
            let qualified = table.qualified_name();
            if let Some(first) = seen_tables.get(&qualified) {
                return Err(ConvertError::DuplicateTableName {
                    name: qualified,
                    first: format!("table #{}", first + 1),
                    second: format!("table #{}", index + 1),
                });
            }
            seen_tables.insert(qualified, index);
            table.check_columns()?;
        }

        for (ordinal, relationship) in relationships.iter().enumerate() {
            relationship.check_bounds(ordinal, &tables)?;
        }

        Ok(Self {
            tables,
            relationships,
        })
    }

    /// テーブル一覧（宣言順）
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// リレーションシップ一覧（宣言順）
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// 参照先のテーブルを取得
    ///
    /// TableRef の範囲は構築時に検証済みです。
    pub fn table(&self, table_ref: TableRef) -> &Table {
        &self.tables[table_ref.index()]
    }

    /// 修飾名でテーブルを検索
    pub fn find_table(&self, qualified_name: &str) -> Option<(TableRef, &Table)> {
        self.tables
            .iter()
            .enumerate()
            .find(|(_, t)| t.qualified_name() == qualified_name)
            .map(|(i, t)| (TableRef::new(i), t))
    }

    /// 指定テーブルを子とするリレーションシップを取得
    pub fn relationships_of_child(
        &self,
        child: TableRef,
    ) -> impl Iterator<Item = (usize, &Relationship)> {
        self.relationships
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.child == child)
    }

    /// テーブル数を取得
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// 全テーブルのカラム総数を取得
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }

    /// リレーションシップ数を取得
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }
}

/// テーブル定義
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// テーブル名
    pub name: String,

    /// スキーマ修飾子
    pub schema: Option<String>,

    /// カラム定義のリスト（宣言位置順）
    pub columns: Vec<Column>,

    /// 主キーのカラム名（宣言順）
    pub primary_key: Vec<String>,

    /// コメント
    pub comment: Option<String>,
}

impl Table {
    /// 新しいテーブルを作成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns: Vec::new(),
            primary_key: Vec::new(),
            comment: None,
        }
    }

    /// スキーマ修飾子を設定
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// カラムを追加
    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// 主キーを設定
    pub fn set_primary_key(&mut self, columns: Vec<String>) {
        self.primary_key = columns;
    }

    /// スキーマ修飾付きのテーブル名
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// 指定されたカラムを取得
    pub fn get_column(&self, column_name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == column_name)
    }

    /// カラムが主キーに含まれるかどうか
    pub fn is_primary_key_column(&self, column_name: &str) -> bool {
        self.primary_key.iter().any(|c| c == column_name)
    }

    fn check_columns(&self) -> ConvertResult<()> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ConvertError::DuplicateColumnName {
                    table: self.qualified_name(),
                    column: column.name.clone(),
                });
            }
        }

        if let Some(missing) = self.primary_key.iter().find(|c| !seen.contains(c.as_str())) {
            return Err(ConvertError::InvalidModel {
                message: format!(
                    "primary key of table '{}' names unknown column '{}'",
                    self.qualified_name(),
                    missing
                ),
            });
        }

        Ok(())
    }
}

/// カラム定義
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// カラム名
    pub name: String,

    /// 論理型名
    pub logical_type: String,

    /// 長さ
    pub length: Option<u32>,

    /// 精度
    pub precision: Option<u32>,

    /// スケール
    pub scale: Option<u32>,

    /// NULL許可フラグ
    pub nullable: bool,

    /// デフォルト式
    pub default_value: Option<String>,

    /// 宣言位置
    pub position: u32,

    /// コメント
    pub comment: Option<String>,
}

impl Column {
    /// 新しいカラムを作成（NULL許可）
    pub fn new(name: impl Into<String>, logical_type: impl Into<String>, position: u32) -> Self {
        Self {
            name: name.into(),
            logical_type: logical_type.into(),
            length: None,
            precision: None,
            scale: None,
            nullable: true,
            default_value: None,
            position,
            comment: None,
        }
    }

    /// 長さを設定
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// 精度とスケールを設定
    pub fn with_precision(mut self, precision: u32, scale: Option<u32>) -> Self {
        self.precision = Some(precision);
        self.scale = scale;
        self
    }

    /// NOT NULLにする
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// デフォルト式を設定
    pub fn with_default(mut self, expression: impl Into<String>) -> Self {
        self.default_value = Some(expression.into());
        self
    }
}

/// カーディナリティ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "1:1")]
    OneToOne,
    #[default]
    #[serde(rename = "1:N")]
    OneToMany,
    #[serde(rename = "N:M")]
    ManyToMany,
}

impl Cardinality {
    /// 表記文字列からパース
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "1:1" => Some(Cardinality::OneToOne),
            "1:N" | "1:*" => Some(Cardinality::OneToMany),
            "N:M" | "M:N" | "*:*" => Some(Cardinality::ManyToMany),
            _ => None,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::OneToOne => write!(f, "1:1"),
            Cardinality::OneToMany => write!(f, "1:N"),
            Cardinality::ManyToMany => write!(f, "N:M"),
        }
    }
}

/// 子カラム → 親カラムの対応
///
/// それぞれのテーブルのカラム列に対するインデックスです。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnPair {
    pub child: usize,
    pub parent: usize,
}

/// リレーションシップ（外部キー）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// 制約名
    pub name: Option<String>,

    /// 参照されるテーブル
    pub parent: TableRef,

    /// 外部キーを持つテーブル
    pub child: TableRef,

    /// カラムの対応（宣言順）
    pub columns: Vec<ColumnPair>,

    /// カーディナリティ
    pub cardinality: Cardinality,
}

impl Relationship {
    /// 新しいリレーションシップを作成
    pub fn new(parent: TableRef, child: TableRef, cardinality: Cardinality) -> Self {
        Self {
            name: None,
            parent,
            child,
            columns: Vec::new(),
            cardinality,
        }
    }

    /// 制約名を設定
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// カラムの対応を追加
    pub fn with_pair(mut self, child: usize, parent: usize) -> Self {
        self.columns.push(ColumnPair { child, parent });
        self
    }

    fn check_bounds(&self, ordinal: usize, tables: &[Table]) -> ConvertResult<()> {
        let invalid = |message: String| ConvertError::InvalidModel {
            message: format!("relationship #{}: {}", ordinal, message),
        };

        let parent = tables
            .get(self.parent.index())
            .ok_or_else(|| invalid(format!("parent table #{} out of range", self.parent.index())))?;
        let child = tables
            .get(self.child.index())
            .ok_or_else(|| invalid(format!("child table #{} out of range", self.child.index())))?;

        if self.columns.is_empty() {
            return Err(invalid("no column pairs".to_string()));
        }

        for pair in &self.columns {
            if pair.child >= child.columns.len() {
                return Err(invalid(format!(
                    "column #{} out of range for table '{}'",
                    pair.child,
                    child.qualified_name()
                )));
            }
            if pair.parent >= parent.columns.len() {
                return Err(invalid(format!(
                    "column #{} out of range for table '{}'",
                    pair.parent,
                    parent.qualified_name()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_id(name: &str) -> Table {
        let mut table = Table::new(name);
        table.add_column(Column::new("id", "integer", 1).not_null());
        table.set_primary_key(vec!["id".to_string()]);
        table
    }

    #[test]
    fn test_qualified_name() {
        let table = Table::new("orders").with_schema("sales");
        assert_eq!(table.qualified_name(), "sales.orders");
        assert_eq!(Table::new("orders").qualified_name(), "orders");
    }

    #[test]
    fn test_model_rejects_duplicate_table_names() {
        let result = Model::new(vec![table_with_id("A"), table_with_id("A")], vec![]);
        assert!(result.unwrap_err().is_duplicate_table_name());
    }

    #[test]
    fn test_duplicate_table_names_report_both_positions() {
        let result = Model::new(
            vec![table_with_id("A"), table_with_id("B"), table_with_id("A")],
            vec![],
        );

        assert_eq!(
            result.unwrap_err(),
            ConvertError::DuplicateTableName {
                name: "A".to_string(),
                first: "table #1".to_string(),
                second: "table #3".to_string(),
            }
        );
    }

    #[test]
    fn test_same_name_in_different_schemas_is_allowed() {
        let result = Model::new(
            vec![table_with_id("A").with_schema("x"), table_with_id("A")],
            vec![],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_model_rejects_duplicate_column_names() {
        let mut table = table_with_id("A");
        table.add_column(Column::new("id", "varchar", 2));

        let result = Model::new(vec![table], vec![]);
        assert!(result.unwrap_err().is_duplicate_column_name());
    }

    #[test]
    fn test_model_rejects_unknown_primary_key_column() {
        let mut table = table_with_id("A");
        table.set_primary_key(vec!["missing".to_string()]);

        let result = Model::new(vec![table], vec![]);
        assert!(result.unwrap_err().is_invalid_model());
    }

    #[test]
    fn test_model_rejects_out_of_range_relationship() {
        let relationship =
            Relationship::new(TableRef::new(0), TableRef::new(5), Cardinality::OneToMany)
                .with_pair(0, 0);

        let result = Model::new(vec![table_with_id("A")], vec![relationship]);
        assert!(result.unwrap_err().is_invalid_model());
    }

    #[test]
    fn test_relationships_of_child() {
        let mut b = table_with_id("B");
        b.add_column(Column::new("a_id", "integer", 2));
        let relationship =
            Relationship::new(TableRef::new(0), TableRef::new(1), Cardinality::OneToMany)
                .with_pair(1, 0);

        let model = Model::new(vec![table_with_id("A"), b], vec![relationship]).unwrap();

        assert_eq!(model.relationships_of_child(TableRef::new(1)).count(), 1);
        assert_eq!(model.relationships_of_child(TableRef::new(0)).count(), 0);
        assert_eq!(model.column_count(), 3);
        assert_eq!(model.find_table("B").map(|(r, _)| r), Some(TableRef::new(1)));
    }

    #[test]
    fn test_cardinality_parse() {
        assert_eq!(Cardinality::parse("1:n"), Some(Cardinality::OneToMany));
        assert_eq!(Cardinality::parse("1:1"), Some(Cardinality::OneToOne));
        assert_eq!(Cardinality::parse("m:n"), Some(Cardinality::ManyToMany));
        assert_eq!(Cardinality::parse("lots"), None);
        assert_eq!(Cardinality::OneToMany.to_string(), "1:N");
    }
}
