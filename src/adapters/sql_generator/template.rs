// テンプレート駆動SQLジェネレーター
//
// 型ルックアップ文書のテンプレートでネイティブ型を決定し、DDL文を生成します。

use crate::adapters::sql_generator::SqlGenerator;
use crate::adapters::type_mapping::TypeMapping;
use crate::core::error::{ConvertError, ConvertResult};
use crate::core::model::{Column, Model, Relationship, Table};

/// テンプレート駆動SQLジェネレーター
#[derive(Debug, Clone)]
pub struct TemplateSqlGenerator<'a> {
    mapping: &'a TypeMapping,
}

impl<'a> TemplateSqlGenerator<'a> {
    /// 新しいTemplateSqlGeneratorを作成
    pub fn new(mapping: &'a TypeMapping) -> Self {
        Self { mapping }
    }

    /// カラム定義のSQL文字列を生成
    fn generate_column_definition(&self, table: &Table, column: &Column) -> ConvertResult<String> {
        let mut parts = Vec::new();

        // カラム名
        parts.push(column.name.clone());

        // データ型
        let native_type = self.mapping.native_type_for(column).ok_or_else(|| {
            ConvertError::UnresolvedTypeMapping {
                table: table.qualified_name(),
                column: column.name.clone(),
                logical_type: column.logical_type.clone(),
                platform: self.mapping.platform().to_string(),
            }
        })?;
        parts.push(native_type);

        // デフォルト値
        if let Some(ref default_value) = column.default_value {
            parts.push(format!("DEFAULT {}", default_value));
        }

        // NULL制約（主キー列は常にNOT NULL）
        if !column.nullable || table.is_primary_key_column(&column.name) {
            parts.push("NOT NULL".to_string());
        }

        Ok(parts.join(" "))
    }
}

impl SqlGenerator for TemplateSqlGenerator<'_> {
    fn generate_create_table(&self, table: &Table) -> ConvertResult<String> {
        let mut elements = Vec::with_capacity(table.columns.len() + 1);

        for column in &table.columns {
            elements.push(self.generate_column_definition(table, column)?);
        }

        if !table.primary_key.is_empty() {
            elements.push(format!("PRIMARY KEY ({})", table.primary_key.join(", ")));
        }

        Ok(format!(
            "CREATE TABLE {} ({});",
            table.qualified_name(),
            elements.join(", ")
        ))
    }

    fn generate_add_foreign_key(&self, model: &Model, relationship: &Relationship) -> String {
        let parent = model.table(relationship.parent);
        let child = model.table(relationship.child);

        let child_columns: Vec<&str> = relationship
            .columns
            .iter()
            .map(|pair| child.columns[pair.child].name.as_str())
            .collect();
        let parent_columns: Vec<&str> = relationship
            .columns
            .iter()
            .map(|pair| parent.columns[pair.parent].name.as_str())
            .collect();

        let constraint = relationship
            .name
            .as_ref()
            .map(|name| format!("CONSTRAINT {} ", name))
            .unwrap_or_default();

        format!(
            "ALTER TABLE {} ADD {}FOREIGN KEY ({}) REFERENCES {} ({});",
            child.qualified_name(),
            constraint,
            child_columns.join(", "),
            parent.qualified_name(),
            parent_columns.join(", ")
        )
    }
}
