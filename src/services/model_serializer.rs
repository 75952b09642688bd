// モデルシリアライザーサービス
//
// 凍結済みモデルとJSON文字列を相互に変換するサービス。
// 順序をすべて保持し、deserialize(serialize(model)) == model が成り立ちます。

use crate::core::error::{ConvertError, ConvertResult};
use crate::core::model::{Column, ColumnPair, Model, Relationship, Table, TableRef};
use crate::services::dto::{ColumnDto, ColumnPairDto, RelationshipDto, TableDto};
use std::collections::HashSet;

/// モデルシリアライザーサービス
#[derive(Debug, Clone, Default)]
pub struct ModelSerializer;

impl ModelSerializer {
    /// 新しいModelSerializerを作成
    pub fn new() -> Self {
        Self
    }

    /// ModelをJSON文字列にシリアライズ
    ///
    /// # Returns
    ///
    /// テーブルレコードの配列（整形済み、末尾改行付き）
    pub fn serialize_to_string(&self, model: &Model) -> ConvertResult<String> {
        let dto = self.convert_model_to_dto(model);
        let mut json = serde_json::to_string_pretty(&dto).map_err(|e| ConvertError::InvalidModel {
            message: e.to_string(),
        })?;
        json.push('\n');
        Ok(json)
    }

    /// JSON文字列からModelを復元
    ///
    /// # Errors
    ///
    /// - JSONとして不正な場合
    /// - 存在しないテーブル・カラムを参照している場合
    /// - リレーションシップの順序番号が重複している場合
    pub fn deserialize_from_str(&self, json: &str) -> ConvertResult<Model> {
        let tables: Vec<TableDto> =
            serde_json::from_str(json).map_err(|e| ConvertError::InvalidModel {
                message: e.to_string(),
            })?;
        self.convert_dto_to_model(tables)
    }

    /// Model → Vec<TableDto> 変換
    fn convert_model_to_dto(&self, model: &Model) -> Vec<TableDto> {
        model
            .tables()
            .iter()
            .enumerate()
            .map(|(index, table)| TableDto {
                name: table.name.clone(),
                schema: table.schema.clone(),
                comment: table.comment.clone(),
                primary_key: table.primary_key.clone(),
                columns: table.columns.iter().map(column_to_dto).collect(),
                relationships: model
                    .relationships_of_child(TableRef::new(index))
                    .map(|(ordinal, relationship)| {
                        self.convert_relationship_to_dto(model, ordinal, relationship)
                    })
                    .collect(),
            })
            .collect()
    }

    fn convert_relationship_to_dto(
        &self,
        model: &Model,
        ordinal: usize,
        relationship: &Relationship,
    ) -> RelationshipDto {
        let parent = model.table(relationship.parent);
        let child = model.table(relationship.child);

        RelationshipDto {
            ordinal,
            name: relationship.name.clone(),
            parent: parent.qualified_name(),
            cardinality: relationship.cardinality,
            columns: relationship
                .columns
                .iter()
                .map(|pair| ColumnPairDto {
                    child: child.columns[pair.child].name.clone(),
                    parent: parent.columns[pair.parent].name.clone(),
                })
                .collect(),
        }
    }

    /// Vec<TableDto> → Model 変換
    fn convert_dto_to_model(&self, dtos: Vec<TableDto>) -> ConvertResult<Model> {
        let mut tables = Vec::with_capacity(dtos.len());
        let mut pending = Vec::new();

        for (index, dto) in dtos.into_iter().enumerate() {
            let mut table = Table::new(dto.name);
            table.schema = dto.schema;
            table.comment = dto.comment;
            table.primary_key = dto.primary_key;
            table.columns = dto.columns.into_iter().map(column_from_dto).collect();
            tables.push(table);

            pending.extend(dto.relationships.into_iter().map(|r| (index, r)));
        }

        pending.sort_by_key(|(_, r)| r.ordinal);
        let mut ordinals = HashSet::new();

        let mut relationships = Vec::with_capacity(pending.len());
        for (child_index, dto) in pending {
            if !ordinals.insert(dto.ordinal) {
                return Err(invalid(format!("duplicate relationship ordinal {}", dto.ordinal)));
            }
            relationships.push(self.convert_relationship_from_dto(&tables, child_index, dto)?);
        }

        Model::new(tables, relationships)
    }

    fn convert_relationship_from_dto(
        &self,
        tables: &[Table],
        child_index: usize,
        dto: RelationshipDto,
    ) -> ConvertResult<Relationship> {
        let parent_index = tables
            .iter()
            .position(|t| t.qualified_name() == dto.parent)
            .ok_or_else(|| invalid(format!("unknown parent table '{}'", dto.parent)))?;

        let parent = &tables[parent_index];
        let child = &tables[child_index];

        let mut relationship = Relationship::new(
            TableRef::new(parent_index),
            TableRef::new(child_index),
            dto.cardinality,
        );
        relationship.name = dto.name;

        for pair in dto.columns {
            relationship.columns.push(ColumnPair {
                child: column_index(child, &pair.child)?,
                parent: column_index(parent, &pair.parent)?,
            });
        }

        Ok(relationship)
    }
}

fn column_to_dto(column: &Column) -> ColumnDto {
    ColumnDto {
        name: column.name.clone(),
        logical_type: column.logical_type.clone(),
        length: column.length,
        precision: column.precision,
        scale: column.scale,
        nullable: column.nullable,
        default: column.default_value.clone(),
        position: column.position,
        comment: column.comment.clone(),
    }
}

fn column_from_dto(dto: ColumnDto) -> Column {
    Column {
        name: dto.name,
        logical_type: dto.logical_type,
        length: dto.length,
        precision: dto.precision,
        scale: dto.scale,
        nullable: dto.nullable,
        default_value: dto.default,
        position: dto.position,
        comment: dto.comment,
    }
}

fn column_index(table: &Table, name: &str) -> ConvertResult<usize> {
    table
        .columns
        .iter()
        .position(|c| c.name == name)
        .ok_or_else(|| {
            invalid(format!(
                "unknown column '{}' in table '{}'",
                name,
                table.qualified_name()
            ))
        })
}

fn invalid(message: String) -> ConvertError {
    ConvertError::InvalidModel { message }
}
