// 参照解決パス
//
// 索引付け済みレジストリの生ID参照をテーブル・カラムの同一性に置き換え、
// 凍結前のモデル部品（ResolvedDesign）を組み立てます。

use super::registry::{
    Attr, ColumnEntry, DesignRegistry, FragmentId, RelationshipEntry, Slot, Sourced,
};
use crate::core::error::{ConvertError, ConvertResult};
use crate::core::model::{Column, ColumnPair, Model, Relationship, Table, TableRef};
use std::collections::HashMap;
use tracing::debug;

/// 参照解決済みの設計（Resolved状態）
///
/// `freeze` によってのみ Model に変換できます。
#[derive(Debug)]
pub struct ResolvedDesign {
    tables: Vec<Table>,
    relationships: Vec<Relationship>,
}

impl ResolvedDesign {
    /// テーブル数
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// リレーションシップ数
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// モデルを凍結（Resolved → Frozen）
    pub fn freeze(self) -> ConvertResult<Model> {
        Model::new(self.tables, self.relationships)
    }
}

/// カラムの解決結果（所属テーブルとテーブル内の位置）
#[derive(Debug, Clone, Copy)]
struct ColumnLocation {
    table: usize,
    column: usize,
}

/// 並べ替え前のカラム
struct PendingColumn {
    id: String,
    declared_in: FragmentId,
    position: Option<u32>,
    column: Column,
}

pub(crate) fn resolve(registry: DesignRegistry) -> ConvertResult<ResolvedDesign> {
    let resolver = Resolver {
        registry: &registry,
    };

    let mut tables = resolver.resolve_tables()?;
    let mut pending: Vec<Vec<PendingColumn>> = tables.iter().map(|_| Vec::new()).collect();

    for entry in &registry.columns {
        let (table_index, column) = resolver.resolve_column(entry)?;
        pending[table_index].push(PendingColumn {
            id: entry.id.clone(),
            declared_in: entry.declared_in,
            position: entry.position.as_ref().map(|p| p.value),
            column,
        });
    }

    let mut locations = HashMap::new();
    for (table_index, columns) in pending.into_iter().enumerate() {
        for (column_index, column) in resolver.order_columns(columns)?.into_iter().enumerate() {
            locations.insert(
                column.id,
                ColumnLocation {
                    table: table_index,
                    column: column_index,
                },
            );
            tables[table_index].add_column(column.column);
        }
    }

    for (table_index, entry) in registry.tables.iter().enumerate() {
        if let Some(primary_key) = &entry.primary_key {
            let names = primary_key
                .value
                .iter()
                .map(|column_id| -> ConvertResult<String> {
                    let location = resolver.locate_column(
                        &locations,
                        column_id,
                        table_index,
                        &entry.id,
                        primary_key.fragment,
                        &tables,
                    )?;
                    Ok(tables[table_index].columns[location.column].name.clone())
                })
                .collect::<ConvertResult<Vec<_>>>()?;
            tables[table_index].set_primary_key(names);
        }
    }

    let relationships = registry
        .relationships
        .iter()
        .map(|entry| resolver.resolve_relationship(entry, &locations, &tables))
        .collect::<ConvertResult<Vec<_>>>()?;

    debug!(
        tables = tables.len(),
        columns = locations.len(),
        relationships = relationships.len(),
        "Resolved design references"
    );

    Ok(ResolvedDesign {
        tables,
        relationships,
    })
}

struct Resolver<'a> {
    registry: &'a DesignRegistry,
}

impl Resolver<'_> {
    /// 宣言位置でカラムを並べ替え
    ///
    /// 位置を持たないカラムは位置付きカラムの後ろに置き、同順位は出現順を保ちます。
    /// 位置を持たないカラムには直前のカラムに続く位置を割り当てます。
    fn order_columns(&self, mut columns: Vec<PendingColumn>) -> ConvertResult<Vec<PendingColumn>> {
        columns.sort_by_key(|c| (c.position.is_none(), c.position));

        let mut last_position: u32 = 0;
        for pending in &mut columns {
            match pending.position {
                Some(position) => last_position = position,
                None => {
                    // u32の上限を超える位置は割り当てられない
                    last_position = last_position.checked_add(1).ok_or_else(|| {
                        ConvertError::IncompleteDefinition {
                            id: pending.id.clone(),
                            attribute: "position".to_string(),
                            fragment: self.path(pending.declared_in),
                        }
                    })?;
                    pending.column.position = last_position;
                }
            }
        }

        Ok(columns)
    }

    fn resolve_tables(&self) -> ConvertResult<Vec<Table>> {
        let mut tables = Vec::with_capacity(self.registry.tables.len());
        let mut seen: HashMap<String, &str> = HashMap::new();

        for entry in &self.registry.tables {
            let name = self.require(&entry.name, &entry.id, "name", entry.declared_in)?;
            let mut table = Table::new(name);
            table.schema = value_of(&entry.schema);
            table.comment = value_of(&entry.comment);

            let qualified = table.qualified_name();
            if let Some(first) = seen.get(&qualified) {
                return Err(ConvertError::DuplicateTableName {
                    name: qualified,
                    first: first.to_string(),
                    second: entry.id.clone(),
                });
            }
            seen.insert(qualified, &entry.id);
            tables.push(table);
        }

        Ok(tables)
    }

    fn resolve_column(&self, entry: &ColumnEntry) -> ConvertResult<(usize, Column)> {
        let table_ref = entry.table.as_ref().ok_or_else(|| ConvertError::IncompleteDefinition {
            id: entry.id.clone(),
            attribute: "table".to_string(),
            fragment: self.path(entry.declared_in),
        })?;
        let table_index = self.table_index(&table_ref.value, table_ref.fragment)?;

        let domain = match &entry.domain {
            Some(domain_ref) => match self.registry.index.get(&domain_ref.value) {
                Some(Slot::Domain(i)) => Some(&self.registry.domains[*i]),
                _ => return Err(self.dangling(&domain_ref.value, domain_ref.fragment)),
            },
            None => None,
        };

        let logical_type = value_of(&entry.logical_type)
            .or_else(|| domain.and_then(|d| value_of(&d.logical_type)))
            .ok_or_else(|| ConvertError::IncompleteDefinition {
                id: entry.id.clone(),
                attribute: "type".to_string(),
                fragment: self.path(entry.declared_in),
            })?;

        let name = self.require(&entry.name, &entry.id, "name", entry.declared_in)?;

        let column = Column {
            name,
            logical_type,
            length: value_of(&entry.length).or_else(|| domain.and_then(|d| value_of(&d.length))),
            precision: value_of(&entry.precision)
                .or_else(|| domain.and_then(|d| value_of(&d.precision))),
            scale: value_of(&entry.scale).or_else(|| domain.and_then(|d| value_of(&d.scale))),
            nullable: value_of(&entry.nullable).unwrap_or(true),
            default_value: value_of(&entry.default_value),
            position: value_of(&entry.position).unwrap_or(0),
            comment: value_of(&entry.comment),
        };

        Ok((table_index, column))
    }

    fn resolve_relationship(
        &self,
        entry: &RelationshipEntry,
        locations: &HashMap<String, ColumnLocation>,
        tables: &[Table],
    ) -> ConvertResult<Relationship> {
        let parent_ref = entry
            .parent
            .as_ref()
            .ok_or_else(|| self.incomplete(&entry.id, "parent", entry.declared_in))?;
        let child_ref = entry
            .child
            .as_ref()
            .ok_or_else(|| self.incomplete(&entry.id, "child", entry.declared_in))?;

        let parent = self.table_index(&parent_ref.value, parent_ref.fragment)?;
        let child = self.table_index(&child_ref.value, child_ref.fragment)?;

        let pairs = entry
            .pairs
            .as_ref()
            .filter(|p| !p.value.is_empty())
            .ok_or_else(|| self.incomplete(&entry.id, "column pairs", entry.declared_in))?;

        let mut relationship = Relationship::new(
            TableRef::new(parent),
            TableRef::new(child),
            value_of(&entry.cardinality).unwrap_or_default(),
        );
        relationship.name = value_of(&entry.name);

        for (child_column, parent_column) in &pairs.value {
            let child_location = self.locate_column(
                locations,
                child_column,
                child,
                &entry.id,
                pairs.fragment,
                tables,
            )?;
            let parent_location = self.locate_column(
                locations,
                parent_column,
                parent,
                &entry.id,
                pairs.fragment,
                tables,
            )?;
            relationship.columns.push(ColumnPair {
                child: child_location.column,
                parent: parent_location.column,
            });
        }

        Ok(relationship)
    }

    /// カラムIDを解決し、期待するテーブルに属することを確認
    fn locate_column(
        &self,
        locations: &HashMap<String, ColumnLocation>,
        column_id: &str,
        expected_table: usize,
        referrer: &str,
        fragment: FragmentId,
        tables: &[Table],
    ) -> ConvertResult<ColumnLocation> {
        let location = *locations
            .get(column_id)
            .ok_or_else(|| self.dangling(column_id, fragment))?;

        if location.table != expected_table {
            return Err(ConvertError::MismatchedReference {
                id: referrer.to_string(),
                reference: column_id.to_string(),
                expected_table: tables[expected_table].qualified_name(),
                fragment: self.path(fragment),
            });
        }

        Ok(location)
    }

    fn table_index(&self, table_id: &str, fragment: FragmentId) -> ConvertResult<usize> {
        match self.registry.index.get(table_id) {
            Some(Slot::Table(i)) => Ok(*i),
            _ => Err(self.dangling(table_id, fragment)),
        }
    }

    fn require(
        &self,
        attr: &Attr<String>,
        id: &str,
        attribute: &str,
        declared_in: FragmentId,
    ) -> ConvertResult<String> {
        value_of(attr).ok_or_else(|| self.incomplete(id, attribute, declared_in))
    }

    fn incomplete(&self, id: &str, attribute: &str, fragment: FragmentId) -> ConvertError {
        ConvertError::IncompleteDefinition {
            id: id.to_string(),
            attribute: attribute.to_string(),
            fragment: self.path(fragment),
        }
    }

    fn dangling(&self, id: &str, fragment: FragmentId) -> ConvertError {
        ConvertError::DanglingReference {
            id: id.to_string(),
            fragment: self.path(fragment),
        }
    }

    fn path(&self, fragment: FragmentId) -> std::path::PathBuf {
        self.registry.fragment_path(fragment).to_path_buf()
    }
}

fn value_of<T: Clone>(attr: &Attr<T>) -> Option<T> {
    attr.as_ref().map(|Sourced { value, .. }| value.clone())
}
