// 設計オブジェクトレジストリ
//
// 索引付けパスで構築される一時的なアリーナ。
// 設計IDをキーに、部分的に定義されたオブジェクトを属性単位でマージして保持します。

use super::fragment_parser::{
    parse_fragment, ColumnDecl, DesignObject, DomainDecl, RelationshipDecl, TableDecl,
};
use super::resolver::{self, ResolvedDesign};
use crate::core::error::{ConvertError, ConvertResult};
use crate::core::model::Cardinality;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// フラグメントの番号（レジストリ内のフラグメント列に対するインデックス）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FragmentId(usize);

/// 出所付きの属性値
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Sourced<T> {
    pub value: T,
    pub fragment: FragmentId,
}

pub(crate) type Attr<T> = Option<Sourced<T>>;

/// オブジェクト種別ごとのアリーナ内位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Table(usize),
    Column(usize),
    Domain(usize),
    Relationship(usize),
}

impl Slot {
    fn kind(self) -> &'static str {
        match self {
            Slot::Table(_) => "table",
            Slot::Column(_) => "column",
            Slot::Domain(_) => "domain",
            Slot::Relationship(_) => "relationship",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TableEntry {
    pub id: String,
    pub declared_in: FragmentId,
    pub name: Attr<String>,
    pub schema: Attr<String>,
    pub comment: Attr<String>,
    pub primary_key: Attr<Vec<String>>,
}

#[derive(Debug, Clone)]
pub(crate) struct ColumnEntry {
    pub id: String,
    pub declared_in: FragmentId,
    pub table: Attr<String>,
    pub name: Attr<String>,
    pub logical_type: Attr<String>,
    pub domain: Attr<String>,
    pub length: Attr<u32>,
    pub precision: Attr<u32>,
    pub scale: Attr<u32>,
    pub nullable: Attr<bool>,
    pub default_value: Attr<String>,
    pub position: Attr<u32>,
    pub comment: Attr<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct DomainEntry {
    pub id: String,
    pub declared_in: FragmentId,
    pub name: Attr<String>,
    pub logical_type: Attr<String>,
    pub length: Attr<u32>,
    pub precision: Attr<u32>,
    pub scale: Attr<u32>,
}

#[derive(Debug, Clone)]
pub(crate) struct RelationshipEntry {
    pub id: String,
    pub declared_in: FragmentId,
    pub name: Attr<String>,
    pub parent: Attr<String>,
    pub child: Attr<String>,
    pub cardinality: Attr<Cardinality>,
    pub pairs: Attr<Vec<(String, String)>>,
}

/// 設計オブジェクトレジストリ（Indexed状態）
///
/// すべてのフラグメントを索引付けした後にのみ `resolve` で次の状態に進めます。
/// 各オブジェクト列は最初に出現した順序を保持します。
#[derive(Debug, Default)]
pub struct DesignRegistry {
    pub(crate) fragments: Vec<PathBuf>,
    pub(crate) index: HashMap<String, Slot>,
    pub(crate) tables: Vec<TableEntry>,
    pub(crate) columns: Vec<ColumnEntry>,
    pub(crate) domains: Vec<DomainEntry>,
    pub(crate) relationships: Vec<RelationshipEntry>,
}

impl DesignRegistry {
    /// 空のレジストリを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 1つのフラグメントファイルを読み込んで索引付け
    ///
    /// # Errors
    ///
    /// - ファイルが存在しない・読み込めない場合
    /// - マークアップが不正な場合
    /// - 既存の定義と矛盾する属性値がある場合
    pub fn index_fragment(&mut self, path: &Path) -> ConvertResult<()> {
        let text = fs::read_to_string(path).map_err(|e| ConvertError::io(path, &e))?;
        self.index_source(path, &text)
    }

    /// フラグメントのテキストを索引付け
    pub fn index_source(&mut self, path: &Path, text: &str) -> ConvertResult<()> {
        let objects = parse_fragment(path, text)?;
        let fragment = FragmentId(self.fragments.len());
        self.fragments.push(path.to_path_buf());

        debug!(
            fragment = %path.display(),
            objects = objects.len(),
            "Indexed fragment"
        );

        for object in objects {
            self.register(object, fragment)?;
        }

        Ok(())
    }

    /// 索引付け済みのフラグメント数
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// 登録済みの設計オブジェクト数
    pub fn object_count(&self) -> usize {
        self.index.len()
    }

    /// 参照解決パスを実行（Indexed → Resolved）
    ///
    /// # Errors
    ///
    /// - 存在しない設計IDへの参照がある場合（DanglingReference）
    /// - 必須属性が欠けている場合（IncompleteDefinition）
    /// - 参照先が別のテーブルに属する場合（MismatchedReference）
    /// - テーブル名が重複している場合（DuplicateTableName）
    pub fn resolve(self) -> ConvertResult<ResolvedDesign> {
        resolver::resolve(self)
    }

    /// フラグメントのパスを取得
    pub(crate) fn fragment_path(&self, fragment: FragmentId) -> &Path {
        &self.fragments[fragment.0]
    }

    fn register(&mut self, object: DesignObject, fragment: FragmentId) -> ConvertResult<()> {
        let id = object.id().to_string();
        let existing = self.index.get(&id).copied();

        match (object, existing) {
            (DesignObject::Table(decl), None) => {
                self.index.insert(id, Slot::Table(self.tables.len()));
                self.tables.push(TableEntry::from_decl(decl, fragment));
            }
            (DesignObject::Table(decl), Some(Slot::Table(i))) => {
                let mut entry = self.tables[i].clone();
                entry.merge(decl, fragment, self)?;
                self.tables[i] = entry;
            }
            (DesignObject::Column(decl), None) => {
                self.index.insert(id, Slot::Column(self.columns.len()));
                self.columns.push(ColumnEntry::from_decl(decl, fragment));
            }
            (DesignObject::Column(decl), Some(Slot::Column(i))) => {
                let mut entry = self.columns[i].clone();
                entry.merge(decl, fragment, self)?;
                self.columns[i] = entry;
            }
            (DesignObject::Domain(decl), None) => {
                self.index.insert(id, Slot::Domain(self.domains.len()));
                self.domains.push(DomainEntry::from_decl(decl, fragment));
            }
            (DesignObject::Domain(decl), Some(Slot::Domain(i))) => {
                let mut entry = self.domains[i].clone();
                entry.merge(decl, fragment, self)?;
                self.domains[i] = entry;
            }
            (DesignObject::Relationship(decl), None) => {
                self.index
                    .insert(id, Slot::Relationship(self.relationships.len()));
                self.relationships
                    .push(RelationshipEntry::from_decl(decl, fragment));
            }
            (DesignObject::Relationship(decl), Some(Slot::Relationship(i))) => {
                let mut entry = self.relationships[i].clone();
                entry.merge(decl, fragment, self)?;
                self.relationships[i] = entry;
            }
            (object, Some(slot)) => {
                return Err(ConvertError::ConflictingDefinition {
                    id,
                    attribute: format!("kind ({} vs {})", slot.kind(), object_kind(&object)),
                    first: self.fragment_path(self.declared_in(slot)).to_path_buf(),
                    second: self.fragment_path(fragment).to_path_buf(),
                });
            }
        }

        Ok(())
    }

    fn declared_in(&self, slot: Slot) -> FragmentId {
        match slot {
            Slot::Table(i) => self.tables[i].declared_in,
            Slot::Column(i) => self.columns[i].declared_in,
            Slot::Domain(i) => self.domains[i].declared_in,
            Slot::Relationship(i) => self.relationships[i].declared_in,
        }
    }
}

fn object_kind(object: &DesignObject) -> &'static str {
    match object {
        DesignObject::Table(_) => "table",
        DesignObject::Column(_) => "column",
        DesignObject::Domain(_) => "domain",
        DesignObject::Relationship(_) => "relationship",
    }
}

/// マージ時の文脈（衝突エラーの生成に使用）
struct MergeContext<'a> {
    id: &'a str,
    fragment: FragmentId,
    registry: &'a DesignRegistry,
}

impl MergeContext<'_> {
    /// 未設定の属性を埋め、設定済みの属性は値が一致することを確認
    fn merge<T: PartialEq>(
        &self,
        slot: &mut Attr<T>,
        incoming: Option<T>,
        attribute: &str,
    ) -> ConvertResult<()> {
        let Some(value) = incoming else {
            return Ok(());
        };

        match slot {
            None => {
                *slot = Some(Sourced {
                    value,
                    fragment: self.fragment,
                });
                Ok(())
            }
            Some(existing) if existing.value == value => Ok(()),
            Some(existing) => Err(ConvertError::ConflictingDefinition {
                id: self.id.to_string(),
                attribute: attribute.to_string(),
                first: self.registry.fragment_path(existing.fragment).to_path_buf(),
                second: self.registry.fragment_path(self.fragment).to_path_buf(),
            }),
        }
    }
}

fn sourced<T>(value: Option<T>, fragment: FragmentId) -> Attr<T> {
    value.map(|value| Sourced { value, fragment })
}

impl TableEntry {
    fn from_decl(decl: TableDecl, fragment: FragmentId) -> Self {
        Self {
            id: decl.id,
            declared_in: fragment,
            name: sourced(decl.name, fragment),
            schema: sourced(decl.schema, fragment),
            comment: sourced(decl.comment, fragment),
            primary_key: sourced(decl.primary_key, fragment),
        }
    }

    fn merge(
        &mut self,
        decl: TableDecl,
        fragment: FragmentId,
        registry: &DesignRegistry,
    ) -> ConvertResult<()> {
        let ctx = MergeContext {
            id: &decl.id,
            fragment,
            registry,
        };
        ctx.merge(&mut self.name, decl.name, "name")?;
        ctx.merge(&mut self.schema, decl.schema, "schema")?;
        ctx.merge(&mut self.comment, decl.comment, "comment")?;
        ctx.merge(&mut self.primary_key, decl.primary_key, "primary key")
    }
}

impl ColumnEntry {
    fn from_decl(decl: ColumnDecl, fragment: FragmentId) -> Self {
        Self {
            id: decl.id,
            declared_in: fragment,
            table: sourced(decl.table, fragment),
            name: sourced(decl.name, fragment),
            logical_type: sourced(decl.logical_type, fragment),
            domain: sourced(decl.domain, fragment),
            length: sourced(decl.length, fragment),
            precision: sourced(decl.precision, fragment),
            scale: sourced(decl.scale, fragment),
            nullable: sourced(decl.nullable, fragment),
            default_value: sourced(decl.default_value, fragment),
            position: sourced(decl.position, fragment),
            comment: sourced(decl.comment, fragment),
        }
    }

    fn merge(
        &mut self,
        decl: ColumnDecl,
        fragment: FragmentId,
        registry: &DesignRegistry,
    ) -> ConvertResult<()> {
        let ctx = MergeContext {
            id: &decl.id,
            fragment,
            registry,
        };
        ctx.merge(&mut self.table, decl.table, "table")?;
        ctx.merge(&mut self.name, decl.name, "name")?;
        ctx.merge(&mut self.logical_type, decl.logical_type, "type")?;
        ctx.merge(&mut self.domain, decl.domain, "domain")?;
        ctx.merge(&mut self.length, decl.length, "length")?;
        ctx.merge(&mut self.precision, decl.precision, "precision")?;
        ctx.merge(&mut self.scale, decl.scale, "scale")?;
        ctx.merge(&mut self.nullable, decl.nullable, "nullable")?;
        ctx.merge(&mut self.default_value, decl.default_value, "default")?;
        ctx.merge(&mut self.position, decl.position, "position")?;
        ctx.merge(&mut self.comment, decl.comment, "comment")
    }
}

impl DomainEntry {
    fn from_decl(decl: DomainDecl, fragment: FragmentId) -> Self {
        Self {
            id: decl.id,
            declared_in: fragment,
            name: sourced(decl.name, fragment),
            logical_type: sourced(decl.logical_type, fragment),
            length: sourced(decl.length, fragment),
            precision: sourced(decl.precision, fragment),
            scale: sourced(decl.scale, fragment),
        }
    }

    fn merge(
        &mut self,
        decl: DomainDecl,
        fragment: FragmentId,
        registry: &DesignRegistry,
    ) -> ConvertResult<()> {
        let ctx = MergeContext {
            id: &decl.id,
            fragment,
            registry,
        };
        ctx.merge(&mut self.name, decl.name, "name")?;
        ctx.merge(&mut self.logical_type, decl.logical_type, "type")?;
        ctx.merge(&mut self.length, decl.length, "length")?;
        ctx.merge(&mut self.precision, decl.precision, "precision")?;
        ctx.merge(&mut self.scale, decl.scale, "scale")
    }
}

impl RelationshipEntry {
    fn from_decl(decl: RelationshipDecl, fragment: FragmentId) -> Self {
        Self {
            id: decl.id,
            declared_in: fragment,
            name: sourced(decl.name, fragment),
            parent: sourced(decl.parent, fragment),
            child: sourced(decl.child, fragment),
            cardinality: sourced(decl.cardinality, fragment),
            pairs: sourced(decl.pairs, fragment),
        }
    }

    fn merge(
        &mut self,
        decl: RelationshipDecl,
        fragment: FragmentId,
        registry: &DesignRegistry,
    ) -> ConvertResult<()> {
        let ctx = MergeContext {
            id: &decl.id,
            fragment,
            registry,
        };
        ctx.merge(&mut self.name, decl.name, "name")?;
        ctx.merge(&mut self.parent, decl.parent, "parent")?;
        ctx.merge(&mut self.child, decl.child, "child")?;
        ctx.merge(&mut self.cardinality, decl.cardinality, "cardinality")?;
        ctx.merge(&mut self.pairs, decl.pairs, "column pairs")
    }
}
