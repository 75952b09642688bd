// フラグメントパーサー
//
// 1つのフラグメントファイルを、参照を生IDのまま保持した設計オブジェクトに変換します。
// 他のフラグメントの内容には一切依存しません。

use crate::adapters::xml_source::{child_elements, parse_document, XmlSource};
use crate::core::error::ConvertResult;
use crate::core::model::Cardinality;
use roxmltree::Node;
use std::path::Path;

/// テーブル宣言
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDecl {
    pub id: String,
    pub name: Option<String>,
    pub schema: Option<String>,
    pub comment: Option<String>,
    /// 主キーを構成するカラムの設計ID
    pub primary_key: Option<Vec<String>>,
}

/// カラム宣言
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDecl {
    pub id: String,
    /// 所属テーブルの設計ID
    pub table: Option<String>,
    pub name: Option<String>,
    pub logical_type: Option<String>,
    /// ドメインの設計ID
    pub domain: Option<String>,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub nullable: Option<bool>,
    pub default_value: Option<String>,
    pub position: Option<u32>,
    pub comment: Option<String>,
}

/// ドメイン（型エイリアス）宣言
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainDecl {
    pub id: String,
    pub name: Option<String>,
    pub logical_type: Option<String>,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

/// リレーションシップ宣言
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipDecl {
    pub id: String,
    pub name: Option<String>,
    /// 親テーブルの設計ID
    pub parent: Option<String>,
    /// 子テーブルの設計ID
    pub child: Option<String>,
    pub cardinality: Option<Cardinality>,
    /// (子カラムID, 親カラムID) の組
    pub pairs: Option<Vec<(String, String)>>,
}

/// フラグメント内の設計オブジェクト
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesignObject {
    Table(TableDecl),
    Column(ColumnDecl),
    Domain(DomainDecl),
    Relationship(RelationshipDecl),
}

impl DesignObject {
    /// 設計ID
    pub fn id(&self) -> &str {
        match self {
            DesignObject::Table(t) => &t.id,
            DesignObject::Column(c) => &c.id,
            DesignObject::Domain(d) => &d.id,
            DesignObject::Relationship(r) => &r.id,
        }
    }
}

/// フラグメントテキストを設計オブジェクトの列にパース
///
/// ルート要素自体が設計オブジェクトであるか、任意のコンテナ要素の子として
/// 設計オブジェクトが並んでいる形式を受け付けます。未知の要素は無視します。
///
/// # Errors
///
/// - マークアップが不正な場合
/// - 属性値が解釈できない場合（数値・真偽値・カーディナリティ）
/// - 必須の `id` 属性がない場合
pub fn parse_fragment(path: &Path, text: &str) -> ConvertResult<Vec<DesignObject>> {
    let doc = parse_document(path, text)?;
    let source = XmlSource::new(path, &doc);
    let root = doc.root_element();

    let mut objects = Vec::new();
    if is_design_object(root) {
        parse_object(&source, root, &mut objects)?;
    } else {
        for node in child_elements(root) {
            if is_design_object(node) {
                parse_object(&source, node, &mut objects)?;
            }
        }
    }

    Ok(objects)
}

fn is_design_object(node: Node<'_, '_>) -> bool {
    matches!(
        node.tag_name().name(),
        "Table" | "Column" | "Domain" | "Relationship" | "ForeignKey"
    )
}

fn parse_object(
    source: &XmlSource<'_, '_>,
    node: Node<'_, '_>,
    objects: &mut Vec<DesignObject>,
) -> ConvertResult<()> {
    match node.tag_name().name() {
        "Table" => parse_table(source, node, objects),
        "Column" => {
            let column = parse_column(source, node, None)?;
            objects.push(DesignObject::Column(column));
            Ok(())
        }
        "Domain" => {
            objects.push(DesignObject::Domain(parse_domain(source, node)?));
            Ok(())
        }
        _ => {
            objects.push(DesignObject::Relationship(parse_relationship(source, node)?));
            Ok(())
        }
    }
}

fn parse_table(
    source: &XmlSource<'_, '_>,
    node: Node<'_, '_>,
    objects: &mut Vec<DesignObject>,
) -> ConvertResult<()> {
    let id = source.required_attr(node, "id")?;

    let mut primary_key = None;
    let mut columns = Vec::new();

    for child in child_elements(node) {
        match child.tag_name().name() {
            "Columns" => {
                for column_node in child_elements(child).filter(|n| n.has_tag_name("Column")) {
                    columns.push(parse_column(source, column_node, Some(&id))?);
                }
            }
            // <Columns> を省略して直接並べる書き方も許容
            "Column" => columns.push(parse_column(source, child, Some(&id))?),
            "PrimaryKey" => {
                let refs = child_elements(child)
                    .filter(|n| n.has_tag_name("ColumnRef"))
                    .map(|n| source.required_attr(n, "ref"))
                    .collect::<ConvertResult<Vec<_>>>()?;
                primary_key = Some(refs);
            }
            _ => {}
        }
    }

    objects.push(DesignObject::Table(TableDecl {
        id,
        name: source.attr(node, "name"),
        schema: source.attr(node, "schema"),
        comment: source
            .attr(node, "comment")
            .or_else(|| source.child_text(node, "Comment")),
        primary_key,
    }));
    objects.extend(columns.into_iter().map(DesignObject::Column));

    Ok(())
}

fn parse_column(
    source: &XmlSource<'_, '_>,
    node: Node<'_, '_>,
    enclosing_table: Option<&str>,
) -> ConvertResult<ColumnDecl> {
    let id = source.required_attr(node, "id")?;
    let declared_table = source.attr(node, "table");

    let table = match (enclosing_table, declared_table) {
        (Some(enclosing), Some(declared)) if enclosing != declared => {
            return Err(source.error_at(
                node,
                format!(
                    "column '{}' declares table '{}' but is nested in table '{}'",
                    id, declared, enclosing
                ),
            ));
        }
        (Some(enclosing), _) => Some(enclosing.to_string()),
        (None, declared) => declared,
    };

    Ok(ColumnDecl {
        table,
        name: source.attr(node, "name"),
        logical_type: source.attr(node, "type"),
        domain: source.attr(node, "domain"),
        length: source.attr_u32(node, "length")?,
        precision: source.attr_u32(node, "precision")?,
        scale: source.attr_u32(node, "scale")?,
        nullable: source.attr_bool(node, "nullable")?,
        default_value: source.attr(node, "default"),
        position: source.attr_u32(node, "position")?,
        comment: source
            .attr(node, "comment")
            .or_else(|| source.child_text(node, "Comment")),
        id,
    })
}

fn parse_domain(source: &XmlSource<'_, '_>, node: Node<'_, '_>) -> ConvertResult<DomainDecl> {
    Ok(DomainDecl {
        id: source.required_attr(node, "id")?,
        name: source.attr(node, "name"),
        logical_type: source.attr(node, "type"),
        length: source.attr_u32(node, "length")?,
        precision: source.attr_u32(node, "precision")?,
        scale: source.attr_u32(node, "scale")?,
    })
}

fn parse_relationship(
    source: &XmlSource<'_, '_>,
    node: Node<'_, '_>,
) -> ConvertResult<RelationshipDecl> {
    let id = source.required_attr(node, "id")?;

    let cardinality = match source.attr(node, "cardinality") {
        None => None,
        Some(value) => Some(Cardinality::parse(&value).ok_or_else(|| {
            source.error_at(node, format!("unknown cardinality '{}'", value))
        })?),
    };

    let pair_nodes: Vec<_> = child_elements(node)
        .filter(|n| n.has_tag_name("ColumnPair"))
        .collect();
    let pairs = if pair_nodes.is_empty() {
        None
    } else {
        let pairs = pair_nodes
            .into_iter()
            .map(|n| -> ConvertResult<(String, String)> {
                Ok((
                    source.required_attr(n, "child")?,
                    source.required_attr(n, "parent")?,
                ))
            })
            .collect::<ConvertResult<Vec<_>>>()?;
        Some(pairs)
    };

    Ok(RelationshipDecl {
        id,
        name: source.attr(node, "name"),
        parent: source.attr(node, "parent"),
        child: source.attr(node, "child"),
        cardinality,
        pairs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ConvertResult<Vec<DesignObject>> {
        parse_fragment(Path::new("fragment.xml"), text)
    }

    #[test]
    fn test_parse_table_with_nested_columns() {
        let objects = parse(
            r#"
<Table id="T_1" name="A" schema="app">
  <Comment>accounts</Comment>
  <Columns>
    <Column id="C_1" name="id" type="integer" position="1" nullable="false"/>
    <Column id="C_2" name="name" type="varchar" length="50" position="2"/>
  </Columns>
  <PrimaryKey><ColumnRef ref="C_1"/></PrimaryKey>
</Table>"#,
        )
        .unwrap();

        assert_eq!(objects.len(), 3);
        match &objects[0] {
            DesignObject::Table(table) => {
                assert_eq!(table.id, "T_1");
                assert_eq!(table.name.as_deref(), Some("A"));
                assert_eq!(table.schema.as_deref(), Some("app"));
                assert_eq!(table.comment.as_deref(), Some("accounts"));
                assert_eq!(table.primary_key, Some(vec!["C_1".to_string()]));
            }
            other => panic!("expected table, got {other:?}"),
        }
        match &objects[2] {
            DesignObject::Column(column) => {
                assert_eq!(column.table.as_deref(), Some("T_1"));
                assert_eq!(column.length, Some(50));
                assert_eq!(column.nullable, None);
            }
            other => panic!("expected column, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_container_with_mixed_objects() {
        let objects = parse(
            r#"
<Design>
  <Domain id="D_1" name="Money" type="decimal" precision="10" scale="2"/>
  <Column id="C_9" table="T_1" name="total" domain="D_1"/>
  <Notes>ignored</Notes>
  <ForeignKey id="R_1" parent="T_1" child="T_2" cardinality="1:1">
    <ColumnPair child="C_4" parent="C_1"/>
  </ForeignKey>
</Design>"#,
        )
        .unwrap();

        let ids: Vec<&str> = objects.iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec!["D_1", "C_9", "R_1"]);

        match &objects[2] {
            DesignObject::Relationship(r) => {
                assert_eq!(r.cardinality, Some(Cardinality::OneToOne));
                assert_eq!(
                    r.pairs,
                    Some(vec![("C_4".to_string(), "C_1".to_string())])
                );
            }
            other => panic!("expected relationship, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_table_declaration() {
        let objects = parse(r#"<Table id="T_1"><PrimaryKey/></Table>"#).unwrap();

        assert_eq!(
            objects,
            vec![DesignObject::Table(TableDecl {
                id: "T_1".to_string(),
                primary_key: Some(vec![]),
                ..TableDecl::default()
            })]
        );
    }

    #[test]
    fn test_missing_id_is_parse_error() {
        let error = parse(r#"<Table name="A"/>"#).unwrap_err();
        assert!(error.is_fragment_parse_error());
        assert!(error.to_string().contains("'id'"));
    }

    #[test]
    fn test_nested_column_with_other_table_is_rejected() {
        let error = parse(
            r#"<Table id="T_1"><Columns><Column id="C_1" table="T_2"/></Columns></Table>"#,
        )
        .unwrap_err();
        assert!(error.is_fragment_parse_error());
    }

    #[test]
    fn test_unknown_cardinality_is_parse_error() {
        let error = parse(r#"<Relationship id="R_1" cardinality="lots"/>"#).unwrap_err();
        assert!(error.is_fragment_parse_error());
    }

    #[test]
    fn test_malformed_markup() {
        let error = parse("<Design><Table id=\"T_1\"></Design>").unwrap_err();
        assert!(error.is_fragment_parse_error());
    }
}
