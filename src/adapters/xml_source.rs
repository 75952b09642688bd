// XML読み込みヘルパー
//
// フラグメントと型ルックアップ文書の両方から使用される共有モジュールです。
// 位置情報付きのエラー生成と属性値の解釈を提供します。

use crate::core::error::{ConvertError, ConvertResult};
use roxmltree::{Document, Node};
use std::path::Path;

/// XMLテキストをパース
///
/// 不正なマークアップはファイル名と位置を含む FragmentParseError になります。
pub fn parse_document<'input>(path: &Path, text: &'input str) -> ConvertResult<Document<'input>> {
    Document::parse(text).map_err(|e| {
        let pos = e.pos();
        ConvertError::FragmentParseError {
            fragment: path.to_path_buf(),
            line: pos.row,
            column: pos.col,
            message: e.to_string(),
        }
    })
}

/// パース済みXML文書とその出所
#[derive(Clone, Copy)]
pub struct XmlSource<'a, 'input> {
    path: &'a Path,
    doc: &'a Document<'input>,
}

impl<'a, 'input> XmlSource<'a, 'input> {
    /// 新しいXmlSourceを作成
    pub fn new(path: &'a Path, doc: &'a Document<'input>) -> Self {
        Self { path, doc }
    }

    /// 文書のパス
    pub fn path(&self) -> &'a Path {
        self.path
    }

    /// 要素の位置を指すエラーを作成
    pub fn error_at(&self, node: Node<'_, '_>, message: impl Into<String>) -> ConvertError {
        let pos = self.doc.text_pos_at(node.range().start);
        ConvertError::FragmentParseError {
            fragment: self.path.to_path_buf(),
            line: pos.row,
            column: pos.col,
            message: message.into(),
        }
    }

    /// 属性値を取得（前後の空白を除去、空文字列は未指定扱い）
    pub fn attr(&self, node: Node<'_, '_>, name: &str) -> Option<String> {
        node.attribute(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// 必須属性を取得
    pub fn required_attr(&self, node: Node<'_, '_>, name: &str) -> ConvertResult<String> {
        self.attr(node, name).ok_or_else(|| {
            self.error_at(
                node,
                format!(
                    "<{}> is missing required attribute '{}'",
                    node.tag_name().name(),
                    name
                ),
            )
        })
    }

    /// 数値属性を取得
    pub fn attr_u32(&self, node: Node<'_, '_>, name: &str) -> ConvertResult<Option<u32>> {
        match self.attr(node, name) {
            None => Ok(None),
            Some(value) => value.parse::<u32>().map(Some).map_err(|_| {
                self.error_at(
                    node,
                    format!("attribute '{}' must be a non-negative integer, got '{}'", name, value),
                )
            }),
        }
    }

    /// 真偽値属性を取得
    pub fn attr_bool(&self, node: Node<'_, '_>, name: &str) -> ConvertResult<Option<bool>> {
        match self.attr(node, name) {
            None => Ok(None),
            Some(value) => parse_bool(&value).map(Some).ok_or_else(|| {
                self.error_at(
                    node,
                    format!("attribute '{}' must be a boolean, got '{}'", name, value),
                )
            }),
        }
    }

    /// 子要素のテキストを取得
    pub fn child_text(&self, node: Node<'_, '_>, name: &str) -> Option<String> {
        child_elements(node)
            .find(|c| c.tag_name().name() == name)
            .and_then(|c| c.text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

/// 子要素のみを列挙
pub fn child_elements<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
