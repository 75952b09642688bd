// 型マッピング
//
// 型ルックアップ文書を読み込み、プラットフォームごとに
// 論理型名 → ネイティブ型テンプレート の対応を提供します。

use crate::adapters::xml_source::{child_elements, parse_document, XmlSource};
use crate::core::error::{ConvertError, ConvertResult};
use crate::core::model::Column;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// `{length}` `{precision}` `{scale}` プレースホルダー
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\{(length|precision|scale)\}").expect("valid regex"));

/// プレースホルダーを含みうる括弧付き引数リスト
static ARGUMENT_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]*)\)").expect("valid regex"));

/// 1つのプラットフォームの型マッピング
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    platform: String,
    /// 小文字化した論理型名 → テンプレート
    templates: BTreeMap<String, TemplateEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TemplateEntry {
    template: String,
    source: PathBuf,
}

impl TypeMapping {
    /// 空の型マッピングを作成
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            templates: BTreeMap::new(),
        }
    }

    /// テンプレートを追加した型マッピングを返す
    pub fn with_type(mut self, logical_type: &str, template: impl Into<String>) -> Self {
        self.templates.insert(
            logical_type.to_lowercase(),
            TemplateEntry {
                template: template.into(),
                source: PathBuf::new(),
            },
        );
        self
    }

    /// プラットフォーム名
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// 登録されている論理型の数
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// 論理型が1つも登録されていないかどうか
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// 論理型名（大文字小文字を区別しない）に対応するテンプレートを取得
    pub fn template_for(&self, logical_type: &str) -> Option<&str> {
        self.templates
            .get(&logical_type.to_lowercase())
            .map(|e| e.template.as_str())
    }

    /// カラムのネイティブ型を描画
    ///
    /// 論理型にマッピングがない場合は None を返します。
    pub fn native_type_for(&self, column: &Column) -> Option<String> {
        self.template_for(&column.logical_type)
            .map(|template| render_template(template, column))
    }

    fn insert(&mut self, logical_type: &str, template: String, source: &Path) -> ConvertResult<()> {
        let key = logical_type.to_lowercase();
        match self.templates.get(&key) {
            Some(existing) if existing.template != template => {
                Err(ConvertError::ConflictingDefinition {
                    id: format!("{}/{}", self.platform, logical_type),
                    attribute: "native".to_string(),
                    first: existing.source.clone(),
                    second: source.to_path_buf(),
                })
            }
            Some(_) => Ok(()),
            None => {
                self.templates.insert(
                    key,
                    TemplateEntry {
                        template,
                        source: source.to_path_buf(),
                    },
                );
                Ok(())
            }
        }
    }
}

/// テンプレートにカラムのパラメータを埋め込む
///
/// 値のないプレースホルダーはその区切りのカンマごと除去し、
/// 空になった括弧付き引数リストは括弧ごと除去します。
pub fn render_template(template: &str, column: &Column) -> String {
    let value_of = |name: &str| -> Option<u32> {
        match name.to_ascii_lowercase().as_str() {
            "length" => column.length,
            "precision" => column.precision,
            "scale" => column.scale,
            _ => None,
        }
    };

    let with_arguments = ARGUMENT_LIST.replace_all(template, |caps: &regex::Captures| {
        let inner = &caps[1];
        if !PLACEHOLDER.is_match(inner) {
            return caps[0].to_string();
        }

        let kept: Vec<String> = inner
            .split(',')
            .filter_map(|part| {
                let mut complete = true;
                let rendered = PLACEHOLDER.replace_all(part, |p: &regex::Captures| {
                    match value_of(&p[1]) {
                        Some(value) => value.to_string(),
                        None => {
                            complete = false;
                            String::new()
                        }
                    }
                });
                let rendered = rendered.into_owned();
                complete.then_some(rendered)
            })
            .collect();

        if kept.is_empty() {
            String::new()
        } else {
            format!("({})", kept.join(","))
        }
    });

    let rendered = PLACEHOLDER.replace_all(&with_arguments, |p: &regex::Captures| {
        value_of(&p[1]).map(|v| v.to_string()).unwrap_or_default()
    });

    rendered.trim().to_string()
}

/// 型ルックアップ文書（全プラットフォーム）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeLookup {
    platforms: Vec<TypeMapping>,
}

impl TypeLookup {
    /// 空のルックアップを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 型マッピングを追加（同名プラットフォームがあればマージ）
    pub fn add_platform(&mut self, mapping: TypeMapping) -> ConvertResult<()> {
        let Some(existing) = self.find_mut(&mapping.platform) else {
            self.platforms.push(mapping);
            return Ok(());
        };

        for (logical_type, entry) in mapping.templates {
            existing.insert(&logical_type, entry.template, &entry.source)?;
        }
        Ok(())
    }

    /// プラットフォーム名（大文字小文字を区別しない完全一致）で型マッピングを取得
    ///
    /// 既定のプラットフォームへの暗黙の置き換えは行いません。
    pub fn platform(&self, name: &str) -> ConvertResult<&TypeMapping> {
        self.platforms
            .iter()
            .find(|p| p.platform.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| ConvertError::UnknownPlatform {
                platform: name.to_string(),
                available: self.platform_names(),
            })
    }

    /// 文書に含まれるプラットフォーム名（宣言順）
    pub fn platform_names(&self) -> Vec<String> {
        self.platforms.iter().map(|p| p.platform.clone()).collect()
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut TypeMapping> {
        self.platforms
            .iter_mut()
            .find(|p| p.platform.eq_ignore_ascii_case(name))
    }
}

/// 型ルックアップ文書ローダー
#[derive(Debug, Clone, Default)]
pub struct TypeMappingLoader;

impl TypeMappingLoader {
    /// 新しいTypeMappingLoaderを作成
    pub fn new() -> Self {
        Self
    }

    /// ファイルから型ルックアップ文書を読み込む
    ///
    /// # Errors
    ///
    /// - ファイルが存在しない場合（NotFound）
    /// - XMLが不正、または必須属性が欠けている場合（FragmentParseError）
    /// - 同じ論理型に異なるテンプレートが宣言された場合（ConflictingDefinition）
    pub fn load_file(&self, path: &Path) -> ConvertResult<TypeLookup> {
        let text = fs::read_to_string(path).map_err(|e| ConvertError::io(path, &e))?;
        self.parse_str(path, &text)
    }

    /// テキストから型ルックアップ文書をパース
    pub fn parse_str(&self, path: &Path, text: &str) -> ConvertResult<TypeLookup> {
        let doc = parse_document(path, text)?;
        let source = XmlSource::new(path, &doc);
        let mut lookup = TypeLookup::new();

        for platform_node in child_elements(doc.root_element()).filter(|n| n.has_tag_name("Platform")) {
            let mut mapping = TypeMapping::new(source.required_attr(platform_node, "name")?);

            for type_node in child_elements(platform_node).filter(|n| n.has_tag_name("Type")) {
                let logical = source.required_attr(type_node, "logical")?;
                let native = source.required_attr(type_node, "native")?;
                mapping.insert(&logical, native, path)?;
            }

            debug!(
                platform = mapping.platform(),
                types = mapping.len(),
                "Loaded platform type mapping"
            );
            lookup.add_platform(mapping)?;
        }

        Ok(lookup)
    }
}
