// モデルローダーサービス
//
// フラグメントファイル群から正規化済みの Model を構築します。
// 状態遷移は型で表現されます:
//   FragmentSet (Unparsed) → DesignRegistry (Indexed) → ResolvedDesign (Resolved) → Model (Frozen)

mod fragment_parser;
mod registry;
mod resolver;

pub use fragment_parser::{
    parse_fragment, ColumnDecl, DesignObject, DomainDecl, RelationshipDecl, TableDecl,
};
pub use registry::DesignRegistry;
pub use resolver::ResolvedDesign;

use crate::core::error::ConvertResult;
use crate::core::model::Model;
use std::path::{Path, PathBuf};
use tracing::info;

/// 未解析のフラグメント集合（Unparsed状態）
///
/// パスは正規の順序（完全パスの辞書順）に並べ替えられ、重複は除去されます。
/// そのため入力順序に関係なく同じ Model が得られます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSet {
    paths: Vec<PathBuf>,
}

impl FragmentSet {
    /// フラグメントのパス一覧から作成
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut paths: Vec<PathBuf> = paths.into_iter().collect();
        paths.sort();
        paths.dedup();
        Self { paths }
    }

    /// 正規順序のパス一覧
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// フラグメント数
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// フラグメントが空かどうか
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// 索引付けパスを実行（Unparsed → Indexed）
    pub fn index(self) -> ConvertResult<DesignRegistry> {
        self.index_with_progress(|_| {})
    }

    /// 索引付けパスを実行し、フラグメントごとに通知を受け取る
    pub fn index_with_progress(
        self,
        mut on_indexed: impl FnMut(&Path),
    ) -> ConvertResult<DesignRegistry> {
        let mut registry = DesignRegistry::new();
        for path in &self.paths {
            registry.index_fragment(path)?;
            on_indexed(path);
        }
        Ok(registry)
    }
}

/// モデルローダーサービス
#[derive(Debug, Clone, Default)]
pub struct ModelLoader;

impl ModelLoader {
    /// 新しいModelLoaderを作成
    pub fn new() -> Self {
        Self
    }

    /// フラグメントファイル群を読み込み、凍結済みの Model を返す
    ///
    /// # Arguments
    ///
    /// * `paths` - フラグメントファイルのパス（順序は問わない）
    ///
    /// # Errors
    ///
    /// - フラグメントの読み込み・解析に失敗した場合
    /// - 同じ設計IDに矛盾する定義がある場合
    /// - 存在しない設計IDへの参照がある場合
    pub fn load(&self, paths: &[PathBuf]) -> ConvertResult<Model> {
        let fragments = FragmentSet::new(paths.iter().cloned());
        let fragment_count = fragments.len();

        let registry = fragments.index()?;
        let model = registry.resolve()?.freeze()?;

        info!(
            fragments = fragment_count,
            tables = model.table_count(),
            relationships = model.relationship_count(),
            "Loaded model"
        );

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_set_canonical_order() {
        let set = FragmentSet::new(vec![
            PathBuf::from("/d/b.xml"),
            PathBuf::from("/d/a/z.xml"),
            PathBuf::from("/d/b.xml"),
        ]);

        assert_eq!(
            set.paths(),
            &[PathBuf::from("/d/a/z.xml"), PathBuf::from("/d/b.xml")]
        );
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_empty_fragment_set_yields_empty_model() {
        let model = ModelLoader::new().load(&[]).unwrap();
        assert_eq!(model.table_count(), 0);
    }
}
