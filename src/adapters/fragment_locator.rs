// フラグメントロケーター
//
// ルートパス配下のフラグメントファイルを再帰的に探索します。

use crate::core::error::{ConvertError, ConvertResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// フラグメントロケーター
#[derive(Debug, Clone)]
pub struct FragmentLocator {
    /// 小文字・先頭ドットなしの拡張子
    extensions: Vec<String>,
}

impl FragmentLocator {
    /// 認識する拡張子を指定してロケーターを作成
    ///
    /// 拡張子は大文字小文字を区別せず、先頭のドットは無視されます。
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// フラグメントファイルを探索
    ///
    /// # Arguments
    ///
    /// * `root` - ルートパス（ファイルまたはディレクトリ）
    ///
    /// # Returns
    ///
    /// 完全パスで辞書順にソートされた絶対パスのリスト。
    /// ルートがファイルの場合はそのファイルのみを返します。
    ///
    /// # Errors
    ///
    /// - ルートが存在しない場合（NotFound）
    /// - ディレクトリを読み込めない場合（Io）
    pub fn locate(&self, root: &Path) -> ConvertResult<Vec<PathBuf>> {
        if !root.exists() {
            return Err(ConvertError::not_found(root));
        }

        let root = root
            .canonicalize()
            .map_err(|e| ConvertError::io(root, &e))?;

        if root.is_file() {
            return Ok(vec![root]);
        }

        let mut fragments = Vec::new();
        self.scan_directory(&root, &mut fragments)?;

        // 完全パスでソート（順序の一貫性を保証）
        fragments.sort();

        debug!(
            root = %root.display(),
            fragments = fragments.len(),
            "Located fragment files"
        );

        Ok(fragments)
    }

    fn scan_directory(&self, dir: &Path, fragments: &mut Vec<PathBuf>) -> ConvertResult<()> {
        let entries = fs::read_dir(dir).map_err(|e| ConvertError::io(dir, &e))?;

        for entry in entries {
            let entry = entry.map_err(|e| ConvertError::io(dir, &e))?;
            let path = entry.path();

            // 隠しエントリはスキップ
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            // file_type はシンボリックリンクを辿らない
            let file_type = entry.file_type().map_err(|e| ConvertError::io(&path, &e))?;

            if file_type.is_dir() {
                self.scan_directory(&path, fragments)?;
            } else if file_type.is_symlink() && path.is_dir() {
                // ディレクトリへのリンクは循環しうるので辿らない
                debug!(path = %path.display(), "Skipping symlinked directory");
            } else if path.is_file() && self.matches_extension(&path) {
                fragments.push(path);
            }
        }

        Ok(())
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }
}
