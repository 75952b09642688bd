// 出力ライター
//
// 生成済みの文字列を出力先に書き込むアダプター。

use crate::core::error::{ConvertError, ConvertResult};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// 出力ライタートレイト
pub trait OutputWriter {
    /// 文字列を出力先に書き込む
    ///
    /// # Errors
    ///
    /// 書き込みに失敗した場合は WriteFailure を返します。
    fn write(&self, target: &Path, contents: &str) -> ConvertResult<()>;
}

/// ファイル出力ライター
///
/// 親ディレクトリが存在しない場合は作成します。
#[derive(Debug, Clone, Default)]
pub struct FileOutputWriter;

impl FileOutputWriter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputWriter for FileOutputWriter {
    fn write(&self, target: &Path, contents: &str) -> ConvertResult<()> {
        let failure = |e: std::io::Error| ConvertError::WriteFailure {
            path: target.to_path_buf(),
            cause: e.to_string(),
        };

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(failure)?;
        }

        fs::write(target, contents).map_err(failure)?;

        debug!(path = %target.display(), bytes = contents.len(), "Wrote output");
        Ok(())
    }
}

/// 標準出力ライター（ドライラン用）
///
/// 出力先パスは見出しとしてのみ使用し、ファイルは作成しません。
#[derive(Debug, Clone, Default)]
pub struct StdoutOutputWriter;

impl StdoutOutputWriter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputWriter for StdoutOutputWriter {
    fn write(&self, target: &Path, contents: &str) -> ConvertResult<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();

        writeln!(handle, "-- {}", target.display())
            .and_then(|_| handle.write_all(contents.as_bytes()))
            .and_then(|_| handle.flush())
            .map_err(|e| ConvertError::WriteFailure {
                path: target.to_path_buf(),
                cause: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_writer_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("out").join("nested").join("schema.sql");

        FileOutputWriter::new().write(&target, "SELECT 1;\n").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "SELECT 1;\n");
    }

    #[test]
    fn test_file_writer_reports_write_failure() {
        let temp_dir = TempDir::new().unwrap();
        // 既存ディレクトリへのファイル書き込みは失敗する
        let target = temp_dir.path().to_path_buf();

        let error = FileOutputWriter::new().write(&target, "x").unwrap_err();
        assert!(error.is_write_failure());
    }
}
