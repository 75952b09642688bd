// convertコマンドハンドラー
//
// フラグメントの探索からDDL・JSONの出力までを実行します。
// - フラグメントの探索と2パスの読み込み
// - SQLとJSONをそれぞれ独立に生成（片方の失敗はもう片方を止めない）
// - すべて生成し終えてから書き込み
// - 実行結果のサマリー表示

use crate::adapters::fragment_locator::FragmentLocator;
use crate::adapters::output_writer::{FileOutputWriter, OutputWriter, StdoutOutputWriter};
use crate::adapters::sql_generator::DdlGenerator;
use crate::adapters::type_mapping::TypeMappingLoader;
use crate::core::config::{ConfigError, RunConfig};
use crate::core::model::Model;
use crate::services::model_loader::FragmentSet;
use crate::services::model_serializer::ModelSerializer;
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// convertコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ConvertCommand {
    /// 検証済みの実行設定
    pub config: RunConfig,
}

/// 生成済みの出力（書き込み前）
#[derive(Debug)]
struct PendingOutput {
    kind: &'static str,
    target: PathBuf,
    contents: String,
}

/// convertコマンドハンドラー
#[derive(Debug, Clone)]
pub struct ConvertCommandHandler {}

impl ConvertCommandHandler {
    /// 新しいConvertCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// convertコマンドを実行
    ///
    /// ドライランでは標準出力に、それ以外はファイルに書き込みます。
    ///
    /// # Returns
    ///
    /// 成功時は実行結果のサマリー、いずれかの出力が失敗した場合はすべての失敗をまとめたエラー
    pub fn execute(&self, command: &ConvertCommand) -> Result<String> {
        if command.config.dry_run {
            self.execute_with_writer(command, &StdoutOutputWriter::new())
        } else {
            self.execute_with_writer(command, &FileOutputWriter::new())
        }
    }

    /// 出力ライターを指定してconvertコマンドを実行
    pub fn execute_with_writer(
        &self,
        command: &ConvertCommand,
        writer: &dyn OutputWriter,
    ) -> Result<String> {
        let config = &command.config;
        let root = config
            .model
            .as_deref()
            .ok_or_else(|| anyhow!(ConfigError::MissingModelPath))?;

        let fragments = FragmentLocator::new(config.normalized_extensions().as_slice())
            .locate(root)
            .with_context(|| format!("Failed to locate fragments under {:?}", root))?;

        if fragments.is_empty() {
            warn!(root = %root.display(), "No fragment files found");
        }
        let fragment_count = fragments.len();

        let model = self
            .load_model(fragments, config.verbose)
            .with_context(|| "Failed to load schema design")?;

        info!(
            tables = model.table_count(),
            relationships = model.relationship_count(),
            "Model frozen"
        );

        // 両方の出力を生成し終えてから書き込む
        let mut failures: Vec<anyhow::Error> = Vec::new();
        let mut pending = Vec::new();
        let mut statement_count = None;

        match config.types.as_deref() {
            Some(types_path) if config.wants_sql() => {
                match self.generate_sql(types_path, &config.platform, &model) {
                    Ok(script) => {
                        statement_count = Some(model.table_count() + model.relationship_count());
                        pending.push(PendingOutput {
                            kind: "SQL",
                            target: self.target_for(config.sql_output.as_deref(), "schema.sql"),
                            contents: script,
                        });
                    }
                    Err(e) => failures.push(e.context("SQL generation failed")),
                }
            }
            _ if config.sql_skipped() => {
                warn!("No types file given; SQL generation skipped");
            }
            _ => {}
        }

        if config.wants_json() {
            match ModelSerializer::new().serialize_to_string(&model) {
                Ok(json) => pending.push(PendingOutput {
                    kind: "JSON",
                    target: self.target_for(config.json_output.as_deref(), "schema.json"),
                    contents: json,
                }),
                Err(e) => failures.push(anyhow!(e).context("JSON serialization failed")),
            }
        }

        let mut written = Vec::new();
        for output in pending {
            match writer.write(&output.target, &output.contents) {
                Ok(()) => {
                    info!(kind = output.kind, path = %output.target.display(), "Output written");
                    written.push(output);
                }
                Err(e) => failures.push(anyhow!(e).context(format!("{} output failed", output.kind))),
            }
        }

        if !failures.is_empty() {
            return Err(self.combine_failures(failures));
        }

        Ok(self.format_summary(
            fragment_count,
            &model,
            statement_count,
            &written,
            config.sql_skipped(),
            config.dry_run,
        ))
    }

    /// フラグメントを読み込み、凍結済みモデルを構築
    fn load_model(&self, fragments: Vec<PathBuf>, verbose: bool) -> Result<Model> {
        let set = FragmentSet::new(fragments);

        let progress = if verbose || !std::io::stderr().is_terminal() {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(set.len() as u64)
        };
        progress.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("=> "),
        );

        let registry = set.index_with_progress(|path| {
            if let Some(name) = path.file_name() {
                progress.set_message(name.to_string_lossy().into_owned());
            }
            progress.inc(1);
        });
        progress.finish_and_clear();

        let model = registry?.resolve()?.freeze()?;
        Ok(model)
    }

    /// DDLスクリプトを生成
    fn generate_sql(&self, types_path: &Path, platform: &str, model: &Model) -> Result<String> {
        let lookup = TypeMappingLoader::new()
            .load_file(types_path)
            .with_context(|| format!("Failed to load type lookup {:?}", types_path))?;
        let mapping = lookup.platform(platform)?;

        let script = DdlGenerator::new(mapping).generate_script(model)?;
        Ok(script)
    }

    fn target_for(&self, path: Option<&Path>, fallback: &str) -> PathBuf {
        path.map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(fallback))
    }

    /// 複数の失敗を1つのエラーにまとめる
    fn combine_failures(&self, mut failures: Vec<anyhow::Error>) -> anyhow::Error {
        if failures.len() == 1 {
            return failures.remove(0);
        }

        let details: Vec<String> = failures.iter().map(|e| format!("  - {:#}", e)).collect();
        anyhow!("{} outputs failed:\n{}", failures.len(), details.join("\n"))
    }

    /// 実行結果のサマリーをフォーマット
    fn format_summary(
        &self,
        fragment_count: usize,
        model: &Model,
        statement_count: Option<usize>,
        written: &[PendingOutput],
        sql_skipped: bool,
        dry_run: bool,
    ) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n", "=== Conversion Summary ===".bold()));
        output.push_str(&format!("Fragments: {}\n", fragment_count));
        output.push_str(&format!("Tables: {}\n", model.table_count()));
        output.push_str(&format!("Columns: {}\n", model.column_count()));
        output.push_str(&format!("Relationships: {}\n", model.relationship_count()));
        if let Some(count) = statement_count {
            output.push_str(&format!("Statements: {}\n", count));
        }

        output.push('\n');
        for item in written {
            let action = if dry_run { "printed" } else { "written to" };
            output.push_str(&format!(
                "{} {} {} {}\n",
                "✓".green(),
                item.kind,
                action,
                item.target.display()
            ));
        }
        if sql_skipped {
            output.push_str(&format!("{} SQL skipped (no types file)\n", "!".yellow()));
        }

        output
    }
}

impl Default for ConvertCommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ConvertError;
    use crate::core::model::Table;

    #[test]
    fn test_combine_single_failure_keeps_message() {
        let handler = ConvertCommandHandler::new();
        let error = handler.combine_failures(vec![anyhow!("boom")]);
        assert_eq!(format!("{:#}", error), "boom");
    }

    #[test]
    fn test_combine_multiple_failures_lists_all() {
        let handler = ConvertCommandHandler::new();
        let error = handler.combine_failures(vec![
            anyhow!(ConvertError::UnknownPlatform {
                platform: "DB2".to_string(),
                available: vec![],
            }),
            anyhow!("disk full"),
        ]);

        let message = format!("{:#}", error);
        assert!(message.starts_with("2 outputs failed"));
        assert!(message.contains("DB2"));
        assert!(message.contains("disk full"));
    }

    #[test]
    fn test_summary_counts() {
        let handler = ConvertCommandHandler::new();
        let model = Model::new(vec![Table::new("A")], vec![]).unwrap();

        let summary = handler.format_summary(3, &model, Some(1), &[], false, false);

        assert!(summary.contains("Fragments: 3"));
        assert!(summary.contains("Tables: 1"));
        assert!(summary.contains("Statements: 1"));
        assert!(!summary.contains("SQL skipped"));
    }

    #[test]
    fn test_summary_reports_skipped_sql() {
        let handler = ConvertCommandHandler::new();
        let model = Model::new(vec![Table::new("A")], vec![]).unwrap();

        let summary = handler.format_summary(1, &model, None, &[], true, false);

        assert!(summary.contains("SQL skipped (no types file)"));
        assert!(!summary.contains("Statements:"));
    }
}
