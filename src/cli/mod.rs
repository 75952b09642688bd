// CLI Layer
// ユーザー入力の受付と実行設定の組み立て

pub mod commands;
pub mod logger;

use crate::core::config::RunConfig;
use clap::Parser;
use std::path::{Path, PathBuf};

/// `--man` で表示するマニュアル
pub const MANUAL: &str = "DMDGEN(1)

NAME
    dmdgen - convert fragmented XML schema designs into SQL DDL and JSON

SYNOPSIS
    dmdgen -m <PATH> [-t <FILE>] [-p <NAME>] [-s <FILE>] [-j <FILE>] [options]

DESCRIPTION
    dmdgen reads a schema design that a modeling tool stored as many small XML
    fragments, resolves the references between them and produces:

      * SQL DDL for one target platform (requires a type lookup document)
      * a JSON document describing the tables, columns and relationships

    All CREATE TABLE statements are emitted first, followed by one
    ALTER TABLE ... ADD FOREIGN KEY statement per relationship.

OPTIONS
    -m, --model <PATH>      Fragment root (a directory or a single file)
    -t, --types <FILE>      Type lookup document (logical -> native types);
                            without it SQL is skipped and only JSON is made
    -p, --platform <NAME>   Target platform (default: Oracle Database 21c)
    -s, --sql <FILE>        Write the SQL DDL script to FILE
    -j, --json <FILE>       Write the JSON model to FILE
    -e, --ext <EXT>         Fragment file extension, repeatable (default: xml)
    -c, --config <FILE>     YAML config file (default: ./.dmdgen.yaml if present)
        --dry-run           Print outputs to stdout instead of writing files
    -v, --verbose           Debug logging on stderr
        --no-color          Disable colored output

CONFIG FILE
    model: design/
    types: types.xml
    platform: PostgreSQL
    extensions: [xml]
    sql_output: out/schema.sql
    json_output: out/schema.json

    Command line flags override values from the config file. Relative paths in
    the config file are resolved against the directory containing it.

EXIT STATUS
    0   success
    1   conversion failure (parse, reference, type mapping or write error)
    2   invalid or missing parameters

ENVIRONMENT
    RUST_LOG    overrides the log filter
    NO_COLOR    disables colored output
";

/// dmdgen - Schema design converter
///
/// Converts a fragmented XML schema design into SQL DDL and JSON.
#[derive(Parser, Debug)]
#[command(name = "dmdgen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert fragmented XML schema designs into SQL DDL and JSON")]
#[command(long_about = "dmdgen - Schema design converter

Reads a schema design stored as XML fragments, resolves cross-file
references into a single model and renders it as:
  • SQL DDL for a target platform, using a type lookup document
  • a JSON serialization of the model

Use --man for the full manual.")]
#[command(after_help = "EXAMPLES:
  # Generate DDL and JSON
  dmdgen -m design/ -t types.xml -s out/schema.sql -j out/schema.json

  # Target PostgreSQL and preview without writing files
  dmdgen -m design/ -t types.xml -p PostgreSQL --dry-run

  # JSON only (no types file needed)
  dmdgen -m design/ -j out/schema.json")]
pub struct Cli {
    /// Fragment root path (directory or single file)
    #[arg(short, long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Type lookup document
    #[arg(short, long, value_name = "FILE")]
    pub types: Option<PathBuf>,

    /// Target platform name [default: Oracle Database 21c]
    #[arg(short, long, value_name = "NAME")]
    pub platform: Option<String>,

    /// SQL output file
    #[arg(short, long, value_name = "FILE")]
    pub sql: Option<PathBuf>,

    /// JSON output file
    #[arg(short, long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Fragment file extension (repeatable) [default: xml]
    #[arg(short = 'e', long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print outputs to stdout instead of writing files
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print the full manual and exit
    #[arg(long)]
    pub man: bool,
}

impl Cli {
    /// フラグの値を設定に上書きする
    ///
    /// 相対パスは `base`（通常はカレントディレクトリ）を基準に解決します。
    pub fn apply_to(&self, config: RunConfig, base: &Path) -> RunConfig {
        let resolve = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };

        RunConfig {
            model: self.model.as_ref().map(resolve).or(config.model),
            types: self.types.as_ref().map(resolve).or(config.types),
            platform: self.platform.clone().unwrap_or(config.platform),
            extensions: if self.extensions.is_empty() {
                config.extensions
            } else {
                self.extensions.clone()
            },
            sql_output: self.sql.as_ref().map(resolve).or(config.sql_output),
            json_output: self.json.as_ref().map(resolve).or(config.json_output),
            dry_run: self.dry_run || config.dry_run,
            verbose: self.verbose || config.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "dmdgen", "-m", "design", "-p", "PostgreSQL", "-e", "xml", "-e", "dmd",
        ])
        .unwrap();

        let config = RunConfig {
            platform: "SQLite".to_string(),
            json_output: Some(PathBuf::from("/out/model.json")),
            ..RunConfig::default()
        };
        let merged = cli.apply_to(config, Path::new("/work"));

        assert_eq!(merged.model, Some(PathBuf::from("/work/design")));
        assert_eq!(merged.platform, "PostgreSQL");
        assert_eq!(merged.extensions, vec!["xml", "dmd"]);
        assert_eq!(merged.json_output, Some(PathBuf::from("/out/model.json")));
    }

    #[test]
    fn test_config_values_kept_without_flags() {
        let cli = Cli::try_parse_from(["dmdgen"]).unwrap();
        let merged = cli.apply_to(RunConfig::default(), Path::new("/work"));

        assert_eq!(merged, RunConfig::default());
    }

    #[test]
    fn test_manual_lists_exit_codes() {
        assert!(MANUAL.contains("EXIT STATUS"));
        assert!(MANUAL.contains("--dry-run"));
    }
}
