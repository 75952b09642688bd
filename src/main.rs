use anyhow::Result;
use clap::Parser;
use colored::control as color_control;
use dmdgen::cli::commands::convert::{ConvertCommand, ConvertCommandHandler};
use dmdgen::cli::{logger, Cli, MANUAL};
use dmdgen::core::config::RunConfig;
use dmdgen::core::naming::CONFIG_FILE;
use dmdgen::services::config_loader::ConfigLoader;
use std::env;
use std::path::PathBuf;
use std::process;

/// 必須パラメータの検証エラー時の終了コード
const EXIT_USAGE: i32 = 2;

fn main() {
    // CLIをパース（使用方法エラーはclapが終了コード2で終了する）
    let cli = Cli::parse();

    if cli.man {
        print!("{}", MANUAL);
        return;
    }

    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    let config = build_config(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    });

    logger::init(config.verbose);

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        process::exit(EXIT_USAGE);
    }

    let dry_run = config.dry_run;
    let handler = ConvertCommandHandler::new();
    match handler.execute(&ConvertCommand { config }) {
        Ok(output) => {
            if !output.is_empty() {
                // ドライランでは標準出力を生成物のために空けておく
                if dry_run {
                    eprint!("{}", output);
                } else {
                    print!("{}", output);
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// 設定ファイルとフラグから実行設定を組み立てる
///
/// 優先順位: フラグ > 設定ファイル > 既定値
fn build_config(cli: &Cli) -> Result<RunConfig> {
    let project_path = env::current_dir()?;

    // --config フラグの処理（絶対パスに変換）
    let config_path: Option<PathBuf> = match &cli.config {
        Some(p) if p.is_absolute() => Some(p.clone()),
        Some(p) => Some(project_path.join(p)),
        None => Some(project_path.join(CONFIG_FILE)).filter(|p| p.is_file()),
    };

    let base = match config_path {
        Some(path) => ConfigLoader::from_file(&path)?,
        None => RunConfig::default(),
    };

    Ok(cli.apply_to(base, &project_path))
}
