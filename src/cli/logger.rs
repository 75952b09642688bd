// ログ初期化
//
// バイナリからのみ呼び出されます。ライブラリ側は tracing マクロを使うだけです。

use crate::core::naming::{DEFAULT_LOG_FILTER, VERBOSE_LOG_FILTER};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// ログフィルターを決定
///
/// `RUST_LOG` が設定されていればそれを優先します。
pub fn filter_for(verbose: bool) -> EnvFilter {
    let default = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// 標準エラー出力へのロガーを初期化
///
/// 標準出力はドライランの出力用に空けておきます。
pub fn init(verbose: bool) {
    // 二重初期化は無視
    let _ = tracing_subscriber::registry()
        .with(filter_for(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
