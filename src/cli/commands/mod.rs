// コマンドハンドラー層

pub mod convert;
