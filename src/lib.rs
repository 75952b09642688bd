// dmdgenライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（引数の受付、ログ初期化、変換コマンド）
// - core: コアドメイン（モデル、エラー、設定）
// - adapters: XML・型マッピング・SQL生成・出力先へのアクセスを抽象化
// - services: フラグメントの読み込みとモデルのシリアライズ

pub mod cli;
pub mod core;
pub mod adapters;
pub mod services;
