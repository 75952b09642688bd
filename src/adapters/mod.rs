// Adapters
// ファイルシステムと外部文書へのアクセスを抽象化

pub mod fragment_locator;
pub mod output_writer;
pub mod sql_generator;
pub mod type_mapping;
pub mod xml_source;
