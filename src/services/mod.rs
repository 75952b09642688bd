// Services Layer
// ドメインロジックを実行するサービス層

pub mod config_loader;
pub mod dto;
pub mod model_loader;
pub mod model_serializer;
