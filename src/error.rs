use thiserror::Error;

#[derive(Error, Debug)]
pub enum VtonError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("エンドポイントを読み込み中です。完了後に再試行してください")]
    EndpointNotReady,

    #[error("権限がありません: {0}")]
    PermissionDenied(String),

    #[error("保存エラー: {0}")]
    Storage(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("画像取得エラー: {0}")]
    Fetch(String),

    #[error("{0}")]
    Validation(String),

    #[error("通信エラー: {0}")]
    Network(String),

    // サーバー抽出済みメッセージをそのまま表示する（ステータスは保持のみ）
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VtonError>;
