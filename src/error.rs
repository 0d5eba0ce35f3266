use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmearError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("画像処理エラー: {0}")]
    Image(#[from] image::ImageError),

    #[error("通信エラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("バックエンドがエラーを返しました: {0}")]
    Backend(String),

    #[error("ストリームエラー: {0}")]
    Stream(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(smear_vision_common::Error),
}

impl From<smear_vision_common::Error> for SmearError {
    fn from(err: smear_vision_common::Error) -> Self {
        match err {
            smear_vision_common::Error::Backend(message) => SmearError::Backend(message),
            other => SmearError::Common(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SmearError>;
