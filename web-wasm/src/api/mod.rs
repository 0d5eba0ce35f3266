//! 推論バックエンドとの通信

pub mod backend;
pub mod socket;

use smear_vision_common::{ApiEndpoints, DEFAULT_API_BASE};

/// ビルド時の `SMEAR_API_BASE`、未指定ならローカル
pub fn api_base() -> &'static str {
    option_env!("SMEAR_API_BASE").unwrap_or(DEFAULT_API_BASE)
}

pub fn endpoints() -> Result<ApiEndpoints, String> {
    ApiEndpoints::new(api_base()).map_err(|e| e.to_string())
}
