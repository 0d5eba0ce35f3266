//! 単発解析API（multipart/form-data）

use serde::de::DeserializeOwned;
use smear_vision_common::api::{FIELD_CONFIDENCE, FIELD_IMAGE};
use smear_vision_common::types::BackendReply;
use smear_vision_common::{CategorizeResponse, DetectResponse};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FormData, Request, RequestInit, RequestMode, Response};

fn js_error(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn image_form(file: &File) -> Result<FormData, String> {
    let form = FormData::new().map_err(js_error)?;
    form.append_with_blob_and_filename(FIELD_IMAGE, file, &file.name())
        .map_err(js_error)?;
    Ok(form)
}

/// POSTして `success: false` をエラー文言に変換する
async fn post_form<T>(url: &str, form: &FormData) -> Result<T, String>
where
    T: DeserializeOwned + BackendReply,
{
    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::Cors);
    opts.set_body(form.as_ref());

    let request = Request::new_with_str_and_init(url, &opts).map_err(js_error)?;
    let window = web_sys::window().ok_or("window がありません")?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| format!("バックエンドに接続できません: {}", js_error(e)))?;
    let resp: Response = resp_value.dyn_into().map_err(js_error)?;
    let status = resp.status();

    let json = match resp.json() {
        Ok(promise) => JsFuture::from(promise).await.ok(),
        Err(_) => None,
    };
    let Some(json) = json else {
        return Err(format!("API error: {}", status));
    };
    let reply: T = serde_wasm_bindgen::from_value(json).map_err(|e| {
        if resp.ok() {
            format!("応答を解析できません: {}", e)
        } else {
            format!("API error: {}", status)
        }
    })?;

    reply.into_result().map_err(|e| match e {
        smear_vision_common::Error::Backend(message) => message,
        other => other.to_string(),
    })
}

/// 物体検出
pub async fn detect(file: &File, confidence: f64) -> Result<DetectResponse, String> {
    let url = super::endpoints()?.detect_url().map_err(|e| e.to_string())?;
    let form = image_form(file)?;
    form.append_with_str(FIELD_CONFIDENCE, &confidence.to_string())
        .map_err(js_error)?;
    post_form(&url, &form).await
}

/// セグメンテーション（分類）
pub async fn categorize(file: &File) -> Result<CategorizeResponse, String> {
    let url = super::endpoints()?.categorize_url().map_err(|e| e.to_string())?;
    let form = image_form(file)?;
    post_form(&url, &form).await
}
