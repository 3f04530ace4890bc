//! 推論エンドポイント呼び出し
//!
//! `POST {endpoint}/predict` にエンコード済み画像2枚をJSONで送信し、
//! バイナリ画像のレスポンスを表示用のデータURLへ包み直す。
//! リトライ・バックオフは行わない（1回のユーザー操作につき1リクエスト）。

use crate::config::EndpointStore;
use crate::error::{Result, VtonError};
use crate::image::{detect_mime, to_data_url};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Serialize)]
struct PredictRequest<'a> {
    image1: &'a str,
    image2: &'a str,
}

pub struct PredictionClient {
    http: reqwest::Client,
    store: Arc<EndpointStore>,
}

impl PredictionClient {
    pub fn new(store: Arc<EndpointStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| VtonError::Network(format!("HTTPクライアントの初期化に失敗: {}", e)))?;
        Ok(Self { http, store })
    }

    /// リモート画像の取得にも使う共有HTTPクライアント
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// 2枚のエンコード済み画像を送信し、合成結果をデータURLで返す
    ///
    /// エンドポイントが読み込み中の場合は送信せずに`EndpointNotReady`を
    /// 返す。非2xxレスポンスの本文は`extract_error_message`でメッセージに
    /// 変換される。
    pub async fn predict(&self, person_data_url: &str, garment_data_url: &str) -> Result<String> {
        let endpoint = self.store.endpoint()?;
        let config = self.store.config()?;
        let url = format!("{}/predict", endpoint.trim_end_matches('/'));

        let body = PredictRequest {
            image1: person_data_url,
            image2: garment_data_url,
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .send()
            .await
            .map_err(|e| VtonError::Network(e.to_string()))?;

        let status = response.status();
        let header_mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("image/"));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VtonError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(VtonError::Server {
                status: status.as_u16(),
                message: extract_error_message(&bytes),
            });
        }

        let mime = header_mime.unwrap_or_else(|| detect_mime(None, &bytes));
        Ok(to_data_url(&mime, &bytes))
    }
}

/// エラー本文からメッセージを取り出す
///
/// 本文はバイナリのこともあるため、まずテキスト化する。JSONとして解釈
/// できて message / Message フィールドを持つ場合はその値を、それ以外は
/// 本文をそのまま返す。
pub fn extract_error_message(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body).to_string();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
        for key in ["message", "Message"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }

    text
}
