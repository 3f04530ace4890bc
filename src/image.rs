//! 画像参照とデータURLエンコード
//!
//! 取得元（カメラ撮影・ギャラリー選択・カタログURL）を問わず、送信前に
//! `data:<mime>;base64,` 形式の文字列へ正規化する。

use crate::error::{Result, VtonError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::{Path, PathBuf};

/// 選択中の画像の参照
///
/// ローカルファイル（撮影・選択済み）またはリモートURL（カタログ項目）。
/// 「未選択」はスロット側で`Option<ImageRef>`として表現する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Local(PathBuf),
    Remote(String),
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageRef::Local(path) => write!(f, "{}", path.display()),
            ImageRef::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// バイト列をデータURLに包む
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Data URLからBase64データ部分を抽出
///
/// # Arguments
/// * `data_url` - "data:image/jpeg;base64,/9j/4AAQ..." 形式のData URL
///
/// # Returns
/// Base64エンコードされたデータ部分、または抽出失敗時はNone
pub fn extract_base64_from_data_url(data_url: &str) -> Option<&str> {
    data_url.split(',').nth(1)
}

/// Data URLからMIMEタイプを抽出
///
/// # Arguments
/// * `data_url` - "data:image/jpeg;base64,..." 形式のData URL
///
/// # Returns
/// MIMEタイプ（例: "image/jpeg"）、抽出失敗時は"image/jpeg"をデフォルトとして返す
pub fn extract_mime_type_from_data_url(data_url: &str) -> &str {
    data_url
        .split(':')
        .nth(1)
        .and_then(|s| s.split(';').next())
        .unwrap_or("image/jpeg")
}

/// データURLを元のバイト列に戻す
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let payload = extract_base64_from_data_url(data_url)
        .ok_or_else(|| VtonError::ImageLoad("データURLの形式が不正です".into()))?;
    STANDARD
        .decode(payload)
        .map_err(|e| VtonError::ImageLoad(format!("Base64の復号に失敗: {}", e)))
}

const EXTENSION_MIME: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
];

/// MIMEタイプを判定する
///
/// 拡張子 → マジックバイト（infer） → "image/jpeg" の順で決める。
pub fn detect_mime(path: Option<&Path>, bytes: &[u8]) -> String {
    if let Some(ext) = path.and_then(|p| p.extension()) {
        let ext = ext.to_string_lossy().to_lowercase();
        if let Some((_, mime)) = EXTENSION_MIME.iter().find(|(e, _)| *e == ext) {
            return (*mime).to_string();
        }
    }

    if let Some(kind) = infer::get(bytes) {
        if kind.mime_type().starts_with("image/") {
            return kind.mime_type().to_string();
        }
    }

    "image/jpeg".to_string()
}

/// 画像参照をデータURLへエンコードする
///
/// ローカル参照はファイルのバイト列を読み込み、リモート参照は先にHTTPで
/// バイト列を取得してから同じ形式に包む。取得失敗（`Fetch`）と読み込み
/// 失敗（`ImageLoad`）は区別される。バイト列が得られた後のBase64化は
/// 失敗しない。結果はキャッシュせず、送信のたびに再エンコードする。
pub async fn encode_to_data_url(http: &reqwest::Client, image: &ImageRef) -> Result<String> {
    match image {
        ImageRef::Local(path) => {
            if !path.exists() {
                return Err(VtonError::FileNotFound(path.display().to_string()));
            }
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| VtonError::ImageLoad(format!("{}: {}", path.display(), e)))?;
            let mime = detect_mime(Some(path), &bytes);
            Ok(to_data_url(&mime, &bytes))
        }
        ImageRef::Remote(url) => {
            let response = http
                .get(url)
                .send()
                .await
                .map_err(|e| VtonError::Fetch(format!("{}: {}", url, e)))?;

            if !response.status().is_success() {
                return Err(VtonError::Fetch(format!(
                    "{}: ステータス {}",
                    url,
                    response.status().as_u16()
                )));
            }

            let header_mime = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
                .filter(|v| v.starts_with("image/"));

            let bytes = response
                .bytes()
                .await
                .map_err(|e| VtonError::Fetch(format!("{}: {}", url, e)))?;

            let mime = header_mime.unwrap_or_else(|| detect_mime(None, &bytes));
            Ok(to_data_url(&mime, &bytes))
        }
    }
}
