//! 画像取得アダプタ
//!
//! カメラ撮影・ギャラリー選択の2系統で画像を取得し、アプリ専用の
//! `images/` ディレクトリへ恒久保存してから参照を返す。カタログ項目の
//! 選択はI/O不要なので`wardrobe`側で完結する。
//!
//! デバイス（カメラ・ピッカー）は外部コラボレーターとしてトレイトで
//! 切り出し、権限拒否とユーザーキャンセルを呼び出し側で区別できるように
//! する。キャンセルはエラーではなく`None`。

use crate::error::{Result, VtonError};
use crate::image::ImageRef;
use std::path::{Path, PathBuf};

/// カメラデバイス
#[allow(async_fn_in_trait)]
pub trait CameraDevice {
    /// カメラ権限を要求する。拒否された場合はOk(false)
    async fn request_permission(&self) -> Result<bool>;

    /// 撮影し、フレームの一時ファイルパスを返す
    async fn take_picture(&self) -> Result<PathBuf>;
}

/// フォトライブラリのピッカー
#[allow(async_fn_in_trait)]
pub trait GalleryPicker {
    /// ライブラリ権限を要求する。拒否された場合はOk(false)
    async fn request_permission(&self) -> Result<bool>;

    /// 画像を選択させる。キャンセル時はNone
    async fn pick_image(&self) -> Result<Option<PathBuf>>;
}

/// 恒久保存先（アプリ専用）の既定ディレクトリ
pub fn default_images_dir() -> Result<PathBuf> {
    let data = dirs::data_dir()
        .ok_or_else(|| VtonError::Config("データディレクトリが見つかりません".into()))?;
    Ok(data.join("vton").join("images"))
}

/// エポックミリ秒によるユニークなファイル名
fn unique_file_name() -> String {
    format!("{}.jpg", chrono::Utc::now().timestamp_millis())
}

/// 一時ファイルを恒久保存ディレクトリへ取り込む
///
/// ディレクトリ作成は冪等。撮影フレームは移動、ギャラリー資産はコピー。
fn store_file(src: &Path, images_dir: &Path, move_file: bool) -> Result<PathBuf> {
    std::fs::create_dir_all(images_dir)?;
    let dest = images_dir.join(unique_file_name());

    if move_file {
        // renameはファイルシステム跨ぎで失敗することがあるため
        // コピー+削除にフォールバックする
        if std::fs::rename(src, &dest).is_err() {
            std::fs::copy(src, &dest)?;
            std::fs::remove_file(src)?;
        }
    } else {
        std::fs::copy(src, &dest)?;
    }

    Ok(dest)
}

/// カメラで撮影して恒久保存し、参照を返す
pub async fn capture_image(camera: &impl CameraDevice, images_dir: &Path) -> Result<ImageRef> {
    if !camera.request_permission().await? {
        return Err(VtonError::PermissionDenied("カメラ".into()));
    }

    let frame = camera.take_picture().await?;
    let stored = store_file(&frame, images_dir, true)
        .map_err(|e| VtonError::Storage(format!("撮影画像の保存に失敗: {}", e)))?;

    Ok(ImageRef::Local(stored))
}

/// ギャラリーから選択して恒久保存し、参照を返す
///
/// キャンセルはOk(None)で返り、エラー報告の対象にならない。
pub async fn select_image(
    picker: &impl GalleryPicker,
    images_dir: &Path,
) -> Result<Option<ImageRef>> {
    if !picker.request_permission().await? {
        return Err(VtonError::PermissionDenied("フォトライブラリ".into()));
    }

    let Some(asset) = picker.pick_image().await? else {
        return Ok(None);
    };

    let stored = store_file(&asset, images_dir, false)
        .map_err(|e| VtonError::Storage(format!("選択画像の保存に失敗: {}", e)))?;

    Ok(Some(ImageRef::Local(stored)))
}

/// ネイティブのファイルダイアログを使うピッカー
///
/// デスクトップには権限プロンプトがないため、権限要求は常に許可になる。
pub struct DialogPicker;

impl GalleryPicker for DialogPicker {
    async fn request_permission(&self) -> Result<bool> {
        Ok(true)
    }

    async fn pick_image(&self) -> Result<Option<PathBuf>> {
        let picked = rfd::AsyncFileDialog::new()
            .add_filter("画像", &["jpg", "jpeg", "png", "webp"])
            .set_title("画像を選択")
            .pick_file()
            .await;

        Ok(picked.map(|file| file.path().to_path_buf()))
    }
}

/// パス指定の非対話ピッカー（CLI引数・スクリプト用）
pub struct PathPicker(pub PathBuf);

impl GalleryPicker for PathPicker {
    async fn request_permission(&self) -> Result<bool> {
        Ok(true)
    }

    async fn pick_image(&self) -> Result<Option<PathBuf>> {
        if !self.0.exists() {
            return Err(VtonError::FileNotFound(self.0.display().to_string()));
        }
        Ok(Some(self.0.clone()))
    }
}
