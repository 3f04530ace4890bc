//! 試着セッション（選択状態と送信パイプライン）
//!
//! 人物・衣服それぞれ1枚分のスロットを保持し、両方そろったときだけ
//! 送信できる。送信は 検証 → 人物エンコード → 衣服エンコード → POST →
//! 結果エンコード の順に直列実行し、最初のエラーで中断する。

use crate::acquire::{self, CameraDevice, GalleryPicker};
use crate::client::PredictionClient;
use crate::error::{Result, VtonError};
use crate::image::{encode_to_data_url, ImageRef};
use crate::reporter::ErrorReporter;
use crate::wardrobe::ClothItem;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// 取得フローの書き込み先スロット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Person,
    Garment,
}

impl Slot {
    fn label(&self) -> &'static str {
        match self {
            Slot::Person => "人物画像",
            Slot::Garment => "衣服画像",
        }
    }
}

pub struct TryOnSession {
    person: Mutex<Option<ImageRef>>,
    garment: Mutex<Option<ImageRef>>,
    reporter: Arc<ErrorReporter>,
    // セッション内の送信を直列化する（同時送信は順番待ちになる）
    in_flight: tokio::sync::Mutex<()>,
}

impl TryOnSession {
    pub fn new(reporter: Arc<ErrorReporter>) -> Self {
        Self {
            person: Mutex::new(None),
            garment: Mutex::new(None),
            reporter,
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// スロットを置き換える。履歴は持たない
    pub fn set_slot(&self, slot: Slot, image: ImageRef) {
        *self.slot(slot).lock().unwrap() = Some(image);
    }

    /// 撮り直し・リセット用
    pub fn clear_slot(&self, slot: Slot) {
        *self.slot(slot).lock().unwrap() = None;
    }

    pub fn person(&self) -> Option<ImageRef> {
        self.person.lock().unwrap().clone()
    }

    pub fn garment(&self) -> Option<ImageRef> {
        self.garment.lock().unwrap().clone()
    }

    /// 両方のスロットがそろっているか（カタログ選択も「あり」に数える）
    pub fn can_submit(&self) -> bool {
        self.person().is_some() && self.garment().is_some()
    }

    fn slot(&self, slot: Slot) -> &Mutex<Option<ImageRef>> {
        match slot {
            Slot::Person => &self.person,
            Slot::Garment => &self.garment,
        }
    }

    /// カメラで撮影してスロットへ取り込む
    ///
    /// 権限拒否やI/O失敗はレポーターへ1回だけ報告し、スロットは変更しない。
    pub async fn capture_into(
        &self,
        slot: Slot,
        camera: &impl CameraDevice,
        images_dir: &Path,
    ) -> Result<()> {
        match acquire::capture_image(camera, images_dir).await {
            Ok(image) => {
                self.set_slot(slot, image);
                Ok(())
            }
            Err(e) => {
                self.reporter.report(e.to_string());
                Err(e)
            }
        }
    }

    /// ギャラリーから選択してスロットへ取り込む
    ///
    /// キャンセルはOk(false)で返り、報告もスロット変更も行わない。
    pub async fn pick_into(
        &self,
        slot: Slot,
        picker: &impl GalleryPicker,
        images_dir: &Path,
    ) -> Result<bool> {
        match acquire::select_image(picker, images_dir).await {
            Ok(Some(image)) => {
                self.set_slot(slot, image);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                self.reporter.report(e.to_string());
                Err(e)
            }
        }
    }

    /// カタログ項目を衣服スロットに設定する（I/Oなし）
    pub fn select_cloth(&self, cloth: &ClothItem) {
        self.set_slot(Slot::Garment, cloth.image_ref());
    }

    /// 送信パイプラインを実行する
    ///
    /// 最初のエラーをレポーターへ報告して中断する。検証は通信前に行われ、
    /// どちらかの画像が欠けていればネットワーク送信自体が発生しない。
    pub async fn submit(&self, client: &PredictionClient) -> Result<String> {
        let _guard = self.in_flight.lock().await;

        match self.run_pipeline(client).await {
            Ok(prediction) => Ok(prediction),
            Err(e) => {
                self.reporter.report(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, client: &PredictionClient) -> Result<String> {
        let person = self.person().ok_or_else(|| missing(Slot::Person))?;
        let garment = self.garment().ok_or_else(|| missing(Slot::Garment))?;

        // 送信のたびに再エンコードする（キャッシュしない）
        let person_data = encode_to_data_url(client.http(), &person).await?;
        let garment_data = encode_to_data_url(client.http(), &garment).await?;

        client.predict(&person_data, &garment_data).await
    }
}

fn missing(slot: Slot) -> VtonError {
    VtonError::Validation(format!("{}が選択されていません", slot.label()))
}

/// 送信を中断可能なタスクとして起動する
///
/// 呼び出し側（画面）のライフタイムに合わせて`abort()`すれば、進行中の
/// 送信は破棄される。中断は`join()`でOk(None)になり、エラー報告は発生
/// しない。
pub fn spawn_submit(session: Arc<TryOnSession>, client: Arc<PredictionClient>) -> SubmitHandle {
    let handle = tokio::spawn(async move { session.submit(&client).await });
    SubmitHandle { handle }
}

pub struct SubmitHandle {
    handle: tokio::task::JoinHandle<Result<String>>,
}

impl SubmitHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// join後も使える中断ハンドル
    pub fn abort_handle(&self) -> tokio::task::AbortHandle {
        self.handle.abort_handle()
    }

    /// 完了を待つ。中断されていた場合はOk(None)
    pub async fn join(self) -> Result<Option<String>> {
        match self.handle.await {
            Ok(result) => result.map(Some),
            Err(e) if e.is_cancelled() => Ok(None),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::mock::{MockCamera, MockPicker};
    use crate::config::EndpointStore;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn new_session() -> (TryOnSession, Arc<ErrorReporter>) {
        let reporter = Arc::new(ErrorReporter::new());
        (TryOnSession::new(reporter.clone()), reporter)
    }

    /// エンドポイント未読み込みのクライアント。検証エラーの場合は
    /// ここまで到達しないことの確認にも使える
    fn unloaded_client() -> (PredictionClient, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let reporter = Arc::new(ErrorReporter::new());
        let store = Arc::new(EndpointStore::new(dir.path().join("config.json"), reporter));
        (PredictionClient::new(store).unwrap(), dir)
    }

    #[test]
    fn test_can_submit_requires_both_slots() {
        let (session, _) = new_session();
        assert!(!session.can_submit());

        session.set_slot(Slot::Person, ImageRef::Local(PathBuf::from("person.jpg")));
        assert!(!session.can_submit());

        session.set_slot(Slot::Garment, ImageRef::Remote("https://example.test/c.png".into()));
        assert!(session.can_submit());
    }

    #[test]
    fn test_new_acquisition_replaces_prior_reference() {
        let (session, _) = new_session();
        session.set_slot(Slot::Person, ImageRef::Local(PathBuf::from("old.jpg")));
        session.set_slot(Slot::Person, ImageRef::Local(PathBuf::from("new.jpg")));

        assert_eq!(
            session.person(),
            Some(ImageRef::Local(PathBuf::from("new.jpg")))
        );
    }

    #[test]
    fn test_clear_slot() {
        let (session, _) = new_session();
        session.set_slot(Slot::Person, ImageRef::Local(PathBuf::from("p.jpg")));
        session.clear_slot(Slot::Person);

        assert!(session.person().is_none());
    }

    #[tokio::test]
    async fn test_submit_without_person_is_validation_error() {
        let (session, reporter) = new_session();
        session.set_slot(Slot::Garment, ImageRef::Remote("https://example.test/c.png".into()));
        let (client, _dir) = unloaded_client();

        let result = session.submit(&client).await;

        // EndpointNotReadyではなくValidation: 通信前に中断されている
        assert!(matches!(result, Err(VtonError::Validation(_))));
        assert_eq!(reporter.current(), Some("人物画像が選択されていません".into()));
    }

    #[tokio::test]
    async fn test_submit_without_garment_is_validation_error() {
        let (session, reporter) = new_session();
        session.set_slot(Slot::Person, ImageRef::Local(PathBuf::from("p.jpg")));
        let (client, _dir) = unloaded_client();

        let result = session.submit(&client).await;

        assert!(matches!(result, Err(VtonError::Validation(_))));
        assert_eq!(reporter.current(), Some("衣服画像が選択されていません".into()));
    }

    #[tokio::test]
    async fn test_capture_denied_reports_once_and_keeps_slot() {
        let (session, reporter) = new_session();
        let frames = tempdir().unwrap();
        let images = tempdir().unwrap();

        let camera = MockCamera {
            granted: false,
            frame_dir: frames.path().to_path_buf(),
        };

        let result = session.capture_into(Slot::Person, &camera, images.path()).await;

        assert!(matches!(result, Err(VtonError::PermissionDenied(_))));
        assert!(session.person().is_none());
        // 報告は1回だけ
        assert!(reporter.take().unwrap().contains("権限"));
        assert_eq!(reporter.take(), None);
    }

    #[tokio::test]
    async fn test_pick_cancelled_reports_nothing() {
        let (session, reporter) = new_session();
        let images = tempdir().unwrap();

        let picker = MockPicker {
            granted: true,
            selection: None,
        };

        let picked = session
            .pick_into(Slot::Person, &picker, images.path())
            .await
            .unwrap();

        assert!(!picked);
        assert!(session.person().is_none());
        assert!(!reporter.is_visible());
    }

    #[tokio::test]
    async fn test_pick_success_fills_slot() {
        let (session, reporter) = new_session();
        let assets = tempdir().unwrap();
        let images = tempdir().unwrap();
        let asset = assets.path().join("photo.jpg");
        std::fs::write(&asset, [0xFFu8, 0xD8]).unwrap();

        let picker = MockPicker {
            granted: true,
            selection: Some(asset),
        };

        let picked = session
            .pick_into(Slot::Person, &picker, images.path())
            .await
            .unwrap();

        assert!(picked);
        assert!(session.person().is_some());
        assert!(!reporter.is_visible());
    }

    #[test]
    fn test_select_cloth_fills_garment_slot() {
        let (session, _) = new_session();
        let cloth = crate::wardrobe::find_cloth(1).unwrap();

        session.select_cloth(&cloth);

        assert_eq!(session.garment(), Some(cloth.image_ref()));
    }
}
