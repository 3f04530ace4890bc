use crate::error::{Result, VtonError};
use crate::reporter::ErrorReporter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// 推論エンドポイントの既定値（未設定時に使用）
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000";

/// リクエストタイムアウト既定値（秒）
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| VtonError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("vton").join("config.json"))
    }
}

enum EndpointState {
    Loading,
    Ready(Config),
}

/// エンドポイント設定ストア
///
/// 起動時に`load()`で1回だけ読み込む。読み込み完了前のreadアクセスは
/// `EndpointNotReady`を返し、古い値や空の値での通信を防ぐ。
/// `set_endpoint()`はメモリ上の値を即時更新してから永続化する。
/// 永続化に失敗してもメモリ上の値は巻き戻さない（エラーはレポーター経由）。
pub struct EndpointStore {
    state: RwLock<EndpointState>,
    config_path: PathBuf,
    reporter: Arc<ErrorReporter>,
}

impl EndpointStore {
    pub fn new(config_path: PathBuf, reporter: Arc<ErrorReporter>) -> Self {
        Self {
            state: RwLock::new(EndpointState::Loading),
            config_path,
            reporter,
        }
    }

    /// 設定ファイルを読み込んでReady状態に遷移する
    ///
    /// ファイルが存在しない場合は既定値、読み込みに失敗した場合は
    /// エラーを報告したうえで既定値にフォールバックする。
    pub async fn load(&self) {
        let path = self.config_path.clone();
        let loaded = tokio::task::spawn_blocking(move || Config::load_from(&path)).await;

        let config = match loaded {
            Ok(Ok(config)) => config,
            Ok(Err(e)) => {
                self.reporter
                    .report(format!("設定の読み込みに失敗しました: {}", e));
                Config::default()
            }
            Err(e) => {
                self.reporter
                    .report(format!("設定の読み込みに失敗しました: {}", e));
                Config::default()
            }
        };

        *self.state.write().unwrap() = EndpointState::Ready(config);
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.state.read().unwrap(), EndpointState::Ready(_))
    }

    /// 現在の設定のスナップショットを返す（読み込み前はエラー）
    pub fn config(&self) -> Result<Config> {
        match &*self.state.read().unwrap() {
            EndpointState::Loading => Err(VtonError::EndpointNotReady),
            EndpointState::Ready(config) => Ok(config.clone()),
        }
    }

    /// エンドポイントURLを返す
    ///
    /// 読み込み完了後は環境変数 VTON_ENDPOINT を優先する。
    pub fn endpoint(&self) -> Result<String> {
        let persisted = match &*self.state.read().unwrap() {
            EndpointState::Loading => return Err(VtonError::EndpointNotReady),
            EndpointState::Ready(config) => config.endpoint.clone(),
        };

        if let Ok(url) = std::env::var("VTON_ENDPOINT") {
            if !url.trim().is_empty() {
                return Ok(url);
            }
        }

        Ok(persisted)
    }

    /// エンドポイントを更新する
    ///
    /// メモリ上の値は最初のawaitより前に更新済みになる。
    pub async fn set_endpoint(&self, url: String) -> Result<()> {
        let snapshot = {
            let mut state = self.state.write().unwrap();
            match &mut *state {
                EndpointState::Ready(config) => {
                    config.endpoint = url;
                    config.clone()
                }
                EndpointState::Loading => {
                    let config = Config {
                        endpoint: url,
                        ..Config::default()
                    };
                    *state = EndpointState::Ready(config.clone());
                    config
                }
            }
        };

        let path = self.config_path.clone();
        let saved = tokio::task::spawn_blocking(move || snapshot.save_to(&path)).await;

        match saved {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                let err = VtonError::Storage(format!("設定の保存に失敗しました: {}", e));
                self.reporter.report(err.to_string());
                Err(err)
            }
            Err(e) => {
                let err = VtonError::Storage(format!("設定の保存に失敗しました: {}", e));
                self.reporter.report(err.to_string());
                Err(err)
            }
        }
    }
}
