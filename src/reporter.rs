use std::sync::Mutex;

struct Slot {
    message: Option<String>,
    visible: bool,
}

/// 単一スロットのエラーレポーター
///
/// 履歴もキューも持たない。新しいエラーは表示中のエラーを黙って置き換える
/// （後勝ち）。表示面はひとつだけで、最新の問題だけをユーザーに見せる。
pub struct ErrorReporter {
    slot: Mutex<Slot>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                message: None,
                visible: false,
            }),
        }
    }

    /// エラーを表示する。表示中のエラーは置き換えられる
    pub fn report(&self, message: impl Into<String>) {
        let mut slot = self.slot.lock().unwrap();
        slot.message = Some(message.into());
        slot.visible = true;
    }

    /// 表示中のエラーを閉じる
    pub fn clear(&self) {
        let mut slot = self.slot.lock().unwrap();
        slot.message = None;
        slot.visible = false;
    }

    pub fn current(&self) -> Option<String> {
        let slot = self.slot.lock().unwrap();
        if slot.visible {
            slot.message.clone()
        } else {
            None
        }
    }

    pub fn is_visible(&self) -> bool {
        self.slot.lock().unwrap().visible
    }

    /// 表示中のエラーを取り出して閉じる（CLI表示用）
    pub fn take(&self) -> Option<String> {
        let mut slot = self.slot.lock().unwrap();
        slot.visible = false;
        slot.message.take()
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
