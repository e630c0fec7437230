//! Display references - 取り消し可能な一時 URL（object URL 相当）
//!
//! # ライフサイクル
//! 1. `ObjectUrlRegistry::create` で payload を登録し、`DisplayRef` を受け取る
//! 2. player は `url()` を使って `lookup` し、再生する
//! 3. 表示をやめたら `release()` で取り消す
//!
//! 取り消し忘れを防ぐため、`DisplayRef` は Drop 時にも取り消されます。
//! ただし、取得と解放はあくまで対になった明示的な操作として扱います。
//! 参照カウントは持ちません（resolve のたびに新しい URL が発行される）。

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use ulid::Ulid;

use crate::domain::BinaryPayload;

const URL_SCHEME: &str = "blob:pitchbox/";

/// ObjectUrlRegistry は一時 URL → payload の対応表
///
/// クローンは同じ表を共有します。
#[derive(Clone, Default)]
pub struct ObjectUrlRegistry {
    urls: Arc<Mutex<HashMap<String, BinaryPayload>>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn urls(&self) -> MutexGuard<'_, HashMap<String, BinaryPayload>> {
        self.urls.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// payload に新しい一時 URL を割り当てる
    pub fn create(&self, payload: BinaryPayload) -> DisplayRef {
        let url = format!("{URL_SCHEME}{}", Ulid::new());
        self.urls().insert(url.clone(), payload);
        tracing::trace!(%url, "display reference created");
        DisplayRef {
            url,
            registry: self.clone(),
            released: false,
        }
    }

    /// URL が指す payload（取り消し済みなら `None`）
    pub fn lookup(&self, url: &str) -> Option<BinaryPayload> {
        self.urls().get(url).cloned()
    }

    /// URL を取り消す。まだ有効だったら `true`
    pub fn revoke(&self, url: &str) -> bool {
        let revoked = self.urls().remove(url).is_some();
        if revoked {
            tracing::trace!(%url, "display reference revoked");
        }
        revoked
    }

    /// まだ取り消されていない URL の数
    pub fn live_count(&self) -> usize {
        self.urls().len()
    }
}

impl fmt::Debug for ObjectUrlRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectUrlRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}

/// DisplayRef は一時 URL の所有権
pub struct DisplayRef {
    url: String,
    registry: ObjectUrlRegistry,
    released: bool,
}

impl DisplayRef {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 取り消し（表示をやめたとき、差し替えるとき、session を reset したとき）
    pub fn release(mut self) {
        self.revoke();
    }

    fn revoke(&mut self) {
        if !self.released {
            self.registry.revoke(&self.url);
            self.released = true;
        }
    }
}

impl Drop for DisplayRef {
    fn drop(&mut self) {
        self.revoke();
    }
}

impl fmt::Debug for DisplayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DisplayRef").field(&self.url).finish()
    }
}
