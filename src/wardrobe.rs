//! プリセットワードローブ（衣服カタログ）
//!
//! 固定のメモリ内リスト。項目の選択はリモートURLの参照を返すだけで、
//! 権限要求もファイルコピーも発生しない。

use crate::image::ImageRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClothKind {
    Eastern,
    Western,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClothCategory {
    #[serde(rename = "Upper Body")]
    UpperBody,
    #[serde(rename = "Lower Body")]
    LowerBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClothItem {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ClothKind,
    pub category: ClothCategory,
    #[serde(rename = "image")]
    pub image_url: String,
}

impl ClothItem {
    /// カタログ項目は常にリモートURL参照になる
    pub fn image_ref(&self) -> ImageRef {
        ImageRef::Remote(self.image_url.clone())
    }
}

/// 既定のカタログ
pub fn default_wardrobe() -> Vec<ClothItem> {
    vec![
        ClothItem {
            id: 1,
            name: "Casual Shirt".into(),
            kind: ClothKind::Western,
            category: ClothCategory::UpperBody,
            image_url: "https://img.freepik.com/free-psd/stylish-blue-plaid-shirt-men-isolated-transparent-background_191095-23034.jpg?semt=ais_hybrid".into(),
        },
        ClothItem {
            id: 2,
            name: "T-Shirt".into(),
            kind: ClothKind::Western,
            category: ClothCategory::UpperBody,
            image_url: "https://cdn.pixabay.com/photo/2016/12/06/09/31/blank-1886008_640.png".into(),
        },
        ClothItem {
            id: 3,
            name: "Jeans".into(),
            kind: ClothKind::Western,
            category: ClothCategory::LowerBody,
            image_url: "https://t3.ftcdn.net/jpg/04/83/25/50/360_F_483255019_m1r1ujM8EOkr8PamCHF85tQ0rHG3Fiqz.jpg".into(),
        },
    ]
}

/// IDでカタログ項目を探す
pub fn find_cloth(id: u32) -> Option<ClothItem> {
    default_wardrobe().into_iter().find(|cloth| cloth.id == id)
}
