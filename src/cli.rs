use crate::image::ImageRef;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vton")]
#[command(about = "バーチャル試着（VTON）クライアントツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 人物画像と衣服画像を送信して試着結果を取得
    Predict {
        /// 人物画像（ファイルパスまたはURL）
        #[arg(short, long)]
        person: Option<String>,

        /// 人物画像をファイルダイアログで選択
        #[arg(long)]
        pick_person: bool,

        /// 衣服画像（ファイルパスまたはURL）
        #[arg(short, long)]
        garment: Option<String>,

        /// ワードローブのカタログ項目ID
        #[arg(short, long)]
        cloth_id: Option<u32>,

        /// 結果画像の出力先
        #[arg(short, long, default_value = "tryon-result.jpg")]
        output: PathBuf,

        /// プレースホルダー画像で表示だけ確認する（サーバーに送信しない）
        #[arg(long)]
        demo: bool,
    },

    /// ワードローブ（カタログ）を一覧表示
    Wardrobe {
        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 設定を表示/編集
    Config {
        /// エンドポイントURLを設定
        #[arg(long)]
        set_endpoint: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// パスまたはURLを画像参照として解釈する
pub fn parse_image_arg(value: &str) -> ImageRef {
    if value.starts_with("http://") || value.starts_with("https://") {
        ImageRef::Remote(value.to_string())
    } else {
        ImageRef::Local(PathBuf::from(value))
    }
}
