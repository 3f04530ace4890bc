use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use vton_rust::{acquire, cli, client, config, error, image, reporter, session, wardrobe};

use acquire::{DialogPicker, PathPicker};
use cli::{Cli, Commands};
use client::PredictionClient;
use config::{Config, EndpointStore};
use error::{Result, VtonError};
use image::ImageRef;
use reporter::ErrorReporter;
use session::{Slot, TryOnSession};

/// デモモードで表示する固定画像（ステージング確認用）
const DEMO_PLACEHOLDER_URL: &str =
    "https://cdn.pixabay.com/photo/2016/12/06/09/31/blank-1886008_640.png";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let reporter = Arc::new(ErrorReporter::new());
    let store = Arc::new(EndpointStore::new(Config::config_path()?, reporter.clone()));
    store.load().await;

    match cli.command {
        Commands::Predict {
            person,
            pick_person,
            garment,
            cloth_id,
            output,
            demo,
        } => {
            println!("👗 vton - バーチャル試着\n");

            let client = Arc::new(PredictionClient::new(store.clone())?);
            let session = Arc::new(TryOnSession::new(reporter.clone()));
            let images_dir = acquire::default_images_dir()?;

            if cli.verbose {
                println!("  エンドポイント: {}", store.endpoint()?);
                println!("  保存ディレクトリ: {}", images_dir.display());
            }

            // 1. 人物画像
            println!("[1/4] 人物画像を取得中...");
            match acquire_person(&session, person.as_deref(), pick_person, &images_dir).await {
                Ok(true) => {}
                Ok(false) => {
                    // ピッカーのキャンセルはエラーではない
                    println!("キャンセルされました");
                    return Ok(());
                }
                Err(e) => fail(&reporter, e),
            }
            if let Some(person) = session.person() {
                println!("✔ 人物画像: {}\n", person);
            }

            // 2. 衣服画像
            println!("[2/4] 衣服画像を取得中...");
            if let Err(e) = acquire_garment(&session, garment.as_deref(), cloth_id, &images_dir).await
            {
                fail(&reporter, e);
            }
            if let Some(garment) = session.garment() {
                println!("✔ 衣服画像: {}\n", garment);
            }

            // 3. 予測
            let prediction = if demo {
                // ステージング確認用: 送信せずプレースホルダーを表示する
                println!("[3/4] デモモード（送信をスキップ）...");
                let placeholder = ImageRef::Remote(DEMO_PLACEHOLDER_URL.into());
                match image::encode_to_data_url(client.http(), &placeholder).await {
                    Ok(data_url) => data_url,
                    Err(e) => fail(&reporter, e),
                }
            } else {
                println!("[3/4] 試着結果を生成中... (Ctrl-Cで中断)");
                let handle = session::spawn_submit(session.clone(), client.clone());
                let abort = handle.abort_handle();

                let joined = tokio::select! {
                    joined = handle.join() => joined,
                    _ = tokio::signal::ctrl_c() => {
                        abort.abort();
                        println!("\n中断しました");
                        return Ok(());
                    }
                };

                match joined {
                    Ok(Some(prediction)) => prediction,
                    Ok(None) => {
                        println!("中断しました");
                        return Ok(());
                    }
                    // 送信エラーはセッションが報告済み
                    Err(_) => {
                        show_snackbar(&reporter);
                        std::process::exit(1);
                    }
                }
            };
            println!("✔ 試着結果を受信\n");

            // 4. 結果保存（結果表示の終端。データURLを画像に戻して書き出す）
            println!("[4/4] 結果を保存中...");
            if cli.verbose {
                println!(
                    "  MIMEタイプ: {}",
                    image::extract_mime_type_from_data_url(&prediction)
                );
            }
            match save_prediction(&prediction, &output) {
                Ok(()) => {
                    println!("✔ 結果を保存: {}", output.display());
                    println!("\n✅ 完了");
                }
                Err(e) => fail(&reporter, e),
            }
        }

        Commands::Wardrobe { json } => {
            let wardrobe = wardrobe::default_wardrobe();

            if json {
                println!("{}", serde_json::to_string_pretty(&wardrobe)?);
            } else {
                println!("👕 ワードローブ\n");
                for cloth in &wardrobe {
                    println!(
                        "  [{}] {} ({:?} / {:?})",
                        cloth.id, cloth.name, cloth.kind, cloth.category
                    );
                    if cli.verbose {
                        println!("      {}", cloth.image_url);
                    }
                }
            }
        }

        Commands::Config { set_endpoint, show } => {
            if let Some(url) = set_endpoint {
                match store.set_endpoint(url).await {
                    Ok(()) => println!("✔ エンドポイントを設定しました"),
                    Err(e) => fail(&reporter, e),
                }
            }

            if show {
                let config = store.config()?;
                println!("設定:");
                println!("  エンドポイント: {}", config.endpoint);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

/// 人物画像をスロットへ取り込む。ピッカーのキャンセル時はOk(false)
async fn acquire_person(
    session: &TryOnSession,
    person: Option<&str>,
    pick_person: bool,
    images_dir: &Path,
) -> Result<bool> {
    if pick_person {
        let picker = DialogPicker;
        return session.pick_into(Slot::Person, &picker, images_dir).await;
    }

    match person.map(cli::parse_image_arg) {
        Some(ImageRef::Local(path)) => {
            // ローカル画像は撮影・選択と同じ恒久保存フローを通す
            let picker = PathPicker(path);
            session.pick_into(Slot::Person, &picker, images_dir).await
        }
        Some(image @ ImageRef::Remote(_)) => {
            session.set_slot(Slot::Person, image);
            Ok(true)
        }
        // 未指定は送信時の検証に委ねる
        None => Ok(true),
    }
}

/// 衣服画像をスロットへ取り込む
async fn acquire_garment(
    session: &TryOnSession,
    garment: Option<&str>,
    cloth_id: Option<u32>,
    images_dir: &Path,
) -> Result<()> {
    if let Some(id) = cloth_id {
        let cloth = wardrobe::find_cloth(id)
            .ok_or_else(|| VtonError::Validation(format!("カタログ項目 {} が見つかりません", id)))?;
        session.select_cloth(&cloth);
        return Ok(());
    }

    match garment.map(cli::parse_image_arg) {
        Some(ImageRef::Local(path)) => {
            let picker = PathPicker(path);
            session.pick_into(Slot::Garment, &picker, images_dir).await?;
            Ok(())
        }
        Some(image @ ImageRef::Remote(_)) => {
            session.set_slot(Slot::Garment, image);
            Ok(())
        }
        None => Ok(()),
    }
}

/// データURLを画像ファイルに書き出す
fn save_prediction(data_url: &str, output: &Path) -> Result<()> {
    let bytes = image::decode_data_url(data_url)?;
    std::fs::write(output, bytes)?;
    Ok(())
}

/// 表示中のエラーをCLIのスナックバーとして出す
fn show_snackbar(reporter: &ErrorReporter) {
    if let Some(message) = reporter.take() {
        eprintln!("⚠ {}", message);
    }
}

/// エラーを報告してスナックバーを表示し、終了する
fn fail(reporter: &ErrorReporter, error: VtonError) -> ! {
    reporter.report(error.to_string());
    show_snackbar(reporter);
    std::process::exit(1);
}
