use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use smear_vision::cli::{Cli, Commands};
use smear_vision::client::BackendClient;
use smear_vision::config::Config;
use smear_vision::report::{self, BatchEntry, BatchReport};
use smear_vision::scanner;
use smear_vision::watch::{run_watch, WatchOptions};
use smear_vision::error::SmearError;
use smear_vision_common::session::StreamSource;
use smear_vision_common::StreamParams;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(verbose: bool) {
    let default = if verbose { "smear_vision=debug,info" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load()?;
    let api_base = cli.api_base.clone();
    let connect = |config: &Config| -> smear_vision::error::Result<BackendClient> {
        // --api-base > 環境変数 > 設定ファイル
        let base = api_base.clone().unwrap_or_else(|| config.api_base());
        BackendClient::with_base(&base, config.timeout_seconds, config.max_image_size)
    };

    match cli.command {
        Commands::Detect { image, conf, save_annotated, json } => {
            println!("🔬 smear-vision - 物体検出\n");
            let conf = conf.unwrap_or(config.default_confidence);
            let client = connect(&config)?;

            println!("[1/2] 解析中... ({}, 閾値 {:.2})", image.display(), conf);
            let resp = client.detect(&image, conf).await?;
            println!("✔ 解析完了\n");

            for line in report::detection_lines(&resp) {
                println!("{}", line);
            }

            println!("\n[2/2] 結果を保存中...");
            if let Some(path) = save_annotated {
                report::save_data_url(&resp.annotated_image, &path)
                    .with_context(|| format!("write {}", path.display()))?;
                println!("✔ 注釈付き画像: {}", path.display());
            }
            if let Some(path) = json {
                report::write_json(&resp, &path)?;
                println!("✔ JSON: {}", path.display());
            }
        }

        Commands::Categorize { image, save_overlay, json } => {
            println!("🧪 smear-vision - セグメンテーション\n");
            let client = connect(&config)?;

            println!("[1/2] 解析中... ({})", image.display());
            let resp = client.categorize(&image).await?;
            println!("✔ 解析完了\n");

            for line in report::categorize_lines(&resp) {
                println!("{}", line);
            }

            println!("\n[2/2] 結果を保存中...");
            if let Some(path) = save_overlay {
                report::save_data_url(&resp.overlay_image, &path)
                    .with_context(|| format!("write {}", path.display()))?;
                println!("✔ オーバーレイ画像: {}", path.display());
            }
            if let Some(path) = json {
                report::write_json(&resp, &path)?;
                println!("✔ JSON: {}", path.display());
            }
        }

        Commands::Batch { folder, conf, output, recursive } => {
            println!("📂 smear-vision - 一括検出\n");
            let conf = conf.unwrap_or(config.default_confidence);

            println!("[1/3] 画像をスキャン中...");
            let images = scanner::scan_folder(&folder, recursive)?;
            if images.is_empty() {
                return Err(SmearError::NoImagesFound(folder.display().to_string()).into());
            }
            println!("✔ {}枚の画像を検出\n", images.len());

            println!("[2/3] 解析中...");
            let client = connect(&config)?;
            let progress = ProgressBar::new(images.len() as u64);
            progress.set_style(
                ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );

            let mut entries = Vec::with_capacity(images.len());
            for img in &images {
                progress.set_message(img.file_name.clone());
                // 1枚の失敗でバッチは止めない
                let entry = match client.detect(&img.path, conf).await {
                    Ok(resp) => BatchEntry::from_response(&img.file_name, &img.path, &resp),
                    Err(e) => {
                        tracing::warn!(file = %img.file_name, error = %e, "detect failed");
                        BatchEntry::failed(&img.file_name, &img.path, e.to_string())
                    }
                };
                entries.push(entry);
                progress.inc(1);
            }
            progress.finish_and_clear();

            let batch = BatchReport::new(conf, entries);
            println!(
                "✔ 解析完了: {}枚 / 検出 {}件 / 失敗 {}枚\n",
                batch.images, batch.total_detections, batch.failed
            );

            println!("[3/3] 結果を保存中...");
            let output = output.unwrap_or_else(|| folder.join("detections.json"));
            report::write_json(&batch, &output)?;
            println!("✔ 結果を保存: {}", output.display());
        }

        Commands::Watch { kind, source, conf, alpha, frames, out_dir } => {
            println!("📡 smear-vision - ストリーム受信\n");
            let params = StreamParams {
                kind,
                source: StreamSource::parse(&source),
                conf: conf.unwrap_or(config.default_confidence),
                alpha: alpha.unwrap_or(config.default_alpha),
            };
            let client = connect(&config)?;
            println!("接続先: {}", client.endpoints().stream_url(&params)?);

            let summary = run_watch(
                &client,
                &params,
                WatchOptions { max_frames: frames, out_dir },
                |n, fps| {
                    if n % 30 == 0 {
                        println!("  フレーム {:>6}  {:.1} fps", n, fps);
                    }
                },
            )
            .await?;

            println!(
                "\n✔ 受信終了: {}フレーム / {:.1}秒 / {:.1} fps / {} bytes",
                summary.frames, summary.elapsed_secs, summary.last_fps, summary.bytes
            );
            if summary.discarded_bytes > 0 {
                println!("⚠ 破損パートとして {} bytes を破棄しました", summary.discarded_bytes);
            }
        }

        Commands::Config { set_api_base, set_confidence, show } => {
            let mut changed = false;

            if let Some(base) = set_api_base {
                config.set_api_base(base)?;
                changed = true;
                println!("✔ バックエンドURLを設定しました");
            }
            if let Some(conf) = set_confidence {
                config.set_confidence(conf)?;
                changed = true;
                println!("✔ 信頼度閾値を設定しました");
            }
            if changed {
                config.save()?;
            }

            if show || !changed {
                println!("設定:");
                println!("  バックエンドURL: {}", config.api_base());
                println!("  信頼度閾値: {:.2}", config.default_confidence);
                println!("  マスク不透明度: {:.2}", config.default_alpha);
                println!("  最大画像サイズ: {}px", config.max_image_size);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
            }
        }
    }

    Ok(())
}
