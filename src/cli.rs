use clap::{Parser, Subcommand};
use smear_vision_common::StreamKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "smear-vision")]
#[command(about = "血液塗抹標本AI解析クライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// バックエンドURL（設定ファイルより優先）
    #[arg(long, global = true)]
    pub api_base: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 1枚の画像で物体検出
    Detect {
        /// 画像ファイル
        #[arg(required = true)]
        image: PathBuf,

        /// 信頼度の閾値（省略時は設定値）
        #[arg(short, long)]
        conf: Option<f64>,

        /// 注釈付き画像の保存先
        #[arg(long)]
        save_annotated: Option<PathBuf>,

        /// 応答JSONの保存先
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// 1枚の画像でセグメンテーション
    Categorize {
        /// 画像ファイル
        #[arg(required = true)]
        image: PathBuf,

        /// オーバーレイ画像の保存先
        #[arg(long)]
        save_overlay: Option<PathBuf>,

        /// 応答JSONの保存先
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// フォルダ内の画像をまとめて検出
    Batch {
        /// 画像フォルダ
        #[arg(required = true)]
        folder: PathBuf,

        /// 信頼度の閾値
        #[arg(short, long)]
        conf: Option<f64>,

        /// 出力JSON（デフォルト: 入力フォルダ/detections.json）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// MJPEG配信を受信してFPSを表示
    Watch {
        /// 配信の種類 (detect/segment/combined)
        #[arg(short, long, default_value = "detect")]
        kind: StreamKind,

        /// カメラ番号または動画パス
        #[arg(short, long, default_value = "0")]
        source: String,

        /// 信頼度の閾値
        #[arg(short, long)]
        conf: Option<f64>,

        /// マスクの不透明度
        #[arg(short, long)]
        alpha: Option<f64>,

        /// 受信するフレーム数（省略時は配信終了まで）
        #[arg(short = 'n', long)]
        frames: Option<u64>,

        /// フレーム保存先
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// バックエンドURLを設定
        #[arg(long)]
        set_api_base: Option<String>,

        /// 既定の信頼度閾値を設定
        #[arg(long)]
        set_confidence: Option<f64>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
