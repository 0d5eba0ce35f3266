//! 画像アップロード→単発解析の状態
//!
//! `Idle → FileSelected → Requesting → {Succeeded | Failed}`。
//! ファイルを選び直すとどの状態からでも FileSelected に戻る。
//! 同時に送れるリクエストは1件のみ。

use std::fmt;

/// ファイル未選択時に表示する文言
pub const NO_FILE_MESSAGE: &str = "画像ファイルを選択してください";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    FileSelected,
    Requesting,
    Succeeded,
    Failed,
}

/// 選択中のファイル。`F` はWebでは `web_sys::File`、CLIではパス
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile<F> {
    pub name: String,
    pub size: u64,
    /// プレビュー用URL（object URL や data URL）
    pub preview_url: String,
    pub file: F,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    NoFileSelected,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::NoFileSelected => f.write_str(NO_FILE_MESSAGE),
        }
    }
}

impl std::error::Error for SubmitError {}

#[derive(Debug, Clone)]
pub struct UploadForm<F, R> {
    phase: UploadPhase,
    file: Option<SelectedFile<F>>,
    result: Option<R>,
    error: Option<String>,
    loading: bool,
}

impl<F, R> Default for UploadForm<F, R> {
    fn default() -> Self {
        Self {
            phase: UploadPhase::Idle,
            file: None,
            result: None,
            error: None,
            loading: false,
        }
    }
}

impl<F, R> UploadForm<F, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn file(&self) -> Option<&SelectedFile<F>> {
        self.file.as_ref()
    }

    pub fn result(&self) -> Option<&R> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// 選択を置き換え、前回の結果とエラーを消す。
    /// 古い選択を返すので呼び出し側でプレビューURLを解放する。
    pub fn select_file(&mut self, file: SelectedFile<F>) -> Option<SelectedFile<F>> {
        self.result = None;
        self.error = None;
        self.phase = UploadPhase::FileSelected;
        self.file.replace(file)
    }

    /// 送信開始。
    /// - 未選択: エラー文言を設定して `Err`
    /// - 送信中: 何もせず `Ok(false)`
    pub fn begin_submit(&mut self) -> Result<bool, SubmitError> {
        if self.file.is_none() {
            self.error = Some(NO_FILE_MESSAGE.to_string());
            return Err(SubmitError::NoFileSelected);
        }
        if self.loading {
            return Ok(false);
        }
        self.loading = true;
        self.error = None;
        self.phase = UploadPhase::Requesting;
        Ok(true)
    }

    /// 応答を反映する。失敗時は前回の結果を残す。
    /// 選び直し後に届いた応答もそのまま反映する
    pub fn finish(&mut self, outcome: Result<R, String>) {
        self.loading = false;
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.error = None;
                self.phase = UploadPhase::Succeeded;
            }
            Err(message) => {
                self.error = Some(message);
                self.phase = UploadPhase::Failed;
            }
        }
    }

    /// 画面遷移時の破棄。解放すべき選択を返す
    pub fn reset(&mut self) -> Option<SelectedFile<F>> {
        let file = self.file.take();
        *self = Self::default();
        file
    }
}
