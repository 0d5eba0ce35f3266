//! Smear Vision Common Library
//!
//! CLIとWeb(WASM)で共有される型とクライアント側ロジック

pub mod api;
pub mod error;
pub mod events;
pub mod fps;
pub mod gate;
pub mod mask;
pub mod mjpeg;
pub mod overlay;
pub mod palette;
pub mod segmentation;
pub mod session;
pub mod socketio;
pub mod theme;
pub mod types;
pub mod upload;

pub use api::{ApiEndpoints, StreamKind, DEFAULT_API_BASE};
pub use error::{Error, Result};
pub use events::{ClientEvent, ServerEvent};
pub use fps::FpsCounter;
pub use gate::FrameGate;
pub use mask::{ClassMap, EncodedMask};
pub use segmentation::{significant_classes, SignificantClass};
pub use session::{SessionState, StreamParams, StreamSession};
pub use theme::{ThemeMode, ThemeStorage, ThemeStore};
pub use types::{CategorizeResponse, DetectResponse, Detection};
pub use upload::{SelectedFile, SubmitError, UploadForm, UploadPhase};
