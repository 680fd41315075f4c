//! Headless intake form: UI model, serializer, drafts, submission and downloads.

pub mod download;
pub mod draft;
pub mod preview;
pub mod serialize;
pub mod status;
pub mod submit;
pub mod transport;
pub mod ui;

pub use download::{DownloadDir, DownloadError, DownloadSink};
pub use draft::{Autosave, DraftStorage, DraftStore, FileStorage, MemoryStorage, StorageError};
pub use preview::{PreviewRow, preview_rows};
pub use serialize::{deserialize, serialize};
pub use status::{Notice, StatusBoard};
pub use submit::{Outcome, Phase, SubmissionController, SubmitError, Submitted};
pub use transport::{HttpTransport, Transport, TransportError, spawn_probe};
pub use ui::{Choice, Control, UiState, Widget};
