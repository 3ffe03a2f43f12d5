pub mod debounce;
pub mod event;
pub mod notice;
pub mod request;

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;
#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;

pub use debounce::Debouncer;
pub use event::{FieldAction, FormEvent};
pub use notice::{Notice, NoticeLevel, NoticeQueue, Notifier, SilentNotifier};
pub use request::{
    DeleteRequest, FileReference, LocalFile, Ticket, UploadRequest, ValidationRequest,
};
