mod transport;
mod types;

pub use transport::{MockTransport, UploadError};
pub use types::{FileHandle, UploadEvent};
