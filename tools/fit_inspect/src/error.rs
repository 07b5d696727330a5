use fit_image::fit::{DumpError, HeaderError};
use fit_loader::{ImageError, LoaderError};
use std::path::Path;
use thiserror_no_std::Error;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Could not access {path}: {reason}")]
    Io {
        path: String,
        reason: std::io::Error,
    },
    #[error("Not a valid FIT image: {0}")]
    Header(#[from] HeaderError),
    #[error("Could not describe the image node: {0}")]
    Image(#[from] ImageError),
    #[error("Could not dump the image: {0}")]
    Dump(#[from] DumpError),
    #[error("Could not load the kernel: {0}")]
    Loader(#[from] LoaderError),
}

impl InspectError {
    pub fn io(path: &Path, reason: std::io::Error) -> Self {
        InspectError::Io {
            path: path.display().to_string(),
            reason,
        }
    }
}
