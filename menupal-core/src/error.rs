use thiserror::Error;

use crate::parsers::menu_response::ParseError;
use crate::services::record_store::StoreError;
use crate::services::upstream::FetchError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no images to translate")]
    NoImages,
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, CoreError>;
