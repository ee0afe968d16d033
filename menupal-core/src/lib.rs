#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod model;
pub mod parsers;
pub mod protocol;
pub mod services;

// Re-exports: stable API surface
pub use error::{CoreError, Result};
pub use parsers::menu_response::{parse, DecodeErrorKind, ParseError};
pub use services::record_store::{CompactReport, RecordStore, StoreError, StoreErrorKind};
