pub mod assets;
pub(crate) mod atomic;
pub mod pipeline;
pub mod record_store;
pub mod settings;
pub mod upstream;
