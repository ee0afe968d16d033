pub mod menu;
pub mod record;
pub mod settings;
