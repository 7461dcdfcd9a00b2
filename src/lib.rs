pub mod api;
pub mod cli;
pub mod commands;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod prompt;
pub mod store;

// Re-export commonly used types
pub use api::ApiClient;
pub use error::TmError;
pub use store::Session;
