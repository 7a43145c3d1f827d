pub mod types;
mod validators;

// Re-export all public types
pub use types::*;
