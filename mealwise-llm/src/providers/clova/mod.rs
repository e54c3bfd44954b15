//! CLOVA Studio chat-completions provider

pub mod generation;
pub mod types;

pub use generation::ClovaGenerationProvider;
