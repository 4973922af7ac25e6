/// Shared types, traits, and errors for the leakscope evaluation harness.
///
/// This crate is the foundation that all other leakscope crates depend on.
/// It contains:
/// - **Trait contracts** (`traits`) that define the collaborator interfaces
/// - **Shared data types** (`records`) used across all subsystems
/// - **Error types** (`errors`) for unified error handling
/// - **Config types** (`config`) for configuration file loading
pub mod config;
pub mod errors;
pub mod records;
pub mod traits;

// Re-export commonly used types at the crate root for convenience.
pub use config::{HarnessConfig, RunConfig};
pub use errors::LeakscopeError;
pub use records::*;
pub use traits::*;
