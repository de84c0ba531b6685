//! `gateway` crate — the `Step` exchange type, the `TranslationGateway` trait
//! and its implementations.
//!
//! The flowchart crate talks to the text-generation model only through
//! [`TranslationGateway`]; [`QwenGateway`] is the production backend and
//! [`mock::MockGateway`] the test double.

pub mod config;
pub mod error;
pub mod fallback;
pub mod mock;
pub mod prompt;
pub mod qwen;
pub mod step;
pub mod traits;

pub use config::GatewayConfig;
pub use error::TranslationFailure;
pub use qwen::QwenGateway;
pub use step::{Step, StepType};
pub use traits::TranslationGateway;
