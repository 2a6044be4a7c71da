//! Generation backends and the ordered fallback chain that drives them.
//!
//! A [`GenerationBackend`] turns a [`GenerationRequest`] into raw text. The
//! [`BackendChain`] tries backends in order, bounds each attempt with a
//! timeout and advances on any failure. It never returns an error: an
//! exhausted chain is reported as `None`.

pub mod backend;
pub mod chain;
pub mod chat;
pub mod error;
pub mod fence;
pub mod types;

pub use backend::{BackendRegistry, GenerationBackend, PREFERRED_TIER};
pub use chain::{BackendChain, ChainOutput, ChainRun, TierFailure};
pub use chat::ChatCompletionsBackend;
pub use error::BackendError;
pub use fence::strip_code_fences;
pub use types::{GenerationRequest, RequestWeight, TimeoutBudget};
