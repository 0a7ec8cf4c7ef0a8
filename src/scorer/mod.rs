//! Scorer adapters: one uniform async interface per scoring backend.
//!
//! [`HttpScorer`] talks to any OpenAI-compatible chat-completions endpoint and
//! converts its response into a typed [`Judgment`](crate::model::Judgment)
//! through the strict parser in [`schema`]. Failures are typed
//! [`ScorerError`]s; the pipeline treats each one as a missing committee seat,
//! never as a fatal error.

pub mod adapter;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod pricing;
pub mod schema;


pub use adapter::{Scorer, ScorerRegistry, ScoringRequest};
pub use error::ScorerError;
pub use http::{DEFAULT_MAX_OUTPUT_TOKENS, HttpScorer};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockScorer;
pub use pricing::{ModelPrice, PricingTable};
pub use schema::{JUDGMENT_SYSTEM_INSTRUCTION, JudgmentPayload, parse_judgment_content};
