//! Constrained script generation engine.
//!
//! The pipeline is: build a grammar-constrained tool-call request
//! (`request`), obtain a response from a pluggable generation source
//! (`source` — live OpenAI Responses call or a frozen fixture), extract the
//! script deterministically from whatever shape came back (`extract`), and
//! gate local execution behind an explicit confirmation literal
//! (`execute`).
//!
//! The model is never allowed to answer in free text: every request
//! declares exactly one tool whose input is constrained by the
//! environment's grammar, and forces that tool via `tool_choice`.

pub mod execute;
pub mod extract;
pub mod pipeline;
pub mod request;
pub mod source;

pub use execute::{ExecutionGate, ExecutionResult, CONFIRMATION_LITERAL};
pub use extract::{extract, Extraction};
pub use pipeline::{GeneratedScript, ScriptGenerator};
pub use request::{BuiltRequest, GenerationRequest, RequestBuilder};
pub use source::{FixtureSource, GenerationSource, OpenAiSource};
