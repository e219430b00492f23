//! Core conversion engine: turns a JSON Schema (draft 2020-12) document into
//! a restricted dialect a structured-output LLM backend accepts, and back.
//!
//! The crate has no I/O and no process-wide state — every entry point takes
//! its input as `&serde_json::Value` or `&str` and returns an owned result,
//! so the same engine runs unmodified behind the CLI, the WASI ABI, and the
//! language bindings in the sibling crates.

pub mod codec;
pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod passes;
pub mod rehydrate;
pub mod resolver;
pub mod schema_utils;
pub mod target_profile;
pub mod validation;

pub use codec::{Codec, DroppedConstraint, Transform, CODEC_SCHEMA_URI};
pub use config::{ConvertOptions, ExtractOptions, Mode, OnMissingRef, Polymorphism, Target};
pub use convert::{convert, ConvertResult, ProviderCompatErrorRecord, API_VERSION};
pub use error::{ConvertError, ExtractError, ProviderCompatError, RehydrationError};
pub use extract::{convert_all_components, extract_component, list_components};
pub use rehydrate::{rehydrate, RehydrateResult};
