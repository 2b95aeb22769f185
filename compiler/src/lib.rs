//! protofox-compiler
//!
//! This crate implements:
//!  1) A tokenizer + parser for `.pfm` model files and the lowering of their
//!     names into a [`ModelSet`](protofox_schema::ModelSet),
//!  2) The forward resolver (models → protobuf IR) and the per-package assembler,
//!  3) The reverse resolver (compiled descriptors → IR with Rust type names),
//!  4) A schema verifier (duplicate indices, undefined references),
//!  5) Collaborators: the `protoc` driver and descriptor sources,
//!  6) Renderers (`render_proto`, `render_client` → `String`),
//!  7) Error types (`SchemaError`).

pub mod error;
pub mod utils;
pub mod tokenizer;
pub mod parser;
pub mod lower;
pub mod classify;
pub mod forward;
pub mod reverse;
pub mod assemble;
pub mod verifier;
pub mod protoc;
pub mod source;
pub mod compiler;
pub mod gen_proto;
pub mod gen_rust;

pub use assemble::assemble;
pub use compiler::{compile_descriptors, compile_models};
pub use error::SchemaError;
pub use forward::ProtoBuilder;
pub use gen_proto::render_proto;
pub use gen_rust::render_client;
pub use protoc::{OutputDir, Protoc};
pub use reverse::ClientBuilder;
pub use source::{DescriptorSource, JsonDescriptorSource};
#[cfg(feature = "prost-reflect")]
pub use source::{descriptor_set_from_pool, FileDescriptorSetSource};
pub use verifier::{verify_references, verify_schema};
