//! Lua to TypeScript transpilation with provenance-backed source maps.
//!
//! `luats-transpile` lowers a Lua chunk to a TypeScript syntax tree and
//! prints it with a version 3 source map pointing back at the Lua file.
//!
//! # Architecture
//!
//! ```text
//! Lua text ─> lua::parse ─> Chunk ─> transform ─┬─> ts::Program ─┐
//!                                                ├─> ProvenanceMap ┼─> printer ─> code + SourceMap
//!                                                └─> Diagnostics   │
//! ```
//!
//! TypeScript nodes carry no positions. Each has a [`ts::NodeId`], and the
//! transformer records in a [`ProvenanceMap`] which Lua node, if any, it was
//! derived from. The printer turns those records into source map segments.
//!
//! # Example
//!
//! ```ignore
//! use luats_transpile::{Options, transform_lua_to_typescript};
//!
//! let file = transform_lua_to_typescript("local x = 1\nprint(x)", &Options::default(), "main.lua")?;
//! assert_eq!(file.ts_code, "let x = 1;\nconsole.log(x);\n");
//! ```
//!
//! # Fidelity
//!
//! Constructs with no faithful translation (`goto`, operator metamethods,
//! ...) become diagnostics and a call to an injected `__unsupported` helper;
//! translations whose runtime behavior may differ from Lua's are reported
//! only with [`Options::show_semantic_errors`].

pub mod diagnostics;
pub mod lua;
pub mod options;
pub mod printer;
pub mod provenance;
pub mod sourcemap;
pub mod transform;
pub mod transpile;
pub mod ts;

pub use diagnostics::{DiagnosticClass, Diagnostics};
pub use lua::ParseError;
pub use options::Options;
pub use printer::{PrintOutput, print};
pub use provenance::{Provenance, ProvenanceMap, SourceRef};
pub use sourcemap::{SourceMap, SourceMapError};
pub use transform::{Transformed, Transformer, transform};
pub use transpile::{
    TranspileError, TranspileResult, TranspiledFile, transform_lua_to_typescript, transpile,
};
