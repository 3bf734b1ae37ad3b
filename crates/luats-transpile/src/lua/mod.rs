//! Lua front end: the typed syntax tree and the tree-sitter backed parser.

pub mod ast;
mod parse;

pub use ast::{
    BinaryOp, Block, Chunk, Expr, ExprKind, Field, FieldKind, FuncBody, FuncName, IfClause,
    LocalName, Name, NodeKind, NumberLit, Position, Span, Stmt, StmtKind, UnaryOp,
};
pub use parse::parse;

/// Error that can occur when parsing Lua source.
///
/// A parse error ends the pipeline for that file; the transformer never sees
/// a partial tree.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to load the Lua grammar: {0}")]
    Grammar(String),

    #[error("parser produced no tree")]
    NoTree,

    #[error("syntax error at {line}:{column}: unexpected `{text}`")]
    Syntax {
        line: u32,
        column: u32,
        text: String,
    },

    #[error("{line}:{column}: expected {expected}, got {got}")]
    UnexpectedNode {
        line: u32,
        column: u32,
        expected: &'static str,
        got: String,
    },

    #[error("{line}:{column}: malformed {what}: {text}")]
    Malformed {
        line: u32,
        column: u32,
        what: &'static str,
        text: String,
    },
}
