//! TypeScript output: syntax tree and text emission.

pub mod ast;
pub mod emit;

pub use ast::*;
pub use emit::{EmitHook, Emitter, GenPos};

/// Whether `s` can be written as a bare identifier or property name.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_alphabetic() && first != '_' && first != '$' {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Words that are valid Lua names but cannot bind a TypeScript variable.
pub fn is_reserved_word(s: &str) -> bool {
    matches!(
        s,
        "arguments"
            | "await"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "enum"
            | "eval"
            | "export"
            | "extends"
            | "finally"
            | "implements"
            | "import"
            | "instanceof"
            | "interface"
            | "let"
            | "new"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "static"
            | "super"
            | "switch"
            | "this"
            | "throw"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "with"
            | "yield"
            | "undefined"
            | "null"
    )
}

/// Spells a number as a TypeScript literal.
///
/// Integral values print without a fraction; non-finite values are left to
/// the caller.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e21 {
        format!("{}", value as i128)
    } else {
        format!("{value}")
    }
}
