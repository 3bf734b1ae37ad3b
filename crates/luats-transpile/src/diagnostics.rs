//! Problems found while transforming a chunk.

use crate::lua::Span;
use crate::options::Options;

/// The two kinds of report the transformer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticClass {
    /// A construct with no supported translation. Always reported.
    Unsupported,
    /// A translation whose runtime behavior may differ from Lua's. Reported
    /// only when `show_semantic_errors` is set.
    Semantic,
}

/// Append-only, insertion-ordered list of messages.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    show_semantic: bool,
    messages: Vec<String>,
}

impl Diagnostics {
    pub fn new(options: &Options) -> Self {
        Self {
            show_semantic: options.show_semantic_errors,
            messages: Vec::new(),
        }
    }

    pub fn report(&mut self, class: DiagnosticClass, span: Span, message: impl AsRef<str>) {
        if class == DiagnosticClass::Semantic && !self.show_semantic {
            return;
        }
        let message = format!(
            "{}:{}: {}",
            span.start.line,
            span.start.column,
            message.as_ref()
        );
        tracing::trace!(?class, %message, "diagnostic");
        self.messages.push(message);
    }

    pub fn unsupported(&mut self, span: Span, message: impl AsRef<str>) {
        self.report(DiagnosticClass::Unsupported, span, message);
    }

    pub fn semantic(&mut self, span: Span, message: impl AsRef<str>) {
        self.report(DiagnosticClass::Semantic, span, message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.messages
    }

    pub fn into_vec(self) -> Vec<String> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua::Position;

    fn at(line: u32, column: u32) -> Span {
        Span {
            start: Position::new(line, column),
            end: Position::new(line, column),
            start_byte: 0,
            end_byte: 0,
        }
    }

    #[test]
    fn test_semantic_suppressed_by_default() {
        let mut diagnostics = Diagnostics::new(&Options::default());
        diagnostics.semantic(at(1, 0), "truthiness differs");
        diagnostics.unsupported(at(2, 4), "goto statements are not supported");
        assert_eq!(
            diagnostics.as_slice(),
            ["2:4: goto statements are not supported"]
        );
    }

    #[test]
    fn test_order_is_insertion_order() {
        let options = Options {
            show_semantic_errors: true,
            ..Options::default()
        };
        let mut diagnostics = Diagnostics::new(&options);
        diagnostics.semantic(at(5, 0), "b");
        diagnostics.unsupported(at(1, 0), "a");
        let all: Vec<_> = diagnostics.iter().collect();
        assert_eq!(all, vec!["5:0: b", "1:0: a"]);
    }
}
