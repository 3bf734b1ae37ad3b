//! Provenance-aware printing: TypeScript text plus a source map.
//!
//! The [`Emitter`] reports where each node starts and ends; the printer
//! turns those boundaries into source map segments using the transformer's
//! [`ProvenanceMap`]. Segment rules:
//!
//! * entering a node with an origin opens a segment at the origin's start;
//!   entering a synthetic node opens nothing, so its text stays with the
//!   enclosing mapped node;
//! * leaving a mapped node reopens the nearest mapped ancestor, or an
//!   unmapped segment at the top level;
//! * at one generated position the outermost node's segment wins and a
//!   reopen gives way to whatever follows it.

use crate::provenance::ProvenanceMap;
use crate::sourcemap::{Mapping, Original, SourceMap};
use crate::ts::{EmitHook, Emitter, GenPos, NodeId, Program};

/// Generated text and its source map.
#[derive(Debug, Clone)]
pub struct PrintOutput {
    pub code: String,
    pub map: SourceMap,
}

/// Prints `program`, mapping it back to the Lua file `source_name`.
pub fn print(
    program: &Program,
    provenance: &ProvenanceMap,
    source_name: &str,
    source_content: Option<&str>,
) -> PrintOutput {
    let mut emitter = Emitter::with_hook(Segments::new(provenance));
    emitter.write_program(program);
    let (code, segments) = emitter.finish();

    let mut map = SourceMap::new(None);
    map.add_source(source_name, source_content.map(str::to_string));
    for (mapping, _) in segments.mappings {
        map.add_mapping(mapping);
    }
    tracing::debug!(
        bytes = code.len(),
        segments = map.mappings.len(),
        "printed program"
    );
    PrintOutput { code, map }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cause {
    Enter,
    Reopen,
}

struct Segments<'p> {
    provenance: &'p ProvenanceMap,
    /// Origins of the mapped nodes being printed, innermost last.
    open: Vec<(NodeId, Original)>,
    mappings: Vec<(Mapping, Cause)>,
}

impl<'p> Segments<'p> {
    fn new(provenance: &'p ProvenanceMap) -> Self {
        Self {
            provenance,
            open: Vec::new(),
            mappings: Vec::new(),
        }
    }

    fn origin(&self, id: NodeId) -> Option<Original> {
        self.provenance.get(id).map(|source| {
            let start = source.start();
            Original {
                source: 0,
                line: start.line,
                column: start.column,
                name: None,
            }
        })
    }

    fn push(&mut self, at: GenPos, original: Option<Original>, cause: Cause) {
        if let Some((last, last_cause)) = self.mappings.last() {
            if (last.generated_line, last.generated_column) == (at.line, at.column) {
                match (last_cause, cause) {
                    (Cause::Enter, Cause::Enter) => return,
                    _ => {
                        self.mappings.pop();
                    }
                }
            }
        }

        let redundant = match self.mappings.last() {
            Some((last, _)) => last.original == original,
            None => original.is_none(),
        };
        if redundant {
            return;
        }
        self.mappings.push((
            Mapping {
                generated_line: at.line,
                generated_column: at.column,
                original,
            },
            cause,
        ));
    }
}

impl EmitHook for Segments<'_> {
    fn enter(&mut self, id: NodeId, at: GenPos) {
        let Some(original) = self.origin(id) else {
            return;
        };
        self.open.push((id, original));
        self.push(at, Some(original), Cause::Enter);
    }

    fn exit(&mut self, id: NodeId, at: GenPos) {
        if self.open.last().is_none_or(|(open, _)| *open != id) {
            return;
        }
        self.open.pop();
        let enclosing = self.open.last().map(|(_, original)| *original);
        self.push(at, enclosing, Cause::Reopen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua;
    use crate::options::Options;
    use crate::transform::transform;

    fn print_lua(source: &str) -> PrintOutput {
        let chunk = lua::parse(source).unwrap();
        let out = transform(&chunk, &Options::default());
        print(&out.program, &out.provenance, "main.lua", Some(source))
    }

    fn segments(output: &PrintOutput) -> Vec<((u32, u32), Option<(u32, u32)>)> {
        output
            .map
            .mappings
            .iter()
            .map(|m| {
                (
                    (m.generated_line, m.generated_column),
                    m.original.map(|o| (o.line, o.column)),
                )
            })
            .collect()
    }

    #[test]
    fn test_statements_map_to_their_lines() {
        let output = print_lua("local x = 1\nprint(x)");
        assert_eq!(output.code, "let x = 1;\nconsole.log(x);\n");
        assert_eq!(
            segments(&output),
            vec![
                ((0, 0), Some((1, 0))),
                ((0, 4), Some((1, 6))),
                ((0, 5), Some((1, 0))),
                ((0, 8), Some((1, 10))),
                ((0, 9), Some((1, 0))),
                ((0, 10), None),
                ((1, 0), Some((2, 0))),
                ((1, 12), Some((2, 6))),
                ((1, 13), Some((2, 0))),
                ((1, 15), None),
            ]
        );
        assert_eq!(
            output.map.to_json().unwrap(),
            r#"{"version":3,"sources":["main.lua"],"sourcesContent":["local x = 1\nprint(x)"],"names":[],"mappings":"AAAA,IAAM,CAAN,GAAU,CAAV,C;AACA,YAAM,CAAN,E"}"#
        );
    }

    #[test]
    fn test_outer_node_wins_at_same_position() {
        // the call statement, the call and the member all start at column 0
        let output = print_lua("t.f()");
        assert_eq!(output.code, "t.f();\n");
        assert_eq!(
            segments(&output),
            vec![((0, 0), Some((1, 0))), ((0, 6), None)]
        );
    }

    #[test]
    fn test_synthetic_program_has_no_segments() {
        let output = print(
            &Program::default(),
            &ProvenanceMap::new(),
            "empty.lua",
            None,
        );
        assert_eq!(output.code, "");
        assert!(output.map.mappings.is_empty());
        assert_eq!(output.map.sources, vec!["empty.lua".to_string()]);
    }
}
