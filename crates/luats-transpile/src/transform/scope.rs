//! Lexical scopes of the Lua program being lowered.
//!
//! Tracks which Lua names are locals, what TypeScript expression each one
//! lowers to, and the per-function state (varargs, enclosing loops) that
//! statement lowering needs.

use super::{VARARGS, is_temporary};
use crate::ts::is_reserved_word;
use std::collections::BTreeMap;

/// What a Lua local lowers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A TypeScript binding of this name.
    Local(String),
    /// The implicit `self` of a method.
    This,
    /// A static member of the class being generated.
    Static { class: String, name: String },
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub target: Target,
    /// Known to hold a number (numeric `for` and `ipairs` index variables).
    pub numeric: bool,
}

#[derive(Debug, Default)]
struct Frame {
    bindings: Vec<(String, Binding)>,
    /// Set on the outermost frame of a function; `Some(true)` for arrows.
    function: Option<bool>,
}

#[derive(Debug, Default)]
struct FunctionState {
    vararg: bool,
    /// `continue` label of each enclosing loop, innermost last.
    loops: Vec<Option<String>>,
}

#[derive(Debug)]
pub struct Scope {
    frames: Vec<Frame>,
    functions: Vec<FunctionState>,
    renames: BTreeMap<String, u32>,
}

/// Result of resolving a Lua name.
pub struct Resolved<'a> {
    pub binding: &'a Binding,
    /// A non-arrow function lies between the use and the declaration.
    pub crosses_function: bool,
}

impl Scope {
    /// Scope of a chunk: one frame, no varargs.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame {
                bindings: Vec::new(),
                function: Some(false),
            }],
            functions: vec![FunctionState::default()],
            renames: BTreeMap::new(),
        }
    }

    pub fn push_block(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn pop_block(&mut self) {
        self.frames.pop();
    }

    pub fn push_function(&mut self, arrow: bool, vararg: bool) {
        self.frames.push(Frame {
            bindings: Vec::new(),
            function: Some(arrow),
        });
        self.functions.push(FunctionState {
            vararg,
            loops: Vec::new(),
        });
    }

    pub fn pop_function(&mut self) {
        self.frames.pop();
        self.functions.pop();
    }

    /// Statements being lowered run at the top level of the chunk.
    pub fn at_chunk_top(&self) -> bool {
        self.frames.len() == 1
    }

    /// Inside the chunk's own body rather than a function.
    pub fn in_chunk_function(&self) -> bool {
        self.functions.len() == 1
    }

    pub fn has_varargs(&self) -> bool {
        self.functions.last().is_some_and(|f| f.vararg)
    }

    pub fn push_loop(&mut self, continue_label: Option<String>) {
        if let Some(function) = self.functions.last_mut() {
            function.loops.push(continue_label);
        }
    }

    pub fn pop_loop(&mut self) {
        if let Some(function) = self.functions.last_mut() {
            function.loops.pop();
        }
    }

    /// Whether `goto label` can be lowered to `continue`.
    pub fn is_continue_label(&self, label: &str) -> bool {
        self.functions
            .last()
            .and_then(|f| f.loops.last())
            .is_some_and(|l| l.as_deref() == Some(label))
    }

    pub fn in_loop(&self) -> bool {
        self.functions.last().is_some_and(|f| !f.loops.is_empty())
    }

    pub fn resolve(&self, name: &str) -> Option<Resolved<'_>> {
        let mut crosses_function = false;
        for frame in self.frames.iter().rev() {
            if let Some((_, binding)) = frame.bindings.iter().rev().find(|(n, _)| n == name) {
                return Some(Resolved {
                    binding,
                    crosses_function,
                });
            }
            if frame.function == Some(false) {
                crosses_function = true;
            }
        }
        None
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Declares a Lua local and returns the TypeScript name it lowers to.
    ///
    /// The name is changed when it is a TypeScript reserved word, when it is
    /// already declared in the same frame, when it is a name the lowering
    /// itself binds (`varargs` in a vararg function, `_tN` temporaries), or
    /// when `clashes` is set (the initializer refers to the name being
    /// declared).
    pub fn declare(&mut self, name: &str, numeric: bool, clashes: bool) -> String {
        let ts_name = self.binding_name(name, clashes);
        self.bind(
            name,
            Binding {
                target: Target::Local(ts_name.clone()),
                numeric,
            },
        );
        ts_name
    }

    pub fn declare_static(&mut self, name: &str, class: &str) -> String {
        let member = if self.declared_in_frame(name) {
            self.fresh(name)
        } else {
            name.to_string()
        };
        self.bind(
            name,
            Binding {
                target: Target::Static {
                    class: class.to_string(),
                    name: member.clone(),
                },
                numeric: false,
            },
        );
        member
    }

    pub fn declare_self(&mut self) {
        self.bind(
            "self",
            Binding {
                target: Target::This,
                numeric: false,
            },
        );
    }

    fn bind(&mut self, name: &str, binding: Binding) {
        if let Some(frame) = self.frames.last_mut() {
            frame.bindings.push((name.to_string(), binding));
        }
    }

    fn declared_in_frame(&self, name: &str) -> bool {
        self.frames.last().is_some_and(|frame| {
            frame.bindings.iter().any(|(n, b)| {
                n == name || matches!(&b.target, Target::Local(ts) if ts == name)
            })
        })
    }

    /// Names the lowering binds itself in the current function.
    pub fn is_synthetic(&self, name: &str) -> bool {
        (name == VARARGS && self.has_varargs()) || is_temporary(name)
    }

    fn binding_name(&mut self, name: &str, clashes: bool) -> String {
        if clashes || is_reserved_word(name) || self.is_synthetic(name) || self.declared_in_frame(name) {
            self.fresh(name)
        } else {
            name.to_string()
        }
    }

    fn fresh(&mut self, name: &str) -> String {
        loop {
            let counter = self.renames.entry(name.to_string()).or_insert(0);
            *counter += 1;
            let candidate = format!("{name}_{counter}");
            if !self.declared_in_frame(&candidate) && self.resolve(&candidate).is_none() {
                return candidate;
            }
        }
    }
}
