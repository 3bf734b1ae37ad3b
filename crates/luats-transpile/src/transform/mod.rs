//! Lua AST to TypeScript AST lowering.
//!
//! A [`Transformer`] lowers one chunk. Every TypeScript node it builds is
//! registered in its [`ProvenanceMap`] as it is created, and constructs that
//! cannot be translated faithfully are reported to its [`Diagnostics`]. The
//! transformer never fails: untranslatable code becomes a call to an injected
//! `__unsupported` helper so the output is still a complete program.

mod builder;
mod classmod;
mod expr;
mod helpers;
mod scope;
mod stdlib;
mod stmt;

pub use builder::Builder;

use crate::diagnostics::Diagnostics;
use crate::lua::{self, ExprKind as L, FieldKind, StmtKind as S};
use crate::options::Options;
use crate::provenance::{Provenance::Synthetic, ProvenanceMap};
use crate::ts::{Program, Stmt, StmtKind};
use helpers::Helpers;
use scope::Scope;
use std::collections::BTreeMap;

/// Name of the rest parameter that receives a function's `...`.
const VARARGS: &str = "varargs";

/// Result of lowering a chunk.
#[derive(Debug)]
pub struct Transformed {
    pub program: Program,
    pub provenance: ProvenanceMap,
    pub diagnostics: Diagnostics,
}

/// Lowers `chunk` with a fresh transformer.
pub fn transform(chunk: &lua::Chunk, options: &Options) -> Transformed {
    let mut transformer = Transformer::new(*options);
    let body = transformer.transform_chunk(chunk);
    let (provenance, diagnostics) = transformer.into_parts();
    Transformed {
        program: Program::new(body),
        provenance,
        diagnostics,
    }
}

pub struct Transformer {
    options: Options,
    b: Builder,
    diagnostics: Diagnostics,
    scope: Scope,
    helpers: Helpers,
    temps: u32,
    /// Lua name of the class table in classmod output.
    class: Option<String>,
    /// How many `function f()` statements define each bare name, anywhere
    /// in the chunk.
    global_functions: BTreeMap<String, usize>,
}

impl Transformer {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            b: Builder::new(),
            diagnostics: Diagnostics::new(&options),
            scope: Scope::new(),
            helpers: Helpers::default(),
            temps: 0,
            class: None,
            global_functions: BTreeMap::new(),
        }
    }

    pub fn provenance(&self) -> &ProvenanceMap {
        self.b.provenance()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (ProvenanceMap, Diagnostics) {
        (self.b.into_provenance(), self.diagnostics)
    }

    /// Lowers a whole chunk to the statements of a TypeScript file.
    pub fn transform_chunk(&mut self, chunk: &lua::Chunk) -> Vec<Stmt> {
        let _span = tracing::debug_span!(
            "transform",
            module = self.options.module,
            classmod = self.options.classmod
        )
        .entered();

        count_global_functions(&chunk.body, &mut self.global_functions);
        let body = if self.options.classmod {
            self.lower_classmod(chunk)
        } else {
            self.lower_chunk(chunk)
        };

        let mut stmts = self.helpers.declarations(&mut self.b);
        stmts.extend(body);
        tracing::debug!(
            nodes = self.b.provenance().len(),
            diagnostics = self.diagnostics.len(),
            "lowered chunk"
        );
        stmts
    }

    /// Script or module output: the chunk's statements in order, with the
    /// trailing `return` turned into the module's default export.
    fn lower_chunk(&mut self, chunk: &lua::Chunk) -> Vec<Stmt> {
        let (stmts, trailing) = split_trailing_return(&chunk.body);
        let mut out = Vec::with_capacity(stmts.len() + 1);
        for stmt in stmts {
            self.lower_stmt(stmt, &mut out);
        }

        match trailing {
            Some((stmt, values)) if self.options.module => {
                let kind = match self.lower_return_values(values) {
                    Some(value) => StmtKind::ExportDefault(value),
                    None => StmtKind::ExportEmpty,
                };
                out.push(self.b.stmt(stmt, kind));
            }
            Some((_, values)) => {
                // a script has nowhere to return to; keep only the effects
                for value in values.iter().filter(|v| contains_call(v)) {
                    let lowered = self.lower_expr(value);
                    out.push(self.b.expr_stmt(value, lowered));
                }
            }
            None if self.options.module => {
                out.push(self.b.stmt(Synthetic, StmtKind::ExportEmpty));
            }
            None => {}
        }
        out
    }

    /// A fresh temporary name.
    fn temp(&mut self) -> String {
        self.temps += 1;
        format!("_t{}", self.temps)
    }
}

/// Whether `name` has the shape of a temporary (`_t` followed by digits).
fn is_temporary(name: &str) -> bool {
    name.strip_prefix("_t")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Splits off a `return` that ends the block.
fn split_trailing_return(block: &lua::Block) -> (&[lua::Stmt], Option<(&lua::Stmt, &[lua::Expr])>) {
    match block.stmts.split_last() {
        Some((
            last @ lua::Stmt {
                kind: S::Return(values),
                ..
            },
            rest,
        )) => (rest, Some((last, values.as_slice()))),
        _ => (&block.stmts, None),
    }
}

/// Whether evaluating `expr` may call a function.
fn contains_call(expr: &lua::Expr) -> bool {
    match &expr.kind {
        L::Call { .. } | L::MethodCall { .. } => true,
        L::Binary { lhs, rhs, .. } => contains_call(lhs) || contains_call(rhs),
        L::Unary { operand, .. } => contains_call(operand),
        L::Paren(inner) => contains_call(inner),
        L::Index { object, key } => contains_call(object) || contains_call(key),
        L::Field { object, .. } => contains_call(object),
        L::Table(fields) => fields.iter().any(|field| match &field.kind {
            FieldKind::Positional(value) | FieldKind::Named(_, value) => contains_call(value),
            FieldKind::Keyed(key, value) => contains_call(key) || contains_call(value),
        }),
        _ => false,
    }
}

/// Blocks directly nested in `stmt`, function bodies included.
fn nested_blocks(stmt: &lua::Stmt) -> Vec<&lua::Block> {
    match &stmt.kind {
        S::Do(body)
        | S::While { body, .. }
        | S::Repeat { body, .. }
        | S::NumericFor { body, .. }
        | S::GenericFor { body, .. } => vec![body],
        S::If {
            clauses,
            else_body,
        } => clauses
            .iter()
            .map(|clause| &clause.body)
            .chain(else_body.as_ref())
            .collect(),
        S::Function { func, .. } | S::LocalFunction { func, .. } => vec![&func.body],
        _ => Vec::new(),
    }
}

/// Expressions `stmt` evaluates itself, not those of nested blocks.
fn stmt_exprs(stmt: &lua::Stmt) -> Vec<&lua::Expr> {
    match &stmt.kind {
        S::Local { values, .. } | S::Return(values) => values.iter().collect(),
        S::Assign { targets, values } => targets.iter().chain(values).collect(),
        S::Call(call) => vec![call],
        S::While { cond, .. } | S::Repeat { cond, .. } => vec![cond],
        S::If { clauses, .. } => clauses.iter().map(|clause| &clause.cond).collect(),
        S::NumericFor {
            start, limit, step, ..
        } => [start, limit].into_iter().chain(step.as_ref()).collect(),
        S::GenericFor { exprs, .. } => exprs.iter().collect(),
        _ => Vec::new(),
    }
}

/// Whether `check` holds for any function expression written inside `expr`.
fn any_function_in(expr: &lua::Expr, check: &mut dyn FnMut(&lua::FuncBody) -> bool) -> bool {
    match &expr.kind {
        L::Function(body) => check(body),
        L::Binary { lhs, rhs, .. } => any_function_in(lhs, check) || any_function_in(rhs, check),
        L::Unary { operand, .. } => any_function_in(operand, check),
        L::Paren(inner) => any_function_in(inner, check),
        L::Field { object, .. } => any_function_in(object, check),
        L::Index { object, key } => any_function_in(object, check) || any_function_in(key, check),
        L::Call { callee, args } => {
            any_function_in(callee, check) || args.iter().any(|a| any_function_in(a, check))
        }
        L::MethodCall { object, args, .. } => {
            any_function_in(object, check) || args.iter().any(|a| any_function_in(a, check))
        }
        L::Table(fields) => fields.iter().any(|field| match &field.kind {
            FieldKind::Positional(value) | FieldKind::Named(_, value) => {
                any_function_in(value, check)
            }
            FieldKind::Keyed(key, value) => {
                any_function_in(key, check) || any_function_in(value, check)
            }
        }),
        _ => false,
    }
}

/// Counts `function f()` statements per bare name in `block` and everything
/// nested in it.
fn count_global_functions(block: &lua::Block, counts: &mut BTreeMap<String, usize>) {
    for stmt in &block.stmts {
        if let S::Function { name, .. } = &stmt.kind {
            if let [root] = name.path.as_slice() {
                if name.method.is_none() {
                    *counts.entry(root.as_str().to_string()).or_default() += 1;
                }
            }
        }
        for nested in nested_blocks(stmt) {
            count_global_functions(nested, counts);
        }
        for expr in stmt_exprs(stmt) {
            any_function_in(expr, &mut |body| {
                count_global_functions(&body.body, counts);
                false
            });
        }
    }
}

/// Whether `expr` reads the name `name`, not looking into nested functions.
fn mentions(expr: &lua::Expr, name: &str) -> bool {
    match &expr.kind {
        L::Name(n) => n == name,
        L::Binary { lhs, rhs, .. } => mentions(lhs, name) || mentions(rhs, name),
        L::Unary { operand, .. } => mentions(operand, name),
        L::Paren(inner) => mentions(inner, name),
        L::Index { object, key } => mentions(object, name) || mentions(key, name),
        L::Field { object, .. } => mentions(object, name),
        L::Call { callee, args } => mentions(callee, name) || args.iter().any(|a| mentions(a, name)),
        L::MethodCall { object, args, .. } => {
            mentions(object, name) || args.iter().any(|a| mentions(a, name))
        }
        L::Table(fields) => fields.iter().any(|field| match &field.kind {
            FieldKind::Positional(value) | FieldKind::Named(_, value) => mentions(value, name),
            FieldKind::Keyed(key, value) => mentions(key, name) || mentions(value, name),
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::Emitter;

    fn lower(source: &str, options: Options) -> (String, Vec<String>) {
        let chunk = lua::parse(source).unwrap();
        let out = transform(&chunk, &options);
        (Emitter::emit(&out.program), out.diagnostics.into_vec())
    }

    fn script(source: &str) -> String {
        let (ts, diagnostics) = lower(source, Options::default());
        assert_eq!(diagnostics, Vec::<String>::new());
        ts
    }

    fn module() -> Options {
        Options {
            module: true,
            ..Options::default()
        }
    }

    fn semantic() -> Options {
        Options {
            show_semantic_errors: true,
            ..Options::default()
        }
    }

    #[test]
    fn test_locals() {
        assert_eq!(script("local x = 1\nprint(x)"), "let x = 1;\nconsole.log(x);\n");
        assert_eq!(script("local a, b = 1, 2"), "let a = 1;\nlet b = 2;\n");
        assert_eq!(script("local a"), "let a;\n");
        assert_eq!(script("local n <const> = 5"), "const n = 5;\n");
    }

    #[test]
    fn test_local_destructures_multiple_results() {
        assert_eq!(script("local a, b = f()"), "let [a, b] = f();\n");
        assert_eq!(script("local a, b, c = 1, f()"), "let a = 1;\nlet [b, c] = f();\n");
    }

    #[test]
    fn test_local_redeclaration_and_self_reference() {
        assert_eq!(
            script("local x = 1\nlocal x = x + 1"),
            "let x = 1;\nlet x_1 = x + 1;\n"
        );
        assert_eq!(script("local print = print"), "let print_1 = print;\n");
    }

    #[test]
    fn test_multiple_assignment_swaps() {
        assert_eq!(script("a, b = b, a"), "[a, b] = [b, a];\n");
        assert_eq!(script("a, b = f()"), "[a, b] = f();\n");
    }

    #[test]
    fn test_operators() {
        assert_eq!(script("x = a // b"), "x = Math.floor(a / b);\n");
        assert_eq!(script("x = a ^ 2"), "x = a ** 2;\n");
        assert_eq!(script("x = a == b"), "x = a === b;\n");
        assert_eq!(script("x = a ~= nil"), "x = a !== undefined;\n");
        assert_eq!(script("x = \"a\" .. b"), "x = \"a\" + b;\n");
        assert_eq!(script("x = a .. b"), "x = String(a) + b;\n");
        assert_eq!(script("x = #t"), "x = t.length;\n");
        assert_eq!(script("x = (a + b) * c"), "x = (a + b) * c;\n");
    }

    #[test]
    fn test_indexing() {
        assert_eq!(script("x = t[1]"), "x = t[0];\n");
        assert_eq!(script("x = t[\"key\"]"), "x = t.key;\n");
        assert_eq!(script("x = t[\"a b\"]"), "x = t[\"a b\"];\n");
        assert_eq!(script("x = t[#t + 1]"), "x = t[t.length];\n");
        assert_eq!(script("for i = 1, 3 do x = t[i] end"), "for (let i = 1; i <= 3; i++) {\n    x = t[i - 1];\n}\n");
    }

    #[test]
    fn test_unknown_index_is_a_semantic_warning() {
        let (ts, diagnostics) = lower("x = t[k]", semantic());
        assert_eq!(ts, "x = t[k];\n");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].starts_with("1:6: "));
        let (_, hidden) = lower("x = t[k]", Options::default());
        assert!(hidden.is_empty());
    }

    #[test]
    fn test_tables() {
        assert_eq!(script("t = {1, 2}"), "t = [1, 2];\n");
        assert_eq!(script("t = {}"), "t = {};\n");
        assert_eq!(
            script("t = {x = 1, [\"y z\"] = 2}"),
            "t = { x: 1, \"y z\": 2 };\n"
        );
        assert_eq!(script("t = {\"a\", n = 1}"), "t = { 0: \"a\", n: 1 };\n");
    }

    #[test]
    fn test_functions() {
        assert_eq!(
            script("local function add(a, b) return a + b end"),
            "function add(a, b) {\n    return a + b;\n}\n"
        );
        assert_eq!(
            script("function M.util.f() end"),
            "M.util.f = function () { };\n"
        );
        assert_eq!(
            script("function Point:len() return self.x end"),
            "Point.len = function () {\n    return this.x;\n};\n"
        );
        assert_eq!(script("f = function(x) return x * 2 end"), "f = (x) => x * 2;\n");
        assert_eq!(
            script("local function f(...) return select(\"#\", ...) end"),
            "function f(...varargs) {\n    return varargs.length;\n}\n"
        );
        assert_eq!(
            script("local function f(...) g(1, ...) end"),
            "function f(...varargs) {\n    g(1, ...varargs);\n}\n"
        );
    }

    #[test]
    fn test_control_flow() {
        assert_eq!(
            script("if a then b() elseif c then d() else e() end"),
            "if (a) {\n    b();\n} else if (c) {\n    d();\n} else {\n    e();\n}\n"
        );
        assert_eq!(script("while x do x = f() end"), "while (x) {\n    x = f();\n}\n");
        assert_eq!(script("repeat x = f() until x"), "do {\n    x = f();\n} while (!x);\n");
        assert_eq!(
            script("repeat local y = f() until y"),
            "while (true) {\n    let y = f();\n    if (y) {\n        break;\n    }\n}\n"
        );
        assert_eq!(script("do local a = 1 end"), "{\n    let a = 1;\n}\n");
    }

    #[test]
    fn test_numeric_for_steps() {
        assert_eq!(
            script("for i = 10, 1, -1 do f(i) end"),
            "for (let i = 10; i >= 1; i--) {\n    f(i);\n}\n"
        );
        assert_eq!(
            script("for i = 1, 9, 2 do f(i) end"),
            "for (let i = 1; i <= 9; i += 2) {\n    f(i);\n}\n"
        );
        assert_eq!(
            script("for i = 1, n, s do f(i) end"),
            "for (let i = 1; s >= 0 ? i <= n : i >= n; i += s) {\n    f(i);\n}\n"
        );
        assert_eq!(
            script("for i = 1, count() do f(i) end"),
            "const _t1 = count();\nfor (let i = 1; i <= _t1; i++) {\n    f(i);\n}\n"
        );
    }

    #[test]
    fn test_generic_for() {
        assert_eq!(
            script("for i, v in ipairs(t) do print(i, v) end"),
            "for (let i = 1; i <= t.length; i++) {\n    const v = t[i - 1];\n    console.log(i, v);\n}\n"
        );
        assert_eq!(
            script("for k, v in pairs(t) do print(k, v) end"),
            "for (const [k, v] of Object.entries(t)) {\n    console.log(k, v);\n}\n"
        );
        assert_eq!(
            script("for k in pairs(t) do print(k) end"),
            "for (const k of Object.keys(t)) {\n    console.log(k);\n}\n"
        );
        let ts = script("for w in words() do print(w) end");
        assert!(ts.starts_with("function* __luaIterate(f, s, c) {"));
        assert!(ts.ends_with("for (const [w] of __luaIterate(words())) {\n    console.log(w);\n}\n"));
    }

    #[test]
    fn test_goto_continue() {
        assert_eq!(
            script("for i = 1, 3 do\n  if i == 2 then goto continue end\n  print(i)\n  ::continue::\nend"),
            "for (let i = 1; i <= 3; i++) {\n    if (i === 2) {\n        continue;\n    }\n    console.log(i);\n}\n"
        );
    }

    #[test]
    fn test_other_goto_is_unsupported() {
        let (ts, diagnostics) = lower("goto done\nprint(1)\n::done::", Options::default());
        assert_eq!(
            diagnostics,
            vec![
                "1:0: goto statements are not supported (`goto done`)",
                "3:0: labels are not supported (`::done::`)",
            ]
        );
        assert!(ts.starts_with("function __unsupported(construct) {"));
        assert!(ts.ends_with("__unsupported(\"goto\");\nconsole.log(1);\n__unsupported(\"label\");\n"));
    }

    #[test]
    fn test_stdlib() {
        assert_eq!(script("x = tostring(1)"), "x = String(1);\n");
        assert_eq!(script("x = math.floor(y)"), "x = Math.floor(y);\n");
        assert_eq!(script("x = math.huge"), "x = Infinity;\n");
        assert_eq!(script("table.insert(t, v)"), "t.push(v);\n");
        assert_eq!(script("x = table.concat(t, \",\")"), "x = t.join(\",\");\n");
        assert_eq!(script("x = (\"a\" .. s):upper()"), "x = (\"a\" + s).toUpperCase();\n");
        assert_eq!(script("x = (\"ab\"):len()"), "x = (\"ab\").length;\n");
        assert_eq!(script("x = tonumber(s, 16)"), "x = parseInt(s, 16);\n");
        assert_eq!(script("x = table.remove(t)"), "x = t.pop();\n");
        assert_eq!(script("x = table.remove(t, 1)"), "x = t.splice(0, 1)[0];\n");
        assert_eq!(
            script("local function f(...) return select(2, ...) end"),
            "function f(...varargs) {\n    return varargs.slice(1);\n}\n"
        );
        assert_eq!(script("error(\"boom\")"), "throw new Error(\"boom\");\n");
        assert_eq!(script("f(table.unpack(t))"), "f(...t);\n");
    }

    #[test]
    fn test_string_methods_need_a_string_receiver() {
        let source = "function Point:len() return self.x end\nprint(p:len())";
        let (ts, diagnostics) = lower(source, semantic());
        assert!(ts.ends_with("console.log(p.len());\n"), "{ts}");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].starts_with("2:6: "), "{diagnostics:?}");
        assert!(diagnostics[0].contains("`:len()`"), "{diagnostics:?}");

        assert_eq!(script("x = s:upper()"), "x = s.upper();\n");
        let (_, diagnostics) = lower("x = s:find(\"a\")", semantic());
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn test_untranslated_library_functions_are_unsupported() {
        for (source, column, function) in [
            ("x = math.random(1, 6)", 4, "math.random"),
            ("x = string.format(\"%d\", 1)", 4, "string.format"),
            ("x = (\"ab\"):sub(1, 1)", 4, "string.sub"),
            ("os.exit(0)", 0, "os.exit"),
            ("x = math.maxinteger", 4, "math.maxinteger"),
        ] {
            let (ts, diagnostics) = lower(source, Options::default());
            assert_eq!(
                diagnostics,
                vec![format!("1:{column}: `{function}` has no TypeScript counterpart")],
                "{source}"
            );
            assert!(ts.contains(&format!("__unsupported(\"{function}\")")), "{ts}");
        }
    }

    #[test]
    fn test_shadowed_library_is_left_alone() {
        assert_eq!(
            script("local function print(x) end\nprint(1)"),
            "function print(x) { }\nprint(1);\n"
        );
    }

    #[test]
    fn test_metatable_operators_are_unsupported() {
        let (ts, diagnostics) = lower(
            "setmetatable(v, { __index = V, __add = add })",
            Options::default(),
        );
        assert_eq!(ts, "Object.setPrototypeOf(v, V);\n");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].contains("`__add`"));
    }

    #[test]
    fn test_metatable_warnings() {
        let (ts, diagnostics) = lower("setmetatable(o, mt)", semantic());
        assert_eq!(ts, "Object.setPrototypeOf(o, mt);\n");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].starts_with("1:16: metatable contents are unknown"), "{diagnostics:?}");

        let (ts, diagnostics) = lower("x = getmetatable(o)", semantic());
        assert_eq!(ts, "x = Object.getPrototypeOf(o);\n");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].starts_with("1:4: "), "{diagnostics:?}");

        let (ts, diagnostics) = lower(
            "setmetatable(o, { __index = function(t, k) return k end })",
            Options::default(),
        );
        assert!(ts.starts_with("Object.setPrototypeOf(o, "), "{ts}");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].contains("`__index` functions are not supported"), "{diagnostics:?}");
    }

    #[test]
    fn test_close_attribute_is_unsupported() {
        let (ts, diagnostics) = lower("local f <close> = open()", Options::default());
        assert_eq!(ts, "const f = open();\n");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].starts_with("1:"), "{diagnostics:?}");
        assert!(diagnostics[0].contains("(`<close>`) are not supported"), "{diagnostics:?}");
    }

    #[test]
    fn test_global_function_declarations() {
        assert_eq!(
            script("function f() return 1 end"),
            "function f() {\n    return 1;\n}\n"
        );
        // defined inside another function: still a global once `setup` runs
        assert_eq!(
            script("local function setup() function helper() return 1 end end\nsetup()\nprint(helper())"),
            "function setup() {\n    globalThis.helper = function () {\n        return 1;\n    };\n}\nsetup();\nconsole.log(helper());\n"
        );
        // defined twice: each definition takes effect where it is written
        assert_eq!(
            script("function f() return 1 end\nprint(f())\nfunction f() return 2 end"),
            "globalThis.f = function () {\n    return 1;\n};\nconsole.log(f());\nglobalThis.f = function () {\n    return 2;\n};\n"
        );
        assert_eq!(
            script("if x then function g() end end"),
            "if (x) {\n    globalThis.g = function () { };\n}\n"
        );
    }

    #[test]
    fn test_vararg_return_keeps_every_value() {
        assert_eq!(
            script("local function id(...) return ... end\nlocal a, b = id(1, 2)"),
            "function id(...varargs) {\n    return varargs;\n}\nlet [a, b] = id(1, 2);\n"
        );
        assert_eq!(
            script("local function f(...) return 0, ... end"),
            "function f(...varargs) {\n    return [0, ...varargs];\n}\n"
        );
    }

    #[test]
    fn test_generated_names_do_not_capture_user_names() {
        assert_eq!(
            script("local function f(varargs, ...) return varargs end"),
            "function f(varargs_1, ...varargs) {\n    return varargs_1;\n}\n"
        );
        assert_eq!(
            script("local function g(...) local varargs = 5 return ... end"),
            "function g(...varargs) {\n    let varargs_1 = 5;\n    return varargs;\n}\n"
        );
        assert_eq!(
            script("local _t1 = 1\nfor i = 1, f() do print(_t1) end"),
            "let _t1_1 = 1;\nconst _t1 = f();\nfor (let i = 1; i <= _t1; i++) {\n    console.log(_t1_1);\n}\n"
        );
        assert_eq!(script("local await = 1"), "let await_1 = 1;\n");
    }

    #[test]
    fn test_leading_zero_numerals() {
        assert_eq!(script("local x = 010"), "let x = 10;\n");
        assert_eq!(script("local x = 0.5"), "let x = 0.5;\n");
    }

    #[test]
    fn test_loop_variable_assigned_in_closure_is_mutable() {
        let ts = script("for _, v in ipairs(t) do local g = function() v = 1 end g() end");
        assert!(ts.contains("    let v = t[_ - 1];\n"), "{ts}");
        let ts = script("for k, v in pairs(t) do h(function() k = nil end) end");
        assert!(ts.starts_with("for (let [k, v] of Object.entries(t)) {"), "{ts}");
    }

    #[test]
    fn test_assigned_loop_counter_is_a_copy() {
        assert_eq!(
            script("for i = 1, 3 do i = i * 10 print(i) end"),
            "for (let _t1 = 1; _t1 <= 3; _t1++) {\n    let i = _t1;\n    i = i * 10;\n    console.log(i);\n}\n"
        );
        assert_eq!(
            script("for i, v in ipairs(t) do i = 0 print(v) end"),
            "for (let _t1 = 1; _t1 <= t.length; _t1++) {\n    let i = _t1;\n    const v = t[_t1 - 1];\n    i = 0;\n    console.log(v);\n}\n"
        );
    }

    #[test]
    fn test_module_exports_trailing_return() {
        let (ts, diagnostics) = lower("local M = {}\nreturn M", module());
        assert!(diagnostics.is_empty());
        assert_eq!(ts, "let M = {};\nexport default M;\n");

        let (ts, _) = lower("print(1)", module());
        assert_eq!(ts, "console.log(1);\nexport {};\n");

        let (ts, _) = lower("local json = require(\"lib.json\")\nreturn json", module());
        assert_eq!(ts, "import * as json from \"lib/json\";\nexport default json;\n");
    }

    #[test]
    fn test_script_drops_trailing_return() {
        assert_eq!(script("local M = {}\nreturn M"), "let M = {};\n");
        assert_eq!(script("return main()"), "main();\n");
    }

    #[test]
    fn test_nested_chunk_return_is_unsupported() {
        let (_, diagnostics) = lower("if x then return end\nprint(1)", Options::default());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].starts_with("1:10: "));
    }

    #[test]
    fn test_chunk_varargs_are_unsupported() {
        let (ts, diagnostics) = lower("print(...)", Options::default());
        assert_eq!(diagnostics.len(), 1);
        assert!(ts.ends_with("console.log(__unsupported(\"...\"));\n"));
    }

    #[test]
    fn test_temporaries_are_deterministic() {
        let source = "for i = 1, f() do end\nfor j = 1, g() do end";
        let first = script(source);
        assert_eq!(first, script(source));
        assert!(first.contains("const _t1 = f();"));
        assert!(first.contains("const _t2 = g();"));
    }
}
