//! TypeScript text emission.
//!
//! [`Emitter`] turns a [`Program`] into source text with fixed formatting
//! (four-space indentation, `\n` newlines, semicolons, parentheses only where
//! precedence requires them). It knows nothing about source maps: it only
//! reports node boundaries to an [`EmitHook`].

use super::ast::*;

/// A position in the generated text: 0-based line, 0-based UTF-16 column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GenPos {
    pub line: u32,
    pub column: u32,
}

/// Receives node boundaries while text is emitted.
///
/// `enter` is called right before the first character of a node is written,
/// `exit` right after its last one. Calls nest like the tree.
pub trait EmitHook {
    fn enter(&mut self, id: NodeId, at: GenPos);
    fn exit(&mut self, id: NodeId, at: GenPos);
}

impl EmitHook for () {
    fn enter(&mut self, _id: NodeId, _at: GenPos) {}
    fn exit(&mut self, _id: NodeId, _at: GenPos) {}
}

/// Lowest precedence that may appear without parentheses in an argument,
/// array element, or initializer.
const ASSIGNMENT: u8 = 2;

pub struct Emitter<H = ()> {
    output: String,
    indent: usize,
    pos: GenPos,
    hook: H,
}

impl Emitter<()> {
    /// Emit a program without tracking node boundaries.
    pub fn emit(program: &Program) -> String {
        let mut emitter = Emitter::with_hook(());
        emitter.write_program(program);
        emitter.finish().0
    }
}

impl<H: EmitHook> Emitter<H> {
    pub fn with_hook(hook: H) -> Self {
        Self {
            output: String::new(),
            indent: 0,
            pos: GenPos { line: 0, column: 0 },
            hook,
        }
    }

    pub fn finish(self) -> (String, H) {
        (self.output, self.hook)
    }

    pub fn write_program(&mut self, program: &Program) {
        for stmt in &program.body {
            self.write_stmt(stmt);
            self.newline();
        }
    }

    fn write(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.pos.line += 1;
                self.pos.column = 0;
            } else {
                self.pos.column += ch.len_utf16() as u32;
            }
        }
        self.output.push_str(text);
    }

    fn newline(&mut self) {
        self.write("\n");
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.write("    ");
        }
    }

    fn enter(&mut self, id: NodeId) {
        self.hook.enter(id, self.pos);
    }

    fn exit(&mut self, id: NodeId) {
        self.hook.exit(id, self.pos);
    }

    fn write_stmt(&mut self, stmt: &Stmt) {
        self.write_indent();
        self.write_stmt_unindented(stmt);
    }

    fn write_stmt_unindented(&mut self, stmt: &Stmt) {
        self.enter(stmt.id);
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                if starts_ambiguously(expr) {
                    self.write("(");
                    self.write_expr(expr, 0);
                    self.write(")");
                } else {
                    self.write_expr(expr, 0);
                }
                self.write(";");
            }

            StmtKind::Var(decl) => {
                self.write_var_decl(decl);
                self.write(";");
            }

            StmtKind::Function(function) => self.write_function(function, false),

            StmtKind::Class(class) => self.write_class(class),

            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.write("if (");
                self.write_expr(test, 0);
                self.write(") ");
                self.write_block_stmt(consequent);
                if let Some(alternate) = alternate {
                    self.write(" else ");
                    if matches!(alternate.kind, StmtKind::If { .. }) {
                        self.write_stmt_unindented(alternate);
                    } else {
                        self.write_block_stmt(alternate);
                    }
                }
            }

            StmtKind::Block(stmts) => self.write_block(stmts),

            StmtKind::While { test, body } => {
                self.write("while (");
                self.write_expr(test, 0);
                self.write(") ");
                self.write_block_stmt(body);
            }

            StmtKind::DoWhile { body, test } => {
                self.write("do ");
                self.write_block_stmt(body);
                self.write(" while (");
                self.write_expr(test, 0);
                self.write(");");
            }

            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                self.write("for (");
                if let Some(init) = init {
                    self.write_var_decl(init);
                }
                self.write(";");
                if let Some(test) = test {
                    self.write(" ");
                    self.write_expr(test, 0);
                }
                self.write(";");
                if let Some(update) = update {
                    self.write(" ");
                    self.write_expr(update, 0);
                }
                self.write(") ");
                self.write_block_stmt(body);
            }

            StmtKind::ForOf {
                kind,
                binding,
                iterable,
                body,
            } => {
                self.write("for (");
                self.write(kind.keyword());
                self.write(" ");
                self.write_pattern(binding);
                self.write(" of ");
                self.write_expr(iterable, ASSIGNMENT);
                self.write(") ");
                self.write_block_stmt(body);
            }

            StmtKind::Return(value) => {
                self.write("return");
                if let Some(value) = value {
                    self.write(" ");
                    self.write_expr(value, 0);
                }
                self.write(";");
            }

            StmtKind::Break => self.write("break;"),
            StmtKind::Continue => self.write("continue;"),

            StmtKind::Throw(value) => {
                self.write("throw ");
                self.write_expr(value, 0);
                self.write(";");
            }

            StmtKind::ImportNamespace { local, source } => {
                self.write("import * as ");
                self.write_ident(local);
                self.write(" from ");
                self.write(&quote(source));
                self.write(";");
            }

            StmtKind::ExportDefault(value) => {
                self.write("export default ");
                self.write_expr(value, ASSIGNMENT);
                self.write(";");
            }

            StmtKind::ExportDefaultClass(class) => {
                self.write("export default ");
                self.write_class(class);
            }

            StmtKind::ExportEmpty => self.write("export {};"),
        }
        self.exit(stmt.id);
    }

    /// Writes a loop or branch body, always braced.
    fn write_block_stmt(&mut self, stmt: &Stmt) {
        if let StmtKind::Block(stmts) = &stmt.kind {
            self.enter(stmt.id);
            self.write_block(stmts);
            self.exit(stmt.id);
        } else {
            self.write("{");
            self.newline();
            self.indent += 1;
            self.write_stmt(stmt);
            self.newline();
            self.indent -= 1;
            self.write_indent();
            self.write("}");
        }
    }

    fn write_block(&mut self, stmts: &[Stmt]) {
        if stmts.is_empty() {
            self.write("{ }");
            return;
        }
        self.write("{");
        self.newline();
        self.indent += 1;
        for stmt in stmts {
            self.write_stmt(stmt);
            self.newline();
        }
        self.indent -= 1;
        self.write_indent();
        self.write("}");
    }

    fn write_var_decl(&mut self, decl: &VarDecl) {
        self.write(decl.kind.keyword());
        self.write(" ");
        for (i, declarator) in decl.declarators.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write_pattern(&declarator.target);
            if let Some(init) = &declarator.init {
                self.write(" = ");
                self.write_expr(init, ASSIGNMENT);
            }
        }
    }

    fn write_pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Ident(ident) => self.write_ident(ident),
            Pattern::Array { id, elements } => {
                self.enter(*id);
                self.write("[");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write_pattern(element);
                }
                self.write("]");
                self.exit(*id);
            }
        }
    }

    fn write_ident(&mut self, ident: &Ident) {
        self.enter(ident.id);
        self.write(&ident.name);
        self.exit(ident.id);
    }

    fn write_params(&mut self, params: &[Param]) {
        self.write("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            if param.rest {
                self.write("...");
            }
            self.write_ident(&param.name);
        }
        self.write(")");
    }

    /// `function name(params) { body }`; `expression` drops the space rule
    /// for anonymous functions (`function (a) {`).
    fn write_function(&mut self, function: &Function, expression: bool) {
        self.write("function");
        if function.is_generator {
            self.write("*");
        }
        match &function.name {
            Some(name) => {
                self.write(" ");
                self.write_ident(name);
            }
            None if expression => self.write(" "),
            None => {}
        }
        self.write_params(&function.params);
        self.write(" ");
        self.write_block(&function.body);
    }

    fn write_arrow(&mut self, function: &Function) {
        self.write_params(&function.params);
        self.write(" => ");

        // A lone `return e;` becomes an expression body.
        if let [
            Stmt {
                id,
                kind: StmtKind::Return(Some(value)),
            },
        ] = function.body.as_slice()
        {
            self.enter(*id);
            if matches!(value.kind, ExprKind::Object(_)) {
                self.write("(");
                self.write_expr(value, 0);
                self.write(")");
            } else {
                self.write_expr(value, ASSIGNMENT);
            }
            self.exit(*id);
            return;
        }

        self.write_block(&function.body);
    }

    fn write_class(&mut self, class: &Class) {
        self.write("class ");
        self.write_ident(&class.name);
        if class.members.is_empty() {
            self.write(" { }");
            return;
        }
        self.write(" {");
        self.newline();
        self.indent += 1;
        for member in &class.members {
            self.write_indent();
            self.write_member(member);
            self.newline();
        }
        self.indent -= 1;
        self.write_indent();
        self.write("}");
    }

    fn write_member(&mut self, member: &ClassMember) {
        self.enter(member.id);
        match &member.kind {
            MemberKind::Method {
                is_static,
                name,
                function,
            } => {
                if *is_static {
                    self.write("static ");
                }
                self.write_ident(name);
                self.write_params(&function.params);
                self.write(" ");
                self.write_block(&function.body);
            }
            MemberKind::Property {
                is_static,
                name,
                value,
            } => {
                if *is_static {
                    self.write("static ");
                }
                self.write_ident(name);
                if let Some(value) = value {
                    self.write(" = ");
                    self.write_expr(value, ASSIGNMENT);
                }
                self.write(";");
            }
            MemberKind::StaticBlock(stmts) => {
                self.write("static ");
                self.write_block(stmts);
            }
        }
        self.exit(member.id);
    }

    /// Writes `expr`, parenthesized if it binds looser than `min_precedence`.
    fn write_expr(&mut self, expr: &Expr, min_precedence: u8) {
        let parens = expr.precedence() < min_precedence;
        if parens {
            self.write("(");
        }
        self.enter(expr.id);
        self.write_expr_kind(expr);
        self.exit(expr.id);
        if parens {
            self.write(")");
        }
    }

    fn write_args(&mut self, args: &[Expr]) {
        self.write("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write_expr(arg, ASSIGNMENT);
        }
        self.write(")");
    }

    fn write_expr_kind(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(name) => self.write(name),
            ExprKind::This => self.write("this"),
            ExprKind::Bool(value) => self.write(if *value { "true" } else { "false" }),
            ExprKind::Number(text) => self.write(text),
            ExprKind::String(value) => self.write(&quote(value)),

            ExprKind::Array(items) => {
                self.write("[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write_expr(item, ASSIGNMENT);
                }
                self.write("]");
            }

            ExprKind::Object(props) => {
                if props.is_empty() {
                    self.write("{}");
                    return;
                }
                self.write("{ ");
                for (i, prop) in props.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write_prop(prop);
                }
                self.write(" }");
            }

            ExprKind::Function(function) => self.write_function(function, true),
            ExprKind::Arrow(function) => self.write_arrow(function),

            ExprKind::Unary { op, operand } => {
                self.write(op.token());
                let ambiguous = *op == UnaryOp::Neg && starts_with_minus(operand);
                if ambiguous {
                    self.write("(");
                    self.write_expr(operand, 0);
                    self.write(")");
                } else {
                    self.write_expr(operand, 15);
                }
            }

            ExprKind::Update {
                op,
                prefix,
                operand,
            } => {
                if *prefix {
                    self.write(op.token());
                    self.write_expr(operand, 15);
                } else {
                    self.write_expr(operand, 17);
                    self.write(op.token());
                }
            }

            ExprKind::Binary { op, left, right } => {
                let precedence = op.precedence();
                let (left_min, right_min) = if op.is_right_associative() {
                    // `-x ** 2` is a syntax error, so unary operands need parens.
                    (16, precedence)
                } else {
                    (precedence, precedence + 1)
                };
                self.write_expr(left, left_min);
                self.write(" ");
                self.write(op.token());
                self.write(" ");
                self.write_expr(right, right_min);
            }

            ExprKind::Assign { op, target, value } => {
                self.write_expr(target, 17);
                self.write(" ");
                self.write(op.token());
                self.write(" ");
                self.write_expr(value, ASSIGNMENT);
            }

            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.write_expr(test, 4);
                self.write(" ? ");
                self.write_expr(consequent, ASSIGNMENT);
                self.write(" : ");
                self.write_expr(alternate, ASSIGNMENT);
            }

            ExprKind::Call { callee, args } => {
                self.write_expr(callee, 17);
                self.write_args(args);
            }

            ExprKind::New { callee, args } => {
                self.write("new ");
                self.write_expr(callee, 18);
                self.write_args(args);
            }

            ExprKind::Member { object, property } => {
                if matches!(object.kind, ExprKind::Number(_)) {
                    self.write("(");
                    self.write_expr(object, 0);
                    self.write(")");
                } else {
                    self.write_expr(object, 17);
                }
                self.write(".");
                self.write(property);
            }

            ExprKind::Index { object, index } => {
                self.write_expr(object, 17);
                self.write("[");
                self.write_expr(index, 0);
                self.write("]");
            }

            ExprKind::Spread(inner) => {
                self.write("...");
                self.write_expr(inner, ASSIGNMENT);
            }

            ExprKind::Paren(inner) => {
                self.write("(");
                self.write_expr(inner, 0);
                self.write(")");
            }

            ExprKind::Yield(value) => {
                self.write("yield");
                if let Some(value) = value {
                    self.write(" ");
                    self.write_expr(value, ASSIGNMENT);
                }
            }
        }
    }

    fn write_prop(&mut self, prop: &Prop) {
        self.enter(prop.id);
        match &prop.key {
            PropKey::Ident(name) => self.write(name),
            PropKey::String(key) => self.write(&quote(key)),
            PropKey::Number(text) => self.write(text),
            PropKey::Computed(key) => {
                self.write("[");
                self.write_expr(key, ASSIGNMENT);
                self.write("]");
            }
        }
        self.write(": ");
        self.write_expr(&prop.value, ASSIGNMENT);
        self.exit(prop.id);
    }
}

/// An expression statement may not begin with `{` or `function`.
fn starts_ambiguously(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Object(_) | ExprKind::Function(_) => true,
        ExprKind::Binary { left, .. } => starts_ambiguously(left),
        ExprKind::Assign { target, .. } => starts_ambiguously(target),
        ExprKind::Conditional { test, .. } => starts_ambiguously(test),
        ExprKind::Call { callee, .. } => starts_ambiguously(callee),
        ExprKind::Member { object, .. } | ExprKind::Index { object, .. } => {
            starts_ambiguously(object)
        }
        ExprKind::Update {
            prefix: false,
            operand,
            ..
        } => starts_ambiguously(operand),
        _ => false,
    }
}

fn starts_with_minus(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Number(text) => text.starts_with('-'),
        ExprKind::Unary { op, .. } => *op == UnaryOp::Neg,
        ExprKind::Update {
            op: UpdateOp::Decrement,
            prefix: true,
            ..
        } => true,
        _ => false,
    }
}

/// Double-quoted TypeScript string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\u{0b}' => out.push_str("\\v"),
            '\0' => out.push_str("\\0"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance::Provenance;
    use crate::transform::Builder;

    fn program(build: impl FnOnce(&mut Builder) -> Vec<Stmt>) -> String {
        let mut b = Builder::new();
        let body = build(&mut b);
        Emitter::emit(&Program::new(body))
    }

    fn num(b: &mut Builder, value: &str) -> Expr {
        b.expr(Provenance::Synthetic, ExprKind::Number(value.to_string()))
    }

    fn ident(b: &mut Builder, name: &str) -> Expr {
        b.expr(Provenance::Synthetic, ExprKind::Ident(name.to_string()))
    }

    fn binary(b: &mut Builder, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        b.expr(
            Provenance::Synthetic,
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }

    #[test]
    fn test_let_and_call() {
        let ts = program(|b| {
            let one = num(b, "1");
            let decl = b.let_decl(Provenance::Synthetic, "x", Some(one));
            let console = ident(b, "console");
            let log = b.member(Provenance::Synthetic, console, "log");
            let x = ident(b, "x");
            let call = b.call(Provenance::Synthetic, log, vec![x]);
            let stmt = b.expr_stmt(Provenance::Synthetic, call);
            vec![decl, stmt]
        });
        assert_eq!(ts, "let x = 1;\nconsole.log(x);\n");
    }

    #[test]
    fn test_precedence_parens() {
        let ts = program(|b| {
            // (a + b) * c and a - (b - c)
            let sum = {
                let (a, bb) = (ident(b, "a"), ident(b, "b"));
                binary(b, BinaryOp::Add, a, bb)
            };
            let c = ident(b, "c");
            let product = binary(b, BinaryOp::Mul, sum, c);
            let inner = {
                let (bb, c) = (ident(b, "b"), ident(b, "c"));
                binary(b, BinaryOp::Sub, bb, c)
            };
            let a = ident(b, "a");
            let diff = binary(b, BinaryOp::Sub, a, inner);
            vec![
                b.expr_stmt(Provenance::Synthetic, product),
                b.expr_stmt(Provenance::Synthetic, diff),
            ]
        });
        assert_eq!(ts, "(a + b) * c;\na - (b - c);\n");
    }

    #[test]
    fn test_exponent_with_unary_operand() {
        let ts = program(|b| {
            let x = ident(b, "x");
            let neg = b.expr(
                Provenance::Synthetic,
                ExprKind::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(x),
                },
            );
            let two = num(b, "2");
            let pow = binary(b, BinaryOp::Exp, neg, two);
            vec![b.expr_stmt(Provenance::Synthetic, pow)]
        });
        assert_eq!(ts, "(-x) ** 2;\n");
    }

    #[test]
    fn test_if_else_chain_and_blocks() {
        let ts = program(|b| {
            let brk = b.stmt(Provenance::Synthetic, StmtKind::Break);
            let then = b.block(Provenance::Synthetic, vec![brk]);
            let inner_if = {
                let test = ident(b, "d");
                let empty = b.block(Provenance::Synthetic, vec![]);
                b.stmt(
                    Provenance::Synthetic,
                    StmtKind::If {
                        test,
                        consequent: Box::new(empty),
                        alternate: None,
                    },
                )
            };
            let test = ident(b, "c");
            let outer = b.stmt(
                Provenance::Synthetic,
                StmtKind::If {
                    test,
                    consequent: Box::new(then),
                    alternate: Some(Box::new(inner_if)),
                },
            );
            vec![outer]
        });
        assert_eq!(ts, "if (c) {\n    break;\n} else if (d) { }\n");
    }

    #[test]
    fn test_object_statement_is_wrapped() {
        let ts = program(|b| {
            let obj = b.expr(Provenance::Synthetic, ExprKind::Object(vec![]));
            let member = b.member(Provenance::Synthetic, obj, "x");
            vec![b.expr_stmt(Provenance::Synthetic, member)]
        });
        assert_eq!(ts, "({}.x);\n");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(quote("a\"b\\c\n"), r#""a\"b\\c\n""#);
        assert_eq!(quote("\u{7}"), r#""\u0007""#);
    }

    struct Recorder(Vec<(bool, NodeId, GenPos)>);

    impl EmitHook for Recorder {
        fn enter(&mut self, id: NodeId, at: GenPos) {
            self.0.push((true, id, at));
        }
        fn exit(&mut self, id: NodeId, at: GenPos) {
            self.0.push((false, id, at));
        }
    }

    #[test]
    fn test_hook_sees_nested_boundaries() {
        let mut b = Builder::new();
        let one = num(&mut b, "1");
        let one_id = one.id;
        let decl = b.let_decl(Provenance::Synthetic, "x", Some(one));
        let decl_id = decl.id;

        let mut emitter = Emitter::with_hook(Recorder(Vec::new()));
        emitter.write_program(&Program::new(vec![decl]));
        let (text, Recorder(events)) = emitter.finish();

        assert_eq!(text, "let x = 1;\n");
        let at = |column| GenPos { line: 0, column };
        assert_eq!(events.first(), Some(&(true, decl_id, at(0))));
        assert!(events.contains(&(true, one_id, at(8))));
        assert!(events.contains(&(false, one_id, at(9))));
        assert_eq!(events.last(), Some(&(false, decl_id, at(10))));
    }
}
