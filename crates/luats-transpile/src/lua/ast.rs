//! Typed Lua syntax tree.
//!
//! Every node carries the [`Span`] it was parsed from. The tree is built once
//! by [`crate::lua::parse`] and is read-only afterwards.

use serde::Serialize;

/// A point in the Lua source: 1-based line, 0-based column in UTF-16 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Source range of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
    pub start_byte: usize,
    pub end_byte: usize,
}

/// A parsed file.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// An identifier occurrence.
#[derive(Debug, Clone)]
pub struct Name {
    pub name: String,
    pub span: Span,
}

impl Name {
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `local a <attrib>, b = e1, e2`
    Local {
        names: Vec<LocalName>,
        values: Vec<Expr>,
    },
    /// `a, b.c = e1, e2`
    Assign {
        targets: Vec<Expr>,
        values: Vec<Expr>,
    },
    /// A function or method call used as a statement.
    Call(Expr),
    Do(Block),
    While {
        cond: Expr,
        body: Block,
    },
    Repeat {
        body: Block,
        cond: Expr,
    },
    If {
        clauses: Vec<IfClause>,
        else_body: Option<Block>,
    },
    NumericFor {
        var: Name,
        start: Expr,
        limit: Expr,
        step: Option<Expr>,
        body: Block,
    },
    GenericFor {
        vars: Vec<Name>,
        exprs: Vec<Expr>,
        body: Block,
    },
    /// `function a.b:c(...) end`
    Function {
        name: FuncName,
        func: FuncBody,
    },
    /// `local function f(...) end`
    LocalFunction {
        name: Name,
        func: FuncBody,
    },
    Return(Vec<Expr>),
    Break,
    Goto(Name),
    Label(Name),
}

/// A name in a `local` statement, with its optional `<const>`/`<close>` attribute.
#[derive(Debug, Clone)]
pub struct LocalName {
    pub name: Name,
    pub attrib: Option<Name>,
}

/// `if`/`elseif` arm.
#[derive(Debug, Clone)]
pub struct IfClause {
    pub cond: Expr,
    pub body: Block,
    pub span: Span,
}

/// `a.b.c` or `a.b:c` in a function statement.
#[derive(Debug, Clone)]
pub struct FuncName {
    pub path: Vec<Name>,
    pub method: Option<Name>,
    pub span: Span,
}

impl FuncName {
    /// `true` for a bare `function f()` with no dots and no colon.
    pub fn is_simple(&self) -> bool {
        self.path.len() == 1 && self.method.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct FuncBody {
    pub params: Vec<Name>,
    pub is_vararg: bool,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Nil,
    True,
    False,
    Number(NumberLit),
    String(String),
    Vararg,
    Function(Box<FuncBody>),
    Table(Vec<Field>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Name(String),
    /// `t[k]`
    Index {
        object: Box<Expr>,
        key: Box<Expr>,
    },
    /// `t.name`
    Field {
        object: Box<Expr>,
        name: Name,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `o:m(args)`
    MethodCall {
        object: Box<Expr>,
        method: Name,
        args: Vec<Expr>,
    },
    Paren(Box<Expr>),
}

impl Expr {
    /// Calls and `...` can produce more than one value.
    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Call { .. } | ExprKind::MethodCall { .. } | ExprKind::Vararg
        )
    }

    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A numeric literal, keeping its spelling.
#[derive(Debug, Clone)]
pub struct NumberLit {
    pub text: String,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub kind: FieldKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    /// `{ e }`
    Positional(Expr),
    /// `{ name = e }`
    Named(Name, Expr),
    /// `{ [k] = e }`
    Keyed(Expr, Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "//" => Self::IntDiv,
            "%" => Self::Mod,
            "^" => Self::Pow,
            ".." => Self::Concat,
            "==" => Self::Eq,
            "~=" => Self::Ne,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "and" => Self::And,
            "or" => Self::Or,
            "&" => Self::BitAnd,
            "|" => Self::BitOr,
            "~" => Self::BitXor,
            "<<" => Self::Shl,
            ">>" => Self::Shr,
            _ => return None,
        })
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::IntDiv | Self::Mod | Self::Pow
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Len,
    BitNot,
}

impl UnaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "not" => Self::Not,
            "-" => Self::Neg,
            "#" => Self::Len,
            "~" => Self::BitNot,
            _ => return None,
        })
    }
}

/// Short, stable name of a node's syntactic kind, used in provenance records.
pub trait NodeKind {
    fn kind_name(&self) -> &'static str;
    fn span(&self) -> Span;
}

impl NodeKind for Chunk {
    fn kind_name(&self) -> &'static str {
        "Chunk"
    }
    fn span(&self) -> Span {
        self.span
    }
}

impl NodeKind for Block {
    fn kind_name(&self) -> &'static str {
        "Block"
    }
    fn span(&self) -> Span {
        self.span
    }
}

impl NodeKind for Name {
    fn kind_name(&self) -> &'static str {
        "Identifier"
    }
    fn span(&self) -> Span {
        self.span
    }
}

impl NodeKind for FuncName {
    fn kind_name(&self) -> &'static str {
        "FunctionName"
    }
    fn span(&self) -> Span {
        self.span
    }
}

impl NodeKind for FuncBody {
    fn kind_name(&self) -> &'static str {
        "FunctionBody"
    }
    fn span(&self) -> Span {
        self.span
    }
}

impl NodeKind for IfClause {
    fn kind_name(&self) -> &'static str {
        "IfClause"
    }
    fn span(&self) -> Span {
        self.span
    }
}

impl NodeKind for Field {
    fn kind_name(&self) -> &'static str {
        match self.kind {
            FieldKind::Positional(_) => "TableValue",
            FieldKind::Named(..) => "TableKeyString",
            FieldKind::Keyed(..) => "TableKey",
        }
    }
    fn span(&self) -> Span {
        self.span
    }
}

impl NodeKind for Stmt {
    fn kind_name(&self) -> &'static str {
        match self.kind {
            StmtKind::Local { .. } => "LocalStatement",
            StmtKind::Assign { .. } => "AssignmentStatement",
            StmtKind::Call(_) => "CallStatement",
            StmtKind::Do(_) => "DoStatement",
            StmtKind::While { .. } => "WhileStatement",
            StmtKind::Repeat { .. } => "RepeatStatement",
            StmtKind::If { .. } => "IfStatement",
            StmtKind::NumericFor { .. } => "ForNumericStatement",
            StmtKind::GenericFor { .. } => "ForGenericStatement",
            StmtKind::Function { .. } | StmtKind::LocalFunction { .. } => "FunctionDeclaration",
            StmtKind::Return(_) => "ReturnStatement",
            StmtKind::Break => "BreakStatement",
            StmtKind::Goto(_) => "GotoStatement",
            StmtKind::Label(_) => "LabelStatement",
        }
    }
    fn span(&self) -> Span {
        self.span
    }
}

impl NodeKind for Expr {
    fn kind_name(&self) -> &'static str {
        match self.kind {
            ExprKind::Nil => "NilLiteral",
            ExprKind::True | ExprKind::False => "BooleanLiteral",
            ExprKind::Number(_) => "NumericLiteral",
            ExprKind::String(_) => "StringLiteral",
            ExprKind::Vararg => "VarargLiteral",
            ExprKind::Function(_) => "FunctionExpression",
            ExprKind::Table(_) => "TableConstructorExpression",
            ExprKind::Binary {
                op: BinaryOp::And | BinaryOp::Or,
                ..
            } => "LogicalExpression",
            ExprKind::Binary { .. } => "BinaryExpression",
            ExprKind::Unary { .. } => "UnaryExpression",
            ExprKind::Name(_) => "Identifier",
            ExprKind::Index { .. } => "IndexExpression",
            ExprKind::Field { .. } => "MemberExpression",
            ExprKind::Call { .. } | ExprKind::MethodCall { .. } => "CallExpression",
            ExprKind::Paren(_) => "ParenthesizedExpression",
        }
    }
    fn span(&self) -> Span {
        self.span
    }
}
