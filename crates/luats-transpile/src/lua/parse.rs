//! Tree-sitter based Lua parser.
//!
//! Lowers the concrete syntax tree of the `arborium-lua` grammar into the
//! typed tree in [`super::ast`], attaching a [`Span`] to every node.

use super::ParseError;
use super::ast::*;
use tree_sitter::{Node, Parser, Tree};

/// Parse Lua source into a [`Chunk`].
///
/// Fails on any syntax error; tree-sitter's error recovery is not exposed.
pub fn parse(source: &str) -> Result<Chunk, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_lua::language().into())
        .map_err(|err| ParseError::Grammar(err.to_string()))?;

    let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;

    let ctx = ParseContext::new(source);
    ctx.read_chunk(&tree)
}

struct ParseContext<'a> {
    source: &'a str,
}

impl<'a> ParseContext<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn node_text(&self, node: Node<'_>) -> &'a str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    /// Column in UTF-16 units of a byte offset whose line starts at
    /// `byte - byte_column`.
    fn utf16_column(&self, byte: usize, byte_column: usize) -> u32 {
        let line_start = byte.saturating_sub(byte_column);
        self.source
            .get(line_start..byte)
            .map_or(byte_column, |prefix| prefix.encode_utf16().count()) as u32
    }

    fn span(&self, node: Node<'_>) -> Span {
        let start = node.start_position();
        let end = node.end_position();
        Span {
            start: Position::new(
                start.row as u32 + 1,
                self.utf16_column(node.start_byte(), start.column),
            ),
            end: Position::new(
                end.row as u32 + 1,
                self.utf16_column(node.end_byte(), end.column),
            ),
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
        }
    }

    fn unexpected(&self, node: Node<'_>, expected: &'static str) -> ParseError {
        let span = self.span(node);
        ParseError::UnexpectedNode {
            line: span.start.line,
            column: span.start.column,
            expected,
            got: node.kind().to_string(),
        }
    }

    fn malformed(&self, node: Node<'_>, what: &'static str) -> ParseError {
        let span = self.span(node);
        ParseError::Malformed {
            line: span.start.line,
            column: span.start.column,
            what,
            text: self.node_text(node).to_string(),
        }
    }

    fn field<'t>(
        &self,
        node: Node<'t>,
        name: &'static str,
        expected: &'static str,
    ) -> Result<Node<'t>, ParseError> {
        node.child_by_field_name(name)
            .ok_or_else(|| self.unexpected(node, expected))
    }

    fn read_chunk(&self, tree: &Tree) -> Result<Chunk, ParseError> {
        let root = tree.root_node();

        if root.has_error() {
            return Err(self.syntax_error(root));
        }

        let span = self.span(root);
        let stmts = self.read_statements(root)?;
        Ok(Chunk {
            body: Block { stmts, span },
            span,
        })
    }

    fn syntax_error(&self, root: Node<'_>) -> ParseError {
        let culprit = first_error(root).unwrap_or(root);
        let span = self.span(culprit);
        let text = if culprit.is_missing() {
            culprit.kind().to_string()
        } else {
            self.node_text(culprit).chars().take(32).collect()
        };
        ParseError::Syntax {
            line: span.start.line,
            column: span.start.column,
            text,
        }
    }

    fn read_statements(&self, node: Node<'_>) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        for child in named_children(node) {
            if let Some(stmt) = self.read_stmt(child)? {
                stmts.push(stmt);
            }
        }
        Ok(stmts)
    }

    /// Reads the block in field `name`; an absent field is an empty block.
    fn read_block(&self, node: Node<'_>, name: &'static str) -> Result<Block, ParseError> {
        match node.child_by_field_name(name) {
            Some(block) => Ok(Block {
                stmts: self.read_statements(block)?,
                span: self.span(block),
            }),
            None => {
                let mut span = self.span(node);
                span.start = span.end;
                span.start_byte = span.end_byte;
                Ok(Block {
                    stmts: Vec::new(),
                    span,
                })
            }
        }
    }

    fn read_stmt(&self, node: Node<'_>) -> Result<Option<Stmt>, ParseError> {
        let span = self.span(node);
        let kind = match node.kind() {
            "comment" | "hash_bang_line" | "empty_statement" => return Ok(None),

            "variable_declaration" => self.read_local(node)?,
            "assignment_statement" => self.read_assignment(node)?,

            "function_call" => StmtKind::Call(self.read_expr(node)?),

            "do_statement" => StmtKind::Do(self.read_block(node, "body")?),
            "while_statement" => StmtKind::While {
                cond: self.read_expr(self.field(node, "condition", "loop condition")?)?,
                body: self.read_block(node, "body")?,
            },
            "repeat_statement" => StmtKind::Repeat {
                body: self.read_block(node, "body")?,
                cond: self.read_expr(self.field(node, "condition", "until condition")?)?,
            },
            "if_statement" => self.read_if(node)?,
            "for_statement" => self.read_for(node)?,

            "function_declaration" => self.read_function_declaration(node)?,
            "local_function_declaration" => StmtKind::LocalFunction {
                name: self.read_name(self.field(node, "name", "function name")?)?,
                func: self.read_func_body(node)?,
            },

            "return_statement" => StmtKind::Return(self.read_return_values(node)?),
            "break_statement" => StmtKind::Break,
            "goto_statement" => StmtKind::Goto(self.read_label_name(node)?),
            "label_statement" => StmtKind::Label(self.read_label_name(node)?),

            _ => return Err(self.unexpected(node, "statement")),
        };
        Ok(Some(Stmt { kind, span }))
    }

    fn read_name(&self, node: Node<'_>) -> Result<Name, ParseError> {
        if node.kind() != "identifier" {
            return Err(self.unexpected(node, "identifier"));
        }
        Ok(Name {
            name: self.node_text(node).to_string(),
            span: self.span(node),
        })
    }

    fn read_label_name(&self, node: Node<'_>) -> Result<Name, ParseError> {
        named_children(node)
            .into_iter()
            .find(|child| child.kind() == "identifier")
            .ok_or_else(|| self.unexpected(node, "label name"))
            .and_then(|ident| self.read_name(ident))
    }

    fn read_local(&self, node: Node<'_>) -> Result<StmtKind, ParseError> {
        // variable_declaration -> local (assignment_statement | attribute_name_list)
        let mut names = Vec::new();
        let mut values = Vec::new();

        for child in named_children(node) {
            match child.kind() {
                "assignment_statement" => {
                    for part in named_children(child) {
                        match part.kind() {
                            "variable_list" => self.read_local_names(part, &mut names)?,
                            "expression_list" => values = self.read_expr_list(part)?,
                            _ => {}
                        }
                    }
                }
                "attribute_name_list" | "variable_list" => {
                    self.read_local_names(child, &mut names)?
                }
                "expression_list" => values = self.read_expr_list(child)?,
                _ => {}
            }
        }

        if names.is_empty() {
            return Err(self.unexpected(node, "local variable names"));
        }
        Ok(StmtKind::Local { names, values })
    }

    fn read_local_names(
        &self,
        node: Node<'_>,
        names: &mut Vec<LocalName>,
    ) -> Result<(), ParseError> {
        for child in named_children(node) {
            match child.kind() {
                "identifier" => names.push(LocalName {
                    name: self.read_name(child)?,
                    attrib: None,
                }),
                "attribute" => {
                    let attrib = self.read_label_name(child)?;
                    if let Some(last) = names.last_mut() {
                        last.attrib = Some(attrib);
                    }
                }
                _ => return Err(self.unexpected(child, "local variable name")),
            }
        }
        Ok(())
    }

    fn read_assignment(&self, node: Node<'_>) -> Result<StmtKind, ParseError> {
        let mut targets = Vec::new();
        let mut values = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "variable_list" => targets = self.read_expr_list(child)?,
                "expression_list" => values = self.read_expr_list(child)?,
                _ => {}
            }
        }
        Ok(StmtKind::Assign { targets, values })
    }

    fn read_expr_list(&self, node: Node<'_>) -> Result<Vec<Expr>, ParseError> {
        named_children(node)
            .into_iter()
            .map(|child| self.read_expr(child))
            .collect()
    }

    fn read_if(&self, node: Node<'_>) -> Result<StmtKind, ParseError> {
        let mut clauses = vec![IfClause {
            cond: self.read_expr(self.field(node, "condition", "if condition")?)?,
            body: self.read_block(node, "consequence")?,
            span: self.span(node),
        }];
        let mut else_body = None;

        for child in named_children(node) {
            match child.kind() {
                "elseif_statement" => clauses.push(IfClause {
                    cond: self.read_expr(self.field(child, "condition", "elseif condition")?)?,
                    body: self.read_block(child, "consequence")?,
                    span: self.span(child),
                }),
                "else_statement" => else_body = Some(self.read_block(child, "body")?),
                _ => {}
            }
        }

        Ok(StmtKind::If { clauses, else_body })
    }

    fn read_for(&self, node: Node<'_>) -> Result<StmtKind, ParseError> {
        let clause = node
            .child_by_field_name("clause")
            .or_else(|| {
                named_children(node).into_iter().find(|child| {
                    matches!(child.kind(), "for_generic_clause" | "for_numeric_clause")
                })
            })
            .ok_or_else(|| self.unexpected(node, "for clause"))?;
        let body = self.read_block(node, "body")?;

        match clause.kind() {
            "for_numeric_clause" => Ok(StmtKind::NumericFor {
                var: self.read_name(self.field(clause, "name", "loop variable")?)?,
                start: self.read_expr(self.field(clause, "start", "loop start")?)?,
                limit: self.read_expr(self.field(clause, "end", "loop limit")?)?,
                step: clause
                    .child_by_field_name("step")
                    .map(|step| self.read_expr(step))
                    .transpose()?,
                body,
            }),
            "for_generic_clause" => {
                let mut vars = Vec::new();
                let mut exprs = Vec::new();
                for child in named_children(clause) {
                    match child.kind() {
                        "variable_list" => {
                            for name in named_children(child) {
                                vars.push(self.read_name(name)?);
                            }
                        }
                        "expression_list" => exprs = self.read_expr_list(child)?,
                        _ => {}
                    }
                }
                Ok(StmtKind::GenericFor { vars, exprs, body })
            }
            _ => Err(self.unexpected(clause, "for clause")),
        }
    }

    fn read_function_declaration(&self, node: Node<'_>) -> Result<StmtKind, ParseError> {
        let name_node = self.field(node, "name", "function name")?;
        let func = self.read_func_body(node)?;

        let is_local = {
            let mut cursor = node.walk();
            node.children(&mut cursor)
                .any(|child| !child.is_named() && child.kind() == "local")
        };
        if is_local {
            return Ok(StmtKind::LocalFunction {
                name: self.read_name(name_node)?,
                func,
            });
        }

        let mut path = Vec::new();
        let method = match name_node.kind() {
            "method_index_expression" => {
                self.read_name_path(self.field(name_node, "table", "method owner")?, &mut path)?;
                Some(self.read_name(self.field(name_node, "method", "method name")?)?)
            }
            _ => {
                self.read_name_path(name_node, &mut path)?;
                None
            }
        };

        Ok(StmtKind::Function {
            name: FuncName {
                path,
                method,
                span: self.span(name_node),
            },
            func,
        })
    }

    /// Flattens `a.b.c` into `[a, b, c]`.
    fn read_name_path(&self, node: Node<'_>, path: &mut Vec<Name>) -> Result<(), ParseError> {
        match node.kind() {
            "identifier" => path.push(self.read_name(node)?),
            "dot_index_expression" => {
                self.read_name_path(self.field(node, "table", "table")?, path)?;
                path.push(self.read_name(self.field(node, "field", "field name")?)?);
            }
            _ => return Err(self.unexpected(node, "function name")),
        }
        Ok(())
    }

    fn read_func_body(&self, node: Node<'_>) -> Result<FuncBody, ParseError> {
        let mut params = Vec::new();
        let mut is_vararg = false;
        if let Some(list) = node.child_by_field_name("parameters") {
            for child in named_children(list) {
                match child.kind() {
                    "identifier" => params.push(self.read_name(child)?),
                    "vararg_expression" => is_vararg = true,
                    _ => return Err(self.unexpected(child, "parameter")),
                }
            }
        }

        Ok(FuncBody {
            params,
            is_vararg,
            body: self.read_block(node, "body")?,
            span: self.span(node),
        })
    }

    fn read_return_values(&self, node: Node<'_>) -> Result<Vec<Expr>, ParseError> {
        let mut values = Vec::new();
        for child in named_children(node) {
            if child.kind() == "expression_list" {
                values.extend(self.read_expr_list(child)?);
            } else {
                values.push(self.read_expr(child)?);
            }
        }
        Ok(values)
    }

    fn read_expr(&self, node: Node<'_>) -> Result<Expr, ParseError> {
        let span = self.span(node);
        let kind = match node.kind() {
            "nil" => ExprKind::Nil,
            "true" => ExprKind::True,
            "false" => ExprKind::False,
            "number" => {
                let text = self.node_text(node);
                let value = parse_number(text).ok_or_else(|| self.malformed(node, "number"))?;
                ExprKind::Number(NumberLit {
                    text: text.to_string(),
                    value,
                })
            }
            "string" => ExprKind::String(
                decode_string(self.node_text(node)).ok_or_else(|| self.malformed(node, "string"))?,
            ),
            "vararg_expression" => ExprKind::Vararg,
            "identifier" => ExprKind::Name(self.node_text(node).to_string()),

            "function_definition" => ExprKind::Function(Box::new(self.read_func_body(node)?)),
            "table_constructor" => ExprKind::Table(self.read_table(node)?),

            "binary_expression" => self.read_binary(node)?,
            "unary_expression" => self.read_unary(node)?,
            "parenthesized_expression" => {
                let inner = named_children(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| self.unexpected(node, "expression"))?;
                ExprKind::Paren(Box::new(self.read_expr(inner)?))
            }

            "dot_index_expression" => ExprKind::Field {
                object: Box::new(self.read_expr(self.field(node, "table", "table")?)?),
                name: self.read_name(self.field(node, "field", "field name")?)?,
            },
            "bracket_index_expression" => ExprKind::Index {
                object: Box::new(self.read_expr(self.field(node, "table", "table")?)?),
                key: Box::new(self.read_expr(self.field(node, "field", "index")?)?),
            },
            "function_call" => self.read_call(node)?,

            _ => return Err(self.unexpected(node, "expression")),
        };
        Ok(Expr { kind, span })
    }

    fn read_call(&self, node: Node<'_>) -> Result<ExprKind, ParseError> {
        let callee = self.field(node, "name", "callee")?;
        let args = match node.child_by_field_name("arguments") {
            Some(arguments) => self.read_expr_list(arguments)?,
            None => Vec::new(),
        };

        if callee.kind() == "method_index_expression" {
            return Ok(ExprKind::MethodCall {
                object: Box::new(self.read_expr(self.field(callee, "table", "receiver")?)?),
                method: self.read_name(self.field(callee, "method", "method name")?)?,
                args,
            });
        }

        Ok(ExprKind::Call {
            callee: Box::new(self.read_expr(callee)?),
            args,
        })
    }

    fn operator_token(&self, node: Node<'_>) -> Option<&'a str> {
        let mut cursor = node.walk();
        let token = node
            .children(&mut cursor)
            .find(|child| !child.is_named() && !child.is_extra())
            .map(|child| self.node_text(child).trim());
        token
    }

    fn read_binary(&self, node: Node<'_>) -> Result<ExprKind, ParseError> {
        let lhs = self.read_expr(self.field(node, "left", "left operand")?)?;
        let rhs = self.read_expr(self.field(node, "right", "right operand")?)?;
        let op = self
            .operator_token(node)
            .and_then(BinaryOp::from_token)
            .ok_or_else(|| self.malformed(node, "binary operator"))?;
        Ok(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn read_unary(&self, node: Node<'_>) -> Result<ExprKind, ParseError> {
        let operand = match node.child_by_field_name("operand") {
            Some(operand) => operand,
            None => named_children(node)
                .into_iter()
                .next()
                .ok_or_else(|| self.unexpected(node, "operand"))?,
        };
        let op = self
            .operator_token(node)
            .and_then(UnaryOp::from_token)
            .ok_or_else(|| self.malformed(node, "unary operator"))?;
        Ok(ExprKind::Unary {
            op,
            operand: Box::new(self.read_expr(operand)?),
        })
    }

    fn read_table(&self, node: Node<'_>) -> Result<Vec<Field>, ParseError> {
        let mut fields = Vec::new();
        for child in named_children(node) {
            let span = self.span(child);
            if child.kind() != "field" {
                fields.push(Field {
                    kind: FieldKind::Positional(self.read_expr(child)?),
                    span,
                });
                continue;
            }

            let value = self.read_expr(self.field(child, "value", "field value")?)?;
            let kind = match child.child_by_field_name("name") {
                None => FieldKind::Positional(value),
                Some(name) if has_token(child, "[") => {
                    FieldKind::Keyed(self.read_expr(name)?, value)
                }
                Some(name) => FieldKind::Named(self.read_name(name)?, value),
            };
            fields.push(Field { kind, span });
        }
        Ok(fields)
    }
}

/// Named, non-comment children of a node.
fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !child.is_extra() && child.kind() != "comment")
        .collect()
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error)
}

/// Parses a Lua numeral: decimal, hexadecimal, and hexadecimal floats with a
/// binary exponent (`0x1p4`).
fn parse_number(text: &str) -> Option<f64> {
    let lower = text.to_ascii_lowercase();
    let Some(hex) = lower.strip_prefix("0x") else {
        return lower.parse().ok();
    };

    let (mantissa, exponent) = match hex.split_once('p') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().ok()?),
        None => (hex, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut value = 0f64;
    for digit in int_part.chars() {
        value = value * 16.0 + f64::from(digit.to_digit(16)?);
    }
    let mut scale = 1.0 / 16.0;
    for digit in frac_part.chars() {
        value += f64::from(digit.to_digit(16)?) * scale;
        scale /= 16.0;
    }
    Some(value * 2f64.powi(exponent))
}

/// Decodes a Lua string literal, including long brackets and every escape
/// sequence of Lua 5.4. Invalid UTF-8 produced by byte escapes is replaced.
fn decode_string(text: &str) -> Option<String> {
    if text.starts_with('[') {
        let level = text[1..].chars().take_while(|c| *c == '=').count();
        let open = level + 2;
        let close = level + 2;
        let inner = text.get(open..text.len().checked_sub(close)?)?;
        // A newline right after the opening bracket is not part of the string.
        let inner = inner
            .strip_prefix("\r\n")
            .or_else(|| inner.strip_prefix('\n'))
            .unwrap_or(inner);
        return Some(inner.to_string());
    }

    let quote = text.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let inner = text.get(1..text.len().checked_sub(1)?)?;
    let bytes = inner.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte != b'\\' {
            out.push(byte);
            i += 1;
            continue;
        }
        i += 1;
        let escape = *bytes.get(i)?;
        i += 1;
        match escape {
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' | b'\n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'\\' | b'"' | b'\'' => out.push(escape),
            b'z' => {
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
            }
            b'x' => {
                let hex = inner.get(i..i + 2)?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 2;
            }
            b'u' => {
                if bytes.get(i) != Some(&b'{') {
                    return None;
                }
                let close = inner[i..].find('}')? + i;
                let code = u32::from_str_radix(&inner[i + 1..close], 16).ok()?;
                let ch = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                i = close + 1;
            }
            b'0'..=b'9' => {
                let start = i - 1;
                let mut end = i;
                while end < bytes.len() && end - start < 3 && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                let code: u32 = inner[start..end].parse().ok()?;
                out.push(u8::try_from(code).ok()?);
                i = end;
            }
            _ => return None,
        }
    }

    Some(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_declaration() {
        let chunk = parse("local x = 42").unwrap();
        assert_eq!(chunk.body.stmts.len(), 1);
        match &chunk.body.stmts[0].kind {
            StmtKind::Local { names, values } => {
                assert_eq!(names[0].name.as_str(), "x");
                assert!(matches!(values[0].kind, ExprKind::Number(ref n) if n.value == 42.0));
            }
            other => panic!("expected Local, got {other:?}"),
        }
    }

    #[test]
    fn test_spans_are_one_based_lines() {
        let chunk = parse("local x = 1\nprint(x)").unwrap();
        let call = &chunk.body.stmts[1];
        assert_eq!(call.span.start, Position::new(2, 0));
        match &call.kind {
            StmtKind::Call(Expr {
                kind: ExprKind::Call { args, .. },
                ..
            }) => assert_eq!(args[0].span.start, Position::new(2, 6)),
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_utf16_columns() {
        let chunk = parse("local s = \"é\" print(s)").unwrap();
        // `é` is two bytes but one UTF-16 unit.
        assert_eq!(chunk.body.stmts[1].span.start.column, 14);
    }

    #[test]
    fn test_method_call_and_function_name() {
        let chunk = parse("function Account:deposit(v) self.balance = v end\nacc:deposit(1)").unwrap();
        match &chunk.body.stmts[0].kind {
            StmtKind::Function { name, func } => {
                assert_eq!(name.path[0].as_str(), "Account");
                assert_eq!(name.method.as_ref().map(Name::as_str), Some("deposit"));
                assert_eq!(func.params.len(), 1);
            }
            other => panic!("expected Function, got {other:?}"),
        }
        assert!(matches!(
            chunk.body.stmts[1].kind,
            StmtKind::Call(Expr {
                kind: ExprKind::MethodCall { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_local_function_and_vararg() {
        let chunk = parse("local function f(a, ...) return ... end").unwrap();
        match &chunk.body.stmts[0].kind {
            StmtKind::LocalFunction { name, func } => {
                assert_eq!(name.as_str(), "f");
                assert!(func.is_vararg);
                assert!(matches!(
                    func.body.stmts[0].kind,
                    StmtKind::Return(ref values) if matches!(values[0].kind, ExprKind::Vararg)
                ));
            }
            other => panic!("expected LocalFunction, got {other:?}"),
        }
    }

    #[test]
    fn test_goto_and_label() {
        let chunk = parse("goto done\n::done::").unwrap();
        assert!(matches!(chunk.body.stmts[0].kind, StmtKind::Goto(ref n) if n.as_str() == "done"));
        assert!(matches!(chunk.body.stmts[1].kind, StmtKind::Label(ref n) if n.as_str() == "done"));
    }

    #[test]
    fn test_table_fields() {
        let chunk = parse("local t = { 1, x = 2, [\"y\"] = 3 }").unwrap();
        let StmtKind::Local { values, .. } = &chunk.body.stmts[0].kind else {
            panic!("expected Local");
        };
        let ExprKind::Table(fields) = &values[0].kind else {
            panic!("expected Table");
        };
        assert!(matches!(fields[0].kind, FieldKind::Positional(_)));
        assert!(matches!(fields[1].kind, FieldKind::Named(ref n, _) if n.as_str() == "x"));
        assert!(matches!(fields[2].kind, FieldKind::Keyed(..)));
    }

    #[test]
    fn test_syntax_error_is_fatal() {
        let err = parse("local = = 1").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }), "{err}");
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(parse_number("10"), Some(10.0));
        assert_eq!(parse_number("3.5e2"), Some(350.0));
        assert_eq!(parse_number("0xff"), Some(255.0));
        assert_eq!(parse_number("0x1p4"), Some(16.0));
        assert_eq!(parse_number("0x.8"), Some(0.5));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(decode_string(r#""a\tb""#).as_deref(), Some("a\tb"));
        assert_eq!(decode_string(r#"'\65\x42'"#).as_deref(), Some("AB"));
        assert_eq!(decode_string(r#""\u{48}i""#).as_deref(), Some("Hi"));
        assert_eq!(decode_string("\"a\\z   b\"").as_deref(), Some("ab"));
        assert_eq!(decode_string("[[\nlong]]").as_deref(), Some("long"));
        assert_eq!(decode_string("[==[a]]b]==]").as_deref(), Some("a]]b"));
    }
}
