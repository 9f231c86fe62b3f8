//! Parser for the host language.
//!
//! Statements are one per line; blocks are structured by indentation. The
//! indentation of the first non-blank line is the base level, so payloads
//! lifted out of indented comments parse the same as top-level code.

use std::sync::Arc;

use super::ast::{BinaryOp, BoolOp, CompareOp, Expr, FunctionDef, Stmt, StmtKind, UnaryOp};
use super::error::{HostError, HostResult};
use super::lexer::{tokenize, Token};

const KEYWORDS: &[&str] = &[
    "if", "elif", "else", "while", "for", "in", "def", "return", "pass", "break", "continue",
    "and", "or", "not", "True", "False", "None",
];

/// Deepest expression tree a single line may build.
const MAX_NESTING: usize = 100;

/// Deepest block nesting a program may use.
const MAX_INDENT_LEVELS: usize = 100;

/// A tokenized, non-blank line.
#[derive(Debug)]
struct LogicalLine {
    number: usize,
    indent: usize,
    tokens: Vec<Token>,
}

fn indent_width(text: &str) -> usize {
    text.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Parses numbered source lines into a program.
pub fn parse_program<'a, I>(lines: I) -> HostResult<Vec<Stmt>>
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    let mut logical = Vec::new();
    for (number, text) in lines {
        let tokens = tokenize(text).map_err(|msg| HostError::syntax(msg, number))?;
        if !tokens.is_empty() {
            logical.push(LogicalLine {
                number,
                indent: indent_width(text),
                tokens,
            });
        }
    }

    let Some(base) = logical.first().map(|l| l.indent) else {
        return Ok(Vec::new());
    };

    let mut parser = BlockParser {
        lines: logical,
        pos: 0,
        depth: 0,
    };
    let program = parser.parse_block(base)?;
    if let Some(line) = parser.peek() {
        return Err(HostError::syntax("unindent does not match any outer level", line.number));
    }
    Ok(program)
}

/// Parses a standalone expression (used by template substitution).
pub fn parse_expression(source: &str) -> HostResult<Expr> {
    let tokens = tokenize(source).map_err(|msg| HostError::syntax(msg, 1))?;
    if tokens.is_empty() {
        return Err(HostError::syntax("empty expression", 1));
    }
    let mut parser = ExprParser::new(&tokens, 1);
    let expr = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

struct BlockParser {
    lines: Vec<LogicalLine>,
    pos: usize,
    depth: usize,
}

impl BlockParser {
    fn peek(&self) -> Option<&LogicalLine> {
        self.lines.get(self.pos)
    }

    fn parse_block(&mut self, indent: usize) -> HostResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(HostError::syntax("unexpected indent", line.number));
            }
            stmts.push(self.parse_statement(indent)?);
        }
        Ok(stmts)
    }

    /// Parses the body after a `header:`; either inline or an indented block.
    fn parse_suite(&mut self, indent: usize, header_line: usize, inline: &[Token]) -> HostResult<Vec<Stmt>> {
        if !inline.is_empty() {
            return Ok(vec![simple_statement(inline, header_line)?]);
        }
        match self.peek() {
            Some(next) if next.indent > indent => {
                if self.depth >= MAX_INDENT_LEVELS {
                    return Err(HostError::syntax("too many levels of indentation", next.number));
                }
                let body_indent = next.indent;
                self.depth += 1;
                let body = self.parse_block(body_indent);
                self.depth -= 1;
                body
            }
            _ => Err(HostError::syntax("expected an indented block", header_line)),
        }
    }

    fn parse_statement(&mut self, indent: usize) -> HostResult<Stmt> {
        let line = &self.lines[self.pos];
        let number = line.number;
        let tokens = line.tokens.clone();
        self.pos += 1;

        let keyword = match &tokens[0] {
            Token::Name(name) => name.as_str(),
            _ => "",
        };

        let kind = match keyword {
            "if" => {
                let (cond, inline) = split_header(&tokens[1..], number)?;
                let body = self.parse_suite(indent, number, inline)?;
                let mut branches = vec![(cond, body)];
                let mut orelse = Vec::new();

                while let Some(next) = self.peek() {
                    if next.indent != indent {
                        break;
                    }
                    let next_number = next.number;
                    let next_tokens = next.tokens.clone();
                    if next_tokens[0].is_name("elif") {
                        self.pos += 1;
                        let (cond, inline) = split_header(&next_tokens[1..], next_number)?;
                        let body = self.parse_suite(indent, next_number, inline)?;
                        branches.push((cond, body));
                    } else if next_tokens[0].is_name("else") {
                        self.pos += 1;
                        let inline = split_bare_header(&next_tokens[1..], next_number)?;
                        orelse = self.parse_suite(indent, next_number, inline)?;
                        break;
                    } else {
                        break;
                    }
                }

                StmtKind::If { branches, orelse }
            }
            "while" => {
                let (cond, inline) = split_header(&tokens[1..], number)?;
                let body = self.parse_suite(indent, number, inline)?;
                StmtKind::While { cond, body }
            }
            "for" => {
                let var = match (tokens.get(1), tokens.get(2)) {
                    (Some(Token::Name(var)), Some(t)) if t.is_name("in") && !is_keyword(var) => {
                        var.clone()
                    }
                    _ => return Err(HostError::syntax("expected 'for <name> in <iterable>:'", number)),
                };
                let (iter, inline) = split_header(&tokens[3..], number)?;
                let body = self.parse_suite(indent, number, inline)?;
                StmtKind::For { var, iter, body }
            }
            "def" => {
                let def = self.parse_def(&tokens, indent, number)?;
                StmtKind::Def(Arc::new(def))
            }
            "elif" | "else" => {
                return Err(HostError::syntax(format!("'{}' without a matching 'if'", keyword), number))
            }
            _ => return simple_statement(&tokens, number),
        };

        Ok(Stmt { line: number, kind })
    }

    fn parse_def(&mut self, tokens: &[Token], indent: usize, number: usize) -> HostResult<FunctionDef> {
        let bad = || HostError::syntax("expected 'def <name>(<params>):'", number);

        let name = match tokens.get(1) {
            Some(Token::Name(name)) if !is_keyword(name) => name.clone(),
            _ => return Err(bad()),
        };
        if !tokens.get(2).is_some_and(|t| t.is_op("(")) {
            return Err(bad());
        }

        let mut params = Vec::new();
        let mut pos = 3;
        loop {
            match tokens.get(pos) {
                Some(t) if t.is_op(")") => {
                    pos += 1;
                    break;
                }
                Some(Token::Name(param)) if !is_keyword(param) => {
                    if params.contains(param) {
                        return Err(HostError::syntax(
                            format!("duplicate argument '{}' in function definition", param),
                            number,
                        ));
                    }
                    params.push(param.clone());
                    pos += 1;
                    match tokens.get(pos) {
                        Some(t) if t.is_op(",") => pos += 1,
                        Some(t) if t.is_op(")") => {}
                        _ => return Err(bad()),
                    }
                }
                _ => return Err(bad()),
            }
        }

        if !tokens.get(pos).is_some_and(|t| t.is_op(":")) {
            return Err(bad());
        }
        let body = self.parse_suite(indent, number, &tokens[pos + 1..])?;
        Ok(FunctionDef { name, params, body })
    }
}

fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Splits `cond: inline...` at the header colon.
fn split_header(tokens: &[Token], line: usize) -> HostResult<(Expr, &[Token])> {
    let mut parser = ExprParser::new(tokens, line);
    let cond = parser.parse_expr()?;
    let rest = &tokens[parser.pos..];
    match rest.first() {
        Some(t) if t.is_op(":") => Ok((cond, &rest[1..])),
        _ => Err(HostError::syntax("expected ':'", line)),
    }
}

/// Checks a header with no expression (`else:`) and returns the inline part.
fn split_bare_header(tokens: &[Token], line: usize) -> HostResult<&[Token]> {
    match tokens.first() {
        Some(t) if t.is_op(":") => Ok(&tokens[1..]),
        _ => Err(HostError::syntax("expected ':'", line)),
    }
}

/// Parses a statement that fits on one line.
fn simple_statement(tokens: &[Token], line: usize) -> HostResult<Stmt> {
    let kind = match tokens {
        [Token::Name(kw)] if kw == "pass" => StmtKind::Pass,
        [Token::Name(kw)] if kw == "break" => StmtKind::Break,
        [Token::Name(kw)] if kw == "continue" => StmtKind::Continue,
        [Token::Name(kw)] if kw == "return" => StmtKind::Return(None),
        [Token::Name(kw), rest @ ..] if kw == "return" => {
            StmtKind::Return(Some(parse_full_expr(rest, line)?))
        }
        [Token::Name(kw), ..] if matches!(kw.as_str(), "if" | "while" | "for" | "def" | "elif" | "else") => {
            return Err(HostError::syntax(
                format!("compound statement '{}' is not allowed here", kw),
                line,
            ))
        }
        [Token::Name(name), Token::Op(op), rest @ ..] if assign_op(op).is_some() => {
            if is_keyword(name) {
                return Err(HostError::syntax(format!("cannot assign to '{}'", name), line));
            }
            let value = parse_full_expr(rest, line)?;
            match assign_op(op).flatten() {
                None => StmtKind::Assign {
                    name: name.clone(),
                    value,
                },
                Some(op) => StmtKind::AugAssign {
                    name: name.clone(),
                    op,
                    value,
                },
            }
        }
        _ => StmtKind::Expr(parse_full_expr(tokens, line)?),
    };
    Ok(Stmt { line, kind })
}

/// `Some(None)` for plain `=`, `Some(Some(op))` for augmented assignment.
fn assign_op(op: &str) -> Option<Option<BinaryOp>> {
    match op {
        "=" => Some(None),
        "+=" => Some(Some(BinaryOp::Add)),
        "-=" => Some(Some(BinaryOp::Sub)),
        "*=" => Some(Some(BinaryOp::Mul)),
        "/=" => Some(Some(BinaryOp::Div)),
        _ => None,
    }
}

fn parse_full_expr(tokens: &[Token], line: usize) -> HostResult<Expr> {
    if tokens.is_empty() {
        return Err(HostError::syntax("expected an expression", line));
    }
    let mut parser = ExprParser::new(tokens, line);
    let expr = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Recursive-descent expression parser over one line of tokens.
struct ExprParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    line: usize,
    depth: usize,
}

impl<'t> ExprParser<'t> {
    fn new(tokens: &'t [Token], line: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            line,
            depth: 0,
        }
    }

    /// Counts one more level of tree depth against the nesting budget.
    fn enter(&mut self) -> HostResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("expression is too deeply nested"));
        }
        self.depth += 1;
        Ok(())
    }

    /// Runs `parse` one level deeper.
    fn nested(&mut self, parse: fn(&mut Self) -> HostResult<Expr>) -> HostResult<Expr> {
        self.enter()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_op(op)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_name(&mut self, name: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_name(name)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> HostError {
        HostError::syntax(message, self.line)
    }

    fn expect_op(&mut self, op: &str) -> HostResult<()> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", op)))
        }
    }

    fn expect_end(&self) -> HostResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(format!("unexpected {}", describe(token)))),
        }
    }

    fn parse_expr(&mut self) -> HostResult<Expr> {
        self.nested(Self::parse_or)
    }

    fn parse_or(&mut self) -> HostResult<Expr> {
        let start = self.depth;
        let mut lhs = self.parse_and()?;
        while self.eat_name("or") {
            self.enter()?;
            let rhs = self.parse_and()?;
            lhs = Expr::Logical {
                op: BoolOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth = start;
        Ok(lhs)
    }

    fn parse_and(&mut self) -> HostResult<Expr> {
        let start = self.depth;
        let mut lhs = self.parse_not()?;
        while self.eat_name("and") {
            self.enter()?;
            let rhs = self.parse_not()?;
            lhs = Expr::Logical {
                op: BoolOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth = start;
        Ok(lhs)
    }

    fn parse_not(&mut self) -> HostResult<Expr> {
        if self.eat_name("not") {
            let operand = self.nested(Self::parse_not)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> HostResult<Expr> {
        let first = self.parse_additive()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Token::Op("==")) => CompareOp::Eq,
                Some(Token::Op("!=")) => CompareOp::Ne,
                Some(Token::Op("<")) => CompareOp::Lt,
                Some(Token::Op("<=")) => CompareOp::Le,
                Some(Token::Op(">")) => CompareOp::Gt,
                Some(Token::Op(">=")) => CompareOp::Ge,
                _ => break,
            };
            self.pos += 1;
            rest.push((op, self.parse_additive()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn parse_additive(&mut self) -> HostResult<Expr> {
        let start = self.depth;
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op("+")) => BinaryOp::Add,
                Some(Token::Op("-")) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            self.enter()?;
            let rhs = self.parse_term()?;
            lhs = binary(op, lhs, rhs);
        }
        self.depth = start;
        Ok(lhs)
    }

    fn parse_term(&mut self) -> HostResult<Expr> {
        let start = self.depth;
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op("*")) => BinaryOp::Mul,
                Some(Token::Op("/")) => BinaryOp::Div,
                Some(Token::Op("//")) => BinaryOp::FloorDiv,
                Some(Token::Op("%")) => BinaryOp::Mod,
                _ => break,
            };
            self.pos += 1;
            self.enter()?;
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
        self.depth = start;
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> HostResult<Expr> {
        let op = if self.eat_op("-") {
            UnaryOp::Neg
        } else if self.eat_op("+") {
            UnaryOp::Pos
        } else {
            return self.parse_power();
        };
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// `**` binds tighter than a unary minus on its left and is right-associative.
    fn parse_power(&mut self) -> HostResult<Expr> {
        let base = self.parse_postfix()?;
        if self.eat_op("**") {
            let exponent = self.nested(Self::parse_unary)?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> HostResult<Expr> {
        let start = self.depth;
        let mut expr = self.parse_atom()?;
        loop {
            if self.peek().is_some_and(|t| t.is_op("(") || t.is_op("[")) {
                self.enter()?;
            }
            if self.eat_op("(") {
                let (args, kwargs) = self.parse_call_args()?;
                expr = Expr::Call {
                    func: Box::new(expr),
                    args,
                    kwargs,
                };
            } else if self.eat_op("[") {
                let index = self.parse_expr()?;
                self.expect_op("]")?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                self.depth = start;
                return Ok(expr);
            }
        }
    }

    fn parse_call_args(&mut self) -> HostResult<(Vec<Expr>, Vec<(String, Expr)>)> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();
        loop {
            if self.eat_op(")") {
                return Ok((args, kwargs));
            }
            let keyword = match (self.peek(), self.tokens.get(self.pos + 1)) {
                (Some(Token::Name(name)), Some(eq)) if eq.is_op("=") && !is_keyword(name) => {
                    Some(name.clone())
                }
                _ => None,
            };
            match keyword {
                Some(name) => {
                    self.pos += 2;
                    if kwargs.iter().any(|(k, _)| *k == name) {
                        return Err(self.error(format!("keyword argument repeated: {}", name)));
                    }
                    kwargs.push((name, self.parse_expr()?));
                }
                None => {
                    if !kwargs.is_empty() {
                        return Err(self.error("positional argument follows keyword argument"));
                    }
                    args.push(self.parse_expr()?);
                }
            }
            if !self.eat_op(",") {
                self.expect_op(")")?;
                return Ok((args, kwargs));
            }
        }
    }

    fn parse_atom(&mut self) -> HostResult<Expr> {
        let Some(token) = self.peek() else {
            return Err(self.error("unexpected end of line"));
        };
        self.pos += 1;
        match token {
            Token::Int(n) => Ok(Expr::Int(*n)),
            Token::Float(f) => Ok(Expr::Float(*f)),
            Token::Str(s) => Ok(Expr::Str(s.clone())),
            Token::Name(name) => match name.as_str() {
                "True" => Ok(Expr::Bool(true)),
                "False" => Ok(Expr::Bool(false)),
                "None" => Ok(Expr::None),
                kw if is_keyword(kw) => Err(self.error(format!("unexpected keyword '{}'", kw))),
                _ => Ok(Expr::Name(name.clone())),
            },
            Token::Op("(") => {
                let inner = self.parse_expr()?;
                self.expect_op(")")?;
                Ok(inner)
            }
            Token::Op("[") => {
                let mut items = Vec::new();
                loop {
                    if self.eat_op("]") {
                        return Ok(Expr::List(items));
                    }
                    items.push(self.parse_expr()?);
                    if !self.eat_op(",") {
                        self.expect_op("]")?;
                        return Ok(Expr::List(items));
                    }
                }
            }
            other => Err(self.error(format!("unexpected {}", describe(other)))),
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Int(n) => format!("number {}", n),
        Token::Float(f) => format!("number {}", f),
        Token::Str(_) => "string".to_string(),
        Token::Name(name) => format!("'{}'", name),
        Token::Op(op) => format!("'{}'", op),
    }
}
