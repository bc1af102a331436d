use super::lexer::{self, LexError, SpannedToken, Token};

/// One statement of a prompt or a setup/teardown script.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `name = expr`: binds into the environment, produces no output.
    Assign { name: String, expr: Expr },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Bool(bool),
    Str(String),
    Unset,
    Var(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Python-style chained comparison: `a <= b < c`.
    Comparison {
        first: Box<Expr>,
        rest: Vec<(CmpOp, Expr)>,
    },
    /// `expr is unset` / `expr is not unset`.
    IsUnset {
        operand: Box<Expr>,
        negated: bool,
    },
    Call {
        func: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        use CmpOp::*;
        match self {
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            Eq => "==",
            Ne => "!=",
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Empty statement")]
    Empty,

    #[error("Unexpected end of input (expected {0})")]
    UnexpectedEnd(&'static str),

    #[error("Unexpected '{token}' at column {} (expected {expected})", .pos + 1)]
    UnexpectedToken {
        token: Token,
        pos: usize,
        expected: &'static str,
    },

    #[error("'is' must be followed by 'unset' or 'not unset' (column {})", .0 + 1)]
    BadIsOperand(usize),
}

pub fn parse_stmt(src: &str) -> Result<Stmt> {
    let tokens = lexer::tokenize(src)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut p = Parser { tokens, idx: 0 };

    // `name = expr`, but not `name == expr`
    let stmt = match (p.tokens.first(), p.tokens.get(1)) {
        (
            Some(SpannedToken {
                token: Token::Ident(name),
                ..
            }),
            Some(SpannedToken {
                token: Token::Assign,
                ..
            }),
        ) => {
            let name = name.clone();
            p.idx = 2;
            Stmt::Assign {
                name,
                expr: p.expr()?,
            }
        }
        _ => Stmt::Expr(p.expr()?),
    };

    match p.peek() {
        None => Ok(stmt),
        Some(t) => Err(ParseError::UnexpectedToken {
            token: t.token.clone(),
            pos: t.pos,
            expected: "end of statement",
        }),
    }
}

pub fn parse_expr(src: &str) -> Result<Expr> {
    match parse_stmt(src)? {
        Stmt::Expr(e) => Ok(e),
        Stmt::Assign { .. } => Err(ParseError::UnexpectedToken {
            token: Token::Assign,
            pos: 0,
            expected: "an expression",
        }),
    }
}

struct Parser {
    tokens: Vec<SpannedToken>,
    idx: usize,
}

impl Parser {
    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.idx)
    }

    fn next(&mut self) -> Option<SpannedToken> {
        let t = self.tokens.get(self.idx).cloned();
        if t.is_some() {
            self.idx += 1;
        }
        t
    }

    fn eat(&mut self, want: &Token) -> bool {
        if self.peek().map(|t| &t.token) == Some(want) {
            self.idx += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, want: Token, expected: &'static str) -> Result<()> {
        match self.next() {
            Some(t) if t.token == want => Ok(()),
            Some(t) => Err(ParseError::UnexpectedToken {
                token: t.token,
                pos: t.pos,
                expected,
            }),
            None => Err(ParseError::UnexpectedEnd(expected)),
        }
    }

    // precedence, loosest first: or -> and -> not -> comparison -> additive
    // -> multiplicative -> unary minus -> primary
    fn expr(&mut self) -> Result<Expr> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.and_expr()?;
        while self.eat(&Token::Or) {
            let rhs = self.and_expr()?;
            lhs = Expr::Binary {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.not_expr()?;
        while self.eat(&Token::And) {
            let rhs = self.not_expr()?;
            lhs = Expr::Binary {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr> {
        if self.eat(&Token::Not) {
            let operand = self.not_expr()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let first = self.additive()?;

        if self.eat(&Token::Is) {
            let negated = self.eat(&Token::Not);
            let pos = self.peek().map(|t| t.pos).unwrap_or(0);
            if !self.eat(&Token::Unset) {
                return Err(ParseError::BadIsOperand(pos));
            }
            return Ok(Expr::IsUnset {
                operand: Box::new(first),
                negated,
            });
        }

        let mut rest = Vec::new();
        while let Some(op) = self.peek_cmp_op() {
            self.idx += 1;
            rest.push((op, self.additive()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Comparison {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn peek_cmp_op(&self) -> Option<CmpOp> {
        let op = match self.peek()?.token {
            Token::Lt => CmpOp::Lt,
            Token::Le => CmpOp::Le,
            Token::Gt => CmpOp::Gt,
            Token::Ge => CmpOp::Ge,
            Token::EqEq => CmpOp::Eq,
            Token::Ne => CmpOp::Ne,
            _ => return None,
        };
        Some(op)
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = if self.eat(&Token::Plus) {
                BinOp::Add
            } else if self.eat(&Token::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = if self.eat(&Token::Star) {
                BinOp::Mul
            } else if self.eat(&Token::Slash) {
                BinOp::Div
            } else {
                break;
            };
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.eat(&Token::Minus) {
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        let Some(t) = self.next() else {
            return Err(ParseError::UnexpectedEnd("an expression"));
        };
        match t.token {
            Token::Number(x) => Ok(Expr::Number(x)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::Unset => Ok(Expr::Unset),
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let mut args = Vec::new();
                    if !self.eat(&Token::RParen) {
                        loop {
                            args.push(self.expr()?);
                            if self.eat(&Token::Comma) {
                                continue;
                            }
                            self.expect(Token::RParen, "')' or ','")?;
                            break;
                        }
                    }
                    Ok(Expr::Call { func: name, args })
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            token => Err(ParseError::UnexpectedToken {
                token,
                pos: t.pos,
                expected: "an expression",
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_chained_comparison() {
        let e = parse_expr("0 <= p_lt_15 <= 1").unwrap();
        let Expr::Comparison { first, rest } = e else {
            panic!("not a comparison");
        };
        assert_eq!(*first, Expr::Number(0.0));
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].0, CmpOp::Le);
        assert_eq!(rest[0].1, Expr::Var("p_lt_15".into()));
        assert_eq!(rest[1].0, CmpOp::Le);
        assert_eq!(rest[1].1, Expr::Number(1.0));
    }

    #[test]
    fn parse_is_not_unset() {
        assert_eq!(
            parse_expr("p is not unset").unwrap(),
            Expr::IsUnset {
                operand: Box::new(Expr::Var("p".into())),
                negated: true,
            }
        );
        assert_eq!(
            parse_expr("p is unset").unwrap(),
            Expr::IsUnset {
                operand: Box::new(Expr::Var("p".into())),
                negated: false,
            }
        );
    }

    #[test]
    fn is_requires_unset_operand() {
        assert!(matches!(
            parse_expr("p is 3").unwrap_err(),
            ParseError::BadIsOperand(_)
        ));
    }

    #[test]
    fn parse_call() {
        assert_eq!(
            parse_expr("isclose(p, 0.87895612)").unwrap(),
            Expr::Call {
                func: "isclose".into(),
                args: vec![Expr::Var("p".into()), Expr::Number(0.87895612)],
            }
        );
        assert_eq!(
            parse_expr("vars()").unwrap(),
            Expr::Call {
                func: "vars".into(),
                args: vec![],
            }
        );
    }

    #[test]
    fn parse_assignment_statement() {
        assert_eq!(
            parse_stmt("p = 0.5").unwrap(),
            Stmt::Assign {
                name: "p".into(),
                expr: Expr::Number(0.5),
            }
        );
        // `==` must stay a comparison
        assert!(matches!(parse_stmt("p == 0.5").unwrap(), Stmt::Expr(_)));
    }

    #[test]
    fn arithmetic_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let e = parse_expr("1 + 2 * 3").unwrap();
        let Expr::Binary { op: BinOp::Add, rhs, .. } = e else {
            panic!("expected top-level add");
        };
        assert!(matches!(*rhs, Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn boolean_connectives() {
        let e = parse_expr("true or false and not false").unwrap();
        // `or` binds loosest
        assert!(matches!(e, Expr::Binary { op: BinOp::Or, .. }));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(matches!(
            parse_stmt("1 2").unwrap_err(),
            ParseError::UnexpectedToken { .. }
        ));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(parse_stmt("   ").unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn unbalanced_paren_is_rejected() {
        assert!(matches!(
            parse_expr("(1 + 2").unwrap_err(),
            ParseError::UnexpectedEnd(_)
        ));
    }
}
