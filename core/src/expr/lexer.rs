use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Unset,
    And,
    Or,
    Not,
    Is,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Token::*;
        match self {
            Number(x) => write!(f, "{}", x),
            Str(s) => write!(f, "{:?}", s),
            Ident(name) => write!(f, "{}", name),
            True => f.write_str("true"),
            False => f.write_str("false"),
            Unset => f.write_str("unset"),
            And => f.write_str("and"),
            Or => f.write_str("or"),
            Not => f.write_str("not"),
            Is => f.write_str("is"),
            Lt => f.write_str("<"),
            Le => f.write_str("<="),
            Gt => f.write_str(">"),
            Ge => f.write_str(">="),
            EqEq => f.write_str("=="),
            Ne => f.write_str("!="),
            Assign => f.write_str("="),
            Plus => f.write_str("+"),
            Minus => f.write_str("-"),
            Star => f.write_str("*"),
            Slash => f.write_str("/"),
            LParen => f.write_str("("),
            RParen => f.write_str(")"),
            Comma => f.write_str(","),
        }
    }
}

/// A token plus the 0-based column of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub pos: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character '{0}' at column {}", .1 + 1)]
    UnexpectedChar(char, usize),

    #[error("Unterminated string literal (opening quote at column {})", .0 + 1)]
    UnterminatedString(usize),

    #[error("Unknown escape '\\{0}' in string literal at column {}", .1 + 1)]
    UnknownEscape(char, usize),

    #[error("Malformed number literal '{0}' at column {}", .1 + 1)]
    MalformedNumber(String, usize),
}

pub fn tokenize(src: &str) -> Result<Vec<SpannedToken>, LexError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let mut push = |token, pos| tokens.push(SpannedToken { token, pos });

    while i < chars.len() {
        let c = chars[i];
        match c {
            _ if c.is_whitespace() => i += 1,

            '(' | ')' | ',' | '+' | '*' | '/' => {
                let token = match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    '+' => Token::Plus,
                    '*' => Token::Star,
                    _ => Token::Slash,
                };
                push(token, i);
                i += 1;
            }

            // '-' is always the operator; negative literals are produced by
            // unary minus in the parser.
            '-' => {
                push(Token::Minus, i);
                i += 1;
            }

            '<' | '>' | '=' | '!' => {
                let has_eq = chars.get(i + 1) == Some(&'=');
                let token = match (c, has_eq) {
                    ('<', true) => Token::Le,
                    ('<', false) => Token::Lt,
                    ('>', true) => Token::Ge,
                    ('>', false) => Token::Gt,
                    ('=', true) => Token::EqEq,
                    ('=', false) => Token::Assign,
                    ('!', true) => Token::Ne,
                    ('!', false) => return Err(LexError::UnexpectedChar('!', i)),
                    _ => unreachable!(),
                };
                push(token, i);
                i += if has_eq { 2 } else { 1 };
            }

            '"' => {
                let start = i;
                let mut s = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(LexError::UnterminatedString(start)),
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            let esc = *chars
                                .get(i + 1)
                                .ok_or(LexError::UnterminatedString(start))?;
                            s.push(match esc {
                                '"' => '"',
                                '\\' => '\\',
                                'n' => '\n',
                                't' => '\t',
                                _ => return Err(LexError::UnknownEscape(esc, i)),
                            });
                            i += 2;
                        }
                        Some(&ch) => {
                            s.push(ch);
                            i += 1;
                        }
                    }
                }
                push(Token::Str(s), start);
            }

            _ if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric()
                        || chars[i] == '.'
                        || ((chars[i] == '+' || chars[i] == '-')
                            && matches!(chars[i - 1], 'e' | 'E')))
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let x = text
                    .parse::<f64>()
                    .map_err(|_| LexError::MalformedNumber(text.clone(), start))?;
                push(Token::Number(x), start);
            }

            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let token = match word.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "unset" => Token::Unset,
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "is" => Token::Is,
                    _ => Token::Ident(word),
                };
                push(token, start);
            }

            _ => return Err(LexError::UnexpectedChar(c, i)),
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn tokenize_chained_comparison() {
        use Token::*;
        assert_eq!(
            kinds("0 <= p_lt_15 <= 1"),
            vec![Number(0.0), Le, Ident("p_lt_15".into()), Le, Number(1.0)]
        );
    }

    #[test]
    fn tokenize_call_with_float() {
        use Token::*;
        assert_eq!(
            kinds("isclose(p, 0.87895612)"),
            vec![
                Ident("isclose".into()),
                LParen,
                Ident("p".into()),
                Comma,
                Number(0.87895612),
                RParen,
            ]
        );
    }

    #[test]
    fn tokenize_keywords_and_strings() {
        use Token::*;
        assert_eq!(
            kinds(r#"p is not unset and defined("p")"#),
            vec![
                Ident("p".into()),
                Is,
                Not,
                Unset,
                And,
                Ident("defined".into()),
                LParen,
                Str("p".into()),
                RParen,
            ]
        );
    }

    #[test]
    fn tokenize_scientific_notation() {
        use Token::*;
        assert_eq!(kinds("1e-8"), vec![Number(1e-8)]);
        assert_eq!(kinds("2.5E+3"), vec![Number(2.5e3)]);
    }

    #[test]
    fn positions_are_recorded() {
        let toks = tokenize("a == b").unwrap();
        assert_eq!(toks[0].pos, 0);
        assert_eq!(toks[1].pos, 2);
        assert_eq!(toks[2].pos, 5);
    }

    #[test]
    fn lex_errors() {
        assert_eq!(
            tokenize("a ! b").unwrap_err(),
            LexError::UnexpectedChar('!', 2)
        );
        assert_eq!(
            tokenize(r#""oops"#).unwrap_err(),
            LexError::UnterminatedString(0)
        );
        assert_eq!(
            tokenize("12.3.4").unwrap_err(),
            LexError::MalformedNumber("12.3.4".into(), 0)
        );
        assert_eq!(tokenize("p @ 1").unwrap_err(), LexError::UnexpectedChar('@', 2));
    }
}
