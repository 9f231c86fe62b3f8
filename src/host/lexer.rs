//! Line tokenizer for the host language.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::digit1,
    combinator::{map, recognize},
    IResult, Parser,
};

/// A host-language token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    /// Identifier or keyword.
    Name(String),
    /// Operator or punctuation.
    Op(&'static str),
}

impl Token {
    /// Returns true if this is the given operator.
    pub fn is_op(&self, op: &str) -> bool {
        matches!(self, Token::Op(o) if *o == op)
    }

    /// Returns true if this is the given name or keyword.
    pub fn is_name(&self, name: &str) -> bool {
        matches!(self, Token::Name(n) if n == name)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn name(input: &str) -> IResult<&str, Token> {
    map(
        recognize((take_while1(is_ident_start), take_while(is_ident_char))),
        |s: &str| Token::Name(s.to_string()),
    )
    .parse(input)
}

fn skip_digits(input: &str) -> &str {
    input.trim_start_matches(|c: char| c.is_ascii_digit())
}

/// Consumes `e[+-]digits` if present; a bare `e` is left for the next token.
fn exponent(input: &str) -> &str {
    let Some(after) = input.strip_prefix(['e', 'E']) else {
        return input;
    };
    let after = after.strip_prefix(['+', '-']).unwrap_or(after);
    let rest = skip_digits(after);
    if rest.len() == after.len() {
        input
    } else {
        rest
    }
}

fn number(input: &str) -> IResult<&str, Token> {
    let (rest, _) = digit1(input)?;
    let rest = match rest.strip_prefix('.') {
        Some(fraction) => skip_digits(fraction),
        None => rest,
    };
    let rest = exponent(rest);
    let text = &input[..input.len() - rest.len()];

    let token = if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>().ok().map(Token::Float)
    } else {
        text.parse::<i64>().ok().map(Token::Int)
    };

    match token {
        Some(token) => Ok((rest, token)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

/// Quoted string with backslash escapes; either quote style.
fn string(input: &str) -> IResult<&str, Token> {
    let fail = || nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char));

    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, q @ ('\'' | '"'))) => q,
        _ => return Err(fail()),
    };

    let mut value = String::new();
    while let Some((pos, c)) = chars.next() {
        match c {
            '\\' => {
                let (_, escaped) = chars.next().ok_or_else(fail)?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                });
            }
            c if c == quote => return Ok((&input[pos + c.len_utf8()..], Token::Str(value))),
            c => value.push(c),
        }
    }

    Err(fail())
}

fn long_operator(input: &str) -> IResult<&str, Token> {
    map(
        alt((
            tag("**"),
            tag("//"),
            tag("=="),
            tag("!="),
            tag("<="),
            tag(">="),
            tag("+="),
            tag("-="),
            tag("*="),
            tag("/="),
        )),
        op_token,
    )
    .parse(input)
}

fn short_operator(input: &str) -> IResult<&str, Token> {
    map(
        alt((
            tag("+"),
            tag("-"),
            tag("*"),
            tag("/"),
            tag("%"),
            tag("<"),
            tag(">"),
            tag("="),
            tag("("),
            tag(")"),
            tag("["),
            tag("]"),
            tag(","),
            tag(":"),
        )),
        op_token,
    )
    .parse(input)
}

/// Maps a matched operator slice onto its static spelling.
fn op_token(op: &str) -> Token {
    const OPS: &[&str] = &[
        "**", "//", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "+", "-", "*", "/", "%", "<",
        ">", "=", "(", ")", "[", "]", ",", ":",
    ];
    let found = OPS.iter().find(|o| **o == op).copied().unwrap_or(",");
    Token::Op(found)
}

fn token(input: &str) -> IResult<&str, Token> {
    alt((number, string, name, long_operator, short_operator)).parse(input)
}

/// Tokenizes one line. A `#` outside a string starts a comment.
pub fn tokenize(line: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut rest = line;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() || rest.starts_with('#') {
            break;
        }
        match token(rest) {
            Ok((remaining, token)) => {
                tokens.push(token);
                rest = remaining;
            }
            Err(_) => {
                let near: String = rest.chars().take(12).collect();
                return Err(format!("invalid syntax near '{}'", near));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment() {
        let tokens = tokenize("value = 123 * 3").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Name("value".to_string()),
                Token::Op("="),
                Token::Int(123),
                Token::Op("*"),
                Token::Int(3),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokenize("1.5").unwrap(), vec![Token::Float(1.5)]);
        assert_eq!(tokenize("2.").unwrap(), vec![Token::Float(2.0)]);
        assert_eq!(tokenize("1e3").unwrap(), vec![Token::Float(1000.0)]);
        assert_eq!(tokenize("2.5e-1").unwrap(), vec![Token::Float(0.25)]);
        assert_eq!(
            tokenize("x = 1.125").unwrap(),
            vec![
                Token::Name("x".to_string()),
                Token::Op("="),
                Token::Float(1.125),
            ]
        );
        assert_eq!(
            tokenize("0.25 + 0.25").unwrap(),
            vec![Token::Float(0.25), Token::Op("+"), Token::Float(0.25)]
        );
        assert_eq!(
            tokenize("3e").unwrap(),
            vec![Token::Int(3), Token::Name("e".to_string())]
        );
        assert!(tokenize("99999999999999999999").is_err());
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            tokenize(r#"print("a\"b", 'c\n')"#).unwrap(),
            vec![
                Token::Name("print".to_string()),
                Token::Op("("),
                Token::Str("a\"b".to_string()),
                Token::Op(","),
                Token::Str("c\n".to_string()),
                Token::Op(")"),
            ]
        );
        assert_eq!(tokenize("''").unwrap(), vec![Token::Str(String::new())]);
    }

    #[test]
    fn test_comment_and_hash_in_string() {
        assert_eq!(
            tokenize("x = '#1'  # trailing").unwrap(),
            vec![
                Token::Name("x".to_string()),
                Token::Op("="),
                Token::Str("#1".to_string()),
            ]
        );
    }

    #[test]
    fn test_long_operators_first() {
        let tokens = tokenize("a **= b // c").unwrap();
        assert!(tokens[1].is_op("**"));
        assert!(tokens[2].is_op("="));
        assert!(tokens[4].is_op("//"));
    }

    #[test]
    fn test_errors() {
        assert!(tokenize("x = 'unterminated").is_err());
        assert!(tokenize("x = a.b").is_err());
    }
}
