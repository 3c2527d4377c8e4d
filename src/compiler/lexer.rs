use crate::error::FormulaError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'code> {
    Number(f64),
    /// A bare or single-dotted identifier such as `width` or `paint.coverage`.
    Identifier(&'code str),
    Plus,
    Minus,
    Asterisk,
    Slash,
    BracketRoundOpen,
    BracketRoundClose,
    Comma,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", crate::ast::format_number(*n)),
            Token::Identifier(name) => f.write_str(name),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Asterisk => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::BracketRoundOpen => f.write_str("("),
            Token::BracketRoundClose => f.write_str(")"),
            Token::Comma => f.write_str(","),
        }
    }
}

/// Splits formula text into tokens. Whitespace is insignificant.
pub fn tokenize(code: &str) -> Result<Vec<Token<'_>>, FormulaError> {
    let bytes = code.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let token = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                pos += 1;
                continue;
            }
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Asterisk,
            b'/' => Token::Slash,
            b'(' => Token::BracketRoundOpen,
            b')' => Token::BracketRoundClose,
            b',' => Token::Comma,
            b'0'..=b'9' | b'.' => {
                let (number, end) = lex_number(code, pos)?;
                tokens.push(Token::Number(number));
                pos = end;
                continue;
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let (name, end) = lex_identifier(code, pos)?;
                tokens.push(Token::Identifier(name));
                pos = end;
                continue;
            }
            _ => {
                let ch = code[pos..].chars().next().unwrap_or('?');
                return Err(FormulaError::syntax(format!("unexpected character '{}'", ch)));
            }
        };
        tokens.push(token);
        pos += 1;
    }
    Ok(tokens)
}

fn lex_number(code: &str, start: usize) -> Result<(f64, usize), FormulaError> {
    let bytes = code.as_bytes();
    let mut end = start;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    // Scientific notation: 1e3, 2.5E-2
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    let text = &code[start..end];
    if end < bytes.len() && (bytes[end].is_ascii_alphabetic() || bytes[end] == b'_') {
        return Err(FormulaError::syntax(format!(
            "invalid number '{}{}'",
            text,
            trailing_word(code, end)
        )));
    }
    if end < bytes.len() && bytes[end] == b'.' {
        return Err(FormulaError::syntax(format!("invalid number '{}.'", text)));
    }
    text.parse::<f64>()
        .map(|n| (n, end))
        .map_err(|_| FormulaError::syntax(format!("invalid number '{}'", text)))
}

fn lex_identifier(code: &str, start: usize) -> Result<(&str, usize), FormulaError> {
    let bytes = code.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let mut end = start;
    while end < bytes.len() && is_word(bytes[end]) {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let segment_start = end + 1;
        let mut segment_end = segment_start;
        while segment_end < bytes.len() && is_word(bytes[segment_end]) {
            segment_end += 1;
        }
        let starts_like_identifier = bytes
            .get(segment_start)
            .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_');
        if !starts_like_identifier {
            return Err(FormulaError::syntax(format!(
                "expected a property name after '{}.'",
                &code[start..end]
            )));
        }
        end = segment_end;
        if end < bytes.len() && bytes[end] == b'.' {
            return Err(FormulaError::syntax(format!(
                "'{}.{}' has more than one dot",
                &code[start..end],
                trailing_word(code, end + 1)
            )));
        }
    }
    Ok((&code[start..end], end))
}

fn trailing_word(code: &str, from: usize) -> &str {
    let rest = &code[from..];
    let len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(rest.len());
    &rest[..len]
}
