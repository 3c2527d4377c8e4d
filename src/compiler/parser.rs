use super::lexer::{Token, tokenize};
use crate::ast::{Expression, InputSource};
use crate::error::FormulaError;

/// Parses formula text into an [`Expression`].
///
/// Grammar, lowest precedence first:
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/') unary)*
/// unary   := ('-' | '+') unary | primary
/// primary := NUMBER | IDENT | IDENT '(' args? ')' | '(' expr ')'
/// args    := expr (',' expr)*
/// ```
///
/// Binary operators are left-associative.
pub fn parse(code: &str) -> Result<Expression, FormulaError> {
    let tokens = tokenize(code)?;
    if tokens.is_empty() {
        return Err(FormulaError::syntax("formula is empty"));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(FormulaError::syntax(format!(
            "unexpected '{}' after a complete expression",
            token
        ))),
    }
}

struct Parser<'code> {
    tokens: Vec<Token<'code>>,
    pos: usize,
}

impl<'code> Parser<'code> {
    fn peek(&self) -> Option<Token<'code>> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token<'code>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: Token<'_>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<Expression, FormulaError> {
        let mut left = self.term()?;
        loop {
            if self.eat(Token::Plus) {
                left = Expression::Sum(Box::new(left), Box::new(self.term()?));
            } else if self.eat(Token::Minus) {
                left = Expression::Subtract(Box::new(left), Box::new(self.term()?));
            } else {
                return Ok(left);
            }
        }
    }

    fn term(&mut self) -> Result<Expression, FormulaError> {
        let mut left = self.unary()?;
        loop {
            if self.eat(Token::Asterisk) {
                left = Expression::Multiply(Box::new(left), Box::new(self.unary()?));
            } else if self.eat(Token::Slash) {
                left = Expression::Divide(Box::new(left), Box::new(self.unary()?));
            } else {
                return Ok(left);
            }
        }
    }

    fn unary(&mut self) -> Result<Expression, FormulaError> {
        if self.eat(Token::Minus) {
            return Ok(Expression::Negate(Box::new(self.unary()?)));
        }
        if self.eat(Token::Plus) {
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expression, FormulaError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expression::Literal(n)),
            Some(Token::Identifier(name)) => {
                if self.eat(Token::BracketRoundOpen) {
                    return self.call(name);
                }
                Ok(Expression::Input(input_source(name)))
            }
            Some(Token::BracketRoundOpen) => {
                let inner = self.expr()?;
                if !self.eat(Token::BracketRoundClose) {
                    return Err(FormulaError::syntax("missing closing parenthesis"));
                }
                Ok(inner)
            }
            Some(token) => Err(FormulaError::syntax(format!(
                "expected a number, name or '(' but found '{}'",
                token
            ))),
            None => Err(FormulaError::syntax("formula ends unexpectedly")),
        }
    }

    fn call(&mut self, name: &str) -> Result<Expression, FormulaError> {
        if name.contains('.') {
            return Err(FormulaError::syntax(format!(
                "'{}' cannot be called as a function",
                name
            )));
        }
        let mut args = Vec::new();
        if !self.eat(Token::BracketRoundClose) {
            loop {
                args.push(self.expr()?);
                if self.eat(Token::Comma) {
                    continue;
                }
                if self.eat(Token::BracketRoundClose) {
                    break;
                }
                return Err(FormulaError::syntax(format!(
                    "expected ',' or ')' in the arguments of '{}'",
                    name
                )));
            }
        }
        Ok(Expression::Call {
            name: name.to_string(),
            args,
        })
    }
}

fn input_source(name: &str) -> InputSource {
    match name.split_once('.') {
        Some((target, property)) => InputSource::Property {
            target: target.to_string(),
            property: property.to_string(),
        },
        None => InputSource::Variable {
            name: name.to_string(),
        },
    }
}
