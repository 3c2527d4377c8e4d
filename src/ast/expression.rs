use super::InputSource;
use std::fmt;

/// The Abstract Syntax Tree of a parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    // Arithmetic
    Sum(Box<Expression>, Box<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Multiply(Box<Expression>, Box<Expression>),
    Divide(Box<Expression>, Box<Expression>),
    Negate(Box<Expression>),

    // Function application, built-in or shared
    Call { name: String, args: Vec<Expression> },

    // Leaf nodes
    Literal(f64),
    Input(InputSource),
}

impl Expression {
    pub fn variable(name: &str) -> Self {
        Expression::Input(InputSource::Variable {
            name: name.to_string(),
        })
    }

    /// Collects every identifier the expression reads, in source order.
    pub fn collect_inputs<'a>(&'a self, inputs: &mut Vec<&'a InputSource>) {
        match self {
            Expression::Input(source) => inputs.push(source),
            Expression::Sum(l, r)
            | Expression::Subtract(l, r)
            | Expression::Multiply(l, r)
            | Expression::Divide(l, r) => {
                l.collect_inputs(inputs);
                r.collect_inputs(inputs);
            }
            Expression::Negate(v) => v.collect_inputs(inputs),
            Expression::Call { args, .. } => {
                for arg in args {
                    arg.collect_inputs(inputs);
                }
            }
            Expression::Literal(_) => {}
        }
    }

    /// Collects every function application as `(name, argument count)`.
    pub fn collect_calls<'a>(&'a self, calls: &mut Vec<(&'a str, usize)>) {
        match self {
            Expression::Call { name, args } => {
                calls.push((name.as_str(), args.len()));
                for arg in args {
                    arg.collect_calls(calls);
                }
            }
            Expression::Sum(l, r)
            | Expression::Subtract(l, r)
            | Expression::Multiply(l, r)
            | Expression::Divide(l, r) => {
                l.collect_calls(calls);
                r.collect_calls(calls);
            }
            Expression::Negate(v) => v.collect_calls(calls),
            Expression::Literal(_) | Expression::Input(_) => {}
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expression::Sum(..) | Expression::Subtract(..) => 1,
            Expression::Multiply(..) | Expression::Divide(..) => 2,
            Expression::Negate(_) => 3,
            Expression::Call { .. } | Expression::Literal(_) | Expression::Input(_) => 4,
        }
    }

    fn fmt_operand(
        &self,
        f: &mut fmt::Formatter<'_>,
        operand: &Expression,
        min_precedence: u8,
    ) -> fmt::Result {
        if operand.precedence() < min_precedence {
            write!(f, "({})", operand)
        } else {
            write!(f, "{}", operand)
        }
    }

    fn fmt_binary(
        &self,
        f: &mut fmt::Formatter<'_>,
        symbol: &str,
        l: &Expression,
        r: &Expression,
    ) -> fmt::Result {
        let own = self.precedence();
        self.fmt_operand(f, l, own)?;
        write!(f, " {} ", symbol)?;
        // Right operands of `-` and `/` need parentheses at equal precedence.
        self.fmt_operand(f, r, own + 1)
    }
}

/// Renders the expression back to canonical formula text.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Sum(l, r) => self.fmt_binary(f, "+", l, r),
            Expression::Subtract(l, r) => self.fmt_binary(f, "-", l, r),
            Expression::Multiply(l, r) => self.fmt_binary(f, "*", l, r),
            Expression::Divide(l, r) => self.fmt_binary(f, "/", l, r),
            Expression::Negate(v) => {
                write!(f, "-")?;
                self.fmt_operand(f, v, 3)
            }
            Expression::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expression::Literal(n) => write!(f, "{}", super::format_number(*n)),
            Expression::Input(source) => write!(f, "{}", source),
        }
    }
}

/// Prints an expression as an indented tree, as `costwright-cli --ast` does
/// to show what the parser and optimizer produced.
pub struct DisplayExpression<'a> {
    pub expr: &'a Expression,
}

impl<'a> fmt::Display for DisplayExpression<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_as_tree(self.expr, f, "", true)
    }
}

impl<'a> DisplayExpression<'a> {
    fn fmt_as_tree(
        &self,
        expr: &Expression,
        f: &mut fmt::Formatter<'_>,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let node_marker = if is_last { "└── " } else { "├── " };
        write!(f, "{}{}", prefix, node_marker)?;

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });

        match expr {
            Expression::Literal(n) => writeln!(f, "Literal: {}", super::format_number(*n))?,
            Expression::Input(s) => writeln!(f, "Input: {}", s)?,
            Expression::Negate(v) => {
                writeln!(f, "Negate (-)")?;
                self.fmt_as_tree(v, f, &child_prefix, true)?;
            }
            Expression::Sum(l, r) => self.fmt_binary(f, "Sum (+)", l, r, &child_prefix)?,
            Expression::Subtract(l, r) => {
                self.fmt_binary(f, "Subtract (-)", l, r, &child_prefix)?
            }
            Expression::Multiply(l, r) => {
                self.fmt_binary(f, "Multiply (*)", l, r, &child_prefix)?
            }
            Expression::Divide(l, r) => self.fmt_binary(f, "Divide (/)", l, r, &child_prefix)?,
            Expression::Call { name, args } => {
                writeln!(f, "Call: {}/{}", name, args.len())?;
                for (i, arg) in args.iter().enumerate() {
                    self.fmt_as_tree(arg, f, &child_prefix, i + 1 == args.len())?;
                }
            }
        }
        Ok(())
    }

    fn fmt_binary(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        l: &Expression,
        r: &Expression,
        prefix: &str,
    ) -> fmt::Result {
        writeln!(f, "{}", name)?;
        self.fmt_as_tree(l, f, prefix, false)?;
        self.fmt_as_tree(r, f, prefix, true)?;
        Ok(())
    }
}
