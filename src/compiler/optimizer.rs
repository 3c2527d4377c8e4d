use crate::ast::Expression;
use crate::evaluator::functions;

/// Folds constant sub-expressions of an AST.
///
/// Operations whose operands are all literals are folded, and the identities
/// `x + 0`, `x - 0`, `x * 1` and `x / 1` are reduced to `x`. Sub-trees that
/// read an input are never dropped, so missing or broken inputs still surface
/// at evaluation time (`x * 0` stays as written).
///
/// Operations that would fail (division by zero, a domain error in a
/// built-in) are left in place for the evaluator to report.
pub struct AstOptimizer;

impl AstOptimizer {
    pub fn optimize(expr: Expression) -> Expression {
        match expr {
            Expression::Sum(l, r) => Self::fold_binary(*l, *r, Expression::Sum, |a, b| Some(a + b)),
            Expression::Subtract(l, r) => {
                Self::fold_binary(*l, *r, Expression::Subtract, |a, b| Some(a - b))
            }
            Expression::Multiply(l, r) => {
                Self::fold_binary(*l, *r, Expression::Multiply, |a, b| Some(a * b))
            }
            Expression::Divide(l, r) => Self::fold_binary(*l, *r, Expression::Divide, |a, b| {
                (b != 0.0).then(|| a / b)
            }),
            Expression::Negate(v) => match Self::optimize(*v) {
                Expression::Literal(n) => Expression::Literal(-n),
                Expression::Negate(inner) => *inner,
                other => Expression::Negate(Box::new(other)),
            },
            Expression::Call { name, args } => {
                let args: Vec<Expression> = args.into_iter().map(Self::optimize).collect();
                Self::fold_call(name, args)
            }
            leaf => leaf,
        }
    }

    fn fold_binary<B, F>(l: Expression, r: Expression, build: B, apply: F) -> Expression
    where
        B: Fn(Box<Expression>, Box<Expression>) -> Expression,
        F: Fn(f64, f64) -> Option<f64>,
    {
        let left = Self::optimize(l);
        let right = Self::optimize(r);
        if let (Expression::Literal(a), Expression::Literal(b)) = (&left, &right) {
            if let Some(n) = apply(*a, *b).filter(|n| n.is_finite()) {
                return Expression::Literal(n);
            }
        }
        Self::apply_identity_rules(build(Box::new(left), Box::new(right)))
    }

    fn apply_identity_rules(expr: Expression) -> Expression {
        match expr {
            Expression::Sum(l, r) => match (*l, *r) {
                (expr, Expression::Literal(rv)) if rv == 0.0 => expr,
                (Expression::Literal(lv), expr) if lv == 0.0 => expr,
                (l, r) => Expression::Sum(Box::new(l), Box::new(r)),
            },
            Expression::Subtract(l, r) => match (*l, *r) {
                (expr, Expression::Literal(rv)) if rv == 0.0 => expr,
                (l, r) => Expression::Subtract(Box::new(l), Box::new(r)),
            },
            Expression::Multiply(l, r) => match (*l, *r) {
                (expr, Expression::Literal(rv)) if rv == 1.0 => expr,
                (Expression::Literal(lv), expr) if lv == 1.0 => expr,
                (l, r) => Expression::Multiply(Box::new(l), Box::new(r)),
            },
            Expression::Divide(l, r) => match (*l, *r) {
                (expr, Expression::Literal(rv)) if rv == 1.0 => expr,
                (l, r) => Expression::Divide(Box::new(l), Box::new(r)),
            },
            other => other,
        }
    }

    fn fold_call(name: String, args: Vec<Expression>) -> Expression {
        let literals: Option<Vec<f64>> = args
            .iter()
            .map(|a| match a {
                Expression::Literal(n) => Some(*n),
                _ => None,
            })
            .collect();
        if let (Some(builtin), Some(values)) = (functions::builtin(&name), literals) {
            if builtin.arity.accepts(values.len()) {
                if let Ok(n) = (builtin.apply)(&values) {
                    if n.is_finite() {
                        return Expression::Literal(n);
                    }
                }
            }
        }
        Expression::Call { name, args }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parse;

    fn optimized(code: &str) -> Expression {
        AstOptimizer::optimize(parse(code).unwrap())
    }

    #[test]
    fn folds_literal_arithmetic() {
        assert_eq!(optimized("2 * 3 + 4"), Expression::Literal(10.0));
        assert_eq!(optimized("-(-5)"), Expression::Literal(5.0));
    }

    #[test]
    fn keeps_inputs_even_when_multiplied_by_zero() {
        assert_eq!(optimized("width * 0").to_string(), "width * 0");
    }

    #[test]
    fn drops_neutral_operands() {
        assert_eq!(optimized("width * 1 + 0").to_string(), "width");
        assert_eq!(optimized("(width - 0) / 1").to_string(), "width");
        assert_eq!(optimized("0 + 1 * depth").to_string(), "depth");
    }

    #[test]
    fn never_folds_division_by_zero() {
        assert_eq!(optimized("1 / 0").to_string(), "1 / 0");
        assert_eq!(optimized("sqrt(0 - 4)").to_string(), "sqrt(-4)");
    }

    #[test]
    fn folds_pure_builtin_calls() {
        assert_eq!(optimized("max(1, 2 + 3)"), Expression::Literal(5.0));
        assert_eq!(
            optimized("round(width, 1 + 1)").to_string(),
            "round(width, 2)"
        );
    }
}
