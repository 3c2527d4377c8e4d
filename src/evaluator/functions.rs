//! Built-in math functions and named constants.

use crate::error::Arity;

/// A pure numeric function callable from formulas by name.
#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    /// Applies the function to already-evaluated arguments. The error string
    /// describes an invalid argument; the caller attaches the sub-expression.
    pub apply: fn(&[f64]) -> Result<f64, String>,
}

static BUILTINS: &[Builtin] = &[
    Builtin { name: "sqrt", arity: Arity::Exactly(1), apply: sqrt },
    Builtin { name: "round", arity: Arity::Range(1, 2), apply: round },
    Builtin { name: "ceil", arity: Arity::Exactly(1), apply: ceil },
    Builtin { name: "floor", arity: Arity::Exactly(1), apply: floor },
    Builtin { name: "abs", arity: Arity::Exactly(1), apply: abs },
    Builtin { name: "max", arity: Arity::AtLeast(1), apply: max },
    Builtin { name: "min", arity: Arity::AtLeast(1), apply: min },
    Builtin { name: "pow", arity: Arity::Exactly(2), apply: pow },
    Builtin { name: "exp", arity: Arity::Exactly(1), apply: exp },
    Builtin { name: "ln", arity: Arity::Exactly(1), apply: ln },
    Builtin { name: "log10", arity: Arity::Exactly(1), apply: log10 },
    Builtin { name: "sign", arity: Arity::Exactly(1), apply: sign },
    Builtin { name: "clamp", arity: Arity::Exactly(3), apply: clamp },
];

static CONSTANTS: &[(&str, f64)] = &[("pi", std::f64::consts::PI), ("e", std::f64::consts::E)];

pub fn builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}

pub fn constant(name: &str) -> Option<f64> {
    CONSTANTS.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

pub fn constant_names() -> impl Iterator<Item = &'static str> {
    CONSTANTS.iter().map(|(n, _)| *n)
}

fn sqrt(args: &[f64]) -> Result<f64, String> {
    let x = args[0];
    if x < 0.0 {
        return Err(format!("square root of negative number {}", x));
    }
    Ok(x.sqrt())
}

fn round(args: &[f64]) -> Result<f64, String> {
    let digits = args.get(1).copied().unwrap_or(0.0).trunc();
    let factor = 10f64.powf(digits);
    Ok((args[0] * factor).round() / factor)
}

fn ceil(args: &[f64]) -> Result<f64, String> {
    Ok(args[0].ceil())
}

fn floor(args: &[f64]) -> Result<f64, String> {
    Ok(args[0].floor())
}

fn abs(args: &[f64]) -> Result<f64, String> {
    Ok(args[0].abs())
}

fn max(args: &[f64]) -> Result<f64, String> {
    Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

fn min(args: &[f64]) -> Result<f64, String> {
    Ok(args.iter().copied().fold(f64::INFINITY, f64::min))
}

fn pow(args: &[f64]) -> Result<f64, String> {
    Ok(args[0].powf(args[1]))
}

fn exp(args: &[f64]) -> Result<f64, String> {
    Ok(args[0].exp())
}

fn ln(args: &[f64]) -> Result<f64, String> {
    let x = args[0];
    if x <= 0.0 {
        return Err(format!("logarithm of non-positive number {}", x));
    }
    Ok(x.ln())
}

fn log10(args: &[f64]) -> Result<f64, String> {
    let x = args[0];
    if x <= 0.0 {
        return Err(format!("logarithm of non-positive number {}", x));
    }
    Ok(x.log10())
}

fn sign(args: &[f64]) -> Result<f64, String> {
    let x = args[0];
    Ok(if x == 0.0 { 0.0 } else { x.signum() })
}

fn clamp(args: &[f64]) -> Result<f64, String> {
    let (x, lo, hi) = (args[0], args[1], args[2]);
    if lo > hi {
        return Err(format!("clamp bounds are reversed ({} > {})", lo, hi));
    }
    Ok(x.clamp(lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_supports_optional_digits() {
        let round = builtin("round").unwrap();
        assert_eq!((round.apply)(&[2.345]), Ok(2.0));
        assert_eq!((round.apply)(&[2.345, 1.0]), Ok(2.3));
        assert_eq!((round.apply)(&[1250.0, -2.0]), Ok(1300.0));
    }

    #[test]
    fn domain_errors_are_reported() {
        assert!((builtin("sqrt").unwrap().apply)(&[-1.0]).is_err());
        assert!((builtin("ln").unwrap().apply)(&[0.0]).is_err());
        assert!((builtin("clamp").unwrap().apply)(&[1.0, 5.0, 2.0]).is_err());
    }

    #[test]
    fn variadic_extrema() {
        assert_eq!((builtin("max").unwrap().apply)(&[1.0, 7.0, 3.0]), Ok(7.0));
        assert_eq!((builtin("min").unwrap().apply)(&[4.0]), Ok(4.0));
    }

    #[test]
    fn constants_resolve() {
        assert_eq!(constant("pi"), Some(std::f64::consts::PI));
        assert_eq!(constant("tau"), None);
    }
}
