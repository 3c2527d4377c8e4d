/// A record of how a formula was evaluated, including intermediate values.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationTrace {
    BinaryOp {
        op_symbol: &'static str,
        left: Box<EvaluationTrace>,
        right: Box<EvaluationTrace>,
        outcome: f64,
    },
    UnaryOp {
        op_symbol: &'static str,
        child: Box<EvaluationTrace>,
        outcome: f64,
    },
    Call {
        function: String,
        args: Vec<EvaluationTrace>,
        outcome: f64,
    },
    Literal {
        value: f64,
    },
    Input {
        source: String,
        value: f64,
    },
}

impl EvaluationTrace {
    pub fn get_outcome(&self) -> f64 {
        match self {
            EvaluationTrace::BinaryOp { outcome, .. }
            | EvaluationTrace::UnaryOp { outcome, .. }
            | EvaluationTrace::Call { outcome, .. } => *outcome,
            EvaluationTrace::Literal { value } | EvaluationTrace::Input { value, .. } => *value,
        }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            EvaluationTrace::BinaryOp { op_symbol, .. } => match *op_symbol {
                "+" | "-" => 1,
                "*" | "/" => 2,
                _ => 0,
            },
            EvaluationTrace::UnaryOp { .. } => 3,
            EvaluationTrace::Call { .. }
            | EvaluationTrace::Literal { .. }
            | EvaluationTrace::Input { .. } => 4,
        }
    }
}
