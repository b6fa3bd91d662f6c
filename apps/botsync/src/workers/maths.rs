use super::WorkExecutor;
use crate::errors::{BotError, BotResult};

/// Executor for simple arithmetic jobs
///
/// Accepted parameter forms:
/// - `pow,<base>,<exponent>`
/// - `fibonacci,<n>`
#[derive(Debug, Clone, Copy, Default)]
pub struct MathsWorker;

impl MathsWorker {
    pub fn new() -> Self {
        Self
    }
}

impl WorkExecutor for MathsWorker {
    fn name(&self) -> &str {
        "maths"
    }

    fn would_accept(&self, parameters: &str) -> bool {
        matches!(
            parameters.split(',').next(),
            Some("pow") | Some("fibonacci")
        )
    }

    fn perform(&self, parameters: &str) -> BotResult<String> {
        let fields: Vec<&str> = parameters.split(',').map(str::trim).collect();
        match fields.as_slice() {
            ["pow", base, exponent] => pow(base, exponent),
            ["fibonacci", n] => fibonacci(n),
            _ => Err(BotError::WorkFailed(format!(
                "unsupported parameters: {}",
                parameters
            ))),
        }
    }
}

fn pow(base: &str, exponent: &str) -> BotResult<String> {
    if let (Ok(base), Ok(exponent)) = (base.parse::<i64>(), exponent.parse::<u32>()) {
        return base
            .checked_pow(exponent)
            .map(|value| value.to_string())
            .ok_or_else(|| BotError::WorkFailed(format!("{}^{} overflows", base, exponent)));
    }

    let base: f64 = parse_operand(base)?;
    let exponent: f64 = parse_operand(exponent)?;
    let value = base.powf(exponent);
    if value.is_finite() {
        Ok(value.to_string())
    } else {
        Err(BotError::WorkFailed(format!(
            "{}^{} has no finite value",
            base, exponent
        )))
    }
}

/// n-th Fibonacci number, F(0) = 0, F(1) = 1
fn fibonacci(n: &str) -> BotResult<String> {
    let n: u32 = parse_operand(n)?;
    let (mut current, mut next) = (0u64, 1u64);
    for _ in 0..n {
        let sum = current
            .checked_add(next)
            .ok_or_else(|| BotError::WorkFailed(format!("fibonacci({}) overflows", n)))?;
        current = next;
        next = sum;
    }
    Ok(current.to_string())
}

fn parse_operand<T: std::str::FromStr>(raw: &str) -> BotResult<T> {
    raw.parse()
        .map_err(|_| BotError::WorkFailed(format!("invalid operand: {:?}", raw)))
}
