//! Arithmetic tool for portion and cost math.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ChefError, Result};

use super::{Tool, ToolContext};

/// Evaluates `"<number> <op> <number>"` with `+ - * /`.
pub struct CalculateTool;

#[derive(Debug, Deserialize)]
struct CalculateArgs {
    expression: String,
}

/// Evaluate a three-token arithmetic expression.
///
/// # Errors
///
/// Returns `ChefError::Tool` for malformed expressions, unknown operators
/// and division by zero.
///
/// # Example
/// ```
/// use chefbot::tools::calculator::evaluate;
///
/// assert_eq!(evaluate("10 + 5").unwrap(), 15.0);
/// assert!(evaluate("10 / 0").is_err());
/// ```
pub fn evaluate(expression: &str) -> Result<f64> {
    let parts: Vec<&str> = expression.split_whitespace().collect();
    let [lhs, op, rhs] = parts.as_slice() else {
        return Err(ChefError::Tool(
            "expression must be '<number> <operator> <number>' (e.g. '5 * 2')".to_string(),
        ));
    };

    let lhs = parse_operand(lhs)?;
    let rhs = parse_operand(rhs)?;

    let result = match *op {
        "+" => lhs + rhs,
        "-" => lhs - rhs,
        "*" => lhs * rhs,
        "/" if rhs == 0.0 => return Err(ChefError::Tool("division by zero".to_string())),
        "/" => lhs / rhs,
        other => return Err(ChefError::Tool(format!("unsupported operator: {}", other))),
    };

    // Non-finite values serialize to JSON null.
    if !result.is_finite() {
        return Err(ChefError::Tool("result is not a finite number".to_string()));
    }
    Ok(result)
}

/// `f64::from_str` also accepts `inf`, `NaN` and literals that overflow.
fn parse_operand(token: &str) -> Result<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ChefError::Tool(format!("not a number: {}", token)))
}

#[async_trait]
impl Tool for CalculateTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "간단한 사칙연산(+, -, *, /)을 수행합니다. 예: '10 + 5'"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "'숫자 연산자 숫자' 형식의 수식 (예: '300 * 2')"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<Value> {
        let args: CalculateArgs = serde_json::from_value(args)?;
        let result = evaluate(&args.expression)?;
        Ok(json!({ "result": result }))
    }
}
