use serde_json::Value;

use crate::domain::report::Verdict;
use crate::domain::testspec::Operator;

/// Outcome of applying one operator to resolved values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpOutcome {
    pub verdict: Verdict,
    pub reason: Option<String>,
}

impl OpOutcome {
    pub fn pass() -> Self {
        Self {
            verdict: Verdict::Pass,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Fail,
            reason: Some(reason.into()),
        }
    }
}

/// Best-effort numeric view of a scalar, for ordering operators.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Equality after type coercion: numeric when both sides coerce to numbers,
/// textual for remaining scalars, structural otherwise. Total over all value
/// pairs, so `is-equal` and `not-equal` stay exact complements.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    if left == right {
        return true;
    }
    if let (Some(left_num), Some(right_num)) = (as_number(left), as_number(right)) {
        return left_num == right_num;
    }
    match (scalar_text(left), scalar_text(right)) {
        (Some(left_text), Some(right_text)) => left_text == right_text,
        _ => false,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Applies a value-expecting operator to one resolved value. Coercion
/// failures become FAIL outcomes with a "type mismatch" reason, never errors.
pub fn apply_value(operator: Operator, actual: &Value, expected: &Value) -> OpOutcome {
    match operator {
        Operator::IsEqual => {
            if loose_eq(actual, expected) {
                OpOutcome::pass()
            } else {
                OpOutcome::fail(format!("{actual} is not equal to {expected}"))
            }
        }
        Operator::NotEqual => {
            if loose_eq(actual, expected) {
                OpOutcome::fail(format!("{actual} equals {expected}"))
            } else {
                OpOutcome::pass()
            }
        }
        Operator::IsGt | Operator::IsGte | Operator::IsLt | Operator::IsLte => {
            ordering(operator, actual, expected)
        }
        Operator::InRange => in_range(actual, expected),
        Operator::IsIn => membership(actual, expected, true),
        Operator::NotIn => membership(actual, expected, false),
        Operator::Exists | Operator::NotExists | Operator::ListNotEmpty | Operator::NoDiff => {
            // Load-time arity validation keeps these out of the value path.
            OpOutcome::fail(format!("operator `{operator}` does not take `value`"))
        }
    }
}

fn ordering(operator: Operator, actual: &Value, expected: &Value) -> OpOutcome {
    let Some(actual_num) = as_number(actual) else {
        return OpOutcome::fail(format!("type mismatch: {actual} is not numeric"));
    };
    let Some(expected_num) = as_number(expected) else {
        return OpOutcome::fail(format!(
            "type mismatch: expected value {expected} is not numeric"
        ));
    };
    let holds = match operator {
        Operator::IsGt => actual_num > expected_num,
        Operator::IsGte => actual_num >= expected_num,
        Operator::IsLt => actual_num < expected_num,
        Operator::IsLte => actual_num <= expected_num,
        _ => false,
    };
    if holds {
        OpOutcome::pass()
    } else {
        OpOutcome::fail(format!(
            "{actual_num} {} {expected_num} does not hold",
            operator.as_str()
        ))
    }
}

fn in_range(actual: &Value, expected: &Value) -> OpOutcome {
    let Some(actual_num) = as_number(actual) else {
        return OpOutcome::fail(format!("type mismatch: {actual} is not numeric"));
    };
    let bounds = expected.as_array().map(Vec::as_slice).unwrap_or_default();
    let (Some(min), Some(max)) = (
        bounds.first().and_then(as_number),
        bounds.get(1).and_then(as_number),
    ) else {
        return OpOutcome::fail("type mismatch: range bounds are not numeric");
    };
    if actual_num >= min && actual_num <= max {
        OpOutcome::pass()
    } else {
        OpOutcome::fail(format!("{actual_num} is outside [{min}, {max}]"))
    }
}

fn membership(actual: &Value, expected: &Value, want_member: bool) -> OpOutcome {
    let Some(set) = expected.as_array() else {
        return OpOutcome::fail("expected value must be a list");
    };
    let found = set.iter().any(|candidate| loose_eq(actual, candidate));
    match (found, want_member) {
        (true, true) | (false, false) => OpOutcome::pass(),
        (false, true) => OpOutcome::fail(format!("{actual} is not in {expected}")),
        (true, false) => OpOutcome::fail(format!("{actual} is in {expected}")),
    }
}

/// `list-not-empty`: the resolved value must be a list with at least one
/// element.
pub fn list_not_empty(actual: &Value) -> OpOutcome {
    match actual {
        Value::Array(items) if !items.is_empty() => OpOutcome::pass(),
        Value::Array(_) => OpOutcome::fail("list is empty"),
        other => OpOutcome::fail(format!("type mismatch: {other} is not a list")),
    }
}

/// `no-diff`: structural equality between the pre and post values.
pub fn no_diff(pre: &Value, post: &Value) -> OpOutcome {
    if pre == post {
        OpOutcome::pass()
    } else {
        OpOutcome::fail(format!("value changed from {pre} to {post}"))
    }
}
