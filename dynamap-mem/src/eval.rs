//! Parser and evaluator for the expression grammar the builders emit:
//! conjunctions of `#name <op> :value` comparisons, `BETWEEN`,
//! `begins_with(...)`, and `SET` clauses. Placeholders are resolved against
//! the request's name alias and value binding tables.

use dynamap::{AttributeValue, Item, StoreError};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Comparison {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Between,
    BeginsWith,
}

/// One resolved predicate: attribute name plus bound value(s).
#[derive(Debug, Clone)]
pub(crate) struct Predicate {
    pub attribute: String,
    pub comparison: Comparison,
    pub values: Vec<AttributeValue>,
}

pub(crate) struct Bindings<'a> {
    pub names: &'a HashMap<String, String>,
    pub values: &'a HashMap<String, AttributeValue>,
}

impl Bindings<'_> {
    fn resolve_name(&self, token: &str) -> Result<String, StoreError> {
        if token.starts_with('#') {
            self.names
                .get(token)
                .cloned()
                .ok_or_else(|| StoreError::InvalidRequest(format!("unbound name {token}")))
        } else {
            Ok(token.to_string())
        }
    }

    fn resolve_value(&self, token: &str) -> Result<AttributeValue, StoreError> {
        self.values
            .get(token)
            .cloned()
            .ok_or_else(|| StoreError::InvalidRequest(format!("unbound value {token}")))
    }
}

/// Parse a conjunctive condition expression into predicates. An empty
/// expression parses to no predicates, which every item satisfies.
pub(crate) fn parse_condition(
    expression: &str,
    bindings: &Bindings<'_>,
) -> Result<Vec<Predicate>, StoreError> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Ok(Vec::new());
    }

    let mut predicates = Vec::new();
    for part in split_conjunction(expression)? {
        predicates.push(parse_comparison(&part, bindings)?);
    }
    Ok(predicates)
}

/// Split on top-level ` AND `, keeping the `BETWEEN x AND y` operand glued to
/// its predicate.
fn split_conjunction(expression: &str) -> Result<Vec<String>, StoreError> {
    let raw: Vec<&str> = expression.split(" AND ").collect();
    let mut parts = Vec::new();
    let mut index = 0;
    while index < raw.len() {
        let part = raw[index];
        if part.contains(" BETWEEN ") {
            let upper = raw.get(index + 1).ok_or_else(|| {
                StoreError::InvalidRequest(format!("dangling BETWEEN in: {expression}"))
            })?;
            parts.push(format!("{part} AND {upper}"));
            index += 2;
        } else {
            parts.push(part.to_string());
            index += 1;
        }
    }
    Ok(parts)
}

fn parse_comparison(part: &str, bindings: &Bindings<'_>) -> Result<Predicate, StoreError> {
    let part = part.trim();

    if let Some(inner) = part
        .strip_prefix("begins_with(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let (name, value) = inner.split_once(',').ok_or_else(|| {
            StoreError::InvalidRequest(format!("malformed begins_with: {part}"))
        })?;
        return Ok(Predicate {
            attribute: bindings.resolve_name(name.trim())?,
            comparison: Comparison::BeginsWith,
            values: vec![bindings.resolve_value(value.trim())?],
        });
    }

    if let Some((name, bounds)) = part.split_once(" BETWEEN ") {
        let (low, high) = bounds.split_once(" AND ").ok_or_else(|| {
            StoreError::InvalidRequest(format!("malformed BETWEEN: {part}"))
        })?;
        return Ok(Predicate {
            attribute: bindings.resolve_name(name.trim())?,
            comparison: Comparison::Between,
            values: vec![
                bindings.resolve_value(low.trim())?,
                bindings.resolve_value(high.trim())?,
            ],
        });
    }

    // Longest operator first so `<=` is not read as `<`.
    for (token, comparison) in [
        ("<=", Comparison::Le),
        (">=", Comparison::Ge),
        ("=", Comparison::Eq),
        ("<", Comparison::Lt),
        (">", Comparison::Gt),
    ] {
        if let Some((name, value)) = part.split_once(token) {
            return Ok(Predicate {
                attribute: bindings.resolve_name(name.trim())?,
                comparison,
                values: vec![bindings.resolve_value(value.trim())?],
            });
        }
    }

    Err(StoreError::InvalidRequest(format!(
        "unparseable condition: {part}"
    )))
}

/// Parse a `SET #alias = :value, ...` update expression into resolved
/// assignments, in clause order.
pub(crate) fn parse_set_clause(
    expression: &str,
    bindings: &Bindings<'_>,
) -> Result<Vec<(String, AttributeValue)>, StoreError> {
    let body = expression.trim().strip_prefix("SET ").ok_or_else(|| {
        StoreError::InvalidRequest(format!("expected SET clause, got: {expression}"))
    })?;

    let mut assignments = Vec::new();
    for part in body.split(',') {
        let (name, value) = part.split_once('=').ok_or_else(|| {
            StoreError::InvalidRequest(format!("malformed SET action: {part}"))
        })?;
        assignments.push((
            bindings.resolve_name(name.trim())?,
            bindings.resolve_value(value.trim())?,
        ));
    }
    Ok(assignments)
}

/// Whether `item` satisfies every predicate.
pub(crate) fn evaluate(predicates: &[Predicate], item: &Item) -> bool {
    predicates.iter().all(|predicate| {
        let Some(actual) = item.get(&predicate.attribute) else {
            return false;
        };
        match predicate.comparison {
            Comparison::Eq => compare(actual, &predicate.values[0]) == Some(Ordering::Equal),
            Comparison::Lt => compare(actual, &predicate.values[0]) == Some(Ordering::Less),
            Comparison::Le => matches!(
                compare(actual, &predicate.values[0]),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Comparison::Gt => compare(actual, &predicate.values[0]) == Some(Ordering::Greater),
            Comparison::Ge => matches!(
                compare(actual, &predicate.values[0]),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Comparison::Between => {
                matches!(
                    compare(actual, &predicate.values[0]),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(
                    compare(actual, &predicate.values[1]),
                    Some(Ordering::Less | Ordering::Equal)
                )
            }
            Comparison::BeginsWith => match (actual, &predicate.values[0]) {
                (AttributeValue::S(s), AttributeValue::S(prefix)) => s.starts_with(prefix),
                _ => false,
            },
        }
    })
}

/// Ordering between two native values of the same tag. Numbers compare
/// numerically; the float detour is fine here because this is ordering only,
/// the stored value is never rewritten through it.
pub(crate) fn compare(a: &AttributeValue, b: &AttributeValue) -> Option<Ordering> {
    match (a, b) {
        (AttributeValue::S(s1), AttributeValue::S(s2)) => Some(s1.cmp(s2)),
        (AttributeValue::N(n1), AttributeValue::N(n2)) => {
            let n1: f64 = n1.parse().ok()?;
            let n2: f64 = n2.parse().ok()?;
            n1.partial_cmp(&n2)
        }
        (AttributeValue::B(b1), AttributeValue::B(b2)) => Some(b1.cmp(b2)),
        (AttributeValue::Bool(b1), AttributeValue::Bool(b2)) => Some(b1.cmp(b2)),
        _ => None,
    }
}
