//! Collection queries: order by child, equality filter, limit-to-last.
//!
//! Ordering follows the realtime-database rules so results match what a
//! hosted store would return:
//!
//! - With `order_by`, children sort by the named field: missing/null first,
//!   then `false`, `true`, numbers ascending, strings lexicographically,
//!   objects last. Ties fall back to key order.
//! - Without `order_by`, children sort by key. Keys that parse as 32-bit
//!   integers come first in numeric order, the rest lexicographically.
//!   Push keys are time-prefixed, so key order is creation order.
//! - `equal_to` only applies together with `order_by`.
//! - `limit` keeps the *last* N children under the ordering. A limit of 0
//!   means no limit.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// A child node returned by a collection read.
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub key: String,
    pub value: Value,
}

impl Child {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.value.get(name)
    }
}

/// Options for `list` and `subscribe`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Query {
    pub order_by: Option<String>,
    pub equal_to: Option<Value>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn equal_to(mut self, value: impl Into<Value>) -> Self {
        self.equal_to = Some(value.into());
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Whether the caller asked for a store-side ordering.
    pub fn is_ordered(&self) -> bool {
        self.order_by.is_some()
    }

    /// Filter, order and limit a set of children.
    pub fn apply(&self, mut children: Vec<Child>) -> Vec<Child> {
        match &self.order_by {
            Some(field) => {
                if let Some(target) = &self.equal_to {
                    children.retain(|c| {
                        compare_values(c.field(field), Some(target)) == Ordering::Equal
                    });
                }
                children.sort_by(|a, b| {
                    compare_values(a.field(field), b.field(field))
                        .then_with(|| compare_keys(&a.key, &b.key))
                });
            }
            None => children.sort_by(|a, b| compare_keys(&a.key, &b.key)),
        }

        if let Some(n) = self.limit
            && n > 0
            && children.len() > n
        {
            children.drain(..children.len() - n);
        }
        children
    }
}

/// Rank of a value's type in child ordering.
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(false)) => 1,
        Some(Value::Bool(true)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) | Some(Value::Object(_)) => 5,
    }
}

/// Compare two child values under realtime-database ordering.
///
/// Objects compare equal to each other; the key tiebreak orders them.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    type_rank(a).cmp(&type_rank(b)).then_with(|| match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    })
}

/// Compare two keys: 32-bit integer keys first (numerically), then strings.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i32>(), b.parse::<i32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(children: &[Child]) -> Vec<&str> {
        children.iter().map(|c| c.key.as_str()).collect()
    }

    fn sample() -> Vec<Child> {
        vec![
            Child::new("c", json!({"tipo": "prova", "n": 3})),
            Child::new("a", json!({"tipo": "festa", "n": 10})),
            Child::new("d", json!({"n": "texto"})),
            Child::new("b", json!({"tipo": "prova", "n": 1})),
        ]
    }

    #[test]
    fn default_orders_by_key() {
        let out = Query::new().apply(sample());
        assert_eq!(keys(&out), ["a", "b", "c", "d"]);
    }

    #[test]
    fn integer_keys_sort_numerically_before_strings() {
        let children = vec![
            Child::new("10", json!(1)),
            Child::new("b", json!(1)),
            Child::new("9", json!(1)),
            Child::new("-1", json!(1)),
        ];
        let out = Query::new().apply(children);
        assert_eq!(keys(&out), ["-1", "9", "10", "b"]);
    }

    #[test]
    fn order_by_child_ranks_types() {
        let out = Query::new().order_by("n").apply(sample());
        // numbers ascending, then strings
        assert_eq!(keys(&out), ["b", "c", "a", "d"]);
    }

    #[test]
    fn missing_field_sorts_first() {
        let out = Query::new().order_by("tipo").apply(sample());
        assert_eq!(keys(&out), ["d", "a", "b", "c"]);
    }

    #[test]
    fn equal_to_filters_with_order_by() {
        let out = Query::new().order_by("tipo").equal_to("prova").apply(sample());
        assert_eq!(keys(&out), ["b", "c"]);
    }

    #[test]
    fn equal_to_ignored_without_order_by() {
        let q = Query {
            equal_to: Some(json!("prova")),
            ..Query::default()
        };
        assert_eq!(q.apply(sample()).len(), 4);
    }

    #[test]
    fn equal_to_numbers_ignore_representation() {
        let children = vec![Child::new("x", json!({"n": 1.0})), Child::new("y", json!({"n": 2}))];
        let out = Query::new().order_by("n").equal_to(1).apply(children);
        assert_eq!(keys(&out), ["x"]);
    }

    #[test]
    fn limit_keeps_last_entries() {
        let out = Query::new().limit(2).apply(sample());
        assert_eq!(keys(&out), ["c", "d"]);

        let out = Query::new().order_by("n").limit(2).apply(sample());
        assert_eq!(keys(&out), ["a", "d"]);
    }

    #[test]
    fn limit_larger_than_set_keeps_everything() {
        assert_eq!(Query::new().limit(50).apply(sample()).len(), 4);
    }

    #[test]
    fn limit_zero_means_no_limit() {
        assert_eq!(Query::new().limit(0).apply(sample()).len(), 4);
    }

    #[test]
    fn booleans_order_false_then_true() {
        assert_eq!(
            compare_values(Some(&json!(false)), Some(&json!(true))),
            Ordering::Less
        );
        assert_eq!(compare_values(None, Some(&json!(false))), Ordering::Less);
        assert_eq!(
            compare_values(Some(&json!(true)), Some(&json!(0))),
            Ordering::Less
        );
    }

    #[test]
    fn query_deserializes_camel_case() {
        let q: Query = serde_json::from_value(json!({"orderBy": "tipo", "limit": 3})).unwrap();
        assert_eq!(q, Query::new().order_by("tipo").limit(3));
    }
}
