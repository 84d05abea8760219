//! Store query model and its in-process evaluation.
//!
//! The model is deliberately narrow: equality and `>=` range predicates plus
//! one ordering, which is what hosted document stores reliably support.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RawDocument;

/// Sort direction for [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// Single-field ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }
}

/// Store-side predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Predicate {
    #[serde(rename = "==")]
    Eq { field: String, value: Value },
    #[serde(rename = ">=")]
    Gte { field: String, value: Value },
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gte {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Eq { field, .. } | Self::Gte { field, .. } => field,
        }
    }

    /// Evaluates the predicate the way a document store does: a missing field
    /// or a type mismatch never matches.
    pub fn matches(&self, doc: &RawDocument) -> bool {
        match self {
            Self::Eq { field, value } => doc.get(field) == Some(value),
            Self::Gte { field, value } => doc
                .get(field)
                .and_then(|actual| compare_values(actual, value))
                .is_some_and(|ordering| ordering != Ordering::Less),
        }
    }
}

/// Query against one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreQuery {
    pub collection: String,
    #[serde(rename = "where", default)]
    pub predicates: Vec<Predicate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl StoreQuery {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            predicates: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, doc: &RawDocument) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(doc))
    }

    /// Filters, orders and truncates a set of documents in memory.
    pub fn apply<'a, I>(&self, docs: I) -> Vec<RawDocument>
    where
        I: IntoIterator<Item = &'a RawDocument>,
    {
        let mut selected: Vec<RawDocument> = docs
            .into_iter()
            .filter(|doc| self.matches(doc))
            .cloned()
            .collect();

        if let Some(order) = &self.order_by {
            selected.sort_by(|left, right| {
                let ordering = compare_for_sort(left.get(&order.field), right.get(&order.field));
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

/// Compares two JSON scalars of the same kind. Strings compare lexically,
/// numbers numerically; anything else is incomparable.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

// Documents missing the order field rank below every present value; present
// values order by type first (null, bool, number, string, array, object).
fn compare_for_sort(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => type_rank(a)
            .cmp(&type_rank(b))
            .then_with(|| compare_values(a, b).unwrap_or(Ordering::Equal)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
