//! Single-column sort state and cell comparison.

use std::cmp::Ordering;

use rbac_model::display_value;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Direction of an active sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// The active sort: one column, one direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortState {
    pub column: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// Header arrow to draw for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIndicator {
    /// Column is not the sorted one.
    Both,
    Asc,
    Desc,
}

/// Compare two cell values for sorting in `direction`.
///
/// Absent and null values sort after every real value in both directions;
/// only the ordering between real values is flipped by `Desc`. Numbers
/// compare numerically, strings lexicographically, booleans `false < true`,
/// and values of different kinds by their display text.
pub fn compare_cells(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    let natural = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(a), Some(b)) => natural_order(a, b),
    };

    match direction {
        SortDirection::Asc => natural,
        SortDirection::Desc => natural.reverse(),
    }
}

fn natural_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => display_value(Some(a)).cmp(&display_value(Some(b))),
    }
}
