use serde_json::Value;
use std::cmp::Ordering;

/// Fields consulted by the client-side fallback filter, in match order.
const FILTER_FIELDS: &[&str] = &[
    "name",
    "title",
    "description",
    "shortDescription",
    "category",
    "slug",
    "id",
    "serviceType",
    "city",
    "country",
    "tags",
];

/// Client-side shaping applied to every list command, in fixed order:
/// sort, then head. Counting happens at render time from the shaped rows.
#[derive(Debug, Default, Clone)]
pub struct Shape {
    pub sort: Option<String>,
    pub head: Option<usize>,
    pub count: bool,
}

impl Shape {
    pub fn apply(&self, mut items: Vec<Value>) -> Vec<Value> {
        if let Some(spec) = &self.sort {
            sort_items(&mut items, spec);
        }
        if let Some(n) = self.head {
            items.truncate(n);
        }
        items
    }
}

/// Sort rows by a field spec. A leading `-` flips to descending. The whole
/// call uses a single comparison regime: the `price` field compares as f64
/// (numbers or numeric strings), every other field as case-insensitive text.
/// Rows without a usable value sort last in either direction, and ties keep
/// their input order.
pub fn sort_items(items: &mut [Value], spec: &str) {
    let (field, descending) = match spec.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (spec, false),
    };
    if field == "price" {
        sort_by_key(items, descending, |item| item.get(field).and_then(numeric));
    } else {
        sort_by_key(items, descending, |item| {
            item.get(field)
                .filter(|v| !v.is_null())
                .map(|v| field_text(v).to_lowercase())
        });
    }
}

fn sort_by_key<K, F>(items: &mut [Value], descending: bool, key: F)
where
    K: PartialOrd,
    F: Fn(&Value) -> Option<K>,
{
    items.sort_by(|a, b| match (key(a), key(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ordering = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
    });
}

/// Keep only rows where any filterable field contains the query,
/// case-insensitively.
pub fn filter_items(items: Vec<Value>, query: &str) -> Vec<Value> {
    items
        .into_iter()
        .filter(|item| matches_query(item, query))
        .collect()
}

pub fn matches_query(item: &Value, query: &str) -> bool {
    let needle = query.to_lowercase();
    FILTER_FIELDS.iter().any(|field| {
        item.get(field)
            .map(|value| field_text(value).to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}

/// Numbers and numeric strings both participate in numeric ordering, since
/// the server is inconsistent about whether prices arrive quoted.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // "nan" parses as f64 but cannot be ordered.
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
        _ => None,
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(field_text)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}
