use std::cmp::Ordering;

use icu_collator::{Collator, CollatorOptions, Strength};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::state::data_model::{self, Record};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortOrder {
    pub fn is_ascending(self) -> bool {
        matches!(self, SortOrder::Ascending)
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub order: SortOrder,
}

/// What a pull source is asked for on every refresh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pub search_term: String,
    pub sort: Option<SortSpec>,
}

impl Query {
    pub fn sort_key(&self) -> Option<&str> {
        self.sort.as_ref().map(|spec| spec.column.as_str())
    }

    pub fn is_ascending(&self) -> bool {
        self.sort
            .as_ref()
            .map(|spec| spec.order.is_ascending())
            .unwrap_or(true)
    }
}

/// Keeps records whose `search_key` value starts with `term`, ignoring case.
/// Null, absent and empty-string values never match. Without a search key
/// every record is kept.
pub fn filter_records<R: Record>(records: &[R], search_key: Option<&str>, term: &str) -> Vec<R> {
    let Some(search_key) = search_key else {
        return records.to_vec();
    };

    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|record| matches_prefix(record.field(search_key), &needle))
        .cloned()
        .collect()
}

fn matches_prefix(value: Option<&Value>, lowercase_needle: &str) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) if text.is_empty() => false,
        Some(value) => data_model::display_value(value)
            .to_lowercase()
            .starts_with(lowercase_needle),
    }
}

/// Stable sort on `sort_key`. Descending is the reversed ascending order, so
/// records with equal keys come out in reverse input order.
pub fn sort_records<R: Record>(records: &mut [R], sort_key: &str, order: SortOrder) {
    records.sort_by(|a, b| compare_values(a.field(sort_key), b.field(sort_key)));
    if !order.is_ascending() {
        records.reverse();
    }
}

pub fn filter_and_sort<R: Record>(records: &[R], search_key: Option<&str>, query: &Query) -> Vec<R> {
    let mut rows = filter_records(records, search_key, &query.search_term);
    if let Some(spec) = query.sort.as_ref() {
        sort_records(&mut rows, &spec.column, spec.order);
    }
    rows
}

/// Absent values order after every present one.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(left), Some(right)) => compare_present(left, right),
    }
}

fn compare_present(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::String(a), Value::String(b)) => compare_text(a, b),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        _ => type_rank(left).cmp(&type_rank(right)).then_with(|| {
            data_model::display_value(left).cmp(&data_model::display_value(right))
        }),
    }
}

thread_local! {
    static COLLATOR: Option<Collator> = root_collator();
}

fn root_collator() -> Option<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Secondary);
    match Collator::try_new(&Default::default(), options) {
        Ok(collator) => Some(collator),
        Err(err) => {
            log::error!("root collator unavailable, falling back to code points: {err}");
            None
        }
    }
}

/// Locale-aware comparison with the root collation at secondary strength:
/// accents count, case does not. Spellings that only differ in case stay
/// equal so the stable sort keeps their input order.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => a
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase)),
    })
}

fn compare_numbers(left: &Number, right: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (left.as_u64(), right.as_u64()) {
        return a.cmp(&b);
    }
    // One side is a negative i64 and the other a u64 above i64::MAX.
    if left.as_i64().is_some() && right.as_u64().is_some() {
        return Ordering::Less;
    }
    if left.as_u64().is_some() && right.as_i64().is_some() {
        return Ordering::Greater;
    }

    let a = left.as_f64().unwrap_or(f64::NAN);
    let b = right.as_f64().unwrap_or(f64::NAN);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
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
