use std::collections::BTreeMap;

use serde::Serialize;

use super::filter::Selection;
use super::model::{GroupKey, Record};

/// Dimension used to bucket records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupBy {
    Payment,
    ProductLine,
    Hour,
    Rating,
}

impl GroupBy {
    pub fn key(&self, record: &Record) -> Option<GroupKey> {
        match self {
            GroupBy::Payment => record.payment.as_deref().map(GroupKey::from),
            GroupBy::ProductLine => record.product_line.as_deref().map(GroupKey::from),
            GroupBy::Hour => Some(GroupKey::Integer(record.hour as i64)),
            GroupBy::Rating => record.rating.map(GroupKey::Decimal),
        }
    }
}

/// Numeric column being summarised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueField {
    Total,
    Quantity,
    Rating,
}

impl ValueField {
    pub fn value(&self, record: &Record) -> Option<f64> {
        match self {
            ValueField::Total => record.total,
            ValueField::Quantity => record.quantity.map(|q| q as f64),
            ValueField::Rating => record.rating,
        }
    }
}

/// Order in which a result's entries are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending key: alphabetical for text, numeric for hours and ratings.
    ByKey,
    ByValueAscending,
}

/// One value per distinct group key present in the input.
///
/// Sparse: keys absent from the input get no entry. Entries come out of
/// [`group_sum`] / [`group_count`] in ascending key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub group_by: GroupBy,
    pub value_field: ValueField,
    pub entries: Vec<(GroupKey, f64)>,
}

impl AggregationResult {
    fn from_map(group_by: GroupBy, value_field: ValueField, map: BTreeMap<GroupKey, f64>) -> Self {
        AggregationResult {
            group_by,
            value_field,
            entries: map.into_iter().collect(),
        }
    }

    pub fn sorted(mut self, order: SortOrder) -> Self {
        match order {
            SortOrder::ByKey => self.entries.sort_by(|a, b| a.0.cmp(&b.0)),
            SortOrder::ByValueAscending => self.entries.sort_by(|a, b| a.1.total_cmp(&b.1)),
        }
        self
    }

    #[cfg(test)]
    pub(crate) fn get(&self, key: &GroupKey) -> Option<f64> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    /// Sum over all groups.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sum `value_field` per `group_by` key. Records where either side is null
/// are skipped.
pub fn group_sum(
    selection: &Selection<'_>,
    group_by: GroupBy,
    value_field: ValueField,
) -> AggregationResult {
    let mut map: BTreeMap<GroupKey, f64> = BTreeMap::new();
    for r in selection.records() {
        if let (Some(key), Some(v)) = (group_by.key(r), value_field.value(r)) {
            *map.entry(key).or_insert(0.0) += v;
        }
    }
    AggregationResult::from_map(group_by, value_field, map)
}

/// Count non-null `value_field` entries per `group_by` key.
pub fn group_count(
    selection: &Selection<'_>,
    group_by: GroupBy,
    value_field: ValueField,
) -> AggregationResult {
    let mut map: BTreeMap<GroupKey, f64> = BTreeMap::new();
    for r in selection.records() {
        if let (Some(key), Some(_)) = (group_by.key(r), value_field.value(r)) {
            *map.entry(key).or_insert(0.0) += 1.0;
        }
    }
    AggregationResult::from_map(group_by, value_field, map)
}

/// Mean of the non-null values; `NaN` when there are none.
pub fn group_mean(selection: &Selection<'_>, value_field: ValueField) -> f64 {
    let (sum, n) = selection
        .records()
        .filter_map(|r| value_field.value(r))
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// Plain sum of the non-null values; `0.0` when there are none.
pub fn total(selection: &Selection<'_>, value_field: ValueField) -> f64 {
    selection.records().filter_map(|r| value_field.value(r)).sum()
}

/// Number of non-null values.
pub fn count(selection: &Selection<'_>, value_field: ValueField) -> usize {
    selection.records().filter_map(|r| value_field.value(r)).count()
}
