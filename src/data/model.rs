use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Column names as they appear in the header row
// ---------------------------------------------------------------------------

pub const COL_CITY: &str = "City";
pub const COL_GENDER: &str = "Gender";
pub const COL_CUSTOMER_TYPE: &str = "Customer_type";
pub const COL_PRODUCT_LINE: &str = "Product line";
pub const COL_PAYMENT: &str = "Payment";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_TOTAL: &str = "Total";
pub const COL_RATING: &str = "Rating";
pub const COL_TIME: &str = "Time";

/// Every column the loader insists on, in header order.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    COL_CITY,
    COL_GENDER,
    COL_CUSTOMER_TYPE,
    COL_PRODUCT_LINE,
    COL_PAYMENT,
    COL_QUANTITY,
    COL_TOTAL,
    COL_RATING,
    COL_TIME,
];

// ---------------------------------------------------------------------------
// GroupKey – a single grouping value
// ---------------------------------------------------------------------------

/// Key of one aggregation bucket.
/// Used in `BTreeMap`s downstream so `GroupKey` must be `Ord`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Text(String),
    Integer(i64),
    Decimal(f64),
}

// -- Manual Eq/Ord so decimals (ratings) can key a BTreeMap --

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use GroupKey::*;
        fn discriminant(k: &GroupKey) -> u8 {
            match k {
                Integer(_) => 0,
                Decimal(_) => 1,
                Text(_) => 2,
            }
        }
        match (self, other) {
            (Integer(a), Integer(b)) => a.cmp(b),
            (Decimal(a), Decimal(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for GroupKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            GroupKey::Text(s) => s.hash(state),
            GroupKey::Integer(i) => i.hash(state),
            GroupKey::Decimal(f) => f.to_bits().hash(state),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Text(s) => write!(f, "{s}"),
            GroupKey::Integer(i) => write!(f, "{i}"),
            GroupKey::Decimal(v) => write!(f, "{v}"),
        }
    }
}

impl GroupKey {
    /// Numeric position for plotting on a continuous axis.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GroupKey::Decimal(v) => Some(*v),
            GroupKey::Integer(i) => Some(*i as f64),
            GroupKey::Text(_) => None,
        }
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        GroupKey::Text(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Record – one transaction
// ---------------------------------------------------------------------------

/// A single transaction (one row of the sheet).
///
/// `None` marks an empty cell. The time of day is never empty: the loader
/// rejects rows without one, so `hour` is always valid.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub city: Option<String>,
    pub gender: Option<String>,
    pub customer_type: Option<String>,
    pub product_line: Option<String>,
    pub payment: Option<String>,
    pub quantity: Option<i64>,
    pub total: Option<f64>,
    pub rating: Option<f64>,
    pub time: NaiveTime,
    /// Hour bucket 0–23 derived from `time`.
    pub hour: u8,
}

impl Record {
    /// Build a record, deriving the hour bucket from `time`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        city: Option<String>,
        gender: Option<String>,
        customer_type: Option<String>,
        product_line: Option<String>,
        payment: Option<String>,
        quantity: Option<i64>,
        total: Option<f64>,
        rating: Option<f64>,
        time: NaiveTime,
    ) -> Self {
        Record {
            city,
            gender,
            customer_type,
            product_line,
            payment,
            quantity,
            total,
            rating,
            hour: time.hour() as u8,
            time,
        }
    }

    /// True when no field is null; only complete records feed the charts.
    pub fn is_complete(&self) -> bool {
        self.city.is_some()
            && self.gender.is_some()
            && self.customer_type.is_some()
            && self.product_line.is_some()
            && self.payment.is_some()
            && self.quantity.is_some()
            && self.total.is_some()
            && self.rating.is_some()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The loaded transactions plus the option lists the selectors offer.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    /// Distinct non-null cities in first-seen order.
    pub cities: Vec<String>,
    pub genders: Vec<String>,
    pub customer_types: Vec<String>,
    /// Smallest and largest hour bucket present, `None` when empty.
    pub hour_bounds: Option<(u8, u8)>,
}

impl Dataset {
    /// Build option indices from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut cities = Vec::new();
        let mut genders = Vec::new();
        let mut customer_types = Vec::new();
        let mut hour_bounds: Option<(u8, u8)> = None;

        for r in &records {
            push_distinct(&mut cities, r.city.as_deref());
            push_distinct(&mut genders, r.gender.as_deref());
            push_distinct(&mut customer_types, r.customer_type.as_deref());
            hour_bounds = Some(match hour_bounds {
                Some((lo, hi)) => (lo.min(r.hour), hi.max(r.hour)),
                None => (r.hour, r.hour),
            });
        }

        Dataset {
            records,
            cities,
            genders,
            customer_types,
            hour_bounds,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn push_distinct(values: &mut Vec<String>, value: Option<&str>) {
    if let Some(v) = value {
        if !values.iter().any(|existing| existing == v) {
            values.push(v.to_string());
        }
    }
}
