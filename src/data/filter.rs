use std::collections::BTreeSet;

use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// Hour range
// ---------------------------------------------------------------------------

/// Inclusive hour-bucket range with `lo <= hi <= 23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourRange {
    lo: u8,
    hi: u8,
}

impl HourRange {
    pub const FULL: HourRange = HourRange { lo: 0, hi: 23 };

    /// `None` when the bounds are inverted or past 23.
    pub fn new(lo: u8, hi: u8) -> Option<Self> {
        (lo <= hi && hi <= 23).then_some(HourRange { lo, hi })
    }

    pub fn lo(&self) -> u8 {
        self.lo
    }

    pub fn hi(&self) -> u8 {
        self.hi
    }

    pub fn contains(&self, hour: u8) -> bool {
        self.lo <= hour && hour <= self.hi
    }
}

// ---------------------------------------------------------------------------
// Filter predicate
// ---------------------------------------------------------------------------

/// Which categorical dimension a selection applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    City,
    Gender,
    CustomerType,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::City, Dimension::Gender, Dimension::CustomerType];

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::City => "City",
            Dimension::Gender => "Gender",
            Dimension::CustomerType => "Customer Type",
        }
    }

    /// The record's value for this dimension.
    pub fn value<'r>(&self, record: &'r Record) -> Option<&'r str> {
        match self {
            Dimension::City => record.city.as_deref(),
            Dimension::Gender => record.gender.as_deref(),
            Dimension::CustomerType => record.customer_type.as_deref(),
        }
    }

    /// Every value the dataset offers for this dimension, first-seen order.
    pub fn options<'d>(&self, dataset: &'d Dataset) -> &'d [String] {
        match self {
            Dimension::City => &dataset.cities,
            Dimension::Gender => &dataset.genders,
            Dimension::CustomerType => &dataset.customer_types,
        }
    }
}

/// The user's inclusion predicates.
///
/// An empty set selects nothing for its dimension; "everything" is the full
/// option list, see [`FilterSpec::select_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub cities: BTreeSet<String>,
    pub genders: BTreeSet<String>,
    pub customer_types: BTreeSet<String>,
    pub hours: HourRange,
}

impl FilterSpec {
    /// Initialise with every option selected and the dataset's full hour
    /// span (i.e., show everything).
    pub fn select_all(dataset: &Dataset) -> Self {
        let collect = |values: &[String]| values.iter().cloned().collect::<BTreeSet<_>>();
        let hours = dataset
            .hour_bounds
            .and_then(|(lo, hi)| HourRange::new(lo, hi))
            .unwrap_or(HourRange::FULL);
        FilterSpec {
            cities: collect(&dataset.cities),
            genders: collect(&dataset.genders),
            customer_types: collect(&dataset.customer_types),
            hours,
        }
    }

    pub fn selected(&self, dim: Dimension) -> &BTreeSet<String> {
        match dim {
            Dimension::City => &self.cities,
            Dimension::Gender => &self.genders,
            Dimension::CustomerType => &self.customer_types,
        }
    }

    fn selected_mut(&mut self, dim: Dimension) -> &mut BTreeSet<String> {
        match dim {
            Dimension::City => &mut self.cities,
            Dimension::Gender => &mut self.genders,
            Dimension::CustomerType => &mut self.customer_types,
        }
    }

    /// Toggle a single value in a dimension's selection.
    pub fn toggle(&mut self, dim: Dimension, value: &str) {
        let selected = self.selected_mut(dim);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
    }

    /// Select every option the dataset offers for `dim`.
    pub fn select_every(&mut self, dim: Dimension, dataset: &Dataset) {
        *self.selected_mut(dim) = dim.options(dataset).iter().cloned().collect();
    }

    /// Deselect all values of `dim`.
    pub fn select_none(&mut self, dim: Dimension) {
        self.selected_mut(dim).clear();
    }

    /// A record passes when every dimension's value is selected (a null value
    /// never is) and its hour lies in range.
    pub fn matches(&self, record: &Record) -> bool {
        Dimension::ALL.iter().all(|dim| {
            dim.value(record)
                .is_some_and(|v| self.selected(*dim).contains(v))
        }) && self.hours.contains(record.hour)
    }
}

// ---------------------------------------------------------------------------
// Selection – filtered view
// ---------------------------------------------------------------------------

/// An order-preserving subset of a [`Dataset`], held as row indices.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> Selection<'a> {
    /// Every record of the dataset.
    pub fn all(dataset: &'a Dataset) -> Self {
        Selection {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    /// Row indices into the source dataset, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = self.dataset.records();
        self.indices.iter().map(move |&i| &records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Drop records with any null field. This is the step between filtering
    /// and charting: filtering sees every record, charts only complete ones.
    pub fn drop_incomplete(&self) -> Selection<'a> {
        let records = self.dataset.records();
        Selection {
            dataset: self.dataset,
            indices: self
                .indices
                .iter()
                .copied()
                .filter(|&i| records[i].is_complete())
                .collect(),
        }
    }
}

/// Return the records that pass `spec`, in dataset order.
pub fn apply<'a>(dataset: &'a Dataset, spec: &FilterSpec) -> Selection<'a> {
    let indices: Vec<usize> = dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| spec.matches(r))
        .map(|(i, _)| i)
        .collect();
    log::debug!("Filter kept {} of {} records", indices.len(), dataset.len());
    Selection { dataset, indices }
}
