use serde::Serialize;

use crate::data::aggregate::{
    AggregationResult, GroupBy, SortOrder, ValueField, count, group_count, group_mean, group_sum,
    total,
};
use crate::data::filter::{FilterSpec, Selection, apply};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    /// Sum of `Total`, truncated to whole currency units.
    pub total_sales: i64,
    /// Mean rating rounded half-to-even to one decimal; `None` when nothing has
    /// a rating.
    pub average_rating: Option<f64>,
    /// `average_rating` rounded half-to-even; 0 without data.
    pub stars: usize,
    /// Sales that carry a rating, i.e. the rows behind `average_rating`.
    pub rated_sales: usize,
}

impl Kpis {
    pub fn compute(selection: &Selection<'_>) -> Self {
        let total_sales = total(selection, ValueField::Total).trunc() as i64;
        let mean = group_mean(selection, ValueField::Rating);
        let average_rating = (!mean.is_nan()).then(|| (mean * 10.0).round_ties_even() / 10.0);
        let stars = average_rating.map_or(0, |r| r.round_ties_even().max(0.0) as usize);
        Kpis {
            total_sales,
            average_rating,
            stars,
            rated_sales: count(selection, ValueField::Rating),
        }
    }

    pub fn total_sales_label(&self) -> String {
        format!("US $ {}", thousands(self.total_sales))
    }

    pub fn average_rating_label(&self) -> String {
        match self.average_rating {
            Some(r) => format!("{r:.1} {}", "★".repeat(self.stars)),
            None => "N/A".to_string(),
        }
    }
}

/// `1234567` → `"1,234,567"`.
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ---------------------------------------------------------------------------
// Report – everything the dashboard draws for one filter state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub kpis: Kpis,
    /// Records passing the filter.
    pub matched_rows: usize,
    /// Of those, records with no null field (the ones charted).
    pub charted_rows: usize,
    /// Pie; key order.
    pub sales_by_payment: AggregationResult,
    /// Line; key order.
    pub quantity_by_product_line: AggregationResult,
    /// Horizontal bars; ascending total.
    pub sales_by_product_line: AggregationResult,
    /// Bars; natural hour order.
    pub sales_by_hour: AggregationResult,
    /// Scatter of how many sales carry each rating; rating order.
    pub rating_frequency: AggregationResult,
    /// Area; key order.
    pub rating_count_by_product_line: AggregationResult,
}

impl Report {
    /// Filter, compute KPIs on the filtered rows, then chart the complete ones.
    pub fn build(dataset: &Dataset, spec: &FilterSpec) -> Self {
        let selection = apply(dataset, spec);
        let kpis = Kpis::compute(&selection);
        let complete = selection.drop_incomplete();

        let report = Report {
            kpis,
            matched_rows: selection.len(),
            charted_rows: complete.len(),
            sales_by_payment: group_sum(&complete, GroupBy::Payment, ValueField::Total)
                .sorted(SortOrder::ByKey),
            quantity_by_product_line: group_sum(
                &complete,
                GroupBy::ProductLine,
                ValueField::Quantity,
            )
            .sorted(SortOrder::ByKey),
            sales_by_product_line: group_sum(&complete, GroupBy::ProductLine, ValueField::Total)
                .sorted(SortOrder::ByValueAscending),
            sales_by_hour: group_sum(&complete, GroupBy::Hour, ValueField::Total)
                .sorted(SortOrder::ByKey),
            rating_frequency: group_count(&complete, GroupBy::Rating, ValueField::Total)
                .sorted(SortOrder::ByKey),
            rating_count_by_product_line: group_count(
                &complete,
                GroupBy::ProductLine,
                ValueField::Rating,
            )
            .sorted(SortOrder::ByKey),
        };
        log::debug!(
            "Report: {} matched, {} charted, total sales {}",
            report.matched_rows,
            report.charted_rows,
            report.kpis.total_sales
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::data::model::{GroupKey, Record};

    fn record(line: &str, payment: &str, qty: i64, total: f64, rating: f64, hour: u32) -> Record {
        Record::new(
            Some("Yangon".into()),
            Some("Female".into()),
            Some("Member".into()),
            Some(line.into()),
            Some(payment.into()),
            Some(qty),
            Some(total),
            Some(rating),
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        )
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(322_966), "322,966");
        assert_eq!(thousands(-1_234_567), "-1,234,567");
    }

    #[test]
    fn kpis_truncate_sales_and_round_rating() {
        let ds = Dataset::from_records(vec![
            record("Food", "Cash", 1, 100.9, 7.0, 10),
            record("Food", "Cash", 1, 50.5, 7.25, 11),
        ]);
        let kpis = Kpis::compute(&Selection::all(&ds));
        assert_eq!(kpis.total_sales, 151);
        assert_eq!(kpis.average_rating, Some(7.1));
        assert_eq!(kpis.stars, 7);
        assert_eq!(kpis.rated_sales, 2);
        assert_eq!(kpis.total_sales_label(), "US $ 151");
        assert_eq!(kpis.average_rating_label(), "7.1 ★★★★★★★");
    }

    #[test]
    fn average_rating_rounds_half_to_even() {
        // Mean 7.25 sits on the tie; 7.3 would be rounding away from zero.
        let ds = Dataset::from_records(vec![
            record("Food", "Cash", 1, 1.0, 7.0, 10),
            record("Food", "Cash", 1, 1.0, 7.5, 11),
        ]);
        let kpis = Kpis::compute(&Selection::all(&ds));
        assert_eq!(kpis.average_rating, Some(7.2));
        assert_eq!(kpis.average_rating_label(), "7.2 ★★★★★★★");
    }

    #[test]
    fn stars_round_half_to_even() {
        let ds = Dataset::from_records(vec![record("Food", "Cash", 1, 1.0, 6.5, 10)]);
        assert_eq!(Kpis::compute(&Selection::all(&ds)).stars, 6);
        let ds = Dataset::from_records(vec![record("Food", "Cash", 1, 1.0, 7.5, 10)]);
        assert_eq!(Kpis::compute(&Selection::all(&ds)).stars, 8);
    }

    #[test]
    fn empty_filter_gives_no_data_kpis() {
        let ds = Dataset::from_records(vec![record("Food", "Cash", 1, 1.0, 6.5, 10)]);
        let mut spec = FilterSpec::select_all(&ds);
        spec.cities.clear();
        let report = Report::build(&ds, &spec);
        assert_eq!(report.matched_rows, 0);
        assert_eq!(report.kpis.total_sales, 0);
        assert_eq!(report.kpis.average_rating, None);
        assert_eq!(report.kpis.stars, 0);
        assert_eq!(report.kpis.rated_sales, 0);
        assert_eq!(report.kpis.average_rating_label(), "N/A");
        assert!(report.sales_by_hour.is_empty());
    }

    #[test]
    fn kpis_count_rows_the_charts_drop() {
        let mut partial = record("Food", "Cash", 1, 40.0, 5.0, 10);
        partial.payment = None;
        let ds = Dataset::from_records(vec![partial, record("Sports", "Card", 2, 60.0, 9.0, 13)]);
        let report = Report::build(&ds, &FilterSpec::select_all(&ds));
        assert_eq!(report.matched_rows, 2);
        assert_eq!(report.charted_rows, 1);
        assert_eq!(report.kpis.total_sales, 100);
        assert_eq!(report.sales_by_product_line.total(), 60.0);
    }

    #[test]
    fn charts_have_their_documented_order() {
        let ds = Dataset::from_records(vec![
            record("Sports", "Ewallet", 3, 300.0, 9.0, 15),
            record("Food", "Cash", 5, 100.0, 4.0, 10),
            record("Home", "Cash", 1, 200.0, 9.0, 12),
        ]);
        let report = Report::build(&ds, &FilterSpec::select_all(&ds));

        let keys = |r: &AggregationResult| {
            r.entries
                .iter()
                .map(|(k, _)| k.to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(&report.sales_by_payment), vec!["Cash", "Ewallet"]);
        assert_eq!(keys(&report.quantity_by_product_line), vec!["Food", "Home", "Sports"]);
        assert_eq!(keys(&report.sales_by_product_line), vec!["Food", "Home", "Sports"]);
        assert_eq!(keys(&report.sales_by_hour), vec!["10", "12", "15"]);
        assert_eq!(report.rating_frequency.get(&GroupKey::Decimal(9.0)), Some(2.0));
        assert_eq!(report.rating_count_by_product_line.total(), 3.0);
        assert_eq!(report.sales_by_payment.get(&GroupKey::from("Cash")), Some(300.0));
    }

    #[test]
    fn report_serializes_for_snapshots() {
        let ds = Dataset::from_records(vec![record("Food", "Cash", 1, 10.0, 5.0, 10)]);
        let report = Report::build(&ds, &FilterSpec::select_all(&ds));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kpis"]["total_sales"], 10);
        assert_eq!(json["sales_by_payment"]["entries"][0][0], "Cash");
    }
}
