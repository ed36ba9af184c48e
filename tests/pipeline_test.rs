use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use supersale_insights::data::aggregate::{GroupBy, ValueField, group_sum, total};
use supersale_insights::{
    Dimension, FilterSpec, GroupKey, HourRange, LoadError, Report, SourceConfig, apply, load,
};

const CITIES: [&str; 3] = ["Yangon", "Mandalay", "Naypyitaw"];
const LINES: [&str; 3] = ["Health and beauty", "Sports and travel", "Food and beverages"];
const PAYMENTS: [&str; 3] = ["Cash", "Credit card", "Ewallet"];

/// Thirty rows laid out like the sales workbook: three title rows, the header
/// from column B onwards, and columns the dashboard ignores mixed in.
fn write_sales_csv(dir: &Path) -> SourceConfig {
    let mut body = String::from("Supermarket sales,\n,\n,\n");
    body.push_str(",Invoice ID,Branch,City,Customer_type,Gender,Product line,Unit price,Quantity,Tax 5%,Total,Date,Time,Payment,cogs,gross margin percentage,gross income,Rating\n");
    for i in 0..30usize {
        let qty = 1 + i % 7;
        let price = 10.0 + i as f64;
        let total = price * qty as f64 * 1.05;
        body.push_str(&format!(
            ",{i:03}-00-0000,A,{city},{ctype},{gender},{line},{price:.2},{qty},{tax:.4},{total:.4},1/5/2019,{hour:02}:{min:02}:00,{payment},0,4.76,0,{rating:.1}\n",
            city = CITIES[i % 3],
            ctype = if i % 2 == 0 { "Member" } else { "Normal" },
            gender = if i % 4 < 2 { "Female" } else { "Male" },
            line = LINES[i % 3],
            tax = total / 21.0,
            hour = 10 + i % 11,
            min = i % 60,
            payment = PAYMENTS[(i / 3) % 3],
            rating = 4.0 + (i % 6) as f64,
        ));
    }
    let path = dir.join("super_sales.csv");
    fs::write(&path, body).unwrap();
    SourceConfig::default().with_path(path)
}

#[test]
fn loads_the_sheet_region() {
    let dir = tempfile::tempdir().unwrap();
    let ds = load(&write_sales_csv(dir.path())).unwrap();
    assert_eq!(ds.len(), 30);
    assert_eq!(ds.cities, vec!["Yangon", "Mandalay", "Naypyitaw"]);
    assert_eq!(ds.customer_types, vec!["Member", "Normal"]);
    assert_eq!(ds.hour_bounds, Some((10, 20)));
    let first = &ds.records()[0];
    assert_eq!(first.payment.as_deref(), Some("Cash"));
    assert_eq!(first.rating, Some(4.0));
}

#[test]
fn loading_twice_yields_equal_datasets() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_sales_csv(dir.path());
    assert_eq!(load(&source).unwrap(), load(&source).unwrap());
}

#[test]
fn filtered_rows_are_a_duplicate_free_subset_satisfying_every_predicate() {
    let dir = tempfile::tempdir().unwrap();
    let ds = load(&write_sales_csv(dir.path())).unwrap();

    let mut spec = FilterSpec::select_all(&ds);
    spec.toggle(Dimension::City, "Mandalay");
    spec.toggle(Dimension::Gender, "Male");
    spec.hours = HourRange::new(12, 17).unwrap();

    let sel = apply(&ds, &spec);
    assert!(!sel.is_empty());
    let unique: HashSet<usize> = sel.indices().iter().copied().collect();
    assert_eq!(unique.len(), sel.len());
    assert!(sel.indices().iter().all(|&i| i < ds.len()));
    assert!(sel.indices().windows(2).all(|w| w[0] < w[1]));

    for r in sel.records() {
        assert_ne!(r.city.as_deref(), Some("Mandalay"));
        assert_eq!(r.gender.as_deref(), Some("Female"));
        assert!((12..=17).contains(&r.hour));
    }
}

#[test]
fn full_selection_returns_whole_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let ds = load(&write_sales_csv(dir.path())).unwrap();
    let mut spec = FilterSpec::select_all(&ds);
    spec.hours = HourRange::FULL;
    assert_eq!(apply(&ds, &spec).len(), ds.len());
}

#[test]
fn disjoint_category_gives_empty_but_valid_report() {
    let dir = tempfile::tempdir().unwrap();
    let ds = load(&write_sales_csv(dir.path())).unwrap();
    let mut spec = FilterSpec::select_all(&ds);
    spec.cities = ["Bago".to_string()].into_iter().collect();

    let report = Report::build(&ds, &spec);
    assert_eq!(report.matched_rows, 0);
    assert_eq!(report.kpis.total_sales, 0);
    assert_eq!(report.kpis.average_rating, None);
    assert!(report.sales_by_payment.is_empty());
    assert!(report.rating_frequency.is_empty());
}

#[test]
fn group_sums_partition_the_filtered_total() {
    let dir = tempfile::tempdir().unwrap();
    let ds = load(&write_sales_csv(dir.path())).unwrap();
    let mut spec = FilterSpec::select_all(&ds);
    spec.toggle(Dimension::CustomerType, "Normal");
    let sel = apply(&ds, &spec);

    let whole = total(&sel, ValueField::Total);
    for by in [GroupBy::Payment, GroupBy::ProductLine, GroupBy::Hour, GroupBy::Rating] {
        let parts = group_sum(&sel, by, ValueField::Total);
        assert!((parts.total() - whole).abs() < 1e-6, "{by:?}");
    }
}

#[test]
fn report_orders_each_chart_as_drawn() {
    let dir = tempfile::tempdir().unwrap();
    let ds = load(&write_sales_csv(dir.path())).unwrap();
    let report = Report::build(&ds, &FilterSpec::select_all(&ds));

    let values: Vec<f64> = report.sales_by_product_line.entries.iter().map(|(_, v)| *v).collect();
    assert!(values.windows(2).all(|w| w[0] <= w[1]));

    let hours: Vec<GroupKey> = report
        .sales_by_hour
        .entries
        .iter()
        .map(|(k, _)| k.clone())
        .collect();
    let mut sorted = hours.clone();
    sorted.sort();
    assert_eq!(hours, sorted);
    assert_eq!(hours.first(), Some(&GroupKey::Integer(10)));

    let expected = report.kpis.total_sales as f64;
    assert!((report.sales_by_payment.total() - expected).abs() < 1.0);
    assert_eq!(report.rating_count_by_product_line.total(), 30.0);
}

#[test]
fn parquet_source_loads_by_column_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("Time", DataType::Utf8, false),
        Field::new("City", DataType::Utf8, true),
        Field::new("Gender", DataType::Utf8, false),
        Field::new("Customer_type", DataType::Utf8, false),
        Field::new("Product line", DataType::Utf8, false),
        Field::new("Payment", DataType::Utf8, false),
        Field::new("Quantity", DataType::Int64, false),
        Field::new("Total", DataType::Float64, false),
        Field::new("Rating", DataType::Float64, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec!["10:15:00", "18:40:30"])),
        Arc::new(StringArray::from(vec![Some("Yangon"), None])),
        Arc::new(StringArray::from(vec!["Female", "Male"])),
        Arc::new(StringArray::from(vec!["Member", "Normal"])),
        Arc::new(StringArray::from(vec!["Food and beverages", "Sports and travel"])),
        Arc::new(StringArray::from(vec!["Cash", "Ewallet"])),
        Arc::new(Int64Array::from(vec![3, 1])),
        Arc::new(Float64Array::from(vec![45.5, 12.0])),
        Arc::new(Float64Array::from(vec![8.4, 6.1])),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let file = fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let ds = load(&SourceConfig::default().with_path(&path)).unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.records()[0].hour, 10);
    assert_eq!(ds.records()[0].quantity, Some(3));
    assert_eq!(ds.records()[1].city, None);
    assert_eq!(ds.cities, vec!["Yangon"]);

    // The null-city row fails the city filter.
    assert_eq!(apply(&ds, &FilterSpec::select_all(&ds)).len(), 1);
}

#[test]
fn parquet_missing_columns_is_a_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.parquet");
    let schema = Arc::new(Schema::new(vec![Field::new("City", DataType::Utf8, false)]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(StringArray::from(vec!["Yangon"])) as ArrayRef],
    )
    .unwrap();
    let mut writer = ArrowWriter::try_new(fs::File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    match load(&SourceConfig::default().with_path(&path)).unwrap_err() {
        LoadError::Schema { missing } => assert_eq!(missing.len(), 8),
        other => panic!("expected schema error, got {other}"),
    }
}

#[test]
fn corrupt_workbook_is_a_data_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.xlsx");
    fs::write(&path, b"not a zip archive").unwrap();
    assert!(matches!(
        load(&SourceConfig::default().with_path(&path)).unwrap_err(),
        LoadError::DataLoad { .. }
    ));
}
