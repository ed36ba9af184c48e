use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const CITIES: [&str; 3] = ["Yangon", "Mandalay", "Naypyitaw"];
const GENDERS: [&str; 2] = ["Female", "Male"];
const CUSTOMER_TYPES: [&str; 2] = ["Member", "Normal"];
const PRODUCT_LINES: [&str; 6] = [
    "Electronic accessories",
    "Fashion accessories",
    "Food and beverages",
    "Health and beauty",
    "Home and lifestyle",
    "Sports and travel",
];
const PAYMENTS: [&str; 3] = ["Cash", "Credit card", "Ewallet"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options[self.below(options.len() as u64) as usize]
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);
    let n_rows = 1000;

    let mut city = Vec::with_capacity(n_rows);
    let mut gender = Vec::with_capacity(n_rows);
    let mut customer_type = Vec::with_capacity(n_rows);
    let mut product_line = Vec::with_capacity(n_rows);
    let mut payment = Vec::with_capacity(n_rows);
    let mut quantity = Vec::with_capacity(n_rows);
    let mut total = Vec::with_capacity(n_rows);
    let mut rating = Vec::with_capacity(n_rows);
    let mut time = Vec::with_capacity(n_rows);

    for _ in 0..n_rows {
        city.push(rng.pick(&CITIES));
        gender.push(rng.pick(&GENDERS));
        customer_type.push(rng.pick(&CUSTOMER_TYPES));
        product_line.push(rng.pick(&PRODUCT_LINES));
        payment.push(rng.pick(&PAYMENTS));

        // Unit price 10–100 plus 5% tax, as on a till receipt.
        let qty = 1 + rng.below(10) as i64;
        let unit_price = 10.0 + rng.next_f64() * 90.0;
        quantity.push(qty);
        total.push((unit_price * qty as f64 * 1.05 * 100.0).round() / 100.0);
        rating.push(((4.0 + rng.next_f64() * 6.0) * 10.0).round() / 10.0);

        // Store hours 10:00–20:59.
        let (h, m) = (10 + rng.below(11), rng.below(60));
        time.push(format!("{h:02}:{m:02}:00"));
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("City", DataType::Utf8, false),
        Field::new("Gender", DataType::Utf8, false),
        Field::new("Customer_type", DataType::Utf8, false),
        Field::new("Product line", DataType::Utf8, false),
        Field::new("Payment", DataType::Utf8, false),
        Field::new("Quantity", DataType::Int64, false),
        Field::new("Total", DataType::Float64, false),
        Field::new("Rating", DataType::Float64, false),
        Field::new("Time", DataType::Utf8, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(city)),
        Arc::new(StringArray::from(gender)),
        Arc::new(StringArray::from(customer_type)),
        Arc::new(StringArray::from(product_line)),
        Arc::new(StringArray::from(payment)),
        Arc::new(Int64Array::from(quantity)),
        Arc::new(Float64Array::from(total)),
        Arc::new(Float64Array::from(rating)),
        Arc::new(StringArray::from(time)),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let output_path = "super_sales.parquet";
    let file = std::fs::File::create(output_path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    log::info!("Wrote {n_rows} transactions to {output_path}");
    println!(
        "Wrote {n_rows} transactions to {output_path}; point [source] path at it in supersale.toml"
    );
    Ok(())
}
