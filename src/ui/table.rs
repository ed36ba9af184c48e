use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use supersale_insights::Dataset;

const HEADERS: [&str; 10] = [
    "City",
    "Gender",
    "Customer_type",
    "Product line",
    "Payment",
    "Quantity",
    "Total",
    "Rating",
    "Time",
    "hour",
];

/// Scrollable table of the whole (unfiltered) dataset.
pub fn preview(ui: &mut Ui, dataset: &Dataset) {
    let records = dataset.records();
    TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(300.0)
        .columns(Column::auto().resizable(true), HEADERS.len())
        .header(20.0, |mut header| {
            for h in HEADERS {
                header.col(|ui| {
                    ui.strong(h);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, records.len(), |mut row| {
                let r = &records[row.index()];
                let cells = [
                    opt(r.city.as_deref()),
                    opt(r.gender.as_deref()),
                    opt(r.customer_type.as_deref()),
                    opt(r.product_line.as_deref()),
                    opt(r.payment.as_deref()),
                    r.quantity.map_or_else(String::new, |q| q.to_string()),
                    r.total.map_or_else(String::new, |t| format!("{t:.2}")),
                    r.rating.map_or_else(String::new, |v| format!("{v:.1}")),
                    r.time.format("%H:%M:%S").to_string(),
                    r.hour.to_string(),
                ];
                for text in cells {
                    row.col(|ui| {
                        ui.label(text);
                    });
                }
            });
        });
}

fn opt(value: Option<&str>) -> String {
    value.unwrap_or("").to_string()
}
