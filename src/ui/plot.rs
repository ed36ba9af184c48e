use std::f64::consts::TAU;
use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_plot::{
    Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text,
};

use supersale_insights::data::aggregate::AggregationResult;

use crate::color::{ACCENT, ColorMap};
use crate::state::AppState;
use crate::ui::table;

const CHART_HEIGHT: f32 = 280.0;

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render KPIs, the data preview and the six charts.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let (Some(dataset), Some(report)) = (&state.dataset, &state.report) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a workbook to view sales  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Top KPIs ----
            ui.columns(3, |cols| {
                cols[0].heading("Total Sales:");
                cols[0].heading(report.kpis.total_sales_label());
                cols[1].heading("Rated Sales:");
                cols[1].heading(report.kpis.rated_sales.to_string());
                cols[2].heading("Average Rating:");
                cols[2].heading(report.kpis.average_rating_label());
            });
            ui.separator();

            egui::CollapsingHeader::new("Data Preview")
                .default_open(false)
                .show(ui, |ui: &mut Ui| table::preview(ui, dataset));
            ui.separator();

            ui.columns(2, |cols| {
                chart_frame(
                    &mut cols[0],
                    "Sales by Payment",
                    &report.sales_by_payment,
                    payment_pie,
                );
                chart_frame(
                    &mut cols[1],
                    "Product by Quantity Sales",
                    &report.quantity_by_product_line,
                    quantity_line,
                );
            });
            ui.columns(2, |cols| {
                chart_frame(
                    &mut cols[0],
                    "Sales by Product Line",
                    &report.sales_by_product_line,
                    product_sales_bars,
                );
                chart_frame(&mut cols[1], "Sales by Hour", &report.sales_by_hour, hourly_bars);
            });
            ui.columns(2, |cols| {
                chart_frame(
                    &mut cols[0],
                    "Rating by Sales",
                    &report.rating_frequency,
                    rating_scatter,
                );
                chart_frame(
                    &mut cols[1],
                    "Product by Rating",
                    &report.rating_count_by_product_line,
                    rating_area,
                );
            });
        });
}

/// Title plus either the chart or an empty-selection notice.
fn chart_frame(
    ui: &mut Ui,
    title: &str,
    result: &AggregationResult,
    draw: fn(&mut Ui, &AggregationResult),
) {
    ui.strong(title);
    if result.is_empty() {
        ui.allocate_ui(egui::vec2(ui.available_width(), CHART_HEIGHT), |ui: &mut Ui| {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(RichText::new("No data for the current selection").italics());
            });
        });
    } else {
        draw(ui, result);
    }
}

fn base_plot(id: &str) -> Plot<'static> {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
}

/// Axis formatter that shows category labels at integer positions.
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let v = mark.value;
        if v.fract() != 0.0 || v < 0.0 {
            return String::new();
        }
        labels.get(v as usize).cloned().unwrap_or_default()
    }
}

fn labels(result: &AggregationResult) -> Vec<String> {
    result.entries.iter().map(|(k, _)| k.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Individual charts
// ---------------------------------------------------------------------------

fn payment_pie(ui: &mut Ui, result: &AggregationResult) {
    let colors = ColorMap::new(result.entries.iter().map(|(k, _)| k));
    let sum = result.total();

    base_plot("sales_by_payment")
        .data_aspect(1.0_f32)
        .show_axes(false)
        .show_grid(false)
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            let mut start = 0.0;
            for (key, value) in &result.entries {
                let sweep = if sum > 0.0 { value / sum * TAU } else { 0.0 };
                let steps = ((sweep / TAU) * 96.0).ceil().max(1.0) as usize;
                let mut points = vec![[0.0, 0.0]];
                points.extend((0..=steps).map(|i| {
                    let a = start + sweep * i as f64 / steps as f64;
                    [a.cos(), a.sin()]
                }));
                start += sweep;

                let pct = if sum > 0.0 { value / sum * 100.0 } else { 0.0 };
                plot_ui.polygon(
                    Polygon::new(PlotPoints::new(points))
                        .fill_color(colors.color_for(key))
                        .stroke(egui::Stroke::new(1.0_f32, Color32::WHITE))
                        .name(format!("{key} ({pct:.1}%)")),
                );
            }
        });
}

fn quantity_line(ui: &mut Ui, result: &AggregationResult) {
    let points: Vec<[f64; 2]> = result
        .entries
        .iter()
        .enumerate()
        .map(|(i, (_, qty))| [*qty, i as f64])
        .collect();

    base_plot("quantity_by_product_line")
        .y_axis_formatter(category_axis(labels(result)))
        .x_axis_label("Quantity")
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(PlotPoints::new(points.clone())).color(ACCENT).width(2.0_f32));
            plot_ui.points(
                Points::new(PlotPoints::new(points.clone()))
                    .radius(4.0_f32)
                    .color(ACCENT),
            );
            for [x, y] in &points {
                plot_ui.text(Text::new(PlotPoint::new(*x, *y + 0.25), format!("{x}")));
            }
        });
}

fn product_sales_bars(ui: &mut Ui, result: &AggregationResult) {
    let bars: Vec<Bar> = result
        .entries
        .iter()
        .enumerate()
        .map(|(i, (key, total))| Bar::new(i as f64, *total).name(key.to_string()).width(0.6))
        .collect();

    base_plot("sales_by_product_line")
        .y_axis_formatter(category_axis(labels(result)))
        .x_axis_label("Total")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal().color(ACCENT));
        });
}

fn hourly_bars(ui: &mut Ui, result: &AggregationResult) {
    let bars: Vec<Bar> = result
        .entries
        .iter()
        .filter_map(|(key, total)| Some(Bar::new(key.as_f64()?, *total).width(0.8)))
        .collect();

    base_plot("sales_by_hour")
        .x_axis_label("Hour")
        .y_axis_label("Total")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(ACCENT));
        });
}

fn rating_scatter(ui: &mut Ui, result: &AggregationResult) {
    let points: PlotPoints = result
        .entries
        .iter()
        .filter_map(|(rating, n)| Some([rating.as_f64()?, *n]))
        .collect();

    base_plot("rating_frequency")
        .x_axis_label("Rating")
        .y_axis_label("Sales")
        .show(ui, |plot_ui| {
            plot_ui.points(Points::new(points).radius(4.0_f32).color(ACCENT));
        });
}

fn rating_area(ui: &mut Ui, result: &AggregationResult) {
    let points: PlotPoints = result
        .entries
        .iter()
        .enumerate()
        .map(|(i, (_, n))| [i as f64, *n])
        .collect();

    base_plot("rating_count_by_product_line")
        .x_axis_formatter(category_axis(labels(result)))
        .y_axis_label("Rating")
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).color(ACCENT).fill(0.0_f32));
        });
}
