use std::ops::RangeInclusive;

use eframe::egui::{Color32, RichText, ScrollArea, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoints, Points,
};

use crate::color::{SERIES_COLOR, fill, generate_palette};
use crate::state::AppState;
use crate::stats::distribution::Histogram;
use crate::ui::tables;
use crate::views::output::{Block, ChartKind, ChartSpec, XAxis, x_to_date};

const CHART_HEIGHT: f32 = 360.0;

// ---------------------------------------------------------------------------
// Central panel: header plus the selected view's tables and charts
// ---------------------------------------------------------------------------

pub fn view_panel(ui: &mut Ui, state: &AppState) {
    let Some(output) = &state.output else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to start  (File → Open…)");
        });
        return;
    };

    ui.heading(state.selected.header());
    ui.separator();

    let output = match output {
        Ok(output) => output,
        Err(msg) => {
            ui.label(RichText::new(msg).color(Color32::RED));
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (i, block) in output.blocks.iter().enumerate() {
                match block {
                    Block::Table(t) => tables::stat_table(ui, i, t),
                    Block::Chart(c) => chart(ui, i, c),
                }
                ui.add_space(12.0);
            }
        });
}

// ---------------------------------------------------------------------------
// Chart rendering
// ---------------------------------------------------------------------------

/// Draw one chart specification.
pub fn chart(ui: &mut Ui, id: usize, spec: &ChartSpec) {
    ui.strong(&spec.title);

    let plot = Plot::new(("chart", id))
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(spec.x_label.clone())
        .y_axis_label(spec.y_label.clone())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true);

    match &spec.kind {
        ChartKind::Line { points, x_axis } => {
            let plot = match x_axis {
                XAxis::Date => plot.x_axis_formatter(|mark: GridMark, _: &RangeInclusive<f64>| {
                    x_to_date(mark.value)
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default()
                }),
                XAxis::Numeric => plot,
            };
            let line = Line::new(PlotPoints::from(points.clone()))
                .color(SERIES_COLOR)
                .width(1.5);
            plot.show(ui, |plot_ui| plot_ui.line(line));
        }
        ChartKind::Bar { bars } => {
            let labels: Vec<String> = bars.iter().map(|(l, _)| l.clone()).collect();
            let colors = generate_palette(bars.len());
            let chart = BarChart::new(
                bars.iter()
                    .zip(colors)
                    .enumerate()
                    .map(|(i, ((label, v), c))| Bar::new(i as f64, *v).name(label).fill(c))
                    .collect(),
            )
            .width(0.7);
            plot.x_axis_formatter(move |mark: GridMark, _: &RangeInclusive<f64>| {
                category_label(&labels, mark.value)
            })
            .show(ui, |plot_ui| plot_ui.bar_chart(chart));
        }
        ChartKind::Histogram(h) => {
            let (bars, kde) = histogram_items(h);
            plot.show(ui, |plot_ui| {
                plot_ui.bar_chart(bars);
                if let Some(kde) = kde {
                    plot_ui.line(kde);
                }
            });
        }
        ChartKind::BoxPlot { groups } => {
            let labels: Vec<String> = groups.iter().map(|(l, _)| l.clone()).collect();
            let colors = generate_palette(groups.len());
            let mut outliers = Vec::new();
            let elems = groups
                .iter()
                .zip(colors)
                .enumerate()
                .map(|(i, ((label, b), c))| {
                    outliers.extend(b.outliers.iter().map(|&v| [i as f64, v]));
                    BoxElem::new(
                        i as f64,
                        BoxSpread::new(b.lower_whisker, b.q1, b.median, b.q3, b.upper_whisker),
                    )
                    .name(label)
                    .fill(fill(c))
                })
                .collect();
            let boxes = BoxPlot::new(elems);
            let outliers = Points::new(PlotPoints::from(outliers))
                .radius(2.0)
                .color(Color32::GRAY);
            plot.x_axis_formatter(move |mark: GridMark, _: &RangeInclusive<f64>| {
                category_label(&labels, mark.value)
            })
            .show(ui, |plot_ui| {
                plot_ui.box_plot(boxes);
                plot_ui.points(outliers);
            });
        }
        ChartKind::Scatter { points } => {
            let points = Points::new(PlotPoints::from(points.clone()))
                .radius(2.5)
                .color(SERIES_COLOR);
            plot.show(ui, |plot_ui| plot_ui.points(points));
        }
    }
}

/// Label for an integer grid mark on a categorical axis.
fn category_label(labels: &[String], x: f64) -> String {
    if x.fract() != 0.0 || x < 0.0 {
        return String::new();
    }
    labels.get(x as usize).cloned().unwrap_or_default()
}

fn histogram_items(h: &Histogram) -> (BarChart, Option<Line>) {
    let width = h.bin_width();
    let bars = h
        .counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let centre = (h.edges[i] + h.edges[i + 1]) / 2.0;
            Bar::new(centre, count as f64).width(width).fill(fill(SERIES_COLOR))
        })
        .collect();
    let kde = (!h.kde.is_empty()).then(|| {
        Line::new(PlotPoints::from(h.kde.clone()))
            .color(SERIES_COLOR)
            .width(2.0)
            .name("KDE")
    });
    (BarChart::new(bars).color(SERIES_COLOR), kde)
}
