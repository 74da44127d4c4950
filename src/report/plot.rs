//! Box plot with a swarm overlay of the normalized values of one compound,
//! one box per Sample ID, rendered to PNG bytes with [`plotters`].

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;

use crate::color::{generate_palette, SWARM_COLOR};
use crate::data::aggregate::group_values;
use crate::data::model::MergedTable;
use crate::error::{ReportError, Result};

/// Figure size in inches; pixel size is this times the DPI.
const FIGURE_INCHES: (f64, f64) = (6.4, 4.8);
const X_LABEL: &str = "Sample ID";

/// Render the distribution plot of `table` as PNG bytes.
pub fn render_distribution_png(table: &MergedTable, title: &str, y_label: &str, dpi: u32) -> Result<Vec<u8>> {
    let groups = group_values(table);
    let width = (FIGURE_INCHES.0 * dpi as f64).round() as u32;
    let height = (FIGURE_INCHES.1 * dpi as f64).round() as u32;
    let scale = dpi as f64 / 100.0;

    let plot_err = |reason: String| ReportError::Plot {
        title: title.to_string(),
        reason,
    };

    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw(&root, &groups, title, y_label, scale).map_err(|e| plot_err(e.to_string()))?;
        root.present().map_err(|e| plot_err(e.to_string()))?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&buffer, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| plot_err(e.to_string()))?;
    Ok(png)
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    groups: &[(String, Vec<f64>)],
    title: &str,
    y_label: &str,
    scale: f64,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let px = |v: f64| (v * scale).round() as u32;
    let font = |size: f64| ("sans-serif", size * scale);
    let (y_min, y_max) = value_range(groups);
    let n = groups.len().max(1) as i32;
    let longest_label = groups.iter().map(|(id, _)| id.chars().count()).max().unwrap_or(1);

    let mut chart = ChartBuilder::on(root)
        .caption(title, font(16.0))
        .margin(px(10.0))
        .x_label_area_size(px(24.0 + 7.0 * longest_label as f64))
        .y_label_area_size(px(70.0))
        .build_cartesian_2d((0..n).into_segmented(), y_min as f32..y_max as f32)?;

    let labels: Vec<&str> = groups.iter().map(|(id, _)| id.as_str()).collect();
    let formatter = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).map(|s| s.to_string()).unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(groups.len().max(1))
        .x_label_formatter(&formatter)
        .x_label_style(font(11.0).into_font().transform(FontTransform::Rotate90))
        .y_label_style(font(11.0))
        .x_desc(X_LABEL)
        .y_desc(y_label)
        .axis_desc_style(font(12.0))
        .draw()?;

    let palette = generate_palette(groups.len());
    let box_width = px(60.0).min(px(500.0) / n as u32);
    let boxes = groups
        .iter()
        .zip(&palette)
        .enumerate()
        .filter(|(_, ((_, vals), _))| !vals.is_empty())
        .map(|(i, ((_, vals), color))| {
            Boxplot::new_vertical(SegmentValue::CenterOf(i as i32), &Quartiles::new(vals))
                .width(box_width)
                .whisker_width(0.5)
                .style(color.stroke_width(px(1.5)))
        });
    chart.draw_series(boxes)?;

    // Pixels per data unit along y, for spacing swarm points apart.
    let (_, plot_height) = chart.plotting_area().dim_in_pixel();
    let px_per_unit = plot_height as f64 / (y_max - y_min);
    let radius = px(2.5) as i32;

    for (i, (_, vals)) in groups.iter().enumerate() {
        let offsets = swarm_offsets(vals, px_per_unit, radius as f64);
        chart.draw_series(vals.iter().zip(offsets).map(|(&v, dx)| {
            EmptyElement::at((SegmentValue::CenterOf(i as i32), v as f32))
                + Circle::new((dx, 0), radius, SWARM_COLOR.filled())
        }))?;
    }
    Ok(())
}

/// Padded y range over every value; a unit range around the value when flat.
///
/// The range is at least a few parts per million of its magnitude wide, so
/// its bounds stay distinct once narrowed to the `f32` chart axis.
fn value_range(groups: &[(String, Vec<f64>)]) -> (f64, f64) {
    let (lo, hi) = groups
        .iter()
        .flat_map(|(_, v)| v.iter().copied())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let span = hi - lo;
    let pad = if span > 0.0 { span * 0.05 } else { lo.abs().max(1.0) * 0.5 };
    let (lo, hi) = (lo - pad, hi + pad);

    let min_half_width = lo.abs().max(hi.abs()).max(1.0) * 1e-5;
    if hi - lo < 2.0 * min_half_width {
        let mid = (lo + hi) / 2.0;
        return (mid - min_half_width, mid + min_half_width);
    }
    (lo, hi)
}

/// Horizontal pixel offsets that keep swarm markers from overlapping.
///
/// Points are placed in ascending value order, each at the candidate offset
/// closest to the centre line (0, +d, -d, +2d, ...) that keeps it at least
/// two radii from every point already placed. The result is in input order.
///
/// Without a usable scale every point stays on the centre line.
pub fn swarm_offsets(values: &[f64], px_per_unit: f64, radius: f64) -> Vec<i32> {
    if !px_per_unit.is_finite() || px_per_unit <= 0.0 || !radius.is_finite() || values.iter().any(|v| !v.is_finite()) {
        return vec![0; values.len()];
    }
    let diameter = 2.0 * radius;
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut placed: Vec<(f64, f64)> = Vec::with_capacity(values.len());
    let mut offsets = vec![0i32; values.len()];
    for idx in order {
        let y = values[idx] * px_per_unit;
        let mut k = 0usize;
        let dx = loop {
            let step = ((k + 1) / 2) as f64 * diameter;
            let candidate = if k % 2 == 1 { step } else { -step };
            let clear = placed
                .iter()
                .all(|&(px, py)| (px - candidate).hypot(py - y) >= diameter - 1e-9);
            if clear {
                break candidate;
            }
            k += 1;
        };
        placed.push((dx, y));
        offsets[idx] = dx.round() as i32;
    }
    offsets
}
