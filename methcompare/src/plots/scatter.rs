use std::path::Path;

use plotters::prelude::*;
use tracing::{info, warn};

use crate::errors::{plot_err, Result};
use crate::helper_functions::ensure_parent_dir;
use crate::plots::{colour_for_index, padded_range, ChartLabels, PlotStyle, SeriesPoints};

/// Drops points outside an optional fixed x window.
pub fn clip_to_x_range(groups: &[SeriesPoints], x_range: Option<(f64, f64)>) -> Vec<SeriesPoints> {
    groups
        .iter()
        .map(|g| SeriesPoints {
            label: g.label.clone(),
            points: g
                .points
                .iter()
                .copied()
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .filter(|(x, _)| x_range.map_or(true, |(lo, hi)| *x >= lo && *x <= hi))
                .collect(),
        })
        .collect()
}

/// Scatterplot with one colour per group. `x_range` pins the x axis, the y
/// axis always follows the data. Returns `false` if no point survived and
/// nothing was written.
pub fn draw_scatter(
    output_path: &Path,
    groups: &[SeriesPoints],
    labels: &ChartLabels,
    style: &PlotStyle,
    x_range: Option<(f64, f64)>,
) -> Result<bool> {
    let groups = clip_to_x_range(groups, x_range);
    let all_points = || groups.iter().flat_map(|g| g.points.iter().copied());

    let x_bounds = x_range.or_else(|| padded_range(all_points().map(|(x, _)| x), 0.05));
    let y_bounds = padded_range(all_points().map(|(_, y)| y), 0.05);
    let (Some((x0, x1)), Some((y0, y1))) = (x_bounds, y_bounds) else {
        warn!("No points to draw for {}, skipping plot", output_path.display());
        return Ok(false);
    };
    ensure_parent_dir(output_path)?;

    let root = BitMapBackend::new(output_path, style.size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&labels.title, style.caption_font)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(labels.x_desc.as_str())
        .y_desc(labels.y_desc.as_str())
        .axis_desc_style(style.axis_font)
        .label_style(style.label_font)
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(std::iter::empty::<Circle<(f64, f64), u32>>())
        .map_err(plot_err)?
        .label(labels.legend_title.as_str())
        .legend(|(x, y)| Circle::new((x, y), 0u32, WHITE.mix(0.0).filled()));

    let point_size = style.point_size;
    for (idx, group) in groups.iter().enumerate() {
        let colour = colour_for_index(idx);
        chart
            .draw_series(
                group
                    .points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), point_size, colour.mix(0.7).filled())),
            )
            .map_err(plot_err)?
            .label(group.label.as_str())
            .legend(move |(x, y)| Circle::new((x + 7, y), point_size + 2, colour.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(style.label_font)
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    info!("Scatterplot saved to {}", output_path.display());
    Ok(true)
}
