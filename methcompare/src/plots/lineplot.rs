use std::path::Path;

use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{info, warn};

use crate::errors::{plot_err, Result};
use crate::helper_functions::ensure_parent_dir;
use crate::plots::{colour_for_index, padded_range, ChartLabels, PlotStyle, SeriesPoints};

/// Sorts each group by x and, for log axes, drops non-positive y values.
pub fn prepare_lines(groups: &[SeriesPoints], log_y: bool) -> Vec<SeriesPoints> {
    groups
        .iter()
        .map(|g| {
            let mut points: Vec<(f64, f64)> = g
                .points
                .iter()
                .copied()
                .filter(|(x, y)| x.is_finite() && y.is_finite() && (!log_y || *y > 0.0))
                .collect();
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            SeriesPoints {
                label: g.label.clone(),
                points,
            }
        })
        .collect()
}

fn draw_lines<'a, Y>(
    chart: &mut ChartContext<'a, BitMapBackend<'a>, Cartesian2d<RangedCoordf64, Y>>,
    groups: &[SeriesPoints],
    labels: &ChartLabels,
    style: &PlotStyle,
) -> Result<()>
where
    Y: Ranged<ValueType = f64>,
{
    chart
        .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())
        .map_err(plot_err)?
        .label(labels.legend_title.as_str())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], WHITE.mix(0.0).stroke_width(1)));

    for (idx, group) in groups.iter().enumerate() {
        let colour = colour_for_index(idx);
        let width = style.line_width;
        chart
            .draw_series(LineSeries::new(group.points.iter().copied(), colour.stroke_width(width)))
            .map_err(plot_err)?
            .label(group.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], colour.stroke_width(width + 1)));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(style.label_font)
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .map_err(plot_err)?;
    Ok(())
}

fn chart_builder<'a, 'b, 'c>(
    root: &'a DrawingArea<BitMapBackend<'c>, Shift>,
    labels: &ChartLabels,
    style: &PlotStyle,
) -> ChartBuilder<'a, 'b, BitMapBackend<'c>> {
    let mut builder = ChartBuilder::on(root);
    builder
        .caption(&labels.title, style.caption_font)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80);
    builder
}

/// Line plot with one line per group. `x_range` pins the x axis; `log_y`
/// switches the y axis to a log scale. Returns `false` when there was nothing
/// to draw and no file was written.
pub fn draw_lineplot(
    output_path: &Path,
    groups: &[SeriesPoints],
    labels: &ChartLabels,
    style: &PlotStyle,
    x_range: (Option<f64>, Option<f64>),
    log_y: bool,
) -> Result<bool> {
    let groups = prepare_lines(groups, log_y);
    let all_points = || groups.iter().flat_map(|g| g.points.iter().copied());

    let Some((data_x0, data_x1)) = padded_range(all_points().map(|(x, _)| x), 0.0) else {
        warn!("No points to draw for {}, skipping plot", output_path.display());
        return Ok(false);
    };
    let x0 = x_range.0.unwrap_or(data_x0);
    let x1 = x_range.1.unwrap_or(data_x1);
    if x0 >= x1 {
        warn!("Empty x range {}..{} for {}, skipping plot", x0, x1, output_path.display());
        return Ok(false);
    }
    ensure_parent_dir(output_path)?;

    let root = BitMapBackend::new(output_path, style.size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    if log_y {
        let y_min = all_points().map(|(_, y)| y).fold(f64::INFINITY, f64::min);
        let y_max = all_points().map(|(_, y)| y).fold(f64::NEG_INFINITY, f64::max);
        let mut chart = chart_builder(&root, labels, style)
            .build_cartesian_2d(x0..x1, (y_min * 0.8..y_max * 1.25).log_scale())
            .map_err(plot_err)?;
        chart
            .configure_mesh()
            .x_desc(labels.x_desc.as_str())
            .y_desc(labels.y_desc.as_str())
            .axis_desc_style(style.axis_font)
            .label_style(style.label_font)
            .y_label_formatter(&|y| format!("{:.0e}", y))
            .draw()
            .map_err(plot_err)?;
        draw_lines(&mut chart, &groups, labels, style)?;
    } else {
        let (y0, y1) = padded_range(all_points().map(|(_, y)| y), 0.05).unwrap_or((0.0, 1.0));
        let mut chart = chart_builder(&root, labels, style)
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
        draw_lines(&mut chart, &groups, labels, style)?;
    }

    root.present().map_err(plot_err)?;
    info!("Line plot saved to {}", output_path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_sorted_and_log_safe() {
        let groups = vec![SeriesPoints {
            label: "run1".to_string(),
            points: vec![(0.9, 10.0), (0.1, 0.0), (0.5, 3.0)],
        }];

        let linear = prepare_lines(&groups, false);
        assert_eq!(linear[0].points, vec![(0.1, 0.0), (0.5, 3.0), (0.9, 10.0)]);

        let log = prepare_lines(&groups, true);
        assert_eq!(log[0].points, vec![(0.5, 3.0), (0.9, 10.0)]);
    }
}
