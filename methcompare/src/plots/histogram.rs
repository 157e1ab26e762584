use std::path::Path;

use plotters::prelude::*;
use tracing::{info, warn};

use crate::errors::{plot_err, Result};
use crate::helper_functions::ensure_parent_dir;
use crate::plots::{colour_for_index, ChartLabels, PlotStyle, SeriesValues};

const KDE_GRID: usize = 200;

/// Side-by-side histogram over shared equal-width bins. Each group is
/// normalised on its own, so bar heights are the fraction of that group's
/// values falling in the bin.
#[derive(Debug, Clone)]
pub struct DodgedHistogram {
    pub edges: Vec<f64>,
    /// One row per group, one proportion per bin.
    pub proportions: Vec<(String, Vec<f64>)>,
    /// Density overlay per group, empty when the group has fewer than two
    /// distinct values.
    pub curves: Vec<Vec<(f64, f64)>>,
}

/// Gaussian kernel density with Scott's bandwidth, evaluated over the data
/// range and scaled by `bin_width` so it lines up with per-bin proportions.
pub fn kde_curve(values: &[f64], bin_width: f64, grid_size: usize) -> Vec<(f64, f64)> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let n = finite.len();
    if n < 2 || grid_size < 2 {
        return Vec::new();
    }

    let mean = finite.iter().sum::<f64>() / n as f64;
    let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let bandwidth = variance.sqrt() * (n as f64).powf(-0.2);
    if bandwidth <= 0.0 || !bandwidth.is_finite() {
        return Vec::new();
    }

    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let scale = bin_width / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let step = (hi - lo) / (grid_size - 1) as f64;

    (0..grid_size)
        .map(|i| {
            let x = lo + step * i as f64;
            let density: f64 = finite
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum();
            (x, density * scale)
        })
        .collect()
}

impl DodgedHistogram {
    pub fn from_groups(groups: &[SeriesValues], bin_count: usize) -> Option<Self> {
        let bin_count = bin_count.max(1);
        let finite = || groups.iter().flat_map(|g| g.values.iter().copied()).filter(|v| v.is_finite());

        let min = finite().fold(f64::INFINITY, f64::min);
        let max = finite().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        let (min, max) = if max - min <= f64::EPSILON {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };
        let width = (max - min) / bin_count as f64;
        let edges: Vec<f64> = (0..=bin_count).map(|i| min + i as f64 * width).collect();

        let curves = groups
            .iter()
            .map(|group| kde_curve(&group.values, width, KDE_GRID))
            .collect();

        let proportions = groups
            .iter()
            .map(|group| {
                let mut bins = vec![0usize; bin_count];
                let mut total = 0usize;
                for &v in group.values.iter().filter(|v| v.is_finite()) {
                    // the last bin is closed on the right
                    let idx = (((v - min) / width).floor() as usize).min(bin_count - 1);
                    bins[idx] += 1;
                    total += 1;
                }
                let props = bins
                    .into_iter()
                    .map(|c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
                    .collect();
                (group.label.clone(), props)
            })
            .collect();

        Some(Self {
            edges,
            proportions,
            curves,
        })
    }

    pub fn max_proportion(&self) -> f64 {
        self.proportions
            .iter()
            .flat_map(|(_, p)| p.iter().copied())
            .fold(0.0, f64::max)
    }

    /// Tallest bar or density point, for the y axis.
    pub fn max_height(&self) -> f64 {
        self.curves
            .iter()
            .flat_map(|c| c.iter().map(|&(_, y)| y))
            .fold(self.max_proportion(), f64::max)
    }
}

/// Draws the dodged histogram with a density line per group. Returns `false`
/// without writing anything when no group has a finite value.
pub fn draw_histogram(
    output_path: &Path,
    groups: &[SeriesValues],
    labels: &ChartLabels,
    style: &PlotStyle,
) -> Result<bool> {
    let Some(hist) = DodgedHistogram::from_groups(groups, style.histogram_bins) else {
        warn!("No finite values for {}, skipping plot", output_path.display());
        return Ok(false);
    };
    ensure_parent_dir(output_path)?;

    let x_min = hist.edges[0];
    let x_max = hist.edges[hist.edges.len() - 1];
    let y_max = (hist.max_height() * 1.1).max(f64::EPSILON);
    let bin_width = hist.edges[1] - hist.edges[0];
    let group_count = hist.proportions.len().max(1);

    let root = BitMapBackend::new(output_path, style.size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&labels.title, style.caption_font)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(labels.x_desc.as_str())
        .y_desc(labels.y_desc.as_str())
        .axis_desc_style(style.axis_font)
        .label_style(style.label_font)
        .draw()
        .map_err(plot_err)?;

    // legend title as an entry without a glyph
    chart
        .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())
        .map_err(plot_err)?
        .label(labels.legend_title.as_str())
        .legend(|(x, y)| Rectangle::new([(x, y), (x, y)], WHITE.mix(0.0).filled()));

    let edges = &hist.edges;
    for (g, (label, props)) in hist.proportions.iter().enumerate() {
        let colour = colour_for_index(g);
        let bars = props.iter().enumerate().map(move |(i, &p)| {
            let x0 = edges[i] + bin_width * g as f64 / group_count as f64;
            let x1 = x0 + bin_width / group_count as f64;
            Rectangle::new([(x0, 0.0), (x1, p)], colour.mix(0.85).filled())
        });
        chart
            .draw_series(bars)
            .map_err(plot_err)?
            .label(label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], colour.filled()));
    }

    for (g, curve) in hist.curves.iter().enumerate() {
        if curve.is_empty() {
            continue;
        }
        let colour = colour_for_index(g);
        chart
            .draw_series(LineSeries::new(curve.iter().copied(), colour.stroke_width(style.line_width)))
            .map_err(plot_err)?;
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
    info!("Histogram saved to {}", output_path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(label: &str, values: &[f64]) -> SeriesValues {
        SeriesValues {
            label: label.to_string(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn proportions_are_normalised_per_group() {
        let groups = vec![
            values("a", &[0.0, 0.0, 1.0, 1.0]),
            values("b", &[1.0]),
        ];
        let hist = DodgedHistogram::from_groups(&groups, 2).unwrap();

        assert_eq!(hist.edges, vec![0.0, 0.5, 1.0]);
        assert_eq!(hist.proportions[0], ("a".to_string(), vec![0.5, 0.5]));
        assert_eq!(hist.proportions[1], ("b".to_string(), vec![0.0, 1.0]));
        assert_eq!(hist.max_proportion(), 1.0);
    }

    #[test]
    fn constant_values_get_a_unit_wide_range() {
        let hist = DodgedHistogram::from_groups(&[values("a", &[3.0, 3.0])], 4).unwrap();
        assert_eq!(hist.edges.first(), Some(&2.5));
        assert_eq!(hist.edges.last(), Some(&3.5));
        let total: f64 = hist.proportions[0].1.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn density_peaks_at_the_centre_and_scales_with_bin_width() {
        let values = [-1.0, 0.0, 1.0];
        let curve = kde_curve(&values, 1.0, 3);
        assert_eq!(curve.iter().map(|p| p.0).collect::<Vec<_>>(), vec![-1.0, 0.0, 1.0]);
        assert!(curve[1].1 > curve[0].1);
        assert!((curve[0].1 - curve[2].1).abs() < 1e-12);

        // Scott's bandwidth for unit sample deviation and n = 3
        let bw = 3f64.powf(-0.2);
        let centre = (1.0 + 2.0 * (-0.5 / (bw * bw)).exp()) / (3.0 * bw * (2.0 * std::f64::consts::PI).sqrt());
        assert!((curve[1].1 - centre).abs() < 1e-12);

        let doubled = kde_curve(&values, 2.0, 3);
        assert!((doubled[1].1 - 2.0 * curve[1].1).abs() < 1e-12);
    }

    #[test]
    fn density_needs_spread() {
        assert!(kde_curve(&[1.0], 0.1, 50).is_empty());
        assert!(kde_curve(&[2.0, 2.0, 2.0], 0.1, 50).is_empty());
    }

    #[test]
    fn histogram_height_covers_density_overlay() {
        let hist = DodgedHistogram::from_groups(&[values("a", &[0.0, 0.1, 0.2, 5.0])], 2).unwrap();
        assert_eq!(hist.curves.len(), 1);
        assert_eq!(hist.curves[0].len(), KDE_GRID);
        assert!(hist.max_height() >= hist.max_proportion());
    }

    #[test]
    fn empty_groups_produce_no_histogram() {
        assert!(DodgedHistogram::from_groups(&[values("a", &[])], 10).is_none());
        assert!(DodgedHistogram::from_groups(&[values("a", &[f64::NAN])], 10).is_none());
    }

    #[test]
    fn empty_group_next_to_full_group_is_all_zero() {
        let hist = DodgedHistogram::from_groups(&[values("a", &[0.1, 0.9]), values("b", &[])], 3).unwrap();
        assert!(hist.proportions[1].1.iter().all(|&p| p == 0.0));
    }
}
