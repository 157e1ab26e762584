use plotters::style::RGBColor;

pub mod histogram;
pub mod lineplot;
pub mod scatter;

/// One legend entry worth of (x, y) points.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoints {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// One legend entry worth of values for a histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesValues {
    pub label: String,
    pub values: Vec<f64>,
}

/// Text shown on a chart.
#[derive(Debug, Clone)]
pub struct ChartLabels {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub legend_title: String,
}

impl ChartLabels {
    pub fn new(title: &str, x_desc: &str, y_desc: &str, legend_title: &str) -> Self {
        Self {
            title: title.to_string(),
            x_desc: x_desc.to_string(),
            y_desc: y_desc.to_string(),
            legend_title: legend_title.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlotStyle {
    pub size: (u32, u32),
    pub caption_font: (&'static str, u32),
    pub axis_font: (&'static str, u32),
    pub label_font: (&'static str, u32),
    pub point_size: u32,
    pub line_width: u32,
    pub histogram_bins: usize,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            size: (1200, 900),
            caption_font: ("sans-serif bold", 26),
            axis_font: ("sans-serif", 22),
            label_font: ("sans-serif", 18),
            point_size: 3,
            line_width: 2,
            histogram_bins: 30,
        }
    }
}

/// Categorical palette, cycled by series index.
pub fn colour_for_index(idx: usize) -> RGBColor {
    const PALETTE: [RGBColor; 10] = [
        RGBColor(31, 119, 180),
        RGBColor(255, 127, 14),
        RGBColor(44, 160, 44),
        RGBColor(214, 39, 40),
        RGBColor(148, 103, 189),
        RGBColor(140, 86, 75),
        RGBColor(227, 119, 194),
        RGBColor(127, 127, 127),
        RGBColor(188, 189, 34),
        RGBColor(23, 190, 207),
    ];
    PALETTE[idx % PALETTE.len()]
}

/// Min/max over finite values, padded by `pad` of the span. A degenerate span
/// is widened to one unit so plotters always gets a non-empty range.
pub fn padded_range<I: IntoIterator<Item = f64>>(values: I, pad: f64) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;

    if hi - lo <= f64::EPSILON {
        return Some((lo - 0.5, hi + 0.5));
    }
    let margin = (hi - lo) * pad;
    Some((lo - margin, hi + margin))
}
