use polars::prelude::*;

use crate::errors::Result;
use crate::helper_functions::require_columns;
use crate::plots::{SeriesPoints, SeriesValues};

fn float_column(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    Ok(df.column(name)?.cast(&DataType::Float64)?.f64()?.clone())
}

/// Splits `(x, y)` pairs by the string column `group_col`, in order of first
/// appearance. Rows with a null in any of the three columns are skipped.
pub fn group_points(df: &DataFrame, group_col: &str, x_col: &str, y_col: &str) -> Result<Vec<SeriesPoints>> {
    require_columns(df, "plot table", &[group_col, x_col, y_col])?;

    let groups = df.column(group_col)?.cast(&DataType::String)?;
    let groups = groups.str()?;
    let xs = float_column(df, x_col)?;
    let ys = float_column(df, y_col)?;

    let mut out: Vec<SeriesPoints> = Vec::new();
    for ((group, x), y) in groups.into_iter().zip(xs.into_iter()).zip(ys.into_iter()) {
        let (Some(group), Some(x), Some(y)) = (group, x, y) else {
            continue;
        };
        match out.iter_mut().find(|s| s.label == group) {
            Some(series) => series.points.push((x, y)),
            None => out.push(SeriesPoints {
                label: group.to_string(),
                points: vec![(x, y)],
            }),
        }
    }
    Ok(out)
}

/// Splits the values of `value_col` by `group_col`, in order of first appearance.
pub fn group_values(df: &DataFrame, group_col: &str, value_col: &str) -> Result<Vec<SeriesValues>> {
    require_columns(df, "plot table", &[group_col, value_col])?;

    let groups = df.column(group_col)?.cast(&DataType::String)?;
    let groups = groups.str()?;
    let values = float_column(df, value_col)?;

    let mut out: Vec<SeriesValues> = Vec::new();
    for (group, value) in groups.into_iter().zip(values.into_iter()) {
        let (Some(group), Some(value)) = (group, value) else {
            continue;
        };
        match out.iter_mut().find(|s| s.label == group) {
            Some(series) => series.values.push(value),
            None => out.push(SeriesValues {
                label: group.to_string(),
                values: vec![value],
            }),
        }
    }
    Ok(out)
}
