use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use methcompare::analysis::sample_probs::{run_sample_probs_comparison, SampleProbsConfig, DEFAULT_TITLE};
use methcompare::cli::DependentVariable;
use methcompare::errors::MethCompareError;
use methcompare::plots::PlotStyle;

const HEADER: &str = "code\tprimary_base\trange_start\trange_end\tcount\tfrac\tpercentile_rank\n";

fn probabilities(dir: &Path, name: &str, scale: u32) -> PathBuf {
    let mut content = String::from(HEADER);
    for (i, start) in [0.5, 0.6, 0.7, 0.8, 0.9].iter().enumerate() {
        let n = (i as u32 + 1) * scale;
        content.push_str(&format!("-\tC\t{start}\t{}\t{}\t0.2\t{}\n", start + 0.1, n * 3, i * 20));
        content.push_str(&format!("m\tC\t{start}\t{}\t{}\t0.2\t{}\n", start + 0.1, n, i * 20));
        // no hydroxymethylation calls at all
        content.push_str(&format!("h\tC\t{start}\t{}\t0\t0.0\t{}\n", start + 0.1, i * 20));
    }
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn config(dir: &Path, variable: DependentVariable) -> SampleProbsConfig {
    SampleProbsConfig {
        inputs: vec![probabilities(dir, "dorado.tsv", 10), probabilities(dir, "guppy.tsv", 7)],
        names: vec!["dorado".to_string(), "guppy".to_string()],
        output_prefix: dir.join("plots").join("ml").display().to_string(),
        plot_title: DEFAULT_TITLE.to_string(),
        dependent_variable: variable,
        min_ml: None,
        max_ml: Some(1.0),
        style: PlotStyle::default(),
    }
}

fn file_names(paths: &[PathBuf]) -> BTreeSet<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn counts_skip_combos_without_positive_counts() {
    let dir = tempfile::tempdir().unwrap();
    let written = run_sample_probs_comparison(&config(dir.path(), DependentVariable::Counts)).unwrap();

    let expected: BTreeSet<String> = ["ml_C_ML_lineplot.png", "ml_5mC_ML_lineplot.png"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(file_names(&written), expected);
    for path in &written {
        assert!(path.exists());
    }
    assert!(!dir.path().join("plots").join("ml_5hmC_ML_lineplot.png").exists());
}

#[test]
fn fractions_draw_every_combo() {
    let dir = tempfile::tempdir().unwrap();
    let written = run_sample_probs_comparison(&config(dir.path(), DependentVariable::Fractions)).unwrap();

    let expected: BTreeSet<String> = ["ml_C_ML_lineplot.png", "ml_5mC_ML_lineplot.png", "ml_5hmC_ML_lineplot.png"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(file_names(&written), expected);
    assert!(written.iter().all(|p| p.exists()));
}

#[test]
fn mismatched_names_stop_before_plotting() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), DependentVariable::Counts);
    config.names.pop();

    let err = run_sample_probs_comparison(&config).unwrap_err();
    assert!(matches!(err, MethCompareError::CountMismatch(_)));
    assert!(!dir.path().join("plots").exists());
}
