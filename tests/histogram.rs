use histplot::{
    data::Value,
    dataset::{Dataset, LoadOptions},
    histogram::{
        HistogramError, HistogramRequest, Weighting, auto_range, compute_histogram, export_csv,
    },
};
use proptest::prelude::*;

mod common;

use common::{MJD_CSV, TestWorkspace};

fn numeric_dataset(samples: &[(f64, f64)]) -> Dataset {
    let mut dataset = Dataset::new();
    for (value, weight) in samples {
        dataset.push_record([("x", Value::Number(*value)), ("w", Value::Number(*weight))]);
    }
    dataset
}

#[test]
fn loaded_files_produce_the_documented_example() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("mjd.csv", MJD_CSV);
    let dataset = Dataset::load(&[path], &LoadOptions::default());

    let weighted = HistogramRequest::new("mjd", Weighting::Column("mjd_n".into()), 2, (0.0, 20.0));
    let result = compute_histogram(&dataset, &weighted).expect("weighted histogram");
    let triples = result
        .bins
        .iter()
        .map(|b| (b.left, b.right, b.count))
        .collect::<Vec<_>>();
    assert_eq!(triples, vec![(0.0, 10.0, 2.0), (10.0, 20.0, 3.0)]);

    let text = export_csv(&result, "mjd", "mjd_n").expect("export");
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(
        lines,
        vec![
            "\"mjd_left\",\"mjd_right\",\"mjd weighted by mjd_n\"",
            "0.0,10.0,2.0",
            "10.0,20.0,3.0"
        ]
    );

    let unweighted = HistogramRequest::new("mjd", Weighting::Unweighted, 2, (0.0, 20.0));
    let result = compute_histogram(&dataset, &unweighted).expect("unweighted histogram");
    let counts = result.bins.iter().map(|b| b.count).collect::<Vec<_>>();
    assert_eq!(counts, vec![1.0, 1.0]);
}

#[test]
fn concatenated_files_share_one_histogram() {
    let workspace = TestWorkspace::new();
    let a = workspace.write("runs/a.csv", "mjd,mjd_n\n1,1\n");
    let b = workspace.write("runs/b.csv", "mjd_n,mjd\n4,19\n");
    let dataset = Dataset::load(&[a, b], &LoadOptions::default());

    let request = HistogramRequest::new("mjd", Weighting::Column("mjd_n".into()), 2, (0.0, 20.0));
    let result = compute_histogram(&dataset, &request).expect("histogram");
    assert_eq!(result.bins[0].count, 1.0);
    assert_eq!(result.bins[1].count, 4.0);
    assert_eq!(auto_range(&dataset, "mjd"), Ok(Some((1.0, 19.0))));
}

#[test]
fn the_source_tag_is_not_a_numeric_column() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("mjd.csv", MJD_CSV);
    let dataset = Dataset::load(&[path], &LoadOptions::default());
    assert!(dataset.selectable_columns().all(|c| c != "file"));
    let request = HistogramRequest::new("file", Weighting::Unweighted, 2, (0.0, 20.0));
    let result = compute_histogram(&dataset, &request).expect("histogram");
    assert_eq!(result.skipped, 2);
    assert_eq!(result.total(), 0.0);
}

#[test]
fn unknown_column_is_reported() {
    let dataset = numeric_dataset(&[(1.0, 1.0)]);
    let request = HistogramRequest::new("y", Weighting::Unweighted, 3, (0.0, 1.0));
    assert_eq!(
        compute_histogram(&dataset, &request),
        Err(HistogramError::InvalidColumn("y".into()))
    );
}

fn samples() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-2000.0f64..2000.0, 0.0f64..10.0), 0..200)
}

proptest! {
    #[test]
    fn bin_count_matches_request(data in samples(), bins in 1usize..100, lo in -1000.0f64..1000.0, hi in -1000.0f64..1000.0) {
        let dataset = numeric_dataset(&data);
        let request = HistogramRequest::new("x", Weighting::Column("w".into()), bins, (lo, hi));
        let result = compute_histogram(&dataset, &request).unwrap();
        prop_assert_eq!(result.bins.len(), bins);
    }

    #[test]
    fn edges_increase_evenly(bins in 1usize..100, lo in -1000.0f64..1000.0, hi in -1000.0f64..1000.0) {
        let dataset = numeric_dataset(&[]);
        let request = HistogramRequest::new("x", Weighting::Unweighted, bins, (lo, hi));
        let result = compute_histogram(&dataset, &request).unwrap();
        let edges = result.edges();
        let width = (result.range.1 - result.range.0) / bins as f64;
        let tolerance = 1e-9 * (result.range.1 - result.range.0).abs().max(1.0);
        prop_assert!(result.range.0 <= result.range.1);
        for pair in edges.windows(2) {
            prop_assert!(pair[1] > pair[0]);
            prop_assert!(((pair[1] - pair[0]) - width).abs() <= tolerance);
        }
    }

    #[test]
    fn extreme_ranges_never_yield_degenerate_edges(bins in 1usize..64, lo in prop::num::f64::NORMAL, hi in prop::num::f64::NORMAL) {
        let dataset = numeric_dataset(&[]);
        let request = HistogramRequest::new("x", Weighting::Unweighted, bins, (lo, hi));
        match compute_histogram(&dataset, &request) {
            Ok(result) => {
                for pair in result.edges().windows(2) {
                    prop_assert!(pair[0].is_finite() && pair[1].is_finite());
                    prop_assert!(pair[1] > pair[0]);
                }
            }
            Err(err) => prop_assert!(matches!(err, HistogramError::InvalidRange { .. }), "unexpected error: {:?}", err),
        }
    }

    #[test]
    fn counts_sum_to_in_range_weights(data in samples(), bins in 1usize..50, lo in -1000.0f64..1000.0, hi in -1000.0f64..1000.0) {
        let dataset = numeric_dataset(&data);
        let request = HistogramRequest::new("x", Weighting::Column("w".into()), bins, (lo, hi));
        let result = compute_histogram(&dataset, &request).unwrap();
        let (min, max) = result.range;
        let expected: f64 = data
            .iter()
            .filter(|(v, _)| *v >= min && *v <= max)
            .map(|(_, w)| *w)
            .sum();
        prop_assert!((result.total() - expected).abs() <= 1e-9 * expected.max(1.0));
    }

    #[test]
    fn swapped_range_matches_ordered_range(data in samples(), bins in 1usize..50, lo in -1000.0f64..0.0, hi in 0.0f64..1000.0) {
        let dataset = numeric_dataset(&data);
        let ordered = HistogramRequest::new("x", Weighting::Unweighted, bins, (lo, hi));
        let swapped = HistogramRequest::new("x", Weighting::Unweighted, bins, (hi, lo));
        prop_assert_eq!(
            compute_histogram(&dataset, &ordered).unwrap(),
            compute_histogram(&dataset, &swapped).unwrap()
        );
    }
}
