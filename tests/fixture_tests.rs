//! End-to-end fixture tests for roi-linker.
//!
//! Each fixture describes rectangular masks, the configuration to run with
//! and the expected assignments, chains and scores. Costs in the fixtures are
//! exact ratios of pixel counts.
//!
//! Run with: cargo test --release fixture

use approx::assert_abs_diff_eq;
use nalgebra::DMatrix;
use serde::Deserialize;

use roi_linker::{
    distance_masks, find_matches, link_chains, match_masks, DistanceConfig, EvaluationConfig,
    LinkConfig, MaskSet, Matches, PerformanceSummary, Sequential,
};

// ============================================================================
// Fixture JSON Schema
// ============================================================================

/// `[row, col, height, width]`
type Rect = [usize; 4];

#[derive(Debug, Deserialize)]
struct MatchesJson {
    rows: Vec<usize>,
    cols: Vec<usize>,
    costs: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct LinkingFixture {
    shape: (usize, usize),
    distance_config: DistanceConfig,
    fovs: Vec<Vec<Rect>>,
    expected_matches: Vec<MatchesJson>,
    link_cases: Vec<LinkCase>,
}

#[derive(Debug, Deserialize)]
struct LinkCase {
    config: LinkConfig,
    chains: Vec<Vec<usize>>,
}

#[derive(Debug, Deserialize)]
struct EvaluationFixture {
    shape: (usize, usize),
    gt: Vec<Rect>,
    comp: Vec<Rect>,
    expected_matches: MatchesJson,
    cases: Vec<EvaluationCase>,
}

#[derive(Debug, Deserialize)]
struct EvaluationCase {
    config: EvaluationConfig,
    tp_gt: Vec<usize>,
    tp_comp: Vec<usize>,
    fn_gt: Vec<usize>,
    fp_comp: Vec<usize>,
    performance: PerformanceSummary,
}

// ============================================================================
// Fixtures
// ============================================================================

const LINKING_FIXTURE: &str = r#"{
    "shape": [30, 30],
    "distance_config": { "max_dist": 10.0 },
    "fovs": [
        [[2, 2, 4, 4], [15, 15, 5, 5], [2, 20, 3, 3]],
        [[15, 16, 5, 5], [2, 2, 4, 4], [3, 20, 3, 3]],
        [[3, 2, 4, 4], [3, 21, 3, 3]]
    ],
    "expected_matches": [
        { "rows": [0, 1, 2], "cols": [1, 0, 2], "costs": [0.0, 0.3333333333333333, 0.5] },
        { "rows": [1, 2], "cols": [0, 1], "costs": [0.4, 0.5] }
    ],
    "link_cases": [
        { "config": {}, "chains": [[0, 1, 0], [2, 2, 1]] },
        { "config": { "max_cost": 0.45 }, "chains": [[0, 1, 0]] },
        { "config": { "max_cost": 0.45, "min_fov_present": 0 }, "chains": [[0, 1, 0], [1, 0], [2]] }
    ]
}"#;

const EVALUATION_FIXTURE: &str = r#"{
    "shape": [30, 30],
    "gt": [[0, 0, 5, 5], [10, 10, 4, 4], [20, 20, 6, 6], [2, 20, 2, 2]],
    "comp": [[10, 11, 4, 4], [0, 0, 5, 4], [21, 21, 2, 2], [25, 2, 3, 3]],
    "expected_matches": {
        "rows": [0, 1, 2, 3],
        "cols": [1, 0, 2, 3],
        "costs": [0.2, 0.4, 0.8888888888888888, 1.0]
    },
    "cases": [
        {
            "config": {},
            "tp_gt": [0, 1], "tp_comp": [1, 0], "fn_gt": [2, 3], "fp_comp": [2, 3],
            "performance": {
                "recall": 0.5, "precision": 0.5, "accuracy": 0.3333333333333333, "f1_score": 0.5,
                "true_positives": 2, "false_positives": 2, "false_negatives": 2
            }
        },
        {
            "config": { "thresh_cost": 0.3 },
            "tp_gt": [0], "tp_comp": [1], "fn_gt": [1, 2, 3], "fp_comp": [0, 2, 3],
            "performance": {
                "recall": 0.25, "precision": 0.25, "accuracy": 0.14285714285714285, "f1_score": 0.25,
                "true_positives": 1, "false_positives": 3, "false_negatives": 3
            }
        },
        {
            "config": { "thresh_cost": 0.95, "print_assignment": true },
            "tp_gt": [0, 1, 2], "tp_comp": [1, 0, 2], "fn_gt": [3], "fp_comp": [3],
            "performance": {
                "recall": 0.75, "precision": 0.75, "accuracy": 0.6, "f1_score": 0.75,
                "true_positives": 3, "false_positives": 1, "false_negatives": 1
            }
        }
    ]
}"#;

// ============================================================================
// Test Helpers
// ============================================================================

fn build_set(shape: (usize, usize), rects: &[Rect]) -> MaskSet {
    let masks: Vec<DMatrix<bool>> = rects
        .iter()
        .map(|&[r0, c0, h, w]| {
            DMatrix::from_fn(shape.0, shape.1, |r, c| {
                r >= r0 && r < r0 + h && c >= c0 && c < c0 + w
            })
        })
        .collect();
    MaskSet::from_masks(&masks).expect("fixture masks are valid")
}

fn compare_matches(label: &str, expected: &MatchesJson, actual: &Matches) {
    assert_eq!(expected.rows, actual.rows, "{}: rows mismatch", label);
    assert_eq!(expected.cols, actual.cols, "{}: cols mismatch", label);
    assert_eq!(expected.costs.len(), actual.costs.len(), "{}: cost count mismatch", label);
    for (exp, act) in expected.costs.iter().zip(&actual.costs) {
        assert_abs_diff_eq!(*exp, *act, epsilon = 1e-9);
    }
}

fn compare_performance(label: &str, expected: &PerformanceSummary, actual: &PerformanceSummary) {
    assert_eq!(
        (expected.true_positives, expected.false_positives, expected.false_negatives),
        (actual.true_positives, actual.false_positives, actual.false_negatives),
        "{}: count mismatch",
        label
    );
    assert_abs_diff_eq!(expected.recall, actual.recall, epsilon = 1e-9);
    assert_abs_diff_eq!(expected.precision, actual.precision, epsilon = 1e-9);
    assert_abs_diff_eq!(expected.accuracy, actual.accuracy, epsilon = 1e-9);
    assert_abs_diff_eq!(expected.f1_score, actual.f1_score, epsilon = 1e-9);
}

// ============================================================================
// Test Cases
// ============================================================================

#[test]
fn test_fixture_linking() {
    let fixture: LinkingFixture = serde_json::from_str(LINKING_FIXTURE).expect("valid fixture");
    fixture.distance_config.validate().unwrap();

    let sets: Vec<MaskSet> = fixture
        .fovs
        .iter()
        .map(|rects| build_set(fixture.shape, rects))
        .collect();

    let distances = distance_masks(&sets, &fixture.distance_config, &Sequential).unwrap();
    let matches = find_matches(&distances, false).unwrap();
    assert_eq!(matches.len(), fixture.expected_matches.len());
    for (hop, (exp, act)) in fixture.expected_matches.iter().zip(&matches).enumerate() {
        compare_matches(&format!("hop {}", hop), exp, act);
    }

    for (i, case) in fixture.link_cases.iter().enumerate() {
        let chains = link_chains(&matches, &case.config).unwrap();
        assert_eq!(chains.n_fovs(), sets.len());
        assert_eq!(chains.into_inner(), case.chains, "link case {} mismatch", i);
    }
}

#[test]
fn test_fixture_evaluation() {
    let fixture: EvaluationFixture =
        serde_json::from_str(EVALUATION_FIXTURE).expect("valid fixture");
    let gt = build_set(fixture.shape, &fixture.gt);
    let comp = build_set(fixture.shape, &fixture.comp);

    for (i, case) in fixture.cases.iter().enumerate() {
        let label = format!("case {}", i);
        let result = match_masks(&gt, &comp, None, &case.config).unwrap();

        compare_matches(&label, &fixture.expected_matches, &result.matches);
        assert_eq!(result.tp_gt, case.tp_gt, "{}: tp_gt mismatch", label);
        assert_eq!(result.tp_comp, case.tp_comp, "{}: tp_comp mismatch", label);
        assert_eq!(result.fn_gt, case.fn_gt, "{}: fn_gt mismatch", label);
        assert_eq!(result.fp_comp, case.fp_comp, "{}: fp_comp mismatch", label);
        compare_performance(&label, &case.performance, &result.performance);
    }
}

#[test]
fn test_fixture_defaults_fill_missing_fields() {
    let config: EvaluationConfig = serde_json::from_str(r#"{ "thresh_cost": 0.5 }"#).unwrap();
    assert_eq!(config, EvaluationConfig::new(0.5));

    let config: LinkConfig = serde_json::from_str(r#"{ "min_fov_present": 1 }"#).unwrap();
    assert_eq!(config, LinkConfig::default().with_min_fov_present(1));

    let config: DistanceConfig = serde_json::from_str(r#"{ "enclosed_thr": 0.5 }"#).unwrap();
    assert_eq!(config, DistanceConfig::default().with_enclosed_thr(0.5));
}
