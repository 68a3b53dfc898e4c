mod common;

use std::fs;

use commap_core::config::MissingFlowPolicy;
use commap_core::ranking::ActivityRanking;
use commap_detect::{DetectError, DetectOptions, ToolFailure, detect, report_from_tree};
use common::{RecordingRunner, corpus};

fn sample_corpus() -> commap_core::Corpus {
    corpus(&[
        ("a@x.com", "b@x.com"),
        ("a@x.com", "b@x.com"),
        ("b@x.com", "c@x.com"),
        ("c@x.com", "a@x.com"),
        ("d@x.com", "a@x.com"),
    ])
}

fn csv_lines(path: &std::path::Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("read csv")
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn detect_writes_network_runs_tool_and_reports() {
    let dir = tempfile::tempdir().expect("tempdir");
    let corpus = sample_corpus();
    let runner = RecordingRunner::single_module();
    let mut opts = DetectOptions::new(dir.path());
    opts.top_n = 3;
    opts.flags = vec!["--tree".to_string(), "--map".to_string()];

    let outcome = detect(&corpus, &ActivityRanking::default(), &runner, &opts).expect("detect");

    assert_eq!(outcome.top_authors, 3);
    assert_eq!(outcome.nodes, 3, "d is outside the top set");
    assert_eq!(outcome.edges, 3);
    assert_eq!(outcome.network, dir.path().join("author_graph.net"));
    assert_eq!(outcome.tree, dir.path().join("output").join("author_graph.tree"));
    assert_eq!(outcome.tree, opts.tree_path());
    assert_eq!(outcome.rows, 3);
    assert_eq!(outcome.missing_flow, 0);

    let calls = runner.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].flags, opts.flags);
    assert_eq!(calls[0].graph.edge_weight("a@x.com", "b@x.com"), Some(0.5));

    let lines = csv_lines(&outcome.report);
    assert_eq!(
        lines[0],
        "Email Address,Author Score,In-Degree,Out-Degree,Clustering Coeff,Module Flow"
    );
    assert!(lines[1].starts_with("a@x.com,6,"), "{}", lines[1]);
    for line in &lines[1..] {
        assert_eq!(line.split(',').count(), 6, "{line}");
        assert!(line.ends_with(",0.1"), "{line}");
    }
}

#[test]
fn isolated_top_author_gets_an_empty_flow_by_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let corpus = corpus(&[
        ("a@x.com", "b@x.com"),
        ("b@x.com", "a@x.com"),
        ("a@x.com", "b@x.com"),
        ("b@x.com", "a@x.com"),
        ("c@x.com", "z@x.com"),
    ]);
    let runner = RecordingRunner::single_module();
    let mut opts = DetectOptions::new(dir.path());
    opts.top_n = 3;
    assert_eq!(opts.missing_flow, MissingFlowPolicy::Error);

    let outcome = detect(&corpus, &ActivityRanking::default(), &runner, &opts)
        .expect("c has no edge inside the top set and never reaches the tool");

    assert_eq!(outcome.top_authors, 3);
    assert_eq!(outcome.nodes, 2);
    assert_eq!(outcome.rows, 3);
    assert_eq!(outcome.missing_flow, 1);
    let authors: Vec<String> = runner.calls.borrow()[0].graph.authors().map(str::to_string).collect();
    assert!(!authors.contains(&"c@x.com".to_string()));

    let lines = csv_lines(&outcome.report);
    assert_eq!(lines.last().map(String::as_str), Some("c@x.com,2,0,0,0,"));
}

#[test]
fn tool_failure_leaves_no_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let corpus = sample_corpus();
    let runner = RecordingRunner::failing(3);
    let opts = DetectOptions::new(dir.path());

    let err = detect(&corpus, &ActivityRanking::default(), &runner, &opts).expect_err("exit 3");
    match err {
        DetectError::ExternalTool(e) => {
            assert!(e.module.is_root());
            assert!(matches!(e.kind, ToolFailure::ExitStatus(Some(3))));
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(!opts.report_path().exists());
}

#[test]
fn report_from_existing_tree_honours_missing_flow_policy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let corpus = sample_corpus();
    let tree = dir.path().join("author_graph.tree");
    fs::write(&tree, "1:1 0.6 \"a@x.com\"\n1:2 0.4 \"b@x.com\"\n").expect("tree");

    let mut opts = DetectOptions::new(dir.path());
    opts.top_n = 3;
    let err = report_from_tree(&corpus, &ActivityRanking::default(), &tree, &opts)
        .expect_err("c has no flow");
    assert!(matches!(err, DetectError::MissingData(ref gaps) if gaps.missing_from_tree == ["c@x.com"]));
    assert!(!opts.report_path().exists(), "nothing written on failure");

    opts.missing_flow = MissingFlowPolicy::Null;
    let outcome =
        report_from_tree(&corpus, &ActivityRanking::default(), &tree, &opts).expect("null policy");
    assert_eq!(outcome.missing_flow, 1);
    let lines = csv_lines(&outcome.report);
    let c_row = lines.iter().find(|l| l.starts_with("c@x.com,")).expect("c row");
    assert!(c_row.ends_with(','), "{c_row}");
    assert_eq!(c_row.split(',').count(), 6);
}

#[test]
fn custom_report_path_is_respected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let corpus = sample_corpus();
    let runner = RecordingRunner::single_module();
    let mut opts = DetectOptions::new(dir.path().join("work"));
    opts.report_path = Some(dir.path().join("out/report.csv"));
    opts.missing_flow = MissingFlowPolicy::Null;

    let outcome = detect(&corpus, &ActivityRanking::default(), &runner, &opts).expect("detect");
    assert_eq!(outcome.report, dir.path().join("out/report.csv"));
    assert!(outcome.report.is_file());
}
