use revplot::plot::{self, PlotRequest};
use revplot::source::{ContentSource, GitSource};
use revplot::template::TemplateStore;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn init() {
    let _ = pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

fn commit(dir: &Path, message: &str) {
    git(dir, &["add", "."]);
    git(
        dir,
        &[
            "-c",
            "user.name=test",
            "-c",
            "user.email=test@example.com",
            "commit",
            "-m",
            message,
        ],
    );
}

#[test]
fn git_source_distinguishes_missing_files() {
    init();
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("metric.csv"), "1\n2\n").unwrap();
    git(dir.path(), &["init", "-q"]);
    commit(dir.path(), "v1");

    let source = GitSource::new(dir.path());
    assert_eq!(source.resolve("metric.csv", "HEAD").unwrap(), "1\n2\n");
    assert_eq!(source.resolve("metric.csv", "workspace").unwrap(), "1\n2\n");
    assert!(source.resolve("absent.csv", "HEAD").is_err());
    assert!(source.resolve("absent.csv", "workspace").is_err());
    assert!(!source.is_modified().unwrap());

    fs::write(dir.path().join("metric.csv"), "1\n2\n3\n").unwrap();
    assert!(source.is_modified().unwrap());
}

#[test]
fn diff_against_head_with_default_template() {
    init();
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("metric.csv"), "a,b\n1,10\n2,20\n").unwrap();
    git(dir.path(), &["init", "-q"]);
    commit(dir.path(), "v1");
    fs::write(dir.path().join("metric.csv"), "a,b\n1,15\n2,25\n").unwrap();

    let source = GitSource::new(dir.path());
    let store = TemplateStore::new(dir.path().join(".revplot/templates"));
    let request = PlotRequest {
        datafile: Some("metric.csv".to_owned()),
        revisions: vec!["HEAD".to_owned()],
        ..PlotRequest::default()
    };
    let filled = plot::plot(&source, &store, &request).unwrap();
    assert_eq!(
        filled["data"]["values"],
        json!([
            {"x": 0, "y": "10", "rev": "HEAD"},
            {"x": 1, "y": "20", "rev": "HEAD"},
            {"x": 0, "y": "15", "rev": "workspace"},
            {"x": 1, "y": "25", "rev": "workspace"}
        ])
    );
    assert_eq!(
        filled["$schema"],
        json!("https://vega.github.io/schema/vega-lite/v4.json")
    );
}

#[test]
fn missing_revision_keeps_partial_result() {
    init();
    let dir = tempdir().unwrap();
    git(dir.path(), &["init", "-q"]);
    fs::write(dir.path().join("other.txt"), "x").unwrap();
    commit(dir.path(), "before metric exists");
    git(dir.path(), &["tag", "v1"]);
    fs::write(dir.path().join("metric.csv"), "a,b\n1,10\n").unwrap();
    commit(dir.path(), "add metric");
    git(dir.path(), &["tag", "v2"]);

    let source = GitSource::new(dir.path());
    let store = TemplateStore::new(dir.path().join(".revplot/templates"));
    let request = PlotRequest {
        datafile: Some("metric.csv".to_owned()),
        revisions: vec!["v1".to_owned(), "v2".to_owned()],
        ..PlotRequest::default()
    };
    let filled = plot::plot(&source, &store, &request).unwrap();
    assert_eq!(
        filled["data"]["values"],
        json!([{"x": 0, "y": "10", "rev": "v2"}])
    );
}

#[test]
fn filter_and_custom_template_from_store() {
    init();
    let dir = tempdir().unwrap();
    git(dir.path(), &["init", "-q"]);
    fs::write(
        dir.path().join("metric.json"),
        r#"[{"step": 1, "loss": 0.5, "noise": 9}, {"step": 2, "loss": 0.4, "noise": 8}]"#,
    )
    .unwrap();

    let templates = dir.path().join(".revplot/templates");
    fs::create_dir_all(&templates).unwrap();
    fs::write(
        templates.join("scatter.json"),
        r#"{"mark": "point", "data": {"values": "<METRIC_DATA::metric.json>"}}"#,
    )
    .unwrap();
    commit(dir.path(), "v1");

    let source = GitSource::new(dir.path());
    let store = TemplateStore::new(&templates);
    let request = PlotRequest {
        template: Some("scatter.json".to_owned()),
        fields: Some(["step", "loss"].iter().map(|f| f.to_string()).collect()),
        ..PlotRequest::default()
    };
    let filled = plot::plot(&source, &store, &request).unwrap();
    assert_eq!(filled["mark"], json!("point"));
    assert_eq!(
        filled["data"]["values"],
        json!([
            {"step": 1, "loss": 0.5, "rev": "workspace"},
            {"step": 2, "loss": 0.4, "rev": "workspace"}
        ])
    );
}
