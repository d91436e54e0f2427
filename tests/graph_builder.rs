// tests/graph_builder.rs

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use sdmflow::dag::{BuildOptions, GraphBuilder, count_rule_blocks};
use sdmflow::errors::SdmflowError;
use sdmflow::fs::mock::MockFileSystem;
use sdmflow::job::{Job, Rule};
use sdmflow_test_utils::init_tracing;
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn Error>>;

fn mock_builder(owner: &str) -> (GraphBuilder, MockFileSystem) {
    let fs = MockFileSystem::new();
    let builder = GraphBuilder::with_filesystem(owner, Arc::new(fs.clone()));
    (builder, fs)
}

#[test]
fn duplicate_rule_is_a_no_op() -> TestResult {
    init_tracing();
    let (mut builder, _fs) = mock_builder("kubi");

    let r1 = Rule::new("make a", ["a.txt"]);
    let r2 = Rule::new("make b", ["b.txt"]).with_dependencies(["a.txt"]);
    let r1_again = Rule::new("make a", ["a.txt"]);

    assert!(builder.add_rule(r1)?);
    assert!(builder.add_rule(r2)?);
    assert!(!builder.add_rule(r1_again.clone())?);
    assert!(!builder.add_rule(r1_again)?);

    let doc = String::from_utf8(builder.serialize()?)?;
    assert_eq!(count_rule_blocks(&doc), 2);
    assert_eq!(builder.sorted_targets(), vec!["a.txt", "b.txt"]);
    assert_eq!(builder.rules().len(), 2);
    Ok(())
}

#[test]
fn partially_new_rule_keeps_full_target_list() -> TestResult {
    let (mut builder, _fs) = mock_builder("kubi");

    builder.add_rule(Rule::new("make a", ["a.txt"]))?;
    let added = builder.add_rule(Rule::new("make ab", ["a.txt", "b.txt"]))?;

    assert!(added);
    assert_eq!(builder.rules()[1].targets, vec!["a.txt", "b.txt"]);
    assert_eq!(builder.targets().len(), 2);
    Ok(())
}

#[test]
fn rule_without_targets_is_skipped() -> TestResult {
    let (mut builder, _fs) = mock_builder("kubi");

    assert!(!builder.add_rule(Rule::new("echo hi", Vec::<String>::new()))?);
    assert!(builder.is_empty());
    Ok(())
}

#[test]
fn empty_builder_refuses_to_serialize() {
    let (builder, _fs) = mock_builder("kubi");

    match builder.serialize() {
        Err(SdmflowError::EmptyDocument) => {}
        other => panic!("expected EmptyDocument, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn document_format_headers_comments_and_local_prefix() -> TestResult {
    let (mut builder, _fs) = mock_builder("kubi");
    builder.add_header("PYTHON", "/usr/bin/python3")?;
    builder.add_header("WORKSPACE", "/data/ws")?;

    builder.add_job(
        &Job::new(["$PYTHON", "occ.py"], ["pts.csv"], ["occ.json"], Vec::<String>::new())
            .with_comment("Occurrence set 3"),
    )?;
    builder.add_local_job(&Job::new(
        ["sdmflow", "touch", "done"],
        Vec::<String>::new(),
        ["done"],
        Vec::<String>::new(),
    ))?;

    let doc = String::from_utf8(builder.serialize()?)?;
    let expected = "\
PYTHON=/usr/bin/python3
WORKSPACE=/data/ws
# Occurrence set 3
occ.json: pts.csv
\t$PYTHON occ.py
#
done:
\tLOCAL sdmflow touch done
";
    assert_eq!(doc, expected);
    Ok(())
}

#[test]
fn header_with_line_break_is_rejected() -> TestResult {
    let (mut builder, _fs) = mock_builder("kubi");

    match builder.add_header("PYTHON", "/usr/bin/python3\n# injected\nx: y") {
        Err(SdmflowError::InvalidHeader { key, reason }) => {
            assert_eq!(key, "PYTHON");
            assert!(reason.contains("line break"));
        }
        other => panic!("expected InvalidHeader, got {:?}", other),
    }
    assert!(builder.add_header("BAD KEY", "x").is_err());
    assert!(builder.add_header("A=B", "x").is_err());
    assert!(builder.headers().is_empty());

    builder.add_header("WORKSPACE", "/data/ws")?;
    builder.add_rule(Rule::new("x", ["x.out"]))?;
    let doc = String::from_utf8(builder.serialize()?)?;
    assert_eq!(count_rule_blocks(&doc), 1);
    assert_eq!(doc.lines().count(), 4);
    Ok(())
}

#[test]
fn multi_line_comment_stays_on_one_line() -> TestResult {
    let (mut builder, _fs) = mock_builder("kubi");
    builder.add_rule(Rule::new("x", ["x.out"]).with_comment("first\nsecond"))?;

    let doc = String::from_utf8(builder.serialize()?)?;
    assert!(doc.starts_with("# first second\n"));
    assert_eq!(count_rule_blocks(&doc), 1);
    Ok(())
}

#[test]
fn missing_required_input_aborts_with_job_and_path() {
    let (mut builder, fs) = mock_builder("kubi");
    fs.add_file("layers/bio1.tif", "II*\0");

    let ok = Job::new(["a"], Vec::<String>::new(), ["a.out"], ["layers/bio1.tif"]);
    let bad = Job::new(["b"], Vec::<String>::new(), ["b.out"], ["layers/bio2.tif"])
        .with_comment("Project model 4");

    assert!(builder.add_job(&ok).is_ok());
    match builder.add_job(&bad) {
        Err(SdmflowError::MissingRequiredInput { job, input }) => {
            assert_eq!(job, "Project model 4");
            assert_eq!(input, "layers/bio2.tif");
        }
        other => panic!("expected MissingRequiredInput, got {:?}", other),
    }
    // The failing rule left no trace.
    assert_eq!(builder.rules().len(), 1);
    assert!(!builder.targets().contains("b.out"));
}

#[test]
fn required_inputs_of_skipped_rules_are_not_checked() -> TestResult {
    let (mut builder, _fs) = mock_builder("kubi");

    builder.add_rule(Rule::new("a", ["a.out"]))?;
    let dup = Job::new(["a"], Vec::<String>::new(), ["a.out"], ["nowhere.txt"]);

    assert!(!builder.add_job(&dup)?);
    Ok(())
}

#[test]
fn required_inputs_resolve_against_base_dir() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/runs/42/pts.csv", "x,y\n1,2\n");

    let mut builder = GraphBuilder::with_filesystem("kubi", Arc::new(fs)).with_options(BuildOptions {
        base_dir: Some(PathBuf::from("/runs/42")),
        skip_absolute_dependencies: false,
    });

    let j = Job::new(["occ"], Vec::<String>::new(), ["occ.json"], ["pts.csv"]);
    assert!(builder.add_job(&j)?);
    Ok(())
}

#[test]
fn absolute_dependencies_can_be_skipped() -> TestResult {
    let (builder, _fs) = mock_builder("kubi");
    let mut builder = builder.with_options(BuildOptions {
        base_dir: None,
        skip_absolute_dependencies: true,
    });

    builder.add_rule(
        Rule::new("proj", ["map.tif"]).with_dependencies(["/shared/layers/bio1.tif", "model.json"]),
    )?;

    assert_eq!(builder.rules()[0].dependencies, vec!["model.json".to_string()]);
    Ok(())
}

#[test]
fn add_rules_counts_only_appended() -> TestResult {
    let (mut builder, _fs) = mock_builder("kubi");

    let added = builder.add_rules(vec![
        Rule::new("a", ["a"]),
        Rule::new("a", ["a"]),
        Rule::new("b", ["b"]).with_dependencies(["a"]),
    ])?;
    assert_eq!(added, 2);
    Ok(())
}

#[test]
fn write_to_creates_the_document_on_disk() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("out").join("kubi.mf");

    let mut builder = GraphBuilder::new("kubi");
    builder.add_rule(Rule::new("make a", ["a.txt"]))?;
    builder.write_to(&path)?;

    let text = std::fs::read_to_string(&path)?;
    assert_eq!(text, "#\na.txt:\n\tmake a\n");
    Ok(())
}
