// tests/job_compose.rs

use std::error::Error;

use sdmflow::errors::SdmflowError;
use sdmflow::job::{Invocation, Job, Render, Toolbox, chain, wrap};
use sdmflow_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn job(cmd: &[&str], inputs: &[&str], outputs: &[&str]) -> Job {
    Job::new(
        cmd.iter().copied(),
        inputs.iter().copied(),
        outputs.iter().copied(),
        Vec::<String>::new(),
    )
}

#[test]
fn inputs_never_include_own_outputs() {
    let j = job(&["sort", "a.txt"], &["a.txt", "b.txt", "a.txt"], &["b.txt"]);

    assert_eq!(j.inputs(), ["a.txt".to_string()]);
    assert_eq!(j.outputs(), ["b.txt".to_string()]);
}

#[test]
fn required_inputs_are_also_inputs() {
    let j = Job::new(["run"], ["x.csv"], ["y.csv"], ["layers/bio1.tif"]);

    assert_eq!(j.required_inputs(), ["layers/bio1.tif".to_string()]);
    assert!(j.inputs().contains(&"layers/bio1.tif".to_string()));
    assert!(j.inputs().contains(&"x.csv".to_string()));
}

#[test]
fn arguments_with_spaces_are_quoted() {
    let j = job(&["echo", "hello world", "$PYTHON"], &[], &["out"]);
    assert_eq!(j.command_line(), "echo 'hello world' $PYTHON");
}

#[test]
fn chain_hides_intermediate_products() -> TestResult {
    init_tracing();

    let a = job(&["fetch", "pts.csv"], &["pts.csv"], &["clean.csv"]);
    let b = job(&["model", "clean.csv"], &["clean.csv", "bio1.tif"], &["model.json"]);

    let c = chain(vec![a, b])?;

    assert_eq!(
        c.outputs(),
        ["clean.csv".to_string(), "model.json".to_string()]
    );
    assert_eq!(c.inputs(), ["pts.csv".to_string(), "bio1.tif".to_string()]);
    assert_eq!(
        c.command_line(),
        "fetch pts.csv ; model clean.csv"
    );
    assert!(c.argv().is_none());
    Ok(())
}

#[test]
fn chain_of_one_keeps_the_job_shape() -> TestResult {
    let a = job(&["fetch", "pts.csv"], &["pts.csv"], &["clean.csv"]);
    let c = chain(vec![a.clone()])?;

    assert_eq!(c.inputs(), a.inputs());
    assert_eq!(c.outputs(), a.outputs());
    assert_eq!(c.command_line(), a.command_line());
    Ok(())
}

#[test]
fn empty_chain_is_rejected() {
    match chain(Vec::new()) {
        Err(SdmflowError::EmptyChain) => {}
        other => panic!("expected EmptyChain, got {:?}", other),
    }
}

#[test]
fn chain_drops_required_inputs_produced_inside() -> TestResult {
    let a = job(&["prep"], &[], &["grid.asc"]);
    let b = Job::new(["project", "grid.asc"], Vec::<String>::new(), ["map.tif"], ["grid.asc"]);

    let c = chain(vec![a, b])?;
    assert!(c.required_inputs().is_empty());
    assert!(c.inputs().is_empty());
    Ok(())
}

#[test]
fn wrap_appends_touch_of_outputs() {
    let toolbox = Toolbox::new("sdmflow");
    let inner = job(&["maxent", "in.csv"], &["in.csv"], &["lambdas", "proj.asc"])
        .with_comment("Model 7");

    let wrapped = wrap(inner, vec!["env/layers.txt".to_string()], &toolbox);

    assert_eq!(wrapped.outputs(), ["lambdas".to_string(), "proj.asc".to_string()]);
    assert_eq!(wrapped.comment(), Some("Model 7"));
    assert_eq!(wrapped.required_inputs(), ["env/layers.txt".to_string()]);
    assert_eq!(
        wrapped.command_line(),
        "maxent in.csv ; sdmflow touch lambdas proj.asc"
    );

    match wrapped.invocation() {
        Invocation::Sequence(steps) => assert_eq!(steps.len(), 2),
        other => panic!("expected a sequence, got {:?}", other),
    }
}

#[test]
fn render_maps_outputs_to_targets() {
    let j = job(&["a"], &["in"], &["out"]).with_comment("step a");
    let rule = j.render();

    assert_eq!(rule.targets, vec!["out".to_string()]);
    assert_eq!(rule.dependencies, vec!["in".to_string()]);
    assert_eq!(rule.command_line(), "a");
    assert!(!rule.is_local());

    let local = j.as_local_rule();
    assert!(local.is_local());
    assert_eq!(local.command_line(), "LOCAL a");
}

#[test]
fn toolbox_triage_and_batch_steps() {
    let toolbox = Toolbox::new("/opt/bin/sdmflow");

    let triage = toolbox.triage("candidates.txt", "present.txt");
    assert_eq!(
        triage.command_line(),
        "/opt/bin/sdmflow triage candidates.txt present.txt"
    );
    assert_eq!(triage.inputs(), ["candidates.txt".to_string()]);
    assert_eq!(triage.outputs(), ["present.txt".to_string()]);

    let batch = toolbox.stockpile_batch("manifest.json", "batch.success", "reg");
    assert_eq!(
        batch.command_line(),
        "/opt/bin/sdmflow stockpile-batch --registry reg manifest.json batch.success"
    );
    assert_eq!(batch.outputs(), ["batch.success".to_string()]);
}
