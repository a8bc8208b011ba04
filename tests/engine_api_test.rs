//! Integration tests for the public engine API.

use std::sync::Arc;
use std::thread;

use serde_json::{json, Value};
use taskchain::context::{ContextStore, Entity, Partition, PartitionEntry, RunContext, TitleBinding};
use taskchain::runner::{Engine, Processor, RunScope, TaskSpec};
use taskchain::task::{strip_meta, Params, RunMeta, TaskState};
use taskchain::{ErrorKind, Pipeline};

fn echo(params: Params, _: &RunScope<'_>) -> anyhow::Result<Value> {
    Ok(Value::Object(strip_meta(params)))
}

fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

#[test]
fn tasks_return_their_identity_in_order() {
    let engine = Engine::new();
    let t1 = engine.register("1", "1", |_, _| Ok(json!("1"))).unwrap();
    let t2 = engine.register("2", "2", |_, _| Ok(json!("2"))).unwrap();
    let _t3 = engine.register("3", "3", |_, _| Ok(json!("3"))).unwrap();

    let keys = engine
        .run_tasks(
            vec![
                TaskSpec::new(&t1, Params::new()),
                TaskSpec::new(&t2, Params::new()),
            ],
            None,
        )
        .unwrap();

    assert_eq!(keys.len(), 2);
    let results: Vec<Value> = keys
        .iter()
        .map(|k| engine.get_task(k).unwrap().result().cloned().unwrap())
        .collect();
    assert_eq!(results, vec![json!("1"), json!("2")]);
}

#[test]
fn step_lookup_fails_before_and_succeeds_after_run() {
    let engine = Engine::new();
    let t = engine.register("t", "", |_, _| Ok(json!(7))).unwrap();

    let err = engine.get_step(0, "r1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lookup);

    engine
        .run_tasks(vec![TaskSpec::new(&t, Params::new())], Some("r1"))
        .unwrap();

    let instance = engine.get_step(0, "r1").unwrap();
    assert_eq!(instance.state(), TaskState::Executed);
    assert_eq!(instance.result(), Some(&json!(7)));
    assert!(instance.finished_at().is_some());
}

#[test]
fn group_results_match_positional_params() {
    let engine = Engine::new();
    let a = engine.register("first", "", echo).unwrap();
    let b = engine.register("second", "", echo).unwrap();
    engine
        .create_group("g")
        .unwrap()
        .add(&a)
        .unwrap()
        .add(&b)
        .unwrap();

    let keys = engine
        .run_group("g", vec![params(json!({"a": 12})), params(json!({"b": 123}))])
        .unwrap();

    assert_eq!(engine.get_task(&keys[0]).unwrap().result(), Some(&json!({"a": 12})));
    assert_eq!(engine.get_task(&keys[1]).unwrap().result(), Some(&json!({"b": 123})));
}

#[test]
fn task_body_sees_run_meta() {
    let engine = Engine::new();
    let t = engine
        .register("meta", "", |params, scope| {
            let meta = RunMeta::from_params(&params).unwrap();
            assert_eq!(meta.run_id, scope.run_id());
            assert_eq!(meta.current_step, scope.current_step());
            Ok(json!(format!("{}@{}", meta.current_step, meta.run_id)))
        })
        .unwrap();

    engine
        .run_tasks(
            vec![TaskSpec::new(&t, Params::new()), TaskSpec::new(&t, Params::new())],
            Some("m"),
        )
        .unwrap();

    assert_eq!(engine.get_step(1, "m").unwrap().result(), Some(&json!("1@m")));
}

#[test]
fn later_steps_read_earlier_results() {
    let engine = Engine::new();
    let produce = engine.register("produce", "", |_, _| Ok(json!([1, 2, 3]))).unwrap();
    let sum = engine
        .register("sum", "", |_, scope| {
            let earlier = scope.task("0")?;
            let total: i64 = earlier
                .result()
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_i64).sum())
                .unwrap_or(0);
            Ok(json!(total))
        })
        .unwrap();

    engine
        .run_tasks(
            vec![
                TaskSpec::new(&produce, Params::new()),
                TaskSpec::new(&sum, Params::new()),
            ],
            Some("calc"),
        )
        .unwrap();

    assert_eq!(engine.get_task("1.calc").unwrap().result(), Some(&json!(6)));
}

#[test]
fn title_template_resolves_with_run_id() {
    let engine = Engine::new();
    let t = engine
        .register("task_1", "task_1-{fn_task_key}", |_, _| Ok(Value::Null))
        .unwrap();

    engine
        .run_tasks(vec![TaskSpec::new(&t, Params::new())], Some("abc"))
        .unwrap();

    assert_eq!(engine.get_step(0, "abc").unwrap().title(), "task_1-0.abc");
}

#[test]
fn unknown_placeholder_reaches_caller() {
    let engine = Engine::new();
    let t = engine
        .register("t", "{fn_missing}", |_, _| Ok(Value::Null))
        .unwrap();

    let err = engine
        .run_tasks(vec![TaskSpec::new(&t, Params::new())], Some("r"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lookup);
}

#[test]
fn duplicate_group_keeps_original_members() {
    let engine = Engine::new();
    let t = engine.register("t", "", |_, _| Ok(Value::Null)).unwrap();
    engine.create_group("a-group").unwrap().add(&t).unwrap();

    assert_eq!(
        engine.create_group("a-group").unwrap_err().kind(),
        ErrorKind::Duplicate
    );
    assert_eq!(engine.members("a-group").unwrap().len(), 1);
}

#[test]
fn run_context_is_write_once() {
    let store = ContextStore::shared();
    let engine = Engine::with_store(Arc::clone(&store));
    let t = engine.register("t", "", |_, _| Ok(Value::Null)).unwrap();
    engine
        .run_tasks(vec![TaskSpec::new(&t, Params::new())], Some("r"))
        .unwrap();

    let mut run: RunContext = store.run("r").unwrap();
    let instance = run.get("0.r").cloned().unwrap();

    assert_eq!(
        run.set("0.r", instance.clone()).unwrap_err().kind(),
        ErrorKind::Duplicate
    );
    run.remove("0.r");
    run.set("0.r", instance).unwrap();
}

#[test]
fn store_partitions_are_readable() {
    let store = ContextStore::shared();
    store
        .add(Entity::Title(TitleBinding {
            identity: "some_function".into(),
            title: "some_function title".into(),
        }))
        .unwrap();

    match store.get("titles".parse::<Partition>().unwrap(), None).unwrap() {
        PartitionEntry::Titles(titles) => {
            assert_eq!(titles["some_function"], "some_function title")
        }
        other => panic!("unexpected entry {:?}", other),
    }

    assert_eq!(
        "bogus".parse::<Partition>().unwrap_err().kind(),
        ErrorKind::Lookup
    );
}

#[test]
fn reset_discards_everything() {
    let engine = Engine::new();
    let t = engine.register("t", "", |_, _| Ok(Value::Null)).unwrap();
    engine.create_group("g").unwrap().add(&t).unwrap();
    engine.run_group("g", Vec::new()).unwrap();

    engine.reset().unwrap();

    assert_eq!(engine.get_step(0, "g").unwrap_err().kind(), ErrorKind::Lookup);
    assert_eq!(engine.members("g").unwrap_err().kind(), ErrorKind::Lookup);
    assert!(engine.create_group("g").is_ok());
}

#[test]
fn concurrent_runs_with_distinct_ids() {
    let engine = Engine::new();
    let t = engine
        .register("square", "", |params, _| {
            let n = params.get("n").and_then(Value::as_i64).unwrap_or(0);
            Ok(json!(n * n))
        })
        .unwrap();

    thread::scope(|scope| {
        for i in 0..4 {
            let engine = &engine;
            let t = &t;
            scope.spawn(move || {
                engine
                    .run_tasks(
                        vec![TaskSpec::new(t, params(json!({"n": i})))],
                        Some(&format!("run-{}", i)),
                    )
                    .unwrap();
            });
        }
    });

    for i in 0..4i64 {
        let result = engine.get_step(0, &format!("run-{}", i)).unwrap();
        assert_eq!(result.result(), Some(&json!(i * i)));
    }
}

#[test]
fn parallel_groups_complete() {
    let engine = Engine::new().with_processor(Processor::MultiThread { workers: 4 });
    let t = engine
        .register("echo", "", echo)
        .unwrap();

    let mut groups = Vec::new();
    for name in ["g1", "g2", "g3"] {
        engine
            .create_group(name)
            .unwrap()
            .add(&t)
            .unwrap()
            .add(&t)
            .unwrap();
        groups.push((name.to_string(), vec![params(json!({"group": name}))]));
    }

    let keys = engine.run_groups(groups).unwrap();
    assert_eq!(keys.len(), 3);
    assert_eq!(
        engine.get_task("0.g3").unwrap().result(),
        Some(&json!({"group": "g3"}))
    );
    assert_eq!(engine.get_task("1.g3").unwrap().result(), Some(&json!({})));
}

#[test]
fn pipeline_runs_steps_in_order() {
    let mut pipeline = Pipeline::new();
    pipeline
        .add_context_task("function_1", |_, params| {
            Ok(params.get("a").cloned().unwrap_or(Value::Null))
        })
        .unwrap();
    pipeline
        .add_task("function_2", |_| Ok(Value::Null))
        .unwrap();
    pipeline
        .parameter("function_1", json!({"a": "String"}))
        .unwrap();

    let result = pipeline.run().unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result["function_1"], json!("String"));
    assert!(result["function_2"].is_null());
}

fn engine_with_finished_group() -> Engine {
    let engine = Engine::new();
    let t = engine.register("echo", "", echo).unwrap();
    engine.create_group("g1").unwrap().add(&t).unwrap();
    engine
        .run_group("g1", vec![params(json!({"x": 1}))])
        .unwrap();
    engine
}

#[test]
fn run_groups_with_unknown_group_leaves_earlier_runs() {
    let engine = engine_with_finished_group();

    let err = engine
        .run_groups(vec![
            ("g1".to_string(), vec![params(json!({"x": 2}))]),
            ("missing".to_string(), Vec::new()),
        ])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lookup);

    let step = engine.get_step(0, "g1").unwrap();
    assert_eq!(step.result(), Some(&json!({"x": 1})));
    assert_eq!(step.parameters(), &params(json!({"x": 1})));
}

#[test]
fn run_groups_rejects_repeated_group() {
    let engine = engine_with_finished_group();

    let err = engine
        .run_groups(vec![
            ("g1".to_string(), vec![params(json!({"x": 2}))]),
            ("g1".to_string(), vec![params(json!({"x": 3}))]),
        ])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);

    let step = engine.get_step(0, "g1").unwrap();
    assert_eq!(step.result(), Some(&json!({"x": 1})));
}
