//! Import, export and caching behaviour of part scripts run end to end

// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use cadkit_cache::CacheConfig;
use cadkit_script::{PartError, ScriptEngine, Shape, WorkshopConfig};
use parking_lot::Mutex;
use rhai::ImmutableString;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const PARTS: &str = r#"
probe("start");
let a = cube(1.0);
export_part(a, "a");
probe("after a");
let b = sphere(2.0);
b.export_part("b");
probe("after b");
"#;

type Log = Arc<Mutex<Vec<String>>>;

/// Engine rooted in `dir`, with a `probe(label)` function that records
/// how far scripts got
fn engine(dir: &Path) -> (ScriptEngine, Log) {
    let config = WorkshopConfig::default()
        .with_out_dir(dir.join("out"))
        .with_parts_dir(dir)
        .with_cache(CacheConfig::default().with_dir(dir.join("cache")));
    let mut engine = ScriptEngine::new(config);

    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    engine.inner_mut().register_fn("probe", move |label: ImmutableString| {
        sink.lock().push(label.to_string());
    });
    (engine, log)
}

fn write(dir: &Path, name: &str, source: &str) {
    fs::write(dir.join(name), source).unwrap();
}

fn probes(log: &Log) -> Vec<String> {
    log.lock().clone()
}

fn assert_idle(engine: &ScriptEngine) {
    assert_eq!(engine.workshop().captures().depth(), 0);
    assert_eq!(engine.workshop().script_depth(), 0);
}

// === Import ===

#[test]
fn import_stops_after_the_wanted_export() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "parts.rhai", PARTS);
    let (engine, log) = engine(temp.path());

    let b = engine.import_part("parts.rhai", "b").unwrap();
    assert_eq!(b, Shape::sphere(2.0));
    assert_eq!(probes(&log), ["start", "after a"]);
    assert_idle(&engine);
}

#[test]
fn import_of_the_first_export_skips_the_rest() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "parts.rhai", PARTS);
    let (engine, log) = engine(temp.path());

    let a = engine.import_part("parts.rhai", "a").unwrap();
    assert_eq!(a, Shape::cube(1.0));
    assert_eq!(probes(&log), ["start"]);
}

#[test]
fn import_of_an_unknown_name_lists_what_was_exported() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "parts.rhai", PARTS);
    let (engine, log) = engine(temp.path());

    let err = engine.import_part("parts.rhai", "y").unwrap_err();
    match &err {
        PartError::ImportNotFound { name, available, .. } => {
            assert_eq!(name, "y");
            assert_eq!(available, &["a".to_string(), "b".to_string()]);
        }
        other => panic!("expected ImportNotFound, got {other}"),
    }
    assert!(err.to_string().contains("\"a\", \"b\""));
    // The whole script ran looking for it
    assert_eq!(probes(&log), ["start", "after a", "after b"]);
    assert_idle(&engine);
}

#[test]
fn untitled_export_is_the_empty_name() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "single.rhai", "export_part(cube(2.0));\nprobe(\"unreachable\");");
    let (engine, log) = engine(temp.path());

    let part = engine.import_part("single.rhai", "").unwrap();
    assert_eq!(part, Shape::cube(2.0));
    assert!(probes(&log).is_empty());
}

#[test]
fn missing_script_is_reported() {
    let temp = TempDir::new().unwrap();
    let (engine, _) = engine(temp.path());

    let err = engine.import_part("nope.rhai", "a").unwrap_err();
    assert!(matches!(err, PartError::ScriptNotFound { .. }));
    assert_idle(&engine);
}

#[test]
fn nested_imports_unwind_cleanly() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "parts.rhai", PARTS);
    write(
        temp.path(),
        "outer.rhai",
        r#"
        let b = import_part("parts.rhai", "b");
        probe("outer got b");
        b.translate_x(10.0).export_part("moved");
        probe("outer done");
        "#,
    );
    let (engine, log) = engine(temp.path());

    let moved = engine.import_part("outer.rhai", "moved").unwrap();
    assert_relative_eq!(moved.bounding_box().center().x, 10.0, epsilon = 1e-9);
    assert_eq!(probes(&log), ["start", "after a", "outer got b"]);
    assert_idle(&engine);
}

#[test]
fn try_catch_cannot_swallow_the_early_exit() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "guarded.rhai",
        r#"
        try {
            export_part(cube(1.0), "a");
            probe("after export");
        } catch (e) {
            probe("caught");
        }
        probe("after try");
        "#,
    );
    let (engine, log) = engine(temp.path());

    let a = engine.import_part("guarded.rhai", "a").unwrap();
    assert_eq!(a, Shape::cube(1.0));
    assert!(probes(&log).is_empty());
}

#[test]
fn export_inside_a_function_stops_the_script() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "helper.rhai",
        r#"
        fn publish(size) {
            export_part(cube(size), "cube");
            probe("inside after export");
        }
        publish(3.0);
        probe("after publish");
        "#,
    );
    let (engine, log) = engine(temp.path());

    let part = engine.import_part("helper.rhai", "cube").unwrap();
    assert_eq!(part, Shape::cube(3.0));
    assert!(probes(&log).is_empty());
    assert_idle(&engine);
}

#[test]
fn script_error_pops_the_capture() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "broken.rhai", "export_part(cube(1.0), \"a\");\nthrow \"boom\";");
    let (engine, _) = engine(temp.path());

    let err = engine.import_part("broken.rhai", "b").unwrap_err();
    assert!(matches!(err, PartError::Script { .. }));
    assert!(err.to_string().contains("boom"));
    assert_idle(&engine);

    // The workshop is still usable afterwards
    let a = engine.import_part("broken.rhai", "a").unwrap();
    assert_eq!(a, Shape::cube(1.0));
}

#[test]
fn self_import_is_a_cycle_error() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "loop.rhai",
        "let x = import_part(\"loop.rhai\", \"a\");\nexport_part(x, \"a\");",
    );
    let (engine, _) = engine(temp.path());

    let err = engine.import_part("loop.rhai", "a").unwrap_err();
    assert!(err.to_string().contains("Import cycle"), "{err}");
    assert_idle(&engine);
}

#[test]
fn mutual_imports_are_a_cycle_error() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "left.rhai", "export_part(import_part(\"right.rhai\", \"r\"), \"l\");");
    write(temp.path(), "right.rhai", "export_part(import_part(\"left.rhai\", \"l\"), \"r\");");
    let (engine, _) = engine(temp.path());

    let err = engine.run_file(&temp.path().join("left.rhai")).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Import cycle"), "{message}");
    assert!(message.contains("right.rhai"), "{message}");
    assert_idle(&engine);
}

// === Top-level runs ===

#[test]
fn top_level_run_writes_every_export() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "parts.rhai", PARTS);
    let (engine, log) = engine(temp.path());

    let run = engine.run_file(&temp.path().join("parts.rhai")).unwrap();
    let out = temp.path().join("out");
    assert_eq!(run.exported, vec![out.join("parts-a.json"), out.join("parts-b.json")]);
    assert!(out.join("parts-a.json").is_file());
    assert!(out.join("parts-b.json").is_file());
    assert_eq!(probes(&log), ["start", "after a", "after b"]);

    let stored = engine.workshop().store().load("parts", "b").unwrap();
    assert_eq!(stored, Shape::sphere(2.0));
}

#[test]
fn importing_writes_nothing() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "parts.rhai", PARTS);
    let (engine, _) = engine(temp.path());

    engine.import_part("parts.rhai", "y").unwrap_err();
    assert!(!temp.path().join("out").exists());
}

#[test]
fn show_keeps_the_first_shape_of_a_run() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "view.rhai", "show(cube(1.0));\nshow(cube(2.0));\ncube(3.0)");
    let (engine, _) = engine(temp.path());

    let run = engine.run_file(&temp.path().join("view.rhai")).unwrap();
    assert_eq!(run.shown, Some(Shape::cube(1.0)));
    assert_eq!(run.value.clone().try_cast::<Shape>(), Some(Shape::cube(3.0)));
    assert_eq!(run.shape(), Some(Shape::cube(1.0)));
}

#[test]
fn show_is_ignored_while_importing() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "shown.rhai", "show(sphere(1.0));\nexport_part(cube(1.0), \"a\");");
    write(
        temp.path(),
        "main.rhai",
        "let a = import_part(\"shown.rhai\", \"a\");\nshow(a.translate_z(5.0));",
    );
    let (engine, _) = engine(temp.path());

    let run = engine.run_file(&temp.path().join("main.rhai")).unwrap();
    let shown = run.shown.expect("main script shows a part");
    assert_relative_eq!(shown.bounding_box().center().z, 5.0, epsilon = 1e-9);
}

// === Cached builders ===

#[test]
fn cached_builder_runs_once_per_argument_set() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "cached.rhai",
        r#"
        fn plate(w, h) {
            probe("build");
            cuboid(w, h, 2.0)
        }
        let a = cached(Fn("plate"), [40.0, 20.0]);
        let b = cached(Fn("plate"), [40.0, 20.0]);
        let c = cached(Fn("plate"), [50.0, 20.0]);
        a.union(b).union(c)
        "#,
    );
    let (engine, log) = engine(temp.path());
    let script = temp.path().join("cached.rhai");

    engine.run_file(&script).unwrap();
    assert_eq!(probes(&log), ["build", "build"]);

    // A second run is served entirely from disk
    let run = engine.run_file(&script).unwrap();
    assert_eq!(probes(&log).len(), 2);
    let size = run.shape().unwrap().bounding_box().size();
    assert_relative_eq!(size.x, 50.0, epsilon = 1e-9);
    assert_eq!(engine.workshop().cache().entries().unwrap().len(), 2);
}

#[test]
fn cached_passes_keyword_options_as_a_trailing_map() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "slab.rhai",
        r#"
        fn slab(w, opts) { cuboid(w, opts.depth, 1.0) }
        cached(Fn("slab"), [10.0], #{ depth: 3.0 })
        "#,
    );
    let (engine, _) = engine(temp.path());

    let run = engine.run_file(&temp.path().join("slab.rhai")).unwrap();
    let size = run.shape().unwrap().bounding_box().size();
    assert_relative_eq!(size.x, 10.0, epsilon = 1e-9);
    assert_relative_eq!(size.y, 3.0, epsilon = 1e-9);
}

#[test]
fn cached_compound_comes_back_as_an_array() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "kit.rhai",
        r#"
        fn kit() { [cube(1.0), sphere(1.0)] }
        let first = cached(Fn("kit"), []);
        let again = cached(Fn("kit"), []);
        first.len() + again.len()
        "#,
    );
    let (engine, _) = engine(temp.path());

    let run = engine.run_file(&temp.path().join("kit.rhai")).unwrap();
    assert_eq!(run.value.as_int().unwrap(), 4);
}

#[test]
fn cached_rejects_non_shape_results() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "answer.rhai",
        "fn answer() { 42 }\ncached(Fn(\"answer\"), [])",
    );
    let (engine, _) = engine(temp.path());

    let err = engine.run_file(&temp.path().join("answer.rhai")).unwrap_err();
    assert!(err.to_string().contains("Unsupported cache type"), "{err}");
    assert!(engine.workshop().cache().entries().unwrap().is_empty());
}

#[test]
fn cached_still_returns_the_shape_when_the_cache_cannot_be_written() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("cache-is-a-file");
    fs::write(&blocker, b"").unwrap();
    write(
        temp.path(),
        "plate.rhai",
        "fn plate(w) { cuboid(w, 2.0, 2.0) }\ncached(Fn(\"plate\"), [5.0])",
    );
    let engine = ScriptEngine::new(
        WorkshopConfig::default()
            .with_out_dir(temp.path().join("out"))
            .with_parts_dir(temp.path())
            .with_cache(CacheConfig::default().with_dir(&blocker)),
    );

    let run = engine.run_file(&temp.path().join("plate.rhai")).unwrap();
    let size = run.shape().unwrap().bounding_box().size();
    assert_relative_eq!(size.x, 5.0, epsilon = 1e-9);
    assert!(blocker.is_file());
}
