use blueprint_core::script::hooks::{Hook, Phase};
use blueprint_core::script::InitStep;
use blueprint_core::{Error, Expansion, Script, Step};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn finish(mut step: Step) -> Step {
    while let Step::Presenting(surface) = step {
        step = surface.advance().unwrap();
    }
    step
}

fn recorder(log: &Arc<Mutex<Vec<String>>>, label: &str) -> Hook {
    let log = log.clone();
    let label = label.to_string();
    Hook::new(label.clone(), move |_| {
        log.lock().unwrap().push(label.clone());
        Ok(())
    })
}

#[tokio::test]
async fn test_existing_destination_is_untouched() {
    let template = TempDir::new().unwrap();
    write(template.path(), "README.md", "hello");
    let out = TempDir::new().unwrap();
    write(out.path(), "keep.txt", "mine");

    let err = Expansion::new(template.path(), out.path())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DestinationExists { .. }));
    let entries: Vec<_> = fs::read_dir(out.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert!(!out.path().join("README.md").exists());
}

#[tokio::test]
async fn test_empty_template_creates_project_dir() {
    let template = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let project = out.path().join("project");

    let expanded = blueprint_core::expand(template.path(), &project)
        .await
        .unwrap();

    assert!(project.is_dir());
    assert!(matches!(expanded.step, Step::Finished));
    assert!(expanded.report.copied.is_empty());
    assert_eq!(expanded.report.fill_ins, 0);
}

#[tokio::test]
async fn test_markers() {
    let template = TempDir::new().unwrap();
    let root = template.path();
    write(root, "gitignore.keep", "target/\n");
    write(root, "notes.nocopy", "maintainer notes");
    write(root, "Cargo.toml.fill", "name = \"${project:demo}\"\n");
    write(root, "src/main.rs", "fn main() {}\n");
    write(root, ".blueprint.yaml", "");
    let out = TempDir::new().unwrap();
    let project = out.path().join("project");

    let expanded = blueprint_core::expand(root, &project).await.unwrap();
    assert_eq!(expanded.report.fill_ins, 1);
    let Step::Presenting(surface) = &expanded.step else {
        panic!("expected a fill-in");
    };
    assert_eq!(surface.destination(), project.join("Cargo.toml"));
    assert!(matches!(finish(expanded.step), Step::Finished));

    assert_eq!(
        fs::read_to_string(project.join("gitignore")).unwrap(),
        "target/\n"
    );
    assert_eq!(
        fs::read_to_string(project.join("Cargo.toml")).unwrap(),
        "name = \"demo\"\n"
    );
    assert!(project.join("src/main.rs").is_file());
    assert!(!project.join("notes").exists());
    assert!(!project.join("notes.nocopy").exists());
    assert!(!project.join("Cargo.toml.fill").exists());
    assert!(!project.join(".blueprint.yaml").exists());
}

#[tokio::test]
async fn test_script_file_reshapes_mapping() {
    let template = TempDir::new().unwrap();
    let root = template.path();
    write(root, "lib.rs", "// lib\n");
    write(root, "scratch.tmp", "");
    write(root, "base/README.md", "base readme\n");
    write(root, "base/LICENSE", "MIT\n");
    write(root, "README.md", "root readme\n");
    write(
        root,
        ".blueprint.yaml",
        r#"
version: "0.1.0"
ignore:
  - "*.tmp"
subdirs:
  - base
init:
  - remap:
      from: lib.rs
      to: src/lib.rs
"#,
    );
    let out = TempDir::new().unwrap();
    let project = out.path().join("project");

    let expanded = blueprint_core::expand(root, &project).await.unwrap();

    assert_eq!(expanded.report.template_version.as_deref(), Some("0.1.0"));
    assert!(project.join("src/lib.rs").is_file());
    assert!(!project.join("lib.rs").exists());
    assert!(!project.join("scratch.tmp").exists());
    assert!(!project.join("base").exists());
    assert_eq!(fs::read_to_string(project.join("LICENSE")).unwrap(), "MIT\n");
    assert_eq!(
        fs::read_to_string(project.join("README.md")).unwrap(),
        "root readme\n"
    );
}

#[tokio::test]
async fn test_hook_order_with_fill_ins() {
    let template = TempDir::new().unwrap();
    write(template.path(), "a.txt.fill", "${greeting} from ${target_directory}");
    let out = TempDir::new().unwrap();
    let project = out.path().join("project");
    let log = Arc::new(Mutex::new(Vec::new()));

    let script = Script::new()
        .env("greeting", Some("hello".to_string()))
        .on(Phase::Finalize, recorder(&log, "finalize"))
        .on(Phase::BeforeFillIn, recorder(&log, "before-fill-in"))
        .on(Phase::AfterCopy, recorder(&log, "after-copy"));

    let expanded = Expansion::new(template.path(), &project)
        .script(script)
        .run()
        .await
        .unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["after-copy", "before-fill-in"]);

    finish(expanded.step);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["after-copy", "before-fill-in", "finalize"]
    );
    assert_eq!(
        fs::read_to_string(project.join("a.txt")).unwrap(),
        format!("hello from {}", project.display())
    );
}

#[tokio::test]
async fn test_fill_ins_keep_discovery_order_after_remap() {
    let template = TempDir::new().unwrap();
    write(template.path(), "a.txt.fill", "a");
    write(template.path(), "b.txt.fill", "b");
    let out = TempDir::new().unwrap();
    let project = out.path().join("project");

    let script = Script::new().step(InitStep::Remap(
        "b.txt.fill".to_string(),
        "b.txt".to_string(),
    ));
    let expanded = Expansion::new(template.path(), &project)
        .script(script)
        .run()
        .await
        .unwrap();

    let Step::Presenting(surface) = &expanded.step else {
        panic!("expected a fill-in");
    };
    assert_eq!(surface.destination(), project.join("a.txt"));
    assert_eq!(
        surface.session().queued_destinations(),
        vec![project.join("b.txt")]
    );
}

#[tokio::test]
async fn test_hook_order_without_fill_ins() {
    let template = TempDir::new().unwrap();
    write(template.path(), "a.txt", "plain");
    let out = TempDir::new().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));

    let script = Script::new()
        .on(Phase::BeforeFillIn, recorder(&log, "before-fill-in"))
        .on(Phase::AfterCopy, recorder(&log, "after-copy"))
        .on(Phase::Finalize, recorder(&log, "finalize"));

    let expanded = Expansion::new(template.path(), out.path().join("project"))
        .script(script)
        .run()
        .await
        .unwrap();

    assert!(matches!(expanded.step, Step::Finished));
    assert_eq!(*log.lock().unwrap(), vec!["after-copy", "finalize"]);
}

#[tokio::test]
async fn test_script_failure_aborts() {
    let template = TempDir::new().unwrap();
    write(template.path(), "a.txt", "plain");
    let out = TempDir::new().unwrap();
    let project = out.path().join("project");

    let script = Script::new().init(|_| anyhow::bail!("refusing to continue"));
    let err = Expansion::new(template.path(), &project)
        .script(script)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ScriptFailure(_)));
    assert!(err.to_string().contains("refusing to continue"));
    assert!(!project.join("a.txt").exists());
}

#[tokio::test]
async fn test_after_copy_failure_skips_finalize() {
    let template = TempDir::new().unwrap();
    write(template.path(), "a.txt", "plain");
    let out = TempDir::new().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));

    let script = Script::new()
        .on(
            Phase::AfterCopy,
            Hook::new("broken", |_| anyhow::bail!("boom")),
        )
        .on(Phase::Finalize, recorder(&log, "finalize"));

    let err = Expansion::new(template.path(), out.path().join("project"))
        .script(script)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::HookFailure { phase: "after-copy", .. }
    ));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_destinations_are_reported() {
    let template = TempDir::new().unwrap();
    write(template.path(), "one.txt", "one");
    write(template.path(), "two.txt", "two");
    let out = TempDir::new().unwrap();
    let project = out.path().join("project");
    let dropped = Arc::new(Mutex::new(Vec::new()));
    let sink = dropped.clone();

    let script = Script::new().init(|ctx| {
        ctx.map("one.txt", "same.txt")?;
        ctx.map("two.txt", "same.txt")?;
        Ok(())
    });
    Expansion::new(template.path(), &project)
        .script(script)
        .on_duplicate(move |entry| sink.lock().unwrap().push(entry.source.to_string()))
        .run()
        .await
        .unwrap();

    // The most recent mapping claims the destination
    assert_eq!(fs::read_to_string(project.join("same.txt")).unwrap(), "two");
    assert_eq!(*dropped.lock().unwrap(), vec!["one.txt"]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_hooks_run_in_project_dir() {
    let template = TempDir::new().unwrap();
    write(
        template.path(),
        ".blueprint.yaml",
        r#"
env:
  - name: flavor
    value: vanilla
after_copy:
  - echo "$flavor" > flavor.txt
"#,
    );
    let out = TempDir::new().unwrap();
    let project = out.path().join("project");

    blueprint_core::expand(template.path(), &project)
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(project.join("flavor.txt")).unwrap(),
        "vanilla\n"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_template_content_is_copied() {
    let shared = TempDir::new().unwrap();
    write(shared.path(), "x.txt", "shared");
    let template = TempDir::new().unwrap();
    std::os::unix::fs::symlink(shared.path(), template.path().join("linked")).unwrap();
    let out = TempDir::new().unwrap();
    let project = out.path().join("project");

    let expanded = blueprint_core::expand(template.path(), &project)
        .await
        .unwrap();

    assert!(matches!(expanded.step, Step::Finished));
    assert!(project.join("linked").is_dir());
    assert_eq!(
        fs::read_to_string(project.join("linked/x.txt")).unwrap(),
        "shared"
    );
}
