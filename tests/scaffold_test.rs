use indexmap::IndexMap;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use stencil::prompt::DialoguerPrompter;
use stencil::replay;
use stencil::scaffold::{scaffold, ScaffoldOptions};

fn make_repo(root: &Path) -> PathBuf {
    let repo = root.join("template");
    let project = repo.join("{{ stencil.project_slug }}");
    fs::create_dir_all(&project).unwrap();
    fs::write(
        repo.join("stencil.json"),
        r#"{"project_slug": "demo", "greeting": "Hello"}"#,
    )
    .unwrap();
    fs::write(project.join("README.md"), "{{ stencil.greeting }}, world!\n").unwrap();
    fs::write(project.join("origin.txt"), "from {{ stencil._template }}\n").unwrap();
    repo
}

fn write_config(root: &Path) -> PathBuf {
    let config_path = root.join("stencilrc.yml");
    fs::write(
        &config_path,
        format!(
            "templates_dir: {}\nreplay_dir: {}\n",
            root.join("store").display(),
            root.join("replay").display()
        ),
    )
    .unwrap();
    config_path
}

fn options(root: &Path, repo: &Path) -> ScaffoldOptions {
    ScaffoldOptions {
        template: repo.to_str().unwrap().to_string(),
        no_input: true,
        output_dir: root.join("out"),
        config_file: Some(write_config(root)),
        ..Default::default()
    }
}

#[test]
fn test_scaffold_end_to_end_non_interactive() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = make_repo(temp_dir.path());

    let project_dir = scaffold(&options(temp_dir.path(), &repo), &DialoguerPrompter::new()).unwrap();

    assert_eq!(project_dir.file_name().unwrap().to_str().unwrap(), "demo");
    assert_eq!(
        fs::read_to_string(project_dir.join("README.md")).unwrap(),
        "Hello, world!\n"
    );
    // the template origin is stamped into the context before generation
    let origin = fs::read_to_string(project_dir.join("origin.txt")).unwrap();
    assert!(origin.contains(repo.to_str().unwrap()));

    // the resolved context was recorded for replay under the template basename
    let replay_file = temp_dir.path().join("replay").join("template.json");
    assert!(replay_file.exists());
    let recorded = replay::load_file(&replay_file).unwrap().unwrap();
    assert_eq!(recorded.variables["greeting"], json!("Hello"));
}

#[test]
fn test_scaffold_extra_context_overrides_manifest_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = make_repo(temp_dir.path());

    let extra: IndexMap<String, Value> =
        IndexMap::from([("greeting".to_string(), json!("Howdy"))]);
    let options = ScaffoldOptions {
        extra_context: extra,
        ..options(temp_dir.path(), &repo)
    };

    let project_dir = scaffold(&options, &DialoguerPrompter::new()).unwrap();
    assert_eq!(
        fs::read_to_string(project_dir.join("README.md")).unwrap(),
        "Howdy, world!\n"
    );
}

#[test]
fn test_scaffold_replay_reuses_recorded_answers() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = make_repo(temp_dir.path());

    let extra: IndexMap<String, Value> =
        IndexMap::from([("greeting".to_string(), json!("Howdy"))]);
    let first_options = ScaffoldOptions {
        extra_context: extra,
        ..options(temp_dir.path(), &repo)
    };
    scaffold(&first_options, &DialoguerPrompter::new()).unwrap();

    // replay into a fresh output dir: no overrides given, answers come
    // from the recorded context
    let replay_options = ScaffoldOptions {
        replay: true,
        output_dir: temp_dir.path().join("out2"),
        ..options(temp_dir.path(), &repo)
    };
    let replayed_dir = scaffold(&replay_options, &DialoguerPrompter::new()).unwrap();

    assert_eq!(
        fs::read_to_string(replayed_dir.join("README.md")).unwrap(),
        "Howdy, world!\n"
    );
}

#[test]
fn test_scaffold_missing_repository_is_reported() {
    let temp_dir = tempfile::tempdir().unwrap();
    let options = ScaffoldOptions {
        template: temp_dir.path().join("no-such-template").display().to_string(),
        no_input: true,
        output_dir: temp_dir.path().join("out"),
        config_file: Some(write_config(temp_dir.path())),
        ..Default::default()
    };

    let err = scaffold(&options, &DialoguerPrompter::new()).unwrap_err();
    assert!(matches!(
        err,
        stencil::error::Error::RepositoryNotFound { .. }
    ));
}
