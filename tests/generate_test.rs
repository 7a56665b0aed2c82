use indexmap::IndexMap;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use stencil::context::Context;
use stencil::error::Error;
use stencil::generate::generate_files;

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
    repo
}

fn resolved_context(extra: &[(&str, Value)]) -> Context {
    let mut variables: IndexMap<String, Value> = IndexMap::new();
    variables.insert("project_slug".to_string(), json!("demo"));
    variables.insert("greeting".to_string(), json!("Hello"));
    for (key, value) in extra {
        variables.insert(key.to_string(), value.clone());
    }
    Context::new(variables)
}

#[test]
fn test_generates_rendered_names_and_contents() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = make_repo(temp_dir.path());
    let project_template = repo.join("{{ stencil.project_slug }}");
    fs::create_dir_all(project_template.join("src")).unwrap();
    fs::write(
        project_template.join("src").join("{{ stencil.project_slug }}.txt"),
        "name: {{ stencil.project_slug }}\n",
    )
    .unwrap();

    let output_dir = temp_dir.path().join("out");
    let project_dir = generate_files(
        &repo,
        &resolved_context(&[]),
        &output_dir,
        false,
        false,
        false,
        false,
    )
    .unwrap();

    assert_eq!(project_dir.file_name().unwrap().to_str().unwrap(), "demo");
    assert_eq!(
        fs::read_to_string(project_dir.join("README.md")).unwrap(),
        "Hello, world!\n"
    );
    assert_eq!(
        fs::read_to_string(project_dir.join("src").join("demo.txt")).unwrap(),
        "name: demo\n"
    );
}

#[test]
fn test_binary_file_is_copied_byte_identical() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = make_repo(temp_dir.path());
    // null bytes plus template syntax in the content
    let payload = b"\x89PNG\x00\x01{{ stencil.greeting }}\x00tail".to_vec();
    fs::write(
        repo.join("{{ stencil.project_slug }}").join("logo.png"),
        &payload,
    )
    .unwrap();

    let output_dir = temp_dir.path().join("out");
    let project_dir = generate_files(
        &repo,
        &resolved_context(&[]),
        &output_dir,
        false,
        false,
        false,
        false,
    )
    .unwrap();

    assert_eq!(fs::read(project_dir.join("logo.png")).unwrap(), payload);
}

#[test]
fn test_copy_only_pattern_keeps_content_verbatim_but_renders_name() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = make_repo(temp_dir.path());
    fs::write(
        repo.join("{{ stencil.project_slug }}")
            .join("{{ stencil.project_slug }}.html"),
        "<h1>{{ stencil.greeting }}</h1>\n",
    )
    .unwrap();

    let context = resolved_context(&[("_copy_without_render", json!(["*.html"]))]);
    let output_dir = temp_dir.path().join("out");
    let project_dir =
        generate_files(&repo, &context, &output_dir, false, false, false, false).unwrap();

    // the name was rendered, the template syntax inside was not
    assert_eq!(
        fs::read_to_string(project_dir.join("demo.html")).unwrap(),
        "<h1>{{ stencil.greeting }}</h1>\n"
    );
}

#[test]
fn test_skip_if_file_exists_leaves_bytes_untouched() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = make_repo(temp_dir.path());
    let output_dir = temp_dir.path().join("out");

    let project_dir = generate_files(
        &repo,
        &resolved_context(&[]),
        &output_dir,
        false,
        false,
        false,
        false,
    )
    .unwrap();
    fs::write(project_dir.join("README.md"), "customized\n").unwrap();

    generate_files(
        &repo,
        &resolved_context(&[]),
        &output_dir,
        false,
        true,
        false,
        false,
    )
    .unwrap();
    assert_eq!(
        fs::read_to_string(project_dir.join("README.md")).unwrap(),
        "customized\n"
    );
}

#[test]
fn test_existing_root_is_reused_without_deleting_unrelated_files() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = make_repo(temp_dir.path());
    let output_dir = temp_dir.path().join("out");
    let existing = output_dir.join("demo");
    fs::create_dir_all(&existing).unwrap();
    fs::write(existing.join("unrelated.txt"), "keep me\n").unwrap();

    let project_dir = generate_files(
        &repo,
        &resolved_context(&[]),
        &output_dir,
        false,
        false,
        false,
        false,
    )
    .unwrap();

    assert_eq!(
        fs::read_to_string(project_dir.join("unrelated.txt")).unwrap(),
        "keep me\n"
    );
    assert!(project_dir.join("README.md").exists());
}

#[test]
fn test_overwrite_if_exists_starts_from_an_empty_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = make_repo(temp_dir.path());
    let output_dir = temp_dir.path().join("out");
    let existing = output_dir.join("demo");
    fs::create_dir_all(&existing).unwrap();
    fs::write(existing.join("stale.txt"), "old\n").unwrap();

    let project_dir = generate_files(
        &repo,
        &resolved_context(&[]),
        &output_dir,
        true,
        false,
        false,
        false,
    )
    .unwrap();

    assert!(!project_dir.join("stale.txt").exists());
    assert!(project_dir.join("README.md").exists());
}

#[test]
fn test_undefined_variable_aborts_and_rolls_back() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = make_repo(temp_dir.path());
    fs::write(
        repo.join("{{ stencil.project_slug }}").join("broken.txt"),
        "{{ stencil.not_defined }}\n",
    )
    .unwrap();

    let output_dir = temp_dir.path().join("out");
    let err = generate_files(
        &repo,
        &resolved_context(&[]),
        &output_dir,
        false,
        false,
        false,
        false,
    )
    .unwrap_err();

    assert!(matches!(err, Error::UndefinedVariable { .. }));
    assert!(!output_dir.join("demo").exists());
}

#[test]
fn test_keep_project_on_failure_leaves_partial_output() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = make_repo(temp_dir.path());
    fs::write(
        repo.join("{{ stencil.project_slug }}").join("zz_broken.txt"),
        "{{ stencil.not_defined }}\n",
    )
    .unwrap();

    let output_dir = temp_dir.path().join("out");
    let err = generate_files(
        &repo,
        &resolved_context(&[]),
        &output_dir,
        false,
        false,
        false,
        true,
    )
    .unwrap_err();

    assert!(matches!(err, Error::UndefinedVariable { .. }));
    // files written before the failure are still there
    assert!(output_dir.join("demo").exists());
    assert!(output_dir.join("demo").join("README.md").exists());
}

#[test]
fn test_editor_swap_files_are_skipped() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = make_repo(temp_dir.path());
    fs::write(
        repo.join("{{ stencil.project_slug }}").join(".README.md.swp"),
        "swap data",
    )
    .unwrap();

    let output_dir = temp_dir.path().join("out");
    let project_dir = generate_files(
        &repo,
        &resolved_context(&[]),
        &output_dir,
        false,
        false,
        false,
        false,
    )
    .unwrap();

    assert!(!project_dir.join(".README.md.swp").exists());
    assert!(project_dir.join("README.md").exists());
}
