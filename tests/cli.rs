use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn chunkwise(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("chunkwise").unwrap();
    cmd.current_dir(dir).env_remove("NODE_ENV").env_remove("RUST_LOG");
    cmd
}

#[test]
fn classify_framework_package() {
    let dir = tempfile::tempdir().unwrap();

    chunkwise(dir.path())
        .args(["classify", "--context", "/app/node_modules/vue-router/dist"])
        .assert()
        .success()
        .stdout("pkg.vueCommons\n");
}

#[test]
fn classify_component_and_view() {
    let dir = tempfile::tempdir().unwrap();

    chunkwise(dir.path())
        .args(["classify", "--context", "/app/src/js/components", "--request", "MyWidget.vue"])
        .assert()
        .success()
        .stdout("component.myWidget\n");

    chunkwise(dir.path())
        .args(["classify", "--context", "/app/src/js/views/_home", "--request", "_home.vue"])
        .assert()
        .success()
        .stdout("view._home-_home\n");
}

#[test]
fn classify_style_uses_project_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("chunkwise.toml"), "[split]\ndefault_bundle = \"styles\"\n").unwrap();

    chunkwise(dir.path())
        .args(["classify", "--context", "/app/node_modules/bootstrap/dist", "--style"])
        .assert()
        .success()
        .stdout("styles\n");
}

#[test]
fn classify_malformed_store_path_fails() {
    let dir = tempfile::tempdir().unwrap();

    chunkwise(dir.path())
        .args(["classify", "--context", "node_modules/vue", "--request", "./index.js"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("names no package"));
}

#[test]
fn init_then_plan_dry_run() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    chunkwise(root).arg("init").assert().success();
    assert!(root.join("chunkwise.toml").is_file());

    fs::create_dir_all(root.join("src/js")).unwrap();
    fs::create_dir_all(root.join("node_modules/@babel/polyfill")).unwrap();
    fs::write(root.join("node_modules/@babel/polyfill/index.js"), "").unwrap();
    fs::write(root.join("src/js/app.js"), "console.log('hi');").unwrap();

    chunkwise(root)
        .args(["plan", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("js/main.js"));

    assert!(!root.join("public_html/manifest.json").exists());
}

#[test]
fn plan_mode_follows_node_env() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("chunkwise.toml"), "[entrypoints]\nmain = \"src/js/app.js\"\n").unwrap();
    fs::create_dir_all(root.join("src/js")).unwrap();
    fs::write(root.join("src/js/app.js"), "import './app.scss';").unwrap();
    fs::write(root.join("src/js/app.scss"), "body { margin: 0; }").unwrap();

    for node_env in [None, Some("test")] {
        let mut cmd = chunkwise(root);
        if let Some(value) = node_env {
            cmd.env("NODE_ENV", value);
        }
        cmd.args(["plan", "--dry-run"])
            .assert()
            .success()
            .stderr(predicate::str::contains("js/main.js"))
            .stderr(predicate::str::contains("css/main.css").not());
    }

    chunkwise(root)
        .env("NODE_ENV", "production")
        .args(["plan", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("css/main.css"));
}
