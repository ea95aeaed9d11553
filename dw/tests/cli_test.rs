//! CLI tests for the `dw` binary
//!
//! These drive the compiled binary end to end: flags, exit status and the
//! one-line diagnostic on failure.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn dw() -> Command {
    let mut cmd = Command::cargo_bin("dw").expect("dw binary builds");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, body: &str) {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, body).unwrap();
}

#[test]
fn test_compiles_document_with_defines() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(&src, "index.html", "<title>{{title}}</title>{{macro \"greet\" \"who=World\"}}");
    write(&src, "greet", "Hello {{who}}!");
    let output = out.path().join("index.html");

    dw().current_dir(src.path())
        .args(["-D", "title=Docs", "-o"])
        .arg(&output)
        .arg(src.path().join("index.html"))
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "<title>Docs</title>Hello World!"
    );
}

#[test]
fn test_missing_output_fails_before_compiling() {
    let src = TempDir::new().unwrap();
    write(&src, "index.html", "{{#if}}");

    dw().current_dir(src.path())
        .arg("index.html")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing output path"));
}

#[test]
fn test_malformed_define_is_fatal() {
    let src = TempDir::new().unwrap();
    write(&src, "index.html", "x");

    dw().current_dir(src.path())
        .args(["-D", "noequals", "-o", "out.html", "index.html"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("noequals"));
}

#[test]
fn test_missing_root_template_is_fatal() {
    let src = TempDir::new().unwrap();
    write(&src, "other.html", "x");

    dw().current_dir(src.path())
        .args(["-o", "out.html", "index.html"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Template not found: index.html"));
}

#[test]
fn test_html_mode_uses_comment_delimiters() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(&src, "page.html", "<p><!--{{name}}--> {{kept}}</p>");
    let output = out.path().join("page.html");

    dw().current_dir(src.path())
        .args(["--html", "-D", "name=Ada", "-o"])
        .arg(&output)
        .arg("page.html")
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(&output).unwrap(), "<p>Ada {{kept}}</p>");
}

#[test]
fn test_markdown_with_toc() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(&src, "index.html", "<main>{{markdown \"guide.md\" \"toc=1\"}}</main>");
    write(&src, "guide.md", "# Title\n\nBody text.\n");
    let output = out.path().join("index.html");

    dw().current_dir(src.path())
        .arg("-o")
        .arg(&output)
        .arg("index.html")
        .assert()
        .success();

    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("<nav class=\"toc\">"));
    assert!(html.contains("<h1 id=\"guide-title\">Title</h1>"));
    assert!(html.contains("<p>Body text.</p>"));
}

#[test]
fn test_shared_mode() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(&src, "one/part.txt", "old");
    write(&src, "two/part.txt", "new");
    write(&src, "main.txt", "<{{macro \"part.txt\"}}>");
    let output = out.path().join("out.txt");

    dw().current_dir(src.path())
        .args(["--shared", "-o"])
        .arg(&output)
        .args(["one/part.txt", "two/part.txt", "main.txt"])
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(&output).unwrap(), "<new>");
}

#[test]
fn test_config_file_limits_recursion() {
    let src = TempDir::new().unwrap();
    write(&src, "index.txt", "{{macro \"index.txt\"}}");
    write(&src, "dw.yml", "templates:\n  max-depth: 3\n");

    dw().current_dir(src.path())
        .args(["-c", "dw.yml", "-o", "out.txt", "index.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Recursion limit of 3"));
}
