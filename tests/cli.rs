//! Process-level tests for the `md2pdf` binary.
//!
//! These run the compiled CLI and check its exit status, its stdout/stderr
//! messages and the files it leaves behind. Only the last test needs a real
//! browser; it is gated behind `E2E_ENABLED` like the e2e suite.
//!
//! Run with:
//!   cargo test --test cli
//!   E2E_ENABLED=1 MD2PDF_CHROME=/usr/bin/chromium cargo test --test cli

#![cfg(feature = "cli")]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// ── Helpers ──────────────────────────────────────────────────────────────────

/// The binary with no `MD2PDF_*` settings inherited from the caller.
fn md2pdf() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_md2pdf"));
    for (key, _) in std::env::vars() {
        if key.starts_with("MD2PDF_") {
            cmd.env_remove(key);
        }
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run(cmd: &mut Command) -> (Output, String, String) {
    let output = cmd.output().expect("failed to run md2pdf");
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    (output, stdout, stderr)
}

fn write_markdown(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, "# Title\n\nHello\n\n## Next\n").unwrap();
    path
}

// ── Failure paths ────────────────────────────────────────────────────────────

#[test]
fn test_missing_input_exits_with_status_1() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("missing.md");
    let output_pdf = dir.path().join("out.pdf");

    let (output, stdout, stderr) = run(md2pdf().arg(&input).arg("-o").arg(&output_pdf));

    assert_eq!(output.status.code(), Some(1), "stderr: {stderr}");
    assert!(stderr.contains("File not found:"), "stderr: {stderr}");
    assert!(stderr.contains("missing.md"), "stderr: {stderr}");
    assert!(!stdout.contains("PDF generated at"));
    assert!(!output_pdf.exists());
}

#[test]
fn test_existing_output_warns_and_survives_a_failed_print() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_markdown(dir.path(), "doc.md");
    let output_pdf = dir.path().join("out.pdf");
    fs::write(&output_pdf, b"previous").unwrap();

    let mut cmd = md2pdf();
    cmd.arg(&input).arg("-o").arg(&output_pdf);
    cmd.args(["--chrome", "/nonexistent/chrome", "--no-progress"]);
    let (output, stdout, stderr) = run(&mut cmd);

    let shown = output_pdf.display();
    let expected = format!("File already exists: {shown}. Overwriting...");
    assert!(stderr.contains(&expected), "stderr: {stderr}");
    assert!(!output.status.success());
    assert!(!stdout.contains("PDF generated at"));
    assert_eq!(fs::read(&output_pdf).unwrap(), b"previous");
}

#[test]
fn test_quiet_suppresses_the_overwrite_warning() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_markdown(dir.path(), "doc.md");
    let output_pdf = dir.path().join("out.pdf");
    fs::write(&output_pdf, b"previous").unwrap();

    let mut cmd = md2pdf();
    cmd.arg(&input).arg("-o").arg(&output_pdf);
    cmd.args(["--chrome", "/nonexistent/chrome", "-q"]);
    let (output, _, stderr) = run(&mut cmd);

    assert!(!output.status.success());
    assert!(!stderr.contains("File already exists"), "stderr: {stderr}");
}

// ── HTML-only mode ───────────────────────────────────────────────────────────

#[test]
fn test_html_only_prints_document_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_markdown(dir.path(), "doc.md");
    let output_pdf = dir.path().join("out.pdf");

    let mut cmd = md2pdf();
    cmd.arg(&input).arg("-o").arg(&output_pdf);
    cmd.args(["--html-only", "-T", "Report"]);
    let (output, stdout, stderr) = run(&mut cmd);

    assert!(output.status.success(), "stderr: {stderr}");
    assert!(stdout.starts_with("<!DOCTYPE html>"));
    assert!(stdout.contains("<nav class=\"toc\">"));
    assert!(stdout.contains(">Report</div>"));
    assert!(!stdout.contains("PDF generated at"));
    assert!(!output_pdf.exists());
}

#[test]
fn test_html_only_json_lists_headings() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_markdown(dir.path(), "doc.md");

    let (output, stdout, stderr) = run(md2pdf().arg(&input).args(["--html-only", "--json"]));

    assert!(output.status.success(), "stderr: {stderr}");
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let ids: Vec<_> = json["headings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["title", "next"]);
    assert!(json["html"].as_str().unwrap().contains("<h1 id=\"title\""));
}

// ── Real browser ─────────────────────────────────────────────────────────────

#[test]
fn test_cli_reports_generated_pdf() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let input = write_markdown(dir.path(), "doc.md");
    let output_pdf = dir.path().join("nested").join("out.pdf");

    let mut cmd = md2pdf();
    if let Ok(chrome) = std::env::var("MD2PDF_CHROME") {
        cmd.env("MD2PDF_CHROME", chrome);
    }
    cmd.arg(&input).arg("-o").arg(&output_pdf);
    cmd.args(["--no-sandbox", "--no-progress"]);
    let (output, stdout, stderr) = run(&mut cmd);

    assert!(output.status.success(), "stderr: {stderr}");
    let expected = format!("PDF generated at {}", output_pdf.display());
    assert!(stdout.contains(&expected), "stdout: {stdout}");
    assert!(fs::read(&output_pdf).unwrap().starts_with(b"%PDF"));
}
