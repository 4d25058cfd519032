use bytedupe::cli::Cli;
use bytedupe::error::ExitCode;
use clap::Parser;
use std::fs;
use tempfile::tempdir;

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["bytedupe", "-q"];
    argv.extend_from_slice(args);
    bytedupe::run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_manifest_written_to_file() {
    let data = tempdir().unwrap();
    fs::write(data.path().join("a.txt"), b"twin").unwrap();
    fs::write(data.path().join("b.txt"), b"twin").unwrap();
    let out = tempdir().unwrap();
    let manifest = out.path().join("result.ccdup");

    let code = run(&[
        "scan",
        data.path().to_str().unwrap(),
        "-o",
        manifest.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::DuplicatesFound);

    let text = fs::read_to_string(&manifest).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "-".repeat(150));
    assert!(lines[1].starts_with("a.txt\t"));
    assert!(lines[2].starts_with("b.txt\t"));
    assert_eq!(lines[3], "=".repeat(150));
    assert!(lines[4].starts_with("1 duplicate files in 4"));
}

#[test]
fn test_json_written_to_file() {
    let data = tempdir().unwrap();
    fs::write(data.path().join("a.bin"), b"0123456789").unwrap();
    fs::write(data.path().join("b.bin"), b"0123456789").unwrap();
    fs::write(data.path().join("c.bin"), b"x").unwrap();
    let out = tempdir().unwrap();
    let report = out.path().join("report.json");

    run(&[
        "scan",
        data.path().to_str().unwrap(),
        "-f",
        "json",
        "-o",
        report.to_str().unwrap(),
    ])
    .unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["groups"].as_array().unwrap().len(), 1);
    assert_eq!(value["groups"][0]["size"], 10);
    assert_eq!(value["summary"]["total_files"], 3);
    assert_eq!(value["summary"]["duplicate_bytes"], 10);
    assert_eq!(value["summary"]["exit_code_name"], "BD000");
    assert!(value["failed"].as_array().unwrap().is_empty());
}

#[test]
fn test_existing_output_needs_force() {
    let data = tempdir().unwrap();
    fs::write(data.path().join("a.txt"), b"twin").unwrap();
    fs::write(data.path().join("b.txt"), b"twin").unwrap();
    let out = tempdir().unwrap();
    let manifest = out.path().join("result.ccdup");
    fs::write(&manifest, "previous run").unwrap();

    let refused = run(&[
        "scan",
        data.path().to_str().unwrap(),
        "-o",
        manifest.to_str().unwrap(),
    ]);
    assert!(refused.is_err());
    assert_eq!(fs::read_to_string(&manifest).unwrap(), "previous run");

    run(&[
        "scan",
        data.path().to_str().unwrap(),
        "-o",
        manifest.to_str().unwrap(),
        "--force",
    ])
    .unwrap();
    assert_ne!(fs::read_to_string(&manifest).unwrap(), "previous run");
}

#[test]
fn test_output_directory_must_exist() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    let manifest = out.path().join("missing").join("result.ccdup");

    let result = run(&[
        "scan",
        data.path().to_str().unwrap(),
        "-o",
        manifest.to_str().unwrap(),
    ]);
    assert!(result.is_err());
    assert!(!manifest.exists());
}

#[test]
fn test_manifest_inside_root_not_rescanned() {
    let data = tempdir().unwrap();
    fs::write(data.path().join("a.txt"), b"twin").unwrap();
    fs::write(data.path().join("b.txt"), b"twin").unwrap();
    let manifest = data.path().join("result.ccdup");
    let copy = data.path().join("copy.ccdup");

    run(&["scan", data.path().to_str().unwrap(), "-o", manifest.to_str().unwrap()]).unwrap();
    fs::copy(&manifest, &copy).unwrap();

    // The two identical manifests are skipped unless requested.
    let report = data.path().join("second.json");
    run(&[
        "scan",
        data.path().to_str().unwrap(),
        "-f",
        "json",
        "-o",
        report.to_str().unwrap(),
    ])
    .unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["groups"].as_array().unwrap().len(), 1);
    assert_eq!(value["summary"]["total_files"], 2);
}
