use bytedupe::cli::Cli;
use bytedupe::error::ExitCode;
use clap::Parser;
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;

fn write(dir: &std::path::Path, name: &str, content: &[u8]) {
    File::create(dir.join(name))
        .unwrap()
        .write_all(content)
        .unwrap();
}

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["bytedupe", "-q"];
    argv.extend_from_slice(args);
    bytedupe::run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_exit_code_no_duplicates() {
    let dir = tempdir().unwrap();
    write(dir.path(), "unique.txt", b"unique");

    let code = run(&["scan", dir.path().to_str().unwrap(), "-f", "json"]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_exit_code_duplicates_found() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"dup");
    write(dir.path(), "b.txt", b"dup");

    let code = run(&["scan", dir.path().to_str().unwrap()]).unwrap();
    assert_eq!(code, ExitCode::DuplicatesFound);
}

#[test]
fn test_exit_code_with_threads() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"dup");
    write(dir.path(), "b.txt", b"dup");

    for threads in ["0", "1", "4"] {
        let code = run(&["scan", dir.path().to_str().unwrap(), "--threads", threads]).unwrap();
        assert_eq!(code, ExitCode::DuplicatesFound, "threads = {threads}");
    }
}

#[test]
fn test_negative_threads_rejected() {
    let dir = tempdir().unwrap();
    let err = run(&["scan", dir.path().to_str().unwrap(), "--threads", "-3"]).unwrap_err();
    assert!(err.to_string().contains("Invalid thread count"));
}

#[test]
fn test_invalid_regex_rejected() {
    let dir = tempdir().unwrap();
    let result = run(&[
        "scan",
        dir.path().to_str().unwrap(),
        "--exclude-pattern",
        "([unclosed",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_missing_root_is_error() {
    let result = run(&["scan", "/non/existent/path/that/really/should/not/exist"]);
    assert!(result.is_err());
}

#[test]
fn test_explicit_config_file() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.keep", b"same");
    write(dir.path(), "b.keep", b"same");
    write(dir.path(), "c.skip", b"same");

    let config = dir.path().join("bytedupe.toml");
    fs::write(&config, "threads = 2\nexclude_patterns = ['\\.keep$']\n").unwrap();

    // Only c.skip survives the filter, so nothing is duplicated.
    let code = run(&[
        "--config",
        config.to_str().unwrap(),
        "scan",
        dir.path().to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_missing_config_file_is_error() {
    let dir = tempdir().unwrap();
    let result = run(&[
        "--config",
        "/no/such/bytedupe.toml",
        "scan",
        dir.path().to_str().unwrap(),
    ]);
    assert!(result.is_err());
}

#[cfg(unix)]
#[test]
fn test_exit_code_files_failed() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"dup");
    write(dir.path(), "b.txt", b"dup");
    write(dir.path(), "c.txt", b"dup");
    let locked = dir.path().join("c.txt");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if File::open(&locked).is_ok() {
        // Running as root; permissions are not enforced.
        return;
    }

    let code = run(&["scan", dir.path().to_str().unwrap()]).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(code, ExitCode::FilesFailed);
}
