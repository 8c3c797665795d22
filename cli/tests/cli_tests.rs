//! End-to-end tests for the `slowops` binary.

use assert_cmd::Command;
use std::path::PathBuf;

fn slowops() -> Command {
    let mut cmd = Command::cargo_bin("slowops").unwrap();
    cmd.env_remove("SLOWOPS_SKIP_MAINTENANCE").env_remove("RUST_LOG");
    cmd
}

fn write_log(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_text_line_from_stdin() {
    slowops()
        .write_stdin("2024-01-01T00:00:10.000+0000 did something 500ms\n")
        .assert()
        .success()
        .stdout(
            "2024-01-01T00:00:09.500+0000 => 2024-01-01T00:00:10.000+0000 500ms did something 500ms\n",
        );
}

#[test]
fn test_json_line_from_stdin() {
    let output = stdout_of(slowops().write_stdin(
        r#"{"t":{"$date":"2024-01-01T00:00:10.000Z"},"s":"I","c":"COMMAND","msg":"Slow query","attr":{"durationMillis":1000}}
"#,
    ));

    let record: serde_json::Value = serde_json::from_str(output.trim_end()).unwrap();
    let keys: Vec<&str> = record
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, ["st", "t", "dms", "s", "c", "msg", "attr"]);
    assert_eq!(record["st"], "2024-01-01T00:00:09.000+0000");
    assert_eq!(record["dms"], 1000);
}

#[test]
fn test_json_huge_integer_is_emitted_exactly() {
    slowops()
        .write_stdin(
            r#"{"t":{"$date":"2024-01-01T00:00:10.000Z"},"id":123456789012345678901234567890}
"#,
        )
        .assert()
        .success()
        .stdout(
            r#"{"st":"2024-01-01T00:00:10.000Z","t":{"$date":"2024-01-01T00:00:10.000Z"},"id":123456789012345678901234567890}
"#,
        );
}

#[test]
fn test_mixed_input_keeps_order_and_drops_noise() {
    let input = concat!(
        "2024-01-01T00:00:01.000+0000 first 100ms\n",
        "unrelated line\n",
        r#"{"t":{"$date":"2024-01-01T00:00:02.000+00:00"},"msg":"no duration"}"#,
        "\n",
        "2024-01-01T00:00:03.000+0000 [ftdc] sleeping for 1000ms\n",
        "2024-01-01T00:00:04.000+0000 last 250ms\n",
    );

    let output = stdout_of(slowops().write_stdin(input));
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(
        lines,
        [
            "2024-01-01T00:00:00.900+0000 => 2024-01-01T00:00:01.000+0000 100ms first 100ms",
            r#"{"st":"2024-01-01T00:00:02.000+00:00","t":{"$date":"2024-01-01T00:00:02.000+00:00"},"msg":"no duration"}"#,
            "2024-01-01T00:00:03.750+0000 => 2024-01-01T00:00:04.000+0000 250ms last 250ms",
        ]
    );
}

#[test]
fn test_files_are_read_in_argument_order() {
    let dir = tempfile::tempdir().unwrap();
    let second = write_log(&dir, "b.log", b"2024-01-01T00:00:02.000+0000 b 1ms\n");
    let first = write_log(&dir, "a.log", b"2024-01-01T00:00:01.000+0000 a 1ms\n");

    let output = stdout_of(slowops().arg(&second).arg(&first));
    let bodies: Vec<&str> = output
        .lines()
        .map(|line| line.split(' ').nth(4).unwrap())
        .collect();

    assert_eq!(bodies, ["b", "a"]);
}

#[test]
fn test_unparseable_timestamp_stops_the_run() {
    let input = concat!(
        "2024-01-01T00:00:01.000+0000 before 1ms\n",
        "2024-13-01T00:00:02.000+0000 broken 1ms\n",
        "2024-01-01T00:00:03.000+0000 after 1ms\n",
    );

    slowops().write_stdin(input).assert().code(1).stdout(concat!(
        "2024-01-01T00:00:00.999+0000 => 2024-01-01T00:00:01.000+0000 1ms before 1ms\n",
        "Exception in log line:\n",
        "2024-13-01T00:00:02.000+0000 broken 1ms\n",
    ));
}

#[test]
fn test_invalid_json_exits_with_distinct_code() {
    let output = slowops()
        .write_stdin("{\"t\":{\"$date\":\"2024-01-01T00:00:10.000Z\"}, nope\n")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid JSON log record"));
}

#[test]
fn test_missing_file_fails_after_earlier_output() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_log(&dir, "a.log", b"2024-01-01T00:00:01.000+0000 a 1ms\n");
    let missing = dir.path().join("missing.log");

    let output = slowops().arg(&first).arg(&missing).output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(String::from_utf8(output.stdout).unwrap().lines().count(), 1);
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.log"));
}

#[test]
fn test_invalid_encoding_is_stripped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(
        &dir,
        "latin1.log",
        b"2024-01-01T00:00:10.000+0000 caf\xE9 au lait 10ms\n",
    );

    slowops().arg(&path).assert().success().stdout(
        "2024-01-01T00:00:09.990+0000 => 2024-01-01T00:00:10.000+0000 10ms caf au lait 10ms\n",
    );
}

#[test]
fn test_skip_patterns() {
    let input = concat!(
        "2024-01-01T00:00:10.000+0000 task: UnusedLockCleaner took: 3ms\n",
        "2024-01-01T00:00:10.000+0000 [conn9] query took 3ms\n",
        "2024-01-01T00:00:10.000+0000 [conn10] query took 3ms\n",
    );

    let output = stdout_of(
        slowops()
            .args(["--skip-maintenance", "--skip", r"\[conn9\]"])
            .write_stdin(input),
    );

    assert_eq!(
        output,
        "2024-01-01T00:00:09.997+0000 => 2024-01-01T00:00:10.000+0000 3ms [conn10] query took 3ms\n"
    );
}

#[test]
fn test_skip_maintenance_from_env() {
    slowops()
        .env("SLOWOPS_SKIP_MAINTENANCE", "true")
        .write_stdin("2024-01-01T00:00:10.000+0000 task: UnusedLockCleaner took: 3ms\n")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_invalid_skip_pattern_is_rejected() {
    let output = slowops()
        .args(["--skip", "took ("])
        .write_stdin("2024-01-01T00:00:10.000+0000 x 1ms\n")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid suppression pattern"));
}

#[test]
fn test_stats_are_written_to_stderr() {
    let output = slowops()
        .arg("--stats")
        .write_stdin(concat!(
            "2024-01-01T00:00:10.000+0000 x 1ms\n",
            "2024-01-01T00:00:10.000+0000 sleeping for 5ms\n",
            "noise\n",
        ))
        .output()
        .unwrap();

    assert!(output.status.success());
    let stats: serde_json::Value =
        serde_json::from_str(String::from_utf8(output.stderr).unwrap().trim_end()).unwrap();
    assert_eq!(
        stats,
        serde_json::json!({
            "lines_read": 3,
            "json_records": 0,
            "text_events": 1,
            "suppressed": 1,
        })
    );
}
