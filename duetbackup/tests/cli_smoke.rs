use std::net::TcpListener;
use std::process::Command;

fn run_backup(args: &[&str]) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_duetbackup");
    Command::new(exe)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("duetbackup should execute")
}

fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn help_lists_primary_flags() {
    let output = run_backup(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--domain"));
    assert!(stdout.contains("--out-dir"));
    assert!(stdout.contains("--exclude"));
    assert!(stdout.contains("--remove-local"));
}

#[test]
fn missing_required_flags_fail() {
    let output = run_backup(&[]);
    assert!(!output.status.success());
}

#[test]
fn unreachable_device_exits_cleanly_without_writing() {
    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("backup");
    let port = closed_port().to_string();

    let output = run_backup(&[
        "--domain",
        "127.0.0.1",
        "--port",
        &port,
        "--out-dir",
        target.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Duet currently not available"));
    assert!(!target.exists());
}

#[test]
fn verbose_flag_enables_debug_output() {
    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("backup");
    let port = closed_port().to_string();
    let args = [
        "--domain",
        "127.0.0.1",
        "--port",
        &port,
        "--out-dir",
        target.to_str().unwrap(),
    ];
    let expected = format!("trying to connect to http://127.0.0.1:{port}/");

    let quiet = run_backup(&args);
    assert!(!String::from_utf8_lossy(&quiet.stderr).contains(&expected));

    let mut verbose_args = args.to_vec();
    verbose_args.push("-v");
    let verbose = run_backup(&verbose_args);
    assert!(verbose.status.success());
    assert!(String::from_utf8_lossy(&verbose.stderr).contains(&expected));
}
