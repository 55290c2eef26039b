//! Integration tests for pyseek

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use predicates::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Home directory for runs that do not bring their own, so the log file
/// never lands in the real `~/.config/pyseek`
fn scratch_home() -> PathBuf {
    PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("pyseek-home")
}

fn pyseek_cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("pyseek");
    cmd.env("HOME", scratch_home());
    cmd.env("PYSEEK_CONFIG", fixture_path("pyseek.toml"));
    cmd
}

#[test]
fn test_version() {
    pyseek_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pyseek"));
}

#[test]
fn test_help() {
    pyseek_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("PEP 514"));
}

#[test]
fn test_log_file_stays_in_home() {
    let home = TempDir::new().expect("temp home");
    pyseek_cmd()
        .env("HOME", home.path())
        .args(["list", "--registry-file"])
        .arg(fixture_path("registry.toml"))
        .assert()
        .success();

    #[cfg(not(windows))]
    assert!(home.path().join(".config").join("pyseek").join("pyseek.log").is_file());
}

#[test]
fn test_invalid_command() {
    pyseek_cmd().arg("invalid").assert().failure();
}

#[test]
fn test_list_fixture_without_installs() {
    pyseek_cmd()
        .args(["list", "--registry-file"])
        .arg(fixture_path("registry.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No Python interpreters found"));
}

#[test]
fn test_list_reports_missing_exe_when_verbose() {
    let home = TempDir::new().expect("temp home");
    pyseek_cmd()
        .env("HOME", home.path())
        .args(["-v", "list", "--registry-file"])
        .arg(fixture_path("registry.toml"))
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "PEP-514 violation in Windows Registry at HKEY_CURRENT_USER/PythonCore/3.9 error: exe does not exists",
        ));
}

#[test]
fn test_list_missing_registry_file_fails() {
    pyseek_cmd()
        .args(["list", "--registry-file", "no-such-registry.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load registry file"));
}

#[cfg(not(windows))]
#[test]
fn test_list_live_registry_is_empty_off_windows() {
    pyseek_cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No Python interpreters found"));
}

/// A registry dump whose installs point at real files in a temp dir
struct RegistryHarness {
    dir: TempDir,
    registry_file: PathBuf,
}

impl RegistryHarness {
    fn new() -> io::Result<Self> {
        let dir = TempDir::new()?;
        let py39 = dir.path().join("Python39");
        let conda = dir.path().join("conda");
        fs::create_dir_all(&py39)?;
        fs::create_dir_all(&conda)?;
        fs::write(py39.join("python.exe"), "")?;
        fs::write(conda.join("python.exe"), "")?;

        let registry_file = dir.path().join("registry.toml");
        fs::write(&registry_file, registry_toml(&py39, &conda))?;
        Ok(Self { dir, registry_file })
    }

    fn command(&self) -> Command {
        let mut cmd = pyseek_cmd();
        cmd.env("HOME", self.dir.path());
        cmd.arg("list").arg("--registry-file").arg(&self.registry_file);
        cmd
    }
}

fn registry_toml(py39: &Path, conda: &Path) -> String {
    let py39_exe = py39.join("python.exe");
    let conda_exe = conda.join("python.exe");
    format!(
        r#"
['HKEY_CURRENT_USER\Software\Python\PythonCore\3.9']
SysVersion = "3.9"

['HKEY_CURRENT_USER\Software\Python\PythonCore\3.9\InstallPath']
ExecutablePath = '{py39}'

['HKEY_LOCAL_MACHINE\Software\Python\ContinuumAnalytics\Anaconda39-32']
SysVersion = "3.9"
SysArchitecture = "32bit"

['HKEY_LOCAL_MACHINE\Software\Python\ContinuumAnalytics\Anaconda39-32\InstallPath']
ExecutablePath = '{conda}'
ExecutableArguments = "-E"

['HKEY_LOCAL_MACHINE\Software\WOW6432Node\Python\PythonCore\3.9']
SysVersion = "3.9"

['HKEY_LOCAL_MACHINE\Software\WOW6432Node\Python\PythonCore\3.9\InstallPath']
ExecutablePath = '{py39}'
"#,
        py39 = py39_exe.display(),
        conda = conda_exe.display(),
    )
}

#[test]
fn test_list_registry_file() {
    let env = RegistryHarness::new().expect("registry harness");
    env.command()
        .assert()
        .success()
        .stdout(predicate::str::contains("python3.9-64"))
        .stdout(predicate::str::contains("ContinuumAnalytics3.9-32"))
        .stdout(predicate::str::contains("python3.9-32"));
}

#[test]
fn test_list_json() {
    let env = RegistryHarness::new().expect("registry harness");
    let output = env
        .command()
        .arg("--json")
        .output()
        .expect("run pyseek list --json");
    assert!(output.status.success());

    let records: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("list --json prints JSON");
    let records = records.as_array().expect("a JSON array");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["name"], "python");
    assert_eq!(records[0]["major"], 3);
    assert_eq!(records[0]["minor"], 9);
    assert_eq!(records[0]["architecture"], 64);
    assert_eq!(records[1]["name"], "ContinuumAnalytics");
    assert_eq!(records[1]["arguments"], "-E");
    assert_eq!(records[2]["architecture"], 32);
}

#[test]
fn test_list_dedupe() {
    let env = RegistryHarness::new().expect("registry harness");
    env.command()
        .arg("--dedupe")
        .assert()
        .success()
        .stdout(predicate::str::contains("python3.9-64"))
        .stdout(predicate::str::contains("python3.9-32").not());
}

#[test]
fn test_config_show() {
    pyseek_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration:"))
        .stdout(predicate::str::contains("dist-dir"));
}

#[test]
fn test_config_get() {
    pyseek_cmd()
        .args(["config", "get", "dist-dir"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dist"));
}

#[test]
fn test_config_path() {
    pyseek_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pyseek.toml"));
}

#[test]
fn test_config_set_round_trips_through_file() {
    let home = TempDir::new().expect("temp home");
    let config_path = home.path().join("pyseek.toml");
    let cmd = || {
        let mut cmd = cargo_bin_cmd!("pyseek");
        cmd.env("HOME", home.path());
        cmd.env("PYSEEK_CONFIG", &config_path);
        cmd
    };

    cmd().args(["config", "set", "dedupe", "yes"]).assert().success();
    cmd()
        .args(["config", "get", "dedupe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("true"));

    let saved = fs::read_to_string(&config_path).expect("config was written");
    assert!(saved.contains("dedupe = true"));
}

#[test]
fn test_config_set_unknown_key() {
    let home = TempDir::new().expect("temp home");
    let mut cmd = cargo_bin_cmd!("pyseek");
    cmd.env("HOME", home.path())
        .env("PYSEEK_CONFIG", home.path().join("pyseek.toml"))
        .args(["config", "set", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key: colour"));
}

#[test]
fn test_clean_empties_directory() {
    let home = TempDir::new().expect("temp home");
    let target = home.path().join("dist");
    fs::create_dir_all(target.join("nested")).expect("create dist");
    fs::write(target.join("old.zip"), "x").expect("write stale artifact");

    pyseek_cmd()
        .env("HOME", home.path())
        .arg("clean")
        .arg(&target)
        .assert()
        .success();

    assert!(target.is_dir());
    assert_eq!(fs::read_dir(&target).expect("read dist").count(), 0);
}

#[test]
fn test_build_without_project_fails() {
    let home = TempDir::new().expect("temp home");
    pyseek_cmd()
        .env("HOME", home.path())
        .args(["build", "--legacy", "--python", "python"])
        .arg("--dir")
        .arg(home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No setup.py found"));
}

#[test]
fn test_build_flags_conflict() {
    pyseek_cmd()
        .args(["build", "--isolated", "--legacy"])
        .assert()
        .failure();
}
