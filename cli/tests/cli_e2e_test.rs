use assert_cmd::{Command, cargo_bin_cmd};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn strata() -> Command {
    cargo_bin_cmd!("strata")
}

fn fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

mod help_and_version {
    use super::*;
    use predicates::prelude::predicate;

    #[test]
    fn test_help_flag() {
        strata()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"))
            .stdout(predicate::str::contains("Commands:"))
            .stdout(predicate::str::contains("--file"));
    }

    #[test]
    fn test_version_flag() {
        strata()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("strata"));
    }

    #[test]
    fn test_no_args_shows_help() {
        strata()
            .assert()
            .failure()
            .stderr(predicate::str::contains("Usage:"));
    }
}

mod get_command {
    use super::*;
    use predicates::prelude::predicate;

    #[test]
    fn test_get_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let file = fixture(&dir, "app.json", r#"{"Server": {"Port": 5000}}"#);

        strata()
            .args(["get", "server:PORT", "--file"])
            .arg(&file)
            .assert()
            .success()
            .stdout("5000\n");
    }

    #[test]
    fn test_later_file_wins() {
        let dir = TempDir::new().unwrap();
        let base = fixture(&dir, "base.yaml", "Server:\n  Port: 5000\n");
        let local = fixture(&dir, "local.toml", "[server]\nport = 6000\n");

        strata()
            .args(["get", "Server:Port", "-f"])
            .arg(&base)
            .arg("-f")
            .arg(&local)
            .assert()
            .success()
            .stdout("6000\n");
    }

    #[test]
    fn test_set_overrides_file_and_env() {
        let dir = TempDir::new().unwrap();
        let file = fixture(&dir, "app.ini", "[Server]\nPort=5000\n");

        strata()
            .env("STRATAE2E_SERVER__PORT", "7000")
            .args(["get", "Server:Port", "--env-prefix", "STRATAE2E_", "--file"])
            .arg(&file)
            .assert()
            .success()
            .stdout("7000\n");

        strata()
            .env("STRATAE2E_SERVER__PORT", "7000")
            .args(["get", "Server:Port", "--env-prefix", "STRATAE2E_"])
            .args(["--set", "Server:Port=8000", "--file"])
            .arg(&file)
            .assert()
            .success()
            .stdout("8000\n");
    }

    #[test]
    fn test_missing_key_fails() {
        strata()
            .args(["get", "Nope", "--set", "A=1"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Key 'Nope' not found"));
    }

    #[test]
    fn test_missing_key_with_default() {
        strata()
            .args(["get", "Nope", "--default", "fallback"])
            .assert()
            .success()
            .stdout("fallback\n");
    }
}

mod check_command {
    use super::*;
    use predicates::prelude::predicate;

    #[test]
    fn test_check_reports_all_missing() {
        strata()
            .args(["check", "A", "B", "C", "--set", "A=1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "Missing required configuration keys: B, C",
            ));
    }

    #[test]
    fn test_check_passes() {
        strata()
            .args(["check", "a", "--set", "A=1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("All 1 required key(s) present"));
    }
}

mod dump_command {
    use super::*;
    use predicates::prelude::PredicateBooleanExt;
    use predicates::prelude::predicate;

    #[test]
    fn test_dump_masks_by_default() {
        let dir = TempDir::new().unwrap();
        let file = fixture(
            &dir,
            "app.json",
            r#"{"Database": {"Password": "SuperSecret", "Host": "db"}}"#,
        );

        strata()
            .args(["dump", "--file"])
            .arg(&file)
            .assert()
            .success()
            .stdout(predicate::str::contains("Database:Password = *******cret"))
            .stdout(predicate::str::contains("Database:Host = db"))
            .stdout(predicate::str::contains("SuperSecret").not());
    }

    #[test]
    fn test_dump_no_mask() {
        strata()
            .args(["dump", "--no-mask", "--set", "Api:Token=abcdefgh"])
            .assert()
            .success()
            .stdout("Api:Token = abcdefgh\n");
    }

    #[test]
    fn test_dump_is_sorted_case_insensitively() {
        strata()
            .args(["dump", "--set", "beta=2", "--set", "Alpha=1"])
            .assert()
            .success()
            .stdout("Alpha = 1\nbeta = 2\n");
    }
}

mod export_command {
    use super::*;

    #[test]
    fn test_export_section_as_json() {
        let dir = TempDir::new().unwrap();
        let file = fixture(
            &dir,
            "app.yaml",
            "Server:\n  Port: 5000\n  Hosts:\n    - a\n    - b\nMode: prod\n",
        );

        let output = strata()
            .args(["export", "--section", "server", "--file"])
            .arg(&file)
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["Port"], "5000");
        assert_eq!(json["Hosts:0"], "a");
        assert_eq!(json["Hosts:1"], "b");
        assert!(json.get("Mode").is_none());
    }
}

mod layers_command {
    use super::*;
    use predicates::prelude::predicate;

    #[test]
    fn test_layers_json() {
        let dir = TempDir::new().unwrap();
        let file = fixture(&dir, "app.json", r#"{"A": 1, "B": 2}"#);

        let output = strata()
            .args(["layers", "--json", "--set", "C=3", "--file"])
            .arg(&file)
            .output()
            .unwrap();
        assert!(output.status.success());

        let layers: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let layers = layers.as_array().unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0]["kind"], "json");
        assert_eq!(layers[0]["key_count"], 2);
        assert_eq!(layers[1]["kind"], "commandline");
        assert_eq!(layers[1]["location"], "<CommandLine>");
    }

    #[test]
    fn test_layers_table() {
        strata()
            .args(["layers", "--set", "A=1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("<CommandLine>"));
    }
}

mod load_errors {
    use super::*;
    use predicates::prelude::predicate;

    #[test]
    fn test_missing_file_fails() {
        strata()
            .args(["dump", "--file", "/nonexistent/strata/app.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to load configuration"));
    }

    #[test]
    fn test_missing_optional_file_is_empty() {
        strata()
            .args(["dump", "--optional-file", "/nonexistent/strata/app.json"])
            .assert()
            .success()
            .stdout("");
    }

    #[test]
    fn test_malformed_file_fails() {
        let dir = TempDir::new().unwrap();
        let file = fixture(&dir, "app.json", "{ not json");

        strata()
            .args(["dump", "--file"])
            .arg(&file)
            .assert()
            .failure()
            .stderr(predicate::str::contains("app.json"));
    }

    #[test]
    fn test_unknown_extension_fails() {
        let dir = TempDir::new().unwrap();
        let file = fixture(&dir, "app.cfg", "A=1");

        strata()
            .args(["dump", "--file"])
            .arg(&file)
            .assert()
            .failure();
    }
}

mod watch_command {
    use super::*;
    use std::io::{BufRead, BufReader, Read};
    use std::process::{Child, Stdio};
    use std::sync::mpsc::{self, Receiver};
    use std::thread;
    use std::time::{Duration, Instant};

    fn lines<R: Read + Send + 'static>(stream: R) -> Receiver<String> {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stream).lines().map_while(Result::ok) {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        rx
    }

    fn wait_for(rx: &Receiver<String>, needle: &str) -> Option<String> {
        let deadline = Instant::now() + Duration::from_secs(10);
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            match rx.recv_timeout(remaining) {
                Ok(line) if line.contains(needle) => return Some(line),
                Ok(_) => {}
                Err(_) => return None,
            }
        }
        None
    }

    struct KillOnDrop(Child);

    impl Drop for KillOnDrop {
        fn drop(&mut self) {
            let _ = self.0.kill();
            let _ = self.0.wait();
        }
    }

    #[test]
    fn test_watch_prints_modified_key() {
        let dir = TempDir::new().unwrap();
        let file = fixture(&dir, "app.json", r#"{"Server": {"Port": 5000}}"#);

        let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_strata"))
            .env("NO_COLOR", "1")
            .args(["watch", "--file"])
            .arg(&file)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let stdout = lines(child.stdout.take().unwrap());
        let stderr = lines(child.stderr.take().unwrap());
        let _child = KillOnDrop(child);

        assert!(wait_for(&stderr, "watching").is_some());
        fs::write(&file, r#"{"Server": {"Port": 6000}}"#).unwrap();

        let line = wait_for(&stdout, "Server:Port").expect("no change line printed");
        assert!(line.contains("~ Server:Port = 5000 -> 6000"), "got: {}", line);
    }
}
