#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Stdio};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Runs the binary against an isolated home so host config never leaks in.
pub struct TestEnv {
    home: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn home(&self) -> &Path {
        self.home.path()
    }

    pub fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.home.path().join("taskflow.toml");
        std::fs::write(&path, contents).expect("write config");
        path
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("taskflow").expect("binary");
        cmd.env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path().join(".config"))
            .env_remove("TASKFLOW_CONFIG")
            .env_remove("TASKFLOW_ASSISTANT_URL")
            .env_remove("TASKFLOW_API_KEY")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Start `taskflow --json <args> shell` for a line-by-line conversation.
    pub fn spawn_shell(&self, args: &[&str]) -> ShellSession {
        let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("taskflow"))
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path().join(".config"))
            .env_remove("TASKFLOW_CONFIG")
            .env_remove("TASKFLOW_ASSISTANT_URL")
            .env_remove("TASKFLOW_API_KEY")
            .env_remove("RUST_LOG")
            .arg("--json")
            .args(args)
            .arg("shell")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn taskflow");
        let stdin = child.stdin.take().expect("stdin");
        let stdout = BufReader::new(child.stdout.take().expect("stdout"));
        ShellSession {
            child,
            stdin: Some(stdin),
            stdout,
        }
    }

    /// Pipe `script` into `taskflow --json <args> shell` and return one
    /// envelope per output line.
    pub fn shell_json(&self, args: &[&str], script: &str) -> Vec<Value> {
        let output = self
            .command()
            .arg("--json")
            .args(args)
            .arg("shell")
            .write_stdin(script)
            .output()
            .expect("run taskflow");
        assert!(
            output.status.success(),
            "taskflow failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        parse_envelopes(&output.stdout)
    }
}

pub fn parse_envelopes(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("json envelope"))
        .collect()
}

pub fn titles(envelope: &Value) -> Vec<String> {
    envelope["data"]["tasks"]
        .as_array()
        .expect("tasks array")
        .iter()
        .map(|task| task["title"].as_str().expect("title").to_string())
        .collect()
}

/// A running shell; every command line answers with one JSON envelope.
pub struct ShellSession {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl ShellSession {
    pub fn send(&mut self, line: &str) -> Value {
        let stdin = self.stdin.as_mut().expect("shell still open");
        writeln!(stdin, "{line}").expect("write command");
        stdin.flush().expect("flush command");

        let mut response = String::new();
        self.stdout.read_line(&mut response).expect("read envelope");
        serde_json::from_str(&response)
            .unwrap_or_else(|err| panic!("bad envelope for {line:?}: {err}: {response:?}"))
    }

    /// Send a command that must succeed and return its `data`.
    pub fn ok(&mut self, line: &str) -> Value {
        let envelope = self.send(line);
        assert_eq!(envelope["status"], "success", "{line:?} failed: {envelope}");
        envelope["data"].clone()
    }

    pub fn close(mut self) {
        drop(self.stdin.take());
        let status = self.child.wait().expect("wait for taskflow");
        assert!(status.success(), "taskflow exited with {status}");
    }
}

impl Drop for ShellSession {
    fn drop(&mut self) {
        drop(self.stdin.take());
        let _ = self.child.wait();
    }
}
