#![allow(dead_code)]

pub mod stub_store;

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper struct to run phonedesk commands in an isolated temp directory
pub struct PhonedeskTest {
    pub temp_dir: TempDir,
    binary_path: String,
    api_url: Option<String>,
}

impl PhonedeskTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        PhonedeskTest {
            temp_dir,
            binary_path: env!("CARGO_BIN_EXE_phonedesk").to_string(),
            api_url: None,
        }
    }

    /// Point every command at a record store, overriding the config file
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = Some(url.to_string());
        self
    }

    pub fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .args(args)
            .current_dir(self.temp_dir.path())
            .env_remove("PHONEDESK_ROOT")
            .env_remove("PHONEDESK_BOT_TOKEN")
            .env_remove("PHONEDESK_LOG");
        match &self.api_url {
            Some(url) => command.env("PHONEDESK_API_URL", url),
            None => command.env_remove("PHONEDESK_API_URL"),
        };
        command
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("Failed to execute phonedesk command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn write_config(&self, content: &str) {
        let dir = self.temp_dir.path().join(".phonedesk");
        fs::create_dir_all(&dir).expect("Failed to create .phonedesk directory");
        let path = dir.join("config.yaml");
        fs::write(path, content).expect("Failed to write config file");
    }

    pub fn read_config(&self) -> String {
        let path = self.temp_dir.path().join(".phonedesk").join("config.yaml");
        fs::read_to_string(path).expect("Failed to read config file")
    }

    pub fn config_exists(&self) -> bool {
        self.temp_dir
            .path()
            .join(".phonedesk")
            .join("config.yaml")
            .exists()
    }
}

impl Default for PhonedeskTest {
    fn default() -> Self {
        Self::new()
    }
}
