#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::{TempDir, tempdir};

/// Two-record dataset used throughout: `mjd` values 5 and 15 weighted by 2 and 3.
pub const MJD_CSV: &str = "mjd,mjd_n\n5,2\n15,3\n";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` under the workspace (creating parent folders) and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(name)).expect("read workspace file")
    }

    /// The `histplot` binary, running inside this workspace.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("histplot").expect("binary exists");
        cmd.current_dir(self.path()).env("RUST_LOG", "warn");
        cmd
    }
}
