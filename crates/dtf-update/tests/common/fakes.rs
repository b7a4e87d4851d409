//! Scripted process control

use std::collections::HashSet;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dtf_update::ProcessControl;

/// One recorded `spawn_detached` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRecord {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

/// Reports the configured pids as running and records spawns instead of
/// starting anything
#[derive(Debug, Clone, Default)]
pub struct FakeProcessControl {
    running: Arc<Mutex<HashSet<u32>>>,
    spawns: Arc<Mutex<Vec<SpawnRecord>>>,
    fail_spawns: bool,
}

impl FakeProcessControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// `pid` stays alive until [`FakeProcessControl::exit`] is called
    pub fn with_running(self, pid: u32) -> Self {
        self.running.lock().unwrap().insert(pid);
        self
    }

    pub fn failing_spawns(mut self) -> Self {
        self.fail_spawns = true;
        self
    }

    pub fn exit(&self, pid: u32) {
        self.running.lock().unwrap().remove(&pid);
    }

    pub fn spawns(&self) -> Vec<SpawnRecord> {
        self.spawns.lock().unwrap().clone()
    }
}

impl ProcessControl for FakeProcessControl {
    fn is_running(&self, pid: u32) -> bool {
        self.running.lock().unwrap().contains(&pid)
    }

    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> io::Result<u32> {
        if self.fail_spawns {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "spawn refused"));
        }
        let mut spawns = self.spawns.lock().unwrap();
        spawns.push(SpawnRecord {
            program: program.to_path_buf(),
            args: args.to_vec(),
        });
        Ok(50_000 + spawns.len() as u32)
    }
}
