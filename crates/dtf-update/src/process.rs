//! Operating-system process boundary

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use sysinfo::{Pid, ProcessStatus, System};
use tracing::debug;

/// Queries and spawns the processes involved in a replacement
pub trait ProcessControl: Send + Sync {
    /// Whether `pid` names a live (non-zombie) process
    fn is_running(&self, pid: u32) -> bool;

    /// Start `program` with `args` so it outlives the caller; returns its pid
    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> io::Result<u32>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessControl;

impl ProcessControl for SystemProcessControl {
    fn is_running(&self, pid: u32) -> bool {
        let pid = Pid::from_u32(pid);
        let mut sys = System::new();
        if !sys.refresh_process(pid) {
            return false;
        }
        sys.process(pid)
            .map(|process| !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead))
            .unwrap_or(false)
    }

    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> io::Result<u32> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        if let Some(dir) = program.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            command.current_dir(dir);
        }

        detach(&mut command);

        let child = command.spawn()?;
        debug!("Spawned {} as pid {}", program.display(), child.id());
        Ok(child.id())
    }
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    // Own process group: no terminal signals from the parent's session
    command.process_group(0);
}

#[cfg(windows)]
fn detach(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_command: &mut Command) {}
