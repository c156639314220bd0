//! Identifying and signalling the process that hosts a run
//!
//! A PID alone can be reused once its process exits, so a host is identified
//! by its PID together with the time that process started.

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// The process that spawned a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHost {
    pub pid: u32,
    /// Process start, seconds since the Unix epoch
    pub started_at: u64,
}

impl RunHost {
    /// Identity of this process
    pub fn current() -> Option<Self> {
        Self::of(std::process::id())
    }

    /// Identity of a running process, `None` if there is no such process
    pub fn of(pid: u32) -> Option<Self> {
        signal_target(pid)?;
        process_start_time(pid).map(|started_at| Self { pid, started_at })
    }

    /// Whether this host is a live process other than the current one.
    /// A different process that reuses the PID does not count.
    pub fn is_alive_elsewhere(&self) -> bool {
        self.pid != std::process::id() && Self::of(self.pid).as_ref() == Some(self)
    }

    /// Ask the host to stop its run, the way Ctrl-C would
    pub fn interrupt(&self) -> std::io::Result<()> {
        if !self.is_alive_elsewhere() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("process {} no longer hosts this run", self.pid),
            ));
        }
        send_interrupt(self.pid)
    }
}

/// PIDs that name exactly one process when signalled. 0 and values past
/// `i32::MAX` would address process groups or every process.
fn signal_target(pid: u32) -> Option<i32> {
    i32::try_from(pid).ok().filter(|pid| *pid > 0)
}

fn process_start_time(pid: u32) -> Option<u64> {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing(),
    );
    system.process(pid).map(|process| process.start_time())
}

#[cfg(unix)]
fn send_interrupt(pid: u32) -> std::io::Result<()> {
    use nix::sys::signal::{kill, Signal};

    let target = signal_target(pid).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("invalid pid {pid}"))
    })?;
    kill(nix::unistd::Pid::from_raw(target), Signal::SIGINT).map_err(std::io::Error::from)
}

#[cfg(not(unix))]
fn send_interrupt(_pid: u32) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "stopping runs hosted by another process is not supported on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_host_is_not_elsewhere() {
        let host = RunHost::current().unwrap();
        assert_eq!(host.pid, std::process::id());
        assert!(!host.is_alive_elsewhere());
    }

    #[test]
    fn test_unsignallable_pids_are_rejected() {
        assert_eq!(signal_target(0), None);
        assert_eq!(signal_target(u32::MAX), None);
        assert_eq!(signal_target(i32::MAX as u32 + 1), None);
        assert_eq!(signal_target(42), Some(42));
        assert!(RunHost::of(0).is_none());
        assert!(RunHost::of(u32::MAX).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_parent_process_is_alive_elsewhere() {
        let parent = RunHost::of(std::os::unix::process::parent_id()).unwrap();
        assert!(parent.is_alive_elsewhere());
    }

    #[cfg(unix)]
    #[test]
    fn test_reused_pid_is_not_the_host() {
        let parent = RunHost::of(std::os::unix::process::parent_id()).unwrap();
        let impostor = RunHost {
            started_at: parent.started_at.saturating_sub(3600),
            ..parent
        };
        assert!(!impostor.is_alive_elsewhere());
        assert!(impostor.interrupt().is_err());
    }

    #[test]
    fn test_out_of_range_host_is_never_signalled() {
        let host = RunHost {
            pid: u32::MAX,
            started_at: 0,
        };
        assert!(!host.is_alive_elsewhere());
        assert!(host.interrupt().is_err());
    }
}
