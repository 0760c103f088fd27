//! Resource limits applied to the stopped child via `prlimit64`, plus the
//! wallclock deadline timer. Grounded in gsandbox's `prlimit/prlimit.go`
//! (raw `SYS_prlimit64` syscall wrapper) and `limits.go` (the `Limits`
//! struct shape); the wallclock timer has no direct analogue there and is
//! implemented here as a detached deadline thread.

use nix::sys::signal::Signal;
use nix::unistd::Pid;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::{SandboxError, SandboxResult};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Limits {
    pub as_bytes: Option<u64>,
    pub core_bytes: Option<u64>,
    pub cpu_seconds: Option<u64>,
    pub fsize_bytes: Option<u64>,
    pub nofile: Option<u64>,
    pub wallclock: Option<Duration>,
}

fn prlimit64(pid: Pid, resource: libc::c_int, value: u64) -> SandboxResult<()> {
    let rl = libc::rlimit64 { rlim_cur: value, rlim_max: value };
    let ret = unsafe {
        libc::syscall(
            libc::SYS_prlimit64,
            pid.as_raw(),
            resource,
            &rl as *const libc::rlimit64,
            std::ptr::null_mut::<libc::rlimit64>(),
        )
    };
    if ret != 0 {
        return Err(SandboxError::sandbox_failure(format!(
            "prlimit64(resource={}): {}",
            resource,
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}

fn reject_zero(name: &str, value: u64) -> SandboxResult<u64> {
    if value == 0 {
        return Err(SandboxError::sandbox_failure(format!("refusing to set {} to 0", name)));
    }
    Ok(value)
}

/// Applies every limit present in `limits` to `pid`, which must already be
/// ptrace-stopped; rlimits are set before the tracer's first resume.
pub fn apply(pid: Pid, limits: &Limits) -> SandboxResult<()> {
    if let Some(v) = limits.as_bytes {
        prlimit64(pid, libc::RLIMIT_AS, v)?;
    }
    if let Some(v) = limits.core_bytes {
        prlimit64(pid, libc::RLIMIT_CORE, v)?;
    }
    if let Some(v) = limits.cpu_seconds {
        prlimit64(pid, libc::RLIMIT_CPU, v)?;
    }
    if let Some(v) = limits.fsize_bytes {
        prlimit64(pid, libc::RLIMIT_FSIZE, v)?;
    }
    if let Some(v) = limits.nofile {
        prlimit64(pid, libc::RLIMIT_NOFILE, reject_zero("nofile", v)?)?;
    }
    Ok(())
}

/// Spawns a detached thread that sends `SIGKILL` to `root_pgid`'s process
/// group once `wallclock` elapses. A no-op (`None`) when no wallclock limit
/// is configured. The kill on an already-reaped group simply fails with
/// `ESRCH`, which this thread ignores.
pub fn spawn_wallclock_timer(root_pgid: Pid, wallclock: Option<Duration>) -> Option<JoinHandle<()>> {
    let dur = wallclock?;
    Some(std::thread::spawn(move || {
        std::thread::sleep(dur);
        let _ = nix::sys::signal::kill(Pid::from_raw(-root_pgid.as_raw()), Signal::SIGKILL);
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_nofile_is_rejected() {
        assert!(reject_zero("nofile", 0).is_err());
    }

    #[test]
    fn nonzero_nofile_passes_through() {
        assert_eq!(reject_zero("nofile", 256).unwrap(), 256);
    }

    #[test]
    fn no_wallclock_spawns_no_timer() {
        assert!(spawn_wallclock_timer(Pid::from_raw(1), None).is_none());
    }
}
