//! The clone/namespace/uid-map/`PTRACE_TRACEME` spawn preamble. Namespace
//! flags and the uid/gid map shape are ported from gsandbox's `executor.go`
//! `setupCmdNamespace`; the `PTRACE_TRACEME` handshake itself has no
//! counterpart there (gsandbox shells out via `exec.Cmd` without ptrace)
//! and is written in the idiom other `nix::sched::clone` callers use.

use nix::sched::CloneFlags;
use nix::sys::ptrace;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;
use std::ffi::CString;

use crate::error::{SandboxError, SandboxResult};
use crate::policy::Policy;

const CHILD_STACK_SIZE: usize = 1024 * 1024;

fn to_cstring(s: &str, what: &str) -> SandboxResult<CString> {
    CString::new(s).map_err(|_| SandboxError::exec_failure(format!("{} contains a NUL byte: {:?}", what, s)))
}

fn build_environment(policy: &Policy) -> Vec<CString> {
    if !policy.env {
        return Vec::new();
    }
    std::env::vars()
        .filter_map(|(k, v)| CString::new(format!("{}={}", k, v)).ok())
        .collect()
}

fn clone_flags(share_net: bool) -> CloneFlags {
    let mut flags = CloneFlags::CLONE_NEWNS
        | CloneFlags::CLONE_NEWUTS
        | CloneFlags::CLONE_NEWIPC
        | CloneFlags::CLONE_NEWPID
        | CloneFlags::CLONE_NEWUSER;
    if !share_net {
        flags |= CloneFlags::CLONE_NEWNET;
    }
    flags
}

/// Runs inside the new child, before it has any namespace/uid-map
/// guarantees beyond what `clone()` itself established. Stops itself with
/// `SIGSTOP` after `PTRACE_TRACEME` so the parent can finish setting up
/// uid/gid maps and rlimits while the child is inert.
fn child_preamble(prog: &CString, argv: &[CString], envp: &[CString], work_dir: &Option<String>) -> nix::Result<()> {
    nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))?;
    if let Some(dir) = work_dir {
        nix::unistd::chdir(dir.as_str())?;
    }
    ptrace::traceme()?;
    signal::raise(Signal::SIGSTOP)?;
    nix::unistd::execve(prog, argv, envp)?;
    unreachable!("execve only returns on error, which is propagated via `?` above");
}

fn write_id_map(pid: Pid, file: &str, container_id: u32, host_id: u32, size: u32) -> SandboxResult<()> {
    let path = format!("/proc/{}/{}", pid, file);
    std::fs::write(&path, format!("{} {} {}\n", container_id, host_id, size))
        .map_err(|e| SandboxError::sandbox_failure(format!("writing {}: {}", path, e)))
}

fn disable_setgroups(pid: Pid) -> SandboxResult<()> {
    let path = format!("/proc/{}/setgroups", pid);
    std::fs::write(&path, "deny\n").map_err(|e| SandboxError::sandbox_failure(format!("writing {}: {}", path, e)))
}

/// Spawns `program` under the namespace/uid-map preamble and attaches
/// ptrace via the standard `PTRACE_TRACEME` handshake. Returns the child's
/// pid once it is stopped at the handshake `SIGSTOP`, with rlimits already
/// applied — ready to hand to `Tracer::run`. The child's process group id
/// equals its pid (`setpgid(0, 0)` in the child).
pub fn spawn(policy: &Policy, program: &str, args: &[String]) -> SandboxResult<Pid> {
    let prog = to_cstring(program, "program path")?;
    let mut argv = vec![to_cstring(program, "argv[0]")?];
    for a in args {
        argv.push(to_cstring(a, "argument")?);
    }
    let envp = build_environment(policy);
    let work_dir = policy.work_dir.clone();

    let mut stack = vec![0u8; CHILD_STACK_SIZE];
    let flags = clone_flags(policy.share_net);

    let child_fn = Box::new(move || -> isize {
        match child_preamble(&prog, &argv, &envp, &work_dir) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("syscage: child preamble failed: {}", e);
                unsafe { libc::_exit(127) }
            }
        }
    });

    let pid = unsafe { nix::sched::clone(child_fn, &mut stack, flags, Some(libc::SIGCHLD)) }
        .map_err(|e| SandboxError::exec_failure(format!("clone: {}", e)))?;

    match waitpid(pid, None) {
        Ok(WaitStatus::Stopped(p, Signal::SIGSTOP)) if p == pid => {}
        Ok(other) => {
            return Err(SandboxError::exec_failure(format!(
                "unexpected wait status while waiting for the handshake stop: {:?}",
                other
            )))
        }
        Err(e) => return Err(SandboxError::exec_failure(format!("waitpid: {}", e))),
    }

    write_id_map(pid, "uid_map", 0, nix::unistd::getuid().as_raw(), 1)?;
    disable_setgroups(pid)?;
    write_id_map(pid, "gid_map", 0, nix::unistd::getgid().as_raw(), 1)?;

    crate::limits::apply(pid, &policy.limits)?;

    Ok(pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_flags_always_include_pid_and_user_namespaces() {
        let f = clone_flags(false);
        assert!(f.contains(CloneFlags::CLONE_NEWPID));
        assert!(f.contains(CloneFlags::CLONE_NEWUSER));
        assert!(f.contains(CloneFlags::CLONE_NEWNET));
    }

    #[test]
    fn share_net_drops_the_net_namespace_flag() {
        let f = clone_flags(true);
        assert!(!f.contains(CloneFlags::CLONE_NEWNET));
    }

    #[test]
    fn to_cstring_rejects_embedded_nul() {
        assert!(to_cstring("a\0b", "test").is_err());
    }
}
