//! The tracer-handler implementation: syscall allowlist, fs-filter
//! enforcement, fd tracking, and result commit. Ported from gsandbox's
//! `executor_tracker_handler.go` `HandleTracerSyscallEnterEvent` /
//! `HandleTracerSyscallLeaveEvent` / `HandleTracerNewChildEvent`, whose
//! per-syscall-class `goto`-style dispatch is re-expressed here as a `match`
//! on the decoded syscall name.
//!
//! Owns its own `HashMap<Pid, FsFilter>`, deliberately separate from the
//! tracer's `HashMap<Pid, TraceeState>` (see `tracee.rs`): this mirrors
//! gsandbox's two distinct per-pid maps, one in the tracer package and one
//! in the executor.

use chrono::Utc;
use log::{debug, trace, warn};
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use std::collections::HashMap;

use crate::error::SandboxError;
use crate::fs_filter::{FsFilter, Mode};
use crate::policy::Policy;
use crate::result::{ExitStatus, ResultBuilder, SandboxResult as Report, Verdict};
use crate::syscall::{ArgValue, Syscall};
use crate::tracer::TracerHandler;

const AT_FDCWD: i32 = libc::AT_FDCWD;
const F_DUPFD: i32 = libc::F_DUPFD;
const F_DUPFD_CLOEXEC: i32 = libc::F_DUPFD_CLOEXEC;
const F_GETFD: i32 = libc::F_GETFD;
const F_SETFD: i32 = libc::F_SETFD;
const F_GETFL: i32 = libc::F_GETFL;
const F_SETFL: i32 = libc::F_SETFL;

enum FsCheck {
    Allow,
    Deny(String),
}

fn path_arg(syscall: &mut Syscall, pos: usize) -> Result<String, SandboxError> {
    match syscall.arg(pos).read()? {
        ArgValue::Path(p) => Ok(p.clone()),
        other => Err(SandboxError::sandbox_failure(format!(
            "expected Path argument at position {}, decoded {:?} instead",
            pos, other
        ))),
    }
}

fn open_requires_write(flags: u32) -> bool {
    let f = flags & !(libc::O_CLOEXEC as u32 | libc::O_NONBLOCK as u32 | libc::O_TMPFILE as u32);
    f != libc::O_RDONLY as u32
}

pub struct Supervisor {
    policy: Policy,
    filters: HashMap<i32, FsFilter>,
    root_pid: Pid,
    root_pgid: Pid,
    result_builder: ResultBuilder,
    killed: bool,
    verdict: Option<Verdict>,
    final_result: Option<Report>,
}

impl Supervisor {
    pub fn new(policy: Policy, root_pid: Pid, root_pgid: Pid) -> Result<Self, SandboxError> {
        let mut root_filter = FsFilter::new(root_pid)?;
        for path in &policy.fs.rd_files {
            root_filter.add_allowed_file(path, Mode::RD)?;
        }
        for path in &policy.fs.wr_files {
            root_filter.add_allowed_file(path, Mode::WR)?;
        }
        for path in &policy.fs.ex_files {
            root_filter.add_allowed_file(path, Mode::EX)?;
        }

        let mut filters = HashMap::new();
        filters.insert(root_pid.as_raw(), root_filter);

        Ok(Supervisor {
            policy,
            filters,
            root_pid,
            root_pgid,
            result_builder: ResultBuilder::new(Utc::now()),
            killed: false,
            verdict: None,
            final_result: None,
        })
    }

    pub fn into_result(self) -> Option<Report> {
        self.final_result
    }

    fn kill_group(&mut self) {
        if self.killed {
            return;
        }
        self.killed = true;
        let pgid = Pid::from_raw(-self.root_pgid.as_raw());
        if let Err(e) = nix::sys::signal::kill(pgid, Signal::SIGKILL) {
            warn!("supervisor: killpg({}) failed: {}", self.root_pgid, e);
        }
    }

    fn fail_sandbox(&mut self, pid: Pid, reason: String) -> bool {
        warn!("tracee {}: sandbox failure: {}", pid, reason);
        self.verdict = Some(Verdict::SandboxFailure(reason));
        self.kill_group();
        false
    }

    fn fail_violation(&mut self, pid: Pid, reason: String) -> bool {
        warn!("tracee {}: violation: {}", pid, reason);
        self.verdict = Some(Verdict::Violation(reason));
        self.kill_group();
        false
    }

    fn filter_mut(&mut self, pid: Pid) -> Option<&mut FsFilter> {
        self.filters.get_mut(&pid.as_raw())
    }

    /// The syscall-class table, folded into one dispatch: decides what
    /// (path, dirfd, permission) tuples this syscall touches and checks
    /// each against the calling tracee's filter.
    fn check_fs_access(filter: &FsFilter, syscall: &mut Syscall) -> Result<FsCheck, SandboxError> {
        let name = syscall.name().to_string();

        macro_rules! check {
            ($allowed:expr, $ctx:expr) => {
                if $allowed {
                    Ok(FsCheck::Allow)
                } else {
                    Ok(FsCheck::Deny($ctx))
                }
            };
        }

        match name.as_str() {
            "read" => {
                let fd = syscall.arg(0).as_fd();
                check!(filter.allow_read("", fd)?, format!("ReadDisallowed: fd={}", fd))
            }
            "write" => {
                let fd = syscall.arg(0).as_fd();
                check!(filter.allow_write("", fd)?, format!("WriteDisallowed: fd={}", fd))
            }
            "open" | "creat" => {
                let path = path_arg(syscall, 0)?;
                let wants_write = if name == "creat" {
                    true
                } else {
                    open_requires_write(syscall.arg(1).as_flags())
                };
                let allowed =
                    if wants_write { filter.allow_write(&path, AT_FDCWD)? } else { filter.allow_read(&path, AT_FDCWD)? };
                check!(
                    allowed,
                    format!("{}: path={}", if wants_write { "WriteDisallowed" } else { "ReadDisallowed" }, path)
                )
            }
            "openat" => {
                let dirfd = syscall.arg(0).as_fd();
                let path = path_arg(syscall, 1)?;
                let wants_write = open_requires_write(syscall.arg(2).as_flags());
                let allowed = if wants_write {
                    filter.allow_write(&path, dirfd)?
                } else {
                    filter.allow_read(&path, dirfd)?
                };
                check!(
                    allowed,
                    format!("{}: path={} dirfd={}", if wants_write { "WriteDisallowed" } else { "ReadDisallowed" }, path, dirfd)
                )
            }
            "stat" | "lstat" | "access" => {
                let path = path_arg(syscall, 0)?;
                check!(filter.allow_read(&path, AT_FDCWD)?, format!("ReadDisallowed: path={}", path))
            }
            "fstat" | "fstatfs" | "fchdir" | "fgetxattr" => {
                let fd = syscall.arg(0).as_fd();
                check!(filter.allow_read("", fd)?, format!("ReadDisallowed: fd={}", fd))
            }
            "newfstatat" | "statx" | "faccessat" | "faccessat2" | "readlinkat" => {
                let dirfd = syscall.arg(0).as_fd();
                let path = path_arg(syscall, 1)?;
                check!(filter.allow_read(&path, dirfd)?, format!("ReadDisallowed: path={} dirfd={}", path, dirfd))
            }
            "mkdirat" | "unlinkat" | "fchmodat" => {
                let dirfd = syscall.arg(0).as_fd();
                let path = path_arg(syscall, 1)?;
                check!(filter.allow_write(&path, dirfd)?, format!("WriteDisallowed: path={} dirfd={}", path, dirfd))
            }
            "linkat" => {
                let dirfd = syscall.arg(0).as_fd();
                let path = path_arg(syscall, 1)?;
                check!(filter.allow_read(&path, dirfd)?, format!("ReadDisallowed: path={} dirfd={}", path, dirfd))
            }
            "symlinkat" => {
                let dirfd = syscall.arg(1).as_fd();
                let path = path_arg(syscall, 2)?;
                check!(filter.allow_write(&path, dirfd)?, format!("WriteDisallowed: path={} dirfd={}", path, dirfd))
            }
            "renameat" | "renameat2" => {
                let old_dirfd = syscall.arg(0).as_fd();
                let old_path = path_arg(syscall, 1)?;
                let new_dirfd = syscall.arg(2).as_fd();
                let new_path = path_arg(syscall, 3)?;
                if !filter.allow_write(&old_path, old_dirfd)? {
                    return Ok(FsCheck::Deny(format!("WriteDisallowed: path={} dirfd={}", old_path, old_dirfd)));
                }
                check!(
                    filter.allow_write(&new_path, new_dirfd)?,
                    format!("WriteDisallowed: path={} dirfd={}", new_path, new_dirfd)
                )
            }
            "execveat" => {
                let dirfd = syscall.arg(0).as_fd();
                let path = path_arg(syscall, 1)?;
                check!(filter.allow_execute(&path, dirfd)?, format!("ExecDisallowed: path={} dirfd={}", path, dirfd))
            }
            "rename" | "link" | "symlink" => {
                let a = path_arg(syscall, 0)?;
                let b = path_arg(syscall, 1)?;
                if !filter.allow_write(&a, AT_FDCWD)? {
                    return Ok(FsCheck::Deny(format!("WriteDisallowed: path={}", a)));
                }
                check!(filter.allow_write(&b, AT_FDCWD)?, format!("WriteDisallowed: path={}", b))
            }
            "mkdir" | "unlink" => {
                let path = path_arg(syscall, 0)?;
                check!(filter.allow_write(&path, AT_FDCWD)?, format!("WriteDisallowed: path={}", path))
            }
            "readlink" | "statfs" | "getxattr" | "lgetxattr" | "chdir" => {
                let path = path_arg(syscall, 0)?;
                check!(filter.allow_read(&path, AT_FDCWD)?, format!("ReadDisallowed: path={}", path))
            }
            "chmod" => {
                let path = path_arg(syscall, 0)?;
                check!(filter.allow_write(&path, AT_FDCWD)?, format!("WriteDisallowed: path={}", path))
            }
            "fchmod" => {
                let fd = syscall.arg(0).as_fd();
                check!(filter.allow_write("", fd)?, format!("WriteDisallowed: fd={}", fd))
            }
            "execve" => {
                let path = path_arg(syscall, 0)?;
                check!(filter.allow_execute(&path, AT_FDCWD)?, format!("ExecDisallowed: path={}", path))
            }
            "close" | "dup" | "dup2" | "dup3" | "pipe" | "pipe2" | "fcntl" => Ok(FsCheck::Allow),
            _ => {
                if syscall.descriptor().has_fd_or_path_param() {
                    Ok(FsCheck::Deny(format!("NotImplemented: {}", name)))
                } else {
                    Ok(FsCheck::Allow)
                }
            }
        }
    }

    fn update_fs_filter_on_leave(
        filter: &mut FsFilter,
        name: &str,
        prev: &mut Syscall,
        current: &mut Syscall,
    ) -> Result<Option<String>, SandboxError> {
        let ret = current.ret().value();
        match name {
            "open" | "creat" => {
                let path = path_arg(prev, 0)?;
                filter.track(ret as i32, &path, AT_FDCWD)?;
            }
            "openat" => {
                let dirfd = prev.arg(0).as_fd();
                let path = path_arg(prev, 1)?;
                filter.track(ret as i32, &path, dirfd)?;
            }
            "close" => {
                filter.untrack(prev.arg(0).as_fd());
            }
            "pipe" | "pipe2" => {
                let ints = match current.arg(0).read()? {
                    ArgValue::PipeFd(pair) => *pair,
                    other => {
                        return Err(SandboxError::sandbox_failure(format!(
                            "expected PipeFd at leave of {}, decoded {:?}",
                            name, other
                        )))
                    }
                };
                filter.track_mem_fd(ints[0], Mode::RD)?;
                filter.track_mem_fd(ints[1], Mode::WR)?;
            }
            "dup" | "dup2" | "dup3" => {
                let src_fd = prev.arg(0).as_fd();
                let path = filter.get_tracked(src_fd)?.to_string();
                filter.track(ret as i32, &path, AT_FDCWD)?;
            }
            "fcntl" => {
                let cmd = prev.arg(1).as_flags() as i32;
                if cmd == F_DUPFD || cmd == F_DUPFD_CLOEXEC {
                    let src_fd = prev.arg(0).as_fd();
                    let path = filter.get_tracked(src_fd)?.to_string();
                    filter.track(ret as i32, &path, AT_FDCWD)?;
                } else if cmd == F_GETFD || cmd == F_SETFD || cmd == F_GETFL || cmd == F_SETFL {
                    // treated as a no-op; F_SETFL|O_APPEND does not change the tracked path
                } else {
                    return Ok(Some(format!("NotImplemented: fcntl(cmd={})", cmd)));
                }
            }
            _ => {}
        }
        Ok(None)
    }
}

impl TracerHandler for Supervisor {
    fn on_exited(&mut self, pid: Pid, exit_code: i32, rusage: libc::rusage, is_root: bool) {
        self.filters.remove(&pid.as_raw());
        if is_root {
            let verdict = self.verdict.take();
            self.final_result = Some(self.result_builder.build(ExitStatus::Exited(exit_code), rusage, verdict));
        }
    }

    fn on_signaled(&mut self, pid: Pid, signal: Signal, rusage: libc::rusage, is_root: bool) {
        self.filters.remove(&pid.as_raw());
        if is_root {
            let verdict = self.verdict.take();
            self.final_result = Some(self.result_builder.build(ExitStatus::Signaled(signal), rusage, verdict));
        }
    }

    fn on_new_child(&mut self, parent: Pid, child: Pid) {
        let child_filter = match self.filters.get(&parent.as_raw()) {
            Some(parent_filter) => FsFilter::inherit_from(child, parent_filter),
            None => {
                warn!("supervisor: new child {} reported for untracked parent {}", child, parent);
                return;
            }
        };
        self.filters.insert(child.as_raw(), child_filter);
        debug!("tracee {}: new child {} inherits filter", parent, child);
    }

    fn on_enter(&mut self, pid: Pid, syscall: &mut Syscall) -> bool {
        trace!("tracee {}: ENTER {}({})", pid, syscall.name(), syscall.format_args());

        if !self.policy.syscalls.contains(syscall.name()) {
            let reason = format!("IllegalCall: {}", syscall.name());
            return self.fail_violation(pid, reason);
        }

        let filter = match self.filters.get(&pid.as_raw()) {
            Some(f) => f,
            None => return self.fail_sandbox(pid, format!("no fs filter tracked for pid {}", pid)),
        };

        match Self::check_fs_access(filter, syscall) {
            Ok(FsCheck::Allow) => true,
            Ok(FsCheck::Deny(reason)) => self.fail_violation(pid, reason),
            Err(e) => self.fail_sandbox(pid, e.to_string()),
        }
    }

    fn on_leave(&mut self, pid: Pid, syscall: &mut Syscall, prev: &mut Syscall) -> bool {
        let name = prev.name().to_string();
        trace!("tracee {}: LEAVE {} -> {}", pid, name, syscall.ret().value());

        if name == "exit" || name == "exit_group" {
            return true;
        }

        let ret = syscall.ret();
        if ret.has_error_enosys() {
            return self.fail_sandbox(pid, format!("ptrace: ENOSYS: {}", name));
        }
        if ret.has_error() {
            return true;
        }

        let filter = match self.filter_mut(pid) {
            Some(f) => f,
            None => return self.fail_sandbox(pid, format!("no fs filter tracked for pid {}", pid)),
        };

        match Self::update_fs_filter_on_leave(filter, &name, prev, syscall) {
            Ok(None) => true,
            Ok(Some(reason)) => self.fail_violation(pid, reason),
            Err(e) => self.fail_sandbox(pid, e.to_string()),
        }
    }

    fn on_failure(&mut self, err: SandboxError) {
        warn!("supervisor: {}", err);
        self.verdict = Some(Verdict::SandboxFailure(err.to_string()));
        self.kill_group();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::Limits;
    use crate::policy::FsPolicy;
    use std::collections::HashSet;

    fn test_policy(syscalls: &[&str]) -> Policy {
        Policy {
            share_net: false,
            env: true,
            work_dir: None,
            limits: Limits::default(),
            syscalls: syscalls.iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
            fs: FsPolicy::default(),
        }
    }

    #[test]
    fn open_flag_logic_matches_spec_boundary_cases() {
        assert!(!open_requires_write(libc::O_RDONLY as u32 | libc::O_CLOEXEC as u32));
        assert!(open_requires_write(
            libc::O_WRONLY as u32 | libc::O_CLOEXEC as u32 | libc::O_NONBLOCK as u32 | libc::O_TMPFILE as u32
        ));
    }

    #[test]
    fn illegal_syscall_is_tracked_as_a_violation_reason() {
        let policy = test_policy(&["read", "write"]);
        assert!(!policy.syscalls.contains("socket"));
    }
}
