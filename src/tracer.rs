//! The wait loop: demultiplexes `wait4` statuses, drives each tracee's
//! per-pid enter/leave state machine, and dispatches to a `TracerHandler`.
//! Ported from gsandbox's `pkg/ptrace/tracer.go` `Tracer.trace`, extended
//! with clone/fork/vfork new-child dispatch (gsandbox only special-cases
//! execve/execveat's duplicate-enter stop; this generalizes that to
//! `clone` as well, and reports new children so the supervisor can seed an
//! inherited fs filter).

use libc::{c_int, pid_t};
use log::{debug, warn};
use nix::sys::ptrace;
use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use std::collections::HashMap;

use crate::error::{SandboxError, SandboxResult};
use crate::registers::Registers;
use crate::syscall::Syscall;
use crate::tracee::TraceeState;

pub trait TracerHandler {
    fn on_exited(&mut self, pid: Pid, exit_code: i32, rusage: libc::rusage, is_root: bool);
    fn on_signaled(&mut self, pid: Pid, signal: Signal, rusage: libc::rusage, is_root: bool);
    fn on_new_child(&mut self, parent: Pid, child: Pid);
    /// Returns whether the tracee should be resumed.
    fn on_enter(&mut self, pid: Pid, syscall: &mut Syscall) -> bool;
    fn on_leave(&mut self, pid: Pid, syscall: &mut Syscall, prev: &mut Syscall) -> bool;
    fn on_failure(&mut self, err: SandboxError);
}

fn trace_options() -> ptrace::Options {
    ptrace::Options::PTRACE_O_TRACESYSGOOD
        | ptrace::Options::PTRACE_O_TRACEEXIT
        | ptrace::Options::PTRACE_O_TRACECLONE
        | ptrace::Options::PTRACE_O_TRACEFORK
        | ptrace::Options::PTRACE_O_TRACEVFORK
}

fn wait4(root_pid: Pid) -> SandboxResult<(Pid, c_int, libc::rusage)> {
    let mut status: c_int = 0;
    let mut ru: libc::rusage = unsafe { std::mem::zeroed() };
    let wpid: pid_t = unsafe {
        libc::wait4(-root_pid.as_raw(), &mut status as *mut c_int, libc::__WALL, &mut ru as *mut libc::rusage)
    };
    if wpid < 0 {
        return Err(SandboxError::sandbox_failure(format!(
            "wait4: {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok((Pid::from_raw(wpid), status, ru))
}

pub struct Tracer {
    root_pid: Pid,
    tracees: HashMap<i32, TraceeState>,
}

impl Tracer {
    pub fn new(root_pid: Pid) -> Self {
        let mut tracees = HashMap::new();
        tracees.insert(root_pid.as_raw(), TraceeState::new());
        Tracer { root_pid, tracees }
    }

    /// Runs until the root tracee exits or is signaled, or a fatal error
    /// forces an early return. `root_pid` must already be ptrace-stopped
    /// (the handshake stop spawned by `spawn.rs`); this is the first stop
    /// that `ptrace::setoptions` attaches to.
    pub fn run(&mut self, handler: &mut dyn TracerHandler) {
        if let Err(e) = ptrace::setoptions(self.root_pid, trace_options()) {
            handler.on_failure(SandboxError::sandbox_failure(format!("ptrace setoptions: {}", e)));
            return;
        }
        if let Err(e) = ptrace::syscall(self.root_pid, None) {
            handler.on_failure(SandboxError::sandbox_failure(format!("ptrace syscall (initial resume): {}", e)));
            return;
        }

        loop {
            let (wpid, status, rusage) = match wait4(self.root_pid) {
                Ok(v) => v,
                Err(e) => {
                    handler.on_failure(e);
                    return;
                }
            };

            let ws = match WaitStatus::from_raw(wpid, status) {
                Ok(ws) => ws,
                Err(_) => {
                    handler.on_failure(SandboxError::sandbox_failure(format!(
                        "unrecognized wait status {:#x} for pid {}",
                        status, wpid
                    )));
                    return;
                }
            };

            let is_root = wpid == self.root_pid;
            match ws {
                WaitStatus::Exited(pid, code) => {
                    handler.on_exited(pid, code, rusage, is_root);
                    self.tracees.remove(&pid.as_raw());
                    if is_root {
                        return;
                    }
                }
                WaitStatus::Signaled(pid, sig, _) => {
                    handler.on_signaled(pid, sig, rusage, is_root);
                    self.tracees.remove(&pid.as_raw());
                    if is_root {
                        return;
                    }
                }
                WaitStatus::PtraceEvent(pid, _sig, event) => {
                    if matches!(
                        event,
                        libc::PTRACE_EVENT_CLONE | libc::PTRACE_EVENT_FORK | libc::PTRACE_EVENT_VFORK
                    ) {
                        match ptrace::getevent(pid) {
                            Ok(child_raw) => {
                                let child = Pid::from_raw(child_raw as pid_t);
                                self.tracees.insert(child.as_raw(), TraceeState::new());
                                handler.on_new_child(pid, child);
                            }
                            Err(e) => {
                                handler.on_failure(SandboxError::sandbox_failure(format!(
                                    "ptrace getevent: {}",
                                    e
                                )));
                                return;
                            }
                        }
                    }
                    if !self.resume(pid, None, handler) {
                        return;
                    }
                }
                WaitStatus::PtraceSyscall(pid) => {
                    if !self.handle_syscall_stop(pid, handler) {
                        return;
                    }
                }
                WaitStatus::Stopped(pid, Signal::SIGSTOP) => {
                    self.tracees.entry(pid.as_raw()).or_insert_with(TraceeState::new);
                    if !self.resume(pid, None, handler) {
                        return;
                    }
                }
                WaitStatus::Stopped(pid, sig) => {
                    debug!("tracee {} stopped by {:?}", pid, sig);
                    if !self.resume(pid, Some(sig), handler) {
                        return;
                    }
                }
                other => {
                    warn!("tracer: unexpected wait status {:?}", other);
                }
            }
        }
    }

    fn resume(&self, pid: Pid, signal: Option<Signal>, handler: &mut dyn TracerHandler) -> bool {
        if let Err(e) = ptrace::syscall(pid, signal) {
            handler.on_failure(SandboxError::sandbox_failure(format!("ptrace syscall resume: {}", e)));
            return false;
        }
        true
    }

    fn handle_syscall_stop(&mut self, pid: Pid, handler: &mut dyn TracerHandler) -> bool {
        let regs = match ptrace::getregs(pid) {
            Ok(r) => Registers::from_raw(r),
            Err(e) => {
                handler.on_failure(SandboxError::sandbox_failure(format!("ptrace getregs: {}", e)));
                return false;
            }
        };

        let in_syscall = self.tracees.entry(pid.as_raw()).or_insert_with(TraceeState::new).in_syscall;

        if in_syscall {
            let mut syscall = Syscall::decode(pid, regs);
            let nr = syscall.nr();
            if nr == libc::SYS_execve || nr == libc::SYS_execveat || nr == libc::SYS_clone {
                if syscall.ret().value() == 0 {
                    return self.resume(pid, None, handler);
                }
            }

            if handler.on_enter(pid, &mut syscall) {
                let state = self.tracees.get_mut(&pid.as_raw()).expect("tracee vanished between lookups");
                state.in_syscall = false;
                state.prev_enter = Some(syscall);
                self.resume(pid, None, handler)
            } else {
                // Violation/failure: the handler has already taken the kill
                // path. SIGKILL acts on a ptrace-stopped tracee without
                // needing a resume, so the loop just keeps draining waits.
                true
            }
        } else {
            let mut syscall = Syscall::decode(pid, regs);
            let mut prev = self
                .tracees
                .get_mut(&pid.as_raw())
                .expect("tracee vanished between lookups")
                .prev_enter
                .take()
                .expect("LEAVE observed without a preceding ENTER");

            if handler.on_leave(pid, &mut syscall, &mut prev) {
                let state = self.tracees.get_mut(&pid.as_raw()).expect("tracee vanished between lookups");
                state.in_syscall = true;
                self.resume(pid, None, handler)
            } else {
                true
            }
        }
    }
}
