//! Per-pid enter/leave state, owned by the tracer loop: the `in_syscall`
//! flag and the pending ENTER snapshot. Keyed by pid in a map owned by
//! `Tracer` — never a single global slot, since tracees interleave and each
//! needs its own `prev_enter`. Mirrors gsandbox's `pkg/ptrace/tracer.go`
//! `Tracee{insyscall, in}`, which is intentionally separate from the
//! fs-filter map the supervisor owns.

use crate::syscall::Syscall;

pub struct TraceeState {
    /// `true` when the next syscall-stop for this pid is an ENTER.
    pub in_syscall: bool,
    pub prev_enter: Option<Syscall>,
}

impl TraceeState {
    pub fn new() -> Self {
        TraceeState { in_syscall: true, prev_enter: None }
    }
}

impl Default for TraceeState {
    fn default() -> Self {
        Self::new()
    }
}
