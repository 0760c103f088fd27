//! The syscall value object: pid, register snapshot, descriptor, and
//! lazily-decoded arguments/return value. Grounded in gsandbox's
//! `pkg/ptrace/syscall.go` `Syscall`/`Arg`/`Retval` shape, re-expressed with
//! Rust's typed decode-on-read instead of Go's mutate-in-place `Read()`
//! methods.

use nix::unistd::Pid;

use crate::error::SandboxResult;
use crate::memory;
use crate::registers::Registers;
use crate::syscall_table::{self, ParamKind, SyscallSig};

const ENOSYS: i64 = 38;

/// A decoded syscall argument. `Unread` until `arg(i).read()` is called;
/// the supervisor only decodes the arguments it actually inspects.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    Int(i32),
    Path(String),
    Fd(i32),
    PipeFd([i32; 2]),
    Flags(u32),
}

pub struct Arg<'a> {
    pid: Pid,
    pos: usize,
    kind: ParamKind,
    raw: u64,
    cache: &'a mut Option<ArgValue>,
}

impl<'a> Arg<'a> {
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn raw(&self) -> u64 {
        self.raw
    }

    /// Decodes the argument per its parameter kind, caching the result.
    pub fn read(&mut self) -> SandboxResult<&ArgValue> {
        if self.cache.is_none() {
            let value = match self.kind {
                ParamKind::Path => ArgValue::Path(memory::peek_path(self.pid, self.raw)?),
                ParamKind::PipeFdPair => {
                    let ints = memory::peek_int_array(self.pid, self.raw, 2)?;
                    ArgValue::PipeFd([ints[0], ints[1]])
                }
                ParamKind::Fd => ArgValue::Fd(self.raw as i32),
                ParamKind::OpenFlags | ParamKind::FcntlCmd => ArgValue::Flags(self.raw as u32),
                ParamKind::Int | ParamKind::Any => ArgValue::Int(self.raw as i32),
            };
            *self.cache = Some(value);
        }
        Ok(self.cache.as_ref().unwrap())
    }

    pub fn as_fd(&self) -> i32 {
        self.raw as i32
    }

    pub fn as_flags(&self) -> u32 {
        self.raw as u32
    }
}

/// The return value of a syscall, decoded from `rax` at LEAVE. Negative
/// values in `-4095..=-1` are `-errno` per the Linux syscall ABI.
#[derive(Clone, Copy, Debug)]
pub struct Retval {
    value: i64,
}

impl Retval {
    pub fn from_raw(raw: i64) -> Self {
        Retval { value: raw }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn has_error(&self) -> bool {
        (-4095..=-1).contains(&self.value)
    }

    pub fn has_error_enosys(&self) -> bool {
        self.value == -ENOSYS
    }
}

/// One syscall-stop's worth of state: pid, registers, descriptor, and a
/// lazily-materialized argument cache. Created fresh at every ENTER and
/// every LEAVE; the ENTER instance is preserved by the caller (`tracee.rs`)
/// as `prev_enter` until the matching LEAVE.
pub struct Syscall {
    pid: Pid,
    regs: Registers,
    descriptor: SyscallSig,
    arg_cache: Vec<Option<ArgValue>>,
}

impl Syscall {
    pub fn decode(pid: Pid, regs: Registers) -> Self {
        let descriptor = syscall_table::lookup(regs.nr() as i64);
        let n = descriptor.params.len();
        Syscall { pid, regs, descriptor, arg_cache: vec![None; n] }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn nr(&self) -> i64 {
        self.regs.nr() as i64
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &SyscallSig {
        &self.descriptor
    }

    pub fn arg(&mut self, pos: usize) -> Arg<'_> {
        let kind = self.descriptor.params.get(pos).copied().unwrap_or(ParamKind::Any);
        Arg { pid: self.pid, pos, kind, raw: self.regs.arg(pos), cache: &mut self.arg_cache[pos] }
    }

    pub fn ret(&self) -> Retval {
        Retval::from_raw(self.regs.ret())
    }

    /// Reads every declared argument, for logging and for the supervisor's
    /// decode-all-arguments step at ENTER.
    pub fn read_all_args(&mut self) -> SandboxResult<()> {
        for pos in 0..self.descriptor.params.len() {
            self.arg(pos).read()?;
        }
        Ok(())
    }

    pub fn format_args(&mut self) -> String {
        let n = self.descriptor.params.len();
        let mut parts = Vec::with_capacity(n);
        for pos in 0..n {
            let formatted = match self.arg(pos).read() {
                Ok(v) => format!("{:?}", v),
                Err(_) => "<unreadable>".to_string(),
            };
            parts.push(formatted);
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retval_detects_errno_band() {
        assert!(Retval::from_raw(-1).has_error());
        assert!(Retval::from_raw(-4095).has_error());
        assert!(!Retval::from_raw(-4096).has_error());
        assert!(!Retval::from_raw(0).has_error());
    }

    #[test]
    fn retval_detects_enosys() {
        assert!(Retval::from_raw(-38).has_error_enosys());
        assert!(!Retval::from_raw(-1).has_error_enosys());
    }
}
