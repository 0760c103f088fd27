//! Tracee virtual-memory reads, word at a time via `PTRACE_PEEKDATA`.
//! Grounded in the word-loop idiom other ptrace tools in this pack use
//! around `nix::sys::ptrace::read` (e.g. `wangbj-systrace`'s `peek_bytes`).

use nix::sys::ptrace;
use nix::unistd::Pid;
use std::mem::size_of;

use crate::error::{SandboxError, SandboxResult};

const WORD_SIZE: usize = size_of::<i64>();
const PATH_MAX: usize = 4096;

fn peek_word(pid: Pid, addr: u64) -> SandboxResult<[u8; WORD_SIZE]> {
    let word = ptrace::read(pid, addr as ptrace::AddressType)
        .map_err(|e| SandboxError::sandbox_failure(format!("ptrace: peek({:#x}): {}", addr, e)))?;
    Ok(word.to_ne_bytes())
}

/// Reads a NUL-terminated string starting at `addr`, one word at a time,
/// stopping at the first NUL or after `max` bytes. `addr == 0` is treated as
/// the literal tracee-side null pointer and returns `"<nil>"` without
/// touching tracee memory.
pub fn peek_string(pid: Pid, addr: u64, max: usize) -> SandboxResult<String> {
    if addr == 0 {
        return Ok("<nil>".to_string());
    }

    let mut bytes = Vec::with_capacity(WORD_SIZE * 4);
    let mut cursor = addr;
    loop {
        let word = peek_word(pid, cursor)?;
        for &b in word.iter() {
            if b == 0 {
                return Ok(String::from_utf8_lossy(&bytes).into_owned());
            }
            bytes.push(b);
            if bytes.len() >= max {
                return Err(SandboxError::sandbox_failure(format!(
                    "ptrace: path exceeds {} bytes at {:#x}",
                    max, addr
                )));
            }
        }
        cursor += WORD_SIZE as u64;
    }
}

/// Convenience wrapper using the conventional `PATH_MAX` ceiling.
pub fn peek_path(pid: Pid, addr: u64) -> SandboxResult<String> {
    peek_string(pid, addr, PATH_MAX)
}

/// Reads `n` little-endian signed 32-bit integers starting at `addr`.
pub fn peek_int_array(pid: Pid, addr: u64, n: usize) -> SandboxResult<Vec<i32>> {
    if addr == 0 {
        return Err(SandboxError::sandbox_failure("ptrace: peek_int_array: <nil> addr"));
    }

    let total_bytes = n * 4;
    let mut bytes = Vec::with_capacity(total_bytes);
    let mut cursor = addr;
    while bytes.len() < total_bytes {
        let word = peek_word(pid, cursor)?;
        bytes.extend_from_slice(&word);
        cursor += WORD_SIZE as u64;
    }
    bytes.truncate(total_bytes);

    Ok(bytes
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
