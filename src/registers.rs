//! amd64 register snapshot and the arg/nr/ret accessors the rest of the
//! supervisor builds on. Wraps `libc::user_regs_struct` directly rather than
//! a hand-rolled union or a multi-arch register file, since only x86_64 is
//! supported here.

use libc::user_regs_struct;
use static_assertions::const_assert_eq;

const_assert_eq!(std::mem::size_of::<user_regs_struct>(), 27 * 8);

/// A snapshot of the tracee's general-purpose registers taken at a single
/// ptrace stop. Opaque to callers beyond the accessors below.
#[derive(Clone, Copy, Debug)]
pub struct Registers(user_regs_struct);

impl Registers {
    pub fn from_raw(regs: user_regs_struct) -> Self {
        Registers(regs)
    }

    /// Syscall number, from `orig_rax`. Distinct from `ret()` (`rax`) even
    /// though both alias the same register slot at different points in the
    /// syscall's lifetime.
    pub fn nr(&self) -> u64 {
        self.0.orig_rax
    }

    /// Raw return-value register (`rax`), meaningful only at LEAVE.
    pub fn ret(&self) -> i64 {
        self.0.rax as i64
    }

    /// Argument register for position `pos` (0-5), per the amd64 calling
    /// convention: RDI, RSI, RDX, R10, R8, R9.
    pub fn arg(&self, pos: usize) -> u64 {
        match pos {
            0 => self.0.rdi,
            1 => self.0.rsi,
            2 => self.0.rdx,
            3 => self.0.r10,
            4 => self.0.r8,
            5 => self.0.r9,
            _ => panic!("argument position out of range [{}] with length 6", pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs_with(orig_rax: u64, rax: u64, rdi: u64, rsi: u64) -> Registers {
        let mut r: user_regs_struct = unsafe { std::mem::zeroed() };
        r.orig_rax = orig_rax;
        r.rax = rax;
        r.rdi = rdi;
        r.rsi = rsi;
        Registers::from_raw(r)
    }

    #[test]
    fn nr_and_ret_do_not_conflate() {
        let regs = regs_with(2, (-1i64) as u64, 0, 0);
        assert_eq!(regs.nr(), 2);
        assert_eq!(regs.ret(), -1);
    }

    #[test]
    fn arg_maps_to_the_right_register() {
        let regs = regs_with(0, 0, 0x1000, 0x2000);
        assert_eq!(regs.arg(0), 0x1000);
        assert_eq!(regs.arg(1), 0x2000);
    }

    #[test]
    #[should_panic]
    fn arg_out_of_range_panics() {
        let regs = regs_with(0, 0, 0, 0);
        regs.arg(6);
    }
}
