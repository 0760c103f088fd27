//! Static syscall-number -> {name, parameter kinds} table for Linux amd64.
//! Names and coverage are ported from the syscall table in gsandbox's
//! `pkg/ptrace/syscall_linux_amd64.go`; its two-kind parameter model
//! (`Any`/`Path`) is extended here with `Fd`, `PipeFdPair`, `OpenFlags` and
//! `FcntlCmd` so the descriptor itself carries enough information for the
//! supervisor's fd/path catch-all and for `Arg::read()` (`syscall.rs`) to
//! know how to decode each slot.
//!
//! `Fd` is assigned only to the handful of syscalls the supervisor's
//! explicit per-class table (`supervisor.rs`) actually special-cases
//! (`close`, `dup*`, `fcntl`, `fstat`, `fstatfs`, `fchdir`, `fchmod`,
//! `read`, `write`); syscalls that merely *happen* to take a file
//! descriptor (`ioctl`, `mmap`, `flock`, ...) keep `Any` so that ordinary
//! dynamic-linking and I/O machinery isn't swept into the `NotImplemented`
//! catch-all by accident. `Path` mirrors the original table's `ParamTypePath`
//! tags exactly, which is also the set of genuinely path-taking syscalls
//! the supervisor doesn't special-case.

use lazy_static::lazy_static;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Any,
    Int,
    Path,
    Fd,
    PipeFdPair,
    OpenFlags,
    FcntlCmd,
}

#[derive(Clone, Debug)]
pub struct SyscallSig {
    pub name: String,
    pub params: Vec<ParamKind>,
}

impl SyscallSig {
    pub fn has_fd_or_path_param(&self) -> bool {
        self.params
            .iter()
            .any(|p| matches!(p, ParamKind::Fd | ParamKind::Path))
    }
}

macro_rules! sig {
    ($name:expr) => {
        SyscallSig { name: $name.to_string(), params: vec![] }
    };
    ($name:expr, $($p:expr),+ $(,)?) => {
        SyscallSig { name: $name.to_string(), params: vec![$($p),+] }
    };
}

use ParamKind::*;

lazy_static! {
    static ref SYSCALL_TABLE: HashMap<i64, SyscallSig> = {
        let mut m = HashMap::new();
        m.insert(libc::SYS_read, sig!("read", Fd, Any, Any));
        m.insert(libc::SYS_write, sig!("write", Fd, Any, Any));
        m.insert(libc::SYS_open, sig!("open", Path, OpenFlags, Any));
        m.insert(libc::SYS_close, sig!("close", Fd));
        m.insert(libc::SYS_stat, sig!("stat", Path, Any));
        m.insert(libc::SYS_fstat, sig!("fstat", Fd, Any));
        m.insert(libc::SYS_lstat, sig!("lstat", Path, Any));
        m.insert(libc::SYS_poll, sig!("poll", Any, Any, Any));
        m.insert(libc::SYS_lseek, sig!("lseek", Any, Any, Any));
        m.insert(libc::SYS_mmap, sig!("mmap", Any, Any, Any, Any, Any, Any));
        m.insert(libc::SYS_mprotect, sig!("mprotect", Any, Any, Any));
        m.insert(libc::SYS_munmap, sig!("munmap", Any, Any));
        m.insert(libc::SYS_brk, sig!("brk", Any));
        m.insert(libc::SYS_rt_sigaction, sig!("rt_sigaction", Any, Any, Any));
        m.insert(libc::SYS_rt_sigprocmask, sig!("rt_sigprocmask", Any, Any, Any, Any));
        m.insert(libc::SYS_rt_sigreturn, sig!("rt_sigreturn"));
        m.insert(libc::SYS_ioctl, sig!("ioctl", Any, Any, Any));
        m.insert(libc::SYS_pread64, sig!("pread64", Any, Any, Any, Any));
        m.insert(libc::SYS_pwrite64, sig!("pwrite64", Any, Any, Any, Any));
        m.insert(libc::SYS_readv, sig!("readv", Any, Any, Any));
        m.insert(libc::SYS_writev, sig!("writev", Any, Any, Any));
        m.insert(libc::SYS_access, sig!("access", Path, Any));
        m.insert(libc::SYS_pipe, sig!("pipe", PipeFdPair));
        m.insert(libc::SYS_select, sig!("select", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_sched_yield, sig!("sched_yield"));
        m.insert(libc::SYS_mremap, sig!("mremap", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_msync, sig!("msync", Any, Any, Any));
        m.insert(libc::SYS_mincore, sig!("mincore", Any, Any, Any));
        m.insert(libc::SYS_madvise, sig!("madvise", Any, Any, Any));
        m.insert(libc::SYS_shmget, sig!("shmget", Any, Any, Any));
        m.insert(libc::SYS_shmat, sig!("shmat", Any, Any, Any));
        m.insert(libc::SYS_shmctl, sig!("shmctl", Any, Any, Any));
        m.insert(libc::SYS_dup, sig!("dup", Fd));
        m.insert(libc::SYS_dup2, sig!("dup2", Fd, Fd));
        m.insert(libc::SYS_pause, sig!("pause"));
        m.insert(libc::SYS_nanosleep, sig!("nanosleep", Any, Any));
        m.insert(libc::SYS_getitimer, sig!("getitimer", Any, Any));
        m.insert(libc::SYS_alarm, sig!("alarm", Any));
        m.insert(libc::SYS_setitimer, sig!("setitimer", Any, Any, Any));
        m.insert(libc::SYS_getpid, sig!("getpid"));
        m.insert(libc::SYS_sendfile, sig!("sendfile", Any, Any, Any, Any));
        m.insert(libc::SYS_socket, sig!("socket", Any, Any, Any));
        m.insert(libc::SYS_connect, sig!("connect", Any, Any, Any));
        m.insert(libc::SYS_accept, sig!("accept", Any, Any, Any));
        m.insert(libc::SYS_sendto, sig!("sendto", Any, Any, Any, Any, Any, Any));
        m.insert(libc::SYS_recvfrom, sig!("recvfrom", Any, Any, Any, Any, Any, Any));
        m.insert(libc::SYS_sendmsg, sig!("sendmsg", Any, Any, Any));
        m.insert(libc::SYS_recvmsg, sig!("recvmsg", Any, Any, Any));
        m.insert(libc::SYS_shutdown, sig!("shutdown", Any, Any));
        m.insert(libc::SYS_bind, sig!("bind", Any, Any, Any));
        m.insert(libc::SYS_listen, sig!("listen", Any, Any));
        m.insert(libc::SYS_getsockname, sig!("getsockname", Any, Any, Any));
        m.insert(libc::SYS_getpeername, sig!("getpeername", Any, Any, Any));
        m.insert(libc::SYS_socketpair, sig!("socketpair", Any, Any, Any, Any));
        m.insert(libc::SYS_setsockopt, sig!("setsockopt", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_getsockopt, sig!("getsockopt", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_clone, sig!("clone", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_fork, sig!("fork"));
        m.insert(libc::SYS_vfork, sig!("vfork"));
        m.insert(libc::SYS_execve, sig!("execve", Path, Any, Any));
        m.insert(libc::SYS_exit, sig!("exit", Any));
        m.insert(libc::SYS_wait4, sig!("wait4", Any, Any, Any, Any));
        m.insert(libc::SYS_kill, sig!("kill", Any, Any));
        m.insert(libc::SYS_uname, sig!("uname", Any));
        m.insert(libc::SYS_semget, sig!("semget", Any, Any, Any));
        m.insert(libc::SYS_semop, sig!("semop", Any, Any, Any));
        m.insert(libc::SYS_semctl, sig!("semctl", Any, Any, Any, Any));
        m.insert(libc::SYS_shmdt, sig!("shmdt", Any));
        m.insert(libc::SYS_msgget, sig!("msgget", Any, Any));
        m.insert(libc::SYS_msgsnd, sig!("msgsnd", Any, Any, Any, Any));
        m.insert(libc::SYS_msgrcv, sig!("msgrcv", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_msgctl, sig!("msgctl", Any, Any, Any));
        m.insert(libc::SYS_fcntl, sig!("fcntl", Fd, FcntlCmd, Any));
        m.insert(libc::SYS_flock, sig!("flock", Any, Any));
        m.insert(libc::SYS_fsync, sig!("fsync", Any));
        m.insert(libc::SYS_fdatasync, sig!("fdatasync", Any));
        m.insert(libc::SYS_truncate, sig!("truncate", Path, Any));
        m.insert(libc::SYS_ftruncate, sig!("ftruncate", Any, Any));
        m.insert(libc::SYS_getdents, sig!("getdents", Any, Any, Any));
        m.insert(libc::SYS_getcwd, sig!("getcwd", Any, Any));
        m.insert(libc::SYS_chdir, sig!("chdir", Path));
        m.insert(libc::SYS_fchdir, sig!("fchdir", Fd));
        m.insert(libc::SYS_rename, sig!("rename", Path, Path));
        m.insert(libc::SYS_mkdir, sig!("mkdir", Path, Any));
        m.insert(libc::SYS_rmdir, sig!("rmdir", Path));
        m.insert(libc::SYS_creat, sig!("creat", Path, Any));
        m.insert(libc::SYS_link, sig!("link", Path, Path));
        m.insert(libc::SYS_unlink, sig!("unlink", Path));
        m.insert(libc::SYS_symlink, sig!("symlink", Path, Path));
        m.insert(libc::SYS_readlink, sig!("readlink", Path, Any, Any));
        m.insert(libc::SYS_chmod, sig!("chmod", Path, Any));
        m.insert(libc::SYS_fchmod, sig!("fchmod", Fd, Any));
        m.insert(libc::SYS_chown, sig!("chown", Path, Any, Any));
        m.insert(libc::SYS_fchown, sig!("fchown", Any, Any, Any));
        m.insert(libc::SYS_lchown, sig!("lchown", Path, Any, Any));
        m.insert(libc::SYS_umask, sig!("umask", Any));
        m.insert(libc::SYS_gettimeofday, sig!("gettimeofday", Any, Any));
        m.insert(libc::SYS_getrlimit, sig!("getrlimit", Any, Any));
        m.insert(libc::SYS_getrusage, sig!("getrusage", Any, Any));
        m.insert(libc::SYS_sysinfo, sig!("sysinfo", Any));
        m.insert(libc::SYS_times, sig!("times", Any));
        m.insert(libc::SYS_ptrace, sig!("ptrace", Any, Any, Any, Any));
        m.insert(libc::SYS_getuid, sig!("getuid"));
        m.insert(libc::SYS_syslog, sig!("syslog", Any, Any, Any));
        m.insert(libc::SYS_getgid, sig!("getgid"));
        m.insert(libc::SYS_setuid, sig!("setuid", Any));
        m.insert(libc::SYS_setgid, sig!("setgid", Any));
        m.insert(libc::SYS_geteuid, sig!("geteuid"));
        m.insert(libc::SYS_getegid, sig!("getegid"));
        m.insert(libc::SYS_setpgid, sig!("setpgid", Any, Any));
        m.insert(libc::SYS_getppid, sig!("getppid"));
        m.insert(libc::SYS_getpgrp, sig!("getpgrp"));
        m.insert(libc::SYS_setsid, sig!("setsid"));
        m.insert(libc::SYS_setreuid, sig!("setreuid", Any, Any));
        m.insert(libc::SYS_setregid, sig!("setregid", Any, Any));
        m.insert(libc::SYS_getgroups, sig!("getgroups", Any, Any));
        m.insert(libc::SYS_setgroups, sig!("setgroups", Any, Any));
        m.insert(libc::SYS_setresuid, sig!("setresuid", Any, Any, Any));
        m.insert(libc::SYS_getresuid, sig!("getresuid", Any, Any, Any));
        m.insert(libc::SYS_setresgid, sig!("setresgid", Any, Any, Any));
        m.insert(libc::SYS_getresgid, sig!("getresgid", Any, Any, Any));
        m.insert(libc::SYS_getpgid, sig!("getpgid", Any));
        m.insert(libc::SYS_setfsuid, sig!("setfsuid", Any));
        m.insert(libc::SYS_setfsgid, sig!("setfsgid", Any));
        m.insert(libc::SYS_getsid, sig!("getsid", Any));
        m.insert(libc::SYS_capget, sig!("capget", Any, Any));
        m.insert(libc::SYS_capset, sig!("capset", Any, Any));
        m.insert(libc::SYS_rt_sigpending, sig!("rt_sigpending", Any));
        m.insert(libc::SYS_rt_sigtimedwait, sig!("rt_sigtimedwait", Any, Any, Any, Any));
        m.insert(libc::SYS_rt_sigqueueinfo, sig!("rt_sigqueueinfo", Any, Any, Any));
        m.insert(libc::SYS_rt_sigsuspend, sig!("rt_sigsuspend", Any));
        m.insert(libc::SYS_sigaltstack, sig!("sigaltstack", Any, Any));
        m.insert(libc::SYS_mknod, sig!("mknod", Path, Any, Any));
        m.insert(libc::SYS_personality, sig!("personality", Any));
        m.insert(libc::SYS_statfs, sig!("statfs", Path, Any));
        m.insert(libc::SYS_fstatfs, sig!("fstatfs", Fd, Any));
        m.insert(libc::SYS_getpriority, sig!("getpriority", Any, Any));
        m.insert(libc::SYS_setpriority, sig!("setpriority", Any, Any, Any));
        m.insert(libc::SYS_sched_setparam, sig!("sched_setparam", Any, Any));
        m.insert(libc::SYS_sched_getparam, sig!("sched_getparam", Any, Any));
        m.insert(libc::SYS_sched_setscheduler, sig!("sched_setscheduler", Any, Any, Any));
        m.insert(libc::SYS_sched_getscheduler, sig!("sched_getscheduler", Any));
        m.insert(libc::SYS_sched_get_priority_max, sig!("sched_get_priority_max", Any));
        m.insert(libc::SYS_sched_get_priority_min, sig!("sched_get_priority_min", Any));
        m.insert(libc::SYS_sched_rr_get_interval, sig!("sched_rr_get_interval", Any, Any));
        m.insert(libc::SYS_mlock, sig!("mlock", Any, Any));
        m.insert(libc::SYS_munlock, sig!("munlock", Any, Any));
        m.insert(libc::SYS_mlockall, sig!("mlockall", Any));
        m.insert(libc::SYS_munlockall, sig!("munlockall"));
        m.insert(libc::SYS_vhangup, sig!("vhangup"));
        m.insert(libc::SYS_modify_ldt, sig!("modify_ldt", Any, Any, Any));
        m.insert(libc::SYS_pivot_root, sig!("pivot_root", Path, Path));
        m.insert(libc::SYS_prctl, sig!("prctl", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_arch_prctl, sig!("arch_prctl", Any, Any));
        m.insert(libc::SYS_adjtimex, sig!("adjtimex", Any));
        m.insert(libc::SYS_setrlimit, sig!("setrlimit", Any, Any));
        m.insert(libc::SYS_chroot, sig!("chroot", Path));
        m.insert(libc::SYS_sync, sig!("sync"));
        m.insert(libc::SYS_acct, sig!("acct", Path));
        m.insert(libc::SYS_settimeofday, sig!("settimeofday", Any, Any));
        m.insert(libc::SYS_mount, sig!("mount", Path, Path, Path, Any, Path));
        m.insert(libc::SYS_umount2, sig!("umount2", Path, Any));
        m.insert(libc::SYS_swapon, sig!("swapon", Path, Any));
        m.insert(libc::SYS_swapoff, sig!("swapoff", Path));
        m.insert(libc::SYS_reboot, sig!("reboot", Any, Any, Any, Any));
        m.insert(libc::SYS_sethostname, sig!("sethostname", Any, Any));
        m.insert(libc::SYS_setdomainname, sig!("setdomainname", Any, Any));
        m.insert(libc::SYS_gettid, sig!("gettid"));
        m.insert(libc::SYS_readahead, sig!("readahead", Any, Any, Any));
        m.insert(libc::SYS_setxattr, sig!("setxattr", Path, Any, Any, Any, Any));
        m.insert(libc::SYS_lsetxattr, sig!("lsetxattr", Path, Any, Any, Any, Any));
        m.insert(libc::SYS_fsetxattr, sig!("fsetxattr", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_getxattr, sig!("getxattr", Path, Any, Any, Any));
        m.insert(libc::SYS_lgetxattr, sig!("lgetxattr", Path, Any, Any, Any));
        m.insert(libc::SYS_fgetxattr, sig!("fgetxattr", Fd, Path, Any, Any));
        m.insert(libc::SYS_listxattr, sig!("listxattr", Path, Any, Any));
        m.insert(libc::SYS_llistxattr, sig!("llistxattr", Path, Any, Any));
        m.insert(libc::SYS_flistxattr, sig!("flistxattr", Any, Any, Any));
        m.insert(libc::SYS_removexattr, sig!("removexattr", Path, Any));
        m.insert(libc::SYS_lremovexattr, sig!("lremovexattr", Path, Any));
        m.insert(libc::SYS_fremovexattr, sig!("fremovexattr", Any, Any));
        m.insert(libc::SYS_tkill, sig!("tkill", Any, Any));
        m.insert(libc::SYS_time, sig!("time", Any));
        m.insert(libc::SYS_futex, sig!("futex", Any, Any, Any, Any, Any, Any));
        m.insert(libc::SYS_sched_setaffinity, sig!("sched_setaffinity", Any, Any, Any));
        m.insert(libc::SYS_sched_getaffinity, sig!("sched_getaffinity", Any, Any, Any));
        m.insert(libc::SYS_io_setup, sig!("io_setup", Any, Any));
        m.insert(libc::SYS_io_destroy, sig!("io_destroy", Any));
        m.insert(libc::SYS_io_getevents, sig!("io_getevents", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_io_submit, sig!("io_submit", Any, Any, Any));
        m.insert(libc::SYS_io_cancel, sig!("io_cancel", Any, Any, Any));
        m.insert(libc::SYS_epoll_create, sig!("epoll_create", Any));
        m.insert(libc::SYS_remap_file_pages, sig!("remap_file_pages", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_getdents64, sig!("getdents64", Any, Any, Any));
        m.insert(libc::SYS_set_tid_address, sig!("set_tid_address", Any));
        m.insert(libc::SYS_restart_syscall, sig!("restart_syscall"));
        m.insert(libc::SYS_semtimedop, sig!("semtimedop", Any, Any, Any, Any));
        m.insert(libc::SYS_fadvise64, sig!("fadvise64", Any, Any, Any, Any));
        m.insert(libc::SYS_timer_create, sig!("timer_create", Any, Any, Any));
        m.insert(libc::SYS_timer_settime, sig!("timer_settime", Any, Any, Any, Any));
        m.insert(libc::SYS_timer_gettime, sig!("timer_gettime", Any, Any));
        m.insert(libc::SYS_timer_getoverrun, sig!("timer_getoverrun", Any));
        m.insert(libc::SYS_timer_delete, sig!("timer_delete", Any));
        m.insert(libc::SYS_clock_settime, sig!("clock_settime", Any, Any));
        m.insert(libc::SYS_clock_gettime, sig!("clock_gettime", Any, Any));
        m.insert(libc::SYS_clock_getres, sig!("clock_getres", Any, Any));
        m.insert(libc::SYS_clock_nanosleep, sig!("clock_nanosleep", Any, Any, Any, Any));
        m.insert(libc::SYS_exit_group, sig!("exit_group", Any));
        m.insert(libc::SYS_epoll_wait, sig!("epoll_wait", Any, Any, Any, Any));
        m.insert(libc::SYS_epoll_ctl, sig!("epoll_ctl", Any, Any, Any, Any));
        m.insert(libc::SYS_tgkill, sig!("tgkill", Any, Any, Any));
        m.insert(libc::SYS_utimes, sig!("utimes", Path, Any));
        m.insert(libc::SYS_mbind, sig!("mbind", Any, Any, Any, Any, Any, Any));
        m.insert(libc::SYS_set_mempolicy, sig!("set_mempolicy", Any, Any, Any));
        m.insert(libc::SYS_get_mempolicy, sig!("get_mempolicy", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_mq_open, sig!("mq_open", Any, Any, Any, Any));
        m.insert(libc::SYS_mq_unlink, sig!("mq_unlink", Any));
        m.insert(libc::SYS_kexec_load, sig!("kexec_load", Any, Any, Any, Any));
        m.insert(libc::SYS_waitid, sig!("waitid", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_add_key, sig!("add_key", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_request_key, sig!("request_key", Any, Any, Any, Any));
        m.insert(libc::SYS_keyctl, sig!("keyctl", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_ioprio_set, sig!("ioprio_set", Any, Any, Any));
        m.insert(libc::SYS_ioprio_get, sig!("ioprio_get", Any, Any));
        m.insert(libc::SYS_inotify_init, sig!("inotify_init"));
        m.insert(libc::SYS_inotify_add_watch, sig!("inotify_add_watch", Any, Path, Any));
        m.insert(libc::SYS_inotify_rm_watch, sig!("inotify_rm_watch", Any, Any));
        m.insert(libc::SYS_migrate_pages, sig!("migrate_pages", Any, Any, Any, Any));
        m.insert(libc::SYS_openat, sig!("openat", Fd, Path, OpenFlags, Any));
        m.insert(libc::SYS_mkdirat, sig!("mkdirat", Fd, Path, Any));
        m.insert(libc::SYS_mknodat, sig!("mknodat", Fd, Path, Any, Any));
        m.insert(libc::SYS_fchownat, sig!("fchownat", Fd, Path, Any, Any, Any));
        m.insert(libc::SYS_futimesat, sig!("futimesat", Fd, Path, Any));
        m.insert(libc::SYS_newfstatat, sig!("newfstatat", Fd, Path, Any, Any));
        m.insert(libc::SYS_unlinkat, sig!("unlinkat", Fd, Path, Any));
        m.insert(libc::SYS_renameat, sig!("renameat", Fd, Path, Fd, Path));
        m.insert(libc::SYS_linkat, sig!("linkat", Fd, Path, Fd, Path, Any));
        m.insert(libc::SYS_symlinkat, sig!("symlinkat", Path, Fd, Path));
        m.insert(libc::SYS_readlinkat, sig!("readlinkat", Fd, Path, Any, Any));
        m.insert(libc::SYS_fchmodat, sig!("fchmodat", Fd, Path, Any));
        m.insert(libc::SYS_faccessat, sig!("faccessat", Fd, Path, Any, Any));
        m.insert(libc::SYS_pselect6, sig!("pselect6", Any, Any, Any, Any, Any, Any));
        m.insert(libc::SYS_ppoll, sig!("ppoll", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_unshare, sig!("unshare", Any));
        m.insert(libc::SYS_set_robust_list, sig!("set_robust_list", Any, Any));
        m.insert(libc::SYS_get_robust_list, sig!("get_robust_list", Any, Any, Any));
        m.insert(libc::SYS_splice, sig!("splice", Any, Any, Any, Any, Any, Any));
        m.insert(libc::SYS_tee, sig!("tee", Any, Any, Any, Any));
        m.insert(libc::SYS_sync_file_range, sig!("sync_file_range", Any, Any, Any, Any));
        m.insert(libc::SYS_vmsplice, sig!("vmsplice", Any, Any, Any, Any));
        m.insert(libc::SYS_move_pages, sig!("move_pages", Any, Any, Any, Any, Any, Any));
        m.insert(libc::SYS_utimensat, sig!("utimensat", Fd, Path, Any, Any));
        m.insert(libc::SYS_epoll_pwait, sig!("epoll_pwait", Any, Any, Any, Any, Any, Any));
        m.insert(libc::SYS_signalfd, sig!("signalfd", Any, Any, Any));
        m.insert(libc::SYS_timerfd_create, sig!("timerfd_create", Any, Any));
        m.insert(libc::SYS_eventfd, sig!("eventfd", Any));
        m.insert(libc::SYS_fallocate, sig!("fallocate", Any, Any, Any, Any));
        m.insert(libc::SYS_timerfd_settime, sig!("timerfd_settime", Any, Any, Any, Any));
        m.insert(libc::SYS_timerfd_gettime, sig!("timerfd_gettime", Any, Any));
        m.insert(libc::SYS_accept4, sig!("accept4", Any, Any, Any, Any));
        m.insert(libc::SYS_signalfd4, sig!("signalfd4", Any, Any, Any, Any));
        m.insert(libc::SYS_eventfd2, sig!("eventfd2", Any, Any));
        m.insert(libc::SYS_epoll_create1, sig!("epoll_create1", Any));
        m.insert(libc::SYS_dup3, sig!("dup3", Fd, Fd, Any));
        m.insert(libc::SYS_pipe2, sig!("pipe2", PipeFdPair, Any));
        m.insert(libc::SYS_inotify_init1, sig!("inotify_init1", Any));
        m.insert(libc::SYS_preadv, sig!("preadv", Any, Any, Any, Any));
        m.insert(libc::SYS_pwritev, sig!("pwritev", Any, Any, Any, Any));
        m.insert(libc::SYS_rt_tgsigqueueinfo, sig!("rt_tgsigqueueinfo", Any, Any, Any, Any));
        m.insert(libc::SYS_perf_event_open, sig!("perf_event_open", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_recvmmsg, sig!("recvmmsg", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_fanotify_init, sig!("fanotify_init", Any, Any));
        m.insert(libc::SYS_fanotify_mark, sig!("fanotify_mark", Any, Any, Any, Any, Path));
        m.insert(libc::SYS_prlimit64, sig!("prlimit64", Any, Any, Any, Any));
        m.insert(libc::SYS_clock_adjtime, sig!("clock_adjtime", Any, Any));
        m.insert(libc::SYS_syncfs, sig!("syncfs", Any));
        m.insert(libc::SYS_sendmmsg, sig!("sendmmsg", Any, Any, Any, Any));
        m.insert(libc::SYS_setns, sig!("setns", Any, Any));
        m.insert(libc::SYS_getcpu, sig!("getcpu", Any, Any, Any));
        m.insert(libc::SYS_process_vm_readv, sig!("process_vm_readv", Any, Any, Any, Any, Any, Any));
        m.insert(libc::SYS_process_vm_writev, sig!("process_vm_writev", Any, Any, Any, Any, Any, Any));
        m.insert(libc::SYS_kcmp, sig!("kcmp", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_finit_module, sig!("finit_module", Any, Any, Any));
        m.insert(libc::SYS_sched_setattr, sig!("sched_setattr", Any, Any, Any));
        m.insert(libc::SYS_sched_getattr, sig!("sched_getattr", Any, Any, Any));
        m.insert(libc::SYS_renameat2, sig!("renameat2", Fd, Path, Fd, Path, Any));
        m.insert(libc::SYS_seccomp, sig!("seccomp", Any, Any, Any));
        m.insert(libc::SYS_getrandom, sig!("getrandom", Any, Any, Any));
        m.insert(libc::SYS_memfd_create, sig!("memfd_create", Any, Any));
        m.insert(libc::SYS_bpf, sig!("bpf", Any, Any, Any));
        m.insert(libc::SYS_execveat, sig!("execveat", Fd, Path, Any, Any, Any));
        m.insert(libc::SYS_userfaultfd, sig!("userfaultfd", Any));
        m.insert(libc::SYS_membarrier, sig!("membarrier", Any, Any, Any));
        m.insert(libc::SYS_mlock2, sig!("mlock2", Any, Any, Any));
        m.insert(libc::SYS_copy_file_range, sig!("copy_file_range", Any, Any, Any, Any, Any, Any));
        m.insert(libc::SYS_preadv2, sig!("preadv2", Any, Any, Any, Any, Any, Any));
        m.insert(libc::SYS_pwritev2, sig!("pwritev2", Any, Any, Any, Any, Any, Any));
        m.insert(libc::SYS_pkey_mprotect, sig!("pkey_mprotect", Any, Any, Any, Any));
        m.insert(libc::SYS_pkey_alloc, sig!("pkey_alloc", Any, Any));
        m.insert(libc::SYS_pkey_free, sig!("pkey_free", Any));
        m.insert(libc::SYS_statx, sig!("statx", Fd, Path, Any, Any, Any));
        m.insert(libc::SYS_io_uring_setup, sig!("io_uring_setup", Any, Any));
        m.insert(libc::SYS_io_uring_enter, sig!("io_uring_enter", Any, Any, Any, Any, Any));
        m.insert(libc::SYS_faccessat2, sig!("faccessat2", Fd, Path, Any, Any));
        m.insert(libc::SYS_rseq, sig!("rseq", Any, Any, Any, Any));
        m
    };
}

/// Looks up the descriptor for `nr`. Unknown numbers yield a synthetic
/// zero-parameter descriptor with a diagnostic name; such invocations can
/// never trip the Fd/Path catch-all, so the supervisor
/// allows them unless the syscall-name allowlist itself rejects the
/// diagnostic name (which it always will, since real policies never
/// enumerate `sys_<nr>`).
pub fn lookup(nr: i64) -> SyscallSig {
    match SYSCALL_TABLE.get(&nr) {
        Some(sig) => sig.clone(),
        None => SyscallSig { name: format!("sys_{}", nr), params: vec![] },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openat_is_tagged_for_the_fs_filter() {
        let sig = lookup(libc::SYS_openat);
        assert_eq!(sig.name, "openat");
        assert!(sig.has_fd_or_path_param());
    }

    #[test]
    fn ioctl_fd_is_not_flagged() {
        let sig = lookup(libc::SYS_ioctl);
        assert!(!sig.has_fd_or_path_param());
    }

    #[test]
    fn unknown_syscall_gets_synthetic_descriptor() {
        let sig = lookup(999_999);
        assert_eq!(sig.name, "sys_999999");
        assert!(!sig.has_fd_or_path_param());
    }
}
