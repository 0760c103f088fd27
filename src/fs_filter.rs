//! Per-tracee filesystem access control. Ported from gsandbox's
//! `pkg/fsfilter/fsfilter.go` `FsFilter` (allowlist + tracked-fd map +
//! synthetic mem-fd paths), with one resolution-rule difference: `.` and
//! `~` are always treated as directories here, not only when the raw input
//! ends in `/`.

use bitflags::bitflags;
use nix::unistd::Pid;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{SandboxError, SandboxResult};

const AT_FDCWD: i32 = libc::AT_FDCWD;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Mode: u8 {
        const RD = 0b001;
        const WR = 0b010;
        const EX = 0b100;
    }
}

#[derive(Clone, Debug)]
pub struct Entry {
    pub abs_path: String,
    pub mode: Mode,
    pub is_dir: bool,
}

#[derive(Clone)]
pub struct FsFilter {
    pid: Pid,
    allowlist: Vec<Entry>,
    tracked: HashMap<i32, String>,
}

static MEMFS_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_memfs_counter() -> u64 {
    MEMFS_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Lexically cleans a path: collapses repeated separators and resolves
/// `.`/`..` components without touching the filesystem. All filter paths
/// are already absolute by the time this runs.
pub fn clean_path(path: &str) -> String {
    let is_abs = path.starts_with('/');
    let mut stack: Vec<&str> = Vec::new();
    for comp in path.split('/') {
        match comp {
            "" | "." => continue,
            ".." => {
                if matches!(stack.last(), Some(&last) if last != "..") {
                    stack.pop();
                } else if !is_abs {
                    stack.push("..");
                }
            }
            c => stack.push(c),
        }
    }
    let joined = stack.join("/");
    if is_abs {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

fn join_clean(base: &str, rel: &str) -> String {
    if rel.is_empty() {
        return clean_path(base);
    }
    let mut joined = PathBuf::from(base);
    joined.push(rel);
    clean_path(&joined.to_string_lossy())
}

fn is_descendant(path: &str, ancestor: &str) -> bool {
    if ancestor == "/" {
        return path != "/";
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

impl FsFilter {
    pub fn new(pid: Pid) -> SandboxResult<Self> {
        let mut fs = FsFilter { pid, allowlist: Vec::new(), tracked: HashMap::new() };

        let stdin_path = fs.fresh_memfs_path("stdin");
        let stdout_path = fs.fresh_memfs_path("stdout");
        let stderr_path = fs.fresh_memfs_path("stderr");

        fs.add_allow_entry(stdin_path.clone(), Mode::RD, false);
        fs.add_allow_entry(stdout_path.clone(), Mode::RD, false);
        fs.add_allow_entry(stderr_path.clone(), Mode::RD, false);
        fs.add_allow_entry(stdout_path.clone(), Mode::WR, false);
        fs.add_allow_entry(stderr_path.clone(), Mode::WR, false);

        fs.tracked.insert(libc::STDIN_FILENO, stdin_path);
        fs.tracked.insert(libc::STDOUT_FILENO, stdout_path);
        fs.tracked.insert(libc::STDERR_FILENO, stderr_path);

        Ok(fs)
    }

    /// Value-copy of `parent`'s allowlist and tracked-fd map at this
    /// instant, re-pinned to `pid`: each child gets its own filter,
    /// independent of the parent's after the copy.
    pub fn inherit_from(pid: Pid, parent: &FsFilter) -> Self {
        FsFilter { pid, allowlist: parent.allowlist.clone(), tracked: parent.tracked.clone() }
    }

    fn fresh_memfs_path(&self, tag: &str) -> String {
        format!("/fsfilter-memfs-{:010}/{}", next_memfs_counter(), tag)
    }

    fn add_allow_entry(&mut self, abs_path: String, mode: Mode, is_dir: bool) {
        self.allowlist.push(Entry { abs_path, mode, is_dir });
    }

    fn cwd(&self) -> SandboxResult<String> {
        let link = format!("/proc/{}/cwd", self.pid);
        std::fs::read_link(&link)
            .map(|p| p.to_string_lossy().into_owned())
            .map_err(|e| SandboxError::sandbox_failure(format!("readlink({}): {}", link, e)))
    }

    fn home_dir(&self) -> SandboxResult<String> {
        std::env::var("HOME")
            .map_err(|_| SandboxError::sandbox_failure("HOME is not set in the supervisor's environment"))
    }

    /// Adds an allow entry from a policy-file path string, resolving `.`,
    /// `~`, and relative prefixes against the tracee's cwd/home.
    pub fn add_allowed_file(&mut self, raw: &str, perm: Mode) -> SandboxResult<()> {
        if raw.is_empty() {
            return Ok(());
        }

        if raw == "/" {
            self.add_allow_entry("/".to_string(), perm, false);
            return Ok(());
        }
        if raw == "." {
            let cwd = self.cwd()?;
            self.add_allow_entry(clean_path(&cwd), perm, true);
            return Ok(());
        }
        if raw == "~" {
            let home = self.home_dir()?;
            self.add_allow_entry(clean_path(&home), perm, true);
            return Ok(());
        }
        if let Some(rest) = raw.strip_prefix("./") {
            let cwd = self.cwd()?;
            self.add_allow_entry(join_clean(&cwd, rest), perm, raw.ends_with('/'));
            return Ok(());
        }
        if let Some(rest) = raw.strip_prefix("~/") {
            let home = self.home_dir()?;
            self.add_allow_entry(join_clean(&home, rest), perm, raw.ends_with('/'));
            return Ok(());
        }
        if raw.ends_with('/') {
            self.add_allow_entry(clean_path(raw), perm, true);
            return Ok(());
        }
        if raw.starts_with('/') {
            self.add_allow_entry(clean_path(raw), perm, false);
            return Ok(());
        }

        Err(SandboxError::violation(format!("InvalidPath: {}", raw)))
    }

    fn resolve(&self, path: &str, dirfd: i32) -> SandboxResult<String> {
        if path.starts_with('/') {
            return Ok(clean_path(path));
        }
        if dirfd == AT_FDCWD {
            let cwd = self.cwd()?;
            return Ok(join_clean(&cwd, path));
        }
        match self.tracked.get(&dirfd) {
            Some(base) => Ok(join_clean(base, path)),
            None => Err(SandboxError::violation(format!("FdNotTracked: dirfd({})", dirfd))),
        }
    }

    fn allow(&self, path: &str, dirfd: i32, perm: Mode) -> SandboxResult<bool> {
        let abs = self.resolve(path, dirfd)?;
        Ok(self.allowlist.iter().any(|e| {
            e.mode.contains(perm) && (abs == e.abs_path || (e.is_dir && is_descendant(&abs, &e.abs_path)))
        }))
    }

    pub fn allow_read(&self, path: &str, dirfd: i32) -> SandboxResult<bool> {
        self.allow(path, dirfd, Mode::RD)
    }

    pub fn allow_write(&self, path: &str, dirfd: i32) -> SandboxResult<bool> {
        self.allow(path, dirfd, Mode::WR)
    }

    pub fn allow_execute(&self, path: &str, dirfd: i32) -> SandboxResult<bool> {
        self.allow(path, dirfd, Mode::EX)
    }

    pub fn track(&mut self, fd: i32, path: &str, dirfd: i32) -> SandboxResult<String> {
        let abs = self.resolve(path, dirfd)?;
        self.tracked.insert(fd, abs.clone());
        Ok(abs)
    }

    pub fn track_mem_fd(&mut self, fd: i32, perm: Mode) -> SandboxResult<String> {
        let path = self.fresh_memfs_path(&format!("file-{:010}", next_memfs_counter()));
        self.add_allow_entry(path.clone(), perm, false);
        self.tracked.insert(fd, path.clone());
        Ok(path)
    }

    pub fn untrack(&mut self, fd: i32) {
        self.tracked.remove(&fd);
    }

    pub fn get_tracked(&self, fd: i32) -> SandboxResult<&str> {
        self.tracked.get(&fd).map(String::as_str).ok_or_else(|| {
            SandboxError::violation(format!("FdNotTracked: fd({})", fd))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> FsFilter {
        FsFilter { pid: Pid::from_raw(1), allowlist: Vec::new(), tracked: HashMap::new() }
    }

    #[test]
    fn clean_path_collapses_dot_and_dotdot() {
        assert_eq!(clean_path("/usr//lib/../lib/x.so"), "/usr/lib/x.so");
        assert_eq!(clean_path("/a/./b/"), "/a/b");
    }

    #[test]
    fn root_entry_is_exact_match_only() {
        let mut fs = filter();
        fs.add_allow_entry("/".to_string(), Mode::RD, false);
        assert!(fs.allow_read("/", AT_FDCWD).unwrap());
        assert!(!fs.allow_read("/etc/hostname", AT_FDCWD).unwrap());
    }

    #[test]
    fn directory_entry_grants_descendants_not_itself_exempt() {
        let mut fs = filter();
        fs.add_allow_entry("/usr".to_string(), Mode::RD, true);
        assert!(fs.allow_read("/usr/lib/x.so", AT_FDCWD).unwrap());
        assert!(fs.allow_read("/usr", AT_FDCWD).unwrap());
        assert!(!fs.allow_read("/usrx", AT_FDCWD).unwrap());
    }

    #[test]
    fn dup_tracking_resolves_through_source_fd() {
        let mut fs = filter();
        fs.add_allow_entry("/tmp/a".to_string(), Mode::RD, false);
        fs.track(10, "/tmp/a", AT_FDCWD).unwrap();
        let path = fs.get_tracked(10).unwrap().to_string();
        fs.track(11, &path, AT_FDCWD).unwrap();
        assert!(fs.allow_read("", 11).unwrap());
        assert_eq!(fs.get_tracked(11).unwrap(), "/tmp/a");
    }

    #[test]
    fn close_of_untracked_fd_is_a_no_op() {
        let mut fs = filter();
        fs.untrack(999);
    }

    #[test]
    fn inherit_is_a_value_copy() {
        let mut parent = filter();
        parent.add_allow_entry("/tmp/a".to_string(), Mode::RD, false);
        parent.track(5, "/tmp/a", AT_FDCWD).unwrap();

        let mut child = FsFilter::inherit_from(Pid::from_raw(2), &parent);
        child.track(6, "/tmp/b", AT_FDCWD).unwrap();

        assert!(parent.get_tracked(6).is_err());
        assert!(child.get_tracked(5).is_ok());
    }
}
