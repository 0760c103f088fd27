use thiserror::Error;

/// The three fatal outcomes a running trace can hit, per the sandbox's
/// error-handling design: every core function returns one of these rather
/// than panicking on tracee-controlled or environment-dependent input.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// A ptrace/system-call error internal to the supervisor (register
    /// read, memory read, `PTRACE_SYSCALL`, `waitpid`, `prlimit64`, ...).
    #[error("sandbox failure: {0}")]
    SandboxFailure(String),

    /// A denial by the syscall allowlist or the filesystem filter.
    #[error("violation: {0}")]
    Violation(String),

    /// The supervisor's own `execve` to start the child failed; there is
    /// no tracee to kill.
    #[error("exec failure: {0}")]
    ExecFailure(String),
}

impl SandboxError {
    pub fn sandbox_failure(reason: impl Into<String>) -> Self {
        SandboxError::SandboxFailure(reason.into())
    }

    pub fn violation(reason: impl Into<String>) -> Self {
        SandboxError::Violation(reason.into())
    }

    pub fn exec_failure(reason: impl Into<String>) -> Self {
        SandboxError::ExecFailure(reason.into())
    }
}

pub type SandboxResult<T> = Result<T, SandboxError>;
