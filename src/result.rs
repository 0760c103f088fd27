//! The terminal result record and its JSON report shape. Ported from
//! gsandbox's `status.go`/`result.go`: the `Status` enum's wire names and
//! the `Result` struct's field set, re-expressed with `serde` derives
//! instead of `go:generate stringer`.

use chrono::{DateTime, Utc};
use nix::sys::signal::Signal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    SandboxFailure,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    OutputLimitExceeded,
    Violation,
    Signaled,
    ExitFailure,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SandboxResult {
    pub status: Status,
    pub reason: String,
    #[serde(rename = "exitCode")]
    pub exit_code: i32,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "finishTime")]
    pub finish_time: DateTime<Utc>,
    #[serde(rename = "realTime", with = "duration_millis")]
    pub real_time: std::time::Duration,
    #[serde(rename = "systemTime", with = "duration_millis")]
    pub system_time: std::time::Duration,
    #[serde(rename = "userTime", with = "duration_millis")]
    pub user_time: std::time::Duration,
    pub maxrss: i64,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.as_millis() as i64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = i64::deserialize(d)?;
        Ok(Duration::from_millis(millis.max(0) as u64))
    }
}

/// What the supervisor concluded about the run, independent of how the
/// child's process actually terminated. `None` means the wait-status
/// mapping (timeval/signal based) decides the final `Status`.
#[derive(Clone, Debug)]
pub enum Verdict {
    SandboxFailure(String),
    Violation(String),
    ExecFailure(String),
}

fn timeval_to_duration(tv: libc::timeval) -> std::time::Duration {
    std::time::Duration::new(tv.tv_sec.max(0) as u64, (tv.tv_usec.max(0) as u32) * 1_000)
}

pub struct ResultBuilder {
    pub start_time: DateTime<Utc>,
}

impl ResultBuilder {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        ResultBuilder { start_time }
    }

    /// Folds a root wait-status (exit code or terminating signal), the
    /// final rusage, and an optional supervisor verdict into the terminal
    /// record.
    pub fn build(
        &self,
        exit_status: ExitStatus,
        rusage: libc::rusage,
        verdict: Option<Verdict>,
    ) -> SandboxResult {
        let finish_time = Utc::now();
        let (status, reason, exit_code) = match verdict {
            Some(Verdict::SandboxFailure(reason)) => (Status::SandboxFailure, reason, -1),
            Some(Verdict::Violation(reason)) => (Status::Violation, reason, -1),
            Some(Verdict::ExecFailure(reason)) => (Status::ExitFailure, reason, -1),
            None => match exit_status {
                ExitStatus::Exited(code) => (Status::Ok, String::new(), code),
                ExitStatus::Signaled(Signal::SIGXCPU) => {
                    (Status::TimeLimitExceeded, "SIGXCPU".to_string(), Signal::SIGXCPU as i32)
                }
                ExitStatus::Signaled(Signal::SIGKILL) => {
                    (Status::TimeLimitExceeded, "SIGKILL".to_string(), Signal::SIGKILL as i32)
                }
                ExitStatus::Signaled(Signal::SIGXFSZ) => {
                    (Status::OutputLimitExceeded, "SIGXFSZ".to_string(), Signal::SIGXFSZ as i32)
                }
                ExitStatus::Signaled(Signal::SIGSYS) => {
                    (Status::Violation, "SIGSYS".to_string(), Signal::SIGSYS as i32)
                }
                ExitStatus::Signaled(sig) => (Status::Signaled, format!("{:?}", sig), sig as i32),
            },
        };

        SandboxResult {
            status,
            reason,
            exit_code,
            start_time: self.start_time,
            finish_time,
            real_time: (finish_time - self.start_time)
                .to_std()
                .unwrap_or(std::time::Duration::ZERO),
            system_time: timeval_to_duration(rusage.ru_stime),
            user_time: timeval_to_duration(rusage.ru_utime),
            maxrss: rusage.ru_maxrss,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ExitStatus {
    Exited(i32),
    Signaled(Signal),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigkill_maps_to_time_limit_exceeded() {
        let builder = ResultBuilder::new(Utc::now());
        let ru: libc::rusage = unsafe { std::mem::zeroed() };
        let r = builder.build(ExitStatus::Signaled(Signal::SIGKILL), ru, None);
        assert_eq!(r.status, Status::TimeLimitExceeded);
    }

    #[test]
    fn violation_verdict_overrides_exit_status() {
        let builder = ResultBuilder::new(Utc::now());
        let ru: libc::rusage = unsafe { std::mem::zeroed() };
        let r = builder.build(
            ExitStatus::Exited(0),
            ru,
            Some(Verdict::Violation("IllegalCall: socket".to_string())),
        );
        assert_eq!(r.status, Status::Violation);
        assert_eq!(r.reason, "IllegalCall: socket");
    }

    #[test]
    fn plain_exit_reports_ok() {
        let builder = ResultBuilder::new(Utc::now());
        let ru: libc::rusage = unsafe { std::mem::zeroed() };
        let r = builder.build(ExitStatus::Exited(7), ru, None);
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.exit_code, 7);
    }
}
