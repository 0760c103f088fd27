//! The `run` subcommand: load policy, layer CLI overrides on top, spawn the
//! child, drive the tracer/supervisor pair to completion, and emit the
//! report. Grounded in gsandbox's `internal/cmd/run_command.go`
//! load-policy-then-run-executor shape.

use log::LevelFilter;

use crate::cli::RunOptions;
use crate::commands::Command;
use crate::error::{SandboxError, SandboxResult};
use crate::policy::{self, Policy};
use crate::result::SandboxResult as Report;
use crate::spawn;
use crate::supervisor::Supervisor;
use crate::tracer::Tracer;

pub struct RunCommand {
    opts: RunOptions,
}

impl RunCommand {
    pub fn new(opts: RunOptions) -> Self {
        RunCommand { opts }
    }

    fn build_policy(&self) -> SandboxResult<Policy> {
        let mut policy = policy::load(self.opts.policy_file.as_deref())?;

        if self.opts.share_net {
            policy.share_net = true;
        }
        if let Some(dir) = &self.opts.work_dir {
            policy.work_dir = Some(dir.clone());
        }
        if let Some(raw) = &self.opts.limit_as {
            policy.limits.as_bytes = Some(policy::parse_bytes(raw)?);
        }
        if let Some(raw) = &self.opts.limit_core {
            policy.limits.core_bytes = Some(policy::parse_bytes(raw)?);
        }
        if let Some(raw) = &self.opts.limit_cpu {
            policy.limits.cpu_seconds = Some(policy::parse_duration(raw)?.as_secs());
        }
        if let Some(raw) = &self.opts.limit_fsize {
            policy.limits.fsize_bytes = Some(policy::parse_bytes(raw)?);
        }
        if let Some(n) = self.opts.limit_nofile {
            policy.limits.nofile = Some(n);
        }
        if let Some(raw) = &self.opts.limit_wallclock {
            policy.limits.wallclock = Some(policy::parse_duration(raw)?);
        }

        Ok(policy)
    }

    fn emit_report(&self, report: &Report) -> SandboxResult<()> {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| SandboxError::sandbox_failure(format!("serializing report: {}", e)))?;
        match &self.opts.report_file {
            Some(path) => std::fs::write(path, json)
                .map_err(|e| SandboxError::sandbox_failure(format!("writing report file {}: {}", path.display(), e))),
            None => {
                println!("{}", json);
                Ok(())
            }
        }
    }
}

impl Command for RunCommand {
    fn run(self) -> SandboxResult<()> {
        if self.opts.verbose {
            log::set_max_level(LevelFilter::Trace);
        }

        let policy = self.build_policy()?;
        let pid = spawn::spawn(&policy, &self.opts.program, &self.opts.args)?;
        let root_pgid = pid;

        let wallclock = policy.limits.wallclock;
        let _timer = crate::limits::spawn_wallclock_timer(root_pgid, wallclock);

        let mut supervisor = Supervisor::new(policy, pid, root_pgid)?;
        let mut tracer = Tracer::new(pid);
        tracer.run(&mut supervisor);

        let report = supervisor
            .into_result()
            .ok_or_else(|| SandboxError::sandbox_failure("tracer loop ended without a terminal result"))?;

        self.emit_report(&report)
    }
}
