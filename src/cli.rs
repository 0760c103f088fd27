//! `structopt`-based argument parsing for the `run` subcommand: a flat
//! options struct consumed by one `Command` impl.

use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "syscage", about = "A ptrace-driven syscall sandbox.")]
pub enum Opt {
    Run(RunOptions),
}

#[derive(Debug, StructOpt)]
pub struct RunOptions {
    #[structopt(long = "policy-file", parse(from_os_str))]
    pub policy_file: Option<PathBuf>,

    #[structopt(long = "report-file", parse(from_os_str))]
    pub report_file: Option<PathBuf>,

    #[structopt(long = "verbose", short = "v")]
    pub verbose: bool,

    #[structopt(long = "share-net")]
    pub share_net: bool,

    #[structopt(long = "work-dir")]
    pub work_dir: Option<String>,

    #[structopt(long = "limit-as")]
    pub limit_as: Option<String>,

    #[structopt(long = "limit-core")]
    pub limit_core: Option<String>,

    #[structopt(long = "limit-cpu")]
    pub limit_cpu: Option<String>,

    #[structopt(long = "limit-fsize")]
    pub limit_fsize: Option<String>,

    #[structopt(long = "limit-nofile")]
    pub limit_nofile: Option<u64>,

    #[structopt(long = "limit-wallclock")]
    pub limit_wallclock: Option<String>,

    /// The program to run, followed by its own arguments (`-- PROGRAM [ARG...]`).
    #[structopt(name = "PROGRAM")]
    pub program: String,

    #[structopt(name = "ARG")]
    pub args: Vec<String>,
}
