//! Entry point: parses CLI options, initializes logging, and dispatches to
//! the `run` subcommand.

use structopt::StructOpt;

use syscage::cli::Opt;
use syscage::commands::{Command, RunCommand};

fn main() {
    let opt = Opt::from_args();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = match opt {
        Opt::Run(opts) => RunCommand::new(opts).run(),
    };

    if let Err(e) = result {
        eprintln!("syscage: {}", e);
        std::process::exit(1);
    }
}
