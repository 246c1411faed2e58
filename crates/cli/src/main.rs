mod cmd;
mod output;

use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;

use lmpcross_lib::options::{RawOptions, default_jobs, parse_switch};

use crate::cmd::{BuildArgs, cmd_build};
use crate::output::{OutputFormat, print_error};

/// lmpcross - cross-compile LAMMPS for Windows on a Linux host
#[derive(Parser)]
#[command(name = "lmpcross")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Word size of the Windows executables: 32 or 64
  #[arg(short = 'b', long = "bits", value_name = "BITS", default_value = "64")]
  bits: String,

  /// Number of parallel make jobs (default: number of CPUs)
  #[arg(short = 'j', long = "jobs", value_name = "N")]
  jobs: Option<usize>,

  /// Message passing: no or mpi
  #[arg(short = 'p', long = "parallel", value_name = "MODE", default_value = "no")]
  parallel: String,

  /// Multi-threading: no or omp
  #[arg(short = 't', long = "threads", value_name = "MODE", default_value = "no")]
  threads: String,

  /// LAMMPS revision: stable, unstable, master, a release tag or a commit hash
  #[arg(short = 'r', long = "revision", value_name = "REV", default_value = "stable")]
  revision: String,

  /// Show output of build commands: yes or no
  #[arg(short = 'v', long = "verbose", value_name = "SWITCH", default_value = "no")]
  verbose: String,

  /// Remove the build folder after a successful build
  #[arg(long)]
  cleanup: bool,

  /// Output format for the build report
  #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
  format: OutputFormat,
}

impl Cli {
  fn into_args(self) -> BuildArgs {
    BuildArgs {
      raw: RawOptions {
        bits: self.bits,
        jobs: self.jobs.unwrap_or_else(default_jobs),
        transport: self.parallel,
        threads: self.threads,
        revision: self.revision,
        verbose: self.verbose,
      },
      cleanup: self.cleanup,
      format: self.format,
    }
  }
}

fn main() {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => err.exit(),
    Err(err) => {
      println!("{}", err.render());
      std::process::exit(err.exit_code());
    }
  };

  // An invalid keyword is reported by validation; log at the default level until then.
  let level = match parse_switch(&cli.verbose) {
    Some(true) => "debug",
    _ => "info",
  };
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(format!("warn,lmpcross={level},lmpcross_lib={level}")));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  if let Err(err) = cmd_build(cli.into_args()) {
    print_error(&format!("ERROR: {err:#}"));
    std::process::exit(1);
  }
}
