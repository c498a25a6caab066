//! git-reparent - move the commits at the tip of HEAD onto a new parent.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{Cli, Mode};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also come through here
            let code = i32::from(e.use_stderr());
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose);
    output::set_quiet(cli.quiet);

    let result = cli.mode().and_then(|mode| {
        tracing::debug!(?mode, "dispatching");
        match mode {
            Mode::Start(opts) => commands::start::run(&opts),
            Mode::Continue => commands::resume::run(),
            Mode::Abort => commands::abort::run(),
        }
    });

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Send diagnostics to stderr, `warn` by default and `debug` with
/// `--verbose`. `RUST_LOG` takes precedence over both.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
