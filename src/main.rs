use anyhow::Result;
use argh::FromArgs;
use minishell::Shell;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(FromArgs)]
/// A small interactive shell.
struct Args {
    /// print the shell version and exit
    #[argh(switch, short = 'v')]
    version: bool,
}

fn main() -> Result<()> {
    // `--help` exits 0 with usage; unrecognized flags print usage to
    // stderr and exit 1. Both are argh's doing.
    let args: Args = argh::from_env();
    if args.version {
        println!(
            "minishell version {}.{}",
            env!("CARGO_PKG_VERSION_MAJOR"),
            env!("CARGO_PKG_VERSION_MINOR")
        );
        return Ok(());
    }

    // Diagnostics go to stderr, RUST_LOG-gated, so they never mix into
    // the prompt or command output.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let mut shell = Shell::new()?;
    shell.repl()
}
