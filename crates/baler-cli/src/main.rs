//! The `baler` binary.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use baler_cli::args::CliArgs;
use baler_cli::driver;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    match driver::run(&args) {
        Ok(false) => {}
        Ok(true) => std::process::exit(1),
        Err(error) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("error: {error:#}");
            }
            std::process::exit(1);
        }
    }
}
