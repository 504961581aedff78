use clap::Parser;
use tracing::{error, Level};

use roombook::cli::{self, CliArgs};
use roombook::config::Config;

fn main() {
    let args = CliArgs::parse();

    let level = match args.global_opts.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = cli::effective_config(&args.global_opts, Config::from_env());
    if let Err(e) = roombook::observability::init(config.metrics_port) {
        error!("metrics exporter not started: {e}");
    }

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = cli::run(args.command, &config, &mut stdout) {
        eprintln!("{e}");
        std::process::exit(e.exit_code());
    }
}
