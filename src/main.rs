use clap::Parser;
use log::info;
use snafu::ErrorCompat;

mod args;
mod report;

fn main() {
    let args = args::Args::parse();
    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    info!("arguments: {:?}", args);

    let config = report::AnalysisConfig::from_args(&args);
    if let Err(e) = report::run_report(&config) {
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
