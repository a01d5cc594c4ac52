use clap::Parser;
use log::warn;
use snafu::ErrorCompat;

mod args;
mod session;

use crate::args::Args;
use crate::session::run_session;

fn main() {
    let args = Args::parse();
    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let res = run_session(args.config, args.input, args.out, args.reference);
    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        } else {
            eprintln!("No trace found");
        }
        std::process::exit(1);
    }
}
