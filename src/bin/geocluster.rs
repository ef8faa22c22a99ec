use clap::crate_version;
use env_logger::Builder;
use log::{LevelFilter, info, error};
use std::env;

use geocluster::classify::classify_engine::run_classify;
use geocluster::cli::build_cli;
use geocluster::models::checker::run_check;

fn main() {
    let mut app = build_cli();
    let matches = app.clone().get_matches();

    match matches.subcommand() {
        Some(("classify", sub_matches)) => {
            set_log_level(sub_matches, true);
            match run_classify(sub_matches) {
                Ok(_) => {}
                Err(e) => {
                    error!("Classify failed with error: {:?}", e);
                    std::process::exit(1);
                }
            };
        },
        Some(("check", sub_matches)) => {
            set_log_level(sub_matches, true);
            match run_check(sub_matches) {
                Ok(_) => {}
                Err(e) => {
                    error!("Check failed with error: {:?}", e);
                    std::process::exit(1);
                }
            };
        },
        _ => {
            let _ = app.print_help();
            std::process::exit(1);
        }
    }
}


fn set_log_level(matches: &clap::ArgMatches, is_last: bool) {
    let mut log_level = LevelFilter::Info;
    let mut specified = false;
    if matches.get_flag("verbose") {
        specified = true;
        log_level = LevelFilter::Debug;
    }
    if matches.get_flag("quiet") {
        specified = true;
        log_level = LevelFilter::Error;
    }
    if specified || is_last {
        let mut builder = Builder::new();
        builder.filter_level(log_level);
        builder.filter_module("ort", LevelFilter::Warn);
        if let Ok(filters) = env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }
        if builder.try_init().is_err() {
            panic!("Failed to set log level - has it been specified multiple times?")
        }
    }
    if is_last {
        info!("geocluster version {}", crate_version!());
    }
}
