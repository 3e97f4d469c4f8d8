#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod app;
mod exporters;

use std::process::ExitCode;

use crate::app::{
    options::{from_command_line, Options},
    runtime::Config,
};

fn main() -> ExitCode {
    // Get args from command line
    let args = from_command_line();

    // Create application options
    let options = match Options::from_args(&args) {
        Ok(options) => options,
        Err(why) => {
            eprintln!("{why}");
            return ExitCode::FAILURE;
        }
    };

    // Create app state and start
    match Config::new(options) {
        Ok(app) => match app.start() {
            Ok(()) => ExitCode::SUCCESS,
            Err(why) => {
                eprintln!("{why}");
                ExitCode::FAILURE
            }
        },
        Err(why) => {
            eprintln!("Unable to launch: {why}");
            ExitCode::FAILURE
        }
    }
}
