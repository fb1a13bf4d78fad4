use std::process::ExitCode;

use abf_crop::config::{help_text, parse_args};
use abf_crop::selector::{run, Outcome};

fn main() -> ExitCode {
    env_logger::init();

    let config = match parse_args(std::env::args().skip(1).collect()) {
        Ok(Some(config)) => config,
        Ok(None) => return ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}\n\n{}", help_text());
            return ExitCode::from(2);
        }
    };

    match run(&config) {
        Ok(Outcome::Exported(path)) => {
            println!("Wrote {}", path.display());
            ExitCode::SUCCESS
        }
        Ok(Outcome::Summary(text)) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Plotted) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}
