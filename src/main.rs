use buf::cli::cli_main;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

fn main() {
    TermLogger::init(
        LevelFilter::Warn,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .ok();

    if let Err(error) = cli_main::run() {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}
