//! Inkboard command-line host (native).

#[cfg(feature = "native")]
mod cli;
#[cfg(feature = "native")]
mod commands;

#[cfg(feature = "native")]
fn main() {
    env_logger::init();

    let cli = match cli::Cli::parse(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("inkboard: {e}\n\n{}", cli::USAGE);
            std::process::exit(2);
        }
    };
    log::debug!("Running {:?}", cli.command);

    match commands::run(cli) {
        Ok(message) => println!("{message}"),
        Err(e) => {
            eprintln!("inkboard: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
