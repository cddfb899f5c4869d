//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

#[expect(
    clippy::print_stderr,
    reason = "the binary reports fatal errors on stderr"
)]
fn main() {
    init_logging();
    if let Err(err) = urbanity_cli::run() {
        eprintln!("urbanity: {err}");
        std::process::exit(1);
    }
}

/// Log to stderr, honouring `RUST_LOG` and defaulting to `info`.
fn init_logging() {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();
}
