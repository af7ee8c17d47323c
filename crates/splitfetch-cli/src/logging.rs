use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise info for splitfetch, debug with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "splitfetch=debug,splitfetch_cli=debug"
    } else {
        "splitfetch=info,splitfetch_cli=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
