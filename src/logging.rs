/// Tracing initialization: fmt subscriber on stderr, filter from `RUST_LOG`
/// with a quiet default.
///
/// Called once at the start of `InboxApp::new()`, before anything else.
/// Repeat calls no-op via `try_init`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bazaar_inbox=debug,info".into()),
        )
        .try_init();
}
