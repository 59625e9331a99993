pub mod client;
pub mod server;

/// Initialize tracing for tests (only once per process).
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("rookery_server=debug,rookery_core=debug,tower_http=info")
            .with_test_writer()
            .try_init()
            .ok();
    });
}
