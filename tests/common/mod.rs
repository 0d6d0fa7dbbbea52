/// Initialise tracing for tests. Delegates to the shared test-utils crate so
/// every test binary installs the same subscriber.
pub fn init_tracing() {
    filepulse_test_utils::init_tracing();
}
