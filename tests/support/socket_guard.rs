//! Skips wiremock tests where localhost sockets cannot be bound.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "INSTALOADER_REQUIRE_SOCKET_TESTS";

fn socket_tests_required() -> bool {
    std::env::var(REQUIRE_ENV)
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// False (after a notice) when the sandbox forbids binding a local port.
#[track_caller]
pub fn mock_service_available() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return true;
    }

    let location = Location::caller();
    let message = format!(
        "[socket-bound-test] no localhost socket for mock service at {}:{}",
        location.file(),
        location.line()
    );
    assert!(
        !socket_tests_required(),
        "{message}. Unset {REQUIRE_ENV} to allow skipping."
    );
    eprintln!("{message}. Skipping test; set {REQUIRE_ENV}=1 to fail instead.");
    false
}

/// Starts a mock retrieval service, or `None` when sockets are unavailable.
pub async fn start_mock_service_or_skip() -> Option<MockServer> {
    if mock_service_available() {
        Some(MockServer::start().await)
    } else {
        None
    }
}
