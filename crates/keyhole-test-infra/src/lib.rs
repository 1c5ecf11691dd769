//! Disposable containers for integration tests.

pub mod mysql;
pub mod redis;

use testcontainers::TestcontainersError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("failed to start {image} container: {source}")]
    Start {
        image: &'static str,
        #[source]
        source: TestcontainersError,
    },
    #[error("container endpoint unavailable: {0}")]
    Endpoint(#[from] TestcontainersError),
}

pub type Result<T> = std::result::Result<T, TestInfraError>;

/// Published ports are bound on IPv4; `localhost` may resolve to `::1` first.
pub(crate) fn ipv4_host(host: String) -> String {
    match host.as_str() {
        "localhost" => String::from("127.0.0.1"),
        _ => host,
    }
}
