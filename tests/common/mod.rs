//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use pgbouncer_conf_api::config::{validate_config, AppConfig};
use pgbouncer_conf_api::http::HttpServer;
use pgbouncer_conf_api::lifecycle::Shutdown;

/// A running API instance backed by a scratch conf directory.
pub struct TestApi {
    pub addr: SocketAddr,
    pub dir: TempDir,
    pub shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestApi {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    pub fn ini(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("pgbouncer.ini")).unwrap()
    }
}

/// Settings whose reload step runs `sh -c <script>` inside `dir`.
pub fn config_with_reload(dir: &Path, script: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.pgbouncer.conf_dir = dir.to_path_buf();
    config.reload.program = "sh".into();
    config.reload.args = vec!["-c".into(), script.into()];
    config.reload.timeout_secs = 5;
    config
}

/// Start the API with an ini file holding `initial`.
///
/// The default reload script echoes stdin, so the directive comes back as
/// the confirmation token.
pub async fn start_api(initial: &str, script: &str, tweak: impl FnOnce(&mut AppConfig)) -> TestApi {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("pgbouncer.ini"), initial).unwrap();

    let mut config = config_with_reload(dir.path(), script);
    tweak(&mut config);
    validate_config(&config).unwrap();

    let listener = tokio::net::TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestApi { addr, dir, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
