//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use ingress_guard::config::{GuardConfig, UploadSettings};
use ingress_guard::lifecycle::Shutdown;
use ingress_guard::security::OriginGate;
use ingress_guard::HttpServer;

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub upload_updates: mpsc::UnboundedSender<UploadSettings>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Publish new upload settings the way the config watcher would.
    #[allow(dead_code)]
    pub async fn reload_uploads(&self, uploads: UploadSettings) {
        self.upload_updates.send(uploads).unwrap();
        // Give the reload task a moment to apply it.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server with the given upload ceiling and allow-list.
pub async fn start_server(limit_mb: Option<u64>, allowed_origins: &str) -> TestServer {
    let mut config = GuardConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.uploads = UploadSettings {
        max_file_size_upload: limit_mb,
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (upload_updates, updates_rx) = mpsc::unbounded_channel();

    let server = HttpServer::with_origin_gate(config, OriginGate::from_allowed_origins(allowed_origins));
    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    TestServer {
        addr,
        shutdown,
        upload_updates,
    }
}

/// A client that never pools connections between tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// A body streamed with chunked transfer encoding, one chunk per size.
pub fn chunked_body(sizes: Vec<usize>) -> reqwest::Body {
    let chunks = sizes
        .into_iter()
        .map(|size| Ok::<_, std::io::Error>(vec![0u8; size]));
    reqwest::Body::wrap_stream(futures_util::stream::iter(chunks))
}
