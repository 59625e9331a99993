use anyhow::Result;
use rookery_core::{Rookery, Settings};
use rookery_crypto::MessageCipher;
use rookery_server::spawn_server;
use rookery_store::Store;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;

/// The API served from an in-memory database with a throwaway key.
pub struct TestServer {
    pub addr: SocketAddr,
    pub rookery: Arc<Rookery>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(Settings::default()).await
    }

    pub async fn spawn_with(settings: Settings) -> Result<Self> {
        super::init_tracing();
        let store = Store::open_in_memory()?;
        let rookery = Arc::new(Rookery::new(store, MessageCipher::generate(), settings));
        let (addr, shutdown_tx) =
            spawn_server(rookery.clone(), SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        Ok(Self {
            addr,
            rookery,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
