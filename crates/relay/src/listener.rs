//! Per-domain chain listener.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use girder_store::BlockStore;

use crate::{BlockEventHandler, ExecutionProvider, HandlerResult};

/// How long the listener backs off when the chain head cannot be resolved at
/// startup.
const STARTUP_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Polling configuration of a [Listener].
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Domain the listener observes.
    pub domain_id: u8,
    /// First block to observe when no cursor is stored.
    pub start_block: u64,
    /// Start from the current head instead of any stored cursor.
    pub latest: bool,
    /// Ignore the stored cursor and start from `start_block`.
    pub fresh_start: bool,
    /// Blocks the head must be ahead before a range is processed.
    pub block_confirmations: u64,
    /// Blocks processed per polling iteration.
    pub block_interval: u64,
    /// Delay between polling iterations.
    pub block_retry_interval: Duration,
}

/// Polls one domain for confirmed blocks and feeds the observed ranges to the
/// registered block event handlers, persisting its own cursor between runs.
pub struct Listener<P> {
    config: ListenerConfig,
    client: Arc<P>,
    store: Arc<BlockStore>,
    handlers: Vec<Arc<dyn BlockEventHandler>>,
}

impl<P> std::fmt::Debug for Listener<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("config", &self.config)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl<P: ExecutionProvider> Listener<P> {
    /// Creates a new [Listener].
    pub fn new(
        config: ListenerConfig,
        client: Arc<P>,
        store: Arc<BlockStore>,
        handlers: Vec<Arc<dyn BlockEventHandler>>,
    ) -> Self {
        Self { config, client, store, handlers }
    }

    /// Runs the polling loop until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let domain_id = self.config.domain_id;
        let mut current = loop {
            match self.starting_block().await {
                Ok(block) => break block,
                Err(err) => {
                    warn!(target: "listener", domain_id, %err, "Failed resolving starting block");
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(STARTUP_RETRY_INTERVAL) => {}
                    }
                }
            }
        };
        info!(target: "listener", domain_id, start_block = current, "Listener started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(target: "listener", domain_id, "Listener shutting down");
                    return;
                }
                _ = tokio::time::sleep(self.config.block_retry_interval) => {}
            }

            let head = match self.client.latest_block_number().await {
                Ok(head) => head.saturating_sub(self.config.block_confirmations),
                Err(err) => {
                    warn!(target: "listener", domain_id, %err, "Failed fetching head block");
                    continue;
                }
            };
            if current >= head {
                continue;
            }

            let start = current + 1;
            let end = (current + self.config.block_interval).min(head);
            debug!(target: "listener", domain_id, start, end, "Processing block range");
            if let Err(err) = self.process_range(start, end).await {
                warn!(target: "listener", domain_id, start, end, %err, "Failed processing block range");
                continue;
            }

            if let Err(err) = self.store.store_chain_block(domain_id, end) {
                error!(target: "listener", domain_id, %err, "Failed storing chain cursor");
            }
            current = end;
        }
    }

    async fn process_range(&self, start: u64, end: u64) -> HandlerResult<()> {
        for handler in &self.handlers {
            handler.handle_block_range(start, end).await?;
        }
        Ok(())
    }

    async fn starting_block(&self) -> HandlerResult<u64> {
        if self.config.latest {
            let head = self.client.latest_block_number().await?;
            return Ok(head.saturating_sub(self.config.block_confirmations));
        }
        if self.config.fresh_start {
            return Ok(self.config.start_block);
        }
        Ok(self
            .store
            .latest_chain_block(self.config.domain_id)?
            .unwrap_or(self.config.start_block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockBlockEventHandler, MockExecutionProvider};
    use mockall::predicate::eq;
    use tempfile::TempDir;

    fn config() -> ListenerConfig {
        ListenerConfig {
            domain_id: 1,
            start_block: 100,
            latest: false,
            fresh_start: false,
            block_confirmations: 10,
            block_interval: 5,
            block_retry_interval: Duration::from_millis(5),
        }
    }

    fn store() -> (TempDir, Arc<BlockStore>) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(BlockStore::open(dir.path()).unwrap());
        (dir, store)
    }

    #[tokio::test]
    async fn test_starting_block_prefers_stored_cursor() {
        let (_dir, store) = store();
        store.store_chain_block(1, 500).unwrap();

        let listener =
            Listener::new(config(), Arc::new(MockExecutionProvider::new()), store, vec![]);
        assert_eq!(listener.starting_block().await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_starting_block_fresh_start_overrides_cursor() {
        let (_dir, store) = store();
        store.store_chain_block(1, 500).unwrap();

        let mut cfg = config();
        cfg.fresh_start = true;
        let listener =
            Listener::new(cfg, Arc::new(MockExecutionProvider::new()), store, vec![]);
        assert_eq!(listener.starting_block().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_starting_block_latest_uses_head() {
        let (_dir, store) = store();
        let mut client = MockExecutionProvider::new();
        client.expect_latest_block_number().returning(|| Ok(1000));

        let mut cfg = config();
        cfg.latest = true;
        let listener = Listener::new(cfg, Arc::new(client), store, vec![]);
        assert_eq!(listener.starting_block().await.unwrap(), 990);
    }

    #[tokio::test]
    async fn test_run_processes_confirmed_ranges_and_persists_cursor() {
        let (_dir, store) = store();
        store.store_chain_block(1, 200).unwrap();

        let mut client = MockExecutionProvider::new();
        client.expect_latest_block_number().returning(|| Ok(218));

        let mut handler = MockBlockEventHandler::new();
        // Head 218 - 10 confirmations = 208; two iterations of 5 blocks, then
        // a final partial range.
        handler
            .expect_handle_block_range()
            .with(eq(201u64), eq(205u64))
            .times(1)
            .returning(|_, _| Ok(()));
        handler
            .expect_handle_block_range()
            .with(eq(206u64), eq(208u64))
            .times(1)
            .returning(|_, _| Ok(()));

        let cancel = CancellationToken::new();
        let listener =
            Listener::new(config(), Arc::new(client), store.clone(), vec![Arc::new(handler)]);
        let task = tokio::spawn(listener.run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        task.await.unwrap();

        assert_eq!(store.latest_chain_block(1).unwrap(), Some(208));
    }
}
