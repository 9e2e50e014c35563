//! Paginated log fetching.

use alloy_primitives::Address;
use alloy_rpc_types_eth::Log;

use crate::{ExecutionProvider, ProviderResult};

/// The widest block range requested in a single `eth_getLogs` call. Public
/// endpoints commonly reject anything larger.
pub const MAX_BLOCK_RANGE: u64 = 1000;

/// Fetches logs over `[start_block, end_block]` in chunks of at most
/// [MAX_BLOCK_RANGE] blocks. A failing chunk aborts the whole fetch.
pub async fn fetch_logs<P: ExecutionProvider + ?Sized>(
    client: &P,
    contract: Address,
    event_signature: &str,
    start_block: u64,
    end_block: u64,
) -> ProviderResult<Vec<Log>> {
    let mut logs = Vec::new();
    let mut start = start_block;
    while start <= end_block {
        let range_end = (start + MAX_BLOCK_RANGE).min(end_block);
        logs.extend(client.fetch_event_logs(contract, event_signature, start, range_end).await?);
        start = range_end + 1;
    }
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockExecutionProvider, ProviderError};
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_single_chunk_range() {
        let mut client = MockExecutionProvider::new();
        client
            .expect_fetch_event_logs()
            .with(eq(Address::ZERO), eq("Sig()"), eq(80u64), eq(100u64))
            .times(1)
            .returning(|_, _, _, _| Ok(vec![]));

        let logs = fetch_logs(&client, Address::ZERO, "Sig()", 80, 100).await.unwrap();
        assert!(logs.is_empty());
    }

    #[tokio::test]
    async fn test_chunks_cover_range_without_gaps() {
        let mut client = MockExecutionProvider::new();
        for (start, end) in [(80u64, 1080u64), (1081, 2081), (2082, 2432)] {
            client
                .expect_fetch_event_logs()
                .with(eq(Address::ZERO), eq("Sig()"), eq(start), eq(end))
                .times(1)
                .returning(|_, _, _, _| Ok(vec![]));
        }

        fetch_logs(&client, Address::ZERO, "Sig()", 80, 2432).await.unwrap();
    }

    #[tokio::test]
    async fn test_chunk_error_aborts() {
        let mut client = MockExecutionProvider::new();
        client
            .expect_fetch_event_logs()
            .times(1)
            .returning(|_, _, _, _| Err(ProviderError::Rpc("boom".into())));

        assert!(fetch_logs(&client, Address::ZERO, "Sig()", 0, 5000).await.is_err());
    }
}
