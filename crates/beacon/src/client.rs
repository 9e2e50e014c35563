//! An online implementation of the [BeaconProvider] trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use alloy_primitives::B256;

use crate::{
    BeaconBlockHeader, BeaconClientError, BeaconResult, ChainSpec, StateCache,
    VersionedBeaconState, VersionedSignedBeaconBlock,
};

/// The node API route for beacon block headers.
const HEADERS_METHOD: &str = "eth/v1/beacon/headers";

/// The node API route for full beacon blocks.
const BLOCKS_METHOD: &str = "eth/v2/beacon/blocks";

/// The node API route for full beacon states.
const STATES_METHOD: &str = "eth/v2/debug/beacon/states";

/// Per-request timeout. Beacon states are tens of megabytes, so this is
/// deliberately generous.
const BEACON_RPC_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// The SSZ content type used to sidestep JSON for large objects.
const SSZ_CONTENT_TYPE: &str = "application/octet-stream";

/// A beacon block header together with its block root.
#[derive(Debug, Clone)]
pub struct BeaconHeader {
    /// SSZ root of the block the header summarizes.
    pub root: B256,
    /// The header itself.
    pub header: BeaconBlockHeader,
}

/// The subset of the beacon node API the prover consumes.
///
/// `block_id` and `state_id` follow the node API convention: a decimal slot,
/// a 0x-prefixed root, or a named identifier such as `head`.
#[async_trait]
pub trait BeaconProvider: Send + Sync {
    /// Fetches the block header for `block_id`.
    async fn beacon_header(&self, block_id: &str) -> BeaconResult<BeaconHeader>;

    /// Fetches the full signed beacon block for `block_id`.
    async fn signed_beacon_block(&self, block_id: &str) -> BeaconResult<VersionedSignedBeaconBlock>;

    /// Fetches the full beacon state for `state_id`.
    async fn beacon_state(&self, state_id: &str) -> BeaconResult<Arc<VersionedBeaconState>>;
}

/// An online, reqwest-backed [BeaconProvider] with a bounded state cache.
#[derive(Debug)]
pub struct OnlineBeaconClient {
    /// The base URL of the beacon node.
    base: String,
    /// The inner HTTP client.
    inner: Client,
    /// The SSZ schema to decode blocks and states with.
    spec: ChainSpec,
    /// Cache of downloaded states.
    states: StateCache,
}

impl OnlineBeaconClient {
    /// Creates a new client against `base`, decoding with `spec`.
    pub fn new_http(base: String, spec: ChainSpec) -> BeaconResult<Self> {
        let inner = Client::builder().timeout(BEACON_RPC_TIMEOUT).build()?;
        let mut base = base;
        // Remove trailing slashes so route joining below is uniform.
        while base.ends_with('/') {
            base.pop();
        }
        Ok(Self { base, inner, spec, states: StateCache::default() })
    }

    async fn get_ssz(&self, method: &str, id: &str) -> BeaconResult<Vec<u8>> {
        let url = format!("{}/{}/{}", self.base, method, id);
        let response = self.inner.get(&url).header(ACCEPT, SSZ_CONTENT_TYPE).send().await?;
        match response.status() {
            StatusCode::OK => Ok(response.bytes().await?.to_vec()),
            StatusCode::NOT_FOUND => Err(BeaconClientError::NotFound(id.to_string())),
            status => Err(BeaconClientError::UnexpectedStatus(status.as_u16(), url)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HeaderEnvelope {
    data: HeaderData,
}

#[derive(Debug, Deserialize)]
struct HeaderData {
    root: B256,
    header: SignedHeader,
}

#[derive(Debug, Deserialize)]
struct SignedHeader {
    message: BeaconBlockHeader,
}

#[async_trait]
impl BeaconProvider for OnlineBeaconClient {
    async fn beacon_header(&self, block_id: &str) -> BeaconResult<BeaconHeader> {
        let url = format!("{}/{}/{}", self.base, HEADERS_METHOD, block_id);
        let response = self.inner.get(&url).send().await?;
        match response.status() {
            StatusCode::OK => {
                let envelope: HeaderEnvelope = response.json().await?;
                Ok(BeaconHeader { root: envelope.data.root, header: envelope.data.header.message })
            }
            StatusCode::NOT_FOUND => Err(BeaconClientError::NotFound(block_id.to_string())),
            status => Err(BeaconClientError::UnexpectedStatus(status.as_u16(), url)),
        }
    }

    async fn signed_beacon_block(&self, block_id: &str) -> BeaconResult<VersionedSignedBeaconBlock> {
        let bytes = self.get_ssz(BLOCKS_METHOD, block_id).await?;
        VersionedSignedBeaconBlock::from_ssz_bytes(self.spec, &bytes)
            .map_err(|e| BeaconClientError::Ssz(format!("{e:?}")))
    }

    async fn beacon_state(&self, state_id: &str) -> BeaconResult<Arc<VersionedBeaconState>> {
        if let Some(state) = self.states.get(state_id) {
            debug!(target: "beacon_client", state_id, "Beacon state cache hit");
            return Ok(state);
        }

        let bytes = self.get_ssz(STATES_METHOD, state_id).await?;
        debug!(target: "beacon_client", state_id, size = bytes.len(), "Downloaded beacon state");
        let state = VersionedBeaconState::from_ssz_bytes(self.spec, &bytes)
            .map_err(|e| BeaconClientError::Ssz(format!("{e:?}")))?;
        let state = Arc::new(state);
        self.states.put(state_id.to_string(), state.clone());
        Ok(state)
    }
}
