//! Wiring of listeners, handlers, executors, and lifecycle management.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

use girder_beacon::OnlineBeaconClient;
use girder_executor::{
    EvmExecutor, ExecutorContract, GasPolicy, HashiAdapterContract, SigningTransactor,
};
use girder_proof::{ReceiptProver, ReceiptsRootProver};
use girder_relay::{
    BlockEventHandler, DepositEventHandler, DispatchedEventHandler, DispatchedMessageHandler,
    EventHandler, Listener, ListenerConfig, Message, MessageKind, Relayer, RpcClient,
    StateRootEventHandler, StateRootMessageHandler, TransferMessageHandler,
};
use girder_store::BlockStore;

use crate::config::{EvmConfig, GlobalArgs};
use crate::health;

/// Capacity of the outbound message channel; senders suspend when the relayer
/// falls behind.
const MESSAGE_CHANNEL_CAPACITY: usize = 256;

/// Builds every per-domain component and runs until a termination signal.
pub async fn run(args: GlobalArgs) -> Result<()> {
    let domains = args.domain_map()?;
    let chain_ids = args.chain_id_map()?;

    let store = Arc::new(
        BlockStore::open(&args.store_path)
            .with_context(|| format!("failed opening block store at {}", args.store_path))?,
    );
    let (msg_tx, msg_rx) = mpsc::channel::<Vec<Message>>(MESSAGE_CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();
    let mut relayer = Relayer::new();
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    for (&domain_id, _) in &domains {
        let config = EvmConfig::load(domain_id)
            .with_context(|| format!("failed loading configuration for domain {domain_id}"))?;
        if !chain_ids.contains_key(&domain_id) {
            bail!("no chain ID configured for domain {domain_id}");
        }

        let endpoint: Url = config
            .endpoint
            .parse()
            .with_context(|| format!("invalid endpoint for domain {domain_id}"))?;
        let client = Arc::new(RpcClient::new_http(endpoint));
        let beacon = Arc::new(
            OnlineBeaconClient::new_http(config.beacon_endpoint.clone(), config.spec)
                .with_context(|| format!("invalid beacon endpoint for domain {domain_id}"))?,
        );
        let receipt_prover = Arc::new(ReceiptProver::new(client.clone()));
        let root_prover = Arc::new(ReceiptsRootProver::new(beacon.clone()));

        // Source side: watch this domain for state root submissions.
        let block_handlers: Vec<Arc<dyn BlockEventHandler>> = config
            .state_root_addresses
            .iter()
            .map(|&address| {
                Arc::new(StateRootEventHandler::new(
                    domain_id,
                    address,
                    client.clone(),
                    msg_tx.clone(),
                )) as Arc<dyn BlockEventHandler>
            })
            .collect();
        let listener = Listener::new(
            ListenerConfig {
                domain_id,
                start_block: config.start_block,
                latest: config.latest,
                fresh_start: config.fresh_start,
                block_confirmations: config.block_confirmations,
                block_interval: config.block_interval,
                block_retry_interval: config.block_retry_interval,
            },
            client.clone(),
            store.clone(),
            block_handlers,
        );
        tasks.push(tokio::spawn(listener.run(cancel.clone())));

        // Prover side: handle state roots observed elsewhere for this domain.
        let event_handlers: Vec<Arc<dyn EventHandler>> = vec![
            Arc::new(DepositEventHandler::new(
                domain_id,
                config.router,
                config.slot_index,
                config.generic_resources.clone(),
                client.clone(),
                msg_tx.clone(),
            )),
            Arc::new(DispatchedEventHandler::new(
                domain_id,
                config.yaho,
                chain_ids.clone(),
                config.slot_search_limit,
                client.clone(),
                beacon.clone(),
                receipt_prover,
                root_prover,
                msg_tx.clone(),
            )),
        ];
        relayer.register_handler(
            domain_id,
            MessageKind::StateRoot,
            Arc::new(StateRootMessageHandler::new(
                domain_id,
                config.start_block,
                beacon,
                store.clone(),
                event_handlers,
            )),
        );
        relayer.register_handler(domain_id, MessageKind::Transfer, Arc::new(TransferMessageHandler));
        relayer.register_handler(
            domain_id,
            MessageKind::Dispatched,
            Arc::new(DispatchedMessageHandler),
        );

        // Destination side: submissions to this domain's contracts.
        let transactor = Arc::new(
            SigningTransactor::new_http(
                &config.endpoint,
                &config.key,
                GasPolicy {
                    max_gas_price: config.max_gas_price,
                    gas_multiplier: config.gas_multiplier,
                    gas_increase_percentage: config.gas_increase_percentage,
                },
            )
            .with_context(|| format!("failed building transactor for domain {domain_id}"))?,
        );
        tasks.push(tokio::spawn(transactor.clone().run_monitor(cancel.clone())));
        relayer.register_executor(
            domain_id,
            Arc::new(EvmExecutor::new(
                domain_id,
                Arc::new(ExecutorContract::new(config.executor, transactor.clone())),
                Arc::new(HashiAdapterContract::new(config.hashi, transactor)),
            )),
        );

        info!(target: "girder", domain_id, "Configured domain");
    }
    // Handlers hold their own senders; dropping ours lets the relayer stop
    // once every handler is gone.
    drop(msg_tx);

    tasks.push(tokio::spawn(relayer.run(msg_rx, cancel.clone())));

    let health_cancel = cancel.clone();
    let health_port = args.health_port;
    tasks.push(tokio::spawn(async move {
        if let Err(err) = health::serve(health_port, health_cancel).await {
            tracing::error!(target: "girder", %err, "Health endpoint failed");
        }
    }));

    wait_for_signal().await?;
    info!(target: "girder", "Termination signal received, shutting down");
    cancel.cancel();

    for task in tasks {
        let _ = task.await;
    }
    Ok(())
}

/// Waits for `SIGTERM`, `SIGINT`, `SIGHUP`, or `SIGQUIT`.
async fn wait_for_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).context("failed installing SIGTERM handler")?;
    let mut interrupt = signal(SignalKind::interrupt()).context("failed installing SIGINT handler")?;
    let mut hangup = signal(SignalKind::hangup()).context("failed installing SIGHUP handler")?;
    let mut quit = signal(SignalKind::quit()).context("failed installing SIGQUIT handler")?;

    tokio::select! {
        _ = terminate.recv() => {}
        _ = interrupt.recv() => {}
        _ = hangup.recv() => {}
        _ = quit.recv() => {}
    }
    Ok(())
}
