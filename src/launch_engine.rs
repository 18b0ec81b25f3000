//! Launch engine: the end-to-end pipeline for one request
//!
//! validate → gas price → reserve nonce → build → sign → send → release
//! → wait for receipt → extract token
//!
//! The nonce lease is held from reservation until the node has answered the
//! send, so nonce N always reaches the node before nonce N+1. The receipt
//! wait happens outside the lease and launches confirm concurrently.

use crate::errors::LaunchError;
use crate::extractor::EventExtractor;
use crate::metrics::{metrics, LaunchTimer};
use crate::nonce_manager::{NonceResult, NonceSequencer, ResyncReport};
use crate::rpc_manager::{Broadcaster, BroadcasterConfig, ChainRpc};
use crate::structured_logging::LaunchContext;
use crate::tx_builder::{ChainParams, TxBuilder};
use crate::types::{LaunchRequest, LaunchResult, LaunchedToken};
use crate::validator::parse_launch_text;
use crate::wallet::SigningAccount;
use alloy::primitives::Address;
use std::sync::Arc;
use tracing::debug;

/// Owns the pipeline stages and the process-wide signing state
#[derive(Debug)]
pub struct LaunchEngine {
    rpc: Arc<dyn ChainRpc>,
    account: SigningAccount,
    sequencer: NonceSequencer,
    builder: TxBuilder,
    broadcaster: Broadcaster,
    extractor: EventExtractor,
}

impl LaunchEngine {
    /// Assemble an engine around an already-seeded sequencer
    pub fn new(
        rpc: Arc<dyn ChainRpc>,
        account: SigningAccount,
        sequencer: NonceSequencer,
        params: ChainParams,
        broadcaster_config: BroadcasterConfig,
    ) -> Self {
        Self {
            builder: TxBuilder::new(rpc.clone(), params),
            broadcaster: Broadcaster::new(rpc.clone(), broadcaster_config),
            extractor: EventExtractor::new(params.factory),
            rpc,
            account,
            sequencer,
        }
    }

    /// Seed the nonce counter from the chain and assemble the engine
    pub async fn connect(
        rpc: Arc<dyn ChainRpc>,
        account: SigningAccount,
        params: ChainParams,
        broadcaster_config: BroadcasterConfig,
    ) -> NonceResult<Self> {
        let sequencer = NonceSequencer::from_chain(rpc.as_ref(), account.address()).await?;
        Ok(Self::new(rpc, account, sequencer, params, broadcaster_config))
    }

    pub fn signer_address(&self) -> Address {
        self.account.address()
    }

    pub fn chain_params(&self) -> &ChainParams {
        self.builder.params()
    }

    /// Next nonce the sequencer would assign
    pub async fn next_nonce(&self) -> u64 {
        self.sequencer.peek().await
    }

    /// Validate free text and, if it is a launch request, run it
    pub async fn handle_launch_text(&self, text: &str) -> LaunchResult {
        self.handle_launch_text_with(text, &LaunchContext::new()).await
    }

    pub async fn handle_launch_text_with(&self, text: &str, ctx: &LaunchContext) -> LaunchResult {
        match self.validate(text, ctx) {
            Ok(request) => self.launch_with(request, ctx).await,
            Err(err) => LaunchResult::failed(err),
        }
    }

    /// Validation step on its own, for callers that acknowledge a request
    /// before running it. Rejections are counted but never touch the chain.
    pub fn validate(&self, text: &str, ctx: &LaunchContext) -> Result<LaunchRequest, LaunchError> {
        parse_launch_text(text).map_err(|err| {
            debug!(launch_id = %ctx.launch_id, error = %err, "Launch text rejected");
            metrics()
                .launches_failed
                .with_label_values(&[err.kind().as_str()])
                .inc();
            err
        })
    }

    /// Run an already validated request
    pub async fn launch(&self, request: LaunchRequest) -> LaunchResult {
        self.launch_with(request, &LaunchContext::new()).await
    }

    pub async fn launch_with(&self, request: LaunchRequest, ctx: &LaunchContext) -> LaunchResult {
        ctx.logger.log_request_accepted(
            request.name(),
            request.symbol(),
            &request.supply_whole().to_string(),
        );

        let timer = LaunchTimer::start();
        let outcome = self.run(request, ctx).await;

        match &outcome {
            Ok(token) => {
                ctx.logger
                    .log_launch_success(&token.token_address, &token.tx_hash, ctx.elapsed_ms());
                timer.finish(None);
            }
            Err(err) => {
                ctx.logger.log_launch_failure(err, ctx.elapsed_ms());
                timer.finish(Some(err.kind().as_str()));
            }
        }

        LaunchResult::from(outcome)
    }

    async fn run(
        &self,
        request: LaunchRequest,
        ctx: &LaunchContext,
    ) -> Result<LaunchedToken, LaunchError> {
        let max_error_len = self.broadcaster.config().max_error_len;

        // Before the lease: a failed read must not cost a nonce
        let gas_price = self
            .builder
            .current_gas_price()
            .await
            .map_err(|e| LaunchError::broadcast(e, None, max_error_len))?;

        let lease = self
            .sequencer
            .reserve()
            .await
            .map_err(|e| LaunchError::broadcast(e, None, max_error_len))?;
        let nonce = lease.nonce();
        ctx.logger.log_nonce_reserved(nonce, gas_price);

        let unsigned = self.builder.build(&request, nonce, gas_price);
        let signed = match self.account.sign(&unsigned) {
            Ok(signed) => signed,
            Err(err) => {
                ctx.logger.log_nonce_stranded(nonce, &err);
                return Err(err);
            }
        };

        let tx_hash = match self.broadcaster.send(signed).await {
            Ok(tx_hash) => tx_hash,
            Err(err) => {
                if err.strands_nonce() {
                    ctx.logger.log_nonce_stranded(nonce, &err);
                }
                return Err(err);
            }
        };
        lease.release();
        ctx.logger.log_broadcast(nonce, &tx_hash);

        let receipt = self.broadcaster.wait_for_receipt(tx_hash).await?;
        let token_address = self.extractor.extract(&receipt)?;

        Ok(LaunchedToken {
            request,
            token_address,
            tx_hash,
        })
    }

    /// Operator recovery: replace the nonce counter with the chain's pending
    /// count. Waits for any in-flight broadcast to finish first.
    pub async fn resync(&self) -> NonceResult<ResyncReport> {
        self.sequencer.resync(self.rpc.as_ref()).await
    }
}
