//! Nonce sequencer with lease-based ordering
//!
//! The sequencer owns the only cross-request mutable state of the pipeline:
//! the next nonce for the signing account. Access is serialized through a
//! tokio mutex:
//! - `reserve()` advances the counter and returns a [`NonceLease`] that keeps
//!   the lock held, so the caller can build, sign and broadcast before the
//!   next request gets its nonce
//! - a reserved nonce is never handed back; failures after reservation leave
//!   a gap that needs [`NonceSequencer::resync`] or a replacement transaction
//! - the counter is never re-read from the chain mid-flight
use super::nonce_errors::{NonceError, NonceResult};
use crate::metrics::metrics;
use crate::rpc_manager::ChainRpc;
use alloy::primitives::Address;
use std::time::Instant;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Serializes nonce assignment for a single signing account
#[derive(Debug)]
pub struct NonceSequencer {
    address: Address,
    next: Mutex<u64>,
}

/// Outcome of an operator-triggered re-sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResyncReport {
    /// In-memory next nonce before the re-sync
    pub previous: u64,
    /// Chain-reported pending count now in use
    pub current: u64,
}

/// An assigned nonce plus exclusive hold on the sequencer.
///
/// While the lease is alive no other request can reserve a nonce, which is
/// what keeps broadcasts in nonce order. Drop it right after the broadcast
/// returns, before waiting for confirmation.
pub struct NonceLease<'a> {
    nonce: u64,
    acquired_at: Instant,
    _guard: MutexGuard<'a, u64>,
}

impl NonceLease<'_> {
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Explicitly end the critical section
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for NonceLease<'_> {
    fn drop(&mut self) {
        debug!(
            nonce = self.nonce,
            held_for_ms = self.acquired_at.elapsed().as_millis() as u64,
            "Nonce lease released"
        );
    }
}

impl std::fmt::Debug for NonceLease<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceLease")
            .field("nonce", &self.nonce)
            .finish_non_exhaustive()
    }
}

impl NonceSequencer {
    /// Create a sequencer starting at a known nonce
    pub fn new(address: Address, start: u64) -> Self {
        metrics().next_nonce.set(start as i64);
        Self {
            address,
            next: Mutex::new(start),
        }
    }

    /// Seed the sequencer from the chain's pending transaction count
    pub async fn from_chain(rpc: &dyn ChainRpc, address: Address) -> NonceResult<Self> {
        let start = rpc
            .pending_nonce(address)
            .await
            .map_err(|source| NonceError::Sync { address, source })?;

        info!(%address, start_nonce = start, "Nonce sequencer synced from chain");
        Ok(Self::new(address, start))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Assign the next nonce and keep the sequencer locked until the lease drops
    pub async fn reserve(&self) -> NonceResult<NonceLease<'_>> {
        let mut guard = self.next.lock().await;
        let nonce = *guard;
        *guard = nonce.checked_add(1).ok_or(NonceError::Exhausted {
            address: self.address,
        })?;

        let m = metrics();
        m.nonces_reserved.inc();
        m.next_nonce.set(*guard as i64);

        debug!(address = %self.address, nonce, "Nonce reserved");

        Ok(NonceLease {
            nonce,
            acquired_at: Instant::now(),
            _guard: guard,
        })
    }

    /// Assign the next nonce without holding the sequencer afterwards
    pub async fn reserve_nonce(&self) -> NonceResult<u64> {
        Ok(self.reserve().await?.nonce())
    }

    /// Next nonce that would be assigned
    pub async fn peek(&self) -> u64 {
        *self.next.lock().await
    }

    /// Replace the in-memory counter with the chain's pending count.
    ///
    /// Holds the sequencer for the duration of the RPC call so no launch can
    /// reserve a nonce mid re-sync. Only for operator-driven recovery after a
    /// gap; it is never called by the pipeline itself.
    pub async fn resync(&self, rpc: &dyn ChainRpc) -> NonceResult<ResyncReport> {
        let mut guard = self.next.lock().await;
        let previous = *guard;

        let current = rpc
            .pending_nonce(self.address)
            .await
            .map_err(|source| NonceError::Sync {
                address: self.address,
                source,
            })?;

        *guard = current;
        metrics().next_nonce.set(current as i64);

        if current < previous {
            warn!(
                address = %self.address,
                previous,
                current,
                "Nonce re-sync moved counter backwards; stranded nonces will be reused"
            );
        } else {
            info!(address = %self.address, previous, current, "Nonce re-sync complete");
        }

        Ok(ResyncReport { previous, current })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockChainRpc;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_sequential_reservations() {
        let seq = NonceSequencer::new(Address::ZERO, 5);
        assert_eq!(seq.reserve_nonce().await.unwrap(), 5);
        assert_eq!(seq.reserve_nonce().await.unwrap(), 6);
        assert_eq!(seq.peek().await, 7);
    }

    #[tokio::test]
    async fn test_from_chain_uses_pending_count() {
        let rpc = MockChainRpc::new().with_pending_nonce(42);
        let seq = NonceSequencer::from_chain(&rpc, Address::repeat_byte(1))
            .await
            .unwrap();
        assert_eq!(seq.peek().await, 42);
        assert_eq!(seq.address(), Address::repeat_byte(1));
    }

    #[tokio::test]
    async fn test_from_chain_propagates_rpc_failure() {
        let rpc = MockChainRpc::new();
        rpc.fail_nonce_reads("connection refused");
        let err = NonceSequencer::from_chain(&rpc, Address::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, NonceError::Sync { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_have_no_gaps_or_duplicates() {
        const CALLERS: u64 = 200;
        const START: u64 = 17;

        let seq = Arc::new(NonceSequencer::new(Address::ZERO, START));
        let mut handles = Vec::new();
        for _ in 0..CALLERS {
            let seq = seq.clone();
            handles.push(tokio::spawn(async move { seq.reserve_nonce().await.unwrap() }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()), "duplicate nonce");
        }

        let expected: HashSet<u64> = (START..START + CALLERS).collect();
        assert_eq!(seen, expected);
        assert_eq!(seq.peek().await, START + CALLERS);
    }

    #[tokio::test]
    async fn test_lease_blocks_next_reservation_until_dropped() {
        let seq = Arc::new(NonceSequencer::new(Address::ZERO, 0));
        let lease = seq.reserve().await.unwrap();
        assert_eq!(lease.nonce(), 0);

        let contender = {
            let seq = seq.clone();
            tokio::spawn(async move { seq.reserve_nonce().await.unwrap() })
        };

        // The contender cannot get through while the lease is held
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        lease.release();
        assert_eq!(contender.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dropped_lease_does_not_return_nonce() {
        let seq = NonceSequencer::new(Address::ZERO, 10);
        {
            let lease = seq.reserve().await.unwrap();
            assert_eq!(lease.nonce(), 10);
            // Simulates a failure before broadcast
        }
        assert_eq!(seq.reserve_nonce().await.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_reserve_at_max_nonce_fails_without_wrapping() {
        let rpc = MockChainRpc::new().with_pending_nonce(u64::MAX);
        let seq = NonceSequencer::from_chain(&rpc, Address::ZERO).await.unwrap();

        let err = seq.reserve_nonce().await.unwrap_err();
        assert!(matches!(err, NonceError::Exhausted { .. }));
        assert_eq!(seq.peek().await, u64::MAX);

        // Still usable after a re-sync to a sane count
        let rpc = MockChainRpc::new().with_pending_nonce(4);
        seq.resync(&rpc).await.unwrap();
        assert_eq!(seq.reserve_nonce().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_resync_replaces_counter() {
        let rpc = MockChainRpc::new().with_pending_nonce(3);
        let seq = NonceSequencer::new(Address::ZERO, 9);

        let report = seq.resync(&rpc).await.unwrap();
        assert_eq!(report, ResyncReport { previous: 9, current: 3 });
        assert_eq!(seq.reserve_nonce().await.unwrap(), 3);
    }
}
