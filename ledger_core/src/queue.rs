//! Ordering service (`§4.7`): a timed/sized batcher that turns incoming
//! transactions into numbered [`Proposal`]s.
//!
//! Grounded on the teacher's `core/src/queue.rs` (`Queue`: a lock-free
//! multi-producer structure addressed by hash) for the mempool shape, and
//! on `§5`'s scheduling model for the background task: one `tokio` task
//! owns the batching state exclusively, fed by an unbounded notification
//! channel merged with a `tokio::time::interval`, so the size-trigger and
//! timer-trigger paths can never run concurrently (`§4.7`'s `Emitting` is
//! non-reentrant because there is exactly one task that could re-enter it).

use std::{sync::Arc, time::Duration};

use crossbeam_queue::SegQueue;
use serde::{Deserialize, Serialize};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, trace};

use crate::{data_model::prelude::*, wsv::WorldStateView};

/// Configuration for the ordering service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfiguration {
    /// Transactions per proposal; also the size-trigger threshold.
    pub max_size: usize,
    /// Milliseconds between timer firings.
    pub delay_ms: u64,
}

impl Default for QueueConfiguration {
    fn default() -> Self {
        Self {
            max_size: 128,
            delay_ms: 1000,
        }
    }
}

/// Errors raised submitting to the ordering service.
#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum Error {
    /// ordering service has shut down
    Closed,
}

/// Collaborator interface: the current ledger peer set, consulted once
/// per proposal emission.
pub trait PeerQuery: Send + Sync + 'static {
    /// Returns every currently registered peer.
    fn get_ledger_peers(&self) -> Vec<Peer>;
}

/// Collaborator interface: delivers a proposal to a set of peer
/// addresses. Fire-and-forget from the core's perspective (`§5`).
pub trait OrderingServiceTransport: Send + Sync + 'static {
    /// Publishes `proposal` to `peers`.
    fn publish_proposal(&self, proposal: Proposal, peers: Vec<String>);
}

impl PeerQuery for WorldStateView {
    fn get_ledger_peers(&self) -> Vec<Peer> {
        self.get_peers()
    }
}

/// Lock-free, multi-producer FIFO of submitted transactions. Single
/// consumer: the ordering service's background task.
#[derive(Default)]
pub struct Queue {
    inner: SegQueue<Transaction>,
}

impl Queue {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a transaction. Never blocks.
    pub fn push(&self, tx: Transaction) {
        self.inner.push(tx);
    }

    /// Dequeues the oldest transaction, if any.
    pub fn pop(&self) -> Option<Transaction> {
        self.inner.pop()
    }

    /// Current queue depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// `true` if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// A running batcher: owns a [`Queue`] and a background task that drains
/// it into numbered [`Proposal`]s per `§4.7`.
pub struct OrderingService {
    queue: Arc<Queue>,
    notify: mpsc::UnboundedSender<()>,
}

impl OrderingService {
    /// Spawns the background batching task. `peer_query` and `transport`
    /// are consulted once per emitted proposal.
    pub fn spawn<P, T>(config: QueueConfiguration, peer_query: Arc<P>, transport: Arc<T>) -> (Self, JoinHandle<()>)
    where
        P: PeerQuery,
        T: OrderingServiceTransport,
    {
        let queue = Arc::new(Queue::new());
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_loop(config, Arc::clone(&queue), peer_query, transport, notify_rx));
        (
            Self {
                queue,
                notify: notify_tx,
            },
            handle,
        )
    }

    /// Submits a transaction for batching. Enqueues immediately and wakes
    /// the background task; never blocks the caller.
    pub fn submit(&self, tx: Transaction) {
        self.queue.push(tx);
        // The task may already have shut down (e.g. during node shutdown);
        // that is not the submitter's problem to report.
        let _ = self.notify.send(());
    }

    /// Current mempool depth, for diagnostics.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

async fn run_loop<P, T>(
    config: QueueConfiguration,
    queue: Arc<Queue>,
    peer_query: Arc<P>,
    transport: Arc<T>,
    mut notify: mpsc::UnboundedReceiver<()>,
) where
    P: PeerQuery,
    T: OrderingServiceTransport,
{
    let mut next_height = 2_u64;
    let mut ticker = interval(Duration::from_millis(config.delay_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            submitted = notify.recv() => {
                match submitted {
                    Some(()) => {
                        if queue.len() >= config.max_size {
                            trace!(size = queue.len(), "size trigger");
                            emit(&queue, &mut next_height, &peer_query, &transport, config.max_size);
                            ticker.reset();
                        }
                    }
                    None => {
                        debug!("ordering service shutting down: submitters dropped");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                if !queue.is_empty() {
                    trace!("timer trigger");
                    emit(&queue, &mut next_height, &peer_query, &transport, config.max_size);
                }
            }
        }
    }
}

fn emit<P, T>(queue: &Queue, next_height: &mut u64, peer_query: &P, transport: &T, max_size: usize)
where
    P: PeerQuery,
    T: OrderingServiceTransport,
{
    let mut transactions = Vec::with_capacity(max_size.min(queue.len().max(1)));
    for _ in 0..max_size {
        match queue.pop() {
            Some(tx) => transactions.push(tx),
            None => break,
        }
    }
    if transactions.is_empty() {
        return;
    }

    let height = *next_height;
    *next_height += 1;
    let peers = peer_query
        .get_ledger_peers()
        .into_iter()
        .map(|peer| peer.address)
        .collect();
    debug!(height, size = transactions.len(), "emitting proposal");
    transport.publish_proposal(Proposal { height, transactions }, peers);
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use ledger_crypto::PublicKey;

    use super::*;

    struct NoPeers;
    impl PeerQuery for NoPeers {
        fn get_ledger_peers(&self) -> Vec<Peer> {
            Vec::new()
        }
    }

    struct RecordingTransport {
        proposals: Mutex<Vec<Proposal>>,
    }
    impl OrderingServiceTransport for RecordingTransport {
        fn publish_proposal(&self, proposal: Proposal, _peers: Vec<String>) {
            self.proposals.lock().unwrap().push(proposal);
        }
    }

    fn sample_tx(counter: u64) -> Transaction {
        Transaction::new(TransactionPayload {
            creator: AccountId::new("alice", DomainId::new("wonderland")),
            created_at_ms: counter,
            creator_tx_counter: counter,
            commands: vec![Command::AddPeer {
                public_key: PublicKey::ZERO,
                address: "127.0.0.1:1337".into(),
            }],
        })
    }

    #[tokio::test]
    async fn size_trigger_emits_full_batches() {
        let config = QueueConfiguration {
            max_size: 3,
            delay_ms: 60_000,
        };
        let transport = Arc::new(RecordingTransport {
            proposals: Mutex::new(Vec::new()),
        });
        let (service, handle) = OrderingService::spawn(config, Arc::new(NoPeers), Arc::clone(&transport));

        for counter in 0..7 {
            service.submit(sample_tx(counter));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        let proposals = transport.proposals.lock().unwrap();
        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].height, 2);
        assert_eq!(proposals[0].transactions.len(), 3);
        assert_eq!(proposals[1].height, 3);
        assert_eq!(proposals[1].transactions.len(), 3);
        assert_eq!(service.pending(), 1);
        drop(service);
        let _ = handle.await;
    }

    #[tokio::test]
    async fn timer_trigger_emits_remainder() {
        let config = QueueConfiguration {
            max_size: 3,
            delay_ms: 30,
        };
        let transport = Arc::new(RecordingTransport {
            proposals: Mutex::new(Vec::new()),
        });
        let (service, handle) = OrderingService::spawn(config, Arc::new(NoPeers), Arc::clone(&transport));
        for counter in 0..7 {
            service.submit(sample_tx(counter));
        }
        tokio::time::sleep(Duration::from_millis(150)).await;

        let proposals = transport.proposals.lock().unwrap();
        let sizes: Vec<usize> = proposals.iter().map(|proposal| proposal.transactions.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        let heights: Vec<u64> = proposals.iter().map(|proposal| proposal.height).collect();
        assert_eq!(heights, vec![2, 3, 4]);
        drop(service);
        let _ = handle.await;
    }
}
