//! The only writer of persisted positions
//!
//! Commits are fire-and-forget relative to the drag: the session keeps
//! classifying while earlier commits are in flight. Writes for the same node
//! are serialized in issue order, and each one re-reads the store, so a slow
//! early commit never clobbers a later one with a stale key.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use trellis_api::{OrderKey, TreeNode};

use crate::debounce::CommitKey;
use crate::error::{ReorderError, Result};
use crate::resolver::Candidate;
use crate::traits::ReorderOperations;

/// A debounced placement ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub key: CommitKey,
    pub node_id: String,
    pub target: Candidate,
}

/// Outcome of a commit, published for the UI layer
#[derive(Debug)]
pub enum CommitEvent {
    Committed {
        key: CommitKey,
        node_id: String,
        order_key: OrderKey,
    },
    /// A newer placement for the same node was already written
    Superseded { key: CommitKey },
    /// Invalid placement caught at write time; no user-visible error
    Rejected { key: CommitKey, error: ReorderError },
    /// Retries exhausted; the UI should report it and resynchronize
    Failed { key: CommitKey, error: ReorderError },
}

/// Per-node write lane: the lock guards the sequence number of the last
/// request that ran, `issued` counts requests handed out.
struct Lane {
    last_run: Arc<tokio::sync::Mutex<u64>>,
    issued: u64,
}

type Ticket = (Arc<tokio::sync::Mutex<u64>>, u64);

pub struct ReorderCommitter<N, S> {
    store: Arc<S>,
    max_attempts: u32,
    lanes: Mutex<HashMap<String, Lane>>,
    events: mpsc::UnboundedSender<CommitEvent>,
    _node: PhantomData<fn() -> N>,
}

impl<N, S> ReorderCommitter<N, S>
where
    N: TreeNode,
    S: ReorderOperations<N> + 'static,
{
    /// Returns the committer and the receiving end of its event stream
    pub fn new(store: Arc<S>, max_attempts: u32) -> (Self, mpsc::UnboundedReceiver<CommitEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let committer = Self {
            store,
            max_attempts: max_attempts.max(1),
            lanes: Mutex::new(HashMap::new()),
            events,
            _node: PhantomData,
        };
        (committer, receiver)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Persist one placement, retrying retryable failures against a fresh read
    ///
    /// Returns `Ok(None)` when a newer request for the same node already ran.
    pub async fn commit(&self, request: &CommitRequest) -> Result<Option<OrderKey>> {
        let ticket = self.issue(&request.node_id);
        self.run(request, ticket).await
    }

    /// Run the commit on the runtime and publish its outcome
    ///
    /// The request's place in its node's lane is taken before spawning, so
    /// commits issued later always win regardless of task scheduling.
    pub fn spawn(self: &Arc<Self>, request: CommitRequest) -> JoinHandle<()> {
        let ticket = self.issue(&request.node_id);
        let committer = Arc::clone(self);
        tokio::spawn(async move {
            let event = match committer.run(&request, ticket).await {
                Ok(Some(order_key)) => CommitEvent::Committed {
                    key: request.key,
                    node_id: request.node_id,
                    order_key,
                },
                Ok(None) => CommitEvent::Superseded { key: request.key },
                Err(error @ ReorderError::InvalidTarget { .. }) => CommitEvent::Rejected {
                    key: request.key,
                    error,
                },
                Err(error) => {
                    tracing::error!("[ReorderCommitter] Commit failed: {}", error);
                    CommitEvent::Failed {
                        key: request.key,
                        error,
                    }
                }
            };
            // Receiver may be gone when the host doesn't listen for outcomes
            let _ = committer.events.send(event);
        })
    }

    #[tracing::instrument(skip(self, request, ticket), fields(node_id = %request.node_id, key = %request.key))]
    async fn run(&self, request: &CommitRequest, ticket: Ticket) -> Result<Option<OrderKey>> {
        let (lane, seq) = ticket;
        let result = {
            let mut last_run = lane.lock().await;
            if *last_run > seq {
                tracing::debug!("[ReorderCommitter] Request {} superseded by {}", seq, *last_run);
                Ok(None)
            } else {
                *last_run = seq;
                self.commit_with_retry(request).await.map(Some)
            }
        };
        self.release(&request.node_id, lane);
        result
    }

    async fn commit_with_retry(&self, request: &CommitRequest) -> Result<OrderKey> {
        let mut attempt = 1;
        loop {
            match self
                .store
                .move_and_reorder(&request.key.scope_id, &request.node_id, &request.target)
                .await
            {
                Ok(order_key) => return Ok(order_key),
                Err(error) if error.is_retryable() && attempt < self.max_attempts => {
                    tracing::warn!(
                        "[ReorderCommitter] Attempt {} failed, retrying: {}",
                        attempt,
                        error
                    );
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn issue(&self, node_id: &str) -> Ticket {
        let mut lanes = self.lanes.lock().unwrap_or_else(|e| e.into_inner());
        let lane = lanes.entry(node_id.to_string()).or_insert_with(|| Lane {
            last_run: Arc::new(tokio::sync::Mutex::new(0)),
            issued: 0,
        });
        lane.issued += 1;
        (Arc::clone(&lane.last_run), lane.issued)
    }

    fn release(&self, node_id: &str, lane: Arc<tokio::sync::Mutex<u64>>) {
        let mut lanes = self.lanes.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map and this caller hold it: no request is queued behind us
        if Arc::strong_count(&lane) == 2 {
            lanes.remove(node_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Boundary;
    use crate::testing::MemoryStore;
    use std::time::Duration;
    use trellis_api::Node;

    const SCOPE: &str = "list";

    fn setup(max_attempts: u32) -> (
        Arc<ReorderCommitter<Node<()>, MemoryStore<Node<()>>>>,
        mpsc::UnboundedReceiver<CommitEvent>,
        Arc<MemoryStore<Node<()>>>,
    ) {
        let store = Arc::new(MemoryStore::new());
        store.insert(SCOPE, Node::new("A", None, 1024, ()));
        store.insert(SCOPE, Node::new("B", None, 2048, ()));
        store.insert(SCOPE, Node::new("C", None, 3072, ()));
        let (committer, events) = ReorderCommitter::new(Arc::clone(&store), max_attempts);
        (Arc::new(committer), events, store)
    }

    fn request(node_id: &str, target: Candidate) -> CommitRequest {
        CommitRequest {
            key: CommitKey::new(SCOPE, &target),
            node_id: node_id.to_string(),
            target,
        }
    }

    fn to_start(first: &str) -> Candidate {
        Candidate::new(
            None,
            Boundary::Start {
                first: Some(first.into()),
            },
        )
    }

    #[tokio::test]
    async fn single_failure_is_retried() {
        let (committer, _events, store) = setup(2);
        store.fail_next_writes(1);
        let key = committer.commit(&request("C", to_start("A"))).await.unwrap();
        assert!(key.is_some());
        assert_eq!(store.child_order(SCOPE, None), ["C", "A", "B"]);
    }

    #[tokio::test]
    async fn failed_renumbering_retry_keeps_sibling_order() {
        let store = Arc::new(MemoryStore::new());
        for i in 1..=10 {
            store.insert(SCOPE, Node::new(format!("n{}", i), None, i as i64, ()));
        }
        store.insert(SCOPE, Node::new("x", Some("n1"), 1, ()));
        let (committer, _events) = ReorderCommitter::new(Arc::clone(&store), 2);
        store.fail_next_writes(1);

        let target = Candidate::new(
            None,
            Boundary::Between {
                after: "n3".into(),
                before: "n4".into(),
            },
        );
        committer.commit(&request("x", target)).await.unwrap();

        let expected: Vec<String> = ["n1", "n2", "n3", "x", "n4", "n5", "n6", "n7", "n8", "n9", "n10"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(store.child_order(SCOPE, None), expected);
    }

    #[tokio::test]
    async fn persistent_failure_is_reported() {
        let (committer, mut events, store) = setup(2);
        store.fail_next_writes(2);
        committer.spawn(request("C", to_start("A"))).await.unwrap();

        match events.recv().await.unwrap() {
            CommitEvent::Failed { error, .. } => {
                assert!(matches!(error, ReorderError::Persistence { .. }))
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(store.child_order(SCOPE, None), ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn invalid_target_is_not_retried() {
        let (committer, mut events, store) = setup(2);
        let target = Candidate::new(Some("C"), Boundary::End { last: None });
        committer.spawn(request("C", target)).await.unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            CommitEvent::Rejected { .. }
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn writes_for_one_node_apply_in_issue_order() {
        let (committer, mut events, store) = setup(2);
        store.set_write_delay(Some(Duration::from_millis(20)));

        let first = committer.spawn(request("C", to_start("A")));
        let second = committer.spawn(request(
            "C",
            Candidate::new(
                None,
                Boundary::Between {
                    after: "A".into(),
                    before: "B".into(),
                },
            ),
        ));
        first.await.unwrap();
        second.await.unwrap();

        for _ in 0..2 {
            assert!(matches!(
                events.recv().await,
                Some(CommitEvent::Committed { .. } | CommitEvent::Superseded { .. })
            ));
        }
        assert_eq!(store.child_order(SCOPE, None), ["A", "C", "B"]);
        assert!(committer.lanes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn earlier_request_is_skipped_once_a_later_one_ran() {
        let (committer, _events, store) = setup(2);
        let early = request("C", to_start("A"));
        let late = request(
            "C",
            Candidate::new(
                None,
                Boundary::Between {
                    after: "A".into(),
                    before: "B".into(),
                },
            ),
        );
        let early_ticket = committer.issue("C");
        let late_ticket = committer.issue("C");

        assert!(committer.run(&late, late_ticket).await.unwrap().is_some());
        assert_eq!(committer.run(&early, early_ticket).await.unwrap(), None);
        assert_eq!(store.child_order(SCOPE, None), ["A", "C", "B"]);
    }
}
