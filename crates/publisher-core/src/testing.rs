//! In-memory publish client for tests.
//!
//! Records every `publish` call in call order and answers according to a
//! per-sequence-number script, falling back to a default behavior.

use action_types::{Action, ActionKind, WireMessage};
use chrono::DateTime;
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::client::{DeliveryFuture, MessageId, PublishClient};
use crate::error::PublishError;

/// How the mock answers one publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    /// Resolve successfully right away.
    Succeed,
    /// Resolve successfully after the given delay.
    SucceedAfter(Duration),
    /// Resolve with a delivery error.
    Fail(String),
    /// Refuse synchronously.
    Reject(String),
    /// Stay pending until [`MockPublishClient::resolve`] is called.
    Hold,
}

type Resolver = oneshot::Sender<Result<MessageId, PublishError>>;

pub struct MockPublishClient {
    default: Behavior,
    script: Mutex<HashMap<u64, Behavior>>,
    published: Mutex<Vec<WireMessage>>,
    held: Mutex<HashMap<u64, Resolver>>,
    close_calls: AtomicUsize,
}

impl Default for MockPublishClient {
    fn default() -> Self {
        Self::with_default(Behavior::Succeed)
    }
}

impl MockPublishClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(default: Behavior) -> Self {
        Self {
            default,
            script: Mutex::new(HashMap::new()),
            published: Mutex::new(Vec::new()),
            held: Mutex::new(HashMap::new()),
            close_calls: AtomicUsize::new(0),
        }
    }

    /// Override the behavior for one sequence number.
    pub fn script(self, sequence_num: u64, behavior: Behavior) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(sequence_num, behavior);
        self
    }

    /// Every message passed to `publish`, in call order.
    pub fn published(&self) -> Vec<WireMessage> {
        self.published.lock().unwrap().clone()
    }

    pub fn sequence_nums(&self) -> Vec<u64> {
        self.published()
            .iter()
            .filter_map(WireMessage::sequence_num)
            .collect()
    }

    /// Sequence numbers currently held.
    pub fn held(&self) -> Vec<u64> {
        let mut held: Vec<u64> = self.held.lock().unwrap().keys().copied().collect();
        held.sort_unstable();
        held
    }

    /// Resolve a held publish. Returns `false` if nothing was held under
    /// that sequence number.
    pub fn resolve(&self, sequence_num: u64, result: Result<MessageId, PublishError>) -> bool {
        match self.held.lock().unwrap().remove(&sequence_num) {
            Some(resolver) => resolver.send(result).is_ok(),
            None => false,
        }
    }

    /// Resolve every held publish successfully.
    pub fn resolve_all(&self) {
        let held: Vec<(u64, Resolver)> = self.held.lock().unwrap().drain().collect();
        for (sequence_num, resolver) in held {
            let _ = resolver.send(Ok(message_id(sequence_num)));
        }
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    fn behavior_for(&self, sequence_num: u64) -> Behavior {
        self.script
            .lock()
            .unwrap()
            .get(&sequence_num)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

impl PublishClient for MockPublishClient {
    fn publish(&self, message: WireMessage) -> Result<DeliveryFuture, PublishError> {
        let sequence_num = message.sequence_num().unwrap_or(u64::MAX);
        self.published.lock().unwrap().push(message);

        if self.close_calls() > 0 {
            return Err(PublishError::Rejected("client closed".to_string()));
        }

        match self.behavior_for(sequence_num) {
            Behavior::Succeed => Ok(async move { Ok(message_id(sequence_num)) }.boxed()),
            Behavior::SucceedAfter(delay) => Ok(async move {
                tokio::time::sleep(delay).await;
                Ok(message_id(sequence_num))
            }
            .boxed()),
            Behavior::Fail(reason) => Ok(async move { Err(PublishError::Delivery(reason)) }.boxed()),
            Behavior::Reject(reason) => Err(PublishError::Rejected(reason)),
            Behavior::Hold => {
                let (tx, rx) = oneshot::channel();
                self.held.lock().unwrap().insert(sequence_num, tx);
                Ok(async move {
                    rx.await.unwrap_or_else(|_| {
                        Err(PublishError::Delivery("mock resolver dropped".to_string()))
                    })
                }
                .boxed())
            }
        }
    }

    fn close(&self) -> Result<(), PublishError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn message_id(sequence_num: u64) -> MessageId {
    MessageId::new(format!("mock-{sequence_num}"))
}

/// A purchase by `subject` at a fixed timestamp.
pub fn sample_action(subject: &str) -> Action {
    let timestamp = DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default();
    Action::new(subject, ActionKind::Purchase, timestamp)
        .with_item(1)
        .with_price(9.99)
}

/// One action per subject, in order.
pub fn actions_for(subjects: &[&str]) -> Vec<Action> {
    subjects.iter().map(|s| sample_action(s)).collect()
}
