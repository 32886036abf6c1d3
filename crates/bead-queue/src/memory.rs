//! In-memory queue implementation for testing and development.
//!
//! This module provides a `Queue` that lives entirely in process memory:
//! - Messages are delivered in FIFO order
//! - `peek` locks a message for a configurable duration and hands out a lock token
//! - Locks that expire return the message to the queue in its original position
//! - `delete`, `release` and `renew_lock` check the lock token
//!
//! Useful for unit testing queue consumers without a broker.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use crate::error::QueueError;
use crate::message::{LockToken, MessageId, QueueMessage, QueueName};
use crate::queue::Queue;

/// Default lock duration for peeked messages
pub const DEFAULT_LOCK_DURATION_SECONDS: i64 = 60;

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// A message waiting in the queue
#[derive(Clone)]
struct StoredMessage {
    id: MessageId,
    sequence_number: u64,
    payload: Bytes,
    enqueued_at: DateTime<Utc>,
    delivery_count: u32,
}

impl StoredMessage {
    fn to_queue_message(&self, lock_token: LockToken, locked_until: Option<DateTime<Utc>>) -> QueueMessage {
        let mut properties = Map::new();
        properties.insert("MessageId".to_string(), Value::from(self.id.as_str()));
        properties.insert("SequenceNumber".to_string(), Value::from(self.sequence_number));
        properties.insert("DeliveryCount".to_string(), Value::from(self.delivery_count));
        properties.insert(
            "EnqueuedTimeUtc".to_string(),
            Value::from(self.enqueued_at.to_rfc3339()),
        );
        if !lock_token.is_empty() {
            properties.insert("LockToken".to_string(), Value::from(lock_token.as_str()));
        }
        if let Some(locked_until) = locked_until {
            properties.insert(
                "LockedUntilUtc".to_string(),
                Value::from(locked_until.to_rfc3339()),
            );
        }

        QueueMessage::new(self.id.clone(), lock_token, self.payload.clone())
            .with_properties(properties)
    }
}

/// A peeked message whose lock is held by a consumer
struct LockedMessage {
    message: StoredMessage,
    lock_token: LockToken,
    locked_until: DateTime<Utc>,
}

impl LockedMessage {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.locked_until
    }
}

#[derive(Default)]
struct QueueState {
    available: VecDeque<StoredMessage>,
    locked: HashMap<MessageId, LockedMessage>,
    next_sequence_number: u64,
}

impl QueueState {
    /// Put a message back in sequence order
    fn restore(&mut self, message: StoredMessage) {
        let position = self
            .available
            .partition_point(|m| m.sequence_number < message.sequence_number);
        self.available.insert(position, message);
    }

    /// Return messages whose lock has run out
    fn reclaim_expired(&mut self, now: DateTime<Utc>) {
        let expired: Vec<MessageId> = self
            .locked
            .iter()
            .filter(|(_, locked)| locked.is_expired(now))
            .map(|(id, _)| id.clone())
            .collect();

        for id in expired {
            if let Some(locked) = self.locked.remove(&id) {
                debug!(message_id = %id, "Lock expired, message available again");
                self.restore(locked.message);
            }
        }
    }
}

// ============================================================================
// InMemoryQueue
// ============================================================================

/// Process-local FIFO queue
pub struct InMemoryQueue {
    name: QueueName,
    lock_duration: Duration,
    state: RwLock<QueueState>,
}

impl InMemoryQueue {
    /// Create an empty queue
    pub fn new(name: QueueName) -> Self {
        Self {
            name,
            lock_duration: Duration::seconds(DEFAULT_LOCK_DURATION_SECONDS),
            state: RwLock::new(QueueState::default()),
        }
    }

    /// Set how long a peeked message stays locked
    pub fn with_lock_duration(mut self, lock_duration: Duration) -> Self {
        self.lock_duration = lock_duration;
        self
    }

    /// Get lock duration
    pub fn lock_duration(&self) -> Duration {
        self.lock_duration
    }

    /// Number of messages that can be fetched right now
    pub fn available_count(&self) -> usize {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.reclaim_expired(Utc::now());
        state.available.len()
    }

    /// Number of messages currently locked by consumers
    pub fn locked_count(&self) -> usize {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.reclaim_expired(Utc::now());
        state.locked.len()
    }

    fn enqueue(&self, payloads: Vec<Bytes>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();

        for payload in payloads {
            state.next_sequence_number += 1;
            let message = StoredMessage {
                id: MessageId::generate(),
                sequence_number: state.next_sequence_number,
                payload,
                enqueued_at: now,
                delivery_count: 0,
            };
            state.available.push_back(message);
        }
    }

    /// Remove the lock held under `message`'s id after checking its token
    fn take_lock(
        &self,
        state: &mut QueueState,
        message: &QueueMessage,
        now: DateTime<Utc>,
    ) -> Result<LockedMessage, QueueError> {
        let lost = || QueueError::LockLost {
            queue: self.name.to_string(),
            message_id: message.id().to_string(),
        };

        let Some(locked) = state.locked.remove(message.id()) else {
            state.reclaim_expired(now);
            if state.available.iter().any(|m| &m.id == message.id()) {
                return Err(lost());
            }
            return Err(QueueError::MessageNotFound {
                queue: self.name.to_string(),
                message_id: message.id().to_string(),
            });
        };

        if &locked.lock_token != message.lock_token() {
            state.locked.insert(message.id().clone(), locked);
            return Err(lost());
        }

        if locked.is_expired(now) {
            state.restore(locked.message);
            return Err(lost());
        }

        Ok(locked)
    }
}

#[async_trait]
impl Queue for InMemoryQueue {
    fn name(&self) -> &QueueName {
        &self.name
    }

    async fn put(&self, payload: Bytes) -> Result<(), QueueError> {
        self.enqueue(vec![payload]);
        Ok(())
    }

    async fn put_batch(&self, payloads: Vec<Bytes>) -> Result<(), QueueError> {
        self.enqueue(payloads);
        Ok(())
    }

    async fn peek(&self) -> Result<Option<QueueMessage>, QueueError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        state.reclaim_expired(now);

        let Some(mut message) = state.available.pop_front() else {
            return Ok(None);
        };

        message.delivery_count += 1;
        let lock_token = LockToken::generate();
        let locked_until = now + self.lock_duration;
        let fetched = message.to_queue_message(lock_token.clone(), Some(locked_until));

        state.locked.insert(
            message.id.clone(),
            LockedMessage {
                message,
                lock_token,
                locked_until,
            },
        );

        Ok(Some(fetched))
    }

    async fn get(&self) -> Result<Option<QueueMessage>, QueueError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.reclaim_expired(Utc::now());

        Ok(state.available.pop_front().map(|mut message| {
            message.delivery_count += 1;
            message.to_queue_message(LockToken::default(), None)
        }))
    }

    async fn delete(&self, message: &QueueMessage) -> Result<(), QueueError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        self.take_lock(&mut state, message, Utc::now())?;
        Ok(())
    }

    async fn release(&self, message: &QueueMessage) -> Result<(), QueueError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let locked = self.take_lock(&mut state, message, Utc::now())?;
        state.restore(locked.message);
        Ok(())
    }

    async fn renew_lock(&self, message: &QueueMessage) -> Result<(), QueueError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        let mut locked = self.take_lock(&mut state, message, now)?;
        locked.locked_until = now + self.lock_duration;
        state.locked.insert(message.id().clone(), locked);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryQueue")
            .field("name", &self.name)
            .field("lock_duration", &self.lock_duration)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
