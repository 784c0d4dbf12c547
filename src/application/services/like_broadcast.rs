//! # Like Broadcaster
//!
//! Fans out "quote liked" events to live subscribers. New subscribers first
//! receive the most recent events, then everything emitted after they joined.
//!
//! Delivery is best-effort: a subscriber that falls behind the channel
//! capacity skips the events it missed.

use crate::domain::entities::Quote;
use crate::domain::value_objects::QuoteId;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// Number of past events replayed to a new subscriber.
pub const DEFAULT_REPLAY: usize = 3;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// A quote that was just liked, with its updated counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLikedEvent {
    /// Quote id.
    pub id: QuoteId,
    /// Quote author.
    pub author: String,
    /// Quote text.
    pub text: String,
    /// Like count after the like.
    pub likes: u32,
}

impl QuoteLikedEvent {
    /// Builds an event from a persisted quote; `None` if the quote has no id.
    #[must_use]
    pub fn from_quote(quote: &Quote) -> Option<Self> {
        Some(Self {
            id: quote.id()?,
            author: quote.author().to_string(),
            text: quote.text().to_string(),
            likes: quote.likes(),
        })
    }
}

/// Broadcast channel with a small replay buffer.
#[derive(Debug)]
pub struct LikeBroadcaster {
    sender: broadcast::Sender<QuoteLikedEvent>,
    recent: Mutex<VecDeque<QuoteLikedEvent>>,
    replay: usize,
}

impl Default for LikeBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY, DEFAULT_REPLAY)
    }
}

impl LikeBroadcaster {
    /// Creates a broadcaster with the given channel capacity and replay depth.
    #[must_use]
    pub fn new(capacity: usize, replay: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            recent: Mutex::new(VecDeque::with_capacity(replay)),
            replay,
        }
    }

    /// Publishes an event; returns how many live subscribers received it.
    pub fn emit(&self, event: QuoteLikedEvent) -> usize {
        let mut recent = self.recent.lock();
        if self.replay > 0 {
            if recent.len() == self.replay {
                recent.pop_front();
            }
            recent.push_back(event.clone());
        }
        // Sending fails only when nobody is listening.
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the replay snapshot and a receiver for later events.
    ///
    /// The snapshot and the receiver are taken under the same lock as
    /// [`emit`](Self::emit), so no event is missed or seen twice.
    pub fn subscribe(&self) -> (Vec<QuoteLikedEvent>, broadcast::Receiver<QuoteLikedEvent>) {
        let recent = self.recent.lock();
        let receiver = self.sender.subscribe();
        (recent.iter().cloned().collect(), receiver)
    }

    /// Replay followed by live events, as a stream.
    pub fn stream(&self) -> BoxStream<'static, QuoteLikedEvent> {
        let (replay, receiver) = self.subscribe();
        let live = BroadcastStream::new(receiver).filter_map(|item| async move {
            match item {
                Ok(event) => Some(event),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "like stream subscriber lagged");
                    None
                }
            }
        });
        stream::iter(replay).chain(live).boxed()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
