//! Conversation layer: merging two change streams into one view.
//!
//! A two-party conversation is fed by two independent store subscriptions
//! — messages I sent to the peer, and messages the peer sent to me —
//! because the store only supports conjunctive equality filters, not OR.
//! [`ConversationHandle::open`] establishes both and spawns one actor task
//! that owns the merged [`ConversationState`]. Routing both streams
//! through a single task is what enforces the mutual-exclusion
//! requirement structurally: batches from the two channels are never
//! interleaved within one processing step.
//!
//! The actor emits [`ConversationEvent`]s: render instructions when the
//! list changes, and non-fatal channel-failure notices when one stream
//! ends while the conversation is still open.

pub mod merge;
pub mod render;

pub use merge::{ConversationState, Message};
pub use render::RenderInstruction;

use tokio::sync::{mpsc, watch};

use pairchat_proto::change::{ChangeBatch, Filter};
use pairchat_proto::document::{Timestamp, UserId};
use pairchat_store::{MemoryStore, SubscribeError, SubscriptionId};

/// Which of the two conversation subscriptions an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSide {
    /// The local-user-to-peer stream.
    Outgoing,
    /// The peer-to-local-user stream.
    Incoming,
}

impl std::fmt::Display for ChannelSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outgoing => write!(f, "outgoing"),
            Self::Incoming => write!(f, "incoming"),
        }
    }
}

/// Events emitted by a conversation actor for the caller to consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEvent {
    /// The merged list changed; the view should apply this instruction.
    Render(RenderInstruction),
    /// One channel's change stream ended while the conversation was open.
    ///
    /// Non-fatal: the other channel keeps operating and accumulated
    /// messages are retained. The engine does not retry; re-establishing
    /// the conversation is the caller's job via a fresh
    /// [`ConversationHandle::open`].
    ChannelFailed {
        /// Which subscription failed.
        channel: ChannelSide,
        /// Human-readable failure description.
        reason: String,
    },
}

/// Handle to an open conversation.
///
/// Dropping the handle cancels the actor; [`close`](Self::close) does the
/// same but also waits for the actor to finish and releases the store
/// subscriptions deterministically.
pub struct ConversationHandle {
    store: MemoryStore,
    outgoing_id: SubscriptionId,
    incoming_id: SubscriptionId,
    close_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
    local_id: UserId,
    peer_id: UserId,
}

impl ConversationHandle {
    /// Opens a conversation between `local` and `peer`.
    ///
    /// Establishes both directional subscriptions and spawns the merge
    /// actor. Returns the handle plus the event stream the caller drains.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SubscribeError`] if either subscription cannot be
    /// established; a subscription that was already set up is torn down
    /// again, and the conversation does not open.
    pub fn open(
        store: &MemoryStore,
        local: &UserId,
        peer: &UserId,
        event_buffer: usize,
    ) -> Result<(Self, mpsc::Receiver<ConversationEvent>), SubscribeError> {
        let outgoing = store.subscribe(Filter::direction(local, peer))?;
        let incoming = match store.subscribe(Filter::direction(peer, local)) {
            Ok(sub) => sub,
            Err(err) => {
                store.unsubscribe(outgoing.id);
                return Err(err);
            }
        };

        let (event_tx, event_rx) = mpsc::channel(event_buffer.max(1));
        let (close_tx, close_rx) = watch::channel(false);

        let actor = Actor {
            state: ConversationState::new(),
            event_tx,
            outgoing_rx: outgoing.rx,
            incoming_rx: incoming.rx,
            close_rx,
        };
        let task = tokio::spawn(actor.run());

        tracing::info!(local = %local, peer = %peer, "conversation opened");
        Ok((
            Self {
                store: store.clone(),
                outgoing_id: outgoing.id,
                incoming_id: incoming.id,
                close_tx,
                task,
                local_id: local.clone(),
                peer_id: peer.clone(),
            },
            event_rx,
        ))
    }

    /// The local participant's identity.
    #[must_use]
    pub const fn local_id(&self) -> &UserId {
        &self.local_id
    }

    /// The peer's identity.
    #[must_use]
    pub const fn peer_id(&self) -> &UserId {
        &self.peer_id
    }

    /// Closes the conversation.
    ///
    /// Signals the actor first — its close branch is polled before either
    /// channel, so batches still queued when the signal lands are
    /// discarded, never partially applied — then waits for it to finish
    /// and cancels both store subscriptions. After this returns, no
    /// further events are emitted.
    pub async fn close(self) {
        let _ = self.close_tx.send(true);
        let _ = self.task.await;
        self.store.unsubscribe(self.outgoing_id);
        self.store.unsubscribe(self.incoming_id);
        tracing::info!(local = %self.local_id, peer = %self.peer_id, "conversation closed");
    }
}

/// The per-conversation actor: sole owner of the merge state.
struct Actor {
    state: ConversationState,
    event_tx: mpsc::Sender<ConversationEvent>,
    outgoing_rx: mpsc::Receiver<ChangeBatch>,
    incoming_rx: mpsc::Receiver<ChangeBatch>,
    close_rx: watch::Receiver<bool>,
}

impl Actor {
    async fn run(mut self) {
        let mut outgoing_open = true;
        let mut incoming_open = true;
        loop {
            tokio::select! {
                biased;
                // Resolves on an explicit close() or when the handle is
                // dropped (watch sender gone). Either way, stop before
                // touching whatever is still queued on the channels.
                _ = self.close_rx.changed() => break,
                batch = self.outgoing_rx.recv(), if outgoing_open => {
                    match batch {
                        Some(batch) => {
                            if !self.process(ChannelSide::Outgoing, &batch).await {
                                break;
                            }
                        }
                        None => {
                            outgoing_open = false;
                            if !self.report_failure(ChannelSide::Outgoing).await {
                                break;
                            }
                        }
                    }
                }
                batch = self.incoming_rx.recv(), if incoming_open => {
                    match batch {
                        Some(batch) => {
                            if !self.process(ChannelSide::Incoming, &batch).await {
                                break;
                            }
                        }
                        None => {
                            incoming_open = false;
                            if !self.report_failure(ChannelSide::Incoming).await {
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Applies one batch and emits the resulting render instruction, if
    /// any. Returns `false` when the actor should stop.
    async fn process(&mut self, channel: ChannelSide, batch: &ChangeBatch) -> bool {
        let received_at = Timestamp::now();
        let was_untouched = self.state.is_untouched();
        let added = merge::apply_batch(&mut self.state, batch, received_at);
        tracing::debug!(
            %channel,
            batch_len = batch.len(),
            added,
            total = self.state.len(),
            "change batch processed"
        );
        match merge::plan_render(was_untouched, added, &self.state) {
            Some(instruction) => self.emit(ConversationEvent::Render(instruction)).await,
            None => true,
        }
    }

    async fn report_failure(&mut self, channel: ChannelSide) -> bool {
        tracing::warn!(%channel, "conversation channel stream ended");
        self.emit(ConversationEvent::ChannelFailed {
            channel,
            reason: "change stream ended".to_string(),
        })
        .await
    }

    /// Sends an event to the caller, racing the close signal so a close
    /// issued while the event buffer is full discards the event instead of
    /// deadlocking. Returns `false` when the actor should stop.
    async fn emit(&mut self, event: ConversationEvent) -> bool {
        tokio::select! {
            biased;
            _ = self.close_rx.changed() => false,
            sent = self.event_tx.send(event) => sent.is_ok(),
        }
    }
}
