//! Message intake, work queue and per-message processing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{Instrument, debug, debug_span, error, info, trace, warn};

use super::TransformRegistry;
use crate::application::transforms::Transform;
use crate::domain::entities::{Message, MessageId, UserId};
use crate::domain::errors::TransformError;
use crate::domain::ports::{ChatPort, ReplyRequest};

/// Default wait before hiding the original message's link preview.
pub const DEFAULT_EMBED_SUPPRESS_DELAY: Duration = Duration::from_secs(2);

// A single slot: intake waits until the worker loop has taken the previous message.
const WORK_QUEUE_CAPACITY: usize = 1;

/// Dispatcher tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Wait before hiding the original message's link preview.
    pub embed_suppress_delay: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            embed_suppress_delay: DEFAULT_EMBED_SUPPRESS_DELAY,
        }
    }
}

/// A message with the transforms that matched it at intake.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    message: Message,
    transforms: Vec<Arc<Transform>>,
}

impl InboundMessage {
    /// Returns `None` when no transform matched.
    #[must_use]
    pub fn new(message: Message, transforms: Vec<Arc<Transform>>) -> Option<Self> {
        if transforms.is_empty() {
            return None;
        }
        Some(Self {
            message,
            transforms,
        })
    }

    /// The message to rewrite.
    #[must_use]
    pub const fn message(&self) -> &Message {
        &self.message
    }

    /// Transforms that matched, in registration order.
    #[must_use]
    pub fn transforms(&self) -> &[Arc<Transform>] {
        &self.transforms
    }
}

/// Result of processing one queued message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No transform changed the content; nothing was sent.
    Unchanged,
    /// A reply was attempted.
    Replied {
        /// ID of the posted reply, `None` if sending failed.
        reply_id: Option<MessageId>,
        /// Whether the original's link preview was hidden by this run.
        embeds_suppressed: bool,
    },
}

/// Wires a registry and chat port into an intake handle and a worker loop.
pub struct LinkDispatcher {
    registry: Arc<TransformRegistry>,
    processor: Arc<MessageProcessor>,
}

impl LinkDispatcher {
    /// Creates a dispatcher; nothing runs until [`LinkDispatcher::start`].
    #[must_use]
    pub fn new(
        registry: Arc<TransformRegistry>,
        chat: Arc<dyn ChatPort>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            registry,
            processor: Arc::new(MessageProcessor::new(chat, config)),
        }
    }

    /// Opens the work queue. Messages authored by `self_id` are ignored.
    #[must_use]
    pub fn start(self, self_id: UserId) -> (MessageIntake, DispatchWorker) {
        let (queue_tx, queue_rx) = mpsc::channel(WORK_QUEUE_CAPACITY);

        let intake = MessageIntake {
            registry: self.registry,
            self_id,
            queue: queue_tx,
        };
        let worker = DispatchWorker {
            queue: queue_rx,
            processor: self.processor,
        };

        (intake, worker)
    }
}

/// Producer side of the work queue. Dropping it closes the queue.
pub struct MessageIntake {
    registry: Arc<TransformRegistry>,
    self_id: UserId,
    queue: mpsc::Sender<InboundMessage>,
}

impl MessageIntake {
    /// Matches `message` and queues it, waiting while the queue is full.
    ///
    /// Returns whether the message was queued.
    pub async fn submit(&self, message: Message) -> bool {
        if message.author().id == self.self_id {
            trace!(message_id = %message.id(), "Ignoring own message");
            return false;
        }

        let transforms = self.registry.find_matching(message.content());
        let Some(inbound) = InboundMessage::new(message, transforms) else {
            return false;
        };

        debug!(
            message_id = %inbound.message().id(),
            channel_id = %inbound.message().channel_id(),
            transforms = inbound.transforms().len(),
            "Queueing message"
        );

        if self.queue.send(inbound).await.is_err() {
            warn!("Work queue closed, dropping message");
            return false;
        }
        true
    }

    /// Closes the work queue.
    pub fn close(self) {
        debug!("Closing work queue");
        drop(self.queue);
    }
}

/// Consumer side of the work queue; one task per message.
pub struct DispatchWorker {
    queue: mpsc::Receiver<InboundMessage>,
    processor: Arc<MessageProcessor>,
}

impl DispatchWorker {
    /// Runs until the queue is closed, then waits for in-flight messages.
    pub async fn run(mut self) {
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                inbound = self.queue.recv() => {
                    let Some(inbound) = inbound else { break };
                    let processor = Arc::clone(&self.processor);
                    tasks.spawn(async move { processor.process(inbound).await });
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    log_task_result(joined);
                }
            }
        }

        if !tasks.is_empty() {
            info!(in_flight = tasks.len(), "Waiting for in-flight messages");
        }
        while let Some(joined) = tasks.join_next().await {
            log_task_result(joined);
        }
        debug!("Dispatch worker stopped");
    }
}

fn log_task_result(joined: Result<DispatchOutcome, tokio::task::JoinError>) {
    match joined {
        Ok(outcome) => trace!(?outcome, "Message task finished"),
        Err(e) => error!(error = %e, "Message task panicked"),
    }
}

/// Applies matched transforms and delivers the reply.
pub struct MessageProcessor {
    chat: Arc<dyn ChatPort>,
    config: DispatcherConfig,
}

impl MessageProcessor {
    /// Creates a processor that replies through `chat`.
    #[must_use]
    pub fn new(chat: Arc<dyn ChatPort>, config: DispatcherConfig) -> Self {
        Self { chat, config }
    }

    /// Processes one message end to end. Failures are logged, never returned.
    pub async fn process(&self, inbound: InboundMessage) -> DispatchOutcome {
        let message = inbound.message();
        let content = rewrite(message.content(), inbound.transforms())
            .instrument(debug_span!("rewrite", message_id = %message.id()))
            .await;

        if content == message.content() {
            debug!(message_id = %message.id(), "No transform changed the message");
            return DispatchOutcome::Unchanged;
        }

        let request = ReplyRequest::new(message.channel_id(), message.id(), content);
        let (embeds_suppressed, reply_id) =
            tokio::join!(self.suppress_embeds_later(message), self.reply(request));

        DispatchOutcome::Replied {
            reply_id,
            embeds_suppressed,
        }
    }

    async fn suppress_embeds_later(&self, message: &Message) -> bool {
        if message.embeds_suppressed() {
            return false;
        }

        sleep(self.config.embed_suppress_delay).await;

        match self
            .chat
            .suppress_embeds(message.channel_id(), message.id(), message.flags())
            .await
        {
            Ok(()) => {
                debug!(message_id = %message.id(), "Suppressed embeds");
                true
            }
            Err(e) => {
                warn!(message_id = %message.id(), error = %e, "Failed to suppress embeds");
                false
            }
        }
    }

    async fn reply(&self, request: ReplyRequest) -> Option<MessageId> {
        let reply_to = request.reply_to;

        match self.chat.send_reply(request).await {
            Ok(reply_id) => {
                info!(message_id = %reply_to, reply_id = %reply_id, "Sent rewritten links");
                Some(reply_id)
            }
            Err(e) => {
                warn!(message_id = %reply_to, error = %e, "Failed to send reply");
                None
            }
        }
    }
}

/// Threads `content` through each transform in order, skipping failures.
pub async fn rewrite(content: &str, transforms: &[Arc<Transform>]) -> String {
    let mut content = content.to_string();

    for transform in transforms {
        match transform.apply(&content).await {
            Ok(output) => {
                debug!(transform = transform.name(), "Applied transform");
                content = output;
            }
            Err(TransformError::NoMatch) => {
                debug!(transform = transform.name(), "Transform no longer matches");
            }
            Err(e) => {
                warn!(transform = transform.name(), error = %e, "Transform failed, skipping");
            }
        }
    }

    content
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use regex::Regex;

    use super::*;
    use crate::application::transforms::{Follow, Substitute};
    use crate::domain::entities::{ChannelId, MessageAuthor, MessageFlags};
    use crate::domain::errors::{DeliveryError, ResolveError};
    use crate::domain::ports::mocks::{MockChatPort, StaticResolver};

    const BOT_ID: UserId = UserId(1);
    const FAST: DispatcherConfig = DispatcherConfig {
        embed_suppress_delay: Duration::from_millis(5),
    };

    fn make_message(author: UserId, content: &str) -> Message {
        Message::new(
            MessageId(500),
            ChannelId(600),
            MessageAuthor::new(author, "someone", false),
            content,
            Utc::now(),
        )
    }

    fn twitter() -> Substitute {
        Substitute::new(
            "twitter",
            Regex::new(r"https?://(twitter|x)\.com/(\w+)/status(es)?/(\d+)").unwrap(),
            "https://vxtwitter.com/$2/status/$4",
        )
    }

    fn make_registry() -> Arc<TransformRegistry> {
        Arc::new(TransformRegistry::builder().register(twitter()).build())
    }

    fn inbound(content: &str, transforms: Vec<Transform>) -> InboundMessage {
        InboundMessage::new(
            make_message(UserId(2), content),
            transforms.into_iter().map(Arc::new).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_inbound_requires_a_transform() {
        assert!(InboundMessage::new(make_message(UserId(2), "x"), Vec::new()).is_none());
    }

    #[tokio::test]
    async fn test_rewrite_threads_output_and_skips_failures() {
        let resolver = Arc::new(
            StaticResolver::new().with_failure(
                "https://s.example/a",
                ResolveError::timeout("https://s.example/a"),
            ),
        );
        let failing = Follow::new("short", Regex::new(r"https://s\.example/\w+").unwrap(), resolver);
        let message = make_message(UserId(2), "https://s.example/a https://x.com/a/status/1");

        let transforms = vec![
            Arc::new(Transform::from(failing)),
            Arc::new(Transform::from(twitter())),
        ];
        let content = rewrite(message.content(), &transforms).await;

        assert_eq!(content, "https://vxtwitter.com/a/status/1");
    }

    #[tokio::test]
    async fn test_no_match_after_threading_keeps_previous_content() {
        let youtube = Substitute::new(
            "youtube-shorts",
            Regex::new(r"https://youtube\.com/shorts/(\w+)").unwrap(),
            "https://www.youtube.com/watch?v=$1",
        );
        let message = make_message(
            UserId(2),
            "https://x.com/a/status/1 https://youtube.com/shorts/abc",
        );

        let transforms = vec![
            Arc::new(Transform::from(twitter())),
            Arc::new(Transform::from(youtube)),
        ];

        assert_eq!(
            rewrite(message.content(), &transforms).await,
            "https://vxtwitter.com/a/status/1"
        );
    }

    #[tokio::test]
    async fn test_process_replies_and_suppresses() {
        let mut chat = MockChatPort::new();
        chat.expect_send_reply()
            .withf(|request| {
                request.channel_id == ChannelId(600)
                    && request.reply_to == MessageId(500)
                    && request.content == "https://vxtwitter.com/foo/status/123"
            })
            .times(1)
            .returning(|_| Ok(MessageId(900)));
        chat.expect_suppress_embeds()
            .withf(|channel_id, message_id, flags| {
                *channel_id == ChannelId(600) && *message_id == MessageId(500) && flags.is_empty()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let processor = MessageProcessor::new(Arc::new(chat), FAST);
        let outcome = processor
            .process(inbound(
                "https://twitter.com/foo/status/123",
                vec![twitter().into()],
            ))
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::Replied {
                reply_id: Some(MessageId(900)),
                embeds_suppressed: true
            }
        );
    }

    #[tokio::test]
    async fn test_process_skips_suppression_when_already_hidden() {
        let mut chat = MockChatPort::new();
        chat.expect_send_reply()
            .times(1)
            .returning(|_| Ok(MessageId(900)));
        chat.expect_suppress_embeds().never();

        let message = make_message(UserId(2), "https://twitter.com/foo/status/123")
            .with_flags(MessageFlags::SUPPRESS_EMBEDS);
        let inbound =
            InboundMessage::new(message, vec![Arc::new(twitter().into())]).unwrap();

        let outcome = MessageProcessor::new(Arc::new(chat), FAST)
            .process(inbound)
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::Replied {
                reply_id: Some(MessageId(900)),
                embeds_suppressed: false
            }
        );
    }

    #[tokio::test]
    async fn test_failed_resolution_sends_nothing() {
        let mut chat = MockChatPort::new();
        chat.expect_send_reply().never();
        chat.expect_suppress_embeds().never();

        let resolver = Arc::new(StaticResolver::new().with_failure(
            "https://vm.example/a",
            ResolveError::timeout("https://vm.example/a"),
        ));
        let follow = Follow::new("short", Regex::new(r"https://vm\.example/\w+").unwrap(), resolver);

        let outcome = MessageProcessor::new(Arc::new(chat), FAST)
            .process(inbound("https://vm.example/a", vec![follow.into()]))
            .await;

        assert_eq!(outcome, DispatchOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_delivery_failures_are_contained() {
        let mut chat = MockChatPort::new();
        chat.expect_send_reply()
            .times(1)
            .returning(|_| Err(DeliveryError::rejected("missing permissions")));
        chat.expect_suppress_embeds()
            .times(1)
            .returning(|_, _, _| Err(DeliveryError::network("reset")));

        let outcome = MessageProcessor::new(Arc::new(chat), FAST)
            .process(inbound(
                "https://twitter.com/foo/status/123",
                vec![twitter().into()],
            ))
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::Replied {
                reply_id: None,
                embeds_suppressed: false
            }
        );
    }

    #[tokio::test]
    async fn test_intake_filters_own_and_unmatched_messages() {
        let chat = MockChatPort::new();
        let dispatcher = LinkDispatcher::new(make_registry(), Arc::new(chat), FAST);
        let (intake, worker) = dispatcher.start(BOT_ID);

        assert!(
            !intake
                .submit(make_message(BOT_ID, "https://twitter.com/me/status/1"))
                .await
        );
        assert!(!intake.submit(make_message(UserId(2), "no links")).await);

        intake.close();
        worker.run().await;
    }

    #[tokio::test]
    async fn test_queued_messages_finish_before_shutdown() {
        let mut chat = MockChatPort::new();
        chat.expect_send_reply()
            .times(3)
            .returning(|_| Ok(MessageId(900)));
        chat.expect_suppress_embeds()
            .times(3)
            .returning(|_, _, _| Ok(()));

        let dispatcher = LinkDispatcher::new(make_registry(), Arc::new(chat), FAST);
        let (intake, worker) = dispatcher.start(BOT_ID);
        let worker = tokio::spawn(worker.run());

        for id in 1..=3 {
            let content = format!("https://x.com/user/status/{id}");
            assert!(intake.submit(make_message(UserId(2), &content)).await);
        }

        intake.close();
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_waits_while_queue_is_full() {
        let mut chat = MockChatPort::new();
        chat.expect_send_reply()
            .times(2)
            .returning(|_| Ok(MessageId(900)));
        chat.expect_suppress_embeds()
            .times(2)
            .returning(|_, _, _| Ok(()));

        let dispatcher = LinkDispatcher::new(make_registry(), Arc::new(chat), FAST);
        let (intake, worker) = dispatcher.start(BOT_ID);

        assert!(
            intake
                .submit(make_message(UserId(2), "https://x.com/user/status/1"))
                .await
        );

        let worker = {
            let second = intake.submit(make_message(UserId(2), "https://x.com/user/status/2"));
            tokio::pin!(second);
            assert!(
                tokio::time::timeout(Duration::from_millis(50), &mut second)
                    .await
                    .is_err()
            );

            let worker = tokio::spawn(worker.run());
            assert!(second.await);
            worker
        };

        intake.close();
        worker.await.unwrap();
    }
}
