use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::constants::{REPLY_SEND_DELAY_MS, REPLY_TYPING_DELAY_MS};
use crate::error::CoreError;
use crate::models::{ConversationId, IncomingMessage, UserId};
use crate::social::SocialCore;

use super::latency::{self, SimulatedLatency};
use super::random::RandomSource;

pub const CANNED_REPLIES: [&str; 8] = [
    "That's interesting!",
    "I agree with you!",
    "Let me think about that...",
    "Sounds like a plan! 👍",
    "Thanks for sharing!",
    "I'll get back to you on that",
    "Looking forward to it!",
    "Can't wait! 😊",
];

/// Plays the other side of a conversation: after the owner sends a
/// message, "types" for a while and then answers with a canned reply.
pub struct AutoResponder {
    core: Rc<RefCell<SocialCore>>,
    typing: SimulatedLatency,
    send: SimulatedLatency,
    rng: RefCell<Box<dyn RandomSource>>,
}

impl AutoResponder {
    pub fn new(core: Rc<RefCell<SocialCore>>, rng: Box<dyn RandomSource>) -> Self {
        Self {
            core,
            typing: SimulatedLatency::fixed(Duration::from_millis(REPLY_TYPING_DELAY_MS)),
            send: SimulatedLatency::fixed(Duration::from_millis(REPLY_SEND_DELAY_MS)),
            rng: RefCell::new(rng),
        }
    }

    pub fn with_delays(mut self, typing: SimulatedLatency, send: SimulatedLatency) -> Self {
        self.typing = typing;
        self.send = send;
        self
    }

    /// Wait out the typing and send delays, then deliver a reply. Returns
    /// the conversation's unread count after delivery, or `None` when there
    /// is nobody to answer.
    pub async fn respond(&self, id: ConversationId) -> Result<Option<u32>, CoreError> {
        let typing = self.sample(self.typing);
        latency::simulate(typing).await;
        let send = self.sample(self.send);
        latency::simulate(send).await;

        let Some((sender, text)) = self.compose(id)? else {
            return Ok(None);
        };
        let unread = self
            .core
            .borrow_mut()
            .deliver_incoming(id, IncomingMessage::new(sender, text))?;
        Ok(Some(unread))
    }

    /// Respond in the background. Failures such as the conversation being
    /// deleted in the meantime are logged and dropped.
    pub fn spawn_reply(self: &Rc<Self>, id: ConversationId) -> JoinHandle<()> {
        let responder = Rc::clone(self);
        tokio::task::spawn_local(async move {
            if let Err(e) = responder.respond(id).await {
                tracing::debug!("Auto-reply for conversation {} dropped: {}", id, e);
            }
        })
    }

    fn compose(&self, id: ConversationId) -> Result<Option<(UserId, &'static str)>, CoreError> {
        let core = self.core.borrow();
        let owner = core.owner_id();
        let conversation = core
            .conversations()
            .get(id)
            .ok_or_else(|| CoreError::conversation_not_found(id))?;

        let mut rng = self.rng.borrow_mut();
        let sender = match conversation.counterpart(owner) {
            Some(other) => Some(other),
            None => {
                let others: Vec<UserId> = conversation
                    .participant_ids
                    .iter()
                    .copied()
                    .filter(|p| *p != owner)
                    .collect();
                others.get(rng.pick(others.len())).copied()
            }
        };
        Ok(sender.map(|sender| (sender, CANNED_REPLIES[rng.pick(CANNED_REPLIES.len())])))
    }

    fn sample(&self, latency: SimulatedLatency) -> Duration {
        let mut rng = self.rng.borrow_mut();
        latency.sample(&mut **rng)
    }
}
