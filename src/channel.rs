// Command channel over Zenoh
//
// Each teleop client declares a liveliness token `<prefix>/client/<id>` for as
// long as it is connected, publishes commands on `<prefix>/cmd/<id>` and
// listens for replies on `<prefix>/reply/<id>`.
//
// Both subscribers push into one queue from their callbacks, so the loop sees
// connects, messages and disconnects in arrival order.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};
use zenoh::Session;
use zenoh::pubsub::Subscriber;
use zenoh::sample::{Sample, SampleKind};

use crate::config::{KEY_CLIENT, KEY_CMD, KEY_REPLY, client_key};

/// Connection lifecycle and inbound traffic, in the order they are handled
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected(String),
    Disconnected(String),
    Message { client: String, payload: Vec<u8> },
}

/// Outbound text for one client
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub client: String,
    pub text: String,
}

pub struct CommandChannel {
    session: Session,
    prefix: String,
    events: UnboundedReceiver<ChannelEvent>,
    // Kept alive for the lifetime of the channel
    _commands: Subscriber<()>,
    _presence: Subscriber<()>,
}

impl CommandChannel {
    pub async fn open(prefix: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        info!("Opening Zenoh session...");
        let session = zenoh::open(zenoh::Config::default()).await?;
        let (tx, events) = mpsc::unbounded_channel();

        let cmd_keys = client_key(prefix, KEY_CMD, "*");
        let client_keys = client_key(prefix, KEY_CLIENT, "*");

        let cmd_tx = tx.clone();
        let commands = session
            .declare_subscriber(cmd_keys.clone())
            .callback(move |sample: Sample| {
                let payload = sample.payload().to_bytes().into_owned();
                push(&cmd_tx, command_event(sample.key_expr().as_str(), payload));
            })
            .await?;
        let presence = session
            .liveliness()
            .declare_subscriber(client_keys.clone())
            .callback(move |sample: Sample| {
                push(&tx, presence_event(sample.key_expr().as_str(), sample.kind()));
            })
            .await?;

        info!("Subscribed to: {}", cmd_keys);
        info!("Watching clients on: {}", client_keys);

        Ok(Self {
            session,
            prefix: prefix.to_string(),
            events,
            _commands: commands,
            _presence: presence,
        })
    }

    /// Drain everything pending without blocking, oldest first
    pub fn drain(&mut self) -> Vec<ChannelEvent> {
        drain_queue(&mut self.events)
    }

    pub async fn send(&self, reply: &Reply) {
        let key = client_key(&self.prefix, KEY_REPLY, &reply.client);
        if let Err(e) = self.session.put(key, reply.text.clone()).await {
            warn!("Failed to send reply to {}: {}", reply.client, e);
        }
    }
}

fn push(tx: &UnboundedSender<ChannelEvent>, event: Option<ChannelEvent>) {
    if let Some(event) = event {
        // Only fails once the receiver is gone, i.e. during shutdown
        let _ = tx.send(event);
    }
}

fn drain_queue(rx: &mut UnboundedReceiver<ChannelEvent>) -> Vec<ChannelEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn command_event(key: &str, payload: Vec<u8>) -> Option<ChannelEvent> {
    let client = client_id(key)?;
    Some(ChannelEvent::Message { client, payload })
}

fn presence_event(key: &str, kind: SampleKind) -> Option<ChannelEvent> {
    let client = client_id(key)?;
    Some(match kind {
        SampleKind::Put => ChannelEvent::Connected(client),
        SampleKind::Delete => ChannelEvent::Disconnected(client),
    })
}

// Last chunk of the key expression names the client
fn client_id(key: &str) -> Option<String> {
    match key.rsplit('/').next() {
        Some(id) if !id.is_empty() => Some(id.to_string()),
        _ => None,
    }
}
