//! Exchange driver: routes one channel's inbox through the handshake.
//!
//! The exchange (channel, response slot and request) sits behind a mutex
//! shared by the driver task and the façade, so `abort()` can close the
//! channel without waiting for the driver. The driver re-checks the channel
//! after every wakeup and stops as soon as it finds it closed.

use super::response::ResponseSlot;
use crate::channel::{Channel, ChannelState, HostEvent, InboundMessage, Inbox};
use crate::config::TransportOptions;
use crate::error::WaitPhase;
use crate::protocol::{advance, classify, Envelope, Request, Step};
use crate::{Result, TransportError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Why the driver woke up.
#[derive(Debug)]
pub(crate) enum Wakeup {
    Event(HostEvent),
    /// The host ended the subscription.
    Disconnected,
    /// The current wait exceeded its configured limit.
    TimedOut(Duration),
}

/// Result of handling one wakeup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    Waiting,
    /// The payload was just delivered.
    Delivered,
    /// The future is settled and the channel closed.
    Finished,
}

/// State of one request/response exchange.
#[derive(Debug)]
pub(crate) struct Exchange {
    pub(crate) channel: Channel,
    slot: ResponseSlot,
    request: Request,
}

pub(crate) type SharedExchange = Arc<Mutex<Exchange>>;

pub(crate) fn lock(exchange: &SharedExchange) -> MutexGuard<'_, Exchange> {
    exchange.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Exchange {
    pub(crate) fn new(channel: Channel, slot: ResponseSlot, request: Request) -> Self {
        Self {
            channel,
            slot,
            request,
        }
    }

    pub(crate) fn on_wakeup(&mut self, wakeup: Wakeup) -> Progress {
        if self.channel.is_closed() {
            return Progress::Finished;
        }

        match wakeup {
            Wakeup::Event(HostEvent::Loaded) => {
                self.channel.mark_loaded();
                Progress::Waiting
            }
            Wakeup::Event(HostEvent::Message(message)) => self.on_message(message),
            Wakeup::Disconnected => self.finish(Err(TransportError::Host {
                message: "message host ended the subscription".to_string(),
            })),
            Wakeup::TimedOut(after) => {
                let phase = if self.channel.state().is_before_readiness() {
                    WaitPhase::Readiness
                } else {
                    WaitPhase::Response
                };
                warn!("Channel {} timed out {} after {:?}", self.channel.id(), phase, after);
                self.finish(Err(TransportError::Timeout { phase, after }))
            }
        }
    }

    fn on_message(&mut self, message: InboundMessage) -> Progress {
        if message.origin != self.channel.origin() {
            warn!(
                "Channel {} dropped message from unexpected origin {} (expected {})",
                self.channel.id(),
                message.origin,
                self.channel.origin()
            );
            return Progress::Waiting;
        }

        match advance(self.channel.state(), classify(&message.data)) {
            Step::Deliver => match self.deliver() {
                Ok(()) => Progress::Delivered,
                Err(e) => self.finish(Err(e)),
            },
            Step::Settle(outcome) => self.finish(outcome),
            Step::Ignore(reason) => {
                debug!("Channel {} ignored message: {}", self.channel.id(), reason);
                Progress::Waiting
            }
        }
    }

    fn deliver(&mut self) -> Result<()> {
        self.channel.mark_ready()?;
        self.channel.post(self.request.payload())
    }

    /// Settle first, then tear down, so observers never see a closed channel
    /// with an unsettled future.
    fn finish(&mut self, outcome: Result<Envelope>) -> Progress {
        if let Err(e) = &outcome {
            debug!("Channel {} failing request: {}", self.channel.id(), e);
        }
        self.slot.settle(outcome);
        self.channel.close();
        Progress::Finished
    }
}

/// Drive `exchange` until it finishes or its channel is closed elsewhere.
pub(crate) async fn drive(exchange: SharedExchange, mut inbox: Inbox, options: TransportOptions) {
    let id = lock(&exchange).channel.id();
    let mut deadline = arm(options.handshake_timeout);

    loop {
        let wakeup = next_wakeup(&mut inbox, deadline).await;

        let progress = lock(&exchange).on_wakeup(wakeup);
        match progress {
            Progress::Waiting => {}
            Progress::Delivered => deadline = arm(options.response_timeout),
            Progress::Finished => break,
        }
    }

    // Dropping the inbox here detaches the listener for good.
    drop(inbox);
    info!("Exchange on channel {} finished", id);
}

fn arm(limit: Option<Duration>) -> Option<(Instant, Duration)> {
    limit.map(|after| (Instant::now() + after, after))
}

async fn next_wakeup(inbox: &mut Inbox, deadline: Option<(Instant, Duration)>) -> Wakeup {
    let event = match deadline {
        Some((at, after)) => match tokio::time::timeout_at(at, inbox.recv()).await {
            Ok(event) => event,
            Err(_) => return Wakeup::TimedOut(after),
        },
        None => inbox.recv().await,
    };

    match event {
        Some(event) => Wakeup::Event(event),
        None => Wakeup::Disconnected,
    }
}

/// State of the channel behind a shared exchange.
pub(crate) fn channel_state(exchange: &SharedExchange) -> ChannelState {
    lock(exchange).channel.state()
}
