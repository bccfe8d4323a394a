//! Handshake rules: what a classified message means in each channel state.
//!
//! ```text
//! Created --(surface loaded)--> AwaitingReadiness
//! AwaitingReadiness --(readiness sentinel)--> Sending
//! Sending --(payload delivered)--> AwaitingResponse
//! AwaitingResponse --(terminal message)--> Closed
//! ```
//!
//! The payload is only ever delivered in response to a readiness sentinel
//! observed before readiness. Terminal messages settle the exchange in any
//! open state, including before readiness, in which case nothing is sent.

use super::envelope::Envelope;
use super::router::Inbound;
use crate::channel::ChannelState;
use crate::{Result, TransportError};

/// What the exchange driver must do next.
#[derive(Debug)]
pub enum Step {
    /// Mark the channel ready and post the payload.
    Deliver,
    /// Settle the response future with this outcome, then close the channel.
    Settle(Result<Envelope>),
    /// Drop the message.
    Ignore(&'static str),
}

/// Decide the next step for `inbound` arriving in `state`.
pub fn advance(state: ChannelState, inbound: Inbound) -> Step {
    match (state, inbound) {
        (ChannelState::Closed, _) => Step::Ignore("channel already closed"),
        (state, Inbound::Ready) if state.is_before_readiness() => Step::Deliver,
        (_, Inbound::Ready) => Step::Ignore("duplicate readiness signal"),
        (_, Inbound::Success(envelope)) => Step::Settle(Ok(envelope)),
        (_, Inbound::Failure(envelope)) => Step::Settle(Err(TransportError::Remote(envelope))),
        (_, Inbound::Malformed { raw, message }) => {
            Step::Settle(Err(TransportError::MalformedResponse { raw, message }))
        }
    }
}
