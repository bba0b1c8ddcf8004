//! Decode-once codec for the transport layer.
//!
//! - Text frames => `InboundEvent`
//! - Binary frames are not part of the protocol and are ignored
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use sirenlink_core::{
    error::ValidationError,
    protocol::{decode_inbound, InboundEvent},
};

#[derive(Debug)]
pub enum Inbound {
    Event(InboundEvent),
    Ping(Vec<u8>),
    Pong,
    Close,
    Ignored,
}

pub fn decode(msg: Message) -> Result<Inbound, ValidationError> {
    match msg {
        Message::Text(s) => decode_inbound(&s).map(Inbound::Event),
        Message::Binary(_) => Ok(Inbound::Ignored),
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(_) => Ok(Inbound::Pong),
        Message::Close(_) => Ok(Inbound::Close),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frames_become_events() {
        let msg = Message::Text(r#"{"event":"updateLocation","data":{"lat":1,"lon":2}}"#.into());
        assert!(matches!(
            decode(msg),
            Ok(Inbound::Event(InboundEvent::UpdateLocation(_)))
        ));
    }

    #[test]
    fn binary_frames_are_ignored() {
        assert!(matches!(decode(Message::Binary(vec![1, 2, 3])), Ok(Inbound::Ignored)));
    }

    #[test]
    fn garbage_text_is_malformed() {
        assert!(matches!(
            decode(Message::Text("{".into())),
            Err(ValidationError::Malformed(_))
        ));
    }
}
