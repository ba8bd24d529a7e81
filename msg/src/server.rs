//! Server-side half: parsing client datagrams and composing the
//! canned refusals.

use crate::{ClientMessage, ParseError, ServerMessage};

impl ClientMessage {
    /// First-token dispatch over an inbound datagram.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        if let Some(name) = text.strip_prefix("PLAY ") {
            return Ok(ClientMessage::Play(name.to_owned()));
        }
        if text.starts_with("SPECTATE") {
            return Ok(ClientMessage::Spectate);
        }
        if let Some(rest) = text.strip_prefix("KEY ") {
            let key = rest.chars().next().ok_or(ParseError::Truncated("KEY"))?;
            return Ok(ClientMessage::Key(key));
        }

        let verb = text.split_whitespace().next().unwrap_or("").to_owned();
        Err(ParseError::UnknownVerb(verb))
    }
}

/// `QUIT` sent to the 27th `PLAY`.
pub fn game_full() -> ServerMessage {
    ServerMessage::Quit("Game is full: no more players can join.".into())
}

/// `QUIT` sent when `PLAY` carries a whitespace-only name.
pub fn empty_name() -> ServerMessage {
    ServerMessage::Quit("Sorry: you must provide player's name.".into())
}

/// `QUIT` sent to a spectator displaced by a newcomer.
pub fn spectator_replaced() -> ServerMessage {
    ServerMessage::Quit("You have been replaced by a new spectator.".into())
}

/// `QUIT` acknowledging a player's own `Q`.
pub fn thanks_for_playing() -> ServerMessage {
    ServerMessage::Quit("Thanks for playing!".into())
}

/// `QUIT` acknowledging the spectator's own `Q`.
pub fn thanks_for_watching() -> ServerMessage {
    ServerMessage::Quit("Thanks for watching!".into())
}

/// `ERROR` reply for a key outside the movement alphabet.
pub fn unknown_key(key: char) -> ServerMessage {
    ServerMessage::Error(format!("Unknown Keystroke: {key}"))
}
