//! Nuggets messaging protocol implementation.
//!
//! Messages are single ASCII datagrams whose first token names the
//! verb. The server never parses server messages and the client never
//! parses client messages; each side gets its half in [`client`] and
//! [`server`].

use std::fmt::Display;

use nuggets::Alias;

mod client;
mod server;

pub use client::*;
pub use server::*;

/// Largest UDP payload either side sends or accepts.
pub const MAX_MESSAGE: usize = 65507;

/// Message a client transfers to a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `PLAY <name>` — request a seat under the given real name.
    Play(String),
    /// `SPECTATE` — request the spectator slot.
    Spectate,
    /// `KEY <c>` — a single keypress.
    Key(char),
}

impl Display for ClientMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientMessage::Play(name) => write!(f, "PLAY {name}"),
            ClientMessage::Spectate => write!(f, "SPECTATE"),
            ClientMessage::Key(key) => write!(f, "KEY {key}"),
        }
    }
}

/// Message a server transfers to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// `OK <L>` — seat granted under alias `L`.
    Ok(Alias),
    /// `GRID <rows> <cols>` — the display must fit `rows+1 × cols+1`.
    Grid { rows: usize, cols: usize },
    /// `GOLD <justCollected> <purse> <remaining>`.
    Gold {
        just_collected: u32,
        purse: u32,
        left: u32,
    },
    /// `DISPLAY\n<rendered grid>`.
    Display(String),
    /// `QUIT <reason or scoreboard>` — terminates the recipient.
    Quit(String),
    /// `ERROR <text>` — non-fatal advisory.
    Error(String),
}

impl Display for ServerMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerMessage::Ok(alias) => write!(f, "OK {alias}"),
            ServerMessage::Grid { rows, cols } => write!(f, "GRID {rows} {cols}"),
            ServerMessage::Gold {
                just_collected,
                purse,
                left,
            } => write!(f, "GOLD {just_collected} {purse} {left}"),
            ServerMessage::Display(grid) => write!(f, "DISPLAY\n{grid}"),
            ServerMessage::Quit(reason) => write!(f, "QUIT {reason}"),
            ServerMessage::Error(text) => write!(f, "ERROR {text}"),
        }
    }
}

/// Why an inbound datagram was rejected.
#[derive(Debug)]
pub enum ParseError {
    /// The first token is not a known verb.
    UnknownVerb(String),
    /// A verb arrived without its payload.
    Truncated(&'static str),
    /// A numeric field does not parse.
    BadNumber(std::num::ParseIntError),
    /// The letter in `OK` is not an alias.
    BadAlias(String),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnknownVerb(verb) => write!(f, "unknown message verb: {verb:?}"),
            ParseError::Truncated(verb) => write!(f, "{verb} message without payload"),
            ParseError::BadNumber(err) => write!(f, "bad numeric field: {err}"),
            ParseError::BadAlias(text) => write!(f, "bad alias letter: {text:?}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<std::num::ParseIntError> for ParseError {
    #[inline]
    fn from(value: std::num::ParseIntError) -> Self {
        ParseError::BadNumber(value)
    }
}

#[cfg(test)]
mod tests {
    use nuggets::Alias;

    use crate::*;

    #[test]
    fn client_messages_render() {
        assert_eq!(ClientMessage::Play("Alice".into()).to_string(), "PLAY Alice");
        assert_eq!(ClientMessage::Spectate.to_string(), "SPECTATE");
        assert_eq!(ClientMessage::Key('h').to_string(), "KEY h");
    }

    #[test]
    fn client_messages_parse() {
        assert_eq!(
            ClientMessage::parse("PLAY Alice").unwrap(),
            ClientMessage::Play("Alice".into())
        );
        assert_eq!(
            ClientMessage::parse("SPECTATE").unwrap(),
            ClientMessage::Spectate
        );
        assert_eq!(
            ClientMessage::parse("KEY L").unwrap(),
            ClientMessage::Key('L')
        );
        assert!(matches!(
            ClientMessage::parse("KEY "),
            Err(ParseError::Truncated("KEY"))
        ));
        assert!(matches!(
            ClientMessage::parse("HELLO there"),
            Err(ParseError::UnknownVerb(_))
        ));
        // A bare PLAY without the separating space is not a join.
        assert!(ClientMessage::parse("PLAY").is_err());
    }

    #[test]
    fn play_keeps_name_verbatim() {
        // Sanitizing is the server's business, not the parser's.
        assert_eq!(
            ClientMessage::parse("PLAY   spaced  out  ").unwrap(),
            ClientMessage::Play("  spaced  out  ".into())
        );
    }

    #[test]
    fn server_messages_render() {
        assert_eq!(
            ServerMessage::Ok(Alias::from_seat(0)).to_string(),
            "OK A"
        );
        assert_eq!(
            ServerMessage::Grid { rows: 21, cols: 79 }.to_string(),
            "GRID 21 79"
        );
        assert_eq!(
            ServerMessage::Gold {
                just_collected: 5,
                purse: 12,
                left: 233
            }
            .to_string(),
            "GOLD 5 12 233"
        );
        assert_eq!(
            ServerMessage::Display("...\n###\n".into()).to_string(),
            "DISPLAY\n...\n###\n"
        );
        assert_eq!(
            ServerMessage::Quit("Thanks for playing!".into()).to_string(),
            "QUIT Thanks for playing!"
        );
        assert_eq!(
            ServerMessage::Error("Unknown Keystroke: x".into()).to_string(),
            "ERROR Unknown Keystroke: x"
        );
    }

    #[test]
    fn server_messages_parse() {
        assert_eq!(
            ServerMessage::parse("OK B").unwrap(),
            ServerMessage::Ok(Alias::from_seat(1))
        );
        assert_eq!(
            ServerMessage::parse("GRID 21 79").unwrap(),
            ServerMessage::Grid { rows: 21, cols: 79 }
        );
        assert_eq!(
            ServerMessage::parse("GOLD 0 0 250").unwrap(),
            ServerMessage::Gold {
                just_collected: 0,
                purse: 0,
                left: 250
            }
        );
        assert_eq!(
            ServerMessage::parse("DISPLAY\n@..\n").unwrap(),
            ServerMessage::Display("@..\n".into())
        );
        assert_eq!(
            ServerMessage::parse("QUIT GAME OVER:\nA    10   Alice\n").unwrap(),
            ServerMessage::Quit("GAME OVER:\nA    10   Alice\n".into())
        );
        assert!(matches!(
            ServerMessage::parse("GOLD 0 x 250"),
            Err(ParseError::BadNumber(_))
        ));
        assert!(matches!(
            ServerMessage::parse("GRID 21"),
            Err(ParseError::Truncated("GRID"))
        ));
        assert!(matches!(
            ServerMessage::parse("OK 7"),
            Err(ParseError::BadAlias(_))
        ));
        assert!(matches!(
            ServerMessage::parse("WAT"),
            Err(ParseError::UnknownVerb(_))
        ));
    }

    #[test]
    fn refusals_spell_the_reasons_out() {
        assert_eq!(
            game_full().to_string(),
            "QUIT Game is full: no more players can join."
        );
        assert_eq!(
            empty_name().to_string(),
            "QUIT Sorry: you must provide player's name."
        );
        assert_eq!(
            spectator_replaced().to_string(),
            "QUIT You have been replaced by a new spectator."
        );
        assert_eq!(unknown_key('x').to_string(), "ERROR Unknown Keystroke: x");
    }
}
