//! Client-side half: parsing server datagrams.

use nuggets::Alias;

use crate::{ParseError, ServerMessage};

impl ServerMessage {
    /// First-token dispatch over an inbound datagram.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        if let Some(rest) = text.strip_prefix("OK ") {
            let letter = rest.chars().next().unwrap_or(' ');
            return Alias::from_letter(letter)
                .map(ServerMessage::Ok)
                .ok_or_else(|| ParseError::BadAlias(rest.to_owned()));
        }
        if let Some(rest) = text.strip_prefix("GRID ") {
            let mut fields = rest.split_whitespace();
            let rows = fields.next().ok_or(ParseError::Truncated("GRID"))?.parse()?;
            let cols = fields.next().ok_or(ParseError::Truncated("GRID"))?.parse()?;
            return Ok(ServerMessage::Grid { rows, cols });
        }
        if let Some(rest) = text.strip_prefix("GOLD ") {
            let mut fields = rest.split_whitespace();
            let just_collected = fields.next().ok_or(ParseError::Truncated("GOLD"))?.parse()?;
            let purse = fields.next().ok_or(ParseError::Truncated("GOLD"))?.parse()?;
            let left = fields.next().ok_or(ParseError::Truncated("GOLD"))?.parse()?;
            return Ok(ServerMessage::Gold {
                just_collected,
                purse,
                left,
            });
        }
        if let Some(grid) = text.strip_prefix("DISPLAY\n") {
            return Ok(ServerMessage::Display(grid.to_owned()));
        }
        if let Some(reason) = text.strip_prefix("QUIT ") {
            return Ok(ServerMessage::Quit(reason.to_owned()));
        }
        if let Some(advisory) = text.strip_prefix("ERROR ") {
            return Ok(ServerMessage::Error(advisory.to_owned()));
        }

        let verb = text.split_whitespace().next().unwrap_or("").to_owned();
        Err(ParseError::UnknownVerb(verb))
    }
}
