use std::fmt::Display;
use std::net::SocketAddr;

use crate::grid::{Grid, Pos, Tile};
use crate::MAX_NAME_LEN;

/// Single-letter public identifier of a seated player, assigned
/// `'A','B',…` by seat index in join order.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Alias(u8);

impl Alias {
    pub fn from_seat(seat: usize) -> Self {
        debug_assert!(seat < crate::MAX_PLAYERS);
        Self(seat as u8)
    }

    #[inline]
    pub fn letter(self) -> char {
        (b'A' + self.0) as char
    }

    /// Parses the letter sent in an `OK` message.
    pub fn from_letter(letter: char) -> Option<Self> {
        if letter.is_ascii_uppercase() {
            Some(Self(letter as u8 - b'A'))
        } else {
            None
        }
    }
}

impl Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Whether a seat is still playing. Quit players stay in the table so
/// their alias is never reused and their purse survives to the final
/// scoreboard.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Seat {
    Active,
    Quit,
}

/// Server-side record of one seated player.
#[derive(Debug)]
pub struct Player {
    /// Transport address the player talks from.
    pub addr: SocketAddr,
    /// Sanitized real name, as given in `PLAY`.
    pub name: String,
    pub alias: Alias,
    /// Nuggets collected so far.
    pub purse: u32,
    /// Nuggets received since the last broadcast.
    pub just_collected: u32,
    pub pos: Pos,
    /// Everything this player has ever observed.
    pub seen: Grid,
    pub seat: Seat,
}

impl Player {
    pub fn new(addr: SocketAddr, name: String, alias: Alias, pos: Pos, nrow: usize, ncol: usize) -> Self {
        Self {
            addr,
            name,
            alias,
            purse: 0,
            just_collected: 0,
            pos,
            seen: Grid::new(nrow, ncol),
            seat: Seat::Active,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.seat == Seat::Active
    }

    /// The letter this player draws on the master grid.
    #[inline]
    pub fn tile(&self) -> Tile {
        self.alias.into()
    }
}

/// Whether a `PLAY` payload carries no usable name.
pub fn name_is_blank(raw: &str) -> bool {
    raw.chars().all(char::is_whitespace)
}

/// Normalizes a real name: at most [`MAX_NAME_LEN`] bytes, with every
/// byte that is neither graphic nor a blank replaced by `'_'`.
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .take(MAX_NAME_LEN)
        .map(|c| {
            if c.is_ascii_graphic() || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_letters_follow_seat_order() {
        assert_eq!(Alias::from_seat(0).letter(), 'A');
        assert_eq!(Alias::from_seat(1).letter(), 'B');
        assert_eq!(Alias::from_seat(25).letter(), 'Z');
        assert_eq!(Alias::from_seat(2).to_string(), "C");
    }

    #[test]
    fn alias_round_trips_through_letters() {
        assert_eq!(Alias::from_letter('A'), Some(Alias::from_seat(0)));
        assert_eq!(Alias::from_letter('Z'), Some(Alias::from_seat(25)));
        assert_eq!(Alias::from_letter('a'), None);
        assert_eq!(Alias::from_letter('@'), None);
    }

    #[test]
    fn blank_names_are_detected() {
        assert!(name_is_blank(""));
        assert!(name_is_blank("   \t "));
        assert!(!name_is_blank(" x "));
    }

    #[test]
    fn names_are_sanitized() {
        assert_eq!(sanitize_name("Alice"), "Alice");
        assert_eq!(sanitize_name("Alice the Bold"), "Alice the Bold");
        assert_eq!(sanitize_name("tab\there"), "tab_here");
        assert_eq!(sanitize_name("bell\x07"), "bell_");
        let long = "x".repeat(80);
        assert_eq!(sanitize_name(&long).len(), MAX_NAME_LEN);
    }
}
