use std::fmt::Display;

use crate::Alias;

/// A location on the map, as `(row, col)` from the top-left corner.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Pos(
    /// Row, growing downwards.
    pub i32,
    /// Column, growing rightwards.
    pub i32,
);

impl Pos {
    #[inline]
    pub fn step(self, dir: Dir) -> Self {
        let Pos(r, c) = self;
        let (dr, dc) = dir.delta();
        Pos(r + dr, c + dc)
    }
}

impl From<(usize, usize)> for Pos {
    #[inline]
    fn from((r, c): (usize, usize)) -> Self {
        Self(r as i32, c as i32)
    }
}

/// One of the eight movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    West,
    East,
    North,
    South,
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Dir {
    /// `(drow, dcol)` of a single step.
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Dir::West => (0, -1),
            Dir::East => (0, 1),
            Dir::North => (-1, 0),
            Dir::South => (1, 0),
            Dir::NorthWest => (-1, -1),
            Dir::NorthEast => (-1, 1),
            Dir::SouthWest => (1, -1),
            Dir::SouthEast => (1, 1),
        }
    }

    /// Maps a lowercase movement key onto its direction.
    pub const fn from_key(key: char) -> Option<Self> {
        Some(match key {
            'h' => Dir::West,
            'l' => Dir::East,
            'k' => Dir::North,
            'j' => Dir::South,
            'y' => Dir::NorthWest,
            'u' => Dir::NorthEast,
            'b' => Dir::SouthWest,
            'n' => Dir::SouthEast,
            _ => return None,
        })
    }
}

/// One cell of the world, wrapping the byte that travels on the wire.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Tile(u8);

impl Tile {
    /// Solid rock; untraversable, opaque.
    pub const ROCK: Self = Self(b' ');
    /// Room floor.
    pub const FLOOR: Self = Self(b'.');
    /// Corridor between rooms; traversable but opaque.
    pub const PASSAGE: Self = Self(b'#');
    /// An undiscovered pile of gold.
    pub const GOLD: Self = Self(b'*');
    /// The viewing player's own marker, drawn only in `seen` grids.
    pub const VIEWER: Self = Self(b'@');

    #[inline]
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    #[inline]
    pub const fn ch(self) -> char {
        self.0 as char
    }

    #[inline]
    pub fn is_rock(self) -> bool {
        self == Self::ROCK
    }

    #[inline]
    pub fn is_floor(self) -> bool {
        self == Self::FLOOR
    }

    #[inline]
    pub fn is_passage(self) -> bool {
        self == Self::PASSAGE
    }

    #[inline]
    pub fn is_gold(self) -> bool {
        self == Self::GOLD
    }

    /// Wall segments around a room.
    #[inline]
    pub fn is_boundary(self) -> bool {
        matches!(self.0, b'|' | b'-' | b'+')
    }

    /// A seated player's alias letter, or the viewer marker.
    #[inline]
    pub fn is_player(self) -> bool {
        self.0.is_ascii_uppercase() || self == Self::VIEWER
    }

    /// Whether a player may stand here: anything but rock and walls.
    #[inline]
    pub fn is_traversable(self) -> bool {
        !self.is_boundary() && !self.is_rock()
    }

    /// Whether this tile stops a sight line. Floor, gold and players
    /// pass light; everything else is opaque.
    #[inline]
    pub fn blocks_sight(self) -> bool {
        !self.is_floor() && !self.is_gold() && !self.is_player()
    }
}

impl From<Alias> for Tile {
    #[inline]
    fn from(value: Alias) -> Self {
        Self(value.letter() as u8)
    }
}

impl Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ch())
    }
}

/// Rectangle of tiles addressed by [`Pos`].
///
/// Three grids coexist at runtime: the immutable `raw` map geometry,
/// the live `master` with players and gold overlaid, and one `seen`
/// grid per player accreting everything that player has observed.
#[derive(Debug, Clone)]
pub struct Grid {
    nrow: usize,
    ncol: usize,
    /// Row-major tiles.
    tiles: Vec<Tile>,
}

impl Grid {
    /// Creates a grid of the given size filled with rock.
    pub fn new(nrow: usize, ncol: usize) -> Self {
        Self {
            nrow,
            ncol,
            tiles: vec![Tile::ROCK; nrow * ncol],
        }
    }

    /// Parses a rectangular block of map text. Line count is the row
    /// count and the width of the first line is the column count;
    /// every line must have that same width. A trailing newline after
    /// the last line is optional.
    pub fn parse(text: &str) -> crate::Result<Self> {
        let mut lines = text.lines();
        let first = lines.next().ok_or(crate::Error::EmptyMap)?;
        let ncol = first.len();
        if ncol == 0 {
            return Err(crate::Error::EmptyMap);
        }

        let mut tiles: Vec<Tile> = first.bytes().map(Tile::from_byte).collect();
        let mut nrow = 1;
        for line in lines {
            if line.len() != ncol {
                return Err(crate::Error::RaggedMap {
                    line: nrow + 1,
                    width: line.len(),
                    expected: ncol,
                });
            }
            tiles.extend(line.bytes().map(Tile::from_byte));
            nrow += 1;
        }

        Ok(Self { nrow, ncol, tiles })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.nrow
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.ncol
    }

    /// Tile at `pos`, or `None` outside the rectangle.
    pub fn tile(&self, Pos(r, c): Pos) -> Option<Tile> {
        if r >= 0 && (r as usize) < self.nrow && c >= 0 && (c as usize) < self.ncol {
            Some(self.tiles[r as usize * self.ncol + c as usize])
        } else {
            None
        }
    }

    /// Overwrites the tile at `pos`. Out-of-bounds writes are ignored.
    pub fn set(&mut self, Pos(r, c): Pos, tile: Tile) {
        if r >= 0 && (r as usize) < self.nrow && c >= 0 && (c as usize) < self.ncol {
            self.tiles[r as usize * self.ncol + c as usize] = tile;
        }
    }

    /// Renders the grid as newline-delimited rows, with a trailing
    /// newline after the last row.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.nrow * (self.ncol + 1));
        for row in self.tiles.chunks(self.ncol) {
            out.extend(row.iter().map(|t| t.ch()));
            out.push('\n');
        }
        out
    }

    /// Positions of every tile, in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.nrow).flat_map(|r| (0..self.ncol).map(move |c| Pos::from((r, c))))
    }

    /// Out-of-bounds cells count as opaque.
    #[inline]
    fn blocked(&self, r: i32, c: i32) -> bool {
        self.tile(Pos(r, c)).map_or(true, Tile::blocks_sight)
    }

    /// Whether an unobstructed straight line from `from` reaches `to`.
    ///
    /// The line is walked along both grid axes. Where it crosses a row
    /// or column exactly on a cell, that cell must pass light; where it
    /// crosses between two adjacent cells, a single transparent cell on
    /// either side is enough.
    pub fn sees(&self, Pos(pr, pc): Pos, Pos(r, c): Pos) -> bool {
        let drow = r - pr;
        let dcol = c - pc;

        if drow == 0 && dcol == 0 {
            return true;
        }
        if drow == 0 {
            let (c1, c2) = (pc.min(c), pc.max(c));
            return (c1 + 1..c2).all(|j| !self.blocked(pr, j));
        }
        if dcol == 0 {
            let (r1, r2) = (pr.min(r), pr.max(r));
            return (r1 + 1..r2).all(|i| !self.blocked(i, pc));
        }

        let (r1, r2) = (pr.min(r), pr.max(r));
        for i in r1 + 1..r2 {
            // Exact column where the sight line crosses row i.
            let num = (i - pr) * dcol;
            if num % drow == 0 {
                if self.blocked(i, pc + num / drow) {
                    return false;
                }
            } else {
                let ic = pc + floor_div(num, drow);
                if self.blocked(i, ic) && self.blocked(i, ic + 1) {
                    return false;
                }
            }
        }

        let (c1, c2) = (pc.min(c), pc.max(c));
        for j in c1 + 1..c2 {
            let num = (j - pc) * drow;
            if num % dcol == 0 {
                if self.blocked(pr + num / dcol, j) {
                    return false;
                }
            } else {
                let ir = pr + floor_div(num, dcol);
                if self.blocked(ir, j) && self.blocked(ir + 1, j) {
                    return false;
                }
            }
        }

        true
    }

    /// Refreshes a player's `seen` grid from this master grid.
    ///
    /// Transient objects remembered from earlier passes are first reset
    /// to the underlying geometry, then every currently visible tile is
    /// copied over, and the viewpoint itself is drawn as `'@'`.
    pub fn reveal(&self, raw: &Grid, seen: &mut Grid, viewpoint: Pos) {
        seen.clean(raw);

        for pos in self.positions() {
            let Some(tile) = self.tile(pos) else { continue };
            if tile.is_rock() {
                continue;
            }
            if self.sees(viewpoint, pos) {
                seen.set(pos, tile);
            }
        }

        seen.set(viewpoint, Tile::VIEWER);
    }

    /// Resets remembered gold and players to the underlying geometry,
    /// so that objects gone from sight stop being drawn.
    fn clean(&mut self, raw: &Grid) {
        for pos in raw.positions() {
            let Some(tile) = self.tile(pos) else { continue };
            if tile.is_gold() || tile.is_player() {
                self.set(pos, raw.tile(pos).unwrap_or(Tile::ROCK));
            }
        }
    }
}

/// Division rounding towards negative infinity.
#[inline]
fn floor_div(a: i32, b: i32) -> i32 {
    let q = a / b;
    if a % b != 0 && (a < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}
