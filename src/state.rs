use std::net::SocketAddr;
use std::path::PathBuf;

use crate::{
    grid::{Dir, Grid, Pos, Tile},
    player::{Alias, Player, Seat},
    Error, GOLD_MAX_PILES, GOLD_MIN_PILES, GOLD_TOTAL, MAX_PLAYERS,
};

/// Options of the server binary.
#[derive(Debug)]
pub struct ServerOpts {
    pub map: PathBuf,
    /// RNG seed; the process id is used when absent.
    pub seed: Option<u64>,
}

/// Options of the client binary.
#[derive(Debug)]
pub struct ClientOpts {
    pub host: String,
    pub port: u16,
    /// Join as a named player when present, as the spectator otherwise.
    pub name: Option<String>,
}

/// A keypress from the wire, decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Lowercase movement key: one step.
    Step(Dir),
    /// Uppercase movement key: repeat until blocked.
    Run(Dir),
    /// `q`/`Q`.
    Quit,
}

impl Command {
    pub fn from_key(key: char) -> Option<Self> {
        if matches!(key, 'q' | 'Q') {
            return Some(Command::Quit);
        }
        if let Some(dir) = Dir::from_key(key) {
            return Some(Command::Step(dir));
        }
        Dir::from_key(key.to_ascii_lowercase()).map(Command::Run)
    }
}

/// What a single movement step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Target not traversable; the player did not move.
    Blocked,
    /// Plain move onto floor or passage.
    Moved,
    /// Traded places with the player in the given seat.
    Swapped(usize),
    /// Entered a pile and received this many nuggets.
    PickedUp(u32),
}

/// Which kind of participant a `Q` removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaver {
    Player,
    Spectator,
}

/// The authoritative world, owned by the server loop for the process
/// lifetime and mutated only by the active message handler.
pub struct Game {
    /// Live world with players and gold overlaid.
    master: Grid,
    /// Map geometry as loaded, never written after setup.
    raw: Grid,

    /// Seats in join order; the index is the alias.
    players: Vec<Player>,
    spectator: Option<SocketAddr>,

    piles_left: u32,
    collected: u32,
    left: u32,

    rng: fastrand::Rng,
}

impl Game {
    /// Loads the map and scatters the gold.
    pub fn new(map_text: &str, seed: u64) -> crate::Result<Self> {
        let master = Grid::parse(map_text)?;
        let raw = master.clone();
        let mut game = Self {
            master,
            raw,
            players: Vec::new(),
            spectator: None,
            piles_left: 0,
            collected: 0,
            left: GOLD_TOTAL,
            rng: fastrand::Rng::with_seed(seed),
        };
        game.drop_gold();
        Ok(game)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.master.rows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.master.cols()
    }

    #[inline]
    pub fn gold_left(&self) -> u32 {
        self.left
    }

    #[inline]
    pub fn collected(&self) -> u32 {
        self.collected
    }

    #[inline]
    pub fn piles_left(&self) -> u32 {
        self.piles_left
    }

    #[inline]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[inline]
    pub fn spectator(&self) -> Option<SocketAddr> {
        self.spectator
    }

    /// The game ends exactly when the last pile is collected.
    #[inline]
    pub fn over(&self) -> bool {
        self.piles_left == 0
    }

    /// Picks a pile count uniformly from the allowed range and places
    /// that many piles on empty floor tiles.
    fn drop_gold(&mut self) {
        self.piles_left = self.rng.u32(GOLD_MIN_PILES..GOLD_MAX_PILES);
        for _ in 0..self.piles_left {
            let spot = self.random_empty_floor();
            self.master.set(spot, Tile::GOLD);
        }
    }

    /// Rejection-samples a tile that is currently plain floor on the
    /// master grid, so piles and players never stack.
    fn random_empty_floor(&mut self) -> Pos {
        loop {
            let pos = Pos::from((self.rng.usize(..self.rows()), self.rng.usize(..self.cols())));
            if self.master.tile(pos).is_some_and(Tile::is_floor) {
                return pos;
            }
        }
    }

    /// Seats a new player: assigns the next alias, drops them on a
    /// random empty floor tile, and overlays their letter.
    pub fn join(&mut self, addr: SocketAddr, name: &str) -> crate::Result<Alias> {
        if self.players.len() == MAX_PLAYERS {
            return Err(Error::GameFull);
        }
        if crate::player::name_is_blank(name) {
            return Err(Error::EmptyName);
        }

        let alias = Alias::from_seat(self.players.len());
        let pos = self.random_empty_floor();
        let player = Player::new(
            addr,
            crate::player::sanitize_name(name),
            alias,
            pos,
            self.rows(),
            self.cols(),
        );
        self.master.set(pos, player.tile());
        self.players.push(player);
        Ok(alias)
    }

    /// Installs `addr` as the spectator, returning the incumbent it
    /// replaced, if any.
    pub fn spectate(&mut self, addr: SocketAddr) -> Option<SocketAddr> {
        self.spectator.replace(addr)
    }

    /// Seat index of the active player talking from `addr`.
    pub fn seat_of(&self, addr: SocketAddr) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.is_active() && p.addr == addr)
    }

    /// One movement step. Walking into another player swaps the two;
    /// walking onto a pile consumes it; leaving a tile restores the
    /// underlying geometry.
    pub fn step(&mut self, seat: usize, dir: Dir) -> StepOutcome {
        let from = self.players[seat].pos;
        let to = from.step(dir);

        let Some(target) = self.master.tile(to) else {
            return StepOutcome::Blocked;
        };
        if !target.is_traversable() {
            return StepOutcome::Blocked;
        }

        if target.is_player() {
            let Some(other) = self
                .players
                .iter()
                .position(|p| p.is_active() && p.pos == to)
            else {
                return StepOutcome::Blocked;
            };
            self.players[other].pos = from;
            self.players[seat].pos = to;
            let other_tile = self.players[other].tile();
            self.master.set(from, other_tile);
            let own_tile = self.players[seat].tile();
            self.master.set(to, own_tile);
            return StepOutcome::Swapped(other);
        }

        self.restore(from);
        self.players[seat].pos = to;
        let own_tile = self.players[seat].tile();
        self.master.set(to, own_tile);

        if target.is_gold() {
            StepOutcome::PickedUp(self.pickup(seat))
        } else {
            StepOutcome::Moved
        }
    }

    /// Draws this pile's share and credits it to the player in `seat`.
    /// The last pile carries everything that is left.
    fn pickup(&mut self, seat: usize) -> u32 {
        let gold = if self.piles_left == 1 {
            self.left
        } else {
            let max_per_pile = self.left - self.piles_left + 1;
            self.rng.u32(1..=max_per_pile)
        };

        let player = &mut self.players[seat];
        player.purse += gold;
        player.just_collected = gold;

        self.collected += gold;
        self.left -= gold;
        self.piles_left -= 1;
        gold
    }

    /// Hands out the "gold received since last broadcast" counter.
    pub fn take_just_collected(&mut self, seat: usize) -> u32 {
        std::mem::take(&mut self.players[seat].just_collected)
    }

    /// Removes the participant talking from `addr` from play. Players
    /// keep their seat, alias and purse but stop receiving updates;
    /// their tile reverts to the underlying geometry.
    pub fn quit(&mut self, addr: SocketAddr) -> Option<Leaver> {
        if self.spectator == Some(addr) {
            self.spectator = None;
            return Some(Leaver::Spectator);
        }

        let seat = self.seat_of(addr)?;
        let pos = self.players[seat].pos;
        self.restore(pos);
        self.players[seat].seat = Seat::Quit;
        Some(Leaver::Player)
    }

    /// Recomputes what the player in `seat` can currently see and
    /// renders their accumulated view.
    pub fn render_view(&mut self, seat: usize) -> String {
        let Game {
            master,
            raw,
            players,
            ..
        } = self;
        let player = &mut players[seat];
        master.reveal(raw, &mut player.seen, player.pos);
        player.seen.render()
    }

    /// Full-knowledge render for the spectator.
    pub fn render_master(&self) -> String {
        self.master.render()
    }

    /// The end-of-game summary: one line per seat with the alias, the
    /// right-aligned purse, and the real name.
    pub fn scoreboard(&self) -> String {
        use std::fmt::Write as _;

        let mut board = String::from("GAME OVER:\n");
        for player in &self.players {
            let _ = writeln!(board, "{}{:>6}   {}", player.alias, player.purse, player.name);
        }
        board
    }

    fn restore(&mut self, pos: Pos) {
        let under = self.raw.tile(pos).unwrap_or(Tile::ROCK);
        self.master.set(pos, under);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = "\
+------------------+
|..................|
|..................|
|..................|
|..................|
|..................|
|..................|
|..................|
|..................|
+------------------+";

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn game() -> Game {
        Game::new(MAP, 42).unwrap()
    }

    #[test]
    fn setup_places_gold_on_floor_only() {
        let game = game();
        assert!((GOLD_MIN_PILES..GOLD_MAX_PILES).contains(&game.piles_left()));
        assert_eq!(game.gold_left(), GOLD_TOTAL);
        assert_eq!(game.collected(), 0);

        let mut piles = 0;
        for pos in game.raw.positions() {
            let tile = game.master.tile(pos).unwrap();
            if tile.is_gold() {
                assert!(game.raw.tile(pos).unwrap().is_floor());
                piles += 1;
            } else {
                assert_eq!(tile, game.raw.tile(pos).unwrap());
            }
        }
        assert_eq!(piles, game.piles_left());
    }

    #[test]
    fn seeded_games_are_reproducible() {
        let a = Game::new(MAP, 7).unwrap();
        let b = Game::new(MAP, 7).unwrap();
        assert_eq!(a.piles_left(), b.piles_left());
        assert_eq!(a.master.render(), b.master.render());
    }

    #[test]
    fn joins_seat_in_order_and_draw_letters() {
        let mut game = game();
        let a = game.join(addr(1000), "Alice").unwrap();
        let b = game.join(addr(1001), "Bob").unwrap();
        assert_eq!(a.letter(), 'A');
        assert_eq!(b.letter(), 'B');

        let pa = game.players()[0].pos;
        let pb = game.players()[1].pos;
        assert_ne!(pa, pb);
        assert_eq!(game.master.tile(pa), Some(Tile::from_byte(b'A')));
        assert_eq!(game.master.tile(pb), Some(Tile::from_byte(b'B')));
        assert!(game.raw.tile(pa).unwrap().is_floor());
        assert_eq!(game.seat_of(addr(1000)), Some(0));
        assert_eq!(game.seat_of(addr(1001)), Some(1));
    }

    #[test]
    fn join_refusals() {
        let mut game = game();
        assert!(matches!(game.join(addr(1), "  \t"), Err(Error::EmptyName)));

        for i in 0..MAX_PLAYERS as u16 {
            game.join(addr(2000 + i), "p").unwrap();
        }
        assert!(matches!(game.join(addr(3000), "late"), Err(Error::GameFull)));
        assert_eq!(game.players().len(), MAX_PLAYERS);
    }

    #[test]
    fn step_onto_floor_restores_departed_tile() {
        let mut game = game();
        seat(&mut game, 1000, "Alice", Pos(1, 1));
        game.restore(Pos(1, 2));

        assert_eq!(game.step(0, Dir::East), StepOutcome::Moved);
        assert_eq!(game.players()[0].pos, Pos(1, 2));
        assert_eq!(game.master.tile(Pos(1, 1)), Some(Tile::FLOOR));
        assert_eq!(game.master.tile(Pos(1, 2)), Some(Tile::from_byte(b'A')));
    }

    #[test]
    fn step_into_wall_is_blocked() {
        let mut game = game();
        seat(&mut game, 1000, "Alice", Pos(1, 1));

        assert_eq!(game.step(0, Dir::West), StepOutcome::Blocked);
        assert_eq!(game.step(0, Dir::North), StepOutcome::Blocked);
        assert_eq!(game.players()[0].pos, Pos(1, 1));
    }

    #[test]
    fn adjacent_players_swap() {
        let mut game = game();
        seat(&mut game, 1000, "Alice", Pos(1, 1));
        seat(&mut game, 1001, "Bob", Pos(1, 2));

        assert_eq!(game.step(0, Dir::East), StepOutcome::Swapped(1));
        assert_eq!(game.players()[0].pos, Pos(1, 2));
        assert_eq!(game.players()[1].pos, Pos(1, 1));
        assert_eq!(game.master.tile(Pos(1, 1)), Some(Tile::from_byte(b'B')));
        assert_eq!(game.master.tile(Pos(1, 2)), Some(Tile::from_byte(b'A')));
    }

    #[test]
    fn pickup_accounting() {
        let mut game = game();
        seat(&mut game, 1000, "Alice", Pos(1, 1));
        game.restore(Pos(1, 2));
        game.master.set(Pos(1, 2), Tile::GOLD);
        let piles_before = game.piles_left();
        let left_before = game.gold_left();

        let StepOutcome::PickedUp(gold) = game.step(0, Dir::East) else {
            panic!("expected a pickup");
        };
        assert!(gold >= 1);
        assert!(gold <= left_before - piles_before + 1);
        assert_eq!(game.players()[0].purse, gold);
        assert_eq!(game.players()[0].just_collected, gold);
        assert_eq!(game.gold_left(), left_before - gold);
        assert_eq!(game.collected(), gold);
        assert_eq!(game.piles_left(), piles_before - 1);
        assert_eq!(game.take_just_collected(0), gold);
        assert_eq!(game.players()[0].just_collected, 0);

        // The pile is gone from the world.
        assert_eq!(game.master.tile(Pos(1, 2)), Some(Tile::from_byte(b'A')));
    }

    #[test]
    fn last_pile_takes_everything() {
        let mut game = game();
        seat(&mut game, 1000, "Alice", Pos(1, 1));
        game.piles_left = 1;
        game.restore(Pos(1, 2));
        game.master.set(Pos(1, 2), Tile::GOLD);
        let left = game.gold_left();

        assert_eq!(game.step(0, Dir::East), StepOutcome::PickedUp(left));
        assert_eq!(game.gold_left(), 0);
        assert!(game.over());
    }

    #[test]
    fn purses_and_remainder_sum_to_total() {
        let mut game = game();
        seat(&mut game, 1000, "Alice", Pos(1, 1));

        // March east over whatever the seed scattered on row 1.
        for _ in 0..game.cols() {
            if game.step(0, Dir::East) == StepOutcome::Blocked {
                break;
            }
            let purses: u32 = game.players().iter().map(|p| p.purse).sum();
            assert_eq!(purses + game.gold_left(), GOLD_TOTAL);
        }
    }

    #[test]
    fn run_matches_step_by_step() {
        let mut by_run = game();
        seat(&mut by_run, 1000, "Alice", Pos(1, 1));
        while by_run.step(0, Dir::East) != StepOutcome::Blocked {}

        let mut by_steps = game();
        seat(&mut by_steps, 1000, "Alice", Pos(1, 1));
        for _ in 0..by_steps.cols() * 2 {
            by_steps.step(0, Dir::East);
        }

        assert_eq!(by_run.players()[0].pos, by_steps.players()[0].pos);
        // Row 1 dead-ends at the east wall.
        assert_eq!(by_run.players()[0].pos, Pos(1, 18));
    }

    #[test]
    fn quit_retains_seat_and_purse() {
        let mut game = game();
        seat(&mut game, 1000, "Alice", Pos(1, 1));
        seat(&mut game, 1001, "Bob", Pos(3, 3));
        game.players[0].purse = 17;

        assert_eq!(game.quit(addr(1000)), Some(Leaver::Player));
        assert_eq!(game.master.tile(Pos(1, 1)), Some(Tile::FLOOR));
        assert_eq!(game.seat_of(addr(1000)), None);
        assert_eq!(game.players().len(), 2);
        assert_eq!(game.players()[0].purse, 17);

        // A second quit from the same address finds nobody.
        assert_eq!(game.quit(addr(1000)), None);

        // Bob keeps his seat and the next joiner gets 'C'.
        assert_eq!(game.seat_of(addr(1001)), Some(1));
        assert_eq!(game.join(addr(1002), "Carol").unwrap().letter(), 'C');
    }

    #[test]
    fn spectator_slot_evicts() {
        let mut game = game();
        assert_eq!(game.spectate(addr(5000)), None);
        assert_eq!(game.spectator(), Some(addr(5000)));
        assert_eq!(game.spectate(addr(5001)), Some(addr(5000)));
        assert_eq!(game.spectator(), Some(addr(5001)));

        assert_eq!(game.quit(addr(5001)), Some(Leaver::Spectator));
        assert_eq!(game.spectator(), None);
    }

    #[test]
    fn scoreboard_formats_lines() {
        let mut game = game();
        game.join(addr(1000), "Alice").unwrap();
        game.join(addr(1001), "Bob").unwrap();
        game.players[0].purse = 0;
        game.players[1].purse = 123;

        let board = game.scoreboard();
        let mut lines = board.lines();
        assert_eq!(lines.next(), Some("GAME OVER:"));
        assert_eq!(lines.next(), Some("A     0   Alice"));
        assert_eq!(lines.next(), Some("B   123   Bob"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn render_view_accumulates_and_marks_viewer() {
        let mut game = game();
        seat(&mut game, 1000, "Alice", Pos(1, 1));

        let view = game.render_view(0);
        let rows: Vec<&str> = view.lines().collect();
        assert_eq!(rows.len(), game.rows());
        assert_eq!(rows[1].as_bytes()[1], b'@');
        // The room walls are revealed; gold on the ray passes light.
        assert_eq!(rows[0].as_bytes()[0], b'+');
        assert_eq!(rows[1].as_bytes()[19], b'|');
    }

    #[test]
    fn command_decoding() {
        assert_eq!(Command::from_key('h'), Some(Command::Step(Dir::West)));
        assert_eq!(Command::from_key('N'), Some(Command::Run(Dir::SouthEast)));
        assert_eq!(Command::from_key('Q'), Some(Command::Quit));
        assert_eq!(Command::from_key('q'), Some(Command::Quit));
        assert_eq!(Command::from_key('x'), None);
        assert_eq!(Command::from_key(' '), None);
    }

    /// Seats a player at a fixed spot, bypassing random placement so
    /// tests do not depend on where the seed drops them.
    fn seat(game: &mut Game, port: u16, name: &str, to: Pos) {
        let alias = Alias::from_seat(game.players.len());
        // Clear whatever the seed put on the destination.
        game.restore(to);
        let player = Player::new(addr(port), name.into(), alias, to, game.rows(), game.cols());
        game.master.set(to, player.tile());
        game.players.push(player);
    }
}
