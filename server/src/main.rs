use std::{
    fmt::Debug,
    net::{IpAddr, SocketAddr},
    ops::ControlFlow,
};

use flexi_logger::{AdaptiveFormat, Logger, WriteMode};
use nuggets::state::{Command, Game, Leaver, StepOutcome};
use nuggets_msg::{self as msg, ClientMessage, ServerMessage};
use nuggets_net_foundation::{drive, Handle, Handlers, Outbox};

fn main() -> Result<(), DirectBoxedError> {
    let _logger = Logger::try_with_env_or_str("info")?
        .write_mode(WriteMode::BufferAndFlush)
        .log_to_stderr()
        .adaptive_format_for_stderr(AdaptiveFormat::Default)
        .start()?;

    let opts = nuggets_cli_parser::parse_server(std::env::args_os())?;
    let seed = opts.seed.unwrap_or_else(|| std::process::id() as u64);

    let map_text = match std::fs::read_to_string(&opts.map) {
        Ok(text) => text,
        Err(err) => {
            log::error!("fail to load map {}: {}", opts.map.display(), err);
            return Err(err.into());
        }
    };
    let game = Game::new(&map_text, seed)?;
    log::info!(
        "map {} loaded: {}x{}, {} piles",
        opts.map.display(),
        game.rows(),
        game.cols(),
        game.piles_left()
    );

    let handle = Handle::bind((IpAddr::from([0, 0, 0, 0]), 0))?;
    let port = handle.local_addr()?.port();
    println!("Ready to play, waiting at port {port}");
    match local_ip_address::local_ip() {
        Ok(ip) => log::info!("reachable at {ip}:{port}"),
        Err(err) => log::debug!("local address lookup failed: {err}"),
    }

    let mut server = Server { game };
    futures_lite::future::block_on(drive(&handle, None, &mut server))?;

    Ok(())
}

/// The authoritative side: one [`Game`] mutated only by the active
/// message handler.
struct Server {
    game: Game,
}

impl Handlers for Server {
    fn on_message(&mut self, from: SocketAddr, text: &str, out: &mut Outbox) -> ControlFlow<()> {
        match ClientMessage::parse(text) {
            Ok(ClientMessage::Play(name)) => self.handle_play(from, &name, out),
            Ok(ClientMessage::Spectate) => self.handle_spectate(from, out),
            Ok(ClientMessage::Key(key)) => return self.handle_key(from, key, out),
            Err(err) => log::error!("invalid message from {from}: {err}"),
        }
        ControlFlow::Continue(())
    }
}

impl Server {
    fn handle_play(&mut self, from: SocketAddr, name: &str, out: &mut Outbox) {
        match self.game.join(from, name) {
            Ok(alias) => {
                log::info!("player {alias} ({name:?}) joined from {from}");
                out.push(from, ServerMessage::Ok(alias));
                out.push(
                    from,
                    ServerMessage::Grid {
                        rows: self.game.rows(),
                        cols: self.game.cols(),
                    },
                );
                self.broadcast(out);
            }
            Err(nuggets::Error::GameFull) => {
                log::info!("refusing {from}: table is full");
                out.push(from, msg::game_full());
            }
            Err(nuggets::Error::EmptyName) => {
                log::info!("refusing {from}: blank name");
                out.push(from, msg::empty_name());
            }
            Err(err) => log::error!("join from {from} failed: {err}"),
        }
    }

    fn handle_spectate(&mut self, from: SocketAddr, out: &mut Outbox) {
        if let Some(old) = self.game.spectate(from) {
            log::info!("spectator {old} replaced by {from}");
            out.push(old, msg::spectator_replaced());
        } else {
            log::info!("spectator {from} joined");
        }
        out.push(
            from,
            ServerMessage::Grid {
                rows: self.game.rows(),
                cols: self.game.cols(),
            },
        );
        self.broadcast(out);
    }

    fn handle_key(&mut self, from: SocketAddr, key: char, out: &mut Outbox) -> ControlFlow<()> {
        match Command::from_key(key) {
            Some(Command::Quit) => self.handle_quit(from, out),
            Some(Command::Step(dir)) => {
                if let Some(seat) = self.seat_or_log(from, key) {
                    if self.game.step(seat, dir) != StepOutcome::Blocked {
                        self.broadcast(out);
                    }
                }
            }
            Some(Command::Run(dir)) => {
                if let Some(seat) = self.seat_or_log(from, key) {
                    while self.game.step(seat, dir) != StepOutcome::Blocked {
                        self.broadcast(out);
                    }
                }
            }
            None => {
                log::info!("invalid key {key:?} from {from}");
                if self.game.seat_of(from).is_some() {
                    out.push(from, msg::unknown_key(key));
                }
            }
        }

        // The only regular way out: the last pile was just collected.
        if self.game.over() {
            self.game_over(out);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    fn seat_or_log(&self, from: SocketAddr, key: char) -> Option<usize> {
        let seat = self.game.seat_of(from);
        if seat.is_none() {
            log::error!("key {key:?} from {from}: player must join first");
        }
        seat
    }

    fn handle_quit(&mut self, from: SocketAddr, out: &mut Outbox) {
        match self.game.quit(from) {
            Some(Leaver::Player) => {
                log::info!("player at {from} quit");
                out.push(from, msg::thanks_for_playing());
            }
            Some(Leaver::Spectator) => {
                log::info!("spectator at {from} quit");
                out.push(from, msg::thanks_for_watching());
            }
            None => log::info!("quit from unknown address {from}"),
        }
        self.broadcast(out);
    }

    /// Queues `GOLD` and `DISPLAY` for the spectator and every active
    /// player; players get their personal accumulated view.
    fn broadcast(&mut self, out: &mut Outbox) {
        if let Some(spectator) = self.game.spectator() {
            out.push(
                spectator,
                ServerMessage::Gold {
                    just_collected: 0,
                    purse: 0,
                    left: self.game.gold_left(),
                },
            );
            out.push(spectator, ServerMessage::Display(self.game.render_master()));
        }

        for seat in 0..self.game.players().len() {
            if !self.game.players()[seat].is_active() {
                continue;
            }
            let addr = self.game.players()[seat].addr;
            let just_collected = self.game.take_just_collected(seat);
            let purse = self.game.players()[seat].purse;
            out.push(
                addr,
                ServerMessage::Gold {
                    just_collected,
                    purse,
                    left: self.game.gold_left(),
                },
            );
            out.push(addr, ServerMessage::Display(self.game.render_view(seat)));
        }
    }

    /// Final scoreboard to everyone still connected.
    fn game_over(&mut self, out: &mut Outbox) {
        log::info!(
            "game over, {} nuggets collected over {} seats",
            self.game.collected(),
            self.game.players().len()
        );
        let board = self.game.scoreboard();
        if let Some(spectator) = self.game.spectator() {
            out.push(spectator, ServerMessage::Quit(board.clone()));
        }
        for player in self.game.players() {
            if player.is_active() {
                out.push(player.addr, ServerMessage::Quit(board.clone()));
            }
        }
    }
}

struct DirectBoxedError {
    inner: BoxedError,
}

impl Debug for DirectBoxedError {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl<T> From<T> for DirectBoxedError
where
    T: std::error::Error + 'static,
{
    #[inline]
    fn from(value: T) -> Self {
        Self {
            inner: Box::new(value),
        }
    }
}

type BoxedError = Box<dyn std::error::Error>;
