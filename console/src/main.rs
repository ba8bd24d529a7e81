use std::{
    fmt::Debug,
    io::Write,
    net::{SocketAddr, ToSocketAddrs},
};

use flexi_logger::{AdaptiveFormat, Logger, WriteMode};
use nuggets::Alias;
use nuggets_msg::ClientMessage;
use nuggets_net_foundation::Handle;

mod client;
mod control;
mod output;

fn main() -> Result<(), DirectBoxedError> {
    let _logger = Logger::try_with_env_or_str("warn")?
        .write_mode(WriteMode::BufferAndFlush)
        .log_to_stderr()
        .adaptive_format_for_stderr(AdaptiveFormat::Default)
        .start()?;

    let opts = nuggets_cli_parser::parse_client(std::env::args_os())?;

    let server: SocketAddr = (opts.host.as_str(), opts.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| DirectBoxedError {
            inner: format!("cannot resolve host {}", opts.host).into(),
        })?;

    let handle = Handle::bind((std::net::Ipv4Addr::UNSPECIFIED, 0))?;
    log::info!(
        "talking to {server} from {}",
        handle.local_addr().map(|a| a.to_string()).unwrap_or_default()
    );

    let hello = match &opts.name {
        Some(name) => ClientMessage::Play(name.clone()),
        None => ClientMessage::Spectate,
    };
    futures_lite::future::block_on(handle.send_to(hello.to_string().as_bytes(), server))?;

    let mut st = State {
        out: std::io::stdout(),
        is_player: opts.name.is_some(),
        letter: None,
        rows: 0,
        cols: 0,
        initialized: false,
        last_display: None,
        purse: 0,
        left: 0,
        just_collected: 0,
        port: opts.port,
    };

    let result = client::run(&mut st, &handle, server);
    output::teardown(&mut st);
    result
}

/// Everything the thin client knows: screen bookkeeping and whatever
/// the server last told it. The world itself is never simulated here.
pub(crate) struct State<W: Write> {
    pub out: W,
    pub is_player: bool,
    pub letter: Option<Alias>,
    pub rows: usize,
    pub cols: usize,
    /// Whether the terminal has been switched into game mode yet.
    pub initialized: bool,
    /// Last `DISPLAY` payload, kept for redraws on resize.
    pub last_display: Option<String>,
    pub purse: u32,
    pub left: u32,
    pub just_collected: u32,
    pub port: u16,
}

pub(crate) struct DirectBoxedError {
    pub inner: BoxedError,
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
