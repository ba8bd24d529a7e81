use std::{io::Write, net::SocketAddr};

use async_executor::LocalExecutor;
use crossterm::event::EventStream;
use futures_lite::StreamExt as _;
use nuggets_msg::{ClientMessage, ServerMessage, MAX_MESSAGE};
use nuggets_net_foundation::Handle;

use crate::{control, output, DirectBoxedError, State};

enum Event {
    Net(std::io::Result<(usize, SocketAddr)>),
    Term(std::io::Result<Option<crossterm::event::Event>>),
}

/// The client loop: multiplexes the server socket and the keyboard,
/// mirroring whatever the server draws. Ends on `QUIT` or when the
/// input stream closes.
pub(crate) fn run<W: Write>(
    st: &mut State<W>,
    handle: &Handle,
    server: SocketAddr,
) -> Result<(), DirectBoxedError> {
    let executor = LocalExecutor::new();
    let mut events = EventStream::new();
    let mut buf = vec![0u8; MAX_MESSAGE];

    futures_lite::future::block_on(executor.run(async {
        'game: loop {
            let event = futures_lite::future::race(
                async { Event::Net(handle.recv_from(&mut buf).await) },
                async { Event::Term(events.try_next().await) },
            )
            .await;

            match event {
                Event::Net(Ok((nread, from))) => {
                    if from != server {
                        log::debug!("ignoring datagram from unexpected peer {from}");
                        continue;
                    }
                    let Ok(text) = std::str::from_utf8(&buf[..nread]) else {
                        log::warn!("dropping non-UTF-8 datagram from {from}");
                        continue;
                    };
                    match ServerMessage::parse(text) {
                        Ok(message) => {
                            if output::apply(st, message)?.is_break() {
                                break 'game;
                            }
                        }
                        Err(err) => log::error!("bad message from server: {err}"),
                    }
                }
                Event::Net(Err(err)) => log::error!("error recv packet: {err}"),
                Event::Term(Ok(Some(event))) => {
                    control::accept(st, event, |key| {
                        let message = ClientMessage::Key(key).to_string();
                        executor
                            .spawn(async move {
                                if let Err(err) =
                                    handle.send_to(message.as_bytes(), server).await
                                {
                                    log::warn!("error sending keypress: {err}");
                                }
                            })
                            .detach();
                    })?;
                }
                // The terminal went away; nothing left to relay.
                Event::Term(Ok(None)) => break 'game,
                Event::Term(Err(err)) => log::error!("input error: {err}"),
            }
        }
        Result::<(), DirectBoxedError>::Ok(())
    }))?;

    Ok(())
}
