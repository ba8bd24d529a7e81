//! Output functions for the console.

use std::io::Write;
use std::ops::ControlFlow;

use crossterm::{
    cursor, execute, queue, style,
    terminal::{self, ClearType},
};
use nuggets_msg::ServerMessage;

use crate::{DirectBoxedError, State};

/// Applies one server message to the screen. Breaks on `QUIT`.
pub(crate) fn apply<W: Write>(
    st: &mut State<W>,
    message: ServerMessage,
) -> Result<ControlFlow<()>, DirectBoxedError> {
    match message {
        ServerMessage::Ok(alias) => st.letter = Some(alias),
        ServerMessage::Grid { rows, cols } => {
            st.rows = rows;
            st.cols = cols;
            try_init(st)?;
        }
        ServerMessage::Gold {
            just_collected,
            purse,
            left,
        } => {
            st.just_collected = just_collected;
            st.purse = purse;
            st.left = left;
            if st.initialized {
                draw_status(st)?;
            }
        }
        ServerMessage::Display(grid) => {
            st.last_display = Some(grid);
            if st.initialized {
                draw_display(st)?;
            }
        }
        ServerMessage::Quit(reason) => {
            // Back to the normal screen so the reason survives exit.
            teardown(st);
            println!("{reason}");
            return Ok(ControlFlow::Break(()));
        }
        ServerMessage::Error(advisory) => log::error!("{advisory}"),
    }
    Ok(ControlFlow::Continue(()))
}

/// Switches the terminal into game mode once the window fits the
/// advertised grid; until then keeps prompting the user to enlarge.
pub(crate) fn try_init<W: Write>(st: &mut State<W>) -> Result<(), DirectBoxedError> {
    if st.initialized || st.rows == 0 {
        return Ok(());
    }

    let (width, height) = terminal::size()?;
    if (width as usize) < st.cols + 1 || (height as usize) < st.rows + 1 {
        println!(
            "Enlarge your window to at least {} high and {} wide.",
            st.rows + 1,
            st.cols + 1
        );
        return Ok(());
    }

    terminal::enable_raw_mode()?;
    execute!(
        st.out,
        terminal::EnterAlternateScreen,
        terminal::Clear(ClearType::All),
        cursor::Hide
    )?;
    st.initialized = true;
    draw_status(st)?;
    draw_display(st)?;
    Ok(())
}

/// Restores the terminal. Safe to call more than once.
pub(crate) fn teardown<W: Write>(st: &mut State<W>) {
    if st.initialized {
        let _ = execute!(st.out, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        st.initialized = false;
    }
}

/// Full repaint after a resize.
pub(crate) fn redraw<W: Write>(st: &mut State<W>) -> Result<(), DirectBoxedError> {
    queue!(st.out, terminal::Clear(ClearType::All))?;
    draw_status(st)?;
    draw_display(st)?;
    Ok(())
}

fn draw_display<W: Write>(st: &mut State<W>) -> Result<(), std::io::Error> {
    let Some(grid) = st.last_display.take() else {
        return Ok(());
    };
    for (i, line) in grid.lines().enumerate() {
        queue!(st.out, cursor::MoveTo(0, i as u16 + 1), style::Print(line))?;
    }
    st.out.flush()?;
    st.last_display = Some(grid);
    Ok(())
}

fn draw_status<W: Write>(st: &mut State<W>) -> Result<(), std::io::Error> {
    let line = status_line(st);
    queue!(
        st.out,
        cursor::MoveTo(0, 0),
        terminal::Clear(ClearType::CurrentLine),
        style::Print(line)
    )?;
    st.out.flush()
}

/// The one-line scoreboard over the grid.
fn status_line<W: Write>(st: &State<W>) -> String {
    if st.is_player {
        let letter = st.letter.map(|a| a.letter()).unwrap_or('?');
        if st.just_collected == 0 {
            format!(
                "Player {} has {} nuggets ({} nuggets unclaimed).",
                letter, st.purse, st.left
            )
        } else {
            format!(
                "Player {} has {} nuggets ({} nuggets unclaimed).  GOLD received: {}",
                letter, st.purse, st.left, st.just_collected
            )
        }
    } else {
        format!(
            "Spectator: {} nuggets unclaimed. Play at plank {}",
            st.left, st.port
        )
    }
}
