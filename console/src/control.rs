use std::io::Write;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::{output, DirectBoxedError, State};

/// Turns one terminal event into protocol traffic or screen work.
///
/// A player forwards every character key and lets the server judge it;
/// a spectator only ever asks to leave.
pub(crate) fn accept<W: Write>(
    st: &mut State<W>,
    event: Event,
    mut send_key: impl FnMut(char),
) -> Result<(), DirectBoxedError> {
    match event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press | KeyEventKind::Repeat,
            state: _,
        }) => match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                // Ask the server for a clean goodbye.
                send_key('Q');
            }
            KeyCode::Char(key) => {
                if st.is_player {
                    send_key(key);
                } else if matches!(key, 'q' | 'Q') {
                    send_key('Q');
                }
            }
            _ => {}
        },
        Event::Resize(_, _) => {
            if st.initialized {
                output::redraw(st)?;
            } else {
                output::try_init(st)?;
            }
        }
        _ => {}
    }
    Ok(())
}
