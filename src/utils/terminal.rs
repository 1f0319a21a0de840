//! Terminal utilities for title setting

use std::io::{self, IsTerminal, Write};

/// Sets the terminal title when stdout is an interactive terminal
pub fn set_terminal_title(title: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    if !stdout.is_terminal() {
        return Ok(());
    }
    // ANSI escape sequence to set terminal title
    write!(stdout, "\x1b]0;{title}\x07")?;
    stdout.flush()
}
