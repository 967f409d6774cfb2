use crate::config::Mode;
use crate::types::dates::format_mdy;
use crate::types::DateWindow;
use std::io::{self, BufRead, Write};

/// Ask the operator to confirm the window before anything is touched
///
/// Only an answer starting with `y` or `Y` confirms; anything else,
/// including end of input, declines.
pub fn confirm<R: BufRead, W: Write>(
    window: &DateWindow,
    mode: Mode,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    write!(
        output,
        "Running for dates {} through {} in {} (y/n): ",
        format_mdy(window.start),
        format_mdy(window.end),
        mode
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim_start().starts_with(['y', 'Y']))
}
