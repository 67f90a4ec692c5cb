//! Line commands for the interactive panel.
//!
//! ```text
//! set ra 120     absolute speed
//! dec +10        relative step (sign required)
//! stop [ra|dec]  stop one axis or both
//! status         show current speeds
//! quit
//! ```

use crate::protocol::Axis;

/// One parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Set { axis: Axis, speed: i64 },
    Nudge { axis: Axis, delta: i64 },
    Stop(Option<Axis>),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
set <ra|dec> <speed>   set absolute speed (-255..=255)
<ra|dec> <+n|-n>       change speed by n
stop [ra|dec]          stop one axis or both
status                 show current speeds
quit                   close the link and exit";

/// Parse one input line. `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let cmd = match words.as_slice() {
        [] => return Ok(None),
        ["set", axis, speed] => ConsoleCommand::Set {
            axis: parse_axis(axis)?,
            speed: parse_int(speed)?,
        },
        ["stop"] => ConsoleCommand::Stop(None),
        ["stop", axis] => ConsoleCommand::Stop(Some(parse_axis(axis)?)),
        ["status"] => ConsoleCommand::Status,
        ["help" | "?"] => ConsoleCommand::Help,
        ["quit" | "exit" | "q"] => ConsoleCommand::Quit,
        [axis, delta] if delta.starts_with(['+', '-']) => ConsoleCommand::Nudge {
            axis: parse_axis(axis)?,
            delta: parse_int(delta.trim_start_matches('+'))?,
        },
        _ => return Err(format!("Unrecognized command: {}", line.trim())),
    };
    Ok(Some(cmd))
}

fn parse_axis(s: &str) -> Result<Axis, String> {
    s.parse::<Axis>().map_err(|e| e.to_string())
}

fn parse_int(s: &str) -> Result<i64, String> {
    s.parse::<i64>()
        .map_err(|_| format!("Not an integer: {s}"))
}
