use std::io::{IsTerminal, Write};
use std::time::{Duration, Instant};

use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};

use crate::error::SinkError;

/// Minimum time between two redraws.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// What the progress line currently shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressState {
    Running { sent: u64, rate: f64 },
    Stopping { pending: usize },
}

/// Single overwritten status line on stderr.
#[derive(Debug)]
pub struct ProgressLine {
    no_color: bool,
    last_render: Option<Instant>,
    drawn: bool,
}

impl ProgressLine {
    /// Returns a progress line when stderr is a terminal.
    #[must_use]
    pub fn for_stderr(no_color: bool) -> Option<Self> {
        std::io::stderr()
            .is_terminal()
            .then_some(Self::new(no_color))
    }

    #[must_use]
    pub const fn new(no_color: bool) -> Self {
        Self {
            no_color,
            last_render: None,
            drawn: false,
        }
    }

    /// Whether a redraw is due at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_render
            .is_none_or(|last| now.saturating_duration_since(last) >= PROGRESS_INTERVAL)
    }

    /// Redraws the line on stderr if the last redraw is old enough.
    ///
    /// # Errors
    ///
    /// Returns an error when the terminal write fails.
    pub fn tick(&mut self, now: Instant, state: ProgressState) -> Result<(), SinkError> {
        if !self.is_due(now) {
            return Ok(());
        }
        self.last_render = Some(now);
        let mut out = std::io::stderr();
        self.render_to(&mut out, state)
    }

    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub fn render_to<W: Write>(
        &mut self,
        out: &mut W,
        state: ProgressState,
    ) -> Result<(), SinkError> {
        self.drawn = true;
        let map = |err: std::io::Error| SinkError::Progress { source: err };
        queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).map_err(map)?;
        for (text, color) in segments(state) {
            if self.no_color {
                queue!(out, Print(&text)).map_err(map)?;
            } else {
                queue!(out, SetForegroundColor(color), Print(&text), ResetColor).map_err(map)?;
            }
        }
        out.flush().map_err(map)
    }

    /// Ends the line so later output starts on a fresh one.
    ///
    /// # Errors
    ///
    /// Returns an error when the terminal write fails.
    pub fn finish(&mut self) -> Result<(), SinkError> {
        if !self.drawn {
            return Ok(());
        }
        self.drawn = false;
        let mut out = std::io::stderr();
        out.write_all(b"\n")
            .and_then(|()| out.flush())
            .map_err(|err| SinkError::Progress { source: err })
    }
}

fn segments(state: ProgressState) -> Vec<(String, Color)> {
    match state {
        ProgressState::Running { sent, rate } => vec![
            (format!("q: {}", sent), Color::Cyan),
            (format!(" q/s: {:.1}", rate), Color::Yellow),
        ],
        ProgressState::Stopping { pending } => {
            vec![(format!("STOPPING. Pending queries: {}", pending), Color::Red)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(state: ProgressState) -> Result<String, String> {
        let mut line = ProgressLine::new(true);
        let mut out = Vec::new();
        line.render_to(&mut out, state)
            .map_err(|err| err.to_string())?;
        String::from_utf8(out).map_err(|err| err.to_string())
    }

    #[test]
    fn running_line_shows_count_and_rate() -> Result<(), String> {
        let text = plain(ProgressState::Running {
            sent: 42,
            rate: 12.345,
        })?;
        if !text.ends_with("q: 42 q/s: 12.3") {
            return Err(format!("Unexpected line: {:?}", text));
        }
        Ok(())
    }

    #[test]
    fn stopping_line_shows_pending() -> Result<(), String> {
        let text = plain(ProgressState::Stopping { pending: 7 })?;
        if !text.ends_with("STOPPING. Pending queries: 7") {
            return Err(format!("Unexpected line: {:?}", text));
        }
        Ok(())
    }

    #[test]
    fn redraws_are_throttled() -> Result<(), String> {
        let start = Instant::now();
        let mut line = ProgressLine::new(true);
        if !line.is_due(start) {
            return Err("First redraw is always due".to_owned());
        }
        line.last_render = Some(start);
        if line.is_due(start.checked_add(Duration::from_millis(100)).ok_or("overflow")?) {
            return Err("Redraw before the interval".to_owned());
        }
        if !line.is_due(start.checked_add(PROGRESS_INTERVAL).ok_or("overflow")?) {
            return Err("Redraw due after the interval".to_owned());
        }
        Ok(())
    }
}
