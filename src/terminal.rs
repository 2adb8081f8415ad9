use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{poll, read, DisableMouseCapture, EnableMouseCapture, Event},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        disable_raw_mode, enable_raw_mode, size, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use std::fmt::Write as _;
use std::io::{self, stdout, Write};
use std::time::Duration;

/// Double-buffered terminal surface
pub struct Terminal {
    width: u16,
    height: u16,
    buffer: Vec<Vec<Cell>>,
    alternate_screen: bool,
}

/// A single cell in the terminal buffer
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bold: false,
        }
    }
}

impl Terminal {
    /// Take over the real terminal. With `alternate_screen` the previous
    /// contents come back when this is dropped.
    pub fn new(alternate_screen: bool) -> io::Result<Self> {
        let (width, height) = size()?;

        if alternate_screen {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide)?;
        }

        Ok(Self::with_size(width, height, alternate_screen))
    }

    /// A buffer that is never attached to the tty (print mode, tests).
    pub fn offscreen(width: u16, height: u16) -> Self {
        Self::with_size(width, height, false)
    }

    fn with_size(width: u16, height: u16, alternate_screen: bool) -> Self {
        Self {
            width,
            height,
            buffer: vec![vec![Cell::default(); width as usize]; height as usize],
            alternate_screen,
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.buffer = vec![vec![Cell::default(); width as usize]; height as usize];
    }

    pub fn clear(&mut self) {
        for row in &mut self.buffer {
            row.fill(Cell::default());
        }
    }

    pub fn clear_screen(&self) -> io::Result<()> {
        execute!(stdout(), Clear(ClearType::All))?;
        Ok(())
    }

    #[cfg(test)]
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.buffer.get(y as usize)?.get(x as usize)
    }

    pub fn set(&mut self, x: i32, y: i32, ch: char, fg: Option<Color>, bold: bool) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize][x as usize] = Cell { ch, fg, bold };
        }
    }

    pub fn set_str(&mut self, x: i32, y: i32, s: &str, fg: Option<Color>, bold: bool) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i as i32, y, ch, fg, bold);
        }
    }

    /// Write the whole buffer to the screen in one flush.
    pub fn present(&self) -> io::Result<()> {
        let mut out = stdout();
        for (y, row) in self.buffer.iter().enumerate() {
            queue!(out, MoveTo(0, y as u16))?;
            for cell in row {
                if cell.bold {
                    queue!(out, SetAttribute(Attribute::Bold))?;
                }
                match cell.fg {
                    Some(color) => queue!(out, SetForegroundColor(color), Print(cell.ch), ResetColor)?,
                    None => queue!(out, Print(cell.ch))?,
                }
                if cell.bold {
                    queue!(out, SetAttribute(Attribute::Reset))?;
                }
            }
        }
        out.flush()
    }

    /// Next input event, waiting at most `timeout`.
    pub fn poll_event(&self, timeout: Duration) -> io::Result<Option<Event>> {
        if poll(timeout)? {
            return Ok(Some(read()?));
        }
        Ok(None)
    }

    /// The buffer as ANSI-colored text, one line per row.
    pub fn to_ansi_string(&self) -> String {
        let mut out = String::new();
        for row in &self.buffer {
            for cell in row {
                if cell.ch == ' ' {
                    out.push(' ');
                    continue;
                }
                if cell.bold {
                    out.push_str("\x1b[1m");
                }
                if let Some(code) = cell.fg.and_then(ansi_fg) {
                    out.push_str(&code);
                }
                out.push(cell.ch);
                out.push_str("\x1b[0m");
            }
            out.push('\n');
        }
        out
    }

    /// Print mode: dump the buffer to stdout.
    pub fn print_to_stdout(&self) -> io::Result<()> {
        let mut out = stdout();
        out.write_all(self.to_ansi_string().as_bytes())?;
        out.flush()
    }
}

fn ansi_fg(color: Color) -> Option<String> {
    let mut s = String::new();
    match color {
        Color::Rgb { r, g, b } => write!(s, "\x1b[38;2;{};{};{}m", r, g, b).ok()?,
        Color::AnsiValue(v) => write!(s, "\x1b[38;5;{}m", v).ok()?,
        Color::Black => s.push_str("\x1b[30m"),
        Color::DarkRed => s.push_str("\x1b[31m"),
        Color::DarkGreen => s.push_str("\x1b[32m"),
        Color::DarkYellow => s.push_str("\x1b[33m"),
        Color::DarkBlue => s.push_str("\x1b[34m"),
        Color::DarkMagenta => s.push_str("\x1b[35m"),
        Color::DarkCyan => s.push_str("\x1b[36m"),
        Color::Grey => s.push_str("\x1b[37m"),
        Color::DarkGrey => s.push_str("\x1b[90m"),
        Color::Red => s.push_str("\x1b[91m"),
        Color::Green => s.push_str("\x1b[92m"),
        Color::Yellow => s.push_str("\x1b[93m"),
        Color::Blue => s.push_str("\x1b[94m"),
        Color::Magenta => s.push_str("\x1b[95m"),
        Color::Cyan => s.push_str("\x1b[96m"),
        Color::White => s.push_str("\x1b[97m"),
        _ => return None,
    }
    Some(s)
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.alternate_screen {
            let _ = execute!(stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
    }
}

/// Mouse reporting for as long as the guard lives.
pub struct MouseCaptureGuard;

impl MouseCaptureGuard {
    pub fn enable() -> io::Result<Self> {
        execute!(stdout(), EnableMouseCapture)?;
        Ok(Self)
    }
}

impl Drop for MouseCaptureGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_outside_the_buffer_are_dropped() {
        let mut term = Terminal::offscreen(4, 2);
        term.set(-1, 0, 'x', None, false);
        term.set(4, 1, 'x', None, false);
        term.set_str(2, 1, "abc", Some(Color::Red), true);
        assert_eq!(term.get(2, 1).map(|c| c.ch), Some('a'));
        assert_eq!(term.get(3, 1).map(|c| c.ch), Some('b'));
        assert!(term.get(4, 1).is_none());
        term.clear();
        assert_eq!(term.get(2, 1), Some(&Cell::default()));
    }

    #[test]
    fn ansi_dump_has_one_line_per_row() {
        let mut term = Terminal::offscreen(3, 2);
        term.set(0, 0, '#', Some(Color::Rgb { r: 1, g: 2, b: 3 }), true);
        let text = term.to_ansi_string();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("\x1b[1m\x1b[38;2;1;2;3m#\x1b[0m"));
    }

    #[test]
    fn resize_reallocates() {
        let mut term = Terminal::offscreen(2, 2);
        term.resize(5, 3);
        assert_eq!(term.size(), (5, 3));
        assert!(term.get(4, 2).is_some());
    }
}
