use std::time::Instant;

use owo_colors::OwoColorize;

/// Elapsed-time stamps for pipeline status lines.
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Prefix like `[12.3] ` for progress messages.
    pub fn stamp(&self) -> String {
        format!("[{:.1}] ", self.start.elapsed().as_secs_f64())
    }

    /// Print one stamped status line.
    pub fn status(&self, msg: impl AsRef<str>) {
        println!("{}{}", self.stamp(), msg.as_ref());
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Level {
    Info,
    Warning,
    Error,
}

pub fn info(msg: impl AsRef<str>) {
    print_line(Level::Info, msg.as_ref());
}

pub fn warning(msg: impl AsRef<str>) {
    print_line(Level::Warning, msg.as_ref());
}

pub fn error(msg: impl AsRef<str>) {
    print_line(Level::Error, msg.as_ref());
}

/// Colors only when stdout is a TTY, so redirected run logs stay plain.
pub fn print_line(level: Level, msg: &str) {
    let color = atty::is(atty::Stream::Stdout);
    if color {
        match level {
            Level::Info => println!("{}", msg),
            Level::Warning => println!("{}", msg.yellow()),
            Level::Error => println!("{}", msg.red()),
        }
    } else {
        println!("{}", msg);
    }
}
