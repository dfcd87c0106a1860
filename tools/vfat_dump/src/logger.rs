use std::fmt::Display;
use std::io::{IsTerminal, Stderr, Write};

use log::{Level, LevelFilter, Log};
use owo_colors::OwoColorize;

struct Inner {
    stderr: Option<Stderr>,
    color:  bool,
}

impl Inner {
    fn write_with_color(&mut self, color: Color, string: impl Display) {
        let stderr = self.stderr.get_or_insert_with(std::io::stderr);
        let string: &dyn Display = match (self.color, color) {
            (false, _) | (true, Color::Default) => &string,
            (true, Color::Gray) => &string.dimmed(),
            (true, Color::BrightRed) => &string.bright_red(),
            (true, Color::BrightYellow) => &string.bright_yellow(),
            (true, Color::BrightBlue) => &string.bright_blue(),
            (true, Color::BrightCyan) => &string.bright_cyan(),
            (true, Color::BrightMagenta) => &string.bright_magenta(),
        };
        // Nowhere left to report a failed write to stderr.
        let _ = write!(stderr, "{string}");
    }
}

struct DumpLogger {
    inner: spin::Mutex<Inner>,
}

static LOGGER: DumpLogger = DumpLogger {
    inner: spin::Mutex::new(Inner { stderr: None, color: false }),
};

impl Log for DumpLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut inner = self.inner.lock();
        let level = record.level();
        inner.write_with_color(
            match level {
                Level::Error => Color::BrightRed,
                Level::Warn => Color::BrightYellow,
                Level::Info => Color::BrightBlue,
                Level::Debug => Color::BrightCyan,
                Level::Trace => Color::BrightMagenta,
            },
            format_args!("{level:5} "),
        );
        inner.write_with_color(Color::Gray, format_args!("[{}] ", record.target()));
        inner.write_with_color(Color::Default, record.args());
        inner.write_with_color(Color::Default, "\n");
    }

    fn flush(&self) {
        if let Some(stderr) = self.inner.lock().stderr.as_mut() {
            let _ = stderr.flush();
        }
    }
}

/// Install the logger. `verbosity` is the number of `-v` flags: warnings
/// only by default, then info, debug and trace.
pub fn init(verbosity: u8) -> Result<(), log::SetLoggerError> {
    LOGGER.inner.lock().color = std::io::stderr().is_terminal();
    log::set_max_level(match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });
    log::set_logger(&LOGGER)
}

enum Color {
    Default,
    Gray,
    BrightRed,
    BrightYellow,
    BrightBlue,
    BrightCyan,
    BrightMagenta,
}
