use std::fmt::{self, Display};
use std::io::IsTerminal;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};

/// Color theme for operator output.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Theme {
    /// Dark palette when stdout is a terminal, plain otherwise.
    Auto,
    /// Palette for light terminal backgrounds.
    Light,
    /// Palette for dark terminal backgrounds.
    Dark,
    /// No colors or icons styling.
    Plain,
}

/// Operator-facing terminal output.
pub struct Ui {
    palette: Palette,
    paint: bool,
    quiet: bool,
    stderr: bool,
    spinner_style: ProgressStyle,
}

impl Ui {
    /// Creates a UI; colors are only emitted when stdout is a terminal.
    pub fn new(theme: Theme, quiet: bool) -> Self {
        let stdout_is_tty = std::io::stdout().is_terminal();
        let paint = match theme {
            Theme::Plain => false,
            Theme::Auto | Theme::Light | Theme::Dark => stdout_is_tty,
        } && !quiet;

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        let palette = match theme {
            Theme::Plain => Palette::plain(),
            Theme::Light => Palette::light(),
            Theme::Dark | Theme::Auto => Palette::dark(),
        };

        let spinner_style = ProgressStyle::with_template("{prefix} {spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");

        Self {
            palette,
            paint,
            quiet,
            stderr: false,
            spinner_style,
        }
    }

    /// Sends all operator text to stderr, leaving stdout to machine output.
    pub fn on_stderr(mut self) -> Self {
        self.paint = self.paint && std::io::stderr().is_terminal();
        self.stderr = true;
        self
    }

    /// Whether operator text goes to stderr.
    pub fn writes_stderr(&self) -> bool {
        self.stderr
    }

    /// Plain, non-quiet UI used by tests and non-interactive callers.
    pub fn plain() -> Self {
        Self::new(Theme::Plain, false)
    }

    /// Whether decorative output is suppressed.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Empty line.
    pub fn spacer(&self) {
        if !self.quiet {
            self.out(format_args!(""));
        }
    }

    /// Framed section banner.
    pub fn banner(&self, title: &str) {
        if self.quiet {
            self.out(format_args!("{title}"));
            return;
        }
        let rule = "=".repeat(60);
        if self.paint {
            self.out(format_args!("{}", self.palette.rule.paint(&rule)));
            self.out(format_args!("{}", self.palette.heading.paint(format!(" {title} "))));
            self.out(format_args!("{}", self.palette.rule.paint(&rule)));
        } else {
            self.out(format_args!("{rule}"));
            self.out(format_args!(" {title} "));
            self.out(format_args!("{rule}"));
        }
    }

    /// Aligned key/value rows under a heading.
    pub fn section<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(String, String)> = rows
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        if rows.is_empty() {
            return;
        }

        self.heading(title);
        let key_width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in rows {
            if self.paint {
                self.out(format_args!(
                    "  {} {}",
                    self.palette.key.paint(format!("{key:>key_width$}:")),
                    self.palette.value.paint(value)
                ));
            } else {
                self.out(format_args!("  {key:>key_width$}: {value}"));
            }
        }
    }

    /// Bulleted list under a heading.
    pub fn list<I>(&self, title: &str, entries: I)
    where
        I: IntoIterator<Item = String>,
    {
        let entries: Vec<String> = entries.into_iter().collect();
        if entries.is_empty() {
            return;
        }
        self.heading(title);
        for entry in entries {
            if self.paint && !self.quiet {
                self.out(format_args!("  {} {entry}", self.palette.bullet.paint("•")));
            } else {
                self.out(format_args!("  - {entry}"));
            }
        }
    }

    /// Raw text from the remote tool, passed through untouched.
    pub fn raw(&self, text: &str) {
        let text = text.trim_end();
        if !text.is_empty() {
            self.out(format_args!("{text}"));
        }
    }

    /// Neutral progress message.
    pub fn info(&self, message: &str) {
        self.line(INFO_ICON, self.palette.info, message);
    }

    /// Completed-step message.
    pub fn success(&self, message: &str) {
        self.line(SUCCESS_ICON, self.palette.success, message);
    }

    /// Warning on stderr.
    pub fn warn(&self, message: &str) {
        if self.quiet {
            eprintln!("{message}");
            return;
        }
        let prefix = if self.paint {
            self.palette.warn.paint(WARNING_ICON)
        } else {
            Style::new().paint(WARNING_ICON)
        };
        eprintln!("{prefix} {message}");
    }

    /// Failure on stderr. Never suppressed by quiet mode.
    pub fn error(&self, message: &str) {
        let prefix = if self.paint {
            self.palette.error.paint(ERROR_ICON)
        } else {
            Style::new().paint(ERROR_ICON)
        };
        eprintln!("{prefix} {message}");
    }

    /// Starts a spinner for a long-running step.
    pub fn task<'a>(&'a self, label: impl Into<String>) -> TaskGuard<'a> {
        let label = label.into();
        let pb = if self.quiet {
            None
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(self.spinner_style.clone());
            let prefix = if self.paint {
                self.palette.info.paint(PROGRESS_ICON).to_string()
            } else {
                PROGRESS_ICON.to_string()
            };
            pb.set_prefix(prefix);
            pb.set_message(label.clone());
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        };
        TaskGuard {
            ui: self,
            label,
            start: Instant::now(),
            finished: false,
            pb,
        }
    }

    fn out(&self, args: fmt::Arguments<'_>) {
        if self.stderr {
            eprintln!("{args}");
        } else {
            println!("{args}");
        }
    }

    fn line(&self, icon: &str, style: Style, message: &str) {
        if self.quiet {
            self.out(format_args!("{message}"));
            return;
        }
        let prefix = if self.paint {
            style.paint(icon)
        } else {
            Style::new().paint(icon)
        };
        self.out(format_args!("{prefix} {message}"));
    }

    fn heading(&self, title: &str) {
        if self.quiet {
            self.out(format_args!("{title}"));
            return;
        }
        let formatted = format!("{HEADING_ICON} {title}");
        if self.paint {
            self.out(format_args!("{}", self.palette.heading.paint(formatted)));
        } else {
            self.out(format_args!("{formatted}"));
        }
    }
}

/// Spinner handle; dropping it unfinished reports an interruption.
pub struct TaskGuard<'a> {
    ui: &'a Ui,
    label: String,
    start: Instant,
    finished: bool,
    pb: Option<ProgressBar>,
}

impl<'a> TaskGuard<'a> {
    /// Stops the spinner and returns the elapsed time.
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        let elapsed = self.start.elapsed();
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
        elapsed
    }
}

impl<'a> Drop for TaskGuard<'a> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let elapsed = format_duration(self.start.elapsed());
        if let Some(pb) = self.pb.take() {
            pb.abandon_with_message(format!("{} stopped after {elapsed}", self.label));
        } else {
            self.ui
                .warn(&format!("{} stopped after {elapsed}", self.label));
        }
    }
}

/// Compact duration for operator messages.
pub fn format_duration(duration: Duration) -> String {
    if duration.as_secs_f64() >= 1.0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{:.0}ms", duration.as_secs_f64() * 1_000.0)
    }
}

struct Palette {
    heading: Style,
    rule: Style,
    key: Style,
    value: Style,
    bullet: Style,
    info: Style,
    success: Style,
    warn: Style,
    error: Style,
}

impl Palette {
    fn dark() -> Self {
        Self {
            heading: Style::new().fg(Color::White).bold(),
            rule: Style::new().fg(Color::Cyan),
            key: Style::new().fg(Color::LightBlue).bold(),
            value: Style::new().fg(Color::White),
            bullet: Style::new().fg(Color::LightGreen),
            info: Style::new().fg(Color::LightBlue),
            success: Style::new().fg(Color::LightGreen).bold(),
            warn: Style::new().fg(Color::Yellow).bold(),
            error: Style::new().fg(Color::LightRed).bold(),
        }
    }

    fn light() -> Self {
        Self {
            heading: Style::new().fg(Color::Black).bold(),
            rule: Style::new().fg(Color::Blue),
            key: Style::new().fg(Color::Black).bold(),
            value: Style::new().fg(Color::Black),
            bullet: Style::new().fg(Color::Green),
            info: Style::new().fg(Color::Blue),
            success: Style::new().fg(Color::Green).bold(),
            warn: Style::new().fg(Color::Purple).bold(),
            error: Style::new().fg(Color::Red).bold(),
        }
    }

    fn plain() -> Self {
        Self {
            heading: Style::new(),
            rule: Style::new(),
            key: Style::new(),
            value: Style::new(),
            bullet: Style::new(),
            info: Style::new(),
            success: Style::new(),
            warn: Style::new(),
            error: Style::new(),
        }
    }
}

const HEADING_ICON: &str = "▸";
const SUCCESS_ICON: &str = "✔";
const WARNING_ICON: &str = "⚠";
const ERROR_ICON: &str = "✖";
const INFO_ICON: &str = "ℹ";
const PROGRESS_ICON: &str = "▶";
