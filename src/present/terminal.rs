//! Terminal rendering of the result area

use std::borrow::Cow;
use std::io::{IsTerminal, Write};

use super::{Presentation, Surface};

/// Writes presentations to a terminal (or any writer)
pub struct TerminalSurface<W: Write> {
    out: W,
    /// Emit OSC 8 hyperlinks for URL payloads
    hyperlinks: bool,
    /// Draw the transient busy line; only useful on a real terminal
    interactive: bool,
    /// Suppress all output (machine-readable mode prints results itself)
    quiet: bool,
    camera_active: bool,
}

impl TerminalSurface<std::io::Stdout> {
    pub fn stdout(hyperlinks: bool) -> Self {
        let out = std::io::stdout();
        let interactive = out.is_terminal();
        Self::new(out, hyperlinks && interactive, interactive)
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, hyperlinks: bool, interactive: bool) -> Self {
        Self {
            out,
            hyperlinks,
            interactive,
            quiet: false,
            camera_active: false,
        }
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prompt reflecting which commands are currently useful
    pub fn prompt(&self) -> &'static str {
        if self.camera_active {
            "qrpeek [camera]> "
        } else {
            "qrpeek> "
        }
    }

    pub fn write_prompt(&mut self) {
        if !self.interactive || self.quiet {
            return;
        }
        let prompt = self.prompt();
        self.emit(format_args!("{}", prompt));
    }

    fn emit(&mut self, args: std::fmt::Arguments<'_>) {
        if self.quiet {
            return;
        }
        if let Err(err) = self.out.write_fmt(args).and_then(|_| self.out.flush()) {
            log::warn!("Failed to write to terminal: {}", err);
        }
    }
}

/// OSC 8 hyperlink whose target is exactly `href`
pub fn hyperlink(href: &str) -> String {
    format!("\x1b]8;;{href}\x1b\\{href}\x1b]8;;\x1b\\")
}

fn is_unsafe(c: char) -> bool {
    c.is_control() && c != '\n' && c != '\t'
}

/// Text with C0/C1 controls (other than newline and tab) shown as `\u{..}` escapes
///
/// Decoded payloads are untrusted; raw escape sequences could rewrite the
/// screen or smuggle in another link target.
pub fn escape_controls(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_unsafe) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if is_unsafe(c) {
            out.push_str(&format!("\\u{{{:x}}}", c as u32));
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn show(&mut self, presentation: &Presentation) {
        match presentation {
            Presentation::Link { href } => {
                // A target carrying control bytes is never wrapped in OSC 8
                let link = if self.hyperlinks && !href.chars().any(char::is_control) {
                    hyperlink(href)
                } else {
                    escape_controls(href).into_owned()
                };
                self.emit(format_args!("Decoded URL:\n{}\n", link));
            }
            Presentation::Content(text) => {
                self.emit(format_args!("Decoded content:\n{}\n", escape_controls(text)));
            }
            Presentation::Status(message) => {
                self.emit(format_args!("{}\n", escape_controls(message)));
            }
        }
    }

    fn set_busy(&mut self, busy: bool) {
        if !self.interactive {
            return;
        }
        if busy {
            self.emit(format_args!("Decoding..."));
        } else {
            // Erase the busy line
            self.emit(format_args!("\r\x1b[2K"));
        }
    }

    fn set_file_name(&mut self, name: Option<&str>) {
        match name {
            Some(name) => self.emit(format_args!("Selected file: {}\n", escape_controls(name))),
            None => self.emit(format_args!("No file selected\n")),
        }
    }

    fn set_camera_active(&mut self, active: bool) {
        self.camera_active = active;
    }
}
