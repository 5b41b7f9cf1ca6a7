//! Terminal output.
//!
//! Remediation text goes to stdout as it grows; notices and the waiting
//! spinner go to stderr so the text can be piped.

use super::{Notice, PresentationSink};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Streams remediation text to stdout.
pub struct TerminalSink {
    /// Bytes of the accumulated text already printed.
    shown: usize,
    quiet: bool,
    spinner: Option<ProgressBar>,
}

impl TerminalSink {
    pub fn new(quiet: bool) -> Self {
        Self {
            shown: 0,
            quiet,
            spinner: None,
        }
    }

    fn start_spinner(&mut self, message: String) {
        if self.quiet {
            return;
        }

        match self.spinner {
            Some(ref spinner) => spinner.set_message(message),
            None => {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                spinner.set_message(message);
                spinner.enable_steady_tick(Duration::from_millis(100));
                self.spinner = Some(spinner);
            }
        }
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// The part of `accumulated` not printed yet.
    fn unseen<'a>(&self, accumulated: &'a str) -> &'a str {
        accumulated.get(self.shown..).unwrap_or(accumulated)
    }
}

impl PresentationSink for TerminalSink {
    fn render(&mut self, accumulated: &str) {
        self.stop_spinner();

        let delta = self.unseen(accumulated);
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(delta.as_bytes());
        let _ = stdout.flush();
        self.shown = accumulated.len();
    }

    fn notify(&mut self, notice: Notice) {
        match notice {
            Notice::Progress(message) => self.start_spinner(message),
            Notice::Info(message) => {
                if !self.quiet {
                    self.stop_spinner();
                    eprintln!("ℹ️  {}", message);
                }
            }
            Notice::Warning(message) => {
                self.stop_spinner();
                eprintln!("\n⚠️  {}", message);
            }
            Notice::Error(message) => {
                self.stop_spinner();
                eprintln!("\n❌ Error: {}", message);
            }
            Notice::Completed => {
                self.stop_spinner();
                if !self.quiet {
                    eprintln!("\n✅ Dockerfile security analysis is completed!");
                }
            }
        }
    }
}

impl Drop for TerminalSink {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_tracks_printed_prefix() {
        let mut sink = TerminalSink::new(true);
        assert_eq!(sink.unseen("Use a pinned "), "Use a pinned ");

        sink.render("Use a pinned ");
        assert_eq!(sink.unseen("Use a pinned base image."), "base image.");

        sink.render("Use a pinned base image.");
        assert_eq!(sink.unseen("Use a pinned base image."), "");
    }

    #[test]
    fn test_quiet_sink_has_no_spinner() {
        let mut sink = TerminalSink::new(true);
        sink.notify(Notice::Progress("Detecting risks...".to_string()));
        assert!(sink.spinner.is_none());
    }
}
