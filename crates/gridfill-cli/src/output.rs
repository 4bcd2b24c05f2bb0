//! Output formatting and progress reporting

use console::{style, Style, Term};
use gridfill::{RecordView, SpeedPreset};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for the user-facing commands.
///
/// Status lines go to stderr; record listings go to stdout so they can be
/// piped.
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    out: Term,
    spinner: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            out: Term::stdout(),
            spinner: None,
            use_color,
            quiet,
        }
    }

    /// Start a spinner for a replay expected to take about `estimate`
    pub fn start_spinner(&mut self, message: &str, estimate: Duration) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("{message} (about {}s)", estimate.as_secs().max(1)));
        pb.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(pb);
    }

    /// Update spinner message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.spinner {
            pb.set_message(message.to_string());
        }
    }

    /// Remove the spinner
    pub fn finish(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "OK".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print the record-count indicator and the numbered record table
    pub fn records(&self, view: &RecordView) {
        let count = view.count_label();
        let count = if self.use_color {
            Style::new().bold().apply_to(count).to_string()
        } else {
            count
        };
        let _ = self.out.write_line(&count);

        let width = view.count().to_string().len();
        for (number, record) in view.numbered() {
            let number = format!("{number:>width$}");
            let number = if self.use_color {
                style(number).dim().to_string()
            } else {
                number
            };
            let _ = self.out.write_line(&format!("{number}  {}", record.replace('\t', "  │  ")));
        }
    }

    /// Print raw lines to stdout
    pub fn plain(&self, text: &str) {
        let _ = self.out.write_line(text);
    }

    /// Print the preset table, marking the selected preset
    pub fn speed_table(&self, selected: SpeedPreset) {
        let _ = self.out.write_line(&format!(
            "  {:<8} {:>5} {:>9} {:>6} {:>5} {:>5}",
            "preset", "tab", "after_tab", "focus", "blur", "next"
        ));
        for preset in SpeedPreset::ALL {
            let t = preset.profile();
            let marker = if preset == selected { "*" } else { " " };
            let line = format!(
                "{marker} {:<8} {:>5} {:>9} {:>6} {:>5} {:>5}",
                preset.name(),
                t.tab,
                t.after_tab,
                t.focus,
                t.blur,
                t.next
            );
            let line = if self.use_color && preset == selected {
                style(line).green().bold().to_string()
            } else {
                line
            };
            let _ = self.out.write_line(&line);
        }
    }

    /// Print the outcome of a replay
    pub fn replay_summary(&self, total: usize, count: usize, elapsed: Duration) {
        let skipped = total.saturating_sub(count);
        let message = format!(
            "{count} of {total} records written in {:.1}s",
            elapsed.as_secs_f64()
        );
        if skipped == 0 {
            self.success(&message);
        } else {
            self.warning(&format!("{message}; {skipped} had no field and were skipped"));
        }
        self.info("Save the form in the page to keep the values.");
    }
}
