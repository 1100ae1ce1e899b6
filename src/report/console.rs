//! Human-readable console output.
//!
//! ```text
//! ────────────────────────────────
//!  Suite: math
//! ────────────────────────────────
//!
//!   PASS  adds                           0.01ms
//!   FAIL  divides                        0.02ms
//!         Assertion failed: Expected 3 to be (===) 4
//!
//! Summary
//!   Total:   2 tests
//!   ...
//! Exit code: 1
//! ```

use std::io::{self, Write};

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use unicode_width::UnicodeWidthStr;

use super::{format_millis, Reporter, SuiteInfo};
use crate::results::{ExecutionResult, FailureCause, HookFailure, RunSummary, TestStatus};

const BAR_WIDTH: usize = 32;
const NAME_WIDTH: usize = 30;
const DETAIL_INDENT: &str = "      ";

/// Per-suite counts, kept while the suite is open.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    passed: usize,
    failed: usize,
    skipped: usize,
    errored: usize,
}

impl Tally {
    fn add(&mut self, status: TestStatus) {
        match status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => self.failed += 1,
            TestStatus::Skipped => self.skipped += 1,
            TestStatus::Errored => self.errored += 1,
        }
    }

    fn absorb(&mut self, other: Tally) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.errored += other.errored;
    }
}

pub struct ConsoleReporter<W: WriteColor> {
    out: W,
    verbose: bool,
    depth: usize,
    tallies: Vec<Tally>,
    error: Option<io::Error>,
}

impl ConsoleReporter<StandardStream> {
    pub fn stdout(choice: ColorChoice) -> Self {
        Self::new(StandardStream::stdout(choice))
    }
}

impl<W: WriteColor> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            verbose: false,
            depth: 0,
            tallies: Vec::new(),
            error: None,
        }
    }

    /// Also print skip reasons and a tally line per suite.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// The first write error, if any. Later writes are still attempted.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn keep(&mut self, written: io::Result<()>) {
        if let Err(err) = written {
            self.error.get_or_insert(err);
        }
    }

    fn indent(&self) -> String {
        "  ".repeat(self.depth.max(1))
    }

    fn colored(&mut self, text: &str, spec: &ColorSpec) -> io::Result<()> {
        self.out.set_color(spec)?;
        write!(self.out, "{}", text)?;
        self.out.reset()
    }

    fn write_suite_start(&mut self, suite: &SuiteInfo) -> io::Result<()> {
        if suite.depth == 0 {
            let bar = "─".repeat(BAR_WIDTH);
            writeln!(self.out, "{}", bar)?;
            write!(self.out, " Suite: ")?;
            self.colored(&suite.name, ColorSpec::new().set_bold(true))?;
            writeln!(self.out)?;
            writeln!(self.out, "{}", bar)?;
            writeln!(self.out)
        } else {
            write!(self.out, "{}", "  ".repeat(suite.depth))?;
            self.colored(&suite.name, ColorSpec::new().set_bold(true))?;
            writeln!(self.out)
        }
    }

    fn write_result(&mut self, result: &ExecutionResult) -> io::Result<()> {
        let indent = self.indent();
        write!(self.out, "{}", indent)?;
        self.colored(result.status.label(), &status_spec(result.status))?;
        write!(self.out, "  {} ", pad_right(&result.test_name, NAME_WIDTH))?;
        self.colored(
            &format_millis(result.duration_nanos),
            ColorSpec::new().set_dimmed(true),
        )?;
        writeln!(self.out)?;

        let detail = format!("{}{}", indent, DETAIL_INDENT);
        let diagnostic = result.diagnostic.as_deref().unwrap_or_default();
        match result.status {
            TestStatus::Passed => {}
            TestStatus::Skipped => {
                if self.verbose && !diagnostic.is_empty() {
                    write!(self.out, "{}", detail)?;
                    self.colored("Skipped", ColorSpec::new().set_fg(Some(Color::Yellow)))?;
                    writeln!(self.out, ": {}", diagnostic)?;
                }
            }
            TestStatus::Failed | TestStatus::Errored => {
                let label = if result.status == TestStatus::Failed {
                    "Assertion failed"
                } else {
                    "Error"
                };
                write!(self.out, "{}", detail)?;
                self.colored(label, ColorSpec::new().set_fg(Some(Color::Red)))?;
                writeln!(self.out, ": {}", diagnostic)?;
                if let Some(FailureCause::Assertion {
                    expected: Some(expected),
                    actual: Some(actual),
                }) = &result.cause
                {
                    if expected.contains('\n') || actual.contains('\n') {
                        self.write_diff(&detail, expected, actual)?;
                    }
                }
                if let Some(secondary) = &result.secondary {
                    write!(self.out, "{}", detail)?;
                    self.colored("Cleanup", ColorSpec::new().set_dimmed(true))?;
                    writeln!(self.out, ": {}", secondary)?;
                }
                writeln!(self.out)?;
            }
        }
        Ok(())
    }

    fn write_diff(&mut self, indent: &str, expected: &str, actual: &str) -> io::Result<()> {
        let changeset = Changeset::new(expected, actual, "\n");
        for diff in &changeset.diffs {
            match diff {
                Difference::Same(text) => {
                    for line in text.lines() {
                        writeln!(self.out, "{}  {}", indent, line)?;
                    }
                }
                Difference::Rem(text) => {
                    for line in text.lines() {
                        write!(self.out, "{}", indent)?;
                        self.colored(
                            &format!("- {}", line),
                            ColorSpec::new().set_fg(Some(Color::Green)),
                        )?;
                        writeln!(self.out)?;
                    }
                }
                Difference::Add(text) => {
                    for line in text.lines() {
                        write!(self.out, "{}", indent)?;
                        self.colored(
                            &format!("+ {}", line),
                            ColorSpec::new().set_fg(Some(Color::Red)),
                        )?;
                        writeln!(self.out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn write_hook_failure(&mut self, failure: &HookFailure) -> io::Result<()> {
        let indent = self.indent();
        write!(self.out, "{}", indent)?;
        self.colored("HOOK", ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        writeln!(
            self.out,
            "  {} in '{}': {}",
            failure.hook, failure.suite_name, failure.message
        )
    }

    fn write_suite_end(&mut self, suite: &SuiteInfo, tally: Tally) -> io::Result<()> {
        if self.verbose {
            writeln!(
                self.out,
                "{}{} passed, {} failed, {} skipped, {} errored",
                "  ".repeat(suite.depth + 1),
                tally.passed,
                tally.failed,
                tally.skipped,
                tally.errored
            )?;
        }
        if suite.depth == 0 {
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn write_summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        let red = ColorSpec::new().set_fg(Some(Color::Red)).clone();
        let green = ColorSpec::new().set_fg(Some(Color::Green)).clone();
        let yellow = ColorSpec::new().set_fg(Some(Color::Yellow)).clone();

        writeln!(self.out)?;
        writeln!(self.out, "Summary")?;
        writeln!(self.out, "  Total:   {} tests", summary.total)?;
        self.count_line("Passed:  ", summary.passed, &green)?;
        self.count_line("Failed:  ", summary.failed, &red)?;
        self.count_line("Skipped: ", summary.skipped, &yellow)?;
        self.count_line("Errored: ", summary.errored, &red)?;
        if summary.hook_failures > 0 {
            self.count_line("Hook failures: ", summary.hook_failures, &red)?;
        }
        write!(self.out, "  Time:    ")?;
        self.colored(
            &format_millis(summary.total_duration_nanos),
            ColorSpec::new().set_dimmed(true),
        )?;
        writeln!(self.out)?;
        writeln!(self.out)?;

        let code = summary.exit_code();
        write!(self.out, "Exit code: ")?;
        self.colored(&code.to_string(), if code == 0 { &green } else { &red })?;
        writeln!(self.out)?;
        self.out.flush()
    }

    /// Counts are colored only when non-zero.
    fn count_line(&mut self, label: &str, count: usize, spec: &ColorSpec) -> io::Result<()> {
        write!(self.out, "  {}", label)?;
        if count > 0 {
            self.colored(&count.to_string(), spec)?;
        } else {
            write!(self.out, "{}", count)?;
        }
        writeln!(self.out)
    }
}

impl<W: WriteColor> Reporter for ConsoleReporter<W> {
    fn suite_start(&mut self, suite: &SuiteInfo) {
        self.depth = suite.depth + 1;
        self.tallies.push(Tally::default());
        let written = self.write_suite_start(suite);
        self.keep(written);
    }

    fn test_result(&mut self, result: &ExecutionResult) {
        if let Some(tally) = self.tallies.last_mut() {
            tally.add(result.status);
        }
        let written = self.write_result(result);
        self.keep(written);
    }

    fn hook_failure(&mut self, failure: &HookFailure) {
        let written = self.write_hook_failure(failure);
        self.keep(written);
    }

    fn suite_end(&mut self, suite: &SuiteInfo) {
        let tally = self.tallies.pop().unwrap_or_default();
        if let Some(parent) = self.tallies.last_mut() {
            parent.absorb(tally);
        }
        let written = self.write_suite_end(suite, tally);
        self.keep(written);
        self.depth = suite.depth;
    }

    fn run_summary(&mut self, summary: &RunSummary) {
        let written = self.write_summary(summary);
        self.keep(written);
    }
}

fn status_spec(status: TestStatus) -> ColorSpec {
    let mut spec = ColorSpec::new();
    let color = match status {
        TestStatus::Passed => Color::Green,
        TestStatus::Failed | TestStatus::Errored => Color::Red,
        TestStatus::Skipped => Color::Yellow,
    };
    spec.set_fg(Some(color)).set_bold(true);
    spec
}

/// Pads to `width` display columns; longer text is left as is.
fn pad_right(text: &str, width: usize) -> String {
    let shown = UnicodeWidthStr::width(text);
    if shown >= width {
        return text.to_string();
    }
    format!("{}{}", text, " ".repeat(width - shown))
}

#[cfg(test)]
mod tests {
    use termcolor::NoColor;

    use super::*;

    fn render(events: impl FnOnce(&mut ConsoleReporter<NoColor<Vec<u8>>>)) -> String {
        let mut reporter = ConsoleReporter::new(NoColor::new(Vec::new()));
        events(&mut reporter);
        String::from_utf8(reporter.into_inner().into_inner()).unwrap()
    }

    #[test]
    fn padding_counts_display_columns() {
        assert_eq!(pad_right("ab", 4), "ab  ");
        assert_eq!(pad_right("日本", 6), "日本  ");
        assert_eq!(pad_right("toolong", 3), "toolong");
    }

    #[test]
    fn multi_line_mismatch_renders_a_diff() {
        let out = render(|r| {
            r.test_result(&ExecutionResult {
                suite_name: "s".into(),
                suite_path: "s".into(),
                test_name: "lines".into(),
                status: TestStatus::Failed,
                duration_nanos: 0,
                diagnostic: Some("Expected 'a\nc' to be (===) 'a\nb'".into()),
                cause: Some(FailureCause::Assertion {
                    expected: Some("a\nb".into()),
                    actual: Some("a\nc".into()),
                }),
                secondary: None,
            })
        });
        assert!(out.contains("- b"));
        assert!(out.contains("+ c"));
    }

    #[test]
    fn hook_failures_appear_in_summary_only_when_present() {
        let clean = render(|r| r.run_summary(&RunSummary::default()));
        assert!(!clean.contains("Hook failures"));
        assert!(clean.contains("Exit code: 0"));

        let broken = render(|r| {
            r.run_summary(&RunSummary {
                hook_failures: 1,
                ..RunSummary::default()
            })
        });
        assert!(broken.contains("Hook failures: 1"));
        assert!(broken.contains("Exit code: 1"));
    }
}
