//! Serialized presentation of per-repository results
//!
//! The reporter is owned by the coordinator's collection loop, so it is the
//! only writer. Each repository's line (or verbose block) is assembled first
//! and written in one call while the progress bar is suspended. Log events
//! go through [`LogWriter`], which suspends the same bar.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io::{self, Write};
use tracing_subscriber::fmt::MakeWriter;

use super::config::{
    RunConfig, NO_REPOS_MESSAGE, PROGRESS_TEMPLATE, SEPARATOR_WIDTH, SLOW_REPO_THRESHOLD_SECS,
};
use super::discovery::RepositoryRef;
use super::stats::{condense_detail, RunSummary};
use crate::git::{Outcome, OutcomeKind, TaskResult};

#[derive(Serialize)]
struct RepoRecord<'a> {
    name: &'a str,
    path: String,
    outcome: OutcomeKind,
    detail: &'a str,
    elapsed_ms: u128,
}

#[derive(Serialize)]
struct SummaryRecord {
    repositories: usize,
    elapsed_ms: u128,
    counts: BTreeMap<&'static str, usize>,
}

/// Writes repository lines and the final summary
pub struct Reporter<W: Write> {
    out: W,
    progress: ProgressBar,
    verbose: bool,
    json: bool,
    name_width: usize,
    hinted: HashSet<OutcomeKind>,
    hints: Vec<&'static str>,
}

/// The run's progress bar on stderr, hidden for JSON output
pub fn progress_bar(json: bool) -> Result<ProgressBar> {
    if json {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    pb.set_style(ProgressStyle::with_template(PROGRESS_TEMPLATE)?);
    Ok(pb)
}

/// Log sink that writes each event while the progress bar is suspended
#[derive(Clone)]
pub struct LogWriter<M> {
    progress: ProgressBar,
    make_sink: M,
}

impl LogWriter<fn() -> io::Stderr> {
    pub fn stderr(progress: ProgressBar) -> Self {
        Self {
            progress,
            make_sink: io::stderr,
        }
    }
}

impl<M> LogWriter<M> {
    pub fn new(progress: ProgressBar, make_sink: M) -> Self {
        Self { progress, make_sink }
    }
}

impl<'a, M, S> MakeWriter<'a> for LogWriter<M>
where
    M: Fn() -> S + 'static,
    S: Write,
{
    type Writer = LogLine<S>;

    fn make_writer(&'a self) -> Self::Writer {
        LogLine {
            progress: self.progress.clone(),
            sink: (self.make_sink)(),
            buffer: Vec::new(),
        }
    }
}

/// One buffered log event; emitted on flush or drop
pub struct LogLine<S: Write> {
    progress: ProgressBar,
    sink: S,
    buffer: Vec<u8>,
}

impl<S: Write> Write for LogLine<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let (sink, buffer) = (&mut self.sink, &mut self.buffer);
        self.progress
            .suspend(|| sink.write_all(buffer.as_slice()).and_then(|()| sink.flush()))?;
        buffer.clear();
        Ok(())
    }
}

impl<S: Write> Drop for LogLine<S> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl Reporter<io::Stdout> {
    /// Reporter for the terminal: lines on stdout, `progress` on stderr
    pub fn stdout(config: &RunConfig, progress: ProgressBar) -> Self {
        Self::new(io::stdout(), progress, config.verbose, config.json)
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, progress: ProgressBar, verbose: bool, json: bool) -> Self {
        Self {
            out,
            progress,
            verbose,
            json,
            name_width: 0,
            hinted: HashSet::new(),
            hints: Vec::new(),
        }
    }

    /// Prints the run header and sizes the progress bar
    ///
    /// `concurrency` is the capacity of the limiter actually gating the run.
    pub fn begin(
        &mut self,
        config: &RunConfig,
        concurrency: usize,
        repos: &[RepositoryRef],
    ) -> Result<()> {
        self.name_width = repos.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
        self.progress.set_length(repos.len() as u64);

        if self.json {
            return Ok(());
        }

        let header = if repos.is_empty() {
            format!("{NO_REPOS_MESSAGE}\n")
        } else {
            let repo_word = if repos.len() == 1 { "repository" } else { "repositories" };
            let mode = if config.dry_run { ", dry run" } else { "" };
            format!(
                "🚀 Syncing {} {} in {} ({} concurrent{})\n\n",
                repos.len(),
                repo_word,
                config.root_path.display(),
                concurrency,
                mode
            )
        };
        self.write_block(&header)?;
        Ok(())
    }

    /// Prints one repository's result as a single contiguous write
    pub fn report(&mut self, result: &TaskResult, outcome: &Outcome) -> Result<()> {
        let block = if self.json {
            let record = RepoRecord {
                name: &result.repo.name,
                path: result.repo.path.to_string_lossy().into_owned(),
                outcome: outcome.kind,
                detail: &outcome.detail,
                elapsed_ms: result.elapsed.as_millis(),
            };
            format!("{}\n", serde_json::to_string(&record)?)
        } else {
            self.format_line(result, outcome)
        };

        self.write_block(&block)?;
        self.progress.inc(1);
        self.progress.set_message(result.repo.name.clone());

        // Hints are shown once per category, after the run
        if let Some(hint) = outcome.kind.hint() {
            if self.hinted.insert(outcome.kind) {
                self.hints.push(hint);
            }
        }
        Ok(())
    }

    /// Clears the progress bar and prints the summary, attention list and hints
    pub fn finish(&mut self, summary: &RunSummary) -> Result<()> {
        self.progress.finish_and_clear();

        if self.json {
            let counts = OutcomeKind::ALL
                .iter()
                .map(|kind| (kind.text(), summary.count(*kind)))
                .collect();
            let record = SummaryRecord {
                repositories: summary.total_repositories,
                elapsed_ms: summary.elapsed.as_millis(),
                counts,
            };
            let block = format!("{}\n", serde_json::to_string(&record)?);
            self.write_block(&block)?;
            return Ok(());
        }

        let mut block = format!("\n{}\n", summary.generate_summary());

        let detailed = summary.generate_detailed_summary();
        if !detailed.is_empty() {
            let separator = "━".repeat(SEPARATOR_WIDTH);
            block.push_str(&format!("\n{separator}\n{detailed}\n{separator}\n"));
        }
        for hint in &self.hints {
            block.push_str(&format!("💡 {hint}\n"));
        }

        self.write_block(&block)?;
        Ok(())
    }

    /// Gives back the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn format_line(&self, result: &TaskResult, outcome: &Outcome) -> String {
        let mut detail = condense_detail(&outcome.detail);
        if result.elapsed.as_secs() >= SLOW_REPO_THRESHOLD_SECS && outcome.kind != OutcomeKind::TimedOut {
            detail.push_str(&format!(" ({:.1}s)", result.elapsed.as_secs_f64()));
        }

        let mut block = format!(
            "{} {:width$}  {:<18} {}\n",
            outcome.kind.symbol(),
            result.repo.name,
            outcome.kind.text(),
            detail,
            width = self.name_width
        );

        let output = result.raw_output.trim_end();
        if self.verbose && outcome.kind.shows_output() && !output.is_empty() {
            block.push_str(&format!("\t{}\n", output.replace('\n', "\n\t")));
        }
        block
    }

    fn write_block(&mut self, block: &str) -> io::Result<()> {
        let out = &mut self.out;
        self.progress
            .suspend(|| out.write_all(block.as_bytes()).and_then(|()| out.flush()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::ProcessError;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl SharedSink {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn log_writer(sink: &SharedSink) -> LogWriter<impl Fn() -> SharedSink + Clone + 'static> {
        let sink = sink.clone();
        LogWriter::new(ProgressBar::hidden(), move || sink.clone())
    }

    fn config(dry_run: bool) -> RunConfig {
        RunConfig::new("/work", dry_run, false, 4, Duration::from_secs(15)).unwrap()
    }

    fn repo(name: &str) -> RepositoryRef {
        RepositoryRef {
            path: PathBuf::from(format!("/work/{name}")),
            name: name.to_string(),
        }
    }

    fn task(name: &str, output: &str, failed: bool, elapsed: Duration) -> TaskResult {
        TaskResult {
            repo: repo(name),
            raw_output: output.to_string(),
            process_error: failed.then(|| ProcessError::Wait {
                program: "git".to_string(),
                source: io::Error::other("boom"),
            }),
            timed_out: false,
            elapsed,
        }
    }

    fn text_of(reporter: Reporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_header_and_condensed_line() {
        let mut reporter = Reporter::new(Vec::new(), ProgressBar::hidden(), false, false);
        reporter.begin(&config(true), 4, &[repo("alpha"), repo("b")]).unwrap();

        let result = task("b", "From /srv/b\n   1..2  main -> origin/main\n", false, Duration::from_millis(40));
        reporter
            .report(&result, &Outcome::new(OutcomeKind::UpdatesAvailable, "updates available"))
            .unwrap();

        let text = text_of(reporter);
        assert!(text.starts_with("🚀 Syncing 2 repositories in /work (4 concurrent, dry run)"));
        assert!(text.contains("🟡 b      updates-available  updates available\n"), "{text}");
        assert!(!text.contains("origin/main"), "condensed mode must not dump output");
    }

    #[test]
    fn test_verbose_block_indents_output() {
        let mut reporter = Reporter::new(Vec::new(), ProgressBar::hidden(), true, false);
        reporter.begin(&config(false), 4, &[repo("r")]).unwrap();

        let result = task("r", "fatal: bad\nhint: more\n", true, Duration::from_millis(5));
        reporter.report(&result, &Outcome::new(OutcomeKind::Failed, "fatal: bad")).unwrap();

        let text = text_of(reporter);
        assert!(text.contains("🔴 r  failed"));
        assert!(text.contains("\tfatal: bad\n\thint: more\n"), "{text}");
    }

    #[test]
    fn test_slow_repositories_show_elapsed() {
        let mut reporter = Reporter::new(Vec::new(), ProgressBar::hidden(), false, false);
        reporter.begin(&config(false), 4, &[repo("slow")]).unwrap();

        let result = task("slow", "Already up to date.\n", false, Duration::from_secs(12));
        reporter.report(&result, &Outcome::new(OutcomeKind::UpToDate, "up to date")).unwrap();

        assert!(text_of(reporter).contains("up to date (12.0s)"));
    }

    #[test]
    fn test_hints_printed_once_per_category() {
        let mut reporter = Reporter::new(Vec::new(), ProgressBar::hidden(), false, false);
        let repos = [repo("a"), repo("b"), repo("c")];
        reporter.begin(&config(false), 4, &repos).unwrap();

        let mut summary = RunSummary::new();
        for name in ["a", "b"] {
            let result = task(name, "fatal: Authentication failed", true, Duration::ZERO);
            let outcome = Outcome::new(OutcomeKind::AuthSkipped, "fatal: Authentication failed");
            reporter.report(&result, &outcome).unwrap();
            summary.record(&result.repo, &outcome);
        }
        let result = task("c", "Already up to date.", false, Duration::ZERO);
        let outcome = Outcome::new(OutcomeKind::UpToDate, "up to date");
        reporter.report(&result, &outcome).unwrap();
        summary.record(&result.repo, &outcome);

        reporter.finish(&summary).unwrap();
        let text = text_of(reporter);

        let hint = OutcomeKind::AuthSkipped.hint().unwrap();
        assert_eq!(text.matches(hint).count(), 1);
        assert!(text.contains("3 repositories processed"));
        assert!(text.contains("NEEDS CREDENTIALS (2)"));
    }

    #[test]
    fn test_json_records() {
        let mut reporter = Reporter::new(Vec::new(), ProgressBar::hidden(), false, true);
        reporter.begin(&config(true), 4, &[repo("j")]).unwrap();

        let result = task("j", "", false, Duration::from_millis(7));
        let outcome = Outcome::new(OutcomeKind::UpToDate, "up to date");
        reporter.report(&result, &outcome).unwrap();

        let mut summary = RunSummary::new();
        summary.record(&result.repo, &outcome);
        reporter.finish(&summary).unwrap();

        let text = text_of(reporter);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(record["name"], "j");
        assert_eq!(record["outcome"], "up-to-date");
        assert_eq!(record["elapsed_ms"], 7);

        let summary: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(summary["repositories"], 1);
        assert_eq!(summary["counts"]["up-to-date"], 1);
        assert_eq!(summary["counts"]["failed"], 0);
    }

    #[test]
    fn test_log_line_is_written_whole_on_drop() {
        let sink = SharedSink::default();
        let writer = log_writer(&sink);

        let mut line = writer.make_writer();
        line.write_all(b"WARN partial ").unwrap();
        assert!(sink.text().is_empty(), "nothing may reach stderr mid-event");
        line.write_all(b"event\n").unwrap();
        drop(line);

        assert_eq!(sink.text(), "WARN partial event\n");
    }

    #[test]
    fn test_tracing_events_go_through_log_writer() {
        let sink = SharedSink::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(log_writer(&sink))
            .with_ansi(false)
            .without_time()
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(repo = "alpha", "could not acquire a limiter slot");
        });

        let text = sink.text();
        assert_eq!(text.lines().count(), 1, "{text}");
        assert!(text.contains("WARN"));
        assert!(text.contains("could not acquire a limiter slot"));
        assert!(text.contains("repo=\"alpha\""));
    }

    #[test]
    fn test_empty_run_prints_no_repos_message() {
        let mut reporter = Reporter::new(Vec::new(), ProgressBar::hidden(), false, false);
        reporter.begin(&config(false), 4, &[]).unwrap();
        reporter.finish(&RunSummary::new()).unwrap();

        let text = text_of(reporter);
        assert!(text.starts_with(NO_REPOS_MESSAGE));
        assert!(text.contains("0 repositories processed"));
    }
}
