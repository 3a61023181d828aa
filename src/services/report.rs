//! Report assembly.
//!
//! [`ReportAggregator`] runs the checks in a fixed order and appends each
//! check's messages as they are produced:
//!
//! 1. Path resolution warnings
//! 2. Script extender file hashes
//! 3. Script extender integrity (Address Library, log, version, log errors)
//! 4. Game executable integrity
//! 5. Documents folder and INI checks
//!
//! The rendered report is the concatenation of every message, each followed by
//! the `-----` separator.

use super::docs::DocsChecker;
use super::integrity::IntegrityChecker;
use super::paths::PathResolver;
use crate::config::ConfigStore;
use crate::models::DiagnosticMessage;
use crate::state::ContextManager;
use std::fmt;

/// Ordered list of report messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    messages: Vec<DiagnosticMessage>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: DiagnosticMessage) {
        self.messages.push(message);
    }

    /// Append `messages` after everything already in the report.
    pub fn extend<I: IntoIterator<Item = DiagnosticMessage>>(&mut self, messages: I) {
        self.messages.extend(messages);
    }

    pub fn messages(&self) -> &[DiagnosticMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages with a warning or caution marker
    pub fn problem_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_problem()).count()
    }

    /// Render the report text.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for message in &self.messages {
            write!(f, "{}", message)?;
        }
        Ok(())
    }
}

/// Drives path resolution and every check, collecting one [`Report`].
pub struct ReportAggregator<'a> {
    store: &'a ConfigStore,
    resolver: PathResolver<'a>,
    integrity: IntegrityChecker<'a>,
    docs: DocsChecker<'a>,
}

impl<'a> ReportAggregator<'a> {
    pub fn new(store: &'a ConfigStore, context: ContextManager, resolver: PathResolver<'a>) -> Self {
        Self {
            store,
            resolver,
            integrity: IntegrityChecker::new(store, context.clone()),
            docs: DocsChecker::new(store, context),
        }
    }

    /// Run the full game files scan.
    pub fn run(&self) -> Report {
        tracing::info!("Starting game files scan");
        let mut report = Report::new();

        report.extend(self.resolver.resolve_all());
        report.extend(self.integrity.check_xse_hashes());
        report.extend(self.integrity.check_xse_integrity());
        report.extend(self.integrity.check_game_integrity());
        report.extend(self.docs.check_all());

        let problems = report.problem_count();
        self.store.metrics().record_warnings(problems);
        tracing::info!(
            "Game files scan finished: {} messages, {} problems",
            report.len(),
            problems
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_appends_separators_in_order() {
        let mut report = Report::new();
        report.push(DiagnosticMessage::success("first"));
        report.extend(vec![
            DiagnosticMessage::caution("second"),
            DiagnosticMessage::info("third"),
        ]);

        assert_eq!(
            report.render(),
            "✔️ first\n-----\n❌ CAUTION : second\n-----\nthird\n-----\n"
        );
        assert_eq!(report.problem_count(), 1);
        assert_eq!(report.len(), 3);
    }

    #[test]
    fn test_empty_report_renders_empty() {
        assert_eq!(Report::new().render(), "");
        assert!(Report::new().is_empty());
    }
}
