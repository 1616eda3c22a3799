//! Text output formatting with tier colors.

use std::collections::HashMap;

use gindex_core::{mask_key, ApiKey, Language, ResultCache, ResultEntry, Tier};
use gindex_fetch::{BatchEvent, DomainFailure, KeyStatus, KeyVerification};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const ORANGE: &str = "\x1b[38;5;208m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

const DIVIDER_WIDTH: usize = 40;

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    // ========================================================================
    // Results
    // ========================================================================

    /// Formats the results view, optionally headed by the keys-used count.
    pub fn format_results(
        &self,
        view: &ResultCache,
        language: Language,
        keys_used: Option<usize>,
    ) -> String {
        let mut lines = Vec::new();

        if let Some(count) = keys_used {
            lines.push(format!("API keys used: {count}"));
            lines.push(String::new());
        }

        lines.push(self.bold("Domain results"));
        lines.push("─".repeat(DIVIDER_WIDTH));

        if view.is_empty() {
            lines.push(self.dim("No results yet. Run `gindex analyze` first."));
        }
        for (domain, entry) in view.sorted() {
            lines.push(self.format_entry(domain, entry, language));
        }

        lines.join("\n")
    }

    /// Formats one result line: `domain: N URLs indexed`.
    pub fn format_entry(&self, domain: &str, entry: ResultEntry, language: Language) -> String {
        let detail = match entry {
            ResultEntry::Count(n) => format!("{n} URLs indexed"),
            ResultEntry::QuotaExceeded => language.quota_exceeded_label().to_string(),
        };
        format!("{}: {detail}", self.tier_color(entry.tier(), domain))
    }

    /// Colors `text` for `tier`.
    pub fn tier_color(&self, tier: Tier, text: &str) -> String {
        match tier {
            Tier::Green => self.green(text),
            Tier::Yellow => self.yellow(text),
            Tier::Orange => self.orange(text),
            Tier::None => self.red(text),
        }
    }

    /// Formats per-domain failures.
    pub fn format_failures(&self, failures: &[DomainFailure]) -> String {
        failures
            .iter()
            .map(|f| {
                format!(
                    "{} {}: {} (recorded as 0)",
                    self.red("warning:"),
                    f.domain,
                    f.failure
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ========================================================================
    // Progress
    // ========================================================================

    /// Formats a progress event for stderr. `None` for events not shown.
    pub fn format_event(&self, event: &BatchEvent) -> Option<String> {
        match event {
            BatchEvent::Started { total } => Some(format!("Checking {total} domains...")),
            BatchEvent::Skipped { domain } => Some(self.dim(&format!("  {domain}: cached"))),
            BatchEvent::Resolved { domain, count } => {
                Some(format!("  {}: {count}", self.tier_color(Tier::for_count(*count), domain)))
            }
            BatchEvent::Failed { domain, message } => {
                Some(format!("  {}: {}", domain, self.red(&format!("failed ({message})"))))
            }
            BatchEvent::KeysRotated { from, to } => Some(self.dim(&format!(
                "  API key #{} unavailable, moving to #{}",
                from + 1,
                to + 1
            ))),
            BatchEvent::NotProcessed { domain } => {
                Some(format!("  {}: {}", domain, self.yellow("not processed")))
            }
            BatchEvent::Finished { .. } => None,
        }
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// Formats the key list with usage counters.
    pub fn format_keys(&self, keys: &[ApiKey], usage: &HashMap<ApiKey, u64>, reveal: bool) -> String {
        if keys.is_empty() {
            return self.dim("No API keys configured. Add one with `gindex keys add <KEY>`.");
        }

        let mut lines = vec![self.bold("API keys"), "─".repeat(DIVIDER_WIDTH)];
        for (i, key) in keys.iter().enumerate() {
            let shown = if reveal { key.clone() } else { mask_key(key) };
            let used = usage.get(key).copied().unwrap_or(0);
            lines.push(format!(
                "{:>2}. {}  {}",
                i + 1,
                self.cyan(&shown),
                self.dim(&format!("{used} queries"))
            ));
        }
        lines.join("\n")
    }

    /// Formats verification results.
    pub fn format_verification(&self, results: &[KeyVerification]) -> String {
        results
            .iter()
            .map(|r| {
                let status = match &r.status {
                    KeyStatus::Valid => self.green("valid"),
                    KeyStatus::Invalid => self.red("invalid"),
                    KeyStatus::QuotaExceeded(msg) => self.orange(&format!("quota exceeded ({msg})")),
                    KeyStatus::Error(msg) => self.red(&format!("error ({msg})")),
                    KeyStatus::Failure(msg) => self.red(&format!("no response ({msg})")),
                };
                format!("{:<16} {status}", mask_key(&r.key))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ========================================================================
    // Color Helpers
    // ========================================================================

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// Bold text.
    pub fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    /// Green text.
    pub fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn orange(&self, text: &str) -> String {
        self.paint(ORANGE, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}
