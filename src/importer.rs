use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::blocks::{self, Pattern};
use crate::dom::{self, Document};
use crate::settings::{Rule, Settings};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FragmentStatus {
    /// Replaced by a table with this many rows, header included.
    Converted { rows: usize },
    /// No longer in the document when its turn came (an earlier fragment
    /// contained it).
    Skipped,
    /// Left in place.
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FragmentReport {
    pub rule: usize,
    pub selector: String,
    pub pattern: Pattern,
    #[serde(flatten)]
    pub status: FragmentStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub fragments: Vec<FragmentReport>,
}

impl ImportReport {
    pub fn converted(&self) -> usize {
        self.count(|s| matches!(s, FragmentStatus::Converted { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, FragmentStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FragmentStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&FragmentStatus) -> bool) -> usize {
        self.fragments.iter().filter(|f| pred(&f.status)).count()
    }
}

pub struct ImportOutcome {
    pub html: String,
    pub report: ImportReport,
}

/// Parse a page, run the configured rules over it and serialize the result.
pub fn import_html(html: &str, settings: &Settings) -> Result<ImportOutcome> {
    let doc = Document::parse(html).with_base_url(settings.parsed_base_url()?);
    let report = import_document(&doc, &settings.rules, settings.continue_on_error)?;
    Ok(ImportOutcome {
        html: doc.to_html(),
        report,
    })
}

/// Convert every fragment matched by `rules`, in rule order then document
/// order. All fragments are located before the first replacement.
pub fn import_document(doc: &Document, rules: &[Rule], continue_on_error: bool) -> Result<ImportReport> {
    let mut found = Vec::new();
    for (index, rule) in rules.iter().enumerate() {
        let fragments = dom::query_all(doc.root(), &rule.selector)
            .with_context(|| format!("rule {} ({})", index, rule.pattern))?;
        debug!(rule = index, selector = %rule.selector, count = fragments.len(), "matched fragments");
        found.extend(fragments.into_iter().map(|fragment| (index, rule, fragment)));
    }

    let mut report = ImportReport::default();
    for (index, rule, fragment) in found {
        let status = if !doc.contains(&fragment) {
            debug!(rule = index, selector = %rule.selector, "fragment already replaced, skipping");
            FragmentStatus::Skipped
        } else {
            match blocks::apply(rule.pattern, &fragment, doc) {
                Ok(table) => FragmentStatus::Converted {
                    rows: table.children().count(),
                },
                Err(e) if continue_on_error => {
                    warn!(rule = index, selector = %rule.selector, pattern = %rule.pattern, "fragment left as-is: {}", e);
                    FragmentStatus::Failed { error: e.to_string() }
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("rule {} `{}` ({})", index, rule.selector, rule.pattern)
                    })
                }
            }
        };
        report.fragments.push(FragmentReport {
            rule: index,
            selector: rule.selector.clone(),
            pattern: rule.pattern,
            status,
        });
    }

    info!(
        converted = report.converted(),
        skipped = report.skipped(),
        failed = report.failed(),
        "page imported"
    );
    Ok(report)
}
