pub mod columns;
pub mod hero_media;
pub mod hero_section;
pub mod navbar;
pub mod social;

use std::fmt;
use std::str::FromStr;

use kuchikiki::NodeRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::{self, Document};
use crate::error::TransformError;
use crate::table::{BlockKind, DomTableBuilder, TableBuilder, TableMatrix};

/// Visual patterns recognized on legacy pages, one transform each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pattern {
    /// Service grid: icon + heading per column.
    FeatureColumns,
    /// Navbar with branding text and a login form.
    BrandForm,
    /// Navigation list reduced to its link targets.
    SocialLinks,
    /// Full-bleed header with background image, intro text and one CTA.
    HeroMedia,
    /// Section header with heading, subheading, CTA links, rich text and a table.
    HeroSection,
}

impl Pattern {
    pub const ALL: [Pattern; 5] = [
        Pattern::FeatureColumns,
        Pattern::BrandForm,
        Pattern::SocialLinks,
        Pattern::HeroMedia,
        Pattern::HeroSection,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pattern::FeatureColumns => "feature-columns",
            Pattern::BrandForm => "brand-form",
            Pattern::SocialLinks => "social-links",
            Pattern::HeroMedia => "hero-media",
            Pattern::HeroSection => "hero-section",
        }
    }

    pub fn kind(self) -> BlockKind {
        match self {
            Pattern::FeatureColumns | Pattern::BrandForm => BlockKind::Columns,
            Pattern::SocialLinks => BlockKind::Embed,
            Pattern::HeroMedia | Pattern::HeroSection => BlockKind::Hero,
        }
    }

    /// Where this pattern usually lives on a Bootstrap "agency" style page.
    pub fn default_selector(self) -> &'static str {
        match self {
            Pattern::FeatureColumns => "#services",
            Pattern::BrandForm => "nav.navbar",
            Pattern::SocialLinks => "ul.navbar-nav",
            Pattern::HeroMedia => "header.masthead",
            Pattern::HeroSection => "section.hero",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Pattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Pattern::ALL.iter().map(|p| p.name()).collect();
                format!("unknown pattern `{}` (expected one of: {})", s, known.join(", "))
            })
    }
}

/// Read `fragment` into a matrix without touching the document.
pub fn extract(
    pattern: Pattern,
    fragment: &NodeRef,
    doc: &Document,
) -> Result<TableMatrix, TransformError> {
    match pattern {
        Pattern::FeatureColumns => columns::extract(fragment, doc),
        Pattern::BrandForm => navbar::extract(fragment, doc),
        Pattern::SocialLinks => social::extract(fragment, doc),
        Pattern::HeroMedia => hero_media::extract(fragment, doc),
        Pattern::HeroSection => hero_section::extract(fragment, doc),
    }
}

/// Extract, build with the default builder and swap the table in for `fragment`.
pub fn apply(pattern: Pattern, fragment: &NodeRef, doc: &Document) -> Result<NodeRef, TransformError> {
    apply_with(&DomTableBuilder, pattern, fragment, doc)
}

/// Same as [`apply`] with a caller-supplied table builder. On error the
/// document is left exactly as it was.
pub fn apply_with<B: TableBuilder + ?Sized>(
    builder: &B,
    pattern: Pattern,
    fragment: &NodeRef,
    doc: &Document,
) -> Result<NodeRef, TransformError> {
    if fragment.parent().is_none() {
        return Err(TransformError::Detached(pattern));
    }
    let matrix = extract(pattern, fragment, doc)?;
    debug!(
        pattern = %pattern,
        header = matrix.kind().header(),
        rows = matrix.row_count(),
        "built block matrix"
    );
    let table = builder.build(matrix.into_rows(), doc)?;
    dom::replace_with(fragment, &table);
    Ok(table)
}

// ── Shared cell synthesis ──

/// `<tag>` holding only the trimmed text of `source`, empty when absent.
fn text_element(doc: &Document, tag: &str, source: Option<&NodeRef>) -> NodeRef {
    let text = source.map(dom::text_of).unwrap_or_default();
    dom::synthesize(doc, tag, &[], &text)
}

/// `<a>` carrying only the resolved `href` and the trimmed text of `source`.
fn link_element(doc: &Document, source: &NodeRef) -> NodeRef {
    let href = doc.resolve_url(&dom::attr(source, "href").unwrap_or_default());
    dom::synthesize(doc, "a", &[("href", href.as_str())], &dom::text_of(source))
}
