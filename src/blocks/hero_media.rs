use kuchikiki::NodeRef;

use crate::blocks::{link_element, text_element};
use crate::dom::{self, Document};
use crate::error::TransformError;
use crate::table::{BlockKind, CellValue, Row, TableMatrix};

const IMAGE: &str = "img";
const HEADING: &str = ".intro-heading";
const LEAD: &str = ".intro-lead-in";
const CTA: &str = "a";

/// Single row of whatever is present out of `[image, h1, p, a]`, in that
/// order. Absent slots are skipped, not left blank, so the row can be
/// anywhere from zero to four cells wide.
pub fn extract(fragment: &NodeRef, doc: &Document) -> Result<TableMatrix, TransformError> {
    let image = dom::query_first(fragment, IMAGE)?.map(|img| image_element(doc, &img));
    let heading = dom::query_first(fragment, HEADING)?.map(|h| text_element(doc, "h1", Some(&h)));
    let lead = dom::query_first(fragment, LEAD)?.map(|p| text_element(doc, "p", Some(&p)));
    let cta = dom::query_first(fragment, CTA)?.map(|a| link_element(doc, &a));

    let row: Row = [image, heading, lead, cta]
        .into_iter()
        .flatten()
        .map(CellValue::Node)
        .collect();

    Ok(TableMatrix::with_rows(BlockKind::Hero, [row]))
}

/// Fresh `<img>` with only `src` and `alt`, dropping inline styling and the rest.
fn image_element(doc: &Document, source: &NodeRef) -> NodeRef {
    let src = doc.resolve_url(&dom::attr(source, "src").unwrap_or_default());
    let alt = dom::attr(source, "alt").unwrap_or_default();
    dom::synthesize(doc, "img", &[("src", src.as_str()), ("alt", alt.as_str())], "")
}
