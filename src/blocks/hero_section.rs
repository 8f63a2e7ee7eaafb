use kuchikiki::NodeRef;

use crate::blocks::{link_element, text_element};
use crate::dom::{self, Document};
use crate::error::TransformError;
use crate::table::{BlockKind, CellValue, Row, TableMatrix};

const TITLE: &str = "h2.section-heading";
const SUBTITLE: &str = "h3.section-subheading";
const LINK_GROUP: &str = "h5.text-smaller";
const RICH_TEXT: &str = "p.text-color-wt";
const TABLE: &str = "table";

/// Always one row of five cells: `[h1, p, links div, rich text p, table text p]`.
/// Missing sources produce empty elements so the row shape never changes.
pub fn extract(fragment: &NodeRef, doc: &Document) -> Result<TableMatrix, TransformError> {
    let title = text_element(doc, "h1", dom::query_first(fragment, TITLE)?.as_ref());
    let subtitle = text_element(doc, "p", dom::query_first(fragment, SUBTITLE)?.as_ref());

    let links = doc.create_element("div");
    if let Some(group) = dom::query_first(fragment, LINK_GROUP)? {
        for link in dom::query_all(&group, "a")? {
            links.append(link_element(doc, &link));
            links.append(doc.create_text(" "));
        }
    }

    let rich_text = doc.create_element("p");
    if let Some(source) = dom::query_first(fragment, RICH_TEXT)? {
        let markup = dom::inner_html(&source);
        for node in doc.parse_fragment("p", dom::trim_text(&markup)) {
            rich_text.append(node);
        }
    }

    // Only the flattened text of an embedded table survives.
    let table_text = text_element(doc, "p", dom::query_first(fragment, TABLE)?.as_ref());

    let row: Row = [title, subtitle, links, rich_text, table_text]
        .into_iter()
        .map(CellValue::Node)
        .collect();

    Ok(TableMatrix::with_rows(BlockKind::Hero, [row]))
}
