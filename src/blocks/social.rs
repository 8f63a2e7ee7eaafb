use kuchikiki::NodeRef;

use crate::dom::{self, Document};
use crate::error::TransformError;
use crate::table::{BlockKind, CellValue, TableMatrix};

const LINK: &str = ".nav-item a";

/// One `[href]` row per nav link, in document order. The raw attribute is
/// kept (relative targets such as `#why` stay relative); links without an
/// `href`, or with an empty one, are dropped.
pub fn extract(fragment: &NodeRef, _doc: &Document) -> Result<TableMatrix, TransformError> {
    let rows = dom::query_all(fragment, LINK)?
        .into_iter()
        .filter_map(|link| dom::attr(&link, "href"))
        .filter(|href| !href.is_empty())
        .map(|href| vec![CellValue::Text(href)]);

    Ok(TableMatrix::with_rows(BlockKind::Embed, rows))
}
