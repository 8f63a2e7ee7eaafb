use kuchikiki::NodeRef;

use crate::blocks::Pattern;
use crate::dom::{self, Document};
use crate::error::TransformError;
use crate::table::{BlockKind, CellValue, TableMatrix};

const BRAND: &str = ".navbar-brand";
const FORM: &str = "form";

/// Single row `[branding markup, login form]`.
///
/// The branding element is a precondition of this pattern: without it the
/// fragment is rejected and left in place. The form is handed over as the
/// live node, not a copy, and ends up inside the table once it is built.
pub fn extract(fragment: &NodeRef, _doc: &Document) -> Result<TableMatrix, TransformError> {
    let brand = dom::query_first(fragment, BRAND)?.ok_or(TransformError::MissingRequired {
        pattern: Pattern::BrandForm,
        selector: BRAND,
    })?;
    let form = dom::query_first(fragment, FORM)?.map(|form| dom::move_reference(&form));

    Ok(TableMatrix::with_rows(
        BlockKind::Columns,
        [vec![CellValue::Markup(dom::inner_html(&brand)), form.into()]],
    ))
}
