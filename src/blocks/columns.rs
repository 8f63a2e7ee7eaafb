use kuchikiki::NodeRef;

use crate::dom::{self, Document};
use crate::error::TransformError;
use crate::table::{BlockKind, CellValue, TableMatrix};

/// Column markers differ between page templates.
const COLUMN: &str = ".col-md-4, .col-md-6";
const ICON: &str = ".fa-stack";
const HEADING: &str = ".service-heading";

/// One row per column: `[icon, heading]`. A column without an icon keeps its
/// slot as an empty text node so every row stays two cells wide.
pub fn extract(fragment: &NodeRef, doc: &Document) -> Result<TableMatrix, TransformError> {
    let mut matrix = TableMatrix::new(BlockKind::Columns);

    for column in dom::query_all(fragment, COLUMN)? {
        let icon = dom::query_first(&column, ICON)?
            .map(|icon| dom::clone_detached(&icon))
            .unwrap_or_else(|| doc.create_text(""));
        let heading = dom::query_first(&column, HEADING)?
            .map(|heading| dom::text_of(&heading))
            .unwrap_or_default();

        matrix.push_row(vec![CellValue::Node(icon), CellValue::Text(heading)]);
    }

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellSnapshot;

    fn run(html: &str) -> TableMatrix {
        let doc = Document::parse(html);
        let fragment = dom::query_first(doc.root(), "section").unwrap().unwrap();
        extract(&fragment, &doc).unwrap()
    }

    #[test]
    fn one_row_per_column() {
        let matrix = run(r#"
            <section id="services"><div class="row">
              <div class="col-md-4"><span class="fa-stack fa-4x"><i class="fa fa-circle"></i></span>
                <h4 class="service-heading"> E-Commerce </h4></div>
              <div class="col-md-4"><span class="fa-stack"><i class="fa fa-laptop"></i></span>
                <h4 class="service-heading">Responsive Design</h4></div>
              <div class="col-md-6"><h4 class="service-heading">Web Security</h4></div>
            </div></section>"#);

        assert_eq!(matrix.row_count(), 4);
        assert_eq!(matrix.kind().header(), "Columns");
        let snapshot = matrix.snapshot();
        assert_eq!(
            snapshot.rows[0],
            [
                CellSnapshot::Node {
                    html: r#"<span class="fa-stack fa-4x"><i class="fa fa-circle"></i></span>"#.into()
                },
                CellSnapshot::Text { text: "E-Commerce".into() },
            ]
        );
        assert_eq!(snapshot.rows[1][1], CellSnapshot::Text { text: "Responsive Design".into() });
    }

    #[test]
    fn missing_icon_keeps_empty_slot() {
        let matrix = run(r#"<section><div class="col-md-6"><h4 class="service-heading">Web Security</h4></div></section>"#);
        let row = &matrix.data_rows()[0];
        assert_eq!(row.len(), 2);
        match &row[0] {
            CellValue::Node(node) => {
                assert_eq!(node.as_text().map(|t| t.borrow().clone()), Some(String::new()));
            }
            other => panic!("expected empty text node, got {other:?}"),
        }
    }

    #[test]
    fn missing_heading_is_empty_text() {
        let matrix = run(r#"<section><div class="col-md-4"><span class="fa-stack"></span></div></section>"#);
        assert_eq!(matrix.snapshot().rows[0][1], CellSnapshot::Text { text: String::new() });
    }

    #[test]
    fn icon_is_a_detached_copy() {
        let doc = Document::parse(r#"<section><div class="col-md-4"><span class="fa-stack"><i></i></span></div></section>"#);
        let fragment = dom::query_first(doc.root(), "section").unwrap().unwrap();
        let matrix = extract(&fragment, &doc).unwrap();
        let original = dom::query_first(&fragment, ".fa-stack").unwrap().unwrap();

        let CellValue::Node(icon) = &matrix.data_rows()[0][0] else {
            panic!("icon cell should hold a node");
        };
        assert_ne!(icon, &original);
        assert!(icon.parent().is_none());
        original.detach();
        assert_eq!(icon.to_string(), r#"<span class="fa-stack"><i></i></span>"#);
    }

    #[test]
    fn no_columns_header_only() {
        let matrix = run("<section><p>nothing here</p></section>");
        assert_eq!(matrix.row_count(), 1);
        assert!(matrix.data_rows().is_empty());
    }

    #[test]
    fn agency_fixture() {
        let html = std::fs::read_to_string("tests/fixtures/agency.html").unwrap();
        let doc = Document::parse(&html);
        let services = dom::query_first(doc.root(), "#services").unwrap().unwrap();
        let matrix = extract(&services, &doc).unwrap();
        let headings: Vec<CellSnapshot> = matrix.snapshot().rows.into_iter().map(|r| r[1].clone()).collect();
        assert_eq!(
            headings,
            ["E-Commerce", "Responsive Design", "Web Security"]
                .map(|t| CellSnapshot::Text { text: t.into() })
        );
    }
}
