use kuchikiki::NodeRef;
use serde::Serialize;

use crate::dom::{self, Document};
use crate::error::TableError;

/// One matrix position.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Plain text, rendered as an escaped text node. Angle brackets in the
    /// string show up literally; use `Markup` for HTML.
    Text(String),
    /// Raw inner HTML, parsed into the cell when rendered.
    Markup(String),
    /// A cloned, synthesized or forwarded node, appended as-is.
    Node(NodeRef),
    /// Nothing to put here; renders as an empty cell.
    Empty,
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        CellValue::Text(text.to_string())
    }
}

impl From<String> for CellValue {
    fn from(text: String) -> Self {
        CellValue::Text(text)
    }
}

impl From<NodeRef> for CellValue {
    fn from(node: NodeRef) -> Self {
        CellValue::Node(node)
    }
}

impl From<Option<NodeRef>> for CellValue {
    fn from(node: Option<NodeRef>) -> Self {
        node.map_or(CellValue::Empty, CellValue::Node)
    }
}

impl CellValue {
    pub fn snapshot(&self) -> CellSnapshot {
        match self {
            CellValue::Text(text) => CellSnapshot::Text { text: text.clone() },
            CellValue::Markup(html) => CellSnapshot::Markup { html: html.clone() },
            CellValue::Node(node) => CellSnapshot::Node {
                html: node.to_string(),
            },
            CellValue::Empty => CellSnapshot::Empty,
        }
    }
}

pub type Row = Vec<CellValue>;

/// Block types the downstream content system knows, named by their header cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    Columns,
    Embed,
    Hero,
}

impl BlockKind {
    pub fn header(self) -> &'static str {
        match self {
            BlockKind::Columns => "Columns",
            BlockKind::Embed => "Embed",
            BlockKind::Hero => "Hero",
        }
    }
}

/// Header row plus data rows. The header is derived from the block kind, so
/// it always has exactly one cell.
#[derive(Debug, Clone)]
pub struct TableMatrix {
    kind: BlockKind,
    rows: Vec<Row>,
}

impl TableMatrix {
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(kind: BlockKind, rows: impl IntoIterator<Item = Row>) -> Self {
        Self {
            kind,
            rows: rows.into_iter().collect(),
        }
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn data_rows(&self) -> &[Row] {
        &self.rows
    }

    /// Total rows including the header.
    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }

    /// Rows in builder order, header first.
    pub fn into_rows(self) -> Vec<Row> {
        let mut rows = Vec::with_capacity(self.rows.len() + 1);
        rows.push(vec![CellValue::from(self.kind.header())]);
        rows.extend(self.rows);
        rows
    }

    pub fn snapshot(&self) -> MatrixSnapshot {
        MatrixSnapshot {
            header: self.kind.header().to_string(),
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(CellValue::snapshot).collect())
                .collect(),
        }
    }
}

/// Serializable view of a matrix, reduced to text and markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixSnapshot {
    pub header: String,
    pub rows: Vec<Vec<CellSnapshot>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellSnapshot {
    Text { text: String },
    Markup { html: String },
    Node { html: String },
    Empty,
}

/// Lays a matrix out as DOM table markup.
pub trait TableBuilder {
    fn build(&self, rows: Vec<Row>, doc: &Document) -> Result<NodeRef, TableError>;
}

/// `<table>` with one `<tr>` per row: `<th>` cells for the header row, `<td>`
/// for the rest. The header cell spans the widest data row.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomTableBuilder;

impl TableBuilder for DomTableBuilder {
    fn build(&self, rows: Vec<Row>, doc: &Document) -> Result<NodeRef, TableError> {
        // Shape is checked before any cell node moves.
        let header = rows.first().ok_or(TableError::Empty)?;
        if header.len() != 1 {
            return Err(TableError::HeaderWidth(header.len()));
        }
        let width = rows.iter().skip(1).map(Vec::len).max().unwrap_or(1);

        let table = doc.create_element("table");
        for (index, row) in rows.into_iter().enumerate() {
            let tr = doc.create_element("tr");
            for cell in row {
                let td = if index == 0 {
                    header_cell(doc, width)
                } else {
                    doc.create_element("td")
                };
                render_cell(doc, &td, cell);
                tr.append(td);
            }
            table.append(tr);
        }
        Ok(table)
    }
}

fn header_cell(doc: &Document, width: usize) -> NodeRef {
    if width > 1 {
        let colspan = width.to_string();
        dom::synthesize(doc, "th", &[("colspan", colspan.as_str())], "")
    } else {
        doc.create_element("th")
    }
}

fn render_cell(doc: &Document, target: &NodeRef, cell: CellValue) {
    match cell {
        CellValue::Text(text) => {
            if !text.is_empty() {
                target.append(doc.create_text(&text));
            }
        }
        CellValue::Markup(html) => {
            for node in doc.parse_fragment("td", &html) {
                target.append(node);
            }
        }
        CellValue::Node(node) => target.append(node),
        CellValue::Empty => {}
    }
}
