use super::ExtractedContent;
use crate::error::{AidaError, Result};
use crate::models::FileType;

/// Paragraphs per estimated page. DOCX carries no pagination without a renderer.
const PARAGRAPHS_PER_PAGE: usize = 30;

pub struct DocxExtractor;

impl DocxExtractor {
    /// Body paragraphs in document order, then every table cell in
    /// row-major order, table by table. One line each.
    pub fn extract(bytes: &[u8]) -> Result<ExtractedContent> {
        let docx = docx_rs::read_docx(bytes)
            .map_err(|e| AidaError::Processing(format!("DOCX parse error: {e}")))?;

        let mut lines: Vec<String> = Vec::new();
        let mut tables: Vec<&docx_rs::Table> = Vec::new();
        let mut paragraph_count = 0usize;

        for child in &docx.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(paragraph) => {
                    paragraph_count += 1;
                    lines.push(Self::paragraph_text(paragraph));
                }
                docx_rs::DocumentChild::Table(table) => tables.push(table),
                _ => {}
            }
        }

        for table in tables {
            lines.extend(Self::table_cells(table));
        }

        Ok(ExtractedContent {
            text: lines.join("\n").trim().to_string(),
            page_count: Self::estimate_pages(paragraph_count),
            file_type: FileType::Docx,
        })
    }

    pub fn estimate_pages(paragraph_count: usize) -> u32 {
        (paragraph_count / PARAGRAPHS_PER_PAGE).max(1) as u32
    }

    fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
        let mut content = String::new();
        for para_child in &paragraph.children {
            if let docx_rs::ParagraphChild::Run(run) = para_child {
                for run_child in &run.children {
                    if let docx_rs::RunChild::Text(text) = run_child {
                        content.push_str(&text.text);
                    }
                }
            }
        }
        content
    }

    fn table_cells(table: &docx_rs::Table) -> Vec<String> {
        let mut cells = Vec::new();

        for table_child in &table.rows {
            let docx_rs::TableChild::TableRow(row) = table_child;
            for row_child in &row.cells {
                let docx_rs::TableRowChild::TableCell(cell) = row_child;
                let cell_text = cell
                    .children
                    .iter()
                    .filter_map(|content| match content {
                        docx_rs::TableCellContent::Paragraph(para) => {
                            Some(Self::paragraph_text(para))
                        }
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                cells.push(cell_text);
            }
        }

        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_estimate() {
        assert_eq!(DocxExtractor::estimate_pages(0), 1);
        assert_eq!(DocxExtractor::estimate_pages(29), 1);
        assert_eq!(DocxExtractor::estimate_pages(60), 2);
        assert_eq!(DocxExtractor::estimate_pages(95), 3);
    }

    #[test]
    fn test_invalid_bytes_are_rejected() {
        let result = DocxExtractor::extract(b"not a zip archive");
        assert!(matches!(result, Err(AidaError::Processing(_))));
    }
}
