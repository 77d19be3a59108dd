//! Native PDF backend built on `lopdf`
//!
//! The workload is flattened to text lines (via Markdown conversion) and laid
//! out top to bottom on A4 pages in Helvetica. There is no CSS support; this
//! backend measures the cost of the cheapest possible PDF pipeline.

use crate::adapter::RenderBackend;
use crate::adapters::markdown::workload_to_markdown;
use crate::adapters::run_blocking;
use crate::workload::Workload;
use crate::{Error, Result};
use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::path::Path;

const NAME: &str = "lopdf";

// A4 in points
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const FONT_SIZE: i64 = 11;
const LEADING: i64 = 14;
const MAX_LINE_CHARS: usize = 90;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

/// PDF backend using lopdf directly
pub struct LopdfAdapter;

impl LopdfAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LopdfAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Split text into lines no longer than `width` characters, breaking at spaces
fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for raw in text.lines() {
        let mut current = String::new();

        for word in raw.split_whitespace() {
            if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }

        lines.push(current);
    }

    lines
}

/// Standard Type1 fonts only cover Latin-1; anything else is replaced
fn pdf_text(line: &str) -> Vec<u8> {
    line.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'?' })
        .collect()
}

fn build_document(lines: &[String]) -> std::result::Result<Document, lopdf::Error> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let blank = [String::new()];
    let lines = if lines.is_empty() { &blank[..] } else { lines };

    let mut kids: Vec<Object> = Vec::new();
    for page_lines in lines.chunks(LINES_PER_PAGE) {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
            Operation::new("TL", vec![LEADING.into()]),
            Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN).into()]),
        ];
        for line in page_lines {
            operations.push(Operation::new("Tj", vec![Object::string_literal(pdf_text(line))]));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    Ok(doc)
}

#[async_trait]
impl RenderBackend for LopdfAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> String {
        "lopdf 0.38".to_string()
    }

    async fn render(&self, workload: &Workload, destination: &Path) -> Result<()> {
        let workload = workload.clone();
        let destination = destination.to_path_buf();

        run_blocking(NAME, move || {
            let text = workload_to_markdown(NAME, &workload)?;
            let lines = wrap_lines(&text, MAX_LINE_CHARS);

            let mut doc = build_document(&lines).map_err(|e| Error::render(NAME, e))?;
            doc.save(&destination).map_err(|e| Error::render(NAME, e))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::task::{Context, Poll, Waker};
    use tempfile::TempDir;

    #[test]
    fn test_wrap_lines_respects_width() {
        let lines = wrap_lines("one two three four five six", 9);
        assert_eq!(lines, vec!["one two", "three", "four five", "six"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 9));
    }

    #[test]
    fn test_wrap_lines_keeps_blank_lines() {
        let lines = wrap_lines("a\n\nb", 10);
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn test_pdf_text_replaces_non_ascii() {
        assert_eq!(pdf_text("naïve"), b"na?ve".to_vec());
    }

    #[test]
    fn test_long_text_spans_pages() {
        let lines: Vec<String> = (0..LINES_PER_PAGE * 2 + 1).map(|i| format!("line {i}")).collect();
        let doc = build_document(&lines).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[tokio::test]
    async fn test_render_writes_pdf() {
        let temp = TempDir::new().unwrap();
        let destination = temp.path().join("render_1.pdf");

        LopdfAdapter::new().render(&Workload::sample(), &destination).await.unwrap();

        let bytes = std::fs::read(&destination).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
    }

    #[tokio::test]
    async fn test_render_yields_to_the_runtime() {
        let temp = TempDir::new().unwrap();
        let destination = temp.path().join("render_1.pdf");
        let adapter = LopdfAdapter::new();
        let workload = Workload::new("large", Workload::sample().markup().repeat(50));

        let mut render = adapter.render(&workload, &destination);
        let mut cx = Context::from_waker(Waker::noop());
        assert!(matches!(render.as_mut().poll(&mut cx), Poll::Pending));

        render.await.unwrap();
        assert!(destination.exists());
    }
}
