//! Assembles the standardised position-description PDF.
//!
//! The template is fixed: title, About Organization, Position Summary,
//! optional Expectations & Outcomes and Position Scope sections, the
//! Activities & Deliverables table, and the workplan radar chart embedded on
//! the final page. There is no conditional logic beyond field substitution.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use printpdf::*;
use tracing::info;

use crate::chart::ChartResult;
use crate::error::PipelineError;
use crate::position::Position;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_LEFT_MM: f32 = 20.0;
const TOP_CURSOR_MM: f32 = 272.0;
const LINE_HEIGHT_PT: f32 = 14.0;
const LINES_PER_PAGE: usize = 46;
const BODY_WRAP_COLUMNS: usize = 95;

/// A single laid-out text line with its font and size.
struct TextLine {
    text: String,
    font: BuiltinFont,
    size: f32,
}

impl TextLine {
    fn heading(text: impl Into<String>) -> Self {
        TextLine {
            text: text.into(),
            font: BuiltinFont::HelveticaBold,
            size: 12.5,
        }
    }

    fn body(text: impl Into<String>) -> Self {
        TextLine {
            text: text.into(),
            font: BuiltinFont::Helvetica,
            size: 10.5,
        }
    }

    fn blank() -> Self {
        TextLine::body("")
    }
}

/// Fills the fixed template with the position fields and the chart image and
/// writes the PDF to `output_dir`, creating the directory if absent. Returns
/// the path of the generated document.
pub fn assemble(
    position: &Position,
    chart: &ChartResult,
    output_dir: &Path,
) -> Result<PathBuf, PipelineError> {
    let image_bytes = fs::read(&chart.image_path).map_err(|e| {
        PipelineError::Template(format!(
            "failed to read chart image {}: {e}",
            chart.image_path.display()
        ))
    })?;
    let image = RawImage::decode_from_bytes(&image_bytes, &mut Vec::new())
        .map_err(|e| PipelineError::Template(format!("failed to decode chart image: {e}")))?;

    let mut doc = PdfDocument::new(&position.title);
    let image_id = doc.add_image(&image);

    let lines = layout_lines(position);
    let mut pages: Vec<PdfPage> = lines
        .chunks(LINES_PER_PAGE)
        .map(|chunk| PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), text_ops(chunk)))
        .collect();
    pages.push(chart_page(&image_id, &chart.url));

    let pdf_bytes = doc
        .with_pages(pages)
        .save(&PdfSaveOptions::default(), &mut Vec::new());

    fs::create_dir_all(output_dir)?;
    let timestamp = Local::now().format("%Y-%m-%d");
    let document_path = output_dir.join(format!("{} {}.pdf", position.title, timestamp));
    fs::write(&document_path, &pdf_bytes)?;

    info!(
        document_path = %document_path.display(),
        size = pdf_bytes.len(),
        "Assembled position description document"
    );

    Ok(document_path)
}

/// Lays out the template as a flat list of lines, in template order.
fn layout_lines(position: &Position) -> Vec<TextLine> {
    let mut lines = Vec::new();

    lines.push(TextLine {
        text: format!("Position Title: {}", position.title),
        font: BuiltinFont::HelveticaBold,
        size: 16.0,
    });
    lines.push(TextLine::body(format!("Division: {}", position.division)));
    lines.push(TextLine::blank());

    section(&mut lines, "About Organization", &position.about_org);
    section(&mut lines, "Position Summary", &position.summary);
    if let Some(expectations) = &position.expectations {
        section(&mut lines, "Professional Outcomes & Expectations", expectations);
    }
    if let Some(scope) = &position.scope {
        section(&mut lines, "Position Scope", scope);
    }

    lines.push(TextLine::heading("Activities & Deliverables"));
    for activity in &position.activities {
        for wrapped in wrap(
            &format!(
                "{} - {} ({}% of time)",
                activity.name, activity.deliverable, activity.allocation
            ),
            BODY_WRAP_COLUMNS,
        ) {
            lines.push(TextLine::body(wrapped));
        }
    }
    lines.push(TextLine::blank());

    lines
}

fn section(lines: &mut Vec<TextLine>, heading: &str, body: &str) {
    lines.push(TextLine::heading(heading));
    for paragraph in body.lines() {
        if paragraph.trim().is_empty() {
            lines.push(TextLine::blank());
            continue;
        }
        for wrapped in wrap(paragraph.trim(), BODY_WRAP_COLUMNS) {
            lines.push(TextLine::body(wrapped));
        }
    }
    lines.push(TextLine::blank());
}

/// Page content ops for one page worth of lines.
fn text_ops(lines: &[TextLine]) -> Vec<Op> {
    let mut ops = vec![
        Op::StartTextSection,
        Op::SetLineHeight {
            lh: Pt(LINE_HEIGHT_PT),
        },
        Op::SetTextCursor {
            pos: Point {
                x: Mm(MARGIN_LEFT_MM).into_pt(),
                y: Mm(TOP_CURSOR_MM).into_pt(),
            },
        },
    ];
    for line in lines {
        if !line.text.is_empty() {
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(line.size),
                font: line.font.clone(),
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(line.text.clone())],
                font: line.font.clone(),
            });
        }
        ops.push(Op::AddLineBreak);
    }
    ops.push(Op::EndTextSection);
    ops
}

/// Final page: the radar chart image with its shareable URL underneath.
fn chart_page(image_id: &XObjectId, chart_url: &str) -> PdfPage {
    let ops = vec![
        Op::UseXobject {
            id: image_id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Mm(35.0).into_pt()),
                translate_y: Some(Mm(130.0).into_pt()),
                rotate: None,
                scale_x: None,
                scale_y: None,
                dpi: Some(96.0),
            },
        },
        Op::StartTextSection,
        Op::SetLineHeight {
            lh: Pt(LINE_HEIGHT_PT),
        },
        Op::SetTextCursor {
            pos: Point {
                x: Mm(35.0).into_pt(),
                y: Mm(120.0).into_pt(),
            },
        },
        Op::SetFontSizeBuiltinFont {
            size: Pt(10.5),
            font: BuiltinFont::HelveticaOblique,
        },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text("Workplan time allocation by task area".to_string())],
            font: BuiltinFont::HelveticaOblique,
        },
        Op::AddLineBreak,
        Op::SetFontSizeBuiltinFont {
            size: Pt(9.0),
            font: BuiltinFont::Helvetica,
        },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(format!("Interactive chart: {chart_url}"))],
            font: BuiltinFont::Helvetica,
        },
        Op::EndTextSection,
    ];
    PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops)
}

/// Greedy word wrap at a column budget; never splits inside a word.
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > columns {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Activity;
    use tempfile::tempdir;

    // Smallest well-formed PNG: 1x1 transparent pixel.
    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
        0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
        0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    fn sample_position() -> Position {
        Position {
            title: "Grants Analyst".to_string(),
            division: "bpio".to_string(),
            about_org: "The agency manages assets for the city.".to_string(),
            summary: "Analyse grant performance.".to_string(),
            expectations: Some("Deliver defensible numbers.".to_string()),
            scope: None,
            activities: vec![Activity {
                name: "Reporting".to_string(),
                deliverable: "Quarterly grant reports".to_string(),
                allocation: 100,
            }],
        }
    }

    #[test]
    fn wrap_respects_column_budget() {
        let wrapped = wrap("one two three four five six seven", 12);
        assert!(wrapped.len() > 1);
        for line in &wrapped {
            assert!(line.len() <= 12, "line too long: {line:?}");
        }
        assert_eq!(wrapped.join(" "), "one two three four five six seven");
    }

    #[test]
    fn layout_contains_every_text_field_verbatim() {
        let position = sample_position();
        let lines = layout_lines(&position);
        let text: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        let joined = text.join("\n");

        assert!(joined.contains("Grants Analyst"));
        assert!(joined.contains(&position.about_org));
        assert!(joined.contains(&position.summary));
        assert!(joined.contains("Deliver defensible numbers."));
        assert!(joined.contains("Quarterly grant reports"));
    }

    #[test]
    fn assemble_writes_a_pdf_with_magic_header() {
        let dir = tempdir().unwrap();
        let image_path = dir.path().join("chart.png");
        fs::write(&image_path, PNG_1X1).unwrap();

        let chart = ChartResult {
            url: "https://quickchart.io/chart/render/zf-abc".to_string(),
            image_path,
        };
        let out_dir = dir.path().join("documents");

        let document_path = assemble(&sample_position(), &chart, &out_dir)
            .expect("document assembly should succeed");

        let bytes = fs::read(&document_path).unwrap();
        assert!(bytes.len() > 100, "PDF suspiciously small");
        assert_eq!(&bytes[0..4], b"%PDF", "missing PDF magic header");
    }

    #[test]
    fn assemble_fails_with_template_error_when_image_missing() {
        let dir = tempdir().unwrap();
        let chart = ChartResult {
            url: "https://quickchart.io/chart/render/zf-abc".to_string(),
            image_path: dir.path().join("does-not-exist.png"),
        };

        let err = assemble(&sample_position(), &chart, dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Template(_)));
    }
}
