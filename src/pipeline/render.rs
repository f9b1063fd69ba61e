//! Report rendering: deterministic naming, line wrapping, PDF drawing,
//! and the atomic artifact write.
//!
//! The page geometry is fixed: US Letter, 72 pt margins, Helvetica 12.
//! The title sits at y=750 pt, the date line at y=730 pt, and the analysis
//! text flows downward from y=710 pt. Text that would run past the bottom
//! margin continues on additional pages starting at y=720 pt.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::output::ReportArtifact;
use chrono::Utc;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::path::PathBuf;
use tracing::{debug, info};

// US Letter in points.
const PAGE_WIDTH_PT: f32 = 612.0;
const PAGE_HEIGHT_PT: f32 = 792.0;

const MARGIN_PT: f32 = 72.0;
const TITLE_Y_PT: f32 = 750.0;
const DATE_Y_PT: f32 = 730.0;
const BODY_START_Y_PT: f32 = 710.0;
const CONTINUATION_START_Y_PT: f32 = 720.0;

const FONT_SIZE_PT: f32 = 12.0;
const LINE_LEADING_PT: f32 = 14.4;

/// Greedy wrap column for Helvetica 12 inside the 468 pt text width.
const WRAP_COLUMNS: usize = 90;

fn pt(v: f32) -> Mm {
    Mm(v * 25.4 / 72.0)
}

/// Deterministic artifact file name for a (location, date) pair.
///
/// Pure function: identical inputs always yield the identical name, so a
/// re-run for the same location and date lands on the same path. Spaces in
/// the location become underscores; the date is `YYYY-MM-DD`.
pub fn report_file_name(location: &str, date: &str) -> String {
    format!("Disaster_Report_{}_{}.pdf", location.replace(' ', "_"), date)
}

/// Resolve the artifact path for this run, honouring the opt-in unique
/// suffix. The suffixed form trades the overwrite invariant for keeping
/// every run's artifact.
pub fn artifact_path(config: &ReportConfig, location: &str, date: &str) -> PathBuf {
    let name = if config.unique_suffix {
        format!(
            "Disaster_Report_{}_{}_{}.pdf",
            location.replace(' ', "_"),
            date,
            Utc::now().format("%Y%m%dT%H%M%SZ"),
        )
    } else {
        report_file_name(location, date)
    };
    config.output_dir.join(name)
}

/// Wrap free-form text into drawable lines.
///
/// Paragraph breaks in the input are preserved; within a paragraph, words
/// are greedily packed up to [`WRAP_COLUMNS`] characters. A single word
/// longer than the column limit is hard-split rather than overflowing the
/// text width.
pub fn wrap_lines(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word;
            // Hard-split oversized tokens (URLs, hashes).
            while word.chars().count() > columns {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let split_at = word
                    .char_indices()
                    .nth(columns)
                    .map(|(i, _)| i)
                    .unwrap_or(word.len());
                lines.push(word[..split_at].to_string());
                word = &word[split_at..];
            }

            if current.is_empty() {
                current.push_str(word);
            } else if current.chars().count() + 1 + word.chars().count() <= columns {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Draw the report into an in-memory PDF.
///
/// Emits the fixed-position title and date lines, then the wrapped
/// analysis text, adding pages as needed.
pub fn render_pdf(analysis: &str, location: &str, date: &str) -> Result<Vec<u8>, ReportError> {
    let (doc, page1, layer1) = PdfDocument::new(
        format!("Disaster Report for {location}"),
        pt(PAGE_WIDTH_PT),
        pt(PAGE_HEIGHT_PT),
        "Page 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Render {
            detail: e.to_string(),
        })?;

    let mut layer = doc.get_page(page1).get_layer(layer1);
    layer.use_text(
        format!("Disaster Report for {location}"),
        FONT_SIZE_PT,
        pt(MARGIN_PT),
        pt(TITLE_Y_PT),
        &font,
    );
    layer.use_text(
        format!("Date: {date}"),
        FONT_SIZE_PT,
        pt(MARGIN_PT),
        pt(DATE_Y_PT),
        &font,
    );

    let lines = wrap_lines(analysis, WRAP_COLUMNS);
    let mut y = BODY_START_Y_PT;
    let mut page_count = 1usize;

    for line in &lines {
        if y < MARGIN_PT {
            page_count += 1;
            let (page, layer_idx) = doc.add_page(
                pt(PAGE_WIDTH_PT),
                pt(PAGE_HEIGHT_PT),
                format!("Page {page_count}"),
            );
            layer = doc.get_page(page).get_layer(layer_idx);
            y = CONTINUATION_START_Y_PT;
        }
        if !line.is_empty() {
            layer.use_text(line.clone(), FONT_SIZE_PT, pt(MARGIN_PT), pt(y), &font);
        }
        y -= LINE_LEADING_PT;
    }

    debug!("Rendered {} lines across {} page(s)", lines.len(), page_count);

    doc.save_to_bytes().map_err(|e| ReportError::Render {
        detail: e.to_string(),
    })
}

/// Write the rendered bytes to the artifact path.
///
/// Writes to a sibling temp file first and renames into place, so a
/// crashed run never leaves a truncated PDF at the deterministic path.
pub async fn write_artifact(bytes: &[u8], path: PathBuf) -> Result<ReportArtifact, ReportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ReportError::OutputWrite {
                    path: path.clone(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| ReportError::OutputWrite {
            path: path.clone(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| ReportError::OutputWrite {
            path: path.clone(),
            source: e,
        })?;

    info!("Wrote report artifact: {}", path.display());

    Ok(ReportArtifact {
        size_bytes: bytes.len() as u64,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_deterministic() {
        let a = report_file_name("Ridge Valley", "2024-03-01");
        let b = report_file_name("Ridge Valley", "2024-03-01");
        assert_eq!(a, b);
        assert_eq!(a, "Disaster_Report_Ridge_Valley_2024-03-01.pdf");
    }

    #[test]
    fn file_name_replaces_every_space() {
        assert_eq!(
            report_file_name("San Luis Obispo County", "2025-01-15"),
            "Disaster_Report_San_Luis_Obispo_County_2025-01-15.pdf"
        );
    }

    #[test]
    fn artifact_path_joins_output_dir() {
        let config = ReportConfig::builder()
            .output_dir("/tmp/reports")
            .build()
            .unwrap();
        let p = artifact_path(&config, "Ridge Valley", "2024-03-01");
        assert_eq!(
            p,
            PathBuf::from("/tmp/reports/Disaster_Report_Ridge_Valley_2024-03-01.pdf")
        );
    }

    #[test]
    fn unique_suffix_keeps_prefix_and_extension() {
        let config = ReportConfig::builder()
            .output_dir("/tmp/reports")
            .unique_suffix(true)
            .build()
            .unwrap();
        let p = artifact_path(&config, "Ridge Valley", "2024-03-01");
        let name = p.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("Disaster_Report_Ridge_Valley_2024-03-01_"));
        assert!(name.ends_with(".pdf"));
        assert_ne!(name, "Disaster_Report_Ridge_Valley_2024-03-01.pdf");
    }

    #[test]
    fn wrap_respects_column_limit() {
        let text = "word ".repeat(100);
        for line in wrap_lines(&text, 20) {
            assert!(line.chars().count() <= 20, "line too long: {line:?}");
        }
    }

    #[test]
    fn wrap_preserves_paragraph_breaks() {
        let lines = wrap_lines("first paragraph\n\nsecond paragraph", 80);
        assert_eq!(lines, vec!["first paragraph", "", "second paragraph"]);
    }

    #[test]
    fn wrap_hard_splits_oversized_tokens() {
        let lines = wrap_lines(&"x".repeat(45), 20);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
    }

    #[test]
    fn wrap_of_empty_text_is_empty() {
        assert!(wrap_lines("", 80).is_empty());
    }

    #[test]
    fn render_produces_a_pdf() {
        let bytes = render_pdf(
            "Smoke observed over northern ridge.",
            "Ridge Valley",
            "2024-03-01",
        )
        .unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
        assert!(bytes.len() > 500);
    }

    #[test]
    fn render_survives_multi_page_text() {
        // ~200 wrapped lines, several times one page's capacity.
        let long = "A long line of incident narrative follows here. ".repeat(400);
        let bytes = render_pdf(&long, "Ridge Valley", "2024-03-01").unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[tokio::test]
    async fn write_artifact_is_atomic_and_sized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let artifact = write_artifact(b"%PDF-1.3 fake", path.clone()).await.unwrap();
        assert_eq!(artifact.size_bytes, 13);
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.3 fake");
        assert!(!path.with_extension("pdf.tmp").exists());
    }

    #[tokio::test]
    async fn second_write_overwrites_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("same.pdf");
        write_artifact(b"first run", path.clone()).await.unwrap();
        write_artifact(b"second run", path.clone()).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second run");
    }
}
