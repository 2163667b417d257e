//! Document ingestion.
//!
//! Loads a file into zero or more normalized [`Document`]s with provenance
//! metadata. Supported kinds: plain text, DOCX, PDF, CSV, and XLSX.
//! Unsupported kinds are skipped with a logged notice, never an error;
//! tabular files produce one document per row.

use std::io::Read as _;
use std::path::Path;

use calamine::Reader as _;
use tracing::{info, warn};

use crate::document::{Document, SourceMeta};
use crate::error::{ChatError, Result};

/// Collapse all runs of whitespace (including em-spaces and newlines) into
/// single spaces and trim the ends.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

fn ingest_err(path: &Path, message: impl std::fmt::Display) -> ChatError {
    ChatError::Ingest { path: path.display().to_string(), message: message.to_string() }
}

fn source_meta(path: &Path, ext: &str) -> SourceMeta {
    SourceMeta {
        filename: path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default(),
        filetype: ext.to_string(),
        source_path: path.display().to_string(),
    }
}

/// Load one file into zero or more documents.
///
/// An unsupported extension yields `Ok(vec![])` with a logged notice.
/// Unreadable or corrupt files yield [`ChatError::Ingest`].
pub fn load_file(path: &Path) -> Result<Vec<Document>> {
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    let meta = source_meta(path, &ext);

    match ext.as_str() {
        ".txt" => {
            let raw = std::fs::read_to_string(path).map_err(|e| ingest_err(path, e))?;
            Ok(vec![Document::new(clean_text(&raw), meta)])
        }
        ".docx" => {
            let raw = read_docx_text(path)?;
            Ok(vec![Document::new(clean_text(&raw), meta)])
        }
        ".pdf" => {
            let raw = pdf_extract::extract_text(path).map_err(|e| ingest_err(path, e))?;
            Ok(vec![Document::new(clean_text(&raw), meta)])
        }
        ".csv" => load_csv(path, meta),
        ".xlsx" => load_xlsx(path, meta),
        _ => {
            info!(path = %path.display(), "skipping unsupported file kind");
            Ok(Vec::new())
        }
    }
}

/// Load every regular file in a directory, skipping files that fail to parse.
///
/// Per-file ingestion errors are logged and contribute zero documents;
/// only a failure to read the directory itself is an error.
pub fn load_dir(dir: &Path) -> Result<Vec<Document>> {
    let entries = std::fs::read_dir(dir).map_err(|e| ingest_err(dir, e))?;
    let mut documents = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| ingest_err(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match load_file(&path) {
            Ok(docs) => documents.extend(docs),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to load file, skipping"),
        }
    }

    Ok(documents)
}

/// Extract paragraph text from the `word/document.xml` entry of a DOCX
/// archive. Text inside `<w:t>` elements is collected; paragraphs are
/// separated with newlines.
fn read_docx_text(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path).map_err(|e| ingest_err(path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ingest_err(path, e))?;

    let mut doc_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| ingest_err(path, "missing word/document.xml"))?
        .read_to_string(&mut doc_xml)
        .map_err(|e| ingest_err(path, e))?;

    let mut reader = quick_xml::Reader::from_str(&doc_xml);
    let mut text = String::new();
    let mut in_text_element = false;

    loop {
        match reader.read_event() {
            Ok(quick_xml::events::Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_element = true;
                }
            }
            Ok(quick_xml::events::Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_element = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(ref e)) => {
                if in_text_element {
                    if let Ok(t) = e.unescape() {
                        text.push_str(&t);
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ingest_err(path, format!("XML parse error: {e}"))),
            _ => {}
        }
    }

    Ok(text)
}

/// One document per CSV record: the cleaned, non-empty cells joined by spaces.
fn load_csv(path: &Path, meta: SourceMeta) -> Result<Vec<Document>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ingest_err(path, e))?;

    let mut documents = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ingest_err(path, e))?;
        let row = join_cells(record.iter());
        if !row.is_empty() {
            documents.push(Document::new(row, meta.clone()));
        }
    }
    Ok(documents)
}

/// One document per spreadsheet row, across all sheets.
fn load_xlsx(path: &Path, meta: SourceMeta) -> Result<Vec<Document>> {
    let mut workbook = calamine::open_workbook_auto(path).map_err(|e| ingest_err(path, e))?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    let mut documents = Vec::new();
    for sheet in &sheet_names {
        let range = workbook.worksheet_range(sheet).map_err(|e| ingest_err(path, e))?;
        for row in range.rows() {
            let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            let text = join_cells(cells.iter().map(|s| s.as_str()));
            if !text.is_empty() {
                documents.push(Document::new(text, meta.clone()));
            }
        }
    }
    Ok(documents)
}

fn join_cells<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    cells
        .map(clean_text)
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a\n\tb\u{2003}c  "), "a b c");
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n "), "");
    }

    #[test]
    fn unsupported_extension_is_skipped_without_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("image.png");
        std::fs::write(&path, b"not a document").unwrap();
        assert!(load_file(&path).unwrap().is_empty());
    }

    #[test]
    fn txt_file_becomes_one_normalized_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "line one\nline  two\n").unwrap();

        let docs = load_file(&path).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "line one line two");
        assert_eq!(docs[0].meta.filename, "notes");
        assert_eq!(docs[0].meta.filetype, ".txt");
    }

    #[test]
    fn csv_file_becomes_one_document_per_row() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        std::fs::write(&path, "name,city\nAn,Hanoi\nBinh,Hue\n").unwrap();

        let docs = load_file(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].text, "An Hanoi");
        assert_eq!(docs[1].text, "Binh Hue");
        assert!(docs.iter().all(|d| d.meta.filetype == ".csv"));
    }

    #[test]
    fn load_dir_skips_unreadable_files() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("good.txt"), "hello").unwrap();
        // Corrupt DOCX: wrong magic bytes, parse fails, file is skipped.
        std::fs::write(dir.path().join("bad.docx"), b"garbage").unwrap();

        let docs = load_dir(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "hello");
    }
}
