// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// EPUB reader. MuPDF lays the reflowable book out into fixed-size pages;
// a page here is one of those layout pages, not a spine item.

use std::path::{Path, PathBuf};

use mupdf::Document;
use tracing::{debug, instrument};

use lesewerk_core::error::{LesewerkError, Result};

/// Layout page width in points (MuPDF's default for reflowable documents).
pub const LAYOUT_WIDTH: f32 = 450.0;
/// Layout page height in points.
pub const LAYOUT_HEIGHT: f32 = 600.0;
/// Base font size in points.
pub const LAYOUT_EM: f32 = 12.0;

pub struct EpubReader {
    doc: Document,
    pages: u32,
    path: PathBuf,
}

impl EpubReader {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let open_error = |err: String| LesewerkError::DocumentOpen(format!("{}: {err}", path.display()));
        let name = path.to_str().ok_or_else(|| open_error("not a UTF-8 path".into()))?;

        let mut doc = Document::open(name).map_err(|err| open_error(err.to_string()))?;
        if doc.is_reflowable().unwrap_or(false) {
            doc.layout(LAYOUT_WIDTH, LAYOUT_HEIGHT, LAYOUT_EM)
                .map_err(|err| open_error(err.to_string()))?;
        }
        let pages = doc.page_count().map_err(|err| open_error(err.to_string()))?;
        debug!(pages, "EPUB laid out");

        Ok(Self {
            doc,
            pages: pages.max(0) as u32,
            path: path.to_path_buf(),
        })
    }

    pub fn page_count(&self) -> u32 {
        self.pages
    }

    /// Plain text of layout page `page` (1-indexed).
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn page_text(&self, page: u32) -> Result<String> {
        let total = self.page_count();
        if page == 0 || page > total {
            return Err(LesewerkError::PageOutOfBounds { page, total });
        }

        let unreadable = |err: mupdf::Error| {
            LesewerkError::DocumentOpen(format!("{}: page {page} cannot be read: {err}", self.path.display()))
        };
        let loaded = self.doc.load_page(page as i32 - 1).map_err(unreadable)?;
        loaded.to_text().map_err(unreadable)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Write a minimal EPUB 2 book with one spine item per chapter body.
    pub(crate) fn write_epub(path: &Path, chapters: &[&str]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();

        zip.start_file("META-INF/container.xml", stored).unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
        )
        .unwrap();

        let mut manifest = String::new();
        let mut spine = String::new();
        for (i, body) in chapters.iter().enumerate() {
            manifest.push_str(&format!(
                r#"<item id="c{i}" href="c{i}.xhtml" media-type="application/xhtml+xml"/>"#
            ));
            spine.push_str(&format!(r#"<itemref idref="c{i}"/>"#));

            zip.start_file(format!("OEBPS/c{i}.xhtml"), stored).unwrap();
            zip.write_all(
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>Chapter {i}</title></head>
<body>{body}</body></html>"#
                )
                .as_bytes(),
            )
            .unwrap();
        }

        zip.start_file("OEBPS/content.opf", stored).unwrap();
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="bookid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Fixture</dc:title>
    <dc:identifier id="bookid">fixture-book</dc:identifier>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>{manifest}</manifest>
  <spine>{spine}</spine>
</package>"#
            )
            .as_bytes(),
        )
        .unwrap();

        zip.finish().unwrap();
    }

    #[test]
    fn short_chapters_start_new_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");
        write_epub(&path, &["<p>First chapter</p>", "<p>Second chapter</p>"]);

        let reader = EpubReader::open(&path).unwrap();
        assert_eq!(reader.page_count(), 2);
        assert!(reader.page_text(1).unwrap().contains("First chapter"));
        assert!(reader.page_text(2).unwrap().contains("Second chapter"));
    }

    #[test]
    fn long_chapter_spans_several_layout_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.epub");
        let long: String = (1..=300).map(|i| format!("<p>Paragraph number {i}.</p>")).collect();
        write_epub(&path, &[&long, "<p>Epilogue</p>"]);

        let reader = EpubReader::open(&path).unwrap();
        let total = reader.page_count();
        assert!(total > 2, "300 paragraphs fit on {total} pages");
        assert!(reader.page_text(1).unwrap().contains("Paragraph number 1."));
        assert!(!reader.page_text(1).unwrap().contains("Paragraph number 300."));
        assert!(reader.page_text(total).unwrap().contains("Epilogue"));
    }

    #[test]
    fn pages_outside_the_layout_are_out_of_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");
        write_epub(&path, &["<p>Only chapter</p>"]);

        let reader = EpubReader::open(&path).unwrap();
        assert!(matches!(
            reader.page_text(2),
            Err(LesewerkError::PageOutOfBounds { page: 2, total: 1 })
        ));
        assert!(matches!(
            reader.page_text(0),
            Err(LesewerkError::PageOutOfBounds { page: 0, total: 1 })
        ));
    }

    #[test]
    fn garbage_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.epub");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(matches!(
            EpubReader::open(&path),
            Err(LesewerkError::DocumentOpen(_))
        ));
    }
}
