use anyhow::{bail, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

use docqa_core::{Document, DocumentSource, Error};

const PAGE_BREAK: char = '\x0C';

/// Text files where pages are separated by form feeds, as written by `pdftotext`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextSource;

struct TextDocument {
    pages: Vec<String>,
}

/// Split file content into pages. A single trailing page break does not start
/// a new page; empty content has no pages at all. Every page but the last
/// ends with a newline, so concatenated pages keep a word boundary.
pub fn split_pages(content: &str) -> Vec<String> {
    if content.is_empty() { return Vec::new(); }
    let body = content.strip_suffix(PAGE_BREAK).unwrap_or(content);
    let mut pages: Vec<String> = body.split(PAGE_BREAK).map(str::to_string).collect();
    let last = pages.len() - 1;
    for page in &mut pages[..last] {
        if !page.ends_with('\n') { page.push('\n'); }
    }
    pages
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
    }
}

impl DocumentSource for PlainTextSource {
    fn open(&self, path: &Path) -> Result<Box<dyn Document>> {
        if !path.is_file() {
            return Err(Error::NotFound(path.display().to_string()).into());
        }
        let content = read_file_content(path)?;
        let pages = split_pages(&content);
        debug!(path = %path.display(), pages = pages.len(), "opened text document");
        Ok(Box::new(TextDocument { pages }))
    }
}

impl Document for TextDocument {
    fn page_count(&self) -> usize { self.pages.len() }

    fn extract_page(&self, index: usize) -> Result<String> {
        match self.pages.get(index) {
            Some(page) => Ok(page.clone()),
            None => bail!("page index {} out of range (0..{})", index, self.pages.len()),
        }
    }
}
