//! Writing harvested pages to disk
//!
//! Each downloaded page becomes one file named after its address, and an
//! `index.md` lists every entry of the crawl, including links that were only
//! discovered.

use crate::crawler::CrawlResult;
use crate::format::FormatError;
use crate::output::{OutputError, OutputResult};
use crate::url::Address;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the index file written next to the pages
pub const INDEX_FILE: &str = "index.md";

/// Longest slug kept in a file name
const MAX_SLUG_LEN: usize = 60;

/// Formatted Markdown per address, as produced by the formatter pool
pub type MarkdownPages = BTreeMap<Address, Result<String, FormatError>>;

/// What was written for one result entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenEntry {
    pub address: Address,

    /// File name inside the output directory; `None` for discovered-only links
    pub file_name: Option<String>,

    /// True if Markdown was requested but the page fell back to HTML
    pub format_failed: bool,
}

/// Writes every downloaded page plus `index.md` into `dir`
///
/// Pages with formatted Markdown are written as `.md`; all others, including
/// pages whose formatting failed, are written as cleaned `.html`.
///
/// # Arguments
///
/// * `result` - The crawl result
/// * `dir` - Output directory, created if missing
/// * `markdown` - Formatter output, if formatting ran
///
/// # Returns
///
/// * `Ok(Vec<WrittenEntry>)` - One entry per result entry, in address order
/// * `Err(OutputError)` - A file could not be written
pub fn write_pages(
    result: &CrawlResult,
    dir: &Path,
    markdown: Option<&MarkdownPages>,
) -> OutputResult<Vec<WrittenEntry>> {
    if dir.exists() && !dir.is_dir() {
        return Err(OutputError::Write(format!(
            "{} exists and is not a directory",
            dir.display()
        )));
    }
    fs::create_dir_all(dir)?;

    let mut entries = Vec::with_capacity(result.len());
    for (address, html) in result.iter() {
        if result.is_discovered(address) {
            entries.push(WrittenEntry {
                address: address.clone(),
                file_name: None,
                format_failed: false,
            });
            continue;
        }

        let formatted = markdown.and_then(|pages| pages.get(address));
        let (file_name, content, format_failed) = match formatted {
            Some(Ok(md)) => (page_file_name(address, "md"), md.as_str(), false),
            Some(Err(_)) => (page_file_name(address, "html"), html, true),
            None => (page_file_name(address, "html"), html, false),
        };

        fs::write(dir.join(&file_name), content)?;
        tracing::debug!("Wrote {} for {}", file_name, address);

        entries.push(WrittenEntry {
            address: address.clone(),
            file_name: Some(file_name),
            format_failed,
        });
    }

    fs::write(dir.join(INDEX_FILE), format_index(&entries))?;
    tracing::info!("Wrote {} entries to {}", entries.len(), dir.display());

    Ok(entries)
}

/// Path of the index file inside `dir`
pub fn index_path(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE)
}

/// File name for a page: `{slug}-{first 8 hex of sha256(address)}.{extension}`
pub fn page_file_name(address: &Address, extension: &str) -> String {
    let digest = hex::encode(Sha256::digest(address.as_str().as_bytes()));
    format!("{}-{}.{}", slug(address), &digest[..8], extension)
}

/// Lower-case host and path with every other character run turned into `-`
fn slug(address: &Address) -> String {
    let raw = format!("{}{}", address.host_str().unwrap_or_default(), address.path());
    let mut slug = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug: String = slug.trim_matches('-').chars().take(MAX_SLUG_LEN).collect();
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "page".to_string()
    } else {
        slug.to_string()
    }
}

fn format_index(entries: &[WrittenEntry]) -> String {
    let mut md = String::new();
    md.push_str("# Harvest Index\n\n");
    md.push_str("| Address | File |\n");
    md.push_str("|---------|------|\n");

    for entry in entries {
        let file = match (&entry.file_name, entry.format_failed) {
            (Some(name), false) => format!("[{}]({})", name, name),
            (Some(name), true) => format!("[{}]({}) (formatting failed)", name, name),
            (None, _) => "discovered".to_string(),
        };
        md.push_str(&format!("| {} | {} |\n", entry.address, file));
    }

    md
}
