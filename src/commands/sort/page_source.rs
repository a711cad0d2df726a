use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::model::{PageText, PositionedFragment};
use crate::util::decode_xml_entities;

pub(crate) trait PageTextSource: Sync {
    fn page_count(&self) -> usize;

    fn page(&self, page_number: usize) -> Result<PageText>;
}

#[derive(Debug)]
pub(crate) struct PopplerSource {
    pdf_path: PathBuf,
    page_count: usize,
    bbox_parser: BboxParser,
}

impl PopplerSource {
    pub(crate) fn open(pdf_path: &Path) -> Result<Self> {
        if !pdf_path.is_file() {
            bail!("input PDF not found: {}", pdf_path.display());
        }

        let output = Command::new("pdfinfo")
            .arg(pdf_path)
            .output()
            .with_context(|| format!("failed to execute pdfinfo for {}", pdf_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "error opening pdf {}: {}",
                pdf_path.display(),
                stderr.trim()
            );
        }

        let info = String::from_utf8_lossy(&output.stdout);
        let page_count = parse_page_count(&info)
            .with_context(|| format!("pdfinfo reported no page count for {}", pdf_path.display()))?;

        Ok(Self {
            pdf_path: pdf_path.to_path_buf(),
            page_count,
            bbox_parser: BboxParser::new()?,
        })
    }

    fn run_pdftotext(&self, page_number: usize, bbox: bool) -> Result<String> {
        let mut command = Command::new("pdftotext");
        if bbox {
            command.arg("-bbox");
        }
        command
            .arg("-enc")
            .arg("UTF-8")
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg(&self.pdf_path)
            .arg("-");

        let output = command.output().with_context(|| {
            format!(
                "failed to execute pdftotext for {} page {}",
                self.pdf_path.display(),
                page_number
            )
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdftotext returned non-zero exit status for {} page {}: {}",
                self.pdf_path.display(),
                page_number,
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).replace('\u{0000}', ""))
    }
}

impl PageTextSource for PopplerSource {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page(&self, page_number: usize) -> Result<PageText> {
        let plain_text = self.run_pdftotext(page_number, false)?;
        let bbox = self.run_pdftotext(page_number, true)?;

        Ok(PageText {
            number: page_number,
            plain_text,
            fragments: self.bbox_parser.parse(&bbox),
        })
    }
}

pub(super) fn parse_page_count(info: &str) -> Option<usize> {
    info.lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
}

#[derive(Debug, Clone)]
pub(crate) struct BboxParser {
    page_regex: Regex,
    word_regex: Regex,
}

impl BboxParser {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            page_regex: Regex::new(r#"<page\s+width="([0-9.]+)"\s+height="([0-9.]+)""#)
                .context("failed to compile bbox page regex")?,
            word_regex: Regex::new(
                r#"<word\s+xMin="([0-9.\-]+)"\s+yMin="([0-9.\-]+)"\s+xMax="([0-9.\-]+)"\s+yMax="([0-9.\-]+)">(.*?)</word>"#,
            )
            .context("failed to compile bbox word regex")?,
        })
    }

    // word boxes are top-down; fragment y grows upward
    pub(crate) fn parse(&self, xhtml: &str) -> Vec<PositionedFragment> {
        let page_height = self
            .page_regex
            .captures(xhtml)
            .and_then(|captures| captures.get(2))
            .and_then(|value| value.as_str().parse::<f64>().ok())
            .unwrap_or(0.0);

        self.word_regex
            .captures_iter(xhtml)
            .filter_map(|captures| {
                let x = captures.get(1)?.as_str().parse::<f64>().ok()?;
                let y_max = captures.get(4)?.as_str().parse::<f64>().ok()?;
                let text = decode_xml_entities(captures.get(5)?.as_str());
                Some(PositionedFragment::new(text, x, page_height - y_max))
            })
            .collect()
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemorySource {
    pages: Vec<PageText>,
}

#[cfg(test)]
impl MemorySource {
    pub(crate) fn new(pages: Vec<PageText>) -> Self {
        Self { pages }
    }
}

#[cfg(test)]
impl PageTextSource for MemorySource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, page_number: usize) -> Result<PageText> {
        page_number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .cloned()
            .with_context(|| format!("page {page_number} out of range"))
    }
}
