use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

impl PositionedFragment {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageText {
    pub number: usize,
    pub plain_text: String,
    pub fragments: Vec<PositionedFragment>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Profile,
    ProfileBendingTable,
    MarkingPlan,
    InComing,
    OutGoing,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::ProfileBendingTable => "profile bending table",
            Self::MarkingPlan => "block marking type",
            Self::InComing => "in-coming",
            Self::OutGoing => "out-going",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PageVerdict {
    Proceed,
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Exact { path: PathBuf },
    Remapped { path: PathBuf, tried_key: String },
    NotFound,
}

impl MatchResult {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Exact { path } | Self::Remapped { path, .. } => Some(path),
            Self::NotFound => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedPart {
    pub identifier: String,
    pub matches: Vec<MatchResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub report_version: u32,
    pub generated_at: String,
    pub source_pdf: String,
    pub source_sha256: String,
    pub page_count: usize,
    pub indexed_files: usize,
    pub dry_run: bool,
    pub pages: Vec<PageReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub page: usize,
    pub status: String,
    pub skip_reason: Option<SkipReason>,
    pub label: Option<String>,
    pub identifiers: Vec<String>,
    pub copied: Vec<String>,
    pub remapped: Vec<String>,
    pub not_found: Vec<String>,
}
