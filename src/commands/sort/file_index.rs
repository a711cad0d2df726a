use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::cli::KeyPolicyArg;

const CUTTING_FILE_EXTENSION: &str = "dxf";
// bending aids and templates
const EXCLUDED_PREFIXES: [&str; 2] = ["fp", "templ"];
const KEY_SEGMENTS: usize = 3;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum KeyPolicy {
    LastSegments(usize),
    FullStem,
}

impl From<KeyPolicyArg> for KeyPolicy {
    fn from(value: KeyPolicyArg) -> Self {
        match value {
            KeyPolicyArg::LastThree => Self::LastSegments(KEY_SEGMENTS),
            KeyPolicyArg::FullStem => Self::FullStem,
        }
    }
}

impl KeyPolicy {
    pub(crate) fn key_for(self, stem: &str) -> String {
        match self {
            Self::FullStem => stem.to_string(),
            Self::LastSegments(count) => {
                let segments = stem.split('-').collect::<Vec<&str>>();
                let start = segments.len().saturating_sub(count);
                segments[start..].join("-")
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FileIndex {
    files: HashMap<String, PathBuf>,
}

impl FileIndex {
    pub(crate) fn build(root: &Path, policy: KeyPolicy) -> Result<Self> {
        if !root.is_dir() {
            bail!("cutting file directory not found: {}", root.display());
        }
        let root = fs::canonicalize(root)
            .with_context(|| format!("failed to resolve {}", root.display()))?;

        let mut files = HashMap::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(key) = index_key(path, policy) else {
                continue;
            };

            if let Some(previous) = files.insert(key.clone(), path.to_path_buf()) {
                debug!(
                    key = %key,
                    previous = %previous.display(),
                    path = %path.display(),
                    "cutting file key overwritten"
                );
            }
        }

        info!(root = %root.display(), files = files.len(), policy = ?policy, "indexed cutting files");
        Ok(Self { files })
    }

    pub(crate) fn get(&self, key: &str) -> Option<&PathBuf> {
        self.files.get(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.files.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn index_key(path: &Path, policy: KeyPolicy) -> Option<String> {
    let is_cutting_file = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(CUTTING_FILE_EXTENSION))
        .unwrap_or(false);
    if !is_cutting_file {
        return None;
    }

    let name = path.file_name().and_then(|name| name.to_str())?;
    if EXCLUDED_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
    {
        return None;
    }

    let stem = path.file_stem().and_then(|stem| stem.to_str())?;
    Some(policy.key_for(stem))
}
