use std::fmt;
use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::model::{MatchResult, ResolvedPart};
use crate::util::ensure_directory;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum CopyStatus {
    Copied,
    AlreadyPresent,
    Planned,
}

impl CopyStatus {
    fn suffix(self) -> &'static str {
        match self {
            Self::Copied => "",
            Self::AlreadyPresent => " (already present)",
            Self::Planned => " (dry run)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OutputEvent {
    Copied {
        identifier: String,
        target: String,
        status: CopyStatus,
    },
    Remapped {
        identifier: String,
        tried_key: String,
        target: String,
        status: CopyStatus,
    },
    NotFound {
        identifier: String,
    },
}

impl fmt::Display for OutputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copied {
                identifier,
                target,
                status,
            } => write!(f, "[c] {identifier} -> {target}{}", status.suffix()),
            Self::Remapped {
                identifier,
                tried_key,
                target,
                status,
            } => write!(
                f,
                "[r] {tried_key} ({identifier}) -> {target}{}",
                status.suffix()
            ),
            Self::NotFound { identifier } => write!(f, "[n] {identifier} not found"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct OutputWriter {
    out_root: PathBuf,
    dry_run: bool,
}

impl OutputWriter {
    pub(crate) fn new(out_root: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            out_root: out_root.into(),
            dry_run,
        }
    }

    pub(crate) fn write(&self, label: &str, parts: &[ResolvedPart]) -> Result<Vec<OutputEvent>> {
        let label_dir = self.out_root.join(label);
        if !self.dry_run {
            ensure_directory(&label_dir)?;
        }

        let mut events = Vec::new();
        for part in parts {
            for found in &part.matches {
                let Some(source) = found.path() else {
                    events.push(OutputEvent::NotFound {
                        identifier: part.identifier.clone(),
                    });
                    continue;
                };

                let file_name = source
                    .file_name()
                    .with_context(|| format!("cutting file has no name: {}", source.display()))?;
                let target = Path::new(label).join(file_name).display().to_string();
                let status = if self.dry_run {
                    CopyStatus::Planned
                } else {
                    copy_if_absent(source, &label_dir, &label_dir.join(file_name))?
                };

                events.push(match found {
                    MatchResult::Remapped { tried_key, .. } => OutputEvent::Remapped {
                        identifier: part.identifier.clone(),
                        tried_key: tried_key.clone(),
                        target,
                        status,
                    },
                    _ => OutputEvent::Copied {
                        identifier: part.identifier.clone(),
                        target,
                        status,
                    },
                });
            }
        }

        Ok(events)
    }
}

fn copy_if_absent(source: &Path, dir: &Path, destination: &Path) -> Result<CopyStatus> {
    if destination
        .try_exists()
        .with_context(|| format!("failed to inspect {}", destination.display()))?
    {
        return Ok(CopyStatus::AlreadyPresent);
    }

    let mut from =
        File::open(source).with_context(|| format!("failed to open {}", source.display()))?;
    let mut staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    io::copy(&mut from, staged.as_file_mut()).with_context(|| {
        format!(
            "failed to copy {} -> {}",
            source.display(),
            destination.display()
        )
    })?;

    match staged.persist_noclobber(destination) {
        Ok(_) => Ok(CopyStatus::Copied),
        Err(err) if err.error.kind() == ErrorKind::AlreadyExists => {
            Ok(CopyStatus::AlreadyPresent)
        }
        Err(err) => Err(err.error)
            .with_context(|| format!("failed to persist {}", destination.display())),
    }
}
