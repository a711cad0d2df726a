use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::model::{PageReport, PageVerdict, RunReport, SkipReason};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

use super::classify::classify;
use super::fields::{ZoneTable, extract_group_label};
use super::file_index::FileIndex;
use super::identifiers::PartPattern;
use super::output::{OutputEvent, OutputWriter};
use super::page_source::{PageTextSource, PopplerSource};
use super::reconcile::resolve_all;

const REPORT_VERSION: u32 = 1;

pub(crate) struct SortContext<'a> {
    pub index: &'a FileIndex,
    pub zones: &'a ZoneTable,
    pub pattern: &'a PartPattern,
    pub writer: &'a OutputWriter,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PageOutcome {
    Skipped {
        page: usize,
        reason: SkipReason,
    },
    Processed {
        page: usize,
        label: String,
        identifiers: Vec<String>,
        events: Vec<OutputEvent>,
    },
    // another page already failed
    Cancelled {
        page: usize,
    },
}

impl PageOutcome {
    pub(crate) fn page(&self) -> usize {
        match self {
            Self::Skipped { page, .. } | Self::Processed { page, .. } | Self::Cancelled { page } => {
                *page
            }
        }
    }

    pub(crate) fn console_lines(&self) -> Vec<String> {
        match self {
            Self::Skipped { page, reason } => vec![format!("[i] page {page} skipped: {reason}")],
            Self::Processed { events, .. } => events.iter().map(ToString::to_string).collect(),
            Self::Cancelled { .. } => Vec::new(),
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let zones = match &cli.zones {
        Some(path) => ZoneTable::load(path)?,
        None => ZoneTable::for_layout(cli.layout),
    };
    info!(
        layout = cli.layout.as_str(),
        zones = zones.zones.len(),
        key_policy = cli.key_policy.as_str(),
        "starting sort"
    );

    let index = FileIndex::build(&cli.dxf_dir, cli.key_policy.into())?;
    if index.is_empty() {
        warn!(dir = %cli.dxf_dir.display(), "no cutting files indexed; every part will be reported as not found");
    }

    let source = PopplerSource::open(&cli.pdf)?;
    info!(pdf = %cli.pdf.display(), pages = source.page_count(), "opened drawing");

    let pattern = PartPattern::new()?;
    let writer = OutputWriter::new(&cli.out_dir, cli.dry_run);
    let context = SortContext {
        index: &index,
        zones: &zones,
        pattern: &pattern,
        writer: &writer,
    };

    let outcomes = process_pages(&source, &context, cli.jobs)?;

    let skipped = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, PageOutcome::Skipped { .. }))
        .count();
    info!(
        pages = outcomes.len(),
        skipped,
        processed = outcomes.len() - skipped,
        "sort completed"
    );

    if let Some(report_path) = &cli.report {
        let report = build_report(&cli.pdf, &outcomes, index.len(), cli.dry_run)?;
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote run report");
    }

    Ok(())
}

pub fn dump_page(pdf_path: &Path, page_number: usize) -> Result<()> {
    let source = PopplerSource::open(pdf_path)?;
    if page_number == 0 || page_number > source.page_count() {
        bail!(
            "page {} out of range: {} has {} pages",
            page_number,
            pdf_path.display(),
            source.page_count()
        );
    }

    let page = source.page(page_number)?;
    let mut stdout = io::stdout().lock();
    for fragment in &page.fragments {
        writeln!(stdout, "{} {:.3} {:.3}", fragment.text, fragment.x, fragment.y)
            .context("failed to write fragment dump")?;
    }
    Ok(())
}

pub(crate) fn process_page(
    source: &dyn PageTextSource,
    page_number: usize,
    context: &SortContext<'_>,
) -> Result<PageOutcome> {
    let page = source
        .page(page_number)
        .with_context(|| format!("failed to read page {page_number}"))?;

    if let PageVerdict::Skip(reason) = classify(&page.plain_text) {
        debug!(page = page.number, reason = %reason, "page skipped");
        return Ok(PageOutcome::Skipped {
            page: page_number,
            reason,
        });
    }

    let label = extract_group_label(&page.fragments, context.zones);
    let identifiers = context.pattern.extract_identifiers(&page.plain_text);
    let parts = resolve_all(&identifiers, context.index);
    let events = context
        .writer
        .write(&label, &parts)
        .with_context(|| format!("failed to write output for page {page_number}"))?;

    debug!(
        page = page.number,
        label = %label,
        identifiers = identifiers.len(),
        "page processed"
    );

    Ok(PageOutcome::Processed {
        page: page_number,
        label,
        identifiers,
        events,
    })
}

pub(crate) fn process_pages(
    source: &dyn PageTextSource,
    context: &SortContext<'_>,
    jobs: Option<usize>,
) -> Result<Vec<PageOutcome>> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(jobs.unwrap_or(0))
        .build()
        .context("failed to build page worker pool")?;
    let cancelled = AtomicBool::new(false);

    let results: Vec<Result<PageOutcome>> = pool.install(|| {
        (1..=source.page_count())
            .into_par_iter()
            .map(|page_number| {
                if cancelled.load(Ordering::Acquire) {
                    return Ok(PageOutcome::Cancelled { page: page_number });
                }

                let outcome = process_page(source, page_number, context).and_then(|outcome| {
                    print_outcome(&outcome)?;
                    Ok(outcome)
                });
                if outcome.is_err() {
                    cancelled.store(true, Ordering::Release);
                }
                outcome
            })
            .collect()
    });

    first_fatal(results)
}

// Results are in page order, so the first error belongs to the lowest failing page.
pub(crate) fn first_fatal(results: Vec<Result<PageOutcome>>) -> Result<Vec<PageOutcome>> {
    let mut outcomes = Vec::with_capacity(results.len());
    for result in results {
        outcomes.push(result?);
    }
    Ok(outcomes)
}

fn print_outcome(outcome: &PageOutcome) -> Result<()> {
    let mut stdout = io::stdout().lock();
    for line in outcome.console_lines() {
        writeln!(stdout, "{line}").context("failed to write progress line")?;
    }
    Ok(())
}

fn build_report(
    pdf_path: &Path,
    outcomes: &[PageOutcome],
    indexed_files: usize,
    dry_run: bool,
) -> Result<RunReport> {
    let mut pages = outcomes.iter().map(page_report).collect::<Vec<_>>();
    pages.sort_by_key(|page| page.page);

    Ok(RunReport {
        report_version: REPORT_VERSION,
        generated_at: now_utc_string(),
        source_pdf: pdf_path.display().to_string(),
        source_sha256: sha256_file(pdf_path)?,
        page_count: outcomes.len(),
        indexed_files,
        dry_run,
        pages,
    })
}

pub(crate) fn page_report(outcome: &PageOutcome) -> PageReport {
    let mut report = PageReport {
        page: outcome.page(),
        status: String::new(),
        skip_reason: None,
        label: None,
        identifiers: Vec::new(),
        copied: Vec::new(),
        remapped: Vec::new(),
        not_found: Vec::new(),
    };

    match outcome {
        PageOutcome::Skipped { reason, .. } => {
            report.status = "skipped".to_string();
            report.skip_reason = Some(*reason);
        }
        PageOutcome::Cancelled { .. } => {
            report.status = "cancelled".to_string();
        }
        PageOutcome::Processed {
            label,
            identifiers,
            events,
            ..
        } => {
            report.status = "processed".to_string();
            report.label = Some(label.clone());
            report.identifiers = identifiers.clone();
            for event in events {
                match event {
                    OutputEvent::Copied { target, .. } => report.copied.push(target.clone()),
                    OutputEvent::Remapped {
                        tried_key, target, ..
                    } => report.remapped.push(format!("{tried_key} -> {target}")),
                    OutputEvent::NotFound { identifier } => {
                        report.not_found.push(identifier.clone())
                    }
                }
            }
        }
    }

    report
}
