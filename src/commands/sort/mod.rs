mod classify;
mod fields;
mod file_index;
mod identifiers;
mod output;
mod page_source;
mod reconcile;
mod run;

pub(crate) use run::{dump_page, run};
