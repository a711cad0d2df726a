use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;

// ASCII word characters only, e.g. `ABCD-EF-GH/x/`.
const PART_REFERENCE_PATTERN: &str = r"((?-u:\w){4}-(?-u:\w)+-(?-u:\w)+)/(?-u:\w)+/";

#[derive(Debug, Clone)]
pub(crate) struct PartPattern {
    regex: Regex,
}

impl PartPattern {
    pub(crate) fn new() -> Result<Self> {
        let regex = Regex::new(PART_REFERENCE_PATTERN)
            .context("failed to compile part reference regex")?;
        Ok(Self { regex })
    }

    pub(crate) fn extract_identifiers(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::<&str>::new();
        self.regex
            .captures_iter(text)
            .filter_map(|captures| captures.get(1))
            .map(|value| value.as_str())
            .filter(|identifier| seen.insert(*identifier))
            .map(ToOwned::to_owned)
            .collect()
    }
}
