use crate::model::{MatchResult, ResolvedPart};

use super::file_index::FileIndex;

const FALLBACK_CODES: [&str; 3] = ["BA", "BB", "BC"];
const FALLBACK_CODE_OFFSET: usize = 5;

pub(crate) fn substitute_code(identifier: &str, offset: usize, code: &str) -> Option<String> {
    let end = offset.checked_add(code.len())?;
    if end > identifier.len()
        || !identifier.is_char_boundary(offset)
        || !identifier.is_char_boundary(end)
    {
        return None;
    }

    let mut key = String::with_capacity(identifier.len());
    key.push_str(&identifier[..offset]);
    key.push_str(code);
    key.push_str(&identifier[end..]);
    Some(key)
}

pub(crate) fn fallback_keys(identifier: &str) -> Vec<String> {
    FALLBACK_CODES
        .iter()
        .filter_map(|code| substitute_code(identifier, FALLBACK_CODE_OFFSET, code))
        .filter(|key| key != identifier)
        .collect()
}

pub(crate) fn resolve(identifier: &str, index: &FileIndex) -> Vec<MatchResult> {
    let mut matches = Vec::new();

    if let Some(path) = index.get(identifier) {
        matches.push(MatchResult::Exact { path: path.clone() });
    }

    for tried_key in fallback_keys(identifier) {
        let Some(path) = index.get(&tried_key) else {
            continue;
        };
        matches.push(MatchResult::Remapped {
            path: path.clone(),
            tried_key,
        });
    }

    if matches.is_empty() {
        matches.push(MatchResult::NotFound);
    }
    matches
}

pub(crate) fn resolve_all(identifiers: &[String], index: &FileIndex) -> Vec<ResolvedPart> {
    identifiers
        .iter()
        .map(|identifier| ResolvedPart {
            identifier: identifier.clone(),
            matches: resolve(identifier, index),
        })
        .collect()
}
