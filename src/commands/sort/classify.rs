use crate::model::{PageVerdict, SkipReason};

const SKIP_MARKERS: [(&str, SkipReason); 5] = [
    ("END A", SkipReason::Profile),
    ("MARKING PLAN", SkipReason::MarkingPlan),
    ("IN - COMING", SkipReason::InComing),
    ("OUT - GOING", SkipReason::OutGoing),
    ("BENDING TABLE", SkipReason::ProfileBendingTable),
];

pub(super) fn classify(page_text: &str) -> PageVerdict {
    SKIP_MARKERS
        .iter()
        .find(|(marker, _)| page_text.contains(marker))
        .map(|(_, reason)| PageVerdict::Skip(*reason))
        .unwrap_or(PageVerdict::Proceed)
}
