use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::cli::LabelLayout;
use crate::model::PositionedFragment;

pub(crate) const UNKNOWN_LABEL: &str = "unknown";

const DEFAULT_X_DECIMALS: u32 = 3;
const DEFAULT_MIN_Y_GAP: f64 = 2.0;
const DEFAULT_TRAILING_FILLER: &str = "-_.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct FieldZone {
    pub x: f64,
    #[serde(default)]
    pub max_y: Option<f64>,
    #[serde(default = "default_dedup")]
    pub dedup: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ZoneTable {
    pub zones: Vec<FieldZone>,
    #[serde(default = "default_x_decimals")]
    pub x_decimals: u32,
    #[serde(default = "default_min_y_gap")]
    pub min_y_gap: f64,
    #[serde(default = "default_trailing_filler")]
    pub trailing_filler: String,
}

fn default_dedup() -> bool {
    true
}

fn default_x_decimals() -> u32 {
    DEFAULT_X_DECIMALS
}

fn default_min_y_gap() -> f64 {
    DEFAULT_MIN_Y_GAP
}

fn default_trailing_filler() -> String {
    DEFAULT_TRAILING_FILLER.to_string()
}

impl ZoneTable {
    pub(crate) fn for_layout(layout: LabelLayout) -> Self {
        let zones = match layout {
            LabelLayout::MaterialMap => vec![
                FieldZone {
                    x: 520.56,
                    max_y: Some(200.0),
                    dedup: true,
                },
                FieldZone {
                    x: 736.735,
                    max_y: None,
                    dedup: true,
                },
            ],
            LabelLayout::NcName => vec![FieldZone {
                x: 73.8,
                max_y: None,
                dedup: true,
            }],
        };

        Self {
            zones,
            x_decimals: DEFAULT_X_DECIMALS,
            min_y_gap: DEFAULT_MIN_Y_GAP,
            trailing_filler: default_trailing_filler(),
        }
    }

    pub(crate) fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let table: Self = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse zone table {}", path.display()))?;
        if table.zones.is_empty() {
            bail!("zone table {} defines no zones", path.display());
        }
        Ok(table)
    }

    fn zone_for(&self, x: f64) -> Option<&FieldZone> {
        let scale = 10_f64.powi(self.x_decimals as i32);
        let rounded = (x * scale).round() / scale;
        let tolerance = 0.5 / scale;
        self.zones
            .iter()
            .find(|zone| (rounded - zone.x).abs() <= tolerance)
    }
}

#[derive(Debug, Default)]
struct LabelScan {
    last_accepted_y: Option<f64>,
    label: String,
}

pub(crate) fn extract_group_label(fragments: &[PositionedFragment], table: &ZoneTable) -> String {
    let scan = fragments
        .iter()
        .fold(LabelScan::default(), |mut scan, fragment| {
            let Some(zone) = table.zone_for(fragment.x) else {
                return scan;
            };
            if zone.max_y.is_some_and(|max_y| fragment.y > max_y) {
                return scan;
            }
            if zone.dedup
                && scan
                    .last_accepted_y
                    .is_some_and(|last_y| (fragment.y - last_y).abs() <= table.min_y_gap)
            {
                return scan;
            }

            scan.last_accepted_y = Some(fragment.y);
            scan.label.push_str(&fragment.text);
            scan
        });

    finish_label(&scan.label, &table.trailing_filler)
}

fn finish_label(raw: &str, trailing_filler: &str) -> String {
    let label = raw
        .trim()
        .trim_end_matches(|character: char| {
            trailing_filler.contains(character) || character.is_whitespace()
        })
        .trim()
        .replace(['/', '\\'], "_");

    if label.is_empty() || label.chars().all(|character| character == '.') {
        UNKNOWN_LABEL.to_string()
    } else {
        label
    }
}
