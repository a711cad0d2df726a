use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "dxfsort",
    version,
    about = "Sort cutting files into per-sheet folders from the part references printed on a drawing PDF"
)]
pub struct Cli {
    /// Drawing PDF to scan.
    pub pdf: PathBuf,

    #[arg(long, default_value = "dxf")]
    pub dxf_dir: PathBuf,

    #[arg(long, default_value = "out")]
    pub out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = LabelLayout::MaterialMap)]
    pub layout: LabelLayout,

    /// JSON zone table overriding the built-in layout.
    #[arg(long)]
    pub zones: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = KeyPolicyArg::LastThree)]
    pub key_policy: KeyPolicyArg,

    /// Worker threads for page processing.
    #[arg(long)]
    pub jobs: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the positioned fragments (`text x y`) of one page and exit.
    ///
    /// Fragments are pdftotext word boxes: x is the left edge and y the
    /// bottom edge measured up from the page bottom. Zone tables taken from
    /// glyph-origin coordinates, or from rotated/vertical label text, need
    /// recalibrating against this output.
    #[arg(long)]
    pub dump_page: Option<usize>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum LabelLayout {
    MaterialMap,
    NcName,
}

impl LabelLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MaterialMap => "material-map",
            Self::NcName => "nc-name",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum KeyPolicyArg {
    LastThree,
    FullStem,
}

impl KeyPolicyArg {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LastThree => "last-three",
            Self::FullStem => "full-stem",
        }
    }
}
