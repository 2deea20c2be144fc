pub mod coord;
pub use coord::{Coord, Rotation};

pub mod polycube;
pub use polycube::PolyCube;

pub mod list;
pub use list::{ListReader, ListWriter};

pub mod search;

pub mod store;

pub mod generator;
pub use generator::escalate;

pub mod util;

/// The largest seed size the runtime dispatch supports. Lists of
/// `MAX_SEED_CUBES`-cubes can still be escalated once more, so polycubes of
/// up to `MAX_SEED_CUBES + 1` cubes exist as values.
pub const MAX_SEED_CUBES: usize = 17;

/// Errors surfaced by the enumeration engine and the list codec.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("orientation must be in [0, 24), got {0}")]
    InvalidOrientation(u8),

    #[error("unsupported cube count {0} (supported: 1..={MAX_SEED_CUBES})")]
    UnsupportedSize(usize),

    #[error("invalid file magic")]
    BadMagic,

    #[error("expected {expected}-cube records, file contains {found}-cube records")]
    BadSize { expected: usize, found: usize },

    #[error("file length is not a whole number of records")]
    Truncated,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("merge worker panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, Error>;

pub fn make_bar(len: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let bar = ProgressBar::new(len);

    let pos_width = format!("{len}").len();

    let template =
        format!("[{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos:>{pos_width}}}/{{len}} {{msg}} remaining: [{{eta_precise}}]");

    bar.set_style(
        ProgressStyle::with_template(&template)
            .unwrap()
            .progress_chars("#>-"),
    );
    bar
}
