use std::path::PathBuf;

use clap::{Args, Parser};
use polycubes::ListReader;

mod export;
mod generate;

use export::export;
use generate::generate;

#[derive(Clone, Parser)]
#[clap(about = "Enumerate free polycubes")]
pub enum Opts {
    /// Generate lists of free polycubes, one file per size
    Generate(GenerateOpts),
    /// Render a polycube list as a Wavefront OBJ mesh
    Export(ExportOpts),
    /// Print summary information about list files
    Info {
        #[clap(required = true)]
        path: Vec<PathBuf>,
    },
}

#[derive(Clone, Args)]
pub struct GenerateOpts {
    /// The largest cube count to enumerate
    #[clap(long, short = 'n', default_value_t = 6)]
    pub maxcount: usize,

    /// Resume from an existing list file instead of the unit cube
    #[clap(long, short = 's')]
    pub seed: Option<PathBuf>,

    /// Directory the list files are written to
    #[clap(default_value = ".")]
    pub out_dir: PathBuf,
}

#[derive(Clone, Args)]
pub struct ExportOpts {
    /// The list file to render
    pub infile: PathBuf,

    /// Output path; defaults to the input with an `.obj` extension
    pub outfile: Option<PathBuf>,
}

fn info(path: &PathBuf) -> polycubes::Result<()> {
    let reader = ListReader::open(path)?;

    println!();
    println!("Info for {}", path.display());
    println!("Cubes per polycube: {}", reader.cube_count());
    println!("Amount of polycubes: {}", reader.record_count());

    Ok(())
}

fn main() {
    let opts = Opts::parse();

    let result = match &opts {
        Opts::Generate(g) => generate(g),
        Opts::Export(e) => export(e),
        Opts::Info { path } => path.iter().try_for_each(info),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
