use std::path::PathBuf;
use std::time::Instant;

use polycubes::{escalate, Coord, Error, ListReader, ListWriter, PolyCube, Result};

use crate::GenerateOpts;

/// Write the size-1 list: the single unit cube.
fn write_unit_list(path: &PathBuf) -> Result<()> {
    let mut writer = ListWriter::<1>::create(path)?;
    writer.write(&PolyCube::new([Coord::new(0, 0, 0)]))?;
    writer.finish()
}

pub fn generate(opts: &GenerateOpts) -> Result<()> {
    let out_dir = &opts.out_dir;

    if opts.maxcount < 1 {
        return Err(Error::UnsupportedSize(opts.maxcount));
    }

    let list_path = |n: usize| out_dir.join(format!("polycubes_{n}.bin"));

    // The first escalation reads either the given seed list or the freshly
    // written unit-cube list.
    let (mut infile, start) = match &opts.seed {
        Some(seed) => {
            let reader = ListReader::open(seed)?;
            (seed.clone(), reader.cube_count())
        }
        None => {
            let path = list_path(1);
            write_unit_list(&path)?;
            println!("Wrote 1 1-cube to {}", path.display());
            (path, 1)
        }
    };

    let start_time = Instant::now();

    for count in start + 1..=opts.maxcount {
        let outfile = list_path(count);

        let written = escalate(&infile, &outfile)?;
        println!(
            "Wrote {written} {count}-cubes to {} ({} ms total)",
            outfile.display(),
            start_time.elapsed().as_millis(),
        );

        infile = outfile;
    }

    Ok(())
}
