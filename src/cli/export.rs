use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use polycubes::{for_cube_count, Coord, ListReader, PolyCube, Result};

use crate::ExportOpts;

/// One quad of a cube surface, with its outward normal.
struct SquareFace {
    vertices: [[f32; 3]; 4],
    normal: [f32; 3],
}

fn cube_faces(cube: Coord, offset: [f32; 2]) -> [SquareFace; 6] {
    let (x, y, z) = (
        cube.x as f32 + offset[0],
        cube.y as f32 + offset[1],
        cube.z as f32,
    );

    [
        SquareFace {
            vertices: [
                [x - 0.5, y + 0.5, z - 0.5],
                [x + 0.5, y + 0.5, z - 0.5],
                [x + 0.5, y - 0.5, z - 0.5],
                [x - 0.5, y - 0.5, z - 0.5],
            ],
            normal: [0.0, 0.0, -1.0],
        },
        SquareFace {
            vertices: [
                [x - 0.5, y - 0.5, z + 0.5],
                [x + 0.5, y - 0.5, z + 0.5],
                [x + 0.5, y + 0.5, z + 0.5],
                [x - 0.5, y + 0.5, z + 0.5],
            ],
            normal: [0.0, 0.0, 1.0],
        },
        SquareFace {
            vertices: [
                [x - 0.5, y - 0.5, z - 0.5],
                [x + 0.5, y - 0.5, z - 0.5],
                [x + 0.5, y - 0.5, z + 0.5],
                [x - 0.5, y - 0.5, z + 0.5],
            ],
            normal: [0.0, -1.0, 0.0],
        },
        SquareFace {
            vertices: [
                [x - 0.5, y + 0.5, z + 0.5],
                [x + 0.5, y + 0.5, z + 0.5],
                [x + 0.5, y + 0.5, z - 0.5],
                [x - 0.5, y + 0.5, z - 0.5],
            ],
            normal: [0.0, 1.0, 0.0],
        },
        SquareFace {
            vertices: [
                [x - 0.5, y - 0.5, z + 0.5],
                [x - 0.5, y + 0.5, z + 0.5],
                [x - 0.5, y + 0.5, z - 0.5],
                [x - 0.5, y - 0.5, z - 0.5],
            ],
            normal: [-1.0, 0.0, 0.0],
        },
        SquareFace {
            vertices: [
                [x + 0.5, y - 0.5, z - 0.5],
                [x + 0.5, y + 0.5, z - 0.5],
                [x + 0.5, y + 0.5, z + 0.5],
                [x + 0.5, y - 0.5, z + 0.5],
            ],
            normal: [1.0, 0.0, 0.0],
        },
    ]
}

fn export_impl<const N: usize>(reader: &mut ListReader, outfile: &Path) -> Result<()> {
    let polycubes: Vec<PolyCube<N>> = reader.slurp()?;

    // Spread the shapes out on a square grid.
    let grid_width = (polycubes.len() as f64).sqrt() as usize;
    let grid_width = grid_width.max(1);
    let spacing = (2 * N) as f32;

    let mut faces = Vec::new();
    for (i, pc) in polycubes.iter().enumerate() {
        let offset = [
            spacing * (i % grid_width) as f32,
            spacing * (i / grid_width) as f32,
        ];
        for cube in pc.cubes() {
            faces.extend(cube_faces(*cube, offset));
        }
    }

    let mut out = BufWriter::new(File::create(outfile)?);

    out.write_all(b"# List of vertices\n")?;
    for face in &faces {
        for [x, y, z] in &face.vertices {
            writeln!(out, "v {x} {y} {z}")?;
        }
    }

    out.write_all(b"# List of vertex normals\n")?;
    for face in &faces {
        let [x, y, z] = face.normal;
        writeln!(out, "vn {x} {y} {z}")?;
    }

    out.write_all(b"# List of faces\n")?;
    for i in 0..faces.len() {
        let v0 = 4 * i + 1;
        let vn = i + 1;
        writeln!(
            out,
            "f {}//{vn} {}//{vn} {}//{vn} {}//{vn}",
            v0,
            v0 + 1,
            v0 + 2,
            v0 + 3
        )?;
    }

    out.flush()?;

    Ok(())
}

pub fn export(opts: &ExportOpts) -> Result<()> {
    let outfile = match &opts.outfile {
        Some(path) => path.clone(),
        None => opts.infile.with_extension("obj"),
    };

    let mut reader = ListReader::open(&opts.infile)?;
    let cube_count = reader.cube_count();

    for_cube_count!(cube_count, export_impl::<N>(&mut reader, &outfile))
}
