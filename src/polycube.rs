//! The polycube value type and its normal form.

use core::fmt;
use std::io::{Read, Write};

use crate::coord::{min_coords, Coord, Rotation};

/// A polycube of `N` face-connected unit cubes, as the coordinates of its
/// cube centers.
///
/// The representation invariants of a normalized value are that the
/// componentwise minimum over all coordinates is the origin and that the
/// coordinates are sorted ascending. [`PolyCube::canonical`] additionally
/// picks the unique representative of the shape's orbit under the 24 proper
/// rotations of the cube.
///
/// Connectivity is a construction invariant: values are only ever built
/// from the unit cube by attaching face neighbors, so it is never checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolyCube<const N: usize> {
    cubes: [Coord; N],
}

impl<const N: usize> PolyCube<N> {
    pub const CUBE_COUNT: usize = N;

    pub fn new(cubes: [Coord; N]) -> Self {
        Self { cubes }
    }

    pub fn cubes(&self) -> &[Coord; N] {
        &self.cubes
    }

    /// Rotate the shape and renormalize: every coordinate is rotated, the
    /// whole shape is translated so the componentwise minimum is the
    /// origin, and the coordinates are re-sorted.
    pub fn rotated(&self, r: Rotation) -> Self {
        let mut cubes = self.cubes.map(|c| c.rotate(r));

        let origin = min_coords(cubes);
        for block in &mut cubes {
            *block -= origin;
        }

        // Coordinate order carries no meaning; sorted is the normal form.
        cubes.sort_unstable();

        Self { cubes }
    }

    /// The canonical form of this shape: the lexicographically smallest
    /// coordinate tuple over all 24 rotations.
    pub fn canonical(&self) -> Self {
        Rotation::all().map(|r| self.rotated(r)).min().unwrap()
    }

    /// Translate every coordinate by `offset`, without renormalizing.
    pub fn translated(&self, offset: Coord) -> Self {
        Self {
            cubes: self.cubes.map(|c| c + offset),
        }
    }

    /// Read one record of `3 * N` bytes, one `i8` triple per coordinate.
    pub fn unpack(mut from: impl Read) -> std::io::Result<Self> {
        let mut buf = [[0u8; 3]; N];
        from.read_exact(buf.as_flattened_mut())?;

        let cubes = buf.map(|[x, y, z]| Coord::new(x as i8, y as i8, z as i8));

        Ok(Self { cubes })
    }

    /// Write this shape as one record of `3 * N` bytes.
    pub fn pack(&self, mut to: impl Write) -> std::io::Result<()> {
        let mut buf = [[0u8; 3]; N];
        for (bytes, block) in buf.iter_mut().zip(&self.cubes) {
            *bytes = [block.x as u8, block.y as u8, block.z as u8];
        }

        to.write_all(buf.as_flattened())
    }
}

impl<const N: usize> fmt::Display for PolyCube<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[[ ")?;
        for block in &self.cubes {
            write!(f, "{block} ")?;
        }
        write!(f, "]]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tripod() -> PolyCube<4> {
        PolyCube::new([
            Coord::new(0, 0, 0),
            Coord::new(1, 0, 0),
            Coord::new(0, 1, 0),
            Coord::new(0, 0, 1),
        ])
    }

    #[test]
    fn canonical_is_idempotent() {
        let canonical = tripod().canonical();
        assert_eq!(canonical.canonical(), canonical);
    }

    #[test]
    fn canonical_is_rotation_invariant() {
        let canonical = tripod().canonical();

        for r in Rotation::all() {
            assert_eq!(tripod().rotated(r).canonical(), canonical);
        }
    }

    #[test]
    fn canonical_is_translation_invariant() {
        let canonical = tripod().canonical();

        for offset in [
            Coord::new(5, 0, 0),
            Coord::new(-3, 7, 1),
            Coord::new(0, -10, 10),
        ] {
            assert_eq!(tripod().translated(offset).canonical(), canonical);
        }
    }

    /// The sole canonical 2-cube points along the z axis.
    #[test]
    fn canonical_domino() {
        let domino = PolyCube::new([Coord::new(4, 4, 4), Coord::new(5, 4, 4)]);

        assert_eq!(
            domino.canonical().cubes(),
            &[Coord::new(0, 0, 0), Coord::new(0, 0, 1)]
        );
    }

    #[test]
    fn rotated_normalizes_translation_and_order() {
        let shape = PolyCube::new([
            Coord::new(3, 3, 4),
            Coord::new(3, 3, 3),
            Coord::new(4, 3, 3),
        ]);

        let normal = shape.rotated(Rotation::IDENTITY);

        assert_eq!(min_coords(*normal.cubes()), Coord::new(0, 0, 0));
        assert!(normal.cubes().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn pack_unpack_round_trip() {
        let shape = tripod().canonical();

        let mut bytes = Vec::new();
        shape.pack(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 12);

        let read = PolyCube::<4>::unpack(&bytes[..]).unwrap();
        assert_eq!(read, shape);
    }

    #[test]
    fn negative_components_survive_the_byte_format() {
        let shape = PolyCube::new([Coord::new(-1, 0, 2), Coord::new(-1, 0, 3)]);

        let mut bytes = Vec::new();
        shape.pack(&mut bytes).unwrap();

        let read = PolyCube::<2>::unpack(&bytes[..]).unwrap();
        assert_eq!(read, shape);
    }
}
