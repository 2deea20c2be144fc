//! Integer cube coordinates and the rotation group of the cube.

use core::fmt;
use core::ops::{Add, AddAssign, Sub, SubAssign};

use crate::Error;

/// The coordinates of one unit cube, as a signed 8-bit triple.
///
/// Ordering is lexicographic on `(x, y, z)`. Callers must keep components
/// within `i8` range; shapes of up to 30 cubes stay well inside it once
/// translated to the non-negative octant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub x: i8,
    pub y: i8,
    pub z: i8,
}

/// One of the 24 proper rotations of the cube. Index 0 is the identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rotation(u8);

impl Rotation {
    pub const COUNT: usize = 24;
    pub const IDENTITY: Rotation = Rotation(0);

    /// Validate a raw orientation index.
    pub fn new(index: u8) -> Result<Self, Error> {
        if (index as usize) < Self::COUNT {
            Ok(Self(index))
        } else {
            Err(Error::InvalidOrientation(index))
        }
    }

    /// All 24 rotations, in index order.
    pub fn all() -> impl Iterator<Item = Rotation> {
        (0..Self::COUNT as u8).map(Rotation)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

impl Coord {
    pub const fn new(x: i8, y: i8, z: i8) -> Self {
        Self { x, y, z }
    }

    /// The six axis-aligned unit offsets, one per cube face.
    pub const FACE_STEPS: [Coord; 6] = [
        Coord::new(1, 0, 0),
        Coord::new(-1, 0, 0),
        Coord::new(0, 1, 0),
        Coord::new(0, -1, 0),
        Coord::new(0, 0, 1),
        Coord::new(0, 0, -1),
    ];

    /// Apply one of the 24 proper rotations of the cube.
    ///
    /// Each rotation is a signed permutation of the components; the table
    /// below is the definition of the orientation indices.
    pub fn rotate(self, r: Rotation) -> Coord {
        let Coord { x, y, z } = self;
        match r.0 {
            0 => Coord::new(x, y, z),
            1 => Coord::new(y, -x, z),
            2 => Coord::new(-x, -y, z),
            3 => Coord::new(-y, x, z),
            4 => Coord::new(z, y, -x),
            5 => Coord::new(y, -z, -x),
            6 => Coord::new(-z, -y, -x),
            7 => Coord::new(-y, z, -x),
            8 => Coord::new(-x, y, -z),
            9 => Coord::new(y, x, -z),
            10 => Coord::new(x, -y, -z),
            11 => Coord::new(-y, -x, -z),
            12 => Coord::new(-z, y, x),
            13 => Coord::new(y, z, x),
            14 => Coord::new(z, -y, x),
            15 => Coord::new(-y, -z, x),
            16 => Coord::new(x, z, -y),
            17 => Coord::new(z, -x, -y),
            18 => Coord::new(-x, -z, -y),
            19 => Coord::new(-z, x, -y),
            20 => Coord::new(-x, z, y),
            21 => Coord::new(z, x, y),
            22 => Coord::new(x, -z, y),
            23 => Coord::new(-z, -x, y),
            _ => unreachable!("Rotation indices are validated on construction"),
        }
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl AddAssign for Coord {
    fn add_assign(&mut self, rhs: Coord) {
        *self = *self + rhs;
    }
}

impl SubAssign for Coord {
    fn sub_assign(&mut self, rhs: Coord) {
        *self = *self - rhs;
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.x, self.y, self.z)
    }
}

/// Componentwise minimum over a sequence of coordinates.
pub fn min_coords(coords: impl IntoIterator<Item = Coord>) -> Coord {
    let mut min = Coord::new(i8::MAX, i8::MAX, i8::MAX);

    for c in coords {
        min.x = min.x.min(c.x);
        min.y = min.y.min(c.y);
        min.z = min.z.min(c.z);
    }

    min
}
