//! Small helpers shared by the generator: the K+1-way unique merge, the
//! runtime size dispatch, and log timestamps.

use chrono::{DateTime, Local};

use crate::Result;

/// Merge one sorted fallible stream and `K` sorted slices, emitting each
/// distinct value exactly once, in ascending order.
///
/// Inputs must individually be sorted ascending; duplicates within a slice,
/// between slices, or between a slice and the stream are all collapsed.
/// Returns the number of values emitted.
pub fn sorted_unique_merge<T, I, F>(old: I, new: &[Vec<T>], mut emit: F) -> Result<u64>
where
    T: Copy + Ord,
    I: Iterator<Item = Result<T>>,
    F: FnMut(&T) -> Result<()>,
{
    let mut old = old.peekable();
    let mut pos = vec![0usize; new.len()];
    let mut emitted = 0u64;

    loop {
        let old_head = match old.peek() {
            None => None,
            Some(Ok(v)) => Some(*v),
            Some(Err(_)) => match old.next() {
                Some(Err(e)) => return Err(e),
                _ => unreachable!(),
            },
        };

        let mut min = old_head;
        for (stream, &at) in new.iter().zip(&pos) {
            if let Some(&v) = stream.get(at) {
                if min.map_or(true, |m| v < m) {
                    min = Some(v);
                }
            }
        }

        let Some(value) = min else {
            break;
        };

        emit(&value)?;
        emitted += 1;

        if old_head == Some(value) {
            old.next();
        }
        for (stream, at) in new.iter().zip(pos.iter_mut()) {
            while stream.get(*at) == Some(&value) {
                *at += 1;
            }
        }
    }

    Ok(emitted)
}

/// Format a wall-clock instant for progress logs. Not on the correctness
/// path; merge and ETA lines use it.
pub fn format_local_time(fmt: &str, t: DateTime<Local>) -> String {
    t.format(fmt).to_string()
}

/// Select a size-monomorphized implementation from a runtime cube count.
///
/// `for_cube_count!(n, f::<N>(args...))` calls `f::<n>(args...)` for
/// `n` in `1..=18`; the two-parameter form covers seed sizes `1..=17` and
/// passes the successor size as well, `f::<n, n + 1>(args...)`. Any other
/// count evaluates to `Err(Error::UnsupportedSize(n))`, so `f` must return
/// `crate::Result`.
#[macro_export]
macro_rules! for_cube_count {
    ($count:expr, $f:ident::<N>($($arg:expr),* $(,)?)) => {
        match $count {
            1 => $f::<1>($($arg),*),
            2 => $f::<2>($($arg),*),
            3 => $f::<3>($($arg),*),
            4 => $f::<4>($($arg),*),
            5 => $f::<5>($($arg),*),
            6 => $f::<6>($($arg),*),
            7 => $f::<7>($($arg),*),
            8 => $f::<8>($($arg),*),
            9 => $f::<9>($($arg),*),
            10 => $f::<10>($($arg),*),
            11 => $f::<11>($($arg),*),
            12 => $f::<12>($($arg),*),
            13 => $f::<13>($($arg),*),
            14 => $f::<14>($($arg),*),
            15 => $f::<15>($($arg),*),
            16 => $f::<16>($($arg),*),
            17 => $f::<17>($($arg),*),
            18 => $f::<18>($($arg),*),
            other => Err($crate::Error::UnsupportedSize(other)),
        }
    };
    ($count:expr, $f:ident::<M, N>($($arg:expr),* $(,)?)) => {
        match $count {
            1 => $f::<1, 2>($($arg),*),
            2 => $f::<2, 3>($($arg),*),
            3 => $f::<3, 4>($($arg),*),
            4 => $f::<4, 5>($($arg),*),
            5 => $f::<5, 6>($($arg),*),
            6 => $f::<6, 7>($($arg),*),
            7 => $f::<7, 8>($($arg),*),
            8 => $f::<8, 9>($($arg),*),
            9 => $f::<9, 10>($($arg),*),
            10 => $f::<10, 11>($($arg),*),
            11 => $f::<11, 12>($($arg),*),
            12 => $f::<12, 13>($($arg),*),
            13 => $f::<13, 14>($($arg),*),
            14 => $f::<14, 15>($($arg),*),
            15 => $f::<15, 16>($($arg),*),
            16 => $f::<16, 17>($($arg),*),
            17 => $f::<17, 18>($($arg),*),
            other => Err($crate::Error::UnsupportedSize(other)),
        }
    };
}
