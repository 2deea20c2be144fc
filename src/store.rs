//! The on-disk deduplicated store the streaming merge folds batches into.

use std::fs;
use std::path::{Path, PathBuf};

use crate::list::{ListReader, ListWriter};
use crate::polycube::PolyCube;
use crate::util::sorted_unique_merge;
use crate::Result;

/// A persistent, sorted, deduplicated set of canonical `N`-cubes.
///
/// The set lives in a sorted list file next to the final output path,
/// alternating between two hidden temp names: each merge streams the
/// current cache against the new sorted batches into the other file, then
/// removes the stale one. Since the cache is itself a complete list file,
/// committing is a single rename.
///
/// The store owns its temp files for the duration of one generator run;
/// whatever is left over is removed on drop.
pub struct SortedFileStore<const N: usize> {
    out_file: PathBuf,
    tmp: [PathBuf; 2],
    current: Option<usize>,
    len: u64,
}

impl<const N: usize> SortedFileStore<N> {
    pub fn new(out_file: impl Into<PathBuf>) -> Self {
        let out_file = out_file.into();

        let name = out_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = [1, 2].map(|i| out_file.with_file_name(format!(".{name}.tmp.{i}")));

        Self {
            out_file,
            tmp,
            current: None,
            len: 0,
        }
    }

    /// The number of distinct values currently cached.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fold sorted batches into the cache in one pass.
    ///
    /// Every batch must be sorted ascending. Values already present are
    /// absorbed without error. Returns the new distinct count.
    pub fn merge_batches(&mut self, batches: &[Vec<PolyCube<N>>]) -> Result<u64> {
        let dst = match self.current {
            Some(0) => 1,
            _ => 0,
        };

        let mut writer = ListWriter::<N>::create(&self.tmp[dst])?;
        let mut emit = |pc: &PolyCube<N>| writer.write(pc);

        let count = match self.current {
            Some(src) => {
                let mut reader = ListReader::open(&self.tmp[src])?;
                sorted_unique_merge(reader.cubes::<N>()?, batches, &mut emit)?
            }
            None => sorted_unique_merge(std::iter::empty(), batches, &mut emit)?,
        };

        writer.finish()?;

        if let Some(src) = self.current {
            fs::remove_file(&self.tmp[src])?;
        }
        self.current = Some(dst);
        self.len = count;

        Ok(count)
    }

    /// Move the cache to the output path. An empty store writes a
    /// header-only list.
    pub fn commit(mut self) -> Result<u64> {
        match self.current.take() {
            Some(src) => fs::rename(&self.tmp[src], &self.out_file)?,
            None => ListWriter::<N>::create(&self.out_file)?.finish()?,
        }

        Ok(self.len)
    }

    pub fn out_file(&self) -> &Path {
        &self.out_file
    }
}

impl<const N: usize> Drop for SortedFileStore<N> {
    fn drop(&mut self) {
        for path in &self.tmp {
            let _ = fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coord;
    use crate::search::expand_range;

    fn sorted_batch(shapes: hashbrown::HashSet<PolyCube<3>>) -> Vec<PolyCube<3>> {
        let mut batch: Vec<_> = shapes.into_iter().collect();
        batch.sort_unstable();
        batch
    }

    fn trominoes() -> Vec<PolyCube<3>> {
        let domino = PolyCube::new([Coord::new(0, 0, 0), Coord::new(0, 0, 1)]);
        sorted_batch(expand_range::<2, 3>(&[domino]))
    }

    #[test]
    fn merges_batches_and_commits_sorted_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("trominoes.bin");

        let mut store = SortedFileStore::<3>::new(&out);
        let all = trominoes();

        // Overlapping halves; the second merge must not double-count.
        assert_eq!(store.merge_batches(&[vec![all[0]]]).unwrap(), 1);
        assert_eq!(store.merge_batches(&[all.clone()]).unwrap(), 2);
        assert_eq!(store.len(), 2);

        let committed = store.commit().unwrap();
        assert_eq!(committed, 2);

        let mut reader = ListReader::open(&out).unwrap();
        assert_eq!(reader.slurp::<3>().unwrap(), all);
    }

    #[test]
    fn duplicate_heavy_batches_collapse() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dups.bin");

        let mut store = SortedFileStore::<3>::new(&out);
        let all = trominoes();

        let count = store
            .merge_batches(&[all.clone(), all.clone(), all.clone()])
            .unwrap();
        assert_eq!(count, all.len() as u64);
    }

    #[test]
    fn temp_files_are_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cleanup.bin");

        let mut store = SortedFileStore::<3>::new(&out);
        store.merge_batches(&[trominoes()]).unwrap();
        drop(store);

        let left: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert!(left.is_empty(), "stray files: {left:?}");
    }

    #[test]
    fn committing_an_empty_store_writes_a_bare_header() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.bin");

        let store = SortedFileStore::<4>::new(&out);
        assert_eq!(store.commit().unwrap(), 0);

        assert_eq!(fs::metadata(&out).unwrap().len(), 12);
    }
}
