//! Generation of the size `N` list from the size `M = N - 1` seed list.
//!
//! Small inputs are expanded wholesale in memory. Past [`CHUNK_LEN`] seeds
//! the run becomes a two-stage pipeline: the calling thread keeps expanding
//! super-chunks while a merge worker folds finished batches into a
//! [`SortedFileStore`], so peak memory stays proportional to one batch of
//! results no matter how long the seed list is.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use chrono::Local;
use indicatif::ProgressBar;
use parking_lot::{Condvar, Mutex};
use rayon::prelude::*;

use crate::list::{ListReader, ListWriter};
use crate::polycube::PolyCube;
use crate::search::expand_range;
use crate::store::SortedFileStore;
use crate::util::format_local_time;
use crate::{make_bar, Error, Result};

/// Seeds per producer super-chunk: the count of 11-cubes. Below this the
/// whole result of a run fits comfortably in memory.
pub const CHUNK_LEN: u64 = 2_522_522;

/// Writes the deduplicated sorted list of all `N`-cubes reachable from a
/// seed list of `M`-cubes.
pub struct ListGenerator<const M: usize, const N: usize> {
    out_file: PathBuf,
    chunk_len: u64,
}

struct Handoff<const N: usize> {
    state: Mutex<HandoffState<N>>,
    ready: Condvar,
}

struct HandoffState<const N: usize> {
    batches: Vec<Vec<PolyCube<N>>>,
    done: bool,
    failed: bool,
}

impl<const N: usize> Handoff<N> {
    fn new() -> Self {
        Self {
            state: Mutex::new(HandoffState {
                batches: Vec::new(),
                done: false,
                failed: false,
            }),
            ready: Condvar::new(),
        }
    }

    fn push(&self, batch: Vec<PolyCube<N>>, is_last: bool) {
        {
            let mut state = self.state.lock();
            state.batches.push(batch);
            if is_last {
                state.done = true;
            }
        }
        self.ready.notify_one();
    }

    /// Abort the run: wake the worker and have it discard instead of
    /// committing.
    fn poison(&self) {
        {
            let mut state = self.state.lock();
            state.failed = true;
            state.done = true;
        }
        self.ready.notify_one();
    }

    fn take(&self) -> (Vec<Vec<PolyCube<N>>>, bool, bool) {
        let mut state = self.state.lock();
        while state.batches.is_empty() && !state.done {
            self.ready.wait(&mut state);
        }
        (
            core::mem::take(&mut state.batches),
            state.done,
            state.failed,
        )
    }
}

impl<const M: usize, const N: usize> ListGenerator<M, N> {
    pub fn new(out_file: impl Into<PathBuf>) -> Self {
        Self {
            out_file: out_file.into(),
            chunk_len: CHUNK_LEN,
        }
    }

    /// Override the super-chunk length. Smaller values trade throughput for
    /// a smaller memory ceiling; zero is a programming error.
    pub fn with_chunk_len(mut self, chunk_len: u64) -> Self {
        assert!(chunk_len > 0, "chunk length must be positive");
        self.chunk_len = chunk_len;
        self
    }

    /// Run the generation and return the number of `N`-cubes written.
    ///
    /// On any failure the output path is left untouched and temp files are
    /// removed; re-running is cheaper than recovering partial state.
    pub fn run(&self, reader: &mut ListReader, bar: &ProgressBar) -> Result<u64> {
        let seed_count = reader.record_count();

        if seed_count <= self.chunk_len {
            self.run_in_memory(reader, bar)
        } else {
            self.run_streaming(reader, seed_count, bar)
        }
    }

    fn run_in_memory(&self, reader: &mut ListReader, bar: &ProgressBar) -> Result<u64> {
        let seeds: Vec<PolyCube<M>> = reader.slurp()?;

        let result = expand_range::<M, N>(&seeds);
        bar.inc(seeds.len() as u64);

        let mut cubes: Vec<PolyCube<N>> = result.into_par_iter().collect();
        cubes.par_sort_unstable();

        let mut writer = ListWriter::<N>::create(&self.out_file)?;
        for pc in &cubes {
            writer.write(pc)?;
        }
        writer.finish()?;

        Ok(cubes.len() as u64)
    }

    fn run_streaming(
        &self,
        reader: &mut ListReader,
        seed_count: u64,
        bar: &ProgressBar,
    ) -> Result<u64> {
        let handoff = Arc::new(Handoff::<N>::new());
        let store = SortedFileStore::<N>::new(&self.out_file);

        let worker = thread::Builder::new().name("merger".into()).spawn({
            let handoff = Arc::clone(&handoff);
            let bar = bar.clone();
            move || merge_worker(store, handoff, bar)
        })?;

        match self.produce(reader, seed_count, &handoff, bar) {
            Ok(()) => {}
            Err(e) => {
                handoff.poison();
                let _ = worker.join();
                return Err(e);
            }
        }

        match worker.join() {
            Ok(count) => count,
            Err(_) => Err(Error::WorkerPanicked),
        }
    }

    fn produce(
        &self,
        reader: &mut ListReader,
        seed_count: u64,
        handoff: &Handoff<N>,
        bar: &ProgressBar,
    ) -> Result<()> {
        let mut cursor = reader.cubes::<M>()?;
        let mut submitted = 0u64;
        let t0 = Local::now();

        while submitted < seed_count {
            let chunk_len = self.chunk_len.min(seed_count - submitted);
            let seeds: Vec<PolyCube<M>> = cursor
                .by_ref()
                .take(chunk_len as usize)
                .collect::<Result<_>>()?;

            let result = expand_range::<M, N>(&seeds);

            let mut batch: Vec<PolyCube<N>> = result.into_par_iter().collect();
            batch.par_sort_unstable();

            submitted += chunk_len;
            handoff.push(batch, submitted == seed_count);

            bar.inc(chunk_len);

            let now = Local::now();
            let progress = submitted as f64 / seed_count as f64;
            let expected = chrono::Duration::milliseconds(
                ((now - t0).num_milliseconds() as f64 / progress) as i64,
            );
            bar.println(format!(
                "[{}] generating {N}-cubes: {:.3}% ({submitted}/{seed_count}); \
                 ETA (optimistic) {}",
                format_local_time("%FT%T", now),
                progress * 100.0,
                format_local_time("%R", t0 + expected),
            ));
        }

        Ok(())
    }
}

fn merge_worker<const N: usize>(
    mut store: SortedFileStore<N>,
    handoff: Arc<Handoff<N>>,
    bar: ProgressBar,
) -> Result<u64> {
    loop {
        let (batches, done, failed) = handoff.take();

        if failed {
            // Dropping the store discards the cache and its temp files.
            return Ok(0);
        }

        if batches.len() > 1 {
            bar.println(format!(
                "WARNING: {} result batches in queue; IO is slower than compute!",
                batches.len()
            ));
        }

        if !batches.is_empty() {
            let old_count = store.len();
            let count = store.merge_batches(&batches)?;
            bar.println(format!(
                "[{}] cached {count} {N}-cubes (was {old_count})",
                format_local_time("%FT%T", Local::now()),
            ));
        }

        if done {
            break;
        }
    }

    store.commit()
}

fn escalate_impl<const M: usize, const N: usize>(
    reader: &mut ListReader,
    outfile: &Path,
) -> Result<u64> {
    let bar = make_bar(reader.record_count());
    bar.set_message(format!("seeds expanded for N = {N}..."));

    let count = ListGenerator::<M, N>::new(outfile).run(reader, &bar);

    bar.finish();
    count
}

/// Derive the size `N + 1` list from the size `N` list at `infile`.
///
/// Dispatches the runtime cube count of the input onto the fixed-size
/// implementations; returns the number of polycubes written to `outfile`.
pub fn escalate(infile: &Path, outfile: &Path) -> Result<u64> {
    let mut reader = ListReader::open(infile)?;
    let cube_count = reader.cube_count();

    crate::for_cube_count!(cube_count, escalate_impl::<M, N>(&mut reader, outfile))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::coord::Coord;

    fn write_seed_list(dir: &Path) -> PathBuf {
        let path = dir.join("polycubes_1.bin");
        let mut writer = ListWriter::<1>::create(&path).unwrap();
        writer
            .write(&PolyCube::new([Coord::new(0, 0, 0)]))
            .unwrap();
        writer.finish().unwrap();
        path
    }

    /// Escalate the unit cube all the way to N = 7, checking the known
    /// counts of free polycubes at every step.
    #[test]
    fn escalation_chain_reproduces_known_counts() {
        let dir = tempfile::tempdir().unwrap();
        let mut infile = write_seed_list(dir.path());

        let expected = [1u64, 2, 8, 29, 166, 1023];

        for (i, &count) in expected.iter().enumerate() {
            let n = i + 2;
            let outfile = dir.path().join(format!("polycubes_{n}.bin"));

            assert_eq!(escalate(&infile, &outfile).unwrap(), count);

            let reader = ListReader::open(&outfile).unwrap();
            assert_eq!(reader.cube_count(), n);
            assert_eq!(reader.record_count(), count);

            infile = outfile;
        }
    }

    /// The streaming path must produce the same bytes as the in-memory
    /// path, for any chunking of the seed list.
    #[test]
    fn streaming_path_matches_fast_path_byte_for_byte() {
        let dir = tempfile::tempdir().unwrap();
        let mut infile = write_seed_list(dir.path());

        // Build the 29 pentacubes as seeds.
        for n in 2..=5 {
            let outfile = dir.path().join(format!("polycubes_{n}.bin"));
            escalate(&infile, &outfile).unwrap();
            infile = outfile;
        }

        let fast_out = dir.path().join("fast.bin");
        let streamed_out = dir.path().join("streamed.bin");
        let bar = ProgressBar::hidden();

        let mut reader = ListReader::open(&infile).unwrap();
        let fast = ListGenerator::<5, 6>::new(&fast_out)
            .run(&mut reader, &bar)
            .unwrap();

        let mut reader = ListReader::open(&infile).unwrap();
        let streamed = ListGenerator::<5, 6>::new(&streamed_out)
            .with_chunk_len(7)
            .run(&mut reader, &bar)
            .unwrap();

        assert_eq!(fast, 166);
        assert_eq!(streamed, 166);
        assert_eq!(
            fs::read(&fast_out).unwrap(),
            fs::read(&streamed_out).unwrap()
        );
    }

    /// A seed count equal to the chunk length takes the in-memory path;
    /// one more seed streams. Both must agree.
    #[test]
    fn chunk_boundary_switches_paths_consistently() {
        let dir = tempfile::tempdir().unwrap();
        let mut infile = write_seed_list(dir.path());

        for n in 2..=4 {
            let outfile = dir.path().join(format!("polycubes_{n}.bin"));
            escalate(&infile, &outfile).unwrap();
            infile = outfile;
        }

        // 8 tetracube seeds: chunk length 8 is the fast path, 7 streams.
        let bar = ProgressBar::hidden();

        let at_boundary = dir.path().join("at.bin");
        let mut reader = ListReader::open(&infile).unwrap();
        ListGenerator::<4, 5>::new(&at_boundary)
            .with_chunk_len(8)
            .run(&mut reader, &bar)
            .unwrap();

        let past_boundary = dir.path().join("past.bin");
        let mut reader = ListReader::open(&infile).unwrap();
        ListGenerator::<4, 5>::new(&past_boundary)
            .with_chunk_len(7)
            .run(&mut reader, &bar)
            .unwrap();

        assert_eq!(
            fs::read(&at_boundary).unwrap(),
            fs::read(&past_boundary).unwrap()
        );
    }

    #[test]
    fn empty_seed_list_writes_a_bare_header() {
        let dir = tempfile::tempdir().unwrap();

        let infile = dir.path().join("none.bin");
        ListWriter::<3>::create(&infile).unwrap().finish().unwrap();

        let outfile = dir.path().join("out.bin");
        assert_eq!(escalate(&infile, &outfile).unwrap(), 0);

        assert_eq!(fs::metadata(&outfile).unwrap().len(), 12);
        let reader = ListReader::open(&outfile).unwrap();
        assert_eq!(reader.cube_count(), 4);
    }

    #[test]
    fn no_temp_files_survive_a_streaming_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut infile = write_seed_list(dir.path());

        for n in 2..=3 {
            let outfile = dir.path().join(format!("polycubes_{n}.bin"));
            escalate(&infile, &outfile).unwrap();
            infile = outfile;
        }

        let outfile = dir.path().join("quads.bin");
        let mut reader = ListReader::open(&infile).unwrap();
        ListGenerator::<3, 4>::new(&outfile)
            .with_chunk_len(1)
            .run(&mut reader, &ProgressBar::hidden())
            .unwrap();

        let hidden: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with('.'))
            .collect();
        assert!(hidden.is_empty(), "stray temp files: {hidden:?}");
    }
}
