//! Shard writer: tile a macro-chunk into micro-chunks, compress them on a
//! worker pool, and stream the blobs to the data file in index order.

use crate::codec::{ChunkGeometry, CompressionTag, codec_for};
use crate::container::index::{INDEX_ENTRY_LEN, IndexEntry, write_table};
use crate::container::metadata::CURRENT_VERSION;
use crate::container::shard::{SHARD_HEADER_LEN, ShardHeader};
use crate::error::{Result, SisfError};
use crate::tiling::tiles;
use crate::volume::{Element, view_to_bytes};
use crossbeam_channel::{Receiver, bounded};
use log::debug;
use ndarray::{ArrayView3, s};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Completions the writer may hold before submission blocks.
const PENDING_CHUNKS: usize = 512;

#[derive(Clone, Debug, Default)]
pub struct ShardOptions {
    /// Compression workers; `0` means one per logical CPU.
    pub threads: usize,
    /// `(x0, x1, y0, y1, z0, z1)` window exposed to readers; `None` exposes
    /// the full extent.
    pub crop: Option<[u64; 6]>,
}

/// Write one shard as a `(data, meta)` pair.
///
/// Micro-chunks are enumerated in lexicographic `(dx, dy, dz)` order with
/// `dz` innermost; compressions run concurrently but completions are
/// drained in submission order, so index entry `k` always describes the
/// `k`-th micro-chunk and offsets increase monotonically.
pub fn create_shard<T: Element>(
    data_path: &Path,
    meta_path: &Path,
    vol: ArrayView3<'_, T>,
    chunk_size: [u16; 3],
    compression: CompressionTag,
    opts: Option<&ShardOptions>,
) -> Result<()> {
    if chunk_size.iter().any(|&c| c == 0) {
        return Err(SisfError::Format("micro-chunk size must be nonzero".into()));
    }

    let shape = vol.shape();
    let size = [shape[0] as u64, shape[1] as u64, shape[2] as u64];
    let crop = opts
        .and_then(|o| o.crop)
        .unwrap_or([0, size[0], 0, size[1], 0, size[2]]);

    let header = ShardHeader {
        version: CURRENT_VERSION,
        dtype: T::DTYPE,
        channel_count: 1,
        compression,
        chunk_size,
        size,
        crop,
    };
    header.validate()?;

    let threads = match opts.map(|o| o.threads) {
        Some(n) if n > 0 => n,
        _ => num_cpus::get(),
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| SisfError::Format(format!("worker pool: {e}")))?;
    let codec = codec_for(compression);

    debug!(
        "shard {}: {} chunks of {:?}, {} workers",
        data_path.display(),
        header.chunk_total(),
        chunk_size,
        threads
    );

    let out = File::create(data_path)?;
    let (queue_tx, queue_rx) = bounded::<Receiver<Result<Vec<u8>>>>(PENDING_CHUNKS);

    let table = std::thread::scope(|scope| -> Result<Vec<IndexEntry>> {
        // Single consumer: drains completions front-first and owns the
        // data file, so blob order always matches submission order.
        let writer = scope.spawn(move || -> Result<Vec<IndexEntry>> {
            let mut out = BufWriter::new(out);
            let mut table = Vec::new();
            let mut offset = 0u64;
            while let Ok(pending) = queue_rx.recv() {
                let blob = pending
                    .recv()
                    .map_err(|_| SisfError::Format("encoder dropped its result".into()))??;
                let length = u32::try_from(blob.len())
                    .map_err(|_| SisfError::Format("encoded chunk exceeds u32 length".into()))?;
                table.push(IndexEntry { offset, length });
                out.write_all(&blob)?;
                offset += u64::from(length);
            }
            out.flush()?;
            Ok(table)
        });

        // Submission must stay on this thread: a pool thread running the
        // loop could block on a full queue and starve its own workers.
        pool.in_place_scope(|workers| {
            'submit: for (istart, iend) in tiles(size[0], chunk_size[0] as u64) {
                for (jstart, jend) in tiles(size[1], chunk_size[1] as u64) {
                    for (kstart, kend) in tiles(size[2], chunk_size[2] as u64) {
                        let (done_tx, done_rx) = bounded(1);
                        if queue_tx.send(done_rx).is_err() {
                            // The writer bailed; its error is picked up below.
                            break 'submit;
                        }
                        let block = vol.slice(s![
                            istart as usize..iend as usize,
                            jstart as usize..jend as usize,
                            kstart as usize..kend as usize
                        ]);
                        let geom = ChunkGeometry {
                            extent: [
                                (iend - istart) as usize,
                                (jend - jstart) as usize,
                                (kend - kstart) as usize,
                            ],
                            dtype: T::DTYPE,
                        };
                        workers.spawn(move |_| {
                            let raw = view_to_bytes(block);
                            let _ = done_tx.send(codec.encode(&raw, &geom));
                        });
                    }
                }
            }
        });
        drop(queue_tx);

        writer
            .join()
            .map_err(|_| SisfError::Format("shard writer thread panicked".into()))?
    })?;

    let mut meta = Vec::with_capacity(SHARD_HEADER_LEN + table.len() * INDEX_ENTRY_LEN);
    header.write_to(&mut meta)?;
    write_table(&mut meta, &table)?;
    fs::write(meta_path, &meta)?;
    Ok(())
}
