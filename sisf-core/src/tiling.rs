//! Half-open tilers shared by the macro-chunk and micro-chunk grids.

/// Tile `[0, length)` into `(start, end)` pairs of width `step`, the last
/// pair clamped to `length`. Yields `ceil(length / step)` pairs.
pub fn tiles(length: u64, step: u64) -> impl Iterator<Item = (u64, u64)> {
    debug_assert!(step > 0);
    (0..length)
        .step_by(step as usize)
        .map(move |start| (start, (start + step).min(length)))
}

/// Every step-aligned tile intersecting the request `[start, stop)`.
///
/// Yields `((tile_start, tile_end), (sub_start, sub_end))` where the second
/// pair is the overlapping range expressed relative to the tile.
pub fn intersecting_tiles(
    start: u64,
    stop: u64,
    step: u64,
) -> impl Iterator<Item = ((u64, u64), (u64, u64))> {
    debug_assert!(step > 0);
    let first = (start / step) * step;
    (first..stop).step_by(step as usize).map(move |tile_start| {
        let tile_end = tile_start + step;
        (
            (tile_start, tile_end),
            (
                start.max(tile_start) - tile_start,
                stop.min(tile_end) - tile_start,
            ),
        )
    })
}
