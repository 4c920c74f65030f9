//! Archive- and shard-level round trips over temp directories.

use ndarray::{Array3, Array4, s};
use sisf_core::container::paths::{shard_data_path, shard_meta_path};
use sisf_core::prelude::*;

fn graded_volume() -> Array4<u16> {
    // v[c, x, y, z] = x*16 + y*4 + z
    Array4::from_shape_fn((1, 4, 4, 4), |(_, x, y, z)| (x * 16 + y * 4 + z) as u16)
}

#[test]
fn full_read_equals_input() {
    let dir = tempfile::tempdir().unwrap();
    let vol = graded_volume();
    create_archive(dir.path(), vol.view(), [4, 4, 4], [2, 2, 2], [100, 100, 100], None).unwrap();

    let mut archive = Archive::open(dir.path()).unwrap();
    assert_eq!(archive.shape(), [1, 4, 4, 4]);
    assert_eq!(archive.dtype(), Dtype::U16);
    assert_eq!(archive.mchunk(), [4, 4, 4]);
    assert_eq!(archive.res(), [100, 100, 100]);

    let out: Array4<u16> = archive.slice(s![.., .., .., ..]).unwrap();
    assert_eq!(out, vol);
}

#[test]
fn partial_read_selects_the_requested_block() {
    let dir = tempfile::tempdir().unwrap();
    let vol = graded_volume();
    create_archive(dir.path(), vol.view(), [4, 4, 4], [2, 2, 2], [100, 100, 100], None).unwrap();

    let mut archive = Archive::open(dir.path()).unwrap();
    let out: Array4<u16> = archive.slice(s![0..1, 1..3, 0..4, 2..3]).unwrap();
    assert_eq!(out.shape(), &[1, 2, 4, 1]);
    assert_eq!(out, vol.slice(s![0..1, 1..3, 0..4, 2..3]));
}

#[test]
fn non_divisible_shape_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let vol = Array4::from_shape_fn((1, 5, 3, 7), |(_, x, y, z)| (x * 100 + y * 10 + z) as u16);
    create_archive(dir.path(), vol.view(), [4, 4, 4], [2, 2, 2], [50, 50, 50], None).unwrap();

    let mut archive = Archive::open(dir.path()).unwrap();
    let out: Array4<u16> = archive.slice(s![.., .., .., ..]).unwrap();
    assert_eq!(out, vol);

    // A read that crosses both macro- and micro-chunk boundaries.
    let out: Array4<u16> = archive.slice(s![0..1, 3..5, 1..3, 2..7]).unwrap();
    assert_eq!(out, vol.slice(s![0..1, 3..5, 1..3, 2..7]));
}

#[test]
fn multi_channel_volumes_keep_channels_apart() {
    let dir = tempfile::tempdir().unwrap();
    let vol = Array4::from_shape_fn((2, 2, 2, 2), |(c, _, _, _)| c as u16);
    create_archive(dir.path(), vol.view(), [4, 4, 4], [2, 2, 2], [1, 1, 1], None).unwrap();

    let mut archive = Archive::open(dir.path()).unwrap();
    let out: Array4<u16> = archive.slice(s![0..2, 0..2, 0..2, 0..2]).unwrap();
    assert_eq!(out, vol);
    assert_eq!(archive.read_voxel::<u16>(1, 0, 1, 0).unwrap(), 1);
}

#[test]
fn out_of_range_request_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let vol = graded_volume();
    create_archive(dir.path(), vol.view(), [4, 4, 4], [2, 2, 2], [100, 100, 100], None).unwrap();

    let mut archive = Archive::open(dir.path()).unwrap();
    let err = archive.slice::<u16, _>(s![0..1, 0..1, 0..1, 0..100]).unwrap_err();
    assert!(matches!(
        err,
        SisfError::IndexOutOfRange { axis: 3, stop: 100, .. }
    ));
}

#[test]
fn stepped_request_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let vol = graded_volume();
    create_archive(dir.path(), vol.view(), [4, 4, 4], [2, 2, 2], [100, 100, 100], None).unwrap();

    let mut archive = Archive::open(dir.path()).unwrap();
    let err = archive.slice::<u16, _>(s![.., ..;2, .., ..]).unwrap_err();
    assert!(matches!(err, SisfError::UnsupportedStride { axis: 1, step: 2 }));
}

#[test]
fn axis_count_and_order_are_validated() {
    let dir = tempfile::tempdir().unwrap();
    let vol = graded_volume();
    create_archive(dir.path(), vol.view(), [4, 4, 4], [2, 2, 2], [100, 100, 100], None).unwrap();

    let mut archive = Archive::open(dir.path()).unwrap();
    assert!(matches!(
        archive.slice::<u16, _>(s![.., .., ..]).unwrap_err(),
        SisfError::InvalidDimensions { expected: 4, got: 3 }
    ));
    assert!(matches!(
        archive.slice::<u16, _>(s![.., 3..1, .., ..]).unwrap_err(),
        SisfError::IncorrectRangeOrder { axis: 1, .. }
    ));
}

#[test]
fn integer_selectors_read_single_planes() {
    let dir = tempfile::tempdir().unwrap();
    let vol = graded_volume();
    create_archive(dir.path(), vol.view(), [4, 4, 4], [2, 2, 2], [100, 100, 100], None).unwrap();

    let mut archive = Archive::open(dir.path()).unwrap();
    let out: Array4<u16> = archive.slice(s![0, 1, .., 2]).unwrap();
    assert_eq!(out.shape(), &[1, 1, 4, 1]);
    assert_eq!(out, vol.slice(s![0..1, 1..2, 0..4, 2..3]));
}

#[test]
fn empty_selection_yields_empty_block() {
    let dir = tempfile::tempdir().unwrap();
    let vol = graded_volume();
    create_archive(dir.path(), vol.view(), [4, 4, 4], [2, 2, 2], [100, 100, 100], None).unwrap();

    let mut archive = Archive::open(dir.path()).unwrap();
    let out: Array4<u16> = archive.slice(s![0..1, 2..2, .., ..]).unwrap();
    assert_eq!(out.shape(), &[1, 0, 4, 4]);
}

#[test]
fn reads_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let vol = graded_volume();
    create_archive(dir.path(), vol.view(), [4, 4, 4], [2, 2, 2], [100, 100, 100], None).unwrap();

    let mut archive = Archive::open(dir.path()).unwrap();
    let first: Array4<u16> = archive.slice(s![0..1, 1..4, 0..2, 1..3]).unwrap();
    let second: Array4<u16> = archive.slice(s![0..1, 1..4, 0..2, 1..3]).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        archive.read_voxel::<u16>(0, 3, 1, 2).unwrap(),
        archive.read_voxel::<u16>(0, 3, 1, 2).unwrap()
    );
}

#[test]
fn raw_tag_and_u8_elements_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let vol = Array4::from_shape_fn((1, 5, 4, 3), |(_, x, y, z)| (x * 31 + y * 7 + z) as u8);
    let opts = ArchiveOptions {
        compression: CompressionTag::Raw,
        threads: 2,
    };
    create_archive(dir.path(), vol.view(), [3, 3, 3], [2, 2, 2], [1, 1, 1], Some(&opts)).unwrap();

    let mut archive = Archive::open(dir.path()).unwrap();
    assert_eq!(archive.dtype(), Dtype::U8);
    let out: Array4<u8> = archive.slice(s![.., .., .., ..]).unwrap();
    assert_eq!(out, vol);
}

#[test]
fn dtype_mismatch_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let vol = graded_volume();
    create_archive(dir.path(), vol.view(), [4, 4, 4], [2, 2, 2], [100, 100, 100], None).unwrap();

    let mut archive = Archive::open(dir.path()).unwrap();
    assert!(matches!(
        archive.slice::<u8, _>(s![.., .., .., ..]).unwrap_err(),
        SisfError::DtypeMismatch { requested: Dtype::U8, stored: Dtype::U16 }
    ));
}

#[test]
fn three_dimensional_input_becomes_single_channel() {
    let dir = tempfile::tempdir().unwrap();
    let vol = Array3::from_shape_fn((4, 4, 4), |(x, y, z)| (x * 16 + y * 4 + z) as u16);
    create_archive_3d(dir.path(), vol.view(), [4, 4, 4], [2, 2, 2], [1, 1, 1], None).unwrap();

    let mut archive = Archive::open(dir.path()).unwrap();
    assert_eq!(archive.shape(), [1, 4, 4, 4]);
    let out: Array4<u16> = archive.slice(s![.., .., .., ..]).unwrap();
    assert_eq!(out.index_axis(ndarray::Axis(0), 0), vol);
}

#[test]
fn shard_index_is_packed_and_ordered() {
    let dir = tempfile::tempdir().unwrap();
    let vol = Array3::from_shape_fn((5, 3, 7), |(x, y, z)| (x * 100 + y * 10 + z) as u16);
    let data = dir.path().join("shard.data");
    let meta = dir.path().join("shard.meta");
    create_shard(&data, &meta, vol.view(), [2, 2, 2], CompressionTag::Zstd, None).unwrap();

    let mut reader = ShardReader::open(&data, &meta).unwrap();
    let total = reader.header().chunk_total();
    assert_eq!(total, 24); // ceil(5/2) * ceil(3/2) * ceil(7/2)

    let mut expected_offset = 0u64;
    for idx in 0..total {
        let entry = reader.locate(idx).unwrap();
        assert_eq!(entry.offset, expected_offset);
        expected_offset += entry.length as u64;
    }
    assert_eq!(expected_offset, std::fs::metadata(&data).unwrap().len());

    // One entry past the table is a truncated read.
    assert!(matches!(
        reader.locate(total).unwrap_err(),
        SisfError::CorruptIndex { chunk } if chunk == total
    ));
}

#[test]
fn shard_lookup_arithmetic_matches_grid_order() {
    let dir = tempfile::tempdir().unwrap();
    let vol = Array3::from_shape_fn((5, 3, 7), |(x, y, z)| (x * 100 + y * 10 + z) as u16);
    let data = dir.path().join("shard.data");
    let meta = dir.path().join("shard.meta");
    create_shard(&data, &meta, vol.view(), [2, 2, 2], CompressionTag::Zstd, None).unwrap();

    let mut reader = ShardReader::open(&data, &meta).unwrap();
    // counts = (3, 2, 4); chunk (2, 1, 3) holds voxel (4, 2, 6)
    let idx = reader.index_of(4, 2, 6);
    assert_eq!(idx, 2 * 2 * 4 + 1 * 4 + 3);
    assert_eq!(reader.coords_of(idx), [2, 1, 3]);
    // boundary chunk extents are the remainders
    assert_eq!(reader.chunk_extent([2, 1, 3]), [1, 1, 1]);
    assert_eq!(reader.chunk_extent([0, 0, 0]), [2, 2, 2]);

    let chunk = reader.fetch_chunk::<u16>(idx).unwrap();
    assert_eq!(chunk[[0, 0, 0]], 4 * 100 + 2 * 10 + 6);

    let full: Array3<u16> = reader.slice(s![.., .., ..]).unwrap();
    assert_eq!(full, vol);
}

#[test]
fn cropped_shard_exposes_only_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let vol = Array3::from_shape_fn((6, 6, 6), |(x, y, z)| (x * 36 + y * 6 + z) as u16);
    let data = dir.path().join("shard.data");
    let meta = dir.path().join("shard.meta");
    let opts = ShardOptions {
        threads: 2,
        crop: Some([1, 4, 0, 3, 2, 5]),
    };
    create_shard(&data, &meta, vol.view(), [2, 2, 2], CompressionTag::Zstd, Some(&opts)).unwrap();

    let mut reader = ShardReader::open(&data, &meta).unwrap();
    assert_eq!(reader.shape(), [3, 3, 3]);

    let out: Array3<u16> = reader.slice(s![.., .., ..]).unwrap();
    assert_eq!(out, vol.slice(s![1..4, 0..3, 2..5]));

    assert_eq!(reader.read_voxel::<u16>(0, 0, 0).unwrap(), vol[[1, 0, 2]]);
    assert!(matches!(
        reader.read_voxel::<u16>(3, 0, 0).unwrap_err(),
        SisfError::IndexOutOfRange { axis: 0, .. }
    ));
}

#[test]
fn shard_files_follow_the_naming_convention() {
    let dir = tempfile::tempdir().unwrap();
    let vol = Array4::from_shape_fn((2, 5, 4, 4), |(c, x, _, _)| (c * 1000 + x) as u16);
    create_archive(dir.path(), vol.view(), [4, 4, 4], [2, 2, 2], [1, 1, 1], None).unwrap();

    // (5, 4, 4) under M = (4, 4, 4) makes a 2x1x1 grid per channel.
    for c in 0..2 {
        for i in 0..2 {
            assert!(shard_data_path(dir.path(), i, 0, 0, c, 1).is_file());
            assert!(shard_meta_path(dir.path(), i, 0, 0, c, 1).is_file());
        }
    }
    assert!(!shard_data_path(dir.path(), 2, 0, 0, 0, 1).exists());
}

#[test]
fn archive_display_mentions_path_and_extents() {
    let dir = tempfile::tempdir().unwrap();
    let vol = graded_volume();
    create_archive(dir.path(), vol.view(), [4, 4, 4], [2, 2, 2], [100, 100, 100], None).unwrap();

    let archive = Archive::open(dir.path()).unwrap();
    let repr = archive.to_string();
    assert!(repr.starts_with("<sisf archive at "));
    assert!(repr.contains("4/4/100nm"));
}
