use celestial_partition::{
    align_trees, filter_by_coverage, generate_alignment, AlignmentKind, CoverageMap, Destination,
    ErrorKind, PartitionConfig, PartitionError, PixelId, PixelTree, PixelTreeBuilder,
};

fn px(order: u8, pixel: u64) -> PixelId {
    PixelId::new(order, pixel).unwrap()
}

fn summary(d: Destination) -> (u8, u64, u64) {
    (d.order(), d.pixel(), d.count())
}

fn tree(pixels: &[(u8, u64)]) -> PixelTree {
    PixelTreeBuilder::new()
        .build(pixels.iter().map(|&(o, p)| px(o, p)))
        .expect("valid pixel set")
}

#[test]
fn test_histogram_merges_small_sky_into_base_pixel() {
    let mut histogram = vec![0u64; 48];
    histogram[44..48].copy_from_slice(&[51, 29, 51, 18]);
    let config = PartitionConfig::default().with_threshold(250);

    let map = generate_alignment(&histogram, 1, &config).unwrap();

    for index in 44..48 {
        assert_eq!(map.get(index).map(summary), Some((0, 11, 149)));
    }
    for index in 0..44 {
        assert_eq!(map.get(index), None, "cell {} should have no destination", index);
    }
    assert_eq!(map.total_count().unwrap(), 149);
}

#[test]
fn test_range_filter_keeps_covered_leaves() {
    let catalog = tree(&[
        (0, 10),
        (1, 33),
        (1, 35),
        (1, 44),
        (1, 45),
        (1, 46),
        (2, 128),
        (2, 130),
        (2, 131),
    ]);
    let coverage = CoverageMap::from_pixels([px(1, 45), px(1, 46), px(2, 128)]);

    let filtered = filter_by_coverage(&catalog, &coverage);

    assert_eq!(filtered.to_pixel_ids(), vec![px(2, 128), px(1, 45), px(1, 46)]);
}

#[test]
fn test_builder_rejects_nested_pixels() {
    let err = PixelTreeBuilder::new()
        .build([px(0, 11), px(1, 44)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);
    assert!(matches!(err, PartitionError::OverlappingPixel { .. }));
}

#[test]
fn test_association_join_rows() {
    let objects = tree(&[(0, 11)]);
    let sources = tree(&[(1, 44), (2, 180), (2, 181), (0, 4)]);

    let inner = align_trees(&objects, &sources, AlignmentKind::Inner);
    assert_eq!(
        inner.aligned_pixels(),
        vec![px(1, 44), px(2, 180), px(2, 181)]
    );
    assert!(inner
        .mapping
        .iter()
        .all(|row| row.primary == Some(px(0, 11)) && row.join == Some(row.aligned)));

    let right = align_trees(&objects, &sources, AlignmentKind::Right);
    assert_eq!(right.aligned_pixels()[0], px(0, 4));
    assert_eq!(right.mapping.rows_for(&px(0, 4))[0].primary, None);

    let outer = align_trees(&objects, &sources, AlignmentKind::Outer);
    assert_eq!(
        outer.aligned_pixels(),
        vec![
            px(0, 4),
            px(1, 44),
            px(2, 180),
            px(2, 181),
            px(2, 182),
            px(2, 183),
            px(1, 46),
            px(1, 47),
        ]
    );
    assert_eq!(outer.mapping.join_pixels().len(), 4);
}

#[test]
fn test_partition_plan_round_trips_through_tree() {
    let mut histogram = vec![0u64; 192];
    histogram[176..180].copy_from_slice(&[10, 10, 0, 0]);
    histogram[180] = 30;
    histogram[40] = 7;
    let config = PartitionConfig::default()
        .with_threshold(40)
        .with_drop_empty_siblings(true);

    let map = generate_alignment(&histogram, 2, &config).unwrap();
    let partitions = map.to_pixel_tree();

    assert_eq!(
        partitions.to_pixel_ids(),
        vec![px(2, 40), px(1, 44), px(2, 180)]
    );
    let rows = PixelTreeBuilder::new()
        .from_partition_rows(
            partitions
                .pixels()
                .map(|p| (p.order() as u64, p.pixel())),
        )
        .unwrap();
    assert_eq!(rows, partitions);
}
