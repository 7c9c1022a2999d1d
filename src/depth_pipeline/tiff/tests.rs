use std::io::Cursor;

use ndarray::Array4;

use crate::depth_pipeline::common::error::EnsembleError;
use crate::depth_pipeline::tiff::{
    DepthMap, DepthMapReader, DepthMapWriter, OutputConfig, SampleFormat, StandardTiffReader,
    StandardTiffWriter, TiffCompression,
};

fn gradient_map(width: usize, height: usize) -> DepthMap {
    let data = (0..width * height)
        .map(|i| i as f32 / (width * height - 1) as f32)
        .collect();
    DepthMap::new(width, height, data).unwrap()
}

fn encode(map: &DepthMap, config: &OutputConfig) -> Vec<u8> {
    let mut output = Cursor::new(Vec::new());
    StandardTiffWriter.write_depth(map, &mut output, config).unwrap();
    output.into_inner()
}

#[test]
fn test_output_config_builder() {
    let config = OutputConfig::builder()
        .compression(TiffCompression::DeflateBest)
        .predictor(Some(2))
        .sample_format(SampleFormat::Gray16)
        .validate_dimensions(false)
        .build();

    assert_eq!(config.compression, TiffCompression::DeflateBest);
    assert_eq!(config.predictor, Some(2));
    assert_eq!(config.sample_format, SampleFormat::Gray16);
    assert!(!config.validate_dimensions);
}

#[test]
fn test_float_maps_survive_encoding() {
    let map = gradient_map(7, 5);
    for compression in [TiffCompression::None, TiffCompression::Lzw, TiffCompression::DeflateFast] {
        let config = OutputConfig::builder().compression(compression).build();
        let decoded = StandardTiffReader.read_depth(&encode(&map, &config)).unwrap();
        assert_eq!(decoded, map);
    }
}

#[test]
fn test_gray16_output_is_normalized_and_clamped() {
    let map = DepthMap::new(4, 1, vec![-0.5, 0.0, 0.5, 2.0]).unwrap();
    let config = OutputConfig::builder()
        .sample_format(SampleFormat::Gray16)
        .predictor(Some(2))
        .compression(TiffCompression::Lzw)
        .build();

    let decoded = StandardTiffReader.read_depth(&encode(&map, &config)).unwrap();
    assert_eq!(decoded.data, vec![0.0, 0.0, 32768.0, 65535.0]);
}

#[test]
fn test_reader_rejects_multichannel_images() {
    let mut buffer = Vec::new();
    tiff::encoder::TiffEncoder::new(Cursor::new(&mut buffer))
        .unwrap()
        .write_image::<tiff::encoder::colortype::RGB8>(2, 2, &[0u8; 12])
        .unwrap();

    let result = StandardTiffReader.read_depth(&buffer);
    assert!(matches!(result, Err(EnsembleError::UnsupportedFormat(_))));
}

#[test]
fn test_reader_rejects_garbage() {
    let result = StandardTiffReader.read_depth(b"definitely not a tiff");
    assert!(matches!(result, Err(EnsembleError::DecodeError(_))));
}

#[test]
fn test_depth_map_dimension_checks() {
    assert!(matches!(
        DepthMap::new(3, 3, vec![0.0; 8]),
        Err(EnsembleError::InvalidDimensions(3, 3))
    ));
    assert!(matches!(
        DepthMap::new(0, 3, vec![]),
        Err(EnsembleError::InvalidDimensions(0, 3))
    ));
}

#[test]
fn test_stack_builds_batch() {
    let maps = vec![gradient_map(3, 2), gradient_map(3, 2)];
    let batch = DepthMap::stack(&maps).unwrap();

    assert_eq!(batch.dim(), (2, 1, 2, 3));
    assert_eq!(batch[[1, 0, 1, 2]], 1.0);
}

#[test]
fn test_stack_rejects_mismatched_sizes() {
    let maps = vec![gradient_map(3, 2), gradient_map(2, 3)];
    assert!(matches!(
        DepthMap::stack(&maps),
        Err(EnsembleError::DimensionMismatch { index: 1, .. })
    ));
    assert!(matches!(DepthMap::stack(&[]), Err(EnsembleError::InvalidShape(_))));
}

#[test]
fn test_from_nchw_takes_first_plane() {
    let array = Array4::from_shape_fn((2, 1, 2, 2), |(n, _, y, x)| (n * 10 + y * 2 + x) as f32);
    let map = DepthMap::from_nchw(array.view()).unwrap();

    assert_eq!(map.width, 2);
    assert_eq!(map.height, 2);
    assert_eq!(map.data, vec![0.0, 1.0, 2.0, 3.0]);
}
