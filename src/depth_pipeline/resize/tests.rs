use ndarray::{Array4, array};

use crate::depth_pipeline::resize::{
    InterpolationResampler, ResampleMethod, Resampler, max_res_dims, resize_max_res,
};

fn ramp(height: usize, width: usize) -> Array4<f64> {
    Array4::from_shape_fn((1, 1, height, width), |(_, _, y, x)| (y * width + x) as f64)
}

#[test]
fn test_max_res_dims_keeps_aspect() {
    assert_eq!(max_res_dims(480, 640, 320), (240, 320));
    assert_eq!(max_res_dims(640, 480, 320), (320, 240));
    assert_eq!(max_res_dims(1, 1000, 10), (1, 10));
}

#[test]
fn test_resize_max_res_never_upsamples() {
    let batch = ramp(4, 6);
    let out = resize_max_res(&InterpolationResampler, batch.view(), 16, ResampleMethod::NearestExact);
    assert_eq!(out, batch);
}

#[test]
fn test_resize_max_res_bounds_longer_side() {
    let batch = Array4::<f64>::zeros((3, 1, 100, 250));
    let out = resize_max_res(&InterpolationResampler, batch.view(), 50, ResampleMethod::NearestExact);
    assert_eq!(out.dim(), (3, 1, 20, 50));
}

#[test]
fn test_nearest_exact_samples_pixel_centres() {
    let batch = ramp(1, 4).mapv(|v| v * 10.0);
    let out = InterpolationResampler.resize(batch.view(), 1, 2, ResampleMethod::NearestExact);
    // centres of output pixels land on source pixels 1 and 3
    assert_eq!(out, array![[[[10.0, 30.0]]]]);

    let out = InterpolationResampler.resize(batch.view(), 1, 2, ResampleMethod::Nearest);
    assert_eq!(out, array![[[[0.0, 20.0]]]]);
}

#[test]
fn test_bilinear_halving_averages_neighbours() {
    let batch = array![[[[0.0, 2.0, 4.0, 6.0]]]];
    let out = InterpolationResampler.resize(batch.view(), 1, 2, ResampleMethod::Bilinear);
    assert_eq!(out, array![[[[1.0, 5.0]]]]);
}

#[test]
fn test_resample_method_parsing() {
    assert_eq!("nearest-exact".parse::<ResampleMethod>().unwrap(), ResampleMethod::NearestExact);
    assert_eq!("bilinear".parse::<ResampleMethod>().unwrap(), ResampleMethod::Bilinear);
    assert!("bicubic".parse::<ResampleMethod>().is_err());
}
