use ndarray::Axis;
use tracing::info;

use crate::core::normalize::ChannelStats;
use crate::core::raster::Image;
use crate::error::{DatasetError, DatasetResult};

/// Per-channel mean and population standard deviation over every pixel of
/// every image.
///
/// All images must share a channel count. Accumulates in `f64`.
pub fn compute_channel_stats(images: &[Image]) -> DatasetResult<ChannelStats> {
    let channels = match images.first() {
        Some(image) => image.len_of(Axis(0)),
        None => {
            return Err(DatasetError::InvalidConfig(
                "cannot compute channel statistics without images".to_string(),
            ))
        }
    };

    let mut sum = vec![0.0f64; channels];
    let mut sum_sq = vec![0.0f64; channels];
    let mut count = 0usize;
    for (i, image) in images.iter().enumerate() {
        if image.len_of(Axis(0)) != channels {
            return Err(DatasetError::InvalidConfig(format!(
                "image {} has {} channels, expected {}",
                i,
                image.len_of(Axis(0)),
                channels
            )));
        }
        for (c, plane) in image.axis_iter(Axis(0)).enumerate() {
            for &x in plane.iter() {
                let x = x as f64;
                sum[c] += x;
                sum_sq[c] += x * x;
            }
        }
        count += image.len() / channels.max(1);
    }
    if count == 0 {
        return Err(DatasetError::InvalidConfig(
            "images contain no pixels".to_string(),
        ));
    }

    let n = count as f64;
    let mean: Vec<f32> = sum.iter().map(|s| (s / n) as f32).collect();
    let std: Vec<f32> = sum
        .iter()
        .zip(&sum_sq)
        .map(|(s, sq)| {
            let m = s / n;
            ((sq / n - m * m).max(0.0)).sqrt() as f32
        })
        .collect();
    info!("Computed channel statistics over {} pixels", count);
    ChannelStats::new(mean, std)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::normalize;
    use ndarray::Array3;

    #[test]
    fn test_stats_of_known_values() {
        // channel 0: 0,2,4,6 ; channel 1: 10 everywhere + 1 alternating
        let mut img = Array3::zeros((2, 2, 2));
        img[[0, 0, 0]] = 0.0;
        img[[0, 0, 1]] = 2.0;
        img[[0, 1, 0]] = 4.0;
        img[[0, 1, 1]] = 6.0;
        img[[1, 0, 0]] = 10.0;
        img[[1, 0, 1]] = 12.0;
        img[[1, 1, 0]] = 10.0;
        img[[1, 1, 1]] = 12.0;
        let stats = compute_channel_stats(&[img]).unwrap();
        assert_eq!(stats.mean().to_vec(), vec![3.0f32, 11.0]);
        assert!((stats.std()[0] - 5.0f32.sqrt()).abs() < 1e-6);
        assert!((stats.std()[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_images_have_zero_mean() {
        let a = Array3::from_shape_fn((3, 5, 4), |(c, y, x)| (c * 7 + y * 3 + x) as f32);
        let b = Array3::from_shape_fn((3, 6, 6), |(c, y, x)| (c * 2 + y + x * 5) as f32);
        let images = vec![a, b];
        let stats = compute_channel_stats(&images).unwrap();
        let normalized = normalize(&images, &stats).unwrap();
        let after = compute_channel_stats(&normalized).unwrap();
        for (m, s) in after.mean().iter().zip(after.std()) {
            assert!(m.abs() < 1e-4);
            assert!((s - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_constant_channel_is_rejected() {
        let img = Array3::from_elem((1, 3, 3), 5.0);
        assert!(compute_channel_stats(&[img]).is_err());
    }

    #[test]
    fn test_mismatched_channels_and_empty_input() {
        assert!(compute_channel_stats(&[]).is_err());
        let a = Array3::from_shape_fn((1, 2, 2), |(_, y, x)| (y + x) as f32);
        let b = Array3::from_shape_fn((2, 2, 2), |(_, y, x)| (y + x) as f32);
        assert!(compute_channel_stats(&[a, b]).is_err());
    }
}
