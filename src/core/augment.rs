//! Image augmentation: random crop and axis flips on (C, H, W) images.
//!
//! Every random decision is drawn from a caller-supplied generator so a seeded
//! `StdRng` reproduces a sample exactly.

use ndarray::{s, Axis};
use rand::Rng;

use crate::core::raster::Image;

/// Default crop window height
pub const CROP_HEIGHT: usize = 33;
/// Default crop window width
pub const CROP_WIDTH: usize = 50;

/// Crop a random `crop_h x crop_w` window from `image`.
///
/// Along an axis where the image is larger than the window, the offset is
/// drawn uniformly from `[0, size - window)`. Along an axis where it is not,
/// the offset is 0 and the crop is clipped to the available size, so the
/// result can be smaller than requested. No padding is added.
pub fn random_crop<R: Rng + ?Sized>(
    image: &Image,
    crop_h: usize,
    crop_w: usize,
    rng: &mut R,
) -> Image {
    let (_, img_h, img_w) = image.dim();
    let y0 = random_offset(img_h, crop_h, rng);
    let x0 = random_offset(img_w, crop_w, rng);
    let y1 = (y0 + crop_h).min(img_h);
    let x1 = (x0 + crop_w).min(img_w);
    image.slice(s![.., y0..y1, x0..x1]).to_owned()
}

fn random_offset<R: Rng + ?Sized>(size: usize, window: usize, rng: &mut R) -> usize {
    let diff = size.saturating_sub(window);
    if diff > 0 {
        rng.gen_range(0..diff)
    } else {
        0
    }
}

/// Reverse the height axis (axis 1)
pub fn horizontal_flip(image: &Image) -> Image {
    flip_axis(image, Axis(1))
}

/// Reverse the width axis (axis 2)
pub fn vertical_flip(image: &Image) -> Image {
    flip_axis(image, Axis(2))
}

fn flip_axis(image: &Image, axis: Axis) -> Image {
    let mut view = image.view();
    view.invert_axis(axis);
    view.to_owned()
}

/// Which flip, if any, a [`FlipPolicy`] applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    None,
    Horizontal,
    Vertical,
}

/// Random flip with a per-flip trigger probability.
///
/// One uniform draw decides the horizontal flip; only if it does not fire is a
/// second draw made for the vertical flip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipPolicy {
    pub prob: f64,
}

impl FlipPolicy {
    pub fn new(prob: f64) -> Self {
        Self { prob }
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> FlipOutcome {
        if rng.gen::<f64>() < self.prob {
            FlipOutcome::Horizontal
        } else if rng.gen::<f64>() < self.prob {
            FlipOutcome::Vertical
        } else {
            FlipOutcome::None
        }
    }

    pub fn apply<R: Rng + ?Sized>(&self, image: Image, rng: &mut R) -> (Image, FlipOutcome) {
        let outcome = self.choose(rng);
        let image = match outcome {
            FlipOutcome::Horizontal => horizontal_flip(&image),
            FlipOutcome::Vertical => vertical_flip(&image),
            FlipOutcome::None => image,
        };
        (image, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ramp(c: usize, h: usize, w: usize) -> Image {
        Array3::from_shape_fn((c, h, w), |(ch, row, col)| {
            (ch * h * w + row * w + col) as f32
        })
    }

    #[test]
    fn test_crop_shape_large_image() {
        let mut rng = StdRng::seed_from_u64(0);
        let img = ramp(4, 100, 100);
        for _ in 0..50 {
            let out = random_crop(&img, CROP_HEIGHT, CROP_WIDTH, &mut rng);
            assert_eq!(out.dim(), (4, 33, 50));
        }
    }

    #[test]
    fn test_crop_small_image_is_not_padded() {
        let mut rng = StdRng::seed_from_u64(1);
        let img = ramp(3, 10, 10);
        let out = random_crop(&img, CROP_HEIGHT, CROP_WIDTH, &mut rng);
        assert_eq!(out.dim(), (3, 10, 10));
        assert_eq!(out, img);
    }

    #[test]
    fn test_crop_mixed_axes() {
        let mut rng = StdRng::seed_from_u64(2);
        let img = ramp(1, 40, 20);
        let out = random_crop(&img, CROP_HEIGHT, CROP_WIDTH, &mut rng);
        assert_eq!(out.dim(), (1, 33, 20));
    }

    #[test]
    fn test_crop_is_a_window_of_the_source() {
        let mut rng = StdRng::seed_from_u64(3);
        let img = ramp(2, 60, 70);
        let out = random_crop(&img, 33, 50, &mut rng);
        // Recover the offset from the ramp values and compare the window
        let first = out[[0, 0, 0]] as usize;
        let (y0, x0) = (first / 70, first % 70);
        assert!(y0 < 60 - 33 && x0 < 70 - 50);
        assert_eq!(out, img.slice(s![.., y0..y0 + 33, x0..x0 + 50]).to_owned());
    }

    #[test]
    fn test_crop_offsets_are_seeded() {
        let img = ramp(1, 100, 100);
        let a = random_crop(&img, 33, 50, &mut StdRng::seed_from_u64(42));
        let b = random_crop(&img, 33, 50, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_horizontal_flip_reverses_rows() {
        let img = ramp(1, 2, 3);
        let out = horizontal_flip(&img);
        // [0,1,2 / 3,4,5] -> [3,4,5 / 0,1,2]
        assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![3.0, 4.0, 5.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_vertical_flip_reverses_columns() {
        let img = ramp(1, 2, 3);
        let out = vertical_flip(&img);
        assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![2.0, 1.0, 0.0, 5.0, 4.0, 3.0]);
    }

    #[test]
    fn test_flips_are_involutions() {
        let img = ramp(3, 7, 5);
        assert_eq!(horizontal_flip(&horizontal_flip(&img)), img);
        assert_eq!(vertical_flip(&vertical_flip(&img)), img);
    }

    #[test]
    fn test_flip_policy_extremes() {
        let mut rng = StdRng::seed_from_u64(9);
        let never = FlipPolicy::new(0.0);
        let always = FlipPolicy::new(1.0);
        for _ in 0..100 {
            assert_eq!(never.choose(&mut rng), FlipOutcome::None);
            assert_eq!(always.choose(&mut rng), FlipOutcome::Horizontal);
        }
    }

    #[test]
    fn test_flip_policy_mixes_outcomes() {
        let mut rng = StdRng::seed_from_u64(11);
        let policy = FlipPolicy::new(0.5);
        let outcomes: Vec<_> = (0..200).map(|_| policy.choose(&mut rng)).collect();
        assert!(outcomes.contains(&FlipOutcome::Horizontal));
        assert!(outcomes.contains(&FlipOutcome::Vertical));
        assert!(outcomes.contains(&FlipOutcome::None));
    }
}
