//! Adaptive greyscale binarisation of an RGBA pixel buffer.
//!
//! The image is cut into 8x8 regions; each region gets a black point from
//! its own statistics (mean, or a fraction of the minimum for regions
//! with no dynamic range, borrowing from already-computed neighbours),
//! and each pixel is thresholded against the mean black point of the 5x5
//! region window around it.

use crate::bit_matrix::BitMatrix;

const REGION_SIZE: i32 = 8;
const MIN_DYNAMIC_RANGE: f32 = 24.0;

/// The binarized image, with the inverse matrix alongside when the caller
/// plans to attempt inverted decoding.
pub struct Binarized {
    pub matrix: BitMatrix,
    pub inverted: Option<BitMatrix>,
}

fn clamp(value: i32, min: i32, max: i32) -> i32 {
    value.max(min).min(max)
}

/// Binarizes a tightly-packed RGBA buffer of `width * height` pixels.
///
/// The buffer length must be exactly `width * height * 4`.
pub fn binarize(data: &[u8], width: u32, height: u32, with_inverted: bool) -> Binarized {
    assert_eq!(data.len(), (width * height * 4) as usize, "Malformed RGBA buffer");
    let width = width as i32;
    let height = height as i32;

    // Rec. 709 luma weights.
    let mut grey = vec![0f32; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let p = ((y * width + x) * 4) as usize;
            grey[(y * width + x) as usize] = 0.2126 * f32::from(data[p])
                + 0.7152 * f32::from(data[p + 1])
                + 0.0722 * f32::from(data[p + 2]);
        }
    }
    let grey_at = |x: i32, y: i32| grey[(clamp(y, 0, height - 1) * width + clamp(x, 0, width - 1)) as usize];

    let h_regions = (width + REGION_SIZE - 1) / REGION_SIZE;
    let v_regions = (height + REGION_SIZE - 1) / REGION_SIZE;

    // Pass 1: a black point per region.
    let mut black_points = vec![0f32; (h_regions * v_regions) as usize];
    for vr in 0..v_regions {
        for hr in 0..h_regions {
            let mut sum = 0f32;
            let mut min = f32::MAX;
            let mut max = 0f32;
            for yy in 0..REGION_SIZE {
                for xx in 0..REGION_SIZE {
                    let lum = grey_at(hr * REGION_SIZE + xx, vr * REGION_SIZE + yy);
                    sum += lum;
                    min = min.min(lum);
                    max = max.max(lum);
                }
            }
            let mut average = sum / (REGION_SIZE * REGION_SIZE) as f32;
            if max - min <= MIN_DYNAMIC_RANGE {
                // A featureless region is assumed light until a darker
                // neighbourhood says otherwise.
                average = min / 2.0;
                if vr > 0 && hr > 0 {
                    let bp = |h: i32, v: i32| black_points[(v * h_regions + h) as usize];
                    let neighbour_average =
                        (bp(hr, vr - 1) + 2.0 * bp(hr - 1, vr) + bp(hr - 1, vr - 1)) / 4.0;
                    if min < neighbour_average {
                        average = neighbour_average;
                    }
                }
            }
            black_points[(vr * h_regions + hr) as usize] = average;
        }
    }

    // Pass 2: threshold each region's pixels against the 5x5 window mean.
    let mut matrix = BitMatrix::new(width as u32, height as u32);
    let mut inverted = with_inverted.then(|| BitMatrix::new(width as u32, height as u32));
    for vr in 0..v_regions {
        for hr in 0..h_regions {
            let centre_h = clamp(hr, 2, h_regions - 3);
            let centre_v = clamp(vr, 2, v_regions - 3);
            let mut sum = 0f32;
            for dv in -2..=2 {
                for dh in -2..=2 {
                    let h = clamp(centre_h + dh, 0, h_regions - 1);
                    let v = clamp(centre_v + dv, 0, v_regions - 1);
                    sum += black_points[(v * h_regions + h) as usize];
                }
            }
            let threshold = sum / 25.0;
            for yy in 0..REGION_SIZE {
                for xx in 0..REGION_SIZE {
                    let x = hr * REGION_SIZE + xx;
                    let y = vr * REGION_SIZE + yy;
                    if x >= width || y >= height {
                        continue;
                    }
                    let dark = grey_at(x, y) <= threshold;
                    matrix.set(x, y, dark);
                    if let Some(inv) = inverted.as_mut() {
                        inv.set(x, y, !dark);
                    }
                }
            }
        }
    }

    Binarized { matrix, inverted }
}

#[cfg(test)]
mod should {
    use super::*;

    fn rgba_image(width: u32, height: u32, pixel: impl Fn(u32, u32) -> u8) -> Vec<u8> {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = pixel(x, y);
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        data
    }

    #[test]
    fn see_nothing_in_a_blank_page() {
        let data = rgba_image(64, 64, |_, _| 255);
        let result = binarize(&data, 64, 64, false);
        for y in 0..64 {
            for x in 0..64 {
                assert!(!result.matrix.get(x, y));
            }
        }
        assert!(result.inverted.is_none());
    }

    #[test]
    fn separate_a_dark_square_from_its_background() {
        let data = rgba_image(64, 64, |x, y| {
            if (16..48).contains(&x) && (16..48).contains(&y) {
                10
            } else {
                250
            }
        });
        let result = binarize(&data, 64, 64, false);
        assert!(result.matrix.get(32, 32));
        assert!(result.matrix.get(16, 16));
        assert!(!result.matrix.get(4, 4));
        assert!(!result.matrix.get(60, 60));
    }

    #[test]
    fn produce_an_exact_complement_when_asked() {
        let data = rgba_image(40, 40, |x, _| if x < 20 { 0 } else { 255 });
        let result = binarize(&data, 40, 40, true);
        let inverted = result.inverted.unwrap();
        for y in 0..40 {
            for x in 0..40 {
                assert_ne!(result.matrix.get(x, y), inverted.get(x, y));
            }
        }
    }

    #[test]
    fn weigh_channels_by_luma() {
        // A saturated green patch is much brighter than a saturated blue
        // one; on a mid-grey background only the blue patch reads dark.
        let mut data = Vec::new();
        for y in 0..32u32 {
            for x in 0..32u32 {
                let px: [u8; 4] = if y < 8 && x < 8 {
                    [0, 255, 0, 255]
                } else if y < 8 && x >= 24 {
                    [0, 0, 255, 255]
                } else {
                    [128, 128, 128, 255]
                };
                data.extend_from_slice(&px);
            }
        }
        let result = binarize(&data, 32, 32, false);
        assert!(!result.matrix.get(4, 4), "green reads light");
        assert!(result.matrix.get(28, 4), "blue reads dark");
    }
}
