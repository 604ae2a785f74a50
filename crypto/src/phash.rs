//! Perceptual-hash engine (spec §4.1, component C1).
//!
//! Deterministic 64-bit fingerprint of an image: grayscale, resample to
//! 32x32, forward 2D DCT-II, median-threshold the top-left 8x8 block's 63
//! non-DC coefficients.

use image::imageops::FilterType;
use image::GenericImageView;

use crate::error::{CryptoError, Result};

const SIZE: usize = 32;
const BLOCK: usize = 8;

/// Compute the 16-hex-char pHash of an encoded image (JPEG/PNG/WebP/etc,
/// whatever the `image` crate's format sniffing recognizes).
pub fn phash(image_bytes: &[u8]) -> Result<String> {
    let decoded = image::load_from_memory(image_bytes)
        .map_err(|e| CryptoError::DecodeError(e.to_string()))?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(CryptoError::DecodeError("image has zero-sized dimension".into()));
    }

    let resized = decoded.resize_exact(SIZE as u32, SIZE as u32, FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let mut luma = [[0.0f64; SIZE]; SIZE];
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = [pixel[0] as f64, pixel[1] as f64, pixel[2] as f64];
        luma[y as usize][x as usize] = 0.299 * r + 0.587 * g + 0.114 * b;
    }

    let freq = dct_2d(&luma);

    let mut coefficients = Vec::with_capacity(BLOCK * BLOCK - 1);
    for u in 0..BLOCK {
        for v in 0..BLOCK {
            if u == 0 && v == 0 {
                continue;
            }
            coefficients.push(freq[u][v]);
        }
    }
    debug_assert_eq!(coefficients.len(), 63);

    let median = median_of(&coefficients);

    let mut bits: u64 = 0;
    for (i, &coeff) in coefficients.iter().enumerate() {
        if coeff > median {
            bits |= 1u64 << (62 - i);
        }
    }

    Ok(hex::encode(bits.to_be_bytes()))
}

/// Hamming distance between two pHash values, bit for bit.
///
/// This is plain pHash-to-pHash comparison, distinct from the match
/// engine's distance over OPRF token bytes (C7, spec §4.7) — useful for
/// offline database curation (grouping near-duplicate known-bad images
/// before evaluating them under `k`) and for asserting that visually
/// similar test images really do land at a low pHash distance before the
/// OPRF/match-engine pipeline obscures that relationship.
pub fn phash_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// Exact middle of an odd-length slice; this module only ever calls it
/// with the 63 AC coefficients, so no even-length averaging path exists.
fn median_of(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("DCT coefficients are never NaN"));
    sorted[sorted.len() / 2]
}

/// Separable forward 2D DCT-II with orthonormal scaling over an `SIZE` x
/// `SIZE` matrix, indexed `[row][col]` both on input and output.
fn dct_2d(input: &[[f64; SIZE]; SIZE]) -> [[f64; SIZE]; SIZE] {
    let mut after_rows = [[0.0f64; SIZE]; SIZE];
    for row in 0..SIZE {
        after_rows[row] = dct_1d(&input[row]);
    }

    let mut output = [[0.0f64; SIZE]; SIZE];
    for col in 0..SIZE {
        let column: [f64; SIZE] = std::array::from_fn(|row| after_rows[row][col]);
        let transformed = dct_1d(&column);
        for row in 0..SIZE {
            output[row][col] = transformed[row];
        }
    }
    output
}

fn dct_1d(input: &[f64; SIZE]) -> [f64; SIZE] {
    let n = SIZE as f64;
    let mut output = [0.0f64; SIZE];
    for u in 0..SIZE {
        let scale = if u == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        let mut sum = 0.0;
        for (x, &sample) in input.iter().enumerate() {
            let angle = std::f64::consts::PI * (2.0 * x as f64 + 1.0) * u as f64 / (2.0 * n);
            sum += sample * angle.cos();
        }
        output[u] = scale * sum;
    }
    output
}
