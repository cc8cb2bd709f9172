//! Mood collage rendering.
//!
//! An embedding is reduced to a handful of visual parameters (hue,
//! saturation, shape count...) which drive a procedurally drawn PNG.
//! Randomness is seeded from the embedding, so the same embedding always
//! produces the same image.

use std::io::Cursor;

use base64::Engine;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{MoodCollage, VisualParams};

/// Colours in the generated palette.
const PALETTE_SIZE: usize = 5;

/// Dominant colours reported per collage.
const DOMINANT_COLORS: usize = 5;

/// Pixels sampled per dominant colour.
const COLOR_SAMPLE: usize = 1000;

/// Side of the thumbnail colours are sampled from.
const THUMBNAIL_SIZE: u32 = 100;

/// Value used for an embedding slice that is too short to average.
const MISSING_SLICE: f64 = 0.5;

/// Renders mood collages from embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodCollageGenerator {
    pub width: u32,
    pub height: u32,
}

impl Default for MoodCollageGenerator {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl MoodCollageGenerator {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Render a collage for `embedding`, optionally tinted by `emotion`.
    pub fn generate(&self, embedding: &[f32], emotion: Option<&str>) -> Result<MoodCollage> {
        let params = visual_params(embedding, emotion);
        let mut rng = StdRng::seed_from_u64(embedding_seed(embedding));

        let image = self.render(&params, &mut rng);
        let dominant_colors = dominant_colors(&image, &mut rng);
        let image_base64 = encode_png(image)?;

        info!(
            "Generated {}x{} mood collage with {} shapes",
            self.width, self.height, params.num_shapes
        );

        Ok(MoodCollage {
            image_base64,
            dominant_colors,
            visual_params: params,
            width: self.width,
            height: self.height,
        })
    }

    fn render(&self, params: &VisualParams, rng: &mut StdRng) -> RgbImage {
        let colors = palette(params.primary_hue, params.saturation, params.value);
        let mut image = gradient(self.width, self.height, colors[0], colors[1]);

        let size = (20.0 + params.complexity * 100.0) as i64;
        let alpha = ((50.0 + params.complexity * 150.0) as u32).min(255) as u8;
        let mirrored = params.symmetry > 0.6;

        for i in 0..params.num_shapes as usize {
            let x = rng.gen_range(0..self.width) as i64;
            let y = rng.gen_range(0..self.height) as i64;
            let color = colors[i % colors.len()];
            let mirror_x = self.width as i64 - x - size;

            match i % 4 {
                0 => {
                    fill_ellipse(&mut image, x, y, size, color, alpha);
                    if mirrored {
                        fill_ellipse(&mut image, mirror_x, y, size, color, alpha);
                    }
                }
                1 => {
                    fill_rect(&mut image, x, y, size, color, alpha);
                    if mirrored {
                        fill_rect(&mut image, mirror_x, y, size, color, alpha);
                    }
                }
                2 => fill_triangle(&mut image, x, y, size, color, alpha),
                _ => draw_diagonal(&mut image, x, y, size, color, alpha),
            }
        }

        if params.blur_amount > 0.0 {
            debug!("Blurring collage with sigma {:.2}", params.blur_amount);
            image = imageops::blur(&image, params.blur_amount as f32);
        }
        image
    }
}

/// Visual parameters derived from the min-max normalized embedding.
pub fn visual_params(embedding: &[f32], emotion: Option<&str>) -> VisualParams {
    let normalized = min_max_normalize(embedding);

    let complexity = std_dev(&normalized);
    let symmetry = if normalized.is_empty() {
        1.0
    } else {
        1.0 - normalized.iter().map(|x| (x - 0.5).abs()).sum::<f64>() / normalized.len() as f64
    };

    let mut params = VisualParams {
        primary_hue: slice_mean(&normalized, 0, 10) * 360.0,
        saturation: slice_mean(&normalized, 10, 20) * 0.7 + 0.3,
        value: slice_mean(&normalized, 20, 30) * 0.5 + 0.5,
        complexity,
        symmetry,
        blur_amount: slice_mean(&normalized, 30, 40) * 5.0,
        num_shapes: (10.0 + complexity * 40.0) as u32,
        emotion: emotion.map(|e| e.to_string()),
    };

    if let Some(emotion) = emotion {
        adjust_for_emotion(&mut params, emotion);
    }
    params
}

/// Push the parameters toward the look of well-known moods.
fn adjust_for_emotion(params: &mut VisualParams, emotion: &str) {
    let emotion = emotion.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| emotion.contains(w));

    if mentions(&["happy", "joy"]) {
        params.saturation = params.saturation.max(0.7);
        params.value = params.value.max(0.8);
        params.primary_hue = (params.primary_hue + 45.0) % 360.0;
    } else if mentions(&["sad", "melanchol"]) {
        params.saturation = params.saturation.min(0.5);
        params.value = params.value.min(0.6);
        params.primary_hue = 210.0;
    } else if mentions(&["energetic", "hyper"]) {
        params.complexity = params.complexity.max(0.7);
        params.num_shapes = params.num_shapes.max(40);
        params.saturation = params.saturation.max(0.8);
    } else if mentions(&["calm", "peaceful"]) {
        params.complexity = params.complexity.min(0.4);
        params.saturation = params.saturation.min(0.6);
        params.blur_amount = params.blur_amount.max(3.0);
    } else if mentions(&["angry", "rage"]) {
        params.primary_hue = 0.0;
        params.saturation = params.saturation.max(0.8);
        params.complexity = params.complexity.max(0.6);
    }
}

fn min_max_normalize(embedding: &[f32]) -> Vec<f64> {
    let min = embedding.iter().copied().fold(f32::INFINITY, f32::min);
    let max = embedding.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = f64::from(max - min) + 1e-8;
    embedding
        .iter()
        .map(|x| f64::from(x - min) / range)
        .collect()
}

fn slice_mean(values: &[f64], start: usize, end: usize) -> f64 {
    let end = end.min(values.len());
    if start >= end {
        return MISSING_SLICE;
    }
    let slice = &values[start..end];
    slice.iter().sum::<f64>() / slice.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Stable RNG seed for an embedding (FNV-1a over the float bits).
fn embedding_seed(embedding: &[f32]) -> u64 {
    embedding.iter().fold(0xcbf2_9ce4_8422_2325, |hash, x| {
        (hash ^ u64::from(x.to_bits())).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Five colours hue-stepped by 60 degrees around `base_hue`.
fn palette(base_hue: f64, saturation: f64, value: f64) -> Vec<[u8; 3]> {
    let middle = (PALETTE_SIZE / 2) as f64;
    (0..PALETTE_SIZE)
        .map(|i| {
            let offset = i as f64 - middle;
            let hue = (base_hue + i as f64 * 60.0).rem_euclid(360.0) / 360.0;
            let sat = (saturation + offset * 0.1).clamp(0.0, 1.0);
            let val = (value + offset * 0.05).clamp(0.0, 1.0);
            hsv_to_rgb(hue, sat, val)
        })
        .collect()
}

/// HSV (all components 0-1) to 8-bit RGB.
fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [u8; 3] {
    let to_byte = |c: f64| (c * 255.0) as u8;
    if s == 0.0 {
        return [to_byte(v); 3];
    }

    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [to_byte(r), to_byte(g), to_byte(b)]
}

/// Vertical gradient from `top` to `bottom`.
fn gradient(width: u32, height: u32, top: [u8; 3], bottom: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(width, height, |_, y| {
        let ratio = f64::from(y) / f64::from(height);
        let mix = |a: u8, b: u8| (f64::from(a) * (1.0 - ratio) + f64::from(b) * ratio) as u8;
        Rgb([mix(top[0], bottom[0]), mix(top[1], bottom[1]), mix(top[2], bottom[2])])
    })
}

/// Alpha-blend one pixel; out-of-bounds coordinates are ignored.
fn blend_pixel(image: &mut RgbImage, x: i64, y: i64, color: [u8; 3], alpha: u8) {
    if x < 0 || y < 0 || x >= i64::from(image.width()) || y >= i64::from(image.height()) {
        return;
    }
    let a = f64::from(alpha) / 255.0;
    let pixel = image.get_pixel_mut(x as u32, y as u32);
    for (channel, src) in pixel.0.iter_mut().zip(color) {
        *channel = (f64::from(src) * a + f64::from(*channel) * (1.0 - a)).round() as u8;
    }
}

fn fill_rect(image: &mut RgbImage, x: i64, y: i64, size: i64, color: [u8; 3], alpha: u8) {
    for py in y..=y + size {
        for px in x..=x + size {
            blend_pixel(image, px, py, color, alpha);
        }
    }
}

fn fill_ellipse(image: &mut RgbImage, x: i64, y: i64, size: i64, color: [u8; 3], alpha: u8) {
    let radius = size as f64 / 2.0;
    let (cx, cy) = (x as f64 + radius, y as f64 + radius);
    for py in y..=y + size {
        for px in x..=x + size {
            let (dx, dy) = (px as f64 - cx, py as f64 - cy);
            if dx * dx + dy * dy <= radius * radius {
                blend_pixel(image, px, py, color, alpha);
            }
        }
    }
}

/// Upward-pointing triangle inside the `size` box at `(x, y)`.
fn fill_triangle(image: &mut RgbImage, x: i64, y: i64, size: i64, color: [u8; 3], alpha: u8) {
    if size <= 0 {
        return;
    }
    let apex = x as f64 + size as f64 / 2.0;
    for py in y..=y + size {
        let half = (py - y) as f64 / 2.0;
        let (left, right) = ((apex - half).round() as i64, (apex + half).round() as i64);
        for px in left..=right {
            blend_pixel(image, px, py, color, alpha);
        }
    }
}

/// Three-pixel-wide line from `(x, y)` to `(x + size, y + size)`.
fn draw_diagonal(image: &mut RgbImage, x: i64, y: i64, size: i64, color: [u8; 3], alpha: u8) {
    for i in 0..=size {
        for w in -1..=1 {
            blend_pixel(image, x + i + w, y + i, color, alpha);
        }
    }
}

/// Mean colours of random pixel samples from a thumbnail, as `#rrggbb`.
fn dominant_colors(image: &RgbImage, rng: &mut StdRng) -> Vec<String> {
    let thumbnail = imageops::resize(image, THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Triangle);
    let pixels: Vec<[u8; 3]> = thumbnail.pixels().map(|p| p.0).collect();
    if pixels.is_empty() {
        return Vec::new();
    }

    let samples = COLOR_SAMPLE.min(pixels.len());
    (0..DOMINANT_COLORS)
        .map(|_| {
            let mut sum = [0u64; 3];
            for _ in 0..samples {
                let pixel = pixels[rng.gen_range(0..pixels.len())];
                for (acc, c) in sum.iter_mut().zip(pixel) {
                    *acc += u64::from(c);
                }
            }
            let n = samples as u64;
            format!("#{:02x}{:02x}{:02x}", sum[0] / n, sum[1] / n, sum[2] / n)
        })
        .collect()
}

fn encode_png(image: RgbImage) -> Result<String> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image).write_to(&mut buffer, ImageFormat::Png)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(buffer.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 / len as f32) - 0.5).collect()
    }

    #[test]
    fn test_visual_params_ranges() {
        let params = visual_params(&ramp(384), None);
        assert!((0.0..=360.0).contains(&params.primary_hue));
        assert!((0.3..=1.0).contains(&params.saturation));
        assert!((0.5..=1.0).contains(&params.value));
        assert!((0.0..=1.0).contains(&params.symmetry));
        assert!((10..=50).contains(&params.num_shapes));
        assert!(params.emotion.is_none());
    }

    #[test]
    fn test_short_embedding_uses_midpoint_for_missing_slices() {
        let params = visual_params(&[0.0, 1.0], None);
        // saturation, value and blur slices are empty
        assert!((params.saturation - (0.5 * 0.7 + 0.3)).abs() < 1e-9);
        assert!((params.value - 0.75).abs() < 1e-9);
        assert!((params.blur_amount - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_emotion_adjustments() {
        let sad = visual_params(&ramp(64), Some("Sad"));
        assert_eq!(sad.primary_hue, 210.0);
        assert!(sad.saturation <= 0.5);

        let angry = visual_params(&ramp(64), Some("rage"));
        assert_eq!(angry.primary_hue, 0.0);
        assert!(angry.complexity >= 0.6);

        let calm = visual_params(&ramp(64), Some("calm"));
        assert!(calm.blur_amount >= 3.0);
    }

    #[test]
    fn test_hsv_to_rgb() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [255, 0, 0]);
        assert_eq!(hsv_to_rgb(0.5, 1.0, 1.0), [0, 255, 255]);
        assert_eq!(hsv_to_rgb(0.5, 0.0, 0.5), [127, 127, 127]);
    }

    #[test]
    fn test_palette_has_five_colours() {
        assert_eq!(palette(120.0, 0.6, 0.7).len(), PALETTE_SIZE);
    }

    #[test]
    fn test_generate_is_deterministic() {
        let generator = MoodCollageGenerator::new(80, 60);
        let embedding = ramp(48);
        let first = generator.generate(&embedding, Some("happy")).unwrap();
        let second = generator.generate(&embedding, Some("happy")).unwrap();

        assert_eq!(first.image_base64, second.image_base64);
        assert_eq!(first.dominant_colors, second.dominant_colors);
        assert_eq!(first.dominant_colors.len(), DOMINANT_COLORS);
        assert!(first.dominant_colors.iter().all(|c| c.len() == 7 && c.starts_with('#')));
        assert_eq!((first.width, first.height), (80, 60));
    }

    #[test]
    fn test_generated_image_is_png() {
        let collage = MoodCollageGenerator::new(32, 24).generate(&ramp(16), None).unwrap();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(collage.image_base64)
            .unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
