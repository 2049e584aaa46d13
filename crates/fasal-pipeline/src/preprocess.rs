// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image normalisation ahead of diagnosis.
//!
//! Large photos are scaled down so the longest side fits the configured
//! bound, converted to RGB and re-encoded as JPEG. Decoding runs on the
//! blocking pool. Any failure, including the stage timeout, passes the
//! original bytes through untouched.

use std::io::Cursor;
use std::time::Duration;

use fasal_core::ImagePayload;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::{debug, warn};

/// Result of the preprocessing stage.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub image: ImagePayload,
    pub resized: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    max_dimension: u32,
    jpeg_quality: u8,
    timeout: Duration,
}

impl Preprocessor {
    pub fn new(max_dimension: u32, jpeg_quality: u8, timeout: Duration) -> Self {
        Self {
            max_dimension,
            jpeg_quality,
            timeout,
        }
    }

    /// Normalises `image`, falling back to the original on any error.
    pub async fn run(&self, image: ImagePayload) -> Preprocessed {
        let bytes = image.bytes.clone();
        let (max, quality) = (self.max_dimension, self.jpeg_quality);
        let task = tokio::task::spawn_blocking(move || normalize(&bytes, max, quality));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok((bytes, resized)))) => {
                debug!(
                    original = image.bytes.len(),
                    processed = bytes.len(),
                    resized,
                    "image preprocessed"
                );
                Preprocessed {
                    image: ImagePayload::new(bytes, "image/jpeg", image.source),
                    resized,
                }
            }
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "image preprocessing failed, using original");
                Self::passthrough(image)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "preprocessing task panicked, using original");
                Self::passthrough(image)
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "image preprocessing timed out");
                Self::passthrough(image)
            }
        }
    }

    fn passthrough(image: ImagePayload) -> Preprocessed {
        Preprocessed {
            image,
            resized: false,
        }
    }
}

/// Decodes, bounds and re-encodes one image. Returns the JPEG bytes and
/// whether the image was scaled down.
fn normalize(bytes: &[u8], max_dimension: u32, quality: u8) -> Result<(Vec<u8>, bool), image::ImageError> {
    let mut img = image::load_from_memory(bytes)?;

    let resized = img.width() > max_dimension || img.height() > max_dimension;
    if resized {
        img = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
    }

    let rgb = img.to_rgb8();
    let mut out = Cursor::new(Vec::with_capacity(bytes.len() / 2));
    JpegEncoder::new_with_quality(&mut out, quality).encode_image(&rgb)?;
    Ok((out.into_inner(), resized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([30, 160, 40, 128]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn preprocessor() -> Preprocessor {
        Preprocessor::new(1024, 90, Duration::from_secs(8))
    }

    #[tokio::test]
    async fn large_image_is_bounded_and_reencoded() {
        let input = ImagePayload::new(png(2000, 1000), "image/png", "web");
        let out = preprocessor().run(input).await;

        assert!(out.resized);
        assert_eq!(out.image.media_type, "image/jpeg");
        assert_eq!(out.image.source, "web");
        let decoded = image::load_from_memory(&out.image.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1024, 512));
    }

    #[tokio::test]
    async fn small_image_keeps_its_size() {
        let input = ImagePayload::new(png(300, 200), "image/png", "web");
        let out = preprocessor().run(input).await;

        assert!(!out.resized);
        assert_eq!(out.image.media_type, "image/jpeg");
        let decoded = image::load_from_memory(&out.image.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 200));
    }

    #[tokio::test]
    async fn undecodable_bytes_pass_through() {
        let input = ImagePayload::new(b"definitely not an image".to_vec(), "image/webp", "web");
        let out = preprocessor().run(input.clone()).await;

        assert!(!out.resized);
        assert_eq!(out.image, input);
    }
}
