//! mozjpeg-backed engine.
//!
//! libjpeg reports fatal errors by unwinding, so the whole compression runs
//! inside `catch_unwind` and a panic becomes an `EncodeFailure`.

use std::panic::{catch_unwind, AssertUnwindSafe};

use mozjpeg::qtable::{self, QTable};
use mozjpeg::{ColorSpace as MozColorSpace, Compress};
use tracing::debug;

use super::{validate_input, EncoderEngine, EngineLoader};
use crate::error::EncodeError;
use crate::options::{ColorSpace, EncodeOptions};

/// JPEG encoder built on the mozjpeg C library.
///
/// Honors quality, separate chroma quality, the base quantization table,
/// baseline/progressive, Huffman optimization, smoothing, output color space,
/// and explicit chroma subsampling when `auto_subsample` is off.
///
/// The trellis options are accepted but have no effect: the `mozjpeg` crate
/// does not expose the trellis parameters, and libjpeg runs its default
/// trellis pass whenever `optimize_coding` is on.
#[derive(Debug, Default, Clone, Copy)]
pub struct MozJpegEngine;

impl MozJpegEngine {
    pub fn new() -> Self {
        Self
    }
}

fn compress(pixels: &[u8], width: u32, height: u32, options: &EncodeOptions) -> std::io::Result<Vec<u8>> {
    let mut comp = Compress::new(MozColorSpace::JCS_EXT_RGBA);
    comp.set_size(width as usize, height as usize);

    comp.set_color_space(match options.color_space {
        ColorSpace::Grayscale => MozColorSpace::JCS_GRAYSCALE,
        ColorSpace::Rgb => MozColorSpace::JCS_RGB,
        ColorSpace::YCbCr => MozColorSpace::JCS_YCbCr,
    });
    comp.set_quality(options.quality as f32);

    let chroma_quality = if options.separate_chroma_quality {
        options.chroma_quality
    } else {
        options.quality
    };
    let (luma, chroma) = base_tables(options.quant_table);
    comp.set_luma_qtable(&luma.scaled(options.quality as f32, options.quality as f32));
    comp.set_chroma_qtable(&chroma.scaled(chroma_quality as f32, chroma_quality as f32));

    if options.progressive && !options.baseline {
        comp.set_progressive_mode();
    }
    comp.set_optimize_coding(options.optimize_coding);
    comp.set_smoothing_factor(options.smoothing);

    if !options.auto_subsample && options.color_space == ColorSpace::YCbCr {
        let sizes = options.chroma_subsample.pixel_sizes();
        comp.set_chroma_sampling_pixel_sizes(sizes, sizes);
    }

    let mut started = comp.start_compress(Vec::new())?;
    started.write_scanlines(pixels)?;
    started.finish()
}

/// Luma and chroma tables for a libjpeg base table index (0-8).
fn base_tables(index: u8) -> (&'static QTable, &'static QTable) {
    match index {
        0 => (&qtable::AnnexK_Luma, &qtable::AnnexK_Chroma),
        1 => (&qtable::Flat, &qtable::Flat),
        2 => (&qtable::MSSSIM_Luma, &qtable::MSSSIM_Chroma),
        4 => (&qtable::PSNRHVS_Luma, &qtable::PSNRHVS_Chroma),
        5 => (&qtable::KleinSilversteinCarney, &qtable::KleinSilversteinCarney),
        6 => (&qtable::WatsonTaylorBorthwick, &qtable::WatsonTaylorBorthwick),
        7 => (&qtable::AhumadaWatsonPeterson, &qtable::AhumadaWatsonPeterson),
        8 => (&qtable::PetersonAhumadaWatson, &qtable::PetersonAhumadaWatson),
        // 3 is mozjpeg's default; validate_input rejects anything above 8
        _ => (&qtable::NRobidoux, &qtable::NRobidoux),
    }
}

impl EncoderEngine for MozJpegEngine {
    fn name(&self) -> &'static str {
        "mozjpeg"
    }

    fn encode(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, EncodeError> {
        validate_input(pixels, width, height, options)?;

        if options.arithmetic {
            return Err(EncodeError::InvalidInput(
                "arithmetic coding is not enabled in this mozjpeg build".to_string(),
            ));
        }

        let bytes = catch_unwind(AssertUnwindSafe(|| compress(pixels, width, height, options)))
            .map_err(|_| EncodeError::EncodeFailure("mozjpeg aborted compression".to_string()))?
            .map_err(|e| EncodeError::EncodeFailure(format!("mozjpeg: {e}")))?;

        debug!(width, height, quality = options.quality, size = bytes.len(), "mozjpeg encode");
        Ok(bytes)
    }
}

/// Loader for [`MozJpegEngine`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MozJpegLoader;

impl EngineLoader for MozJpegLoader {
    fn load(&self) -> Result<Box<dyn EncoderEngine>, EncodeError> {
        Ok(Box::new(MozJpegEngine::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_progressive_default() {
        let pixels = vec![128u8; 32 * 32 * 4];
        let jpeg = MozJpegEngine::new()
            .encode(&pixels, 32, 32, &EncodeOptions::default())
            .unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
        // SOF2 marks a progressive frame
        assert!(jpeg.windows(2).any(|w| w == [0xFF, 0xC2]));
    }

    #[test]
    fn test_encode_baseline_when_requested() {
        let pixels = vec![128u8; 32 * 32 * 4];
        let mut opts = EncodeOptions::default();
        opts.baseline = true;
        opts.progressive = false;

        let jpeg = MozJpegEngine::new().encode(&pixels, 32, 32, &opts).unwrap();
        assert!(!jpeg.windows(2).any(|w| w == [0xFF, 0xC2]));
    }

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| {
                let (x, y) = (i % width, i / width);
                [(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8, 255]
            })
            .collect()
    }

    #[test]
    fn test_quant_table_changes_output() {
        let pixels = gradient(32, 32);
        let encode = |quant_table| {
            let mut opts = EncodeOptions::default();
            opts.quant_table = quant_table;
            MozJpegEngine::new().encode(&pixels, 32, 32, &opts).unwrap()
        };

        let annex_k = encode(0);
        let flat = encode(1);
        let robidoux = encode(3);
        assert_ne!(annex_k, flat);
        assert_ne!(flat, robidoux);
        assert_eq!(robidoux, MozJpegEngine::new().encode(&pixels, 32, 32, &EncodeOptions::default()).unwrap());
    }

    #[test]
    fn test_separate_chroma_quality_changes_output() {
        let pixels = gradient(32, 32);
        let shared = MozJpegEngine::new()
            .encode(&pixels, 32, 32, &EncodeOptions::default())
            .unwrap();

        let mut opts = EncodeOptions::default();
        opts.separate_chroma_quality = true;
        opts.chroma_quality = 10;
        let separate = MozJpegEngine::new().encode(&pixels, 32, 32, &opts).unwrap();

        assert_ne!(shared, separate);
        // Chroma quality is ignored unless enabled
        opts.separate_chroma_quality = false;
        assert_eq!(shared, MozJpegEngine::new().encode(&pixels, 32, 32, &opts).unwrap());
    }

    #[test]
    fn test_encode_short_buffer_rejected() {
        let result = MozJpegEngine::new().encode(&[0u8; 15], 2, 2, &EncodeOptions::default());
        assert!(matches!(result, Err(EncodeError::InvalidInput(_))));
    }
}
