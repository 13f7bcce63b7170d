//! Raster images: the in-memory grid type and the readers that fill it.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use ndarray::{Array3, Axis};
use tiff::decoder::{ChunkType, Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::{DatasetError, DatasetResult};

/// Multi-band image laid out as (channel, height, width)
pub type Image = Array3<f32>;

/// Source of multi-channel images.
///
/// Implementations must release any file handle before returning.
pub trait RasterBackend {
    fn read(&self, path: &Path) -> DatasetResult<Image>;
}

/// Reads (Geo)TIFF files with any number of bands, stored either
/// pixel-interleaved or as separate per-band strips
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffRaster;

impl RasterBackend for TiffRaster {
    fn read(&self, path: &Path) -> DatasetResult<Image> {
        if !path.is_file() {
            return Err(DatasetError::ImageNotFound(path.to_path_buf()));
        }

        let file = File::open(path)?;
        let mut decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| RasterFailure::from(e).at(path))?;
        let image = decode_bands(&mut decoder).map_err(|e| e.at(path))?;
        drop(decoder);

        debug!("Read raster {:?} with shape {:?}", path, image.dim());
        Ok(image)
    }
}

/// Value of the PlanarConfiguration tag for band-separate storage
const PLANAR_SEPARATE: u16 = 2;

enum RasterFailure {
    Tiff(tiff::TiffError),
    Layout(String),
}

impl From<tiff::TiffError> for RasterFailure {
    fn from(error: tiff::TiffError) -> Self {
        RasterFailure::Tiff(error)
    }
}

impl RasterFailure {
    fn at(self, path: &Path) -> DatasetError {
        let message = match self {
            RasterFailure::Tiff(e) => e.to_string(),
            RasterFailure::Layout(message) => message,
        };
        DatasetError::Raster {
            path: path.to_path_buf(),
            message,
        }
    }
}

/// Decode every band of the current TIFF image into a (C, H, W) grid.
///
/// The band count must match the SamplesPerPixel tag; a mismatch is an error
/// rather than a silently narrower image.
fn decode_bands<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Image, RasterFailure> {
    let (width, height) = decoder.dimensions()?;
    let (height, width) = (height as usize, width as usize);
    let bands = decoder
        .find_tag_unsigned::<u16>(Tag::SamplesPerPixel)?
        .unwrap_or(1) as usize;
    let separate = decoder.find_tag_unsigned::<u16>(Tag::PlanarConfiguration)?
        == Some(PLANAR_SEPARATE);

    let image = if separate && bands > 1 {
        read_separate_bands(decoder, height, width, bands)?
    } else {
        let samples = samples_to_f32(decoder.read_image()?);
        interleaved_to_planar(samples, height, width).map_err(RasterFailure::Layout)?
    };

    let decoded = image.len_of(Axis(0));
    if decoded != bands {
        return Err(RasterFailure::Layout(format!(
            "decoded {} bands but SamplesPerPixel is {}",
            decoded, bands
        )));
    }
    Ok(image)
}

/// Band-separate layout: all strips of band 0, then band 1, and so on.
/// `read_chunk` trims the padding of each band's last strip.
fn read_separate_bands<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    height: usize,
    width: usize,
    bands: usize,
) -> Result<Image, RasterFailure> {
    if decoder.get_chunk_type() != ChunkType::Strip {
        return Err(RasterFailure::Layout(
            "tiled band-separate TIFFs are not supported".to_string(),
        ));
    }
    let pixels = height * width;
    if pixels == 0 {
        return Err(RasterFailure::Layout("image has no pixels".to_string()));
    }

    let strips = decoder.strip_count()? as usize;
    if strips % bands != 0 {
        return Err(RasterFailure::Layout(format!(
            "{} strips do not divide into {} bands",
            strips, bands
        )));
    }
    let strips_per_band = strips / bands;

    let mut samples = Vec::with_capacity(pixels * bands);
    for band in 0..bands {
        let band_start = samples.len();
        for strip in 0..strips_per_band {
            let chunk = u32::try_from(band * strips_per_band + strip)
                .map_err(|e| RasterFailure::Layout(e.to_string()))?;
            samples.extend(samples_to_f32(decoder.read_chunk(chunk)?));
        }
        let band_len = samples.len() - band_start;
        if band_len != pixels {
            return Err(RasterFailure::Layout(format!(
                "band {} holds {} samples, expected {}x{}",
                band, band_len, height, width
            )));
        }
    }

    Array3::from_shape_vec((bands, height, width), samples)
        .map_err(|e| RasterFailure::Layout(e.to_string()))
}

fn samples_to_f32(samples: DecodingResult) -> Vec<f32> {
    #[allow(unreachable_patterns)]
    match samples {
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        _ => Vec::new(),
    }
}

/// Reorder pixel-interleaved samples (H, W, C) into a planar (C, H, W) image.
/// The band count is inferred from the sample count.
pub fn interleaved_to_planar(
    samples: Vec<f32>,
    height: usize,
    width: usize,
) -> Result<Image, String> {
    let pixels = height * width;
    if pixels == 0 {
        return Err("image has no pixels".to_string());
    }
    if samples.is_empty() || samples.len() % pixels != 0 {
        return Err(format!(
            "{} samples do not divide into {}x{} pixels",
            samples.len(),
            height,
            width
        ));
    }
    let channels = samples.len() / pixels;
    let hwc = Array3::from_shape_vec((height, width, channels), samples)
        .map_err(|e| e.to_string())?;
    Ok(hwc.permuted_axes([2, 0, 1]).as_standard_layout().into_owned())
}
