//! Writing frames to disk, keyed by file extension.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::hdr::HdrEncoder;
use image::{ImageError, Rgb, RgbImage};
use thiserror::Error;
use tracing::debug;

use crate::frame::Image;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("could not create output directory {path}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path}")]
    Encode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("unsupported image extension `{0}`, expected png, bmp, tga, jpg, jpeg or hdr")]
    UnsupportedExtension(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Bmp,
    Tga,
    Jpeg,
    Hdr,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Result<Self, OutputError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "bmp" => Ok(Self::Bmp),
            "tga" => Ok(Self::Tga),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "hdr" => Ok(Self::Hdr),
            _ => Err(OutputError::UnsupportedExtension(ext)),
        }
    }

    #[must_use]
    pub const fn is_lossless(self) -> bool {
        matches!(self, Self::Png | Self::Bmp | Self::Tga)
    }
}

/// Encodes `image` to `path`, creating missing parent directories first.
pub fn write_image(path: &Path, image: &Image) -> Result<(), OutputError> {
    let format = ImageFormat::from_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| OutputError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let encode_err = |source: ImageError| OutputError::Encode { path: path.to_path_buf(), source };
    match format {
        ImageFormat::Hdr => {
            let file = File::create(path).map_err(|e| encode_err(ImageError::IoError(e)))?;
            let data: Vec<Rgb<f32>> = image.pixels().iter().map(|c| Rgb([c.x, c.y, c.z])).collect();
            HdrEncoder::new(BufWriter::new(file))
                .encode(&data, image.width() as usize, image.height() as usize)
                .map_err(encode_err)?;
        }
        ImageFormat::Png | ImageFormat::Bmp | ImageFormat::Tga | ImageFormat::Jpeg => {
            let buffer = RgbImage::from_raw(image.width(), image.height(), image.to_rgb8())
                .ok_or_else(|| {
                    encode_err(ImageError::Parameter(image::error::ParameterError::from_kind(
                        image::error::ParameterErrorKind::DimensionMismatch,
                    )))
                })?;
            let target = match format {
                ImageFormat::Png => image::ImageFormat::Png,
                ImageFormat::Bmp => image::ImageFormat::Bmp,
                ImageFormat::Tga => image::ImageFormat::Tga,
                _ => image::ImageFormat::Jpeg,
            };
            buffer.save_with_format(path, target).map_err(encode_err)?;
        }
    }
    debug!(
        target: "tpm::render",
        "Wrote {}x{} image to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}
