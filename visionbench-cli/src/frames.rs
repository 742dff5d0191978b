// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Image-directory frame source.
//!
//! Stands in for a live camera: every fetch reads, decodes and resizes the
//! next image, so that cost lands inside an end-to-end timing window.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use thiserror::Error;
use visionbench_benchmark::{Frame, InputProducer};
use visionbench_core::{HardValidationError, InputShape};

/// File extensions treated as frames.
const FRAME_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Errors raised while reading frames.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("No frames (jpg, jpeg, png, bmp) found in {dir}")]
    NoFrames { dir: PathBuf },

    #[error(transparent)]
    Invalid(#[from] HardValidationError),
}

/// Sorted list of image files yielded one frame per fetch.
#[derive(Debug)]
pub struct FrameDirectory {
    files: Vec<PathBuf>,
    target: InputShape,
    position: usize,
    repeat: bool,
}

impl FrameDirectory {
    /// List the frames in `dir`; each is resized to `target` when fetched.
    pub fn open(dir: impl AsRef<Path>, target: InputShape) -> Result<Self, FrameError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| FrameError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| FrameError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();
            if path.is_file() && is_frame(&path) {
                files.push(path);
            }
        }

        if files.is_empty() {
            return Err(FrameError::NoFrames {
                dir: dir.to_path_buf(),
            });
        }
        files.sort();

        tracing::debug!(dir = %dir.display(), frames = files.len(), "Frame directory opened");

        Ok(Self {
            files,
            target,
            position: 0,
            repeat: false,
        })
    }

    /// Start over from the first frame instead of exhausting.
    pub fn repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn decode(&self, path: &Path) -> Result<Frame, FrameError> {
        let image = image::open(path)
            .map_err(|source| FrameError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();

        let (width, height) = (self.target.width(), self.target.height());
        let image = if image.dimensions() == (width, height) {
            image
        } else {
            imageops::resize(&image, width, height, FilterType::Triangle)
        };

        Ok(Frame::from_rgb8(width, height, image.into_raw())?)
    }
}

impl InputProducer for FrameDirectory {
    type Item = Frame;
    type Error = FrameError;

    fn next_input(&mut self) -> Result<Option<Frame>, FrameError> {
        if self.position == self.files.len() {
            if !self.repeat {
                return Ok(None);
            }
            self.position = 0;
        }

        let path = self.files[self.position].clone();
        self.position += 1;
        self.decode(&path).map(Some)
    }
}

fn is_frame(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
