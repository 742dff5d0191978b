// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Input producers and the frame type fed to vision models.

use std::convert::Infallible;
use std::sync::Arc;

use visionbench_core::{HardValidationError, InputShape};

use crate::harness::InputProducer;

/// An RGB8 image in HWC layout.
///
/// Pixel data is reference counted, so cloning a frame per iteration does
/// not copy the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    shape: InputShape,
    data: Arc<[u8]>,
}

impl Frame {
    /// An all-zero frame: the fixed dummy input for static benchmarks.
    pub fn zeros(shape: InputShape) -> Self {
        Self {
            shape,
            data: vec![0u8; shape.rgb_len()].into(),
        }
    }

    /// Wrap packed RGB8 bytes. The length must be `width * height * 3`.
    pub fn from_rgb8(width: u32, height: u32, data: Vec<u8>) -> Result<Self, HardValidationError> {
        let shape = InputShape::new(width, height)?;
        if data.len() != shape.rgb_len() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "frame_data",
                value: data.len().to_string(),
                reason: format!("expected {} bytes for {} RGB8", shape.rgb_len(), shape),
            });
        }
        Ok(Self {
            shape,
            data: data.into(),
        })
    }

    pub fn shape(&self) -> InputShape {
        self.shape
    }

    pub fn width(&self) -> u32 {
        self.shape.width()
    }

    pub fn height(&self) -> u32 {
        self.shape.height()
    }

    /// Packed RGB8 bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Yields the same cached input on every call and never runs out.
#[derive(Debug, Clone)]
pub struct StaticInput<T> {
    input: T,
}

impl<T: Clone> StaticInput<T> {
    pub fn new(input: T) -> Self {
        Self { input }
    }
}

impl<T: Clone> InputProducer for StaticInput<T> {
    type Item = T;
    type Error = Infallible;

    fn next_input(&mut self) -> Result<Option<T>, Infallible> {
        Ok(Some(self.input.clone()))
    }
}

/// Yields the items of an iterator, then signals exhaustion.
#[derive(Debug)]
pub struct FiniteInputs<I> {
    inputs: I,
}

impl<I: Iterator> FiniteInputs<I> {
    pub fn new(inputs: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            inputs: inputs.into_iter(),
        }
    }
}

impl<I: Iterator> InputProducer for FiniteInputs<I> {
    type Item = I::Item;
    type Error = Infallible;

    fn next_input(&mut self) -> Result<Option<I::Item>, Infallible> {
        Ok(self.inputs.next())
    }
}

/// Producer backed by a closure, for capture sources that can fail.
pub struct FnInput<F> {
    fetch: F,
}

/// Build a producer from a closure returning `Ok(None)` on exhaustion.
pub fn from_fn<T, E, F>(fetch: F) -> FnInput<F>
where
    F: FnMut() -> Result<Option<T>, E>,
{
    FnInput { fetch }
}

impl<T, E, F> InputProducer for FnInput<F>
where
    F: FnMut() -> Result<Option<T>, E>,
{
    type Item = T;
    type Error = E;

    fn next_input(&mut self) -> Result<Option<T>, E> {
        (self.fetch)()
    }
}
