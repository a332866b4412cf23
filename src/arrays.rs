use crate::common::Error;
use aligned_vec::{AVec, ConstAlign};
use std::ops::{Index, IndexMut};

const ALIGN: usize = 64;

/// Row-major 2D array (label images, edge indicator maps).
#[derive(Debug, Clone)]
pub struct Array2D<T> {
    pub data: AVec<T, ConstAlign<ALIGN>>,
    pub width: usize,
    pub height: usize,
}

impl<T> Array2D<T> {
    pub fn from_slice(data: &[T], width: usize, height: usize) -> Result<Self, Error>
    where
        T: Clone,
    {
        if data.len() != width * height {
            return Err(Error::dimension_mismatch(
                format!("{} elements ({width}x{height})", width * height),
                format!("{} elements", data.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            data: AVec::from_slice(ALIGN, data),
        })
    }

    pub fn from_fill(value: T, width: usize, height: usize) -> Self
    where
        T: Clone + Copy,
    {
        let data: AVec<T, ConstAlign<ALIGN>> =
            AVec::from_iter(ALIGN, (0..width * height).map(|_| value));
        Self {
            width,
            height,
            data,
        }
    }

    /// Fill from function of `(x, y)`.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let data: AVec<T, ConstAlign<ALIGN>> =
            AVec::from_iter(ALIGN, (0..width * height).map(|i| f(i % width, i / width)));
        Self {
            width,
            height,
            data,
        }
    }

    pub fn get_row(&self, row: usize) -> &[T] {
        debug_assert!(row < self.height);
        &self.data[(self.width * row)..(self.width * row + self.width)]
    }
    #[inline(always)]
    pub fn get_index(&self, x: usize, y: usize) -> usize {
        debug_assert!(self.width > x);
        debug_assert!(self.height > y);
        self.width * y + x
    }
    pub fn get_x_y_index(&self, ind: usize) -> (usize, usize) {
        debug_assert!(ind < self.data.len());
        (ind % self.width, ind / self.width)
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }
}
impl<T> Index<(usize, usize)> for Array2D<T> {
    type Output = T;
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.data[self.get_index(x, y)]
    }
}
impl<T> IndexMut<(usize, usize)> for Array2D<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        let idx = self.get_index(x, y);
        &mut self.data[idx]
    }
}

/// Packed per-pixel feature vectors with a fixed number of channels (e.g. Lab color).
///
/// Pixel `(x, y)` occupies `data[(y * width + x) * channels..][..channels]`.
#[derive(Debug, Clone)]
pub struct FeatureImage {
    pub data: AVec<f32, ConstAlign<ALIGN>>,
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl FeatureImage {
    pub fn from_slice(
        data: &[f32],
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<Self, Error> {
        if channels == 0 || data.len() != width * height * channels {
            return Err(Error::dimension_mismatch(
                format!("{width}x{height}x{channels} (non-zero channels)"),
                format!("{} elements", data.len()),
            ));
        }
        Ok(Self {
            data: AVec::from_slice(ALIGN, data),
            width,
            height,
            channels,
        })
    }

    /// Convert packed 8-bit pixels (e.g. RGB24) into float features.
    pub fn from_u8(
        data: &[u8],
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<Self, Error> {
        if channels == 0 || data.len() != width * height * channels {
            return Err(Error::dimension_mismatch(
                format!("{width}x{height}x{channels} (non-zero channels)"),
                format!("{} elements", data.len()),
            ));
        }
        Ok(Self {
            data: AVec::from_iter(ALIGN, data.iter().map(|v| *v as f32)),
            width,
            height,
            channels,
        })
    }

    #[inline(always)]
    pub fn get_index(&self, x: usize, y: usize) -> usize {
        debug_assert!(self.width > x);
        debug_assert!(self.height > y);
        (self.width * y + x) * self.channels
    }
    #[inline(always)]
    pub fn get_pixel(&self, x: usize, y: usize) -> &[f32] {
        let idx = self.get_index(x, y);
        &self.data[idx..idx + self.channels]
    }
    #[inline(always)]
    pub fn get_row(&self, row: usize) -> &[f32] {
        debug_assert!(row < self.height);
        let row_len = self.width * self.channels;
        &self.data[row_len * row..row_len * (row + 1)]
    }
}
impl Index<(usize, usize)> for FeatureImage {
    type Output = [f32];
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        self.get_pixel(x, y)
    }
}
