//! Owned storage for the benchmark samples.

use crate::error::{Error, Result};
use bytemuck::{Pod, Zeroable};

/// Alignment in bytes guaranteed by the aligned layout.
pub const ALIGNMENT: usize = 64;

const BLOCK_LEN: usize = ALIGNMENT / size_of::<f64>();

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C, align(64))]
struct Block([f64; BLOCK_LEN]);

enum Storage {
    Plain(Vec<f64>),
    Aligned(Vec<Block>),
}

/// Fixed-length, contiguous sample buffer.
///
/// The length is fixed at allocation. Values are written with [`SampleBuffer::fill`]
/// and read back through [`SampleBuffer::as_slice`].
pub struct SampleBuffer {
    storage: Storage,
    len: usize,
}

impl SampleBuffer {
    /// Allocate a zeroed buffer of `len` samples.
    ///
    /// With `aligned` set the first sample starts on a 64-byte boundary.
    ///
    /// # Errors
    /// Returns [`Error::AllocationFailure`] if the allocator cannot provide the
    /// memory or the byte size overflows.
    pub fn allocate(len: usize, aligned: bool) -> Result<Self> {
        let storage = if aligned {
            let n_blocks = len.div_ceil(BLOCK_LEN);
            let mut blocks = Vec::new();
            blocks
                .try_reserve_exact(n_blocks)
                .map_err(|_| Error::AllocationFailure { len })?;
            blocks.resize(n_blocks, Block::zeroed());
            Storage::Aligned(blocks)
        } else {
            let mut vals = Vec::new();
            vals.try_reserve_exact(len)
                .map_err(|_| Error::AllocationFailure { len })?;
            vals.resize(len, 0.0);
            Storage::Plain(vals)
        };

        Ok(Self { storage, len })
    }

    /// Overwrite the buffer with values from `vals`, returning how many were written.
    ///
    /// Stops at the buffer length or when `vals` runs out, whichever comes first.
    pub fn fill<I: IntoIterator<Item = f64>>(&mut self, vals: I) -> usize {
        let mut n_written = 0;
        for (slot, val) in self.as_mut_slice().iter_mut().zip(vals) {
            *slot = val;
            n_written += 1;
        }
        n_written
    }

    pub fn as_slice(&self) -> &[f64] {
        match &self.storage {
            Storage::Plain(vals) => vals.as_slice(),
            Storage::Aligned(blocks) => &bytemuck::cast_slice::<Block, f64>(blocks)[..self.len],
        }
    }

    fn as_mut_slice(&mut self) -> &mut [f64] {
        match &mut self.storage {
            Storage::Plain(vals) => vals.as_mut_slice(),
            Storage::Aligned(blocks) => {
                &mut bytemuck::cast_slice_mut::<Block, f64>(blocks)[..self.len]
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_aligned(&self) -> bool {
        matches!(self.storage, Storage::Aligned(_))
    }

    /// Address of the first sample modulo [`ALIGNMENT`].
    pub fn alignment_offset(&self) -> usize {
        self.as_slice().as_ptr() as usize % ALIGNMENT
    }
}
