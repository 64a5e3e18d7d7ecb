//! Arithmetic mean over a read-only slice of samples.
//!
//! Every strategy accumulates in `f64` regardless of the element type, so
//! `f32` and integer samples are averaged at double precision. The strategies
//! differ only in the order in which additions happen:
//!
//! - [`Summation::Naive`] adds left to right.
//! - [`Summation::Unrolled`] spreads the slice over independent lanes, lane `i`
//!   taking elements `i, i + k, i + 2k, ...`, then folds the lanes and the
//!   remainder. This breaks the serial dependency chain of the naive loop and
//!   lets the compiler vectorize it, at the price of a different rounding order.
//! - [`Summation::Pairwise`] and [`Summation::Kahan`] give results that do not
//!   depend on the lane count.
//! - [`Summation::Streaming`] keeps a running mean instead of a running sum.

use crate::error::{Error, Result};
use crate::stats::Accumulator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this length pairwise summation falls back to a plain loop.
const PAIRWISE_BLOCK: usize = 128;

/// Number of independent partial sums used by the unrolled kernel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum Lanes {
    One,
    Two,
    Four,
    #[default]
    Eight,
    Sixteen,
    ThirtyTwo,
    SixtyFour,
}

impl Lanes {
    pub fn count(self) -> usize {
        match self {
            Lanes::One => 1,
            Lanes::Two => 2,
            Lanes::Four => 4,
            Lanes::Eight => 8,
            Lanes::Sixteen => 16,
            Lanes::ThirtyTwo => 32,
            Lanes::SixtyFour => 64,
        }
    }
}

impl TryFrom<usize> for Lanes {
    type Error = Error;

    fn try_from(count: usize) -> Result<Self> {
        match count {
            1 => Ok(Lanes::One),
            2 => Ok(Lanes::Two),
            4 => Ok(Lanes::Four),
            8 => Ok(Lanes::Eight),
            16 => Ok(Lanes::Sixteen),
            32 => Ok(Lanes::ThirtyTwo),
            64 => Ok(Lanes::SixtyFour),
            _ => Err(Error::InvalidLaneCount(count)),
        }
    }
}

impl From<Lanes> for usize {
    fn from(lanes: Lanes) -> Self {
        lanes.count()
    }
}

impl fmt::Display for Lanes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}

/// Order in which the samples are added up.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Summation {
    Naive,
    #[default]
    Unrolled,
    Pairwise,
    Kahan,
    Streaming,
}

impl Summation {
    pub const ALL: [Summation; 5] = [
        Summation::Naive,
        Summation::Unrolled,
        Summation::Pairwise,
        Summation::Kahan,
        Summation::Streaming,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Summation::Naive => "naive",
            Summation::Unrolled => "unrolled",
            Summation::Pairwise => "pairwise",
            Summation::Kahan => "kahan",
            Summation::Streaming => "streaming",
        }
    }
}

impl fmt::Display for Summation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A summation strategy together with the lane count used by [`Summation::Unrolled`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Reducer {
    pub summation: Summation,
    pub lanes: Lanes,
}

impl Reducer {
    pub fn new(summation: Summation, lanes: Lanes) -> Self {
        Self { summation, lanes }
    }

    /// Compute the arithmetic mean of `data`.
    ///
    /// # Errors
    /// Returns [`Error::DivideByZeroCount`] if `data` is empty.
    pub fn mean<T: Copy + Into<f64>>(&self, data: &[T]) -> Result<f64> {
        if data.is_empty() {
            return Err(Error::DivideByZeroCount);
        }

        let total = match self.summation {
            Summation::Naive => sum_naive(data),
            Summation::Unrolled => sum_unrolled(data, self.lanes),
            Summation::Pairwise => sum_pairwise(data),
            Summation::Kahan => sum_kahan(data),
            Summation::Streaming => {
                let mut acc = Accumulator::new();
                acc.extend(data.iter().map(|&val| Into::<f64>::into(val)));
                return acc.mean();
            }
        };

        Ok(total / data.len() as f64)
    }
}

/// Mean of `data` using the default strategy (8-lane unrolled summation).
pub fn mean<T: Copy + Into<f64>>(data: &[T]) -> Result<f64> {
    Reducer::default().mean(data)
}

pub fn sum_naive<T: Copy + Into<f64>>(data: &[T]) -> f64 {
    let mut sum = 0.0;
    for &val in data {
        sum += Into::<f64>::into(val);
    }
    sum
}

/// Sum `data` with `lanes` independent accumulators.
pub fn sum_unrolled<T: Copy + Into<f64>>(data: &[T], lanes: Lanes) -> f64 {
    match lanes {
        Lanes::One => sum_lanes::<T, 1>(data),
        Lanes::Two => sum_lanes::<T, 2>(data),
        Lanes::Four => sum_lanes::<T, 4>(data),
        Lanes::Eight => sum_lanes::<T, 8>(data),
        Lanes::Sixteen => sum_lanes::<T, 16>(data),
        Lanes::ThirtyTwo => sum_lanes::<T, 32>(data),
        Lanes::SixtyFour => sum_lanes::<T, 64>(data),
    }
}

/// Unrolled summation with a compile-time lane count `L`.
///
/// Lane sums are folded in lane order, then the `len % L` trailing elements
/// are added left to right.
#[inline]
pub fn sum_lanes<T: Copy + Into<f64>, const L: usize>(data: &[T]) -> f64 {
    const { assert!(L.is_power_of_two(), "lane count must be a power of two") };

    let mut lane_sums = [0.0_f64; L];
    let chunks = data.chunks_exact(L);
    let tail = chunks.remainder();

    for chunk in chunks {
        for (lane_sum, &val) in lane_sums.iter_mut().zip(chunk) {
            *lane_sum += Into::<f64>::into(val);
        }
    }

    let mut sum = 0.0;
    for lane_sum in lane_sums {
        sum += lane_sum;
    }
    for &val in tail {
        sum += Into::<f64>::into(val);
    }
    sum
}

/// Recursive halving down to blocks of `PAIRWISE_BLOCK` elements.
pub fn sum_pairwise<T: Copy + Into<f64>>(data: &[T]) -> f64 {
    if data.len() <= PAIRWISE_BLOCK {
        return sum_naive(data);
    }
    let (left, right) = data.split_at(data.len() / 2);
    sum_pairwise(left) + sum_pairwise(right)
}

/// Kahan-Babuska-Neumaier compensated summation.
pub fn sum_kahan<T: Copy + Into<f64>>(data: &[T]) -> f64 {
    let mut sum = 0.0_f64;
    let mut comp = 0.0_f64;
    for &val in data {
        let val: f64 = val.into();
        let next = sum + val;
        if sum.abs() >= val.abs() {
            comp += (sum - next) + val;
        } else {
            comp += (val - next) + sum;
        }
        sum = next;
    }
    sum + comp
}
