//! Planned complex FFTs over the grid length.

use std::fmt;
use std::sync::Arc;

use num_complex::Complex32;
use rustfft::FftPlanner;
use tilepic_grid::{Grid, GridError};

/// A forward/inverse pair of planned transforms of fixed length.
///
/// The forward transform uses `exp(-i·2πjk/n)` and is normalized by `1/n`;
/// the inverse uses `exp(+i·2πjk/n)` unnormalized, so
/// `inverse(forward(x)) == x`.
#[derive(Clone)]
pub struct Fft {
    len: usize,
    forward: Arc<dyn rustfft::Fft<f32>>,
    inverse: Arc<dyn rustfft::Fft<f32>>,
    scratch: Vec<Complex32>,
}

impl Fft {
    /// Plan transforms over `grid.nx()` points.
    ///
    /// Returns `Err(GridError::NotPowerOfTwo)` unless `nx` is a power of
    /// two.
    pub fn new(grid: &Grid) -> Result<Self, GridError> {
        let n = grid.nx();
        if !grid.is_power_of_two() {
            return Err(GridError::NotPowerOfTwo { nx: n });
        }
        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(n);
        let inverse = planner.plan_fft_inverse(n);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Ok(Self {
            len: n,
            forward,
            inverse,
            scratch: vec![Complex32::default(); scratch_len],
        })
    }

    /// Transform length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the transform has zero length (never, for a valid grid).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Normalized forward transform, in place.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` differs from [`len()`](Self::len).
    pub fn forward(&mut self, data: &mut [Complex32]) {
        assert_eq!(data.len(), self.len, "FFT length mismatch");
        self.forward.process_with_scratch(data, &mut self.scratch);
        let scale = 1.0 / self.len as f32;
        for z in data.iter_mut() {
            *z *= scale;
        }
    }

    /// Unnormalized inverse transform, in place.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` differs from [`len()`](Self::len).
    pub fn inverse(&mut self, data: &mut [Complex32]) {
        assert_eq!(data.len(), self.len, "FFT length mismatch");
        self.inverse.process_with_scratch(data, &mut self.scratch);
    }
}

impl fmt::Debug for Fft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fft")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fft(n: usize) -> Fft {
        Fft::new(&Grid::new(n).unwrap()).unwrap()
    }

    #[test]
    fn rejects_non_power_of_two() {
        let err = Fft::new(&Grid::new(12).unwrap()).unwrap_err();
        assert_eq!(err, GridError::NotPowerOfTwo { nx: 12 });
    }

    #[test]
    fn single_point_is_identity() {
        let mut f = fft(1);
        let mut data = [Complex32::new(3.0, -1.0)];
        f.forward(&mut data);
        assert_eq!(data[0], Complex32::new(3.0, -1.0));
    }

    #[test]
    fn constant_maps_to_mean() {
        let mut f = fft(8);
        let mut data = vec![Complex32::new(2.0, 0.0); 8];
        f.forward(&mut data);
        assert!((data[0].re - 2.0).abs() < 1e-6);
        assert!(data[1..].iter().all(|z| z.norm() < 1e-6));
    }

    #[test]
    fn cosine_lands_in_plus_minus_mode() {
        let n = 16;
        let mut f = fft(n);
        let mut data: Vec<Complex32> = (0..n)
            .map(|j| {
                let x = 2.0 * std::f32::consts::PI * 3.0 * j as f32 / n as f32;
                Complex32::new(x.cos(), 0.0)
            })
            .collect();
        f.forward(&mut data);
        for (j, z) in data.iter().enumerate() {
            let expected = if j == 3 || j == n - 3 { 0.5 } else { 0.0 };
            assert!((z.re - expected).abs() < 1e-5, "mode {j}: {z}");
            assert!(z.im.abs() < 1e-5, "mode {j}: {z}");
        }
    }

    #[test]
    fn sine_uses_negative_exponent_forward() {
        let (n, m) = (16, 2);
        let mut f = fft(n);
        let mut data: Vec<Complex32> = (0..n)
            .map(|j| {
                let x = 2.0 * std::f32::consts::PI * m as f32 * j as f32 / n as f32;
                Complex32::new(x.sin(), 0.0)
            })
            .collect();
        f.forward(&mut data);
        assert!((data[m] - Complex32::new(0.0, -0.5)).norm() < 1e-5);
        assert!((data[n - m] - Complex32::new(0.0, 0.5)).norm() < 1e-5);
    }

    proptest! {
        #[test]
        fn round_trip(exp in 0u32..8, seed in prop::collection::vec(-10.0f32..10.0, 256)) {
            let n = 1usize << exp;
            let mut f = fft(n);
            let original: Vec<Complex32> =
                seed[..n].iter().map(|&v| Complex32::new(v, 0.5 * v)).collect();
            let mut data = original.clone();
            f.forward(&mut data);
            f.inverse(&mut data);
            for (a, b) in data.iter().zip(&original) {
                prop_assert!((a - b).norm() < 1e-4);
            }
        }
    }
}
