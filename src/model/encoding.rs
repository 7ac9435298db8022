// ============================================================
// Sinusoidal Positional Encoding
// ============================================================
// Self-attention treats its input as an unordered set: permute
// the tokens and the attention weights permute with them. Order
// has to be injected explicitly, so every position gets a fixed
// d_model-wide pattern added to its embedding:
//
//   PE(pos, 2i)   = sin(pos / 10000^(2i / d_model))
//   PE(pos, 2i+1) = cos(pos / 10000^(2i / d_model))
//
// Each sin/cos pair oscillates at its own wavelength, from 2π in
// the first columns up to 10000·2π in the last, so nearby positions
// get nearly identical patterns while distant ones diverge.
//
// Nothing here is learned. The table is computed once at model
// construction and sliced per forward pass.
//
// Reference: Vaswani et al. 2017, §3.5 (Positional Encoding)

use burn::prelude::*;

/// Build the encoding table as a flat row-major [max_seq_len * d_model]
/// buffer. Angles are computed in f64 and truncated to f32 at the end,
/// so the same arguments always produce bit-identical tables.
pub fn sinusoidal_table(max_seq_len: usize, d_model: usize) -> Vec<f32> {
    let mut table = vec![0.0_f32; max_seq_len * d_model];
    for pos in 0..max_seq_len {
        let row = pos * d_model;
        for pair in 0..d_model.div_ceil(2) {
            let exponent = (2 * pair) as f64 / d_model as f64;
            let angle = pos as f64 / 10000_f64.powf(exponent);
            table[row + 2 * pair] = angle.sin() as f32;
            // Odd d_model leaves the last pair without a cos column
            if 2 * pair + 1 < d_model {
                table[row + 2 * pair + 1] = angle.cos() as f32;
            }
        }
    }
    table
}

#[derive(Config, Debug)]
pub struct PositionalEncodingConfig {
    pub d_model: usize,

    /// Longest sequence the table covers; longer inputs panic
    #[config(default = 100)]
    pub max_seq_len: usize,
}

impl PositionalEncodingConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PositionalEncoding<B> {
        let table = sinusoidal_table(self.max_seq_len, self.d_model);
        let encoding = Tensor::<B, 1>::from_floats(table.as_slice(), device)
            .reshape([1, self.max_seq_len, self.d_model]);
        PositionalEncoding {
            encoding,
            max_seq_len: self.max_seq_len,
        }
    }
}

/// Adds the fixed position pattern to a batch of embeddings.
/// The table is a plain tensor, not a parameter: optimisers and
/// checkpoints never touch it.
#[derive(Module, Debug)]
pub struct PositionalEncoding<B: Backend> {
    pub encoding:    Tensor<B, 3>,
    pub max_seq_len: usize,
}

impl<B: Backend> PositionalEncoding<B> {
    /// embeddings: [batch, seq_len, d_model] → same shape with positions added
    pub fn forward(&self, embeddings: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch_size, seq_len, d_model] = embeddings.dims();
        let [_, max_seq_len, table_width] = self.encoding.dims();

        assert!(
            seq_len <= max_seq_len,
            "sequence length {seq_len} exceeds the positional table ({max_seq_len} positions)",
        );
        assert!(
            d_model == table_width,
            "embedding width {d_model} does not match the positional table width {table_width}",
        );

        let positions = self
            .encoding
            .clone()
            .slice([0..1, 0..seq_len, 0..d_model])
            .expand([batch_size, seq_len, d_model]);

        embeddings + positions
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArrayDevice;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_table_is_deterministic() {
        // Same arguments, same bits: no randomness anywhere
        let first  = sinusoidal_table(16, 8);
        let second = sinusoidal_table(16, 8);
        assert_eq!(first, second);
    }

    #[test]
    fn test_position_zero_alternates_zero_one() {
        // sin(0) = 0 and cos(0) = 1, so row 0 is [0, 1, 0, 1, ...]
        let table = sinusoidal_table(4, 6);
        assert_eq!(&table[0..6], &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_wavelength_grows_along_depth() {
        let d_model = 64;
        let table = sinusoidal_table(2, d_model);
        let row = &table[d_model..2 * d_model];

        // First pair oscillates fastest: sin(1) ≈ 0.8415
        assert!((row[0] - 1.0_f32.sin()).abs() < 1e-6);
        // Last pair barely moves at position 1: tiny sin, cos ≈ 1
        assert!(row[d_model - 2].abs() < 0.01);
        assert!(row[d_model - 1] > 0.999);
    }

    #[test]
    fn test_values_stay_bounded() {
        for value in sinusoidal_table(50, 32) {
            assert!((-1.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_odd_d_model_supported() {
        let table = sinusoidal_table(3, 5);
        assert_eq!(table.len(), 15);
        // Final column of an odd-width table is a sin column
        assert_eq!(table[4], 0.0);
    }

    #[test]
    fn test_forward_adds_table_rows_to_every_batch() {
        let device = NdArrayDevice::default();
        let module = PositionalEncodingConfig::new(8)
            .with_max_seq_len(10)
            .init::<TestBackend>(&device);

        // Adding to zeros exposes the raw table values
        let zeros = Tensor::<TestBackend, 3>::zeros([2, 4, 8], &device);
        let output = module.forward(zeros);
        assert_eq!(output.dims(), [2, 4, 8]);

        let values = output.into_data().to_vec::<f32>().unwrap();
        let expected = sinusoidal_table(10, 8);
        for batch in 0..2 {
            for i in 0..4 * 8 {
                assert_eq!(values[batch * 4 * 8 + i], expected[i]);
            }
        }
    }

    #[test]
    #[should_panic(expected = "exceeds the positional table")]
    fn test_forward_rejects_overlength_sequences() {
        let device = NdArrayDevice::default();
        let module = PositionalEncodingConfig::new(4)
            .with_max_seq_len(3)
            .init::<TestBackend>(&device);
        let too_long = Tensor::<TestBackend, 3>::zeros([1, 4, 4], &device);
        module.forward(too_long);
    }
}
