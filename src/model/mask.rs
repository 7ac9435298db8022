// ============================================================
// Attention Masks
// ============================================================
// Masks are Bool tensors where true marks a (query, key) pair
// the attention is NOT allowed to use. They are built once per
// forward pass and broadcast inside scaled dot-product attention
// to the full [batch, heads, q_len, k_len] score shape.
//
// Two kinds are needed:
//   - causal:  position i may only see positions j <= i, so the
//              decoder cannot read the tokens it is about to predict
//   - padding: filler tokens that only exist to square off a batch
//              should never receive attention weight
//
// Reference: Vaswani et al. 2017, §3.2.3 (masked attention)

use burn::prelude::*;

/// Strictly upper-triangular mask: entry (i, j) is true when key
/// position j lies in the future of query position i.
///
/// Shape [1, 1, seq_len, seq_len], broadcastable over batch and heads.
pub fn causal_mask<B: Backend>(seq_len: usize, device: &B::Device) -> Tensor<B, 4, Bool> {
    let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, device);
    let queries = positions.clone().reshape([seq_len, 1]).expand([seq_len, seq_len]);
    let keys    = positions.reshape([1, seq_len]).expand([seq_len, seq_len]);
    keys.greater(queries).reshape([1, 1, seq_len, seq_len])
}

/// Marks every position whose token id equals `pad_token`.
///
/// Shape [batch, 1, 1, seq_len]: padding is forbidden as a key for
/// every query, in every head, but padded queries still run (their
/// outputs are simply never read).
pub fn padding_mask<B: Backend>(tokens: Tensor<B, 2, Int>, pad_token: usize) -> Tensor<B, 4, Bool> {
    let [batch_size, seq_len] = tokens.dims();
    tokens
        .equal_elem(pad_token as i64)
        .reshape([batch_size, 1, 1, seq_len])
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArrayDevice;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_causal_mask_pattern() {
        let device = NdArrayDevice::default();
        let mask = causal_mask::<TestBackend>(4, &device);
        assert_eq!(mask.dims(), [1, 1, 4, 4]);

        let values = mask.into_data().to_vec::<bool>().unwrap();
        let mut expected = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                expected.push(j > i);
            }
        }
        assert_eq!(values, expected);
    }

    #[test]
    fn test_causal_mask_lets_each_position_see_itself() {
        let device = NdArrayDevice::default();
        let mask = causal_mask::<TestBackend>(3, &device);
        let values = mask.into_data().to_vec::<bool>().unwrap();
        for i in 0..3 {
            assert!(!values[i * 3 + i], "position {i} was masked from itself");
        }
    }

    #[test]
    fn test_padding_mask_marks_pad_positions() {
        let device = NdArrayDevice::default();
        let tokens = Tensor::<TestBackend, 2, Int>::from_ints(
            [[1, 5, 0, 0], [2, 0, 3, 0]],
            &device,
        );

        let mask = padding_mask(tokens, 0);
        assert_eq!(mask.dims(), [2, 1, 1, 4]);

        let values = mask.into_data().to_vec::<bool>().unwrap();
        assert_eq!(
            values,
            vec![false, false, true, true, false, true, false, true]
        );
    }

    #[test]
    fn test_padding_mask_respects_custom_pad_id() {
        let device = NdArrayDevice::default();
        let tokens = Tensor::<TestBackend, 2, Int>::from_ints([[9, 1, 9]], &device);
        let values = padding_mask(tokens, 9).into_data().to_vec::<bool>().unwrap();
        assert_eq!(values, vec![true, false, true]);
    }
}
