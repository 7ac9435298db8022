// ============================================================
// Decoder
// ============================================================
// The decoder consumes the target sequence so far plus the
// encoder's memory, and produces one d_model vector per target
// position. Each layer runs three sub-layers:
//
//   1. causal self-attention: target attends to earlier targets
//   2. cross-attention: queries from the decoder, keys and values
//      from the encoder memory
//   3. position-wise feed-forward
//
// The causal mask is what makes training honest: during teacher
// forcing the whole target is fed in at once, and the mask is the
// only thing stopping position i from copying token i+1 out of
// its own input.
//
// Reference: Vaswani et al. 2017, §3.1 (Decoder)

use burn::{
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::model::attention::{MultiHeadAttention, MultiHeadAttentionConfig};
use crate::model::config::ConfigError;
use crate::model::encoding::{PositionalEncoding, PositionalEncodingConfig};
use crate::model::feed_forward::{PositionwiseFeedForward, PositionwiseFeedForwardConfig};
use crate::model::norm::{ResidualNorm, ResidualNormConfig};

#[derive(Config, Debug)]
pub struct DecoderConfig {
    pub vocab_size: usize,
    pub d_model:    usize,
    pub n_heads:    usize,
    pub n_layers:   usize,
    pub d_ff:       usize,

    #[config(default = 0.1)]
    pub dropout: f64,

    #[config(default = 100)]
    pub max_seq_len: usize,
}

impl DecoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Decoder<B>, ConfigError> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let positional = PositionalEncodingConfig::new(self.d_model)
            .with_max_seq_len(self.max_seq_len)
            .init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        let layers = (0..self.n_layers)
            .map(|_| self.build_layer(device))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Decoder { embedding, positional, dropout, layers })
    }

    fn build_layer<B: Backend>(&self, device: &B::Device) -> Result<DecoderLayer<B>, ConfigError> {
        let attention = MultiHeadAttentionConfig::new(self.d_model, self.n_heads)
            .with_dropout(self.dropout);
        let wrapper = ResidualNormConfig::new(self.d_model).with_dropout(self.dropout);

        Ok(DecoderLayer {
            self_attn:         attention.init(device)?,
            self_attn_norm:    wrapper.init(device),
            cross_attn:        attention.init(device)?,
            cross_attn_norm:   wrapper.init(device),
            feed_forward:      PositionwiseFeedForwardConfig::new(self.d_model, self.d_ff)
                .init(device),
            feed_forward_norm: wrapper.init(device),
        })
    }
}

#[derive(Module, Debug)]
pub struct DecoderLayer<B: Backend> {
    pub self_attn:         MultiHeadAttention<B>,
    pub self_attn_norm:    ResidualNorm<B>,
    pub cross_attn:        MultiHeadAttention<B>,
    pub cross_attn_norm:   ResidualNorm<B>,
    pub feed_forward:      PositionwiseFeedForward<B>,
    pub feed_forward_norm: ResidualNorm<B>,
}

impl<B: Backend> DecoderLayer<B> {
    /// hidden: [batch, tgt_len, d_model], memory: [batch, src_len, d_model]
    /// → [batch, tgt_len, d_model]
    pub fn forward(
        &self,
        hidden:      Tensor<B, 3>,
        memory:      Tensor<B, 3>,
        tgt_mask:    Option<Tensor<B, 4, Bool>>,
        memory_mask: Option<Tensor<B, 4, Bool>>,
    ) -> Tensor<B, 3> {
        let attended = self
            .self_attn
            .forward(hidden.clone(), hidden.clone(), hidden.clone(), tgt_mask)
            .context;
        let hidden = self.self_attn_norm.forward(hidden, attended);

        // Queries come from the decoder, keys and values from the encoder
        let attended = self
            .cross_attn
            .forward(hidden.clone(), memory.clone(), memory, memory_mask)
            .context;
        let hidden = self.cross_attn_norm.forward(hidden, attended);

        let expanded = self.feed_forward.forward(hidden.clone());
        self.feed_forward_norm.forward(hidden, expanded)
    }
}

#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub embedding:  Embedding<B>,
    pub positional: PositionalEncoding<B>,
    pub dropout:    Dropout,
    pub layers:     Vec<DecoderLayer<B>>,
}

impl<B: Backend> Decoder<B> {
    /// tokens: [batch, tgt_len], memory: [batch, src_len, d_model]
    /// → [batch, tgt_len, d_model].
    /// tgt_mask guards the self-attention (causality); memory_mask guards
    /// cross-attention (source padding).
    pub fn forward(
        &self,
        tokens:      Tensor<B, 2, Int>,
        memory:      Tensor<B, 3>,
        tgt_mask:    Option<Tensor<B, 4, Bool>>,
        memory_mask: Option<Tensor<B, 4, Bool>>,
    ) -> Tensor<B, 3> {
        let embedded = self.embedding.forward(tokens);
        let mut hidden = self.dropout.forward(self.positional.forward(embedded));
        for layer in &self.layers {
            hidden = layer.forward(hidden, memory.clone(), tgt_mask.clone(), memory_mask.clone());
        }
        hidden
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mask::causal_mask;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_output_shape_tracks_target_length() {
        let device = NdArrayDevice::default();
        let decoder: Decoder<TestBackend> =
            DecoderConfig::new(20, 8, 2, 2, 16).init(&device).unwrap();

        let tokens = Tensor::<TestBackend, 2, Int>::from_ints([[1, 7, 4]], &device);
        let memory = Tensor::<TestBackend, 3>::random([1, 5, 8], Distribution::Default, &device);
        let mask = causal_mask::<TestBackend>(3, &device);

        let hidden = decoder.forward(tokens, memory, Some(mask), None);
        assert_eq!(hidden.dims(), [1, 3, 8]);
    }

    #[test]
    fn test_masks_are_optional() {
        let device = NdArrayDevice::default();
        let decoder: Decoder<TestBackend> =
            DecoderConfig::new(20, 8, 2, 1, 16).init(&device).unwrap();

        let tokens = Tensor::<TestBackend, 2, Int>::from_ints([[1, 7, 4, 2]], &device);
        let memory = Tensor::<TestBackend, 3>::random([1, 6, 8], Distribution::Default, &device);

        let hidden = decoder.forward(tokens, memory, None, None);
        assert_eq!(hidden.dims(), [1, 4, 8]);
    }

    #[test]
    fn test_invalid_head_split_propagates() {
        let device = NdArrayDevice::default();
        let result: Result<Decoder<TestBackend>, _> =
            DecoderConfig::new(20, 10, 3, 1, 16).init(&device);
        assert!(result.is_err());
    }
}
