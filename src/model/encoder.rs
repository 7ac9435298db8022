// ============================================================
// Encoder
// ============================================================
// The encoder turns a batch of source token ids into one context
// vector per token:
//
//   tokens → embedding → +positional encoding → dropout
//          → n_layers × (self-attention, feed-forward)
//
// Every layer keeps the [batch, seq_len, d_model] shape, so layers
// stack by plain iteration. Self-attention here is unmasked except
// for padding: every real token may look at every other.
//
// Reference: Vaswani et al. 2017, §3.1 (Encoder)

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
pub struct EncoderConfig {
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

impl EncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Encoder<B>, ConfigError> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let positional = PositionalEncodingConfig::new(self.d_model)
            .with_max_seq_len(self.max_seq_len)
            .init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        let layers = (0..self.n_layers)
            .map(|_| self.build_layer(device))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Encoder { embedding, positional, dropout, layers })
    }

    fn build_layer<B: Backend>(&self, device: &B::Device) -> Result<EncoderLayer<B>, ConfigError> {
        let self_attn = MultiHeadAttentionConfig::new(self.d_model, self.n_heads)
            .with_dropout(self.dropout)
            .init(device)?;
        let self_attn_norm = ResidualNormConfig::new(self.d_model)
            .with_dropout(self.dropout)
            .init(device);
        let feed_forward = PositionwiseFeedForwardConfig::new(self.d_model, self.d_ff).init(device);
        let feed_forward_norm = ResidualNormConfig::new(self.d_model)
            .with_dropout(self.dropout)
            .init(device);
        Ok(EncoderLayer { self_attn, self_attn_norm, feed_forward, feed_forward_norm })
    }
}

#[derive(Module, Debug)]
pub struct EncoderLayer<B: Backend> {
    pub self_attn:         MultiHeadAttention<B>,
    pub self_attn_norm:    ResidualNorm<B>,
    pub feed_forward:      PositionwiseFeedForward<B>,
    pub feed_forward_norm: ResidualNorm<B>,
}

impl<B: Backend> EncoderLayer<B> {
    /// hidden: [batch, seq_len, d_model] → same shape
    pub fn forward(&self, hidden: Tensor<B, 3>, mask: Option<Tensor<B, 4, Bool>>) -> Tensor<B, 3> {
        let attended = self
            .self_attn
            .forward(hidden.clone(), hidden.clone(), hidden.clone(), mask)
            .context;
        let hidden = self.self_attn_norm.forward(hidden, attended);

        let expanded = self.feed_forward.forward(hidden.clone());
        self.feed_forward_norm.forward(hidden, expanded)
    }
}

#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub embedding:  Embedding<B>,
    pub positional: PositionalEncoding<B>,
    pub dropout:    Dropout,
    pub layers:     Vec<EncoderLayer<B>>,
}

impl<B: Backend> Encoder<B> {
    /// tokens: [batch, src_len] → memory: [batch, src_len, d_model].
    /// The mask, when present, is the source padding mask; it is shared
    /// by every layer.
    pub fn forward(
        &self,
        tokens: Tensor<B, 2, Int>,
        mask:   Option<Tensor<B, 4, Bool>>,
    ) -> Tensor<B, 3> {
        let embedded = self.embedding.forward(tokens);
        let mut hidden = self.dropout.forward(self.positional.forward(embedded));
        for layer in &self.layers {
            hidden = layer.forward(hidden, mask.clone());
        }
        hidden
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mask::padding_mask;
    use burn::backend::ndarray::NdArrayDevice;

    type TestBackend = burn::backend::NdArray;

    fn small_encoder(device: &NdArrayDevice) -> Encoder<TestBackend> {
        EncoderConfig::new(20, 8, 2, 2, 16).init(device).unwrap()
    }

    #[test]
    fn test_memory_shape() {
        let device = NdArrayDevice::default();
        let encoder = small_encoder(&device);
        let tokens = Tensor::<TestBackend, 2, Int>::from_ints(
            [[1, 5, 6, 4, 3], [9, 5, 2, 0, 0]],
            &device,
        );
        assert_eq!(encoder.forward(tokens, None).dims(), [2, 5, 8]);
    }

    #[test]
    fn test_padding_mask_keeps_shape() {
        let device = NdArrayDevice::default();
        let encoder = small_encoder(&device);
        let tokens = Tensor::<TestBackend, 2, Int>::from_ints(
            [[1, 5, 6, 0, 0], [9, 5, 2, 4, 0]],
            &device,
        );
        let mask = padding_mask(tokens.clone(), 0);
        assert_eq!(encoder.forward(tokens, Some(mask)).dims(), [2, 5, 8]);
    }

    #[test]
    fn test_layer_count_follows_config() {
        let device = NdArrayDevice::default();
        let encoder: Encoder<TestBackend> =
            EncoderConfig::new(20, 8, 2, 3, 16).init(&device).unwrap();
        assert_eq!(encoder.layers.len(), 3);
    }

    #[test]
    fn test_invalid_head_split_propagates() {
        let device = NdArrayDevice::default();
        let result: Result<Encoder<TestBackend>, _> =
            EncoderConfig::new(20, 10, 3, 1, 16).init(&device);
        assert!(result.is_err());
    }
}
