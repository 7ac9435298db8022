// ============================================================
// Scaled Dot-Product & Multi-Head Attention
// ============================================================
// Attention answers one question per query token: "which value
// rows matter to me, and by how much?"
//
//   Attention(Q, K, V) = softmax(Q·K^T / sqrt(d_k)) · V
//
// Each score is the dot product of a query row with a key row.
// Dividing by sqrt(d_k) keeps the scores in a range where the
// softmax still has usable gradients: without it, wide heads
// push the softmax into near one-hot saturation.
//
// Masking happens before the softmax. A masked score is set to
// -inf, which the softmax turns into a weight of exactly zero,
// so forbidden positions contribute nothing to the output.
//
// Multi-head attention runs n_heads of these in parallel, each
// on its own d_k = d_model / n_heads slice of the projected
// vectors. No per-head modules exist: the head dimension is
// carved out with a reshape, and one batched matmul serves all
// batch × head pairs at once.
//
// Reference: Vaswani et al. 2017, §3.2.1–3.2.2

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::softmax,
};

use crate::model::config::ConfigError;

/// Both things a caller may want from an attention pass: the mixed
/// values and the distribution that produced them.
pub struct AttentionOutput<B: Backend, const D: usize> {
    /// Weighted combination of the value rows, one per query
    pub context: Tensor<B, D>,
    /// The attention distribution itself: rows sum to one
    pub weights: Tensor<B, D>,
}

/// Core attention on the last two dimensions; any leading dimensions
/// (batch, heads) ride along through the batched matmuls.
///
/// query: [.., q_len, d_k], key/value: [.., k_len, d_k]
/// mask:  true marks pairs the query must NOT attend to, broadcastable
///        to [.., q_len, k_len]
///
/// A query whose keys are all masked has no distribution left to form
/// and comes out NaN. Callers must keep at least one key visible per
/// query; the standard causal and padding masks both do.
pub fn scaled_dot_product_attention<B: Backend, const D: usize>(
    query:   Tensor<B, D>,
    key:     Tensor<B, D>,
    value:   Tensor<B, D>,
    mask:    Option<Tensor<B, D, Bool>>,
    dropout: Option<&Dropout>,
) -> AttentionOutput<B, D> {
    let d_k = key.dims()[D - 1];

    // scores[i][j] = <query i, key j> / sqrt(d_k)
    let mut scores = query.matmul(key.swap_dims(D - 2, D - 1)) / (d_k as f64).sqrt();

    // -inf scores survive the softmax as exact zeros
    if let Some(mask) = mask {
        let mask = mask.expand(scores.dims());
        scores = scores.mask_fill(mask, f64::NEG_INFINITY);
    }

    // Normalise over the key axis: each query row becomes a distribution
    let weights = softmax(scores, D - 1);
    let weights = match dropout {
        Some(dropout) => dropout.forward(weights),
        None => weights,
    };

    let context = weights.clone().matmul(value);
    AttentionOutput { context, weights }
}

#[derive(Config, Debug)]
pub struct MultiHeadAttentionConfig {
    pub d_model: usize,

    /// Number of parallel heads; must divide d_model exactly
    pub n_heads: usize,

    /// Dropout applied to the attention weights during training
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl MultiHeadAttentionConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<MultiHeadAttention<B>, ConfigError> {
        if self.d_model % self.n_heads != 0 {
            return Err(ConfigError::HeadsDontDivide {
                d_model: self.d_model,
                n_heads: self.n_heads,
            });
        }
        Ok(MultiHeadAttention {
            query:   LinearConfig::new(self.d_model, self.d_model).init(device),
            key:     LinearConfig::new(self.d_model, self.d_model).init(device),
            value:   LinearConfig::new(self.d_model, self.d_model).init(device),
            output:  LinearConfig::new(self.d_model, self.d_model).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            n_heads: self.n_heads,
            d_k:     self.d_model / self.n_heads,
        })
    }
}

#[derive(Module, Debug)]
pub struct MultiHeadAttention<B: Backend> {
    pub query:   Linear<B>,
    pub key:     Linear<B>,
    pub value:   Linear<B>,
    pub output:  Linear<B>,
    pub dropout: Dropout,
    pub n_heads: usize,
    pub d_k:     usize,
}

pub struct MhaOutput<B: Backend> {
    /// [batch, q_len, d_model]: per-query mix of value vectors
    pub context: Tensor<B, 3>,
    /// [batch, n_heads, q_len, k_len]: one distribution per head and query
    pub weights: Tensor<B, 4>,
}

impl<B: Backend> MultiHeadAttention<B> {
    /// query: [batch, q_len, d_model], key/value: [batch, k_len, d_model].
    /// Self-attention passes the same tensor three times; cross-attention
    /// sends decoder state as query and encoder memory as key and value.
    pub fn forward(
        &self,
        query: Tensor<B, 3>,
        key:   Tensor<B, 3>,
        value: Tensor<B, 3>,
        mask:  Option<Tensor<B, 4, Bool>>,
    ) -> MhaOutput<B> {
        let [batch_size, q_len, _] = query.dims();

        // Project, then carve d_model into n_heads slices of d_k
        let query = self.split_heads(self.query.forward(query));
        let key   = self.split_heads(self.key.forward(key));
        let value = self.split_heads(self.value.forward(value));

        let attended = scaled_dot_product_attention(query, key, value, mask, Some(&self.dropout));

        // Undo the split: [batch, heads, q_len, d_k] → [batch, q_len, d_model]
        let context = attended
            .context
            .swap_dims(1, 2)
            .reshape([batch_size, q_len, self.n_heads * self.d_k]);

        MhaOutput {
            context: self.output.forward(context),
            weights: attended.weights,
        }
    }

    /// [batch, seq_len, d_model] → [batch, n_heads, seq_len, d_k]
    fn split_heads(&self, projected: Tensor<B, 3>) -> Tensor<B, 4> {
        let [batch_size, seq_len, _] = projected.dims();
        projected
            .reshape([batch_size, seq_len, self.n_heads, self.d_k])
            .swap_dims(1, 2)
    }
}
