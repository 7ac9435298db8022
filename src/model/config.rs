// ============================================================
// Model Configuration
// ============================================================
// Every architecture hyper-parameter lives here, together with
// the validation rules that make a configuration buildable.
//
// The one rule everything downstream relies on:
//   d_model must be divisible by n_heads
// because multi-head attention splits each d_model-wide vector
// into n_heads chunks of d_k = d_model / n_heads values. A bad
// combination is rejected here, at construction time, instead
// of surfacing as a reshape panic halfway through a forward pass.
//
// Defaults follow the base model of Vaswani et al. 2017, scaled
// down to d_ff = 1024 so the demo binary stays quick on a CPU.
//
// Reference: Vaswani et al. 2017, Table 3 (base model row)

use burn::prelude::*;
use serde::Serialize;
use thiserror::Error;

/// Ways a configuration can be unbuildable. Returned at construction
/// time, before any weight is allocated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("d_model ({d_model}) must be divisible by n_heads ({n_heads})")]
    HeadsDontDivide { d_model: usize, n_heads: usize },

    #[error("{name} must be greater than zero")]
    ZeroDimension { name: &'static str },

    #[error("dropout must lie in [0, 1), got {dropout}")]
    InvalidDropout { dropout: f64 },
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct TransformerConfig {
    /// Number of distinct token ids on the source side
    pub src_vocab_size: usize,

    /// Number of distinct token ids on the target side
    pub tgt_vocab_size: usize,

    /// Width of every token representation (d_model in the paper)
    #[config(default = 256)]
    pub d_model: usize,

    /// Attention heads per layer; must divide d_model exactly
    #[config(default = 8)]
    pub n_heads: usize,

    /// Number of stacked layers in the encoder and in the decoder
    #[config(default = 6)]
    pub n_layers: usize,

    /// Hidden width of the position-wise feed-forward network
    /// Typically 4x d_model
    #[config(default = 1024)]
    pub d_ff: usize,

    /// Dropout probability applied during training
    #[config(default = 0.1)]
    pub dropout: f64,

    /// Longest sequence the positional encoding table covers
    #[config(default = 100)]
    pub max_seq_len: usize,

    /// Source token id treated as padding, if any.
    /// When set, source attention ignores these positions.
    pub pad_token: Option<usize>,

    /// Reuse the target embedding matrix as the output projection
    /// instead of learning a separate d_model x vocab matrix
    #[config(default = false)]
    pub tie_output_embedding: bool,
}

impl TransformerConfig {
    /// Check the invariants that `init` relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("src_vocab_size", self.src_vocab_size),
            ("tgt_vocab_size", self.tgt_vocab_size),
            ("d_model", self.d_model),
            ("n_heads", self.n_heads),
            ("n_layers", self.n_layers),
            ("d_ff", self.d_ff),
            ("max_seq_len", self.max_seq_len),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDimension { name });
            }
        }

        if self.d_model % self.n_heads != 0 {
            return Err(ConfigError::HeadsDontDivide {
                d_model: self.d_model,
                n_heads: self.n_heads,
            });
        }

        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ConfigError::InvalidDropout { dropout: self.dropout });
        }

        Ok(())
    }

    /// Total number of learned parameters this configuration produces.
    ///
    /// The sinusoidal positional table is excluded: it is computed,
    /// not learned.
    pub fn param_count(&self) -> usize {
        self.encoder_params() + self.decoder_params() + self.projection_params()
    }

    /// Embedding plus n_layers of (self-attention, feed-forward, two norms)
    pub fn encoder_params(&self) -> usize {
        let embedding = self.src_vocab_size * self.d_model;
        let per_layer = self.attention_params()
            + self.feed_forward_params()
            + 2 * self.layer_norm_params();
        embedding + self.n_layers * per_layer
    }

    /// Embedding plus n_layers of (self-attention, cross-attention,
    /// feed-forward, three norms)
    pub fn decoder_params(&self) -> usize {
        let embedding = self.tgt_vocab_size * self.d_model;
        let per_layer = 2 * self.attention_params()
            + self.feed_forward_params()
            + 3 * self.layer_norm_params();
        embedding + self.n_layers * per_layer
    }

    /// Final projection to vocabulary logits: zero when the target
    /// embedding is reused (weight tying)
    pub fn projection_params(&self) -> usize {
        if self.tie_output_embedding {
            0
        } else {
            self.d_model * self.tgt_vocab_size + self.tgt_vocab_size
        }
    }

    // Four projections (Q, K, V, output), each d_model x d_model plus bias
    fn attention_params(&self) -> usize {
        4 * (self.d_model * self.d_model + self.d_model)
    }

    // Two linear maps: d_model → d_ff → d_model, each with bias
    fn feed_forward_params(&self) -> usize {
        self.d_model * self.d_ff + self.d_ff + self.d_ff * self.d_model + self.d_model
    }

    // LayerNorm learns a gamma and a beta per feature
    fn layer_norm_params(&self) -> usize {
        2 * self.d_model
    }

    /// Validate, then describe the architecture this configuration builds.
    pub fn summary(&self) -> Result<ModelSummary, ConfigError> {
        self.validate()?;
        Ok(ModelSummary {
            d_model:           self.d_model,
            n_heads:           self.n_heads,
            d_k:               self.d_model / self.n_heads,
            n_layers:          self.n_layers,
            d_ff:              self.d_ff,
            src_vocab_size:    self.src_vocab_size,
            tgt_vocab_size:    self.tgt_vocab_size,
            max_seq_len:       self.max_seq_len,
            dropout:           self.dropout,
            pad_token:         self.pad_token,
            tied_projection:   self.tie_output_embedding,
            encoder_params:    self.encoder_params(),
            decoder_params:    self.decoder_params(),
            projection_params: self.projection_params(),
            total_params:      self.param_count(),
        })
    }
}

/// Flat description of a validated configuration, used by the
/// `info` command (and serialisable for `info --json`).
#[derive(Debug, Serialize)]
pub struct ModelSummary {
    pub d_model:           usize,
    pub n_heads:           usize,
    pub d_k:               usize,
    pub n_layers:          usize,
    pub d_ff:              usize,
    pub src_vocab_size:    usize,
    pub tgt_vocab_size:    usize,
    pub max_seq_len:       usize,
    pub dropout:           f64,
    pub pad_token:         Option<usize>,
    pub tied_projection:   bool,
    pub encoder_params:    usize,
    pub decoder_params:    usize,
    pub projection_params: usize,
    pub total_params:      usize,
}
