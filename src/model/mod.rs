// ============================================================
// Model Layer (Burn)
// ============================================================
// Everything that defines the transformer lives in this module.
// Each file is one box from Figure 1 of the paper, built from
// scratch on Burn's tensor and nn primitives; the only nn pieces
// taken off the shelf are Linear, Embedding, LayerNorm and
// Dropout. Attention itself, the masks, the positional table and
// the layer wiring are all implemented here.
//
// Bottom-up map of this module:
//
//   config.rs       — hyper-parameters, validation, parameter counts
//   encoding.rs     — fixed sinusoidal positional encoding
//   attention.rs    — scaled dot-product + multi-head attention
//   feed_forward.rs — position-wise feed-forward network
//   norm.rs         — residual + dropout + LayerNorm wrapper
//   mask.rs         — causal and padding mask builders
//   encoder.rs      — embedding + N encoder layers
//   decoder.rs      — embedding + N decoder layers (cross-attention)
//   transformer.rs  — the assembled encoder-decoder with projection
//
// Reference: Vaswani et al. (2017) Attention Is All You Need
//            Burn Book §3 (Building Blocks)

/// Scaled dot-product and multi-head attention
pub mod attention;

/// Hyper-parameters, validation and the architecture summary
pub mod config;

/// Decoder stack: causal self-attention plus cross-attention
pub mod decoder;

/// Encoder stack: embedding, positions, self-attention layers
pub mod encoder;

/// Fixed sinusoidal positional encoding
pub mod encoding;

/// Position-wise feed-forward network
pub mod feed_forward;

/// Causal and padding mask builders
pub mod mask;

/// Post-norm residual wrapper around every sub-layer
pub mod norm;

/// The assembled encoder-decoder model
pub mod transformer;

pub use config::{ConfigError, ModelSummary, TransformerConfig};
pub use transformer::Transformer;
