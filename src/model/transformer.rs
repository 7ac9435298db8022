// ============================================================
// Transformer
// ============================================================
// The full encoder-decoder model:
//
//   src tokens ─→ Encoder ──────────────┐ (memory)
//                                       ▼
//   tgt tokens ─→ Decoder (causal + cross-attention)
//                                       ▼
//                 projection → logits over the target vocabulary
//
// `forward` builds the standard masks itself: a causal mask for
// the target and, when a pad token is configured, a padding mask
// for the source. `forward_masked` accepts caller-built masks
// instead, and `encode`/`decode` expose the two halves separately
// for step-by-step generation.
//
// The output projection is optional: with weight tying enabled,
// the target embedding matrix is reused (transposed) to produce
// the logits, as in Press & Wolf 2017.
//
// Reference: Vaswani et al. 2017, Figure 1

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
};

use crate::model::config::{ConfigError, TransformerConfig};
use crate::model::decoder::{Decoder, DecoderConfig};
use crate::model::encoder::{Encoder, EncoderConfig};
use crate::model::mask::{causal_mask, padding_mask};

impl TransformerConfig {
    /// Build the full model on `device`; fails if the configuration
    /// is invalid.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Transformer<B>, ConfigError> {
        self.validate()?;

        let encoder = EncoderConfig::new(
            self.src_vocab_size,
            self.d_model,
            self.n_heads,
            self.n_layers,
            self.d_ff,
        )
        .with_dropout(self.dropout)
        .with_max_seq_len(self.max_seq_len)
        .init(device)?;

        let decoder = DecoderConfig::new(
            self.tgt_vocab_size,
            self.d_model,
            self.n_heads,
            self.n_layers,
            self.d_ff,
        )
        .with_dropout(self.dropout)
        .with_max_seq_len(self.max_seq_len)
        .init(device)?;

        // None means tied: project through the target embedding instead
        let output = if self.tie_output_embedding {
            None
        } else {
            Some(LinearConfig::new(self.d_model, self.tgt_vocab_size).init(device))
        };

        tracing::debug!(
            "built transformer: {} layers, {} heads, {} parameters",
            self.n_layers,
            self.n_heads,
            self.param_count(),
        );

        Ok(Transformer {
            encoder,
            decoder,
            output,
            pad_token: self.pad_token,
        })
    }
}

#[derive(Module, Debug)]
pub struct Transformer<B: Backend> {
    pub encoder:   Encoder<B>,
    pub decoder:   Decoder<B>,
    pub output:    Option<Linear<B>>,
    pub pad_token: Option<usize>,
}

impl<B: Backend> Transformer<B> {
    /// src: [batch, src_len], tgt: [batch, tgt_len]
    /// → logits: [batch, tgt_len, tgt_vocab_size]
    ///
    /// The target always gets a causal mask; the source gets a padding
    /// mask when `pad_token` is configured.
    pub fn forward(&self, src: Tensor<B, 2, Int>, tgt: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [_, tgt_len] = tgt.dims();
        let src_mask = self.pad_token.map(|pad| padding_mask(src.clone(), pad));
        let tgt_mask = causal_mask::<B>(tgt_len, &tgt.device());
        self.forward_masked(src, tgt, src_mask, Some(tgt_mask))
    }

    /// Like `forward`, but with caller-supplied masks. The source mask
    /// guards both encoder self-attention and decoder cross-attention.
    pub fn forward_masked(
        &self,
        src:      Tensor<B, 2, Int>,
        tgt:      Tensor<B, 2, Int>,
        src_mask: Option<Tensor<B, 4, Bool>>,
        tgt_mask: Option<Tensor<B, 4, Bool>>,
    ) -> Tensor<B, 3> {
        let memory = self.encode(src, src_mask.clone());
        let hidden = self.decode(tgt, memory, tgt_mask, src_mask);
        self.project(hidden)
    }

    /// Encoder half only: src tokens → memory. Useful for generation,
    /// where the source is encoded once and decoded against many times.
    pub fn encode(
        &self,
        src:      Tensor<B, 2, Int>,
        src_mask: Option<Tensor<B, 4, Bool>>,
    ) -> Tensor<B, 3> {
        self.encoder.forward(src, src_mask)
    }

    /// Decoder half only: tgt tokens + memory → hidden states
    /// (before projection).
    pub fn decode(
        &self,
        tgt:         Tensor<B, 2, Int>,
        memory:      Tensor<B, 3>,
        tgt_mask:    Option<Tensor<B, 4, Bool>>,
        memory_mask: Option<Tensor<B, 4, Bool>>,
    ) -> Tensor<B, 3> {
        self.decoder.forward(tgt, memory, tgt_mask, memory_mask)
    }

    /// hidden: [batch, tgt_len, d_model] → logits: [batch, tgt_len, vocab]
    pub fn project(&self, hidden: Tensor<B, 3>) -> Tensor<B, 3> {
        match &self.output {
            Some(output) => output.forward(hidden),
            None => {
                // Weight tying: score each position against every row of
                // the target embedding matrix
                let weight = self.decoder.embedding.weight.val(); // [vocab, d_model]
                let [batch_size, seq_len, d_model] = hidden.dims();
                let [vocab_size, _] = weight.dims();
                hidden
                    .reshape([batch_size * seq_len, d_model])
                    .matmul(weight.transpose())
                    .reshape([batch_size, seq_len, vocab_size])
            }
        }
    }
}
