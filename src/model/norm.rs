// ============================================================
// Residual Connection + Layer Normalisation
// ============================================================
// Every sub-layer (attention or feed-forward) is wrapped the
// same way, post-norm as in the original paper:
//
//   output = LayerNorm(x + Dropout(sublayer(x)))
//
// The residual path gives gradients a direct route through all
// N layers; the normalisation re-centres each position's vector
// to mean 0 and variance 1 (then applies a learned gamma/beta),
// which keeps activations at a stable scale as depth grows.
// Dropout hits the sub-layer output before it joins the residual
// stream, and is a no-op outside training.
//
// Reference: Vaswani et al. 2017, §5.4 (Regularization)

use burn::{
    nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig},
    prelude::*,
};

#[derive(Config, Debug)]
pub struct ResidualNormConfig {
    pub d_model: usize,

    #[config(default = 0.1)]
    pub dropout: f64,
}

impl ResidualNormConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResidualNorm<B> {
        ResidualNorm {
            norm:    LayerNormConfig::new(self.d_model).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct ResidualNorm<B: Backend> {
    pub norm:    LayerNorm<B>,
    pub dropout: Dropout,
}

impl<B: Backend> ResidualNorm<B> {
    /// input is the sub-layer's own input (the residual stream);
    /// sublayer_output is what the sub-layer computed from it.
    pub fn forward(&self, input: Tensor<B, 3>, sublayer_output: Tensor<B, 3>) -> Tensor<B, 3> {
        self.norm.forward(input + self.dropout.forward(sublayer_output))
    }
}
