// ============================================================
// Position-wise Feed-Forward Network
// ============================================================
// The second sub-layer of every encoder and decoder layer:
//
//   FFN(x) = max(0, x·W1 + b1)·W2 + b2
//
// "Position-wise" means the same two linear maps are applied to
// every position independently. Attention is where positions
// exchange information; this block only transforms each vector
// in place, widening it to d_ff, clipping at zero, and squeezing
// it back to d_model.
//
// Reference: Vaswani et al. 2017, §3.3

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

#[derive(Config, Debug)]
pub struct PositionwiseFeedForwardConfig {
    pub d_model: usize,
    pub d_ff:    usize,
}

impl PositionwiseFeedForwardConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PositionwiseFeedForward<B> {
        PositionwiseFeedForward {
            linear1: LinearConfig::new(self.d_model, self.d_ff).init(device),
            linear2: LinearConfig::new(self.d_ff, self.d_model).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct PositionwiseFeedForward<B: Backend> {
    pub linear1: Linear<B>,
    pub linear2: Linear<B>,
}

impl<B: Backend> PositionwiseFeedForward<B> {
    /// x: [batch, seq_len, d_model] → same shape
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.linear2.forward(relu(self.linear1.forward(x)))
    }
}
