// ============================================================
// CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All tensor work is delegated to the model layer.
//
// Two commands are supported:
//   1. `forward` — builds a randomly initialised model and runs
//                  one forward pass on demo token sequences
//   2. `info`    — prints the architecture summary for a
//                  configuration without building it
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::{ensure, Result};
use burn::prelude::*;
use clap::Parser;

use commands::{parse_token_list, validate_tokens, Commands, ForwardArgs, InfoArgs};
use crate::model::{Transformer, TransformerConfig};

// The demo runs on the plain CPU backend; nothing here needs autodiff
type DemoBackend = burn::backend::NdArray;

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "transformer-from-scratch",
    version = "0.1.0",
    about = "From-scratch transformer encoder-decoder (Vaswani et al. 2017), built on Burn."
)]
pub struct Cli {
    /// The subcommand to run (forward or info)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the right handler.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Forward(args) => Self::run_forward(args),
            Commands::Info(args)    => Self::run_info(args),
        }
    }

    /// Handles the `forward` subcommand: parse tokens, build the model,
    /// run one pass, print the logits and the per-position argmax.
    fn run_forward(args: ForwardArgs) -> Result<()> {
        let device = burn::backend::ndarray::NdArrayDevice::default();

        let src_tokens = parse_token_list(&args.src)?;
        let tgt_tokens = parse_token_list(&args.tgt)?;
        validate_tokens(&src_tokens, args.model.src_vocab_size, "source")?;
        validate_tokens(&tgt_tokens, args.model.tgt_vocab_size, "target")?;
        ensure!(
            src_tokens.len().max(tgt_tokens.len()) <= args.model.max_seq_len,
            "sequences may not exceed --max-seq-len ({})",
            args.model.max_seq_len
        );

        // Reseed before init so the same seed always gives the same weights
        DemoBackend::seed(args.seed);
        let config: TransformerConfig = (&args.model).into();
        let model: Transformer<DemoBackend> = config.init(&device)?;
        tracing::info!(
            "initialised transformer: {} parameters, seed {}",
            config.param_count(),
            args.seed,
        );

        let src = Tensor::<DemoBackend, 1, Int>::from_ints(src_tokens.as_slice(), &device)
            .unsqueeze::<2>();
        let tgt = Tensor::<DemoBackend, 1, Int>::from_ints(tgt_tokens.as_slice(), &device)
            .unsqueeze::<2>();

        let logits = model.forward(src, tgt);
        let [_, tgt_len, vocab_size] = logits.dims();
        println!("Logits shape: [1, {tgt_len}, {vocab_size}]");

        // Greedy readout: the most likely next token at each position.
        // The weights are random, so this is pattern, not meaning.
        let predictions: Vec<i64> = logits
            .argmax(2)
            .reshape([tgt_len])
            .into_data()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("failed to read predictions: {e:?}"))?;

        println!("\nArgmax over the target vocabulary:");
        for (position, token) in predictions.iter().enumerate() {
            println!("  position {position}: token {token}");
        }
        Ok(())
    }

    /// Handles the `info` subcommand.
    /// Validates the configuration and prints what it would build.
    fn run_info(args: InfoArgs) -> Result<()> {
        let config: TransformerConfig = (&args.model).into();
        let summary = config.summary()?;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        println!("Transformer architecture");
        println!("  d_model:          {}", summary.d_model);
        println!("  n_heads:          {} (d_k = {})", summary.n_heads, summary.d_k);
        println!("  n_layers:         {}", summary.n_layers);
        println!("  d_ff:             {}", summary.d_ff);
        println!("  src_vocab_size:   {}", summary.src_vocab_size);
        println!("  tgt_vocab_size:   {}", summary.tgt_vocab_size);
        println!("  max_seq_len:      {}", summary.max_seq_len);
        println!("  dropout:          {}", summary.dropout);
        match summary.pad_token {
            Some(pad) => println!("  pad_token:        {pad}"),
            None      => println!("  pad_token:        none"),
        }
        println!("  tied projection:  {}", summary.tied_projection);
        println!();
        println!("Parameters");
        println!("  encoder:     {:>12}", summary.encoder_params);
        println!("  decoder:     {:>12}", summary.decoder_params);
        println!("  projection:  {:>12}", summary.projection_params);
        println!("  total:       {:>12}", summary.total_params);
        Ok(())
    }
}
