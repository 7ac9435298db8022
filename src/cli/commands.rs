// ============================================================
// CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `forward` and `info`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::{ensure, Context, Result};
use clap::{Args, Subcommand};

use crate::model::TransformerConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one forward pass on demo token sequences and print the logits
    Forward(ForwardArgs),

    /// Print the architecture summary and parameter counts
    Info(InfoArgs),
}

/// Architecture flags shared by every subcommand.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Number of distinct token ids on the source side
    #[arg(long, default_value_t = 10)]
    pub src_vocab_size: usize,

    /// Number of distinct token ids on the target side
    #[arg(long, default_value_t = 10)]
    pub tgt_vocab_size: usize,

    /// Hidden dimension of the transformer (d_model in the paper)
    /// Every token is represented as a vector of this size
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// Number of attention heads in multi-head attention
    /// d_model must be divisible by n_heads
    #[arg(long, default_value_t = 8)]
    pub n_heads: usize,

    /// Number of stacked encoder layers and decoder layers
    #[arg(long, default_value_t = 6)]
    pub n_layers: usize,

    /// Inner dimension of the feed-forward network
    /// Typically 4x d_model
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    /// Dropout probability (inert here: the demo never trains)
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Longest sequence the positional encoding table covers
    #[arg(long, default_value_t = 100)]
    pub max_seq_len: usize,

    /// Source token id to treat as padding (omit to disable the
    /// source padding mask)
    #[arg(long)]
    pub pad_token: Option<usize>,

    /// Reuse the target embedding matrix as the output projection
    #[arg(long)]
    pub tie_output_embedding: bool,
}

/// Convert CLI ModelArgs into the model-layer TransformerConfig.
/// The model layer never sees clap types.
impl From<&ModelArgs> for TransformerConfig {
    fn from(a: &ModelArgs) -> Self {
        TransformerConfig::new(a.src_vocab_size, a.tgt_vocab_size)
            .with_d_model(a.d_model)
            .with_n_heads(a.n_heads)
            .with_n_layers(a.n_layers)
            .with_d_ff(a.d_ff)
            .with_dropout(a.dropout)
            .with_max_seq_len(a.max_seq_len)
            .with_pad_token(a.pad_token)
            .with_tie_output_embedding(a.tie_output_embedding)
    }
}

/// All arguments for the `forward` command
#[derive(Args, Debug)]
pub struct ForwardArgs {
    /// Source token ids, comma separated
    #[arg(long, default_value = "1,5,6,4,3,9,5,2,0")]
    pub src: String,

    /// Target token ids fed to the decoder, comma separated
    #[arg(long, default_value = "1,7,4,3,5,9,2")]
    pub tgt: String,

    /// Seed for weight initialisation, so runs are reproducible
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// All arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Emit the summary as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// Parse "1,5,6" into token ids. Whitespace around ids is fine,
/// empty segments (trailing commas) are skipped.
pub fn parse_token_list(raw: &str) -> Result<Vec<i32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i32>()
                .with_context(|| format!("invalid token id '{part}'"))
        })
        .collect()
}

/// Every id must be a valid row of the corresponding embedding table.
pub fn validate_tokens(tokens: &[i32], vocab_size: usize, side: &str) -> Result<()> {
    ensure!(!tokens.is_empty(), "{side} sequence must not be empty");
    for &token in tokens {
        ensure!(
            token >= 0 && (token as usize) < vocab_size,
            "{side} token id {token} is out of range for vocab size {vocab_size}"
        );
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_list() {
        assert_eq!(parse_token_list("1,5,6").unwrap(), vec![1, 5, 6]);
        // Spaces and a trailing comma are tolerated
        assert_eq!(parse_token_list(" 1, 5 ,6, ").unwrap(), vec![1, 5, 6]);
        assert!(parse_token_list("1,x,3").is_err());
    }

    #[test]
    fn test_validate_tokens_checks_vocab_range() {
        assert!(validate_tokens(&[0, 9], 10, "source").is_ok());
        assert!(validate_tokens(&[10], 10, "source").is_err());
        assert!(validate_tokens(&[-1], 10, "source").is_err());
        assert!(validate_tokens(&[], 10, "source").is_err());
    }

    #[test]
    fn test_model_args_map_onto_config() {
        let args = ModelArgs {
            src_vocab_size:       12,
            tgt_vocab_size:       14,
            d_model:              32,
            n_heads:              4,
            n_layers:             2,
            d_ff:                 64,
            dropout:              0.0,
            max_seq_len:          50,
            pad_token:            Some(0),
            tie_output_embedding: true,
        };
        let config: TransformerConfig = (&args).into();
        assert_eq!(config.src_vocab_size, 12);
        assert_eq!(config.tgt_vocab_size, 14);
        assert_eq!(config.d_model, 32);
        assert_eq!(config.pad_token, Some(0));
        assert!(config.tie_output_embedding);
        assert!(config.validate().is_ok());
    }
}
