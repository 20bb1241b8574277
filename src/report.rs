use std::io::Write;

use attention::masks::causal_keep_matrix;
use candle_core::Tensor;
use model::{AttentionPipeline, PipelineOutput};

use crate::{DemoError, Variant};

const SEPARATOR_WIDTH: usize = 83;

fn separator<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))
}

fn section<W: Write>(out: &mut W, title: &str, tensor: &Tensor) -> std::io::Result<()> {
    writeln!(out, "{title} {:?}:", tensor.dims())?;
    writeln!(out, "{tensor}")?;
    separator(out)
}

fn shape_line<W: Write>(out: &mut W, title: &str, tensor: &Tensor) -> std::io::Result<()> {
    writeln!(out, "{title} shape: {:?}", tensor.dims())
}

/// Writes every intermediate of one walkthrough in pipeline order.
pub fn render<W: Write>(
    out: &mut W,
    variant: Variant,
    sentence: &str,
    pipeline: &AttentionPipeline,
    output: &PipelineOutput,
) -> Result<(), DemoError> {
    let config = pipeline.config();
    writeln!(out, "{variant}")?;
    writeln!(out, "sentence: {sentence}")?;
    writeln!(out, "vocabulary: {}", pipeline.vocab())?;
    writeln!(out, "token ids: {:?}", output.token_ids)?;
    separator(out)?;

    section(out, "embedded sentence", &output.embeddings)?;

    let qkv = &output.qkv;
    match config.heads {
        None => {
            section(out, "queries", &qkv.queries)?;
            section(out, "keys", &qkv.keys)?;
            section(out, "values", &qkv.values)?;
        }
        Some(heads) => {
            writeln!(out, "heads: {heads}")?;
            shape_line(out, "queries", &qkv.queries)?;
            shape_line(out, "keys", &qkv.keys)?;
            shape_line(out, "values", &qkv.values)?;
            separator(out)?;
        }
    }

    let attention = &output.attention;
    section(out, "unnormalized attention scores", &attention.scores)?;
    if config.causal {
        let seq_len = output.token_ids.len();
        let keep = causal_keep_matrix(attention.scores.device(), seq_len, seq_len)?;
        section(out, "causal keep matrix", &keep)?;
        if let Some(mask) = &attention.mask {
            section(out, "additive mask", mask)?;
        }
        if let Some(masked) = &attention.masked_scores {
            section(out, "masked scores", masked)?;
        }
    }
    section(out, "attention weights", &attention.weights)?;
    section(out, "context vectors", &attention.context)?;
    shape_line(out, "context", &attention.context)?;
    Ok(())
}
