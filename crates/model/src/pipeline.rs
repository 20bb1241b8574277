use attention::{Attention, AttentionOutput, ExactAttention, MultiHeadAttention};
use candle_core::Tensor;
use embedding::token::{TokenEmbedding, TokenEmbeddingConfig};
use layers::{MultiHeadProjection, ParamInit, Qkv, QkvProjection};
use tokenizer::{pretokenize, Vocabulary};

use crate::{config::PipelineConfig, PipelineError, Result};

/// Query/key/value projection used by the pipeline.
#[derive(Debug, Clone)]
pub enum Projection {
    Single(QkvProjection),
    MultiHead(MultiHeadProjection),
}

impl Projection {
    pub fn heads(&self) -> Option<usize> {
        match self {
            Projection::Single(_) => None,
            Projection::MultiHead(projection) => Some(projection.heads()),
        }
    }

    pub fn forward(&self, embedded: &Tensor) -> Result<Qkv> {
        let qkv = match self {
            Projection::Single(projection) => projection.forward(embedded)?,
            Projection::MultiHead(projection) => projection.forward(embedded)?,
        };
        Ok(qkv)
    }
}

/// Everything computed for one sentence.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub words: Vec<String>,
    pub token_ids: Vec<u32>,
    /// `(seq_len, embedding_size)`.
    pub embeddings: Tensor,
    /// Shapes carry a leading head axis for the multi-head variant.
    pub qkv: Qkv,
    pub attention: AttentionOutput,
}

/// Sentence-to-context pipeline with fixed, explicitly initialised parameters.
#[derive(Debug, Clone)]
pub struct AttentionPipeline {
    config: PipelineConfig,
    vocab: Vocabulary,
    embedding: TokenEmbedding,
    projection: Projection,
}

impl AttentionPipeline {
    /// Builds the vocabulary from `sentence` and samples every parameter.
    ///
    /// The embedding table is sampled before the projection weights, so a
    /// given seed always yields the same tensors.
    pub fn new(config: PipelineConfig, sentence: &str) -> Result<Self> {
        config.validate()?;
        let vocab = Vocabulary::from_sentence(sentence, &config.tokenizer)?;
        let mut init = ParamInit::new(config.seed);

        let embedding = TokenEmbedding::new(
            TokenEmbeddingConfig {
                vocab_size: vocab.len(),
                embedding_size: config.embedding_size,
                device: config.device.clone(),
            },
            &mut init,
        )?;

        let dims = config.projection_dims();
        let projection = match config.heads {
            None => Projection::Single(QkvProjection::new(
                dims,
                &config.weight_init,
                &mut init,
                &config.device,
            )?),
            Some(heads) => Projection::MultiHead(MultiHeadProjection::new(
                heads,
                dims,
                &config.weight_init,
                &mut init,
                &config.device,
            )?),
        };

        log::debug!(
            "pipeline built vocab={} heads={:?} causal={} seed={:?}",
            vocab.len(),
            config.heads,
            config.causal,
            init.seed()
        );
        Self::from_parts(config, vocab, embedding, projection)
    }

    /// Assembles a pipeline from caller-supplied components.
    pub fn from_parts(
        config: PipelineConfig,
        vocab: Vocabulary,
        embedding: TokenEmbedding,
        projection: Projection,
    ) -> Result<Self> {
        config.validate()?;
        if embedding.config().vocab_size != vocab.len() {
            return Err(PipelineError::InvalidConfig(format!(
                "embedding table has {} rows but the vocabulary has {} words",
                embedding.config().vocab_size,
                vocab.len()
            )));
        }
        if projection.heads() != config.heads {
            return Err(PipelineError::InvalidConfig(format!(
                "projection heads {:?} do not match configured heads {:?}",
                projection.heads(),
                config.heads
            )));
        }
        let dims = match &projection {
            Projection::Single(projection) => projection.dims(),
            Projection::MultiHead(projection) => projection.dims(),
        };
        if dims != config.projection_dims() {
            return Err(PipelineError::InvalidConfig(format!(
                "projection dims {dims:?} do not match configured dims {:?}",
                config.projection_dims()
            )));
        }
        if dims.embedding_size != embedding.config().embedding_size {
            return Err(PipelineError::InvalidConfig(format!(
                "projection expects embeddings of width {} but the table provides {}",
                dims.embedding_size,
                embedding.config().embedding_size
            )));
        }
        Ok(Self {
            config,
            vocab,
            embedding,
            projection,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn embedding(&self) -> &TokenEmbedding {
        &self.embedding
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Runs every stage for `sentence`, whose words must be in the vocabulary.
    pub fn run(&self, sentence: &str) -> Result<PipelineOutput> {
        let words = pretokenize(sentence, &self.config.tokenizer);
        let token_ids = self.vocab.encode(&words)?;
        let embeddings = self.embedding.lookup(&token_ids)?;
        let qkv = self.projection.forward(&embeddings)?;

        let attention_config = self.config.attention_config();
        let attention = match self.projection.heads() {
            None => ExactAttention::new().attend(
                &qkv.queries,
                &qkv.keys,
                &qkv.values,
                &attention_config,
            )?,
            Some(heads) => MultiHeadAttention::new(heads)?.attend(
                &qkv.queries,
                &qkv.keys,
                &qkv.values,
                &attention_config,
            )?,
        };

        Ok(PipelineOutput {
            words,
            token_ids,
            embeddings,
            qkv,
            attention,
        })
    }
}

/// Builds a pipeline for `sentence` and runs it once.
pub fn run_sentence(
    config: PipelineConfig,
    sentence: &str,
) -> Result<(AttentionPipeline, PipelineOutput)> {
    let pipeline = AttentionPipeline::new(config, sentence)?;
    let output = pipeline.run(sentence)?;
    Ok((pipeline, output))
}
