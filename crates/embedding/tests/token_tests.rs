use candle_core::{DType, Device, Result, Tensor};
use embedding::token::{TokenEmbedding, TokenEmbeddingConfig};
use layers::ParamInit;

fn config(vocab_size: usize, embedding_size: usize) -> TokenEmbeddingConfig {
    TokenEmbeddingConfig {
        vocab_size,
        embedding_size,
        device: Device::Cpu,
    }
}

#[test]
fn forward_shape_matches_config() -> Result<()> {
    let embedding = TokenEmbedding::new(config(4, 4), &mut ParamInit::seeded(0))?;

    let flat = embedding.lookup(&[0, 3, 2, 1])?;
    assert_eq!(flat.dims(), &[4, 4]);
    assert_eq!(flat.dtype(), DType::F32);

    let batched = Tensor::from_slice(&[0i64, 1, 2, 3], (2, 2), &Device::Cpu)?;
    assert_eq!(embedding.forward(&batched)?.dims(), &[2, 2, 4]);
    Ok(())
}

#[test]
fn lookup_returns_table_rows() -> Result<()> {
    let table = Tensor::new(&[[0f32, 0.5], [1.0, 1.5], [2.0, 2.5]], &Device::Cpu)?;
    let embedding = TokenEmbedding::from_weight(config(3, 2), table)?;

    let output = embedding.lookup(&[2, 0, 2])?;

    assert_eq!(
        output.to_vec2::<f32>()?,
        vec![vec![2.0, 2.5], vec![0.0, 0.5], vec![2.0, 2.5]]
    );
    Ok(())
}

#[test]
fn forward_rejects_out_of_range_ids() -> Result<()> {
    let embedding = TokenEmbedding::new(config(4, 3), &mut ParamInit::seeded(1))?;

    let err = embedding.lookup(&[0, 4]).unwrap_err();
    assert!(err.to_string().contains("token id 4 exceeds vocab size"));
    Ok(())
}

#[test]
fn forward_rejects_empty_and_float_ids() -> Result<()> {
    let embedding = TokenEmbedding::new(config(4, 3), &mut ParamInit::seeded(1))?;

    assert!(embedding.lookup(&[]).is_err());
    let floats = Tensor::new(&[0f32, 1.0], &Device::Cpu)?;
    assert!(embedding.forward(&floats).is_err());
    Ok(())
}

#[test]
fn seeded_tables_are_reproducible() -> Result<()> {
    let a = TokenEmbedding::new(config(5, 4), &mut ParamInit::seeded(21))?;
    let b = TokenEmbedding::new(config(5, 4), &mut ParamInit::seeded(21))?;
    let c = TokenEmbedding::new(config(5, 4), &mut ParamInit::seeded(22))?;

    assert_eq!(a.weight().to_vec2::<f32>()?, b.weight().to_vec2::<f32>()?);
    assert_ne!(a.weight().to_vec2::<f32>()?, c.weight().to_vec2::<f32>()?);
    Ok(())
}

#[test]
fn mismatched_table_shape_is_rejected() -> Result<()> {
    let table = Tensor::zeros((3, 5), DType::F32, &Device::Cpu)?;
    assert!(TokenEmbedding::from_weight(config(3, 2), table).is_err());
    assert!(TokenEmbedding::new(config(0, 2), &mut ParamInit::seeded(0)).is_err());
    Ok(())
}
