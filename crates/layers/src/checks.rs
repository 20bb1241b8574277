//! Lightweight validation helpers shared across layer components.
//!
//! Every helper takes the logical name of the tensor so errors point at the
//! offending argument instead of surfacing as an opaque backend failure.

use candle_core::{DType, Tensor};

use crate::{LayerError, Result};

/// Ensures a tensor has exactly `rank` dimensions.
pub fn expect_rank(name: &'static str, tensor: &Tensor, rank: usize) -> Result<()> {
    if tensor.rank() == rank {
        Ok(())
    } else {
        Err(LayerError::InvalidShape {
            name,
            details: format!("expected rank {rank}, got shape {:?}", tensor.dims()),
        })
    }
}

/// Ensures a tensor matches the expected dimensions exactly.
pub fn expect_shape(name: &'static str, tensor: &Tensor, expected: &[usize]) -> Result<()> {
    let actual = tensor.dims();
    if actual == expected {
        Ok(())
    } else {
        Err(LayerError::InvalidShape {
            name,
            details: format!("expected shape {expected:?}, got {actual:?}"),
        })
    }
}

/// Ensures the trailing dimension equals `expected`.
pub fn expect_last_dim(name: &'static str, tensor: &Tensor, expected: usize) -> Result<()> {
    match tensor.dims().last() {
        Some(&last) if last == expected => Ok(()),
        _ => Err(LayerError::InvalidShape {
            name,
            details: format!(
                "expected trailing dimension {expected}, got shape {:?}",
                tensor.dims()
            ),
        }),
    }
}

/// Ensures no dimension of the tensor is zero.
pub fn expect_non_empty(name: &'static str, tensor: &Tensor) -> Result<()> {
    if tensor.dims().iter().all(|&dim| dim > 0) {
        Ok(())
    } else {
        Err(LayerError::InvalidShape {
            name,
            details: format!("dimensions must be non-zero, got {:?}", tensor.dims()),
        })
    }
}

/// Checks the tensor dtype is one of the allowed values.
pub fn expect_dtype_in(name: &'static str, tensor: &Tensor, allowed: &[DType]) -> Result<()> {
    let dtype = tensor.dtype();
    if allowed.contains(&dtype) {
        Ok(())
    } else {
        Err(LayerError::InvalidDType {
            name,
            details: format!("expected one of {allowed:?}, got {dtype:?}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn shape_mismatch_names_the_tensor() -> Result<()> {
        let tensor = Tensor::zeros((2, 3), DType::F32, &Device::Cpu)?;
        expect_shape("weight", &tensor, &[2, 3])?;
        let err = expect_shape("weight", &tensor, &[3, 2]).unwrap_err();
        assert!(err.to_string().contains("weight"));
        assert!(err.to_string().contains("[3, 2]"));
        Ok(())
    }

    #[test]
    fn rank_and_trailing_dim() -> Result<()> {
        let tensor = Tensor::zeros((4, 8), DType::F32, &Device::Cpu)?;
        expect_rank("x", &tensor, 2)?;
        expect_last_dim("x", &tensor, 8)?;
        assert!(expect_rank("x", &tensor, 3).is_err());
        assert!(expect_last_dim("x", &tensor, 4).is_err());
        Ok(())
    }

    #[test]
    fn empty_and_dtype_checks() -> Result<()> {
        let empty = Tensor::zeros((0, 4), DType::F32, &Device::Cpu)?;
        assert!(expect_non_empty("x", &empty).is_err());
        let ids = Tensor::zeros(3, DType::U32, &Device::Cpu)?;
        assert!(matches!(
            expect_dtype_in("x", &ids, &[DType::F32]),
            Err(LayerError::InvalidDType { .. })
        ));
        Ok(())
    }
}
