//! Bias-free linear projections.
//!
//! Weights are stored as `(out_dim, in_dim)` and applied as `x · Wᵀ`. Inputs may
//! be shaped `(seq, in_dim)` or `(batch, seq, in_dim)`; the output keeps the
//! leading dimensions and replaces the last one with `out_dim`.

use candle_core::{DType, Device, Tensor};
use serde::{Deserialize, Serialize};

use crate::{checks, init::ParamInit, LayerError, Result};

/// Supported weight initialisation policies.
///
/// Serialized with a `kind` tag, e.g. `{ "kind": "normal", "mean": 0.0, "std": 0.02 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinearInit {
    /// Uniform samples in `[low, high)`.
    Uniform { low: f32, high: f32 },
    /// Gaussian samples with the given mean and standard deviation.
    Normal { mean: f32, std: f32 },
    /// Xavier/Glorot uniform initialisation.
    XavierUniform,
}

impl Default for LinearInit {
    /// Unit-interval uniform weights, as produced by an untrained `rand` draw.
    fn default() -> Self {
        LinearInit::Uniform {
            low: 0.0,
            high: 1.0,
        }
    }
}

impl LinearInit {
    /// Samples a `(out_dim, in_dim)` weight matrix, optionally with leading
    /// dimensions prepended through `prefix`.
    pub(crate) fn sample(
        &self,
        prefix: &[usize],
        out_dim: usize,
        in_dim: usize,
        init: &mut ParamInit,
        device: &Device,
    ) -> Result<Tensor> {
        let mut shape = prefix.to_vec();
        shape.extend([out_dim, in_dim]);
        match self {
            LinearInit::Uniform { low, high } => init.uniform(shape, *low, *high, device),
            LinearInit::Normal { mean, std } => init.normal(shape, *mean, *std, device),
            LinearInit::XavierUniform => {
                let bound = (6.0f32 / (in_dim + out_dim) as f32).sqrt();
                init.uniform(shape, -bound, bound, device)
            }
        }
    }
}

/// Dense projection without bias.
#[derive(Debug, Clone)]
pub struct Linear {
    weight: Tensor,
    in_dim: usize,
    out_dim: usize,
}

impl Linear {
    /// Wraps an existing `(out_dim, in_dim)` weight matrix.
    pub fn new(weight: Tensor) -> Result<Self> {
        checks::expect_rank("linear.weight", &weight, 2)?;
        checks::expect_non_empty("linear.weight", &weight)?;
        checks::expect_dtype_in("linear.weight", &weight, &[DType::F32])?;
        let (out_dim, in_dim) = weight.dims2()?;
        Ok(Self {
            weight,
            in_dim,
            out_dim,
        })
    }

    /// Samples a fresh weight matrix following `policy`.
    pub fn with_init(
        in_dim: usize,
        out_dim: usize,
        policy: &LinearInit,
        init: &mut ParamInit,
        device: &Device,
    ) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(LayerError::InvalidConfig(format!(
                "linear dimensions must be non-zero, got {in_dim} -> {out_dim}"
            )));
        }
        let weight = policy.sample(&[], out_dim, in_dim, init, device)?;
        Self::new(weight)
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Applies `x · Wᵀ`.
    pub fn forward(&self, hidden: &Tensor) -> Result<Tensor> {
        checks::expect_non_empty("linear.input", hidden)?;
        checks::expect_last_dim("linear.input", hidden, self.in_dim)?;

        let weight_t = self.weight.t()?;
        let output = match hidden.dims() {
            [_, _] => hidden.matmul(&weight_t)?,
            [batch, seq, _] => {
                let flat = hidden.reshape((*batch * *seq, self.in_dim))?;
                flat.matmul(&weight_t)?
                    .reshape((*batch, *seq, self.out_dim))?
            }
            other => {
                return Err(LayerError::InvalidShape {
                    name: "linear.input",
                    details: format!("expected [T, H_in] or [B, T, H_in], got {other:?}"),
                })
            }
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_matches_manual_product() -> Result<()> {
        let device = Device::Cpu;
        let weight = Tensor::new(&[[1f32, 0.0], [0.0, 2.0], [1.0, 1.0]], &device)?;
        let linear = Linear::new(weight)?;
        let input = Tensor::new(&[[3f32, 4.0]], &device)?;

        let output = linear.forward(&input)?;

        assert_eq!(output.to_vec2::<f32>()?, vec![vec![3.0, 8.0, 7.0]]);
        Ok(())
    }

    #[test]
    fn batched_input_keeps_leading_dims() -> Result<()> {
        let device = Device::Cpu;
        let mut init = ParamInit::seeded(11);
        let linear = Linear::with_init(4, 6, &LinearInit::default(), &mut init, &device)?;
        let input = init.normal((2, 5, 4), 0.0, 1.0, &device)?;

        let output = linear.forward(&input)?;

        assert_eq!(output.dims(), &[2, 5, 6]);
        let row = linear.forward(&input.get(1)?)?;
        let diff = output
            .get(1)?
            .sub(&row)?
            .abs()?
            .max_all()?
            .to_vec0::<f32>()?;
        assert!(diff < 1e-6);
        Ok(())
    }

    #[test]
    fn wrong_input_width_is_rejected() -> Result<()> {
        let device = Device::Cpu;
        let linear = Linear::with_init(4, 2, &LinearInit::default(), &mut ParamInit::seeded(0), &device)?;
        let input = Tensor::zeros((3, 5), DType::F32, &device)?;
        assert!(matches!(
            linear.forward(&input),
            Err(LayerError::InvalidShape { .. })
        ));
        Ok(())
    }

    #[test]
    fn xavier_bounds_hold() -> Result<()> {
        let device = Device::Cpu;
        let linear = Linear::with_init(8, 8, &LinearInit::XavierUniform, &mut ParamInit::seeded(5), &device)?;
        let bound = (6.0f32 / 16.0).sqrt();
        let values = linear.weight().flatten_all()?.to_vec1::<f32>()?;
        assert!(values.iter().all(|v| v.abs() <= bound));
        Ok(())
    }

    #[test]
    fn init_policies_use_kind_tags() {
        let normal: LinearInit =
            serde_json::from_str(r#"{ "kind": "normal", "mean": 0.0, "std": 0.02 }"#)
                .expect("normal policy");
        assert_eq!(normal, LinearInit::Normal { mean: 0.0, std: 0.02 });

        let xavier: LinearInit =
            serde_json::from_str(r#"{ "kind": "xavier_uniform" }"#).expect("xavier policy");
        assert_eq!(xavier, LinearInit::XavierUniform);

        let encoded = serde_json::to_string(&LinearInit::default()).expect("encode");
        assert_eq!(encoded, r#"{"kind":"uniform","low":0.0,"high":1.0}"#);
    }

    #[test]
    fn invalid_policies_fail_instead_of_panicking() {
        let device = Device::Cpu;
        for policy in [
            LinearInit::Uniform { low: 0.0, high: f32::INFINITY },
            LinearInit::Normal { mean: 0.0, std: -1.0 },
        ] {
            let result = Linear::with_init(4, 2, &policy, &mut ParamInit::seeded(0), &device);
            assert!(matches!(result, Err(LayerError::InvalidConfig(_))), "{policy:?}");
        }
    }
}
