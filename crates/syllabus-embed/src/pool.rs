use anyhow::{ensure, Context, Result};
use candle_core::{DType, Tensor};

/// Sentence vectors from token states: the mean over tokens whose mask is set,
/// scaled to unit L2 norm.
///
/// `hidden` is `[batch, tokens, width]` and `attention_mask` is
/// `[batch, tokens]`; the result is `[batch, width]`. A row with no unmasked
/// tokens pools to zeros instead of NaN.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, tokens, width) = hidden.dims3().context("token states must be [batch, tokens, width]")?;
    ensure!(
        attention_mask.dims() == [batch, tokens],
        "attention mask is {:?}, expected [{batch}, {tokens}]",
        attention_mask.dims()
    );
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.maximum(1.0)?;
    let mean = summed.broadcast_div(&counts)?;
    let eps = if hidden.dtype() == DType::F16 { 1e-6 } else { 1e-12 };
    let norms = mean.sqr()?.sum_keepdim(1)?.sqrt()?.affine(1.0, eps)?;
    let pooled = mean.broadcast_div(&norms)?;
    ensure!(pooled.dims() == [batch, width], "pooled shape {:?}", pooled.dims());
    Ok(pooled)
}
