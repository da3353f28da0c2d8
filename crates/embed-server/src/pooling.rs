use candle_core::{DType, IndexOp, Result, Tensor};

/// Reduces `hidden[batch, seq, hidden]` to one vector per row using the last
/// attended token of each row in `mask[batch, seq]`.
pub fn last_token_pool(hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
    let (batch, seq_len, _) = hidden.dims3()?;
    if seq_len == 0 {
        candle_core::bail!("cannot pool an empty sequence");
    }
    let mask = mask.to_dtype(DType::U32)?;

    // Left padded: every row ends on a real token.
    let ending = mask.i((.., seq_len - 1))?.sum_all()?.to_scalar::<u32>()?;
    if ending as usize == batch {
        return hidden.i((.., seq_len - 1));
    }

    let lengths = mask.sum(1)?.to_vec1::<u32>()?;
    let rows = lengths
        .iter()
        .enumerate()
        .map(|(row, &len)| hidden.i((row, (len as usize).saturating_sub(1))))
        .collect::<Result<Vec<_>>>()?;
    Tensor::stack(&rows, 0)
}

pub fn l2_normalize(x: &Tensor) -> Result<Tensor> {
    let norm = x.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
    x.broadcast_div(&norm)
}
