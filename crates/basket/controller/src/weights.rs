use basket_types::math::{self, checked_sub};
use basket_types::{Amount, Bps, MathError, BPS_DENOMINATOR};

use crate::error::ControllerError;

/// Weights must be positive, one per asset, and sum to exactly 10 000 bps.
pub fn validate_weights(asset_count: usize, weights: &[Bps]) -> Result<(), ControllerError> {
    if weights.is_empty() {
        return Err(ControllerError::InvalidWeights("weight list is empty".into()));
    }
    if weights.len() != asset_count {
        return Err(ControllerError::InvalidWeights(format!(
            "{} weights for {} assets",
            weights.len(),
            asset_count
        )));
    }
    if weights.iter().any(|w| *w == 0) {
        return Err(ControllerError::InvalidWeights("weights must be positive".into()));
    }
    let total: u128 = weights.iter().map(|w| *w as u128).sum();
    if total != BPS_DENOMINATOR {
        return Err(ControllerError::InvalidWeights(format!(
            "weights sum to {}, expected {}",
            total, BPS_DENOMINATOR
        )));
    }
    Ok(())
}

/// Split `net` into `net * w_i / 10000` portions. The rounding remainder goes
/// to the last asset so the portions always sum to `net`.
pub fn split_by_weights(net: Amount, weights: &[Bps]) -> Result<Vec<Amount>, MathError> {
    let mut portions = Vec::with_capacity(weights.len());
    let mut remaining = net;
    for (i, weight) in weights.iter().enumerate() {
        let portion = if i + 1 == weights.len() {
            remaining
        } else {
            math::bps_of(net, *weight)?
        };
        remaining = checked_sub(remaining, portion)?;
        portions.push(portion);
    }
    Ok(portions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn validation() {
        assert!(validate_weights(2, &[5_000, 5_000]).is_ok());
        assert!(validate_weights(2, &[5_000]).is_err());
        assert!(validate_weights(2, &[10_000, 0]).is_err());
        assert!(validate_weights(2, &[5_000, 4_999]).is_err());
        assert!(validate_weights(0, &[]).is_err());
    }

    #[test]
    fn remainder_goes_to_last_asset() {
        assert_eq!(split_by_weights(995, &[3_333, 3_333, 3_334]).unwrap(), vec![331, 331, 333]);
        assert_eq!(split_by_weights(0, &[5_000, 5_000]).unwrap(), vec![0, 0]);
    }

    proptest! {
        #[test]
        fn portions_sum_to_net(net in 0u128..=u64::MAX as u128, first in 1u16..10_000) {
            let weights = [first, 10_000 - first];
            let portions = split_by_weights(net, &weights).unwrap();
            prop_assert_eq!(portions.iter().sum::<u128>(), net);
        }
    }
}
