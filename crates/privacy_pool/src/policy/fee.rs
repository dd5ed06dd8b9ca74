//! Relay fee cap.

use tracing::{debug, warn};

use super::PolicyRejection;

/// Accept a relayer's quoted fee only if the pool's own maximum allows it.
///
/// Both values are basis points. The quote is checked first, then the
/// maximum; a quote equal to the maximum is accepted.
pub fn check_fee_cap(quoted_bps: f64, onchain_max_bps: Option<f64>) -> Result<(), PolicyRejection> {
    let verdict = if !quoted_bps.is_finite() || quoted_bps < 0.0 {
        Err(PolicyRejection::InvalidFee)
    } else {
        match onchain_max_bps {
            None => Err(PolicyRejection::NoOnchainMax),
            Some(max_bps) if !max_bps.is_finite() || max_bps < 0.0 => {
                Err(PolicyRejection::InvalidOnchainMax)
            }
            Some(max_bps) if quoted_bps > max_bps => Err(PolicyRejection::ExceedsMax {
                quoted_bps,
                max_bps,
            }),
            Some(_) => Ok(()),
        }
    };
    match verdict.as_ref() {
        Ok(_) => debug!(quoted_bps, "relay fee within cap"),
        Err(rejection) => warn!(quoted_bps, reason = rejection.code(), "relay fee rejected"),
    }
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_within_cap() {
        assert_eq!(check_fee_cap(0.0, Some(100.0)), Ok(()));
        assert_eq!(check_fee_cap(99.5, Some(100.0)), Ok(()));
        assert_eq!(check_fee_cap(0.0, Some(0.0)), Ok(()));
    }

    #[test]
    fn equality_is_accepted() {
        assert_eq!(check_fee_cap(100.0, Some(100.0)), Ok(()));
    }

    #[test]
    fn rejects_above_cap() {
        let rejection = check_fee_cap(100.5, Some(100.0)).unwrap_err();
        assert_eq!(
            rejection,
            PolicyRejection::ExceedsMax {
                quoted_bps: 100.5,
                max_bps: 100.0
            }
        );
        assert_eq!(rejection.code(), "exceeds-max");
    }

    #[test]
    fn rejects_bad_quote_first() {
        for quoted in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                check_fee_cap(quoted, None),
                Err(PolicyRejection::InvalidFee)
            );
        }
    }

    #[test]
    fn rejects_missing_or_bad_max() {
        assert_eq!(
            check_fee_cap(10.0, None),
            Err(PolicyRejection::NoOnchainMax)
        );
        for max in [-0.5, f64::NAN, f64::INFINITY] {
            let rejection = check_fee_cap(10.0, Some(max)).unwrap_err();
            assert_eq!(rejection.code(), "invalid-onchain-max");
        }
    }
}
