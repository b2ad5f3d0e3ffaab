//! Cost estimation from token counts and per-model pricing.

use crate::profile::Pricing;
use crate::types::Usage;

/// Estimate the dollar cost of a run so far.
///
/// Recomputed idempotently on every usage snapshot so the estimate can
/// update live. A model without pricing has an unknown cost, which is
/// `None`, never zero.
pub fn estimate(usage: &Usage, pricing: Option<&Pricing>) -> Option<f64> {
    let pricing = pricing?;
    let input = usage.input_tokens as f64 * pricing.input_per_million;
    let output = usage.output_tokens as f64 * pricing.output_per_million;
    Some((input + output) / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_is_deterministic() {
        let usage = Usage {
            input_tokens: 1000,
            output_tokens: 2000,
            reasoning_tokens: None,
        };
        let pricing = Pricing {
            input_per_million: 1.0,
            output_per_million: 2.0,
        };
        let cost = estimate(&usage, Some(&pricing)).unwrap();
        assert!((cost - 0.0045).abs() < 1e-12);
    }

    #[test]
    fn test_missing_pricing_means_unknown_cost() {
        let usage = Usage {
            input_tokens: 1000,
            output_tokens: 2000,
            reasoning_tokens: None,
        };
        assert_eq!(estimate(&usage, None), None);
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let usage = Usage {
            input_tokens: 500,
            output_tokens: 1500,
            reasoning_tokens: Some(100),
        };
        let pricing = Pricing {
            input_per_million: 3.0,
            output_per_million: 15.0,
        };
        let first = estimate(&usage, Some(&pricing));
        let second = estimate(&usage, Some(&pricing));
        assert_eq!(first, second);
    }
}
