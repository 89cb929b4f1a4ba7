/// USD price per 1K tokens
const MODEL_TOKEN_PRICES: &[(&str, f64)] = &[
    ("gpt-3.5-turbo", 0.0015),
    ("gpt-4o-mini", 0.002),
    ("gpt-4o-large", 0.004),
];

const KRW_PER_USD: f64 = 1400.0;

/// Approximate USD cost of a request, if the model has a known price
pub fn estimate_cost(model: &str, total_tokens: u64) -> Option<f64> {
    MODEL_TOKEN_PRICES
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, per_thousand)| total_tokens as f64 / 1000.0 * per_thousand)
}

pub fn usd_to_krw(amount: f64) -> f64 {
    amount * KRW_PER_USD
}
