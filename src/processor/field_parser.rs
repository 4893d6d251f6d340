use regex::Regex;

use crate::models::PriceSnapshot;

/// Price, discount, unit and limit fields pulled out of one description
/// block. All matches are best-effort and independent: a pattern that does
/// not match leaves its field at the empty/zero default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDescription {
    pub prices: PriceSnapshot,
    pub unit_price: String,
    pub daily_limit: String,
}

/// Regex-based extraction of structured fields from the free-text
/// description and availability blocks.
pub struct FieldParser {
    availability: Regex,
    regular_price: Regex,
    discount: Regex,
    unit_price: Regex,
    daily_limit: Regex,
}

impl FieldParser {
    pub fn new() -> Self {
        Self {
            availability: Regex::new(r"Oferta od\s*(\d{2}\.\d{2})\s*do\s*(\d{2}\.\d{2})").unwrap(),
            regular_price: Regex::new(r"Cena regularna:\s*(\d+(?:[.,]\d+)?)\s*zł(/[^\s,)]*)?")
                .unwrap(),
            discount: Regex::new(r"(\d+)%\s*(?:taniej|mniej)").unwrap(),
            unit_price: Regex::new(r"\((\d+(?:[.,]\d+)?)\s*zł/([^)]+)\)").unwrap(),
            daily_limit: Regex::new(r"Limit(?:\s+dzienny)?[:\s]+(\d+)").unwrap(),
        }
    }

    /// Split "Oferta od DD.MM do DD.MM" into its two partial dates. No match
    /// means an open-ended/unknown window, reported as two empty strings.
    pub fn parse_availability(&self, text: &str) -> (String, String) {
        match self.availability.captures(text) {
            Some(captures) => (captures[1].to_string(), captures[2].to_string()),
            None => (String::new(), String::new()),
        }
    }

    /// Derive all price fields from the description text.
    pub fn parse_description(&self, description: &str) -> ParsedDescription {
        let mut parsed = ParsedDescription::default();

        if let Some(captures) = self.regular_price.captures(description) {
            parsed.prices.regular_price = captures[1].replace(',', ".");
            parsed.prices.unit = captures
                .get(2)
                .map(|unit| unit.as_str().to_string())
                .unwrap_or_default();
        }

        parsed.prices.discount_percent = self
            .discount
            .captures(description)
            .and_then(|captures| captures[1].parse().ok())
            .unwrap_or(0);

        parsed.prices.promo_price = compute_promo_price(
            &parsed.prices.regular_price,
            parsed.prices.discount_percent,
        );

        if let Some(captures) = self.unit_price.captures(description) {
            parsed.unit_price = captures[1].replace(',', ".");
            if parsed.prices.unit.is_empty() {
                parsed.prices.unit = captures[2].to_string();
            }
        }

        if let Some(captures) = self.daily_limit.captures(description) {
            parsed.daily_limit = captures[1].to_string();
        }

        parsed
    }
}

impl Default for FieldParser {
    fn default() -> Self {
        Self::new()
    }
}

/// `round(regular × (1 − percent/100), 2)`, formatted with two decimals.
/// Empty unless both a parseable regular price and a nonzero percent exist.
fn compute_promo_price(regular_price: &str, discount_percent: u32) -> String {
    if regular_price.is_empty() || discount_percent == 0 {
        return String::new();
    }

    match regular_price.parse::<f64>() {
        Ok(regular) => {
            let promo = regular * (1.0 - discount_percent as f64 / 100.0);
            format!("{:.2}", (promo * 100.0).round() / 100.0)
        }
        Err(_) => String::new(),
    }
}
