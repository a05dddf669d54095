//! The set of currency codes a transaction may be recorded in.
//!
//! Currencies are opaque tags: amounts are never converted between them.

use serde::Serialize;

use crate::Error;

/// The currency codes accepted when no others are configured.
pub const DEFAULT_CURRENCIES: [&str; 3] = ["USD", "EUR", "GBP"];

/// The currency used when a transaction does not specify one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// The allowed currency codes and which one to use by default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyConfig {
    codes: Vec<String>,
    default: String,
}

impl CurrencyConfig {
    /// Create a currency config from a list of codes.
    ///
    /// Codes are trimmed and upper-cased, and duplicates are dropped.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidCurrencyConfig] if `codes` is empty or does
    /// not contain `default`.
    pub fn new<S: AsRef<str>>(codes: &[S], default: &str) -> Result<Self, Error> {
        let mut normalized: Vec<String> = Vec::with_capacity(codes.len());

        for code in codes {
            let code = code.as_ref().trim().to_uppercase();

            if !code.is_empty() && !normalized.contains(&code) {
                normalized.push(code);
            }
        }

        if normalized.is_empty() {
            return Err(Error::InvalidCurrencyConfig(
                "at least one currency must be allowed".to_owned(),
            ));
        }

        let default = default.trim().to_uppercase();

        if !normalized.contains(&default) {
            return Err(Error::InvalidCurrencyConfig(format!(
                "the default currency {default} is not one of {}",
                normalized.join(", ")
            )));
        }

        Ok(Self {
            codes: normalized,
            default,
        })
    }

    /// The allowed currency codes in the order they were configured.
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// The currency code to use when none is given.
    pub fn default_code(&self) -> &str {
        &self.default
    }

    /// Whether `code` is one of the allowed currencies.
    pub fn is_allowed(&self, code: &str) -> bool {
        self.codes.iter().any(|allowed| allowed == code)
    }
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            codes: DEFAULT_CURRENCIES.map(str::to_owned).to_vec(),
            default: DEFAULT_CURRENCY.to_owned(),
        }
    }
}
