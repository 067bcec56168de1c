use {
    super::error::CheckoutError,
    serde::{Deserialize, Deserializer, Serialize, Serializer},
    std::{fmt, str::FromStr},
};

/// Non-negative amount in the currency's minor unit (paise, cents).
///
/// Held as minor units everywhere inside the crate. On the wire it is the
/// major-unit decimal string, `"696.20"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct MoneyAmount(i64);

impl MoneyAmount {
    pub const ZERO: MoneyAmount = MoneyAmount(0);

    pub fn new(minor: i64) -> Result<Self, CheckoutError> {
        if minor < 0 {
            return Err(CheckoutError::Validation(format!(
                "MoneyAmount cannot be negative, got: {minor}"
            )));
        }
        Ok(Self(minor))
    }

    /// Infallible constructor for amounts that cannot be negative by type.
    pub const fn from_unsigned(minor: u32) -> Self {
        Self(minor as i64)
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: MoneyAmount) -> Option<MoneyAmount> {
        self.0.checked_add(other.0).map(MoneyAmount)
    }

    pub fn checked_mul(self, qty: i64) -> Option<MoneyAmount> {
        if qty < 0 {
            return None;
        }
        self.0.checked_mul(qty).map(MoneyAmount)
    }

    /// `self × bps / 10000`, rounded half away from zero to the minor unit.
    pub fn percent_bps(self, bps: u32) -> Option<MoneyAmount> {
        let scaled = i128::from(self.0) * i128::from(bps);
        let rounded = (scaled + 5_000) / 10_000;
        i64::try_from(rounded).ok().map(MoneyAmount)
    }
}

/// Major units with two decimals, e.g. `696.20`.
impl fmt::Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Parses major units with at most two decimals: `696`, `696.2`, `696.20`.
impl FromStr for MoneyAmount {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CheckoutError::Validation(format!("invalid amount: {s:?}"));
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || frac.len() > 2 || !all_digits(whole) || !all_digits(frac) {
            return Err(invalid());
        }
        if s.contains('.') && frac.is_empty() {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };
        whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(frac))
            .map(MoneyAmount)
            .ok_or_else(invalid)
    }
}

impl Serialize for MoneyAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MoneyAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Inr,
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inr => "INR",
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Currency {
    type Error = CheckoutError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::Inr),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            _ => Err(CheckoutError::Validation(format!("unknown currency: {s}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: MoneyAmount,
    currency: Currency,
}

impl Money {
    pub fn new(amount: MoneyAmount, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn amount(&self) -> MoneyAmount {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(minor: i64) -> MoneyAmount {
        MoneyAmount::new(minor).unwrap()
    }

    #[test]
    fn negative_amount_rejected() {
        assert!(MoneyAmount::new(-1).is_err());
    }

    #[test]
    fn percent_is_exact_when_divisible() {
        assert_eq!(amt(59_000).percent_bps(1800), Some(amt(10_620)));
    }

    #[test]
    fn percent_rounds_half_away_from_zero() {
        // 18% of 0.25 = 0.045 → 0.05
        assert_eq!(amt(25).percent_bps(1800), Some(amt(5)));
        // 18% of 0.33 = 0.0594 → 0.06
        assert_eq!(amt(33).percent_bps(1800), Some(amt(6)));
        // 18% of 0.02 = 0.0036 → 0.00
        assert_eq!(amt(2).percent_bps(1800), Some(amt(0)));
    }

    #[test]
    fn display_in_major_units() {
        assert_eq!(amt(69_620).to_string(), "696.20");
        assert_eq!(amt(5).to_string(), "0.05");
        assert_eq!(amt(0).to_string(), "0.00");
    }

    #[test]
    fn serializes_as_major_unit_string() {
        assert_eq!(serde_json::to_value(amt(69_620)).unwrap(), serde_json::json!("696.20"));
        let back: MoneyAmount = serde_json::from_str("\"696.20\"").unwrap();
        assert_eq!(back, amt(69_620));
    }

    #[test]
    fn parse_major_units() {
        assert_eq!("696.2".parse::<MoneyAmount>().unwrap(), amt(69_620));
        assert_eq!("5".parse::<MoneyAmount>().unwrap(), amt(500));
        assert_eq!("0.05".parse::<MoneyAmount>().unwrap(), amt(5));
        for bad in ["", "-1.00", "1.234", "1.", ".5", "1e3", "abc"] {
            assert!(bad.parse::<MoneyAmount>().is_err(), "{bad}");
        }
    }

    #[test]
    fn currency_parse_is_case_insensitive() {
        assert_eq!(Currency::try_from("inr").unwrap(), Currency::Inr);
        assert!(Currency::try_from("XYZ").is_err());
    }
}
