//! Exchange prefix resolution for mainland A-share codes.

use std::fmt;

/// Listing exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Market {
    /// Shanghai.
    Sh,
    /// Shenzhen.
    Sz,
    /// Beijing.
    Bj,
}

impl Market {
    /// Lower-case prefix used by Sina.
    pub fn prefix(self) -> &'static str {
        match self {
            Market::Sh => "sh",
            Market::Sz => "sz",
            Market::Bj => "bj",
        }
    }
}

/// A code qualified with its exchange, rendered as e.g. `sz002405`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SinaSymbol {
    pub market: Market,
    pub code: String,
}

impl SinaSymbol {
    /// Resolve a user-supplied code such as `002405`, `SZ002405` or `600000.SH`.
    pub fn from_code(code: &str) -> Self {
        let code = code
            .to_uppercase()
            .replace("SH", "")
            .replace("SZ", "")
            .replace('.', "");

        let market = match code.chars().next() {
            Some('6') => Market::Sh,
            Some('0') | Some('3') => Market::Sz,
            Some('8') | Some('4') => Market::Bj,
            _ => Market::Sh,
        };

        Self { market, code }
    }

    /// Eastmoney `secid` (`1.` for Shanghai, `0.` otherwise).
    pub fn eastmoney_secid(&self) -> String {
        let id = match self.market {
            Market::Sh => 1,
            Market::Sz | Market::Bj => 0,
        };
        format!("{id}.{}", self.code)
    }
}

impl fmt::Display for SinaSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.market.prefix(), self.code)
    }
}
