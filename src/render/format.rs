//! Row label formatting

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::orderbook::{format_fixed, GroupedLevel};

/// Unit used for the size and total columns
///
/// Only labels change with the unit; bars always scale by asset depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayUnit {
    #[default]
    Asset,
    Fiat,
}

/// How the three label columns of a row are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelFormat {
    /// Fraction digits of the active grouping tick
    pub price_decimals: u32,
    /// Fraction digits of the market's size step
    pub size_decimals: u32,
    pub display_unit: DisplayUnit,
}

impl LabelFormat {
    pub fn price(&self, row: &GroupedLevel) -> String {
        group_thousands(&format_fixed(row.price, self.price_decimals))
    }

    pub fn size(&self, row: &GroupedLevel) -> String {
        self.amount(row.size, row.size_cost)
    }

    pub fn total(&self, row: &GroupedLevel) -> String {
        self.amount(row.cumulative_size, row.cumulative_cost)
    }

    fn amount(&self, asset: Decimal, fiat: Decimal) -> String {
        match self.display_unit {
            DisplayUnit::Asset => group_thousands(&format_fixed(asset, self.size_decimals)),
            DisplayUnit::Fiat => group_thousands(&format_fixed(fiat, 0)),
        }
    }
}

/// Insert `,` between thousands of the integer part
pub fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(number.len() + int_part.len() / 3);
    grouped.push_str(sign);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}
