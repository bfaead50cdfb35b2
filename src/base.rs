// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Core value types shared by every component: ticket types, offer identifiers,
//! station name comparison and currency rounding.

use crate::TicketError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of decimal places used for every externally visible amount.
pub const CURRENCY_PRECISION: u32 = 2;

/// Rounds an amount to currency precision using half-up rounding.
///
/// `Decimal::round_dp` uses banker's rounding, which is not what a price
/// display expects (`12.345` must become `12.35`).
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

/// True if `amount` needs no more than [`CURRENCY_PRECISION`] decimal places.
///
/// `10.50` and `10.500` qualify, `10.005` does not.
pub fn is_whole_pence(amount: Decimal) -> bool {
    amount.round_dp(CURRENCY_PRECISION) == amount
}

/// Case-insensitive station name comparison.
///
/// Compares lowercase character streams so no temporary `String` is built.
pub fn names_match(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Identifier of a special offer.
///
/// Lower ids win ties when two offers carry the same discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct OfferId(pub u32);

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of ticket sold by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    Single,
    Return,
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("Single"),
            Self::Return => f.write_str("Return"),
        }
    }
}

impl FromStr for TicketType {
    type Err = TicketError;

    /// Parses a type tag such as `single` or `RETURN`.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let tag = tag.trim();
        if tag.eq_ignore_ascii_case("single") {
            Ok(Self::Single)
        } else if tag.eq_ignore_ascii_case("return") {
            Ok(Self::Return)
        } else {
            Err(TicketError::InvalidTicketType(tag.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn round_currency_rounds_half_up() {
        assert_eq!(round_currency(dec!(12.345)), dec!(12.35));
        assert_eq!(round_currency(dec!(12.344)), dec!(12.34));
        assert_eq!(round_currency(dec!(0.125)), dec!(0.13));
        assert_eq!(round_currency(dec!(20)), dec!(20));
    }

    #[test]
    fn whole_pence() {
        assert!(is_whole_pence(dec!(10)));
        assert!(is_whole_pence(dec!(10.5)));
        assert!(is_whole_pence(dec!(10.500)));
        assert!(!is_whole_pence(dec!(10.005)));
        assert!(!is_whole_pence(dec!(0.001)));
    }

    #[test]
    fn names_match_ignores_case() {
        assert!(names_match("London", "LONDON"));
        assert!(names_match("london", "London"));
        assert!(!names_match("London", "Londo"));
        assert!(!names_match("London", "London "));
        assert!(names_match("", ""));
    }

    #[test]
    fn ticket_type_parses_tags() {
        assert_eq!("single".parse::<TicketType>(), Ok(TicketType::Single));
        assert_eq!(" RETURN ".parse::<TicketType>(), Ok(TicketType::Return));
        assert_eq!(
            "day-rover".parse::<TicketType>(),
            Err(TicketError::InvalidTicketType("day-rover".to_string()))
        );
    }

    #[test]
    fn ticket_type_display() {
        assert_eq!(TicketType::Single.to_string(), "Single");
        assert_eq!(TicketType::Return.to_string(), "Return");
    }
}
