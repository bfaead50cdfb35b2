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

//! Price quotes.
//!
//! A quote fixes the amount due at the moment it is computed. Offers added or
//! prices changed afterwards do not alter a quote already handed out.

use crate::base::{TicketType, round_currency};
use crate::catalog::Destination;
use crate::offer::{OfferBook, SpecialOffer};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Amount due for one ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub destination: String,
    pub ticket_type: TicketType,
    pub date: NaiveDate,
    pub base_price: Decimal,
    pub final_price: Decimal,
    pub applied_offer: Option<SpecialOffer>,
}

impl Quote {
    /// Amount taken off the base price.
    pub fn discount(&self) -> Decimal {
        self.base_price - self.final_price
    }
}

/// Applies a percentage discount: `price * (1 - discount / 100)`, rounded half-up.
pub fn apply_discount(price: Decimal, discount_percent: Decimal) -> Decimal {
    let factor = Decimal::ONE - discount_percent / Decimal::ONE_HUNDRED;
    round_currency(price * factor)
}

/// Prices a ticket to `destination` on `date`, applying at most one offer.
pub fn quote(
    destination: &Destination,
    ticket_type: TicketType,
    date: NaiveDate,
    offers: &OfferBook,
) -> Quote {
    let base_price = round_currency(destination.price_for(ticket_type));
    let applied_offer = offers.resolve(destination.name(), date);
    let final_price = match applied_offer {
        Some(offer) => apply_discount(base_price, offer.discount_percent()),
        None => base_price,
    };

    Quote {
        destination: destination.name().to_string(),
        ticket_type,
        date,
        base_price,
        final_price,
        applied_offer: applied_offer.cloned(),
    }
}
