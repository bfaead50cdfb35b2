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

//! Time-bounded special offers and their resolution.
//!
//! Offers may overlap freely. Which one applies is decided when a price is
//! resolved: the highest discount active on the date wins, lowest id breaks ties.

use crate::TicketError;
use crate::base::{OfferId, names_match};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::info;

/// A percentage discount on one station, valid for an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecialOffer {
    id: OfferId,
    station_name: String,
    discount_percent: Decimal,
    start_date: NaiveDate,
    end_date: NaiveDate,
    description: String,
}

impl SpecialOffer {
    /// Creates an offer.
    ///
    /// # Errors
    ///
    /// - [`TicketError::InvalidDiscount`] - Discount is not in `(0, 100]`.
    /// - [`TicketError::InvalidOfferPeriod`] - `end_date` is before `start_date`.
    pub fn new(
        id: OfferId,
        station_name: impl Into<String>,
        discount_percent: Decimal,
        start_date: NaiveDate,
        end_date: NaiveDate,
        description: impl Into<String>,
    ) -> Result<Self, TicketError> {
        if discount_percent <= Decimal::ZERO || discount_percent > Decimal::ONE_HUNDRED {
            return Err(TicketError::InvalidDiscount(discount_percent));
        }
        if end_date < start_date {
            return Err(TicketError::InvalidOfferPeriod);
        }
        Ok(Self {
            id,
            station_name: station_name.into(),
            discount_percent,
            start_date,
            end_date,
            description: description.into(),
        })
    }

    pub fn id(&self) -> OfferId {
        self.id
    }

    pub fn station_name(&self) -> &str {
        &self.station_name
    }

    pub fn discount_percent(&self) -> Decimal {
        self.discount_percent
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether `on` falls within the offer's inclusive range.
    pub fn is_active_on(&self, on: NaiveDate) -> bool {
        self.start_date <= on && on <= self.end_date
    }

    pub fn applies_to(&self, station_name: &str) -> bool {
        names_match(&self.station_name, station_name)
    }
}

/// Higher discount first, then lower id.
fn preference(a: &SpecialOffer, b: &SpecialOffer) -> Ordering {
    b.discount_percent
        .cmp(&a.discount_percent)
        .then_with(|| a.id.cmp(&b.id))
}

/// Picks the offer that applies to `station_name` on `on`, if any.
pub fn best_offer<'a>(
    offers: &'a [SpecialOffer],
    station_name: &str,
    on: NaiveDate,
) -> Option<&'a SpecialOffer> {
    offers
        .iter()
        .filter(|offer| offer.applies_to(station_name) && offer.is_active_on(on))
        .min_by(|a, b| preference(a, b))
}

/// All known offers, in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct OfferBook {
    offers: Vec<SpecialOffer>,
}

impl OfferBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an offer. Overlaps with existing offers are allowed.
    pub fn add_offer(&mut self, offer: SpecialOffer) {
        info!(
            id = %offer.id,
            station = %offer.station_name,
            discount = %offer.discount_percent,
            start = %offer.start_date,
            end = %offer.end_date,
            "special offer added"
        );
        self.offers.push(offer);
    }

    pub fn offers(&self) -> &[SpecialOffer] {
        &self.offers
    }

    /// First id greater than every id already in the book.
    pub fn next_id(&self) -> OfferId {
        let highest = self.offers.iter().map(|offer| offer.id.0).max();
        OfferId(highest.map_or(1, |id| id + 1))
    }

    /// Best offer for a station on a date; see [`best_offer`].
    pub fn resolve(&self, station_name: &str, on: NaiveDate) -> Option<&SpecialOffer> {
        best_offer(&self.offers, station_name, on)
    }
}
