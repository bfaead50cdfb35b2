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

//! Ticket machine.
//!
//! The [`TicketMachine`] owns the catalog, the revenue ledger and the special
//! offers of one vending point. Purchases are driven through a
//! [`Transaction`](crate::Transaction), which calls back into
//! [`TicketMachine::record_sale`] when it commits.
//!
//! # Thread Safety
//!
//! The catalog and ledger live behind a single [`Mutex`], so a sale's count
//! increment and its ledger credit are never observed apart. Offers sit behind
//! their own [`RwLock`]. Where both are needed the books lock is taken first.

use crate::base::{TicketType, is_whole_pence, round_currency};
use crate::catalog::{Catalog, Destination};
use crate::config::{DEFAULT_ORIGIN, MachineConfig, default_destinations};
use crate::ledger::{RankedStation, RevenueLedger};
use crate::offer::{OfferBook, SpecialOffer};
use crate::pricing::{self, Quote};
use crate::{OfferId, TicketError};
use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

/// Catalog and ledger, mutated together.
#[derive(Debug, Default)]
struct Books {
    catalog: Catalog,
    ledger: RevenueLedger,
}

impl Books {
    fn assert_invariants(&self) {
        debug_assert!(
            self.ledger.total() >= Decimal::ZERO,
            "Invariant violated: ledger total went negative: {}",
            self.ledger.total()
        );
    }

    /// Counts a sale and credits the ledger, or does neither.
    ///
    /// A free ticket is counted but never reaches the ledger. Returns the
    /// catalog's spelling of the station name.
    fn record_sale(&mut self, station: &str, amount: Decimal) -> Result<String, TicketError> {
        if amount < Decimal::ZERO || !is_whole_pence(amount) {
            return Err(TicketError::InvalidAmount);
        }
        let name = self
            .catalog
            .find(station)
            .map(|destination| destination.name().to_string())
            .ok_or_else(|| TicketError::UnknownDestination(station.to_string()))?;

        // The credit is the only step that can still fail.
        if amount > Decimal::ZERO {
            self.ledger.credit(&name, amount)?;
        }
        self.catalog.record_sale(&name, amount)?;
        self.assert_invariants();
        Ok(name)
    }
}

/// Totals shown on the admin summary screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineSummary {
    pub destinations: usize,
    pub total_sales: u64,
    pub total_revenue: Decimal,
    pub average_single_price: Decimal,
    pub average_return_price: Decimal,
    /// Destination with the most sales, if anything was sold.
    pub most_popular: Option<String>,
}

/// A single self-service vending point.
///
/// # Invariants
///
/// - A destination's sales count equals the number of sales recorded for it.
/// - The ledger total equals the sum of every station's takings.
/// - Destination records are only changed through machine methods; readers
///   receive clones.
#[derive(Debug)]
pub struct TicketMachine {
    origin: String,
    books: Mutex<Books>,
    offers: RwLock<OfferBook>,
}

impl TicketMachine {
    /// Creates a machine at the default origin with an empty catalog.
    pub fn new() -> Self {
        Self::with_origin(DEFAULT_ORIGIN)
    }

    /// Creates a machine at `origin` with an empty catalog.
    pub fn with_origin(origin: impl Into<String>) -> Self {
        TicketMachine {
            origin: origin.into(),
            books: Mutex::new(Books::default()),
            offers: RwLock::new(OfferBook::new()),
        }
    }

    /// Creates a machine from configuration, seeding the factory destinations
    /// when asked to.
    pub fn from_config(config: &MachineConfig) -> Result<Self, TicketError> {
        let machine = Self::with_origin(config.origin_station.clone());
        if config.seed_default_destinations {
            for destination in default_destinations() {
                machine.add_destination(destination)?;
            }
        }
        info!(
            origin = %machine.origin,
            destinations = machine.books.lock().catalog.len(),
            "ticket machine ready"
        );
        Ok(machine)
    }

    /// Station printed as the origin on every ticket.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    // === Catalog ===

    pub fn add_destination(&self, destination: Destination) -> Result<(), TicketError> {
        self.books.lock().catalog.add(destination)
    }

    /// Snapshot of one destination.
    pub fn find_destination(&self, name: &str) -> Option<Destination> {
        self.books.lock().catalog.find(name).cloned()
    }

    /// Snapshot of every destination in catalog order.
    pub fn destinations(&self) -> Vec<Destination> {
        self.books.lock().catalog.list().to_vec()
    }

    pub fn adjust_all_prices(&self, factor: Decimal) -> Result<(), TicketError> {
        self.books.lock().catalog.adjust_all(factor)
    }

    pub fn update_prices(
        &self,
        name: &str,
        single_price: Decimal,
        return_price: Decimal,
    ) -> Result<(), TicketError> {
        self.books
            .lock()
            .catalog
            .update_prices(name, single_price, return_price)
    }

    /// Renames a destination; its takings follow it to the new name.
    pub fn rename_destination(&self, old_name: &str, new_name: &str) -> Result<(), TicketError> {
        let mut books = self.books.lock();
        books.catalog.rename(old_name, new_name)?;
        books.ledger.rename(old_name, new_name.trim());
        Ok(())
    }

    /// Removes a destination. Its past takings stay in the ledger total but
    /// are no longer reported under its name.
    pub fn remove_destination(&self, name: &str) -> Result<Destination, TicketError> {
        let mut books = self.books.lock();
        let removed = books.catalog.remove(name)?;
        let retired = books.ledger.retire(removed.name());
        debug!(station = %removed.name(), %retired, "takings retired");
        Ok(removed)
    }

    // === Offers ===

    pub fn add_offer(&self, offer: SpecialOffer) {
        self.offers.write().add_offer(offer);
    }

    pub fn offers(&self) -> Vec<SpecialOffer> {
        self.offers.read().offers().to_vec()
    }

    pub fn next_offer_id(&self) -> OfferId {
        self.offers.read().next_id()
    }

    pub fn resolve_offer(&self, station: &str, date: NaiveDate) -> Option<SpecialOffer> {
        self.offers.read().resolve(station, date).cloned()
    }

    // === Pricing and sales ===

    /// Prices a ticket for a catalog destination on `date`.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::UnknownDestination`] if the name is not in the catalog.
    pub fn quote(
        &self,
        destination: &str,
        ticket_type: TicketType,
        date: NaiveDate,
    ) -> Result<Quote, TicketError> {
        let books = self.books.lock();
        let destination = books
            .catalog
            .find(destination)
            .ok_or_else(|| TicketError::UnknownDestination(destination.to_string()))?;
        let quote = pricing::quote(destination, ticket_type, date, &self.offers.read());
        debug!(
            station = %quote.destination,
            ticket_type = %quote.ticket_type,
            base = %quote.base_price,
            price = %quote.final_price,
            offer = ?quote.applied_offer.as_ref().map(SpecialOffer::id),
            "quoted"
        );
        Ok(quote)
    }

    /// Counts a sale and credits the ledger as one step.
    ///
    /// On error neither the catalog nor the ledger has changed. A zero amount counts the sale without crediting the ledger.
    ///
    /// # Errors
    ///
    /// - [`TicketError::InvalidAmount`] - `amount < 0`, finer than a penny, or
    ///   the takings would overflow.
    /// - [`TicketError::UnknownDestination`] - Name is not in the catalog.
    pub fn record_sale(&self, station: &str, amount: Decimal) -> Result<String, TicketError> {
        self.books.lock().record_sale(station, amount)
    }

    // === Revenue ===

    pub fn takings_for(&self, station: &str) -> Decimal {
        self.books.lock().ledger.takings_for(station)
    }

    pub fn total_takings(&self) -> Decimal {
        self.books.lock().ledger.total()
    }

    /// Takings of destinations that have since been removed.
    pub fn retired_takings(&self) -> Decimal {
        self.books.lock().ledger.retired_takings()
    }

    /// The `n` catalog destinations with the highest takings.
    pub fn top_destinations(&self, n: usize) -> Vec<RankedStation> {
        let books = self.books.lock();
        books.ledger.top_n(n, &books.catalog)
    }

    pub fn summary(&self) -> MachineSummary {
        let books = self.books.lock();
        let destinations = books.catalog.list();

        let average = |price: fn(&Destination) -> Decimal| {
            if destinations.is_empty() {
                Decimal::ZERO
            } else {
                let sum: Decimal = destinations.iter().map(price).sum();
                round_currency(sum / Decimal::from(destinations.len()))
            }
        };

        // First destination wins ties.
        let most_popular = destinations
            .iter()
            .filter(|destination| destination.sales_count() > 0)
            .fold(None::<&Destination>, |best, destination| match best {
                Some(best) if best.sales_count() >= destination.sales_count() => Some(best),
                _ => Some(destination),
            })
            .map(|destination| destination.name().to_string());

        MachineSummary {
            destinations: destinations.len(),
            total_sales: destinations.iter().map(Destination::sales_count).sum(),
            total_revenue: books.ledger.total(),
            average_single_price: average(Destination::single_price),
            average_return_price: average(Destination::return_price),
            most_popular,
        }
    }
}

impl Default for TicketMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn books_record_sale_validates_before_mutating() {
        let mut books = Books::default();
        books
            .catalog
            .add(Destination::new("York", dec!(10.00), dec!(18.00)))
            .unwrap();

        assert_eq!(
            books.record_sale("York", dec!(-1)),
            Err(TicketError::InvalidAmount)
        );
        assert_eq!(
            books.record_sale("York", dec!(0.001)),
            Err(TicketError::InvalidAmount)
        );
        assert_eq!(
            books.record_sale("Whitby", dec!(10.00)),
            Err(TicketError::UnknownDestination("Whitby".into()))
        );
        assert_eq!(books.catalog.find("York").unwrap().sales_count(), 0);
        assert_eq!(books.ledger.total(), Decimal::ZERO);
    }

    #[test]
    fn books_record_sale_uses_catalog_spelling() {
        let mut books = Books::default();
        books
            .catalog
            .add(Destination::new("York", dec!(10.00), dec!(18.00)))
            .unwrap();

        let name = books.record_sale("YORK", dec!(10.00)).unwrap();
        assert_eq!(name, "York");
        assert_eq!(books.ledger.stations()[0].station, "York");
        assert_eq!(books.catalog.find("york").unwrap().sales_count(), 1);
    }

    #[test]
    fn summary_of_empty_machine() {
        let summary = TicketMachine::new().summary();
        assert_eq!(summary.destinations, 0);
        assert_eq!(summary.total_sales, 0);
        assert_eq!(summary.average_single_price, Decimal::ZERO);
        assert_eq!(summary.most_popular, None);
    }

    #[test]
    fn books_record_free_sale_counts_without_credit() {
        let mut books = Books::default();
        books
            .catalog
            .add(Destination::new("York", dec!(10.00), dec!(18.00)))
            .unwrap();

        assert_eq!(books.record_sale("york", Decimal::ZERO), Ok("York".into()));
        assert_eq!(books.catalog.find("York").unwrap().sales_count(), 1);
        assert!(books.ledger.stations().is_empty());
    }

    #[test]
    fn books_record_sale_overflow_counts_nothing() {
        let mut books = Books::default();
        books
            .catalog
            .add(Destination::new("York", dec!(10.00), dec!(18.00)))
            .unwrap();
        books.record_sale("York", Decimal::MAX).unwrap();

        assert_eq!(
            books.record_sale("York", dec!(10.00)),
            Err(TicketError::InvalidAmount)
        );
        assert_eq!(books.catalog.find("York").unwrap().sales_count(), 1);
        assert_eq!(books.ledger.total(), Decimal::MAX);
    }
}
