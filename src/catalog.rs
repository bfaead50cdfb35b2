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

//! Destination catalog.
//!
//! The [`Catalog`] owns every [`Destination`] record. Prices and sales counts
//! change only through catalog methods; callers read through shared references
//! or snapshots.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use ticket_machine::{Catalog, Destination};
//!
//! let mut catalog = Catalog::new();
//! catalog.add(Destination::new("Manchester", dec!(25.00), dec!(40.00))).unwrap();
//!
//! let manchester = catalog.find("MANCHESTER").unwrap();
//! assert_eq!(manchester.single_price(), dec!(25.00));
//! assert_eq!(manchester.sales_count(), 0);
//! ```

use crate::TicketError;
use crate::base::{TicketType, is_whole_pence, names_match, round_currency};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

/// A station the machine sells tickets to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    name: String,
    single_price: Decimal,
    return_price: Decimal,
    sales_count: u64,
}

impl Destination {
    /// Creates an unsold destination. Validation happens when it is added to a
    /// [`Catalog`].
    pub fn new(name: impl Into<String>, single_price: Decimal, return_price: Decimal) -> Self {
        Self {
            name: name.into(),
            single_price,
            return_price,
            sales_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn single_price(&self) -> Decimal {
        self.single_price
    }

    pub fn return_price(&self) -> Decimal {
        self.return_price
    }

    pub fn sales_count(&self) -> u64 {
        self.sales_count
    }

    /// Base price for the given ticket type.
    pub fn price_for(&self, ticket_type: TicketType) -> Decimal {
        match ticket_type {
            TicketType::Single => self.single_price,
            TicketType::Return => self.return_price,
        }
    }
}

fn validate_prices(single_price: Decimal, return_price: Decimal) -> Result<(), TicketError> {
    if single_price <= Decimal::ZERO || return_price <= Decimal::ZERO {
        return Err(TicketError::InvalidPrice);
    }
    if !is_whole_pence(single_price) || !is_whole_pence(return_price) {
        return Err(TicketError::InvalidPrice);
    }
    if return_price < single_price {
        warn!(%single_price, %return_price, "return price is lower than single price");
    }
    Ok(())
}

/// Ordered collection of destinations with unique, case-insensitive names.
///
/// # Invariants
///
/// - No two destinations share a name under case-insensitive comparison.
/// - Every price is positive.
/// - Insertion order is preserved for reporting.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    destinations: Vec<Destination>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.destinations
            .iter()
            .position(|destination| names_match(&destination.name, name))
    }

    /// Adds a destination with a zero sales count.
    ///
    /// # Errors
    ///
    /// - [`TicketError::EmptyName`] - Name is blank.
    /// - [`TicketError::InvalidPrice`] - A price is zero, negative or finer than a penny.
    /// - [`TicketError::DuplicateName`] - Name already present (ignoring case).
    pub fn add(&mut self, destination: Destination) -> Result<(), TicketError> {
        let name = destination.name.trim().to_string();
        if name.is_empty() {
            return Err(TicketError::EmptyName);
        }
        validate_prices(destination.single_price, destination.return_price)?;
        if self.position(&name).is_some() {
            return Err(TicketError::DuplicateName(name));
        }

        let destination = Destination {
            name,
            sales_count: 0,
            ..destination
        };
        info!(
            station = %destination.name,
            single_price = %destination.single_price,
            return_price = %destination.return_price,
            "destination added"
        );
        self.destinations.push(destination);
        Ok(())
    }

    /// Case-insensitive exact lookup.
    pub fn find(&self, name: &str) -> Option<&Destination> {
        self.position(name).map(|index| &self.destinations[index])
    }

    /// Destinations in insertion order.
    pub fn list(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    /// Counts one sale against a destination. Prices are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::UnknownDestination`] if the name is not present.
    pub fn record_sale(&mut self, name: &str, amount: Decimal) -> Result<(), TicketError> {
        let index = self
            .position(name)
            .ok_or_else(|| TicketError::UnknownDestination(name.to_string()))?;
        let destination = &mut self.destinations[index];
        destination.sales_count += 1;
        debug!(
            station = %destination.name,
            %amount,
            sales = destination.sales_count,
            "sale recorded"
        );
        Ok(())
    }

    /// Multiplies every single and return price by `factor`.
    ///
    /// New prices are rounded to currency precision. Either every destination
    /// is updated or none is.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::InvalidFactor`] if `factor <= 0`, if a product
    /// overflows, or if any price would round down to zero.
    pub fn adjust_all(&mut self, factor: Decimal) -> Result<(), TicketError> {
        if factor <= Decimal::ZERO {
            return Err(TicketError::InvalidFactor(factor));
        }

        let scale = |price: Decimal| -> Result<Decimal, TicketError> {
            let scaled = price
                .checked_mul(factor)
                .map(round_currency)
                .ok_or(TicketError::InvalidFactor(factor))?;
            if scaled <= Decimal::ZERO {
                return Err(TicketError::InvalidFactor(factor));
            }
            Ok(scaled)
        };

        // Compute everything before touching any record.
        let adjusted = self
            .destinations
            .iter()
            .map(|destination| {
                Ok((
                    scale(destination.single_price)?,
                    scale(destination.return_price)?,
                ))
            })
            .collect::<Result<Vec<_>, TicketError>>()?;

        for (destination, (single_price, return_price)) in
            self.destinations.iter_mut().zip(adjusted)
        {
            destination.single_price = single_price;
            destination.return_price = return_price;
        }
        info!(%factor, destinations = self.destinations.len(), "prices adjusted");
        Ok(())
    }

    /// Replaces both prices of one destination.
    ///
    /// # Errors
    ///
    /// - [`TicketError::InvalidPrice`] - A price is zero, negative or finer than a penny.
    /// - [`TicketError::UnknownDestination`] - Name is not present.
    pub fn update_prices(
        &mut self,
        name: &str,
        single_price: Decimal,
        return_price: Decimal,
    ) -> Result<(), TicketError> {
        validate_prices(single_price, return_price)?;
        let index = self
            .position(name)
            .ok_or_else(|| TicketError::UnknownDestination(name.to_string()))?;
        let destination = &mut self.destinations[index];
        destination.single_price = single_price;
        destination.return_price = return_price;
        info!(
            station = %destination.name,
            %single_price,
            %return_price,
            "prices updated"
        );
        Ok(())
    }

    /// Renames a destination, keeping its prices and sales count.
    ///
    /// Changing only the case of a name is allowed.
    ///
    /// # Errors
    ///
    /// - [`TicketError::EmptyName`] - New name is blank.
    /// - [`TicketError::UnknownDestination`] - `old_name` is not present.
    /// - [`TicketError::DuplicateName`] - Another destination already uses `new_name`.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<(), TicketError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(TicketError::EmptyName);
        }
        let index = self
            .position(old_name)
            .ok_or_else(|| TicketError::UnknownDestination(old_name.to_string()))?;
        if let Some(other) = self.position(new_name)
            && other != index
        {
            return Err(TicketError::DuplicateName(new_name.to_string()));
        }

        let destination = &mut self.destinations[index];
        info!(from = %destination.name, to = %new_name, "destination renamed");
        destination.name = new_name.to_string();
        Ok(())
    }

    /// Removes a destination and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::UnknownDestination`] if the name is not present.
    pub fn remove(&mut self, name: &str) -> Result<Destination, TicketError> {
        let index = self
            .position(name)
            .ok_or_else(|| TicketError::UnknownDestination(name.to_string()))?;
        let removed = self.destinations.remove(index);
        info!(station = %removed.name, "destination removed");
        Ok(removed)
    }
}
