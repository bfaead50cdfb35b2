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

//! Per-station revenue bookkeeping.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use ticket_machine::RevenueLedger;
//!
//! let mut ledger = RevenueLedger::new();
//! ledger.credit("London", dec!(45.50)).unwrap();
//! ledger.credit("london", dec!(20.00)).unwrap();
//!
//! assert_eq!(ledger.takings_for("LONDON"), dec!(65.50));
//! assert_eq!(ledger.total(), dec!(65.50));
//! ```

use crate::TicketError;
use crate::base::{is_whole_pence, names_match, round_currency};
use crate::catalog::Catalog;
use rust_decimal::Decimal;
use serde::Serialize;

/// Cumulative takings for one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationTakings {
    pub station: String,
    pub takings: Decimal,
}

/// A destination's position in a revenue ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedStation {
    pub station: String,
    pub takings: Decimal,
    /// Share of the ledger total, in percent (2 dp).
    pub share_percent: Decimal,
}

/// Station takings plus a running total.
///
/// # Invariants
///
/// - Each station's takings only grow.
/// - `total` always equals the sum of every entry plus retired takings.
#[derive(Debug, Clone, Default)]
pub struct RevenueLedger {
    entries: Vec<StationTakings>,
    /// Takings of stations that left the catalog.
    retired: Decimal,
    total: Decimal,
}

impl RevenueLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_mut(&mut self, station: &str) -> Option<&mut StationTakings> {
        self.entries
            .iter_mut()
            .find(|entry| names_match(&entry.station, station))
    }

    fn assert_invariants(&self) {
        debug_assert_eq!(
            self.total,
            self.retired + self.entries.iter().map(|entry| entry.takings).sum::<Decimal>(),
            "Invariant violated: ledger total drifted from station sum"
        );
    }

    /// Adds `amount` to a station's takings, creating the entry on first use.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::InvalidAmount`] if `amount <= 0`, if it is finer
    /// than a penny, or if the takings would overflow. The ledger is unchanged.
    pub fn credit(&mut self, station: &str, amount: Decimal) -> Result<(), TicketError> {
        if amount <= Decimal::ZERO || !is_whole_pence(amount) {
            return Err(TicketError::InvalidAmount);
        }
        // The total bounds every entry, so a checked total covers both sums.
        let total = self
            .total
            .checked_add(amount)
            .ok_or(TicketError::InvalidAmount)?;
        match self.entry_mut(station) {
            Some(entry) => entry.takings += amount,
            None => self.entries.push(StationTakings {
                station: station.to_string(),
                takings: amount,
            }),
        }
        self.total = total;
        self.assert_invariants();
        Ok(())
    }

    /// Takings for a station; zero if it was never credited.
    pub fn takings_for(&self, station: &str) -> Decimal {
        self.entries
            .iter()
            .find(|entry| names_match(&entry.station, station))
            .map_or(Decimal::ZERO, |entry| entry.takings)
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Takings of stations retired with [`RevenueLedger::retire`]. They still
    /// count towards [`RevenueLedger::total`].
    pub fn retired_takings(&self) -> Decimal {
        self.retired
    }

    /// Every credited station, in order of first credit.
    pub fn stations(&self) -> &[StationTakings] {
        &self.entries
    }

    /// Detaches a station's takings from its name when it leaves the catalog.
    ///
    /// The amount stays in the total, but a station later added under the same
    /// name starts from zero.
    pub(crate) fn retire(&mut self, station: &str) -> Decimal {
        let Some(index) = self
            .entries
            .iter()
            .position(|entry| names_match(&entry.station, station))
        else {
            return Decimal::ZERO;
        };
        let retired = self.entries.remove(index);
        self.retired += retired.takings;
        self.assert_invariants();
        retired.takings
    }

    /// Moves a station's takings under a new name, merging into any entry
    /// already held for that name.
    pub(crate) fn rename(&mut self, old_name: &str, new_name: &str) {
        let Some(old) = self
            .entries
            .iter()
            .position(|entry| names_match(&entry.station, old_name))
        else {
            return;
        };
        let target = self
            .entries
            .iter()
            .position(|entry| names_match(&entry.station, new_name));

        match target {
            Some(target) if target != old => {
                let moved = self.entries.remove(old);
                let target = if target > old { target - 1 } else { target };
                self.entries[target].takings += moved.takings;
                self.entries[target].station = new_name.to_string();
            }
            _ => self.entries[old].station = new_name.to_string(),
        }
        self.assert_invariants();
    }

    /// Catalog destinations ranked by descending takings.
    ///
    /// Destinations with equal takings keep their catalog order.
    pub fn top_n(&self, n: usize, catalog: &Catalog) -> Vec<RankedStation> {
        let mut ranked: Vec<RankedStation> = catalog
            .list()
            .iter()
            .map(|destination| {
                let takings = self.takings_for(destination.name());
                let share_percent = if self.total.is_zero() {
                    Decimal::ZERO
                } else {
                    round_currency(takings / self.total * Decimal::ONE_HUNDRED)
                };
                RankedStation {
                    station: destination.name().to_string(),
                    takings,
                    share_percent,
                }
            })
            .collect();
        // Stable sort keeps catalog order for ties.
        ranked.sort_by(|a, b| b.takings.cmp(&a.takings));
        ranked.truncate(n);
        ranked
    }
}
