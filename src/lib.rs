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

//! # Ticket Machine
//!
//! This library provides the purchase engine of a self-service ticket machine:
//! a destination catalog, time-bounded special offers, price quotes, a
//! pay-before-issue transaction flow with change, and per-station revenue.
//!
//! ## Core Components
//!
//! - [`TicketMachine`]: Owns catalog, ledger and offers for one vending point
//! - [`Catalog`]: Destinations with single and return prices and sales counts
//! - [`OfferBook`]: Special offers and the best-offer resolver
//! - [`Quote`]: Base and final price for a ticket on a date
//! - [`Transaction`]: Money collection state machine for one purchase
//! - [`RevenueLedger`]: Per-station takings and their total
//! - [`TicketError`]: Error types for every failed operation
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use ticket_machine::{
//!     Destination, OfferId, SpecialOffer, TicketMachine, TicketType, Transaction,
//! };
//!
//! let machine = TicketMachine::new();
//! machine.add_destination(Destination::new("Manchester", dec!(25.00), dec!(40.00))).unwrap();
//!
//! let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
//! let offer = SpecialOffer::new(OfferId(1), "Manchester", dec!(20), today, today, "Spring sale")
//!     .unwrap();
//! machine.add_offer(offer);
//!
//! let quote = machine.quote("Manchester", TicketType::Single, today).unwrap();
//! assert_eq!(quote.final_price, dec!(20.00));
//!
//! let mut transaction = Transaction::new();
//! transaction.begin(quote.final_price).unwrap();
//! transaction.insert(dec!(10.00)).unwrap();
//! transaction.insert(dec!(10.00)).unwrap();
//!
//! let purchase = transaction
//!     .commit(&machine, "Manchester", TicketType::Single, today)
//!     .unwrap();
//! assert_eq!(purchase.change, dec!(0.00));
//! assert_eq!(machine.takings_for("Manchester"), dec!(20.00));
//! ```
//!
//! ## Thread Safety
//!
//! The machine takes one lock over catalog and ledger for every sale, so the
//! two are always consistent even if several threads share it.

mod base;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
mod machine;
pub mod offer;
pub mod pricing;
mod ticket;
mod transaction;

pub use base::{
    CURRENCY_PRECISION, OfferId, TicketType, is_whole_pence, names_match, round_currency,
};
pub use catalog::{Catalog, Destination};
pub use config::MachineConfig;
pub use error::TicketError;
pub use ledger::{RankedStation, RevenueLedger, StationTakings};
pub use machine::{MachineSummary, TicketMachine};
pub use offer::{OfferBook, SpecialOffer, best_offer};
pub use pricing::{Quote, apply_discount, quote};
pub use ticket::{Purchase, Ticket};
pub use transaction::{Transaction, TransactionState};
