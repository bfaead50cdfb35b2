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

//! Error types for catalog, pricing and purchase operations.

use rust_decimal::Decimal;
use thiserror::Error;

/// Ticket machine errors.
///
/// Every variant is a local validation failure. No operation mutates state
/// before returning one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TicketError {
    /// A destination with the same name (ignoring case) already exists
    #[error("destination '{0}' already exists")]
    DuplicateName(String),

    /// Station name is empty or blank
    #[error("station name cannot be empty")]
    EmptyName,

    /// No destination with this name in the catalog
    #[error("unknown destination '{0}'")]
    UnknownDestination(String),

    /// Bulk adjustment factor is zero, negative, or would zero out a price
    #[error("invalid price adjustment factor {0}")]
    InvalidFactor(Decimal),

    /// Ticket type tag is not recognised
    #[error("invalid ticket type '{0}'")]
    InvalidTicketType(String),

    /// Price is zero or negative
    #[error("invalid price (must be positive)")]
    InvalidPrice,

    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Inserted money does not cover the price
    #[error("insufficient funds: {balance} inserted, {required} required")]
    InsufficientFunds { required: Decimal, balance: Decimal },

    /// Discount is outside (0, 100]
    #[error("invalid discount {0}% (must be above 0 and at most 100)")]
    InvalidDiscount(Decimal),

    /// Offer ends before it starts
    #[error("offer period ends before it starts")]
    InvalidOfferPeriod,

    /// Operation is not allowed in the transaction's current state
    #[error("operation not allowed while transaction is {0}")]
    InvalidState(&'static str),
}
