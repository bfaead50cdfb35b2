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

//! Issued tickets.

use crate::base::{CURRENCY_PRECISION, TicketType};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// A ticket issued by a committed sale. Never modified after issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    pub origin: String,
    pub destination: String,
    pub ticket_type: TicketType,
    pub price: Decimal,
    pub purchase_date: NaiveDate,
}

/// Prints the ticket the way the machine does.
///
/// ```text
/// ***
/// Birmingham Central
/// to
/// Manchester
/// Price: 20.00 [Single]
/// ***
/// ```
impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "***")?;
        writeln!(f, "{}", self.origin)?;
        writeln!(f, "to")?;
        writeln!(f, "{}", self.destination)?;
        writeln!(
            f,
            "Price: {:.prec$} [{}]",
            self.price,
            self.ticket_type,
            prec = CURRENCY_PRECISION as usize
        )?;
        write!(f, "***")
    }
}

/// Result of a successful purchase: the ticket and the change owed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Purchase {
    pub ticket: Ticket,
    pub change: Decimal,
}
