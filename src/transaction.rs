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

//! Purchase transactions.
//!
//! A transaction collects money for one ticket and follows a state machine:
//!
//! ```text
//!  Idle ──begin──► Collecting ──commit──► Committed
//!                   │  ▲   │
//!                   └──┘   └──cancel──► (consumed, balance returned)
//!                  insert
//! ```
//!
//! Inserting less than the price is normal: the caller keeps calling
//! [`Transaction::insert`] until [`Transaction::ready_to_commit`] is true, or
//! gives up with [`Transaction::cancel`].
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use ticket_machine::{Destination, TicketMachine, TicketType, Transaction};
//!
//! let machine = TicketMachine::new();
//! machine.add_destination(Destination::new("Manchester", dec!(25.00), dec!(40.00))).unwrap();
//!
//! let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
//! let quote = machine.quote("Manchester", TicketType::Return, today).unwrap();
//!
//! let mut transaction = Transaction::new();
//! transaction.begin(quote.final_price).unwrap();
//! transaction.insert(dec!(30.00)).unwrap();
//! assert!(!transaction.ready_to_commit());
//! transaction.insert(dec!(20.00)).unwrap();
//!
//! let purchase = transaction
//!     .commit(&machine, "Manchester", TicketType::Return, today)
//!     .unwrap();
//! assert_eq!(purchase.change, dec!(10.00));
//! assert_eq!(machine.takings_for("Manchester"), dec!(40.00));
//! ```

use crate::TicketError;
use crate::base::{TicketType, is_whole_pence};
use crate::machine::TicketMachine;
use crate::ticket::{Purchase, Ticket};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    Collecting,
    Committed,
}

impl TransactionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Collecting => "collecting",
            Self::Committed => "committed",
        }
    }
}

/// Payment collection for a single ticket.
///
/// A transaction is never reused: cancelling consumes it and committing
/// leaves it in the terminal [`TransactionState::Committed`] state.
#[derive(Debug, Clone)]
pub struct Transaction {
    state: TransactionState,
    target_price: Decimal,
    balance: Decimal,
}

impl Transaction {
    pub fn new() -> Self {
        Self {
            state: TransactionState::Idle,
            target_price: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Money held by the machine for this transaction. After a commit this is
    /// the change that was handed back.
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn target_price(&self) -> Decimal {
        self.target_price
    }

    /// Amount still needed before the ticket can be issued.
    pub fn remaining(&self) -> Decimal {
        (self.target_price - self.balance).max(Decimal::ZERO)
    }

    fn expect_state(&self, expected: TransactionState) -> Result<(), TicketError> {
        if self.state != expected {
            return Err(TicketError::InvalidState(self.state.as_str()));
        }
        Ok(())
    }

    /// Starts collecting money for a ticket costing `target_price`.
    ///
    /// A zero price (a fully discounted ticket) is ready to commit at once.
    ///
    /// # Errors
    ///
    /// - [`TicketError::InvalidState`] - Transaction already started.
    /// - [`TicketError::InvalidPrice`] - `target_price < 0` or finer than a penny.
    pub fn begin(&mut self, target_price: Decimal) -> Result<(), TicketError> {
        self.expect_state(TransactionState::Idle)?;
        if target_price < Decimal::ZERO || !is_whole_pence(target_price) {
            return Err(TicketError::InvalidPrice);
        }
        self.target_price = target_price;
        self.balance = Decimal::ZERO;
        self.state = TransactionState::Collecting;
        debug!(price = %target_price, "transaction started");
        Ok(())
    }

    /// Adds inserted money to the balance and returns the new balance.
    ///
    /// # Errors
    ///
    /// - [`TicketError::InvalidState`] - Not collecting.
    /// - [`TicketError::InvalidAmount`] - `amount <= 0`, finer than a penny,
    ///   or too large to hold. The balance is unchanged.
    pub fn insert(&mut self, amount: Decimal) -> Result<Decimal, TicketError> {
        self.expect_state(TransactionState::Collecting)?;
        if amount <= Decimal::ZERO || !is_whole_pence(amount) {
            return Err(TicketError::InvalidAmount);
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(TicketError::InvalidAmount)?;
        debug!(%amount, balance = %self.balance, remaining = %self.remaining(), "money inserted");
        Ok(self.balance)
    }

    /// True once the balance covers the price.
    pub fn ready_to_commit(&self) -> bool {
        self.state == TransactionState::Collecting && self.balance >= self.target_price
    }

    /// Abandons the purchase and returns every inserted coin.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::InvalidState`] after a commit; the change was
    /// already handed back then.
    pub fn cancel(self) -> Result<Decimal, TicketError> {
        if self.state == TransactionState::Committed {
            return Err(TicketError::InvalidState(self.state.as_str()));
        }
        debug!(returned = %self.balance, "transaction cancelled");
        Ok(self.balance)
    }

    /// Issues the ticket.
    ///
    /// Records the sale on `machine` (sales count and ledger credit together),
    /// deducts the price and returns the ticket with the change due.
    ///
    /// # Errors
    ///
    /// - [`TicketError::InvalidState`] - Not collecting.
    /// - [`TicketError::InsufficientFunds`] - Balance below the price; insert
    ///   more or cancel.
    /// - [`TicketError::UnknownDestination`] - Destination left the catalog;
    ///   nothing was recorded and the balance is untouched.
    pub fn commit(
        &mut self,
        machine: &TicketMachine,
        destination: &str,
        ticket_type: TicketType,
        purchase_date: NaiveDate,
    ) -> Result<Purchase, TicketError> {
        self.expect_state(TransactionState::Collecting)?;
        if !self.ready_to_commit() {
            return Err(TicketError::InsufficientFunds {
                required: self.target_price,
                balance: self.balance,
            });
        }

        let station = machine.record_sale(destination, self.target_price)?;

        let change = self.balance - self.target_price;
        self.balance = change;
        self.state = TransactionState::Committed;

        let ticket = Ticket {
            origin: machine.origin().to_string(),
            destination: station,
            ticket_type,
            price: self.target_price,
            purchase_date,
        };
        debug!(
            station = %ticket.destination,
            ticket_type = %ticket.ticket_type,
            price = %ticket.price,
            %change,
            "ticket issued"
        );
        Ok(Purchase { ticket, change })
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}
