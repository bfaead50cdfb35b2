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


//! Purchase flow integration tests: quote, collect, commit or cancel.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use ticket_machine::{
    Destination, OfferId, SpecialOffer, TicketError, TicketMachine, TicketType, Transaction,
    TransactionState,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

fn machine() -> TicketMachine {
    let machine = TicketMachine::new();
    machine
        .add_destination(Destination::new("Manchester", dec!(25.00), dec!(40.00)))
        .unwrap();
    machine
        .add_destination(Destination::new("London", dec!(45.50), dec!(75.00)))
        .unwrap();
    machine
}

fn collecting(price: Decimal, inserted: &[Decimal]) -> Transaction {
    let mut transaction = Transaction::new();
    transaction.begin(price).unwrap();
    for amount in inserted {
        transaction.insert(*amount).unwrap();
    }
    transaction
}

// === Successful purchases ===

#[test]
fn discounted_single_with_exact_money() {
    let machine = machine();
    let offer = SpecialOffer::new(OfferId(1), "Manchester", dec!(20), today(), today(), "Spring")
        .unwrap();
    machine.add_offer(offer);

    let quote = machine
        .quote("Manchester", TicketType::Single, today())
        .unwrap();
    assert_eq!(quote.final_price, dec!(20.00));

    let mut transaction = collecting(quote.final_price, &[dec!(10.00), dec!(10.00)]);
    assert_eq!(transaction.balance(), dec!(20.00));

    let purchase = transaction
        .commit(&machine, "Manchester", TicketType::Single, today())
        .unwrap();

    assert_eq!(purchase.change, dec!(0.00));
    assert_eq!(purchase.ticket.price, dec!(20.00));
    assert_eq!(purchase.ticket.origin, "Birmingham Central");
    assert_eq!(transaction.state(), TransactionState::Committed);
    assert_eq!(machine.find_destination("Manchester").unwrap().sales_count(), 1);
    assert_eq!(machine.takings_for("Manchester"), dec!(20.00));
    assert_eq!(machine.total_takings(), dec!(20.00));
}

#[test]
fn short_payment_then_top_up() {
    let machine = machine();
    let quote = machine
        .quote("Manchester", TicketType::Return, today())
        .unwrap();
    let mut transaction = collecting(quote.final_price, &[dec!(30.00)]);

    assert!(!transaction.ready_to_commit());
    assert_eq!(
        transaction.commit(&machine, "Manchester", TicketType::Return, today()),
        Err(TicketError::InsufficientFunds {
            required: dec!(40.00),
            balance: dec!(30.00),
        })
    );
    assert_eq!(transaction.state(), TransactionState::Collecting);
    assert_eq!(machine.total_takings(), Decimal::ZERO);
    assert_eq!(machine.find_destination("Manchester").unwrap().sales_count(), 0);

    transaction.insert(dec!(10.00)).unwrap();
    assert!(transaction.ready_to_commit());

    let purchase = transaction
        .commit(&machine, "Manchester", TicketType::Return, today())
        .unwrap();
    assert_eq!(purchase.change, dec!(0.00));
    assert_eq!(machine.takings_for("Manchester"), dec!(40.00));
}

#[test]
fn overpayment_returns_change() {
    let machine = machine();
    let mut transaction = collecting(dec!(45.50), &[dec!(20.00), dec!(20.00), dec!(10.00)]);

    let purchase = transaction
        .commit(&machine, "london", TicketType::Single, today())
        .unwrap();

    assert_eq!(purchase.change, dec!(4.50));
    assert_eq!(transaction.balance(), dec!(4.50));
    assert_eq!(purchase.ticket.destination, "London");
    assert_eq!(machine.takings_for("London"), dec!(45.50));
}

#[test]
fn printed_ticket() {
    let machine = machine();
    let mut transaction = collecting(dec!(75.00), &[dec!(75.00)]);
    let purchase = transaction
        .commit(&machine, "London", TicketType::Return, today())
        .unwrap();

    assert_eq!(
        purchase.ticket.to_string(),
        "***\nBirmingham Central\nto\nLondon\nPrice: 75.00 [Return]\n***"
    );
}

// === Cancellation ===

#[test]
fn cancel_returns_everything_and_records_nothing() {
    let machine = machine();
    let transaction = collecting(dec!(40.00), &[dec!(5.00), dec!(2.00), dec!(0.50)]);

    assert_eq!(transaction.cancel(), Ok(dec!(7.50)));
    assert_eq!(machine.total_takings(), Decimal::ZERO);
    assert_eq!(machine.find_destination("Manchester").unwrap().sales_count(), 0);
}

#[test]
fn committed_transaction_cannot_be_reused() {
    let machine = machine();
    let mut transaction = collecting(dec!(25.00), &[dec!(30.00)]);
    transaction
        .commit(&machine, "Manchester", TicketType::Single, today())
        .unwrap();

    assert_eq!(
        transaction.insert(dec!(1.00)),
        Err(TicketError::InvalidState("committed"))
    );
    assert_eq!(
        transaction.commit(&machine, "Manchester", TicketType::Single, today()),
        Err(TicketError::InvalidState("committed"))
    );
    assert_eq!(
        transaction.cancel(),
        Err(TicketError::InvalidState("committed"))
    );
    assert_eq!(machine.find_destination("Manchester").unwrap().sales_count(), 1);
    assert_eq!(machine.total_takings(), dec!(25.00));
}

#[test]
fn commit_before_begin_is_rejected() {
    let machine = machine();
    let mut transaction = Transaction::new();
    assert_eq!(
        transaction.commit(&machine, "Manchester", TicketType::Single, today()),
        Err(TicketError::InvalidState("idle"))
    );
}

// === Atomicity ===

#[test]
fn destination_removed_mid_purchase_leaves_books_untouched() {
    let machine = machine();
    machine
        .record_sale("London", dec!(45.50))
        .unwrap();
    let mut transaction = collecting(dec!(25.00), &[dec!(20.00), dec!(10.00)]);

    machine.remove_destination("Manchester").unwrap();

    assert_eq!(
        transaction.commit(&machine, "Manchester", TicketType::Single, today()),
        Err(TicketError::UnknownDestination("Manchester".into()))
    );
    assert_eq!(transaction.state(), TransactionState::Collecting);
    assert_eq!(transaction.balance(), dec!(30.00));
    assert_eq!(machine.takings_for("Manchester"), Decimal::ZERO);
    assert_eq!(machine.total_takings(), dec!(45.50));
    assert_eq!(transaction.cancel(), Ok(dec!(30.00)));
}

#[test]
fn quote_is_fixed_once_issued() {
    let machine = machine();
    let quote = machine
        .quote("Manchester", TicketType::Single, today())
        .unwrap();

    machine.adjust_all_prices(dec!(2)).unwrap();
    let mut transaction = collecting(quote.final_price, &[dec!(25.00)]);
    let purchase = transaction
        .commit(&machine, "Manchester", TicketType::Single, today())
        .unwrap();

    assert_eq!(purchase.ticket.price, dec!(25.00));
    assert_eq!(machine.takings_for("Manchester"), dec!(25.00));
}

// === Free tickets ===

#[test]
fn full_discount_issues_free_ticket() {
    let machine = machine();
    let offer = SpecialOffer::new(OfferId(1), "London", dec!(100), today(), today(), "Free")
        .unwrap();
    machine.add_offer(offer);

    let quote = machine.quote("London", TicketType::Single, today()).unwrap();
    assert_eq!(quote.final_price, dec!(0.00));

    let mut transaction = Transaction::new();
    transaction.begin(quote.final_price).unwrap();
    assert!(transaction.ready_to_commit());
    transaction.insert(dec!(2.00)).unwrap();

    let purchase = transaction
        .commit(&machine, "London", TicketType::Single, today())
        .unwrap();

    assert_eq!(purchase.ticket.price, Decimal::ZERO);
    assert_eq!(purchase.change, dec!(2.00));
    assert_eq!(machine.find_destination("London").unwrap().sales_count(), 1);
    assert_eq!(machine.takings_for("London"), Decimal::ZERO);
    assert_eq!(machine.total_takings(), Decimal::ZERO);
}

#[test]
fn discount_rounding_to_zero_issues_free_ticket() {
    let machine = TicketMachine::new();
    machine
        .add_destination(Destination::new("Halt", dec!(0.01), dec!(0.02)))
        .unwrap();
    let offer = SpecialOffer::new(OfferId(1), "Halt", dec!(60), today(), today(), "Sixty")
        .unwrap();
    machine.add_offer(offer);

    // 0.01 * 0.4 = 0.004
    let quote = machine.quote("Halt", TicketType::Single, today()).unwrap();
    assert_eq!(quote.final_price, dec!(0.00));

    let mut transaction = Transaction::new();
    transaction.begin(quote.final_price).unwrap();
    let purchase = transaction
        .commit(&machine, "Halt", TicketType::Single, today())
        .unwrap();

    assert_eq!(purchase.change, Decimal::ZERO);
    assert_eq!(machine.find_destination("Halt").unwrap().sales_count(), 1);
    assert!(machine.top_destinations(1)[0].takings.is_zero());
}

// === Money precision ===

#[test]
fn amounts_stay_in_whole_pence() {
    let machine = machine();
    assert_eq!(
        machine.add_destination(Destination::new("York", dec!(10.005), dec!(20.001))),
        Err(TicketError::InvalidPrice)
    );

    let mut transaction = Transaction::new();
    transaction.begin(dec!(25.00)).unwrap();
    assert_eq!(transaction.insert(dec!(25.001)), Err(TicketError::InvalidAmount));
    transaction.insert(dec!(25.01)).unwrap();

    let purchase = transaction
        .commit(&machine, "Manchester", TicketType::Single, today())
        .unwrap();
    assert_eq!(purchase.change, dec!(0.01));
    assert_eq!(machine.takings_for("Manchester"), dec!(25.00));
}

#[test]
fn oversized_insert_is_rejected_without_panic() {
    let mut transaction = collecting(dec!(10.00), &[Decimal::MAX]);
    assert_eq!(transaction.insert(dec!(1)), Err(TicketError::InvalidAmount));
    assert_eq!(transaction.balance(), Decimal::MAX);
    assert_eq!(transaction.cancel(), Ok(Decimal::MAX));
}
