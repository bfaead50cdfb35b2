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

use chrono::NaiveDate;
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use ticket_machine::{
    Destination, MachineConfig, OfferId, Purchase, SpecialOffer, TicketError, TicketMachine,
    TicketType, Transaction, round_currency,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Ticket Machine - Replay purchase CSV files
///
/// Runs every purchase attempt in a CSV file through the ticket machine and
/// writes per-destination sales and takings to stdout.
#[derive(Parser, Debug)]
#[command(name = "ticket-machine")]
#[command(about = "Replays ticket purchases and reports revenue per destination", long_about = None)]
struct Args {
    /// Path to CSV file with purchase attempts
    ///
    /// Expected format: destination,type,date,inserted
    /// Example: cargo run -- purchases.csv > takings.csv
    #[arg(value_name = "FILE")]
    purchases: PathBuf,

    /// JSON machine configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// CSV of destinations (name,single,return) replacing the factory list
    #[arg(long, value_name = "FILE")]
    destinations: Option<PathBuf>,

    /// CSV of special offers (id,station,discount,start,end,description)
    #[arg(long, value_name = "FILE")]
    offers: Option<PathBuf>,

    /// Multiply every price by this factor before replaying purchases
    #[arg(long, value_name = "FACTOR")]
    adjust: Option<Decimal>,

    /// Only report the N destinations with the highest takings
    #[arg(long, value_name = "N")]
    top: Option<usize>,
}

fn main() {
    init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match open(path).and_then(|file| {
            MachineConfig::from_reader(file).map_err(|e| e.to_string())
        }) {
            Ok(config) => config,
            Err(e) => {
                error!("Error reading config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => MachineConfig::default(),
    };
    if args.destinations.is_some() {
        config.seed_default_destinations = false;
    }

    let machine = match TicketMachine::from_config(&config) {
        Ok(machine) => machine,
        Err(e) => {
            error!("Error setting up machine: {}", e);
            process::exit(1);
        }
    };

    if let Some(path) = &args.destinations {
        let loaded = open(path).and_then(|file| {
            load_destinations(&machine, file).map_err(|e| e.to_string())
        });
        if let Err(e) = loaded {
            error!("Error loading destinations '{}': {}", path.display(), e);
            process::exit(1);
        }
    }

    if let Some(path) = &args.offers {
        let loaded =
            open(path).and_then(|file| load_offers(&machine, file).map_err(|e| e.to_string()));
        if let Err(e) = loaded {
            error!("Error loading offers '{}': {}", path.display(), e);
            process::exit(1);
        }
    }

    if let Some(factor) = args.adjust
        && let Err(e) = machine.adjust_all_prices(factor)
    {
        error!("Error adjusting prices: {}", e);
        process::exit(1);
    }

    let stats = match open(&args.purchases)
        .and_then(|file| process_purchases(&machine, file).map_err(|e| e.to_string()))
    {
        Ok(stats) => stats,
        Err(e) => {
            error!("Error processing purchases: {}", e);
            process::exit(1);
        }
    };
    info!(
        issued = stats.issued,
        cancelled = stats.cancelled,
        skipped = stats.skipped,
        change = %stats.change_returned,
        takings = %machine.total_takings(),
        "replay finished"
    );

    if let Err(e) = write_report(&machine, args.top, std::io::stdout()) {
        error!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Logs go to stderr so the report on stdout stays machine-readable.
///
/// `RUST_LOG=debug` shows every quote, insert and commit.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open(path: &Path) -> Result<BufReader<File>, String> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| format!("cannot open '{}': {}", path.display(), e))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader)
}

/// Destination row: `name, single, return`.
#[derive(Debug, Deserialize)]
struct DestinationRecord {
    name: String,
    single: Decimal,
    #[serde(rename = "return")]
    return_price: Decimal,
}

/// Offer row: `id, station, discount, start, end, description`.
#[derive(Debug, Deserialize)]
struct OfferRecord {
    id: u32,
    station: String,
    discount: Decimal,
    start: NaiveDate,
    end: NaiveDate,
    #[serde(default)]
    description: String,
}

/// Purchase row: `destination, type, date, inserted`.
///
/// `inserted` lists the coins and notes fed in, separated by `;`.
#[derive(Debug, Deserialize)]
struct PurchaseRecord {
    destination: String,
    #[serde(rename = "type")]
    ticket_type: String,
    date: NaiveDate,
    #[serde(default)]
    inserted: String,
}

impl PurchaseRecord {
    fn amounts(&self) -> Result<Vec<Decimal>, TicketError> {
        self.inserted
            .split(';')
            .map(str::trim)
            .filter(|amount| !amount.is_empty())
            .map(|amount| amount.parse::<Decimal>().map_err(|_| TicketError::InvalidAmount))
            .collect()
    }
}

/// Loads destinations into the catalog. Invalid or duplicate rows are skipped.
///
/// Returns the number of destinations added.
fn load_destinations<R: Read>(machine: &TicketMachine, reader: R) -> Result<usize, csv::Error> {
    let mut loaded = 0;
    for result in csv_reader(reader).deserialize::<DestinationRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed destination row: {}", e);
                continue;
            }
        };
        let destination = Destination::new(record.name, record.single, record.return_price);
        match machine.add_destination(destination) {
            Ok(()) => loaded += 1,
            Err(e) => warn!("Skipping destination: {}", e),
        }
    }
    Ok(loaded)
}

/// Loads special offers. Invalid rows are skipped.
///
/// Returns the number of offers added.
fn load_offers<R: Read>(machine: &TicketMachine, reader: R) -> Result<usize, csv::Error> {
    let mut loaded = 0;
    for result in csv_reader(reader).deserialize::<OfferRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed offer row: {}", e);
                continue;
            }
        };
        match SpecialOffer::new(
            OfferId(record.id),
            record.station,
            record.discount,
            record.start,
            record.end,
            record.description,
        ) {
            Ok(offer) => {
                machine.add_offer(offer);
                loaded += 1;
            }
            Err(e) => warn!("Skipping offer {}: {}", record.id, e),
        }
    }
    Ok(loaded)
}

/// What happened to one purchase attempt.
#[derive(Debug)]
enum Outcome {
    Issued(Purchase),
    /// Not enough money was inserted; all of it was handed back.
    Cancelled { returned: Decimal },
}

/// Replay counters.
#[derive(Debug, Default, PartialEq, Eq)]
struct PurchaseStats {
    issued: usize,
    cancelled: usize,
    skipped: usize,
    change_returned: Decimal,
}

/// Runs one purchase attempt the way a customer at the machine would.
fn purchase(machine: &TicketMachine, record: &PurchaseRecord) -> Result<Outcome, TicketError> {
    let ticket_type: TicketType = record.ticket_type.parse()?;
    let amounts = record.amounts()?;
    let quote = machine.quote(&record.destination, ticket_type, record.date)?;

    let mut transaction = Transaction::new();
    transaction.begin(quote.final_price)?;
    for amount in amounts {
        if transaction.ready_to_commit() {
            break;
        }
        if let Err(e) = transaction.insert(amount) {
            let returned = transaction.cancel()?;
            warn!(%returned, "Money returned after rejected insert");
            return Err(e);
        }
    }

    if !transaction.ready_to_commit() {
        let returned = transaction.cancel()?;
        return Ok(Outcome::Cancelled { returned });
    }

    match transaction.commit(machine, &quote.destination, ticket_type, record.date) {
        Ok(purchase) => Ok(Outcome::Issued(purchase)),
        Err(e) => {
            let returned = transaction.cancel()?;
            warn!(%returned, "Money returned after failed commit");
            Err(e)
        }
    }
}

/// Process purchase attempts from a CSV reader.
///
/// Malformed rows and failed purchases are skipped with a warning.
///
/// # CSV Format
///
/// Expected columns: `destination, type, date, inserted`
/// - `destination`: Station name (case-insensitive)
/// - `type`: `single` or `return`
/// - `date`: Purchase date, `YYYY-MM-DD`
/// - `inserted`: Amounts fed into the machine, `;`-separated
///
/// # Example
///
/// ```csv
/// destination,type,date,inserted
/// Manchester,single,2025-03-14,10.00;10.00
/// London,return,2025-03-14,50.00;20.00;10.00
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails.
fn process_purchases<R: Read>(
    machine: &TicketMachine,
    reader: R,
) -> Result<PurchaseStats, csv::Error> {
    let mut stats = PurchaseStats::default();

    for (row, result) in csv_reader(reader)
        .deserialize::<PurchaseRecord>()
        .enumerate()
    {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(row, "Skipping malformed row: {}", e);
                stats.skipped += 1;
                continue;
            }
        };

        match purchase(machine, &record) {
            Ok(Outcome::Issued(purchase)) => {
                info!(
                    row,
                    station = %purchase.ticket.destination,
                    ticket_type = %purchase.ticket.ticket_type,
                    price = %purchase.ticket.price,
                    change = %purchase.change,
                    "ticket issued"
                );
                stats.issued += 1;
                stats.change_returned += purchase.change;
            }
            Ok(Outcome::Cancelled { returned }) => {
                warn!(row, station = %record.destination, %returned, "Insufficient funds, purchase cancelled");
                stats.cancelled += 1;
                stats.change_returned += returned;
            }
            Err(e) => {
                warn!(row, "Skipping purchase: {}", e);
                stats.skipped += 1;
            }
        }
    }

    Ok(stats)
}

/// One line of the revenue report.
#[derive(Debug, Serialize)]
struct ReportRow {
    station: String,
    single: String,
    #[serde(rename = "return")]
    return_price: String,
    sales: u64,
    takings: String,
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", round_currency(amount))
}

/// Write per-destination sales and takings to a CSV writer.
///
/// With `top` set, only the best earning destinations are written, highest
/// first; otherwise every destination in catalog order.
///
/// # CSV Format
///
/// Columns: `station, single, return, sales, takings`
///
/// ```csv
/// station,single,return,sales,takings
/// Manchester,25.00,40.00,2,60.00
/// ```
fn write_report<W: Write>(
    machine: &TicketMachine,
    top: Option<usize>,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    let mut destinations = machine.destinations();
    if let Some(n) = top {
        let ranked = machine.top_destinations(n);
        destinations = ranked
            .iter()
            .filter_map(|entry| machine.find_destination(&entry.station))
            .collect();
    }

    for destination in destinations {
        wtr.serialize(ReportRow {
            station: destination.name().to_string(),
            single: money(destination.single_price()),
            return_price: money(destination.return_price()),
            sales: destination.sales_count(),
            takings: money(machine.takings_for(destination.name())),
        })?;
    }

    wtr.flush()?;
    Ok(())
}
