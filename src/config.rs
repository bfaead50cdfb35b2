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

//! Machine configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config:
//!
//! ```
//! use ticket_machine::MachineConfig;
//!
//! let config = MachineConfig::from_reader("{}".as_bytes()).unwrap();
//! assert_eq!(config.origin_station, "Birmingham Central");
//! assert!(config.seed_default_destinations);
//! ```

use crate::catalog::Destination;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Station the machine is installed at, printed on every ticket.
pub const DEFAULT_ORIGIN: &str = "Birmingham Central";

/// Destinations a newly installed machine sells, as `(name, single, return)`.
const DEFAULT_DESTINATIONS: [(&str, Decimal, Decimal); 10] = [
    ("London", dec!(45.50), dec!(75.00)),
    ("Manchester", dec!(25.00), dec!(40.00)),
    ("Liverpool", dec!(30.00), dec!(50.00)),
    ("Edinburgh", dec!(65.00), dec!(110.00)),
    ("Cardiff", dec!(35.00), dec!(60.00)),
    ("Bristol", dec!(28.00), dec!(48.00)),
    ("Newcastle", dec!(55.00), dec!(95.00)),
    ("Glasgow", dec!(70.00), dec!(120.00)),
    ("Leeds", dec!(32.00), dec!(54.00)),
    ("Sheffield", dec!(22.00), dec!(38.00)),
];

/// The factory destination list.
pub fn default_destinations() -> impl Iterator<Item = Destination> {
    DEFAULT_DESTINATIONS
        .into_iter()
        .map(|(name, single, ret)| Destination::new(name, single, ret))
}

/// Settings for one [`TicketMachine`](crate::TicketMachine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Machine identity, printed as the ticket origin.
    pub origin_station: String,

    /// Load the factory destination list at start-up.
    pub seed_default_destinations: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            origin_station: DEFAULT_ORIGIN.to_string(),
            seed_default_destinations: true,
        }
    }
}

impl MachineConfig {
    /// Reads a JSON config.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }
}
