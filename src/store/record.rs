// Row model — raw records from the store plus the typed views the pages use.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row as returned by the records endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    pub id: i64,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// A partial row write: only the named fields are touched.
#[derive(Debug, Clone, Serialize)]
pub struct RecordUpdate {
    pub id: i64,
    pub fields: Map<String, Value>,
}

impl RecordUpdate {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(column.to_string(), value.into());
        self
    }
}

fn field_str(record: &Record, column: &str) -> String {
    // Empty cells come back as null; treat them as empty strings.
    record
        .fields
        .get(column)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// A tracked tool, parsed from an Equipment row.
#[derive(Debug, Clone)]
pub struct Tool {
    pub id: i64,
    pub status: String,
    pub location: String,
}

impl Tool {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id,
            status: field_str(record, "Status"),
            location: field_str(record, "Location"),
        }
    }
}

/// A tracked shipment, parsed from a Deliveries row.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub id: i64,
    pub tracking_number: String,
    pub status: String,
    pub location: String,
}

impl Delivery {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id,
            tracking_number: field_str(record, "Tracking_Number"),
            status: field_str(record, "Status"),
            location: field_str(record, "Location"),
        }
    }
}

/// The two equipment transitions staff can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAction {
    Checkout,
    Checkin,
}

impl ToolAction {
    /// The posted `action` value; anything other than "checkout" is a checkin.
    pub fn from_form(action: &str) -> Self {
        if action == "checkout" {
            Self::Checkout
        } else {
            Self::Checkin
        }
    }

    /// The status value this action writes.
    pub fn status(self) -> &'static str {
        match self {
            Self::Checkout => "In Use",
            Self::Checkin => "Available",
        }
    }
}

/// The three delivery states staff can set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Arrived,
    Dispatched,
    Collected,
}

impl DeliveryStatus {
    /// Parse the posted form value, case-insensitively.
    pub fn from_form(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "arrived" => Some(Self::Arrived),
            "dispatched" => Some(Self::Dispatched),
            "collected" => Some(Self::Collected),
            _ => None,
        }
    }

    /// The titlecased status value stored in the Deliveries table.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Arrived => "Arrived",
            Self::Dispatched => "Dispatched",
            Self::Collected => "Collected",
        }
    }

    /// Collected shipments have left the site; their location is cleared.
    pub fn keeps_location(self) -> bool {
        !matches!(self, Self::Collected)
    }
}
