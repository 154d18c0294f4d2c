//! QSO records returned by the contact lookup service.

use hamlog_core::FetchError;
use serde::{Deserialize, Serialize};

/// One logged contact.
///
/// Decoding is lenient: unknown fields are ignored and missing ones stay
/// `None`, so the service can grow its schema without breaking us.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Qso {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mycallsign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contactsign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mylat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mylong: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contactlat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contactlong: Option<f64>,
}

/// Decode a response body: a JSON array of QSO objects
pub fn decode_qsos(body: &str) -> Result<Vec<Qso>, FetchError> {
    Ok(serde_json::from_str(body)?)
}

/// A call sign together with the QSOs the service returned for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedResult {
    pub key: String,
    pub qsos: Vec<Qso>,
}
