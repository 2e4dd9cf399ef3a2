pub mod ai;
pub mod batch;
pub mod categorize;
pub mod config;
pub mod error;
pub mod geocode;
pub mod scraper;
pub mod utils;

#[cfg(test)]
mod test_support;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One museum as it appears in the directory listing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MuseumListing {
    pub name: String,
    pub url: String,
}

/// The nine fields the extraction model is asked for.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub calle: Option<String>,
    pub colonia: Option<String>,
    pub cp: Option<String>,
    pub alcaldia: Option<String>,
    pub telefonos: Option<String>,
    pub horarios: Option<String>,
    pub costos: Option<String>,
    pub resumen: Option<String>,
    pub fundacion: Option<String>,
}

impl ExtractedFields {
    pub const KEYS: [&'static str; 9] = [
        "calle", "colonia", "cp", "alcaldia", "telefonos", "horarios", "costos", "resumen",
        "fundacion",
    ];

    /// Builds the fields from whatever object the model returned.
    ///
    /// Unknown keys are ignored. Numbers and booleans keep their textual form,
    /// arrays of scalars are joined with `", "`, anything else counts as unknown.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let field = |key: &str| object.get(key).and_then(value_to_text);
        Self {
            calle: field("calle"),
            colonia: field("colonia"),
            cp: field("cp"),
            alcaldia: field("alcaldia"),
            telefonos: field("telefonos"),
            horarios: field("horarios"),
            costos: field("costos"),
            resumen: field("resumen"),
            fundacion: field("fundacion"),
        }
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_to_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// A row of `museos_cdmx_ia.csv`. Field order is the CSV column order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MuseumRecord {
    pub nombre_oficial: String,
    pub url: String,
    pub calle: Option<String>,
    pub colonia: Option<String>,
    pub cp: Option<String>,
    pub alcaldia: Option<String>,
    pub telefonos: Option<String>,
    pub horarios: Option<String>,
    pub costos: Option<String>,
    pub resumen: Option<String>,
    pub fundacion: Option<String>,
}

impl MuseumRecord {
    pub const HEADERS: [&'static str; 11] = [
        "nombre_oficial", "url", "calle", "colonia", "cp", "alcaldia", "telefonos", "horarios",
        "costos", "resumen", "fundacion",
    ];

    pub fn new(listing: &MuseumListing, fields: ExtractedFields) -> Self {
        Self {
            nombre_oficial: listing.name.clone(),
            url: listing.url.clone(),
            calle: fields.calle,
            colonia: fields.colonia,
            cp: fields.cp,
            alcaldia: fields.alcaldia,
            telefonos: fields.telefonos,
            horarios: fields.horarios,
            costos: fields.costos,
            resumen: fields.resumen,
            fundacion: fields.fundacion,
        }
    }

    /// Record with only the listing fields, used when extraction failed.
    pub fn base(listing: &MuseumListing) -> Self {
        Self::new(listing, ExtractedFields::default())
    }

    pub fn to_row(&self) -> Vec<String> {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        vec![
            self.nombre_oficial.clone(),
            self.url.clone(),
            opt(&self.calle),
            opt(&self.colonia),
            opt(&self.cp),
            opt(&self.alcaldia),
            opt(&self.telefonos),
            opt(&self.horarios),
            opt(&self.costos),
            opt(&self.resumen),
            opt(&self.fundacion),
        ]
    }
}
