//! Single-row hematology CSV export to `ReportData` converter.

use chrono::format::{Item, StrftimeItems};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vetreport_core::{
    evaluate_reading, PatientData, ReportConfig, ReportData, ReportError, Species,
};

const DELIMITER: char = ',';
const SAMPLE_ID_HEADER: &str = "ID mstra.";
const TIMESTAMP_HEADER: &str = "Tiempo";
const FALLBACK_DATE_FORMAT: &str = "%d/%m/%Y";

/// Analyser and demographic columns that never hold a hematology parameter.
/// Matched case-insensitively against the start of the parsed header name.
const NON_MEDICAL_HEADERS: &[&str] = &[
    SAMPLE_ID_HEADER,
    TIMESTAMP_HEADER,
    "Especie",
    "Nombre",
    "Propietario",
    "Dirección",
    "Direccion",
    "Raza",
    "Edad",
    "Sexo",
    "Remitente",
    "Médico",
    "Medico",
    "M.V.",
    "Modo",
    "Tipo de muestra",
    "Operador",
    "Departamento",
    "N.º de historia",
    "Nº de historia",
    "Cama",
    "Comentario",
    "Diagnóstico",
    "Revisor",
    "Fecha",
];

/// One header cell paired with its value, absent when the data line is short.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CsvField {
    pub header: String,
    pub value: Option<String>,
}

/// Header-to-value mapping of the single data row, in column order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CsvRow {
    fields: Vec<CsvField>,
}

impl CsvRow {
    fn from_lines(header_line: &str, data_line: &str) -> Self {
        let values: Vec<&str> = data_line.split(DELIMITER).collect();
        let mut fields: Vec<CsvField> = Vec::new();

        for (index, header) in header_line.split(DELIMITER).enumerate() {
            let header = header.trim();
            if header.is_empty() || fields.iter().any(|field| field.header == header) {
                continue;
            }

            let value = values
                .get(index)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string);

            fields.push(CsvField {
                header: header.to_string(),
                value,
            });
        }

        Self { fields }
    }

    /// Value under an exact header, `None` when the column or its value is absent.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.header == header)
            .and_then(|field| field.value.as_deref())
    }

    /// First defined value whose header is `header` or starts with it, ignoring case.
    pub fn get_by_prefix(&self, header: &str) -> Option<&str> {
        self.get(header).or_else(|| {
            let prefix = header.to_lowercase();
            self.fields
                .iter()
                .filter(|field| field.header.to_lowercase().starts_with(&prefix))
                .find_map(|field| field.value.as_deref())
        })
    }

    pub fn fields(&self) -> &[CsvField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A medical parameter column that survived filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParameterReading {
    pub name: String,
    pub unit: String,
    pub raw: String,
}

/// Parser output kept between upload and form submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedCsv {
    pub row: CsvRow,
    pub patient: PatientData,
    pub species: Option<Species>,
    pub readings: Vec<ParameterReading>,
}

impl ParsedCsv {
    /// Evaluate every reading for `species` and attach the merged patient data.
    pub fn into_report(self, overrides: &PatientData, species: Species) -> ReportData {
        let mut patient = self.patient.merged_with(overrides);
        patient.species = species.label().to_string();

        let results = self
            .readings
            .iter()
            .map(|reading| evaluate_reading(&reading.name, &reading.unit, &reading.raw, species))
            .collect();

        ReportData { patient, results }
    }

    /// Species from the CSV, falling back to the configured default.
    pub fn species_or(&self, config: &ReportConfig) -> Species {
        self.species.unwrap_or(config.default_species)
    }
}

/// Parse and evaluate in one step using the species found in the file.
pub fn generate_report(csv_text: &str, config: &ReportConfig) -> Result<ReportData, ReportError> {
    let parsed = parse_csv_str(csv_text, config)?;
    let species = parsed.species_or(config);
    Ok(parsed.into_report(&PatientData::default(), species))
}

/// Parse the header and first data line, using today's local date as fallback.
pub fn parse_csv_str(csv_text: &str, config: &ReportConfig) -> Result<ParsedCsv, ReportError> {
    parse_csv_with_date(csv_text, config, Local::now().date_naive())
}

/// Same as [`parse_csv_str`] with an explicit fallback date.
pub fn parse_csv_with_date(
    csv_text: &str,
    config: &ReportConfig,
    today: NaiveDate,
) -> Result<ParsedCsv, ReportError> {
    let mut lines = csv_text
        .trim()
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty());

    let (Some(header_line), Some(data_line)) = (lines.next(), lines.next()) else {
        return Err(ReportError::InsufficientRows);
    };

    let row = CsvRow::from_lines(header_line, data_line);
    debug!(columns = row.len(), "parsed CSV row");

    let id = match row.get_by_prefix(SAMPLE_ID_HEADER) {
        Some(id) => id.to_string(),
        None if config.require_sample_id => return Err(ReportError::MissingSampleId),
        None => {
            warn!(fallback = %config.unknown_sample_id, "sample id column missing");
            config.unknown_sample_id.clone()
        }
    };

    let date = match row.get_by_prefix(TIMESTAMP_HEADER) {
        Some(date) => date.to_string(),
        None => {
            let date = format_date(today, &config.date_format);
            warn!(fallback = %date, "timestamp column missing");
            date
        }
    };

    let species = metadata_value(&row, &["Especie"]).and_then(Species::parse);
    let patient = PatientData {
        id,
        date,
        species: species
            .map(|species| species.label().to_string())
            .or_else(|| metadata_value(&row, &["Especie"]).map(str::to_string))
            .unwrap_or_default(),
        pet_name: metadata_owned(&row, &["Nombre"]),
        owner_name: metadata_owned(&row, &["Propietario"]),
        address: metadata_owned(&row, &["Dirección", "Direccion"]),
        race: metadata_owned(&row, &["Raza"]),
        age: metadata_owned(&row, &["Edad"]),
        sex: metadata_owned(&row, &["Sexo"]),
        vet: metadata_owned(&row, &["Remitente", "Médico", "Medico", "M.V."]),
    };

    let readings: Vec<ParameterReading> = row
        .fields()
        .iter()
        .filter_map(|field| {
            let (name, unit) = split_header(&field.header);
            if is_non_medical(&name) {
                return None;
            }
            let raw = field.value.clone()?;
            Some(ParameterReading { name, unit, raw })
        })
        .collect();

    if readings.is_empty() {
        return Err(ReportError::NoParameters);
    }

    debug!(id = %patient.id, readings = readings.len(), ?species, "CSV parsed");

    Ok(ParsedCsv {
        row,
        patient,
        species,
        readings,
    })
}

/// Split `Name(Unit)` into trimmed name and unit; unit is empty without a match.
pub fn split_header(header: &str) -> (String, String) {
    let header = header.trim();

    for (open, _) in header.match_indices('(') {
        if open == 0 {
            continue;
        }
        let rest = &header[open + 1..];
        let Some(first) = rest.chars().next() else {
            continue;
        };
        // The unit holds at least one character, even a leading ')'.
        let skip = first.len_utf8();
        if let Some(close) = rest[skip..].find(')') {
            let unit = &rest[..skip + close];
            return (header[..open].trim().to_string(), unit.trim().to_string());
        }
    }

    (header.to_string(), String::new())
}

fn is_non_medical(name: &str) -> bool {
    let name = name.to_lowercase();
    NON_MEDICAL_HEADERS
        .iter()
        .any(|denied| name.starts_with(&denied.to_lowercase()))
}

fn metadata_value<'a>(row: &'a CsvRow, names: &[&str]) -> Option<&'a str> {
    row.fields().iter().find_map(|field| {
        let (name, _) = split_header(&field.header);
        let name = name.to_lowercase();
        names
            .iter()
            .any(|candidate| name.starts_with(&candidate.to_lowercase()))
            .then_some(field.value.as_deref())
            .flatten()
    })
}

fn metadata_owned(row: &CsvRow, names: &[&str]) -> String {
    metadata_value(row, names)
        .map(str::to_string)
        .unwrap_or_default()
}

fn format_date(date: NaiveDate, format: &str) -> String {
    let valid = !StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
    let format = if valid { format } else { FALLBACK_DATE_FORMAT };
    date.format(format).to_string()
}
