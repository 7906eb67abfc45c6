//! Bridge WASM <-> JavaScript trung lập framework.

use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use vetreport_core::{PatientData, ReportConfig, ReportError, Species};
use vetreport_csv::ParsedCsv;
use wasm_bindgen::prelude::*;

#[derive(Deserialize, Default)]
struct JsReportConfig {
    #[serde(default)]
    default_species: Option<String>,
    #[serde(default)]
    two_column_threshold: Option<usize>,
    #[serde(default)]
    unknown_sample_id: Option<String>,
    #[serde(default)]
    date_format: Option<String>,
    #[serde(default)]
    require_sample_id: Option<bool>,
    #[serde(default)]
    clinic_name: Option<String>,
    #[serde(default)]
    clinic_footer: Option<String>,
}

impl From<JsReportConfig> for ReportConfig {
    fn from(cfg: JsReportConfig) -> Self {
        let mut base = ReportConfig::default();
        if let Some(species) = cfg.default_species.as_deref().and_then(Species::parse) {
            base.default_species = species;
        }
        if let Some(threshold) = cfg.two_column_threshold {
            base.two_column_threshold = threshold;
        }
        if let Some(sentinel) = cfg.unknown_sample_id {
            base.unknown_sample_id = sentinel;
        }
        if let Some(format) = cfg.date_format {
            base.date_format = format;
        }
        if let Some(required) = cfg.require_sample_id {
            base.require_sample_id = required;
        }
        if let Some(name) = cfg.clinic_name {
            base.clinic_name = name;
        }
        if let Some(footer) = cfg.clinic_footer {
            base.clinic_footer = footer;
        }
        base
    }
}

/// Đọc config JS (có thể thiếu) và ghép lên giá trị mặc định.
fn read_config(config: Option<JsValue>) -> Result<ReportConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsReportConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            Ok(ReportConfig::from(cfg))
        }
        _ => Ok(ReportConfig::default()),
    }
}

fn read_species(species: &str) -> Result<Species, JsValue> {
    Species::parse(species)
        .ok_or_else(|| JsValue::from_str(&format!("Loài không được hỗ trợ: {species}")))
}

/// Phân tích CSV và đánh giá ngay theo loài trong tệp (hoặc mặc định).
#[wasm_bindgen]
pub fn generate_report(csv_text: &str, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let cfg = read_config(config)?;
    let report = vetreport_csv::generate_report(csv_text, &cfg)
        .map_err(|err| JsValue::from_str(&format_report_error(err)))?;

    to_value(&report).map_err(|err| JsValue::from_str(&format!("Không serialize báo cáo: {err}")))
}

/// Chỉ phân tích CSV; kết quả được giữ lại tới khi biểu mẫu được gửi.
#[wasm_bindgen]
pub fn parse_csv(csv_text: &str, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let cfg = read_config(config)?;
    let parsed = vetreport_csv::parse_csv_str(csv_text, &cfg)
        .map_err(|err| JsValue::from_str(&format_report_error(err)))?;

    to_value(&parsed).map_err(|err| JsValue::from_str(&format!("Không serialize CSV: {err}")))
}

/// Đánh giá tại thời điểm gửi biểu mẫu.
#[wasm_bindgen]
pub fn complete_report(
    parsed: JsValue,
    patient: JsValue,
    species: &str,
) -> Result<JsValue, JsValue> {
    let parsed: ParsedCsv = from_value(parsed)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được dữ liệu CSV: {err}")))?;
    let patient: PatientData = from_value(patient)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được thông tin bệnh nhân: {err}")))?;
    let species = read_species(species)?;

    let report = parsed.into_report(&patient, species);
    to_value(&report).map_err(|err| JsValue::from_str(&format!("Không serialize báo cáo: {err}")))
}

#[wasm_bindgen]
pub fn validate_upload(file_name: &str, mime: Option<String>) -> Result<(), JsValue> {
    vetreport_core::validate_upload(file_name, mime.as_deref())
        .map_err(|err| JsValue::from_str(&format_report_error(err)))
}

#[wasm_bindgen]
pub fn evaluate_parameter(name: &str, raw: &str, species: &str) -> Result<JsValue, JsValue> {
    let species = read_species(species)?;
    let row = vetreport_core::evaluate_parameter(name, raw, species);
    to_value(&row).map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

fn format_report_error(err: ReportError) -> String {
    format!("Report error: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_config_overrides_only_given_fields() {
        let cfg = ReportConfig::from(JsReportConfig {
            default_species: Some("Felino".to_string()),
            two_column_threshold: Some(4),
            ..JsReportConfig::default()
        });
        assert_eq!(cfg.default_species, Species::Feline);
        assert_eq!(cfg.two_column_threshold, 4);
        assert_eq!(cfg.unknown_sample_id, "Unknown");
        assert!(!cfg.require_sample_id);
        assert!(cfg.clinic_name.is_empty());
    }

    #[test]
    fn js_config_carries_clinic_branding() {
        let cfg = ReportConfig::from(JsReportConfig {
            clinic_name: Some("Clínica San Roque".to_string()),
            clinic_footer: Some("Tel. 912 000 000".to_string()),
            ..JsReportConfig::default()
        });
        assert_eq!(cfg.clinic_name, "Clínica San Roque");
        assert_eq!(cfg.clinic_footer, "Tel. 912 000 000");
    }

    #[test]
    fn unknown_species_text_keeps_default() {
        let cfg = ReportConfig::from(JsReportConfig {
            default_species: Some("equino".to_string()),
            ..JsReportConfig::default()
        });
        assert_eq!(cfg.default_species, Species::Canine);
    }

    #[test]
    fn errors_are_prefixed() {
        assert_eq!(
            format_report_error(ReportError::NoParameters),
            "Report error: Không tìm thấy chỉ số hợp lệ trong tệp"
        );
    }
}
