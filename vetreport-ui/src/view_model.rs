//! Dữ liệu hiển thị thuần, dùng chung cho giao diện và kiểm thử native.

use vetreport_core::{PatientData, ReportData, ResultRow};

const EMPTY_CELL: &str = "--";

/// Các ô trong lưới thông tin bệnh nhân, theo thứ tự in.
pub fn patient_fields(patient: &PatientData) -> Vec<(&'static str, String)> {
    [
        ("Mã mẫu", &patient.id),
        ("Chủ nuôi", &patient.owner_name),
        ("Tên thú", &patient.pet_name),
        ("Địa chỉ", &patient.address),
        ("Loài", &patient.species),
        ("Giống", &patient.race),
        ("Tuổi", &patient.age),
        ("Giới tính", &patient.sex),
        ("Ngày", &patient.date),
    ]
    .into_iter()
    .map(|(label, value)| (label, display_or_placeholder(value)))
    .collect()
}

/// Dòng tiêu đề của một mục lịch sử.
pub fn history_title(report: &ReportData) -> String {
    let owner = report.patient.owner_name.trim();
    if owner.is_empty() {
        format!("Mẫu {}", report.patient.id)
    } else {
        owner.to_string()
    }
}

/// Dòng phụ: "tên thú - ngày".
pub fn history_subtitle(report: &ReportData) -> String {
    format!(
        "{} - {}",
        display_or_placeholder(&report.patient.pet_name),
        display_or_placeholder(&report.patient.date)
    )
}

/// Lớp CSS cho một dòng kết quả.
pub fn row_class(row: &ResultRow) -> &'static str {
    if row.indicator.is_flagged() {
        "is-flagged"
    } else {
        ""
    }
}

/// Dòng thương hiệu phòng khám; `None` khi chưa cấu hình.
pub fn clinic_line(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub fn display_or_placeholder(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        EMPTY_CELL.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetreport_core::Indicator;

    fn report(owner: &str, pet: &str) -> ReportData {
        ReportData {
            patient: PatientData {
                id: "A1".to_string(),
                owner_name: owner.to_string(),
                pet_name: pet.to_string(),
                date: "14/05/2024".to_string(),
                ..PatientData::default()
            },
            results: Vec::new(),
        }
    }

    #[test]
    fn history_labels_fall_back_to_sample_id() {
        assert_eq!(history_title(&report("", "Toby")), "Mẫu A1");
        assert_eq!(history_title(&report("SRA ISI", "Toby")), "SRA ISI");
        assert_eq!(history_subtitle(&report("", "")), "-- - 14/05/2024");
    }

    #[test]
    fn patient_grid_has_every_field() {
        let fields = patient_fields(&report("Ana", "Toby").patient);
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[0], ("Mã mẫu", "A1".to_string()));
        assert_eq!(fields[3], ("Địa chỉ", "--".to_string()));
    }

    #[test]
    fn clinic_lines_are_skipped_when_blank() {
        assert_eq!(clinic_line("  "), None);
        assert_eq!(
            clinic_line(" Clínica San Roque "),
            Some("Clínica San Roque".to_string())
        );
    }

    #[test]
    fn flagged_rows_are_highlighted() {
        let mut row = ResultRow {
            parameter: "WBC".to_string(),
            result: "20.00".to_string(),
            indicator: Indicator::High,
            range: "5.50 - 16.90".to_string(),
            unit: "10^3/uL".to_string(),
        };
        assert_eq!(row_class(&row), "is-flagged");
        row.indicator = Indicator::None;
        assert_eq!(row_class(&row), "");
    }
}
