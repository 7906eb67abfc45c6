//! Logic lõi cho báo cáo huyết học thú y: mô hình dữ liệu, bảng tham chiếu,
//! đánh giá chỉ số và lịch sử báo cáo.

use serde::{Deserialize, Serialize};

pub mod evaluate;
pub mod history;
pub mod layout;
pub mod ranges;

pub use evaluate::{evaluate_parameter, evaluate_reading, format_fixed2, indicator_for};
pub use history::{HistoryBackend, HistoryStore, MemoryBackend, HISTORY_STORAGE_KEY};
pub use layout::ReportLayout;
pub use ranges::{reference_range, reference_table, ReferenceRange};

/// Cấu hình sinh báo cáo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Loài dùng khi CSV và biểu mẫu không chỉ định.
    pub default_species: Species,
    /// Số kết quả tối đa còn hiển thị một cột; vượt ngưỡng thì chia hai cột.
    pub two_column_threshold: usize,
    /// Giá trị thay thế khi thiếu cột mã mẫu.
    pub unknown_sample_id: String,
    /// Định dạng ngày kiểu strftime cho ngày mặc định khi thiếu cột thời gian.
    pub date_format: String,
    /// Bật để coi thiếu mã mẫu là lỗi thay vì dùng giá trị thay thế.
    pub require_sample_id: bool,
    /// Tên phòng khám in ở đầu phiếu; rỗng thì bỏ qua.
    pub clinic_name: String,
    /// Dòng chân trang (địa chỉ, điện thoại...); rỗng thì bỏ qua.
    pub clinic_footer: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_species: Species::Canine,
            two_column_threshold: 8,
            unknown_sample_id: "Unknown".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            require_sample_id: false,
            clinic_name: String::new(),
            clinic_footer: String::new(),
        }
    }
}

/// Loài có bảng tham chiếu riêng.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    #[default]
    Canine,
    Feline,
}

impl Species {
    /// Nhận dạng loài từ chuỗi tự do (CSV, biểu mẫu, dòng lệnh).
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "canino" | "canina" | "perro" | "perra" | "canine" | "dog" => Some(Self::Canine),
            "felino" | "felina" | "gato" | "gata" | "feline" | "cat" => Some(Self::Feline),
            _ => None,
        }
    }

    /// Nhãn in trên báo cáo.
    pub fn label(self) -> &'static str {
        match self {
            Self::Canine => "Canino",
            Self::Feline => "Felino",
        }
    }
}

/// Cờ bất thường của một kết quả.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Indicator {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "↑")]
    High,
    #[serde(rename = "↓")]
    Low,
}

impl Indicator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::None => "",
            Self::High => "↑",
            Self::Low => "↓",
        }
    }

    pub fn is_flagged(self) -> bool {
        self != Self::None
    }
}

/// Một dòng kết quả đã định dạng để hiển thị.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRow {
    pub parameter: String,
    pub result: String,
    pub indicator: Indicator,
    pub range: String,
    pub unit: String,
}

/// Thông tin nhận dạng bệnh nhân; mọi trường đều có thể rỗng.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientData {
    pub id: String,
    pub owner_name: String,
    pub pet_name: String,
    pub address: String,
    pub species: String,
    pub race: String,
    pub age: String,
    pub sex: String,
    pub vet: String,
    pub date: String,
}

impl PatientData {
    /// Ghép các trường không rỗng của `overrides` lên bản hiện tại.
    pub fn merged_with(mut self, overrides: &PatientData) -> Self {
        fn take(target: &mut String, value: &str) {
            if !value.trim().is_empty() {
                *target = value.trim().to_string();
            }
        }

        take(&mut self.id, &overrides.id);
        take(&mut self.owner_name, &overrides.owner_name);
        take(&mut self.pet_name, &overrides.pet_name);
        take(&mut self.address, &overrides.address);
        take(&mut self.species, &overrides.species);
        take(&mut self.race, &overrides.race);
        take(&mut self.age, &overrides.age);
        take(&mut self.sex, &overrides.sex);
        take(&mut self.vet, &overrides.vet);
        take(&mut self.date, &overrides.date);
        self
    }
}

/// Một báo cáo hoàn chỉnh; cũng là một mục lịch sử.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportData {
    pub patient: PatientData,
    pub results: Vec<ResultRow>,
}

impl ReportData {
    /// Số kết quả nằm ngoài khoảng tham chiếu.
    pub fn flagged_count(&self) -> usize {
        self.results
            .iter()
            .filter(|row| row.indicator.is_flagged())
            .count()
    }
}

/// Lỗi chung khi tạo và lưu báo cáo.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ReportError {
    #[error("Tệp {name} không phải CSV; hãy chọn tệp .csv")]
    UnsupportedFile { name: String },
    #[error("Không đọc được tệp: {0}")]
    Read(String),
    #[error("CSV needs header and one data row (cần dòng tiêu đề và một dòng dữ liệu)")]
    InsufficientRows,
    #[error("Không tìm thấy cột \"ID mstra.\"")]
    MissingSampleId,
    #[error("Không tìm thấy chỉ số hợp lệ trong tệp")]
    NoParameters,
    #[error("Lỗi lưu trữ lịch sử: {0}")]
    Storage(String),
    #[error("Không serialize được dữ liệu: {0}")]
    Serialize(String),
}

const CSV_MIME: &str = "text/csv";

/// Chỉ chấp nhận tệp có MIME `text/csv` hoặc đuôi `.csv`.
pub fn validate_upload(file_name: &str, mime: Option<&str>) -> Result<(), ReportError> {
    let mime_ok = mime
        .map(|value| value.trim().eq_ignore_ascii_case(CSV_MIME))
        .unwrap_or(false);
    let extension_ok = file_name.trim().to_lowercase().ends_with(".csv");

    if mime_ok || extension_ok {
        Ok(())
    } else {
        Err(ReportError::UnsupportedFile {
            name: file_name.to_string(),
        })
    }
}
