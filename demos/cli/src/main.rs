mod file_backend;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vetreport_core::{
    HistoryStore, PatientData, ReportConfig, ReportData, ReportLayout, ResultRow, Species,
};
use vetreport_csv::parse_csv_str;

use crate::file_backend::FileBackend;

#[derive(Parser, Debug)]
#[command(
    name = "vetreport-cli",
    about = "Tạo báo cáo huyết học thú y từ tệp CSV một dòng."
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Đọc CSV, đánh giá theo khoảng tham chiếu và in báo cáo.
    Report {
        /// Đường dẫn tới tệp CSV.
        #[arg(short, long)]
        input: PathBuf,
        /// Loài (canine/feline, perro/gato...); mặc định lấy từ CSV hoặc config.
        #[arg(short, long)]
        species: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        pet: Option<String>,
        #[arg(long)]
        vet: Option<String>,
        /// In JSON thay vì bảng.
        #[arg(long)]
        json: bool,
        /// Tệp lịch sử JSON; báo cáo sẽ được lưu vào đây.
        #[arg(long)]
        history: Option<PathBuf>,
        /// Tệp cấu hình JSON (`ReportConfig`).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Quản lý lịch sử báo cáo.
    History {
        #[arg(long)]
        history: PathBuf,
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    List,
    Show { id: String },
    Delete { id: String },
    Clear,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Report {
            input,
            species,
            owner,
            pet,
            vet,
            json,
            history,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let overrides = PatientData {
                owner_name: owner.unwrap_or_default(),
                pet_name: pet.unwrap_or_default(),
                vet: vet.unwrap_or_default(),
                ..PatientData::default()
            };
            let report = build_report(&input, species.as_deref(), &overrides, &config)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_report(&report, &config));
            }

            if let Some(path) = history {
                let mut store = open_history(&path)?;
                store
                    .upsert(report)
                    .with_context(|| format!("Không lưu được lịch sử vào {}", path.display()))?;
                info!(entries = store.len(), "lịch sử đã cập nhật");
            }
        }
        Command::History { history, action } => run_history(&history, action)?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ReportConfig> {
    let Some(path) = path else {
        return Ok(ReportConfig::default());
    };
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Không đọc được config {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Config không hợp lệ: {}", path.display()))
}

fn build_report(
    input: &Path,
    species: Option<&str>,
    overrides: &PatientData,
    config: &ReportConfig,
) -> anyhow::Result<ReportData> {
    vetreport_core::validate_upload(&input.to_string_lossy(), None)?;
    let data = std::fs::read_to_string(input)
        .with_context(|| format!("Không đọc được file {}", input.display()))?;

    let parsed = parse_csv_str(&data, config)?;
    let species = match species {
        Some(text) => match Species::parse(text) {
            Some(species) => species,
            None => bail!("Loài không được hỗ trợ: {text}"),
        },
        None => parsed.species_or(config),
    };

    Ok(parsed.into_report(overrides, species))
}

// Tệp hỏng phải được sửa tay; không ghi đè lên nó.
fn open_history(path: &Path) -> anyhow::Result<HistoryStore<FileBackend>> {
    HistoryStore::try_open(FileBackend::new(path))
        .with_context(|| format!("Không mở được lịch sử {}", path.display()))
}

fn run_history(path: &Path, action: HistoryAction) -> anyhow::Result<()> {
    let mut store = open_history(path)?;

    match action {
        HistoryAction::List => {
            if store.is_empty() {
                println!("Chưa có báo cáo nào được lưu.");
            }
            for report in store.entries() {
                println!(
                    "{}\t{}\t{}\t{}\t{} bất thường",
                    report.patient.id,
                    report.patient.owner_name,
                    report.patient.pet_name,
                    report.patient.date,
                    report.flagged_count()
                );
            }
        }
        HistoryAction::Show { id } => {
            let Some(report) = store.get(&id) else {
                bail!("Không có báo cáo với mã {id}");
            };
            print!("{}", render_report(report, &ReportConfig::default()));
        }
        HistoryAction::Delete { id } => {
            if !store.delete(&id)? {
                bail!("Không có báo cáo với mã {id}");
            }
            println!("Đã xóa {id}");
        }
        HistoryAction::Clear => {
            store.clear()?;
            println!("Đã xóa toàn bộ lịch sử");
        }
    }

    Ok(())
}

const COLUMN_GAP: &str = "    ";

fn render_report(report: &ReportData, config: &ReportConfig) -> String {
    let patient = &report.patient;
    let mut out = String::new();
    if !config.clinic_name.trim().is_empty() {
        out.push_str(config.clinic_name.trim());
        out.push('\n');
    }
    out.push_str("PHIẾU KẾT QUẢ HUYẾT HỌC\n");
    out.push_str(&format!(
        "Mã mẫu: {}  Ngày: {}  Loài: {}\n",
        patient.id, patient.date, patient.species
    ));
    out.push_str(&format!(
        "Chủ nuôi: {}  Tên thú: {}  Bác sĩ: {}\n\n",
        patient.owner_name, patient.pet_name, patient.vet
    ));

    let layout = ReportLayout::from_results(&report.results, config.two_column_threshold);
    let columns: Vec<Vec<String>> = layout
        .columns
        .iter()
        .map(|rows| {
            std::iter::once(format_line("Chỉ số", "Kết quả", "", "Tham chiếu", "Đơn vị"))
                .chain(rows.iter().map(format_row))
                .collect()
        })
        .collect();

    let height = columns.iter().map(Vec::len).max().unwrap_or(0);
    for index in 0..height {
        let line: Vec<String> = columns
            .iter()
            .map(|column| {
                column
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| format_line("", "", "", "", ""))
            })
            .collect();
        out.push_str(line.join(COLUMN_GAP).trim_end());
        out.push('\n');
    }

    if !config.clinic_footer.trim().is_empty() {
        out.push('\n');
        out.push_str(config.clinic_footer.trim());
        out.push('\n');
    }

    out
}

fn format_row(row: &ResultRow) -> String {
    format_line(
        &row.parameter,
        &row.result,
        row.indicator.symbol(),
        &row.range,
        &row.unit,
    )
}

fn format_line(parameter: &str, result: &str, flag: &str, range: &str, unit: &str) -> String {
    format!("{parameter:<8} {result:>9} {flag:<1} {range:<15} {unit:<8}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetreport_core::Indicator;

    fn row(name: &str, indicator: Indicator) -> ResultRow {
        ResultRow {
            parameter: name.to_string(),
            result: "20.00".to_string(),
            indicator,
            range: "5.50 - 16.90".to_string(),
            unit: "10^3/uL".to_string(),
        }
    }

    #[test]
    fn text_report_switches_to_two_columns() {
        let report = ReportData {
            patient: PatientData {
                id: "A1".to_string(),
                ..PatientData::default()
            },
            results: vec![
                row("WBC", Indicator::High),
                row("RBC", Indicator::None),
                row("HGB", Indicator::Low),
            ],
        };

        let single = render_report(&report, &ReportConfig::default());
        assert!(single.contains("Mã mẫu: A1"));
        assert!(single.lines().any(|line| line.starts_with("WBC") && line.contains('↑')));
        assert!(single.starts_with("PHIẾU KẾT QUẢ HUYẾT HỌC"));

        let narrow = ReportConfig {
            two_column_threshold: 2,
            ..ReportConfig::default()
        };
        let double = render_report(&report, &narrow);
        let header = double
            .lines()
            .find(|line| line.starts_with("Chỉ số"))
            .expect("dòng tiêu đề");
        assert_eq!(header.matches("Chỉ số").count(), 2);
        assert!(double.lines().any(|line| line.starts_with("WBC") && line.contains("HGB")));
    }

    #[test]
    fn text_report_prints_clinic_name_and_footer() {
        let report = ReportData {
            patient: PatientData::default(),
            results: vec![row("WBC", Indicator::None)],
        };
        let config = ReportConfig {
            clinic_name: "Clínica Veterinaria San Roque".to_string(),
            clinic_footer: "Tel. 912 000 000".to_string(),
            ..ReportConfig::default()
        };

        let text = render_report(&report, &config);
        assert_eq!(text.lines().next(), Some("Clínica Veterinaria San Roque"));
        assert_eq!(text.lines().last(), Some("Tel. 912 000 000"));
    }

    #[test]
    fn corrupt_history_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = open_history(&path).unwrap_err();
        assert!(err.to_string().contains("history.json"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn build_report_rejects_non_csv_path() {
        let err = build_report(
            Path::new("muestra.txt"),
            None,
            &PatientData::default(),
            &ReportConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("muestra.txt"));
    }

    #[test]
    fn build_report_applies_species_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("muestra.csv");
        std::fs::write(&path, "ID mstra.,Tiempo,WBC(10^3/uL)\nA1,2024-01-01,17.0\n").unwrap();

        let overrides = PatientData {
            owner_name: "Ana".to_string(),
            ..PatientData::default()
        };
        let report =
            build_report(&path, Some("gato"), &overrides, &ReportConfig::default()).unwrap();

        assert_eq!(report.patient.owner_name, "Ana");
        assert_eq!(report.patient.species, "Felino");
        assert_eq!(report.results[0].indicator, Indicator::None);
        assert_eq!(report.results[0].range, "2.87 - 17.02");
    }
}
