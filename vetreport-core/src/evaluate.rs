//! Đối chiếu giá trị với khoảng tham chiếu và định dạng dòng kết quả.

use tracing::debug;

use crate::ranges::{reference_range, ReferenceRange};
use crate::{Indicator, ResultRow, Species};

const NOT_AVAILABLE: &str = "N/A";

/// Đánh giá một chỉ số với đơn vị lấy từ bảng tham chiếu.
pub fn evaluate_parameter(parameter: &str, raw: &str, species: Species) -> ResultRow {
    evaluate_reading(parameter, "", raw, species)
}

/// Như [`evaluate_parameter`], nhưng đơn vị từ tiêu đề CSV (nếu có) được ưu tiên.
/// Chỉ số không có trong bảng luôn có đơn vị rỗng.
pub fn evaluate_reading(
    parameter: &str,
    header_unit: &str,
    raw: &str,
    species: Species,
) -> ResultRow {
    let range = reference_range(species, parameter);
    let unit = match range {
        Some(_) if !header_unit.trim().is_empty() => header_unit.trim().to_string(),
        Some(range) => range.unit.to_string(),
        None => String::new(),
    };

    let Some(value) = parse_numeric(raw) else {
        debug!(parameter, raw, "giá trị không phải số, giữ nguyên chuỗi gốc");
        return ResultRow {
            parameter: parameter.to_string(),
            result: raw.trim().to_string(),
            indicator: Indicator::None,
            range: NOT_AVAILABLE.to_string(),
            unit,
        };
    };

    match range {
        Some(range) => ResultRow {
            parameter: parameter.to_string(),
            result: format_fixed2(value),
            indicator: indicator_for(value, range),
            range: range.display(),
            unit,
        },
        None => {
            debug!(parameter, ?species, "không có khoảng tham chiếu");
            ResultRow {
                parameter: parameter.to_string(),
                result: format_fixed2(value),
                indicator: Indicator::None,
                range: NOT_AVAILABLE.to_string(),
                unit,
            }
        }
    }
}

/// Cao khi vượt `max`, thấp khi dưới `min`; hai biên được coi là bình thường.
pub fn indicator_for(value: f64, range: &ReferenceRange) -> Indicator {
    if value > range.max {
        Indicator::High
    } else if value < range.min {
        Indicator::Low
    } else {
        Indicator::None
    }
}

/// Hai chữ số thập phân; giá trị nằm đúng giữa hai mức được làm tròn ra xa số 0.
pub fn format_fixed2(value: f64) -> String {
    let scaled = value * 100.0;
    if scaled.fract().abs() == 0.5 {
        format!("{:.2}", scaled.round() / 100.0)
    } else {
        format!("{value:.2}")
    }
}

fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::reference_table;
    use proptest::prelude::*;

    #[test]
    fn high_value_is_flagged_and_formatted() {
        let row = evaluate_parameter("WBC", "20", Species::Canine);
        assert_eq!(row.result, "20.00");
        assert_eq!(row.indicator, Indicator::High);
        assert_eq!(row.range, "5.50 - 16.90");
        assert_eq!(row.unit, "10^3/μL");
    }

    #[test]
    fn low_value_is_flagged() {
        let row = evaluate_parameter("HCT", "25.456", Species::Feline);
        assert_eq!(row.result, "25.46");
        assert_eq!(row.indicator, Indicator::Low);
        assert_eq!(row.range, "30.30 - 52.30");
    }

    #[test]
    fn bounds_are_normal() {
        assert_eq!(
            evaluate_parameter("PLT", "148", Species::Canine).indicator,
            Indicator::None
        );
        assert_eq!(
            evaluate_parameter("PLT", "484", Species::Canine).indicator,
            Indicator::None
        );
    }

    #[test]
    fn header_unit_overrides_table_unit() {
        let row = evaluate_reading("WBC", " 10^3/uL ", "7.1", Species::Canine);
        assert_eq!(row.unit, "10^3/uL");
        assert_eq!(row.indicator, Indicator::None);
    }

    #[test]
    fn non_numeric_value_degrades_to_raw_row() {
        let row = evaluate_parameter("WBC", " ---- ", Species::Canine);
        assert_eq!(row.result, "----");
        assert_eq!(row.indicator, Indicator::None);
        assert_eq!(row.range, "N/A");
    }

    #[test]
    fn infinite_text_is_not_numeric() {
        let row = evaluate_parameter("WBC", "inf", Species::Canine);
        assert_eq!(row.result, "inf");
        assert_eq!(row.range, "N/A");
    }

    #[test]
    fn exact_ties_round_away_from_zero() {
        assert_eq!(format_fixed2(0.125), "0.13");
        assert_eq!(format_fixed2(148.125), "148.13");
        assert_eq!(format_fixed2(-0.125), "-0.13");
        assert_eq!(format_fixed2(0.375), "0.38");
        assert_eq!(format_fixed2(2.5), "2.50");
        assert_eq!(format_fixed2(1.005), "1.00");
        assert_eq!(evaluate_parameter("MON#", "0.125", Species::Canine).result, "0.13");
        assert_eq!(evaluate_parameter("PLT", "148.125", Species::Canine).result, "148.13");
    }

    #[test]
    fn unregistered_parameter_drops_header_unit() {
        let row = evaluate_reading("EOS#", "10^3/uL", "3.5", Species::Canine);
        assert_eq!(row.unit, "");
        assert_eq!(row.range, "N/A");
    }

    #[test]
    fn unregistered_parameter_is_never_flagged() {
        let row = evaluate_parameter("EOS#", "99", Species::Canine);
        assert_eq!(row.result, "99.00");
        assert_eq!(row.indicator, Indicator::None);
        assert_eq!(row.range, "N/A");
        assert_eq!(row.unit, "");
    }

    proptest! {
        #[test]
        fn indicator_matches_strict_bounds(value in -1000.0f64..1000.0, index in 0usize..16) {
            for species in [Species::Canine, Species::Feline] {
                let (name, range) = &reference_table(species)[index];
                let row = evaluate_parameter(name, &value.to_string(), species);
                prop_assert_eq!(row.indicator == Indicator::High, value > range.max);
                prop_assert_eq!(row.indicator == Indicator::Low, value < range.min);
            }
        }
    }
}
