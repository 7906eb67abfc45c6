//! Chia kết quả thành một hoặc hai cột khi in.

use crate::ResultRow;

/// Các cột kết quả theo thứ tự hiển thị.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout<'a> {
    pub columns: Vec<&'a [ResultRow]>,
}

impl<'a> ReportLayout<'a> {
    /// Hai cột khi số kết quả vượt `threshold`; cột đầu nhận phần dư.
    pub fn from_results(results: &'a [ResultRow], threshold: usize) -> Self {
        if results.len() <= threshold {
            return Self {
                columns: vec![results],
            };
        }

        let midpoint = results.len().div_ceil(2);
        let (first, second) = results.split_at(midpoint);
        Self {
            columns: vec![first, second],
        }
    }

    pub fn is_two_column(&self) -> bool {
        self.columns.len() == 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Indicator;

    fn rows(count: usize) -> Vec<ResultRow> {
        (0..count)
            .map(|index| ResultRow {
                parameter: format!("P{index}"),
                result: "1.00".to_string(),
                indicator: Indicator::None,
                range: "N/A".to_string(),
                unit: String::new(),
            })
            .collect()
    }

    #[test]
    fn small_reports_stay_single_column() {
        let results = rows(8);
        let layout = ReportLayout::from_results(&results, 8);
        assert!(!layout.is_two_column());
        assert_eq!(layout.columns[0].len(), 8);
    }

    #[test]
    fn odd_count_puts_extra_row_first() {
        let results = rows(9);
        let layout = ReportLayout::from_results(&results, 8);
        assert!(layout.is_two_column());
        assert_eq!(layout.columns[0].len(), 5);
        assert_eq!(layout.columns[1].len(), 4);
        assert_eq!(layout.columns[1][0].parameter, "P5");
    }

    #[test]
    fn empty_results_yield_one_empty_column() {
        let layout = ReportLayout::from_results(&[], 0);
        assert_eq!(layout.columns.len(), 1);
        assert!(layout.columns[0].is_empty());
    }
}
