//! Bảng khoảng tham chiếu theo loài.

use crate::evaluate::format_fixed2;
use crate::Species;

/// Khoảng tham chiếu `[min, max]` và đơn vị của một chỉ số.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
}

impl ReferenceRange {
    const fn new(min: f64, max: f64, unit: &'static str) -> Self {
        Self { min, max, unit }
    }

    /// Dạng hiển thị `"min - max"` với hai chữ số thập phân.
    pub fn display(&self) -> String {
        format!("{} - {}", format_fixed2(self.min), format_fixed2(self.max))
    }
}

const CANINE: &[(&str, ReferenceRange)] = &[
    ("WBC", ReferenceRange::new(5.5, 16.9, "10^3/μL")),
    ("RBC", ReferenceRange::new(5.65, 8.87, "10^6/μL")),
    ("HGB", ReferenceRange::new(13.1, 20.5, "g/dL")),
    ("HCT", ReferenceRange::new(39.2, 61.7, "%")),
    ("MCV", ReferenceRange::new(61.6, 73.5, "fL")),
    ("MCH", ReferenceRange::new(21.2, 25.9, "pg")),
    ("MCHC", ReferenceRange::new(32.7, 35.8, "g/dL")),
    ("RDW_CV", ReferenceRange::new(13.5, 18.4, "%")),
    ("PLT", ReferenceRange::new(148.0, 484.0, "10^3/μL")),
    ("MPV", ReferenceRange::new(9.4, 12.6, "fL")),
    ("LYM#", ReferenceRange::new(0.92, 8.8, "10^3/μL")),
    ("MON#", ReferenceRange::new(0.1, 1.1, "10^3/μL")),
    ("GRA#", ReferenceRange::new(3.0, 12.0, "10^3/μL")),
    ("LYM%", ReferenceRange::new(12.0, 30.0, "%")),
    ("MON%", ReferenceRange::new(3.0, 10.0, "%")),
    ("GRA%", ReferenceRange::new(60.0, 83.0, "%")),
];

const FELINE: &[(&str, ReferenceRange)] = &[
    ("WBC", ReferenceRange::new(2.87, 17.02, "10^3/μL")),
    ("RBC", ReferenceRange::new(6.54, 12.2, "10^6/μL")),
    ("HGB", ReferenceRange::new(9.8, 16.2, "g/dL")),
    ("HCT", ReferenceRange::new(30.3, 52.3, "%")),
    ("MCV", ReferenceRange::new(35.9, 53.1, "fL")),
    ("MCH", ReferenceRange::new(11.8, 17.3, "pg")),
    ("MCHC", ReferenceRange::new(28.1, 35.8, "g/dL")),
    ("RDW_CV", ReferenceRange::new(15.0, 27.0, "%")),
    ("PLT", ReferenceRange::new(151.0, 600.0, "10^3/μL")),
    ("MPV", ReferenceRange::new(10.9, 22.0, "fL")),
    ("LYM#", ReferenceRange::new(0.92, 6.88, "10^3/μL")),
    ("MON#", ReferenceRange::new(0.05, 0.67, "10^3/μL")),
    ("GRA#", ReferenceRange::new(1.48, 10.29, "10^3/μL")),
    ("LYM%", ReferenceRange::new(20.0, 55.0, "%")),
    ("MON%", ReferenceRange::new(1.0, 4.0, "%")),
    ("GRA%", ReferenceRange::new(35.0, 75.0, "%")),
];

/// Toàn bộ bảng của một loài, theo thứ tự in.
pub fn reference_table(species: Species) -> &'static [(&'static str, ReferenceRange)] {
    match species {
        Species::Canine => CANINE,
        Species::Feline => FELINE,
    }
}

/// Tra khoảng tham chiếu theo tên chỉ số (khớp chính xác).
pub fn reference_range(species: Species, parameter: &str) -> Option<&'static ReferenceRange> {
    reference_table(species)
        .iter()
        .find(|(name, _)| *name == parameter)
        .map(|(_, range)| range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_cover_the_same_parameters() {
        let canine: Vec<_> = reference_table(Species::Canine).iter().map(|(n, _)| *n).collect();
        let feline: Vec<_> = reference_table(Species::Feline).iter().map(|(n, _)| *n).collect();
        assert_eq!(canine, feline);
        assert_eq!(canine.len(), 16);
    }

    #[test]
    fn every_range_is_ordered() {
        for species in [Species::Canine, Species::Feline] {
            for (name, range) in reference_table(species) {
                assert!(range.min < range.max, "{name} có min >= max");
            }
        }
    }

    #[test]
    fn lookup_is_species_specific() {
        let dog = reference_range(Species::Canine, "WBC").expect("WBC canine");
        let cat = reference_range(Species::Feline, "WBC").expect("WBC feline");
        assert_eq!(dog.display(), "5.50 - 16.90");
        assert_eq!(cat.display(), "2.87 - 17.02");
        assert!(reference_range(Species::Canine, "wbc").is_none());
        assert!(reference_range(Species::Feline, "EOS#").is_none());
    }
}
