use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::errors::RegistrationError;

/// Competition category of watercraft
///
/// Known classes carry capacity and role rules; anything else is kept
/// verbatim and treated as a single-seat boat by the policy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BoatClass {
    K1,
    K2,
    K4,
    C1,
    C2,
    C4,
    /// Dragon boat (ten paddling seats plus helm, drum and reserves)
    D10,
    Other(String),
}

impl BoatClass {
    pub fn is_dragon_boat(&self) -> bool {
        matches!(self, BoatClass::D10)
    }

    pub fn code(&self) -> &str {
        match self {
            BoatClass::K1 => "K-1",
            BoatClass::K2 => "K-2",
            BoatClass::K4 => "K-4",
            BoatClass::C1 => "C-1",
            BoatClass::C2 => "C-2",
            BoatClass::C4 => "C-4",
            BoatClass::D10 => "D-10",
            BoatClass::Other(code) => code,
        }
    }
}

impl FromStr for BoatClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Boat class cannot be empty".to_string());
        }

        let normalized: String = trimmed
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();

        Ok(match normalized.as_str() {
            "K1" => BoatClass::K1,
            "K2" => BoatClass::K2,
            "K4" => BoatClass::K4,
            "C1" => BoatClass::C1,
            "C2" => BoatClass::C2,
            "C4" => BoatClass::C4,
            "D10" => BoatClass::D10,
            _ => BoatClass::Other(trimmed.to_string()),
        })
    }
}

impl TryFrom<String> for BoatClass {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BoatClass> for String {
    fn from(value: BoatClass) -> Self {
        value.code().to_string()
    }
}

impl fmt::Display for BoatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Sex category of a discipline
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "sex_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SexCategory {
    Men,
    Women,
    Mixed,
}

impl fmt::Display for SexCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SexCategory::Men => write!(f, "men"),
            SexCategory::Women => write!(f, "women"),
            SexCategory::Mixed => write!(f, "mixed"),
        }
    }
}

/// Race distance in meters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distance(u32);

impl Distance {
    pub fn meters(meters: u32) -> Self {
        Self(meters)
    }

    pub fn as_meters(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

/// A selected (boat class, sex, distances) combination
///
/// # Invariants
/// - At least one distance is selected
/// - Distances are unique and kept sorted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DisciplineParts")]
pub struct Discipline {
    boat_class: BoatClass,
    sex: SexCategory,
    distances: BTreeSet<Distance>,
}

#[derive(Deserialize)]
struct DisciplineParts {
    boat_class: BoatClass,
    sex: SexCategory,
    distances: BTreeSet<Distance>,
}

impl TryFrom<DisciplineParts> for Discipline {
    type Error = String;

    fn try_from(parts: DisciplineParts) -> Result<Self, Self::Error> {
        Discipline::new(parts.boat_class, parts.sex, parts.distances).map_err(|e| e.to_string())
    }
}

impl Discipline {
    pub fn new(
        boat_class: BoatClass,
        sex: SexCategory,
        distances: impl IntoIterator<Item = Distance>,
    ) -> Result<Self, RegistrationError> {
        let distances: BTreeSet<Distance> = distances.into_iter().collect();
        if distances.is_empty() {
            return Err(RegistrationError::validation(
                "Discipline needs at least one distance",
            ));
        }

        Ok(Self {
            boat_class,
            sex,
            distances,
        })
    }

    pub fn boat_class(&self) -> &BoatClass {
        &self.boat_class
    }

    pub fn sex(&self) -> SexCategory {
        self.sex
    }

    pub fn distances(&self) -> &BTreeSet<Distance> {
        &self.distances
    }

    /// Same boat and sex category, regardless of distances
    pub fn same_category(&self, other: &Discipline) -> bool {
        self.boat_class == other.boat_class && self.sex == other.sex
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let distances = self
            .distances
            .iter()
            .map(Distance::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{} {} [{}]", self.boat_class, self.sex, distances)
    }
}

/// Published class → sex → distance catalogue of an event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisciplineCatalog(BTreeMap<BoatClass, BTreeMap<SexCategory, BTreeSet<Distance>>>);

impl DisciplineCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class/sex entry with its allowed distances
    pub fn with_entry(
        mut self,
        boat_class: BoatClass,
        sex: SexCategory,
        distances: impl IntoIterator<Item = Distance>,
    ) -> Self {
        self.0
            .entry(boat_class)
            .or_default()
            .entry(sex)
            .or_default()
            .extend(distances);
        self
    }

    /// Checks the selection is a subset of the published catalogue
    pub fn validate(&self, discipline: &Discipline) -> Result<(), RegistrationError> {
        let sexes = self.0.get(discipline.boat_class()).ok_or_else(|| {
            RegistrationError::validation(format!(
                "Boat class {} is not offered at this event",
                discipline.boat_class()
            ))
        })?;

        let distances = sexes.get(&discipline.sex()).ok_or_else(|| {
            RegistrationError::validation(format!(
                "Sex category {} is not offered for {}",
                discipline.sex(),
                discipline.boat_class()
            ))
        })?;

        let unknown: Vec<String> = discipline
            .distances()
            .iter()
            .filter(|d| !distances.contains(d))
            .map(Distance::to_string)
            .collect();

        if !unknown.is_empty() {
            return Err(RegistrationError::validation(format!(
                "Distances {} are not offered for {} {}",
                unknown.join(", "),
                discipline.boat_class(),
                discipline.sex()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> DisciplineCatalog {
        DisciplineCatalog::new()
            .with_entry(
                BoatClass::D10,
                SexCategory::Mixed,
                [Distance::meters(200), Distance::meters(500)],
            )
            .with_entry(BoatClass::K1, SexCategory::Women, [Distance::meters(200)])
    }

    #[test]
    fn boat_class_parses_loose_codes() {
        assert_eq!("k-1".parse::<BoatClass>().unwrap(), BoatClass::K1);
        assert_eq!("D10".parse::<BoatClass>().unwrap(), BoatClass::D10);
        assert_eq!(" c 2 ".parse::<BoatClass>().unwrap(), BoatClass::C2);
        assert_eq!(
            "SUP".parse::<BoatClass>().unwrap(),
            BoatClass::Other("SUP".to_string())
        );
        assert!("  ".parse::<BoatClass>().is_err());
    }

    #[test]
    fn boat_class_serializes_as_code() {
        let json = serde_json::to_string(&BoatClass::D10).unwrap();
        assert_eq!(json, "\"D-10\"");

        let parsed: BoatClass = serde_json::from_str("\"K-4\"").unwrap();
        assert_eq!(parsed, BoatClass::K4);
    }

    #[test]
    fn discipline_requires_distance() {
        let result = Discipline::new(BoatClass::K1, SexCategory::Men, Vec::<Distance>::new());
        assert!(matches!(result, Err(RegistrationError::Validation(_))));
    }

    #[test]
    fn discipline_deserialize_rejects_empty_distances() {
        let json = r#"{"boat_class":"K-1","sex":"men","distances":[]}"#;
        assert!(serde_json::from_str::<Discipline>(json).is_err());
    }

    #[test]
    fn discipline_deduplicates_distances() {
        let discipline = Discipline::new(
            BoatClass::K1,
            SexCategory::Men,
            [Distance::meters(500), Distance::meters(200), Distance::meters(500)],
        )
        .unwrap();

        assert_eq!(discipline.distances().len(), 2);
        assert_eq!(discipline.to_string(), "K-1 men [200m, 500m]");
    }

    #[test]
    fn catalog_accepts_subset() {
        let discipline = Discipline::new(
            BoatClass::D10,
            SexCategory::Mixed,
            [Distance::meters(500)],
        )
        .unwrap();

        assert!(catalog().validate(&discipline).is_ok());
    }

    #[test]
    fn catalog_rejects_unknown_class_sex_and_distance() {
        let class =
            Discipline::new(BoatClass::C1, SexCategory::Men, [Distance::meters(200)]).unwrap();
        let sex =
            Discipline::new(BoatClass::K1, SexCategory::Men, [Distance::meters(200)]).unwrap();
        let distance =
            Discipline::new(BoatClass::K1, SexCategory::Women, [Distance::meters(1000)]).unwrap();

        assert!(catalog().validate(&class).is_err());
        assert!(catalog().validate(&sex).is_err());
        let err = catalog().validate(&distance).unwrap_err();
        assert!(err.to_string().contains("1000m"));
    }

    #[test]
    fn catalog_round_trips_through_json() {
        let json = serde_json::to_value(catalog()).unwrap();
        assert_eq!(json["D-10"]["mixed"], serde_json::json!([200, 500]));

        let back: DisciplineCatalog = serde_json::from_value(json).unwrap();
        assert_eq!(back, catalog());
    }
}
