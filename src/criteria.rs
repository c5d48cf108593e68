use serde::Serialize;

/// The seven accreditation criteria a record can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    CurricularAspects,
    TeachingLearning,
    Research,
    Infrastructure,
    StudentSupport,
    Governance,
    InstitutionalValues,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CriterionInfo {
    pub id: i32,
    pub code: &'static str,
    pub name: &'static str,
    pub weight: f64,
}

impl Criterion {
    pub const ALL: [Criterion; 7] = [
        Criterion::CurricularAspects,
        Criterion::TeachingLearning,
        Criterion::Research,
        Criterion::Infrastructure,
        Criterion::StudentSupport,
        Criterion::Governance,
        Criterion::InstitutionalValues,
    ];

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|criterion| criterion.id() == id)
    }

    pub fn id(self) -> i32 {
        match self {
            Criterion::CurricularAspects => 1,
            Criterion::TeachingLearning => 2,
            Criterion::Research => 3,
            Criterion::Infrastructure => 4,
            Criterion::StudentSupport => 5,
            Criterion::Governance => 6,
            Criterion::InstitutionalValues => 7,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Criterion::CurricularAspects => "CR-I",
            Criterion::TeachingLearning => "CR-II",
            Criterion::Research => "CR-III",
            Criterion::Infrastructure => "CR-IV",
            Criterion::StudentSupport => "CR-V",
            Criterion::Governance => "CR-VI",
            Criterion::InstitutionalValues => "CR-VII",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Criterion::CurricularAspects => "Curricular Aspects",
            Criterion::TeachingLearning => "Teaching-Learning & Evaluation",
            Criterion::Research => "Research, Innovations & Extension",
            Criterion::Infrastructure => "Infrastructure & Learning Resources",
            Criterion::StudentSupport => "Student Support & Progression",
            Criterion::Governance => "Governance, Leadership & Management",
            Criterion::InstitutionalValues => "Institutional Values & Best Practices",
        }
    }

    /// Relative weight of the criterion. Carried as data; no score uses it.
    pub fn weight(self) -> f64 {
        match self {
            Criterion::CurricularAspects => 0.15,
            Criterion::TeachingLearning => 0.20,
            Criterion::Research => 0.20,
            Criterion::Infrastructure => 0.10,
            Criterion::StudentSupport => 0.15,
            Criterion::Governance => 0.10,
            Criterion::InstitutionalValues => 0.10,
        }
    }

    pub fn info(self) -> CriterionInfo {
        CriterionInfo {
            id: self.id(),
            code: self.code(),
            name: self.name(),
            weight: self.weight(),
        }
    }
}

pub fn all_criteria() -> Vec<CriterionInfo> {
    Criterion::ALL.into_iter().map(Criterion::info).collect()
}

/// Display name for a stored criterion id, falling back to `Criteria {id}`
/// for ids outside the fixed table.
pub fn criteria_name(id: i32) -> String {
    match Criterion::from_id(id) {
        Some(criterion) => criterion.name().to_string(),
        None => format!("Criteria {id}"),
    }
}

pub fn criteria_code(id: i32) -> String {
    match Criterion::from_id(id) {
        Some(criterion) => criterion.code().to_string(),
        None => "N/A".to_string(),
    }
}
