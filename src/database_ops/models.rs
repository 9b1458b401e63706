use serde::Serialize;

use crate::normalization::fields::{non_empty, LegacyFields};

/// A university, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Institution {
    pub name: String,
    pub address: Option<String>,
}

impl Institution {
    /// `None` when the row carries no institution name.
    pub fn from_fields(fields: &LegacyFields) -> Option<Self> {
        let name = non_empty(fields.institution_name.as_deref())?;
        Some(Self {
            name: name.to_string(),
            address: compose_address(
                fields.region_name.as_deref(),
                fields.sub_region_name.as_deref(),
            ),
        })
    }
}

/// `"<region> <sub-region>"` when both parts are present, otherwise null.
pub fn compose_address(region: Option<&str>, sub_region: Option<&str>) -> Option<String> {
    match (non_empty(region), non_empty(sub_region)) {
        (Some(region), Some(sub_region)) => Some(format!("{region} {sub_region}")),
        _ => None,
    }
}

/// A department, keyed by its department code and owned by an institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Department {
    pub code: String,
    pub institution_name: String,
    pub name: Option<String>,
    pub seven_category: Option<String>,
    pub standard_classification_code: Option<String>,
    pub institution_category: Option<String>,
    pub college_name: Option<String>,
    pub characteristic: Option<String>,
    pub main_subjects: Option<String>,
    pub admission_capacity: Option<i64>,
    pub graduates_count: Option<i64>,
    pub related_occupations: Option<String>,
}

impl Department {
    /// `None` when the row carries no department code.
    pub fn from_fields(fields: &LegacyFields) -> Option<Self> {
        let code = non_empty(fields.department_code.as_deref())?;
        Some(Self {
            code: code.to_string(),
            institution_name: fields.institution_name.clone().unwrap_or_default(),
            name: fields.department_name.clone(),
            seven_category: fields.seven_category.clone(),
            standard_classification_code: fields.standard_classification_code.clone(),
            institution_category: fields.institution_category.clone(),
            college_name: fields.college_name.clone(),
            characteristic: fields.department_characteristic.clone(),
            main_subjects: fields.main_subjects.clone(),
            admission_capacity: fields.admission_capacity,
            graduates_count: fields.graduates_count,
            related_occupations: fields.related_occupations.clone(),
        })
    }
}

/// Competition and cutoff figures for one department, year and admission track.
///
/// Legacy rows carry none of these numbers; rows come from the admission-results
/// import instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmissionResult {
    pub department_code: String,
    pub admission_year: i64,
    pub admission_type: Option<String>,
    pub competition_rate: Option<f64>,
    pub cutoff_70_percent: Option<f64>,
    pub cutoff_50_percent: Option<f64>,
    pub average_score: Option<f64>,
}
