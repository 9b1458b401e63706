use serde::Serialize;

use crate::error::RowError;

/// Number of tokens a well-formed legacy row splits into.
pub const FIELD_COUNT: usize = 24;

/// How a canonical field is coerced out of its raw token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Passed through unchanged; an empty token stays an empty string.
    Text,
    /// Parsed as a base-10 integer; an empty token becomes null.
    Integer,
}

/// One of the fixed, ordered attributes a legacy row decomposes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Year,
    RegionCode,
    RegionName,
    SubRegionCode,
    SubRegionName,
    InstitutionName,
    InstitutionType,
    ProgramDuration,
    DegreeProgram,
    DayNightProgram,
    DepartmentStatus,
    DepartmentName,
    DepartmentCode,
    SevenCategory,
    StandardClassificationCode,
    InstitutionCategory,
    CollegeName,
    DepartmentCharacteristic,
    MainSubjects,
    AdmissionCapacity,
    GraduatesCount,
    RelatedOccupations,
    LastModified,
    DataAsOf,
}

impl CanonicalField {
    /// Token order of the legacy delimited string.
    pub const ALL: [CanonicalField; FIELD_COUNT] = [
        CanonicalField::Year,
        CanonicalField::RegionCode,
        CanonicalField::RegionName,
        CanonicalField::SubRegionCode,
        CanonicalField::SubRegionName,
        CanonicalField::InstitutionName,
        CanonicalField::InstitutionType,
        CanonicalField::ProgramDuration,
        CanonicalField::DegreeProgram,
        CanonicalField::DayNightProgram,
        CanonicalField::DepartmentStatus,
        CanonicalField::DepartmentName,
        CanonicalField::DepartmentCode,
        CanonicalField::SevenCategory,
        CanonicalField::StandardClassificationCode,
        CanonicalField::InstitutionCategory,
        CanonicalField::CollegeName,
        CanonicalField::DepartmentCharacteristic,
        CanonicalField::MainSubjects,
        CanonicalField::AdmissionCapacity,
        CanonicalField::GraduatesCount,
        CanonicalField::RelatedOccupations,
        CanonicalField::LastModified,
        CanonicalField::DataAsOf,
    ];

    /// Position of this field inside a legacy row.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn kind(self) -> FieldKind {
        match self {
            CanonicalField::AdmissionCapacity | CanonicalField::GraduatesCount => {
                FieldKind::Integer
            }
            _ => FieldKind::Text,
        }
    }

    /// Snake-case key used in logs and serialized records.
    pub fn key(self) -> &'static str {
        match self {
            CanonicalField::Year => "year",
            CanonicalField::RegionCode => "region_code",
            CanonicalField::RegionName => "region_name",
            CanonicalField::SubRegionCode => "sub_region_code",
            CanonicalField::SubRegionName => "sub_region_name",
            CanonicalField::InstitutionName => "institution_name",
            CanonicalField::InstitutionType => "institution_type",
            CanonicalField::ProgramDuration => "program_duration",
            CanonicalField::DegreeProgram => "degree_program",
            CanonicalField::DayNightProgram => "day_night_program",
            CanonicalField::DepartmentStatus => "department_status",
            CanonicalField::DepartmentName => "department_name",
            CanonicalField::DepartmentCode => "department_code",
            CanonicalField::SevenCategory => "seven_category",
            CanonicalField::StandardClassificationCode => "standard_classification_code",
            CanonicalField::InstitutionCategory => "institution_category",
            CanonicalField::CollegeName => "college_name",
            CanonicalField::DepartmentCharacteristic => "department_characteristic",
            CanonicalField::MainSubjects => "main_subjects",
            CanonicalField::AdmissionCapacity => "admission_capacity",
            CanonicalField::GraduatesCount => "graduates_count",
            CanonicalField::RelatedOccupations => "related_occupations",
            CanonicalField::LastModified => "last_modified",
            CanonicalField::DataAsOf => "data_as_of",
        }
    }

    /// Header label the legacy dataset publishes for this field.
    pub fn source_label(self) -> &'static str {
        match self {
            CanonicalField::Year => "연도",
            CanonicalField::RegionCode => "시도코드",
            CanonicalField::RegionName => "시도명",
            CanonicalField::SubRegionCode => "시군구코드",
            CanonicalField::SubRegionName => "시군구명",
            CanonicalField::InstitutionName => "학교명",
            CanonicalField::InstitutionType => "학교구분명",
            CanonicalField::ProgramDuration => "수업연한",
            CanonicalField::DegreeProgram => "학위과정명",
            CanonicalField::DayNightProgram => "주야과정명",
            CanonicalField::DepartmentStatus => "학과상태명",
            CanonicalField::DepartmentName => "학과명",
            CanonicalField::DepartmentCode => "학과코드명",
            CanonicalField::SevenCategory => "7대계열",
            CanonicalField::StandardClassificationCode => "표준분류계열코드",
            CanonicalField::InstitutionCategory => "대학자체계열명",
            CanonicalField::CollegeName => "단과대학명",
            CanonicalField::DepartmentCharacteristic => "학교학과특성명",
            CanonicalField::MainSubjects => "주요교과목명",
            CanonicalField::AdmissionCapacity => "입학정원수",
            CanonicalField::GraduatesCount => "졸업자수",
            CanonicalField::RelatedOccupations => "관련직업명",
            CanonicalField::LastModified => "수정일자",
            CanonicalField::DataAsOf => "데이터기준일자",
        }
    }
}

/// Split a raw legacy string on `delimiter`.
///
/// No quote or escape handling: a value that itself contains the delimiter
/// shifts the token count and the row is reported as malformed.
pub fn split_fields(raw: &str, delimiter: char) -> Result<[&str; FIELD_COUNT], RowError> {
    let tokens: Vec<&str> = raw.split(delimiter).collect();
    let actual = tokens.len();
    tokens.try_into().map_err(|_| RowError::Malformed {
        raw: raw.to_string(),
        expected: FIELD_COUNT,
        actual,
    })
}

/// Borrowed view of a single slot, keyed by [`CanonicalField`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    Integer(Option<i64>),
}

impl FieldValue<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Text(None) | FieldValue::Integer(None))
    }
}

/// A legacy row after splitting and type coercion. One slot per canonical field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LegacyFields {
    pub year: Option<String>,
    pub region_code: Option<String>,
    pub region_name: Option<String>,
    pub sub_region_code: Option<String>,
    pub sub_region_name: Option<String>,
    pub institution_name: Option<String>,
    pub institution_type: Option<String>,
    pub program_duration: Option<String>,
    pub degree_program: Option<String>,
    pub day_night_program: Option<String>,
    pub department_status: Option<String>,
    pub department_name: Option<String>,
    pub department_code: Option<String>,
    pub seven_category: Option<String>,
    pub standard_classification_code: Option<String>,
    pub institution_category: Option<String>,
    pub college_name: Option<String>,
    pub department_characteristic: Option<String>,
    pub main_subjects: Option<String>,
    pub admission_capacity: Option<i64>,
    pub graduates_count: Option<i64>,
    pub related_occupations: Option<String>,
    pub last_modified: Option<String>,
    pub data_as_of: Option<String>,
}

impl LegacyFields {
    /// Split and map in one step.
    pub fn parse(raw: &str, delimiter: char) -> Result<Self, RowError> {
        Self::from_tokens(split_fields(raw, delimiter)?)
    }

    /// Zip validated tokens against [`CanonicalField::ALL`].
    ///
    /// Every text slot is populated (possibly with an empty string). Integer
    /// slots are null for empty tokens; a non-numeric token fails the row.
    pub fn from_tokens(tokens: [&str; FIELD_COUNT]) -> Result<Self, RowError> {
        let mut record = LegacyFields::default();
        let mut invalid: Option<CanonicalField> = None;

        for (field, token) in CanonicalField::ALL.into_iter().zip(tokens) {
            match field.kind() {
                FieldKind::Text => {
                    if let Some(slot) = record.text_slot(field) {
                        *slot = Some(token.to_string());
                    }
                }
                FieldKind::Integer => match parse_count(token) {
                    Ok(value) => record.set_integer(field, value),
                    Err(_) => {
                        invalid.get_or_insert(field);
                    }
                },
            }
        }

        if let Some(field) = invalid {
            return Err(RowError::InvalidCount {
                field: field.key(),
                department_code: record.department_code.clone().unwrap_or_default(),
                admission_capacity: tokens[CanonicalField::AdmissionCapacity.index()].to_string(),
                graduates_count: tokens[CanonicalField::GraduatesCount.index()].to_string(),
            });
        }
        Ok(record)
    }

    pub fn get(&self, field: CanonicalField) -> FieldValue<'_> {
        match field {
            CanonicalField::AdmissionCapacity => FieldValue::Integer(self.admission_capacity),
            CanonicalField::GraduatesCount => FieldValue::Integer(self.graduates_count),
            other => FieldValue::Text(self.text_ref(other)),
        }
    }

    fn set_integer(&mut self, field: CanonicalField, value: Option<i64>) {
        match field {
            CanonicalField::AdmissionCapacity => self.admission_capacity = value,
            CanonicalField::GraduatesCount => self.graduates_count = value,
            _ => {}
        }
    }

    fn text_ref(&self, field: CanonicalField) -> Option<&str> {
        let slot = match field {
            CanonicalField::Year => &self.year,
            CanonicalField::RegionCode => &self.region_code,
            CanonicalField::RegionName => &self.region_name,
            CanonicalField::SubRegionCode => &self.sub_region_code,
            CanonicalField::SubRegionName => &self.sub_region_name,
            CanonicalField::InstitutionName => &self.institution_name,
            CanonicalField::InstitutionType => &self.institution_type,
            CanonicalField::ProgramDuration => &self.program_duration,
            CanonicalField::DegreeProgram => &self.degree_program,
            CanonicalField::DayNightProgram => &self.day_night_program,
            CanonicalField::DepartmentStatus => &self.department_status,
            CanonicalField::DepartmentName => &self.department_name,
            CanonicalField::DepartmentCode => &self.department_code,
            CanonicalField::SevenCategory => &self.seven_category,
            CanonicalField::StandardClassificationCode => &self.standard_classification_code,
            CanonicalField::InstitutionCategory => &self.institution_category,
            CanonicalField::CollegeName => &self.college_name,
            CanonicalField::DepartmentCharacteristic => &self.department_characteristic,
            CanonicalField::MainSubjects => &self.main_subjects,
            CanonicalField::RelatedOccupations => &self.related_occupations,
            CanonicalField::LastModified => &self.last_modified,
            CanonicalField::DataAsOf => &self.data_as_of,
            CanonicalField::AdmissionCapacity | CanonicalField::GraduatesCount => return None,
        };
        slot.as_deref()
    }

    fn text_slot(&mut self, field: CanonicalField) -> Option<&mut Option<String>> {
        let slot = match field {
            CanonicalField::Year => &mut self.year,
            CanonicalField::RegionCode => &mut self.region_code,
            CanonicalField::RegionName => &mut self.region_name,
            CanonicalField::SubRegionCode => &mut self.sub_region_code,
            CanonicalField::SubRegionName => &mut self.sub_region_name,
            CanonicalField::InstitutionName => &mut self.institution_name,
            CanonicalField::InstitutionType => &mut self.institution_type,
            CanonicalField::ProgramDuration => &mut self.program_duration,
            CanonicalField::DegreeProgram => &mut self.degree_program,
            CanonicalField::DayNightProgram => &mut self.day_night_program,
            CanonicalField::DepartmentStatus => &mut self.department_status,
            CanonicalField::DepartmentName => &mut self.department_name,
            CanonicalField::DepartmentCode => &mut self.department_code,
            CanonicalField::SevenCategory => &mut self.seven_category,
            CanonicalField::StandardClassificationCode => &mut self.standard_classification_code,
            CanonicalField::InstitutionCategory => &mut self.institution_category,
            CanonicalField::CollegeName => &mut self.college_name,
            CanonicalField::DepartmentCharacteristic => &mut self.department_characteristic,
            CanonicalField::MainSubjects => &mut self.main_subjects,
            CanonicalField::RelatedOccupations => &mut self.related_occupations,
            CanonicalField::LastModified => &mut self.last_modified,
            CanonicalField::DataAsOf => &mut self.data_as_of,
            CanonicalField::AdmissionCapacity | CanonicalField::GraduatesCount => return None,
        };
        Some(slot)
    }
}

/// Parse an integer-typed token. An empty token is null, not zero; padding
/// around digits is accepted but a whitespace-only token is not a number.
pub fn parse_count(token: &str) -> Result<Option<i64>, std::num::ParseIntError> {
    if token.is_empty() {
        return Ok(None);
    }
    token.trim().parse::<i64>().map(Some)
}

/// Treat an empty text slot as absent. Whitespace is a value.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
