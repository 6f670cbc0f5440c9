use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::peak_hours;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonType {
    Student,
    Staff,
}

impl PersonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonType::Student => "student",
            PersonType::Staff => "staff",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(PersonType::Student),
            "staff" | "teacher" => Ok(PersonType::Staff),
            other => Err(Error::InvalidInput(format!("unknown person type `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub person_type: PersonType,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semester {
    pub code: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub code: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub crn: i32,
    pub name: String,
    pub short_name: String,
    pub department_code: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    pub id: i32,
    pub name: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTour {
    pub id: i32,
    pub name: String,
    pub day_visited: NaiveDate,
    pub number_of_students: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignIn {
    pub id: i32,
    pub person_id: i32,
    pub semester_code: i32,
    pub in_time: NaiveDateTime,
    pub out_time: Option<NaiveDateTime>,
    pub tutoring: bool,
    pub reason_id: Option<i32>,
}

impl SignIn {
    pub fn validate(&self) -> Result<()> {
        check_visit_times(self.in_time, self.out_time).map_err(|err| match err {
            Error::InvalidInput(msg) => Error::InvalidInput(format!("sign-in {}: {msg}", self.id)),
            other => other,
        })
    }
}

/// A visit cannot end before it starts.
pub fn check_visit_times(in_time: NaiveDateTime, out_time: Option<NaiveDateTime>) -> Result<()> {
    match out_time {
        Some(out_time) if out_time < in_time => Err(Error::InvalidInput(format!(
            "checks out at {out_time} before checking in at {in_time}"
        ))),
        _ => Ok(()),
    }
}

/// Flattened visit row produced by the lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignInViewModel {
    pub id: i32,
    pub person_id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub in_time: NaiveDateTime,
    pub out_time: Option<NaiveDateTime>,
    pub semester_id: i32,
    pub semester_name: String,
    pub tutoring: bool,
}

/// A person together with a summary of their visits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonInfo {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub person_type: PersonType,
    pub visit_count: usize,
    pub last_visit: Option<SignIn>,
}

/// Visit count for one hour of the day. Only the formatted label is public.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakHours {
    hour: u32,
    pub count: usize,
}

impl PeakHours {
    pub fn new(hour: u32, count: usize) -> Self {
        Self { hour, count }
    }

    pub fn label(&self) -> &'static str {
        peak_hours::format_hour(self.hour).unwrap_or(peak_hours::UNRECOGNIZED_HOUR)
    }

    pub fn is_recognized(&self) -> bool {
        peak_hours::format_hour(self.hour).is_ok()
    }
}

impl Serialize for PeakHours {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PeakHours", 2)?;
        state.serialize_field("hour", self.label())?;
        state.serialize_field("count", &self.count)?;
        state.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
    I,
    W,
}

impl Grade {
    pub const ALL: [Grade; 7] = [
        Grade::A,
        Grade::B,
        Grade::C,
        Grade::D,
        Grade::F,
        Grade::I,
        Grade::W,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalDepartment {
    pub code: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalCourse {
    pub course_name: String,
    pub short_name: String,
    pub crn: i32,
    pub department: ExternalDepartment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalProfile {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub term_code: i32,
    pub teacher: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<ExternalCourse>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseGrade {
    pub crn: i32,
    pub course_name: String,
    pub department_name: String,
    pub final_grade: Grade,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, 3)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .unwrap()
    }

    #[test]
    fn sign_in_rejects_checkout_before_checkin() {
        let visit = SignIn {
            id: 1,
            person_id: 7,
            semester_code: 202401,
            in_time: at(10, 30),
            out_time: Some(at(10, 0)),
            tutoring: true,
            reason_id: None,
        };
        assert!(matches!(visit.validate(), Err(Error::InvalidInput(_))));

        let open = SignIn { out_time: None, ..visit.clone() };
        assert!(open.validate().is_ok());
    }

    #[test]
    fn person_type_accepts_teacher_alias() {
        assert_eq!(PersonType::parse("Teacher").unwrap(), PersonType::Staff);
        assert_eq!(PersonType::parse("student").unwrap(), PersonType::Student);
        assert!(PersonType::parse("alumni").is_err());
    }

    #[test]
    fn peak_hours_serialize_only_the_label() {
        let json = serde_json::to_value(PeakHours::new(13, 4)).unwrap();
        assert_eq!(json, serde_json::json!({ "hour": "1 P.M", "count": 4 }));

        let unknown = PeakHours::new(24, 1);
        assert_eq!(unknown.label(), "Something went wrong");
        assert!(!unknown.is_recognized());
    }
}
