//! Stand-in for the institutional records system.
//!
//! Profiles are fabricated from the local store. Course lists are seeded by
//! the person's id so they stay stable between calls; grades are drawn fresh
//! on every call.

use std::collections::HashMap;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::models::{
    Course, CourseGrade, Department, ExternalCourse, ExternalDepartment, ExternalProfile, Grade,
    Person, PersonType, Semester,
};
use crate::store::EntityStore;

#[async_trait]
pub trait RecordsService: Send + Sync {
    /// Resolves a person by email or numeric id.
    async fn get_profile(&self, identifier: &str) -> Result<ExternalProfile>;

    async fn get_grade(&self, person_id: i32, crn: i32, term_code: i32) -> Result<CourseGrade>;
}

pub struct MockRecordsService<S> {
    store: S,
}

impl<S: EntityStore> MockRecordsService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn current_semester(&self) -> Result<Semester> {
        self.store
            .semesters()
            .await?
            .into_iter()
            .max_by(|a, b| a.start_date.cmp(&b.start_date).then(a.code.cmp(&b.code)))
            .ok_or_else(|| Error::not_found("Semester", "current"))
    }

    async fn departments(&self) -> Result<HashMap<i32, Department>> {
        Ok(self
            .store
            .departments()
            .await?
            .into_iter()
            .map(|d| (d.code, d))
            .collect())
    }

    async fn enrolled_courses(&self, person_id: i32) -> Result<Vec<ExternalCourse>> {
        let take = course_count(&mut StdRng::seed_from_u64(person_id as u64));
        let mut courses = self.store.courses().await?;
        courses.sort_by_key(|c| c.crn);
        let departments = self.departments().await?;

        courses
            .iter()
            .take(take)
            .map(|course| {
                let department = department_of(course, &departments)?;
                Ok(ExternalCourse {
                    course_name: course.name.clone(),
                    short_name: course.short_name.clone(),
                    crn: course.crn,
                    department: ExternalDepartment {
                        code: department.code,
                        name: department.name.clone(),
                    },
                })
            })
            .collect()
    }
}

/// Between two and six courses.
fn course_count(rng: &mut StdRng) -> usize {
    let draw: f64 = rng.random();
    (draw * 5.0).ceil().max(1.0) as usize + 1
}

/// Each call seeds its own generator from the OS.
fn draw_grade() -> Grade {
    let index = StdRng::from_os_rng().random_range(0..Grade::ALL.len());
    Grade::ALL[index]
}

fn department_of<'a>(
    course: &Course,
    departments: &'a HashMap<i32, Department>,
) -> Result<&'a Department> {
    departments.get(&course.department_code).ok_or_else(|| {
        Error::UpstreamUnavailable(format!(
            "course {} references missing department {}",
            course.crn, course.department_code
        ))
    })
}

#[async_trait]
impl<S: EntityStore> RecordsService for MockRecordsService<S> {
    async fn get_profile(&self, identifier: &str) -> Result<ExternalProfile> {
        let person = self
            .store
            .find_person(&|p: &Person| p.email == identifier || p.id.to_string() == identifier)
            .await?
            .ok_or_else(|| Error::not_found("Person", identifier))?;

        let semester = self.current_semester().await?;
        let (teacher, courses) = match person.person_type {
            PersonType::Student => (false, Some(self.enrolled_courses(person.id).await?)),
            PersonType::Staff => (true, None),
        };

        tracing::debug!(
            person_id = person.id,
            term_code = semester.code,
            courses = courses.as_ref().map_or(0, Vec::len),
            "fabricated records profile"
        );

        Ok(ExternalProfile {
            id: person.id,
            email: person.email,
            first_name: person.first_name,
            last_name: person.last_name,
            term_code: semester.code,
            teacher,
            courses,
        })
    }

    async fn get_grade(&self, person_id: i32, crn: i32, term_code: i32) -> Result<CourseGrade> {
        let course = self
            .store
            .find_course(&|c: &Course| c.crn == crn)
            .await?
            .ok_or_else(|| Error::not_found("Course", crn))?;
        let departments = self.departments().await?;
        let department = department_of(&course, &departments)?;
        let final_grade = draw_grade();

        tracing::debug!(person_id, crn, term_code, ?final_grade, "fabricated course grade");

        Ok(CourseGrade {
            crn: course.crn,
            course_name: course.name,
            department_name: department.name.clone(),
            final_grade,
        })
    }
}
