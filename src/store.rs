use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::models::{
    ClassTour, Course, Department, Person, Reason, Semester, SignIn, SignInViewModel,
};

/// Read access to the sign-in system's records.
///
/// Listings carry no ordering guarantee; callers that depend on order sort
/// explicitly.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn people(&self) -> Result<Vec<Person>>;
    async fn semesters(&self) -> Result<Vec<Semester>>;
    async fn departments(&self) -> Result<Vec<Department>>;
    async fn courses(&self) -> Result<Vec<Course>>;
    async fn reasons(&self) -> Result<Vec<Reason>>;
    async fn class_tours(&self) -> Result<Vec<ClassTour>>;
    async fn sign_ins(&self) -> Result<Vec<SignIn>>;

    /// Sign-ins whose in-time lies in `[start, end]`.
    async fn sign_ins_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<SignIn>> {
        Ok(self
            .sign_ins()
            .await?
            .into_iter()
            .filter(|s| s.in_time >= start && s.in_time <= end)
            .collect())
    }

    /// One page of visit rows for `[start, end]`, ordered by in-time then id,
    /// joined with their person and semester.
    async fn sign_in_page(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        skip: usize,
        take: usize,
    ) -> Result<Vec<SignInViewModel>> {
        let mut sign_ins = self.sign_ins_between(start, end).await?;
        sign_ins.sort_by(|a, b| a.in_time.cmp(&b.in_time).then(a.id.cmp(&b.id)));
        let page: Vec<SignIn> = sign_ins.into_iter().skip(skip).take(take).collect();

        if page.is_empty() {
            return Ok(Vec::new());
        }

        let people: HashMap<i32, Person> = self
            .people()
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let semesters: HashMap<i32, Semester> = self
            .semesters()
            .await?
            .into_iter()
            .map(|s| (s.code, s))
            .collect();

        page.iter()
            .map(|sign_in| project(sign_in, &people, &semesters))
            .collect()
    }

    async fn find_person(
        &self,
        predicate: &(dyn for<'p> Fn(&'p Person) -> bool + Send + Sync),
    ) -> Result<Option<Person>> {
        Ok(self.people().await?.into_iter().find(|p| predicate(p)))
    }

    async fn find_course(
        &self,
        predicate: &(dyn for<'c> Fn(&'c Course) -> bool + Send + Sync),
    ) -> Result<Option<Course>> {
        Ok(self.courses().await?.into_iter().find(|c| predicate(c)))
    }
}

fn project(
    sign_in: &SignIn,
    people: &HashMap<i32, Person>,
    semesters: &HashMap<i32, Semester>,
) -> Result<SignInViewModel> {
    let person = people.get(&sign_in.person_id).ok_or_else(|| {
        Error::UpstreamUnavailable(format!(
            "sign-in {} references missing person {}",
            sign_in.id, sign_in.person_id
        ))
    })?;
    let semester = semesters.get(&sign_in.semester_code).ok_or_else(|| {
        Error::UpstreamUnavailable(format!(
            "sign-in {} references missing semester {}",
            sign_in.id, sign_in.semester_code
        ))
    })?;

    Ok(SignInViewModel {
        id: sign_in.id,
        person_id: person.id,
        email: person.email.clone(),
        first_name: person.first_name.clone(),
        last_name: person.last_name.clone(),
        full_name: person.full_name(),
        in_time: sign_in.in_time,
        out_time: sign_in.out_time,
        semester_id: semester.code,
        semester_name: semester.name.clone(),
        tutoring: sign_in.tutoring,
    })
}

/// Vec-backed store used by tests and local tooling.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    people: Vec<Person>,
    semesters: Vec<Semester>,
    departments: Vec<Department>,
    courses: Vec<Course>,
    reasons: Vec<Reason>,
    class_tours: Vec<ClassTour>,
    sign_ins: Vec<SignIn>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_person(&mut self, person: Person) {
        self.people.push(person);
    }

    pub fn insert_semester(&mut self, semester: Semester) {
        self.semesters.push(semester);
    }

    pub fn insert_department(&mut self, department: Department) {
        self.departments.push(department);
    }

    pub fn insert_course(&mut self, course: Course) {
        self.courses.push(course);
    }

    pub fn insert_reason(&mut self, reason: Reason) {
        self.reasons.push(reason);
    }

    pub fn insert_class_tour(&mut self, tour: ClassTour) {
        self.class_tours.push(tour);
    }

    pub fn insert_sign_in(&mut self, sign_in: SignIn) -> Result<()> {
        sign_in.validate()?;
        self.sign_ins.push(sign_in);
        Ok(())
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn people(&self) -> Result<Vec<Person>> {
        Ok(self.people.clone())
    }

    async fn semesters(&self) -> Result<Vec<Semester>> {
        Ok(self.semesters.clone())
    }

    async fn departments(&self) -> Result<Vec<Department>> {
        Ok(self.departments.clone())
    }

    async fn courses(&self) -> Result<Vec<Course>> {
        Ok(self.courses.clone())
    }

    async fn reasons(&self) -> Result<Vec<Reason>> {
        Ok(self.reasons.clone())
    }

    async fn class_tours(&self) -> Result<Vec<ClassTour>> {
        Ok(self.class_tours.clone())
    }

    async fn sign_ins(&self) -> Result<Vec<SignIn>> {
        Ok(self.sign_ins.clone())
    }
}
