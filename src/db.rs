use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::{Error, Result};
use crate::models::{
    check_visit_times, ClassTour, Course, Department, Person, PersonType, Reason, Semester, SignIn,
    SignInViewModel,
};
use crate::store::EntityStore;

pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres-backed entity store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SIGN_IN_COLUMNS: &str =
    "id, person_id, semester_code, in_time, out_time, tutoring, reason_id";

/// Unknown stored values are a store failure, not a caller error.
fn person_type_from_column(person_id: i32, value: &str) -> Result<PersonType> {
    PersonType::parse(value).map_err(|_| {
        Error::UpstreamUnavailable(format!(
            "person {person_id} has unknown person_type `{value}`"
        ))
    })
}

fn sign_in_from_row(row: &PgRow) -> SignIn {
    SignIn {
        id: row.get("id"),
        person_id: row.get("person_id"),
        semester_code: row.get("semester_code"),
        in_time: row.get("in_time"),
        out_time: row.get("out_time"),
        tutoring: row.get("tutoring"),
        reason_id: row.get("reason_id"),
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn people(&self) -> Result<Vec<Person>> {
        let rows = sqlx::query(
            "SELECT id, email, first_name, last_name, person_type FROM tutoring_center.people",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut people = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i32 = row.get("id");
            let person_type: String = row.get("person_type");
            people.push(Person {
                id,
                email: row.get("email"),
                first_name: row.get("first_name"),
                last_name: row.get("last_name"),
                person_type: person_type_from_column(id, &person_type)?,
            });
        }
        Ok(people)
    }

    async fn semesters(&self) -> Result<Vec<Semester>> {
        let rows = sqlx::query("SELECT code, name, start_date, end_date FROM tutoring_center.semesters")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Semester {
                code: row.get("code"),
                name: row.get("name"),
                start_date: row.get("start_date"),
                end_date: row.get("end_date"),
            })
            .collect())
    }

    async fn departments(&self) -> Result<Vec<Department>> {
        let rows = sqlx::query("SELECT code, name FROM tutoring_center.departments")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Department {
                code: row.get("code"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn courses(&self) -> Result<Vec<Course>> {
        let rows = sqlx::query(
            "SELECT crn, name, short_name, department_code FROM tutoring_center.courses",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Course {
                crn: row.get("crn"),
                name: row.get("name"),
                short_name: row.get("short_name"),
                department_code: row.get("department_code"),
            })
            .collect())
    }

    async fn reasons(&self) -> Result<Vec<Reason>> {
        let rows = sqlx::query("SELECT id, name, deleted FROM tutoring_center.reasons")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Reason {
                id: row.get("id"),
                name: row.get("name"),
                deleted: row.get("deleted"),
            })
            .collect())
    }

    async fn class_tours(&self) -> Result<Vec<ClassTour>> {
        let rows = sqlx::query(
            "SELECT id, name, day_visited, number_of_students FROM tutoring_center.class_tours",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| ClassTour {
                id: row.get("id"),
                name: row.get("name"),
                day_visited: row.get("day_visited"),
                number_of_students: row.get("number_of_students"),
            })
            .collect())
    }

    async fn sign_ins(&self) -> Result<Vec<SignIn>> {
        let query = format!("SELECT {SIGN_IN_COLUMNS} FROM tutoring_center.sign_ins");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(sign_in_from_row).collect())
    }

    async fn sign_ins_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<SignIn>> {
        let query = format!(
            "SELECT {SIGN_IN_COLUMNS} FROM tutoring_center.sign_ins \
             WHERE in_time >= $1 AND in_time <= $2"
        );
        let rows = sqlx::query(&query)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(sign_in_from_row).collect())
    }

    async fn sign_in_page(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        skip: usize,
        take: usize,
    ) -> Result<Vec<SignInViewModel>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.person_id, p.email, p.first_name, p.last_name,
                   s.in_time, s.out_time, s.semester_code, se.name AS semester_name, s.tutoring
            FROM tutoring_center.sign_ins s
            JOIN tutoring_center.people p ON p.id = s.person_id
            JOIN tutoring_center.semesters se ON se.code = s.semester_code
            WHERE s.in_time >= $1 AND s.in_time <= $2
            ORDER BY s.in_time, s.id
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(i64::try_from(skip).unwrap_or(i64::MAX))
        .bind(i64::try_from(take).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let first_name: String = row.get("first_name");
                let last_name: String = row.get("last_name");
                SignInViewModel {
                    id: row.get("id"),
                    person_id: row.get("person_id"),
                    email: row.get("email"),
                    full_name: format!("{first_name} {last_name}"),
                    first_name,
                    last_name,
                    in_time: row.get("in_time"),
                    out_time: row.get("out_time"),
                    semester_id: row.get("semester_code"),
                    semester_name: row.get("semester_name"),
                    tutoring: row.get("tutoring"),
                }
            })
            .collect())
    }
}

fn seed_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::InvalidInput(format!("invalid date {year}-{month}-{day}")))
}

fn seed_time(date: NaiveDate, hour: u32, minute: u32) -> Result<NaiveDateTime> {
    date.and_hms_opt(hour, minute, 0)
        .ok_or_else(|| Error::InvalidInput(format!("invalid time {hour}:{minute}")))
}

pub async fn seed(pool: &PgPool) -> Result<()> {
    let departments = vec![(1, "Mathematics"), (2, "English"), (3, "Computer Science")];
    for (code, name) in departments {
        sqlx::query(
            r#"
            INSERT INTO tutoring_center.departments (code, name)
            VALUES ($1, $2)
            ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(code)
        .bind(name)
        .execute(pool)
        .await?;
    }

    let courses = vec![
        (10001, "College Algebra", "MATH 126", 1),
        (10002, "Calculus I", "MATH 155", 1),
        (20005, "Composition I", "ENGL 101", 2),
        (20110, "Composition II", "ENGL 102", 2),
        (30012, "Introduction to Computing", "CS 101", 3),
        (30100, "Programming I", "CS 121", 3),
    ];
    for (crn, name, short_name, department_code) in courses {
        sqlx::query(
            r#"
            INSERT INTO tutoring_center.courses (crn, name, short_name, department_code)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (crn) DO UPDATE
            SET name = EXCLUDED.name, short_name = EXCLUDED.short_name,
                department_code = EXCLUDED.department_code
            "#,
        )
        .bind(crn)
        .bind(name)
        .bind(short_name)
        .bind(department_code)
        .execute(pool)
        .await?;
    }

    let semesters = vec![
        (202401, "Spring 2024", seed_date(2024, 1, 10)?, seed_date(2024, 5, 5)?),
        (202408, "Fall 2024", seed_date(2024, 8, 20)?, seed_date(2024, 12, 15)?),
    ];
    for (code, name, start_date, end_date) in semesters {
        sqlx::query(
            r#"
            INSERT INTO tutoring_center.semesters (code, name, start_date, end_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO UPDATE
            SET name = EXCLUDED.name, start_date = EXCLUDED.start_date, end_date = EXCLUDED.end_date
            "#,
        )
        .bind(code)
        .bind(name)
        .bind(start_date)
        .bind(end_date)
        .execute(pool)
        .await?;
    }

    let people = vec![
        (700101, "avery.lee@example.edu", "Avery", "Lee", PersonType::Student),
        (700102, "jules.moreno@example.edu", "Jules", "Moreno", PersonType::Student),
        (700201, "kiara.patel@example.edu", "Kiara", "Patel", PersonType::Staff),
    ];
    for (id, email, first_name, last_name, person_type) in people {
        sqlx::query(
            r#"
            INSERT INTO tutoring_center.people (id, email, first_name, last_name, person_type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email, first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name, person_type = EXCLUDED.person_type
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(person_type.as_str())
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO tutoring_center.reasons (id, name, deleted)
        VALUES (1, 'Computer Use', FALSE), (2, 'Printing', FALSE)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .execute(pool)
    .await?;

    let visit_day = seed_date(2024, 2, 5)?;
    let signs = vec![
        ("seed-001", 700101, seed_time(visit_day, 9, 5)?, Some(seed_time(visit_day, 9, 50)?), true, None),
        ("seed-002", 700102, seed_time(visit_day, 13, 15)?, Some(seed_time(visit_day, 14, 0)?), true, None),
        ("seed-003", 700201, seed_time(visit_day, 13, 40)?, None, false, Some(1)),
    ];
    for (source_key, person_id, in_time, out_time, tutoring, reason_id) in signs {
        check_visit_times(in_time, out_time)?;
        sqlx::query(
            r#"
            INSERT INTO tutoring_center.sign_ins
            (person_id, semester_code, in_time, out_time, tutoring, reason_id, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(person_id)
        .bind(202401)
        .bind(in_time)
        .bind(out_time)
        .bind(tutoring)
        .bind(reason_id)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO tutoring_center.class_tours (name, day_visited, number_of_students)
        SELECT 'Valley High', DATE '2024-02-08', 24
        WHERE NOT EXISTS (
            SELECT 1 FROM tutoring_center.class_tours
            WHERE name = 'Valley High' AND day_visited = DATE '2024-02-08'
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(Debug, serde::Deserialize)]
struct CsvSignIn {
    email: String,
    semester_code: i32,
    in_time: NaiveDateTime,
    out_time: Option<NaiveDateTime>,
    tutoring: bool,
    reason_id: Option<i32>,
    source_key: Option<String>,
}

/// Imports sign-ins keyed by person email. Rows already imported under the
/// same `source_key` are skipped. Returns the number of new visits.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .map_err(|e| Error::InvalidInput(format!("{}: {e}", csv_path.display())))?;
    let mut inserted = 0usize;

    for (index, result) in reader.deserialize::<CsvSignIn>().enumerate() {
        let line = index + 2;
        let row = result.map_err(|e| Error::InvalidInput(format!("line {line}: {e}")))?;
        check_visit_times(row.in_time, row.out_time).map_err(|e| match e {
            Error::InvalidInput(msg) => Error::InvalidInput(format!("line {line}: {msg}")),
            other => other,
        })?;

        let person_id: i32 = sqlx::query("SELECT id FROM tutoring_center.people WHERE email = $1")
            .bind(&row.email)
            .fetch_optional(pool)
            .await?
            .map(|r| r.get::<i32, _>("id"))
            .ok_or_else(|| Error::not_found("Person", &row.email))?;

        let source_key = row.source_key.unwrap_or_else(|| {
            format!("import-{}-{}", row.email, row.in_time.format("%Y%m%dT%H%M%S"))
        });

        let result = sqlx::query(
            r#"
            INSERT INTO tutoring_center.sign_ins
            (person_id, semester_code, in_time, out_time, tutoring, reason_id, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(person_id)
        .bind(row.semester_code)
        .bind(row.in_time)
        .bind(row.out_time)
        .bind(row.tutoring)
        .bind(row.reason_id)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    tracing::info!(inserted, path = %csv_path.display(), "imported sign-ins");
    Ok(inserted)
}
