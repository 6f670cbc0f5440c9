use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{
    ClassTour, Course, Department, Person, PersonType, Reason, Semester, SignIn,
};
use crate::store::MemoryStore;

pub fn at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
    at_minute(month, day, hour, 0)
}

pub fn at_minute(month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .expect("valid test timestamp")
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

fn person(id: i32, first: &str, last: &str, person_type: PersonType) -> Person {
    Person {
        id,
        email: format!("{}.{}@example.edu", first.to_lowercase(), last.to_lowercase()),
        first_name: first.to_string(),
        last_name: last.to_string(),
        person_type,
    }
}

fn course(crn: i32, name: &str, short_name: &str, department_code: i32) -> Course {
    Course {
        crn,
        name: name.to_string(),
        short_name: short_name.to_string(),
        department_code,
    }
}

fn visit(
    id: i32,
    person_id: i32,
    in_time: NaiveDateTime,
    out_time: Option<NaiveDateTime>,
    tutoring: bool,
) -> SignIn {
    SignIn {
        id,
        person_id,
        semester_code: 202401,
        in_time,
        out_time,
        tutoring,
        reason_id: if tutoring { None } else { Some(1) },
    }
}

/// Three people, three semesters, seven courses and six visits. Records are
/// inserted out of their natural order on purpose.
pub fn sample_store() -> MemoryStore {
    let mut store = MemoryStore::new();

    store.insert_person(person(1, "Avery", "Lee", PersonType::Student));
    store.insert_person(person(2, "Jules", "Moreno", PersonType::Student));
    store.insert_person(person(3, "Kiara", "Patel", PersonType::Staff));

    store.insert_semester(Semester {
        code: 202401,
        name: "Spring 2024".to_string(),
        start_date: date(2024, 1, 10),
        end_date: date(2024, 5, 5),
    });
    store.insert_semester(Semester {
        code: 202408,
        name: "Fall 2024".to_string(),
        start_date: date(2024, 8, 20),
        end_date: date(2024, 12, 15),
    });
    store.insert_semester(Semester {
        code: 202305,
        name: "Summer 2023".to_string(),
        start_date: date(2023, 5, 15),
        end_date: date(2023, 8, 1),
    });

    store.insert_department(Department { code: 1, name: "Mathematics".to_string() });
    store.insert_department(Department { code: 2, name: "English".to_string() });
    store.insert_department(Department { code: 3, name: "Computer Science".to_string() });

    store.insert_course(course(30012, "Introduction to Computing", "CS 101", 3));
    store.insert_course(course(10001, "College Algebra", "MATH 126", 1));
    store.insert_course(course(20005, "Composition I", "ENGL 101", 2));
    store.insert_course(course(10002, "Calculus I", "MATH 155", 1));
    store.insert_course(course(30100, "Programming I", "CS 121", 3));
    store.insert_course(course(20110, "Composition II", "ENGL 102", 2));
    store.insert_course(course(10300, "Linear Algebra", "MATH 250", 1));

    store.insert_reason(Reason { id: 1, name: "Computer Use".to_string(), deleted: false });

    store.insert_class_tour(ClassTour {
        id: 1,
        name: "Valley High".to_string(),
        day_visited: date(2024, 2, 8),
        number_of_students: 24,
    });
    store.insert_class_tour(ClassTour {
        id: 2,
        name: "Ridge Middle".to_string(),
        day_visited: date(2024, 4, 2),
        number_of_students: 30,
    });

    let visits = [
        visit(1, 1, at_minute(2, 5, 13, 15), Some(at(2, 5, 14)), true),
        visit(2, 2, at_minute(2, 5, 9, 5), Some(at_minute(2, 5, 9, 50)), true),
        visit(3, 1, at_minute(2, 6, 9, 40), None, false),
        visit(4, 3, at_minute(2, 7, 10, 20), Some(at(2, 7, 11)), false),
        visit(5, 2, at_minute(2, 9, 13, 55), Some(at_minute(2, 9, 15, 10)), true),
        visit(6, 1, at(3, 4, 11), Some(at(3, 4, 12)), true),
    ];
    for sign_in in visits {
        store.insert_sign_in(sign_in).expect("valid test visit");
    }

    store
}
