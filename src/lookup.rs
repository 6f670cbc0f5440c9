use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::models::{Person, PersonInfo, SignIn, SignInViewModel};
use crate::store::EntityStore;

/// Visits that started in `[start, end]`, ordered by in-time (then id),
/// paged with `skip`/`take` and flattened into report rows.
pub async fn lookup<S>(
    store: &S,
    start: NaiveDateTime,
    end: NaiveDateTime,
    skip: i64,
    take: i64,
) -> Result<Vec<SignInViewModel>>
where
    S: EntityStore + ?Sized,
{
    if skip < 0 {
        return Err(Error::InvalidInput(format!("skip must not be negative, got {skip}")));
    }
    if take <= 0 {
        return Err(Error::InvalidInput(format!("take must be positive, got {take}")));
    }

    let rows = store
        .sign_in_page(start, end, skip as usize, take as usize)
        .await?;

    tracing::debug!(%start, %end, skip, take, rows = rows.len(), "looked up sign-ins");
    Ok(rows)
}

/// The latest visit a person has made.
pub async fn most_recent_sign_in<S>(store: &S, person_id: i32) -> Result<SignIn>
where
    S: EntityStore + ?Sized,
{
    store
        .sign_ins()
        .await?
        .into_iter()
        .filter(|s| s.person_id == person_id)
        .max_by(|a, b| a.in_time.cmp(&b.in_time).then(a.id.cmp(&b.id)))
        .ok_or_else(|| Error::not_found("Sign-in", format!("person {person_id}")))
}

/// Resolves a person by email or numeric id and summarizes their visits.
pub async fn person_info<S>(store: &S, identifier: &str) -> Result<PersonInfo>
where
    S: EntityStore + ?Sized,
{
    let person = store
        .find_person(&|p: &Person| p.email == identifier || p.id.to_string() == identifier)
        .await?
        .ok_or_else(|| Error::not_found("Person", identifier))?;

    let visits: Vec<SignIn> = store
        .sign_ins()
        .await?
        .into_iter()
        .filter(|s| s.person_id == person.id)
        .collect();
    let last_visit = visits
        .iter()
        .max_by(|a, b| a.in_time.cmp(&b.in_time).then(a.id.cmp(&b.id)))
        .cloned();

    Ok(PersonInfo {
        id: person.id,
        full_name: person.full_name(),
        email: person.email,
        first_name: person.first_name,
        last_name: person.last_name,
        person_type: person.person_type,
        visit_count: visits.len(),
        last_visit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, at_minute, sample_store};

    #[tokio::test]
    async fn returns_rows_inside_window_in_time_order() {
        let store = sample_store();
        let rows = lookup(&store, at(2, 1, 0), at(2, 28, 23), 0, 10).await.unwrap();

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3, 4, 5]);
        assert!(rows
            .iter()
            .all(|r| r.in_time >= at(2, 1, 0) && r.in_time <= at(2, 28, 23)));
    }

    #[tokio::test]
    async fn projects_person_and_semester_fields() {
        let store = sample_store();
        let rows = lookup(&store, at(2, 5, 13), at(2, 5, 14), 0, 1).await.unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.id, 1);
        assert_eq!(row.person_id, 1);
        assert_eq!(row.email, "avery.lee@example.edu");
        assert_eq!(row.first_name, "Avery");
        assert_eq!(row.last_name, "Lee");
        assert_eq!(row.full_name, "Avery Lee");
        assert_eq!(row.in_time, at_minute(2, 5, 13, 15));
        assert_eq!(row.out_time, Some(at(2, 5, 14)));
        assert_eq!(row.semester_id, 202401);
        assert_eq!(row.semester_name, "Spring 2024");
        assert!(row.tutoring);
    }

    #[tokio::test]
    async fn window_bounds_are_inclusive() {
        let store = sample_store();
        let exact = at_minute(2, 6, 9, 40);
        let rows = lookup(&store, exact, exact, 0, 5).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3]);
    }

    #[tokio::test]
    async fn pages_partition_without_overlap() {
        let store = sample_store();
        let (start, end) = (at(1, 1, 0), at(12, 31, 23));

        let first = lookup(&store, start, end, 0, 3).await.unwrap();
        let second = lookup(&store, start, end, 3, 3).await.unwrap();
        let all = lookup(&store, start, end, 0, 100).await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 3);
        let stitched: Vec<i32> = first.iter().chain(second.iter()).map(|r| r.id).collect();
        let expected: Vec<i32> = all.iter().map(|r| r.id).collect();
        assert_eq!(stitched, expected);
    }

    #[tokio::test]
    async fn empty_window_is_not_an_error() {
        let store = sample_store();
        let rows = lookup(&store, at(7, 1, 0), at(7, 31, 23), 0, 10).await.unwrap();
        assert!(rows.is_empty());

        let reversed = lookup(&store, at(2, 28, 0), at(2, 1, 0), 0, 10).await.unwrap();
        assert!(reversed.is_empty());
    }

    #[tokio::test]
    async fn rejects_bad_paging() {
        let store = sample_store();
        let err = lookup(&store, at(2, 1, 0), at(2, 28, 0), 0, 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = lookup(&store, at(2, 1, 0), at(2, 28, 0), -1, 5).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn finds_latest_visit_for_person() {
        let store = sample_store();
        let latest = most_recent_sign_in(&store, 1).await.unwrap();
        assert_eq!(latest.id, 6);

        let err = most_recent_sign_in(&store, 99).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn person_info_by_email_or_id() {
        let store = sample_store();

        let by_email = person_info(&store, "avery.lee@example.edu").await.unwrap();
        assert_eq!(by_email.id, 1);
        assert_eq!(by_email.full_name, "Avery Lee");
        assert_eq!(by_email.visit_count, 3);
        assert_eq!(by_email.last_visit.map(|v| v.id), Some(6));

        let by_id = person_info(&store, "3").await.unwrap();
        assert_eq!(by_id.person_type, crate::models::PersonType::Staff);
        assert_eq!(by_id.visit_count, 1);
    }

    #[tokio::test]
    async fn person_info_for_unknown_identifier() {
        let store = sample_store();
        let err = person_info(&store, "nobody@example.edu").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { identifier, .. } if identifier == "nobody@example.edu"));
    }

    #[tokio::test]
    async fn dangling_reference_surfaces_from_lookup() {
        let mut store = sample_store();
        store
            .insert_sign_in(SignIn {
                id: 50,
                person_id: 77,
                semester_code: 202401,
                in_time: at(4, 10, 12),
                out_time: None,
                tutoring: true,
                reason_id: None,
            })
            .unwrap();

        let err = lookup(&store, at(4, 1, 0), at(4, 30, 23), 0, 10).await.unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }
}
