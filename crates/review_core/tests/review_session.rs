use review_core::{
    open_db_in_memory, EmployeeId, RepoError, ReviewRepository, ReviewRow, ReviewSession,
    SqliteEmployeeRepository, SqliteReviewRepository, ValidationError,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use std::rc::Rc;

type Session<'conn> =
    ReviewSession<SqliteReviewRepository<'conn>, SqliteEmployeeRepository<'conn>>;

fn session_with_employee(conn: &Connection) -> (Session<'_>, EmployeeId) {
    let employees = SqliteEmployeeRepository::new(conn);
    employees.create_table().unwrap();
    let employee = employees.create_employee("Lee", "Manager").unwrap();

    let session = ReviewSession::new(SqliteReviewRepository::new(conn), employees);
    session.create_table().unwrap();
    (session, employee.id().unwrap())
}

fn row_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM reviews;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_then_find_by_id_roundtrips() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    let created = session.create(2023, "Good work", employee_id).unwrap();
    let id = created.borrow().id().unwrap();

    let found = session.find_by_id(id).unwrap().unwrap();
    let found = found.borrow();
    assert_eq!(found.id(), Some(id));
    assert_eq!(found.year(), 2023);
    assert_eq!(found.summary(), "Good work");
    assert_eq!(found.employee_id(), employee_id);
}

#[test]
fn find_by_id_returns_the_same_instance() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    let created = session.create(2023, "Good work", employee_id).unwrap();
    let id = created.borrow().id().unwrap();

    let first = session.find_by_id(id).unwrap().unwrap();
    let second = session.find_by_id(id).unwrap().unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert!(Rc::ptr_eq(&first, &created));
    assert_eq!(session.cached_len(), 1);
}

#[test]
fn find_by_id_missing_row_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, _) = session_with_employee(&conn);

    assert!(session.find_by_id(42).unwrap().is_none());
}

#[test]
fn fresh_session_hydrates_and_caches_rows() {
    let conn = open_db_in_memory().unwrap();
    let (mut writer, employee_id) = session_with_employee(&conn);
    let id = writer
        .create(2021, "Written elsewhere", employee_id)
        .unwrap()
        .borrow()
        .id()
        .unwrap();

    let mut reader = ReviewSession::new(
        SqliteReviewRepository::new(&conn),
        SqliteEmployeeRepository::new(&conn),
    );
    assert!(reader.cached(id).is_none());

    let loaded = reader.find_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.borrow().summary(), "Written elsewhere");
    assert!(Rc::ptr_eq(&loaded, &reader.cached(id).unwrap()));
}

#[test]
fn instance_from_db_refreshes_cached_instance_in_place() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);
    let created = session.create(2023, "Before", employee_id).unwrap();
    let id = created.borrow().id().unwrap();

    let refreshed = session
        .instance_from_db(ReviewRow::new(id, 2024, "After", employee_id))
        .unwrap();

    assert!(Rc::ptr_eq(&refreshed, &created));
    assert_eq!(created.borrow().year(), 2024);
    assert_eq!(created.borrow().summary(), "After");
}

#[test]
fn instance_from_db_rejects_wrongly_typed_columns() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    let mut row = ReviewRow::new(1, 2023, "ok", employee_id);
    row.year = Value::Text("twenty".to_string());
    assert!(matches!(
        session.instance_from_db(row),
        Err(RepoError::Validation(ValidationError::NotInteger { field: "year" }))
    ));

    let mut row = ReviewRow::new(1, 2023, "ok", employee_id);
    row.summary = Value::Null;
    assert!(matches!(
        session.instance_from_db(row),
        Err(RepoError::Validation(ValidationError::NotText { field: "summary" }))
    ));

    let mut row = ReviewRow::new(1, 2023, "ok", employee_id);
    row.employee_id = Value::Real(1.5);
    assert!(matches!(
        session.instance_from_db(row),
        Err(RepoError::Validation(ValidationError::NotInteger {
            field: "employee_id"
        }))
    ));

    assert_eq!(session.cached_len(), 0);
}

#[test]
fn invalid_stored_row_leaves_cached_instance_untouched() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);
    let created = session.create(2023, "Kept", employee_id).unwrap();
    let id = created.borrow().id().unwrap();

    conn.execute(
        "UPDATE reviews SET year = 1990, summary = 'Changed' WHERE id = ?1;",
        [id],
    )
    .unwrap();

    let err = session.find_by_id(id).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::YearTooEarly(1990))
    ));
    assert_eq!(created.borrow().year(), 2023);
    assert_eq!(created.borrow().summary(), "Kept");
}

#[test]
fn stored_text_year_fails_validation() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    conn.execute(
        "INSERT INTO reviews (year, summary, employee_id) VALUES ('soon', 'x', ?1);",
        [employee_id],
    )
    .unwrap();
    let id = conn.last_insert_rowid();

    assert!(matches!(
        session.find_by_id(id),
        Err(RepoError::Validation(ValidationError::NotInteger { field: "year" }))
    ));
}

#[test]
fn create_with_invalid_fields_persists_nothing() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    assert!(matches!(
        session.create(1999, "ok", employee_id),
        Err(RepoError::Validation(ValidationError::YearTooEarly(1999)))
    ));
    assert!(matches!(
        session.create(2023, "  ", employee_id),
        Err(RepoError::Validation(ValidationError::BlankSummary))
    ));
    assert!(matches!(
        session.create(2023, "ok", employee_id + 100),
        Err(RepoError::Validation(ValidationError::UnknownEmployee(_)))
    ));

    assert_eq!(row_count(&conn), 0);
    assert_eq!(session.cached_len(), 0);
}

#[test]
fn save_assigns_id_and_caches() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    let review = session.new_review(2022, "Steady", employee_id).unwrap();
    assert_eq!(review.borrow().id(), None);
    assert_eq!(session.cached_len(), 0);

    let id = session.save(&review).unwrap();
    assert_eq!(review.borrow().id(), Some(id));
    assert!(Rc::ptr_eq(&review, &session.cached(id).unwrap()));
    assert_eq!(row_count(&conn), 1);
}

#[test]
fn saving_twice_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    let review = session.create(2022, "Once", employee_id).unwrap();
    let id = review.borrow().id().unwrap();

    assert!(matches!(
        session.save(&review),
        Err(RepoError::AlreadyPersisted(existing)) if existing == id
    ));
    assert_eq!(row_count(&conn), 1);
}

#[test]
fn update_writes_current_fields() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);
    let other_employee = session
        .employees()
        .create_employee("Sasha", "Engineer")
        .unwrap()
        .id()
        .unwrap();

    let review = session.create(2023, "A", employee_id).unwrap();
    let id = review.borrow().id().unwrap();
    {
        let mut review = review.borrow_mut();
        review.set_summary("B").unwrap();
        review.set_year(2024).unwrap();
        review
            .set_employee_id(other_employee, session.employees())
            .unwrap();
    }
    session.update(&review).unwrap();

    let mut fresh = ReviewSession::new(
        SqliteReviewRepository::new(&conn),
        SqliteEmployeeRepository::new(&conn),
    );
    let stored = fresh.find_by_id(id).unwrap().unwrap();
    let stored = stored.borrow();
    assert_eq!(stored.summary(), "B");
    assert_eq!(stored.year(), 2024);
    assert_eq!(stored.employee_id(), other_employee);
}

#[test]
fn update_of_transient_review_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let (session, employee_id) = session_with_employee(&conn);

    let review = session.new_review(2023, "Unsaved", employee_id).unwrap();
    assert!(matches!(
        session.update(&review),
        Err(RepoError::NotPersisted)
    ));
}

#[test]
fn update_of_vanished_row_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    let review = session.create(2023, "Gone soon", employee_id).unwrap();
    let id = review.borrow().id().unwrap();
    conn.execute("DELETE FROM reviews WHERE id = ?1;", [id])
        .unwrap();

    assert!(matches!(
        session.update(&review),
        Err(RepoError::NotFound(missing)) if missing == id
    ));
}

#[test]
fn delete_removes_row_cache_entry_and_id() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    let review = session.create(2023, "Temporary", employee_id).unwrap();
    let id = review.borrow().id().unwrap();

    session.delete(&review).unwrap();

    assert_eq!(review.borrow().id(), None);
    assert!(session.cached(id).is_none());
    assert!(session.find_by_id(id).unwrap().is_none());
    assert_eq!(review.borrow().summary(), "Temporary");
}

#[test]
fn delete_and_update_after_delete_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    let review = session.create(2023, "Temporary", employee_id).unwrap();
    session.delete(&review).unwrap();

    assert!(matches!(
        session.delete(&review),
        Err(RepoError::NotPersisted)
    ));
    assert!(matches!(
        session.update(&review),
        Err(RepoError::NotPersisted)
    ));
}

#[test]
fn deleted_review_can_be_saved_again_as_new_row() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    let review = session.create(2023, "Again", employee_id).unwrap();
    session.delete(&review).unwrap();
    assert_eq!(row_count(&conn), 0);

    let id = session.save(&review).unwrap();
    assert_eq!(review.borrow().id(), Some(id));
    assert!(Rc::ptr_eq(&review, &session.cached(id).unwrap()));
    assert_eq!(row_count(&conn), 1);
}

#[test]
fn get_all_tracks_creates_and_deletes() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    let created: Vec<_> = (0..5)
        .map(|offset| {
            session
                .create(2020 + offset, format!("Review {offset}"), employee_id)
                .unwrap()
        })
        .collect();
    session.delete(&created[1]).unwrap();
    session.delete(&created[3]).unwrap();

    let all = session.get_all().unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all.len() as i64, row_count(&conn));

    let years: Vec<_> = all.iter().map(|review| review.borrow().year()).collect();
    assert_eq!(years, vec![2020, 2022, 2024]);
    assert!(Rc::ptr_eq(&all[0], &created[0]));
}

#[test]
fn reviews_for_employee_filters_by_employee() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, lee) = session_with_employee(&conn);
    let sasha = session
        .employees()
        .create_employee("Sasha", "Engineer")
        .unwrap()
        .id()
        .unwrap();

    session.create(2021, "Lee 2021", lee).unwrap();
    session.create(2021, "Sasha 2021", sasha).unwrap();
    session.create(2022, "Lee 2022", lee).unwrap();

    let summaries: Vec<_> = session
        .reviews_for_employee(lee)
        .unwrap()
        .iter()
        .map(|review| review.borrow().summary().to_string())
        .collect();
    assert_eq!(summaries, vec!["Lee 2021", "Lee 2022"]);
    assert!(session.reviews_for_employee(sasha + 100).unwrap().is_empty());
}

#[test]
fn removed_employee_can_no_longer_be_referenced() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);
    let review = session.create(2023, "Before removal", employee_id).unwrap();
    let id = review.borrow().id().unwrap();

    assert!(session.employees().delete_employee(employee_id).unwrap());

    assert!(matches!(
        session.create(2023, "After removal", employee_id),
        Err(RepoError::Validation(ValidationError::UnknownEmployee(missing))) if missing == employee_id
    ));
    assert!(matches!(
        session.find_by_id(id),
        Err(RepoError::Validation(ValidationError::UnknownEmployee(_)))
    ));
}

#[test]
fn create_table_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    session.create(2023, "Survives", employee_id).unwrap();
    session.create_table().unwrap();
    session.create_table().unwrap();

    assert_eq!(session.get_all().unwrap().len(), 1);
}

#[test]
fn drop_table_clears_cache_and_surfaces_storage_error() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);
    let review = session.create(2023, "Dropped", employee_id).unwrap();
    let id = review.borrow().id().unwrap();

    session.drop_table().unwrap();
    session.drop_table().unwrap();

    assert_eq!(session.cached_len(), 0);
    assert!(matches!(session.find_by_id(id), Err(RepoError::Db(_))));
}

#[test]
fn repository_reads_raw_rows_in_storage_order() {
    let conn = open_db_in_memory().unwrap();
    let (_, employee_id) = session_with_employee(&conn);
    let repo = SqliteReviewRepository::new(&conn);

    for (year, summary) in [(2020, "first"), (2021, "second")] {
        conn.execute(
            "INSERT INTO reviews (year, summary, employee_id) VALUES (?1, ?2, ?3);",
            params![year, summary, employee_id],
        )
        .unwrap();
    }

    let rows = repo.list_review_rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].summary, Value::Text("first".to_string()));
    assert_eq!(rows[1].year, Value::Integer(2021));
    assert_eq!(
        repo.get_review_row(rows[1].id).unwrap(),
        Some(rows[1].clone())
    );
    assert!(matches!(repo.delete_review(999), Err(RepoError::NotFound(999))));
}

#[test]
fn find_by_id_with_id_read_from_live_borrow_returns_error() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);
    let created = session.create(2023, "Good work", employee_id).unwrap();

    let found = session
        .find_by_id(created.borrow().id().unwrap())
        .unwrap_err();
    assert!(matches!(
        found,
        RepoError::InstanceBorrowed(Some(id)) if Some(id) == created.borrow().id()
    ));

    let id = created.borrow().id().unwrap();
    let found = session.find_by_id(id).unwrap().unwrap();
    assert!(Rc::ptr_eq(&found, &created));
}

#[test]
fn refresh_under_shared_borrow_leaves_instance_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);
    let created = session.create(2023, "Before", employee_id).unwrap();
    let id = created.borrow().id().unwrap();

    let held = created.borrow();
    let err = session
        .instance_from_db(ReviewRow::new(id, 2024, "After", employee_id))
        .unwrap_err();
    assert!(matches!(err, RepoError::InstanceBorrowed(Some(borrowed)) if borrowed == id));
    assert_eq!(held.summary(), "Before");
    drop(held);

    assert_eq!(session.get_all().unwrap().len(), 1);
}

#[test]
fn save_and_delete_reject_borrowed_handles() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    let transient = session.new_review(2023, "Held", employee_id).unwrap();
    {
        let _held = transient.borrow();
        assert!(matches!(
            session.save(&transient),
            Err(RepoError::InstanceBorrowed(None))
        ));
    }
    assert_eq!(row_count(&conn), 0);

    let id = session.save(&transient).unwrap();
    {
        let _held = transient.borrow();
        assert!(matches!(
            session.delete(&transient),
            Err(RepoError::InstanceBorrowed(Some(borrowed))) if borrowed == id
        ));
    }
    assert_eq!(row_count(&conn), 1);
    assert!(session.cached(id).is_some());

    {
        let _editing = transient.borrow_mut();
        assert!(matches!(
            session.update(&transient),
            Err(RepoError::InstanceBorrowed(None))
        ));
    }
    session.update(&transient).unwrap();
}

#[test]
fn reused_rowid_detaches_previous_instance() {
    let conn = open_db_in_memory().unwrap();
    let (mut session, employee_id) = session_with_employee(&conn);

    let first = session.create(2023, "A", employee_id).unwrap();
    let id = first.borrow().id().unwrap();
    conn.execute("DELETE FROM reviews WHERE id = ?1;", [id])
        .unwrap();

    let second = session.create(2024, "B", employee_id).unwrap();
    assert_eq!(second.borrow().id(), Some(id));
    assert!(Rc::ptr_eq(&second, &session.cached(id).unwrap()));

    assert_eq!(first.borrow().id(), None);
    assert!(matches!(
        session.update(&first),
        Err(RepoError::NotPersisted)
    ));

    let stored: String = conn
        .query_row("SELECT summary FROM reviews WHERE id = ?1;", [id], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(stored, "B");
}
