//! End-to-end CRUD walk on a file-backed store: the full
//! insert -> query -> update -> verify -> delete cycle.

use feedstore::entry::{self, COLUMN_SUBTITLE, COLUMN_TITLE};
use feedstore::{Entry, Mode, OrderBy, Predicate, Query, RowValues, Store, ID_COLUMN};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn collect_titles(handle: &feedstore::Handle, query: &Query) -> Vec<String> {
    handle
        .query(query, |rows| {
            let mut titles = Vec::new();
            while let Some(row) = rows.next()? {
                if let Some(title) = row.text(COLUMN_TITLE)? {
                    titles.push(title);
                }
            }
            Ok(titles)
        })
        .unwrap()
}

#[test]
fn full_crud_cycle() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(entry::profile(), dir.path().join("FeedReader.db"));

    // write handle for mutations, read handle for queries
    let db = store.open(Mode::Write).unwrap();
    let dbl = store.open(Mode::Read).unwrap();

    // 1. insert
    let new_row_id = db.insert(&Entry::values("My Title", "prueba2")).unwrap();
    assert!(new_row_id >= 1);

    // 2. query by exact title, projected and ordered
    let query = Query::select([ID_COLUMN, COLUMN_TITLE, COLUMN_SUBTITLE])
        .filter(Predicate::equals(COLUMN_TITLE, "My Title"))
        .order_by(OrderBy::descending(COLUMN_SUBTITLE));
    assert_eq!(collect_titles(&dbl, &query), vec!["My Title"]);

    // 3. update via pattern match on the old title
    let affected = db
        .update(
            &RowValues::new().with(COLUMN_TITLE, "MyNewTitle"),
            &Predicate::matches(COLUMN_TITLE, "My Title"),
        )
        .unwrap();
    assert_eq!(affected, 1);

    let verify = Query::select([ID_COLUMN, COLUMN_TITLE, COLUMN_SUBTITLE])
        .filter(Predicate::matches(COLUMN_TITLE, "MyNewTitle"))
        .order_by(OrderBy::descending(COLUMN_SUBTITLE));
    assert_eq!(collect_titles(&dbl, &verify), vec!["MyNewTitle"]);

    // 4. delete what was just renamed
    let deleted = db.delete(&Predicate::matches(COLUMN_TITLE, "MyNewTitle")).unwrap();
    assert_eq!(deleted, 1);
    assert!(collect_titles(&dbl, &verify).is_empty());

    store.close();
}

#[test]
fn query_by_unique_title_returns_the_inserted_values() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(entry::profile(), dir.path().join("FeedReader.db"));
    let db = store.open(Mode::Write).unwrap();

    let inserted = [("alpha", "first"), ("beta", "second"), ("gamma", "third")];
    let mut ids = Vec::new();
    for (title, subtitle) in inserted {
        ids.push(db.insert(&Entry::values(title, subtitle)).unwrap());
    }

    for (i, (title, subtitle)) in inserted.iter().enumerate() {
        let query = Query::all().filter(Predicate::equals(COLUMN_TITLE, *title));
        let entries = db.query(&query, |rows| Entry::collect(rows)).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, ids[i]);
        assert_eq!(entries[0].title.as_deref(), Some(*title));
        assert_eq!(entries[0].subtitle.as_deref(), Some(*subtitle));
    }
}

#[test]
fn delete_count_matches_prior_predicate_count() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(entry::profile(), dir.path().join("FeedReader.db"));
    let db = store.open(Mode::Write).unwrap();

    db.insert(&Entry::values("feed item", "a")).unwrap();
    db.insert(&Entry::values("feed item", "b")).unwrap();
    db.insert(&Entry::values("other", "c")).unwrap();

    let predicate = Predicate::matches(COLUMN_TITLE, "feed%");
    let matching = db.count(Some(&predicate)).unwrap();
    let deleted = db.delete(&predicate).unwrap();

    assert_eq!(deleted, matching);
    assert_eq!(db.count(Some(&predicate)).unwrap(), 0);
    assert_eq!(db.count(None).unwrap(), 1);
}

#[test]
fn pattern_match_uses_sql_like_semantics() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(entry::profile(), dir.path().join("FeedReader.db"));
    let db = store.open(Mode::Write).unwrap();

    db.insert(&Entry::values("My Title", "1")).unwrap();
    db.insert(&Entry::values("My Other Title", "2")).unwrap();

    let exact = Query::all().filter(Predicate::matches(COLUMN_TITLE, "My Title"));
    assert_eq!(collect_titles(&db, &exact), vec!["My Title"]);

    let wildcard = Query::all()
        .filter(Predicate::matches(COLUMN_TITLE, "My%Title"))
        .order_by(OrderBy::ascending(COLUMN_SUBTITLE));
    assert_eq!(collect_titles(&db, &wildcard), vec!["My Title", "My Other Title"]);
}
