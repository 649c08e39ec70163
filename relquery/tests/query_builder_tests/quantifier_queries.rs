use relquery::filter::{Filter, FilterRequest, FilterValue, Operator};
use relquery::query_builder::Projection;
use relquery::{EveryPolicy, TranslateError};
use sea_orm::{DbBackend, Value};
use serde_json::json;

use super::{builder, get_query, get_query_string, test_utils};

const EVERY_TITLE_VACUOUS: &str = "SELECT u.id FROM users u WHERE NOT EXISTS (SELECT 1 FROM books b_1 WHERE b_1.user_id = u.id AND (b_1.title = $1) IS NOT TRUE)";

#[test]
fn test_every_with_existence_guard() {
    let (query, values) = get_query(
        EveryPolicy::RequireNonEmpty,
        &DbBackend::Postgres,
        "User",
        Filter::every("books", Filter::equals("title", "title")),
    );

    assert_eq!(
        query,
        "SELECT u.id FROM users u WHERE NOT EXISTS (SELECT 1 FROM books b_1 WHERE b_1.user_id = u.id AND (b_1.title = $1) IS NOT TRUE) AND EXISTS (SELECT 1 FROM books b_1 WHERE b_1.user_id = u.id)"
    );
    assert_eq!(values, vec![Value::from("title".to_string())]);
}

#[test]
fn test_every_vacuous() {
    let (query, values) = get_query(
        EveryPolicy::Vacuous,
        &DbBackend::Postgres,
        "User",
        Filter::every("books", Filter::equals("title", "title")),
    );

    assert_eq!(query, EVERY_TITLE_VACUOUS);
    assert_eq!(values.len(), 1);
}

#[test]
fn test_every_with_sqlite_placeholders() {
    let (query, _) = get_query(
        EveryPolicy::Vacuous,
        &DbBackend::Sqlite,
        "User",
        Filter::every("books", Filter::equals("title", "title")),
    );

    assert_eq!(
        query,
        "SELECT u.id FROM users u WHERE NOT EXISTS (SELECT 1 FROM books b_1 WHERE b_1.user_id = u.id AND (b_1.title = ?) IS NOT TRUE)"
    );
}

#[test]
fn test_every_with_always_false_predicate() {
    let (query, values) = get_query(
        EveryPolicy::Vacuous,
        &DbBackend::Postgres,
        "User",
        Filter::every(
            "books",
            Filter::condition("id", Operator::In, FilterValue::IntegerArray(vec![])),
        ),
    );

    // Only parents without books survive.
    assert_eq!(
        query,
        "SELECT u.id FROM users u WHERE NOT EXISTS (SELECT 1 FROM books b_1 WHERE b_1.user_id = u.id)"
    );
    assert!(values.is_empty());
}

#[test]
fn test_every_with_disjunctive_predicate() {
    let (query, _) = get_query(
        EveryPolicy::Vacuous,
        &DbBackend::Postgres,
        "User",
        Filter::every(
            "books",
            Filter::or(vec![
                Filter::equals("title", "a"),
                Filter::condition("pages", Operator::GreaterThan, 100i64),
            ]),
        ),
    );

    assert_eq!(
        query,
        "SELECT u.id FROM users u WHERE NOT EXISTS (SELECT 1 FROM books b_1 WHERE b_1.user_id = u.id AND (b_1.title = $1 OR b_1.pages > $2) IS NOT TRUE)"
    );
}

#[test]
fn test_some_and_none() {
    let some = get_query_string("User", Filter::some("books", Filter::equals("title", "a")));
    let none = get_query_string("User", Filter::none("books", Filter::equals("title", "a")));

    assert_eq!(
        some,
        "SELECT u.id FROM users u WHERE EXISTS (SELECT 1 FROM books b_1 WHERE b_1.user_id = u.id AND b_1.title = $1)"
    );
    assert_eq!(
        none,
        "SELECT u.id FROM users u WHERE NOT EXISTS (SELECT 1 FROM books b_1 WHERE b_1.user_id = u.id AND b_1.title = $1)"
    );
}

#[test]
fn test_none_ignores_policy() {
    let filter = Filter::none("books", Filter::equals("title", "a"));
    let (vacuous, _) = get_query(EveryPolicy::Vacuous, &DbBackend::Postgres, "User", filter.clone());
    let (guarded, _) = get_query(EveryPolicy::RequireNonEmpty, &DbBackend::Postgres, "User", filter);
    assert_eq!(vacuous, guarded);
}

#[test]
fn test_every_composes_with_root_condition() {
    let query = get_query_string(
        "User",
        Filter::and(vec![
            Filter::every("books", Filter::equals("title", "a")),
            Filter::equals("name", "Foo"),
        ]),
    );

    assert_eq!(
        query,
        "SELECT u.id FROM users u WHERE NOT EXISTS (SELECT 1 FROM books b_1 WHERE b_1.user_id = u.id AND (b_1.title = $1) IS NOT TRUE) AND EXISTS (SELECT 1 FROM books b_1 WHERE b_1.user_id = u.id) AND u.name = $2"
    );
}

#[test]
fn test_every_inside_disjunction_is_parenthesized() {
    let query = get_query_string(
        "User",
        Filter::or(vec![
            Filter::every("books", Filter::equals("title", "a")),
            Filter::equals("name", "Foo"),
        ]),
    );

    assert_eq!(
        query,
        "SELECT u.id FROM users u WHERE (NOT EXISTS (SELECT 1 FROM books b_1 WHERE b_1.user_id = u.id AND (b_1.title = $1) IS NOT TRUE) AND EXISTS (SELECT 1 FROM books b_1 WHERE b_1.user_id = u.id)) OR u.name = $2"
    );
}

#[test]
fn test_sibling_quantifiers_get_distinct_aliases() {
    let (query, values) = get_query(
        EveryPolicy::Vacuous,
        &DbBackend::Postgres,
        "User",
        Filter::and(vec![
            Filter::every("books", Filter::equals("title", "a")),
            Filter::some("books", Filter::condition("pages", Operator::GreaterThan, 10i64)),
        ]),
    );

    assert_eq!(
        query,
        "SELECT u.id FROM users u WHERE NOT EXISTS (SELECT 1 FROM books b_1 WHERE b_1.user_id = u.id AND (b_1.title = $1) IS NOT TRUE) AND EXISTS (SELECT 1 FROM books b_2 WHERE b_2.user_id = u.id AND b_2.pages > $2)"
    );
    assert_eq!(values, vec![Value::from("a".to_string()), Value::from(10i64)]);
}

#[test]
fn test_translation_is_idempotent() {
    let filter = Filter::and(vec![
        Filter::every("books", Filter::equals("title", "a")),
        Filter::some("books", Filter::equals("title", "b")),
    ]);
    let builder = builder(EveryPolicy::default());
    let request = FilterRequest::new(filter);

    let first = builder
        .build_query(&DbBackend::Postgres, "User", &request, Projection::Ids)
        .unwrap();
    let second = builder
        .build_query(&DbBackend::Postgres, "User", &request, Projection::Ids)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_document_filter_matches_built_filter() {
    let parsed = Filter::from_json(
        test_utils::registry(),
        "User",
        &json!({"books": {"$every": {"title": "title"}}}),
    )
    .unwrap();

    let (query, _) = get_query(EveryPolicy::Vacuous, &DbBackend::Postgres, "User", parsed);
    assert_eq!(query, EVERY_TITLE_VACUOUS);
}

#[test]
fn test_every_over_to_one_relation_is_rejected() {
    let err = builder(EveryPolicy::default())
        .build_query(
            &DbBackend::Postgres,
            "Book",
            &FilterRequest::new(Filter::every("user", Filter::equals("name", "Foo"))),
            Projection::Ids,
        )
        .unwrap_err();

    assert!(matches!(
        err,
        TranslateError::InvalidRelationship { ref entity, ref relation, .. } if entity == "Book" && relation == "user"
    ));
}

#[test]
fn test_every_with_foreign_field_is_rejected() {
    let err = builder(EveryPolicy::default())
        .build_query(
            &DbBackend::Postgres,
            "User",
            &FilterRequest::new(Filter::every("books", Filter::equals("name", "Foo"))),
            Projection::Ids,
        )
        .unwrap_err();

    assert!(matches!(err, TranslateError::InvalidPredicate { ref entity, .. } if entity == "Book"));
}
