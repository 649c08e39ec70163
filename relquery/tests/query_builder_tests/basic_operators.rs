use relquery::filter::{Filter, FilterValue, Operator};
use relquery::EveryPolicy;
use sea_orm::{DbBackend, Value};

use super::{get_query, get_query_string};

#[test]
fn test_equal_operator_with_string() {
    let (query, values) = get_query(
        EveryPolicy::default(),
        &DbBackend::Postgres,
        "Book",
        Filter::equals("title", "Dune"),
    );
    assert_eq!(query, "SELECT books.id FROM books books WHERE books.title = $1");
    assert_eq!(values, vec![Value::from("Dune".to_string())]);
}

#[test]
fn test_like_operator() {
    let query = get_query_string("Book", Filter::condition("title", Operator::Like, "Du%"));
    assert_eq!(query, "SELECT books.id FROM books books WHERE books.title LIKE $1");
}

#[test]
fn test_between_operator() {
    let (query, values) = get_query(
        EveryPolicy::default(),
        &DbBackend::Postgres,
        "Book",
        Filter::condition("pages", Operator::Between, FilterValue::Range { min: 100.0, max: 300.0 }),
    );
    assert_eq!(query, "SELECT books.id FROM books books WHERE books.pages BETWEEN $1 AND $2");
    assert_eq!(values, vec![Value::from(100.0), Value::from(300.0)]);
}

#[test]
fn test_in_and_not_in_operators() {
    let in_query = get_query_string(
        "Book",
        Filter::condition("id", Operator::In, FilterValue::IntegerArray(vec![1, 2, 3])),
    );
    assert_eq!(in_query, "SELECT books.id FROM books books WHERE books.id IN ($1, $2, $3)");

    let not_in_query = get_query_string(
        "Book",
        Filter::condition(
            "title",
            Operator::NotIn,
            FilterValue::StringArray(vec!["a".to_string(), "b".to_string()]),
        ),
    );
    assert_eq!(not_in_query, "SELECT books.id FROM books books WHERE books.title NOT IN ($1, $2)");
}

#[test]
fn test_empty_in_list_matches_nothing() {
    let query = get_query_string(
        "Book",
        Filter::condition("id", Operator::In, FilterValue::IntegerArray(vec![])),
    );
    assert_eq!(query, "SELECT books.id FROM books books WHERE 1 = 0");
}

#[test]
fn test_null_checks_bind_nothing() {
    let (query, values) = get_query(
        EveryPolicy::default(),
        &DbBackend::Postgres,
        "Book",
        Filter::or(vec![
            Filter::is_null("user_id"),
            Filter::condition("pages", Operator::IsNotNull, FilterValue::Null),
        ]),
    );
    assert_eq!(
        query,
        "SELECT books.id FROM books books WHERE books.user_id IS NULL OR books.pages IS NOT NULL"
    );
    assert!(values.is_empty());
}

#[test]
fn test_nested_groups_and_negation() {
    let query = get_query_string(
        "Book",
        Filter::and(vec![
            Filter::not(Filter::equals("title", "a")),
            Filter::or(vec![
                Filter::condition("pages", Operator::GreaterThan, 10i64),
                Filter::is_null("pages"),
            ]),
        ]),
    );
    assert_eq!(
        query,
        "SELECT books.id FROM books books WHERE NOT (books.title = $1) AND (books.pages > $2 OR books.pages IS NULL)"
    );
}

#[test]
fn test_empty_group_drops_where_clause() {
    let query = get_query_string("Book", Filter::and(vec![]));
    assert_eq!(query, "SELECT books.id FROM books books");
}

#[test]
fn test_question_mark_placeholders() {
    for backend in [DbBackend::Sqlite, DbBackend::MySql] {
        let (query, values) = get_query(
            EveryPolicy::default(),
            &backend,
            "Book",
            Filter::and(vec![
                Filter::equals("title", "a"),
                Filter::condition("pages", Operator::LessThanOrEqual, 10i64),
            ]),
        );
        assert_eq!(
            query,
            "SELECT books.id FROM books books WHERE books.title = ? AND books.pages <= ?"
        );
        assert_eq!(values.len(), 2);
    }
}
