use mockall::mock;
use relquery::dialect::Dialect;

mock! {
    pub Dialect {}

    impl Dialect for Dialect {
        fn name(&self) -> &'static str;
        fn placeholder(&self, index: usize) -> String;
        fn supports_correlated_subqueries(&self) -> bool;
        fn offset_requires_limit(&self) -> bool;
    }
}

/// A backend with `:n` placeholders that cannot run correlated subqueries.
pub fn subqueryless_dialect() -> MockDialect {
    let mut dialect = MockDialect::new();
    dialect.expect_name().return_const("legacy");
    dialect.expect_supports_correlated_subqueries().return_const(false);
    dialect.expect_offset_requires_limit().return_const(false);
    dialect
        .expect_placeholder()
        .returning(|index| format!(":{}", index));
    dialect
}
