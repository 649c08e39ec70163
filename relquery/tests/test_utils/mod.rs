#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::OnceLock;

use common::test_helpers::{create_connection, create_test_connection, init_test_tracing};
use relquery::model::{
    DeleteRule, Field, FieldType, ModelRegistry, Relatable, Relation as ModelRelation,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Schema, Set,
};

pub mod mocks;

pub mod user {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::book::Entity")]
        Books,
    }

    impl Related<super::book::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Books.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod book {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "books")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub title: String,
        pub pages: Option<i32>,
        pub user_id: Option<i32>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::user::Entity",
            from = "Column::UserId",
            to = "super::user::Column::Id",
            on_delete = "SetNull"
        )]
        User,
    }

    impl Related<super::user::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

impl Relatable for user::Entity {
    fn get_relations() -> HashMap<String, ModelRelation> {
        HashMap::from([(
            "books".to_string(),
            ModelRelation::has_many("Book", "user_id")
                .nullable()
                .on_delete(DeleteRule::SetNull),
        )])
    }

    fn get_fields() -> Vec<Field> {
        vec![
            Field::new("id", FieldType::Number),
            Field::new("name", FieldType::String),
        ]
    }

    fn get_table_name() -> &'static str {
        "users"
    }
}

impl Relatable for book::Entity {
    fn get_relations() -> HashMap<String, ModelRelation> {
        HashMap::from([(
            "user".to_string(),
            ModelRelation::belongs_to("User", "user_id").nullable(),
        )])
    }

    fn get_fields() -> Vec<Field> {
        vec![
            Field::new("id", FieldType::Number),
            Field::new("title", FieldType::String),
            Field::new("pages", FieldType::Number),
            Field::new("user_id", FieldType::Number),
        ]
    }

    fn get_table_name() -> &'static str {
        "books"
    }
}

static TEST_REGISTRY: OnceLock<ModelRegistry> = OnceLock::new();

/// `User` (aliased `u`) has many `Book`s through the nullable `books.user_id`.
pub fn registry() -> &'static ModelRegistry {
    TEST_REGISTRY.get_or_init(|| {
        let registry = ModelRegistry::new()
            .with_table("User", user::Entity::into_table().with_alias("u"))
            .unwrap()
            .with_table("Book", book::Entity::into_table())
            .unwrap();
        registry.validate().unwrap();
        registry
    })
}

/// Fresh in-memory database with the `users` and `books` tables.
pub async fn setup_db() -> DatabaseConnection {
    init_test_tracing();
    let db = create_test_connection().await.unwrap();
    create_tables(&db).await;
    db
}

/// Connection to `database_url` with `users` and `books` dropped and recreated.
pub async fn setup_db_at(database_url: &str) -> DatabaseConnection {
    init_test_tracing();
    let db = create_connection(database_url).await.unwrap();
    db.execute_unprepared("DROP TABLE IF EXISTS books")
        .await
        .unwrap();
    db.execute_unprepared("DROP TABLE IF EXISTS users")
        .await
        .unwrap();
    create_tables(&db).await;
    db
}

async fn create_tables(db: &DatabaseConnection) {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    db.execute(backend.build(&schema.create_table_from_entity(user::Entity)))
        .await
        .unwrap();
    db.execute(backend.build(&schema.create_table_from_entity(book::Entity)))
        .await
        .unwrap();
}

pub async fn insert_user(db: &DatabaseConnection, name: &str) -> user::Model {
    user::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_book(
    db: &DatabaseConnection,
    owner: &user::Model,
    title: &str,
    pages: Option<i32>,
) -> book::Model {
    book::ActiveModel {
        title: Set(title.to_string()),
        pages: Set(pages),
        user_id: Set(Some(owner.id)),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Delete every book with `title`; returns how many went.
pub async fn delete_books_titled(db: &DatabaseConnection, title: &str) -> u64 {
    book::Entity::delete_many()
        .filter(book::Column::Title.eq(title))
        .exec(db)
        .await
        .unwrap()
        .rows_affected
}

pub fn id_of(user: &user::Model) -> i64 {
    i64::from(user.id)
}
