//! Entity metadata: the tables, typed fields and relations a filter is
//! resolved against. Built once at startup, in code or from a YAML schema.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::MetadataError;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

// Shape of the aliases the translator numbers its subqueries with.
static SUBQUERY_ALIAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z_]_[0-9]+$").expect("subquery alias pattern is valid"));

/// Identifiers are spliced into generated SQL unquoted, so only plain names pass.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

fn check_identifier(name: &str) -> Result<(), MetadataError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(MetadataError::InvalidIdentifier(name.to_string()))
    }
}

// Generic field type definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    DateTime,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

// Relationship type definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    BelongsTo,
    HasMany,
    HasOne,
}

/// What the database does to the foreign key holder when the referenced row goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteRule {
    Cascade,
    SetNull,
    Restrict,
    #[default]
    NoAction,
}

/// A named association from one entity to another.
///
/// For `HasMany` and `HasOne` the foreign key column lives on the target and
/// references the owner's primary key. For `BelongsTo` it lives on the owner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Relation {
    pub kind: RelationKind,
    pub target: String,
    pub foreign_key: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub delete_rule: DeleteRule,
}

impl Relation {
    pub fn has_many(target: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::HasMany,
            target: target.into(),
            foreign_key: foreign_key.into(),
            nullable: false,
            delete_rule: DeleteRule::default(),
        }
    }

    pub fn belongs_to(target: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::BelongsTo,
            ..Self::has_many(target, foreign_key)
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn on_delete(mut self, rule: DeleteRule) -> Self {
        self.delete_rule = rule;
        self
    }

    pub fn is_to_many(&self) -> bool {
        matches!(self.kind, RelationKind::HasMany)
    }
}

fn default_primary_key() -> String {
    "id".to_string()
}

// Table information for query building
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Table {
    #[serde(rename = "table")]
    pub name: String,
    #[serde(default)]
    pub alias: String,
    pub fields: Vec<Field>,
    #[serde(default)]
    pub relations: HashMap<String, Relation>,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
}

impl Table {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            fields,
            relations: HashMap::new(),
            primary_key: default_primary_key(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_relation(mut self, name: impl Into<String>, relation: Relation) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    fn check_identifiers(&self) -> Result<(), MetadataError> {
        check_identifier(&self.name)?;
        check_identifier(&self.alias)?;
        if SUBQUERY_ALIAS.is_match(&self.alias) {
            return Err(MetadataError::ReservedAlias(self.alias.clone()));
        }
        check_identifier(&self.primary_key)?;
        for field in &self.fields {
            check_identifier(&field.name)?;
        }
        for relation in self.relations.values() {
            check_identifier(&relation.foreign_key)?;
        }
        Ok(())
    }
}

/// Static description of an entity, implemented next to its storage model.
pub trait Relatable {
    fn get_relations() -> HashMap<String, Relation>;
    fn get_fields() -> Vec<Field>;
    fn get_table_name() -> &'static str;
    fn get_primary_key() -> &'static str {
        "id"
    }
    fn into_table() -> Table {
        Table {
            name: Self::get_table_name().to_string(),
            alias: Self::get_table_name().to_string(),
            fields: Self::get_fields(),
            relations: Self::get_relations(),
            primary_key: Self::get_primary_key().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SchemaFile {
    entities: BTreeMap<String, Table>,
}

// Registry to look up models by entity name
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Table>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `table` under `entity`. An empty alias falls back to the table name.
    pub fn add_table(
        &mut self,
        entity: impl Into<String>,
        mut table: Table,
    ) -> Result<(), MetadataError> {
        let entity = entity.into();
        if table.alias.is_empty() {
            table.alias = table.name.clone();
        }
        table.check_identifiers()?;
        if table.field(&table.primary_key).is_none() {
            return Err(MetadataError::UnknownPrimaryKey {
                entity,
                primary_key: table.primary_key,
            });
        }
        self.models.insert(entity, table);
        Ok(())
    }

    /// Builder form of [`add_table`](Self::add_table).
    pub fn with_table(
        mut self,
        entity: impl Into<String>,
        table: Table,
    ) -> Result<Self, MetadataError> {
        self.add_table(entity, table)?;
        Ok(self)
    }

    pub fn get_model(&self, entity: &str) -> Option<&Table> {
        self.models.get(entity)
    }

    /// Look an entity up by its table name, as sea-orm entities know it.
    pub fn get_by_table(&self, table_name: &str) -> Option<(&str, &Table)> {
        self.models
            .iter()
            .find(|(_, table)| table.name == table_name)
            .map(|(entity, table)| (entity.as_str(), table))
    }

    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Cross-entity checks: relation targets exist, foreign keys are declared
    /// on the side that stores them, and `set_null` only on nullable keys.
    pub fn validate(&self) -> Result<(), MetadataError> {
        for entity in self.entity_names() {
            let table = &self.models[entity];
            let mut relation_names: Vec<&String> = table.relations.keys().collect();
            relation_names.sort_unstable();

            for relation_name in relation_names {
                let relation = &table.relations[relation_name];
                let target = self.models.get(&relation.target).ok_or_else(|| {
                    MetadataError::UnknownTarget {
                        entity: entity.to_string(),
                        relation: relation_name.clone(),
                        target: relation.target.clone(),
                    }
                })?;

                let (holder_name, holder) = match relation.kind {
                    RelationKind::HasMany | RelationKind::HasOne => (relation.target.as_str(), target),
                    RelationKind::BelongsTo => (entity, table),
                };
                if holder.field(&relation.foreign_key).is_none() {
                    return Err(MetadataError::UnknownForeignKey {
                        entity: entity.to_string(),
                        relation: relation_name.clone(),
                        foreign_key: relation.foreign_key.clone(),
                        holder: holder_name.to_string(),
                    });
                }

                if relation.delete_rule == DeleteRule::SetNull && !relation.nullable {
                    return Err(MetadataError::NullableMismatch {
                        entity: entity.to_string(),
                        relation: relation_name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn from_yaml(contents: &str) -> Result<Self, MetadataError> {
        let schema: SchemaFile =
            serde_yml::from_str(contents).map_err(|e| MetadataError::Load {
                path: "<inline>".to_string(),
                reason: e.to_string(),
            })?;

        let mut registry = Self::new();
        for (entity, table) in schema.entities {
            registry.add_table(entity, table)?;
        }
        registry.validate()?;
        Ok(registry)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| MetadataError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(&contents).map_err(|e| match e {
            MetadataError::Load { reason, .. } => MetadataError::Load {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }
}
