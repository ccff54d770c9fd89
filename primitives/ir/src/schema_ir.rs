//! Apigen Schema IR
//!
//! This module defines the data model (models, fields, enums, relations)
//! that parsers produce from a source schema language such as Prisma,
//! OpenAPI or a GraphQL SDL. Nothing in here knows which source produced it.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::ValidationResult;
use crate::IrError;

/// Version tag written into every IR value. Consumers compare against it
/// before trusting the shape of a deserialized document.
pub const IR_VERSION: &str = "1.0";

/// The root value passed between all generation stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaIR {
    /// IR format version (always [`IR_VERSION`] for values built by this crate)
    pub version: String,
    /// Where the schema came from
    pub metadata: SchemaMetadata,
    /// Models in source declaration order
    pub models: Vec<Model>,
    /// Enum declarations
    #[serde(default)]
    pub enums: Vec<EnumDef>,
    /// Relations materialized from field-level relation hints
    #[serde(default)]
    pub relations: Vec<Relation>,
}

/// Provenance information about a schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaMetadata {
    /// Schema name (usually the project or file stem)
    pub name: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tag identifying the parser that produced the IR (e.g. "prisma")
    pub source: String,
    /// Version of the source schema language, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_version: Option<String>,
    /// Path of the file the schema was read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// When the IR was produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

/// A data model (table, collection, resource).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// PascalCase model name, unique within a schema
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<Field>,
    /// Secondary indexes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,
    /// Table-level constraints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    /// Which CRUD operations to expose
    #[serde(default)]
    pub crud: CrudConfig,
    /// Access rules for the generated endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<ModelAuth>,
    /// Deletes set a tombstone column instead of removing the row
    #[serde(default)]
    pub soft_delete: bool,
    /// Maintain `createdAt` / `updatedAt` columns
    #[serde(default)]
    pub timestamps: bool,
    /// Parser-specific extras carried through untouched
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Value>,
}

/// A single field of a model (or of an inline object type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Field name as declared in the source
    pub name: String,
    /// Field type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether a value must be present
    pub required: bool,
    /// Unique across all rows
    #[serde(default)]
    pub unique: bool,
    /// Part of the primary key; such fields are system generated
    #[serde(default)]
    pub primary_key: bool,
    /// Default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldDefault>,
    /// Input validation rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
    /// Relation hint pointing at another model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<FieldRelation>,
    /// Database column name when it differs from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    /// Never returned to API clients
    #[serde(default)]
    pub hidden: bool,
    /// Returned but never accepted as input
    #[serde(default)]
    pub read_only: bool,
    /// Accepted as input but never returned
    #[serde(default)]
    pub write_only: bool,
    /// Doc comment from the source schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Closed set of field types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldType {
    /// Built-in scalar
    Scalar {
        /// Which scalar
        scalar: ScalarType,
    },
    /// Reference into `SchemaIR::enums`
    Enum {
        /// Enum name
        name: String,
    },
    /// List of another type
    Array {
        /// Element type
        items: Box<FieldType>,
    },
    /// Inline nested object
    Object {
        /// Nested fields
        fields: Vec<Field>,
    },
    /// Reference into `SchemaIR::models`
    Reference {
        /// Model name
        model: String,
    },
}

/// Scalar types understood by every generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ScalarType {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Datetime,
    Time,
    Json,
    Bigint,
    Decimal,
    Float,
    Bytes,
    Uuid,
}

/// Default value of a field.
///
/// Literal defaults are not checked against the field's scalar type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum FieldDefault {
    /// A literal JSON value
    Literal(Value),
    /// A named generator function evaluated by the database or runtime
    Function(DefaultFunction),
    /// A raw expression string passed through to the target
    Expression(String),
}

/// Generator functions usable as defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum DefaultFunction {
    Now,
    Uuid,
    Cuid,
    Autoincrement,
    Dbgenerated,
}

/// Flat bag of input constraints. A field has at most one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct ValidationRules {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub email: bool,
    pub url: bool,
    pub uuid: bool,
    pub positive: bool,
    pub integer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    pub unique_items: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Relation hint declared on a field. Only becomes a [`Relation`] if the
/// target model exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRelation {
    /// Target model name
    pub model: String,
    /// Cardinality
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    /// Explicit relation name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Field on the target model (defaults to its primary key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
    /// Referential action on delete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
    /// Referential action on update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
    /// Join table for many-to-many relations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub through: Option<JoinTable>,
}

/// Relation cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum RelationType {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

/// Referential actions for foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    NoAction,
    SetNull,
    SetDefault,
}

/// Join description for many-to-many relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinTable {
    /// Join table / model name
    pub table: String,
    /// Column pointing at the `from` side
    pub from_field: String,
    /// Column pointing at the `to` side
    pub to_field: String,
}

/// One end of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationEnd {
    /// Model name
    pub model: String,
    /// Field name
    pub field: String,
}

/// A materialized relation between two models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// Relation name
    pub name: String,
    /// Cardinality
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    /// Owning side
    pub from: RelationEnd,
    /// Referenced side
    pub to: RelationEnd,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub on_delete: Option<ReferentialAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub on_update: Option<ReferentialAction>,
    /// Join table for many-to-many relations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub through: Option<JoinTable>,
}

/// Enum declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDef {
    /// Enum name
    pub name: String,
    /// Allowed values in declaration order
    pub values: Vec<EnumValue>,
    /// Doc comment from the source schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A single enum member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Member name
    pub name: String,
    /// Mapped database / wire value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Secondary index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    /// Index name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Indexed fields in order
    pub fields: Vec<String>,
    /// Unique index
    #[serde(default)]
    pub unique: bool,
}

/// Table-level constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Constraint name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Constraint kind
    pub kind: ConstraintKind,
    /// Fields covered
    #[serde(default)]
    pub fields: Vec<String>,
    /// Check expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

/// Kinds of table-level constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Check,
}

/// Access rules for a model's endpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelAuth {
    /// Every operation requires an authenticated caller
    pub required: bool,
    /// Roles allowed to call the endpoints (empty means any role)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    /// Field holding the owning user id for row-level checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_field: Option<String>,
}

/// Which CRUD operations to generate for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct CrudConfig {
    pub create: bool,
    pub read: bool,
    pub update: bool,
    pub delete: bool,
    pub list: bool,
    pub bulk_create: bool,
    pub bulk_update: bool,
    pub bulk_delete: bool,
    pub upsert: bool,
    pub count: bool,
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            create: true,
            read: true,
            update: true,
            delete: true,
            list: true,
            bulk_create: false,
            bulk_update: false,
            bulk_delete: false,
            upsert: false,
            count: true,
        }
    }
}

impl CrudConfig {
    /// Every operation enabled, including bulk operations and upsert.
    pub fn all() -> Self {
        Self { bulk_create: true, bulk_update: true, bulk_delete: true, upsert: true, ..Self::default() }
    }

    /// Read-only resource: `read`, `list` and `count`.
    pub fn read_only() -> Self {
        Self { create: false, update: false, delete: false, ..Self::default() }
    }

    /// Names of the enabled operations in a fixed order.
    pub fn enabled(&self) -> Vec<&'static str> {
        [
            ("create", self.create),
            ("read", self.read),
            ("update", self.update),
            ("delete", self.delete),
            ("list", self.list),
            ("bulkCreate", self.bulk_create),
            ("bulkUpdate", self.bulk_update),
            ("bulkDelete", self.bulk_delete),
            ("upsert", self.upsert),
            ("count", self.count),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect()
    }
}

impl ScalarType {
    /// Lowercase tag used in serialized IR.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Number => "number",
            ScalarType::Integer => "integer",
            ScalarType::Boolean => "boolean",
            ScalarType::Date => "date",
            ScalarType::Datetime => "datetime",
            ScalarType::Time => "time",
            ScalarType::Json => "json",
            ScalarType::Bigint => "bigint",
            ScalarType::Decimal => "decimal",
            ScalarType::Float => "float",
            ScalarType::Bytes => "bytes",
            ScalarType::Uuid => "uuid",
        }
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FieldType {
    /// Scalar field type
    pub fn scalar(scalar: ScalarType) -> Self { FieldType::Scalar { scalar } }

    /// Enum field type
    pub fn enumeration(name: impl Into<String>) -> Self { FieldType::Enum { name: name.into() } }

    /// Array of `items`
    pub fn array(items: FieldType) -> Self { FieldType::Array { items: Box::new(items) } }

    /// Reference to another model
    pub fn reference(model: impl Into<String>) -> Self { FieldType::Reference { model: model.into() } }

    /// Whether this type is a list at the outermost level.
    pub fn is_list(&self) -> bool { matches!(self, FieldType::Array { .. }) }

    /// Innermost element type, unwrapping any number of array layers.
    pub fn element(&self) -> &FieldType {
        match self {
            FieldType::Array { items } => items.element(),
            other => other,
        }
    }

    /// Model referenced by this type, looking through arrays.
    pub fn referenced_model(&self) -> Option<&str> {
        match self.element() {
            FieldType::Reference { model } => Some(model),
            _ => None,
        }
    }

    /// Enum referenced by this type, looking through arrays.
    pub fn referenced_enum(&self) -> Option<&str> {
        match self.element() {
            FieldType::Enum { name } => Some(name),
            _ => None,
        }
    }
}

impl Field {
    /// Create a field with the given type and requiredness; everything else off.
    pub fn new(name: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            required,
            unique: false,
            primary_key: false,
            default: None,
            validation: None,
            relation: None,
            column_name: None,
            hidden: false,
            read_only: false,
            write_only: false,
            description: None,
        }
    }

    /// Mark the field as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark the field as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Attach a relation hint.
    pub fn with_relation(mut self, relation: FieldRelation) -> Self {
        self.relation = Some(relation);
        self
    }

    /// Set a default value.
    pub fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Whether input validation must insist on a value.
    ///
    /// Primary keys are generated by the system and never required on input.
    pub fn is_input_required(&self) -> bool { self.required && !self.primary_key }

    /// Column name in the database.
    pub fn column(&self) -> &str { self.column_name.as_deref().unwrap_or(&self.name) }
}

impl FieldRelation {
    /// Relation hint with only the target model and cardinality set.
    pub fn new(model: impl Into<String>, relation_type: RelationType) -> Self {
        Self {
            model: model.into(),
            relation_type,
            name: None,
            references: None,
            on_delete: None,
            on_update: None,
            through: None,
        }
    }
}

impl Model {
    /// Create a model with default CRUD settings.
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
            indexes: Vec::new(),
            constraints: Vec::new(),
            crud: CrudConfig::default(),
            auth: None,
            soft_delete: false,
            timestamps: false,
            meta: BTreeMap::new(),
        }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> { self.fields.iter().find(|f| f.name == name) }

    /// The first primary-key field, if any.
    pub fn primary_key(&self) -> Option<&Field> { self.fields.iter().find(|f| f.primary_key) }

    /// Fields a client may submit on create/update.
    pub fn input_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.primary_key && !f.read_only)
    }

    /// Fields returned to clients.
    pub fn output_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.hidden && !f.write_only)
    }
}

impl SchemaIR {
    /// Build an IR value and materialize its relations from field hints.
    pub fn new(metadata: SchemaMetadata, models: Vec<Model>, enums: Vec<EnumDef>) -> Self {
        let relations = derive_relations(&models);
        Self { version: IR_VERSION.to_string(), metadata, models, enums, relations }
    }

    /// Look up a model by name.
    pub fn model(&self, name: &str) -> Option<&Model> { self.models.iter().find(|m| m.name == name) }

    /// Look up an enum by name.
    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> { self.enums.iter().find(|e| e.name == name) }

    /// Relations in which `model` takes part on either side.
    pub fn relations_for<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a Relation> + 'a {
        self.relations.iter().filter(move |r| r.from.model == model || r.to.model == model)
    }

    /// Return a copy with `relations` recomputed from the current models.
    ///
    /// Schema transforms that add or remove models call this so the
    /// materialization rule keeps holding.
    pub fn with_derived_relations(self) -> Self {
        let relations = derive_relations(&self.models);
        Self { relations, ..self }
    }

    /// Structural checks on the IR.
    ///
    /// The IR does not deduplicate or resolve anything itself; this reports
    /// what a generator would trip over.
    pub fn check(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.version != IR_VERSION {
            result.push_error(format!(
                "unsupported IR version `{}` (expected `{}`)",
                self.version, IR_VERSION
            ));
        }

        let mut seen = HashSet::new();
        for model in &self.models {
            if !seen.insert(model.name.as_str()) {
                result.push_warning(format!("duplicate model name `{}`", model.name));
            }
        }

        for model in &self.models {
            if model.primary_key().is_none() {
                result.push_warning(format!("model `{}` has no primary key", model.name));
            }
            for field in &model.fields {
                self.check_field_type(&model.name, field, &mut result);
                if let Some(relation) = &field.relation {
                    if self.model(&relation.model).is_none() {
                        result.push_warning(format!(
                            "relation `{}.{}` targets unknown model `{}` and was not materialized",
                            model.name, field.name, relation.model
                        ));
                    }
                }
            }
        }

        for enum_def in &self.enums {
            if enum_def.values.is_empty() {
                result.push_warning(format!("enum `{}` has no values", enum_def.name));
            }
        }

        result
    }

    fn check_field_type(&self, owner: &str, field: &Field, result: &mut ValidationResult) {
        match field.field_type.element() {
            FieldType::Enum { name } if self.enum_def(name).is_none() => {
                result.push_warning(format!(
                    "field `{}.{}` uses unknown enum `{}`",
                    owner, field.name, name
                ));
            }
            FieldType::Reference { model } if self.model(model).is_none() => {
                result.push_warning(format!(
                    "field `{}.{}` references unknown model `{}`",
                    owner, field.name, model
                ));
            }
            FieldType::Object { fields } => {
                let nested = format!("{}.{}", owner, field.name);
                for inner in fields {
                    self.check_field_type(&nested, inner, result);
                }
            }
            _ => {}
        }
    }

    /// Parse IR from a JSON string. Documents tagged with another
    /// [`IR_VERSION`] are rejected.
    pub fn from_json(json: &str) -> Result<Self, IrError> {
        let ir: Self = serde_json::from_str(json)?;
        if ir.version != IR_VERSION {
            return Err(IrError::UnsupportedVersion { found: ir.version, expected: IR_VERSION });
        }
        Ok(ir)
    }

    /// Serialize IR as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, IrError> { Ok(serde_json::to_string_pretty(self)?) }

    /// Load IR from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, IrError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save IR to a JSON file with pretty formatting
    pub fn to_file(&self, path: &Path) -> Result<(), IrError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut content = self.to_json_pretty()?;
        // Ensure file ends with a newline (POSIX standard)
        content.push('\n');
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Materialize relations from field-level hints.
///
/// A hint becomes a relation only when its target model exists in `models`.
/// Output follows model and field declaration order.
pub fn derive_relations(models: &[Model]) -> Vec<Relation> {
    let mut relations = Vec::new();

    for model in models {
        for field in &model.fields {
            let Some(hint) = &field.relation else { continue };
            let Some(target) = models.iter().find(|m| m.name == hint.model) else { continue };

            let target_field = hint
                .references
                .clone()
                .or_else(|| target.primary_key().map(|pk| pk.name.clone()))
                .unwrap_or_else(|| "id".to_string());

            relations.push(Relation {
                name: hint
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("{}{}", model.name, upper_first(&field.name))),
                relation_type: hint.relation_type,
                from: RelationEnd { model: model.name.clone(), field: field.name.clone() },
                to: RelationEnd { model: target.name.clone(), field: target_field },
                on_delete: hint.on_delete,
                on_update: hint.on_update,
                through: hint.through.clone(),
            });
        }
    }

    relations
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Model {
        Model::new(
            "User",
            vec![
                Field::new("id", FieldType::scalar(ScalarType::Uuid), true).primary_key(),
                Field::new("email", FieldType::scalar(ScalarType::String), true).unique(),
            ],
        )
    }

    #[test]
    fn test_upper_first() {
        assert_eq!(upper_first("author"), "Author");
        assert_eq!(upper_first(""), "");
    }

    #[test]
    fn test_relation_name_defaults_to_model_and_field() {
        let post = Model::new(
            "Post",
            vec![Field::new("author", FieldType::reference("User"), true)
                .with_relation(FieldRelation::new("User", RelationType::ManyToOne))],
        );
        let relations = derive_relations(&[user(), post]);
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].name, "PostAuthor");
        assert_eq!(relations[0].to.field, "id");
    }

    #[test]
    fn test_relation_references_override_primary_key() {
        let mut hint = FieldRelation::new("User", RelationType::ManyToOne);
        hint.references = Some("email".to_string());
        hint.name = Some("written_by".to_string());
        let post = Model::new(
            "Post",
            vec![Field::new("authorEmail", FieldType::scalar(ScalarType::String), true)
                .with_relation(hint)],
        );
        let relations = derive_relations(&[user(), post]);
        assert_eq!(relations[0].name, "written_by");
        assert_eq!(relations[0].to.field, "email");
    }

    #[test]
    fn test_crud_enabled_lists_default_operations() {
        assert_eq!(CrudConfig::default().enabled(), vec!["create", "read", "update", "delete", "list", "count"]);
        assert_eq!(CrudConfig::read_only().enabled(), vec!["read", "list", "count"]);
        assert_eq!(CrudConfig::all().enabled().len(), 10);
    }
}
