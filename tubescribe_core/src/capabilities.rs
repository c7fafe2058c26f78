use serde::{Deserialize, Serialize};

/// Credential form schema a connector advertises for `auth/<provider>/set`.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ConnectorConfigSchema {
    pub fields: Vec<Field>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Field {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub enum FieldType {
    Text,
    Secret, // Use for API keys, passwords – anything sensitive
    Number,
    Boolean,
    Select { options: Vec<String> },
}
