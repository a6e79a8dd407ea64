//! Per-user lists.
//!
//! A list belongs to exactly one user and is addressed by `(owner, name)`.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{DomainError, DomainResult};
use crate::validation::{validate_key_segment, FieldError};

/// A named list owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserList {
    /// List name, unique per owner
    #[cfg_attr(feature = "openapi", schema(example = "groceries"))]
    pub name: String,
    /// Number of todos on the list
    #[serde(rename = "todoCount", alias = "todo_count")]
    pub todo_count: u32,
}

impl UserList {
    /// A new, empty list
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            todo_count: 0,
        }
    }
}

/// List creation input.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateList {
    #[validate(length(min = 1, max = 64), custom(function = "validate_key_segment"))]
    #[cfg_attr(feature = "openapi", schema(example = "groceries"))]
    pub name: String,
}

impl CreateList {
    pub fn check(&self) -> DomainResult<()> {
        self.validate()
            .map_err(|e| DomainError::Validation(FieldError::from_validation_errors(&e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_uses_todo_count_camel_case() {
        let json = serde_json::to_value(UserList::new("groceries")).unwrap();
        assert_eq!(json, serde_json::json!({"name": "groceries", "todoCount": 0}));

        let list: UserList = serde_json::from_str(r#"{"name":"chores","todoCount":3}"#).unwrap();
        assert_eq!(list.todo_count, 3);
    }

    #[test]
    fn list_names_cannot_nest_keys() {
        assert!(CreateList { name: "groceries".into() }.check().is_ok());

        match (CreateList { name: "a/b".into() }).check() {
            Err(DomainError::Validation(errors)) => {
                assert_eq!(errors[0].field, "name");
                assert_eq!(errors[0].rule, "charset");
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert!(CreateList { name: String::new() }.check().is_err());
    }
}
