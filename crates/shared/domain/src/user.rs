//! User domain entity and related types.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{DomainError, DomainResult};
use crate::validation::{validate_name, validate_username, FieldError};

/// How a backend identifies user records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityScheme {
    /// The caller-chosen username is the record key. Email is not stored.
    Username,
    /// The id is generated; email is required and unique.
    Email,
}

impl std::fmt::Display for IdentityScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityScheme::Username => write!(f, "username"),
            IdentityScheme::Email => write!(f, "email"),
        }
    }
}

/// User domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds
    pub updated_at: i64,
}

impl User {
    /// Create a new user stamped with the given time for both timestamps
    pub fn new(
        id: String,
        name: Option<String>,
        email: Option<String>,
        password_hash: String,
        now: i64,
    ) -> Self {
        Self {
            id,
            name,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update in place. Absent fields keep their values.
    pub fn apply(&mut self, changes: &UserChanges) {
        if let Some(name) = &changes.name {
            self.name = Some(name.clone());
        }
        if let Some(hash) = &changes.password_hash {
            self.password_hash = hash.clone();
        }
        self.updated_at = changes.updated_at;
    }
}

/// Storage-level partial update: the password is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub updated_at: i64,
}

/// User creation input.
///
/// Accepts the spellings used by both storage flavours: `username` for the
/// key-value backend, `email` for SQL, and either a single `name`/`displayName`
/// or `firstName` + `lastName`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateUser {
    /// Username (key-value backend identity)
    #[validate(length(min = 6, max = 25), custom(function = "validate_username"))]
    #[cfg_attr(feature = "openapi", schema(example = "janedoe"))]
    pub username: Option<String>,
    /// Email address (SQL backend secondary key)
    #[validate(email)]
    #[cfg_attr(feature = "openapi", schema(example = "janedoe@example.com"))]
    pub email: Option<String>,
    /// Plaintext password, 8 to 15 characters
    #[validate(length(min = 8, max = 15))]
    pub password: String,
    /// Display name
    #[serde(alias = "displayName")]
    #[validate(custom(function = "validate_name"))]
    #[cfg_attr(feature = "openapi", schema(example = "Jane Doe"))]
    pub name: Option<String>,
    #[serde(alias = "firstName")]
    #[validate(custom(function = "validate_name"))]
    pub first_name: Option<String>,
    #[serde(alias = "lastName")]
    #[validate(custom(function = "validate_name"))]
    pub last_name: Option<String>,
}

impl CreateUser {
    /// Validate field rules plus the identity requirements of `scheme`.
    pub fn check(&self, scheme: IdentityScheme) -> DomainResult<()> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => FieldError::from_validation_errors(&e),
        };

        match scheme {
            IdentityScheme::Username => {
                if self.username.is_none() {
                    errors.push(FieldError::required("username"));
                }
                if self.email.is_some() {
                    errors.push(FieldError::unsupported("email"));
                }
            }
            IdentityScheme::Email => {
                if self.email.is_none() {
                    errors.push(FieldError::required("email"));
                }
                if self.username.is_some() {
                    errors.push(FieldError::unsupported("username"));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    /// Display name to store: `name` wins, otherwise first and last names joined.
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = &self.name {
            return Some(name.clone());
        }
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        }
    }
}

/// User update input. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateUser {
    /// New display name
    #[serde(alias = "displayName")]
    #[validate(custom(function = "validate_name"))]
    #[cfg_attr(feature = "openapi", schema(example = "Jane Smith"))]
    pub name: Option<String>,
    /// New plaintext password, 8 to 15 characters
    #[validate(length(min = 8, max = 15))]
    pub password: Option<String>,
}

impl UpdateUser {
    pub fn check(&self) -> DomainResult<()> {
        self.validate()
            .map_err(|e| DomainError::Validation(FieldError::from_validation_errors(&e)))
    }
}

/// Scope filter for listing users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserFilter {
    /// Only return users whose id starts with this prefix
    #[serde(alias = "prefix")]
    pub id_prefix: Option<String>,
}

impl UserFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            id_prefix: Some(prefix.into()),
        }
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserResponse {
    /// Unique user identifier
    pub id: String,
    /// Display name, if one was supplied
    pub name: Option<String>,
    /// Email address (SQL backend only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Creation time, unix seconds
    pub created_at: i64,
    /// Last update time, unix seconds
    pub updated_at: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_input() -> CreateUser {
        CreateUser {
            email: Some("johndoe@example.com".into()),
            password: "password".into(),
            name: Some("John Doe".into()),
            ..Default::default()
        }
    }

    fn kv_input() -> CreateUser {
        CreateUser {
            username: Some("johndoe".into()),
            password: "password".into(),
            first_name: Some("John".into()),
            last_name: Some("Doe".into()),
            ..Default::default()
        }
    }

    fn rejected(result: DomainResult<()>) -> Vec<FieldError> {
        match result {
            Err(DomainError::Validation(errors)) => errors,
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn valid_inputs_pass_for_their_scheme() {
        assert!(sql_input().check(IdentityScheme::Email).is_ok());
        assert!(kv_input().check(IdentityScheme::Username).is_ok());
    }

    #[test]
    fn short_password_names_the_password_field() {
        let input = CreateUser {
            password: "short".into(),
            ..sql_input()
        };
        let errors = rejected(input.check(IdentityScheme::Email));

        assert_eq!(fields(&errors), vec!["password"]);
        assert_eq!(errors[0].rule, "length");
        assert!(errors[0].value.is_none());
    }

    #[test]
    fn long_password_is_rejected() {
        let input = CreateUser {
            password: "sixteen-chars-xx".into(),
            ..kv_input()
        };
        let errors = rejected(input.check(IdentityScheme::Username));
        assert_eq!(fields(&errors), vec!["password"]);
    }

    #[test]
    fn scheme_requirements_are_enforced() {
        let errors = rejected(kv_input().check(IdentityScheme::Email));
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&FieldError::required("email")));
        assert!(errors.contains(&FieldError::unsupported("username")));

        let errors = rejected(sql_input().check(IdentityScheme::Username));
        assert!(errors.contains(&FieldError::required("username")));
        assert!(errors.contains(&FieldError::unsupported("email")));
    }

    #[test]
    fn username_length_is_bounded() {
        let input = CreateUser {
            username: Some("jane".into()),
            ..kv_input()
        };
        let errors = rejected(input.check(IdentityScheme::Username));
        assert_eq!(errors[0].field, "username");
        assert_eq!(errors[0].rule, "length");
        assert_eq!(errors[0].value.as_deref(), Some("jane"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let input = CreateUser {
            email: Some("not-an-email".into()),
            ..sql_input()
        };
        let errors = rejected(input.check(IdentityScheme::Email));
        assert_eq!(errors[0].field, "email");
        assert_eq!(errors[0].rule, "email");
    }

    #[test]
    fn display_name_prefers_explicit_name() {
        assert_eq!(kv_input().display_name().as_deref(), Some("John Doe"));

        let input = CreateUser {
            name: Some("Johnny".into()),
            ..kv_input()
        };
        assert_eq!(input.display_name().as_deref(), Some("Johnny"));

        let input = CreateUser {
            first_name: None,
            last_name: None,
            ..kv_input()
        };
        assert_eq!(input.display_name(), None);
    }

    #[test]
    fn create_input_accepts_camel_case_aliases() {
        let input: CreateUser = serde_json::from_str(
            r#"{"username":"janedoe","password":"password","firstName":"Jane","lastName":"Doe"}"#,
        )
        .unwrap();
        assert_eq!(input.first_name.as_deref(), Some("Jane"));
        assert_eq!(input.last_name.as_deref(), Some("Doe"));
    }

    #[test]
    fn update_distinguishes_absent_from_empty() {
        let absent: UpdateUser = serde_json::from_str("{}").unwrap();
        assert!(absent.name.is_none());
        assert!(absent.check().is_ok());

        let empty: UpdateUser = serde_json::from_str(r#"{"name":""}"#).unwrap();
        assert_eq!(empty.name.as_deref(), Some(""));
        assert_eq!(fields(&rejected(empty.check())), vec!["name"]);
    }

    #[test]
    fn apply_leaves_omitted_fields_untouched() {
        let mut user = User::new(
            "janedoe".into(),
            Some("Jane Doe".into()),
            None,
            "hash-1".into(),
            100,
        );
        user.apply(&UserChanges {
            name: Some("Jane Smith".into()),
            password_hash: None,
            updated_at: 200,
        });

        assert_eq!(user.name.as_deref(), Some("Jane Smith"));
        assert_eq!(user.password_hash, "hash-1");
        assert_eq!(user.created_at, 100);
        assert_eq!(user.updated_at, 200);
    }

    #[test]
    fn serialized_user_never_contains_hash() {
        let user = User::new("abc".into(), None, None, "secret-hash".into(), 1);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));

        let json = serde_json::to_string(&UserResponse::from(&user)).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
