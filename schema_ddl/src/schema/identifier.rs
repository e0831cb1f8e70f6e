//! Quoting-aware identifiers

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::platform::Platform;
use crate::utils::naming::{
    is_identifier_quoted, is_valid_quoted_part, is_valid_unquoted_part, trim_quotes,
};

/// A possibly namespace-qualified name plus a quoted flag.
///
/// Unquoted identifiers compare and hash case-insensitively, quoted ones
/// compare exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifier {
    name: String,
    namespace: Option<String>,
    quoted: bool,
}

impl Identifier {
    /// Parse a name such as `users`, `"Users"` or `app.users`
    pub fn new(name: &str) -> Self {
        let quoted = is_identifier_quoted(name);
        let bare = if quoted {
            trim_quotes(name)
        } else {
            name.to_string()
        };

        match bare.split_once('.') {
            Some((namespace, name)) => Self {
                name: name.to_string(),
                namespace: Some(namespace.to_string()),
                quoted,
            },
            None => Self {
                name: bare,
                namespace: None,
                quoted,
            },
        }
    }

    /// Parse and validate a name
    pub fn parse(name: &str) -> Result<Self, SchemaError> {
        let identifier = Self::new(name);
        identifier.validate()?;
        Ok(identifier)
    }

    /// Build an explicitly quoted identifier
    pub fn quoted(name: &str) -> Self {
        Self {
            name: trim_quotes(name),
            namespace: None,
            quoted: true,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SchemaError> {
        let valid = self.parts().all(|part| {
            if self.quoted {
                is_valid_quoted_part(part)
            } else {
                is_valid_unquoted_part(part)
            }
        });

        if valid {
            Ok(())
        } else {
            Err(SchemaError::InvalidIdentifier(self.full_name()))
        }
    }

    fn parts(&self) -> impl Iterator<Item = &str> {
        self.namespace
            .as_deref()
            .into_iter()
            .chain(std::iter::once(self.name.as_str()))
    }

    /// The unqualified, unquoted name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// `namespace.name` without quotes
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{}.{}", namespace, self.name),
            None => self.name.clone(),
        }
    }

    /// The name without its namespace when it lives in `default_namespace`
    pub fn shortest_name(&self, default_namespace: Option<&str>) -> String {
        match (&self.namespace, default_namespace) {
            (Some(namespace), Some(default)) if namespace.eq_ignore_ascii_case(default) => {
                self.name.to_lowercase()
            }
            _ => self.full_name().to_lowercase(),
        }
    }

    /// Whether this identifier lives in the given default namespace
    pub fn is_in_default_namespace(&self, default_namespace: Option<&str>) -> bool {
        match (&self.namespace, default_namespace) {
            (None, _) => true,
            (Some(namespace), Some(default)) => namespace.eq_ignore_ascii_case(default),
            (Some(_), None) => false,
        }
    }

    /// Comparison key: lower-cased unless quoted
    pub fn key(&self) -> String {
        if self.quoted {
            self.full_name()
        } else {
            self.full_name().to_lowercase()
        }
    }

    /// Render the identifier for a platform.
    ///
    /// Each part is quoted when the identifier is quoted or the part is a
    /// reserved keyword of the platform.
    pub fn quoted_name(&self, platform: &dyn Platform) -> String {
        self.parts()
            .map(|part| {
                if self.quoted || platform.keywords().is_keyword(part) {
                    platform.quote_single_identifier(part)
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Lower-cased, unquoted key used for lookups by name.
///
/// Container lookups ignore case even for quoted names; quoting only
/// affects rendering and [`Identifier`] equality.
pub(crate) fn normalize_name(name: &str) -> String {
    Identifier::new(name).full_name().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn unquoted_identifiers_ignore_case() {
        assert_eq!(Identifier::new("Users"), Identifier::new("USERS"));

        let mut set = HashSet::new();
        set.insert(Identifier::new("Users"));
        assert!(set.contains(&Identifier::new("users")));
    }

    #[test]
    fn quoted_identifiers_keep_case() {
        assert_ne!(Identifier::new("\"Users\""), Identifier::new("\"users\""));
        assert_eq!(Identifier::new("\"Users\""), Identifier::new("`Users`"));
    }

    #[test]
    fn namespaces_are_split() {
        let id = Identifier::new("app.users");
        assert_eq!(id.namespace(), Some("app"));
        assert_eq!(id.name(), "users");
        assert_eq!(id.shortest_name(Some("APP")), "users");
        assert_eq!(id.shortest_name(Some("public")), "app.users");
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert!(matches!(
            Identifier::parse("1users"),
            Err(SchemaError::InvalidIdentifier(_))
        ));
        assert!(Identifier::parse("`has space`").is_ok());
        assert!(Identifier::parse("").is_err());
    }
}
