//! RBAC data models: entity names, surrogate identifiers and row counts.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// Names
// ═══════════════════════════════════════════════════════════════════════════════

/// Something that names a permission, role or subject.
///
/// Implemented for the standard string types. Closed name sets are declared
/// with [`rbac_names!`](crate::rbac_names), which implements this trait for
/// the generated enum.
pub trait RbacName {
    fn rbac_name(&self) -> &str;
}

impl RbacName for str {
    fn rbac_name(&self) -> &str {
        self
    }
}

impl RbacName for String {
    fn rbac_name(&self) -> &str {
        self.as_str()
    }
}

impl RbacName for Box<str> {
    fn rbac_name(&self) -> &str {
        self
    }
}

impl RbacName for Cow<'_, str> {
    fn rbac_name(&self) -> &str {
        self.as_ref()
    }
}

/// Declare a closed set of permission, role or subject names.
///
/// ```rust
/// pgrbac_core::rbac_names! {
///     pub enum ComponentPermission {
///         Create => "service.component.create",
///         Read => "service.component.read",
///     }
/// }
///
/// assert_eq!(ComponentPermission::Create.as_str(), "service.component.create");
/// assert_eq!(ComponentPermission::ALL.len(), 2);
/// assert!("service.component.read".parse::<ComponentPermission>().is_ok());
/// ```
#[macro_export]
macro_rules! rbac_names {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $value:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every member of the set, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl $crate::rbac::RbacName for $name {
            fn rbac_name(&self) -> &str {
                self.as_str()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::RbacError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    other => Err($crate::error::RbacError::invalid_name(stringify!($name), other)),
                }
            }
        }
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Entities
// ═══════════════════════════════════════════════════════════════════════════════

/// The three entity tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Role,
    Permission,
    Subject,
}

impl EntityKind {
    /// Backing table name.
    pub const fn table(&self) -> &'static str {
        match self {
            Self::Role => "roles",
            Self::Permission => "permissions",
            Self::Subject => "subjects",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Permission => "permission",
            Self::Subject => "subject",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Surrogate identifier of an entity row (`SERIAL` in the schema).
///
/// Links between entities are always by identifier, never by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub i32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Stats
// ═══════════════════════════════════════════════════════════════════════════════

/// Row counts of every relation in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub roles: u64,
    pub permissions: u64,
    pub subjects: u64,
    pub role_permissions: u64,
    pub subject_roles: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::rbac_names! {
        /// Roles used by the component service.
        enum ComponentRole {
            Reader => "roles/service.componentReader",
            Admin => "roles/service.componentAdmin",
        }
    }

    fn name_of<N: RbacName + ?Sized>(n: &N) -> &str {
        n.rbac_name()
    }

    #[test]
    fn test_string_names() {
        assert_eq!(name_of("roles/viewer"), "roles/viewer");
        assert_eq!(name_of(&"roles/viewer".to_string()), "roles/viewer");
        assert_eq!(name_of(&Cow::Borrowed("roles/viewer")), "roles/viewer");
        let boxed: Box<str> = "roles/viewer".into();
        assert_eq!(name_of(&boxed), "roles/viewer");
    }

    #[test]
    fn test_closed_name_set() {
        assert_eq!(ComponentRole::ALL, &[ComponentRole::Reader, ComponentRole::Admin]);
        assert_eq!(name_of(&ComponentRole::Admin), "roles/service.componentAdmin");
        assert_eq!(ComponentRole::Reader.to_string(), "roles/service.componentReader");
    }

    #[test]
    fn test_closed_name_set_parse() {
        let parsed: ComponentRole = "roles/service.componentAdmin".parse().unwrap();
        assert_eq!(parsed, ComponentRole::Admin);

        let err = "roles/owner".parse::<ComponentRole>().unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidName);
        assert_eq!(err.details().entity_kind.as_deref(), Some("ComponentRole"));
    }

    #[test]
    fn test_entity_tables() {
        assert_eq!(EntityKind::Role.table(), "roles");
        assert_eq!(EntityKind::Permission.table(), "permissions");
        assert_eq!(EntityKind::Subject.table(), "subjects");
        assert_eq!(EntityKind::Subject.to_string(), "subject");
    }
}
