/// Failures surfaced by the registry and its validators.
///
/// Callers branch on the variant, so every kind of failure is its own
/// variant and every message carries the kind and identity of the resource
/// involved.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A lookup miss at the reader level.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// A validation-level existence failure.
    #[error("{kind} {id} does not exist")]
    EntityNotFound { kind: &'static str, id: String },

    /// An outbound reference that does not resolve or violates a namespace
    /// rule.
    #[error("{kind} {id}: invalid reference {field} -> {target}: {reason}")]
    ReferenceInvalid {
        kind: &'static str,
        id: String,
        field: &'static str,
        target: String,
        reason: String,
    },

    /// A deletion blocked by an inbound dependency.
    #[error("{kind} {id} is still referenced by {dependent_kind} {dependent_id}")]
    DependencyExists {
        kind: &'static str,
        id: String,
        dependent_kind: &'static str,
        dependent_id: String,
    },

    /// A malformed field: CIDR, port spec, enum string, duplicate, or range.
    #[error("{kind} {id}: invalid {field}: {reason}")]
    ShapeInvalid {
        kind: &'static str,
        id: String,
        field: &'static str,
        reason: String,
    },

    /// The registry was closed before or during the operation.
    #[error("registry is closed")]
    RegistryClosed,

    /// A reader was requested over a writer belonging to another registry.
    #[error("writer does not belong to this registry")]
    ForeignWriter,

    /// The caller's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,
}

// === impl Error ===

impl Error {
    /// True for reader-level lookup misses, which validators translate into
    /// the more specific variants.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_identity() {
        let err = Error::ReferenceInvalid {
            kind: "AddressGroupBinding",
            id: "default/b1".to_string(),
            field: "serviceRef",
            target: "default/missing".to_string(),
            reason: "Service does not exist".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("AddressGroupBinding"));
        assert!(msg.contains("default/b1"));
        assert!(msg.contains("serviceRef"));
        assert!(msg.contains("default/missing"));

        let err = Error::DependencyExists {
            kind: "Service",
            id: "default/web".to_string(),
            dependent_kind: "ServiceAlias",
            dependent_id: "default/web-alias".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Service default/web is still referenced by ServiceAlias default/web-alias"
        );
    }
}
