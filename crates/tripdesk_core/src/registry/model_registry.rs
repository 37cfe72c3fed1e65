//! Lazy, idempotent model registry.
//!
//! # Responsibility
//! - Map an entity name to its canonical `ModelHandle`, creating the model
//!   on first use.
//! - Treat "already exists" from the namespace as the success path of a
//!   concurrent creator.
//!
//! # Invariants
//! - Two successful calls for one name return `ptr_eq` handles.
//! - The schema passed by the first successful creator wins; later schemas
//!   are ignored.
//! - Failures other than "already exists" are non-operational.

use crate::error::AppError;
use crate::model::entity::{EntityName, InvalidEntityName};
use crate::model::schema::SchemaDescriptor;
use crate::registry::namespace::{ModelNamespace, NamespaceError};
use crate::repo::model_handle::ModelHandle;
use http::StatusCode;
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Error name carried by registry failures once they enter the taxonomy.
pub const REGISTRY_ERROR_NAME: &str = "ModelRegistry_Error";

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug)]
pub enum RegistryError {
    InvalidName(InvalidEntityName),
    /// The model does not exist and the caller supplied no schema.
    MissingSchema(EntityName),
    Namespace(NamespaceError),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(err) => write!(f, "{err}"),
            Self::MissingSchema(name) => {
                write!(f, "model {name} does not exist and no schema was supplied")
            }
            Self::Namespace(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidName(err) => Some(err),
            Self::MissingSchema(_) => None,
            Self::Namespace(err) => Some(err),
        }
    }
}

impl From<InvalidEntityName> for RegistryError {
    fn from(value: InvalidEntityName) -> Self {
        Self::InvalidName(value)
    }
}

impl From<NamespaceError> for RegistryError {
    fn from(value: NamespaceError) -> Self {
        Self::Namespace(value)
    }
}

impl From<RegistryError> for AppError {
    fn from(value: RegistryError) -> Self {
        AppError::new(
            false,
            REGISTRY_ERROR_NAME,
            StatusCode::INTERNAL_SERVER_ERROR,
            value.to_string(),
        )
    }
}

/// Process-wide registry over one namespace.
#[derive(Clone)]
pub struct ModelRegistry {
    namespace: Arc<dyn ModelNamespace>,
}

impl ModelRegistry {
    pub fn new(namespace: Arc<dyn ModelNamespace>) -> Self {
        Self { namespace }
    }

    /// Returns the canonical handle for `name`, creating the model if needed.
    ///
    /// # Contract
    /// - `schema` is only consulted when the model does not exist yet.
    /// - Resolve, then create, then resolve again when creation reports that
    ///   another caller got there first.
    ///
    /// # Errors
    /// - `InvalidName` for blank or non-identifier names.
    /// - `MissingSchema` when the model is absent and `schema` is `None`.
    /// - `Namespace` for malformed schemas and storage failures.
    pub fn get_or_create_model(
        &self,
        name: &str,
        schema: Option<&SchemaDescriptor>,
    ) -> RegistryResult<ModelHandle> {
        let name = EntityName::parse(name)?;

        match self.namespace.resolve(&name) {
            Ok(handle) => return Ok(handle),
            Err(NamespaceError::Missing(_)) => {}
            Err(err) => return Err(self.fail(&name, "resolve", err)),
        }

        let Some(schema) = schema else {
            error!("event=model_get_or_create module=registry status=error model={name} error_code=missing_schema");
            return Err(RegistryError::MissingSchema(name));
        };

        match self.namespace.create(&name, schema) {
            Ok(handle) => Ok(handle),
            Err(NamespaceError::AlreadyExists(_)) => {
                debug!("event=model_get_or_create module=registry status=retry model={name} reason=already_exists");
                self.namespace
                    .resolve(&name)
                    .map_err(|err| self.fail(&name, "resolve_retry", err))
            }
            Err(err) => Err(self.fail(&name, "create", err)),
        }
    }

    fn fail(&self, name: &EntityName, stage: &str, err: NamespaceError) -> RegistryError {
        error!(
            "event=model_get_or_create module=registry status=error model={name} stage={stage} error={err}"
        );
        RegistryError::Namespace(err)
    }
}

#[cfg(test)]
mod tests {
    use super::{ModelRegistry, RegistryError, REGISTRY_ERROR_NAME};
    use crate::db::{open_db_in_memory, share};
    use crate::error::AppError;
    use crate::model::entity::EntityName;
    use crate::model::schema::{FieldKind, FieldSpec, SchemaDescriptor};
    use crate::registry::namespace::{ModelNamespace, NamespaceError, SqliteNamespace};
    use crate::repo::model_handle::ModelHandle;
    use http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new(vec![FieldSpec::new("title", FieldKind::String).required()])
    }

    /// Namespace whose first resolve misses even though a rival creator
    /// lands the model right before our create call.
    struct RacingNamespace {
        inner: SqliteNamespace,
        resolves: AtomicUsize,
        creates: AtomicUsize,
    }

    impl ModelNamespace for RacingNamespace {
        fn resolve(&self, name: &EntityName) -> Result<ModelHandle, NamespaceError> {
            if self.resolves.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(NamespaceError::Missing(name.clone()));
            }
            self.inner.resolve(name)
        }

        fn create(
            &self,
            name: &EntityName,
            schema: &SchemaDescriptor,
        ) -> Result<ModelHandle, NamespaceError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            self.inner.create(name, schema)?;
            self.inner.create(name, schema)
        }
    }

    #[test]
    fn already_exists_falls_back_to_resolve() {
        let racing = Arc::new(RacingNamespace {
            inner: SqliteNamespace::new(share(open_db_in_memory().unwrap())),
            resolves: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
        });
        let registry = ModelRegistry::new(racing.clone());

        let handle = registry.get_or_create_model("Trip", Some(&schema())).unwrap();
        let again = registry.get_or_create_model("Trip", None).unwrap();

        assert!(handle.ptr_eq(&again));
        assert_eq!(racing.creates.load(Ordering::SeqCst), 1);
        assert_eq!(racing.resolves.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn missing_schema_on_first_call_is_an_error() {
        let registry = ModelRegistry::new(Arc::new(SqliteNamespace::new(share(
            open_db_in_memory().unwrap(),
        ))));
        let err = registry.get_or_create_model("Trip", None).unwrap_err();
        assert!(matches!(err, RegistryError::MissingSchema(_)));
    }

    #[test]
    fn registry_errors_map_to_non_operational_records() {
        let registry = ModelRegistry::new(Arc::new(SqliteNamespace::new(share(
            open_db_in_memory().unwrap(),
        ))));
        let err = registry
            .get_or_create_model("Trip", Some(&SchemaDescriptor::new(vec![])))
            .unwrap_err();
        let record = AppError::from(err);
        assert!(!record.is_operational());
        assert_eq!(record.name(), REGISTRY_ERROR_NAME);
        assert_eq!(record.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(record.message().contains("schema declares no fields"));
    }
}
