use thiserror::Error;

/// Result type alias using FieldTrailError
pub type Result<T> = std::result::Result<T, FieldTrailError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// handling, log assertions and CLI exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Lifecycle
    AlreadyTracking,
    MutationFailed,

    // Configuration
    UnregisteredFieldKind,
    UnknownEntityKind,
    PolicyConflict,
    InvalidConfig,

    // Emission
    Serialization,
    SinkFailed,

    // Persistence boundary
    NotFound,

    // Integration/IO
    Io,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::AlreadyTracking => "ERR_ALREADY_TRACKING",
            ExErrorKind::MutationFailed => "ERR_MUTATION_FAILED",
            ExErrorKind::UnregisteredFieldKind => "ERR_UNREGISTERED_FIELD_KIND",
            ExErrorKind::UnknownEntityKind => "ERR_UNKNOWN_ENTITY_KIND",
            ExErrorKind::PolicyConflict => "ERR_POLICY_CONFLICT",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::SinkFailed => "ERR_SINK_FAILED",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind for programmatic handling plus optional
/// context (operation, entity, field) for debugging. Event sinks report
/// their failures with this type.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_kind: Option<String>,
    entity_id: Option<String>,
    field: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_kind: None,
            entity_id: None,
            field: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity kind context
    pub fn with_entity_kind(mut self, kind: impl Into<String>) -> Self {
        self.entity_kind = Some(kind.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add field name context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_kind(&self) -> Option<&str> {
        self.entity_kind.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(kind) = &self.entity_kind {
            write!(f, " (entity_kind: {})", kind)?;
        }
        if let Some(id) = &self.entity_id {
            write!(f, " (entity_id: {})", id)?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for change-tracking operations
#[derive(Error, Debug, Clone)]
pub enum FieldTrailError {
    // ===== Lifecycle Errors =====
    /// A snapshot is already live for this entity (re-entrant mutation)
    #[error("Already tracking {entity_kind} {entity_id}")]
    AlreadyTracking {
        entity_kind: String,
        entity_id: String,
    },

    /// The host mutation failed before commit; nothing was diffed
    #[error("Mutation of {entity_kind} {entity_id} failed: {reason}")]
    MutationFailed {
        entity_kind: String,
        entity_id: String,
        reason: String,
    },

    // ===== Configuration Errors =====
    /// A composite field kind has no serializer registered
    #[error("No serializer registered for field kind '{field_kind}' ({entity_kind}.{field})")]
    UnregisteredFieldKind {
        entity_kind: String,
        field: String,
        field_kind: String,
    },

    /// No policy exists for the entity kind being tracked
    #[error("Unknown entity kind: {entity_kind}")]
    UnknownEntityKind { entity_kind: String },

    /// A field is both hard-excluded and redacted
    #[error("Field {entity_kind}.{field} is both excluded and redacted")]
    OverlappingPolicy { entity_kind: String, field: String },

    /// An excluded or redacted field is not declared on the entity schema
    #[error("Policy names undeclared field {entity_kind}.{field}")]
    UnknownPolicyField { entity_kind: String, field: String },

    /// Two policies were registered for the same entity kind
    #[error("Duplicate policy for entity kind: {entity_kind}")]
    DuplicateEntityKind { entity_kind: String },

    /// The tracking configuration document could not be parsed
    #[error("Invalid tracking config: {reason}")]
    InvalidConfig { reason: String },

    /// The tracking configuration file could not be read
    #[error("Cannot read {path}: {reason}")]
    Io { path: String, reason: String },

    // ===== Emission Errors =====
    /// A value could not be converted to its JSON form
    #[error("Cannot serialize {field}: {reason}")]
    Serialization { field: String, reason: String },

    /// The event sink rejected an event
    #[error("Event sink failed: {0}")]
    SinkFailed(ExError),

    // ===== Persistence Boundary Errors =====
    /// Record not found in the tracked store
    #[error("Record not found: {entity_kind} {entity_id}")]
    RecordNotFound {
        entity_kind: String,
        entity_id: String,
    },
}

impl From<FieldTrailError> for ExError {
    fn from(err: FieldTrailError) -> Self {
        let message = err.to_string();
        match err {
            FieldTrailError::AlreadyTracking {
                entity_kind,
                entity_id,
            } => ExError::new(ExErrorKind::AlreadyTracking)
                .with_op("capture")
                .with_entity_kind(entity_kind)
                .with_entity_id(entity_id)
                .with_message("Snapshot already live for entity"),

            FieldTrailError::MutationFailed {
                entity_kind,
                entity_id,
                reason,
            } => ExError::new(ExErrorKind::MutationFailed)
                .with_entity_kind(entity_kind)
                .with_entity_id(entity_id)
                .with_message(reason),

            FieldTrailError::UnregisteredFieldKind {
                entity_kind, field, ..
            } => ExError::new(ExErrorKind::UnregisteredFieldKind)
                .with_op("validate_registry")
                .with_entity_kind(entity_kind)
                .with_field(field)
                .with_message(message),

            FieldTrailError::UnknownEntityKind { entity_kind } => {
                ExError::new(ExErrorKind::UnknownEntityKind)
                    .with_entity_kind(entity_kind)
                    .with_message(message)
            }

            FieldTrailError::OverlappingPolicy { entity_kind, field }
            | FieldTrailError::UnknownPolicyField { entity_kind, field } => {
                ExError::new(ExErrorKind::PolicyConflict)
                    .with_op("build_policy")
                    .with_entity_kind(entity_kind)
                    .with_field(field)
                    .with_message(message)
            }

            FieldTrailError::DuplicateEntityKind { entity_kind } => {
                ExError::new(ExErrorKind::PolicyConflict)
                    .with_op("build_policy")
                    .with_entity_kind(entity_kind)
                    .with_message(message)
            }

            FieldTrailError::InvalidConfig { .. } => ExError::new(ExErrorKind::InvalidConfig)
                .with_op("load_config")
                .with_message(message),

            FieldTrailError::Io { .. } => ExError::new(ExErrorKind::Io)
                .with_op("load_config")
                .with_message(message),

            FieldTrailError::Serialization { field, .. } => {
                ExError::new(ExErrorKind::Serialization)
                    .with_op("serialize")
                    .with_field(field)
                    .with_message(message)
            }

            FieldTrailError::SinkFailed(source) => source,

            FieldTrailError::RecordNotFound {
                entity_kind,
                entity_id,
            } => ExError::new(ExErrorKind::NotFound)
                .with_entity_kind(entity_kind)
                .with_entity_id(entity_id)
                .with_message("Record not found"),
        }
    }
}
