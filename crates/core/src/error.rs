use thiserror::Error;

/// What kind of named object an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Block,
    Pin,
    Instance,
    Net,
    Segment,
    Junction,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Block => "block",
            ObjectKind::Pin => "pin",
            ObjectKind::Instance => "instance",
            ObjectKind::Net => "net",
            ObjectKind::Segment => "wire segment",
            ObjectKind::Junction => "junction",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures raised by structural edits.
///
/// None of these are transient: they describe an edit the current design
/// cannot accept. Callers report them and leave the session as it is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetlistError {
    /// Name collision within a Block namespace or the project's Block namespace.
    #[error("{kind} '{name}' already exists in {scope}")]
    DuplicateName { kind: ObjectKind, name: String, scope: String },

    /// Structural mutation attempted on a primitive Block.
    #[error("Cannot {action} in primitive block '{block}'")]
    ImmutableType { block: String, action: &'static str },

    /// Lookup by name or id failed.
    #[error("{kind} '{name}' not found in {scope}")]
    NotFound { kind: ObjectKind, name: String, scope: String },

    /// A terminal is already bound to a net or already carries a wire.
    #[error("Terminal '{terminal}' in block '{block}' is already connected to net '{net}'")]
    AlreadyConnected { block: String, terminal: String, net: String },

    /// The requested connection cannot be made (different blocks, self-loop, ...).
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// A name that could not be addressed again once stored.
    #[error("Invalid {kind} name '{name}': {reason}")]
    InvalidName { kind: ObjectKind, name: String, reason: &'static str },

    /// Instantiating `child` inside `parent` would make the type graph cyclic.
    #[error("Cannot instantiate '{child}' inside '{parent}': '{child}' already contains '{parent}'")]
    InstantiationCycle { parent: String, child: String },
}

impl NetlistError {
    pub(crate) fn duplicate(kind: ObjectKind, name: &str, scope: impl Into<String>) -> Self {
        NetlistError::DuplicateName { kind, name: name.to_string(), scope: scope.into() }
    }

    pub(crate) fn not_found(kind: ObjectKind, name: &str, scope: impl Into<String>) -> Self {
        NetlistError::NotFound { kind, name: name.to_string(), scope: scope.into() }
    }
}

/// Convenience result type for model operations.
pub type NetlistResult<T> = Result<T, NetlistError>;
