use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NetlistError, NetlistResult, ObjectKind};
use crate::model::{InstanceId, Named, NetId, PinId};

/// A connectable terminal inside one Block: either one of the Block's own
/// interface pins, or a pin of one of its direct Instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Terminal {
    Port(PinId),
    Instance { instance: InstanceId, pin: PinId },
}

impl Terminal {
    pub fn pin(self) -> PinId {
        match self {
            Terminal::Port(pin) => pin,
            Terminal::Instance { pin, .. } => pin,
        }
    }

    pub fn instance(self) -> Option<InstanceId> {
        match self {
            Terminal::Port(_) => None,
            Terminal::Instance { instance, .. } => Some(instance),
        }
    }
}

/// Binding of a Pin to one context, optionally connected to one Net.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinRef {
    terminal: Terminal,
    net: Option<NetId>,
}

impl PinRef {
    pub(crate) fn new(terminal: Terminal) -> Self {
        Self { terminal, net: None }
    }

    pub fn terminal(&self) -> Terminal {
        self.terminal
    }

    pub fn pin(&self) -> PinId {
        self.terminal.pin()
    }

    pub fn net(&self) -> Option<NetId> {
        self.net
    }

    pub fn is_connected(&self) -> bool {
        self.net.is_some()
    }

    /// Bind to `net`. Fails with the current binding if the ref is already connected.
    pub(crate) fn connect(&mut self, net: NetId) -> Result<(), NetId> {
        match self.net {
            Some(current) => Err(current),
            None => {
                self.net = Some(net);
                Ok(())
            }
        }
    }

    pub(crate) fn disconnect(&mut self) -> Option<NetId> {
        self.net.take()
    }
}

/// An interface pin declared on a Block, with the Block-context ref used when
/// wiring inside that Block.
#[derive(Debug, Clone)]
pub struct Pin {
    name: String,
    port: PinRef,
}

impl Pin {
    pub(crate) fn new(id: PinId, name: String) -> Self {
        Self { name, port: PinRef::new(Terminal::Port(id)) }
    }

    pub fn id(&self) -> PinId {
        self.port.pin()
    }

    pub fn port(&self) -> &PinRef {
        &self.port
    }

    pub(crate) fn port_mut(&mut self) -> &mut PinRef {
        &mut self.port
    }
}

impl Named for Pin {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Separates the instance and pin parts of a [`PinPath`].
pub const PATH_SEPARATOR: char = '.';

/// Reject names that would not survive a trip through a [`PinPath`] or a
/// saved design: blank, padded, or (for pins and instances) containing
/// [`PATH_SEPARATOR`].
pub fn check_name(kind: ObjectKind, name: &str) -> NetlistResult<()> {
    let reason = if name.trim().is_empty() {
        "must not be empty"
    } else if name.trim() != name {
        "must not start or end with whitespace"
    } else if matches!(kind, ObjectKind::Pin | ObjectKind::Instance) && name.contains(PATH_SEPARATOR) {
        "must not contain '.'"
    } else {
        return Ok(());
    };
    Err(NetlistError::InvalidName { kind, name: name.to_string(), reason })
}

/// Name-based address of a terminal inside a Block: `pin` for the Block's own
/// interface pin, `instance.pin` for a pin of a direct Instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PinPath {
    pub instance: Option<String>,
    pub pin: String,
}

impl PinPath {
    pub fn port(pin: impl Into<String>) -> Self {
        Self { instance: None, pin: pin.into() }
    }

    pub fn instance(instance: impl Into<String>, pin: impl Into<String>) -> Self {
        Self { instance: Some(instance.into()), pin: pin.into() }
    }
}

impl fmt::Display for PinPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(instance) => write!(f, "{}{}{}", instance, PATH_SEPARATOR, self.pin),
            None => f.write_str(&self.pin),
        }
    }
}

impl FromStr for PinPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(PATH_SEPARATOR) {
            Some((instance, pin)) if !instance.is_empty() && !pin.is_empty() => {
                Ok(PinPath::instance(instance, pin))
            }
            Some(_) => Err(format!("Invalid pin path '{s}': expected 'pin' or 'instance.pin'")),
            None if s.is_empty() => Err("Pin path must not be empty".to_string()),
            None => Ok(PinPath::port(s)),
        }
    }
}

impl TryFrom<String> for PinPath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PinPath> for String {
    fn from(value: PinPath) -> Self {
        value.to_string()
    }
}
