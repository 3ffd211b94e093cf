//! Saving and loading whole designs.
//!
//! The on-disk shape is a name-based [`DesignDocument`]. Loading replays it
//! through the mutation API, so a document that violates any model invariant
//! is rejected instead of producing an inconsistent session.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::model::{JunctionId, Named, PinPath, RawId, SegmentId};
use crate::project::NetlistProject;
use crate::schematic::Schematic;
use crate::wiring::{Endpoint, Junction, Segment, WireGraph};

/// Current document format. Newer documents are rejected.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDocument {
    pub format_version: u32,
    pub name: String,
    #[serde(default)]
    pub blocks: Vec<BlockDoc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDoc {
    pub name: String,
    #[serde(default)]
    pub primitive: bool,
    #[serde(default)]
    pub pins: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<InstanceDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nets: Vec<NetDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wires: Vec<WireDoc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub junctions: Vec<JunctionDoc>,
    /// Wire id counters; ids below these are never reissued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_wire_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_junction_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetDoc {
    pub name: String,
    #[serde(default)]
    pub members: Vec<PinPath>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireEndDoc {
    Pin(PinPath),
    /// Id of a junction in the block's `junctions`.
    Junction(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDoc {
    /// Segment id; documents without one number wires by position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub start: WireEndDoc,
    pub end: WireEndDoc,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JunctionDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    /// Id of the wire the junction sits on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<u32>,
}

impl DesignDocument {
    /// Capture the full state of a schematic.
    pub fn from_schematic(schematic: &Schematic) -> Self {
        let project = schematic.project();
        let mut blocks = Vec::new();

        for (block_id, block) in project.blocks().iter() {
            let pins = block.pins().values().map(|p| p.name().to_string()).collect();
            let instances = block
                .instances()
                .values()
                .map(|i| InstanceDoc { name: i.name().to_string(), type_name: project.type_name(i).to_string() })
                .collect();
            let nets = block
                .nets()
                .values()
                .map(|n| NetDoc {
                    name: n.name().to_string(),
                    members: n.members().iter().filter_map(|t| project.terminal_path(block_id, *t)).collect(),
                })
                .collect();

            let mut wires = Vec::new();
            let mut junctions = Vec::new();
            let mut next_ids = None;
            if let Some(graph) = schematic.wiring_by_id(block_id) {
                let end_doc = |end: Endpoint| match end {
                    Endpoint::Terminal(t) => project.terminal_path(block_id, t).map(WireEndDoc::Pin),
                    Endpoint::Junction(j) => Some(WireEndDoc::Junction(j.as_raw())),
                };
                let mut saved: HashSet<SegmentId> = HashSet::new();
                for segment in graph.segments() {
                    if let (Some(start), Some(end)) = (end_doc(segment.start), end_doc(segment.end)) {
                        let net = segment.net.and_then(|n| block.nets().get(n)).map(|n| n.name().to_string());
                        wires.push(WireDoc { id: Some(segment.id.as_raw()), start, end, net });
                        saved.insert(segment.id);
                    }
                }
                for junction in graph.junctions() {
                    junctions.push(JunctionDoc {
                        id: Some(junction.id.as_raw()),
                        host: junction.host.filter(|h| saved.contains(h)).map(RawId::as_raw),
                    });
                }
                next_ids = Some(graph.next_ids()).filter(|ids| *ids != (0, 0));
            }

            blocks.push(BlockDoc {
                name: block.name().to_string(),
                primitive: block.is_primitive(),
                pins,
                instances,
                nets,
                wires,
                junctions,
                next_wire_id: next_ids.map(|(segment, _)| segment),
                next_junction_id: next_ids.map(|(_, junction)| junction),
            });
        }

        DesignDocument { format_version: FORMAT_VERSION, name: project.name().to_string(), blocks }
    }

    /// Rebuild a schematic by replaying the document through the edit API.
    pub fn into_schematic(self) -> Result<Schematic> {
        if self.format_version > FORMAT_VERSION {
            return Err(anyhow!(
                "Unsupported design format version {}; this build reads up to {}",
                self.format_version,
                FORMAT_VERSION
            ));
        }

        let mut project = NetlistProject::new(&self.name);
        for block in &self.blocks {
            if block.primitive {
                project
                    .add_primitive_block(&block.name, block.pins.as_slice())
                    .with_context(|| format!("Failed to load primitive block '{}'", block.name))?;
            } else {
                project.add_block(&block.name).with_context(|| format!("Failed to load block '{}'", block.name))?;
                for pin in &block.pins {
                    project
                        .add_pin_to_block(&block.name, pin)
                        .with_context(|| format!("Failed to load pin '{}' of block '{}'", pin, block.name))?;
                }
            }
        }

        for block in &self.blocks {
            for inst in &block.instances {
                project.add_instance_to_block(&block.name, &inst.name, &inst.type_name).with_context(|| {
                    format!("Failed to load instance '{}' in block '{}'", inst.name, block.name)
                })?;
            }
        }

        for block in &self.blocks {
            for net in &block.nets {
                project.create_net_with_pins(&block.name, &net.name, &net.members).with_context(|| {
                    format!("Failed to load net '{}' in block '{}'", net.name, block.name)
                })?;
            }
        }

        let mut schematic = Schematic::new(project);
        for block in &self.blocks {
            if block.wires.is_empty() && block.junctions.is_empty() && block.next_wire_id.is_none() {
                continue;
            }
            let graph = wire_graph(&schematic, block)
                .with_context(|| format!("Failed to load wiring of block '{}'", block.name))?;
            let block_id = schematic.project().block_id(&block.name)?;
            schematic
                .restore_wiring(block_id, graph)
                .with_context(|| format!("Failed to load wiring of block '{}'", block.name))?;
        }
        Ok(schematic)
    }
}

fn wire_graph(schematic: &Schematic, block: &BlockDoc) -> Result<WireGraph> {
    let project = schematic.project();
    let block_id = project.block_id(&block.name)?;
    let model = project.block(&block.name).ok_or_else(|| anyhow!("Block '{}' vanished", block.name))?;

    let end = |doc: &WireEndDoc| -> Result<Endpoint> {
        Ok(match doc {
            WireEndDoc::Pin(path) => Endpoint::Terminal(project.resolve(block_id, path)?),
            WireEndDoc::Junction(id) => Endpoint::Junction(JunctionId::from_raw(*id)),
        })
    };

    let mut segments = Vec::with_capacity(block.wires.len());
    for (position, wire) in block.wires.iter().enumerate() {
        let net = match &wire.net {
            Some(name) => Some(
                model.nets().id_of(name).ok_or_else(|| anyhow!("Wire refers to unknown net '{}'", name))?,
            ),
            None => None,
        };
        segments.push(Segment {
            id: SegmentId::from_raw(wire.id.unwrap_or(position as u32)),
            start: end(&wire.start)?,
            end: end(&wire.end)?,
            net,
        });
    }
    let junctions = block
        .junctions
        .iter()
        .enumerate()
        .map(|(position, j)| Junction {
            id: JunctionId::from_raw(j.id.unwrap_or(position as u32)),
            host: j.host.map(SegmentId::from_raw),
        })
        .collect();
    WireGraph::from_parts(
        segments,
        junctions,
        block.next_wire_id.unwrap_or(0),
        block.next_junction_id.unwrap_or(0),
    )
    .map_err(|e| anyhow!(e))
}

/// Loads and saves designs at a path.
pub trait DesignStore {
    fn load(&self, path: &Path) -> Result<Schematic>;
    fn save(&self, path: &Path, schematic: &Schematic) -> Result<()>;
}

/// Pretty-printed JSON store.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDesignStore;

impl JsonDesignStore {
    pub fn to_json(schematic: &Schematic) -> Result<String> {
        serde_json::to_string_pretty(&DesignDocument::from_schematic(schematic))
            .context("Failed to serialize design")
    }

    pub fn from_json(json: &str) -> Result<Schematic> {
        let doc: DesignDocument = serde_json::from_str(json).context("Failed to parse design JSON")?;
        doc.into_schematic()
    }
}

impl DesignStore for JsonDesignStore {
    fn load(&self, path: &Path) -> Result<Schematic> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read design at {}", path.display()))?;
        let schematic = Self::from_json(&json)?;
        info!("loaded design '{}' from {}", schematic.project().name(), path.display());
        Ok(schematic)
    }

    fn save(&self, path: &Path, schematic: &Schematic) -> Result<()> {
        let json = Self::to_json(schematic)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, json).with_context(|| format!("Failed to write design to {}", path.display()))?;
        info!("saved design '{}' to {}", schematic.project().name(), path.display());
        Ok(())
    }
}
