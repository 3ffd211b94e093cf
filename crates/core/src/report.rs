//! Read-only summaries of a design for display.

use serde::Serialize;

use crate::model::{BlockId, Named, NetId, RawId, Terminal};
use crate::schematic::Schematic;
use crate::wiring::Endpoint;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub name: String,
    pub primitive: bool,
    pub pins: Vec<String>,
    pub instances: Vec<InstanceSummary>,
    pub nets: Vec<NetSummary>,
    pub wires: Vec<WireSummary>,
    pub junctions: Vec<JunctionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// `(pin, net)` for every live ref, in pin order.
    pub pins: Vec<(String, Option<String>)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetSummary {
    pub name: String,
    /// Members as `pin@owner`, owner being the block or the instance.
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireSummary {
    pub id: u32,
    pub start: String,
    pub end: String,
    pub net: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JunctionSummary {
    pub id: u32,
    pub host: Option<u32>,
}

fn member_label(schematic: &Schematic, block_id: BlockId, terminal: Terminal) -> Option<String> {
    let project = schematic.project();
    let block = project.block_by_id(block_id)?;
    let path = project.terminal_path(block_id, terminal)?;
    Some(match path.instance {
        Some(owner) => format!("{}@{}", path.pin, owner),
        None => format!("{}@{}", path.pin, block.name()),
    })
}

fn endpoint_label(schematic: &Schematic, block_id: BlockId, end: Endpoint) -> String {
    match end {
        Endpoint::Terminal(t) => schematic
            .project()
            .terminal_path(block_id, t)
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string()),
        Endpoint::Junction(j) => format!("j{}", j.as_raw()),
    }
}

/// Summaries of every block, in creation order.
pub fn summarize(schematic: &Schematic) -> Vec<BlockSummary> {
    let project = schematic.project();
    project
        .blocks()
        .iter()
        .map(|(block_id, block)| {
            let net_name = |n: NetId| block.nets().get(n).map(|net| net.name().to_string());
            let instances = block
                .instances()
                .values()
                .map(|inst| {
                    let ty = project.block_by_id(inst.type_id());
                    let pins = inst
                        .pins()
                        .map(|r| {
                            let pin = ty.and_then(|t| t.pins().get(r.pin())).map(|p| p.name().to_string());
                            (pin.unwrap_or_default(), r.net().and_then(net_name))
                        })
                        .collect();
                    InstanceSummary { name: inst.name().to_string(), type_name: project.type_name(inst).to_string(), pins }
                })
                .collect();
            let nets = block
                .nets()
                .values()
                .map(|n| NetSummary {
                    name: n.name().to_string(),
                    members: n.members().iter().filter_map(|t| member_label(schematic, block_id, *t)).collect(),
                })
                .collect();

            let (wires, junctions) = match schematic.wiring_by_id(block_id) {
                Some(graph) => (
                    graph
                        .segments()
                        .map(|s| WireSummary {
                            id: s.id.as_raw(),
                            start: endpoint_label(schematic, block_id, s.start),
                            end: endpoint_label(schematic, block_id, s.end),
                            net: s.net.and_then(net_name),
                        })
                        .collect(),
                    graph
                        .junctions()
                        .map(|j| JunctionSummary { id: j.id.as_raw(), host: j.host.map(|h| h.as_raw()) })
                        .collect(),
                ),
                None => (Vec::new(), Vec::new()),
            };

            BlockSummary {
                name: block.name().to_string(),
                primitive: block.is_primitive(),
                pins: block.pins().values().map(|p| p.name().to_string()).collect(),
                instances,
                nets,
                wires,
                junctions,
            }
        })
        .collect()
}

/// One line per block in the `name: instances=[..], pins=[..], nets=[..]`
/// form, followed by indented wire and junction lines.
pub fn render_text(blocks: &[BlockSummary]) -> String {
    let mut out = String::new();
    for block in blocks {
        let instances: Vec<String> =
            block.instances.iter().map(|i| format!("{}({})", i.name, i.type_name)).collect();
        let nets: Vec<String> =
            block.nets.iter().map(|n| format!("{}({})", n.name, n.members.join(", "))).collect();
        let kind = if block.primitive { " [primitive]" } else { "" };
        out.push_str(&format!(
            "{}{}: instances=[{}], pins=[{}], nets=[{}]\n",
            block.name,
            kind,
            instances.join(", "),
            block.pins.join(", "),
            nets.join(", ")
        ));
        for wire in &block.wires {
            let net = wire.net.as_deref().map(|n| format!(" [{n}]")).unwrap_or_default();
            out.push_str(&format!("  wire {}: {} -- {}{}\n", wire.id, wire.start, wire.end, net));
        }
        for junction in &block.junctions {
            match junction.host {
                Some(host) => out.push_str(&format!("  junction j{} on wire {}\n", junction.id, host)),
                None => out.push_str(&format!("  junction j{}\n", junction.id)),
            }
        }
    }
    out
}
