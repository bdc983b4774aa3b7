//! Shader-graph materials
//!
//! Every material owns a small node graph with exactly one shader node wired
//! into one material output node. Materials are keyed by a deterministic
//! string built from their shading kind and color, e.g. `LEDShader_255_255_255`.
//!
//! Requesting a material always rebuilds its graph from scratch, so the last
//! request for a key decides how it looks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShaderError {
    #[error("Unsupported shader kind: {0} (expected \"emissive\" or \"diffuse\")")]
    InvalidShaderKind(String),
    #[error("Emissive shader requires an intensity")]
    MissingIntensity,
    #[error("Diffuse shader does not take an intensity (got {0})")]
    UnexpectedIntensity(f32),
}

/// The two shading kinds a material can be built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderKind {
    /// Light-emitting surface
    Emissive,
    /// Matte reflector
    Diffuse,
}

impl ShaderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emissive => "emissive",
            Self::Diffuse => "diffuse",
        }
    }
}

impl FromStr for ShaderKind {
    type Err = ShaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "emissive" => Ok(Self::Emissive),
            "diffuse" => Ok(Self::Diffuse),
            other => Err(ShaderError::InvalidShaderKind(other.to_string())),
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([255, 255, 255]);
    pub const BLACK: Rgb = Rgb([0, 0, 0]);

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Opaque RGBA as fed into shader color sockets, components kept in 0-255
    pub fn to_rgba(&self) -> [f32; 4] {
        let [r, g, b] = self.0;
        [f32::from(r), f32::from(g), f32::from(b), 1.0]
    }
}

/// A validated request for a shader graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderSpec {
    Emissive { color: Rgb, strength: f32 },
    Diffuse { color: Rgb },
}

impl ShaderSpec {
    /// Validate a raw shader request.
    ///
    /// Nothing is created here; an unsupported kind is rejected before any
    /// material can be touched.
    pub fn parse(kind: &str, color: Rgb, intensity: Option<f32>) -> Result<Self, ShaderError> {
        match (kind.parse::<ShaderKind>()?, intensity) {
            (ShaderKind::Emissive, Some(strength)) => Ok(Self::Emissive { color, strength }),
            (ShaderKind::Emissive, None) => Err(ShaderError::MissingIntensity),
            (ShaderKind::Diffuse, None) => Ok(Self::Diffuse { color }),
            (ShaderKind::Diffuse, Some(i)) => Err(ShaderError::UnexpectedIntensity(i)),
        }
    }

    pub fn kind(&self) -> ShaderKind {
        match self {
            Self::Emissive { .. } => ShaderKind::Emissive,
            Self::Diffuse { .. } => ShaderKind::Diffuse,
        }
    }

    pub fn color(&self) -> Rgb {
        match self {
            Self::Emissive { color, .. } | Self::Diffuse { color } => *color,
        }
    }
}

/// Type of a node in a shading graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    MaterialOutput,
    Emission,
    DiffuseBsdf,
}

impl NodeType {
    /// Default node name, used as its identifier inside the graph
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::MaterialOutput => "Material Output",
            Self::Emission => "Emission",
            Self::DiffuseBsdf => "Diffuse BSDF",
        }
    }

    pub fn is_shader(&self) -> bool {
        !matches!(self, Self::MaterialOutput)
    }
}

/// Value held by an unconnected input socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SocketValue {
    Color([f32; 4]),
    Float(f32),
    /// Shader sockets carry no default value
    Shader,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    pub name: String,
    pub value: SocketValue,
}

impl Socket {
    fn new(name: &str, value: SocketValue) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderNode {
    pub name: String,
    pub node_type: NodeType,
    pub inputs: Vec<Socket>,
    pub outputs: Vec<String>,
}

impl ShaderNode {
    fn new(node_type: NodeType) -> Self {
        let (inputs, outputs) = match node_type {
            NodeType::MaterialOutput => (
                vec![
                    Socket::new("Surface", SocketValue::Shader),
                    Socket::new("Volume", SocketValue::Shader),
                ],
                Vec::new(),
            ),
            NodeType::Emission => (
                vec![
                    Socket::new("Color", SocketValue::Color([1.0, 1.0, 1.0, 1.0])),
                    Socket::new("Strength", SocketValue::Float(1.0)),
                ],
                vec!["Emission".to_string()],
            ),
            NodeType::DiffuseBsdf => (
                vec![
                    Socket::new("Color", SocketValue::Color([0.8, 0.8, 0.8, 1.0])),
                    Socket::new("Roughness", SocketValue::Float(0.0)),
                ],
                vec!["BSDF".to_string()],
            ),
        };

        Self {
            name: node_type.default_name().to_string(),
            node_type,
            inputs,
            outputs,
        }
    }

    /// Look up an input socket by name
    pub fn input(&self, name: &str) -> Option<&Socket> {
        self.inputs.iter().find(|s| s.name == name)
    }
}

/// Connection from one node's output socket to another node's input socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from_node: usize,
    pub from_socket: usize,
    pub to_node: usize,
    pub to_socket: usize,
}

/// Node graph describing how a surface is shaded
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShaderGraph {
    pub nodes: Vec<ShaderNode>,
    pub links: Vec<Link>,
}

impl ShaderGraph {
    pub fn clear(&mut self) {
        self.links.clear();
        self.nodes.clear();
    }

    fn add_node(&mut self, node_type: NodeType) -> usize {
        self.nodes.push(ShaderNode::new(node_type));
        self.nodes.len() - 1
    }

    fn set_input(&mut self, node: usize, socket: usize, value: SocketValue) {
        if let Some(input) = self.nodes.get_mut(node).and_then(|n| n.inputs.get_mut(socket)) {
            input.value = value;
        }
    }

    fn link(&mut self, from_node: usize, from_socket: usize, to_node: usize, to_socket: usize) {
        self.links.push(Link {
            from_node,
            from_socket,
            to_node,
            to_socket,
        });
    }

    /// Find a node by name
    pub fn node(&self, name: &str) -> Option<&ShaderNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn output_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.node_type == NodeType::MaterialOutput)
            .count()
    }

    pub fn shader_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.node_type.is_shader()).count()
    }
}

/// A named material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub use_nodes: bool,
    pub graph: ShaderGraph,
}

impl Material {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            use_nodes: false,
            graph: ShaderGraph::default(),
        }
    }

    /// The single shader node of a built material, if any
    pub fn shader(&self) -> Option<&ShaderNode> {
        self.graph.nodes.iter().find(|n| n.node_type.is_shader())
    }

    /// Clear the graph and rebuild it for `spec`
    fn rebuild(&mut self, spec: &ShaderSpec) {
        self.use_nodes = true;
        self.graph.clear();

        let output = self.graph.add_node(NodeType::MaterialOutput);
        let shader = match spec {
            ShaderSpec::Emissive { color, strength } => {
                let node = self.graph.add_node(NodeType::Emission);
                self.graph.set_input(node, 0, SocketValue::Color(color.to_rgba()));
                self.graph.set_input(node, 1, SocketValue::Float(*strength));
                node
            }
            ShaderSpec::Diffuse { color } => {
                let node = self.graph.add_node(NodeType::DiffuseBsdf);
                self.graph.set_input(node, 0, SocketValue::Color(color.to_rgba()));
                node
            }
        };

        self.graph.link(shader, 0, output, 0);
    }
}

/// Materials keyed by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialLibrary {
    materials: BTreeMap<String, Material>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create the material under `key` and rebuild its graph.
    ///
    /// Repeated calls with the same key leave one output node and one shader
    /// node; the most recent `spec` wins.
    pub fn rebuild(&mut self, key: &str, spec: &ShaderSpec) -> &Material {
        let material = self.materials.entry(key.to_string()).or_insert_with(|| {
            debug!(key, "Creating material");
            Material::new(key)
        });
        material.rebuild(spec);
        debug!(key, kind = %spec.kind(), "Rebuilt shader graph");
        material
    }

    pub fn get(&self, key: &str) -> Option<&Material> {
        self.materials.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.materials.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Keep only the materials whose key satisfies `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.materials.retain(|k, _| keep(k));
    }
}

/// Build the deterministic material key for a name prefix and color
pub fn material_key(prefix: &str, color: Rgb) -> String {
    let [r, g, b] = color.0;
    format!("{}_{}_{}_{}", prefix, r, g, b)
}
