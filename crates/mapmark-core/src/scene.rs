//! Scene graph storage
//!
//! Objects live in a slotmap arena and are addressed by `ObjectId`. Names are
//! tracked in a separate index so that every object and collection name is
//! unique within the scene; creating something under a taken name fails with
//! `SceneError::NameCollision` instead of being silently renamed.
//!
//! Every object is linked into exactly one collection. New objects land in the
//! root collection and may be moved into a user collection afterwards.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::capability::ImageImporter;
use crate::material::{Material, MaterialLibrary, ShaderSpec};
use crate::mesh::{Mesh, CYLINDER_SEGMENTS};
use crate::text::TextCurve;

slotmap::new_key_type! {
    /// Handle to an object in a `Scene`
    pub struct ObjectId;
}

/// Name of the root collection every scene starts with
pub const SCENE_COLLECTION: &str = "Scene Collection";

/// Collections whose name starts with this prefix survive a reset
pub const RESERVED_PREFIX: &str = "Scene";

const EPSILON: f64 = 1e-12;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Resource not found: {0}")]
    MissingResource(PathBuf),
    #[error("Failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Image has no pixels: {0}")]
    EmptyImage(PathBuf),
    #[error("{kind} name already in use: {name}")]
    NameCollision { kind: NameKind, name: String },
    #[error("Unknown object: {0:?}")]
    UnknownObject(ObjectId),
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
    #[error("Unknown material: {0}")]
    UnknownMaterial(String),
    #[error("Object is not a mesh: {0}")]
    NotAMesh(String),
    #[error("Label text is empty")]
    EmptyLabel,
}

/// What a contested name belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Object,
    Collection,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object => f.write_str("Object"),
            Self::Collection => f.write_str("Collection"),
        }
    }
}

/// Geometry held by an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectData {
    Mesh(Mesh),
    Text(TextCurve),
}

impl ObjectData {
    /// Bounding box size of the untransformed data
    pub fn extents(&self) -> DVec3 {
        match self {
            Self::Mesh(mesh) => mesh.extents(),
            Self::Text(curve) => Mesh::from_outlines(&curve.outlines()).extents(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mesh(_) => "mesh",
            Self::Text(_) => "text",
        }
    }
}

/// A placed object
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub name: String,
    pub data: ObjectData,
    pub location: DVec3,
    pub scale: DVec3,
    /// Viewport display color (RGBA), independent of materials
    pub color: [f32; 4],
    /// Material slots, by material key
    pub materials: Vec<String>,
}

impl Object {
    fn new(name: &str, data: ObjectData) -> Self {
        Self {
            name: name.to_string(),
            data,
            location: DVec3::ZERO,
            scale: DVec3::ONE,
            color: [1.0, 1.0, 1.0, 1.0],
            materials: Vec::new(),
        }
    }

    /// World-space bounding box size
    pub fn dimensions(&self) -> DVec3 {
        self.data.extents() * self.scale
    }

    /// Rescale so the bounding box matches `dimensions`.
    ///
    /// Axes along which the geometry is flat keep their current scale.
    pub fn set_dimensions(&mut self, dimensions: DVec3) {
        let extents = self.data.extents();
        for axis in 0..3 {
            if extents[axis].abs() > EPSILON {
                self.scale[axis] = dimensions[axis] / extents[axis];
            }
        }
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.data {
            ObjectData::Mesh(mesh) => Some(mesh),
            ObjectData::Text(_) => None,
        }
    }
}

/// A named container of objects and child collections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub name: String,
    pub objects: Vec<ObjectId>,
    pub children: Vec<String>,
}

impl Collection {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// The scene: objects, collections, and materials
#[derive(Debug, Clone)]
pub struct Scene {
    objects: SlotMap<ObjectId, Object>,
    names: HashMap<String, ObjectId>,
    root: Collection,
    collections: BTreeMap<String, Collection>,
    materials: MaterialLibrary,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene with only the root collection
    pub fn new() -> Self {
        Self {
            objects: SlotMap::with_key(),
            names: HashMap::new(),
            root: Collection::new(SCENE_COLLECTION),
            collections: BTreeMap::new(),
            materials: MaterialLibrary::new(),
        }
    }

    // ---- objects ----

    /// Fail if `name` is already taken by an object or collection
    pub fn ensure_name_free(&self, kind: NameKind, name: &str) -> Result<(), SceneError> {
        let taken = match kind {
            NameKind::Object => self.names.contains_key(name),
            NameKind::Collection => {
                name == SCENE_COLLECTION || self.collections.contains_key(name)
            }
        };

        if taken {
            Err(SceneError::NameCollision {
                kind,
                name: name.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Add an object and link it into the root collection
    pub fn add_object(&mut self, name: &str, data: ObjectData) -> Result<ObjectId, SceneError> {
        self.ensure_name_free(NameKind::Object, name)?;

        let id = self.objects.insert(Object::new(name, data));
        self.names.insert(name.to_string(), id);
        self.root.objects.push(id);
        debug!(name, "Added object");
        Ok(id)
    }

    /// Add a closed cylinder mesh at `location`
    pub fn add_cylinder(
        &mut self,
        name: &str,
        radius: f64,
        depth: f64,
        location: DVec3,
    ) -> Result<ObjectId, SceneError> {
        let mesh = Mesh::cylinder(radius, depth, CYLINDER_SEGMENTS);
        let id = self.add_object(name, ObjectData::Mesh(mesh))?;
        self.object_mut(id)?.location = location;
        Ok(id)
    }

    /// Add a text object wrapping a new text curve
    pub fn add_text_curve(&mut self, name: &str, curve: TextCurve) -> Result<ObjectId, SceneError> {
        self.add_object(name, ObjectData::Text(curve))
    }

    /// Replace a text object's curve with the equivalent flat polygon mesh.
    /// Mesh objects are left as they are.
    pub fn convert_to_mesh(&mut self, id: ObjectId) -> Result<(), SceneError> {
        let object = self.object_mut(id)?;
        let mesh = match &object.data {
            ObjectData::Text(curve) => Mesh::from_outlines(&curve.outlines()),
            ObjectData::Mesh(_) => return Ok(()),
        };
        debug!(name = %object.name, faces = mesh.faces.len(), "Converted curve to mesh");
        object.data = ObjectData::Mesh(mesh);
        Ok(())
    }

    /// Extrude all of a mesh object's faces by `depth` along their normal
    pub fn extrude(&mut self, id: ObjectId, depth: f64) -> Result<(), SceneError> {
        let object = self.object_mut(id)?;
        let ObjectData::Mesh(mesh) = &object.data else {
            return Err(SceneError::NotAMesh(object.name.clone()));
        };

        let mut normal = mesh.mean_normal();
        if normal == DVec3::ZERO {
            normal = DVec3::Z;
        }
        let solid = mesh.extrude(normal * depth);
        object.data = ObjectData::Mesh(solid);
        Ok(())
    }

    /// Import an image as a flat plane one unit tall, returning the new object
    /// and the image's pixel size
    pub fn import_image_as_surface(
        &mut self,
        importer: &ImageImporter,
        path: &Path,
    ) -> Result<(ObjectId, (u32, u32)), SceneError> {
        let (width, height) = importer.dimensions(path)?;
        if width == 0 || height == 0 {
            return Err(SceneError::EmptyImage(path.to_path_buf()));
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "surface".to_string());
        let plane = Mesh::plane(f64::from(width) / f64::from(height), 1.0);
        let id = self.add_object(&name, ObjectData::Mesh(plane))?;

        info!(name, width, height, "Imported image as surface");
        Ok((id, (width, height)))
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut Object, SceneError> {
        self.objects.get_mut(id).ok_or(SceneError::UnknownObject(id))
    }

    pub fn object_id(&self, name: &str) -> Option<ObjectId> {
        self.names.get(name).copied()
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects.iter()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Remove every object from the scene and from all collections
    pub fn clear_objects(&mut self) {
        let count = self.objects.len();
        self.objects.clear();
        self.names.clear();
        self.root.objects.clear();
        for collection in self.collections.values_mut() {
            collection.objects.clear();
        }
        debug!(count, "Removed all objects");
    }

    // ---- collections ----

    /// Create an empty collection as a child of the root collection
    pub fn create_collection(&mut self, name: &str) -> Result<(), SceneError> {
        self.ensure_name_free(NameKind::Collection, name)?;
        self.collections.insert(name.to_string(), Collection::new(name));
        self.root.children.push(name.to_string());
        debug!(name, "Created collection");
        Ok(())
    }

    /// Remove a collection; objects still linked to it go back to the root
    pub fn remove_collection(&mut self, name: &str) -> Result<(), SceneError> {
        let collection = self
            .collections
            .remove(name)
            .ok_or_else(|| SceneError::UnknownCollection(name.to_string()))?;

        self.root.objects.extend(collection.objects);
        self.root.children.retain(|c| c != name);
        for other in self.collections.values_mut() {
            other.children.retain(|c| c != name);
        }
        debug!(name, "Removed collection");
        Ok(())
    }

    /// Move an object into `collection`, unlinking it from wherever it was
    pub fn link_object(&mut self, collection: &str, id: ObjectId) -> Result<(), SceneError> {
        if !self.objects.contains_key(id) {
            return Err(SceneError::UnknownObject(id));
        }
        if collection != SCENE_COLLECTION && !self.collections.contains_key(collection) {
            return Err(SceneError::UnknownCollection(collection.to_string()));
        }

        self.root.objects.retain(|o| *o != id);
        for c in self.collections.values_mut() {
            c.objects.retain(|o| *o != id);
        }

        let target = if collection == SCENE_COLLECTION {
            &mut self.root
        } else {
            self.collections
                .get_mut(collection)
                .ok_or_else(|| SceneError::UnknownCollection(collection.to_string()))?
        };
        target.objects.push(id);
        Ok(())
    }

    pub fn root_collection(&self) -> &Collection {
        &self.root
    }

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        if name == SCENE_COLLECTION {
            Some(&self.root)
        } else {
            self.collections.get(name)
        }
    }

    /// Names of all collections other than the root
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(|k| k.as_str())
    }

    // ---- materials ----

    /// Get-or-create a material and rebuild its shader graph
    pub fn rebuild_material(&mut self, key: &str, spec: &ShaderSpec) -> &Material {
        self.materials.rebuild(key, spec)
    }

    pub fn material(&self, key: &str) -> Option<&Material> {
        self.materials.get(key)
    }

    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    /// Append a material slot to an object
    pub fn assign_material(&mut self, id: ObjectId, key: &str) -> Result<(), SceneError> {
        if !self.materials.contains(key) {
            return Err(SceneError::UnknownMaterial(key.to_string()));
        }
        self.object_mut(id)?.materials.push(key.to_string());
        Ok(())
    }

    /// Drop materials no object uses, returning how many were removed
    pub fn purge_orphan_materials(&mut self) -> usize {
        let before = self.materials.len();
        let objects = &self.objects;
        self.materials
            .retain(|key| objects.values().any(|o| o.materials.iter().any(|m| m == key)));
        before - self.materials.len()
    }

    // ---- reset & snapshot ----

    /// Remove all objects and user collections.
    ///
    /// Collections named with the reserved `Scene` prefix are kept. Materials
    /// left without users are purged as well. Running this twice in a row is
    /// a no-op the second time.
    pub fn reset(&mut self) {
        self.clear_objects();

        let user: Vec<String> = self
            .collections
            .keys()
            .filter(|name| !name.starts_with(RESERVED_PREFIX))
            .cloned()
            .collect();
        for name in &user {
            // Present by construction
            let _ = self.remove_collection(name);
        }

        let purged = self.purge_orphan_materials();
        info!(collections = user.len(), materials = purged, "Scene reset");
    }

    /// Serializable summary of the scene contents
    pub fn snapshot(&self) -> SceneSnapshot {
        let object_name = |id: &ObjectId| self.objects.get(*id).map(|o| o.name.clone());

        let mut objects: Vec<ObjectSnapshot> = self
            .objects
            .values()
            .map(|o| {
                let (vertices, faces) = o
                    .mesh()
                    .map(|m| (m.vertices.len(), m.faces.len()))
                    .unwrap_or((0, 0));
                ObjectSnapshot {
                    name: o.name.clone(),
                    kind: o.data.kind().to_string(),
                    location: o.location.to_array(),
                    scale: o.scale.to_array(),
                    dimensions: o.dimensions().to_array(),
                    color: o.color,
                    materials: o.materials.clone(),
                    vertices,
                    faces,
                }
            })
            .collect();
        objects.sort_by(|a, b| a.name.cmp(&b.name));

        let collections = std::iter::once(&self.root)
            .chain(self.collections.values())
            .map(|c| CollectionSnapshot {
                name: c.name.clone(),
                objects: c.objects.iter().filter_map(|id| object_name(id)).collect(),
                children: c.children.clone(),
            })
            .collect();

        SceneSnapshot {
            objects,
            collections,
            materials: self.materials.iter().cloned().collect(),
        }
    }
}

/// Summary of one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub name: String,
    pub kind: String,
    pub location: [f64; 3],
    pub scale: [f64; 3],
    pub dimensions: [f64; 3],
    pub color: [f32; 4],
    pub materials: Vec<String>,
    pub vertices: usize,
    pub faces: usize,
}

/// Summary of one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    pub name: String,
    pub objects: Vec<String>,
    pub children: Vec<String>,
}

/// Serializable view of a whole scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub objects: Vec<ObjectSnapshot>,
    pub collections: Vec<CollectionSnapshot>,
    pub materials: Vec<Material>,
}

impl SceneSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
