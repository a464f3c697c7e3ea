use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{Map, Value};

use super::kind::{Family, Kind};
use crate::Error;

/// Handle to an entity living in a [`Store`].
///
/// Handles are only valid for the store generation that issued them, so a
/// handle kept across [`Store::clear`] never aliases a newer entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: usize,
    generation: u64,
}

/// A single activity, object, stream, user or bag.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub(super) kind: Kind,
    /// Plain attributes, including the identity key
    pub(super) attrs: Map<String, Value>,
    /// Links to nested entities by field name
    pub(super) nested: BTreeMap<String, EntityId>,
    /// Ordered members, for streams and bags
    pub(super) items: Vec<EntityId>,
}

impl Entity {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            attrs: Map::new(),
            nested: BTreeMap::new(),
            items: Vec::new(),
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn attrs(&self) -> &Map<String, Value> {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    pub fn nested(&self, name: &str) -> Option<EntityId> {
        self.nested.get(name).copied()
    }

    pub fn items(&self) -> &[EntityId] {
        &self.items
    }

    /// Value of the identity key, if this kind has one and it is set.
    pub fn key(&self) -> Option<&str> {
        self.attrs.get(self.kind.key_attr()?)?.as_str()
    }
}

/// Arena of entities with one identity map per [`Family`].
///
/// Every payload goes through [`Store::resolve`], which guarantees that two
/// payloads carrying the same key end up in the same entity.
#[derive(Debug, Default)]
pub struct Store {
    generation: u64,
    entities: Vec<Entity>,
    keys: HashMap<(Family, String), usize>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        if id.generation != self.generation {
            return None;
        }
        self.entities.get(id.index)
    }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        if id.generation != self.generation {
            return None;
        }
        self.entities.get_mut(id.index)
    }

    pub(super) fn live(&self, id: EntityId) -> Result<&Entity, Error> {
        self.get(id).ok_or(Error::StaleHandle)
    }

    fn handle(&self, index: usize) -> EntityId {
        EntityId {
            index,
            generation: self.generation,
        }
    }

    /// Finds the entity registered under `key` in the identity map of `kind`.
    pub fn lookup(&self, kind: Kind, key: &str) -> Option<EntityId> {
        let family = kind.family()?;
        self.keys
            .get(&(family, key.to_string()))
            .map(|&index| self.handle(index))
    }

    /// Creates an unregistered entity.
    pub fn create(&mut self, kind: Kind) -> EntityId {
        self.entities.push(Entity::new(kind));
        self.handle(self.entities.len() - 1)
    }

    /// Returns the canonical entity for `props`, merging into it when one is
    /// already registered under the same key.
    ///
    /// A new entity is registered before its nested fields are resolved, so
    /// payloads that refer back to themselves land on the same instance.
    pub fn resolve(&mut self, kind: Kind, props: &Value) -> Result<EntityId, Error> {
        let Value::Object(map) = props else {
            return Err(Error::UnsupportedData(format!(
                "expected an object for {kind}, got {}",
                describe(props)
            )));
        };

        let kind = kind.refine(map);
        let key = kind.family().and_then(|family| {
            map.get(family.key_attr())
                .and_then(Value::as_str)
                .map(|key| (family, key.to_string()))
        });

        let registered = key.as_ref().and_then(|key| self.keys.get(key).copied());
        let id = match registered {
            Some(index) => {
                self.upgrade(index, kind);
                self.handle(index)
            }
            None => {
                let id = self.create(kind);
                if let Some(key) = key {
                    self.keys.insert(key, id.index);
                }
                id
            }
        };

        self.merge_map(id, map)?;
        Ok(id)
    }

    /// Merges `props` into an existing entity.
    ///
    /// Absent fields are set, nested fields are merged recursively and present
    /// scalars take the incoming value unless it is `null`. Fields are never
    /// removed.
    pub fn merge(&mut self, id: EntityId, props: &Value) -> Result<(), Error> {
        self.live(id)?;
        let Value::Object(map) = props else {
            return Err(Error::UnsupportedData(format!(
                "expected an object to merge, got {}",
                describe(props)
            )));
        };
        self.merge_map(id, map)
    }

    /// Sets a plain attribute. Changing the identity key moves the entity to
    /// the new key in its identity map.
    pub fn set(&mut self, id: EntityId, name: &str, value: Value) -> Result<(), Error> {
        self.live(id)?;
        if self.entities[id.index].kind.key_attr() == Some(name) {
            self.rekey(id.index, &value);
        }
        self.entities[id.index].attrs.insert(name.to_string(), value);
        Ok(())
    }

    /// Drops every entity and invalidates all outstanding handles.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.entities.clear();
        self.keys.clear();
    }

    fn merge_map(&mut self, id: EntityId, map: &Map<String, Value>) -> Result<(), Error> {
        let kind = self.entities[id.index].kind;

        for (name, value) in map {
            if name == "items" && kind.item_kind().is_some() {
                if let Value::Array(values) = value {
                    let items = self.resolve_all(kind, values)?;
                    self.insert_items(id, &items, kind.prepends_items());
                }
                continue;
            }

            if let Some(field_kind) = kind.field(name) {
                if self.merge_nested(id, name, field_kind, value)? {
                    continue;
                }
            }

            self.merge_attr(id.index, name, value);
        }

        if kind == Kind::Activity {
            self.link_post_author(id);
        }

        Ok(())
    }

    fn resolve_all(&mut self, kind: Kind, values: &[Value]) -> Result<Vec<EntityId>, Error> {
        let Some(item_kind) = kind.item_kind() else {
            return Ok(Vec::new());
        };
        values
            .iter()
            .map(|value| self.resolve(item_kind, value))
            .collect()
    }

    /// Returns `false` when the value does not have the shape of the field,
    /// in which case it is kept as a plain attribute.
    fn merge_nested(
        &mut self,
        id: EntityId,
        name: &str,
        field_kind: Kind,
        value: &Value,
    ) -> Result<bool, Error> {
        let existing = self.entities[id.index].nested.get(name).copied();

        let child = match (field_kind, value) {
            (Kind::ObjectBag, Value::Array(values)) => {
                let items = self.resolve_all(Kind::ObjectBag, values)?;
                let bag = existing.unwrap_or_else(|| self.create(Kind::ObjectBag));
                self.insert_items(bag, &items, false);
                bag
            }
            (Kind::ObjectBag, _) => return Ok(false),
            (_, Value::Object(map)) => {
                let child_kind = field_kind.refine(map);
                let keyed = child_kind
                    .key_attr()
                    .and_then(|attr| map.get(attr))
                    .and_then(Value::as_str)
                    .is_some();

                match existing {
                    Some(child) if !keyed => {
                        self.upgrade(child.index, child_kind);
                        self.merge_map(child, map)?;
                        child
                    }
                    _ => self.resolve(field_kind, value)?,
                }
            }
            _ => return Ok(false),
        };

        self.entities[id.index]
            .nested
            .insert(name.to_string(), child);
        Ok(true)
    }

    fn merge_attr(&mut self, index: usize, name: &str, value: &Value) {
        let entity = &self.entities[index];
        if entity.nested.contains_key(name) {
            return;
        }
        if value.is_null() && entity.attrs.contains_key(name) {
            return;
        }
        if entity.kind.key_attr() == Some(name) {
            self.rekey(index, value);
        }
        self.entities[index]
            .attrs
            .insert(name.to_string(), value.clone());
    }

    fn rekey(&mut self, index: usize, value: &Value) {
        let entity = &self.entities[index];
        let Some(family) = entity.kind.family() else {
            return;
        };

        let old = entity.key().map(str::to_string);
        let new = value.as_str();
        if old.as_deref() == new {
            return;
        }

        if let Some(old) = old {
            let old = (family, old);
            if self.keys.get(&old) == Some(&index) {
                self.keys.remove(&old);
            }
        }
        if let Some(new) = new {
            self.keys.insert((family, new.to_string()), index);
        }
    }

    fn upgrade(&mut self, index: usize, kind: Kind) {
        let entity = &mut self.entities[index];
        if kind.specializes(entity.kind) {
            entity.kind = kind;
        }
    }

    /// A posted object without an author was written by the actor.
    fn link_post_author(&mut self, id: EntityId) {
        let Some(entity) = self.get(id) else {
            return;
        };
        if entity.attr("verb").and_then(Value::as_str) != Some("post") {
            return;
        }
        if let (Some(actor), Some(object)) = (entity.nested("actor"), entity.nested("object")) {
            self.adopt_author(object, actor);
        }
    }

    pub(super) fn adopt_author(&mut self, object: EntityId, actor: EntityId) {
        let Some(entity) = self.get_mut(object) else {
            return;
        };
        if entity.kind.field("author").is_none()
            || entity.nested.contains_key("author")
            || entity.attrs.contains_key("author")
        {
            return;
        }
        entity.nested.insert("author".to_string(), actor);
    }

    /// Adds `items` to a collection, skipping members already present.
    /// Returns how many were actually added.
    pub fn insert_items(&mut self, id: EntityId, items: &[EntityId], front: bool) -> usize {
        let Some(entity) = self.get_mut(id) else {
            return 0;
        };

        let mut seen: HashSet<EntityId> = entity.items.iter().copied().collect();
        let fresh: Vec<EntityId> = items
            .iter()
            .copied()
            .filter(|item| seen.insert(*item))
            .collect();
        let added = fresh.len();

        if front {
            entity.items.splice(0..0, fresh);
        } else {
            entity.items.extend(fresh);
        }

        added
    }

    /// Removes `item` from a collection. Returns whether it was a member.
    pub fn remove_item(&mut self, id: EntityId, item: EntityId) -> bool {
        let Some(entity) = self.get_mut(id) else {
            return false;
        };
        let items = &mut entity.items;
        let before = items.len();
        items.retain(|member| *member != item);
        items.len() != before
    }

    /// Returns the entity linked under `name`, creating a keyless one of
    /// `kind` when the field is empty.
    pub fn ensure_nested(&mut self, parent: EntityId, name: &str, kind: Kind) -> EntityId {
        if let Some(child) = self.get(parent).and_then(|entity| entity.nested(name)) {
            return child;
        }
        let child = self.create(kind);
        if let Some(entity) = self.get_mut(parent) {
            entity.nested.insert(name.to_string(), child);
        }
        child
    }

    /// Renders an entity as JSON, replacing every entity already on the
    /// current path by a reference stub.
    pub fn serialize(&self, id: EntityId) -> Option<Value> {
        self.get(id)?;
        Some(self.to_json(id.index, &[]))
    }

    fn to_json(&self, index: usize, seen: &[(Family, String)]) -> Value {
        let entity = &self.entities[index];

        if entity.kind == Kind::ObjectBag {
            return Value::Array(
                entity
                    .items
                    .iter()
                    .map(|item| self.to_json(item.index, seen))
                    .collect(),
            );
        }

        // Keys are only unique within a family: a stream may share its url
        // with an object id.
        let key = entity.kind.family().zip(entity.key());
        if let Some((family, key)) = key {
            if seen.iter().any(|(f, k)| *f == family && k == key) {
                return reference(entity);
            }
        }

        // Siblings must not see each other's keys, only their ancestors'.
        let mut seen = seen.to_vec();
        seen.extend(key.map(|(family, key)| (family, key.to_string())));

        let mut json = entity.attrs.clone();
        for (name, child) in &entity.nested {
            json.insert(name.clone(), self.to_json(child.index, &seen));
        }
        if !entity.items.is_empty() {
            let items = entity
                .items
                .iter()
                .map(|item| self.to_json(item.index, &seen))
                .collect();
            json.insert("items".to_string(), Value::Array(items));
        }

        Value::Object(json)
    }
}

fn reference(entity: &Entity) -> Value {
    let members: &[&str] = match entity.kind.family() {
        Some(Family::Objects) => &["id", "objectType"],
        Some(Family::Streams) => &["url", "totalItems"],
        Some(Family::Users) => &["nickname"],
        None => &[],
    };

    Value::Object(
        members
            .iter()
            .filter_map(|member| {
                entity
                    .attrs
                    .get(*member)
                    .map(|value| (member.to_string(), value.clone()))
            })
            .collect(),
    )
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
