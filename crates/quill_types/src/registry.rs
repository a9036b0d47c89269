//! The type and converter registry.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use quill_foundation::{Error, ErrorKind, Result, Value, ValueKind};
use quill_pattern::{TypeLookup, TypeRef};
use tracing::debug;

use crate::changer::Changer;
use crate::info::{ConverterFn, LiteralParser, Serializer, TypeInfo};
use crate::names::TypeNames;

/// Default bound on the number of converter edges composed by [`TypeRegistry::convert`].
pub const DEFAULT_MAX_HOPS: usize = 4;

/// A type as stored in the registry.
#[derive(Clone)]
pub struct RegisteredType {
    names: TypeNames,
    kind: ValueKind,
    parser: Option<LiteralParser>,
    serializer: Option<Serializer>,
    changer: Option<Arc<dyn Changer>>,
}

impl RegisteredType {
    /// Returns the canonical (singular) name.
    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        self.names.singular()
    }

    /// Returns the surface forms.
    #[must_use]
    pub fn names(&self) -> &TypeNames {
        &self.names
    }

    /// Returns the backing kind.
    #[must_use]
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Returns true if the type can parse literals.
    #[must_use]
    pub fn has_parser(&self) -> bool {
        self.parser.is_some()
    }

    /// Parses literal text, if the type has a parser and the text is a literal.
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<Value> {
        self.parser.as_ref().and_then(|p| p(text))
    }

    /// Renders a value of this type as text.
    #[must_use]
    pub fn serialize(&self, value: &Value) -> String {
        match &self.serializer {
            Some(s) => s(value),
            None => value.to_string(),
        }
    }

    /// Returns the changer, if the type declared one.
    #[must_use]
    pub fn changer(&self) -> Option<&Arc<dyn Changer>> {
        self.changer.as_ref()
    }
}

impl fmt::Debug for RegisteredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.names.singular(), self.kind)
    }
}

/// Registry of types and converter edges.
///
/// Populated during registration and read-only afterwards; it needs no
/// synchronization once parsing starts.
#[derive(Clone)]
pub struct TypeRegistry {
    types: Vec<RegisteredType>,
    /// Lowercased surface form -> (index, is plural).
    by_surface: HashMap<Arc<str>, (usize, bool)>,
    /// Canonical source name -> edges in registration order.
    edges: HashMap<Arc<str>, Vec<(String, ConverterFn)>>,
    max_hops: usize,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates an empty registry with the default hop bound.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            by_surface: HashMap::new(),
            edges: HashMap::new(),
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    /// Sets the bound on composed converter edges.
    #[must_use]
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Sets the bound on composed converter edges in place.
    pub fn set_max_hops(&mut self, max_hops: usize) {
        self.max_hops = max_hops;
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredType> {
        self.types.iter()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a type.
    ///
    /// # Errors
    ///
    /// Returns an error if the name pattern is malformed, or `DuplicateType`
    /// if either surface form is already taken.
    pub fn register(&mut self, info: TypeInfo) -> Result<()> {
        let names = TypeNames::parse(&info.name_pattern)?;
        for surface in [names.singular(), names.plural()] {
            if self.by_surface.contains_key(surface) {
                return Err(Error::new(ErrorKind::DuplicateType(surface.to_string())));
            }
        }

        let index = self.types.len();
        self.by_surface.insert(names.singular().clone(), (index, false));
        self.by_surface.insert(names.plural().clone(), (index, true));
        for (to, convert) in info.converters {
            self.edges
                .entry(names.singular().clone())
                .or_default()
                .push((to.to_lowercase(), convert));
        }

        debug!(name = %names.singular(), kind = %info.kind, "registered type");
        self.types.push(RegisteredType {
            names,
            kind: info.kind,
            parser: info.parser,
            serializer: info.serializer,
            changer: info.changer,
        });
        Ok(())
    }

    /// Registers a converter edge between two registered types.
    ///
    /// An existing edge between the same pair is replaced.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if either type is not registered.
    pub fn register_converter(
        &mut self,
        from: &str,
        to: &str,
        convert: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    ) -> Result<()> {
        let from = self.require(from)?.name().clone();
        let to = self.require(to)?.name().to_string();
        // Earlier edges may name the target by any surface form.
        let mut edges = self.edges.remove(&from).unwrap_or_default();
        edges.retain(|(t, _)| match self.canonical(t) {
            Some(c) => *c != *to,
            None => *t != to,
        });
        debug!(%from, %to, "registered converter");
        edges.push((to, Arc::new(convert)));
        self.edges.insert(from, edges);
        Ok(())
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Looks up a type by singular or plural surface form (case-insensitive).
    #[must_use]
    pub fn get(&self, surface: &str) -> Option<&RegisteredType> {
        self.lookup_surface(surface).map(|(t, _)| t)
    }

    /// Looks up a surface form, also reporting whether it was the plural one.
    #[must_use]
    pub fn lookup_surface(&self, surface: &str) -> Option<(&RegisteredType, bool)> {
        let key = surface.to_lowercase();
        self.by_surface
            .get(key.as_str())
            .map(|&(index, plural)| (&self.types[index], plural))
    }

    /// Returns the first registered type with the given backing kind.
    #[must_use]
    pub fn by_kind(&self, kind: &ValueKind) -> Option<&RegisteredType> {
        self.types.iter().find(|t| &t.kind == kind)
    }

    /// Returns the registered type a runtime value belongs to.
    #[must_use]
    pub fn type_of(&self, value: &Value) -> Option<&RegisteredType> {
        self.by_kind(&value.kind())
    }

    fn require(&self, surface: &str) -> Result<&RegisteredType> {
        self.get(surface).ok_or_else(|| Error::unknown_type(surface))
    }

    fn canonical(&self, surface: &str) -> Option<Arc<str>> {
        self.get(surface).map(|t| t.name().clone())
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    /// Finds the shortest converter path between two types.
    ///
    /// The path lists canonical type names from `from` to `to` inclusive and
    /// composes at most the configured number of edges. Direct edges are
    /// found first; among paths of equal length, edges registered earlier win.
    #[must_use]
    pub fn conversion_path(&self, from: &str, to: &str) -> Option<Vec<Arc<str>>> {
        let from = self.canonical(from)?;
        let to = self.canonical(to)?;
        if from == to {
            return Some(vec![from]);
        }

        let mut parents: HashMap<Arc<str>, Arc<str>> = HashMap::new();
        let mut visited: HashSet<Arc<str>> = HashSet::from([from.clone()]);
        let mut queue = VecDeque::from([(from.clone(), 0usize)]);

        while let Some((node, depth)) = queue.pop_front() {
            if depth >= self.max_hops {
                continue;
            }
            let Some(edges) = self.edges.get(&node) else {
                continue;
            };
            for (next, _) in edges {
                let Some(next) = self.canonical(next) else {
                    continue;
                };
                if !visited.insert(next.clone()) {
                    continue;
                }
                parents.insert(next.clone(), node.clone());
                if next == to {
                    let mut path = vec![next];
                    while let Some(parent) = path.last().and_then(|n| parents.get(n)) {
                        path.push(parent.clone());
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back((next, depth + 1));
            }
        }
        None
    }

    /// Returns true if values of `from` can be converted to `to`.
    #[must_use]
    pub fn can_convert(&self, from: &str, to: &str) -> bool {
        match self.get(to) {
            Some(target) if target.kind.is_any() => self.get(from).is_some(),
            Some(_) => self.conversion_path(from, to).is_some(),
            None => false,
        }
    }

    /// Converts a value from one type to another.
    ///
    /// Identity when the types are equal or the target is backed by
    /// [`ValueKind::Any`]; otherwise the converters along
    /// [`conversion_path`](Self::conversion_path) are applied in order.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` for unregistered names and `NoConversion` if no
    /// path exists within the hop bound or a converter rejects the value.
    pub fn convert(&self, value: &Value, from: &str, to: &str) -> Result<Value> {
        let source = self.require(from)?;
        let target = self.require(to)?;
        if source.name() == target.name() || target.kind.is_any() {
            return Ok(value.clone());
        }

        let no_conversion = || Error::no_conversion(source.name().to_string(), target.name().to_string());
        let path = self.conversion_path(from, to).ok_or_else(no_conversion)?;
        let mut current = value.clone();
        for step in path.windows(2) {
            let convert = self.edge(&step[0], &step[1]).ok_or_else(no_conversion)?;
            current = convert(&current).ok_or_else(no_conversion)?;
        }
        Ok(current)
    }

    fn edge(&self, from: &str, to: &str) -> Option<&ConverterFn> {
        self.edges
            .get(from)?
            .iter()
            .find(|(t, _)| self.canonical(t).is_some_and(|c| c.as_ref() == to))
            .map(|(_, f)| f)
    }

    // =========================================================================
    // Literals
    // =========================================================================

    /// Parses literal text as the named type.
    #[must_use]
    pub fn parse_literal(&self, type_name: &str, text: &str) -> Option<Value> {
        self.get(type_name)?.parse(text)
    }

    /// Renders a value with the named type's serializer.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if the type is not registered.
    pub fn serialize(&self, type_name: &str, value: &Value) -> Result<String> {
        Ok(self.require(type_name)?.serialize(value))
    }

    /// Renders a value with the serializer of the type matching its kind.
    #[must_use]
    pub fn to_text(&self, value: &Value) -> String {
        match self.type_of(value) {
            Some(t) => t.serialize(value),
            None => value.to_string(),
        }
    }
}

impl TypeLookup for TypeRegistry {
    fn lookup_type(&self, surface: &str) -> Option<TypeRef> {
        self.lookup_surface(surface)
            .map(|(t, plural)| TypeRef::new(t.name().clone(), surface, plural))
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types)
            .field("max_hops", &self.max_hops)
            .finish_non_exhaustive()
    }
}
