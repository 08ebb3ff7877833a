//! TypeRegistry - a precomputed type lattice.
//!
//! Types are declared with an optional supertype. The registry keeps a
//! reverse subtype index, sorted by name, so subtype enumeration is
//! deterministic regardless of registration order.

use rustc_hash::FxHashMap;
use speculator_core::{QualifiedName, TypeLattice};

use crate::RegistrationError;

/// Shape of a registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Exactly one runtime representation.
    Concrete,
    /// Only reachable through its subtypes.
    Abstract,
    /// Union of the listed member types.
    Union(Vec<QualifiedName>),
}

/// A registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    pub name: QualifiedName,
    pub kind: TypeKind,
    pub supertype: Option<QualifiedName>,
}

impl TypeEntry {
    pub fn concrete(name: impl Into<QualifiedName>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Concrete,
            supertype: None,
        }
    }

    pub fn abstract_type(name: impl Into<QualifiedName>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Abstract,
            supertype: None,
        }
    }

    pub fn union<I, N>(name: impl Into<QualifiedName>, members: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<QualifiedName>,
    {
        Self {
            name: name.into(),
            kind: TypeKind::Union(members.into_iter().map(Into::into).collect()),
            supertype: None,
        }
    }

    /// Declare this type as an immediate subtype of `supertype`.
    pub fn subtype_of(mut self, supertype: impl Into<QualifiedName>) -> Self {
        self.supertype = Some(supertype.into());
        self
    }
}

/// Registry of types with subtype lookup.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: FxHashMap<QualifiedName, TypeEntry>,
    subtypes: FxHashMap<QualifiedName, Vec<QualifiedName>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type. Supertypes may be registered later.
    pub fn register(&mut self, entry: TypeEntry) -> Result<(), RegistrationError> {
        if self.types.contains_key(&entry.name) {
            return Err(RegistrationError::DuplicateType(entry.name.to_string()));
        }
        if let Some(supertype) = &entry.supertype {
            let subs = self.subtypes.entry(supertype.clone()).or_default();
            let at = subs.partition_point(|s| s < &entry.name);
            subs.insert(at, entry.name.clone());
        }
        self.types.insert(entry.name.clone(), entry);
        Ok(())
    }

    pub fn get(&self, name: &QualifiedName) -> Option<&TypeEntry> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeLattice for TypeRegistry {
    fn is_concrete(&self, ty: &QualifiedName) -> bool {
        self.types
            .get(ty)
            .is_some_and(|entry| entry.kind == TypeKind::Concrete)
    }

    fn immediate_subtypes(&self, ty: &QualifiedName) -> Vec<QualifiedName> {
        self.subtypes.get(ty).cloned().unwrap_or_default()
    }

    fn union_members(&self, ty: &QualifiedName) -> Option<Vec<QualifiedName>> {
        match &self.types.get(ty)?.kind {
            TypeKind::Union(members) => Some(members.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types.register(TypeEntry::abstract_type("Number")).unwrap();
        types
            .register(TypeEntry::concrete("Int").subtype_of("Number"))
            .unwrap();
        types
            .register(TypeEntry::abstract_type("Float").subtype_of("Number"))
            .unwrap();
        types
            .register(TypeEntry::concrete("Float64").subtype_of("Float"))
            .unwrap();
        types
            .register(TypeEntry::concrete("Complex").subtype_of("Number"))
            .unwrap();
        types
    }

    #[test]
    fn subtypes_sorted_by_name() {
        let types = numbers();
        let subs: Vec<String> = types
            .immediate_subtypes(&"Number".into())
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(subs, vec!["Complex", "Float", "Int"]);
        assert!(types.immediate_subtypes(&"Int".into()).is_empty());
    }

    #[test]
    fn concreteness() {
        let types = numbers();
        assert!(types.is_concrete(&"Int".into()));
        assert!(!types.is_concrete(&"Number".into()));
        assert!(!types.is_concrete(&"Unknown".into()));
    }

    #[test]
    fn union_members_only_for_unions() {
        let mut types = numbers();
        types
            .register(TypeEntry::union("IntOrFloat", ["Int", "Float64"]))
            .unwrap();
        assert_eq!(
            types.union_members(&"IntOrFloat".into()),
            Some(vec!["Int".into(), "Float64".into()])
        );
        assert_eq!(types.union_members(&"Number".into()), None);
    }

    #[test]
    fn duplicate_type_rejected() {
        let mut types = numbers();
        assert!(matches!(
            types.register(TypeEntry::concrete("Int")),
            Err(RegistrationError::DuplicateType(name)) if name == "Int"
        ));
    }
}
