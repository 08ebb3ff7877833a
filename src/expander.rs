//! Signature expansion from declared to concrete parameter types.
//!
//! ## Algorithm
//!
//! 1. For each parameter, compute its candidate types:
//!    - exempt, variadic or concrete parameters keep their declared type
//!    - otherwise collect concrete leaves below the declared type, expanding
//!      unions into their members and abstract types into their subtypes
//! 2. Walk the Cartesian product of the candidate sets lazily, in
//!    lexicographic order (the last parameter varies fastest)
//! 3. Stop after `limit` signatures
//!
//! Only the first `limit` tuples are ever produced, and those can use at most
//! `limit` distinct values per position, so each leaf search also stops
//! after `limit` leaves. An empty candidate set for any position means the
//! overload yields nothing.
//!
//! Union members and subtypes are offered to the run's [`Predicate`] as
//! `(namespace, name)` before being searched, the same way the collector
//! offers namespace bindings. A rejected type is pruned with everything
//! below it; a predicate error ends the expansion.

use std::num::NonZeroUsize;

use rustc_hash::FxHashSet;
use speculator_core::{
    ConcreteSignature, OverloadSignature, Param, QualifiedName, SpeculateError, SpeculateResult,
    TypeLattice,
};

use crate::Predicate;

/// Expands overload signatures into at most `limit` concrete signatures each.
pub struct SignatureExpander<'a, L: TypeLattice + ?Sized> {
    lattice: &'a L,
    predicate: Predicate,
    limit: NonZeroUsize,
}

impl<'a, L: TypeLattice + ?Sized> SignatureExpander<'a, L> {
    /// Expander that searches every subtype.
    pub fn new(lattice: &'a L, limit: NonZeroUsize) -> Self {
        Self {
            lattice,
            predicate: Predicate::accept_all(),
            limit,
        }
    }

    /// Only search the subtypes and union members `predicate` accepts.
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn limit(&self) -> NonZeroUsize {
        self.limit
    }

    /// Concrete signatures for `overload`, in deterministic order.
    ///
    /// Candidate sets are computed up front, so a predicate failure is
    /// reported here rather than while iterating.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn expand(&self, overload: &OverloadSignature) -> SpeculateResult<Expansion> {
        let sets = overload
            .params
            .iter()
            .map(|param| self.candidates(param))
            .collect::<SpeculateResult<Vec<_>>>()?;
        Ok(Expansion::new(sets, self.limit.get()))
    }

    /// Candidate concrete types for one parameter position.
    pub fn candidates(&self, param: &Param) -> SpeculateResult<Vec<QualifiedName>> {
        if param.is_fixed() || self.lattice.is_concrete(&param.ty) {
            return Ok(vec![param.ty.clone()]);
        }
        let mut leaves = Vec::new();
        let mut visited = FxHashSet::default();
        self.collect_leaves(&param.ty, &mut visited, &mut leaves)?;
        Ok(leaves)
    }

    fn collect_leaves(
        &self,
        ty: &QualifiedName,
        visited: &mut FxHashSet<QualifiedName>,
        leaves: &mut Vec<QualifiedName>,
    ) -> SpeculateResult<()> {
        if leaves.len() >= self.limit.get() || !visited.insert(ty.clone()) {
            return Ok(());
        }
        if let Some(members) = self.lattice.union_members(ty) {
            self.descend(&members, visited, leaves)
        } else if self.lattice.is_concrete(ty) {
            leaves.push(ty.clone());
            Ok(())
        } else {
            self.descend(&self.lattice.immediate_subtypes(ty), visited, leaves)
        }
    }

    fn descend(
        &self,
        types: &[QualifiedName],
        visited: &mut FxHashSet<QualifiedName>,
        leaves: &mut Vec<QualifiedName>,
    ) -> SpeculateResult<()> {
        for ty in types {
            if self.accepts(ty)? {
                self.collect_leaves(ty, visited, leaves)?;
            }
        }
        Ok(())
    }

    fn accepts(&self, ty: &QualifiedName) -> SpeculateResult<bool> {
        let namespace = ty.parent().unwrap_or_else(|| QualifiedName::global(""));
        self.predicate
            .test(&namespace, ty.simple_name())
            .map_err(|source| SpeculateError::Predicate {
                namespace,
                name: ty.simple_name().to_string(),
                source,
            })
    }
}

/// Lazy, bounded Cartesian product over per-position candidate sets.
#[derive(Debug, Clone)]
pub struct Expansion {
    sets: Vec<Vec<QualifiedName>>,
    /// Index into each set; `None` once exhausted.
    cursor: Option<Vec<usize>>,
    remaining: usize,
}

impl Expansion {
    fn new(sets: Vec<Vec<QualifiedName>>, limit: usize) -> Self {
        let cursor = if sets.iter().any(Vec::is_empty) {
            None
        } else {
            Some(vec![0; sets.len()])
        };
        Self {
            sets,
            cursor,
            remaining: limit,
        }
    }
}

impl Iterator for Expansion {
    type Item = ConcreteSignature;

    fn next(&mut self) -> Option<ConcreteSignature> {
        if self.remaining == 0 {
            return None;
        }
        let cursor = self.cursor.as_mut()?;
        let signature = ConcreteSignature::new(
            cursor
                .iter()
                .zip(&self.sets)
                .map(|(&i, set)| set[i].clone())
                .collect(),
        );
        self.remaining -= 1;
        if !advance(cursor, &self.sets) {
            self.cursor = None;
        }
        Some(signature)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.cursor {
            Some(_) => (1.min(self.remaining), Some(self.remaining)),
            None => (0, Some(0)),
        }
    }
}

/// Step the odometer; false when every combination has been produced.
fn advance(cursor: &mut [usize], sets: &[Vec<QualifiedName>]) -> bool {
    for pos in (0..cursor.len()).rev() {
        cursor[pos] += 1;
        if cursor[pos] < sets[pos].len() {
            return true;
        }
        cursor[pos] = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculator_core::{Param, ParamFlags, PredicateError};
    use speculator_registry::{TypeEntry, TypeRegistry};

    fn lattice() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        for entry in [
            TypeEntry::concrete("Int"),
            TypeEntry::concrete("String"),
            TypeEntry::concrete("Symbol"),
            TypeEntry::union("StringOrSymbol", ["String", "Symbol"]),
            TypeEntry::abstract_type("AbstractChar"),
            TypeEntry::concrete("Char").subtype_of("AbstractChar"),
            TypeEntry::concrete("WrapperChar").subtype_of("AbstractChar"),
            TypeEntry::abstract_type("Number"),
            TypeEntry::concrete("Complex").subtype_of("Number"),
            TypeEntry::abstract_type("Real").subtype_of("Number"),
            TypeEntry::concrete("Float64").subtype_of("Real"),
            TypeEntry::concrete("Int64").subtype_of("Real"),
            TypeEntry::abstract_type("Empty"),
            TypeEntry::union("Loop", ["Loop", "Int"]),
        ] {
            types.register(entry).unwrap();
        }
        types
    }

    fn limit(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn overload(params: &[&str]) -> OverloadSignature {
        OverloadSignature::new(params.iter().map(|p| Param::new(*p)).collect())
    }

    fn render(expansion: SpeculateResult<Expansion>) -> Vec<String> {
        expansion.unwrap().map(|s| s.to_string()).collect()
    }

    #[test]
    fn nullary_overload_yields_one_empty_signature() {
        let types = lattice();
        let expander = SignatureExpander::new(&types, limit(5));
        assert_eq!(render(expander.expand(&OverloadSignature::nullary())), vec!["()"]);
    }

    #[test]
    fn concrete_parameter_is_kept() {
        let types = lattice();
        let expander = SignatureExpander::new(&types, limit(5));
        assert_eq!(render(expander.expand(&overload(&["Int"]))), vec!["(Int)"]);
    }

    #[test]
    fn exempt_and_variadic_parameters_are_not_substituted() {
        let types = lattice();
        let expander = SignatureExpander::new(&types, limit(5));
        let sig = OverloadSignature::new(vec![
            Param::exempt("Number"),
            Param::new("StringOrSymbol"),
            Param::variadic("AbstractChar"),
        ]);
        assert_eq!(
            render(expander.expand(&sig)),
            vec![
                "(Number, String, AbstractChar)",
                "(Number, Symbol, AbstractChar)"
            ]
        );
    }

    #[test]
    fn concrete_flag_wins_over_lattice() {
        let types = lattice();
        let expander = SignatureExpander::new(&types, limit(5));
        let param = Param::with_flags("Opaque", ParamFlags::CONCRETE);
        assert_eq!(expander.candidates(&param).unwrap(), vec![QualifiedName::from("Opaque")]);
    }

    #[test]
    fn union_respects_limit() {
        let types = lattice();
        let sig = overload(&["StringOrSymbol"]);
        assert_eq!(
            render(SignatureExpander::new(&types, limit(1)).expand(&sig)),
            vec!["(String)"]
        );
        assert_eq!(
            render(SignatureExpander::new(&types, limit(2)).expand(&sig)),
            vec!["(String)", "(Symbol)"]
        );
        assert_eq!(
            render(SignatureExpander::new(&types, limit(10)).expand(&sig)).len(),
            2
        );
    }

    #[test]
    fn abstract_types_resolve_to_concrete_leaves() {
        let types = lattice();
        let expander = SignatureExpander::new(&types, limit(10));
        assert_eq!(
            render(expander.expand(&overload(&["Number"]))),
            vec!["(Complex)", "(Float64)", "(Int64)"]
        );
    }

    #[test]
    fn leaf_search_stops_at_limit() {
        let types = lattice();
        let expander = SignatureExpander::new(&types, limit(2));
        assert_eq!(
            expander.candidates(&Param::new("Number")).unwrap(),
            vec![QualifiedName::from("Complex"), QualifiedName::from("Float64")]
        );
    }

    #[test]
    fn empty_candidate_set_yields_nothing() {
        let types = lattice();
        let expander = SignatureExpander::new(&types, limit(5));
        assert_eq!(render(expander.expand(&overload(&["Int", "Empty"]))).len(), 0);
        assert_eq!(render(expander.expand(&overload(&["Unknown"]))).len(), 0);
    }

    #[test]
    fn product_is_lexicographic_over_positions() {
        let types = lattice();
        let expander = SignatureExpander::new(&types, limit(4));
        assert_eq!(
            render(expander.expand(&overload(&["StringOrSymbol", "AbstractChar"]))),
            vec![
                "(String, Char)",
                "(String, WrapperChar)",
                "(Symbol, Char)",
                "(Symbol, WrapperChar)",
            ]
        );
    }

    #[test]
    fn never_exceeds_limit() {
        let types = lattice();
        let sig = overload(&["Number", "StringOrSymbol", "AbstractChar"]);
        for n in 1..=16 {
            let produced: Vec<ConcreteSignature> =
                SignatureExpander::new(&types, limit(n)).expand(&sig).unwrap().collect();
            assert!(produced.len() <= n);
            assert_eq!(produced.len(), n.min(12));
            let distinct: FxHashSet<&ConcreteSignature> = produced.iter().collect();
            assert_eq!(distinct.len(), produced.len());
        }
    }

    #[test]
    fn cyclic_unions_terminate() {
        let types = lattice();
        let expander = SignatureExpander::new(&types, limit(5));
        assert_eq!(render(expander.expand(&overload(&["Loop"]))), vec!["(Int)"]);
    }

    #[test]
    fn predicate_prunes_union_members() {
        let types = lattice();
        let expander = SignatureExpander::new(&types, limit(5))
            .with_predicate(Predicate::new(|_, name| name != "Symbol"));
        assert_eq!(
            render(expander.expand(&overload(&["StringOrSymbol"]))),
            vec!["(String)"]
        );
    }

    #[test]
    fn predicate_prunes_whole_subtrees() {
        let types = lattice();
        let expander = SignatureExpander::new(&types, limit(5))
            .with_predicate(Predicate::new(|_, name| name != "Real"));
        assert_eq!(render(expander.expand(&overload(&["Number"]))), vec!["(Complex)"]);
    }

    #[test]
    fn predicate_sees_type_namespace() {
        let mut types = lattice();
        for entry in [
            TypeEntry::concrete("Core::Glyph").subtype_of("AbstractChar"),
            TypeEntry::concrete("Base::Rune").subtype_of("AbstractChar"),
        ] {
            types.register(entry).unwrap();
        }
        let expander = SignatureExpander::new(&types, limit(10))
            .with_predicate(Predicate::excluding(["Base", "Core"]));
        assert_eq!(
            render(expander.expand(&overload(&["AbstractChar"]))),
            vec!["(Char)", "(WrapperChar)"]
        );
    }

    #[test]
    fn declared_types_are_not_filtered() {
        let types = lattice();
        let expander = SignatureExpander::new(&types, limit(5))
            .with_predicate(Predicate::new(|_, name| name != "Int"));
        assert_eq!(render(expander.expand(&overload(&["Int"]))), vec!["(Int)"]);
    }

    #[test]
    fn predicate_failure_ends_expansion() {
        let types = lattice();
        let expander =
            SignatureExpander::new(&types, limit(5)).with_predicate(Predicate::fallible(|_, name| {
                if name == "Symbol" {
                    Err(PredicateError::new("refused"))
                } else {
                    Ok(true)
                }
            }));
        match expander.expand(&overload(&["Int", "StringOrSymbol"])) {
            Err(SpeculateError::Predicate { name, .. }) => assert_eq!(name, "Symbol"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
