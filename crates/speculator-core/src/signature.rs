//! Overload signatures and the concrete specializations derived from them.

use std::fmt;

use bitflags::bitflags;

use crate::{QualifiedName, TypeHash};

bitflags! {
    /// Per-parameter flags attached by the runtime when listing overloads.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ParamFlags: u8 {
        /// The declared type has exactly one runtime representation.
        const CONCRETE = 1 << 0;
        /// The author asked for the declared type to be used as-is.
        const EXEMPT = 1 << 1;
        /// Trailing repeated parameter.
        const VARIADIC = 1 << 2;
    }
}

/// One declared parameter of an overload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub ty: QualifiedName,
    pub flags: ParamFlags,
}

impl Param {
    pub fn new(ty: impl Into<QualifiedName>) -> Self {
        Self {
            ty: ty.into(),
            flags: ParamFlags::empty(),
        }
    }

    pub fn with_flags(ty: impl Into<QualifiedName>, flags: ParamFlags) -> Self {
        Self {
            ty: ty.into(),
            flags,
        }
    }

    /// Parameter marked to be used as declared.
    pub fn exempt(ty: impl Into<QualifiedName>) -> Self {
        Self::with_flags(ty, ParamFlags::EXEMPT)
    }

    /// Trailing repeated parameter.
    pub fn variadic(ty: impl Into<QualifiedName>) -> Self {
        Self::with_flags(ty, ParamFlags::VARIADIC)
    }

    /// Whether expansion must keep the declared type.
    ///
    /// Variadic parameters are fixed by construction to keep expansion bounded.
    pub fn is_fixed(&self) -> bool {
        self.flags
            .intersects(ParamFlags::CONCRETE | ParamFlags::EXEMPT | ParamFlags::VARIADIC)
    }
}

/// The declared parameter types of one overload of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct OverloadSignature {
    pub params: Vec<Param>,
}

impl OverloadSignature {
    pub fn new(params: Vec<Param>) -> Self {
        Self { params }
    }

    /// Overload taking no parameters.
    pub fn nullary() -> Self {
        Self::default()
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for OverloadSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param.ty)?;
            if param.flags.contains(ParamFlags::VARIADIC) {
                f.write_str("...")?;
            }
        }
        f.write_str(")")
    }
}

/// An ordered tuple of concrete parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ConcreteSignature {
    types: Vec<QualifiedName>,
}

impl ConcreteSignature {
    pub fn new(types: Vec<QualifiedName>) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &[QualifiedName] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Display for ConcreteSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, ty) in self.types.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty}")?;
        }
        f.write_str(")")
    }
}

/// A callable paired with one concrete signature: the unit of compilation.
///
/// Renders as `Main::Showcase::h(String)`, which is also the body of a
/// directive line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Specialization {
    pub callable: QualifiedName,
    pub signature: ConcreteSignature,
}

impl Specialization {
    pub fn new(callable: QualifiedName, signature: ConcreteSignature) -> Self {
        Self {
            callable,
            signature,
        }
    }

    /// Deterministic identity of this specialization.
    pub fn type_hash(&self) -> TypeHash {
        let params: Vec<TypeHash> = self
            .signature
            .types()
            .iter()
            .map(QualifiedName::to_type_hash)
            .collect();
        TypeHash::from_signature(&self.callable.to_string(), &params)
    }

    /// Parse the rendering produced by `Display`.
    ///
    /// Returns `None` unless the text has the shape `name(T1, T2, ...)`.
    /// Parameter types are split on top-level commas only, so a type such as
    /// `Pair{Int, String}` reads back as one type.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let open = text.find('(')?;
        let inner = text[open + 1..].strip_suffix(')')?;
        let callable = text[..open].trim();
        if callable.is_empty() {
            return None;
        }
        let types = if inner.trim().is_empty() {
            Vec::new()
        } else {
            split_top_level(inner)?
                .into_iter()
                .map(|ty| {
                    let ty = ty.trim();
                    (!ty.is_empty()).then(|| QualifiedName::from_qualified_string(ty))
                })
                .collect::<Option<Vec<_>>>()?
        };
        Some(Self::new(
            QualifiedName::from_qualified_string(callable),
            ConcreteSignature::new(types),
        ))
    }
}

/// Split `text` on commas that are not nested in `()`, `[]` or `{}`.
///
/// `None` if the brackets do not balance.
fn split_top_level(text: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut open = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => open.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if open.pop() != Some(expected) {
                    return None;
                }
            }
            ',' if open.is_empty() => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if !open.is_empty() {
        return None;
    }
    parts.push(&text[start..]);
    Some(parts)
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.callable, self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(callable: &str, types: &[&str]) -> Specialization {
        Specialization::new(
            callable.into(),
            ConcreteSignature::new(types.iter().map(|t| QualifiedName::from(*t)).collect()),
        )
    }

    #[test]
    fn renders_callable_and_types() {
        assert_eq!(spec("Main::f", &[]).to_string(), "Main::f()");
        assert_eq!(
            spec("Main::i", &["String", "Core::Char"]).to_string(),
            "Main::i(String, Core::Char)"
        );
    }

    #[test]
    fn parse_accepts_rendering() {
        let original = spec("Main::Showcase::h", &["Base::String", "Symbol"]);
        assert_eq!(Specialization::parse(&original.to_string()), Some(original));
        assert_eq!(Specialization::parse("  f( )  "), Some(spec("f", &[])));
    }

    #[test]
    fn parse_rejects_malformed_text() {
        assert_eq!(Specialization::parse("f"), None);
        assert_eq!(Specialization::parse("(Int)"), None);
        assert_eq!(Specialization::parse("f(Int"), None);
        assert_eq!(Specialization::parse("f(Int,,String)"), None);
        assert_eq!(Specialization::parse("f(Int))"), None);
        assert_eq!(Specialization::parse("f(Pair{Int, String)"), None);
        assert_eq!(Specialization::parse("f(Pair{Int, String)})"), None);
    }

    #[test]
    fn parse_keeps_bracketed_types_whole() {
        for original in [
            spec("Main::p", &["Pair{Int, String}"]),
            spec("Main::p", &["Pair{Int, String}", "Int"]),
            spec("Main::q", &["Fn(Int, Int)", "Array[Int, 2]"]),
            spec("Main::r", &["Map{Core::Int, Vec{String, Symbol}}"]),
        ] {
            let parsed = Specialization::parse(&original.to_string()).unwrap();
            assert_eq!(parsed.signature.len(), original.signature.len());
            assert_eq!(parsed.type_hash(), original.type_hash());
        }
    }

    #[test]
    fn hash_distinguishes_signatures() {
        assert_eq!(spec("f", &["Int"]).type_hash(), spec("f", &["Int"]).type_hash());
        assert_ne!(spec("f", &["Int"]).type_hash(), spec("f", &["String"]).type_hash());
        assert_ne!(spec("f", &[]).type_hash(), spec("g", &[]).type_hash());
    }

    #[test]
    fn fixed_parameters() {
        assert!(!Param::new("Number").is_fixed());
        assert!(Param::exempt("Number").is_fixed());
        assert!(Param::variadic("Number").is_fixed());
        assert!(Param::with_flags("Int", ParamFlags::CONCRETE).is_fixed());
    }
}
