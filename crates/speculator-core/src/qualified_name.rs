use std::cmp::Ordering;
use std::fmt;

/// Qualified name for namespaces, callables and types.
///
/// Used as the primary key everywhere the engine talks to a runtime.
///
/// # Examples
///
/// ```
/// use speculator_core::QualifiedName;
///
/// // Global namespace
/// let int = QualifiedName::global("Int");
/// assert_eq!(int.to_string(), "Int");
///
/// // With namespace
/// let g = QualifiedName::new("g", vec!["Main".into(), "Showcase".into()]);
/// assert_eq!(g.to_string(), "Main::Showcase::g");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Simple name (e.g., "g", "String")
    pub name: String,
    /// Namespace path (e.g., ["Main", "Showcase"])
    /// Empty for the global namespace
    pub namespace: Vec<String>,
}

impl QualifiedName {
    /// Create a new qualified name with namespace.
    pub fn new(name: impl Into<String>, namespace: Vec<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
        }
    }

    /// Create a qualified name in the global namespace.
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Vec::new(),
        }
    }

    /// Create from a qualified string (e.g., "Main::Showcase::g").
    ///
    /// Splits on "::" - the last segment is the name, rest is namespace.
    /// Leading "::" is normalized: "::Main::g" == "Main::g".
    pub fn from_qualified_string(s: &str) -> Self {
        let mut parts: Vec<String> = s
            .split("::")
            .filter(|p| !p.is_empty())
            .map(|p| p.trim().to_string())
            .collect();
        match parts.pop() {
            Some(name) => Self {
                name,
                namespace: parts,
            },
            None => Self::global(""),
        }
    }

    /// Check if this is in the global namespace.
    pub fn is_global(&self) -> bool {
        self.namespace.is_empty()
    }

    /// Get the simple (unqualified) name.
    pub fn simple_name(&self) -> &str {
        &self.name
    }

    /// Get the namespace path.
    pub fn namespace_path(&self) -> &[String] {
        &self.namespace
    }

    /// Path segments of this name when it denotes a namespace itself.
    ///
    /// `Main::Showcase` -> `["Main", "Showcase"]`
    pub fn segments(&self) -> Vec<String> {
        let mut path = self.namespace.clone();
        if !self.name.is_empty() {
            path.push(self.name.clone());
        }
        path
    }

    /// Create a child name within this namespace.
    ///
    /// Example: `Main::Showcase` + `g` = `Main::Showcase::g`
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: self.segments(),
        }
    }

    /// Get the parent namespace as a QualifiedName (if any).
    ///
    /// Example: `Main::Showcase::g` -> Some(`Main::Showcase`)
    pub fn parent(&self) -> Option<Self> {
        let (name, namespace) = self.namespace.split_last()?;
        Some(Self {
            name: name.clone(),
            namespace: namespace.to_vec(),
        })
    }

    /// Check whether `self` is a direct child of `namespace`.
    pub fn is_child_of(&self, namespace: &QualifiedName) -> bool {
        self.namespace == namespace.segments()
    }

    /// Compute the identity hash of this name.
    pub fn to_type_hash(&self) -> crate::TypeHash {
        crate::TypeHash::from_name(&self.to_string())
    }
}

impl PartialOrd for QualifiedName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Namespace first, so names sort the way they print.
impl Ord for QualifiedName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.namespace
            .cmp(&other.namespace)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}::{}", self.namespace.join("::"), self.name)
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(s: &str) -> Self {
        Self::from_qualified_string(s)
    }
}

impl From<String> for QualifiedName {
    fn from(s: String) -> Self {
        Self::from_qualified_string(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_name() {
        let name = QualifiedName::global("Int");
        assert_eq!(name.name, "Int");
        assert!(name.is_global());
        assert_eq!(name.to_string(), "Int");
    }

    #[test]
    fn from_qualified_string() {
        let name = QualifiedName::from_qualified_string("Main::Showcase::g");
        assert_eq!(name.name, "g");
        assert_eq!(name.namespace, vec!["Main", "Showcase"]);

        let absolute = QualifiedName::from_qualified_string("::Main::g");
        assert_eq!(absolute, QualifiedName::from_qualified_string("Main::g"));

        let empty = QualifiedName::from_qualified_string("::");
        assert_eq!(empty.name, "");
        assert!(empty.is_global());
    }

    #[test]
    fn child_and_parent() {
        let ns = QualifiedName::from("Main::Showcase");
        let g = ns.child("g");
        assert_eq!(g.to_string(), "Main::Showcase::g");
        assert!(g.is_child_of(&ns));
        assert_eq!(g.parent(), Some(ns.clone()));
        assert!(!ns.child("Inner").child("h").is_child_of(&ns));
        assert!(QualifiedName::global("Main").parent().is_none());
    }

    #[test]
    fn ordering_follows_display() {
        let mut names = vec![
            QualifiedName::from("B::a"),
            QualifiedName::from("A::z"),
            QualifiedName::from("A::b"),
        ];
        names.sort();
        let printed: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        assert_eq!(printed, vec!["A::b", "A::z", "B::a"]);
    }
}
