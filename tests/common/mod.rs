//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use speculator::{CaptureSink, Options, Speculator, Verbosity};
use speculator_core::{ConcreteSignature, Param, QualifiedName, Specialization};
use speculator_registry::{FunctionEntry, SymbolRegistry, TypeEntry};

pub const SHOWCASE: &str = "Main::Showcase";

/// Types shared by every fixture.
pub fn register_types(registry: &mut SymbolRegistry) {
    for entry in [
        TypeEntry::concrete("Int"),
        TypeEntry::concrete("String"),
        TypeEntry::concrete("Symbol"),
        TypeEntry::union("StringOrSymbol", ["String", "Symbol"]),
        TypeEntry::abstract_type("AbstractChar"),
        TypeEntry::concrete("Char").subtype_of("AbstractChar"),
        TypeEntry::concrete("WrapperChar").subtype_of("AbstractChar"),
        TypeEntry::abstract_type("Number"),
        TypeEntry::concrete("Float64").subtype_of("Number"),
    ] {
        registry.register_type(entry).unwrap();
    }
}

/// `Main::Showcase` with:
///
/// - `f()`, `g(Int)` and `h(StringOrSymbol)`, all public
/// - `secret(StringOrSymbol)`, not public
pub fn showcase() -> SymbolRegistry {
    let mut registry = SymbolRegistry::new();
    register_types(&mut registry);
    for entry in [
        FunctionEntry::new("Main::Showcase::f")
            .overload(Vec::<&str>::new())
            .public(),
        FunctionEntry::new("Main::Showcase::g").overload(["Int"]).public(),
        FunctionEntry::new("Main::Showcase::h")
            .overload(["StringOrSymbol"])
            .public(),
        FunctionEntry::new("Main::Showcase::secret").overload(["StringOrSymbol"]),
    ] {
        registry.register_function(entry).unwrap();
    }
    registry
}

/// `showcase()` plus a product overload, an exempt overload and an import.
pub fn extended() -> SymbolRegistry {
    let mut registry = showcase();
    registry
        .register_function(
            FunctionEntry::new("Main::Showcase::pair")
                .overload(["StringOrSymbol", "AbstractChar"])
                .public(),
        )
        .unwrap();
    registry
        .register_function(
            FunctionEntry::new("Main::Showcase::fixed")
                .overload_with(vec![Param::exempt("Number"), Param::variadic("AbstractChar")])
                .public(),
        )
        .unwrap();
    registry
        .register_function(FunctionEntry::new("Other::elsewhere").overload(["Int"]).public())
        .unwrap();
    registry
        .import_namespace(SHOWCASE, "Elsewhere", "Other")
        .unwrap();
    registry
}

pub fn spec(callable: &str, types: &[&str]) -> Specialization {
    Specialization::new(
        callable.into(),
        ConcreteSignature::new(types.iter().map(|t| QualifiedName::from(*t)).collect()),
    )
}

/// A speculator over `registry` reporting into a fresh capture sink.
pub fn capturing(registry: Arc<SymbolRegistry>) -> (Speculator<SymbolRegistry>, Arc<CaptureSink>) {
    let sink = Arc::new(CaptureSink::new());
    let speculator = Speculator::new(registry).with_sink(sink.clone());
    (speculator, sink)
}

pub fn quiet(limit: usize) -> Options {
    Options {
        limit,
        verbosity: Verbosity::SILENT,
        ..Options::default()
    }
}

pub fn line_count(path: &Path) -> usize {
    fs::read_to_string(path)
        .map(|text| text.lines().count())
        .unwrap_or(0)
}
