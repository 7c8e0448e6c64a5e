//! Capability metadata.
//!
//! Remote objects are described by static descriptors instead of runtime
//! reflection: an [`InterfaceDef`] declares the members of a capability
//! interface (with their remote markers), a [`ConcreteDef`] describes a
//! concrete type and the interfaces it implements. The partial evaluator
//! classifies nodes against these tables, and the proxy factory builds
//! stand-in shapes from them.

use std::fmt;
use std::ptr;

/// Static type of an expression node.
///
/// Scalar kinds mirror the wire literal table; `Root`, `Interface` and
/// `Concrete` identify remote-capable receivers; `RootArray` marks the one
/// result shape with a dedicated decode path.
#[derive(Debug, Clone, Copy)]
pub enum StaticType {
    /// No static information. Nodes of this type never take part in
    /// remote-receiver classification.
    Unknown,
    Void,
    Bool,
    Char,
    /// The 8/16/32-bit integer family, carried as `i32`.
    Int,
    Long,
    ULong,
    Double,
    Date,
    Str,
    /// The base remote-root contract itself.
    Root,
    Interface(&'static InterfaceDef),
    Concrete(&'static ConcreteDef),
    /// Array of stand-ins of the given capability interface.
    RootArray(&'static InterfaceDef),
    Promise,
}

impl StaticType {
    /// Whether a receiver of this static type is assignable to the remote
    /// root contract.
    pub fn is_root_assignable(&self) -> bool {
        match self {
            StaticType::Root => true,
            StaticType::Interface(def) => def.remote_root(),
            StaticType::Concrete(def) => def.is_root_assignable(),
            _ => false,
        }
    }

    /// Whether this is an interface-shaped receiver type (the root contract
    /// counts as one).
    pub fn is_interface(&self) -> bool {
        matches!(self, StaticType::Root | StaticType::Interface(_))
    }
}

impl PartialEq for StaticType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (StaticType::Interface(a), StaticType::Interface(b)) => ptr::eq(*a, *b),
            (StaticType::Concrete(a), StaticType::Concrete(b)) => ptr::eq(*a, *b),
            (StaticType::RootArray(a), StaticType::RootArray(b)) => ptr::eq(*a, *b),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticType::Unknown => write!(f, "?"),
            StaticType::Void => write!(f, "Void"),
            StaticType::Bool => write!(f, "Bool"),
            StaticType::Char => write!(f, "Char"),
            StaticType::Int => write!(f, "Int"),
            StaticType::Long => write!(f, "Long"),
            StaticType::ULong => write!(f, "ULong"),
            StaticType::Double => write!(f, "Double"),
            StaticType::Date => write!(f, "Date"),
            StaticType::Str => write!(f, "Str"),
            StaticType::Root => write!(f, "Root"),
            StaticType::Interface(def) => write!(f, "{}", def.name),
            StaticType::Concrete(def) => write!(f, "{}", def.name),
            StaticType::RootArray(def) => write!(f, "[{}]", def.name),
            StaticType::Promise => write!(f, "Promise"),
        }
    }
}

/// A method declaration on an interface or concrete type.
#[derive(Debug)]
pub struct MethodDef {
    pub name: &'static str,
    /// Declaration-site marker: this method executes only on the remote
    /// peer. Absence means the method may be folded locally.
    pub remote: bool,
    pub result: StaticType,
}

/// A property declaration on an interface.
#[derive(Debug)]
pub struct PropertyDef {
    pub name: &'static str,
    pub ty: StaticType,
    pub remote: bool,
    /// Whether the interface declares a public getter for this property.
    pub readable: bool,
    /// Whether the interface declares a public setter for this property.
    pub writable: bool,
}

/// Descriptor of a capability interface.
///
/// `extends` lists ancestor capability interfaces; the base remote-root
/// contract is implied by `remote_root` and carries no entries here (its
/// reference accessor is handled separately by the proxy factory).
#[derive(Debug)]
pub struct InterfaceDef {
    pub name: &'static str,
    /// Whether this interface derives the base remote-root contract.
    /// Descriptors with `false` describe plain local interfaces.
    pub remote_root: bool,
    pub extends: &'static [&'static InterfaceDef],
    pub methods: &'static [MethodDef],
    pub properties: &'static [PropertyDef],
}

impl InterfaceDef {
    pub fn remote_root(&self) -> bool {
        self.remote_root || self.extends.iter().any(|i| i.remote_root())
    }

    /// Look a method up on this interface or any ancestor. Overloads share
    /// a name; the first declaration wins, which is enough for marker and
    /// result-shape queries.
    pub fn find_method(&self, name: &str) -> Option<&'static MethodDef> {
        self.methods
            .iter()
            .find(|m| m.name == name)
            .or_else(|| self.extends.iter().find_map(|i| i.find_method(name)))
    }

    pub fn find_property(&self, name: &str) -> Option<&'static PropertyDef> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.extends.iter().find_map(|i| i.find_property(name)))
    }

    /// All properties of this interface and its ancestors, nearest
    /// declaration first. Shadowed redeclarations are skipped.
    pub fn all_properties(&self) -> Vec<&'static PropertyDef> {
        let mut seen: Vec<&'static PropertyDef> = Vec::new();
        self.collect_properties(&mut seen);
        seen
    }

    fn collect_properties(&self, into: &mut Vec<&'static PropertyDef>) {
        for p in self.properties {
            if !into.iter().any(|q| q.name == p.name) {
                into.push(p);
            }
        }
        for i in self.extends {
            i.collect_properties(into);
        }
    }

    /// This interface plus every ancestor, depth-first.
    pub fn with_ancestors(&'static self) -> Vec<&'static InterfaceDef> {
        let mut all = vec![self];
        for i in self.extends {
            for a in i.with_ancestors() {
                if !all.iter().any(|x| ptr::eq(*x, a)) {
                    all.push(a);
                }
            }
        }
        all
    }
}

/// Descriptor of a concrete type.
#[derive(Debug)]
pub struct ConcreteDef {
    pub name: &'static str,
    /// Whether the type implements the base remote-root contract directly,
    /// without going through a capability interface.
    pub root: bool,
    pub implements: &'static [&'static InterfaceDef],
    pub methods: &'static [MethodDef],
    pub properties: &'static [PropertyDef],
}

impl ConcreteDef {
    pub fn is_root_assignable(&self) -> bool {
        self.root || self.implements.iter().any(|i| i.remote_root())
    }

    pub fn find_method(&self, name: &str) -> Option<&'static MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn find_property(&self, name: &str) -> Option<&'static PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Map a concrete method back to a declaration on one of the
    /// remote-derived capability interfaces this type implements.
    ///
    /// This is the "disguised remote call" defense: a concrete override may
    /// drop the remote marker, but the interface declaration it implements
    /// still carries it.
    pub fn interface_method(&self, name: &str) -> Option<&'static MethodDef> {
        self.implements
            .iter()
            .filter(|i| i.remote_root())
            .flat_map(|i| i.with_ancestors())
            .find_map(|i| i.methods.iter().find(|m| m.name == name))
    }

    pub fn interface_property(&self, name: &str) -> Option<&'static PropertyDef> {
        self.implements
            .iter()
            .filter(|i| i.remote_root())
            .flat_map(|i| i.with_ancestors())
            .find_map(|i| i.properties.iter().find(|p| p.name == name))
    }
}
