//! Runtime object representation
//!
//! This module defines the [`Object`] enum, the tagged payload of every live
//! object in an [`ObjectHeap`].  Variants fall into five groups:
//!
//! - Fixed-size scalars: [`Object::None`], [`Object::Bool`], [`Object::Int`],
//!   [`Object::Float`]
//! - Variable-width scalars: [`Object::BigInt`], [`Object::Str`],
//!   [`Object::Bytes`]
//! - Containers: [`Object::List`] (growable), [`Object::Tuple`] (fixed),
//!   [`Object::Map`], [`Object::Set`]
//! - Definitions and namespaces: [`Object::Module`], [`Object::Class`],
//!   [`Object::Function`], [`Object::Code`]
//! - Execution state and miscellany: [`Object::Frame`],
//!   [`Object::Generator`], [`Object::Iterator`], [`Object::Exception`],
//!   [`Object::Instance`], [`Object::Weak`]
//!
//! Container elements and attribute values are [`ObjRef`] handles into the
//! owning heap, so an object graph may be shared or cyclic.  Attribute and
//! global *names* are plain strings, not objects.

use crate::runtime::heap::ObjRef;

/// Body of a class-definition object.
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    /// Module the class is declared in; classes declared in denylisted
    /// runtime-machinery modules are ignored by default.
    pub module: String,
    /// Direct base classes, most-derived first.
    pub bases: Vec<ObjRef>,
    /// Class-level attributes (methods, defaults, docstring).
    pub attrs: Vec<(String, ObjRef)>,
    /// Declared slot names, if the class restricts its instances.
    pub slots: Option<Vec<String>>,
    /// Set when this definition stands for one of the built-in kinds, which
    /// lets user classes inherit container or exception behavior.
    pub builtin: Option<BuiltinKind>,
}

/// Body of a compiled-code object.
#[derive(Debug, Clone)]
pub struct CodeDef {
    pub name: String,
    pub stack_slots: u32,
    pub local_slots: u32,
    pub free_slots: u32,
    pub cell_slots: u32,
    /// Constant table; the code object's only data referents.
    pub consts: Vec<ObjRef>,
}

/// Runtime objects stored in the heap.
#[derive(Debug, Clone)]
pub enum Object {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Multi-precision integer; `digits` is the allocated digit count.
    BigInt { digits: usize },
    Str(String),
    Bytes(Vec<u8>),
    /// Growable sequence; flat size uses an over-allocation estimate.
    List(Vec<ObjRef>),
    /// Fixed-size sequence; flat size uses the exact length.
    Tuple(Vec<ObjRef>),
    /// Mapping as insertion-ordered key/value pairs.
    Map(Vec<(ObjRef, ObjRef)>),
    Set(Vec<ObjRef>),
    Module {
        name: String,
        globals: Vec<(String, ObjRef)>,
    },
    Class(ClassDef),
    Function {
        name: String,
        module: String,
        code: Option<ObjRef>,
        defaults: Vec<ObjRef>,
    },
    Code(CodeDef),
    Frame {
        code: ObjRef,
        locals: Vec<(String, ObjRef)>,
    },
    /// Suspended generator; sized as code only, its products never visited.
    Generator { frame: ObjRef },
    Iterator { source: ObjRef },
    Exception {
        message: Option<ObjRef>,
        args: Vec<ObjRef>,
        /// Source attribution: file name and line.
        location: Option<(String, u32)>,
    },
    Instance {
        class: ObjRef,
        attrs: Vec<(String, ObjRef)>,
    },
    /// Non-owning reference; its target contributes only while live.
    Weak { target: ObjRef },
}

/// The built-in kinds the registry seeds descriptors for, plus the kinds the
/// classifier discovers at runtime (modules, frames, code, functions,
/// generators).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinKind {
    NoneType,
    Bool,
    Int,
    BigInt,
    Float,
    Str,
    Bytes,
    List,
    Tuple,
    Map,
    Set,
    Module,
    Function,
    Code,
    Frame,
    Generator,
    Iterator,
    Exception,
    Weak,
    /// The universal base type.
    Object,
    /// The metatype.
    Type,
}

impl BuiltinKind {
    /// Short display name, used in reports and the TUI.
    pub fn name(self) -> &'static str {
        match self {
            BuiltinKind::NoneType => "none",
            BuiltinKind::Bool => "bool",
            BuiltinKind::Int => "int",
            BuiltinKind::BigInt => "bigint",
            BuiltinKind::Float => "float",
            BuiltinKind::Str => "str",
            BuiltinKind::Bytes => "bytes",
            BuiltinKind::List => "list",
            BuiltinKind::Tuple => "tuple",
            BuiltinKind::Map => "map",
            BuiltinKind::Set => "set",
            BuiltinKind::Module => "module",
            BuiltinKind::Function => "function",
            BuiltinKind::Code => "code",
            BuiltinKind::Frame => "frame",
            BuiltinKind::Generator => "generator",
            BuiltinKind::Iterator => "iterator",
            BuiltinKind::Exception => "exception",
            BuiltinKind::Weak => "weakref",
            BuiltinKind::Object => "object",
            BuiltinKind::Type => "type",
        }
    }
}

impl Object {
    /// The built-in kind of this payload.  Instances report their kind as
    /// their class; callers wanting the type identity should use
    /// `TypeKey::of` instead.
    pub fn kind(&self) -> BuiltinKind {
        match self {
            Object::None => BuiltinKind::NoneType,
            Object::Bool(_) => BuiltinKind::Bool,
            Object::Int(_) => BuiltinKind::Int,
            Object::Float(_) => BuiltinKind::Float,
            Object::BigInt { .. } => BuiltinKind::BigInt,
            Object::Str(_) => BuiltinKind::Str,
            Object::Bytes(_) => BuiltinKind::Bytes,
            Object::List(_) => BuiltinKind::List,
            Object::Tuple(_) => BuiltinKind::Tuple,
            Object::Map(_) => BuiltinKind::Map,
            Object::Set(_) => BuiltinKind::Set,
            Object::Module { .. } => BuiltinKind::Module,
            Object::Class(_) => BuiltinKind::Type,
            Object::Function { .. } => BuiltinKind::Function,
            Object::Code(_) => BuiltinKind::Code,
            Object::Frame { .. } => BuiltinKind::Frame,
            Object::Generator { .. } => BuiltinKind::Generator,
            Object::Iterator { .. } => BuiltinKind::Iterator,
            Object::Exception { .. } => BuiltinKind::Exception,
            Object::Instance { .. } => BuiltinKind::Object,
            Object::Weak { .. } => BuiltinKind::Weak,
        }
    }

    /// Whether this payload is a namespace object (never expanded below the
    /// root during traversal).
    pub fn is_module(&self) -> bool {
        matches!(self, Object::Module { .. })
    }

    /// Element or entry count, where the payload has one.
    pub fn len(&self) -> Option<usize> {
        match self {
            Object::Str(s) => Some(s.chars().count()),
            Object::Bytes(b) => Some(b.len()),
            Object::List(v) | Object::Tuple(v) | Object::Set(v) => Some(v.len()),
            Object::Map(pairs) => Some(pairs.len()),
            Object::Module { globals, .. } => Some(globals.len()),
            Object::BigInt { digits } => Some(*digits),
            _ => None,
        }
    }
}
