//! Type descriptors
//!
//! One [`TypeDescriptor`] per [`TypeKey`] records how instances of a type
//! are sized: base size, per-item size, the length rule, the referent rule
//! and the classification category.  Descriptors are immutable once stored
//! in the registry.
//!
//! Referent enumeration is a closed table of [`ReferentRule`] variants, one
//! per structural shape, rather than arbitrary callbacks; the classifier
//! picks the rule, and the sizer drives it.

use crate::engine::lengths::LengthRule;
use crate::runtime::heap::{ObjRef, ObjectHeap};
use crate::runtime::object::{BuiltinKind, Object};

/// Identity of a *type* (not an instance) for registry lookup.
///
/// Distinguishes built-in kinds, instances of a user-defined class, and the
/// class-definition object itself (a definition is code, not data, and is
/// sized under its own key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Builtin(BuiltinKind),
    /// Instances of the class-definition object at this address.
    Class(ObjRef),
    /// The class-definition object itself.
    ClassDef(ObjRef),
}

impl TypeKey {
    /// The type key for any live object.
    pub fn of(heap: &ObjectHeap, r: ObjRef) -> TypeKey {
        match heap.get(r) {
            Some(Object::Class(_)) => TypeKey::ClassDef(r),
            Some(Object::Instance { class, .. }) => TypeKey::Class(*class),
            Some(obj) => TypeKey::Builtin(obj.kind()),
            None => TypeKey::Builtin(BuiltinKind::Object),
        }
    }

    /// Display label for reports.
    pub fn label(&self, heap: &ObjectHeap) -> String {
        match self {
            TypeKey::Builtin(kind) => kind.name().to_string(),
            TypeKey::Class(c) => match heap.get(*c) {
                Some(Object::Class(def)) => format!("{}.{}", def.module, def.name),
                _ => format!("<dead class {}>", c),
            },
            TypeKey::ClassDef(c) => match heap.get(*c) {
                Some(Object::Class(def)) => format!("<class {}.{} def>", def.module, def.name),
                _ => format!("<dead class {} def>", c),
            },
        }
    }
}

/// How a descriptor came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Seeded at registry construction.
    Static,
    /// Discovered at runtime by the classifier.
    Dynamic,
    /// Copied from a related (ancestor or canonical) type's descriptor.
    Derived,
    /// Excluded from totals by policy.
    Ignored,
    /// Matched by duck-typed structural inspection.
    Inferred,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Static => "static",
            Category::Dynamic => "dynamic",
            Category::Derived => "derived",
            Category::Ignored => "ignored",
            Category::Inferred => "inferred",
        }
    }
}

/// A (optionally named) one-hop reference from an object.
///
/// Labels are synthesized only in named mode, for detailed reports; the
/// summation path skips them.
#[derive(Debug, Clone)]
pub struct Referent {
    pub label: Option<String>,
    pub target: ObjRef,
}

impl Referent {
    fn plain(target: ObjRef) -> Self {
        Referent {
            label: None,
            target,
        }
    }

    fn named(label: String, target: ObjRef) -> Self {
        Referent {
            label: Some(label),
            target,
        }
    }
}

/// Label clip width for synthesized map-pair labels.
const LABEL_CLIP: usize = 32;

/// How to enumerate an object's referents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentRule {
    /// Elements of a sequence or set.
    SequenceItems,
    /// Keys and values of a mapping, interleaved.
    MapPairs,
    /// Values of a module's globals table.
    ModuleGlobals,
    /// Defining attributes of a class: bases, class attributes.
    ClassAttrs,
    /// Defining attributes of a function: code object and defaults.
    FunctionAttrs,
    /// A code object's constant table.
    CodeConsts,
    /// Frame locals plus the frame's code object.
    FrameLocals,
    /// Instance attribute values plus the instance's class.
    InstanceAttrs,
    /// Conventional exception fields: message and arguments.
    ExceptionFields,
    /// The suspended frame of a generator.
    GeneratorFrame,
    /// The weakly referenced target, while it is live.
    WeakTarget,
    /// The underlying object an iterator draws from.
    IteratorSource,
}

impl ReferentRule {
    /// Enumerate referents.  With `named` set, each referent carries a
    /// synthetic label identifying the relationship.
    pub fn collect(self, heap: &ObjectHeap, r: ObjRef, named: bool) -> Vec<Referent> {
        let obj = match heap.get(r) {
            Some(obj) => obj,
            None => return Vec::new(),
        };
        let mut out = Vec::new();
        match (self, obj) {
            (ReferentRule::SequenceItems, Object::List(items))
            | (ReferentRule::SequenceItems, Object::Tuple(items))
            | (ReferentRule::SequenceItems, Object::Set(items)) => {
                for (i, &item) in items.iter().enumerate() {
                    if named {
                        out.push(Referent::named(format!("[{}]", i), item));
                    } else {
                        out.push(Referent::plain(item));
                    }
                }
            }
            (ReferentRule::MapPairs, Object::Map(pairs)) => {
                for &(key, value) in pairs {
                    if named {
                        let k = heap.describe(key, LABEL_CLIP);
                        out.push(Referent::named(format!("[K] {}", k), key));
                        out.push(Referent::named(format!("[V] {}", k), value));
                    } else {
                        out.push(Referent::plain(key));
                        out.push(Referent::plain(value));
                    }
                }
            }
            (ReferentRule::ModuleGlobals, Object::Module { globals, .. }) => {
                for (name, value) in globals {
                    if named {
                        out.push(Referent::named(name.clone(), *value));
                    } else {
                        out.push(Referent::plain(*value));
                    }
                }
            }
            (ReferentRule::ClassAttrs, Object::Class(def)) => {
                for &base in &def.bases {
                    if named {
                        out.push(Referent::named("base".to_string(), base));
                    } else {
                        out.push(Referent::plain(base));
                    }
                }
                for (name, value) in &def.attrs {
                    if named {
                        out.push(Referent::named(name.clone(), *value));
                    } else {
                        out.push(Referent::plain(*value));
                    }
                }
            }
            (ReferentRule::FunctionAttrs, Object::Function { code, defaults, .. }) => {
                if let Some(code) = code {
                    if named {
                        out.push(Referent::named("code".to_string(), *code));
                    } else {
                        out.push(Referent::plain(*code));
                    }
                }
                for &d in defaults {
                    if named {
                        out.push(Referent::named("default".to_string(), d));
                    } else {
                        out.push(Referent::plain(d));
                    }
                }
            }
            (ReferentRule::CodeConsts, Object::Code(code)) => {
                for &c in &code.consts {
                    if named {
                        out.push(Referent::named("const".to_string(), c));
                    } else {
                        out.push(Referent::plain(c));
                    }
                }
            }
            (ReferentRule::FrameLocals, Object::Frame { code, locals }) => {
                for (name, value) in locals {
                    if named {
                        out.push(Referent::named(format!("local {}", name), *value));
                    } else {
                        out.push(Referent::plain(*value));
                    }
                }
                if named {
                    out.push(Referent::named("code".to_string(), *code));
                } else {
                    out.push(Referent::plain(*code));
                }
            }
            (ReferentRule::InstanceAttrs, Object::Instance { class, attrs }) => {
                for (name, value) in attrs {
                    if named {
                        out.push(Referent::named(name.clone(), *value));
                    } else {
                        out.push(Referent::plain(*value));
                    }
                }
                if named {
                    out.push(Referent::named("class".to_string(), *class));
                } else {
                    out.push(Referent::plain(*class));
                }
            }
            (
                ReferentRule::ExceptionFields,
                Object::Exception { message, args, .. },
            ) => {
                if let Some(message) = message {
                    if named {
                        out.push(Referent::named("message".to_string(), *message));
                    } else {
                        out.push(Referent::plain(*message));
                    }
                }
                for &a in args {
                    if named {
                        out.push(Referent::named("arg".to_string(), a));
                    } else {
                        out.push(Referent::plain(a));
                    }
                }
            }
            // Exception fields on a user subclass modeled as an instance.
            (ReferentRule::ExceptionFields, Object::Instance { attrs, .. }) => {
                for (name, value) in attrs {
                    if matches!(name.as_str(), "message" | "args" | "location") {
                        if named {
                            out.push(Referent::named(name.clone(), *value));
                        } else {
                            out.push(Referent::plain(*value));
                        }
                    }
                }
            }
            (ReferentRule::GeneratorFrame, Object::Generator { frame }) => {
                if named {
                    out.push(Referent::named("frame".to_string(), *frame));
                } else {
                    out.push(Referent::plain(*frame));
                }
            }
            (ReferentRule::WeakTarget, Object::Weak { target }) => {
                if heap.is_live(*target) {
                    if named {
                        out.push(Referent::named("target".to_string(), *target));
                    } else {
                        out.push(Referent::plain(*target));
                    }
                }
            }
            (ReferentRule::IteratorSource, Object::Iterator { source }) => {
                if named {
                    out.push(Referent::named("source".to_string(), *source));
                } else {
                    out.push(Referent::plain(*source));
                }
            }
            // Structurally unexpected payload for this rule: no referents.
            _ => {}
        }
        out
    }
}

/// Registered size/behavior metadata for one runtime type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeDescriptor {
    /// Bytes consumed by an empty instance, including bookkeeping overhead.
    pub base_size: usize,
    /// Bytes per variable-length item; 0 for fixed-size types.
    pub item_size: usize,
    /// Item-count rule, absent for fixed-size types.
    pub length: Option<LengthRule>,
    /// Referent enumeration rule, absent for leaf types.
    pub referents: Option<ReferentRule>,
    /// True when the descriptor accounts for ordinary data; false for
    /// code-only types (definitions, compiled code), which contribute to
    /// totals only when code inclusion is requested.
    pub both: bool,
    pub category: Category,
}

impl TypeDescriptor {
    /// A data descriptor with no items and no referents.
    pub fn leaf(base_size: usize, category: Category) -> Self {
        TypeDescriptor {
            base_size,
            item_size: 0,
            length: None,
            referents: None,
            both: true,
            category,
        }
    }

    /// Flat size of one object under this descriptor: base plus measured
    /// items, overridden by the heap's size oracle when one is installed,
    /// then aligned up with `mask`.
    pub fn flat(&self, heap: &ObjectHeap, r: ObjRef, mask: usize) -> usize {
        let mut size = self.base_size;
        if self.item_size > 0 {
            if let (Some(rule), Some(obj)) = (self.length, heap.get(r)) {
                size += rule.measure(heap, obj) * self.item_size;
            }
        }
        size = heap.precise_size(r, size);
        if mask > 0 {
            size = (size + mask) & !mask;
        }
        size
    }

    /// Copy another descriptor, reclassified.
    pub fn derived_from(other: &TypeDescriptor, category: Category) -> Self {
        TypeDescriptor {
            category,
            ..*other
        }
    }
}
