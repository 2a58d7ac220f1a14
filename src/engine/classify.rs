//! Runtime type classification
//!
//! [`classify`] builds a descriptor for a type the registry has not seen
//! yet.  It is a fixed priority chain — first match wins:
//!
//! 1. namespace objects (modules)
//! 2. execution frames
//! 3. compiled code
//! 4. callables and definitions (functions, classes, generators)
//! 5. subtypes of a known container
//! 6. duck-typed mapping inference (opt-in)
//! 7. exception subtypes
//! 8. types declared in a denylisted module
//! 9. generic instance, with optional single-ancestor derivation
//!
//! Classification never fails: a structurally unexpected object falls
//! through to the generic-instance rule.  [`descriptor_of`] is the
//! lookup-or-classify-and-store entry point the sizer drives.

use crate::engine::descriptor::{Category, ReferentRule, TypeDescriptor, TypeKey};
use crate::engine::errors::SizeError;
use crate::engine::lengths::LengthRule;
use crate::engine::registry::{is_denylisted, Registry};
use crate::runtime::heap::{ObjRef, ObjectHeap};
use crate::runtime::object::{BuiltinKind, Object};

/// Resolve the descriptor for an object, classifying and registering its
/// type on a registry miss.
pub fn descriptor_of(
    heap: &ObjectHeap,
    registry: &mut Registry,
    r: ObjRef,
    derive: bool,
    infer: bool,
) -> Result<TypeDescriptor, SizeError> {
    let key = TypeKey::of(heap, r);
    if let Some(desc) = registry.lookup(key) {
        return Ok(*desc);
    }
    let desc = classify(heap, registry, r, derive, infer);
    registry.store(key, desc)?;
    Ok(desc)
}

/// Classify one object whose type key is not yet registered.
pub fn classify(
    heap: &ObjectHeap,
    registry: &Registry,
    r: ObjRef,
    derive: bool,
    infer: bool,
) -> TypeDescriptor {
    let w = *registry.widths();
    let obj = match heap.get(r) {
        Some(obj) => obj,
        // A dead root still needs a descriptor; it sizes as a bare instance.
        None => return TypeDescriptor::leaf(w.instance_base(), Category::Dynamic),
    };

    match obj {
        // Rule 1: a namespace is a mapping plus fixed module overhead.
        Object::Module { .. } => TypeDescriptor {
            base_size: w.object_header() + w.module_extra(),
            item_size: w.map_entry(),
            length: Some(LengthRule::MapAlloc),
            referents: Some(ReferentRule::ModuleGlobals),
            both: true,
            category: Category::Dynamic,
        },

        // Rule 2: frames carry their code object's slot count as items.
        Object::Frame { .. } => TypeDescriptor {
            base_size: w.frame_base(),
            item_size: w.pointer,
            length: Some(LengthRule::FrameSlots),
            referents: Some(ReferentRule::FrameLocals),
            both: true,
            category: Category::Dynamic,
        },

        // Rule 3: compiled code is code-only.
        Object::Code(_) => TypeDescriptor {
            base_size: w.code_base(),
            item_size: w.pointer,
            length: Some(LengthRule::CodeSlots),
            referents: Some(ReferentRule::CodeConsts),
            both: false,
            category: Category::Dynamic,
        },

        // Rule 4: callables and definitions are code-only.  A definition
        // declared in a runtime-machinery module is ignored outright.
        Object::Function { module, .. } => TypeDescriptor {
            base_size: w.function_base(),
            item_size: 0,
            length: None,
            referents: Some(ReferentRule::FunctionAttrs),
            both: false,
            category: if is_denylisted(module) {
                Category::Ignored
            } else {
                Category::Dynamic
            },
        },
        Object::Class(def) => TypeDescriptor {
            base_size: w.class_base(),
            item_size: 0,
            length: None,
            referents: Some(ReferentRule::ClassAttrs),
            both: false,
            category: if is_denylisted(&def.module) {
                Category::Ignored
            } else {
                Category::Dynamic
            },
        },
        // Generators are code-only; the values they would produce are never
        // visited, only the suspended frame is referenced.
        Object::Generator { .. } => TypeDescriptor {
            base_size: w.frame_base(),
            item_size: 0,
            length: None,
            referents: Some(ReferentRule::GeneratorFrame),
            both: false,
            category: Category::Dynamic,
        },

        Object::Instance { class, .. } => classify_instance(heap, registry, *class, derive, infer),

        // Builtin kinds missing a seed (there are none today, but the chain
        // must never fail) size as a bare object.
        _ => TypeDescriptor::leaf(w.object_header(), Category::Dynamic),
    }
}

/// Rules 5-9, for instances of a user-defined class.
fn classify_instance(
    heap: &ObjectHeap,
    registry: &Registry,
    class: ObjRef,
    derive: bool,
    infer: bool,
) -> TypeDescriptor {
    let w = *registry.widths();

    let builtin = heap.builtin_ancestor(class);

    // Rule 5: subtype of a known container derives the container's sizes.
    // The instance's own attributes are still its referents; the container
    // behavior lives in the definition, not in the instance payload.
    if let Some(kind) = builtin {
        let container = matches!(
            kind,
            BuiltinKind::List | BuiltinKind::Tuple | BuiltinKind::Map | BuiltinKind::Set
        );
        if container {
            if let Some(base) = registry.lookup(TypeKey::Builtin(kind)) {
                return TypeDescriptor {
                    referents: Some(ReferentRule::InstanceAttrs),
                    ..TypeDescriptor::derived_from(base, Category::Derived)
                };
            }
        }
    }

    // Rule 6: duck-typed mapping inference, opt-in.  Checked ahead of the
    // exception rule, so a mapping-like exception subtype infers as a
    // mapping.
    if infer && looks_like_mapping(heap, class) {
        if let Some(base) = registry.lookup(TypeKey::Builtin(BuiltinKind::Map)) {
            return TypeDescriptor {
                referents: Some(ReferentRule::InstanceAttrs),
                ..TypeDescriptor::derived_from(base, Category::Inferred)
            };
        }
    }

    // Rule 7: exception subtypes keep the exception field referents.
    if builtin == Some(BuiltinKind::Exception) {
        if let Some(base) = registry.lookup(TypeKey::Builtin(BuiltinKind::Exception)) {
            return TypeDescriptor {
                referents: Some(ReferentRule::ExceptionFields),
                ..TypeDescriptor::derived_from(base, Category::Dynamic)
            };
        }
    }

    // Rule 8: declared in a denylisted module and not otherwise matched.
    if let Some(Object::Class(def)) = heap.get(class) {
        if is_denylisted(&def.module) {
            return TypeDescriptor::leaf(w.instance_base(), Category::Ignored);
        }
    }

    // Rule 9: generic instance.  With derivation requested and exactly one
    // strict ancestor already registered, copy that ancestor's descriptor;
    // an ambiguous set of known ancestors is never guessed at.
    if derive {
        let known: Vec<TypeDescriptor> = heap
            .ancestry(class)
            .into_iter()
            .filter_map(|a| registry.lookup(TypeKey::Class(a)).copied())
            .collect();
        if let [only] = known.as_slice() {
            return TypeDescriptor::derived_from(only, Category::Derived);
        }
    }

    let slot_extra = match heap.get(class) {
        Some(Object::Class(def)) => def
            .slots
            .as_ref()
            .map(|s| s.len() * w.pointer)
            .unwrap_or(0),
        _ => 0,
    };
    TypeDescriptor {
        base_size: w.instance_base() + slot_extra,
        item_size: 0,
        length: None,
        referents: Some(ReferentRule::InstanceAttrs),
        both: true,
        category: Category::Dynamic,
    }
}

/// Whether a class exposes the conventional mapping operations by name,
/// anywhere on its inheritance chain.
fn looks_like_mapping(heap: &ObjectHeap, class: ObjRef) -> bool {
    let attrs = heap.class_attrs(class);
    let has = |name: &str| attrs.iter().any(|(n, _)| n == name);
    has("keys") && has("items") && (has("get") || has("contains"))
}
