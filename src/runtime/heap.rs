//! Object heap
//!
//! The [`ObjectHeap`] owns every live object and hands out stable [`ObjRef`]
//! addresses.  Addresses are assigned monotonically and never reused, so an
//! `ObjRef` identifies one object for the life of the heap even after the
//! object is released (a released address simply stops resolving, which is
//! how weak handles observe death).
//!
//! The heap also hosts two collaborator interfaces consumed by the sizing
//! engine:
//!
//! - built-in type-definition objects ([`Builtins`]) so user classes can
//!   inherit container or exception behavior, and
//! - an optional authoritative size oracle whose result supersedes the
//!   engine's computed flat size for an object.

use rustc_hash::FxHashMap;

use crate::runtime::object::{BuiltinKind, ClassDef, Object};

/// Starting address for object allocations.
/// Object addresses start high to make them easy to tell apart from small
/// integers in debug output.
pub const OBJECT_ADDRESS_START: u64 = 0x1000_0000;

/// Stable, non-owning handle to one live object.
///
/// Used by the engine as the object-identity key for deduplication and cycle
/// breaking.  Holding an `ObjRef` never keeps its object alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef(u64);

impl ObjRef {
    /// The raw address value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ObjRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Authoritative per-object size oracle supplied by the host.
///
/// Called as `oracle(object, fallback)`; the returned value replaces the
/// engine's computed flat size for that object.
pub type SizeOracle = Box<dyn Fn(&Object, usize) -> usize>;

/// The pre-created built-in type-definition objects.
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    /// The universal base type.
    pub object: ObjRef,
    /// The metatype.
    pub type_of: ObjRef,
    pub list: ObjRef,
    pub tuple: ObjRef,
    pub map: ObjRef,
    pub set: ObjRef,
    pub exception: ObjRef,
}

/// The object store.
pub struct ObjectHeap {
    objects: FxHashMap<ObjRef, Object>,
    next_address: u64,
    builtins: Builtins,
    oracle: Option<SizeOracle>,
}

impl std::fmt::Debug for ObjectHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectHeap")
            .field("objects", &self.objects.len())
            .field("next_address", &self.next_address)
            .field("oracle", &self.oracle.is_some())
            .finish()
    }
}

impl ObjectHeap {
    /// Create an empty heap with the built-in type definitions pre-created.
    pub fn new() -> Self {
        let mut heap = ObjectHeap {
            objects: FxHashMap::default(),
            next_address: OBJECT_ADDRESS_START,
            // placeholder, replaced right below once the defs exist
            builtins: Builtins {
                object: ObjRef(0),
                type_of: ObjRef(0),
                list: ObjRef(0),
                tuple: ObjRef(0),
                map: ObjRef(0),
                set: ObjRef(0),
                exception: ObjRef(0),
            },
            oracle: None,
        };
        let object = heap.builtin_class("object", None, &[]);
        let type_of = heap.builtin_class("type", Some(BuiltinKind::Type), &[object]);
        let list = heap.builtin_class("list", Some(BuiltinKind::List), &[object]);
        let tuple = heap.builtin_class("tuple", Some(BuiltinKind::Tuple), &[object]);
        let map = heap.builtin_class("map", Some(BuiltinKind::Map), &[object]);
        let set = heap.builtin_class("set", Some(BuiltinKind::Set), &[object]);
        let exception = heap.builtin_class("exception", Some(BuiltinKind::Exception), &[object]);
        heap.builtins = Builtins {
            object,
            type_of,
            list,
            tuple,
            map,
            set,
            exception,
        };
        heap
    }

    fn builtin_class(&mut self, name: &str, builtin: Option<BuiltinKind>, bases: &[ObjRef]) -> ObjRef {
        self.alloc(Object::Class(ClassDef {
            name: name.to_string(),
            module: "builtins".to_string(),
            bases: bases.to_vec(),
            attrs: Vec::new(),
            slots: None,
            builtin,
        }))
    }

    /// Store a new object and return its address.
    pub fn alloc(&mut self, obj: Object) -> ObjRef {
        let addr = ObjRef(self.next_address);
        self.next_address += 1;
        self.objects.insert(addr, obj);
        addr
    }

    /// Resolve an address; `None` once the object has been released.
    pub fn get(&self, r: ObjRef) -> Option<&Object> {
        self.objects.get(&r)
    }

    /// Mutable access to a live object, used when wiring up graphs after
    /// allocation (cycles cannot be built in one shot).
    pub fn get_mut(&mut self, r: ObjRef) -> Option<&mut Object> {
        self.objects.get_mut(&r)
    }

    /// Whether the address still resolves to a live object.
    pub fn is_live(&self, r: ObjRef) -> bool {
        self.objects.contains_key(&r)
    }

    /// Drop an object.  Its address is never reused, so weak handles and
    /// profile references observe the death instead of resolving to a
    /// different object.
    pub fn release(&mut self, r: ObjRef) -> Option<Object> {
        self.objects.remove(&r)
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the heap holds no objects beyond the built-in definitions.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The pre-created built-in type definitions.
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Install an authoritative size oracle; its result supersedes the
    /// engine's computed flat size for every object it is consulted for.
    pub fn set_oracle(&mut self, oracle: SizeOracle) {
        self.oracle = Some(oracle);
    }

    /// Authoritative flat size for an object, or `fallback` when no oracle
    /// is installed or the address no longer resolves.
    pub fn precise_size(&self, r: ObjRef, fallback: usize) -> usize {
        match (&self.oracle, self.objects.get(&r)) {
            (Some(oracle), Some(obj)) => oracle(obj, fallback),
            _ => fallback,
        }
    }

    /// All strict ancestors of a class, nearest first, cycle-safe.
    pub fn ancestry(&self, class: ObjRef) -> Vec<ObjRef> {
        let mut out = Vec::new();
        let mut queue = vec![class];
        let mut visited = rustc_hash::FxHashSet::default();
        visited.insert(class);
        while let Some(c) = queue.pop() {
            if let Some(Object::Class(def)) = self.objects.get(&c) {
                for &base in &def.bases {
                    if visited.insert(base) {
                        out.push(base);
                        queue.push(base);
                    }
                }
            }
        }
        out
    }

    /// The built-in kind a class ultimately derives from, if any.
    pub fn builtin_ancestor(&self, class: ObjRef) -> Option<BuiltinKind> {
        if let Some(Object::Class(def)) = self.objects.get(&class) {
            if let Some(kind) = def.builtin {
                return Some(kind);
            }
        }
        for ancestor in self.ancestry(class) {
            if let Some(Object::Class(def)) = self.objects.get(&ancestor) {
                if let Some(kind) = def.builtin {
                    return Some(kind);
                }
            }
        }
        None
    }

    /// Class-level attributes visible on a class, own attributes first and
    /// inherited ones after, without duplicates.
    pub fn class_attrs(&self, class: ObjRef) -> Vec<(String, ObjRef)> {
        let mut out: Vec<(String, ObjRef)> = Vec::new();
        let mut chain = vec![class];
        chain.extend(self.ancestry(class));
        for c in chain {
            if let Some(Object::Class(def)) = self.objects.get(&c) {
                for (name, value) in &def.attrs {
                    if !out.iter().any(|(n, _)| n == name) {
                        out.push((name.clone(), *value));
                    }
                }
            }
        }
        out
    }

    /// Human-readable description of an object, clipped to `clip` characters
    /// (0 disables clipping).  Definition objects carry a `def` suffix to
    /// keep them apart from instances of the type they define.
    pub fn describe(&self, r: ObjRef, clip: usize) -> String {
        let text = match self.objects.get(&r) {
            None => format!("<dead {}>", r),
            Some(Object::None) => "none".to_string(),
            Some(Object::Bool(b)) => b.to_string(),
            Some(Object::Int(n)) => format!("int {}", n),
            Some(Object::Float(x)) => format!("float {}", x),
            Some(Object::BigInt { digits }) => format!("bigint[{} digits]", digits),
            Some(Object::Str(s)) => format!("str {:?}", s),
            Some(Object::Bytes(b)) => format!("bytes[{}]", b.len()),
            Some(Object::List(v)) => format!("list[{}]", v.len()),
            Some(Object::Tuple(v)) => format!("tuple[{}]", v.len()),
            Some(Object::Map(p)) => format!("map{{{}}}", p.len()),
            Some(Object::Set(v)) => format!("set{{{}}}", v.len()),
            Some(Object::Module { name, .. }) => format!("<module {}>", name),
            Some(Object::Class(def)) => format!("<class {}.{} def>", def.module, def.name),
            Some(Object::Function { name, module, .. }) => {
                format!("<function {}.{}>", module, name)
            }
            Some(Object::Code(code)) => format!("<code {}>", code.name),
            Some(Object::Frame { code, .. }) => match self.objects.get(code) {
                Some(Object::Code(c)) => format!("<frame {}>", c.name),
                _ => "<frame>".to_string(),
            },
            Some(Object::Generator { .. }) => "<generator>".to_string(),
            Some(Object::Iterator { .. }) => "<iterator>".to_string(),
            Some(Object::Exception { location, .. }) => match location {
                Some((file, line)) => format!("<exception {}:{}>", file, line),
                None => "<exception>".to_string(),
            },
            Some(Object::Instance { class, .. }) => match self.objects.get(class) {
                Some(Object::Class(def)) => format!("<{}.{}>", def.module, def.name),
                _ => "<instance>".to_string(),
            },
            Some(Object::Weak { target }) => format!("<weakref {}>", target),
        };
        clip_text(text, clip)
    }
}

impl Default for ObjectHeap {
    fn default() -> Self {
        Self::new()
    }
}

/// Clip a string to at most `clip` characters, marking the cut with an
/// ellipsis.  `clip == 0` disables clipping.
pub fn clip_text(text: String, clip: usize) -> String {
    if clip > 3 && text.chars().count() > clip {
        let kept: String = text.chars().take(clip - 3).collect();
        format!("{}...", kept)
    } else {
        text
    }
}
