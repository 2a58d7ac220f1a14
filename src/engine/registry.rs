//! Type descriptor registry
//!
//! A [`Registry`] maps [`TypeKey`]s to descriptors.  It is seeded at
//! construction with static descriptors for the built-in kinds — every base
//! and item size derived from the primitive width table — plus ignored
//! entries for the universal base type and the metatype.  After seeding it
//! grows monotonically: the sizer stores one descriptor per newly classified
//! type, and registration never overwrites (`store` on an existing key is an
//! error).
//!
//! The registry is read-mostly after warm-up and carries no synchronization;
//! a registry (and the sizer owning it) must not be shared across threads.

use rustc_hash::FxHashMap;

use crate::engine::descriptor::{Category, ReferentRule, TypeDescriptor, TypeKey};
use crate::engine::errors::SizeError;
use crate::engine::lengths::LengthRule;
use crate::runtime::heap::Builtins;
use crate::runtime::object::BuiltinKind;
use crate::runtime::widths::PrimitiveWidths;

/// Modules considered part of the runtime's own machinery.  Types declared
/// in these modules are ignored by default; instances of user types are
/// still sized.
pub const DENYLISTED_MODULES: &[&str] = &["builtins", "sys", "gc", "weakref", "marshal"];

/// Whether a module name is on the runtime-machinery denylist.
pub fn is_denylisted(module: &str) -> bool {
    DENYLISTED_MODULES.contains(&module)
}

/// The type-descriptor registry.
#[derive(Debug, Clone)]
pub struct Registry {
    defs: FxHashMap<TypeKey, TypeDescriptor>,
    widths: PrimitiveWidths,
}

impl Registry {
    /// Build a registry seeded from the given width table.  `builtins`
    /// supplies the addresses of the pre-created definition objects so the
    /// base type and metatype can be seeded as ignored.
    pub fn seeded(widths: PrimitiveWidths, builtins: &Builtins) -> Self {
        let mut reg = Registry {
            defs: FxHashMap::default(),
            widths,
        };
        reg.seed_scalars();
        reg.seed_containers();
        reg.seed_infrastructure(builtins);
        reg
    }

    /// The width table this registry was seeded from.
    pub fn widths(&self) -> &PrimitiveWidths {
        &self.widths
    }

    /// Look up the descriptor for a type key.
    pub fn lookup(&self, key: TypeKey) -> Option<&TypeDescriptor> {
        self.defs.get(&key)
    }

    /// Register a descriptor.  Registration is idempotent per key: storing
    /// over an existing descriptor is refused.
    pub fn store(&mut self, key: TypeKey, desc: TypeDescriptor) -> Result<(), SizeError> {
        if self.defs.contains_key(&key) {
            return Err(SizeError::DescriptorExists {
                key: format!("{:?}", key),
            });
        }
        self.defs.insert(key, desc);
        Ok(())
    }

    /// All registered descriptors, unordered.
    pub fn iter(&self) -> impl Iterator<Item = (&TypeKey, &TypeDescriptor)> {
        self.defs.iter()
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    fn seed(&mut self, kind: BuiltinKind, desc: TypeDescriptor) {
        self.defs.insert(TypeKey::Builtin(kind), desc);
    }

    fn seed_scalars(&mut self) {
        let w = self.widths;
        let header = w.object_header();
        self.seed(BuiltinKind::NoneType, TypeDescriptor::leaf(header, Category::Static));
        self.seed(
            BuiltinKind::Bool,
            TypeDescriptor::leaf(header + w.long, Category::Static),
        );
        self.seed(
            BuiltinKind::Int,
            TypeDescriptor::leaf(header + w.long, Category::Static),
        );
        self.seed(
            BuiltinKind::Float,
            TypeDescriptor::leaf(header + w.double, Category::Static),
        );
        self.seed(
            BuiltinKind::BigInt,
            TypeDescriptor {
                base_size: w.var_header(),
                item_size: w.digit,
                length: Some(LengthRule::Digits),
                referents: None,
                both: true,
                category: Category::Static,
            },
        );
        self.seed(
            BuiltinKind::Str,
            TypeDescriptor {
                base_size: w.var_header() + w.long,
                item_size: w.byte,
                length: Some(LengthRule::CharsPlusOne),
                referents: None,
                both: true,
                category: Category::Static,
            },
        );
        self.seed(
            BuiltinKind::Bytes,
            TypeDescriptor {
                base_size: w.var_header() + w.long,
                item_size: w.byte,
                length: Some(LengthRule::Exact),
                referents: None,
                both: true,
                category: Category::Static,
            },
        );
    }

    fn seed_containers(&mut self) {
        let w = self.widths;
        let header = w.object_header();
        let gc = w.gc_header();
        self.seed(
            BuiltinKind::List,
            TypeDescriptor {
                base_size: w.var_header() + w.pointer + w.ssize + gc,
                item_size: w.pointer,
                length: Some(LengthRule::ListAlloc),
                referents: Some(ReferentRule::SequenceItems),
                both: true,
                category: Category::Static,
            },
        );
        self.seed(
            BuiltinKind::Tuple,
            TypeDescriptor {
                base_size: w.var_header() + gc,
                item_size: w.pointer,
                length: Some(LengthRule::Exact),
                referents: Some(ReferentRule::SequenceItems),
                both: true,
                category: Category::Static,
            },
        );
        // the 8-entry embedded table is part of the base; MapAlloc measures
        // 0 until the map outgrows it
        self.seed(
            BuiltinKind::Map,
            TypeDescriptor {
                base_size: header + 3 * w.ssize + 8 * w.map_entry() + gc,
                item_size: w.map_entry(),
                length: Some(LengthRule::MapAlloc),
                referents: Some(ReferentRule::MapPairs),
                both: true,
                category: Category::Static,
            },
        );
        self.seed(
            BuiltinKind::Set,
            TypeDescriptor {
                base_size: header + 3 * w.ssize + gc,
                item_size: w.set_entry(),
                length: Some(LengthRule::SetAlloc),
                referents: Some(ReferentRule::SequenceItems),
                both: true,
                category: Category::Static,
            },
        );
        self.seed(
            BuiltinKind::Exception,
            TypeDescriptor {
                base_size: header + 3 * w.pointer + gc,
                item_size: 0,
                length: None,
                referents: Some(ReferentRule::ExceptionFields),
                both: true,
                category: Category::Static,
            },
        );
        self.seed(
            BuiltinKind::Weak,
            TypeDescriptor {
                base_size: header + 3 * w.pointer,
                item_size: 0,
                length: None,
                referents: Some(ReferentRule::WeakTarget),
                both: true,
                category: Category::Static,
            },
        );
        self.seed(
            BuiltinKind::Iterator,
            TypeDescriptor {
                base_size: header + w.pointer,
                item_size: 0,
                length: None,
                referents: Some(ReferentRule::IteratorSource),
                both: true,
                category: Category::Static,
            },
        );
    }

    /// Infrastructure types excluded from totals by default: the universal
    /// base type, the metatype, and their definition objects.
    fn seed_infrastructure(&mut self, builtins: &Builtins) {
        let w = self.widths;
        let ignored_def = TypeDescriptor {
            base_size: w.class_base(),
            item_size: 0,
            length: None,
            referents: Some(ReferentRule::ClassAttrs),
            both: false,
            category: Category::Ignored,
        };
        self.seed(
            BuiltinKind::Object,
            TypeDescriptor {
                both: false,
                category: Category::Ignored,
                ..TypeDescriptor::leaf(w.object_header(), Category::Ignored)
            },
        );
        self.seed(BuiltinKind::Type, ignored_def);
        self.defs.insert(TypeKey::ClassDef(builtins.object), ignored_def);
        self.defs.insert(TypeKey::ClassDef(builtins.type_of), ignored_def);
    }
}
