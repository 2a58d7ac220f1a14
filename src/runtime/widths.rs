//! Primitive width table
//!
//! Byte widths of the host platform's primitive kinds, queried once when the
//! type registry is seeded.  The composite accessors derive the header and
//! per-entry sizes the seed table needs (object headers, hash-table entries,
//! module/frame/code overheads) so that every seeded `baseSize`/`itemSize`
//! traces back to this one table.
//!
//! The values returned by [`PrimitiveWidths::host`] describe a conventional
//! 64-bit platform.  A host with different primitive widths should construct
//! the table explicitly instead.

/// Byte widths of primitive kinds on the current platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveWidths {
    /// sizeof(unsigned char)
    pub byte: usize,
    /// sizeof(long)
    pub long: usize,
    /// sizeof(void*)
    pub pointer: usize,
    /// sizeof(double)
    pub double: usize,
    /// sizeof(ssize_t)
    pub ssize: usize,
    /// sizeof(digit) for multi-precision integers
    pub digit: usize,
    /// extra per-object bookkeeping for reference-count debugging builds
    /// (0 on ordinary builds)
    pub refcount: usize,
}

impl PrimitiveWidths {
    /// Width table for a conventional 64-bit host.
    pub fn host() -> Self {
        PrimitiveWidths {
            byte: 1,
            long: 8,
            pointer: 8,
            double: 8,
            ssize: 8,
            digit: 4,
            refcount: 0,
        }
    }

    /// Header carried by every object: refcount word plus type pointer.
    pub fn object_header(&self) -> usize {
        self.ssize + self.pointer + self.refcount
    }

    /// Header of a variable-length object: object header plus length word.
    pub fn var_header(&self) -> usize {
        self.object_header() + self.ssize
    }

    /// Cyclic-collector header, aligned to twice a double.
    pub fn gc_header(&self) -> usize {
        let raw = 2 * self.pointer + self.ssize;
        let mask = 2 * self.double - 1;
        (raw + mask) & !mask
    }

    /// One hash-map entry: cached hash plus key and value pointers.
    pub fn map_entry(&self) -> usize {
        self.ssize + 2 * self.pointer
    }

    /// One hash-set entry: cached hash plus element pointer.
    pub fn set_entry(&self) -> usize {
        self.long + self.pointer
    }

    /// Fixed overhead a module object adds on top of its globals table.
    pub fn module_extra(&self) -> usize {
        2 * self.pointer + self.ssize
    }

    /// Base size of an execution frame, before its variable slots.
    pub fn frame_base(&self) -> usize {
        let raw = 14 * self.pointer + 2 * self.ssize + 63 * 4;
        align_up(raw, self.pointer)
    }

    /// Base size of a compiled-code object, before its slot table.
    pub fn code_base(&self) -> usize {
        let raw = 11 * self.pointer + self.ssize + 5 * 4;
        align_up(raw, self.pointer)
    }

    /// Base size of a type-definition object.
    pub fn class_base(&self) -> usize {
        self.object_header() + 6 * self.pointer + 4 * self.ssize
    }

    /// Base size of a function-definition object.
    pub fn function_base(&self) -> usize {
        self.object_header() + 6 * self.pointer
    }

    /// Base size of a plain instance: header, attribute-table pointer and
    /// weak-list pointer, plus the collector header.
    pub fn instance_base(&self) -> usize {
        self.object_header() + 2 * self.pointer + self.gc_header()
    }
}

/// Round `n` up to the next multiple of `to` (a power of two).
pub fn align_up(n: usize, to: usize) -> usize {
    if to > 1 {
        let mask = to - 1;
        (n + mask) & !mask
    } else {
        n
    }
}
