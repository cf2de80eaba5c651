//! Symbol module - String interning for identifiers and lexemes.
//!
//! A [`Symbol`] is a compact (4-byte) handle to a string in a global,
//! thread-safe table. Interning makes token and name comparison an integer
//! compare and lets the AST own its tokens cheaply.
//!
//! Interned strings are allocated once and leaked to obtain `'static`
//! lifetime. The total is bounded by the source text, so this is acceptable
//! for a process that interprets one script per run.

use std::fmt;
use std::sync::{LazyLock, RwLock};

use ahash::RandomState;
use dashmap::DashMap;
use static_assertions::assert_eq_size;

/// An interned string.
///
/// # Examples
///
/// ```
/// use lyra_util::Symbol;
///
/// let a = Symbol::intern("count");
/// let b = Symbol::intern("count");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "count");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

assert_eq_size!(Symbol, u32);

impl Symbol {
    /// Intern a string, returning its symbol.
    ///
    /// Repeated calls with equal strings return equal symbols.
    pub fn intern(string: &str) -> Self {
        STRING_TABLE.intern(string)
    }

    /// Get the string this symbol stands for.
    pub fn as_str(self) -> &'static str {
        STRING_TABLE.get(self)
    }

    /// Raw table index, for serialization or debugging.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global string table.
///
/// Lookups on the hit path are lock-free through the [`DashMap`]; the
/// reverse index only takes its write lock when a new string is added.
static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(StringTable::new);

struct StringTable {
    /// string -> index, lock-free for the common already-interned case
    map: DashMap<&'static str, u32, RandomState>,
    /// index -> string
    strings: RwLock<Vec<&'static str>>,
}

impl StringTable {
    fn new() -> Self {
        Self {
            map: DashMap::with_capacity_and_hasher(256, RandomState::new()),
            strings: RwLock::new(Vec::with_capacity(256)),
        }
    }

    fn intern(&self, string: &str) -> Symbol {
        if let Some(index) = self.map.get(string) {
            return Symbol(*index);
        }
        let mut strings = self.strings.write().expect("interner poisoned");
        // another thread may have interned it while we waited for the lock
        if let Some(index) = self.map.get(string) {
            return Symbol(*index);
        }
        let leaked: &'static str = Box::leak(string.to_owned().into_boxed_str());
        let index = u32::try_from(strings.len()).expect("interner overflow");
        strings.push(leaked);
        self.map.insert(leaked, index);
        Symbol(index)
    }

    fn get(&self, symbol: Symbol) -> &'static str {
        self.strings.read().expect("interner poisoned")[symbol.0 as usize]
    }
}
