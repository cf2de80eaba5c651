//! Runtime value model.
//!
//! A [`Value`] is a tagged union of typed primitives plus callables. The
//! numeric payload is always stored widened (64-bit slots); the [`TypeTag`]
//! carries the declared precision and signedness, so narrowing only happens
//! on assignment checks and on stringification.
//!
//! Ownership is tracked with the `environment` flag: a value with the flag
//! set is owned by some environment, and evaluators must copy it (via
//! [`Value::duplicate_environment`]) before handing it to code that keeps
//! it. The three control flags mark values produced by `return`, `break`,
//! and `continue` on their way up through the statement executors.

use std::fmt;
use std::rc::Rc;

use lyra_par::FunctionDecl;

use crate::environment::EnvRef;

/// Shape of the payload a value carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Float,
    IntSigned,
    IntUnsigned,
    Bool,
    String,
    Null,
    Callable,
}

/// Declared type of a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeTag {
    Undefined,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    String,
    Float,
    Bool,
    Void,
}

impl TypeTag {
    /// Map a type-identifier lexeme to its tag.
    pub fn from_name(name: &str) -> Option<TypeTag> {
        Some(match name {
            "uint8" => TypeTag::UInt8,
            "uint16" => TypeTag::UInt16,
            "uint32" => TypeTag::UInt32,
            "uint64" => TypeTag::UInt64,
            "int8" => TypeTag::Int8,
            "int16" => TypeTag::Int16,
            "int32" => TypeTag::Int32,
            "int64" => TypeTag::Int64,
            "string" => TypeTag::String,
            "float" => TypeTag::Float,
            "bool" => TypeTag::Bool,
            "void" => TypeTag::Void,
            _ => return None,
        })
    }

    /// Type name as written in source.
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Undefined => "undefined",
            TypeTag::UInt8 => "uint8",
            TypeTag::UInt16 => "uint16",
            TypeTag::UInt32 => "uint32",
            TypeTag::UInt64 => "uint64",
            TypeTag::Int8 => "int8",
            TypeTag::Int16 => "int16",
            TypeTag::Int32 => "int32",
            TypeTag::Int64 => "int64",
            TypeTag::String => "string",
            TypeTag::Float => "float",
            TypeTag::Bool => "bool",
            TypeTag::Void => "void",
        }
    }

    pub fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            TypeTag::UInt8 | TypeTag::UInt16 | TypeTag::UInt32 | TypeTag::UInt64
        )
    }

    pub fn is_signed_int(self) -> bool {
        matches!(
            self,
            TypeTag::Int8 | TypeTag::Int16 | TypeTag::Int32 | TypeTag::Int64
        )
    }

    pub fn is_integer(self) -> bool {
        self.is_unsigned_int() || self.is_signed_int()
    }

    /// Bit width for integer tags, used by the shift bounds check.
    pub fn bit_width(self) -> Option<u32> {
        Some(match self {
            TypeTag::UInt8 | TypeTag::Int8 => 8,
            TypeTag::UInt16 | TypeTag::Int16 => 16,
            TypeTag::UInt32 | TypeTag::Int32 => 32,
            TypeTag::UInt64 | TypeTag::Int64 => 64,
            _ => return None,
        })
    }
}

/// Widened payload storage.
#[derive(Clone, Debug)]
pub enum Payload {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
    Callable(Callable),
}

/// A callable value: the shared declaration plus how to invoke it.
#[derive(Clone)]
pub struct Callable {
    pub decl: Rc<FunctionDecl>,
    pub kind: CallableKind,
}

/// How a callable is dispatched.
#[derive(Clone)]
pub enum CallableKind {
    /// Script function with its captured closure environment
    Script { closure: EnvRef },
    /// Declared with `= load NAME;`, resolved through the binding registry
    /// at call time
    Native,
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // closures link back into the environment graph, so render opaquely
        write!(f, "<fn {}>", self.decl.name.lexeme)
    }
}

/// Numeric view of a payload, selected by the value kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

/// The runtime value.
#[derive(Clone, Debug)]
pub struct Value {
    pub kind: ValueKind,
    pub ty: TypeTag,
    pub payload: Payload,
    /// Owned by an environment; copy before keeping
    pub environment: bool,
    /// Reassignment through the environment is rejected
    pub constant: bool,
    pub is_return: bool,
    pub is_break: bool,
    pub is_continue: bool,
}

impl Value {
    /// Allocate a value with default flags.
    pub fn new(kind: ValueKind, ty: TypeTag, payload: Payload) -> Self {
        Self {
            kind,
            ty,
            payload,
            environment: false,
            constant: false,
            is_return: false,
            is_break: false,
            is_continue: false,
        }
    }

    pub fn null() -> Self {
        Self::new(ValueKind::Null, TypeTag::Undefined, Payload::Null)
    }

    pub fn bool_value(value: bool) -> Self {
        Self::new(ValueKind::Bool, TypeTag::Bool, Payload::Bool(value))
    }

    pub fn uint(ty: TypeTag, value: u64) -> Self {
        Self::new(ValueKind::IntUnsigned, ty, Payload::Unsigned(value))
    }

    pub fn int(ty: TypeTag, value: i64) -> Self {
        Self::new(ValueKind::IntSigned, ty, Payload::Signed(value))
    }

    pub fn float(value: f64) -> Self {
        Self::new(ValueKind::Float, TypeTag::Float, Payload::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ValueKind::String, TypeTag::String, Payload::Str(value.into()))
    }

    pub fn callable(callable: Callable) -> Self {
        Self::new(
            ValueKind::Callable,
            TypeTag::Undefined,
            Payload::Callable(callable),
        )
    }

    /// Copy this value out of its owning environment.
    ///
    /// Environment-owned values come back as independent copies preserving
    /// payload, kind, type, and the constant/control flags; other values
    /// pass through unchanged. Applied wherever a value is handed to code
    /// that will keep it.
    pub fn duplicate_environment(mut self) -> Value {
        self.environment = false;
        self
    }

    /// True when this value carries one of the control flags.
    pub fn is_control(&self) -> bool {
        self.is_return || self.is_break || self.is_continue
    }

    /// The bool interpretation used by `if`, `while`, `&&`, `||`, and `!`:
    /// null is false, bool is itself, everything else is true.
    pub fn truthy(&self) -> bool {
        match (self.kind, &self.payload) {
            (ValueKind::Null, _) => false,
            (ValueKind::Bool, Payload::Bool(b)) => *b,
            _ => true,
        }
    }

    /// Numeric view of the payload, by value kind.
    pub fn as_number(&self) -> Option<Number> {
        match (self.kind, &self.payload) {
            (ValueKind::Float, Payload::Float(f)) => Some(Number::Float(*f)),
            (ValueKind::IntSigned, Payload::Signed(i)) => Some(Number::Signed(*i)),
            (ValueKind::IntUnsigned, Payload::Unsigned(u)) => Some(Number::Unsigned(*u)),
            _ => None,
        }
    }

    /// Raw 64-bit image of a numeric payload.
    pub fn bits(&self) -> u64 {
        match &self.payload {
            Payload::Unsigned(u) => *u,
            Payload::Signed(i) => *i as u64,
            Payload::Float(f) => f.to_bits(),
            Payload::Bool(b) => *b as u64,
            _ => 0,
        }
    }

    /// Deterministic textual rendering per declared type.
    ///
    /// Integers are truncated to their declared width first; floats print
    /// with six decimals; callables render as `<fn NAME>`.
    pub fn stringify(&self) -> Option<String> {
        match self.ty {
            TypeTag::Bool => match &self.payload {
                Payload::Bool(b) => Some(b.to_string()),
                _ => Some((self.bits() != 0).to_string()),
            },
            TypeTag::UInt8 | TypeTag::UInt16 | TypeTag::UInt32 | TypeTag::UInt64
            | TypeTag::Int8 | TypeTag::Int16 | TypeTag::Int32 | TypeTag::Int64 => {
                Some(stringify_int(self.bits(), self.ty))
            }
            TypeTag::String => match &self.payload {
                Payload::Str(s) => Some(s.clone()),
                _ => None,
            },
            TypeTag::Float => match &self.payload {
                Payload::Float(f) => Some(format!("{f:.6}")),
                _ => None,
            },
            TypeTag::Undefined | TypeTag::Void => match &self.payload {
                Payload::Null => Some("null".to_string()),
                Payload::Callable(c) => Some(format!("<fn {}>", c.decl.name.lexeme)),
                _ => None,
            },
        }
    }

    /// Byte image used by the equality comparison.
    fn raw_bytes(&self) -> Vec<u8> {
        match &self.payload {
            Payload::Unsigned(u) => u.to_le_bytes().to_vec(),
            Payload::Signed(i) => i.to_le_bytes().to_vec(),
            Payload::Float(f) => f.to_le_bytes().to_vec(),
            Payload::Bool(b) => vec![*b as u8],
            Payload::Str(s) => s.as_bytes().to_vec(),
            Payload::Null | Payload::Callable(_) => Vec::new(),
        }
    }
}

/// Render an integer payload at the given declared width.
fn stringify_int(bits: u64, ty: TypeTag) -> String {
    match ty {
        TypeTag::UInt8 => (bits as u8).to_string(),
        TypeTag::UInt16 => (bits as u16).to_string(),
        TypeTag::UInt32 => (bits as u32).to_string(),
        TypeTag::UInt64 => bits.to_string(),
        TypeTag::Int8 => (bits as i8).to_string(),
        TypeTag::Int16 => (bits as i16).to_string(),
        TypeTag::Int32 => (bits as i32).to_string(),
        TypeTag::Int64 => (bits as i64).to_string(),
        _ => String::new(),
    }
}

/// Equality across values.
///
/// Null equals null, bools compare by value, callables are equal only when
/// they share a declaration. Everything else compares raw payload bytes up
/// to the shorter of the two images.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    if left.kind == ValueKind::Null && right.kind == ValueKind::Null {
        return true;
    }
    if left.kind == ValueKind::Null || right.kind == ValueKind::Null {
        return false;
    }
    if left.kind == ValueKind::Bool || right.kind == ValueKind::Bool {
        return match (&left.payload, &right.payload) {
            (Payload::Bool(a), Payload::Bool(b)) => a == b,
            _ => false,
        };
    }
    if left.kind == ValueKind::Callable || right.kind == ValueKind::Callable {
        return match (&left.payload, &right.payload) {
            (Payload::Callable(a), Payload::Callable(b)) => Rc::ptr_eq(&a.decl, &b.decl),
            _ => false,
        };
    }
    let left_bytes = left.raw_bytes();
    let right_bytes = right.raw_bytes();
    let shorter = left_bytes.len().min(right_bytes.len());
    left_bytes[..shorter] == right_bytes[..shorter]
}

/// Check and convert a value for a slot of the declared type.
///
/// Used by variable and constant declarations, parameter binding,
/// assignment, and return validation. On success the value's declared type
/// becomes the target type (payload stays widened); on failure the error
/// message for the diagnostic sink is returned.
pub fn coerce_to_type(mut value: Value, target: TypeTag) -> Result<Value, String> {
    // a void slot only exists as a function return; it takes null alone
    if target == TypeTag::Void {
        return if value.kind == ValueKind::Null {
            Ok(value)
        } else {
            Err(format!("Cannot assign {} to void.", value.ty.name()))
        };
    }
    if value.kind == ValueKind::Null {
        return Err(format!("Cannot assign null to {}.", target.name()));
    }
    match target {
        TypeTag::String => {
            if value.ty == TypeTag::String {
                Ok(value)
            } else {
                Err(format!("Cannot assign {} to string.", value.ty.name()))
            }
        }
        TypeTag::Bool => {
            if value.kind == ValueKind::Bool {
                value.ty = TypeTag::Bool;
                Ok(value)
            } else {
                Err(format!("Cannot assign {} to bool.", value.ty.name()))
            }
        }
        TypeTag::Float => match value.as_number() {
            Some(Number::Float(_)) => {
                value.ty = TypeTag::Float;
                Ok(value)
            }
            Some(Number::Unsigned(u)) => {
                // admitted iff the round trip through f64 is exact; the
                // explicit bound guards against the saturating cast hiding
                // an overflow at the top of the range
                let converted = u as f64;
                if converted >= 18_446_744_073_709_551_616.0 || converted as u64 != u {
                    return Err(cannot_convert(&u.to_string(), value.ty, target));
                }
                value.kind = ValueKind::Float;
                value.ty = TypeTag::Float;
                value.payload = Payload::Float(converted);
                Ok(value)
            }
            Some(Number::Signed(i)) => {
                let converted = i as f64;
                if converted >= 9_223_372_036_854_775_808.0 || converted as i64 != i {
                    return Err(cannot_convert(&i.to_string(), value.ty, target));
                }
                value.kind = ValueKind::Float;
                value.ty = TypeTag::Float;
                value.payload = Payload::Float(converted);
                Ok(value)
            }
            None => Err(format!("Cannot assign {} to float.", value.ty.name())),
        },
        _ if target.is_integer() => match value.as_number() {
            Some(Number::Unsigned(_)) | Some(Number::Signed(_)) => {
                // in range iff the rendering at the target width matches
                let source_ty = if value.ty.is_integer() {
                    value.ty
                } else if value.kind == ValueKind::IntSigned {
                    TypeTag::Int64
                } else {
                    TypeTag::UInt64
                };
                let original = stringify_int(value.bits(), source_ty);
                let narrowed = stringify_int(value.bits(), target);
                if original != narrowed {
                    return Err(format!(
                        "Range error: {original} is not in range of type {}.",
                        target.name()
                    ));
                }
                value.ty = target;
                Ok(value)
            }
            _ => Err(format!(
                "Cannot assign {} to {}.",
                value.ty.name(),
                target.name()
            )),
        },
        _ => Err(format!(
            "Cannot assign {} to {}.",
            value.ty.name(),
            target.name()
        )),
    }
}

fn cannot_convert(rendered: &str, source: TypeTag, target: TypeTag) -> String {
    format!(
        "Cannot assign value {rendered} with type {} to {} (cannot be converted safely).",
        source.name(),
        target.name()
    )
}
