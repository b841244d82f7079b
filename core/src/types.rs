//! Bound values and the closed set of flag value types.
//!
//! A [`Binding`] is the cell a flag or positional argument writes into. The
//! caller keeps a clone of it and reads the parsed value after the run (or
//! from inside an action closure). [`Value`] is the type-erased snapshot that
//! validators inspect.
//!
//! # Examples
//!
//! ```
//! use flagtree_core::{Binding, FlagType, Value};
//!
//! let counts: Binding<Vec<u16>> = Binding::default();
//! counts.with(|v| v.assign("8080")).unwrap();
//! counts.with(|v| v.assign("8081")).unwrap();
//!
//! assert_eq!(counts.get(), vec![8080, 8081]);
//! assert_eq!(counts.with(|v| v.snapshot()), Value::Uints(vec![8080, 8081]));
//! ```

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

trait Place<T> {
    fn borrow_mut(&self) -> RefMut<'_, T>;
    fn try_borrow_mut(&self) -> Option<RefMut<'_, T>>;
}

struct Root<T>(RefCell<T>);

impl<T> Place<T> for Root<T> {
    fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    fn try_borrow_mut(&self) -> Option<RefMut<'_, T>> {
        self.0.try_borrow_mut().ok()
    }
}

struct Projection<S: 'static, T> {
    parent: Binding<S>,
    project: fn(&mut S) -> &mut T,
}

impl<S: 'static, T> Place<T> for Projection<S, T> {
    fn borrow_mut(&self) -> RefMut<'_, T> {
        RefMut::map(self.parent.place.borrow_mut(), self.project)
    }

    fn try_borrow_mut(&self) -> Option<RefMut<'_, T>> {
        self.parent
            .place
            .try_borrow_mut()
            .map(|parent| RefMut::map(parent, self.project))
    }
}

/// A shared, single-threaded cell that a flag or positional argument is
/// bound to.
///
/// Cloning a binding clones the handle, not the value: every clone observes
/// the same storage. Registering the same binding under two flag names makes
/// them aliases.
///
/// # Examples
///
/// ```
/// use flagtree_core::Binding;
///
/// #[derive(Default)]
/// struct Server {
///     port: u16,
/// }
///
/// let server = Binding::new(Server::default());
/// let port = server.project(|s| &mut s.port);
/// port.set(8080);
/// assert_eq!(server.with(|s| s.port), 8080);
/// ```
pub struct Binding<T: 'static> {
    place: Rc<dyn Place<T>>,
}

impl<T: 'static> Binding<T> {
    /// Creates a binding holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            place: Rc::new(Root(RefCell::new(value))),
        }
    }

    /// Mutably borrows the bound value.
    ///
    /// # Panics
    ///
    /// Panics if the value is already borrowed, like [`RefCell::borrow_mut`].
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.place.borrow_mut()
    }

    /// Runs `f` against the bound value.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.borrow_mut())
    }

    /// Overwrites the bound value.
    pub fn set(&self, value: T) {
        *self.borrow_mut() = value;
    }

    /// Overwrites the bound value, returning the previous one.
    pub fn replace(&self, value: T) -> T {
        std::mem::replace(&mut *self.borrow_mut(), value)
    }

    /// Returns a binding to a part of this value, sharing the same storage.
    pub fn project<U: 'static>(&self, project: fn(&mut T) -> &mut U) -> Binding<U> {
        Binding {
            place: Rc::new(Projection {
                parent: self.clone(),
                project,
            }),
        }
    }
}

impl<T: Clone + 'static> Binding<T> {
    /// Returns a copy of the bound value.
    pub fn get(&self) -> T {
        self.borrow_mut().clone()
    }
}

impl<T: 'static> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            place: Rc::clone(&self.place),
        }
    }
}

impl<T: Default + 'static> Default for Binding<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.place.try_borrow_mut() {
            Some(value) => f.debug_tuple("Binding").field(&*value).finish(),
            None => f.write_str("Binding(<borrowed>)"),
        }
    }
}

/// Runtime snapshot of a bound value, as seen by validators.
///
/// Scalars collapse into one variant per family; slices keep their family so
/// that rules can distinguish an empty `Vec<u8>` from an empty `Vec<String>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Bools(Vec<bool>),
    Ints(Vec<i64>),
    Uints(Vec<u64>),
    Floats(Vec<f64>),
    Strs(Vec<String>),
}

/// A scalar type usable as a flag, a slice-flag element or a positional
/// argument.
pub trait Primitive: FlagType + Clone + Default + fmt::Display {
    /// Parses a flag value; failures become [`FlagError`](crate::FlagError)s.
    fn parse_strict(raw: &str) -> Result<Self, String>;

    /// Parses a positional or default value; `None` keeps the current value.
    fn parse_lenient(raw: &str) -> Option<Self> {
        Self::parse_strict(raw).ok()
    }

    fn to_value(&self) -> Value;

    fn list_value(items: &[Self]) -> Value;
}

/// A type a flag can be bound to: every [`Primitive`] (assignment replaces)
/// and `Vec` of every primitive (assignment appends).
pub trait FlagType: 'static {
    /// Whether a bare `--name` means `true`.
    const SWITCH: bool = false;

    /// Applies one occurrence of the flag.
    fn assign(&mut self, raw: &str) -> Result<(), String>;

    /// Applies a value that may silently fail to parse.
    fn assign_lenient(&mut self, raw: &str);

    fn snapshot(&self) -> Value;
}

/// Parses `1 t T TRUE true True` and `0 f F FALSE false False`.
pub(crate) fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err("invalid syntax".to_string()),
    }
}

impl Primitive for bool {
    fn parse_strict(raw: &str) -> Result<Self, String> {
        parse_bool(raw)
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn list_value(items: &[Self]) -> Value {
        Value::Bools(items.to_vec())
    }
}

impl Primitive for String {
    fn parse_strict(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn list_value(items: &[Self]) -> Value {
        Value::Strs(items.to_vec())
    }
}

/// Parses an integer flag value. `0x`, `0o` and `0b` prefixes select the
/// radix, a bare leading `0` means octal and `_` may separate digits.
/// Unsigned values take no sign.
fn parse_integer(raw: &str, signed: bool) -> Result<i128, String> {
    let invalid = || "invalid syntax".to_string();
    let (negative, body) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if !signed && body.len() != raw.len() {
        return Err(invalid());
    }

    let prefix = body.get(..2).map(str::to_ascii_lowercase);
    let (radix, digits) = match prefix.as_deref() {
        Some("0x") => (16, &body[2..]),
        Some("0o") => (8, &body[2..]),
        Some("0b") => (2, &body[2..]),
        _ if body.len() > 1 && body.starts_with('0') => (8, &body[1..]),
        _ => (10, body),
    };
    if digits.is_empty()
        || digits.ends_with('_')
        || digits.contains("__")
        || (radix == 10 && digits.starts_with('_'))
    {
        return Err(invalid());
    }
    let digits: String = digits.chars().filter(|c| *c != '_').collect();
    if digits.starts_with(['+', '-']) {
        return Err(invalid());
    }

    let magnitude = u128::from_str_radix(&digits, radix).map_err(|e| e.to_string())?;
    let value = i128::try_from(magnitude).map_err(|_| "value out of range".to_string())?;
    Ok(if negative { -value } else { value })
}

macro_rules! integer_primitive {
    ($variant:ident, $list:ident, $wide:ty, $signed:expr; $($ty:ty),+) => {$(
        impl Primitive for $ty {
            fn parse_strict(raw: &str) -> Result<Self, String> {
                let value = parse_integer(raw, $signed)?;
                <$ty>::try_from(value).map_err(|_| "value out of range".to_string())
            }

            // Positionals and defaults are plain base-10 numbers.
            fn parse_lenient(raw: &str) -> Option<Self> {
                raw.parse::<$ty>().ok()
            }

            fn to_value(&self) -> Value {
                Value::$variant(*self as $wide)
            }

            fn list_value(items: &[Self]) -> Value {
                Value::$list(items.iter().map(|item| *item as $wide).collect())
            }
        }
    )+};
}

integer_primitive!(Int, Ints, i64, true; i8, i16, i32, i64, isize);
integer_primitive!(Uint, Uints, u64, false; u8, u16, u32, u64, usize);

macro_rules! float_primitive {
    ($($ty:ty),+) => {$(
        impl Primitive for $ty {
            fn parse_strict(raw: &str) -> Result<Self, String> {
                raw.parse::<$ty>().map_err(|e| e.to_string())
            }

            fn to_value(&self) -> Value {
                Value::Float(f64::from(*self))
            }

            fn list_value(items: &[Self]) -> Value {
                Value::Floats(items.iter().map(|item| f64::from(*item)).collect())
            }
        }
    )+};
}

float_primitive!(f32, f64);

impl FlagType for bool {
    const SWITCH: bool = true;

    fn assign(&mut self, raw: &str) -> Result<(), String> {
        *self = parse_bool(raw)?;
        Ok(())
    }

    fn assign_lenient(&mut self, raw: &str) {
        if let Ok(value) = parse_bool(raw) {
            *self = value;
        }
    }

    fn snapshot(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! scalar_flag_type {
    ($($ty:ty),+) => {$(
        impl FlagType for $ty {
            fn assign(&mut self, raw: &str) -> Result<(), String> {
                *self = <$ty as Primitive>::parse_strict(raw)?;
                Ok(())
            }

            fn assign_lenient(&mut self, raw: &str) {
                if let Some(value) = <$ty as Primitive>::parse_lenient(raw) {
                    *self = value;
                }
            }

            fn snapshot(&self) -> Value {
                Primitive::to_value(self)
            }
        }
    )+};
}

macro_rules! list_flag_type {
    ($($ty:ty),+) => {$(
        impl FlagType for Vec<$ty> {
            fn assign(&mut self, raw: &str) -> Result<(), String> {
                self.push(<$ty as Primitive>::parse_strict(raw)?);
                Ok(())
            }

            // Slices have no positional or default form.
            fn assign_lenient(&mut self, _raw: &str) {}

            fn snapshot(&self) -> Value {
                <$ty as Primitive>::list_value(self)
            }
        }
    )+};
}

scalar_flag_type!(String, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
list_flag_type!(bool, String, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// Type-erased view of a bound flag or positional, as stored by registries.
pub(crate) trait Slot {
    fn is_switch(&self) -> bool;
    fn assign(&self, raw: &str) -> Result<(), String>;
    fn assign_lenient(&self, raw: &str);
    fn snapshot(&self) -> Value;
}

impl<T: FlagType> Slot for Binding<T> {
    fn is_switch(&self) -> bool {
        T::SWITCH
    }

    fn assign(&self, raw: &str) -> Result<(), String> {
        self.with(|value| value.assign(raw))
    }

    fn assign_lenient(&self, raw: &str) {
        self.with(|value| value.assign_lenient(raw));
    }

    fn snapshot(&self) -> Value {
        self.with(|value| value.snapshot())
    }
}
