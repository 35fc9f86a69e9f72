//! Primitive Keys
//!
//! Only primitive values (strings, integers and booleans) may key an entry.
//! Callers hand the store anything implementing [`IntoKey`]; primitive
//! inputs convert, composite inputs (sequences, tuples) are refused with
//! [`StoreError::InvalidKey`] before the store is touched.

use crate::error::StoreError;
use std::fmt;

/// A primitive key identifying an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => write!(f, "{:?}", s),
            Key::Int(n) => write!(f, "{}", n),
            Key::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Conversion of caller-supplied values into a [`Key`].
pub trait IntoKey {
    /// Converts `self` into a key, or explains why it cannot be one.
    fn into_key(self) -> Result<Key, StoreError>;
}

impl IntoKey for Key {
    fn into_key(self) -> Result<Key, StoreError> {
        Ok(self)
    }
}

impl IntoKey for &Key {
    fn into_key(self) -> Result<Key, StoreError> {
        Ok(self.clone())
    }
}

impl IntoKey for &str {
    fn into_key(self) -> Result<Key, StoreError> {
        Ok(Key::Str(self.to_owned()))
    }
}

impl IntoKey for String {
    fn into_key(self) -> Result<Key, StoreError> {
        Ok(Key::Str(self))
    }
}

impl IntoKey for &String {
    fn into_key(self) -> Result<Key, StoreError> {
        Ok(Key::Str(self.clone()))
    }
}

impl IntoKey for char {
    fn into_key(self) -> Result<Key, StoreError> {
        Ok(Key::Str(self.to_string()))
    }
}

impl IntoKey for bool {
    fn into_key(self) -> Result<Key, StoreError> {
        Ok(Key::Bool(self))
    }
}

macro_rules! lossless_int_key {
    ($($t:ty),*) => {
        $(
            impl IntoKey for $t {
                fn into_key(self) -> Result<Key, StoreError> {
                    Ok(Key::Int(i64::from(self)))
                }
            }
        )*
    };
}

lossless_int_key!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! bounded_int_key {
    ($($t:ty),*) => {
        $(
            impl IntoKey for $t {
                fn into_key(self) -> Result<Key, StoreError> {
                    i64::try_from(self).map(Key::Int).map_err(|_| {
                        StoreError::InvalidKey(format!("integer {} does not fit a key", self))
                    })
                }
            }
        )*
    };
}

bounded_int_key!(u64, usize, isize);

fn composite(kind: &str) -> StoreError {
    StoreError::InvalidKey(format!("{} is not a primitive type", kind))
}

impl<T> IntoKey for Vec<T> {
    fn into_key(self) -> Result<Key, StoreError> {
        Err(composite("sequence"))
    }
}

impl<T> IntoKey for &[T] {
    fn into_key(self) -> Result<Key, StoreError> {
        Err(composite("slice"))
    }
}

impl<T, const N: usize> IntoKey for [T; N] {
    fn into_key(self) -> Result<Key, StoreError> {
        Err(composite("array"))
    }
}

impl<A, B> IntoKey for (A, B) {
    fn into_key(self) -> Result<Key, StoreError> {
        Err(composite("tuple"))
    }
}

impl<A, B, C> IntoKey for (A, B, C) {
    fn into_key(self) -> Result<Key, StoreError> {
        Err(composite("tuple"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_keys() {
        assert_eq!("abc".into_key(), Ok(Key::Str("abc".into())));
        assert_eq!(String::from("abc").into_key(), Ok(Key::Str("abc".into())));
        assert_eq!(12345i32.into_key(), Ok(Key::Int(12345)));
        assert_eq!(7u8.into_key(), Ok(Key::Int(7)));
        assert_eq!(true.into_key(), Ok(Key::Bool(true)));
        assert_eq!('x'.into_key(), Ok(Key::Str("x".into())));
    }

    #[test]
    fn test_distinct_types_do_not_collide() {
        assert_ne!("1".into_key().unwrap(), 1i64.into_key().unwrap());
        assert_ne!("true".into_key().unwrap(), true.into_key().unwrap());
    }

    #[test]
    fn test_out_of_range_integer_rejected() {
        assert!(matches!(u64::MAX.into_key(), Err(StoreError::InvalidKey(_))));
        assert_eq!(42u64.into_key(), Ok(Key::Int(42)));
    }

    #[test]
    fn test_composite_keys_rejected() {
        assert!(matches!(vec![1, 2].into_key(), Err(StoreError::InvalidKey(_))));
        assert!(matches!([1, 2, 3].into_key(), Err(StoreError::InvalidKey(_))));
        assert!(matches!((1, "a").into_key(), Err(StoreError::InvalidKey(_))));
        let slice: &[u8] = b"raw";
        assert!(matches!(slice.into_key(), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(Key::Str("abc".into()).to_string(), "\"abc\"");
        assert_eq!(Key::Int(-3).to_string(), "-3");
        assert_eq!(Key::Bool(false).to_string(), "false");
    }
}
