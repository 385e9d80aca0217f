//! Cache key derivation
//!
//! A cache key is the wrapped call's base key plus a canonical encoding of
//! its arguments. Canonicalization is explicit and typed per call site
//! rather than a generic structural dump: simple scalars keep their plain
//! text form, composite arguments are normalized through `serde_json::Value`
//! so JSON object keys are emitted in sorted order - stable for value-equal
//! argument lists regardless of insertion order.

use fetchcache_domain::constants::KEY_SEPARATOR;
use fetchcache_domain::{FetchCacheError, Result};
use serde::Serialize;

/// Deterministic encoding of a call's arguments for key derivation
///
/// `Ok(None)` means the argument list is empty and the base key is used
/// unchanged. Implement this for custom argument structs via
/// [`canonical_json`]:
///
/// ```
/// use fetchcache_core::{canonical_json, CanonicalArgs};
/// use fetchcache_domain::Result;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Query {
///     page: u32,
///     country: String,
/// }
///
/// impl CanonicalArgs for Query {
///     fn canonical(&self) -> Result<Option<String>> {
///         canonical_json(self).map(Some)
///     }
/// }
/// ```
pub trait CanonicalArgs {
    /// Produce the canonical suffix for these arguments
    fn canonical(&self) -> Result<Option<String>>;
}

/// Canonical JSON text for any serializable value
///
/// The value is normalized through `serde_json::Value` before printing:
/// object keys serialize in sorted (BTreeMap) order, so two value-equal
/// maps built in different insertion orders produce identical text.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let normalized = serde_json::to_value(value)
        .map_err(|err| FetchCacheError::InvalidInput(format!("unserializable arguments: {err}")))?;
    serde_json::to_string(&normalized)
        .map_err(|err| FetchCacheError::InvalidInput(format!("unserializable arguments: {err}")))
}

/// Derive the cache key for `base_key` called with `args`
///
/// Empty argument list leaves the key unchanged; otherwise the layout is
/// `<base_key>_<canonical>`.
pub fn derive_key<A: CanonicalArgs>(base_key: &str, args: &A) -> Result<String> {
    match args.canonical()? {
        None => Ok(base_key.to_string()),
        Some(suffix) => Ok(format!("{base_key}{KEY_SEPARATOR}{suffix}")),
    }
}

impl CanonicalArgs for () {
    fn canonical(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

impl CanonicalArgs for String {
    fn canonical(&self) -> Result<Option<String>> {
        Ok(Some(self.clone()))
    }
}

impl CanonicalArgs for &str {
    fn canonical(&self) -> Result<Option<String>> {
        Ok(Some((*self).to_string()))
    }
}

macro_rules! canonical_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CanonicalArgs for $ty {
                fn canonical(&self) -> Result<Option<String>> {
                    Ok(Some(self.to_string()))
                }
            }
        )*
    };
}

canonical_display!(bool, i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl<T: Serialize> CanonicalArgs for Vec<T> {
    fn canonical(&self) -> Result<Option<String>> {
        canonical_json(self).map(Some)
    }
}

macro_rules! canonical_tuple {
    ($($name:ident),+) => {
        impl<$($name: Serialize),+> CanonicalArgs for ($($name,)+) {
            fn canonical(&self) -> Result<Option<String>> {
                canonical_json(self).map(Some)
            }
        }
    };
}

canonical_tuple!(T1);
canonical_tuple!(T1, T2);
canonical_tuple!(T1, T2, T3);
canonical_tuple!(T1, T2, T3, T4);

#[cfg(test)]
mod tests {
    //! Unit tests for key derivation.
    use std::collections::HashMap;

    use super::*;

    /// Validates `derive_key` behavior for the empty argument list scenario.
    ///
    /// Assertions:
    /// - Confirms `derive_key("movies", &())` equals `"movies"`.
    #[test]
    fn test_derive_key_no_args() {
        assert_eq!(derive_key("movies", &()).unwrap(), "movies");
    }

    /// Validates `derive_key` behavior for the scalar argument scenario.
    ///
    /// Assertions:
    /// - Confirms an integer argument produces `<base>_<value>`.
    /// - Confirms a string argument keeps its plain text form.
    #[test]
    fn test_derive_key_scalar_args() {
        assert_eq!(derive_key("movies", &1u32).unwrap(), "movies_1");
        assert_eq!(derive_key("country", &"us".to_string()).unwrap(), "country_us");
    }

    /// Validates `derive_key` behavior for the key independence scenario.
    ///
    /// Assertions:
    /// - Ensures different argument values map to different keys.
    #[test]
    fn test_derive_key_independent_per_args() {
        let key1 = derive_key("movies", &1u32).unwrap();
        let key2 = derive_key("movies", &2u32).unwrap();
        assert_ne!(key1, key2);
    }

    /// Validates `canonical_json` behavior for the composite argument
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms tuples and vectors encode as JSON arrays.
    #[test]
    fn test_derive_key_composite_args() {
        assert_eq!(derive_key("search", &(2u32, "drama")).unwrap(), "search_[2,\"drama\"]");
        assert_eq!(derive_key("ids", &vec![7u32, 9]).unwrap(), "ids_[7,9]");
    }

    /// Validates `canonical_json` behavior for the map-order independence
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms value-equal maps built in different insertion orders
    ///   canonicalize to identical text.
    #[test]
    fn test_canonical_json_map_order_independent() {
        let mut first = HashMap::new();
        first.insert("page".to_string(), 1);
        first.insert("limit".to_string(), 20);

        let mut second = HashMap::new();
        second.insert("limit".to_string(), 20);
        second.insert("page".to_string(), 1);

        assert_eq!(canonical_json(&first).unwrap(), canonical_json(&second).unwrap());
        assert_eq!(canonical_json(&first).unwrap(), "{\"limit\":20,\"page\":1}");
    }

    /// Validates `canonical_json` behavior for the determinism scenario.
    ///
    /// Assertions:
    /// - Confirms repeated canonicalization of the same value is stable.
    #[test]
    fn test_canonical_json_stable() {
        let args = (1u32, vec!["a", "b"]);
        assert_eq!(canonical_json(&args).unwrap(), canonical_json(&args).unwrap());
    }
}
