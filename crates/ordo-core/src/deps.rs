//! Dependency lists and their identity comparison.
//!
//! A [`Dep`] is an opaque value that can only answer one question: is it the
//! same as another `Dep`? Sameness follows `Object.is` rules:
//!
//! - plain values compare with `PartialEq`,
//! - floats compare by identity (`NaN` is the same as `NaN`, `-0.0` is not `+0.0`),
//! - `Rc` handles compare by pointer, never by contents.
//!
//! Use [`deps!`](crate::deps!) to build a list at a call site:
//!
//! ```rust
//! use ordo_core::{deps, deps_changed};
//!
//! let a = deps![1, "x", 2.5];
//! let b = deps![1, "x", 2.5];
//! assert!(!deps_changed(Some(&a[..]), Some(&b[..])));
//! assert!(deps_changed(None, Some(&b[..])));
//! ```

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

/// Ordered dependency list. Most call sites list a handful of values.
pub type Deps = SmallVec<[Dep; 4]>;

pub struct Dep {
    value: Box<dyn Any>,
    same: fn(&dyn Any, &dyn Any) -> bool,
    type_name: &'static str,
}

impl Dep {
    /// Dependency compared with `PartialEq`. `f32` and `f64` compare by
    /// identity instead, the same as their `From` conversions.
    pub fn value<T: PartialEq + 'static>(value: T) -> Self {
        let same: fn(&dyn Any, &dyn Any) -> bool = if TypeId::of::<T>() == TypeId::of::<f64>() {
            same_float::<f64>
        } else if TypeId::of::<T>() == TypeId::of::<f32>() {
            same_float::<f32>
        } else {
            same_value::<T>
        };
        Self {
            value: Box::new(value),
            same,
            type_name: type_name::<T>(),
        }
    }

    /// Dependency compared by `Rc` pointer identity.
    pub fn identity<T: ?Sized + 'static>(rc: &Rc<T>) -> Self {
        Self {
            value: Box::new(rc.clone()),
            same: same_rc::<T>,
            type_name: type_name::<Rc<T>>(),
        }
    }

    fn float<T: Float>(value: T) -> Self {
        Self {
            value: Box::new(value),
            same: same_float::<T>,
            type_name: type_name::<T>(),
        }
    }

    /// `Object.is`-style identity. Values of different types are never the same.
    pub fn is(&self, other: &Dep) -> bool {
        (self.same)(self.value.as_ref(), other.value.as_ref())
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dep<{}>", self.type_name)
    }
}

fn same_value<T: PartialEq + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn same_rc<T: ?Sized + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<Rc<T>>(), b.downcast_ref::<Rc<T>>()) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

trait Float: Copy + 'static {
    fn is_nan(self) -> bool;
    fn bits(self) -> u64;
}

impl Float for f32 {
    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }
    fn bits(self) -> u64 {
        self.to_bits() as u64
    }
}

impl Float for f64 {
    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }
    fn bits(self) -> u64 {
        self.to_bits()
    }
}

fn same_float<T: Float>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => (a.is_nan() && b.is_nan()) || a.bits() == b.bits(),
        _ => false,
    }
}

macro_rules! value_deps {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Dep {
                fn from(v: $t) -> Self {
                    Dep::value(v)
                }
            }
        )*
    };
}

value_deps!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    String,
    &'static str,
    web_time::Duration,
    Option<web_time::Duration>,
);

impl From<f32> for Dep {
    fn from(v: f32) -> Self {
        Dep::float(v)
    }
}

impl From<f64> for Dep {
    fn from(v: f64) -> Self {
        Dep::float(v)
    }
}

impl<T: ?Sized + 'static> From<Rc<T>> for Dep {
    fn from(rc: Rc<T>) -> Self {
        Dep::identity(&rc)
    }
}

impl<T: ?Sized + 'static> From<&Rc<T>> for Dep {
    fn from(rc: &Rc<T>) -> Self {
        Dep::identity(rc)
    }
}

/// Build a [`Deps`] list from values convertible into [`Dep`].
#[macro_export]
macro_rules! deps {
    () => {
        $crate::deps::Deps::new()
    };
    ($($dep:expr),+ $(,)?) => {{
        let mut list = $crate::deps::Deps::new();
        $( list.push($crate::deps::Dep::from($dep)); )+
        list
    }};
}

/// Decide whether a hook guarded by `next` must run again.
///
/// `None` on either side means "changed": nothing recorded yet, or the caller
/// asked to re-run on every pass.
pub fn deps_changed(prev: Option<&[Dep]>, next: Option<&[Dep]>) -> bool {
    match (prev, next) {
        (Some(prev), Some(next)) => {
            prev.len() != next.len() || prev.iter().zip(next).any(|(a, b)| !a.is(b))
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps;

    fn changed(a: &Deps, b: &Deps) -> bool {
        deps_changed(Some(a.as_slice()), Some(b.as_slice()))
    }

    #[test]
    fn equal_lists_are_unchanged() {
        assert!(!changed(&deps![1, "a", true], &deps![1, "a", true]));
        assert!(!changed(&deps![], &deps![]));
    }

    #[test]
    fn length_or_element_mismatch_is_changed() {
        assert!(changed(&deps![1, 2], &deps![1]));
        assert!(changed(&deps![1, 2], &deps![1, 3]));
        assert!(changed(&deps![String::from("a")], &deps![String::from("b")]));
    }

    #[test]
    fn absent_list_is_always_changed() {
        let d = deps![1];
        assert!(deps_changed(None, Some(d.as_slice())));
        assert!(deps_changed(Some(d.as_slice()), None));
        assert!(deps_changed(None, None));
    }

    #[test]
    fn floats_follow_object_is() {
        assert!(!changed(&deps![f64::NAN], &deps![f64::NAN]));
        assert!(changed(&deps![0.0_f64], &deps![-0.0_f64]));
        assert!(!changed(&deps![1.5_f32], &deps![1.5_f32]));
    }

    #[test]
    fn generic_values_keep_float_identity() {
        let nan = || deps![Dep::value(f64::NAN)];
        assert!(!changed(&nan(), &nan()));
        assert!(changed(&deps![Dep::value(0.0_f32)], &deps![Dep::value(-0.0_f32)]));
        // mixed construction paths agree
        assert!(!changed(&deps![Dep::value(2.5_f64)], &deps![2.5_f64]));
    }

    #[test]
    fn different_types_never_match() {
        assert!(changed(&deps![1_i32], &deps![1_i64]));
    }

    #[test]
    fn rc_compares_by_pointer() {
        let a = Rc::new(5);
        let b = Rc::new(5);
        assert!(!changed(&deps![&a], &deps![a.clone()]));
        assert!(changed(&deps![&a], &deps![&b]));

        let f: Rc<dyn Fn() -> i32> = Rc::new(|| 1);
        assert!(!changed(&deps![&f], &deps![&f]));
    }
}
