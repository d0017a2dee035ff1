//! Element kinds a tensor can hold.
//!
//! Primitive numeric kinds compare with `==`. The generic reference kind is
//! modelled as `Option<T>`, where `None` plays the role of a null reference:
//! two `None`s are equal, `None` against `Some` is not.

use approx::RelativeEq;

use crate::maybe_sync::MaybeSendSync;

/// Element kind tag, fixed for the lifetime of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    /// UTF-16 code unit.
    Char16,
    /// Nullable generic value.
    Reference,
}

impl ElementKind {
    /// True for the kinds that take part in numeric casts.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ElementKind::I8
                | ElementKind::I16
                | ElementKind::I32
                | ElementKind::I64
                | ElementKind::F32
                | ElementKind::F64
                | ElementKind::Char16
        )
    }

    pub fn is_floating(self) -> bool {
        matches!(self, ElementKind::F32 | ElementKind::F64)
    }
}

/// A value that can be stored in a tensor cell.
///
/// `Default` supplies the value of freshly allocated cells (zero, `false`,
/// or `None`).
pub trait Element: Clone + Default + MaybeSendSync + 'static {
    const KIND: ElementKind;

    /// Kind-appropriate cell equality.
    fn cell_eq(&self, other: &Self) -> bool;
}

macro_rules! impl_element_primitive {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const KIND: ElementKind = ElementKind::$kind;

                #[inline(always)]
                fn cell_eq(&self, other: &Self) -> bool {
                    *self == *other
                }
            }
        )*
    };
}

impl_element_primitive!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    u16 => Char16,
);

impl<T> Element for Option<T>
where
    T: PartialEq + Clone + MaybeSendSync + 'static,
{
    const KIND: ElementKind = ElementKind::Reference;

    #[inline]
    fn cell_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Floating kinds that support tolerance-based comparison.
pub trait ApproxElement: Element + Copy {
    /// Absolute tolerance used when none is supplied.
    const DEFAULT_DELTA: Self;
    /// Relative tolerance used when none is supplied.
    const DEFAULT_EPSILON: Self;

    /// True when `self` and `other` are within `delta` absolutely, or within
    /// `epsilon` relative to the larger magnitude.
    fn approx_eq(self, other: Self, delta: Self, epsilon: Self) -> bool;
}

macro_rules! impl_approx_element {
    ($($t:ty => $tol:expr),* $(,)?) => {
        $(
            impl ApproxElement for $t {
                const DEFAULT_DELTA: Self = $tol;
                const DEFAULT_EPSILON: Self = $tol;

                #[inline]
                fn approx_eq(self, other: Self, delta: Self, epsilon: Self) -> bool {
                    self.relative_eq(&other, delta, epsilon)
                }
            }
        )*
    };
}

impl_approx_element!(f32 => 1e-5, f64 => 1e-6);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(<i8 as Element>::KIND, ElementKind::I8);
        assert_eq!(<u16 as Element>::KIND, ElementKind::Char16);
        assert_eq!(<Option<String> as Element>::KIND, ElementKind::Reference);
        assert!(ElementKind::F32.is_floating());
        assert!(!ElementKind::Bool.is_numeric());
        assert!(ElementKind::Char16.is_numeric());
    }

    #[test]
    fn test_reference_null_handling() {
        let none: Option<String> = None;
        let some = Some("a".to_string());
        assert!(none.cell_eq(&None));
        assert!(!none.cell_eq(&some));
        assert!(!some.cell_eq(&none));
        assert!(some.cell_eq(&Some("a".to_string())));
    }

    #[test]
    fn test_nan_is_not_equal() {
        assert!(!f64::NAN.cell_eq(&f64::NAN));
    }

    #[test]
    fn test_approx_eq_default_tolerance() {
        assert!(1.0f64.approx_eq(1.0 + 1e-7, f64::DEFAULT_DELTA, f64::DEFAULT_EPSILON));
        assert!(!1.0f64.approx_eq(1.001, f64::DEFAULT_DELTA, f64::DEFAULT_EPSILON));
        assert!(0.5f32.approx_eq(0.5 + 1e-7, f32::DEFAULT_DELTA, f32::DEFAULT_EPSILON));
    }

    #[test]
    fn test_approx_eq_relative() {
        // absolute difference 1.0 is within 1e-6 of 1e7
        assert!(1e7f64.approx_eq(1e7 + 1.0, 1e-9, 1e-6));
        assert!(!1e7f64.approx_eq(1e7 + 1.0, 1e-9, 1e-9));
    }
}
