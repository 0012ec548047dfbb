//! Size and alignment rules.
//!
//! Layout is only defined for materializable types. Asking for the layout
//! of a generic placeholder, an uninstantiated or bound generic, an opaque
//! backend type, or a function type is an internal error: those must be
//! resolved before anything needs their size. Sizes that do not fit in
//! a `u32` are rejected rather than wrapped.

use shade_diagnostic::{Diagnostic, ErrorCode};
use thiserror::Error;

use crate::{ArrayLen, Type};

/// Pointer width of every supported target.
pub const POINTER_SIZE: u32 = 8;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("type `{ty}` has no layout")]
    NoLayout { ty: Type },
    #[error("type `{ty}` is too large to lay out")]
    Overflow { ty: Type },
}

impl LayoutError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            LayoutError::NoLayout { .. } => Diagnostic::error(ErrorCode::E9002)
                .with_message(format!("internal error: {self}"))
                .with_note(
                    "size and alignment are only defined once every generic parameter is bound",
                ),
            LayoutError::Overflow { .. } => Diagnostic::error(ErrorCode::E3001)
                .with_message(self.to_string())
                .with_note("sizes are limited to 4 GiB"),
        }
    }
}

impl Type {
    /// Size in bytes.
    pub fn size(&self) -> Result<u32, LayoutError> {
        match self {
            Type::Unit => Ok(0),
            Type::Bool => Ok(1),
            Type::Int { bits, .. } | Type::Float { bits } => Ok(u32::from(*bits) / 8),
            Type::Vector(v) => {
                let element = v.element().size()?;
                if v.count() == 3 && element == 4 {
                    Ok(16)
                } else {
                    element.checked_mul(v.count()).ok_or_else(|| self.overflow())
                }
            }
            Type::Array(a) => match &a.count {
                ArrayLen::Known(n) => a
                    .element
                    .size()?
                    .checked_mul(*n)
                    .ok_or_else(|| self.overflow()),
                ArrayLen::Symbolic(_) => Err(self.no_layout()),
            },
            Type::Pointer(_) => Ok(POINTER_SIZE),
            Type::Struct(s) => s
                .fields
                .iter()
                .try_fold(0u32, |acc, (_, ty)| {
                    acc.checked_add(ty.size()?).ok_or_else(|| self.overflow())
                }),
            Type::GenericInt
            | Type::GenericFloat
            | Type::Symbolic(_)
            | Type::Parametric(_)
            | Type::Bound(_)
            | Type::Function(_)
            | Type::Opaque(_) => Err(self.no_layout()),
        }
    }

    /// Alignment in bytes.
    pub fn align(&self) -> Result<u32, LayoutError> {
        match self {
            Type::Unit | Type::Bool => Ok(1),
            Type::Int { bits, .. } | Type::Float { bits } => Ok(u32::from(*bits) / 8),
            Type::Vector(v) => {
                let element = v.element();
                if v.count() == 3 && element.size()? == 4 {
                    Ok(16)
                } else {
                    element.align()
                }
            }
            Type::Array(a) => match &a.count {
                ArrayLen::Known(_) => a.element.align(),
                ArrayLen::Symbolic(_) => Err(self.no_layout()),
            },
            Type::Pointer(_) => Ok(POINTER_SIZE),
            Type::Struct(s) => s
                .fields
                .iter()
                .try_fold(1u32, |acc, (_, ty)| ty.align().map(|align| acc.max(align))),
            Type::GenericInt
            | Type::GenericFloat
            | Type::Symbolic(_)
            | Type::Parametric(_)
            | Type::Bound(_)
            | Type::Function(_)
            | Type::Opaque(_) => Err(self.no_layout()),
        }
    }

    fn no_layout(&self) -> LayoutError {
        LayoutError::NoLayout { ty: self.clone() }
    }

    fn overflow(&self) -> LayoutError {
        LayoutError::Overflow { ty: self.clone() }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "test assertions use unwrap for clarity")]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use shade_ir::Name;

    use crate::{StructType, Type};

    use super::*;

    #[test]
    fn scalar_layout() {
        assert_eq!(Type::Bool.size().unwrap(), 1);
        assert_eq!(Type::I64.size().unwrap(), 8);
        assert_eq!(Type::F16.align().unwrap(), 2);
        assert_eq!(Type::Unit.size().unwrap(), 0);
        assert_eq!(Type::pointer(Type::Bool).size().unwrap(), 8);
    }

    #[test]
    fn three_wide_four_byte_vector_is_padded() {
        let v = Type::vector(Type::F32, 3).unwrap();
        assert_eq!(v.size().unwrap(), 16);
        assert_eq!(v.align().unwrap(), 16);

        let d = Type::vector(Type::F64, 3).unwrap();
        assert_eq!(d.size().unwrap(), 24);
        assert_eq!(d.align().unwrap(), 8);
    }

    #[test]
    fn struct_layout_sums_sizes_and_maxes_aligns() {
        let s = Type::Struct(Arc::new(StructType {
            name: Name::new("Particle"),
            qualified_name: Name::new("demo.Particle"),
            type_args: Vec::new(),
            fields: vec![
                (Name::new("pos"), Type::vector(Type::F32, 3).unwrap()),
                (Name::new("mass"), Type::F32),
                (Name::new("alive"), Type::Bool),
            ],
        }));
        assert_eq!(s.size().unwrap(), 21);
        assert_eq!(s.align().unwrap(), 16);
    }

    #[test]
    fn array_layout() {
        let a = Type::array(Type::U16, ArrayLen::Known(5));
        assert_eq!(a.size().unwrap(), 10);
        assert_eq!(a.align().unwrap(), 2);

        let symbolic = Type::array(Type::U16, ArrayLen::Symbolic(Name::new("N")));
        assert!(symbolic.size().is_err());
    }

    #[test]
    fn non_materializable_types_have_no_layout() {
        for ty in [
            Type::symbolic("T"),
            Type::opaque("Buffer"),
            Type::function(vec![], Type::Unit),
            Type::GenericFloat,
        ] {
            assert_eq!(ty.size(), Err(LayoutError::NoLayout { ty: ty.clone() }));
            assert!(ty.align().is_err());
        }
    }

    #[test]
    fn oversized_types_are_rejected() {
        let huge = Type::array(Type::F64, ArrayLen::Known(4_000_000_000));
        assert_eq!(huge.size(), Err(LayoutError::Overflow { ty: huge.clone() }));
        assert_eq!(huge.align().unwrap(), 8);
        assert_eq!(huge.size().unwrap_err().to_diagnostic().code, ErrorCode::E3001);

        let half = Type::array(Type::U8, ArrayLen::Known(u32::MAX / 2 + 1));
        let pair = Type::Struct(Arc::new(StructType {
            name: Name::new("Pair"),
            qualified_name: Name::new("demo.Pair"),
            type_args: Vec::new(),
            fields: vec![(Name::new("a"), half.clone()), (Name::new("b"), half)],
        }));
        assert_eq!(pair.size(), Err(LayoutError::Overflow { ty: pair.clone() }));
    }

    fn scalar() -> impl Strategy<Value = Type> {
        prop::sample::select(Type::SCALARS.to_vec())
    }

    proptest! {
        #[test]
        fn vector_layout_rule(element in scalar(), count in 2u32..=4) {
            let v = Type::vector(element.clone(), count).unwrap();
            let elem_size = element.size().unwrap();
            if count == 3 && elem_size == 4 {
                prop_assert_eq!(v.size().unwrap(), 16);
                prop_assert_eq!(v.align().unwrap(), 16);
            } else {
                prop_assert_eq!(v.size().unwrap(), elem_size * count);
                prop_assert_eq!(v.align().unwrap(), element.align().unwrap());
            }
        }

        #[test]
        fn invalid_vector_widths_are_rejected(element in scalar(), count in 5u32..64) {
            prop_assert!(Type::vector(element, count).is_err());
        }
    }
}
