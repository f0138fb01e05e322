//! Argument tuples for client calls.

use super::{CodecError, SerializerProfile, TypeShape, WireType, WireValue};

/// A tuple of operation arguments, in declaration order.
pub trait IntoArguments: Send + 'static {
    fn shapes() -> Vec<TypeShape>;

    fn into_wire(self, profile: &SerializerProfile) -> Result<Vec<WireValue>, CodecError>;
}

macro_rules! impl_into_arguments {
    ( $($ty:ident),* ) => {
        #[allow(non_snake_case, unused_variables)]
        impl<$($ty: WireType,)*> IntoArguments for ($($ty,)*) {
            fn shapes() -> Vec<TypeShape> {
                vec![$($ty::shape()),*]
            }

            fn into_wire(self, profile: &SerializerProfile) -> Result<Vec<WireValue>, CodecError> {
                let ($($ty,)*) = self;
                Ok(vec![$($ty.to_wire(profile)?),*])
            }
        }
    };
}

all_the_tuples!(impl_into_arguments);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FilePart, WireKind};
    use uuid::Uuid;

    #[test]
    fn test_shapes_follow_tuple_order() {
        let shapes = <(Uuid, FilePart, Option<i32>)>::shapes();
        assert_eq!(shapes.len(), 3);
        assert_eq!(shapes[0].kind, WireKind::Scalar);
        assert_eq!(shapes[1].kind, WireKind::File);
        assert!(shapes[2].nullable);
        assert!(<()>::shapes().is_empty());
    }

    #[test]
    fn test_into_wire() {
        let values = ("World".to_string(), None::<i32>)
            .into_wire(&SerializerProfile::web())
            .unwrap();
        assert_eq!(values[0].as_text(), Some("World"));
        assert!(matches!(values[1], WireValue::Null));
    }
}
