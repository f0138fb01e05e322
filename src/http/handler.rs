//! Typed operation handlers.
//!
//! Any `Fn(Arc<S>, T1, .., Tn) -> impl Future<Output = Result<R, ServiceError>>`
//! with `Ti: WireType` and `R: WireReturn` is a handler, so service methods
//! written as `async fn op(self: Arc<Self>, ..)` can be registered directly.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::{DispatchError, ServiceError};
use crate::codec::{ReturnShape, SerializerProfile, TypeShape, WireReturn, WireType, WireValue};

/// Decoded-on-demand arguments for one request, in parameter order.
///
/// `None` means the request carried nothing under the parameter's name (or
/// only an empty value); the type's absent value is bound instead.
pub struct ArgumentCursor {
    values: std::vec::IntoIter<(String, Option<WireValue>)>,
    profile: Arc<SerializerProfile>,
    operation: String,
}

impl ArgumentCursor {
    pub fn new(
        operation: impl Into<String>,
        values: Vec<(String, Option<WireValue>)>,
        profile: Arc<SerializerProfile>,
    ) -> Self {
        Self {
            values: values.into_iter(),
            profile,
            operation: operation.into(),
        }
    }

    pub fn profile(&self) -> Arc<SerializerProfile> {
        self.profile.clone()
    }

    /// Decodes the next argument.
    pub fn next<T: WireType>(&mut self) -> Result<T, DispatchError> {
        let (name, value) = self
            .values
            .next()
            .ok_or_else(|| DispatchError::ArgumentMismatch(self.operation.clone()))?;
        let decoded = match value {
            Some(value) => T::from_wire(value, &self.profile),
            None => T::absent(),
        };
        decoded.map_err(|err| DispatchError::InvalidArgument {
            name,
            reason: err.to_string(),
        })
    }
}

/// A service function that can serve one operation.
pub trait OperationHandler<S, Args, R>: Clone + Send + Sync + 'static {
    fn argument_shapes() -> Vec<TypeShape>;

    fn return_shape() -> ReturnShape;

    /// Decodes the arguments and starts the call.
    fn call(
        &self,
        service: Arc<S>,
        arguments: ArgumentCursor,
    ) -> Result<BoxFuture<'static, Result<R, ServiceError>>, DispatchError>;
}

macro_rules! impl_operation_handler {
    ( $($ty:ident),* ) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, Fut, S, R, $($ty,)*> OperationHandler<S, ($($ty,)*), R> for F
        where
            F: Fn(Arc<S>, $($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
            S: Send + Sync + 'static,
            R: WireReturn,
            $($ty: WireType,)*
        {
            fn argument_shapes() -> Vec<TypeShape> {
                vec![$($ty::shape()),*]
            }

            fn return_shape() -> ReturnShape {
                R::return_shape()
            }

            fn call(
                &self,
                service: Arc<S>,
                mut arguments: ArgumentCursor,
            ) -> Result<BoxFuture<'static, Result<R, ServiceError>>, DispatchError> {
                $(let $ty = arguments.next::<$ty>()?;)*
                Ok(Box::pin((self)(service, $($ty,)*)))
            }
        }
    };
}

all_the_tuples!(impl_operation_handler);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::WireKind;
    use tokio_util::sync::CancellationToken;

    struct Greeter;

    impl Greeter {
        async fn greet(
            self: Arc<Self>,
            name: String,
            _token: CancellationToken,
        ) -> Result<String, ServiceError> {
            Ok(format!("Hello, {name}!"))
        }
    }

    fn shapes_of<S, Args, R, H: OperationHandler<S, Args, R>>(_: &H) -> Vec<TypeShape> {
        H::argument_shapes()
    }

    fn cursor(values: Vec<(&str, Option<WireValue>)>) -> ArgumentCursor {
        ArgumentCursor::new(
            "greet",
            values.into_iter().map(|(n, v)| (n.to_string(), v)).collect(),
            Arc::new(SerializerProfile::web()),
        )
    }

    #[test]
    fn test_method_handler_shapes() {
        let shapes = shapes_of(&Greeter::greet);
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].kind, WireKind::Scalar);
        assert_eq!(shapes[1].kind, WireKind::Cancellation);
    }

    #[tokio::test]
    async fn test_call_decodes_arguments() {
        let handler = Greeter::greet;
        let future = OperationHandler::<Greeter, (String, CancellationToken), String>::call(
            &handler,
            Arc::new(Greeter),
            cursor(vec![
                ("name", Some(WireValue::Text("World".into()))),
                ("token", Some(WireValue::Cancellation(CancellationToken::new()))),
            ]),
        )
        .unwrap();
        assert_eq!(future.await.unwrap(), "Hello, World!");
    }

    #[test]
    fn test_invalid_argument_names_the_parameter() {
        let handler = |_: Arc<Greeter>, count: i32| async move { Ok::<_, ServiceError>(count) };
        let result = OperationHandler::<Greeter, (i32,), i32>::call(
            &handler,
            Arc::new(Greeter),
            cursor(vec![("count", Some(WireValue::Text("many".into())))]),
        );
        match result {
            Err(DispatchError::InvalidArgument { name, .. }) => assert_eq!(name, "count"),
            _ => panic!("expected an invalid argument"),
        }
    }

    #[test]
    fn test_missing_values_use_absent() {
        let mut arguments = cursor(vec![("a", None), ("b", None)]);
        assert_eq!(arguments.next::<i32>().unwrap(), 0);
        assert_eq!(arguments.next::<Option<String>>().unwrap(), None);
        assert!(matches!(
            arguments.next::<i32>(),
            Err(DispatchError::ArgumentMismatch(_))
        ));
    }
}
