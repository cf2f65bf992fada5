//! The seam every layer of a listener's chain implements.

use std::future::Future;
use std::sync::Arc;

use crate::http::request::ServeRequest;
use crate::http::writer::ResponseWriter;

/// Serves one request by writing into a [`ResponseWriter`].
///
/// Middleware are plain structs wrapping another `Handler`; the chain is
/// composed statically and shared behind an `Arc` by the listener.
pub trait Handler: Send + Sync + 'static {
    fn serve<W: ResponseWriter>(
        &self,
        request: &ServeRequest,
        writer: &mut W,
    ) -> impl Future<Output = ()> + Send;
}

impl<H: Handler> Handler for Arc<H> {
    fn serve<W: ResponseWriter>(
        &self,
        request: &ServeRequest,
        writer: &mut W,
    ) -> impl Future<Output = ()> + Send {
        (**self).serve(request, writer)
    }
}
