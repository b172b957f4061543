//! Type-erased services shared by the transport, the pipeline and the adapter.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tower::ServiceExt;
use tower::util::BoxCloneService;
use tower_service::Service;

use crate::{Error, Request, Response, Result};

/// Type-erased service for middleware composition.
///
/// Transports and every pipeline stage are stored behind this type so the
/// pipeline can be rebuilt at runtime without exposing nested generics.
pub type BoxedService = BoxCloneService<Request, Response, Error>;

/// Future returned by the services of this crate.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

/// Box any cloneable transport or middleware stack into a [`BoxedService`].
pub fn boxed<S>(service: S) -> BoxedService
where
    S: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    BoxCloneService::new(service)
}

/// Thread-safe wrapper for [`BoxedService`].
///
/// `BoxCloneService` is `Send` but not `Sync`; the mutex is only held while
/// cloning the service, never across an exchange.
#[derive(Clone)]
pub(crate) struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    pub(crate) fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    /// A fresh handle on the wrapped service.
    pub(crate) fn service(&self) -> BoxedService {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn call(&self, request: Request) -> ServiceFuture {
        let mut service = self.service();
        Box::pin(async move { service.ready().await?.call(request).await })
    }
}
