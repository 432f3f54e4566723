//! Attribution middleware
//!
//! 服务端的“页面加载”：每个 GET/HEAD 请求运行一次归因解析，
//! 解析过程中写入的 Cookie 在响应返回时追加为 `Set-Cookie`。

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    dev::{ServiceRequest, ServiceResponse},
    http::Method,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{Instrument, debug_span, trace};

use crate::api::cookies::RequestCookieJar;
use crate::attribution::{AttributionResolver, PageUrl, Resolution};

/// Attribution 中间件工厂
#[derive(Clone)]
pub struct AttributionMiddleware {
    resolver: Arc<AttributionResolver>,
}

impl AttributionMiddleware {
    pub fn new(resolver: Arc<AttributionResolver>) -> Self {
        Self { resolver }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AttributionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AttributionService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AttributionService {
            service: Rc::new(service),
            resolver: self.resolver.clone(),
        }))
    }
}

pub struct AttributionService<S> {
    service: Rc<S>,
    resolver: Arc<AttributionResolver>,
}

impl<S, B> Service<ServiceRequest> for AttributionService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        // 只有页面浏览才算一次加载
        if !matches!(*req.method(), Method::GET | Method::HEAD) {
            return Box::pin(async move { srv.call(req).await });
        }

        let page = PageUrl::from_parts(req.path(), req.query_string());
        let mut jar = RequestCookieJar::from_request(req.request(), self.resolver.config());

        let span = debug_span!(
            "attribution",
            path = %page.path(),
            key = tracing::field::Empty,
        );

        let resolution = {
            let _entered = span.enter();

            // 购物页需要会话 ID 才能把标识挂到对应的访客上；没有标识时不写任何 Cookie
            if self.resolver.is_shop_page(&page) && self.resolver.resolve(&page, &jar).is_some() {
                jar.ensure_session();
            }

            self.resolver.resolve_and_persist(&page, &mut jar)
        };

        if let Resolution::Persisted {
            ref key,
            ref source,
            cookie_written,
            notified,
        } = resolution
        {
            span.record("key", key.as_str());
            trace!(
                parent: &span,
                "Attribution for {}: source={:?}, cookie_written={}, notified={}",
                page.path(),
                source,
                cookie_written,
                notified
            );
        }

        Box::pin(
            async move {
                let mut response = srv.call(req).await?;
                jar.apply_to(response.response_mut().headers_mut());
                Ok(response)
            }
            .instrument(span),
        )
    }
}
