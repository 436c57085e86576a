//! Prometheus HTTP metrics middleware
//!
//! Requests are labelled by method, matched route pattern and status code.
//! Unmatched paths share the `unmatched` label so arbitrary URLs cannot grow
//! the series count.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;

const UNMATCHED_ROUTE: &str = "unmatched";

lazy_static::lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total HTTP requests by method, route and status",
        &["method", "route", "status"]
    )
    .expect("failed to register http_requests_total");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latency by method, route and status",
        &["method", "route", "status"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("failed to register http_request_duration_seconds");
}

fn observe(method: &str, route: &str, status: u16, elapsed_secs: f64) {
    let status = status.to_string();
    let labels = [method, route, status.as_str()];
    HTTP_REQUESTS_TOTAL.with_label_values(&labels).inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&labels)
        .observe(elapsed_secs);
}

/// Records `http_requests_total` and `http_request_duration_seconds`
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = MetricsMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let method = req.method().as_str().to_owned();
        let started = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await?;

            // the pattern is only resolved once routing has run
            let route = res
                .request()
                .match_pattern()
                .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());
            observe(
                &method,
                &route,
                res.status().as_u16(),
                started.elapsed().as_secs_f64(),
            );

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test as actix_test, web, App, HttpResponse};

    fn count(route: &str, status: &str) -> u64 {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", route, status])
            .get()
    }

    #[actix_rt::test]
    async fn test_records_route_pattern() {
        let app = actix_test::init_service(
            App::new().wrap(MetricsMiddleware).route(
                "/items/{item_id}",
                web::get().to(|| async { HttpResponse::Ok().finish() }),
            ),
        )
        .await;

        let before = count("/items/{item_id}", "200");
        let req = actix_test::TestRequest::get().uri("/items/42").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_eq!(count("/items/{item_id}", "200"), before + 1);
    }

    #[actix_rt::test]
    async fn test_unmatched_paths_share_one_label() {
        let app = actix_test::init_service(App::new().wrap(MetricsMiddleware)).await;

        let before = count(UNMATCHED_ROUTE, "404");
        for path in ["/a", "/b/c"] {
            let req = actix_test::TestRequest::get().uri(path).to_request();
            actix_test::call_service(&app, req).await;
        }
        assert_eq!(count(UNMATCHED_ROUTE, "404"), before + 2);
    }
}
