/*!
 * 固定窗口速率限制中间件
 *
 * 以 `前缀:标识:窗口序号` 为键计数，标识优先取已认证账号，否则取客户端 IP。
 * 超出限制返回 429，并附带 `Retry-After`。
 *
 * ```rust,ignore
 * web::resource("/login")
 *     .wrap(RateLimit::login())
 *     .route(web::post().to(login))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::config::AppConfig;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};

// 窗口序号已编入键中，过期时间只需覆盖最长窗口 (900 秒)
static RATE_LIMIT_COUNTERS: Lazy<Cache<String, u32>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(15 * 60))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    key_prefix: &'static str,
}

impl RateLimit {
    pub fn new(key_prefix: &'static str, max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs: window_secs.max(1),
            key_prefix,
        }
    }

    /// 登录：按 IP 计数
    pub fn login() -> Self {
        let config = &AppConfig::get().rate_limit;
        Self::new("login", config.login, config.window_secs)
    }

    /// 刷新令牌：按 IP 计数
    pub fn refresh_token() -> Self {
        let config = &AppConfig::get().rate_limit;
        Self::new("refresh", config.refresh, config.window_secs)
    }

    /// PDF 报表：按账号计数
    pub fn reports() -> Self {
        let config = &AppConfig::get().rate_limit;
        Self::new("reports", config.reports, config.window_secs)
    }

    fn counter_key(&self, identifier: &str, now_secs: u64) -> String {
        format!(
            "{}:{}:{}",
            self.key_prefix,
            identifier,
            now_secs / self.window_secs
        )
    }

    // 当前窗口剩余秒数
    fn retry_after(&self, now_secs: u64) -> u64 {
        self.window_secs - now_secs % self.window_secs
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

// 反向代理部署时依赖代理正确设置 X-Forwarded-For
fn client_identifier(req: &ServiceRequest) -> String {
    if let Some(user) = req.extensions().get::<User>() {
        return format!("user:{}", user.id);
    }

    let forwarded = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| ip.parse::<IpAddr>().is_ok())
        .map(str::to_string);

    let ip = forwarded
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string());
    format!("ip:{ip}")
}

fn too_many_requests(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "请求过于频繁，请稍后再试",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
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
        let limit = self.limit.clone();

        Box::pin(async move {
            let now = unix_now();
            let key = limit.counter_key(&client_identifier(&req), now);

            let entry = RATE_LIMIT_COUNTERS
                .entry(key.clone())
                .and_upsert_with(|current| {
                    let count = current.map(|e| *e.value()).unwrap_or(0);
                    std::future::ready(count.saturating_add(1))
                })
                .await;

            if *entry.value() > limit.max_requests {
                warn!(
                    "Rate limit exceeded for key: {} ({}/{})",
                    key,
                    entry.value(),
                    limit.max_requests
                );
                return Ok(req.into_response(
                    too_many_requests(limit.retry_after(now)).map_into_right_body(),
                ));
            }

            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test, web};

    #[::core::prelude::v1::test]
    fn test_rate_limit_presets() {
        let login = RateLimit::login();
        assert_eq!(login.max_requests, 5);
        assert_eq!(login.window_secs, 60);
        assert_eq!(login.key_prefix, "login");

        assert_eq!(RateLimit::refresh_token().max_requests, 10);
        assert_eq!(RateLimit::reports().key_prefix, "reports");
    }

    #[::core::prelude::v1::test]
    fn test_counter_key_rolls_over_with_window() {
        let limit = RateLimit::new("t", 1, 60);
        assert_eq!(limit.counter_key("ip:1.2.3.4", 119), "t:ip:1.2.3.4:1");
        assert_eq!(limit.counter_key("ip:1.2.3.4", 120), "t:ip:1.2.3.4:2");
        assert_eq!(limit.retry_after(125), 55);
    }

    #[actix_web::test]
    async fn test_requests_over_limit_are_rejected() {
        let app = test::init_service(
            App::new().service(
                web::resource("/limited")
                    .wrap(RateLimit::new("test_limited", 2, 3600))
                    .route(web::post().to(HttpResponse::Ok)),
            ),
        )
        .await;

        let ip = ("X-Forwarded-For", "203.0.113.77");
        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/limited")
                .insert_header(ip)
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = test::TestRequest::post()
            .uri("/limited")
            .insert_header(ip)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key("Retry-After"));
    }
}
