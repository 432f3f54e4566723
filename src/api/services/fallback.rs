use actix_web::HttpResponse;
use actix_web::http::StatusCode;

/// 未匹配路由的响应
///
/// 归因中间件已经运行过，响应可能带 Set-Cookie，不允许缓存。
pub async fn not_found() -> HttpResponse {
    HttpResponse::build(StatusCode::NOT_FOUND)
        .insert_header(("Content-Type", "text/html; charset=utf-8"))
        .insert_header(("Cache-Control", "no-store"))
        .body("Not Found")
}
