//! A small cat registry pipeline, driven with synthetic requests.
//!
//! Run with:
//!
//! ```sh
//! RUST_LOG=info cargo run --example cats
//! ```

use std::sync::Arc;

use relay::{
    from_middleware, HandlerEntry, LoggerMiddleware, Request, Response, Router, Server, StatusCode,
};

#[tokio::main]
async fn main() -> Result<(), relay::DispatchError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut router = Router::new();

    router.register(
        "GET",
        "/cats",
        HandlerEntry::terminal(|_req, resp: Response| async move {
            let resp = resp
                .with_json(&["Molly", "Oscar", "Pixel"])
                .expect("static payload serializes");
            Ok(resp)
        }),
    );

    router.register(
        "GET,DELETE",
        "/cats/{id}",
        HandlerEntry::terminal(|req: Request, resp: Response| async move {
            let id = req.attribute("id").unwrap_or("unknown").to_owned();
            Ok(resp.with_body(format!("cat #{id}")))
        }),
    );

    router.register(
        "GET",
        "/archive/*",
        HandlerEntry::terminal(|req: Request, resp: Response| async move {
            Ok(resp.with_body(format!("archived page {}", req.path())))
        }),
    );

    let server = Server::new()
        .add(from_middleware(Arc::new(LoggerMiddleware)))
        .add(HandlerEntry::handler(|req, resp, next: relay::Next| async move {
            let resp = next.run(req, resp).await?;
            Ok(resp.with_header("X-Powered-By", "relay"))
        }))
        .add(from_middleware(Arc::new(router)));

    for (method, target) in [
        ("GET", "/cats"),
        ("GET", "/cats/42"),
        ("DELETE", "/cats/42"),
        ("PUT", "/cats/42"),
        ("GET", "/archive/2019/summer"),
        ("GET", "/dogs"),
    ] {
        let response = server.respond(Request::new(method, target)).await?;
        let body = String::from_utf8_lossy(response.body().as_ref()).into_owned();
        println!("{method} {target} -> {} {body}", response.status());
        if response.status() == StatusCode::MethodNotAllowed {
            println!("  Allow: {}", response.headers().get("Allow").unwrap_or(""));
        }
    }

    Ok(())
}
