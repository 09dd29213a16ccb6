//! Minimal waypoint example: JSON endpoints, a group, and named routes.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/api/users/42
//!   curl http://localhost:3000/api/users/abc        # 404, id must be numeric
//!   curl -X DELETE http://localhost:3000/api/users   # 405, Allow: GET, POST
//!   curl -X OPTIONS -i http://localhost:3000/api/users
//!   curl -X POST http://localhost:3000/api/users -H 'authorization: t' -d '{"name":"alice"}'
//!   curl http://localhost:3000/routes

use waypoint::{
    Context, GroupOptions, IntoReply, Json, Next, Response, Router, Server, StatusCode, middleware,
};

#[tokio::main]
async fn main() -> Result<(), waypoint::Error> {
    tracing_subscriber::fmt::init();

    let mut app = Router::new();
    app.use_middleware(middleware::trace());

    app.group(GroupOptions::new("/api").name("api."), |api| {
        api.get("/users", list_users)?.name("users.index")?;
        api.get("/users/:id", get_user)?.name("users.show")?.where_number("id")?;
        api.post("/users", create_user)?.middleware(require_auth);
        Ok(())
    })?;

    let listing = app.routes();
    app.get("/routes", move |_ctx: Context| {
        let listing = listing.clone();
        async move { Json(listing) }
    })?;

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

async fn require_auth(ctx: Context, next: Next) -> waypoint::Outcome {
    if ctx.header("authorization").is_none() {
        return StatusCode::UNAUTHORIZED.into_reply();
    }
    next.run(ctx).await
}

// GET /api/users?page=2
async fn list_users(ctx: Context) -> Json<serde_json::Value> {
    let page = ctx.query().get("page").unwrap_or("1");
    Json(serde_json::json!({ "page": page, "users": ["alice", "bob"] }))
}

// GET /api/users/:id
async fn get_user(ctx: Context) -> Json<serde_json::Value> {
    let id = ctx.param("id").unwrap_or_default();
    Json(serde_json::json!({ "id": id, "name": "alice" }))
}

// POST /api/users
async fn create_user(ctx: Context) -> Result<Response, waypoint::BoxError> {
    let input: serde_json::Value = serde_json::from_slice(ctx.body())?;
    let name = input["name"].as_str().unwrap_or("anonymous");
    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/api/users/99")
        .json(serde_json::json!({ "id": 99, "name": name }).to_string().into_bytes()))
}
