use std::sync::{Arc, Mutex};

use waypoint::{
    BoxError, Context, GroupOptions, IntoReply, Method, Next, Reply, Request, Response, Router,
    StatusCode, middleware,
};

type Log = Arc<Mutex<Vec<String>>>;

fn record(log: &Log, label: &'static str) -> impl waypoint::Middleware {
    let log = Arc::clone(log);
    move |ctx: Context, next: Next| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push(format!("{label}-before"));
            let out = next.run(ctx).await;
            log.lock().unwrap().push(format!("{label}-after"));
            out
        }
    }
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

async fn get(router: &Router, uri: &str) -> Response {
    router.dispatch(Request::new(Method::Get, uri)).await
}

#[tokio::test]
async fn global_then_group_then_route() {
    let log = Log::default();
    let mut app = Router::new();
    app.use_middleware(record(&log, "global"));
    app.group(GroupOptions::new("/g").middleware(record(&log, "group")), |g| {
        let handler_log = Arc::clone(&log);
        g.get("/x", move |_ctx: Context| {
            let log = Arc::clone(&handler_log);
            async move {
                log.lock().unwrap().push("handler".into());
                "x"
            }
        })?
        .middleware(record(&log, "route"));
        Ok(())
    })
    .unwrap();

    let res = get(&app, "/g/x").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(
        entries(&log),
        [
            "global-before",
            "group-before",
            "route-before",
            "handler",
            "route-after",
            "group-after",
            "global-after",
        ]
    );
}

#[tokio::test]
async fn short_circuit_skips_handler_and_later_middleware() {
    let log = Log::default();
    let mut app = Router::new();
    app.use_middleware(record(&log, "a"));
    app.use_middleware(|ctx: Context, next: Next| async move {
        if ctx.header("authorization").is_none() {
            return StatusCode::UNAUTHORIZED.into_reply();
        }
        next.run(ctx).await
    });
    app.use_middleware(record(&log, "c"));
    app.get("/secret", |_ctx: Context| async { "secret" }).unwrap();

    let res = get(&app, "/secret").await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(entries(&log), ["a-before", "a-after"]);

    log.lock().unwrap().clear();
    let req = Request::new(Method::Get, "/secret")
        .with_header(http::header::AUTHORIZATION, http::HeaderValue::from_static("Bearer t"));
    let res = app.dispatch(req).await;
    assert_eq!(res.body(), b"secret");
    assert_eq!(entries(&log), ["a-before", "c-before", "c-after", "a-after"]);
}

#[tokio::test]
async fn middleware_added_later_applies_to_earlier_routes() {
    let log = Log::default();
    let mut app = Router::new();
    app.use_middleware(record(&log, "first"));
    app.get("/r", |_ctx: Context| async { "r" }).unwrap();

    get(&app, "/r").await;
    assert_eq!(entries(&log), ["first-before", "first-after"]);

    app.use_middleware(record(&log, "second"));
    log.lock().unwrap().clear();
    get(&app, "/r").await;
    assert_eq!(
        entries(&log),
        ["first-before", "second-before", "second-after", "first-after"]
    );
}

#[tokio::test]
async fn middleware_can_rewrite_the_response() {
    let mut app = Router::new();
    app.use_middleware(|ctx: Context, next: Next| async move {
        let reply = next.run(ctx).await?;
        let mut res = reply.into_response();
        res = Response::builder()
            .status(res.status_code())
            .header("x-wrapped", "yes")
            .bytes(waypoint::ContentType::Text, res.body().to_vec());
        Ok::<_, BoxError>(Reply::Response(res))
    });
    app.get("/", |_ctx: Context| async { "inner" }).unwrap();

    let res = get(&app, "/").await;
    assert_eq!(res.header("x-wrapped"), Some("yes"));
    assert_eq!(res.body(), b"inner");
}

#[tokio::test]
async fn locals_are_shared_along_the_chain() {
    let mut app = Router::new();
    app.use_middleware(|mut ctx: Context, next: Next| async move {
        ctx.locals_mut().insert("user_id", 99_u64);
        next.run(ctx).await
    });
    app.get("/me", |ctx: Context| async move {
        ctx.locals().get::<u64>("user_id").copied()
    })
    .unwrap();

    assert_eq!(get(&app, "/me").await.body(), b"99");
}

#[tokio::test]
async fn handler_failure_becomes_500() {
    let mut app = Router::new();
    app.get("/boom", |_ctx: Context| async { Err::<&str, _>("database unavailable") })
        .unwrap();

    let res = get(&app, "/boom").await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body(), br#"{"error":"Internal Server Error"}"#);
}

#[tokio::test]
async fn middleware_failure_skips_handler() {
    let handled = Arc::new(Mutex::new(false));
    let mut app = Router::new();
    app.use_middleware(|_ctx: Context, _next: Next| async {
        Err::<Reply, BoxError>("rejected".into())
    });
    let flag = Arc::clone(&handled);
    app.get("/", move |_ctx: Context| {
        let flag = Arc::clone(&flag);
        async move {
            *flag.lock().unwrap() = true;
            "unreachable"
        }
    })
    .unwrap();

    assert_eq!(get(&app, "/").await.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!*handled.lock().unwrap());
}

#[tokio::test]
async fn outer_middleware_may_recover() {
    let mut app = Router::new();
    app.use_middleware(|ctx: Context, next: Next| async move {
        match next.run(ctx).await {
            Ok(reply) => Ok::<_, BoxError>(reply),
            Err(err) => Ok(Reply::Response(
                Response::builder()
                    .status(StatusCode::SERVICE_UNAVAILABLE)
                    .text(err.to_string()),
            )),
        }
    });
    app.get("/flaky", |_ctx: Context| async { Err::<(), _>("try later") }).unwrap();

    let res = get(&app, "/flaky").await;
    assert_eq!(res.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.body(), b"try later");
}

#[tokio::test]
async fn custom_collaborators_replace_defaults() {
    let mut app = Router::new();
    app.get("/only-get", |_ctx: Context| async { "ok" }).unwrap();
    app.get("/fail", |_ctx: Context| async { Err::<(), _>("kaput") }).unwrap();
    app.on_not_found(|ctx: Context| async move {
        Response::builder()
            .status(StatusCode::NOT_FOUND)
            .text(format!("no page at {}", ctx.path()))
    });
    app.on_method_not_allowed(|_ctx: Context, allowed: Vec<Method>| async move {
        Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .text(format!("try {}", allowed.len()))
    });
    app.on_error(|_ctx: Context, err: BoxError| async move {
        Response::builder()
            .status(StatusCode::BAD_GATEWAY)
            .text(format!("caught {err}"))
    });

    let res = get(&app, "/nowhere").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(res.body(), b"no page at /nowhere");

    let res = app.dispatch(Request::new(Method::Post, "/only-get")).await;
    assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.body(), b"try 1");
    assert_eq!(res.header("allow"), Some("GET"));

    let res = get(&app, "/fail").await;
    assert_eq!(res.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.body(), b"caught kaput");
}

#[tokio::test]
async fn failing_error_handler_falls_back_to_default() {
    let mut app = Router::new();
    app.get("/fail", |_ctx: Context| async { Err::<(), _>("first") }).unwrap();
    app.on_error(|_ctx: Context, _err: BoxError| async { Err::<(), _>("second") });

    let res = get(&app, "/fail").await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body(), br#"{"error":"Internal Server Error"}"#);
}

#[tokio::test]
async fn trace_middleware_is_transparent() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut app = Router::new();
    app.use_middleware(middleware::trace());
    app.get("/t", |_ctx: Context| async { "traced" }).unwrap();
    app.get("/t-fail", |_ctx: Context| async { Err::<(), _>("nope") }).unwrap();

    assert_eq!(get(&app, "/t").await.body(), b"traced");
    assert_eq!(
        get(&app, "/t-fail").await.status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn suspended_requests_stay_isolated_and_nested() {
    let log = Log::default();
    let mut app = Router::new();

    let mw_log = Arc::clone(&log);
    app.use_middleware(move |mut ctx: Context, next: Next| {
        let log = Arc::clone(&mw_log);
        async move {
            let id = ctx.param("id").unwrap_or_default().to_owned();
            ctx.locals_mut().insert("request_id", id.clone());
            log.lock().unwrap().push(format!("{id}:before"));
            tokio::task::yield_now().await;
            let out = next.run(ctx).await;
            tokio::task::yield_now().await;
            log.lock().unwrap().push(format!("{id}:after"));
            out
        }
    });

    let handler_log = Arc::clone(&log);
    app.get("/jobs/:id", move |ctx: Context| {
        let log = Arc::clone(&handler_log);
        async move {
            let id = ctx.param("id").unwrap_or_default().to_owned();
            tokio::task::yield_now().await;
            log.lock().unwrap().push(format!("{id}:handler"));
            let seen = ctx.locals().get::<String>("request_id").cloned().unwrap_or_default();
            format!("{id} saw {seen}")
        }
    })
    .unwrap();

    let (a, b) = tokio::join!(
        app.dispatch(Request::new(Method::Get, "/jobs/a")),
        app.dispatch(Request::new(Method::Get, "/jobs/b")),
    );
    assert_eq!(a.body(), b"a saw a");
    assert_eq!(b.body(), b"b saw b");

    let trace = entries(&log);
    assert_eq!(trace.len(), 6);
    for id in ["a", "b"] {
        let own: Vec<&str> = trace
            .iter()
            .filter(|e| e.starts_with(&format!("{id}:")))
            .map(String::as_str)
            .collect();
        assert_eq!(own, [format!("{id}:before"), format!("{id}:handler"), format!("{id}:after")]);
    }
    // Both requests were suspended at the same time.
    let first_after = trace.iter().position(|e| e.ends_with(":after")).unwrap();
    assert_eq!(trace[..first_after].iter().filter(|e| e.ends_with(":before")).count(), 2);
}
