use super::*;
use crate::session::MemorySessionStore;
use crate::test_support;

const SESSION: &str = "session-1";

async fn controller(access_check: bool) -> (PageController, Arc<MemorySessionStore>) {
    let sessions = Arc::new(MemorySessionStore::new());
    let controller = PageController::new(
        Arc::new(test_support::engine().await),
        sessions.clone(),
        ControllerSettings {
            access_check,
            slice_budget: Duration::from_millis(1000),
        },
    );
    (controller, sessions)
}

fn request(op: &str, method: Method, form: &[(&str, &str)]) -> PageRequest {
    let query: HashMap<String, String> = [("op".to_string(), op.to_string())].into();
    PageRequest::from_params(
        method,
        true,
        &query,
        form.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

fn body(response: &PageResponse) -> &str {
    match response {
        PageResponse::Html { body, .. } | PageResponse::Text { body, .. } => body,
    }
}

async fn handle(controller: &PageController, req: &PageRequest) -> PageResponse {
    controller
        .handle(SESSION, req, &RequestTimer::start())
        .await
        .unwrap()
}

#[test]
fn test_op_parse() {
    assert_eq!(Op::parse(None), Op::Info);
    assert_eq!(Op::parse(Some("selection")), Op::Selection);
    assert_eq!(Op::parse(Some("Update")), Op::Update);
    assert_eq!(Op::parse(Some("do_update")), Op::DoUpdate);
    assert_eq!(Op::parse(Some("do_update_nojs")), Op::DoUpdateNoJs);
    assert_eq!(Op::parse(Some("finished")), Op::Finished);
    assert_eq!(Op::parse(Some("bogus")), Op::Info);
}

#[test]
fn test_op_from_form_when_query_lacks_it() {
    let req = PageRequest::from_params(
        Method::Post,
        true,
        &HashMap::new(),
        vec![("op".to_string(), "Update".to_string())],
    );
    assert_eq!(req.op, Op::Update);
}

#[test]
fn test_start_versions_and_has_js() {
    let req = request(
        "Update",
        Method::Post,
        &[
            ("start[comment]", "4"),
            ("start[forum]", " 2 "),
            ("start[bad name]", "1"),
            ("start[node]", "x"),
            ("has_js", "1"),
        ],
    );
    let starts = req.start_versions();
    assert_eq!(starts.len(), 2);
    assert_eq!(starts["comment"], 4);
    assert_eq!(starts["forum"], 2);
    assert!(req.has_js());
    assert!(!request("Update", Method::Post, &[("has_js", "0")]).has_js());
    assert!(!request("Update", Method::Post, &[]).has_js());
}

#[tokio::test]
async fn test_access_denied_without_mutation() {
    let (controller, sessions) = controller(true).await;
    let mut req = request("Update", Method::Post, &[("start[comment]", "1")]);
    req.is_admin = false;

    let response = handle(&controller, &req).await;
    assert_eq!(response.status(), 403);
    assert!(body(&response).contains("access_check: false"));
    assert!(sessions.load(SESSION).unwrap().is_none());
    assert_eq!(
        controller.engine.version_store().installed_version("comment").await.unwrap(),
        Some(3)
    );
}

#[tokio::test]
async fn test_access_check_disabled_allows_anyone() {
    let (controller, _) = controller(false).await;
    let mut req = request("selection", Method::Get, &[]);
    req.is_admin = false;

    let response = handle(&controller, &req).await;
    assert_eq!(response.status(), 200);
    assert!(body(&response).contains(r#"<option value="4" selected>4</option>"#));
    assert!(body(&response).contains("No updates available"));
}

#[tokio::test]
async fn test_info_page() {
    let (controller, _) = controller(true).await;
    let response = handle(&controller, &request("", Method::Get, &[])).await;
    assert!(matches!(
        response,
        PageResponse::Html { status: 200, ref title, .. } if title == "Database update"
    ));
}

#[tokio::test]
async fn test_do_update_requires_post() {
    let (controller, sessions) = controller(true).await;
    handle(
        &controller,
        &request("Update", Method::Post, &[("start[comment]", "4"), ("has_js", "1")]),
    )
    .await;
    let before = sessions.load(SESSION).unwrap().unwrap();

    let response = handle(&controller, &request("do_update", Method::Get, &[])).await;
    assert_eq!(response.status(), 405);
    assert!(body(&response).contains("HTTP Post is required."));

    let after = sessions.load(SESSION).unwrap().unwrap();
    assert_eq!(after.remaining, before.remaining);
    assert!(after.results.is_empty());
    assert_eq!(
        controller.engine.version_store().installed_version("comment").await.unwrap(),
        Some(3)
    );
}

#[tokio::test]
async fn test_js_flow() {
    let (controller, sessions) = controller(true).await;

    let response = handle(
        &controller,
        &request("Update", Method::Post, &[("start[comment]", "4"), ("has_js", "1")]),
    )
    .await;
    assert!(matches!(response, PageResponse::Html { refresh: None, .. }));
    assert!(body(&response).contains("/static/update.js"));
    assert_eq!(sessions.load(SESSION).unwrap().unwrap().total, 2);

    let response = handle(&controller, &request("do_update", Method::Post, &[])).await;
    assert_eq!(
        response,
        PageResponse::Text {
            status: 200,
            body: "100|Updating comment module".to_string(),
        }
    );

    let response = handle(&controller, &request("finished", Method::Get, &[])).await;
    let html = body(&response);
    assert!(html.contains("<h3>comment module</h3>"));
    assert!(html.contains("<h4>Update #4</h4>"));
    assert!(html.contains("<h4>Update #5</h4>"));
    assert!(sessions.load(SESSION).unwrap().is_none());

    // A second report is empty
    let response = handle(&controller, &request("finished", Method::Get, &[])).await;
    assert!(!body(&response).contains("update-results"));
}

#[tokio::test]
async fn test_nojs_flow() {
    let (controller, _) = controller(true).await;

    let response = handle(
        &controller,
        &request("Update", Method::Post, &[("start[comment]", "4"), ("has_js", "0")]),
    )
    .await;
    match &response {
        PageResponse::Html { refresh, body, .. } => {
            assert_eq!(refresh.as_deref(), Some(NOJS_PROGRESS_URL));
            assert!(body.contains("Starting updates..."));
        }
        other => panic!("expected html, got {:?}", other),
    }

    // The first page of the no-JS loop is a POST and runs nothing
    let response = handle(&controller, &request("do_update_nojs", Method::Post, &[])).await;
    assert!(body(&response).contains("0%"));
    assert_eq!(
        controller.engine.version_store().installed_version("comment").await.unwrap(),
        Some(3)
    );

    let response = handle(&controller, &request("do_update_nojs", Method::Get, &[])).await;
    match &response {
        PageResponse::Html { refresh, body, .. } => {
            assert_eq!(refresh.as_deref(), Some(FINISHED_URL));
            assert!(body.contains("100%"));
        }
        other => panic!("expected html, got {:?}", other),
    }
}

#[tokio::test]
async fn test_poll_without_run_state_is_complete() {
    let (controller, sessions) = controller(true).await;
    let response = handle(&controller, &request("do_update", Method::Post, &[])).await;
    assert_eq!(body(&response), "100|No pending updates");
    assert!(sessions.load(SESSION).unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_poll_rejected() {
    let (controller, _) = controller(true).await;
    let _held = controller.try_lock_run(SESSION).unwrap().unwrap();

    let response = handle(&controller, &request("do_update", Method::Post, &[])).await;
    assert_eq!(response.status(), 409);

    // Other sessions are unaffected
    let response = controller
        .handle("session-2", &request("do_update", Method::Post, &[]), &RequestTimer::start())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_busy_nojs_poll_keeps_refreshing() {
    let (controller, _) = controller(true).await;
    handle(
        &controller,
        &request("Update", Method::Post, &[("start[comment]", "4")]),
    )
    .await;

    let held = controller.try_lock_run(SESSION).unwrap().unwrap();
    let response = handle(&controller, &request("do_update_nojs", Method::Get, &[])).await;
    match &response {
        PageResponse::Html {
            status,
            refresh,
            body,
            ..
        } => {
            assert_eq!(*status, 409);
            assert_eq!(refresh.as_deref(), Some(NOJS_PROGRESS_URL));
            assert!(body.contains("0%"));
            assert!(body.contains("already running"));
        }
        other => panic!("expected html, got {:?}", other),
    }
    assert_eq!(
        controller.engine.version_store().installed_version("comment").await.unwrap(),
        Some(3)
    );

    drop(held);
    let response = handle(&controller, &request("do_update_nojs", Method::Get, &[])).await;
    assert_eq!(response.status(), 200);
    assert!(body(&response).contains("100%"));
}

#[tokio::test]
async fn test_invalid_session_id() {
    let (controller, _) = controller(true).await;
    let err = controller
        .handle("../x", &request("", Method::Get, &[]), &RequestTimer::start())
        .await
        .unwrap_err();
    assert!(matches!(err, UpdateError::InvalidSessionId(_)));
}
