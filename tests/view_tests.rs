//! View selection and rendering through the dispatcher
//!
//! - convention views (`<Action><Controller>View`) and the default view
//! - init hooks replacing the convention lookup
//! - default, named and disabled layouts
//! - templates loaded from a directory

use std::fs;

use actionwire::template::MiniJinjaStore;
use actionwire::{ConfigError, Dispatcher, Request};
use http::Method;
use serde_json::json;

mod common;
use common::fixtures::{count, get, new_log, widgets_controller, widget_templates, Log};

fn rendering_dispatcher(log: &Log, layout: Option<&str>) -> Dispatcher {
    let mut builder = Dispatcher::builder()
        .templates(widget_templates())
        .mount("/widgets", widgets_controller(log, &[]));
    if let Some(layout) = layout {
        builder = builder.default_layout(layout);
    }
    builder.build().unwrap()
}

#[test]
fn convention_view_renders_action_data() {
    let log = new_log();
    let dispatcher = rendering_dispatcher(&log, None);

    let res = dispatcher.dispatch(get("/widgets"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body.to_text(), "<ul>0</ul>");
    assert!(res.content_type().unwrap_or_default().starts_with("text/html"));

    let res = dispatcher.dispatch(get("/widgets/42"));
    assert_eq!(res.body.to_text(), "<p>42</p>");
}

#[test]
fn init_hook_replaces_convention_lookup() {
    let log = new_log();
    let dispatcher = rendering_dispatcher(&log, None);

    // SearchWidgetsView exists but the init hook picks SearchResultsView
    let res = dispatcher.dispatch(get("/widgets/search/blue/large"));
    assert_eq!(res.body.to_text(), "<s>blue/large</s>");
    assert_eq!(count(&log, "initSearchAction"), 1);
}

#[test]
fn default_layout_wraps_every_view() {
    let log = new_log();
    let dispatcher = rendering_dispatcher(&log, Some("SiteLayout"));

    let res = dispatcher.dispatch(get("/widgets/7"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body.to_text(), "<body><p>7</p></body>");
}

#[test]
fn layout_can_be_disabled_or_named_per_request() {
    let log = new_log();
    let dispatcher = rendering_dispatcher(&log, Some("SiteLayout"));

    let req = Request::builder(Method::GET, "/widgets/7").param("layout", "none").build();
    assert_eq!(dispatcher.dispatch(req).body.to_text(), "<p>7</p>");

    let req = Request::builder(Method::GET, "/widgets/7").param("layout", "PlainLayout").build();
    assert_eq!(dispatcher.dispatch(req).body.to_text(), "[<p>7</p>]");
}

#[test]
fn unknown_layout_is_configuration_error() {
    let log = new_log();
    let dispatcher = rendering_dispatcher(&log, None);

    let req = Request::builder(Method::GET, "/widgets/7").param("layout", "Gone").build();
    let res = dispatcher.dispatch(req);
    assert_eq!(res.status, 500);
    assert_eq!(
        res.json_body().and_then(|b| b.get("error")),
        Some(&json!("ConfigurationError"))
    );
}

#[test]
fn unregistered_default_layout_fails_build() {
    let log = new_log();
    let err = Dispatcher::builder()
        .templates(widget_templates())
        .default_layout("NoSuchLayout")
        .mount("/widgets", widgets_controller(&log, &[]))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ConfigError::UnknownView(name) if name == "NoSuchLayout"));
}

#[test]
fn pre_process_can_select_the_view() {
    let log = new_log();
    let dispatcher = rendering_dispatcher(&log, None);

    let req = Request::builder(Method::GET, "/widgets/search/x")
        .param("view", "OtherView")
        .build();
    // the init hook runs after pre_process_request and wins
    assert_eq!(dispatcher.dispatch(req).body.to_text(), "<s>x</s>");

    let req = Request::builder(Method::GET, "/widgets/7").param("view", "OtherView").build();
    assert_eq!(dispatcher.dispatch(req).body.to_text(), "<o></o>");
}

#[test]
fn view_changed_by_the_action_is_honoured() {
    let log = new_log();
    let dispatcher = rendering_dispatcher(&log, None);

    let res = dispatcher.dispatch(get("/widgets/reroute"));
    assert_eq!(res.body.to_text(), "<o>late</o>");
}

#[test]
fn default_view_json_is_nested_once_in_layout() {
    let log = new_log();
    let dispatcher = Dispatcher::builder()
        .templates(MiniJinjaStore::from_sources([("SiteLayout", "<body>{{ content }}</body>")]))
        .default_layout("SiteLayout")
        .mount("/widgets", widgets_controller(&log, &[]))
        .build()
        .unwrap();

    let res = dispatcher.dispatch(get("/widgets"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body.to_text(), r#"<body>{"items":[]}</body>"#);
    assert_eq!(count(&log, "index"), 1);
}

#[test]
fn default_view_template_is_used_when_present() {
    let log = new_log();
    let dispatcher = Dispatcher::builder()
        .templates(MiniJinjaStore::from_sources([("DefaultView", "default:{{ id }}")]))
        .mount("/widgets", widgets_controller(&log, &[]))
        .build()
        .unwrap();

    assert_eq!(dispatcher.dispatch(get("/widgets/3")).body.to_text(), "default:3");
}

#[test]
fn templates_load_from_a_directory_with_escaping() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("ObjectWidgetsView.html"), "<p>{{ id }}</p>").unwrap();
    fs::write(dir.path().join("SiteLayout.html"), "<main>{{ content|safe }}</main>").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let store = MiniJinjaStore::from_dir(dir.path(), "html").unwrap();
    assert_eq!(store.len(), 2);

    let log = new_log();
    let dispatcher = Dispatcher::builder()
        .templates(store)
        .default_layout("SiteLayout")
        .mount("/widgets", widgets_controller(&log, &[]))
        .build()
        .unwrap();

    let res = dispatcher.dispatch(get("/widgets/%3Cb%3E"));
    assert_eq!(res.body.to_text(), "<main><p>&lt;b&gt;</p></main>");
}
