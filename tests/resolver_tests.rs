//! Resolution against the action table of a sealed controller

use actionwire::controller::ActionName;
use actionwire::resolver::{resolve, ResolvedBy};
use http::Method;

mod common;
use common::fixtures::{new_log, widgets_controller};

fn segs(s: &[&str]) -> Vec<String> {
    s.iter().map(|s| s.to_string()).collect()
}

#[test]
fn get_without_segments_is_always_index() {
    let descriptor = widgets_controller(&new_log(), &[]);
    let r = resolve(&Method::GET, &[], descriptor.actions(), None).unwrap();
    assert_eq!(r.action, ActionName::index());
    assert_eq!(r.identifier, None);
    assert_eq!(r.source, ResolvedBy::Verb);
}

#[test]
fn single_segment_get_is_object_with_identifier_unchanged() {
    let descriptor = widgets_controller(&new_log(), &[]);
    for id in ["42", "0", "a b", "UPPER", "ünïcode", "42.json", "-1"] {
        let r = resolve(&Method::GET, &segs(&[id]), descriptor.actions(), None).unwrap();
        assert_eq!(r.action, ActionName::object(), "id {id}");
        assert_eq!(r.identifier.as_deref(), Some(id));
    }
}

#[test]
fn declared_explicit_names_win_over_verb_defaults() {
    let descriptor = widgets_controller(&new_log(), &[]);
    // `search` is a single segment a verb default could also take
    for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE] {
        let r = resolve(&method, &segs(&["search"]), descriptor.actions(), None).unwrap();
        assert_eq!(r.action, ActionName::explicit("search"));
        assert_eq!(r.source, ResolvedBy::Explicit);
    }
}

#[test]
fn custom_answer_wins_regardless_of_verb() {
    let descriptor = widgets_controller(&new_log(), &[]);
    for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE] {
        let r = resolve(
            &method,
            &segs(&["search", "7", "more"]),
            descriptor.actions(),
            Some(ActionName::update()),
        )
        .unwrap();
        assert_eq!(r.action, ActionName::update());
        assert_eq!(r.identifier.as_deref(), Some("7"));
        assert_eq!(r.rest, segs(&["7", "more"]));
        assert_eq!(r.source, ResolvedBy::Custom);
    }
}

#[test]
fn names_are_never_substituted() {
    let descriptor = widgets_controller(&new_log(), &[]);
    let err = resolve(
        &Method::GET,
        &segs(&["x"]),
        descriptor.actions(),
        Some(ActionName::new("missingAction")),
    )
    .unwrap_err();
    assert_eq!(err.status(), 404);

    let err = resolve(&Method::GET, &segs(&["nope", "1"]), descriptor.actions(), None).unwrap_err();
    assert_eq!(err.kind(), "NotFound");
}
