//! Handler resolution: which action answers a request.
//!
//! Resolution order:
//!
//! 1. the controller's custom hook, given the first segment as the proposed
//!    name
//! 2. an explicit name in the first segment (`/widgets/search/...` →
//!    `searchAction`), when the controller declares it or when more
//!    segments follow than a verb default could consume
//! 3. verb defaults (`index`, `object`, `create`, `update`, `delete`)
//!
//! Whatever name comes out must be declared by the controller; nothing is
//! ever substituted.

use http::Method;

use crate::controller::{ActionName, ActionSet};
use crate::error::DispatchError;

/// Which rule produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    Custom,
    Explicit,
    Verb,
}

/// The action chosen for a request plus the segments it consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub action: ActionName,
    /// `42` in `GET /widgets/42` or `GET /widgets/search/42`
    pub identifier: Option<String>,
    /// Segments after an explicit or custom name
    pub rest: Vec<String>,
    pub source: ResolvedBy,
}

/// Resolve `segments` (already relative to the controller's mount point).
///
/// `custom` is the controller's `action_for_name` answer for the first
/// segment; an empty name counts as no answer.
pub fn resolve(
    method: &Method,
    segments: &[String],
    actions: &impl ActionSet,
    custom: Option<ActionName>,
) -> Result<Resolution, DispatchError> {
    let segments: Vec<&str> = segments
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    let after_first = || -> (Option<String>, Vec<String>) {
        let rest: Vec<String> = segments.iter().skip(1).map(|s| s.to_string()).collect();
        (rest.first().cloned(), rest)
    };

    let resolution = match custom.filter(|name| !name.is_empty()) {
        Some(action) => {
            let (identifier, rest) = after_first();
            Resolution {
                action,
                identifier,
                rest,
                source: ResolvedBy::Custom,
            }
        }
        None => match segments.first() {
            Some(first)
                if actions.declares(&ActionName::explicit(first)) || segments.len() > 1 =>
            {
                let (identifier, rest) = after_first();
                Resolution {
                    action: ActionName::explicit(first),
                    identifier,
                    rest,
                    source: ResolvedBy::Explicit,
                }
            }
            _ => by_verb(method, &segments)?,
        },
    };

    if !actions.declares(&resolution.action) {
        return Err(DispatchError::not_found(format!(
            "action '{}' is not declared",
            resolution.action
        )));
    }
    Ok(resolution)
}

fn by_verb(method: &Method, segments: &[&str]) -> Result<Resolution, DispatchError> {
    let identifier = segments.first().map(|s| s.to_string());
    let action = match (method, segments.len()) {
        (&Method::GET, 0) => ActionName::index(),
        (&Method::GET, 1) => ActionName::object(),
        (&Method::POST, 0) => ActionName::create(),
        (&Method::POST, 1) | (&Method::PUT, 1) => ActionName::update(),
        (&Method::DELETE, 0) | (&Method::DELETE, 1) => ActionName::delete(),
        _ => {
            return Err(DispatchError::not_found(format!(
                "no action for {method} with {} segment(s)",
                segments.len()
            )))
        }
    };
    Ok(Resolution {
        action,
        identifier,
        rest: Vec::new(),
        source: ResolvedBy::Verb,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn table(names: &[ActionName]) -> HashSet<ActionName> {
        names.iter().cloned().collect()
    }

    fn segs(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn verb_defaults() {
        let all = table(&[
            ActionName::index(),
            ActionName::object(),
            ActionName::create(),
            ActionName::update(),
            ActionName::delete(),
        ]);
        let cases = [
            (Method::GET, vec![], ActionName::index()),
            (Method::GET, vec!["42"], ActionName::object()),
            (Method::POST, vec![], ActionName::create()),
            (Method::POST, vec!["42"], ActionName::update()),
            (Method::PUT, vec!["42"], ActionName::update()),
            (Method::DELETE, vec![], ActionName::delete()),
            (Method::DELETE, vec!["42"], ActionName::delete()),
        ];
        for (method, s, expected) in cases {
            let r = resolve(&method, &segs(&s), &all, None).unwrap();
            assert_eq!(r.action, expected, "{method} {s:?}");
            assert_eq!(r.source, ResolvedBy::Verb);
        }
    }

    #[test]
    fn object_identifier_is_passed_unchanged() {
        let t = table(&[ActionName::object()]);
        let r = resolve(&Method::GET, &segs(&["a b%2F"]), &t, None).unwrap();
        assert_eq!(r.identifier.as_deref(), Some("a b%2F"));
    }

    #[test]
    fn unmapped_verbs_are_not_found() {
        let t = table(&[ActionName::index()]);
        assert!(resolve(&Method::PUT, &segs(&[]), &t, None).is_err());
        assert!(resolve(&Method::PATCH, &segs(&["1"]), &t, None).is_err());
    }

    #[test]
    fn declared_explicit_name_beats_verb_default() {
        let t = table(&[ActionName::object(), ActionName::explicit("search")]);
        let r = resolve(&Method::GET, &segs(&["search"]), &t, None).unwrap();
        assert_eq!(r.action.as_str(), "searchAction");
        assert_eq!(r.source, ResolvedBy::Explicit);
        assert!(r.identifier.is_none());
    }

    #[test]
    fn explicit_name_with_identifier_and_rest() {
        let t = table(&[ActionName::explicit("export")]);
        let r = resolve(&Method::GET, &segs(&["export", "7", "csv"]), &t, None).unwrap();
        assert_eq!(r.identifier.as_deref(), Some("7"));
        assert_eq!(r.rest, segs(&["7", "csv"]));
    }

    #[test]
    fn undeclared_explicit_name_with_more_segments_is_not_found() {
        let t = table(&[ActionName::object()]);
        let err = resolve(&Method::GET, &segs(&["frobnicate", "1"]), &t, None).unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn custom_hook_wins_but_must_be_declared() {
        let t = table(&[ActionName::object(), ActionName::explicit("special")]);
        let r = resolve(
            &Method::GET,
            &segs(&["42"]),
            &t,
            Some(ActionName::explicit("special")),
        )
        .unwrap();
        assert_eq!(r.action.as_str(), "specialAction");
        assert_eq!(r.source, ResolvedBy::Custom);

        let err = resolve(&Method::GET, &segs(&["42"]), &t, Some(ActionName::new("ghost"))).unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn empty_custom_answer_is_ignored() {
        let t = table(&[ActionName::object()]);
        let r = resolve(&Method::GET, &segs(&["42"]), &t, Some(ActionName::new(""))).unwrap();
        assert_eq!(r.action, ActionName::object());
    }

    #[test]
    fn resolved_default_must_be_declared() {
        let t = table(&[ActionName::index()]);
        let err = resolve(&Method::DELETE, &segs(&["1"]), &t, None).unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }
}
