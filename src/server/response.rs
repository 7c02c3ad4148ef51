use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use http::StatusCode;
use may_minihttp::Response as HttpResponse;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use tracing::warn;

use crate::ids::REQUEST_ID_HEADER;
use crate::response::Response;

/// Distinct header lines kept for the life of the process.
pub(crate) const MAX_INTERNED_HEADER_LINES: usize = 4096;

/// `may_minihttp` only takes `&'static str` header lines, so every line
/// written must be leaked. Lines are leaked once and reused; the set is
/// capped so per-request values cannot grow it without bound.
pub(crate) struct HeaderLines {
    lines: DashMap<String, &'static str>,
    leaked: AtomicUsize,
    cap: usize,
}

impl HeaderLines {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        Self {
            lines: DashMap::new(),
            leaked: AtomicUsize::new(0),
            cap,
        }
    }

    /// The interned form of `line`, or `None` once the cap is reached and
    /// `line` has not been seen before.
    pub(crate) fn intern(&self, line: &str) -> Option<&'static str> {
        if let Some(hit) = self.lines.get(line) {
            return Some(*hit);
        }
        match self.lines.entry(line.to_string()) {
            Entry::Occupied(hit) => Some(*hit.get()),
            Entry::Vacant(slot) => {
                if self.leaked.fetch_add(1, Ordering::Relaxed) >= self.cap {
                    self.leaked.fetch_sub(1, Ordering::Relaxed);
                    return None;
                }
                let leaked: &'static str = Box::leak(line.to_string().into_boxed_str());
                slot.insert(leaked);
                Some(leaked)
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.leaked.load(Ordering::Relaxed)
    }
}

fn header_lines() -> &'static HeaderLines {
    static LINES: OnceLock<HeaderLines> = OnceLock::new();
    LINES.get_or_init(|| HeaderLines::with_capacity(MAX_INTERNED_HEADER_LINES))
}

pub(crate) fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or(match status {
            499 => "Client Closed Request",
            _ => "Unknown",
        })
}

/// Copy a pipeline response onto the wire.
///
/// `x-request-id` is unique per request and is never written back. Once the
/// interned line set is full, header lines not seen before are dropped with
/// a warning rather than leaked.
pub fn write_response(res: &mut HttpResponse, response: Response) {
    write_with(res, response, header_lines());
}

fn write_with(res: &mut HttpResponse, response: Response, lines: &HeaderLines) {
    res.status_code(response.status as usize, status_reason(response.status));
    for (name, value) in &response.headers {
        if name.eq_ignore_ascii_case(REQUEST_ID_HEADER) {
            continue;
        }
        match lines.intern(&format!("{name}: {value}")) {
            Some(line) => {
                res.header(line);
            }
            None => warn!(
                header = %name,
                cap = MAX_INTERNED_HEADER_LINES,
                "Header line cache full; header dropped"
            ),
        }
    }
    res.body_vec(response.body.to_bytes());
}

pub fn write_json_error(res: &mut HttpResponse, status: u16, message: &str) {
    write_response(res, Response::error(status, message));
}
