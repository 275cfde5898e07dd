use std::fmt;

use crate::http::Request;
use crate::routing::PathState;

use super::Filter;

/// One `/`-separated piece of a path pattern.
trait PathWisp: Send + Sync + 'static + fmt::Debug {
    fn detect(&self, state: &mut PathState) -> bool;
}

#[derive(Debug, Eq, PartialEq, Clone)]
enum Piece {
    Const(String),
    Named(String),
}

/// Matches a whole segment made of constants and `<name>` captures, such as
/// `users`, `<id>` or `<id>.<format>`.
///
/// A trailing `.<name>` is optional: `<id>.<format>` matches both `12.json`
/// and `12`, `users.<format>` matches `users`. The name is left unset then.
#[derive(Debug, Eq, PartialEq)]
struct SegmentWisp(Vec<Piece>);

impl SegmentWisp {
    /// Pieces matching the segment without its trailing `.<name>`, if it has one.
    fn without_ext(&self) -> Option<Vec<Piece>> {
        let len = self.0.len();
        if len < 2 || !matches!(&self.0[len - 1], Piece::Named(_)) {
            return None;
        }
        let dot = match &self.0[len - 2] {
            Piece::Const(c) if c.ends_with('.') => c,
            _ => return None,
        };
        let mut pieces = self.0[..len - 2].to_vec();
        if dot.len() > 1 {
            pieces.push(Piece::Const(dot[..dot.len() - 1].to_owned()));
        }
        Some(pieces)
    }
    fn capture(pieces: &[Piece], picked: &str, rfind_last_const: bool) -> Option<Vec<(String, String)>> {
        let mut captures = Vec::new();
        let mut rest = picked;
        for (i, piece) in pieces.iter().enumerate() {
            match piece {
                Piece::Const(c) => {
                    rest = rest.strip_prefix(c.as_str())?;
                }
                Piece::Named(name) => {
                    let end = match pieces.get(i + 1) {
                        Some(Piece::Const(next)) => {
                            if rfind_last_const && i + 2 == pieces.len() - 1 {
                                rest.rfind(next.as_str())?
                            } else {
                                rest.find(next.as_str())?
                            }
                        }
                        _ => rest.len(),
                    };
                    if end == 0 {
                        return None;
                    }
                    captures.push((name.clone(), rest[..end].to_owned()));
                    rest = &rest[end..];
                }
            }
        }
        if rest.is_empty() {
            Some(captures)
        } else {
            None
        }
    }
}

impl PathWisp for SegmentWisp {
    fn detect(&self, state: &mut PathState) -> bool {
        let picked = match state.pick() {
            Some(picked) => picked.to_owned(),
            None => return false,
        };
        let without_ext = self.without_ext();
        let captures = SegmentWisp::capture(&self.0, &picked, without_ext.is_some())
            .or_else(|| SegmentWisp::capture(without_ext.as_deref()?, &picked, false));
        match captures {
            Some(captures) => {
                state.forward(picked.len());
                for (name, value) in captures {
                    state.params.insert(name, value);
                }
                true
            }
            None => false,
        }
    }
}

/// `<*name>` captures the non-empty rest of the path, `<**name>` also matches
/// an empty rest.
#[derive(Debug, Eq, PartialEq)]
struct RestWisp(String);

impl PathWisp for RestWisp {
    fn detect(&self, state: &mut PathState) -> bool {
        let rest = state.all_rest().unwrap_or_default().to_string();
        if !rest.is_empty() || self.0.starts_with("**") {
            let name = self.0.trim_start_matches('*').to_owned();
            state.params.insert(name, rest);
            state.cursor = (state.parts.len(), 0);
            true
        } else {
            false
        }
    }
}

fn parse_segment(segment: &str) -> Result<Box<dyn PathWisp>, String> {
    if let Some(name) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        if name.starts_with('*') {
            if name.trim_start_matches('*').is_empty() {
                return Err(format!("rest segment `{}` has no name", segment));
            }
            return Ok(Box::new(RestWisp(name.to_owned())));
        }
    }
    let mut pieces = Vec::new();
    let mut rest = segment;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('<') {
            let end = after
                .find('>')
                .ok_or_else(|| format!("unclosed `<` in segment `{}`", segment))?;
            let name = &after[..end];
            if name.is_empty() || name.contains('<') || name.starts_with('*') {
                return Err(format!("invalid name `{}` in segment `{}`", name, segment));
            }
            if matches!(pieces.last(), Some(Piece::Named(_))) {
                return Err(format!("two adjacent names in segment `{}`", segment));
            }
            pieces.push(Piece::Named(name.to_owned()));
            rest = &after[end + 1..];
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            let cnst = &rest[..end];
            if cnst.contains('>') {
                return Err(format!("unexpected `>` in segment `{}`", segment));
            }
            pieces.push(Piece::Const(cnst.to_owned()));
            rest = &rest[end..];
        }
    }
    Ok(Box::new(SegmentWisp(pieces)))
}

pub struct PathFilter {
    raw_value: String,
    path_wisps: Vec<Box<dyn PathWisp>>,
}

impl fmt::Debug for PathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "path:{}", &self.raw_value)
    }
}

impl PathFilter {
    /// Builds a path filter, panics when the pattern is malformed.
    pub fn new(value: impl Into<String>) -> Self {
        let raw_value = value.into();
        match PathFilter::try_new(raw_value.clone()) {
            Ok(filter) => filter,
            Err(e) => panic!("{}, raw_value: {}", e, raw_value),
        }
    }
    pub fn try_new(value: impl Into<String>) -> Result<Self, String> {
        let raw_value = value.into();
        let mut path_wisps = Vec::new();
        for segment in raw_value.trim_matches('/').split('/') {
            if segment.is_empty() {
                continue;
            }
            path_wisps.push(parse_segment(segment)?);
        }
        Ok(PathFilter {
            raw_value,
            path_wisps,
        })
    }
}

impl Filter for PathFilter {
    fn filter(&self, _req: &mut Request, state: &mut PathState) -> bool {
        if self.path_wisps.is_empty() {
            return true;
        }
        let original_cursor = state.cursor;
        for wisp in &self.path_wisps {
            if !wisp.detect(state) {
                state.cursor = original_cursor;
                return false;
            }
        }
        true
    }
}
