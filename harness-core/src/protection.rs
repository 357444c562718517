//! Protected-path resolution and layer advice
//!
//! Protection is first-match over the configured prefix list, so the order
//! of `protected_paths.paths` decides precedence. Layer advice is purely
//! informational and never blocks.

use serde::Serialize;

use crate::config::ArchRules;

/// Outcome of checking one project-relative path
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathDecision {
    pub blocked: bool,
    pub matched_prefix: Option<String>,
    /// Inside a protected zone, but covered by an exception
    pub is_allowed: bool,
}

impl PathDecision {
    pub fn unprotected() -> Self {
        Self::default()
    }
}

/// `path` starts with `prefix`, or equals it without a trailing slash
fn prefix_matches(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    path.starts_with(prefix) || path == prefix.trim_end_matches('/')
}

/// Decide whether a project-relative path may be written
pub fn is_protected(rel_path: &str, rules: &ArchRules) -> PathDecision {
    let Some(prefix) = rules
        .protected_paths
        .paths
        .iter()
        .find(|p| prefix_matches(rel_path, p))
    else {
        return PathDecision::unprotected();
    };

    let allowed = rules
        .exceptions
        .allowed_core_edits
        .iter()
        .any(|e| prefix_matches(rel_path, e));

    PathDecision {
        blocked: !allowed,
        matched_prefix: Some(prefix.clone()),
        is_allowed: allowed,
    }
}

/// Import guidance for a file under `src/<layer>/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerAdvice {
    pub layer: String,
    pub may_import: Vec<String>,
    pub forbidden: Vec<String>,
}

impl LayerAdvice {
    pub fn render(&self) -> String {
        let list = |layers: &[String]| {
            if layers.is_empty() {
                "(none)".to_string()
            } else {
                layers.join(", ")
            }
        };
        format!(
            "Layer `{}`: may import from {}; must not import from {}",
            self.layer,
            list(&self.may_import),
            list(&self.forbidden)
        )
    }
}

/// Layer advice for `rel_path`, if it lies under a known `src/<layer>/`
pub fn layer_advice(rel_path: &str, rules: &ArchRules) -> Option<LayerAdvice> {
    let mut parts = rel_path.split('/');
    if parts.next()? != "src" {
        return None;
    }
    let layer = parts.next()?;
    // `src/types.ts` is a file, not a layer directory
    parts.next()?;

    let order = &rules.layers.order;
    let index = order.iter().position(|l| l == layer)?;

    let cross_allowed: Vec<&str> = rules
        .exceptions
        .allowed_cross_layer
        .iter()
        .filter_map(|entry| {
            let (from, to) = entry.split_once("->")?;
            (from.trim() == layer).then_some(to.trim())
        })
        .collect();

    let mut may_import: Vec<String> = order[..index].to_vec();
    let mut forbidden = Vec::new();
    for later in &order[index + 1..] {
        if cross_allowed.contains(&later.as_str()) {
            may_import.push(later.clone());
        } else {
            forbidden.push(later.clone());
        }
    }

    Some(LayerAdvice {
        layer: layer.to_string(),
        may_import,
        forbidden,
    })
}
