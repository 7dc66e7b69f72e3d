use std::collections::{BTreeSet, HashSet};

use serde_json::{Map, Value};

use crate::hints::FieldHintSchema;
use crate::json_path::{is_container, resolve};

pub const DEFAULT_MAX_DEPTH: usize = 10;
pub const DEFAULT_MAX_NODES: usize = 10_000;
/// Share of listing-like elements at which an array counts as a listing list.
pub const DEFAULT_LISTING_ARRAY_RATIO: f64 = 0.35;

/// Container keys searched below an object that is itself a listing.
pub const LIST_HINT_PATHS: &[&str] = &[
    "items",
    "list",
    "result",
    "results",
    "data",
    "payload_json",
    "payload",
    "body",
    "content",
    "contents",
    "listings",
    "articles",
    "articleList",
    "rooms",
    "properties",
    "response",
    "hits",
    "records",
    "result.items",
    "result.list",
    "data.items",
    "data.list",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscoveryLimits {
    pub max_depth: usize,
    pub max_nodes: usize,
    pub listing_array_ratio: f64,
}

impl Default for DiscoveryLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
            listing_array_ratio: DEFAULT_LISTING_ARRAY_RATIO,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Discovery<'a> {
    pub candidates: Vec<&'a Value>,
    pub visited_nodes: usize,
    pub truncated: bool,
}

pub struct Discoverer<'s> {
    listing_keys: BTreeSet<&'s str>,
    limits: DiscoveryLimits,
}

impl<'s> Discoverer<'s> {
    pub fn new(schema: &'s FieldHintSchema, limits: DiscoveryLimits) -> Self {
        Self {
            listing_keys: schema.listing_keys(),
            limits,
        }
    }

    /// An object looks like a listing when it owns at least one hint key.
    pub fn is_listing_like(&self, value: &Value) -> bool {
        match value {
            Value::Object(map) => self.map_is_listing_like(map),
            _ => false,
        }
    }

    fn map_is_listing_like(&self, map: &Map<String, Value>) -> bool {
        map.keys().any(|key| self.listing_keys.contains(key.as_str()))
    }

    pub fn discover<'a>(&self, roots: &[&'a Value]) -> Discovery<'a> {
        let mut walk = Walk {
            out: Discovery::default(),
            visited: HashSet::new(),
            stack: Vec::new(),
            max_nodes: self.limits.max_nodes,
        };
        for root in roots.iter().rev() {
            walk.stack.push((*root, 0));
        }

        while let Some((node, depth)) = walk.stack.pop() {
            if walk.out.visited_nodes >= walk.max_nodes {
                walk.out.truncated = true;
                break;
            }
            if depth > self.limits.max_depth {
                walk.out.truncated = true;
                continue;
            }
            if !is_container(node) || !walk.enter(node) {
                continue;
            }

            match node {
                Value::Object(map) => {
                    if self.map_is_listing_like(map) {
                        walk.out.candidates.push(node);
                        for path in LIST_HINT_PATHS.iter().rev() {
                            if let Some(child) = resolve(node, path)
                                && is_container(child)
                            {
                                walk.stack.push((child, depth + 1));
                            }
                        }
                    } else {
                        for child in map.values().rev().filter(|v| is_container(v)) {
                            walk.stack.push((child, depth + 1));
                        }
                    }
                }
                Value::Array(items) => self.visit_array(&mut walk, items, depth),
                _ => {}
            }
        }

        walk.out
    }

    fn visit_array<'a>(&self, walk: &mut Walk<'a>, items: &'a [Value], depth: usize) {
        let Some(first) = items.first() else {
            return;
        };

        if self.is_listing_like(first) {
            for item in items.iter().filter(|item| item.is_object()) {
                if !walk.emit(item) {
                    return;
                }
            }
            return;
        }

        let like = items.iter().filter(|item| self.is_listing_like(item)).count();
        if like > 0 && (like as f64) / (items.len() as f64) >= self.limits.listing_array_ratio {
            for item in items.iter().filter(|item| self.is_listing_like(item)) {
                if !walk.emit(item) {
                    return;
                }
            }
            return;
        }

        for item in items.iter().rev().filter(|item| is_container(item)) {
            walk.stack.push((item, depth + 1));
        }
    }
}

struct Walk<'a> {
    out: Discovery<'a>,
    visited: HashSet<*const Value>,
    stack: Vec<(&'a Value, usize)>,
    max_nodes: usize,
}

impl<'a> Walk<'a> {
    /// Mark a node visited and charge the budget. `false` if already seen.
    fn enter(&mut self, node: &'a Value) -> bool {
        if !self.visited.insert(node as *const Value) {
            return false;
        }
        self.out.visited_nodes += 1;
        true
    }

    /// Emit an array element directly. `false` once the budget is spent.
    fn emit(&mut self, node: &'a Value) -> bool {
        if self.out.visited_nodes >= self.max_nodes {
            self.out.truncated = true;
            return false;
        }
        if self.enter(node) {
            self.out.candidates.push(node);
        }
        true
    }
}
