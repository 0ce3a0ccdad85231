//! Internal `$ref` resolution with cycle detection and a bounded cache.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ResolveError;

/// Default maximum nested-reference expansion depth.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default cache capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Bounded insertion-ordered cache of fully-resolved references.
///
/// On overflow the oldest quarter of entries is evicted in one pass; shared
/// component schemas are re-resolved constantly, so keeping the hot recent
/// entries matters more than exact LRU order.
#[derive(Debug)]
pub struct ResolverCache {
    capacity: usize,
    entries: IndexMap<String, Value>,
}

impl ResolverCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, value: Value) {
        if self.entries.len() >= self.capacity {
            let evict = (self.capacity / 4).max(1);
            for _ in 0..evict {
                self.entries.shift_remove_index(0);
            }
        }
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves internal JSON-pointer references against a loaded document.
///
/// One resolver per analysis run: the cache and in-progress stack are plain
/// instance state, not globals. The stack's circular-reference detection
/// depends on causally ordered push/pop, so a shared instance would need a
/// mutex; per-run instances avoid the question.
#[derive(Debug)]
pub struct Resolver {
    cache: ResolverCache,
    stack: Vec<String>,
    max_depth: usize,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_DEPTH)
    }

    pub fn with_limits(cache_capacity: usize, max_depth: usize) -> Self {
        Self {
            cache: ResolverCache::with_capacity(cache_capacity),
            stack: Vec::new(),
            max_depth,
        }
    }

    /// Resolve `ref_str` against `doc`, expanding nested `$ref`s inside the
    /// target (in `properties`, `items`, and `allOf`/`oneOf`/`anyOf` lists)
    /// up to the depth limit. Beyond the limit the partially-resolved node is
    /// returned as-is.
    pub fn resolve(&mut self, ref_str: &str, doc: &Value) -> Result<Value, ResolveError> {
        self.resolve_at(ref_str, doc, 0).map(|(value, _)| value)
    }

    /// Expand every nested `$ref` inside an inline schema value.
    ///
    /// Used for schemas that are not themselves references but contain them.
    pub fn expand_node(&mut self, value: &Value, doc: &Value) -> Result<Value, ResolveError> {
        self.expand(value.clone(), doc, 0).map(|(value, _)| value)
    }

    /// The `bool` is completeness: a resolution that ran out of depth budget
    /// still carries unresolved `$ref`s and must not enter the cache, or a
    /// later shallower lookup of the same ref would be served the truncated
    /// value.
    fn resolve_at(
        &mut self,
        ref_str: &str,
        doc: &Value,
        depth: usize,
    ) -> Result<(Value, bool), ResolveError> {
        if let Some(hit) = self.cache.get(ref_str) {
            // Only complete expansions are cached.
            return Ok((hit.clone(), true));
        }
        if self.stack.iter().any(|s| s == ref_str) {
            return Err(ResolveError::CircularReference(ref_str.to_string()));
        }

        let target = lookup_pointer(ref_str, doc)?;

        self.stack.push(ref_str.to_string());
        let expanded = self.expand(target, doc, depth);
        self.stack.pop();
        let (expanded, complete) = expanded?;

        if complete {
            self.cache.insert(ref_str.to_string(), expanded.clone());
        }
        Ok((expanded, complete))
    }

    fn expand(
        &mut self,
        value: Value,
        doc: &Value,
        depth: usize,
    ) -> Result<(Value, bool), ResolveError> {
        if depth >= self.max_depth {
            // Depth budget exhausted: abandon expansion, keep the partial node.
            let complete = !contains_ref(&value);
            return Ok((value, complete));
        }

        let obj = match value {
            Value::Object(obj) => obj,
            other => return Ok((other, true)),
        };

        if let Some(r) = obj.get("$ref").and_then(Value::as_str) {
            let r = r.to_string();
            return self.resolve_at(&r, doc, depth + 1);
        }

        let mut complete = true;
        let mut out = serde_json::Map::new();
        for (key, val) in obj {
            let expanded = match key.as_str() {
                "properties" => match val {
                    Value::Object(props) => {
                        let mut new_props = serde_json::Map::new();
                        for (name, prop) in props {
                            let (prop, prop_complete) = self.expand(prop, doc, depth + 1)?;
                            complete &= prop_complete;
                            new_props.insert(name, prop);
                        }
                        Value::Object(new_props)
                    }
                    other => other,
                },
                "items" => {
                    let (items, items_complete) = self.expand(val, doc, depth + 1)?;
                    complete &= items_complete;
                    items
                }
                "allOf" | "oneOf" | "anyOf" => match val {
                    Value::Array(entries) => {
                        let mut new_entries = Vec::with_capacity(entries.len());
                        for entry in entries {
                            let (entry, entry_complete) = self.expand(entry, doc, depth + 1)?;
                            complete &= entry_complete;
                            new_entries.push(entry);
                        }
                        Value::Array(new_entries)
                    }
                    other => other,
                },
                _ => val,
            };
            out.insert(key, expanded);
        }
        Ok((Value::Object(out), complete))
    }

    /// Cache size, exposed for tests and diagnostics.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// Whether any `$ref` key remains anywhere in the value.
fn contains_ref(value: &Value) -> bool {
    match value {
        Value::Object(obj) => {
            obj.contains_key("$ref") || obj.values().any(contains_ref)
        }
        Value::Array(entries) => entries.iter().any(contains_ref),
        _ => false,
    }
}

/// Walk a `#/a/b/c` pointer into the document tree.
///
/// JSON-pointer escapes (`~1` for `/`, `~0` for `~`) are decoded per segment.
fn lookup_pointer(ref_str: &str, doc: &Value) -> Result<Value, ResolveError> {
    let pointer = ref_str
        .strip_prefix("#/")
        .ok_or_else(|| ResolveError::InvalidFormat(ref_str.to_string()))?;
    if pointer.is_empty() {
        return Err(ResolveError::InvalidFormat(ref_str.to_string()));
    }

    let mut current = doc;
    for raw_segment in pointer.split('/') {
        let segment = raw_segment.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map.get(&segment),
            Value::Array(arr) => segment
                .parse::<usize>()
                .ok()
                .and_then(|idx| arr.get(idx)),
            _ => None,
        }
        .ok_or_else(|| ResolveError::NotFound(ref_str.to_string()))?;
    }
    Ok(current.clone())
}
