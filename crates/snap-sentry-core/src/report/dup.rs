use crate::config::GroupingMode;
use ahash::AHashMap;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use tracing::debug;

const DUP_SEPARATOR: char = '=';

/// Left operand of a dup line: optional leading whitespace, the size
/// column, then the path. The size column is required so a path that
/// starts with digits and a space keeps its first word.
fn dup_left_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+\s+(\S.*?)\s*$").expect("static regex"))
}

/// Parsed `snapraid dup` output.
#[derive(Debug, Clone, Default)]
pub struct DuplicateReport {
    pub pairs: Vec<(String, String)>,
    /// Last non-empty line, the aggregate count printed by snapraid.
    pub trailer: Option<String>,
}

impl DuplicateReport {
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut pairs = Vec::new();
        for line in lines {
            if let Some(pair) = parse_pair(line.as_ref()) {
                pairs.push(pair);
            }
        }

        let trailer = lines
            .iter()
            .rev()
            .map(|line| line.as_ref().trim())
            .find(|line| !line.is_empty())
            .map(str::to_string);

        DuplicateReport { pairs, trailer }
    }
}

/// Parse `<size> <pathA> = <pathB>`. Lines that do not split into exactly
/// two parts are skipped.
pub fn parse_pair(line: &str) -> Option<(String, String)> {
    let mut parts = line.split(DUP_SEPARATOR);
    let left = parts.next()?;
    let right = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let left = dup_left_regex().captures(left)?.get(1)?.as_str();
    let right = right.trim();
    if right.is_empty() {
        return None;
    }
    Some((left.to_string(), right.to_string()))
}

/// Path → content-identical sibling paths. Symmetric, never contains a
/// path in its own sibling set.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DuplicateGraph {
    siblings: BTreeMap<String, BTreeSet<String>>,
}

impl DuplicateGraph {
    pub fn build(pairs: &[(String, String)], mode: GroupingMode) -> Self {
        let graph = match mode {
            GroupingMode::Pairwise => build_pairwise(pairs),
            GroupingMode::Transitive => build_transitive(pairs),
        };
        debug!(
            "Duplicate graph ({:?}): {} pairs, {} paths",
            mode,
            pairs.len(),
            graph.siblings.len()
        );
        graph
    }

    pub fn siblings(&self, path: &str) -> Option<&BTreeSet<String>> {
        self.siblings.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.siblings.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.siblings.iter()
    }
}

fn adjacency(pairs: &[(String, String)]) -> AHashMap<&str, Vec<&str>> {
    let mut adjacency: AHashMap<&str, Vec<&str>> = AHashMap::new();
    for (a, b) in pairs {
        adjacency.entry(a.as_str()).or_default().push(b.as_str());
        adjacency.entry(b.as_str()).or_default().push(a.as_str());
    }
    adjacency
}

fn build_pairwise(pairs: &[(String, String)]) -> DuplicateGraph {
    let adjacency = adjacency(pairs);
    let mut siblings: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (key, values) in &adjacency {
        for value in values {
            let union: Vec<&str> = adjacency[key]
                .iter()
                .chain(adjacency[value].iter())
                .copied()
                .collect();

            for endpoint in [*key, *value] {
                let set = siblings.entry(endpoint.to_string()).or_default();
                set.extend(
                    union
                        .iter()
                        .filter(|path| **path != endpoint)
                        .map(|path| path.to_string()),
                );
            }
        }
    }

    DuplicateGraph { siblings }
}

fn build_transitive(pairs: &[(String, String)]) -> DuplicateGraph {
    let mut index: AHashMap<&str, usize> = AHashMap::new();
    let mut names: Vec<&str> = Vec::new();
    for (a, b) in pairs {
        for path in [a.as_str(), b.as_str()] {
            index.entry(path).or_insert_with(|| {
                names.push(path);
                names.len() - 1
            });
        }
    }

    let mut sets = DisjointSet::new(names.len());
    for (a, b) in pairs {
        sets.union(index[a.as_str()], index[b.as_str()]);
    }

    let mut components: AHashMap<usize, BTreeSet<String>> = AHashMap::new();
    for (i, name) in names.iter().enumerate() {
        components
            .entry(sets.find(i))
            .or_default()
            .insert(name.to_string());
    }

    let mut siblings = BTreeMap::new();
    for (i, name) in names.iter().enumerate() {
        let mut set = components[&sets.find(i)].clone();
        set.remove(*name);
        siblings.insert(name.to_string(), set);
    }

    DuplicateGraph { siblings }
}

struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}
