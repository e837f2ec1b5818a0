// floe-core/src/domain/graph/dag.rs

use crate::domain::error::DomainError;
use crate::domain::resolution::ResolvedModel;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Dependency graph of resolved models. Edges point from a model to the
/// models it depends on; `children` is the reverse map.
#[derive(Debug, Clone, Default)]
pub struct ModelGraph {
    models: BTreeMap<String, ResolvedModel>,
    children: BTreeMap<String, BTreeSet<String>>,
    declared_sources: BTreeSet<String>,
}

impl ModelGraph {
    pub fn new(models: Vec<ResolvedModel>, declared_sources: BTreeSet<String>) -> Self {
        let models: BTreeMap<String, ResolvedModel> =
            models.into_iter().map(|m| (m.name.clone(), m)).collect();

        let mut children: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for model in models.values() {
            for dep in &model.depends_on {
                if models.contains_key(dep) {
                    children
                        .entry(dep.clone())
                        .or_default()
                        .insert(model.name.clone());
                }
            }
        }

        Self {
            models,
            children,
            declared_sources,
        }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Models in name order.
    pub fn models(&self) -> impl Iterator<Item = &ResolvedModel> {
        self.models.values()
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedModel> {
        self.models.get(name)
    }

    pub fn declared_sources(&self) -> &BTreeSet<String> {
        &self.declared_sources
    }

    /// `(model, missing dependency)` pairs.
    pub fn undefined_refs(&self) -> Vec<(&str, &str)> {
        self.models
            .values()
            .flat_map(|m| {
                m.depends_on
                    .iter()
                    .filter(|dep| !self.models.contains_key(*dep))
                    .map(move |dep| (m.name.as_str(), dep.as_str()))
            })
            .collect()
    }

    /// `(model, undeclared source)` pairs.
    pub fn undefined_sources(&self) -> Vec<(&str, &str)> {
        self.models
            .values()
            .flat_map(|m| {
                m.sources
                    .iter()
                    .filter(|s| !self.declared_sources.contains(*s))
                    .map(move |s| (m.name.as_str(), s.as_str()))
            })
            .collect()
    }

    // Known upstream models of `name`, sorted and unique.
    fn dependencies(&self, name: &str) -> Vec<&str> {
        let Some(model) = self.models.get(name) else {
            return Vec::new();
        };
        let deps: BTreeSet<&str> = model
            .depends_on
            .iter()
            .filter(|d| self.models.contains_key(*d))
            .map(String::as_str)
            .collect();
        deps.into_iter().collect()
    }

    /// Every cycle reachable by depth-first traversal, as closed paths
    /// (`[a, b, a]`) that follow the dependency direction. Each cycle is
    /// rotated to start at its smallest model name and reported once.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut color: BTreeMap<&str, Color> = self
            .models
            .keys()
            .map(|k| (k.as_str(), Color::White))
            .collect();
        let mut cycles: BTreeSet<Vec<String>> = BTreeSet::new();

        for root in self.models.keys() {
            if color.get(root.as_str()) != Some(&Color::White) {
                continue;
            }

            // (node, index of the next dependency to visit); doubles as the
            // recursion path.
            let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];
            color.insert(root.as_str(), Color::Gray);

            while let Some(&(node, next)) = stack.last() {
                let deps = self.dependencies(node);
                let Some(&dep) = deps.get(next) else {
                    color.insert(node, Color::Black);
                    stack.pop();
                    continue;
                };
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }

                match color.get(dep).copied().unwrap_or(Color::Black) {
                    Color::White => {
                        color.insert(dep, Color::Gray);
                        stack.push((dep, 0));
                    }
                    Color::Gray => {
                        // Back-edge: the cycle is the stack suffix starting at `dep`
                        if let Some(start) = stack.iter().position(|(n, _)| *n == dep) {
                            let ring: Vec<&str> = stack[start..].iter().map(|(n, _)| *n).collect();
                            cycles.insert(canonical_cycle(&ring));
                        }
                    }
                    Color::Black => {}
                }
            }
        }

        cycles.into_iter().collect()
    }

    /// Every model transitively downstream of `name`, sorted.
    pub fn downstream_of(&self, name: &str) -> Vec<String> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([name]);

        while let Some(current) = queue.pop_front() {
            if let Some(children) = self.children.get(current) {
                for child in children {
                    if child != name && seen.insert(child.as_str()) {
                        queue.push_back(child.as_str());
                    }
                }
            }
        }

        seen.into_iter().map(String::from).collect()
    }

    /// Calculates the execution order of models (Topological Sort with Layers).
    /// Layer N depends only on layers 0..N-1; each layer is sorted.
    pub fn plan_execution(&self) -> Result<Vec<Vec<String>>, DomainError> {
        let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();

        // 1. Initialization: only edges between known models count
        for name in self.models.keys() {
            in_degree.insert(name.as_str(), self.dependencies(name).len());
        }

        // 2. Kahn's Algorithm (Layered)
        let mut layers: Vec<Vec<String>> = Vec::new();
        let mut ready: Vec<&str> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut total_resolved = 0;

        while !ready.is_empty() {
            ready.sort_unstable();
            let mut next_layer = Vec::new();

            for current in &ready {
                total_resolved += 1;
                if let Some(children) = self.children.get(*current) {
                    for child in children {
                        if let Some(degree) = in_degree.get_mut(child.as_str()) {
                            *degree -= 1;
                            if *degree == 0 {
                                next_layer.push(child.as_str());
                            }
                        }
                    }
                }
            }

            layers.push(ready.iter().map(|s| s.to_string()).collect());
            ready = next_layer;
        }

        // 3. Cycle Detection
        if total_resolved != self.models.len() {
            let cycle = self
                .find_cycles()
                .first()
                .map(|c| c.join(" -> "))
                .unwrap_or_default();
            return Err(DomainError::CircularDependency(format!(
                "Resolved {}/{} models; cycle: {}",
                total_resolved,
                self.models.len(),
                cycle
            )));
        }

        Ok(layers)
    }
}

// Rotates the ring to start at its smallest member and closes it.
fn canonical_cycle(ring: &[&str]) -> Vec<String> {
    let start = ring
        .iter()
        .enumerate()
        .min_by_key(|(_, name)| **name)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut path: Vec<String> = ring[start..]
        .iter()
        .chain(ring[..start].iter())
        .map(|s| s.to_string())
        .collect();
    if let Some(first) = path.first().cloned() {
        path.push(first);
    }
    path
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn model(name: &str, deps: &[&str]) -> ResolvedModel {
        ResolvedModel::new(name, "duckdb").depending_on(deps)
    }

    fn graph(models: Vec<ResolvedModel>) -> ModelGraph {
        ModelGraph::new(models, BTreeSet::new())
    }

    #[test]
    fn test_dag_linear() -> Result<()> {
        // C depends on B, B depends on A
        let g = graph(vec![
            model("model_c", &["model_b"]),
            model("model_a", &[]),
            model("model_b", &["model_a"]),
        ]);
        let plan = g.plan_execution()?;
        assert_eq!(plan, vec![vec!["model_a"], vec!["model_b"], vec!["model_c"]]);
        assert!(g.find_cycles().is_empty());
        Ok(())
    }

    #[test]
    fn test_layers_are_sorted() -> Result<()> {
        let g = graph(vec![
            model("z_root", &[]),
            model("a_root", &[]),
            model("joined", &["z_root", "a_root"]),
        ]);
        assert_eq!(
            g.plan_execution()?,
            vec![vec!["a_root", "z_root"], vec!["joined"]]
        );
        Ok(())
    }

    #[test]
    fn test_two_node_cycle_reports_full_path_once() {
        let g = graph(vec![model("model_b", &["model_a"]), model("model_a", &["model_b"])]);
        let cycles = g.find_cycles();
        assert_eq!(cycles, vec![vec!["model_a", "model_b", "model_a"]]);
        assert!(matches!(
            g.plan_execution(),
            Err(DomainError::CircularDependency(_))
        ));
    }

    #[test]
    fn test_three_node_cycle_and_self_loop() {
        let g = graph(vec![
            model("c", &["a"]),
            model("a", &["b"]),
            model("b", &["c"]),
            model("solo", &["solo"]),
            model("free", &[]),
        ]);
        assert_eq!(
            g.find_cycles(),
            vec![vec!["a", "b", "c", "a"], vec!["solo", "solo"]]
        );
    }

    #[test]
    fn test_downstream_impact() {
        let g = graph(vec![
            model("raw", &[]),
            model("stg", &["raw"]),
            model("dim", &["stg"]),
            model("fct", &["stg", "dim"]),
            model("other", &[]),
        ]);
        assert_eq!(g.downstream_of("raw"), vec!["dim", "fct", "stg"]);
        assert_eq!(g.downstream_of("fct"), Vec::<String>::new());
    }

    #[test]
    fn test_undefined_references() {
        let mut m = model("stg_orders", &["missing_model"]);
        m.sources = vec!["raw.orders".into(), "raw.refunds".into()];
        let g = ModelGraph::new(vec![m], BTreeSet::from(["raw.orders".to_string()]));
        assert_eq!(g.undefined_refs(), vec![("stg_orders", "missing_model")]);
        assert_eq!(g.undefined_sources(), vec![("stg_orders", "raw.refunds")]);
        // Dangling edges are ignored by the planner
        assert_eq!(g.plan_execution().unwrap(), vec![vec!["stg_orders"]]);
    }
}
