//! Backtracking version solver.
//!
//! Coordinates wait in a FIFO work queue. Each one collects the constraints of
//! every requester seen so far, and candidates are tried from the highest
//! version down. A candidate whose remaining work cannot be completed is
//! undone and the next lower one is tried; when none is left the failure
//! goes back to the most recent earlier decision. This is chronological
//! backtracking, not full constraint propagation. Decisions live on an
//! explicit frame stack rather than the call stack.
//!
//! Only the conflict that finally ended the search is reported.

use std::collections::{BTreeMap, HashMap, VecDeque};

use integra_core::catalog::Catalog;
use integra_core::config::SolverConfig;
use integra_core::module::{DependencyDecl, ModuleRecord};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::conflict::{Conflict, ConflictReport};
use crate::graph::DependencyGraph;
use crate::range::VersionRange;
use crate::resolver::parse_candidates;
use crate::version::Version;

/// The output of [`VersionSolver::solve`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct Solution {
    pub selected_versions: BTreeMap<String, Version>,
    pub has_solution: bool,
    /// Empty on success; otherwise the single conflict that ended the search.
    pub conflicts: ConflictReport,
    /// Dependency-first records. `None` when there is no solution or the
    /// solved selection contains a cycle.
    pub load_order: Option<Vec<ModuleRecord>>,
}

/// Backtracking solver. Holds only configuration.
#[derive(Debug, Clone, Default)]
pub struct VersionSolver {
    config: SolverConfig,
}

impl VersionSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve for `roots`, each requested unconstrained.
    pub fn solve<C, S>(&self, catalog: &C, roots: &[S]) -> Solution
    where
        C: Catalog + ?Sized,
        S: AsRef<str>,
    {
        let mut search = Search::new(catalog, self.config.max_steps);
        for root in roots {
            search.queue.push_back(root.as_ref().to_string());
        }

        match search.run() {
            Ok(()) => {
                debug!(
                    "solved {} modules in {} steps",
                    search.selected.len(),
                    search.steps
                );
                search.into_solution()
            }
            Err(failure) => {
                let conflict = failure.into_conflict();
                debug!("no solution after {} steps: {conflict}", search.steps);
                let mut conflicts = ConflictReport::new();
                conflicts.add(conflict);
                Solution {
                    selected_versions: BTreeMap::new(),
                    has_solution: false,
                    conflicts,
                    load_order: None,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectionState {
    Selecting,
    Selected,
    Conflicted,
}

/// Why a branch of the search failed.
#[derive(Debug)]
enum Failure {
    /// The most recent decision may undo its choice and try another candidate.
    Backtrack(Conflict),
    /// The whole search stops.
    Abort(Conflict),
}

impl Failure {
    fn into_conflict(self) -> Conflict {
        match self {
            Failure::Backtrack(c) | Failure::Abort(c) => c,
        }
    }
}

type Outcome = Result<(), Failure>;

/// A constraint contributed by one requester.
#[derive(Debug)]
struct Requirement {
    range: VersionRange,
    requester: String,
}

/// One entry popped from the work queue, kept until the search ends or backtracks past it.
enum Frame<'a> {
    /// A coordinate that was already decided when it came up again.
    Recheck { coordinate: String },
    /// A coordinate being decided, with the candidates it has left.
    Decide(Decision<'a>),
}

impl Frame<'_> {
    fn coordinate(&self) -> &str {
        match self {
            Frame::Recheck { coordinate } => coordinate,
            Frame::Decide(decision) => &decision.coordinate,
        }
    }
}

struct Decision<'a> {
    coordinate: String,
    /// Highest first, one record per distinct version.
    candidates: Vec<(Version, &'a ModuleRecord)>,
    next: usize,
    available: Vec<String>,
    /// Coordinates queued for the current candidate, in order, for [`Search::undo`].
    enqueued: Vec<String>,
    last_failure: Option<Conflict>,
}

/// Working state of one `solve()` call.
///
/// The search runs on an explicit stack of frames. A failing frame restores
/// exactly the state it found, so the frame below only has to revert its own
/// candidate before trying the next one.
struct Search<'a, C: ?Sized> {
    catalog: &'a C,
    max_steps: u64,
    steps: u64,
    queue: VecDeque<String>,
    requirements: HashMap<String, Vec<Requirement>>,
    selected: HashMap<String, (Version, &'a ModuleRecord)>,
    states: HashMap<String, SelectionState>,
}

impl<'a, C: Catalog + ?Sized> Search<'a, C> {
    fn new(catalog: &'a C, max_steps: u64) -> Self {
        Self {
            catalog,
            max_steps,
            steps: 0,
            queue: VecDeque::new(),
            requirements: HashMap::new(),
            selected: HashMap::new(),
            states: HashMap::new(),
        }
    }

    /// Process the queue until it is empty or the search fails.
    fn run(&mut self) -> Outcome {
        let mut frames: Vec<Frame<'a>> = Vec::new();

        while let Some(coordinate) = self.queue.pop_front() {
            let mut outcome = if self.states.get(&coordinate) == Some(&SelectionState::Selected) {
                let outcome = self.recheck(&coordinate);
                frames.push(Frame::Recheck { coordinate });
                outcome
            } else {
                let mut decision = self.open(coordinate)?;
                let outcome = self.advance(&mut decision);
                frames.push(Frame::Decide(decision));
                outcome
            };

            while let Err(failure) = outcome {
                let conflict = match failure {
                    Failure::Abort(conflict) => return Err(Failure::Abort(conflict)),
                    Failure::Backtrack(conflict) => conflict,
                };
                if let Some(failed) = frames.pop() {
                    self.queue.push_front(failed.coordinate().to_string());
                }
                outcome = match frames.last_mut() {
                    None => return Err(Failure::Backtrack(conflict)),
                    Some(Frame::Recheck { .. }) => Err(Failure::Backtrack(conflict)),
                    Some(Frame::Decide(decision)) => {
                        debug!("backtracking from {}: {conflict}", decision.coordinate);
                        self.undo(&decision.coordinate, &decision.enqueued);
                        decision.last_failure = Some(conflict);
                        self.advance(decision)
                    }
                };
            }
        }
        Ok(())
    }

    /// A decided coordinate reached again must still satisfy every constraint
    /// recorded for it, including ones added after it was chosen.
    fn recheck(&self, coordinate: &str) -> Outcome {
        let Some((version, _)) = self.selected.get(coordinate) else {
            return Ok(());
        };
        match self.violated_requirement(coordinate, version) {
            Some(conflict) => Err(Failure::Backtrack(conflict)),
            None => Ok(()),
        }
    }

    /// Start deciding `coordinate`. A coordinate the catalog cannot supply
    /// at all ends the search.
    fn open(&mut self, coordinate: String) -> Result<Decision<'a>, Failure> {
        let catalog = self.catalog;
        let records = catalog.versions(&coordinate);
        if records.is_empty() {
            self.states
                .insert(coordinate.clone(), SelectionState::Conflicted);
            let requester = self.first_requester(&coordinate);
            return Err(Failure::Abort(Conflict::missing(
                &coordinate,
                requester.as_deref(),
            )));
        }

        let mut candidates = parse_candidates(&coordinate, records);
        if candidates.is_empty() {
            self.states
                .insert(coordinate.clone(), SelectionState::Conflicted);
            return Err(Failure::Abort(Conflict::unreadable(
                &coordinate,
                records.len(),
            )));
        }
        // Stable sort keeps catalog order among equal versions.
        candidates.sort_by(|a, b| b.0.cmp(&a.0));
        candidates.dedup_by(|later, earlier| later.0 == earlier.0);
        let available = candidates.iter().map(|(v, _)| v.to_string()).collect();

        self.states
            .insert(coordinate.clone(), SelectionState::Selecting);
        Ok(Decision {
            coordinate,
            candidates,
            next: 0,
            available,
            enqueued: Vec::new(),
            last_failure: None,
        })
    }

    /// Select the next admissible candidate of `decision` and queue its
    /// dependencies, or fail once none is left.
    fn advance(&mut self, decision: &mut Decision<'a>) -> Outcome {
        let coordinate = decision.coordinate.as_str();
        while let Some((version, record)) = decision.candidates.get(decision.next).cloned() {
            decision.next += 1;
            if !self.admits(coordinate, &version) {
                trace!("{coordinate}@{version} excluded by accumulated constraints");
                continue;
            }

            self.steps += 1;
            if self.steps > self.max_steps {
                return Err(Failure::Abort(Conflict::exhausted(
                    coordinate,
                    self.max_steps,
                )));
            }

            debug!("trying {coordinate}@{version}");
            self.selected
                .insert(coordinate.to_string(), (version, record));
            self.states
                .insert(coordinate.to_string(), SelectionState::Selected);
            decision.enqueued = self.enqueue_dependencies(coordinate, &record.dependencies);
            return Ok(());
        }

        self.states
            .insert(coordinate.to_string(), SelectionState::Conflicted);
        let conflict = match decision.last_failure.take() {
            Some(conflict) => conflict,
            None => self.unsatisfiable(coordinate, &decision.available),
        };
        Err(Failure::Backtrack(conflict))
    }

    fn first_requester(&self, coordinate: &str) -> Option<String> {
        self.requirements
            .get(coordinate)
            .and_then(|reqs| reqs.first())
            .map(|r| r.requester.clone())
    }

    /// Whether `version` satisfies every constraint recorded for `coordinate`.
    fn admits(&self, coordinate: &str, version: &Version) -> bool {
        self.requirements
            .get(coordinate)
            .map_or(true, |reqs| reqs.iter().all(|r| r.range.satisfies(version)))
    }

    fn violated_requirement(&self, coordinate: &str, version: &Version) -> Option<Conflict> {
        let reqs = self.requirements.get(coordinate)?;
        let broken = reqs.iter().find(|r| !r.range.satisfies(version))?;
        Some(Conflict::version_mismatch(
            coordinate,
            broken.range.as_str(),
            &version.to_string(),
            &broken.requester,
        ))
    }

    /// Record each dependency's constraint and queue it. Returns the
    /// coordinates touched, in order, for [`Self::undo`].
    fn enqueue_dependencies(&mut self, from: &str, deps: &[DependencyDecl]) -> Vec<String> {
        let mut enqueued = Vec::with_capacity(deps.len());
        for dep in deps {
            let range = edge_range(from, dep);
            self.requirements
                .entry(dep.coordinate.clone())
                .or_default()
                .push(Requirement {
                    range,
                    requester: from.to_string(),
                });
            self.queue.push_back(dep.coordinate.clone());
            enqueued.push(dep.coordinate.clone());
        }
        enqueued
    }

    fn undo(&mut self, coordinate: &str, enqueued: &[String]) {
        for dep in enqueued.iter().rev() {
            if let Some(reqs) = self.requirements.get_mut(dep) {
                reqs.pop();
            }
            self.queue.pop_back();
        }
        self.selected.remove(coordinate);
        self.states
            .insert(coordinate.to_string(), SelectionState::Selecting);
    }

    fn unsatisfiable(&self, coordinate: &str, available: &[String]) -> Conflict {
        let reqs = self
            .requirements
            .get(coordinate)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let combined = reqs
            .iter()
            .fold(VersionRange::any(), |acc, r| acc.intersect(&r.range));
        let mut conflict = Conflict::unsatisfied(coordinate, combined.as_str(), available);
        if !reqs.is_empty() {
            let requesters: Vec<String> = reqs
                .iter()
                .map(|r| format!("{} ({})", r.requester, r.range))
                .collect();
            conflict.message = format!("{}; required by {}", conflict.message, requesters.join(", "));
        }
        conflict
    }

    fn into_solution(self) -> Solution {
        let ordered: BTreeMap<&str, &(Version, &ModuleRecord)> = self
            .selected
            .iter()
            .map(|(c, entry)| (c.as_str(), entry))
            .collect();
        let graph = DependencyGraph::from_selection(ordered.values().map(|(_, r)| *r));
        let load_order = graph.load_order().map(|order| {
            order
                .into_iter()
                .filter_map(|c| ordered.get(c).map(|(_, r)| (*r).clone()))
                .collect()
        });
        if load_order.is_none() {
            warn!("solved selection contains a dependency cycle; no load order");
        }

        Solution {
            selected_versions: ordered
                .iter()
                .map(|(c, (v, _))| (c.to_string(), v.clone()))
                .collect(),
            has_solution: true,
            conflicts: ConflictReport::new(),
            load_order,
        }
    }
}

/// Constraint of one dependency edge. Malformed text counts as unconstrained.
fn edge_range(from: &str, dep: &DependencyDecl) -> VersionRange {
    if dep.is_unconstrained() {
        return VersionRange::any();
    }
    VersionRange::parse(dep.constraint_text()).unwrap_or_else(|e| {
        warn!(
            "{from}: treating malformed constraint on {} as unconstrained: {e}",
            dep.coordinate
        );
        VersionRange::any()
    })
}
