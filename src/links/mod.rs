//! Cross-instance field links: resolution with cycle detection and
//! validation of proposed links.

use crate::ast::FieldValue;
use crate::compiler;
use crate::definition::{Field, FieldLink, ModuleDefinition, ModuleLibrary, Workspace};
use crate::error::BrokenLinkReason;
use crate::evaluator::{Binding, EvaluationContext};
use crate::outputs::{self, ComputedOutputs};
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;
use tracing::{debug, warn};

mod validate;

pub use validate::{can_link_fields, link_field};

/// The authoritative value of one field after following its link chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedField {
    /// Unlinked; the instance's own stored value.
    Local(Option<FieldValue>),
    /// Linked; the value found at the end of the chain.
    Linked {
        value: Option<FieldValue>,
        link: FieldLink,
    },
    /// Linked, but the chain cannot be followed. `fallback` is the stale
    /// local value, kept for display only.
    Broken {
        reason: BrokenLinkReason,
        fallback: Option<FieldValue>,
    },
}

impl ResolvedField {
    /// The usable value; `None` for broken links.
    pub fn value(&self) -> Option<&FieldValue> {
        match self {
            ResolvedField::Local(value) | ResolvedField::Linked { value, .. } => value.as_ref(),
            ResolvedField::Broken { .. } => None,
        }
    }

    pub fn is_broken(&self) -> bool {
        matches!(self, ResolvedField::Broken { .. })
    }

    pub fn is_linked(&self) -> bool {
        !matches!(self, ResolvedField::Local(_))
    }
}

/// Resolved field values for every instance of a workspace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedWorkspace {
    instances: AHashMap<String, AHashMap<String, ResolvedField>>,
}

impl ResolvedWorkspace {
    pub fn get(&self, instance_id: &str, variable_name: &str) -> Option<&ResolvedField> {
        self.instances.get(instance_id)?.get(variable_name)
    }

    pub fn instance(&self, instance_id: &str) -> Option<&AHashMap<String, ResolvedField>> {
        self.instances.get(instance_id)
    }

    pub fn broken_links(&self) -> impl Iterator<Item = (&str, &str, &BrokenLinkReason)> {
        self.instances.iter().flat_map(|(instance, fields)| {
            fields.iter().filter_map(move |(name, resolved)| match resolved {
                ResolvedField::Broken { reason, .. } => {
                    Some((instance.as_str(), name.as_str(), reason))
                }
                _ => None,
            })
        })
    }
}

/// Binds a module's fields into `context` from their resolved values.
/// Fields missing from `resolved` fall back to their defaults.
pub fn bind_resolved_fields(
    context: &mut EvaluationContext<'_>,
    module: &ModuleDefinition,
    resolved: Option<&AHashMap<String, ResolvedField>>,
) {
    for field in &module.fields {
        match resolved.and_then(|r| r.get(&field.variable_name)) {
            Some(ResolvedField::Broken { reason, .. }) => context.bind(
                &field.variable_name,
                Binding::Broken {
                    reason: reason.clone(),
                },
            ),
            Some(resolved) => context.bind_field(field, resolved.value().cloned()),
            None => context.bind_field(field, None),
        }
    }
}

/// Resolves every field of a workspace in one pass.
///
/// `base` supplies the catalog, functions and limits used when a link
/// targets a computed output and the target instance's outputs must be
/// evaluated; its bindings are ignored.
///
/// The result does not depend on the order of the workspace's instances.
pub fn resolve_links(
    workspace: &Workspace,
    library: &ModuleLibrary,
    base: &EvaluationContext<'_>,
) -> ResolvedWorkspace {
    let mut resolver = LinkResolver::new(workspace, library, base);
    for index in 0..workspace.instances.len() {
        resolver.resolve_instance(index);
    }
    resolver.finish()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Node {
    Field(usize, String),
    /// The computed outputs of an instance, evaluated as one list.
    Outputs(usize),
}

/// What each node needs before it can be resolved.
///
/// A linked field depends on its target field, or on the target instance's
/// outputs. An instance's outputs depend on the fields their expressions
/// read. Every cycle therefore passes through at least one field.
struct DependencyGraph {
    edges: AHashMap<Node, Vec<Node>>,
    /// Fields read by each instance's computed outputs.
    output_fields: AHashMap<usize, Vec<String>>,
}

impl DependencyGraph {
    fn build(
        workspace: &Workspace,
        library: &ModuleLibrary,
        index: &AHashMap<&str, usize>,
    ) -> Self {
        let mut edges: AHashMap<Node, Vec<Node>> = AHashMap::new();
        let mut output_fields = AHashMap::new();

        for (i, instance) in workspace.instances.iter().enumerate() {
            let Some(module) = library.get(&instance.module_id) else {
                continue;
            };
            for (name, link) in &instance.field_links {
                if module.field(name).is_none() {
                    continue;
                }
                let Some(&target) = index.get(link.target_instance_id.as_str()) else {
                    continue;
                };
                let Some(target_module) = library.get(&workspace.instances[target].module_id)
                else {
                    continue;
                };
                let next = match link.target_output() {
                    Some(output) if target_module.output_index(output).is_some() => {
                        Node::Outputs(target)
                    }
                    None if target_module.field(&link.target_variable_name).is_some() => {
                        Node::Field(target, link.target_variable_name.clone())
                    }
                    _ => continue,
                };
                edges.entry(Node::Field(i, name.clone())).or_default().push(next);
            }

            let read = fields_read_by_outputs(module);
            if !read.is_empty() {
                edges.insert(
                    Node::Outputs(i),
                    read.iter().map(|name| Node::Field(i, name.clone())).collect(),
                );
            }
            output_fields.insert(i, read);
        }
        Self {
            edges,
            output_fields,
        }
    }

    /// Every field that can reach itself.
    fn cyclic_fields(&self) -> AHashSet<(usize, String)> {
        self.edges
            .keys()
            .filter_map(|node| match node {
                Node::Field(i, name) if self.reaches(node, node) => Some((*i, name.clone())),
                _ => None,
            })
            .collect()
    }

    /// Breadth-first search from the successors of `from`.
    fn reaches(&self, from: &Node, goal: &Node) -> bool {
        let mut visited: AHashSet<&Node> = AHashSet::new();
        let mut queue: VecDeque<&Node> = self.edges.get(from).into_iter().flatten().collect();
        while let Some(current) = queue.pop_front() {
            if current == goal {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            queue.extend(self.edges.get(current).into_iter().flatten());
        }
        false
    }
}

/// Field names read by any computed output of `module`, in first-use order.
/// Outputs that do not parse read nothing; they fail when evaluated.
fn fields_read_by_outputs(module: &ModuleDefinition) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for output in &module.computed_outputs {
        let Ok(ast) = compiler::parse(&output.expression) else {
            continue;
        };
        let mut inputs = Vec::new();
        ast.collect_inputs(&mut inputs);
        for input in inputs {
            let root = input.root();
            if module.field(root).is_some() && !names.iter().any(|n| n == root) {
                names.push(root.to_string());
            }
        }
    }
    names
}

enum State<T> {
    InProgress,
    Done(T),
}

/// Memoized depth-first traversal over `(instance, field)` nodes.
///
/// Cycles are found up front on the dependency graph: every linked field
/// that can reach itself resolves as `Broken(Cycle)` without being
/// followed. What remains is acyclic, so each node is resolved once and its
/// result is the same whatever instance the traversal started from.
struct LinkResolver<'w, 'c, 'a> {
    workspace: &'w Workspace,
    library: &'w ModuleLibrary,
    base: &'c EvaluationContext<'a>,
    index: AHashMap<&'w str, usize>,
    graph: DependencyGraph,
    cyclic: AHashSet<(usize, String)>,
    fields: AHashMap<(usize, String), State<ResolvedField>>,
    outputs: AHashMap<usize, State<ComputedOutputs>>,
}

impl<'w, 'c, 'a> LinkResolver<'w, 'c, 'a> {
    fn new(
        workspace: &'w Workspace,
        library: &'w ModuleLibrary,
        base: &'c EvaluationContext<'a>,
    ) -> Self {
        let index: AHashMap<&'w str, usize> = workspace
            .instances
            .iter()
            .enumerate()
            .map(|(i, instance)| (instance.id.as_str(), i))
            .collect();
        let graph = DependencyGraph::build(workspace, library, &index);
        let cyclic = graph.cyclic_fields();
        if !cyclic.is_empty() {
            debug!(fields = cyclic.len(), "link cycles found");
        }
        Self {
            workspace,
            library,
            base,
            index,
            graph,
            cyclic,
            fields: AHashMap::new(),
            outputs: AHashMap::new(),
        }
    }

    fn module(&self, index: usize) -> Option<&'w ModuleDefinition> {
        self.library.get(&self.workspace.instances[index].module_id)
    }

    fn resolve_instance(&mut self, index: usize) {
        let Some(module) = self.module(index) else {
            return;
        };
        for field in &module.fields {
            self.resolve_field(index, field);
        }
    }

    fn resolve_field(&mut self, index: usize, field: &Field) -> ResolvedField {
        let key = (index, field.variable_name.clone());
        match self.fields.get(&key) {
            Some(State::Done(resolved)) => return resolved.clone(),
            // Unreachable once cyclic fields are cut; kept so a missed
            // cycle cannot recurse forever.
            Some(State::InProgress) => return self.cycle(index, &field.variable_name),
            None => {}
        }

        let workspace = self.workspace;
        let instance = &workspace.instances[index];
        let resolved = match instance.link(&field.variable_name) {
            None => ResolvedField::Local(self.local_value(index, &field.variable_name)),
            Some(_) if self.cyclic.contains(&key) => self.cycle(index, &field.variable_name),
            Some(link) => {
                self.fields.insert(key.clone(), State::InProgress);
                self.follow(index, field, link)
            }
        };

        if let ResolvedField::Broken { reason, .. } = &resolved {
            warn!(
                instance = %instance.id,
                field = %field.variable_name,
                %reason,
                "broken field link"
            );
        }
        self.fields.insert(key, State::Done(resolved.clone()));
        resolved
    }

    fn follow(&mut self, index: usize, field: &Field, link: &FieldLink) -> ResolvedField {
        let fallback = self.local_value(index, &field.variable_name);
        let broken = |reason| ResolvedField::Broken {
            reason,
            fallback: fallback.clone(),
        };
        let missing_target = || BrokenLinkReason::TargetFieldMissing {
            instance_id: link.target_instance_id.clone(),
            name: link.target_variable_name.clone(),
        };

        let Some(&target) = self.index.get(link.target_instance_id.as_str()) else {
            return broken(BrokenLinkReason::TargetInstanceMissing {
                instance_id: link.target_instance_id.clone(),
            });
        };
        let Some(target_module) = self.module(target) else {
            return broken(missing_target());
        };

        if let Some(output) = link.target_output() {
            if target_module.output_index(output).is_none() {
                return broken(missing_target());
            }
            return match self.evaluate_outputs(target) {
                None => broken(BrokenLinkReason::Cycle),
                Some(outputs) => match outputs.value(output) {
                    Some(value) => ResolvedField::Linked {
                        value: Some(FieldValue::Number(value)),
                        link: link.clone(),
                    },
                    None => broken(BrokenLinkReason::TargetUnavailable {
                        instance_id: link.target_instance_id.clone(),
                        name: link.target_variable_name.clone(),
                    }),
                },
            };
        }

        let Some(target_field) = target_module.field(&link.target_variable_name) else {
            return broken(missing_target());
        };
        match self.resolve_field(target, target_field) {
            ResolvedField::Local(value) => ResolvedField::Linked {
                value: value.or_else(|| target_field.fallback_value()),
                link: link.clone(),
            },
            ResolvedField::Linked { value, .. } => ResolvedField::Linked {
                value,
                link: link.clone(),
            },
            ResolvedField::Broken { reason, .. } => broken(reason),
        }
    }

    /// Evaluates the computed outputs of an instance from the resolved
    /// values of the fields they read. Returns `None` only if the outputs
    /// are re-entered while being evaluated.
    fn evaluate_outputs(&mut self, index: usize) -> Option<ComputedOutputs> {
        match self.outputs.get(&index) {
            Some(State::Done(outputs)) => return Some(outputs.clone()),
            Some(State::InProgress) => return None,
            None => {}
        }
        let module = self.module(index)?;

        self.outputs.insert(index, State::InProgress);
        let read = self
            .graph
            .output_fields
            .get(&index)
            .cloned()
            .unwrap_or_default();
        let resolved: AHashMap<String, ResolvedField> = read
            .into_iter()
            .filter_map(|name| {
                let field = module.field(&name)?;
                Some((name, self.resolve_field(index, field)))
            })
            .collect();

        let mut context = self.base.clone();
        bind_resolved_fields(&mut context, module, Some(&resolved));
        let outputs = outputs::evaluate_computed_outputs(module, &mut context);
        debug!(
            instance = %self.workspace.instances[index].id,
            failed = outputs.errors.len(),
            "evaluated outputs for a link target"
        );
        self.outputs.insert(index, State::Done(outputs.clone()));
        Some(outputs)
    }

    fn cycle(&self, index: usize, variable_name: &str) -> ResolvedField {
        ResolvedField::Broken {
            reason: BrokenLinkReason::Cycle,
            fallback: self.local_value(index, variable_name),
        }
    }

    fn local_value(&self, index: usize, variable_name: &str) -> Option<FieldValue> {
        self.workspace.instances[index]
            .field_values
            .get(variable_name)
            .cloned()
    }

    fn finish(self) -> ResolvedWorkspace {
        let mut instances: AHashMap<String, AHashMap<String, ResolvedField>> = AHashMap::new();
        for ((index, name), state) in self.fields {
            if let State::Done(resolved) = state {
                instances
                    .entry(self.workspace.instances[index].id.clone())
                    .or_default()
                    .insert(name, resolved);
            }
        }
        ResolvedWorkspace { instances }
    }
}
