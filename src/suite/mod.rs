//! The suite tree.
//!
//! A [`Suite`] is an owned tree of [`Group`]s and [`Leaf`]s. It is built once
//! through the [`Registrar`] and is immutable afterwards: running a suite only
//! reads the tree, it never changes its structure.
//!
//! Groups own their children in declaration order, which is also the order
//! they execute in. Each group carries a [`HookSet`] with at most one hook per
//! [`HookKind`].

use std::{borrow::Cow, fmt, slice, sync::Arc};

use crate::{
    config::RunConfig,
    context::{Ctx, Done},
    matcher::Matcher,
    report::{Reporter, RunReport},
    scheduler::Scheduler,
};

mod registrar;
pub use registrar::*;

/// A hook function, run with the [`Ctx`] of the leaf (or group) it belongs to.
pub type Hook = Arc<dyn Fn(&Ctx) + Send + Sync>;

/// The body of a synchronous leaf.
pub type SyncBody = Arc<dyn Fn(&Ctx) + Send + Sync>;

/// The body of an asynchronous leaf, finishing by invoking [`Done`].
pub type AsyncBody = Arc<dyn Fn(&Ctx, Done) + Send + Sync>;

#[derive(Clone)]
pub enum Body {
    Sync(SyncBody),
    Async(AsyncBody),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => write!(f, "Sync(...)"),
            Self::Async(_) => write!(f, "Async(...)"),
        }
    }
}

/// How a leaf executes, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafMode {
    Sync,
    Async,
    /// Declared through an excluded or skip entry point, never runs.
    Excluded,
    /// Declared without a body, never runs.
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Before,
    BeforeEach,
    JustBeforeEach,
    AfterEach,
    After,
}

impl HookKind {
    pub const ALL: [HookKind; 5] = [
        HookKind::Before,
        HookKind::BeforeEach,
        HookKind::JustBeforeEach,
        HookKind::AfterEach,
        HookKind::After,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HookKind::Before => "before",
            HookKind::BeforeEach => "before_each",
            HookKind::JustBeforeEach => "just_before_each",
            HookKind::AfterEach => "after_each",
            HookKind::After => "after",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The hooks of one group, at most one per [`HookKind`].
#[derive(Default, Clone)]
pub struct HookSet {
    before: Option<Hook>,
    before_each: Option<Hook>,
    just_before_each: Option<Hook>,
    after_each: Option<Hook>,
    after: Option<Hook>,
}

impl HookSet {
    pub fn get(&self, kind: HookKind) -> Option<&Hook> {
        match kind {
            HookKind::Before => self.before.as_ref(),
            HookKind::BeforeEach => self.before_each.as_ref(),
            HookKind::JustBeforeEach => self.just_before_each.as_ref(),
            HookKind::AfterEach => self.after_each.as_ref(),
            HookKind::After => self.after.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: HookKind) -> &mut Option<Hook> {
        match kind {
            HookKind::Before => &mut self.before,
            HookKind::BeforeEach => &mut self.before_each,
            HookKind::JustBeforeEach => &mut self.just_before_each,
            HookKind::AfterEach => &mut self.after_each,
            HookKind::After => &mut self.after,
        }
    }

    pub fn is_empty(&self) -> bool {
        HookKind::ALL.into_iter().all(|kind| self.get(kind).is_none())
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(
                HookKind::ALL
                    .into_iter()
                    .filter(|kind| self.get(*kind).is_some()),
            )
            .finish()
    }
}

#[derive(Debug)]
pub enum Node {
    Group(Group),
    Leaf(Leaf),
}

#[derive(Debug)]
pub struct Group {
    name: Cow<'static, str>,
    full_name: String,
    hooks: HookSet,
    children: Vec<Node>,
}

impl Group {
    fn new(name: Cow<'static, str>, parent: &str) -> Self {
        Self {
            full_name: qualify(parent, &name),
            name,
            hooks: HookSet::default(),
            children: Vec::new(),
        }
    }

    fn root() -> Self {
        Self::new(Cow::Borrowed(""), "")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The names of all enclosing groups and this one, joined with `/`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// All leaves in this subtree, depth first in declaration order.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            stack: vec![self.children.iter()],
        }
    }

    /// Whether any leaf in this subtree would run under `matcher`.
    pub fn has_runnable(&self, matcher: &Matcher) -> bool {
        self.leaves().any(|leaf| leaf.is_runnable(matcher))
    }
}

pub struct Leaf {
    name: Cow<'static, str>,
    full_name: String,
    body: Option<Body>,
    excluded: bool,
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("full_name", &self.full_name)
            .field("mode", &self.mode())
            .finish()
    }
}

impl Leaf {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The names of all enclosing groups and this leaf, joined with `/`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn mode(&self) -> LeafMode {
        match (self.excluded, &self.body) {
            (true, _) => LeafMode::Excluded,
            (false, None) => LeafMode::Pending,
            (false, Some(Body::Sync(_))) => LeafMode::Sync,
            (false, Some(Body::Async(_))) => LeafMode::Async,
        }
    }

    /// Whether this leaf has a body to run and passes `matcher`.
    pub fn is_runnable(&self, matcher: &Matcher) -> bool {
        matches!(self.mode(), LeafMode::Sync | LeafMode::Async) && matcher.is_match(&self.full_name)
    }
}

/// Depth first iterator over the leaves of a [`Group`].
pub struct Leaves<'s> {
    stack: Vec<slice::Iter<'s, Node>>,
}

impl<'s> Iterator for Leaves<'s> {
    type Item = &'s Leaf;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                None => {
                    self.stack.pop();
                }
                Some(Node::Leaf(leaf)) => return Some(leaf),
                Some(Node::Group(group)) => self.stack.push(group.children.iter()),
            }
        }
    }
}

/// A fully constructed suite, ready to run.
#[derive(Debug)]
pub struct Suite {
    root: Group,
}

impl Suite {
    /// Construct a suite by evaluating `declare` against a fresh [`Registrar`].
    ///
    /// All group callbacks run immediately and to completion; leaf bodies and
    /// hooks are only stored. The first declaration error fails the whole
    /// construction.
    ///
    /// ```
    /// use kispec::prelude::*;
    ///
    /// let suite = Suite::build(|s| {
    ///     s.describe("Numbers", |s| {
    ///         s.it("adds", |ctx| ctx.assert(1 + 1).equal(2));
    ///     });
    /// })
    /// .unwrap();
    /// assert_eq!(suite.leaves().count(), 1);
    /// ```
    pub fn build(declare: impl FnOnce(&mut Registrar)) -> Result<Self, BuildError> {
        let mut registrar = Registrar::new();
        declare(&mut registrar);
        registrar.finish()
    }

    /// The unnamed root group holding all top level groups.
    pub fn root(&self) -> &Group {
        &self.root
    }

    pub fn leaves(&self) -> Leaves<'_> {
        self.root.leaves()
    }

    /// Run the suite with a [`Scheduler`] and report every outcome to `reporter`.
    pub fn run<R: Reporter>(&self, config: &RunConfig, reporter: R) -> RunReport {
        Scheduler::new(config, reporter).run(self)
    }
}

fn qualify(parent: &str, name: &str) -> String {
    match parent.is_empty() {
        true => name.to_string(),
        false => format!("{parent}/{name}"),
    }
}
