use std::{borrow::Cow, sync::Arc};

use crate::{
    context::{Ctx, Done},
    suite::{Body, Group, Hook, HookKind, Leaf, Node, Suite, qualify},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("`{hook}` hook declared outside of any group")]
    HookOutsideGroup { hook: HookKind },

    #[error("leaf `{name}` declared outside of any group")]
    LeafOutsideGroup { name: String },

    #[error("group `{group}` already has a `{hook}` hook")]
    DuplicateHook { group: String, hook: HookKind },
}

/// The declarative construction API of a [`Suite`].
///
/// Every declaration attaches to the innermost group that is currently being
/// declared. Group callbacks passed to [`describe`](Self::describe) run
/// immediately, leaf bodies and hooks are only stored.
///
/// Declaration errors do not stop the evaluation of the callbacks, the first
/// one is returned from [`Suite::build`].
#[derive(Debug)]
pub struct Registrar {
    root: Group,
    open: Vec<Group>,
    excluded_depth: usize,
    error: Option<BuildError>,
}

impl Registrar {
    pub(super) fn new() -> Self {
        Self {
            root: Group::root(),
            open: Vec::new(),
            excluded_depth: 0,
            error: None,
        }
    }

    pub(super) fn finish(self) -> Result<Suite, BuildError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(Suite { root: self.root }),
        }
    }

    /// Declare a group and evaluate its contents right away.
    pub fn describe(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        declare: impl FnOnce(&mut Self),
    ) {
        let group = Group::new(name.into(), self.innermost().full_name());
        self.open.push(group);
        declare(self);
        if let Some(group) = self.open.pop() {
            self.innermost_mut().children.push(Node::Group(group));
        }
    }

    /// Declare a group whose leaves are all excluded.
    ///
    /// The group is still part of the tree, but since none of its leaves can
    /// run, none of its hooks will ever fire.
    pub fn xdescribe(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        declare: impl FnOnce(&mut Self),
    ) {
        self.excluded_depth += 1;
        self.describe(name, declare);
        self.excluded_depth -= 1;
    }

    /// Declare a synchronous leaf.
    pub fn it(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        body: impl Fn(&Ctx) + Send + Sync + 'static,
    ) {
        self.leaf(name.into(), Some(Body::Sync(Arc::new(body))), false);
    }

    /// Declare an asynchronous leaf that finishes once [`Done`] is invoked.
    pub fn it_async(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        body: impl Fn(&Ctx, Done) + Send + Sync + 'static,
    ) {
        self.leaf(name.into(), Some(Body::Async(Arc::new(body))), false);
    }

    /// Declare a leaf without a body.
    pub fn it_pending(&mut self, name: impl Into<Cow<'static, str>>) {
        self.leaf(name.into(), None, false);
    }

    /// Declare a synchronous leaf that never runs.
    pub fn xit(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        body: impl Fn(&Ctx) + Send + Sync + 'static,
    ) {
        self.leaf(name.into(), Some(Body::Sync(Arc::new(body))), true);
    }

    /// Declare an asynchronous leaf that never runs.
    pub fn xit_async(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        body: impl Fn(&Ctx, Done) + Send + Sync + 'static,
    ) {
        self.leaf(name.into(), Some(Body::Async(Arc::new(body))), true);
    }

    /// Entry point for skipped leaves, `s.skip().it(..)` equals `s.xit(..)`.
    pub fn skip(&mut self) -> Skip<'_> {
        Skip(self)
    }

    /// Runs once before the first runnable leaf of this group.
    pub fn before(&mut self, hook: impl Fn(&Ctx) + Send + Sync + 'static) {
        self.hook(HookKind::Before, Arc::new(hook));
    }

    /// Runs before every leaf in this group, outer groups first.
    pub fn before_each(&mut self, hook: impl Fn(&Ctx) + Send + Sync + 'static) {
        self.hook(HookKind::BeforeEach, Arc::new(hook));
    }

    /// Runs before every leaf in this group, after all `before_each` hooks of the chain.
    pub fn just_before_each(&mut self, hook: impl Fn(&Ctx) + Send + Sync + 'static) {
        self.hook(HookKind::JustBeforeEach, Arc::new(hook));
    }

    /// Runs after every leaf in this group, inner groups first.
    pub fn after_each(&mut self, hook: impl Fn(&Ctx) + Send + Sync + 'static) {
        self.hook(HookKind::AfterEach, Arc::new(hook));
    }

    /// Runs once after all leaves of this group, if [`before`](Self::before) had its turn.
    pub fn after(&mut self, hook: impl Fn(&Ctx) + Send + Sync + 'static) {
        self.hook(HookKind::After, Arc::new(hook));
    }

    fn innermost(&self) -> &Group {
        self.open.last().unwrap_or(&self.root)
    }

    fn innermost_mut(&mut self) -> &mut Group {
        self.open.last_mut().unwrap_or(&mut self.root)
    }

    fn leaf(&mut self, name: Cow<'static, str>, body: Option<Body>, excluded: bool) {
        let excluded = excluded || self.excluded_depth > 0;
        let Some(group) = self.open.last_mut() else {
            let name = name.into_owned();
            return self.reject(BuildError::LeafOutsideGroup { name });
        };

        group.children.push(Node::Leaf(Leaf {
            full_name: qualify(&group.full_name, &name),
            name,
            body,
            excluded,
        }));
    }

    fn hook(&mut self, kind: HookKind, hook: Hook) {
        let Some(group) = self.open.last_mut() else {
            return self.reject(BuildError::HookOutsideGroup { hook: kind });
        };

        let slot = group.hooks.slot_mut(kind);
        if slot.is_some() {
            let group = group.full_name.clone();
            return self.reject(BuildError::DuplicateHook { group, hook: kind });
        }
        *slot = Some(hook);
    }

    fn reject(&mut self, error: BuildError) {
        self.error.get_or_insert(error);
    }
}

/// Declarations through [`Registrar::skip`].
pub struct Skip<'r>(&'r mut Registrar);

impl Skip<'_> {
    pub fn it(
        self,
        name: impl Into<Cow<'static, str>>,
        body: impl Fn(&Ctx) + Send + Sync + 'static,
    ) {
        self.0.xit(name, body);
    }

    pub fn it_async(
        self,
        name: impl Into<Cow<'static, str>>,
        body: impl Fn(&Ctx, Done) + Send + Sync + 'static,
    ) {
        self.0.xit_async(name, body);
    }
}
