//! Editing-context switching
//!
//! Whenever the tag under the cursor changes, the crucial variables of the
//! backend owning the new region replace the document's, and the values
//! they replaced are stashed so leaving the region restores them exactly.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::backend::{Backend, Registry, Tag};
use crate::locals::{Bindings, Value};

/// The editing context currently in force
#[derive(Debug, Clone)]
pub struct EditingContext {
    pub tag: Tag,
    /// Backend whose crucial variables are installed; `None` in host text
    /// or when the region's backend is unavailable
    pub backend: Option<Arc<Backend>>,
}

impl Default for EditingContext {
    fn default() -> Self {
        Self {
            tag: Tag::Host,
            backend: None,
        }
    }
}

/// Decide the context for `cursor_tag`, or `None` when it is already active
pub fn next_context(cursor_tag: Tag, current: &EditingContext, registry: &Registry) -> Option<EditingContext> {
    if cursor_tag == current.tag {
        return None;
    }
    let backend = cursor_tag.backend().and_then(|id| registry.backend(id));
    Some(EditingContext {
        tag: cursor_tag,
        backend,
    })
}

/// Host values displaced by a backend; `None` marks a name that was unset
type Stash = BTreeMap<String, Option<Value>>;

/// Keeps the document's variables in step with the cursor's region
#[derive(Debug, Default)]
pub struct StateSwitch {
    context: EditingContext,
    stash: Option<Stash>,
}

impl StateSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> &EditingContext {
        &self.context
    }

    pub fn active_backend(&self) -> Option<&Arc<Backend>> {
        self.context.backend.as_ref()
    }

    /// Bring `locals` in line with `cursor_tag`
    ///
    /// Returns true when the context changed.
    pub fn sync(&mut self, cursor_tag: Tag, locals: &mut Bindings, registry: &Registry) -> bool {
        let Some(next) = next_context(cursor_tag, &self.context, registry) else {
            return false;
        };
        self.activate(next, locals);
        true
    }

    fn activate(&mut self, next: EditingContext, locals: &mut Bindings) {
        if let Some(stash) = self.stash.take() {
            for (name, value) in stash {
                match value {
                    Some(value) => locals.set(&name, value),
                    None => {
                        locals.remove(&name);
                    }
                }
            }
        }

        if let Some(backend) = &next.backend {
            let crucial = backend.crucial();
            let stash = crucial
                .names()
                .map(|name| (name.to_string(), locals.get(name).cloned()))
                .collect();
            crucial.apply_to(locals);
            self.stash = Some(stash);
        }

        debug!(
            from = ?self.context.tag,
            to = ?next.tag,
            backend = next.backend.as_ref().map(|b| b.name()),
            "switched editing context"
        );
        self.context = next;
    }
}
