//! Named commands and the keybindings that trigger them.

use std::rc::Rc;

use crate::editor::ToolContext;
use crate::foundation::callback::CallbackHandle;
use crate::foundation::registry::NamedRegistry;

/// A command body.
pub type Command = dyn Fn(&mut ToolContext<'_>);

/// Commands by name plus a `binding -> command` table. Clones share both tables.
#[derive(Clone, Debug, Default)]
pub struct CommandRegistry {
    commands: NamedRegistry<Command>,
    bindings: NamedRegistry<str>,
}

impl CommandRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `name`; releasing the handle removes it.
    pub fn register(
        &self,
        name: impl Into<String>,
        f: impl Fn(&mut ToolContext<'_>) + 'static,
    ) -> CallbackHandle {
        let f: Rc<Command> = Rc::new(f);
        self.commands.register(name, f)
    }

    /// Command `name`.
    pub fn get(&self, name: &str) -> Option<Rc<Command>> {
        self.commands.get(name)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains(name)
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.commands.names()
    }

    /// Bind `binding` (see [`crate::KeyEvent::binding`]) to `command`.
    pub fn bind(&self, binding: impl Into<String>, command: &str) -> CallbackHandle {
        self.bindings.register(binding, Rc::from(command))
    }

    /// Command bound to `binding`.
    pub fn command_for(&self, binding: &str) -> Option<Rc<str>> {
        self.bindings.get(binding)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/managers/commands.rs"]
mod tests;
