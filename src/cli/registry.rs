use std::collections::HashMap;

use super::{CliContext, CliError, CliResult};

/// How a command is invoked. Standalone commands run without loading the
/// configuration or opening the bill file.
#[derive(Clone, Copy)]
pub enum CommandHandler {
    Standalone(fn(&[String]) -> CliResult),
    WithContext(fn(&CliContext, &[String]) -> CliResult),
}

pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub const fn standalone(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: fn(&[String]) -> CliResult,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler: CommandHandler::Standalone(handler),
        }
    }

    pub const fn with_context(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: fn(&CliContext, &[String]) -> CliResult,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler: CommandHandler::WithContext(handler),
        }
    }

    /// Error pointing the user at this command's argument shape.
    pub fn usage_error(&self) -> CliError {
        CliError::Usage(format!("usage: {}", self.usage))
    }
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandEntry>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn register(&mut self, entry: CommandEntry) {
        let name = entry.name;
        if self.commands.insert(name, entry).is_none() {
            self.order.push(name);
        }
    }

    /// Looks up `name`, failing with a hint when the command is unknown.
    pub fn resolve(&self, name: &str) -> Result<&CommandEntry, CliError> {
        self.commands.get(name).ok_or_else(|| {
            CliError::Usage(format!("unknown command `{name}`; run `help` for a list"))
        })
    }

    /// Usage error for a registered command, falling back to a bare message.
    pub fn usage_error(&self, name: &str) -> CliError {
        self.commands
            .get(name)
            .map(CommandEntry::usage_error)
            .unwrap_or_else(|| CliError::Usage(format!("bad arguments to `{name}`")))
    }

    pub fn list(&self) -> Vec<&CommandEntry> {
        self.order
            .iter()
            .filter_map(|name| self.commands.get(name))
            .collect()
    }
}
