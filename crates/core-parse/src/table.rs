//! The macro table: a single flat namespace of user macros.

use core_diag::{ErrorReporter, SourceLocation};
use core_lexer::Token;
use std::collections::HashMap;

/// A user macro. Object-like macros have an empty parameter list; the name
/// alone triggers substitution. Function-like macros require `(…)` with
/// matching arity at every call site.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Token>,
    pub loc: SourceLocation,
}

#[derive(Debug, Default)]
pub struct MacroTable {
    table: HashMap<String, Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a macro. Redefining an existing name is an error; the
    /// diagnostic points at the new definition with a note at the old one.
    pub fn define(&mut self, mac: Macro, diags: &mut ErrorReporter) -> bool {
        if let Some(existing) = self.table.get(&mac.name) {
            diags.error(mac.loc.clone(), format!("macro '{}' redefined", mac.name));
            diags.note(existing.loc.clone(), "previous definition was here");
            return false;
        }
        tracing::trace!(target: "expand.table", name = %mac.name, params = mac.params.len(), "define");
        self.table.insert(mac.name.clone(), mac);
        true
    }

    pub fn undef(&mut self, name: &str) {
        if self.table.remove(name).is_some() {
            tracing::trace!(target: "expand.table", name, "undef");
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Macro> {
        self.table.get(name)
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_macro(name: &str, value: i32) -> Macro {
        Macro {
            name: name.to_string(),
            params: vec![],
            body: vec![Token::make_int(value, SourceLocation::new("t", 1, 1))],
            loc: SourceLocation::new("t", 1, 1),
        }
    }

    #[test]
    fn define_lookup_undef() {
        let mut diags = ErrorReporter::silent();
        let mut table = MacroTable::new();
        assert!(table.define(int_macro("X", 1), &mut diags));
        assert!(table.lookup("X").is_some());
        table.undef("X");
        assert!(table.lookup("X").is_none());
        assert!(!diags.has_errors());
    }

    #[test]
    fn redefinition_reports_error_with_note() {
        let mut diags = ErrorReporter::silent();
        let mut table = MacroTable::new();
        table.define(int_macro("X", 1), &mut diags);
        assert!(!table.define(int_macro("X", 2), &mut diags));
        let msgs: Vec<_> = diags.diagnostics().iter().map(|d| d.to_string()).collect();
        assert!(msgs[0].contains("error: macro 'X' redefined"));
        assert!(msgs[1].contains("note: previous definition was here"));
        // the original definition survives
        assert_eq!(table.lookup("X").unwrap().body[0].int_value, 1);
    }
}
