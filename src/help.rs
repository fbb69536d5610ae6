// ABOUTME: Help and documentation system -- first-class docs for builtins and user functions

use std::cell::RefCell;
use std::collections::HashMap;

/// A help entry for a function or special form.
#[derive(Debug, Clone)]
pub struct HelpEntry {
    pub name: String,
    pub signature: String,
    pub description: String,
    pub examples: Vec<String>,
    pub related: Vec<String>,
    pub category: String,
}

/// Registry for all function documentation.
pub struct HelpRegistry {
    entries: HashMap<String, HelpEntry>,
}

impl HelpRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn register(&mut self, entry: HelpEntry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    pub fn get(&self, name: &str) -> Option<HelpEntry> {
        self.entries.get(name).cloned()
    }

    pub fn by_category(&self) -> HashMap<String, Vec<HelpEntry>> {
        let mut by_cat: HashMap<String, Vec<HelpEntry>> = HashMap::new();
        for entry in self.entries.values() {
            by_cat.entry(entry.category.clone()).or_default().push(entry.clone());
        }
        for entries in by_cat.values_mut() {
            entries.sort_by(|a, b| a.name.cmp(&b.name));
        }
        by_cat
    }

    pub fn all_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Entries whose name, summary, or examples contain `query`, for `searchdoc`.
    pub fn search(&self, query: &str) -> Vec<HelpEntry> {
        let needle = query.to_lowercase();
        let mut hits: Vec<HelpEntry> = self
            .entries
            .values()
            .filter(|e| {
                e.name.to_lowercase().contains(&needle)
                    || e.description.to_lowercase().contains(&needle)
                    || e.examples.iter().any(|ex| ex.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        hits
    }
}

impl Default for HelpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static HELP_REGISTRY: RefCell<HelpRegistry> = RefCell::new(HelpRegistry::new());
}

/// Register a help entry in the global registry. Called by each builtin's
/// generated `register_<fn>` (see `fuel-macros::builtin`) as it binds itself
/// into the root scope, so documentation always travels with its function.
pub fn register_help(entry: HelpEntry) {
    HELP_REGISTRY.with(|reg| {
        reg.borrow_mut().register(entry);
    });
}

pub fn get_help(name: &str) -> Option<HelpEntry> {
    HELP_REGISTRY.with(|reg| reg.borrow().get(name))
}

pub fn all_by_category() -> HashMap<String, Vec<HelpEntry>> {
    HELP_REGISTRY.with(|reg| reg.borrow().by_category())
}

pub fn all_names() -> Vec<String> {
    HELP_REGISTRY.with(|reg| reg.borrow().all_names())
}

pub fn search_help(query: &str) -> Vec<HelpEntry> {
    HELP_REGISTRY.with(|reg| reg.borrow().search(query))
}

/// Format a single help entry for display, as `(help 'name)` and the
/// debugger's `doc` command print it.
pub fn format_help_entry(entry: &HelpEntry) -> String {
    let mut output = String::new();

    output.push_str(&format!("{} - {}\n", entry.name, entry.category));
    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    output.push_str("Signature:\n");
    for sig_line in entry.signature.lines() {
        output.push_str(&format!("  {}\n", sig_line));
    }
    output.push('\n');

    output.push_str("Description:\n");
    for line in entry.description.lines() {
        output.push_str(&format!("  {}\n", line));
    }
    output.push('\n');

    if !entry.examples.is_empty() {
        output.push_str("Examples:\n");
        for example in &entry.examples {
            output.push_str("  ");
            output.push_str(example);
            output.push('\n');
        }
        output.push('\n');
    }

    if !entry.related.is_empty() {
        output.push_str("Related:\n");
        output.push_str(&format!("  {}\n", entry.related.join(", ")));
        output.push('\n');
    }

    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    output
}

/// Format the quick reference shown by `(help)` with no arguments.
pub fn format_quick_reference() -> String {
    let mut output = String::new();

    let by_cat = all_by_category();
    let total = by_cat.values().map(|v| v.len()).sum::<usize>();

    output.push_str(&format!("Available Functions ({} total)\n", total));
    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    let categories = vec![
        "Control",
        "Arithmetic",
        "Comparison",
        "Logic",
        "Lists",
        "Strings",
        "Types",
        "Console I/O",
        "Macros",
        "Introspection",
    ];

    for category in categories {
        if let Some(entries) = by_cat.get(category) {
            let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
            output.push_str(&format!("{} ({})\n", category, names.len()));
            output.push_str(&format!("  {}\n\n", names.join(", ")));
        }
    }

    output.push_str("Type (help 'function-name) for detailed help.\n");
    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_register_and_get() {
        let mut registry = HelpRegistry::new();
        registry.register(HelpEntry {
            name: "test-fn".to_string(),
            signature: "(test-fn x)".to_string(),
            description: "Test function".to_string(),
            examples: vec![],
            related: vec![],
            category: "Test".to_string(),
        });
        assert_eq!(registry.get("test-fn").unwrap().name, "test-fn");
    }

    #[test]
    fn registry_groups_by_category() {
        let mut registry = HelpRegistry::new();
        for name in ["fn1", "fn2"] {
            registry.register(HelpEntry {
                name: name.to_string(),
                signature: String::new(),
                description: String::new(),
                examples: vec![],
                related: vec![],
                category: "Arithmetic".to_string(),
            });
        }
        assert_eq!(registry.by_category()["Arithmetic"].len(), 2);
    }

    #[test]
    fn format_help_entry_includes_sections() {
        let entry = HelpEntry {
            name: "test".to_string(),
            signature: "(test x)".to_string(),
            description: "A test function".to_string(),
            examples: vec!["(test 1)".to_string()],
            related: vec!["other".to_string()],
            category: "Test".to_string(),
        };
        let formatted = format_help_entry(&entry);
        assert!(formatted.contains("test - Test"));
        assert!(formatted.contains("A test function"));
        assert!(formatted.contains("(test 1)"));
    }

    #[test]
    fn search_matches_name_and_description() {
        let mut registry = HelpRegistry::new();
        registry.register(HelpEntry {
            name: "car".to_string(),
            signature: "(car list)".to_string(),
            description: "Returns the first element".to_string(),
            examples: vec![],
            related: vec![],
            category: "Lists".to_string(),
        });
        assert_eq!(registry.search("first").len(), 1);
        assert_eq!(registry.search("nonexistent").len(), 0);
    }
}
