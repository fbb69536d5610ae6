//! Procedural macros backing FUEL's builtin registration
//!
//! Provides the `#[builtin]` attribute macro for defining FUEL builtins with
//! rustdoc-style documentation that is automatically converted into help
//! registry entries and a scope-registration function, so a primitive's
//! documentation lives next to its implementation instead of in a separate
//! table.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, ItemFn, Meta};

/// A parsed markdown documentation with structured sections
#[derive(Debug, Clone)]
struct DocMarkdown {
    summary: String,
    examples: Vec<String>,
    see_also: Vec<String>,
}

/// Extract rustdoc comments from function attributes
fn extract_doc_comments(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            if attr.path().is_ident("doc") {
                if let Meta::NameValue(nv) = &attr.meta {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(lit_str),
                        ..
                    }) = &nv.value
                    {
                        return Some(lit_str.value());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse markdown sections (`# Examples`, `# See Also`) from documentation,
/// the rest is kept as the summary.
fn parse_doc_markdown(raw_doc: &str) -> DocMarkdown {
    let mut summary = String::new();
    let mut examples = Vec::new();
    let mut see_also = Vec::new();
    let mut current_section = "summary";
    let mut current_content = String::new();

    let mut flush = |section: &str, content: &str, summary: &mut String, examples: &mut Vec<String>, see_also: &mut Vec<String>| match section {
        "summary" => *summary = content.trim().to_string(),
        "examples" => {
            for code_block in content.split("```") {
                let trimmed_block = code_block.trim();
                if let Some(code_str) = trimmed_block.strip_prefix("lisp") {
                    let code = code_str.trim().to_string();
                    if !code.is_empty() {
                        examples.push(code);
                    }
                }
            }
        }
        "see also" => {
            *see_also = content
                .trim()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        _ => {}
    };

    for line in raw_doc.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("# ") {
            flush(current_section, &current_content, &mut summary, &mut examples, &mut see_also);
            let header = rest.trim().to_lowercase();
            current_section = if header.contains("example") {
                "examples"
            } else if header.contains("see") || header.contains("related") {
                "see also"
            } else {
                "other"
            };
            current_content.clear();
        } else {
            current_content.push_str(line);
            current_content.push('\n');
        }
    }
    flush(current_section, &current_content, &mut summary, &mut examples, &mut see_also);

    DocMarkdown { summary, examples, see_also }
}

/// Parse `#[builtin(...)]` arguments: `name = "..."`, `category = "..."`,
/// `related(a, b)`, and the bare `special_form` flag.
fn parse_builtin_args(attr_stream: TokenStream) -> (String, String, Vec<String>, bool) {
    let attr_str = attr_stream.to_string();

    let mut name = String::new();
    let mut category = String::new();
    let mut related = Vec::new();
    let special_form = attr_str.contains("special_form");

    if let Some(start) = attr_str.find("name = \"") {
        let rest = &attr_str[start + 8..];
        if let Some(end) = rest.find('"') {
            name = rest[..end].to_string();
        }
    }

    if let Some(start) = attr_str.find("category = \"") {
        let rest = &attr_str[start + 12..];
        if let Some(end) = rest.find('"') {
            category = rest[..end].to_string();
        }
    }

    if let Some(start) = attr_str.find("related") {
        let rest = &attr_str[start..];
        if let (Some(paren_start), Some(paren_end)) = (rest.find('('), rest.find(')')) {
            let related_str = &rest[paren_start + 1..paren_end];
            related = related_str
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    (name, category, related, special_form)
}

/// Attribute macro defining a FUEL builtin.
///
/// Expects a function of shape `fn(args: &[Value], scope: &Rc<Scope>) ->
/// Result<Value, FuelError>`. Extracts rustdoc comments and generates a
/// sibling `register_<fn>(scope: &Rc<Scope>)` that binds a
/// `Value::Function` wrapper into the given scope and registers a matching
/// help entry. `special_form` in the attribute arguments sets
/// `is_special_form` on the generated `FunctionWrapper`, so the function
/// receives its argument subtrees unevaluated (see the evaluator's
/// dispatch rule).
///
/// ```ignore
/// #[builtin(name = "+", category = "Arithmetic", related(sub, mul, div))]
/// /// Returns the sum of all arguments.
/// pub fn add(args: &[Value], _scope: &Rc<Scope>) -> Result<Value, FuelError> {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn builtin(attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);

    let (lisp_name, category, related, special_form) = parse_builtin_args(attr);

    let fn_name = func.sig.ident.clone();
    let fn_ident_str = fn_name.to_string();

    let name_to_use = if !lisp_name.is_empty() { lisp_name } else { fn_ident_str.clone() };

    let raw_docs = extract_doc_comments(&func.attrs);
    let parsed_docs = parse_doc_markdown(&raw_docs);
    let description = parsed_docs.summary.clone();

    let register_fn_name = quote::format_ident!("register_{}", fn_name);

    let examples = parsed_docs.examples.clone();
    let related_vec = if related.is_empty() { parsed_docs.see_also.clone() } else { related };
    let cat_to_use = if !category.is_empty() { category } else { "Other".to_string() };
    let signature = format!("({} ...)", name_to_use);

    let expanded = quote! {
        #func

        #[allow(dead_code)]
        pub fn #register_fn_name(scope: &std::rc::Rc<crate::scope::Scope>) {
            scope.define(
                #name_to_use,
                crate::value::Value::Function(std::rc::Rc::new(crate::value::FunctionWrapper::new(
                    std::rc::Rc::new(#fn_name),
                    #signature,
                    #description,
                    #special_form,
                    true,
                ))),
            );
            crate::help::register_help(crate::help::HelpEntry {
                name: #name_to_use.to_string(),
                signature: #signature.to_string(),
                description: #description.to_string(),
                examples: vec![#(#examples.to_string()),*],
                related: vec![#(#related_vec.to_string()),*],
                category: #cat_to_use.to_string(),
            });
        }
    };

    TokenStream::from(expanded)
}
