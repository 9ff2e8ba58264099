use std::collections::HashSet;

use crate::catalog::CatalogSource;
use crate::models::{BoolOperator, ConditionNode, SearchContext};

mod leaf;

use leaf::{CATEGORY_ID_FIELD, LeafScope, translate};

#[derive(Debug)]
enum Item {
    Leaf(String),
    Group(Vec<Joined>),
}

#[derive(Debug)]
struct Joined {
    operator: Option<BoolOperator>,
    item: Item,
}

/// A group that is still receiving nodes, with the operator joining it to its parent.
#[derive(Debug, Default)]
struct OpenGroup {
    operator: Option<BoolOperator>,
    items: Vec<Joined>,
}

fn close_group(stack: &mut Vec<OpenGroup>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(open) = stack.pop()
        && let Some(parent) = stack.last_mut()
    {
        parent.items.push(Joined {
            operator: open.operator,
            item: Item::Group(open.items),
        });
    }
}

fn render_items(items: &[Joined], out: &mut String) {
    for (idx, joined) in items.iter().enumerate() {
        if idx > 0 {
            out.push(' ');
            out.push_str(joined.operator.unwrap_or(BoolOperator::And).as_str());
            out.push(' ');
        }
        render_item(&joined.item, out);
    }
}

fn render_item(item: &Item, out: &mut String) {
    match item {
        Item::Leaf(text) => out.push_str(text),
        Item::Group(items) => match items.as_slice() {
            [single] => render_item(&single.item, out),
            _ => {
                out.push('(');
                render_items(items, out);
                out.push(')');
            }
        },
    }
}

/// Compiles level-tagged condition sequences into boolean filter expressions.
pub struct ExpressionCompiler<'a> {
    scope: LeafScope<'a>,
}

impl<'a> ExpressionCompiler<'a> {
    pub fn new(catalog: &'a dyn CatalogSource, catalog_id: &'a str, country: &'a str) -> Self {
        Self {
            scope: LeafScope {
                catalog,
                catalog_id,
                country,
            },
        }
    }

    pub fn for_context(catalog: &'a dyn CatalogSource, context: &'a SearchContext) -> Self {
        Self::new(catalog, &context.catalog_id, &context.country)
    }

    /// A level increase opens one group per unit and a decrease closes one per unit.
    /// The opening node's operator joins the new group to its parent; groups
    /// holding a single item are emitted without parentheses.
    #[must_use]
    pub fn compile(&self, conditions: &[ConditionNode]) -> String {
        let Some(root_level) = conditions.iter().map(|node| node.nesting_level).min() else {
            return String::new();
        };

        let mut stack = vec![OpenGroup::default()];
        let mut current_level = root_level;
        for (idx, node) in conditions.iter().enumerate() {
            let operator = (idx > 0).then(|| node.operator.unwrap_or(BoolOperator::And));
            let leaf = Item::Leaf(translate(node.leaf, &node.value, &self.scope));

            let leaf_operator = if node.nesting_level > current_level {
                for step in 0..(node.nesting_level - current_level) {
                    stack.push(OpenGroup {
                        operator: if step == 0 { operator } else { None },
                        items: Vec::new(),
                    });
                }
                None
            } else {
                for _ in 0..(current_level - node.nesting_level) {
                    close_group(&mut stack);
                }
                operator
            };
            if let Some(top) = stack.last_mut() {
                top.items.push(Joined {
                    operator: leaf_operator,
                    item: leaf,
                });
            }
            current_level = node.nesting_level;
        }
        while stack.len() > 1 {
            close_group(&mut stack);
        }

        let mut out = String::new();
        if let Some(root) = stack.first() {
            render_items(&root.items, &mut out);
        }
        out
    }

    /// Filter of a rule-based category: its own id, its compiled conditions and,
    /// recursively, the filters of its children, joined with `OR`.
    #[must_use]
    pub fn compile_rule_category(&self, category_id: &str) -> String {
        let mut visited = HashSet::new();
        self.rule_category_filter(category_id, &mut visited)
    }

    fn rule_category_filter(&self, category_id: &str, visited: &mut HashSet<String>) -> String {
        if !visited.insert(category_id.to_string()) {
            return String::new();
        }
        let mut parts = vec![format!("({CATEGORY_ID_FIELD}:{category_id})")];
        if let Some(conditions) = self.scope.catalog.rule_conditions_of(category_id) {
            let compiled = self.compile(&conditions);
            if !compiled.is_empty() {
                parts.push(format!("({compiled})"));
            }
        }
        for child in self.scope.catalog.child_categories_of(category_id) {
            let child_filter = self.rule_category_filter(&child, visited);
            if !child_filter.is_empty() {
                parts.push(format!("({child_filter})"));
            }
        }
        parts.join(" OR ")
    }
}

#[cfg(test)]
mod tests;
