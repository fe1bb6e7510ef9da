//! Selector lookups over a tree.
//!
//! Selectors name node kinds by their stable names:
//!
//! | selector     | matches                                               |
//! |--------------|-------------------------------------------------------|
//! | `kind`       | the node itself and every descendant of `kind`        |
//! | `kind[i]`    | the `i`th of those                                    |
//! | `^kind`      | direct children of `kind`                             |
//! | `^kind[i]`   | the `i`th of those                                    |
//! | `@i`         | the `i`th child, not counting trivia                  |
//! | `a > b`      | `b` children of every `a` match                       |
//! | `a b`        | `b` descendants of every `a` match                    |
//! | `a, b`       | matches of `a` followed by matches of `b`             |

use crate::cst::SyntaxNode;

/// `kind` or `kind[i]`.
fn indexed(selector: &str) -> (&str, Option<usize>) {
    if let Some(rest) = selector.strip_suffix(']') {
        if let Some((kind, index)) = rest.split_once('[') {
            if let Ok(index) = index.trim().parse() {
                return (kind.trim(), Some(index));
            }
        }
    }
    (selector, None)
}

fn pick<T>(mut matches: Vec<T>, index: Option<usize>) -> Vec<T> {
    match index {
        None => matches,
        Some(i) if i < matches.len() => vec![matches.swap_remove(i)],
        Some(_) => Vec::new(),
    }
}

impl<'a> SyntaxNode<'a> {
    /// First match of `selector`.
    #[must_use]
    pub fn find(&self, selector: &str) -> Option<Self> {
        self.find_all(selector).into_iter().next()
    }

    /// Every match of `selector`, in document order per clause.
    #[must_use]
    pub fn find_all(&self, selector: &str) -> Vec<Self> {
        let selector = selector.trim();

        if selector.contains(',') {
            return selector
                .split(',')
                .flat_map(|clause| self.find_all(clause))
                .collect();
        }

        if let Some(position) = selector.strip_prefix('@') {
            return position
                .parse::<usize>()
                .ok()
                .and_then(|i| self.children().filter(|c| !c.kind().is_trivia()).nth(i))
                .into_iter()
                .collect();
        }

        if let Some(rest) = selector.strip_prefix('^') {
            let (kind, index) = indexed(rest);
            let matches = self
                .children()
                .filter(|c| c.kind().as_str() == kind)
                .collect();
            return pick(matches, index);
        }

        if selector.contains('>') {
            let mut parts = selector.split('>').map(str::trim);
            let first = parts.next().unwrap_or_default();
            return parts.fold(self.find_all(first), |parents, kind| {
                parents
                    .iter()
                    .flat_map(|parent| parent.children().filter(move |c| c.kind().as_str() == kind))
                    .collect()
            });
        }

        if selector.contains(char::is_whitespace) {
            let mut parts = selector.split_whitespace();
            let first = parts.next().unwrap_or_default();
            return parts.fold(self.find_all(first), |ancestors, kind| {
                ancestors
                    .iter()
                    .flat_map(|ancestor| {
                        ancestor
                            .descendants()
                            .skip(1)
                            .filter(move |d| d.kind().as_str() == kind)
                    })
                    .collect()
            });
        }

        let (kind, index) = indexed(selector);
        let matches = self
            .descendants()
            .filter(|d| d.kind().as_str() == kind)
            .collect();
        pick(matches, index)
    }
}
