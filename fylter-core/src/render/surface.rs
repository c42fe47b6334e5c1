//! In-memory mounting surface.
//!
//! A surface is a node in a small tree of text blocks. Each block carries a
//! set of class names and the lines drawn into it. Filter sets mount every
//! filter in its own child surface; [`Surface::render`] flattens the tree
//! into text for a terminal or a log.

use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct SurfaceInner {
    classes: IndexSet<String>,
    lines: Vec<String>,
    /// Available width in columns. `None` means unbounded.
    width: Option<usize>,
    children: Vec<Surface>,
}

/// A shared handle to a drawing surface. Clones refer to the same surface.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    inner: Arc<Mutex<SurfaceInner>>,
}

impl Surface {
    /// Create an unbounded surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a surface limited to `width` columns.
    pub fn with_width(width: usize) -> Self {
        let surface = Self::new();
        surface.inner.lock().width = Some(width);
        surface
    }

    /// Append a child surface. The child inherits this surface's width.
    pub fn append_child(&self) -> Surface {
        let mut inner = self.inner.lock();
        let child = Surface::new();
        child.inner.lock().width = inner.width;
        inner.children.push(child.clone());
        child
    }

    pub fn children(&self) -> Vec<Surface> {
        self.inner.lock().children.clone()
    }

    pub fn width(&self) -> Option<usize> {
        self.inner.lock().width
    }

    /// Add a class name. Whitespace separates several classes.
    pub fn add_class(&self, class: &str) {
        let mut inner = self.inner.lock();
        for class in class.split_whitespace() {
            inner.classes.insert(class.to_string());
        }
    }

    /// Remove a class name. Whitespace separates several classes.
    pub fn remove_class(&self, class: &str) {
        let mut inner = self.inner.lock();
        for class in class.split_whitespace() {
            inner.classes.shift_remove(class);
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.inner.lock().classes.contains(class)
    }

    pub fn classes(&self) -> Vec<String> {
        self.inner.lock().classes.iter().cloned().collect()
    }

    /// Replace the drawn content.
    pub fn set_lines(&self, lines: Vec<String>) {
        self.inner.lock().lines = lines;
    }

    pub fn lines(&self) -> Vec<String> {
        self.inner.lock().lines.clone()
    }

    pub fn clear(&self) {
        self.inner.lock().lines.clear();
    }

    /// Flatten this surface and its children into text, one line per row.
    pub fn render(&self) -> String {
        let mut out = Vec::new();
        self.render_into(&mut out);
        out.join("\n")
    }

    fn render_into(&self, out: &mut Vec<String>) {
        let (lines, children) = {
            let inner = self.inner.lock();
            (inner.lines.clone(), inner.children.clone())
        };
        out.extend(lines);
        for child in children {
            child.render_into(out);
        }
    }

    /// Whether two handles refer to the same surface.
    pub fn ptr_eq(&self, other: &Surface) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_inherit_width() {
        let root = Surface::with_width(20);
        let child = root.append_child();
        assert_eq!(child.width(), Some(20));
        assert_eq!(root.children().len(), 1);
        assert!(root.children()[0].ptr_eq(&child));
    }

    #[test]
    fn classes_split_on_whitespace() {
        let surface = Surface::new();
        surface.add_class("filter filter--season");
        assert!(surface.has_class("filter"));
        assert!(surface.has_class("filter--season"));

        surface.remove_class("filter--season");
        assert_eq!(surface.classes(), vec!["filter".to_string()]);

        surface.add_class("filter--season filter--wide");
        surface.remove_class("filter filter--wide");
        assert_eq!(surface.classes(), vec!["filter--season".to_string()]);
    }

    #[test]
    fn render_flattens_tree() {
        let root = Surface::new();
        root.set_lines(vec!["filters".into()]);
        let first = root.append_child();
        first.set_lines(vec!["competition".into(), "> All".into()]);
        let second = root.append_child();
        second.set_lines(vec!["season".into()]);

        assert_eq!(root.render(), "filters\ncompetition\n> All\nseason");

        first.clear();
        assert_eq!(root.render(), "filters\nseason");
    }
}
