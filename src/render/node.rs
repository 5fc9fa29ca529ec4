use crate::error::{Result, SqlsetError};
use crate::value::Value;

use super::context::RenderContext;
use super::template::{self, Segment};

/// One entry of a statement's render tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Fixed text, emitted verbatim.
    Literal(String),
    /// Raw templated body, evaluated against the parameter object on every walk.
    Templated(String),
    /// Ordered children, rendered by concatenation.
    Composite(Vec<Node>),
}

/// Source of one `?` in rendered text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placeholder {
    /// Literal `?`; the ordinal selects the next binding descriptor.
    Slot(usize),
    /// Bind marker; the path is resolved against the parameter object.
    Named(String),
}

/// Text and placeholder plan accumulated during one tree walk.
#[derive(Debug, Default)]
pub(crate) struct RenderBuffer {
    pub(crate) sql: String,
    pub(crate) plan: Vec<Placeholder>,
    slots: usize,
}

impl RenderBuffer {
    /// Appends text, recording a slot for every `?` outside a quoted literal.
    fn push_text(&mut self, text: &str) {
        let mut in_quote = false;
        for ch in text.chars() {
            match ch {
                '\'' => in_quote = !in_quote,
                '?' if !in_quote => {
                    self.plan.push(Placeholder::Slot(self.slots));
                    self.slots += 1;
                }
                _ => {}
            }
        }
        self.sql.push_str(text);
    }

    /// Appends an inlined value. A bare `?` would shift every later slot, so
    /// such values are rejected.
    fn push_inline(&mut self, path: &str, text: &str) -> Result<()> {
        let mut in_quote = false;
        for ch in text.chars() {
            match ch {
                '\'' => in_quote = !in_quote,
                '?' if !in_quote => {
                    return Err(SqlsetError::template(format!(
                        "inline value of `${{{path}}}` contains a `?` placeholder"
                    )))
                }
                _ => {}
            }
        }
        self.sql.push_str(text);
        Ok(())
    }

    fn push_bind(&mut self, path: String) {
        self.sql.push('?');
        self.plan.push(Placeholder::Named(path));
    }
}

impl Node {
    /// Literal node.
    pub fn literal(text: impl Into<String>) -> Self {
        Node::Literal(text.into())
    }

    /// Templated node.
    pub fn templated(body: impl Into<String>) -> Self {
        Node::Templated(body.into())
    }

    /// True for a composite without children or an empty literal.
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Literal(text) | Node::Templated(text) => text.is_empty(),
            Node::Composite(children) => children.iter().all(Node::is_empty),
        }
    }

    /// Walks the node in order, appending text and placeholders to `out`.
    pub(crate) fn render_into(&self, ctx: &RenderContext<'_>, out: &mut RenderBuffer) -> Result<()> {
        match self {
            Node::Literal(text) => out.push_text(text),
            Node::Templated(body) => {
                let segments = template::parse(body)?;
                let absent = segments
                    .iter()
                    .filter_map(Segment::reference)
                    .any(|path| ctx.lookup(path).map_or(true, Value::is_null));
                if absent {
                    return Ok(());
                }
                for segment in segments {
                    match segment {
                        Segment::Text(text) => out.push_text(&text),
                        Segment::Bind(path) => out.push_bind(path),
                        Segment::Inline(path) => {
                            if let Some(value) = ctx.lookup(&path) {
                                out.push_inline(&path, &value.to_text())?;
                            }
                        }
                    }
                }
            }
            Node::Composite(children) => {
                for child in children {
                    child.render_into(ctx, out)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;

    fn walk(node: &Node, param: &Value) -> RenderBuffer {
        let ctx = RenderContext::new(param, None);
        let mut out = RenderBuffer::default();
        node.render_into(&ctx, &mut out).unwrap();
        out
    }

    #[test]
    fn literal_question_marks_become_slots() {
        let node = Node::literal("SELECT * FROM T WHERE A = ? AND B = '?' AND C = ?");
        let out = walk(&node, &Value::Null);
        assert_eq!(out.plan, vec![Placeholder::Slot(0), Placeholder::Slot(1)]);
    }

    #[test]
    fn templated_fragment_drops_out_when_value_absent() {
        let tree = Node::Composite(vec![
            Node::literal("SELECT * FROM T WHERE 1=1"),
            Node::templated(" AND NAME = :name"),
            Node::templated(" ORDER BY ${sort}"),
        ]);
        let out = walk(&tree, &params! { "name" => Value::Null, "sort" => "ID" });
        assert_eq!(out.sql, "SELECT * FROM T WHERE 1=1 ORDER BY ID");
        assert!(out.plan.is_empty());

        let out = walk(&tree, &params! { "name" => "x" });
        assert_eq!(out.sql, "SELECT * FROM T WHERE 1=1 AND NAME = ?");
        assert_eq!(out.plan, vec![Placeholder::Named("name".into())]);
    }

    #[test]
    fn inline_value_with_bare_question_mark_is_rejected() {
        let tree = Node::Composite(vec![
            Node::templated(" ORDER BY ${sort}"),
            Node::literal(" LIMIT ?"),
        ]);
        let ctx_param = params! { "sort" => "ID = ? DESC" };
        let ctx = RenderContext::new(&ctx_param, None);
        let mut out = RenderBuffer::default();
        let err = tree.render_into(&ctx, &mut out).unwrap_err();
        assert!(matches!(err, SqlsetError::Template(msg) if msg.contains("${sort}")));

        let out = walk(&tree, &params! { "sort" => "NAME = '?' DESC" });
        assert_eq!(out.sql, " ORDER BY NAME = '?' DESC LIMIT ?");
        assert_eq!(out.plan, vec![Placeholder::Slot(0)]);
    }

    #[test]
    fn empty_tree_renders_nothing() {
        let tree = Node::Composite(Vec::new());
        assert!(tree.is_empty());
        let out = walk(&tree, &Value::Null);
        assert!(out.sql.is_empty() && out.plan.is_empty());
    }
}
