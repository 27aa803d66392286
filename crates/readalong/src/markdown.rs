use ::markdown::mdast::{ListItem, Node};

use crate::blocks::{BlockKind, BlockNode, Document};
use crate::error::{Error, Result};
use crate::types::BlockId;

impl Document {
    /// Flattens a markdown document into block nodes, the way a browser
    /// renders it: paragraphs, headings, list items, quotes and code blocks
    /// become blocks; inline markup contributes only its text.
    pub fn from_markdown(source: &str) -> Result<Self> {
        let tree = ::markdown::to_mdast(source, &::markdown::ParseOptions::gfm())
            .map_err(|e| Error::Markdown(e.to_string()))?;

        let mut builder = Builder::default();
        builder.visit(&tree, None);
        Ok(Document::from_nodes(builder.nodes))
    }
}

#[derive(Default)]
struct Builder {
    nodes: Vec<BlockNode>,
}

impl Builder {
    fn push(&mut self, kind: BlockKind, parent: Option<BlockId>, text: String) -> BlockId {
        let id = BlockId(self.nodes.len() as u32);
        self.nodes.push(BlockNode {
            id,
            parent,
            kind,
            text,
        });
        id
    }

    fn visit_children(&mut self, children: &[Node], parent: Option<BlockId>) {
        for child in children {
            self.visit(child, parent);
        }
    }

    fn visit_item(&mut self, item: &ListItem, list_spread: bool, parent: Option<BlockId>) {
        // A tight item renders its paragraphs inline (`<li>text</li>`), so
        // the item itself is the leaf.
        let tight = !list_spread
            && !item.spread
            && item.children.iter().all(|c| matches!(c, Node::Paragraph(_)));
        if tight {
            let text = item
                .children
                .iter()
                .filter_map(|c| c.children().map(|inline| inline_text(inline)))
                .collect::<Vec<_>>()
                .join("\n");
            self.push(BlockKind::ListItem, parent, text);
        } else {
            let id = self.push(BlockKind::ListItem, parent, String::new());
            self.visit_children(&item.children, Some(id));
        }
    }

    fn visit(&mut self, node: &Node, parent: Option<BlockId>) {
        match node {
            Node::Root(root) => self.visit_children(&root.children, None),
            Node::Paragraph(p) => {
                self.push(BlockKind::Paragraph, parent, inline_text(&p.children));
            }
            Node::Heading(h) => {
                self.push(BlockKind::Heading(h.depth), parent, inline_text(&h.children));
            }
            Node::Code(code) => {
                self.push(BlockKind::Code, parent, code.value.clone());
            }
            Node::Math(math) => {
                self.push(BlockKind::Other, parent, math.value.clone());
            }
            Node::Blockquote(quote) => {
                let id = self.push(BlockKind::Quote, parent, String::new());
                self.visit_children(&quote.children, Some(id));
            }
            Node::List(list) => {
                let id = self.push(BlockKind::List, parent, String::new());
                for child in &list.children {
                    match child {
                        Node::ListItem(item) => self.visit_item(item, list.spread, Some(id)),
                        other => self.visit(other, Some(id)),
                    }
                }
            }
            Node::ListItem(item) => self.visit_item(item, false, parent),
            Node::Table(table) => {
                let text = table
                    .children
                    .iter()
                    .map(|row| row.children().map(|cells| cells_text(cells)).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join("\n");
                self.push(BlockKind::Table, parent, text);
            }
            Node::FootnoteDefinition(def) => {
                let id = self.push(BlockKind::Other, parent, String::new());
                self.visit_children(&def.children, Some(id));
            }
            Node::ThematicBreak(_)
            | Node::Html(_)
            | Node::Definition(_)
            | Node::Yaml(_)
            | Node::Toml(_) => {}
            other => {
                if let Some(children) = other.children() {
                    self.visit_children(children, parent);
                }
            }
        }
    }
}

fn cells_text(cells: &[Node]) -> String {
    cells
        .iter()
        .map(|cell| cell.children().map(|c| inline_text(c)).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ")
}

fn inline_text(children: &[Node]) -> String {
    let mut out = String::new();
    for child in children {
        collect_inline(child, &mut out);
    }
    out
}

fn collect_inline(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&text.value),
        Node::InlineCode(code) => out.push_str(&code.value),
        Node::InlineMath(math) => out.push_str(&math.value),
        Node::Image(image) => out.push_str(&image.alt),
        Node::Break(_) => out.push('\n'),
        Node::Html(_) | Node::FootnoteReference(_) => {}
        other => {
            if let Some(children) = other.children() {
                for child in children {
                    collect_inline(child, out);
                }
            }
        }
    }
}
