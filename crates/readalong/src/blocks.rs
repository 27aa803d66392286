use std::collections::HashSet;
use std::ops::Range;

use crate::normalize::normalize;
use crate::types::BlockId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    ListItem,
    Quote,
    Code,
    List,
    Table,
    Other,
}

impl BlockKind {
    /// Kinds a narrated sentence can land in. Code, lists, tables and
    /// unknown wrappers still contribute text to the flattening but are never
    /// marked as a match.
    pub fn is_matchable(self) -> bool {
        matches!(self, Self::Paragraph | Self::Heading(_) | Self::ListItem | Self::Quote)
    }
}

/// One block-level node of a rendered document, as handed over by the
/// renderer. `text` is the node's *own* text: the part not inside a nested
/// block node.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub id: BlockId,
    pub parent: Option<BlockId>,
    pub kind: BlockKind,
    pub text: String,
}

/// A rendered document flattened to block nodes in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    nodes: Vec<BlockNode>,
}

impl Document {
    pub fn from_nodes(nodes: Vec<BlockNode>) -> Self {
        Self { nodes }
    }

    /// Convenience for renderers without structure: every string becomes a
    /// top-level paragraph.
    pub fn from_paragraphs<I, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let nodes = paragraphs
            .into_iter()
            .enumerate()
            .map(|(i, text)| BlockNode {
                id: BlockId(i as u32),
                parent: None,
                kind: BlockKind::Paragraph,
                text: text.into(),
            })
            .collect();
        Self { nodes }
    }

    pub fn nodes(&self) -> &[BlockNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A matchable leaf block.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentBlock {
    pub id: BlockId,
    /// Position among leaf blocks, in document order.
    pub order_index: usize,
    pub raw_text: String,
    pub normalized: String,
    pub kind: BlockKind,
    /// `None` when the block sits directly under the document root.
    pub parent: Option<BlockId>,
    /// Char range of `raw_text` within the flattened document text.
    pub span: Range<usize>,
}

impl DocumentBlock {
    pub fn is_blank(&self) -> bool {
        self.raw_text.trim().is_empty()
    }
}

/// Immutable snapshot of a document's matchable leaf blocks.
///
/// Rebuilt whenever the document changes; blocks are addressed by order
/// index, never by live references into the rendered tree.
#[derive(Debug, Clone, Default)]
pub struct BlockIndex {
    blocks: Vec<DocumentBlock>,
    flat_text: String,
    flat_len: usize,
}

impl BlockIndex {
    pub fn build(document: &Document) -> Self {
        let parents: HashSet<BlockId> = document.nodes.iter().filter_map(|n| n.parent).collect();

        let mut blocks = Vec::new();
        let mut flat_text = String::new();
        let mut cursor = 0usize;

        for node in &document.nodes {
            let len = node.text.chars().count();
            let span = cursor..cursor + len;
            cursor += len;
            flat_text.push_str(&node.text);

            if parents.contains(&node.id) || !node.kind.is_matchable() {
                continue;
            }

            blocks.push(DocumentBlock {
                id: node.id,
                order_index: blocks.len(),
                raw_text: node.text.clone(),
                normalized: normalize(&node.text),
                kind: node.kind,
                parent: node.parent,
                span,
            });
        }

        Self {
            blocks,
            flat_text,
            flat_len: cursor,
        }
    }

    pub fn blocks(&self) -> &[DocumentBlock] {
        &self.blocks
    }

    pub fn get(&self, order_index: usize) -> Option<&DocumentBlock> {
        self.blocks.get(order_index)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Every node's own text concatenated in document order. Segment offsets
    /// index into this string by char.
    pub fn flat_text(&self) -> &str {
        &self.flat_text
    }

    pub fn flat_len(&self) -> usize {
        self.flat_len
    }

    /// Position of a block within the document, in `[0, 1)`.
    pub fn fraction(&self, order_index: usize) -> f64 {
        if self.blocks.is_empty() {
            return 0.0;
        }
        order_index as f64 / self.blocks.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u32, parent: Option<u32>, kind: BlockKind, text: &str) -> BlockNode {
        BlockNode {
            id: BlockId(id),
            parent: parent.map(BlockId),
            kind,
            text: text.to_string(),
        }
    }

    #[test]
    fn keeps_only_matchable_leaves_in_order() {
        let doc = Document::from_nodes(vec![
            node(0, None, BlockKind::Heading(1), "标题"),
            node(1, None, BlockKind::Quote, ""),
            node(2, Some(1), BlockKind::Paragraph, "引用段落"),
            node(3, None, BlockKind::List, ""),
            node(4, Some(3), BlockKind::ListItem, "列表项"),
            node(5, None, BlockKind::Table, "表格内容"),
        ]);
        let index = BlockIndex::build(&doc);

        let ids: Vec<_> = index.blocks().iter().map(|b| b.id.0).collect();
        assert_eq!(ids, [0, 2, 4]);
        let orders: Vec<_> = index.blocks().iter().map(|b| b.order_index).collect();
        assert_eq!(orders, [0, 1, 2]);
        assert_eq!(index.get(1).unwrap().parent, Some(BlockId(1)));
        assert_eq!(index.get(0).unwrap().parent, None);
    }

    #[test]
    fn spans_count_chars_across_all_nodes() {
        let doc = Document::from_nodes(vec![
            node(0, None, BlockKind::Paragraph, "ab"),
            node(1, None, BlockKind::Table, "帕特农"),
            node(2, None, BlockKind::Paragraph, "cd"),
        ]);
        let index = BlockIndex::build(&doc);

        assert_eq!(index.get(0).unwrap().span, 0..2);
        assert_eq!(index.get(1).unwrap().span, 5..7);
        assert_eq!(index.flat_text(), "ab帕特农cd");
        assert_eq!(index.flat_len(), 7);
    }

    #[test]
    fn container_with_own_text_is_not_a_leaf() {
        let doc = Document::from_nodes(vec![
            node(0, None, BlockKind::ListItem, "外层"),
            node(1, Some(0), BlockKind::ListItem, "内层"),
        ]);
        let index = BlockIndex::build(&doc);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(0).unwrap().id, BlockId(1));
        assert_eq!(index.get(0).unwrap().span, 2..4);
    }

    #[test]
    fn fraction_is_relative_to_leaf_count() {
        let index = BlockIndex::build(&Document::from_paragraphs(["a", "b", "c", "d"]));
        approx::assert_relative_eq!(index.fraction(2), 0.5);
        approx::assert_relative_eq!(BlockIndex::default().fraction(3), 0.0);
    }
}
