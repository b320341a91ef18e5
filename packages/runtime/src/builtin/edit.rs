//! Editing commands over the logical tree.
//!
//! Every command works on resolved gaps rather than positions, and leaves a
//! collapsed selection at the point where the edit ended.

use crate::command::CommandContext;
use crate::error::CommandResult;
use folio_model::{predicate, Gap, Modifier, NodeId, NodeKind, Position, Range, Tree, TreeResult};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct TextArgs {
    text: String,
}

#[derive(Deserialize)]
struct FormatArgs {
    format: String,
}

pub(super) fn insert_text(ctx: &mut CommandContext<'_>, args: &Value) -> CommandResult<()> {
    let args: TextArgs = ctx.args(args)?;
    let tree = &mut ctx.state.tree;
    let gap = delete_range(tree, &ctx.range)?;
    let gap = inline_gap(tree, gap)?;

    let inherited = gap
        .node_before(tree)
        .filter(|node| predicate::is_char(tree, *node))
        .and_then(|node| tree.modifiers(node).cloned())
        .unwrap_or_default();

    let nodes: Vec<NodeId> = args
        .text
        .chars()
        .map(|ch| match ch {
            '\n' => tree.create_with(NodeKind::LineBreak, inherited.clone()),
            ch => tree.create_with(NodeKind::char(ch), inherited.clone()),
        })
        .collect();
    tree.insert_at(gap.parent, gap.index, &nodes)?;

    let caret = Gap {
        parent: gap.parent,
        index: gap.index + nodes.len(),
    };
    place_caret(ctx, caret)
}

pub(super) fn insert_line_break(ctx: &mut CommandContext<'_>, _args: &Value) -> CommandResult<()> {
    let tree = &mut ctx.state.tree;
    let gap = delete_range(tree, &ctx.range)?;
    let gap = inline_gap(tree, gap)?;
    let line_break = tree.create(NodeKind::LineBreak);
    tree.insert_at(gap.parent, gap.index, &[line_break])?;
    place_caret(ctx, Gap { parent: gap.parent, index: gap.index + 1 })
}

/// Split the enclosing block at the caret. Between blocks an empty
/// paragraph is inserted instead.
pub(super) fn insert_paragraph_break(ctx: &mut CommandContext<'_>, _args: &Value) -> CommandResult<()> {
    let tree = &mut ctx.state.tree;
    let gap = delete_range(tree, &ctx.range)?;

    let block = if gap.parent == tree.root() {
        let paragraph = tree.create(NodeKind::block("p"));
        tree.insert_at(gap.parent, gap.index, &[paragraph])?;
        paragraph
    } else {
        tree.split(gap.parent, gap.index)?
    };
    place_caret(ctx, Gap { parent: block, index: 0 })
}

pub(super) fn delete_backward(ctx: &mut CommandContext<'_>, _args: &Value) -> CommandResult<()> {
    let tree = &mut ctx.state.tree;
    if !ctx.range.is_collapsed() {
        let gap = delete_range(tree, &ctx.range)?;
        return place_caret(ctx, gap);
    }

    let gap = ctx.range.start().resolve(tree)?;
    let caret = match gap.node_before(tree) {
        Some(previous) if predicate::is_container(tree, previous) => match gap.node_after(tree) {
            Some(next) if predicate::is_container(tree, next) => merge_blocks(tree, previous, next)?,
            _ => end_of(tree, previous),
        },
        Some(previous) => {
            tree.remove(previous);
            Gap {
                parent: gap.parent,
                index: gap.index - 1,
            }
        }
        None => {
            let previous = tree.walk_all().previous_sibling(gap.parent, predicate::is_container);
            match previous {
                Some(previous) if gap.parent != tree.root() => merge_blocks(tree, previous, gap.parent)?,
                _ => gap,
            }
        }
    };
    place_caret(ctx, caret)
}

pub(super) fn delete_forward(ctx: &mut CommandContext<'_>, _args: &Value) -> CommandResult<()> {
    let tree = &mut ctx.state.tree;
    if !ctx.range.is_collapsed() {
        let gap = delete_range(tree, &ctx.range)?;
        return place_caret(ctx, gap);
    }

    let gap = ctx.range.start().resolve(tree)?;
    let caret = match gap.node_after(tree) {
        Some(next) if predicate::is_container(tree, next) => match gap.node_before(tree) {
            Some(previous) if predicate::is_container(tree, previous) => merge_blocks(tree, previous, next)?,
            _ => Gap { parent: next, index: 0 },
        },
        Some(next) => {
            tree.remove(next);
            gap
        }
        None => {
            let next = tree.walk_all().next_sibling(gap.parent, predicate::is_container);
            match next {
                Some(next) if gap.parent != tree.root() => merge_blocks(tree, gap.parent, next)?,
                _ => gap,
            }
        }
    };
    place_caret(ctx, caret)
}

/// Remove the format from every selected inline leaf when all of them carry
/// it, otherwise add it to those that lack it.
pub(super) fn toggle_format(ctx: &mut CommandContext<'_>, args: &Value) -> CommandResult<()> {
    let args: FormatArgs = ctx.args(args)?;
    let tree = &mut ctx.state.tree;
    let leaves: Vec<NodeId> = ctx
        .range
        .selected_leaves(tree)?
        .into_iter()
        .filter(|leaf| predicate::is_inline(tree, *leaf))
        .collect();
    if leaves.is_empty() {
        return Ok(());
    }

    let applied = leaves
        .iter()
        .all(|leaf| tree.modifiers(*leaf).map_or(false, |m| m.has_format(&args.format)));
    for leaf in leaves {
        let modifiers = tree.modifiers_mut(leaf)?;
        if applied {
            modifiers.remove_where(|m| m.is_format(&args.format));
        } else if !modifiers.has_format(&args.format) {
            modifiers.append(Modifier::format(&args.format));
        }
    }
    Ok(())
}

fn place_caret(ctx: &mut CommandContext<'_>, gap: Gap) -> CommandResult<()> {
    let tree = &ctx.state.tree;
    ctx.state.selection = Range::caret(tree, gap.to_position(tree))?;
    Ok(())
}

fn end_of(tree: &Tree, container: NodeId) -> Gap {
    Gap {
        parent: container,
        index: tree.children(container).len(),
    }
}

/// Innermost trailing container of `node`: where merged content lands.
fn innermost_last(tree: &Tree, node: NodeId) -> NodeId {
    let mut target = node;
    while let Some(&last) = tree.children(target).last() {
        if !predicate::is_container(tree, last) {
            break;
        }
        target = last;
    }
    target
}

/// Move the children of `source` to the end of `target`'s innermost trailing
/// container and drop `source`. Returns the seam.
fn merge_blocks(tree: &mut Tree, target: NodeId, source: NodeId) -> TreeResult<Gap> {
    let target = innermost_last(tree, target);
    let seam = end_of(tree, target);
    let moved = tree.children(source).to_vec();
    tree.append(target, &moved)?;
    tree.remove(source);
    Ok(seam)
}

/// A gap that can hold inline content. Gaps directly under the root move
/// into the adjacent block, or into a new paragraph when there is none.
fn inline_gap(tree: &mut Tree, gap: Gap) -> TreeResult<Gap> {
    if gap.parent != tree.root() {
        return Ok(gap);
    }
    if let Some(previous) = gap.node_before(tree).filter(|node| predicate::is_container(tree, *node)) {
        return Ok(end_of(tree, innermost_last(tree, previous)));
    }
    if let Some(next) = gap.node_after(tree).filter(|node| predicate::is_container(tree, *node)) {
        return Ok(Gap { parent: next, index: 0 });
    }
    let paragraph = tree.create(NodeKind::block("p"));
    tree.insert_at(gap.parent, gap.index, &[paragraph])?;
    Ok(Gap {
        parent: paragraph,
        index: 0,
    })
}

/// Delete the content of `range` and return the collapsed gap left behind.
///
/// Fully selected containers go first, then the selected leaves; when the
/// range spans two sibling containers the end one is merged into the start
/// one.
pub(crate) fn delete_range(tree: &mut Tree, range: &Range) -> CommandResult<Gap> {
    let start = range.start().resolve(tree)?;
    if range.is_collapsed() {
        return Ok(start);
    }
    let end = range.end().resolve(tree)?;
    let start_key = start.order_key(tree)?;
    let end_key = end.order_key(tree)?;

    let start_before = start.node_before(tree);
    let end_after = end.node_after(tree);

    let mut containers = Vec::new();
    for container in tree.walk().descendants(tree.root(), predicate::is_container) {
        let before = Position::before(container).resolve(tree)?.order_key(tree)?;
        let after = Position::after(container).resolve(tree)?.order_key(tree)?;
        if before >= start_key && after <= end_key {
            containers.push(container);
        }
    }
    let leaves = range.selected_leaves(tree)?;
    for node in containers.into_iter().chain(leaves) {
        tree.remove(node);
    }

    let gap = match start_before {
        Some(previous) => Position::after(previous),
        None => Position::inside(start.parent),
    }
    .resolve(tree)?;

    let end_parent = end.parent;
    let merges = end_parent != gap.parent
        && !tree.is_ancestor_or_self(end_parent, gap.parent)
        && !tree.is_ancestor_or_self(gap.parent, end_parent);
    if merges {
        let moved = match end_after {
            Some(next) => {
                let index = tree.index(next).unwrap_or(0);
                tree.children(end_parent)[index..].to_vec()
            }
            None => Vec::new(),
        };
        tree.insert_at(gap.parent, gap.index, &moved)?;
        let leftovers: Vec<NodeId> = tree
            .children(end_parent)
            .iter()
            .copied()
            .filter(|child| predicate::is_tangible(tree, *child))
            .collect();
        if leftovers.is_empty() {
            tree.remove(end_parent);
        }
    }
    Ok(gap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(paragraphs: &[&str]) -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::new();
        let root = tree.root();
        let mut blocks = Vec::new();
        for text in paragraphs {
            let p = tree.create(NodeKind::block("p"));
            let chars: Vec<NodeId> = text.chars().map(|c| tree.create(NodeKind::char(c))).collect();
            tree.append(p, &chars).unwrap();
            tree.append(root, &[p]).unwrap();
            blocks.push(p);
        }
        (tree, blocks)
    }

    #[test]
    fn test_delete_within_one_block() {
        let (mut tree, blocks) = doc(&["abcd"]);
        let chars = tree.children(blocks[0]).to_vec();
        let range = Range::new(&tree, Position::after(chars[0]), Position::after(chars[2])).unwrap();
        let gap = delete_range(&mut tree, &range).unwrap();
        assert_eq!(tree.text_content(blocks[0]), "ad");
        assert_eq!(gap, Gap { parent: blocks[0], index: 1 });
    }

    #[test]
    fn test_delete_across_blocks_merges_end_into_start() {
        let (mut tree, blocks) = doc(&["abc", "mid", "xyz"]);
        let first = tree.children(blocks[0]).to_vec();
        let last = tree.children(blocks[2]).to_vec();
        let range = Range::new(&tree, Position::after(first[0]), Position::after(last[0])).unwrap();
        delete_range(&mut tree, &range).unwrap();

        assert_eq!(tree.children(tree.root()), &[blocks[0]]);
        assert_eq!(tree.text_content(blocks[0]), "ayz");
        assert!(!tree.contains(blocks[1]));
        assert!(!tree.contains(blocks[2]));
    }

    #[test]
    fn test_backward_range_deletes_the_same_content() {
        let (mut tree, blocks) = doc(&["abcd"]);
        let chars = tree.children(blocks[0]).to_vec();
        let range = Range::new(&tree, Position::after(chars[2]), Position::after(chars[0])).unwrap();
        delete_range(&mut tree, &range).unwrap();
        assert_eq!(tree.text_content(blocks[0]), "ad");
    }

    #[test]
    fn test_inline_gap_creates_paragraph_in_empty_document() {
        let mut tree = Tree::new();
        let root = tree.root();
        let gap = inline_gap(&mut tree, Gap { parent: root, index: 0 }).unwrap();
        assert_ne!(gap.parent, root);
        assert_eq!(tree.kind(gap.parent), Some(&NodeKind::block("p")));
    }

    #[test]
    fn test_merge_blocks_returns_seam() {
        let (mut tree, blocks) = doc(&["ab", "cd"]);
        let seam = merge_blocks(&mut tree, blocks[0], blocks[1]).unwrap();
        assert_eq!(seam, Gap { parent: blocks[0], index: 2 });
        assert_eq!(tree.text_content(tree.root()), "abcd");
    }
}
