//! Top-level assembly of a tree's pre-order text dump (spec.md §6).
//!
//! The per-node line generation lives on `Vertex` (it needs access to
//! private split/pointset fields); this module only joins the result, the
//! same split the original keeps between `Vertex::to_string` and
//! `Tree::to_string`.

use crate::arena::PointArena;
use crate::vertex::Vertex;

pub(crate) fn render_tree(root: &Vertex, arena: &PointArena) -> String {
    root.render_lines(arena).join("\n")
}
