//! Layout tree of a product view
//!
//! The traversal is rendered by alternating row and column levels. A row
//! level spreads its values over columns, split into blocks when there are
//! more columns than allowed; each column holds the next level. A column
//! level stacks its values, each holding a row of the next level. The
//! first level of an artefact type's own dimensions always starts a new row.

use std::path::PathBuf;

use super::iteration::{ViewDimNode, ViewIteration};
use crate::category::CategoryPath;

/// Default column cap of the top level and of nested levels
pub const DEFAULT_MAX_COLS: usize = 10;

/// Allowed column caps
pub const MAX_COLS_RANGE: std::ops::RangeInclusive<usize> = 2..=20;

/// Number of alternating background shades
pub const SHADE_COUNT: usize = 3;

/// Column caps of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    pub max_cols_top: usize,
    pub max_cols_per_row: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_cols_top: DEFAULT_MAX_COLS,
            max_cols_per_row: DEFAULT_MAX_COLS,
        }
    }
}

impl LayoutConfig {
    pub fn new(max_cols_top: usize, max_cols_per_row: usize) -> Self {
        let clamp = |v: usize| v.clamp(*MAX_COLS_RANGE.start(), *MAX_COLS_RANGE.end());
        Self {
            max_cols_top: clamp(max_cols_top),
            max_cols_per_row: clamp(max_cols_per_row),
        }
    }

    /// Column cap of the level with the given dimension index
    pub fn max_cols(&self, dim_idx: usize) -> usize {
        if dim_idx == 0 {
            self.max_cols_top
        } else {
            self.max_cols_per_row
        }
    }
}

/// Leaf of the layout
#[derive(Debug, Clone, PartialEq)]
pub enum ArtefactCell {
    /// No artefact was produced for this coordinate
    Missing,
    Present {
        path: PathBuf,
        type_id: String,
        vars: Vec<(String, String)>,
        category_path: CategoryPath,
    },
}

/// One column of a row block
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutColumn {
    pub label: String,
    /// `None` for padding columns of a partially filled last block
    pub content: Option<LayoutNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowBlock {
    /// Only set when a row is split into several blocks
    pub title: Option<String>,
    pub columns: Vec<LayoutColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutNode {
    Row {
        dim_label: String,
        dim_idx: usize,
        shade: usize,
        row_labels: Option<Vec<String>>,
        blocks: Vec<RowBlock>,
    },
    Column(Vec<LayoutNode>),
    Artefact(ArtefactCell),
}

impl LayoutNode {
    /// Number of artefact cells below this node
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Row { blocks, .. } => blocks
                .iter()
                .flat_map(|b| b.columns.iter())
                .filter_map(|c| c.content.as_ref())
                .map(LayoutNode::leaf_count)
                .sum(),
            Self::Column(cells) => cells.iter().map(LayoutNode::leaf_count).sum(),
            Self::Artefact(_) => 1,
        }
    }
}

/// Lay out a whole traversal, `None` when there is nothing to show
pub fn build_layout(iteration: &mut ViewIteration<'_>, config: &LayoutConfig) -> Option<LayoutNode> {
    let root = iteration.start()?;
    Some(row(iteration, root, config))
}

fn artefact_cell(iteration: &ViewIteration<'_>, node: ViewDimNode) -> LayoutNode {
    let cell = match iteration.artefact() {
        Some(art) => ArtefactCell::Present {
            path: art.path.clone(),
            type_id: art.type_id.clone(),
            vars: art.vars.clone(),
            category_path: iteration.category_path(node),
        },
        None => ArtefactCell::Missing,
    };
    LayoutNode::Artefact(cell)
}

fn row(it: &mut ViewIteration<'_>, node: ViewDimNode, config: &LayoutConfig) -> LayoutNode {
    let dim_idx = it.dim_idx(node);
    let dim_label = it.dim_label(node).to_string();
    let col_labels = it.labels(node).to_vec();

    let child = it.next_dim(node);
    let row_cnt = match child {
        Some(c) if !c.is_unique_art_var_start() => it.range(c),
        _ => 1,
    };

    let cap = config.max_cols(dim_idx);
    let mut block_cols = col_labels.len();
    let mut block_cnt = 1;
    if block_cols > cap {
        block_cnt = block_cols.div_ceil(cap);
        block_cols = cap;
    }

    let show_row_label = (block_cols > 1 || row_cnt > 1) && child.is_some();
    let row_labels = if show_row_label {
        child.map(|c| it.labels(c).to_vec())
    } else {
        None
    };

    it.reset(node);
    let mut blocks = Vec::with_capacity(block_cnt);
    for block_idx in 0..block_cnt {
        let start = block_idx * block_cols;
        let title = (block_cnt > 1).then(|| {
            let first = it.index(node) + 1;
            let shown = block_cols.min(col_labels.len() - start);
            format!("{}s {} to {}", dim_label, first, first + shown - 1)
        });

        let mut columns = Vec::with_capacity(block_cols);
        for col in start..start + block_cols {
            let Some(label) = col_labels.get(col) else {
                columns.push(LayoutColumn {
                    label: String::new(),
                    content: None,
                });
                continue;
            };
            let content = match it.next_dim(node) {
                None => artefact_cell(it, node),
                Some(c) if c.is_unique_art_var_start() => row(it, c, config),
                Some(c) => column(it, c, config),
            };
            columns.push(LayoutColumn {
                label: label.clone(),
                content: Some(content),
            });
            it.next(node);
        }
        blocks.push(RowBlock { title, columns });
    }

    LayoutNode::Row {
        dim_label,
        dim_idx,
        shade: (dim_idx / 2) % SHADE_COUNT,
        row_labels,
        blocks,
    }
}

fn column(it: &mut ViewIteration<'_>, node: ViewDimNode, config: &LayoutConfig) -> LayoutNode {
    let mut cells = Vec::new();
    loop {
        let cell = match it.next_dim(node) {
            None => artefact_cell(it, node),
            Some(c) => row(it, c, config),
        };
        cells.push(cell);
        if !it.next(node) {
            break;
        }
    }
    LayoutNode::Column(cells)
}
