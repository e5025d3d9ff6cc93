//! Flatten a fitted decision tree into nested `if`/`else` code.
//!
//! The tree is first turned into a [`CodeNode`] syntax tree, which is then
//! rendered as C-like lines. Neither step prints anything; callers decide where
//! the lines go.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};
use crate::models::decision_tree::{argmax, DecisionTree, TREE_LEAF, TREE_UNDEFINED};

const INDENT: &str = "    ";

/// Deepest split chain accepted; the builder recurses once per level.
pub const MAX_DEPTH: usize = 512;

/// How split thresholds are written.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMode {
    /// Full-precision comparison against `double` features.
    Float,
    /// Threshold floored to an integer for `int` features.
    Int,
}

impl ThresholdMode {
    fn parameter_type(&self) -> &'static str {
        match self {
            ThresholdMode::Float => "double",
            ThresholdMode::Int => "int",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Float(f64),
    Int(i64),
}

impl Threshold {
    fn new(value: f64, mode: ThresholdMode) -> Self {
        match mode {
            ThresholdMode::Float => Threshold::Float(value),
            ThresholdMode::Int => Threshold::Int(value.floor() as i64),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Threshold::Float(v) => write!(f, "{:.6}", v),
            Threshold::Int(v) => write!(f, "{}", v),
        }
    }
}

/// Branch/leaf structure of the generated function.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeNode {
    /// `if (feature <= threshold) { if_true } else { if_false }`
    Branch {
        feature: String,
        threshold: Threshold,
        if_true: Box<CodeNode>,
        if_false: Box<CodeNode>,
    },
    /// `return class;`
    Leaf { class: usize },
}

impl CodeNode {
    /// Append the rendered lines of this node, indented `depth` levels.
    pub fn render_into(&self, depth: usize, lines: &mut Vec<String>) {
        let indent = INDENT.repeat(depth);
        match self {
            CodeNode::Branch {
                feature,
                threshold,
                if_true,
                if_false,
            } => {
                lines.push(format!("{}if ({} <= {}) {{", indent, feature, threshold));
                if_true.render_into(depth + 1, lines);
                lines.push(format!("{}}} else {{ // if {} > {}", indent, feature, threshold));
                if_false.render_into(depth + 1, lines);
                lines.push(format!("{}}}", indent));
            }
            CodeNode::Leaf { class } => lines.push(format!("{}return {};", indent, class)),
        }
    }
}

fn malformed(msg: String) -> ExportError {
    ExportError::MalformedTree(msg)
}

fn check_shape(tree: &DecisionTree) -> Result<()> {
    let n = tree.node_count();
    if n == 0 {
        return Err(malformed("tree has no nodes".to_string()));
    }
    let lengths = [
        ("threshold", tree.threshold.len()),
        ("children_left", tree.children_left.len()),
        ("children_right", tree.children_right.len()),
        ("value", tree.value.len()),
    ];
    for (name, len) in lengths {
        if len != n {
            return Err(malformed(format!(
                "{} has {} entries but feature has {}",
                name, len, n
            )));
        }
    }
    Ok(())
}

fn child_index(tree: &DecisionTree, node: usize, child: i64, side: &str) -> Result<usize> {
    if child < 0 {
        return Err(malformed(format!("split node {} has no {} child", node, side)));
    }
    let idx = child as usize;
    if idx >= tree.node_count() {
        return Err(malformed(format!(
            "{} child {} of node {} is out of range",
            side, child, node
        )));
    }
    Ok(idx)
}

struct Builder<'a, S> {
    tree: &'a DecisionTree,
    feature_names: &'a [S],
    mode: ThresholdMode,
    visited: Vec<bool>,
}

impl<'a, S: AsRef<str>> Builder<'a, S> {
    fn build(&mut self, node: usize, depth: usize) -> Result<CodeNode> {
        if depth > MAX_DEPTH {
            return Err(malformed(format!(
                "node {} is deeper than {} levels",
                node, MAX_DEPTH
            )));
        }
        if self.visited[node] {
            return Err(malformed(format!("node {} is reached more than once", node)));
        }
        self.visited[node] = true;

        let tree = self.tree;
        let feature = tree.feature[node];
        let (left, right) = (tree.children_left[node], tree.children_right[node]);

        if feature == TREE_UNDEFINED {
            if left != TREE_LEAF || right != TREE_LEAF {
                return Err(malformed(format!("leaf node {} has children", node)));
            }
            let class = argmax(&tree.value[node]).ok_or_else(|| {
                malformed(format!("leaf node {} has no usable class scores", node))
            })?;
            return Ok(CodeNode::Leaf { class });
        }

        if feature < 0 {
            return Err(malformed(format!(
                "node {} has invalid feature index {}",
                node, feature
            )));
        }
        let name = self
            .feature_names
            .get(feature as usize)
            .ok_or_else(|| {
                malformed(format!(
                    "node {} splits on feature {} but only {} names were given",
                    node,
                    feature,
                    self.feature_names.len()
                ))
            })?
            .as_ref()
            .to_string();
        let threshold = tree.threshold[node];
        if !threshold.is_finite() {
            return Err(malformed(format!("node {} has threshold {}", node, threshold)));
        }

        let left = child_index(tree, node, left, "left")?;
        let right = child_index(tree, node, right, "right")?;
        let if_true = self.build(left, depth + 1)?;
        let if_false = self.build(right, depth + 1)?;

        Ok(CodeNode::Branch {
            feature: name,
            threshold: Threshold::new(threshold, self.mode),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        })
    }
}

/// Convert `tree` into its branch/leaf syntax tree.
///
/// Fails with [`ExportError::MalformedTree`] when the node arrays do not form
/// a single binary tree rooted at node 0.
pub fn build_code_tree<S: AsRef<str>>(
    tree: &DecisionTree,
    feature_names: &[S],
    mode: ThresholdMode,
) -> Result<CodeNode> {
    check_shape(tree)?;
    let mut builder = Builder {
        tree,
        feature_names,
        mode,
        visited: vec![false; tree.node_count()],
    };
    let root = builder.build(0, 0)?;
    if let Some(orphan) = builder.visited.iter().position(|v| !v) {
        return Err(malformed(format!("node {} is unreachable from the root", orphan)));
    }
    Ok(root)
}

/// Generate the body of the decision function, one line per entry.
///
/// The outermost statement is indented one level, so the lines can be placed
/// directly between the braces of a function.
pub fn generate<S: AsRef<str>>(
    tree: &DecisionTree,
    feature_names: &[S],
    mode: ThresholdMode,
) -> Result<Vec<String>> {
    let root = build_code_tree(tree, feature_names, mode)?;
    let mut lines = Vec::new();
    root.render_into(1, &mut lines);
    debug!(
        "Generated {} lines from a tree with {} nodes ({:?} thresholds)",
        lines.len(),
        tree.node_count(),
        mode
    );
    Ok(lines)
}

/// Generate a complete `int tree(...)` function taking one parameter per
/// feature name.
pub fn generate_function<S: AsRef<str>>(
    tree: &DecisionTree,
    feature_names: &[S],
    mode: ThresholdMode,
) -> Result<Vec<String>> {
    let body = generate(tree, feature_names, mode)?;
    let params = feature_names
        .iter()
        .map(|name| format!("{} {}", mode.parameter_type(), name.as_ref()))
        .collect::<Vec<_>>()
        .join(", ");

    let mut lines = Vec::with_capacity(body.len() + 3);
    lines.push(format!("int tree({})", params));
    lines.push("{".to_string());
    lines.extend(body);
    lines.push("}".to_string());
    Ok(lines)
}
