//! Two-level view of scanned comments: files, then the comments inside them.
//!
//! Files are grouped by their full relative path, so two `index.ts` files in
//! different directories stay separate nodes that share a label and differ in
//! their directory. Changes to the tree bump a generation counter that
//! subscribers can watch to know when to redraw.

use std::collections::BTreeMap;

use tokio::sync::watch;

use crate::model::{format_issue_marker, CommentRecord};

/// Characters of the message shown in a comment label.
const LABEL_MESSAGE_CHARS: usize = 50;

/// A node in the comment tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    File(FileNode),
    Comment(CommentNode),
}

/// Top-level node: one file and how many comments it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// Full relative path, the grouping identity.
    pub path: String,
    /// Base name shown to the user.
    pub name: String,
    /// Parent directory, empty at the workspace root.
    pub directory: String,
    pub count: usize,
}

impl FileNode {
    /// Label such as `auth.ts (3)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.count)
    }
}

/// Leaf node: one comment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    pub record: CommentRecord,
}

impl CommentNode {
    /// Label such as `Line 12: validate email`.
    pub fn label(&self) -> String {
        let message: String = self.record.message.chars().take(LABEL_MESSAGE_CHARS).collect();
        format!("Line {}: {}", self.record.line, message)
    }

    /// Issue marker for linked comments, empty otherwise.
    pub fn description(&self) -> String {
        self.record
            .issue_number
            .map(format_issue_marker)
            .unwrap_or_default()
    }

    /// Whether a tracker issue exists for this comment.
    pub fn is_linked(&self) -> bool {
        self.record.issue_number.is_some()
    }
}

fn split_path(path: &str) -> (String, String) {
    match path.rsplit_once('/') {
        Some((dir, name)) => (name.to_string(), dir.to_string()),
        None => (path.to_string(), String::new()),
    }
}

/// In-memory comment tree.
///
/// Owned by a single task; mutation goes through `&mut self`.
#[derive(Debug)]
pub struct CommentTree {
    comments: Vec<CommentRecord>,
    case_insensitive: bool,
    generation: watch::Sender<u64>,
}

impl Default for CommentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentTree {
    /// Create an empty tree with case-sensitive ordering.
    #[must_use]
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            comments: Vec::new(),
            case_insensitive: false,
            generation,
        }
    }

    /// Order file nodes ignoring case.
    #[must_use]
    pub fn with_case_insensitive_sort(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Replace the displayed comments and signal a refresh.
    pub fn set_comments(&mut self, comments: Vec<CommentRecord>) {
        self.comments = comments;
        self.refresh();
    }

    /// The flat list backing the tree.
    pub fn comments(&self) -> &[CommentRecord] {
        &self.comments
    }

    /// Look up a record by identity.
    pub fn find(&self, file: &str, line: u32) -> Option<&CommentRecord> {
        self.comments.iter().find(|c| c.is_at(file, line))
    }

    /// Signal that the view is stale.
    pub fn refresh(&self) {
        self.generation.send_modify(|g| *g += 1);
    }

    /// Current refresh generation.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Receive a notification on every refresh.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// Set the issue number of the record at `(file, line)` in place.
    ///
    /// Returns whether a record was found; only then is a refresh signalled.
    pub fn update_comment(&mut self, file: &str, line: u32, issue_number: u64) -> bool {
        let Some(comment) = self.comments.iter_mut().find(|c| c.is_at(file, line)) else {
            return false;
        };
        comment.issue_number = Some(issue_number);
        self.refresh();
        true
    }

    /// One node per distinct file, sorted by name then full path.
    pub fn file_nodes(&self) -> Vec<FileNode> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for comment in &self.comments {
            *counts.entry(comment.file.as_str()).or_default() += 1;
        }

        let mut nodes: Vec<FileNode> = counts
            .into_iter()
            .map(|(path, count)| {
                let (name, directory) = split_path(path);
                FileNode {
                    path: path.to_string(),
                    name,
                    directory,
                    count,
                }
            })
            .collect();

        if self.case_insensitive {
            nodes.sort_by_cached_key(|n| (n.name.to_lowercase(), n.path.clone()));
        } else {
            nodes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        }
        nodes
    }

    /// Comments of one file in ascending line order.
    pub fn comment_nodes(&self, path: &str) -> Vec<CommentNode> {
        let mut records: Vec<&CommentRecord> =
            self.comments.iter().filter(|c| c.file == path).collect();
        records.sort_by_key(|c| c.line);
        records
            .into_iter()
            .map(|record| CommentNode {
                record: record.clone(),
            })
            .collect()
    }

    /// Top-level nodes.
    pub fn roots(&self) -> Vec<TreeNode> {
        self.file_nodes().into_iter().map(TreeNode::File).collect()
    }

    /// Children of a node; comment nodes are leaves.
    pub fn children(&self, node: &TreeNode) -> Vec<TreeNode> {
        match node {
            TreeNode::File(file) => self
                .comment_nodes(&file.path)
                .into_iter()
                .map(TreeNode::Comment)
                .collect(),
            TreeNode::Comment(_) => Vec::new(),
        }
    }
}
