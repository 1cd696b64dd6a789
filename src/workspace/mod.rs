//! Workspace resolution.
//!
//! Maps filesystem locations to logical workspace nodes (ecosystem roots,
//! projects, worktrees) and enumerates the plan/chat directories the
//! discovery scan walks. Job files are stored under one node but may
//! logically belong to another: a declared `worktree` hint, or a
//! generically-named note group owned by a worktree, both redirect
//! ownership.

use std::path::{Path, PathBuf};

/// Directory names that hold shared notes rather than node-specific work.
/// Jobs found under these groups inherit ownership from up the parent
/// chain when their nominal owner is a worktree.
const NOTE_GROUPS: &[&str] = &["notes", "inbox", "scratch", "misc"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Ecosystem,
    Project,
    Worktree,
}

/// One logical workspace location.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceNode {
    pub name: String,
    pub path: PathBuf,
    pub kind: NodeKind,
    /// Name of the parent node, when one exists.
    pub parent: Option<String>,
}

/// A directory the discovery scan should walk, with the node that
/// nominally owns everything found inside it.
#[derive(Debug, Clone)]
pub struct CandidateDir {
    pub path: PathBuf,
    pub owner: WorkspaceNode,
}

/// Boundary for workspace lookups.
pub trait WorkspaceResolver: Send + Sync {
    /// All plan/chat directories to scan.
    fn candidate_dirs(&self) -> Vec<CandidateDir>;

    /// Re-resolve a job's declared worktree hint to a node.
    fn resolve_worktree(&self, hint: &str) -> Option<WorkspaceNode>;

    /// Parent node, when one exists.
    fn parent_of(&self, node: &WorkspaceNode) -> Option<WorkspaceNode>;
}

/// Compute the node a job effectively belongs to.
///
/// Precedence: an explicit worktree hint wins; otherwise a job inside a
/// generic note group whose nominal owner is itself a worktree walks up
/// the parent chain to the first non-worktree node; otherwise the
/// directory's owner stands. Falls back to the original owner when the
/// chain runs out.
pub fn effective_owner(
    resolver: &dyn WorkspaceResolver,
    dir_owner: &WorkspaceNode,
    worktree_hint: Option<&str>,
    in_note_group: bool,
) -> WorkspaceNode {
    if let Some(hint) = worktree_hint {
        if let Some(node) = resolver.resolve_worktree(hint) {
            return node;
        }
    }

    if in_note_group && dir_owner.kind == NodeKind::Worktree {
        let mut current = dir_owner.clone();
        while current.kind == NodeKind::Worktree {
            match resolver.parent_of(&current) {
                Some(parent) => current = parent,
                None => return dir_owner.clone(),
            }
        }
        return current;
    }

    dir_owner.clone()
}

/// Whether a job file's path, relative to its candidate dir, sits inside
/// a generically-named note group.
pub fn in_note_group(candidate_dir: &Path, file: &Path) -> bool {
    let Ok(rel) = file.strip_prefix(candidate_dir) else {
        return false;
    };
    rel.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|name| NOTE_GROUPS.contains(&name))
    })
}

/// Filesystem-backed resolver.
///
/// Each configured root is an ecosystem node; each of its child
/// directories is a project or worktree node. A worktree is recognized by
/// a `.git` gitlink file (the layout `git worktree add` produces) or a
/// `<base>--<suffix>` directory name; its parent is the sibling `<base>`
/// project when present, else the ecosystem root.
pub struct FsResolver {
    nodes: Vec<WorkspaceNode>,
}

impl FsResolver {
    pub fn new(roots: &[PathBuf]) -> Self {
        let mut nodes = Vec::new();

        for root in roots {
            let Ok(root_path) = root.canonicalize() else {
                continue;
            };
            let root_name = dir_name(&root_path);
            nodes.push(WorkspaceNode {
                name: root_name.clone(),
                path: root_path.clone(),
                kind: NodeKind::Ecosystem,
                parent: None,
            });

            let Ok(entries) = std::fs::read_dir(&root_path) else {
                continue;
            };
            let mut children: Vec<PathBuf> = entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .filter(|p| !dir_name(p).starts_with('.'))
                .collect();
            children.sort();

            for child in children {
                let name = dir_name(&child);
                let kind = if child.join(".git").is_file() || name.contains("--") {
                    NodeKind::Worktree
                } else {
                    NodeKind::Project
                };
                let parent = match kind {
                    NodeKind::Worktree => name
                        .split_once("--")
                        .map(|(base, _)| base.to_string())
                        .or_else(|| Some(root_name.clone())),
                    _ => Some(root_name.clone()),
                };
                nodes.push(WorkspaceNode {
                    name,
                    path: child,
                    kind,
                    parent,
                });
            }
        }

        Self { nodes }
    }

    pub fn nodes(&self) -> &[WorkspaceNode] {
        &self.nodes
    }

    fn by_name(&self, name: &str) -> Option<&WorkspaceNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

impl WorkspaceResolver for FsResolver {
    fn candidate_dirs(&self) -> Vec<CandidateDir> {
        let mut dirs = Vec::new();
        for node in &self.nodes {
            for sub in ["plans", "chats"] {
                let path = node.path.join(sub);
                if path.is_dir() {
                    dirs.push(CandidateDir {
                        path,
                        owner: node.clone(),
                    });
                }
            }
        }
        dirs
    }

    fn resolve_worktree(&self, hint: &str) -> Option<WorkspaceNode> {
        self.nodes
            .iter()
            .find(|n| n.kind == NodeKind::Worktree && n.name == hint)
            .or_else(|| self.by_name(hint))
            .cloned()
    }

    fn parent_of(&self, node: &WorkspaceNode) -> Option<WorkspaceNode> {
        node.parent
            .as_deref()
            .and_then(|name| self.by_name(name))
            .cloned()
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
