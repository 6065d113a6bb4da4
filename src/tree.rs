use serde::Serialize;

use crate::accumulator::Snapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One entry of the file explorer view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DirectoryNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl DirectoryNode {
    fn directory(name: &str, path: String) -> Self {
        Self {
            name: name.to_string(),
            path,
            kind: NodeKind::Directory,
            children: Some(Vec::new()),
            content: None,
        }
    }

    fn file(name: &str, path: String, content: &str) -> Self {
        Self {
            name: name.to_string(),
            path,
            kind: NodeKind::File,
            children: None,
            content: Some(content.to_string()),
        }
    }
}

/// Project a snapshot into a tree. Siblings are sorted by name; `status.log`
/// is not part of the tree.
pub fn build_tree(snapshot: &Snapshot) -> Vec<DirectoryNode> {
    let mut roots: Vec<DirectoryNode> = Vec::new();

    for file in snapshot.code_files() {
        let segments: Vec<&str> = file.filename.split('/').filter(|s| !s.is_empty()).collect();
        let Some((leaf, dirs)) = segments.split_last() else {
            continue;
        };

        let mut level = &mut roots;
        let mut path = String::new();
        for dir in dirs {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(dir);

            let index = match level
                .iter()
                .position(|n| n.kind == NodeKind::Directory && n.name == *dir)
            {
                Some(i) => i,
                None => {
                    level.push(DirectoryNode::directory(dir, path.clone()));
                    level.len() - 1
                }
            };
            level = level[index].children.get_or_insert_with(Vec::new);
        }

        let file_path = if path.is_empty() {
            (*leaf).to_string()
        } else {
            format!("{path}/{leaf}")
        };
        level.push(DirectoryNode::file(leaf, file_path, &file.content));
    }

    sort_nodes(&mut roots);
    roots
}

fn sort_nodes(nodes: &mut [DirectoryNode]) {
    nodes.sort_by(|a, b| a.name.cmp(&b.name));
    for node in nodes.iter_mut() {
        if let Some(children) = node.children.as_mut() {
            sort_nodes(children);
        }
    }
}
