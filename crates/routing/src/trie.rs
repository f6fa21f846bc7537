//! Byte prefix trie
//!
//! Answers "is any stored prefix a prefix of this path" in one walk over
//! the path, independent of how many prefixes a rule carries.

/// Index of the root node
const ROOT: usize = 0;

#[derive(Debug, Clone, Default)]
struct Node {
    /// Sorted by byte for binary search
    children: Vec<(u8, u32)>,
    /// A stored prefix ends here
    terminal: bool,
}

impl Node {
    #[inline]
    fn child(&self, b: u8) -> Option<usize> {
        self.children
            .binary_search_by_key(&b, |&(k, _)| k)
            .ok()
            .map(|i| self.children[i].1 as usize)
    }
}

/// Set of byte prefixes
#[derive(Debug, Clone)]
pub struct PrefixTrie {
    nodes: Vec<Node>,
    len: usize,
}

impl Default for PrefixTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            len: 0,
        }
    }

    /// Build from a list of prefixes
    pub fn from_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut trie = Self::new();
        for prefix in prefixes {
            trie.insert(prefix.as_ref());
        }
        trie
    }

    /// Add a prefix. The empty prefix matches every path.
    pub fn insert(&mut self, prefix: &[u8]) {
        let mut node = ROOT;
        for &b in prefix {
            node = match self.nodes[node].child(b) {
                Some(next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::default());
                    let children = &mut self.nodes[node].children;
                    let pos = children.partition_point(|&(k, _)| k < b);
                    children.insert(pos, (b, next as u32));
                    next
                }
            };
        }
        if !self.nodes[node].terminal {
            self.nodes[node].terminal = true;
            self.len += 1;
        }
    }

    /// Number of distinct prefixes stored
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether some stored prefix is a prefix of `path`
    pub fn matches(&self, path: &[u8]) -> bool {
        if self.len == 0 {
            return false;
        }

        let mut node = ROOT;
        if self.nodes[node].terminal {
            return true;
        }
        for &b in path {
            match self.nodes[node].child(b) {
                Some(next) => node = next,
                None => return false,
            }
            if self.nodes[node].terminal {
                return true;
            }
        }
        false
    }
}
