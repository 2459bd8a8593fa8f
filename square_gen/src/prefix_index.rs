use square_dict::{Word, WordCorpus};
use util::error::{SquareError, SquareResult};

pub type NodeId = u32;

const ALPHABET_SIZE: usize = 26;
const NO_CHILD: NodeId = NodeId::MAX;

struct TrieNode {
  children: [NodeId; ALPHABET_SIZE],
  /// Ranks of every word passing through this node, ascending.
  words: Vec<u32>,
}

impl TrieNode {
  fn new() -> Self {
    Self { children: [NO_CHILD; ALPHABET_SIZE], words: Vec::new() }
  }
}

fn letter_slot(letter: u8) -> Option<usize> {
  letter
    .checked_sub(b'a')
    .map(usize::from)
    .filter(|&slot| slot < ALPHABET_SIZE)
}

/// A trie over every word of a corpus. Each node remembers the words sharing
/// its prefix in rank order, so prefix queries never scan the corpus.
pub struct PrefixIndex<'a> {
  corpus: &'a WordCorpus,
  nodes: Vec<TrieNode>,
}

impl<'a> PrefixIndex<'a> {
  pub const ROOT: NodeId = 0;

  pub fn build(corpus: &'a WordCorpus) -> SquareResult<Self> {
    let mut nodes = vec![TrieNode::new()];
    for word in corpus.words_by_rank() {
      let mut node = Self::ROOT as usize;
      nodes[node].words.push(word.rank());
      for &letter in word.letters() {
        let slot = letter_slot(letter).ok_or_else(|| {
          SquareError::Internal(format!(
            "Word \"{}\" has a letter outside a-z",
            word.text()
          ))
        })?;
        let child = match nodes[node].children[slot] {
          NO_CHILD => {
            let child = nodes.len();
            nodes.push(TrieNode::new());
            nodes[node].children[slot] = child as NodeId;
            child
          }
          child => child as usize,
        };
        nodes[child].words.push(word.rank());
        node = child;
      }
    }

    Ok(Self { corpus, nodes })
  }

  pub fn corpus(&self) -> &'a WordCorpus {
    self.corpus
  }

  pub fn word_len(&self) -> usize {
    self.corpus.word_len()
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  pub fn child(&self, node: NodeId, letter: u8) -> Option<NodeId> {
    let slot = letter_slot(letter)?;
    self
      .nodes
      .get(node as usize)
      .map(|node| node.children[slot])
      .filter(|&child| child != NO_CHILD)
  }

  fn children(&self, node: NodeId) -> impl Iterator<Item = (usize, NodeId)> + '_ {
    self
      .nodes
      .get(node as usize)
      .into_iter()
      .flat_map(|node| node.children.iter().cloned().enumerate())
      .filter(|&(_, child)| child != NO_CHILD)
  }

  fn has_slot(&self, node: NodeId, slot: usize) -> bool {
    self
      .nodes
      .get(node as usize)
      .is_some_and(|node| node.children[slot] != NO_CHILD)
  }

  /// Walks the trie along `prefix`, returning the node it ends at.
  pub fn find(&self, prefix: &str) -> Option<NodeId> {
    prefix
      .bytes()
      .try_fold(Self::ROOT, |node, letter| self.child(node, letter))
  }

  /// Ranks of the words under `node`, most frequent first.
  pub fn words_at(&self, node: NodeId) -> &[u32] {
    self
      .nodes
      .get(node as usize)
      .map(|node| node.words.as_slice())
      .unwrap_or(&[])
  }

  pub fn lookup(&self, prefix: &str) -> impl Iterator<Item = &'a Word> + '_ {
    let corpus = self.corpus;
    self
      .find(prefix)
      .map(|node| self.words_at(node))
      .unwrap_or(&[])
      .iter()
      .flat_map(move |&rank| corpus.word(rank))
  }

  /// Every node is created by inserting some word, so reaching a node at all
  /// means the prefix extends to a word.
  pub fn has_completion(&self, prefix: &str) -> bool {
    self.find(prefix).is_some()
  }

  /// Collects the ranks of every word whose letter `c` extends column node
  /// `columns[c]`, sorted by rank. This is the set of rows that keep every
  /// column completable.
  pub fn fitting_words(&self, columns: &[NodeId]) -> Vec<u32> {
    let mut ranks = Vec::new();
    self.collect_fitting(Self::ROOT, columns, &mut ranks);
    ranks.sort_unstable();
    ranks
  }

  fn collect_fitting(&self, node: NodeId, columns: &[NodeId], ranks: &mut Vec<u32>) {
    match columns.split_first() {
      None => ranks.extend_from_slice(self.words_at(node)),
      Some((&column, rest)) => {
        for (slot, child) in self.children(node) {
          if self.has_slot(column, slot) {
            self.collect_fitting(child, rest, ranks);
          }
        }
      }
    }
  }
}
