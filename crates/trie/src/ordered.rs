//! Root computation for ordered lists keyed by RLP-encoded index (transactions, receipts,
//! ommers). Adapted directly from the teacher's `ordered_trie_with_encoder`: unlike the
//! mutable key/value trie in [`crate::trie`], an ordered list's root is a one-shot
//! computation, so it is built with `alloy_trie::HashBuilder` rather than our own `Node`.

use alloy_primitives::B256;
use alloy_rlp::{BufMut, Encodable};
use alloy_trie::{proof::ProofRetainer, HashBuilder, Nibbles};

/// Computes the root hash of an ordered list of items, each RLP-index-keyed per
/// Yellow Paper Appendix D and encoded into the trie's leaf values by `encode`.
pub fn ordered_list_root<T, F>(items: &[T], mut encode: F) -> B256
where
    F: FnMut(&T, &mut dyn BufMut),
{
    ordered_trie_with_encoder(items, &mut encode).root()
}

/// Builds (without finalizing) a [`HashBuilder`] over an ordered list of items, keyed by
/// their RLP-encoded index.
pub fn ordered_trie_with_encoder<T, F>(items: &[T], mut encode: F) -> HashBuilder
where
    F: FnMut(&T, &mut dyn BufMut),
{
    let mut index_buffer = Vec::new();
    let mut value_buffer = Vec::new();
    let items_len = items.len();

    let path_nibbles = (0..items_len)
        .map(|i| {
            let index = adjust_index_for_rlp(i, items_len);
            index_buffer.clear();
            index.encode(&mut index_buffer);
            Nibbles::unpack(&index_buffer)
        })
        .collect::<Vec<_>>();

    let mut hb = HashBuilder::default().with_proof_retainer(ProofRetainer::new(path_nibbles));
    for i in 0..items_len {
        let index = adjust_index_for_rlp(i, items_len);

        index_buffer.clear();
        alloy_rlp::Encodable::encode(&index, &mut index_buffer);

        value_buffer.clear();
        encode(&items[index], &mut value_buffer);

        hb.add_leaf(Nibbles::unpack(&index_buffer), &value_buffer);
    }

    hb
}

/// Ethereum's quirky RLP-list index ordering: item 0 is inserted last (it sorts after
/// `0x7f` once RLP-index-encoded), everything else shifts forward by one.
const fn adjust_index_for_rlp(i: usize, len: usize) -> usize {
    if i > 0x7f {
        i
    } else if i == 0x7f || i + 1 == len {
        0
    } else {
        i + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_root_matches_empty_trie_root() {
        let root = ordered_list_root::<Vec<u8>, _>(&[], |_, _| {});
        assert_eq!(root, crate::trie::empty_root());
    }

    #[test]
    fn single_item_list_is_deterministic() {
        let items = vec![b"hello".to_vec()];
        let root_a = ordered_list_root(&items, |item, buf| buf.put_slice(item));
        let root_b = ordered_list_root(&items, |item, buf| buf.put_slice(item));
        assert_eq!(root_a, root_b);
    }

    #[test]
    fn differing_lists_produce_differing_roots() {
        let a = vec![b"a".to_vec(), b"b".to_vec()];
        let b = vec![b"a".to_vec(), b"c".to_vec()];
        let root_a = ordered_list_root(&a, |item, buf| buf.put_slice(item));
        let root_b = ordered_list_root(&b, |item, buf| buf.put_slice(item));
        assert_ne!(root_a, root_b);
    }
}
