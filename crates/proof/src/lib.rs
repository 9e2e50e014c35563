#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{ProofError, ProofResult};

mod gindex;
pub use gindex::{
    array_gindex, concat_gindices, gindex_depth, BEACON_STATE_GINDEX, BLOCK_ROOTS_DEPTH,
    BLOCK_ROOTS_GINDEX, RECEIPTS_ROOT_GINDEX,
};

mod tree;
pub use tree::{hash_pair, verify_proof, SszTree};

mod root;
pub use root::{block_tree, header_tree, state_tree, ProveReceiptsRoot, ReceiptsRootProver};

mod receipt;
pub use receipt::{
    receipt_trie_proof, ProveReceipt, ReceiptProver, TransactionFetcher,
};

mod slot_key;
pub use slot_key::transfer_slot_key;
