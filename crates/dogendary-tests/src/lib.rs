//! End-to-end and adversarial test suite for the Dogendary wallet core.
//!
//! The integration tests under `tests/` drive the public API the way a host
//! would: vault lifecycle through a `Session`, transaction building against
//! indexer-shaped UTXO sets, and randomized inputs against the invariants
//! the wallet must keep (special outputs never spent, dust never created,
//! serialization stable).

pub mod helpers;
