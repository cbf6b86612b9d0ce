//! Standard P2PKH locking and unlocking scripts.

use crate::error::EncodingError;

pub const OP_DUP: u8 = 0x76;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;

/// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
pub fn p2pkh_script_pubkey(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.push(OP_DUP);
    script.push(OP_HASH160);
    script.push(20);
    script.extend_from_slice(pubkey_hash);
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

/// The hash a P2PKH locking script pays to, or `None` for any other script.
pub fn p2pkh_pubkey_hash(script: &[u8]) -> Option<[u8; 20]> {
    match script {
        [OP_DUP, OP_HASH160, 20, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG] if hash.len() == 20 => {
            let mut out = [0u8; 20];
            out.copy_from_slice(hash);
            Some(out)
        }
        _ => None,
    }
}

/// Append a minimal data push.
pub fn push_data(script: &mut Vec<u8>, data: &[u8]) -> Result<(), EncodingError> {
    match data.len() {
        len @ 0..=0x4b => script.push(len as u8),
        len @ 0x4c..=0xff => {
            script.push(OP_PUSHDATA1);
            script.push(len as u8);
        }
        len @ 0x100..=0xffff => {
            script.push(OP_PUSHDATA2);
            script.extend_from_slice(&(len as u16).to_le_bytes());
        }
        len => return Err(EncodingError::PushTooLarge(len)),
    }
    script.extend_from_slice(data);
    Ok(())
}

/// `push(signature ‖ sighash type) ‖ push(public key)`
pub fn p2pkh_script_sig(signature: &[u8], public_key: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let mut script = Vec::with_capacity(signature.len() + public_key.len() + 2);
    push_data(&mut script, signature)?;
    push_data(&mut script, public_key)?;
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_pubkey_layout() {
        let script = p2pkh_script_pubkey(&[0xab; 20]);
        assert_eq!(hex::encode(&script), format!("76a914{}88ac", "ab".repeat(20)));
    }

    #[test]
    fn pubkey_hash_extraction() {
        let script = p2pkh_script_pubkey(&[0x07; 20]);
        assert_eq!(p2pkh_pubkey_hash(&script), Some([0x07; 20]));
        assert_eq!(p2pkh_pubkey_hash(&script[..24]), None);
        assert_eq!(p2pkh_pubkey_hash(&[0xa9, 0x14]), None);
    }

    #[test]
    fn push_opcodes_by_size() {
        let mut s = Vec::new();
        push_data(&mut s, &[1; 75]).unwrap();
        assert_eq!(s[0], 75);

        let mut s = Vec::new();
        push_data(&mut s, &[1; 76]).unwrap();
        assert_eq!(&s[..2], &[OP_PUSHDATA1, 76]);

        let mut s = Vec::new();
        push_data(&mut s, &[1; 300]).unwrap();
        assert_eq!(&s[..3], &[OP_PUSHDATA2, 0x2c, 0x01]);
        assert_eq!(s.len(), 303);
    }

    #[test]
    fn push_too_large() {
        let mut s = Vec::new();
        assert_eq!(push_data(&mut s, &vec![0; 0x1_0000]), Err(EncodingError::PushTooLarge(0x1_0000)));
    }

    #[test]
    fn script_sig_is_two_pushes() {
        let sig = [0x30; 72];
        let pk = [0x02; 33];
        let script = p2pkh_script_sig(&sig, &pk).unwrap();
        assert_eq!(script.len(), 1 + 72 + 1 + 33);
        assert_eq!(script[0], 72);
        assert_eq!(script[73], 33);
    }
}
