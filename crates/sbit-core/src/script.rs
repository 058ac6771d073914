//! Script construction for standard and contract outputs.
//!
//! The wallet never hand-assembles script bytes. It describes a script as an
//! ordered list of [`ScriptElement`]s and hands it to a [`ScriptEncoder`],
//! which decides how each data element is pushed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::HASH160_LEN;

/// Script opcodes used by SBit wallets.
pub mod opcodes {
    pub const OP_0: u8 = 0x00;
    pub const OP_PUSHDATA1: u8 = 0x4c;
    pub const OP_PUSHDATA2: u8 = 0x4d;
    pub const OP_PUSHDATA4: u8 = 0x4e;
    pub const OP_1NEGATE: u8 = 0x4f;
    pub const OP_1: u8 = 0x51;
    /// Contract VM version marker for create/call outputs.
    pub const OP_4: u8 = 0x54;
    pub const OP_16: u8 = 0x60;
    pub const OP_DUP: u8 = 0x76;
    pub const OP_EQUAL: u8 = 0x87;
    pub const OP_EQUALVERIFY: u8 = 0x88;
    pub const OP_HASH160: u8 = 0xa9;
    pub const OP_CHECKSIG: u8 = 0xac;
    /// Deploy the pushed bytecode as a new contract.
    pub const OP_CREATE: u8 = 0xc1;
    /// Call an existing contract with the pushed ABI data.
    pub const OP_CALL: u8 = 0xc2;
}

use opcodes::*;

/// One element of a script before compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptElement {
    /// A bare opcode.
    Op(u8),
    /// Data to be pushed onto the stack.
    Data(Vec<u8>),
}

/// Compiled script bytes.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Hash)]
pub struct Script(pub Vec<u8>);

impl Script {
    /// The empty script.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Pay-to-pubkey-hash locking script.
    pub fn p2pkh(hash: &[u8; HASH160_LEN]) -> Self {
        let mut s = Vec::with_capacity(25);
        s.extend_from_slice(&[OP_DUP, OP_HASH160, HASH160_LEN as u8]);
        s.extend_from_slice(hash);
        s.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Self(s)
    }

    /// Pay-to-script-hash locking script.
    pub fn p2sh(hash: &[u8; HASH160_LEN]) -> Self {
        let mut s = Vec::with_capacity(23);
        s.extend_from_slice(&[OP_HASH160, HASH160_LEN as u8]);
        s.extend_from_slice(hash);
        s.push(OP_EQUAL);
        Self(s)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split the script into elements. Returns `None` if a push runs past
    /// the end of the script.
    pub fn elements(&self) -> Option<Vec<ScriptElement>> {
        let mut out = Vec::new();
        let mut rest = self.0.as_slice();
        while let Some((&op, tail)) = rest.split_first() {
            rest = tail;
            let len = match op {
                0x01..=0x4b => op as usize,
                OP_PUSHDATA1 => take_len(&mut rest, 1)?,
                OP_PUSHDATA2 => take_len(&mut rest, 2)?,
                OP_PUSHDATA4 => take_len(&mut rest, 4)?,
                _ => {
                    out.push(ScriptElement::Op(op));
                    continue;
                }
            };
            if rest.len() < len {
                return None;
            }
            let (data, tail) = rest.split_at(len);
            out.push(ScriptElement::Data(data.to_vec()));
            rest = tail;
        }
        Some(out)
    }
}

fn take_len(rest: &mut &[u8], width: usize) -> Option<usize> {
    if rest.len() < width {
        return None;
    }
    let (len_bytes, tail) = rest.split_at(width);
    *rest = tail;
    let mut buf = [0u8; 4];
    buf[..width].copy_from_slice(len_bytes);
    Some(u32::from_le_bytes(buf) as usize)
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", hex::encode(&self.0))
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Compiles element sequences into script bytes.
pub trait ScriptEncoder: Send + Sync {
    fn compile(&self, elements: &[ScriptElement]) -> Script;
}

/// Encoder following the minimal-push rules:
///
/// - empty data → `OP_0`
/// - a single byte `1..=16` → `OP_1..OP_16`
/// - the single byte `0x81` → `OP_1NEGATE`
/// - otherwise the shortest of direct push, `OP_PUSHDATA1/2/4`
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardScriptEncoder;

impl ScriptEncoder for StandardScriptEncoder {
    fn compile(&self, elements: &[ScriptElement]) -> Script {
        let mut out = Vec::new();
        for element in elements {
            match element {
                ScriptElement::Op(op) => out.push(*op),
                ScriptElement::Data(data) => push_data(&mut out, data),
            }
        }
        Script(out)
    }
}

/// Append `data` to `out` using the minimal push for its contents.
pub fn push_data(out: &mut Vec<u8>, data: &[u8]) {
    match data {
        [] => out.push(OP_0),
        [n @ 1..=16] => out.push(OP_1 + n - 1),
        [0x81] => out.push(OP_1NEGATE),
        _ => {
            let len = data.len();
            if len < OP_PUSHDATA1 as usize {
                out.push(len as u8);
            } else if len <= 0xff {
                out.push(OP_PUSHDATA1);
                out.push(len as u8);
            } else if len <= 0xffff {
                out.push(OP_PUSHDATA2);
                out.extend_from_slice(&(len as u16).to_le_bytes());
            } else {
                out.push(OP_PUSHDATA4);
                out.extend_from_slice(&(len as u32).to_le_bytes());
            }
            out.extend_from_slice(data);
        }
    }
}
