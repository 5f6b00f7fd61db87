//! Signature shares, their collection and recovery of the group signature
//!
//! Shares and signatures share the string form `"<x>:<y>[:<hint>]"`, with
//! the G1 affine coordinates in decimal.

mod share;
mod share_set;
mod signature;

pub use share::SigShare;
pub use share_set::SigShareSet;
pub use signature::Signature;

use crate::curve::{g1_from_strings, g1_to_strings, G1Affine};
use crate::{Error, Result};

fn encode_point(point: &G1Affine, hint: Option<&str>) -> String {
    let [x, y] = g1_to_strings(point);
    match hint {
        Some(hint) => format!("{}:{}:{}", x, y, hint),
        None => format!("{}:{}", x, y),
    }
}

fn decode_point(s: &str) -> Result<(G1Affine, Option<String>)> {
    let mut parts = s.splitn(3, ':');
    let (x, y) = match (parts.next(), parts.next()) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            return Err(Error::InvalidEncoding(format!(
                "expected <x>:<y>[:<hint>], got {:?}",
                s
            )))
        }
    };
    let point = g1_from_strings(&[x.to_string(), y.to_string()])?;
    Ok((point, parts.next().map(str::to_string)))
}
